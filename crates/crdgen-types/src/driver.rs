//! Stream driver
//!
//! Walks a stream of CRDs, resolves the spec and status of the selected
//! version of each into registered types, combines them into the root type
//! of the kind and hands the result to an emitter.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crdgen_core::{CrdDocument, ErrorPolicy, GenerateConfig, ImportedType};

use crate::emit::Emitter;
use crate::error::GenerateError;
use crate::hooks::{self, SchemaNode};
use crate::known;
use crate::model::{Draft, Field, TypeDescriptor, TypeId, TypeNode, TypeRef};
use crate::registry::TypeRegistry;

/// Per-run generation settings
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Version to generate; empty selects each CRD's first version
    pub version: String,
    pub skip_list: Vec<String>,
    /// Names kept unavailable for generated types
    pub reserved: Vec<String>,
    /// Names pre-bound to external types
    pub imports: Vec<ImportedType>,
    pub error_policy: ErrorPolicy,
}

impl GenerateRequest {
    pub fn skips(&self, kind: &str) -> bool {
        self.skip_list.iter().any(|k| k == kind)
    }
}

impl From<&GenerateConfig> for GenerateRequest {
    fn from(config: &GenerateConfig) -> Self {
        Self {
            version: config.version.clone(),
            skip_list: config.skip_list.clone(),
            reserved: config.reserved.clone(),
            imports: config.imports.clone(),
            error_policy: config.error_policy,
        }
    }
}

/// A CRD resolved into types
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub kind: String,
    /// Full CRD name
    pub name: String,
    pub group: String,
    pub version: String,
    pub plural: String,
    /// Output file name for the kind
    pub filename: String,
    /// `group/version/plural`
    pub gvr: String,
    /// Root type combining object meta, spec and status
    pub root: TypeDescriptor,
    /// Named types reachable from the root, depth first
    pub dependencies: Vec<TypeId>,
}

/// A document that failed under `ErrorPolicy::Skip`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDocument {
    pub kind: String,
    pub error: String,
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    /// `group/version/plural` of every generated CRD, in stream order
    pub generated: Vec<String>,
    /// Kinds on the skip list
    pub skipped: Vec<String>,
    pub failed: Vec<FailedDocument>,
}

impl GenerationReport {
    /// Distinct `(group, version)` pairs that were generated
    pub fn group_versions(&self) -> BTreeSet<(String, String)> {
        self.generated
            .iter()
            .filter_map(|gvr| {
                let mut parts = gvr.split('/');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(group), Some(version), Some(_)) => {
                        Some((group.to_string(), version.to_string()))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// The group and version, if every generated CRD shares one
    pub fn single_group_version(&self) -> Option<(String, String)> {
        let mut pairs = self.group_versions().into_iter();
        match (pairs.next(), pairs.next()) {
            (Some(pair), None) => Some(pair),
            _ => None,
        }
    }
}

/// Seed a registry with the request's reserved names and imports
pub fn preload(request: &GenerateRequest, registry: &mut TypeRegistry) {
    for name in &request.reserved {
        registry.reserve(name);
    }
    for imported in &request.imports {
        registry.add_auto_import(imported);
    }
}

/// Generate types for every CRD in a stream
///
/// Reserved names and imports are registered before the first document.
/// Framing and parse errors are always fatal; resolution errors follow the
/// request's error policy. A stream that generates nothing is an error.
pub fn generate_stream<I, E>(
    request: &GenerateRequest,
    registry: &mut TypeRegistry,
    documents: I,
    emitter: &mut E,
) -> Result<GenerationReport, GenerateError>
where
    I: IntoIterator<Item = crdgen_core::Result<CrdDocument>>,
    E: Emitter + ?Sized,
{
    preload(request, registry);

    let mut report = GenerationReport::default();
    for document in documents {
        let crd = document?;
        let kind = crd.kind().to_string();
        if request.skips(&kind) {
            info!(kind = %kind, "skipping CRD");
            report.skipped.push(kind);
            continue;
        }

        let resolved = match resolve_document(request, registry, &crd) {
            Ok(resolved) => resolved,
            Err(err) if request.error_policy == ErrorPolicy::Skip => {
                warn!(kind = %kind, error = %err, "failed to generate CRD, continuing");
                report.failed.push(FailedDocument {
                    kind,
                    error: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        info!(kind = %kind, gvr = %resolved.gvr, types = resolved.dependencies.len(), "generated CRD");
        emitter.emit(registry, &resolved)?;
        report.generated.push(resolved.gvr);
    }

    if report.generated.is_empty() {
        return Err(GenerateError::EmptyStream {
            skipped: report.skipped.len(),
            failed: report.failed.len(),
        });
    }
    emitter.finish(registry, &report)?;
    Ok(report)
}

/// Resolve one CRD into its root type
pub fn resolve_document(
    request: &GenerateRequest,
    registry: &mut TypeRegistry,
    crd: &CrdDocument,
) -> Result<ResolvedDocument, GenerateError> {
    let kind = crd.kind();
    let version = crd
        .select_version(&request.version)
        .ok_or_else(|| version_error(crd, &request.version))?;
    if version.schema.is_none() {
        return Err(GenerateError::MissingSchema {
            kind: kind.to_string(),
            version: version.name.clone(),
        });
    }
    debug!(kind, version = %version.name, "selected version");

    let resolve_err = |e| GenerateError::resolve(kind, e);
    registry.reserve_kind(kind).map_err(resolve_err)?;

    let type_meta = registry.rename(&[], Draft::Named(known::type_meta())).map_err(resolve_err)?;
    let object_meta = registry.rename(&[], Draft::Named(known::object_meta())).map_err(resolve_err)?;
    let mut fields = vec![
        Field::embedded("TypeMeta", "", type_meta).required(true),
        Field::embedded("ObjectMeta", "metadata", object_meta).required(true),
    ];

    let scope = vec![kind.to_string()];
    for (key, suffix, props) in [
        ("spec", "Spec", version.spec_schema()),
        ("status", "Status", version.status_schema()),
    ] {
        let Some(props) = props else {
            debug!(kind, key, "no schema, omitting field");
            continue;
        };
        let node = SchemaNode::new(format!("{}{}", kind, suffix), scope.clone(), props);
        // spec and status always get a type of their own
        let ty = match hooks::resolve(registry, &node).map_err(resolve_err)? {
            Draft::Named(top) if top.is_composite() => {
                TypeRef::Named(registry.register_distinct(&scope, top).map_err(resolve_err)?)
            }
            draft => registry.rename(&scope, draft).map_err(resolve_err)?,
        };
        fields.push(Field::new(key, ty).required(true));
    }

    let dependencies = registry.dependencies(&fields);
    let root = registry.describe_node(&TypeNode::composite(kind, fields));

    Ok(ResolvedDocument {
        kind: kind.to_string(),
        name: crd.name.clone(),
        group: crd.group.clone(),
        version: version.name.clone(),
        plural: crd.names.plural.clone(),
        filename: crd.filename(),
        gvr: crd.gvr(&version.name),
        root,
        dependencies,
    })
}

fn version_error(crd: &CrdDocument, requested: &str) -> GenerateError {
    let kind = crd.kind().to_string();
    if crd.versions.is_empty() {
        return GenerateError::NoVersions { kind };
    }
    let available: Vec<&str> = crd.versions.iter().map(|v| v.name.as_str()).collect();
    GenerateError::VersionNotFound {
        kind,
        version: requested.to_string(),
        help: Some(format!("available versions: {}", available.join(", "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::CollectingEmitter;
    use crate::error::TypeError;
    use crate::model::DescriptorKind;
    use crdgen_core::{CrdParser, CrdStream, SchemaProps};
    use std::collections::BTreeMap;

    const GROUP_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: groups.atlas.generated.mongodb.com
spec:
  group: atlas.generated.mongodb.com
  names:
    kind: Group
    plural: groups
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                v20231115:
                  type: object
                  properties:
                    entry:
                      type: object
                      required: [name, orgId]
                      properties:
                        name: {type: string}
                        orgId: {type: string}
                        regionUsageRestrictions: {type: string}
                        tags:
                          type: array
                          items:
                            type: object
                            properties:
                              key: {type: string}
                              value: {type: string}
                        withDefaultAlertsSettings: {type: boolean}
                    parameters:
                      type: object
                      properties:
                        projectOwnerId: {type: string}
            status:
              type: object
              properties:
                conditions:
                  type: array
                  items:
                    type: object
                    properties:
                      lastTransitionTime: {type: string, format: date-time}
                      message: {type: string}
                      observedGeneration: {type: integer}
                      reason: {type: string}
                      status: {type: string}
                      type: {type: string}
                v20231115:
                  type: object
                  properties:
                    clusterCount: {type: integer}
                    created: {type: string, format: date-time}
                    id: {type: string}
"#;

    const TEAM_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: teams.atlas.generated.mongodb.com
spec:
  group: atlas.generated.mongodb.com
  names:
    kind: Team
    plural: teams
  versions:
    - name: v1
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                tags:
                  type: array
                  items:
                    type: object
                    properties:
                      key: {type: string}
                      value: {type: string}
                usernames:
                  type: array
                  items: {type: string}
"#;

    fn registry() -> TypeRegistry {
        TypeRegistry::with_known_types(BTreeMap::new())
    }

    fn run(
        request: &GenerateRequest,
        registry: &mut TypeRegistry,
        yaml: &str,
    ) -> Result<(GenerationReport, CollectingEmitter), GenerateError> {
        let mut emitter = CollectingEmitter::new();
        let report = generate_stream(request, registry, CrdStream::new(yaml), &mut emitter)?;
        Ok((report, emitter))
    }

    fn new_type_names(emitter: &CollectingEmitter, kind: &str) -> Vec<String> {
        emitter
            .document(kind)
            .unwrap()
            .new_types
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    #[test]
    fn test_generate_group() {
        let mut registry = registry();
        let (report, emitter) = run(&GenerateRequest::default(), &mut registry, GROUP_CRD).unwrap();

        assert_eq!(report.generated, vec!["atlas.generated.mongodb.com/v1/groups"]);
        let emitted = emitter.document("Group").unwrap();
        let root = &emitted.document.root;
        assert_eq!(root.name, "Group");
        assert_eq!(emitted.document.filename, "group.yaml");

        let names: Vec<_> = root.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ObjectMeta", "Spec", "Status", "TypeMeta"]);
        let meta = root.field("ObjectMeta").unwrap();
        assert!(meta.embedded);
        assert_eq!(meta.source_key, "metadata");
        assert_eq!(root.field("Spec").unwrap().ty.name, "GroupSpec");

        let status = &root.field("Status").unwrap().ty;
        let conditions = status.field("Conditions").unwrap().ty.element().unwrap();
        assert_eq!(conditions.name, "Condition");
        assert_eq!(conditions.import.as_ref().unwrap().alias, "metav1");

        // status' version type collides with spec's and takes its parent as prefix
        let status_version = &status.field("V20231115").unwrap().ty;
        assert_eq!(status_version.name, "GroupStatusV20231115");
        assert_eq!(status_version.field("Created").unwrap().ty.name, "Time");

        assert_eq!(
            new_type_names(&emitter, "Group"),
            vec![
                "GroupSpec",
                "V20231115",
                "Entry",
                "Tags",
                "Parameters",
                "GroupStatus",
                "GroupStatusV20231115",
            ]
        );
        assert_eq!(emitter.report, Some(report));
    }

    #[test]
    fn test_shared_types_emitted_once() {
        let mut registry = registry();
        let stream = format!("---{}---{}", GROUP_CRD, TEAM_CRD);
        let (report, emitter) = run(&GenerateRequest::default(), &mut registry, &stream).unwrap();

        assert_eq!(report.generated.len(), 2);
        assert_eq!(
            report.single_group_version(),
            Some(("atlas.generated.mongodb.com".to_string(), "v1".to_string()))
        );

        let team = emitter.document("Team").unwrap();
        let tags = team.document.root.field("Spec").unwrap().ty.field("Tags").unwrap();
        assert_eq!(tags.ty.element().unwrap().name, "Tags");
        assert_eq!(new_type_names(&emitter, "Team"), vec!["TeamSpec"]);
    }

    #[test]
    fn test_skip_list() {
        let mut registry = registry();
        let stream = format!("---{}---{}", GROUP_CRD, TEAM_CRD);
        let request = GenerateRequest {
            skip_list: vec!["Group".to_string()],
            ..Default::default()
        };
        let (report, emitter) = run(&request, &mut registry, &stream).unwrap();
        assert_eq!(report.skipped, vec!["Group"]);
        assert_eq!(report.generated, vec!["atlas.generated.mongodb.com/v1/teams"]);
        assert!(emitter.document("Group").is_none());
        // Tags is first generated by Team now
        assert_eq!(new_type_names(&emitter, "Team"), vec!["TeamSpec", "Tags"]);
    }

    #[test]
    fn test_empty_stream_is_error() {
        let err = run(&GenerateRequest::default(), &mut registry(), "").unwrap_err();
        assert!(matches!(err, GenerateError::EmptyStream { skipped: 0, failed: 0 }));
    }

    #[test]
    fn test_all_skipped_is_error() {
        let request = GenerateRequest {
            skip_list: vec!["Group".to_string()],
            ..Default::default()
        };
        let err = run(&request, &mut registry(), GROUP_CRD).unwrap_err();
        assert!(matches!(err, GenerateError::EmptyStream { skipped: 1, failed: 0 }));
    }

    #[test]
    fn test_version_selection_errors() {
        let request = GenerateRequest {
            version: "v2".to_string(),
            ..Default::default()
        };
        let err = run(&request, &mut registry(), GROUP_CRD).unwrap_err();
        match err {
            GenerateError::VersionNotFound { kind, version, help } => {
                assert_eq!(kind, "Group");
                assert_eq!(version, "v2");
                assert_eq!(help.as_deref(), Some("available versions: v1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let mut crd = CrdParser::parse(GROUP_CRD).unwrap();
        crd.versions.clear();
        let err = resolve_document(&GenerateRequest::default(), &mut registry(), &crd).unwrap_err();
        assert!(matches!(err, GenerateError::NoVersions { .. }));

        let mut crd = CrdParser::parse(GROUP_CRD).unwrap();
        crd.versions[0].schema = None;
        let err = resolve_document(&GenerateRequest::default(), &mut registry(), &crd).unwrap_err();
        assert!(matches!(err, GenerateError::MissingSchema { .. }));
    }

    #[test]
    fn test_missing_status_is_omitted() {
        let mut crd = CrdParser::parse(TEAM_CRD).unwrap();
        let resolved = resolve_document(&GenerateRequest::default(), &mut registry(), &crd).unwrap();
        assert!(resolved.root.field("Status").is_none());
        assert!(resolved.root.field("Spec").unwrap().required);

        crd.versions[0].schema = Some(SchemaProps::object(Vec::<(String, SchemaProps)>::new()));
        let resolved = resolve_document(&GenerateRequest::default(), &mut registry(), &crd).unwrap();
        assert_eq!(resolved.root.fields().len(), 2);
    }

    fn broken_crd() -> String {
        TEAM_CRD
            .replace("teams", "brokens")
            .replace("kind: Team", "kind: Broken")
            .replace("items: {type: string}", "items: {type: int-or-string}")
    }

    #[test]
    fn test_error_policy_abort() {
        let stream = format!("---{}---{}", broken_crd(), GROUP_CRD);
        let err = run(&GenerateRequest::default(), &mut registry(), &stream).unwrap_err();
        match err {
            GenerateError::Resolve { kind, source } => {
                assert_eq!(kind, "Broken");
                assert!(matches!(source.innermost(), TypeError::UnsupportedKind { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_policy_skip() {
        let stream = format!("---{}---{}", broken_crd(), GROUP_CRD);
        let request = GenerateRequest {
            error_policy: ErrorPolicy::Skip,
            ..Default::default()
        };
        let (report, _) = run(&request, &mut registry(), &stream).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, "Broken");
        assert!(report.failed[0].error.contains("usernames"), "{}", report.failed[0].error);
        assert_eq!(report.generated, vec!["atlas.generated.mongodb.com/v1/groups"]);
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let stream = format!("---{}---\nkind: ConfigMap\n", GROUP_CRD);
        let request = GenerateRequest {
            error_policy: ErrorPolicy::Skip,
            ..Default::default()
        };
        let err = run(&request, &mut registry(), &stream).unwrap_err();
        assert!(matches!(err, GenerateError::Input(_)));
    }

    #[test]
    fn test_reserved_and_imports_preloaded() {
        let request = GenerateRequest {
            reserved: vec!["Entry".to_string()],
            imports: vec![ImportedType::new("Parameters", "atlas_refs::params")],
            ..Default::default()
        };
        let mut registry = registry();
        let (_, emitter) = run(&request, &mut registry, GROUP_CRD).unwrap();

        let spec = &emitter.document("Group").unwrap().document.root.field("Spec").unwrap().ty;
        let version = &spec.field("V20231115").unwrap().ty;
        assert_eq!(version.field("Entry").unwrap().ty.name, "V20231115Entry");

        let parameters = &version.field("Parameters").unwrap().ty;
        assert_eq!(parameters.name, "Parameters");
        assert_eq!(parameters.import.as_ref().unwrap().alias, "params");
        assert!(matches!(parameters.kind, DescriptorKind::Composite { .. }));
        // bound imports are not emitted
        assert!(!new_type_names(&emitter, "Group").contains(&"Parameters".to_string()));
    }

    fn crd(kind: &str, spec: &str) -> String {
        let plural = format!("{}s", kind.to_lowercase());
        format!(
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: {plural}.atlas.generated.mongodb.com
spec:
  group: atlas.generated.mongodb.com
  names:
    kind: {kind}
    plural: {plural}
  versions:
    - name: v1
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
{spec}
"#
        )
    }

    #[test]
    fn test_spec_keeps_its_own_name() {
        let spec = "              type: object\n              properties:\n                name: {type: string}";
        let mut registry = registry();
        let (_, emitter) = run(&GenerateRequest::default(), &mut registry, &crd("Vault", spec)).unwrap();

        let vault = emitter.document("Vault").unwrap();
        let spec = &vault.document.root.field("Spec").unwrap().ty;
        assert_eq!(spec.name, "VaultSpec");
        assert!(spec.import.is_none());
        assert_eq!(new_type_names(&emitter, "Vault"), vec!["VaultSpec"]);
    }

    #[test]
    fn test_unstructured_spec_uses_json() {
        let spec = "              type: object\n              x-kubernetes-preserve-unknown-fields: true";
        let mut registry = registry();
        let before = registry.len();
        let (_, emitter) = run(&GenerateRequest::default(), &mut registry, &crd("Blob", spec)).unwrap();

        let blob = emitter.document("Blob").unwrap();
        assert_eq!(blob.document.root.field("Spec").unwrap().ty.name, "JSON");
        assert!(blob.new_types.is_empty());
        // only the kind reservation was added
        assert_eq!(registry.len(), before + 1);
    }

    #[test]
    fn test_kind_taken_by_earlier_type() {
        let org = crd(
            "Org",
            "              type: object\n              properties:\n                team:\n                  type: object\n                  properties:\n                    members: {type: integer}",
        );
        let stream = format!("---{}---{}", org, TEAM_CRD);
        let err = run(&GenerateRequest::default(), &mut registry(), &stream).unwrap_err();
        match err {
            GenerateError::Resolve { kind, source } => {
                assert_eq!(kind, "Team");
                assert!(matches!(source, TypeError::NameCollision { ref name, .. } if name == "Team"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // the other way round the nested type moves aside
        let stream = format!("---{}---{}", TEAM_CRD, org);
        let (_, emitter) = run(&GenerateRequest::default(), &mut registry(), &stream).unwrap();
        assert_eq!(new_type_names(&emitter, "Org"), vec!["OrgSpec", "OrgSpecTeam"]);
    }

    #[test]
    fn test_request_from_config() {
        let config = GenerateConfig::from_yaml("version: v1\nskipList: [Legacy]\nerrorPolicy: skip\n").unwrap();
        let request = GenerateRequest::from(&config);
        assert_eq!(request.version, "v1");
        assert!(request.skips("Legacy"));
        assert_eq!(request.error_policy, ErrorPolicy::Skip);
    }

    #[test]
    fn test_group_versions() {
        let report = GenerationReport {
            generated: vec![
                "a.io/v1/foos".to_string(),
                "b.io/v1/bars".to_string(),
                "v1/pods".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(report.group_versions().len(), 2);
        assert_eq!(report.single_group_version(), None);
    }
}
