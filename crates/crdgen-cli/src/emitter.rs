//! Descriptor file emitter
//!
//! Writes one YAML descriptor per kind holding the root type and the
//! definitions of the named types that kind introduced. When every
//! generated CRD shares one group and version, an index of the kinds is
//! written alongside.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crdgen_types::{
    Emitter, GenerateError, GenerationReport, ResolvedDocument, TypeDescriptor, TypeRegistry,
    claim_new_types,
};

/// Index file name
pub const GROUP_INDEX: &str = "groupversion_info.yaml";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor<'a> {
    kind: &'a str,
    group: &'a str,
    version: &'a str,
    plural: &'a str,
    crd: &'a str,
    root: &'a TypeDescriptor,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    types: Vec<TypeDescriptor>,
}

#[derive(Serialize)]
struct GroupIndex<'a> {
    group: String,
    version: String,
    kinds: &'a [String],
}

/// Where descriptors go
#[derive(Debug)]
pub enum Target {
    Directory { path: PathBuf, force: bool },
    Stdout,
}

#[derive(Debug)]
pub struct ManifestEmitter {
    target: Target,
    kinds: Vec<String>,
    written: Vec<PathBuf>,
}

impl ManifestEmitter {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            kinds: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write(&mut self, kind: &str, file: &str, content: &str) -> Result<(), GenerateError> {
        match &self.target {
            Target::Stdout => {
                let mut out = std::io::stdout().lock();
                write!(out, "---\n{}", content).map_err(|e| GenerateError::emit(kind, e))
            }
            Target::Directory { path, force } => {
                let file = path.join(file);
                if file.exists() && !force {
                    return Err(GenerateError::emit(
                        kind,
                        format!("{} already exists (use --force to overwrite)", file.display()),
                    ));
                }
                debug!(path = %file.display(), "writing descriptor");
                std::fs::write(&file, content).map_err(|e| GenerateError::emit(kind, e))?;
                self.written.push(file);
                Ok(())
            }
        }
    }
}

/// Create the output directory
pub fn prepare_directory(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

impl Emitter for ManifestEmitter {
    fn emit(
        &mut self,
        registry: &mut TypeRegistry,
        document: &ResolvedDocument,
    ) -> Result<(), GenerateError> {
        let descriptor = Descriptor {
            kind: &document.kind,
            group: &document.group,
            version: &document.version,
            plural: &document.plural,
            crd: &document.name,
            root: &document.root,
            types: claim_new_types(registry, document),
        };
        let content =
            serde_yaml::to_string(&descriptor).map_err(|e| GenerateError::emit(&document.kind, e))?;
        self.write(&document.kind, &document.filename, &content)?;
        self.kinds.push(document.kind.clone());
        Ok(())
    }

    fn finish(
        &mut self,
        _registry: &mut TypeRegistry,
        report: &GenerationReport,
    ) -> Result<(), GenerateError> {
        let Some((group, version)) = report.single_group_version() else {
            return Ok(());
        };
        let kinds = self.kinds.clone();
        let index = GroupIndex {
            group,
            version,
            kinds: &kinds,
        };
        let content =
            serde_yaml::to_string(&index).map_err(|e| GenerateError::emit(GROUP_INDEX, e))?;
        self.write(GROUP_INDEX, GROUP_INDEX, &content)
    }
}
