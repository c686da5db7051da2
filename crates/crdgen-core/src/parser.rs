//! CRD YAML parser
//!
//! Parses CustomResourceDefinition YAML manifests into structured
//! `CrdDocument`s, one at a time or as a `---` separated stream.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::schema::{AdditionalProperties, CrdDocument, CrdNames, CrdVersion, PropertyType, SchemaProps};

const CRD_KIND: &str = "CustomResourceDefinition";

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdDocument> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Parse from a serde_json::Value
    pub fn parse_value(value: &Value) -> Result<CrdDocument> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::missing("kind"))?;

        if kind != CRD_KIND {
            return Err(CoreError::invalid(format!(
                "expected {}, got {}",
                CRD_KIND, kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::missing("metadata.name"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| CoreError::missing("spec"))?;

        // core API groups are empty, so the group is optional
        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        Ok(CrdDocument {
            name,
            group,
            names,
            versions,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names = names_value.ok_or_else(|| CoreError::missing("spec.names"))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::missing("spec.names.kind"))?
            .to_string();

        Ok(CrdNames {
            kind,
            plural: names
                .get("plural")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            singular: names
                .get("singular")
                .and_then(Value::as_str)
                .map(String::from),
            list_kind: names
                .get("listKind")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersion>> {
        // A CRD without versions parses fine; version selection rejects it later.
        let Some(versions) = versions_value else {
            return Ok(Vec::new());
        };
        let versions = versions
            .as_array()
            .ok_or_else(|| CoreError::invalid("'spec.versions' must be an array"))?;

        versions.iter().map(Self::parse_version).collect()
    }

    fn parse_version(version: &Value) -> Result<CrdVersion> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::missing("spec.versions[].name"))?
            .to_string();

        let served = version
            .get("served")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let storage = version
            .get("storage")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(Self::parse_schema_props);

        Ok(CrdVersion {
            name,
            served,
            storage,
            schema,
        })
    }

    /// Parse a single schema node (recursive)
    pub fn parse_schema_props(prop: &Value) -> SchemaProps {
        let type_ = prop
            .get("type")
            .and_then(Value::as_str)
            .map(PropertyType::parse)
            .unwrap_or_default();

        let description = prop
            .get("description")
            .and_then(Value::as_str)
            .map(String::from);

        let format = prop.get("format").and_then(Value::as_str).map(String::from);

        let properties = prop
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::parse_schema_props(v)))
                    .collect()
            })
            .unwrap_or_default();

        let required = prop
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        // tuple-typed `items: [..]` is not a single item schema
        let items = prop
            .get("items")
            .filter(|v| v.is_object())
            .map(|v| Box::new(Self::parse_schema_props(v)));

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            other => AdditionalProperties::Schema(Box::new(Self::parse_schema_props(other))),
        });

        let x_preserve_unknown = prop
            .get("x-kubernetes-preserve-unknown-fields")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        SchemaProps {
            type_,
            description,
            format,
            properties,
            required,
            items,
            additional_properties,
            x_preserve_unknown,
        }
    }
}

/// Iterator over the CRDs of a multi-document YAML stream
///
/// Empty documents (a trailing `---`, comment-only blocks) are skipped.
pub struct CrdStream<'a> {
    documents: serde_yaml::Deserializer<'a>,
}

impl<'a> CrdStream<'a> {
    pub fn new(yaml: &'a str) -> Self {
        Self {
            documents: serde_yaml::Deserializer::from_str(yaml),
        }
    }
}

impl Iterator for CrdStream<'_> {
    type Item = Result<CrdDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let document = self.documents.next()?;
            match Value::deserialize(document) {
                Ok(Value::Null) => {
                    trace!("skipping empty document");
                    continue;
                }
                Ok(value) => return Some(CrdParser::parse_value(&value)),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
