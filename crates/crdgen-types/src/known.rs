//! Types every registry starts with
//!
//! Timestamps, raw JSON, the object meta types embedded in every root, the
//! status condition type and the two cross-resource reference types.

use crate::model::{Field, ImportBinding, Scalar, TypeNode, TypeRef};
use crate::registry::TypeRegistry;

/// Module of the Kubernetes object meta types
pub const METAV1_PATH: &str = "k8s_openapi::apimachinery::pkg::apis::meta::v1";
/// Module of the raw JSON value type
pub const APIEXTENSIONS_PATH: &str = "k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1";
/// Module the generated code expects the reference types in
pub const REFERENCES_PATH: &str = "crate::k8s";

/// Canonical format for timestamps
pub const DATETIME: &str = "datetime";

const FORMAT_ALIASES: &[(&str, &str)] = &[("date-time", DATETIME), ("datetime", DATETIME)];

/// Canonical spelling of a schema format, if it maps to a built-in type
pub fn canonical_format(format: &str) -> Option<&'static str> {
    FORMAT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == format)
        .map(|(_, canonical)| *canonical)
}

/// Built-in type for a canonical format
pub fn format_type(canonical: &str) -> Option<TypeNode> {
    match canonical {
        DATETIME => Some(time()),
        _ => None,
    }
}

fn metav1() -> ImportBinding {
    ImportBinding::new("metav1", METAV1_PATH)
}

fn references() -> ImportBinding {
    ImportBinding::new("k8s", REFERENCES_PATH)
}

pub fn time() -> TypeNode {
    TypeNode::opaque("Time", Some(metav1()))
}

/// Raw JSON value for unstructured and free-form map values
pub fn json() -> TypeNode {
    TypeNode::opaque("JSON", Some(ImportBinding::new("apiextensionsv1", APIEXTENSIONS_PATH)))
}

pub fn type_meta() -> TypeNode {
    TypeNode::opaque("TypeMeta", Some(metav1()))
}

pub fn object_meta() -> TypeNode {
    TypeNode::opaque("ObjectMeta", Some(metav1()))
}

fn string_field(key: &str) -> Field {
    Field::new(key, TypeRef::Scalar(Scalar::String))
}

/// Register the known types
pub(crate) fn seed(registry: &mut TypeRegistry) {
    let time = registry.add(time());
    registry.add(json());
    registry.add(type_meta());
    registry.add(object_meta());

    let condition = TypeNode::composite(
        "Condition",
        vec![
            Field::new("lastTransitionTime", TypeRef::Named(time)).required(true),
            string_field("message").required(true),
            Field::new("observedGeneration", TypeRef::Scalar(Scalar::Int)),
            string_field("reason").required(true),
            string_field("status").required(true),
            string_field("type").required(true),
        ],
    )
    .with_import(metav1());
    registry.add(condition);

    registry.add(
        TypeNode::composite("LocalReference", vec![string_field("name").required(true)])
            .with_import(references()),
    );
    registry.add(
        TypeNode::composite(
            "Reference",
            vec![string_field("name").required(true), string_field("namespace")],
        )
        .with_import(references()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_format() {
        assert_eq!(canonical_format("date-time"), Some(DATETIME));
        assert_eq!(canonical_format("datetime"), Some(DATETIME));
        assert_eq!(canonical_format("int64"), None);
        assert_eq!(format_type(DATETIME).map(|t| t.name), Some("Time".to_string()));
    }

    #[test]
    fn test_seeded_names() {
        let registry = TypeRegistry::with_known_types(Default::default());
        for name in ["Time", "JSON", "TypeMeta", "ObjectMeta", "Condition", "LocalReference", "Reference"] {
            let id = registry.lookup(name).unwrap_or_else(|| panic!("{} not seeded", name));
            assert!(registry.node(id).import.is_some());
        }
    }
}
