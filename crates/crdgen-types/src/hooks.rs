//! Schema resolution hooks
//!
//! Each schema node is classified into exactly one shape, checked in a fixed
//! priority order, and resolved by the hook for that shape. Hooks return
//! unregistered drafts; nested types are registered through
//! `TypeRegistry::rename` before they are referenced by a parent.

use tracing::trace;

use crdgen_core::{AdditionalProperties, PropertyType, SchemaProps};

use crate::error::{Result, TypeError};
use crate::known;
use crate::model::{Draft, Field, Scalar, TypeNode};
use crate::registry::TypeRegistry;

/// A schema node being resolved
#[derive(Debug, Clone)]
pub struct SchemaNode<'a> {
    /// Name the resolved type is given
    pub name: String,
    /// Enclosing type names, outermost first
    pub scope: Vec<String>,
    pub schema: &'a SchemaProps,
}

impl<'a> SchemaNode<'a> {
    pub fn new(name: impl Into<String>, scope: Vec<String>, schema: &'a SchemaProps) -> Self {
        Self {
            name: name.into(),
            scope,
            schema,
        }
    }

    /// Scope of this node's children
    pub fn child_scope(&self) -> Vec<String> {
        let mut scope = self.scope.clone();
        scope.push(self.name.clone());
        scope
    }
}

/// Shape of a schema node, in hook priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Object with no properties that preserves unknown fields
    Unstructured,
    /// Object with `additionalProperties` allowed or constrained
    Map,
    /// String with a date-time format
    Timestamp,
    /// Non-object, non-array schema type
    Scalar,
    /// Object with properties
    Composite,
    /// Array with an item schema
    Array,
    Unsupported,
}

/// Classify a schema node
///
/// `additionalProperties: false` does not make an object a map.
/// Unrecognised type names classify as scalars so that the scalar hook
/// reports them.
pub fn classify(schema: &SchemaProps) -> Shape {
    let object = schema.type_ == PropertyType::Object;
    if object && !schema.has_properties() && schema.x_preserve_unknown {
        return Shape::Unstructured;
    }
    if object
        && matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Allowed | AdditionalProperties::Schema(_))
        )
    {
        return Shape::Map;
    }
    if schema.type_ == PropertyType::String && timestamp_format(schema).is_some() {
        return Shape::Timestamp;
    }
    if !matches!(schema.type_, PropertyType::Object | PropertyType::Array) {
        return Shape::Scalar;
    }
    if object && schema.has_properties() {
        return Shape::Composite;
    }
    if schema.type_ == PropertyType::Array && schema.items.is_some() {
        return Shape::Array;
    }
    Shape::Unsupported
}

fn timestamp_format(schema: &SchemaProps) -> Option<&'static str> {
    schema
        .format
        .as_deref()
        .and_then(known::canonical_format)
        .filter(|format| *format == known::DATETIME)
}

/// Resolve a schema node to a draft
///
/// Errors are wrapped with the node name.
pub fn resolve(registry: &mut TypeRegistry, node: &SchemaNode<'_>) -> Result<Draft> {
    let shape = classify(node.schema);
    trace!(name = %node.name, ?shape, "resolving schema node");
    let resolved = match shape {
        Shape::Unstructured => Ok(resolve_unstructured()),
        Shape::Map => resolve_map(registry, node),
        Shape::Timestamp => resolve_timestamp(node),
        Shape::Scalar => resolve_scalar(&node.schema.type_),
        Shape::Composite => resolve_composite(registry, node),
        Shape::Array => resolve_array(registry, node),
        Shape::Unsupported => {
            return Err(TypeError::UnsupportedShape {
                name: node.name.clone(),
            });
        }
    };
    resolved.map_err(|e| TypeError::resolve(&node.name, e))
}

/// Raw JSON value
pub fn resolve_unstructured() -> Draft {
    Draft::Named(known::json())
}

/// Map keyed by string; `additionalProperties: true` gives raw JSON values
///
/// The value schema is resolved under the map's own name and scope.
pub fn resolve_map(registry: &mut TypeRegistry, node: &SchemaNode<'_>) -> Result<Draft> {
    let values = match &node.schema.additional_properties {
        Some(AdditionalProperties::Schema(values)) => values,
        _ => return Ok(Draft::map(resolve_unstructured())),
    };
    let value_node = SchemaNode::new(node.name.clone(), node.scope.clone(), values);
    let element = resolve(registry, &value_node).map_err(|e| TypeError::MapValue {
        name: node.name.clone(),
        source: Box::new(e),
    })?;
    Ok(Draft::map(element))
}

/// Built-in type for the node's format
pub fn resolve_timestamp(node: &SchemaNode<'_>) -> Result<Draft> {
    timestamp_format(node.schema)
        .and_then(known::format_type)
        .map(Draft::Named)
        .ok_or_else(|| TypeError::UnsupportedShape {
            name: node.name.clone(),
        })
}

pub fn resolve_scalar(kind: &PropertyType) -> Result<Draft> {
    let scalar = match kind {
        PropertyType::String => Scalar::String,
        PropertyType::Integer => Scalar::Int,
        PropertyType::Number => Scalar::Float,
        PropertyType::Boolean => Scalar::Bool,
        other => {
            return Err(TypeError::UnsupportedKind {
                kind: other.to_string(),
            });
        }
    };
    Ok(Draft::scalar(scalar))
}

/// Composite with one field per property
///
/// Each property is resolved under its own key with this node appended to
/// the scope, and renamed at that scope before it becomes a field.
pub fn resolve_composite(registry: &mut TypeRegistry, node: &SchemaNode<'_>) -> Result<Draft> {
    let scope = node.child_scope();
    let mut fields = Vec::with_capacity(node.schema.properties.len());
    for (key, props) in &node.schema.properties {
        let child = SchemaNode::new(key.clone(), scope.clone(), props);
        let draft = resolve(registry, &child)?;
        let ty = registry
            .rename(&scope, draft)
            .map_err(|e| TypeError::field(key, e))?;
        let mut field = Field::new(key, ty).required(node.schema.is_required(key));
        if let Some(description) = &props.description {
            field = field.with_comment(description.clone());
        }
        fields.push(field);
    }
    Ok(Draft::Named(TypeNode::composite(&node.name, fields)))
}

/// Array of the item type
///
/// The item schema is resolved under the array's name with an empty scope,
/// then renamed at the array's own scope: the array adds no scope level.
pub fn resolve_array(registry: &mut TypeRegistry, node: &SchemaNode<'_>) -> Result<Draft> {
    let items = node
        .schema
        .items
        .as_deref()
        .ok_or_else(|| TypeError::MissingItems {
            name: node.name.clone(),
        })?;
    let element_error = |e| TypeError::ArrayElement {
        name: node.name.clone(),
        source: Box::new(e),
    };
    let item_node = SchemaNode::new(node.name.clone(), Vec::new(), items);
    let draft = resolve(registry, &item_node).map_err(element_error)?;
    let element = registry.rename(&node.scope, draft).map_err(element_error)?;
    Ok(Draft::array(Draft::Ref(element)))
}
