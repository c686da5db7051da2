//! Type model
//!
//! Registered types live in the `TypeRegistry` arena and are addressed by
//! `TypeId`. A resolution hook never hands out a registered type directly:
//! it returns a `Draft`, and only `TypeRegistry::rename` turns a draft into
//! a `TypeRef`. Composite fields hold `TypeRef`s, so every type reachable
//! from a registered composite has itself gone through renaming.
//!
//! `TypeDescriptor` is the owned, serialisable view of a resolved graph that
//! is handed to emission.

use serde::Serialize;

use crdgen_core::ImportedType;

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    String,
    Int,
    Float,
    Bool,
}

impl Scalar {
    /// Name of the scalar in generated code
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "i64",
            Self::Float => "f64",
            Self::Bool => "bool",
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Where an externally defined type lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportBinding {
    pub alias: String,
    pub path: String,
}

impl ImportBinding {
    pub fn new(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            path: path.into(),
        }
    }
}

impl From<&ImportedType> for ImportBinding {
    fn from(imported: &ImportedType) -> Self {
        Self::new(imported.effective_alias(), imported.path.clone())
    }
}

/// Handle of a type registered in a `TypeRegistry`
///
/// Only the registry that issued a handle can resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

/// A renamed type: a scalar, a registered type, or a wrapper around one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Scalar(Scalar),
    Named(TypeId),
    Array(Box<TypeRef>),
    Map(Box<TypeRef>),
}

impl TypeRef {
    /// Innermost type below any array and map wrappers
    pub fn base(&self) -> &TypeRef {
        match self {
            Self::Array(element) | Self::Map(element) => element.base(),
            other => other,
        }
    }

    /// Registered type below any wrappers, if any
    pub fn named(&self) -> Option<TypeId> {
        match self.base() {
            Self::Named(id) => Some(*id),
            _ => None,
        }
    }
}

/// Structure of a registered (or about to be registered) type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Record with fields ordered by name
    Composite(Vec<Field>),
    /// Type whose structure is not modelled, only its name and binding
    Opaque,
    /// Name pre-bound to an external type, structure filled in on first use
    AutoImport,
}

/// A named type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub name: String,
    pub kind: TypeKind,
    pub import: Option<ImportBinding>,
}

impl TypeNode {
    /// Composite named `title(name)` with fields sorted by name
    pub fn composite(name: &str, mut fields: Vec<Field>) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            name: title(name),
            kind: TypeKind::Composite(fields),
            import: None,
        }
    }

    pub fn opaque(name: impl Into<String>, import: Option<ImportBinding>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Opaque,
            import,
        }
    }

    pub fn auto_import(name: impl Into<String>, import: ImportBinding) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::AutoImport,
            import: Some(import),
        }
    }

    pub fn with_import(mut self, import: ImportBinding) -> Self {
        self.import = Some(import);
        self
    }

    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            TypeKind::Composite(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Composite(_))
    }
}

/// A field of a composite
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Exported identifier (e.g., "OrgId")
    pub name: String,
    /// Original schema property key (e.g., "orgId")
    pub source_key: String,
    pub ty: TypeRef,
    pub required: bool,
    pub comment: String,
    /// Inlined into the parent on serialisation
    pub embedded: bool,
}

impl Field {
    /// Field named `title(key)` for the property `key`
    pub fn new(key: &str, ty: TypeRef) -> Self {
        Self {
            name: title(key),
            source_key: key.to_string(),
            ty,
            required: false,
            comment: String::new(),
            embedded: false,
        }
    }

    /// Embedded field named after the embedded type
    pub fn embedded(name: &str, source_key: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            source_key: source_key.to_string(),
            ty,
            required: false,
            comment: String::new(),
            embedded: true,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Output of a resolution hook, not yet registered
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    /// Already canonical (scalars, or a type renamed further down)
    Ref(TypeRef),
    /// Candidate for registration under its name
    Named(TypeNode),
    Array(Box<Draft>),
    Map(Box<Draft>),
}

impl Draft {
    pub fn scalar(scalar: Scalar) -> Self {
        Self::Ref(TypeRef::Scalar(scalar))
    }

    pub fn array(element: Draft) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn map(element: Draft) -> Self {
        Self::Map(Box::new(element))
    }
}

impl From<TypeRef> for Draft {
    fn from(ty: TypeRef) -> Self {
        Self::Ref(ty)
    }
}

/// Owned view of a resolved type graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: DescriptorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportBinding>,
}

impl TypeDescriptor {
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            DescriptorKind::Composite { fields } => fields,
            _ => &[],
        }
    }

    /// Field by exported name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            DescriptorKind::Array { element } | DescriptorKind::Map { element } => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DescriptorKind {
    Scalar { scalar: Scalar },
    Composite { fields: Vec<FieldDescriptor> },
    Array { element: Box<TypeDescriptor> },
    Map { element: Box<TypeDescriptor> },
    Opaque,
    AutoImport,
    /// Named type defined elsewhere in the same graph
    Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub source_key: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub embedded: bool,
}

/// Exported identifier form of a schema name
///
/// The first letter and every letter following a non-alphanumeric
/// separator is upper-cased; separators are dropped.
pub fn title(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            upper = true;
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        assert_eq!(title("arrayOfObjects"), "ArrayOfObjects");
        assert_eq!(title("v20231115"), "V20231115");
        assert_eq!(title("RootType"), "RootType");
        assert_eq!(title("max-size"), "MaxSize");
        assert_eq!(title("x_kubernetes.io"), "XKubernetesIo");
        assert_eq!(title(""), "");
    }

    #[test]
    fn test_composite_orders_fields_by_name() {
        let node = TypeNode::composite(
            "entry",
            vec![
                Field::new("orgId", TypeRef::Scalar(Scalar::String)),
                Field::new("Zone", TypeRef::Scalar(Scalar::String)),
                Field::new("name", TypeRef::Scalar(Scalar::String)),
            ],
        );
        assert_eq!(node.name, "Entry");
        let names: Vec<_> = node.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name", "OrgId", "Zone"]);
        assert_eq!(node.fields()[1].source_key, "orgId");
    }

    #[test]
    fn test_type_ref_base() {
        let nested = TypeRef::Array(Box::new(TypeRef::Map(Box::new(TypeRef::Named(TypeId(3))))));
        assert_eq!(nested.base(), &TypeRef::Named(TypeId(3)));
        assert_eq!(nested.named(), Some(TypeId(3)));
        assert_eq!(TypeRef::Scalar(Scalar::Bool).named(), None);
    }

    #[test]
    fn test_import_binding_from_imported_type() {
        let defaulted = ImportedType::new("Time", "k8s_openapi::apimachinery::pkg::apis::meta::v1");
        assert_eq!(ImportBinding::from(&defaulted).alias, "v1");

        let imported = ImportedType {
            name: "Secret".to_string(),
            path: "k8s_openapi::api::core::v1".to_string(),
            alias: Some("corev1".to_string()),
        };
        assert_eq!(ImportBinding::from(&imported).alias, "corev1");
    }
}
