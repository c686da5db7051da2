//! CRD schema representation
//!
//! Structured types for CustomResourceDefinition documents and the
//! OpenAPI v3 property trees they carry. Only the keywords that decide a
//! value's shape are kept: type, properties, required, items,
//! additionalProperties, format, description and the preserve-unknown flag.

use std::collections::BTreeMap;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdDocument {
    /// Full CRD name (e.g., "groups.atlas.generated.mongodb.com")
    pub name: String,
    /// API group (e.g., "atlas.generated.mongodb.com")
    pub group: String,
    /// Resource names (kind, plural, singular, listKind)
    pub names: CrdNames,
    /// API versions with their schemas, in declaration order
    pub versions: Vec<CrdVersion>,
}

impl CrdDocument {
    /// Kind of the custom resource
    pub fn kind(&self) -> &str {
        &self.names.kind
    }

    /// Select the version to generate from.
    ///
    /// An empty request picks the first declared version. Returns `None`
    /// when there are no versions or the requested one is not declared.
    pub fn select_version(&self, requested: &str) -> Option<&CrdVersion> {
        if requested.is_empty() {
            return self.versions.first();
        }
        self.versions.iter().find(|v| v.name == requested)
    }

    /// Output file name for this kind (e.g., "group.yaml")
    pub fn filename(&self) -> String {
        format!("{}.yaml", self.names.kind.to_lowercase())
    }

    /// `group/version/plural` identity of the given version
    pub fn gvr(&self, version: &str) -> String {
        let gvr = format!("{}/{}/{}", self.group, version, self.names.plural);
        gvr.trim_start_matches('/').to_string()
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "Group")
    pub kind: String,
    /// Plural name (e.g., "groups")
    pub plural: String,
    /// Singular name (e.g., "group")
    pub singular: Option<String>,
    /// List kind (e.g., "GroupList")
    pub list_kind: Option<String>,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersion {
    /// Version name (e.g., "v1", "v1beta1")
    pub name: String,
    /// Whether this version is served by the API server
    pub served: bool,
    /// Whether this is the storage version
    pub storage: bool,
    /// Root `openAPIV3Schema` node
    pub schema: Option<SchemaProps>,
}

impl CrdVersion {
    /// Get the root spec schema if present
    pub fn spec_schema(&self) -> Option<&SchemaProps> {
        self.schema.as_ref().and_then(|s| s.properties.get("spec"))
    }

    /// Get the root status schema if present
    pub fn status_schema(&self) -> Option<&SchemaProps> {
        self.schema.as_ref().and_then(|s| s.properties.get("status"))
    }
}

/// Schema for a single value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProps {
    /// Declared type
    pub type_: PropertyType,
    /// Human-readable description
    pub description: Option<String>,
    /// Format hint (e.g., "date-time", "int64")
    pub format: Option<String>,
    /// Nested object properties, ordered by key
    pub properties: BTreeMap<String, SchemaProps>,
    /// Required nested properties
    pub required: Vec<String>,
    /// Array item schema
    pub items: Option<Box<SchemaProps>>,
    /// Additional properties for objects
    pub additional_properties: Option<AdditionalProperties>,
    /// x-kubernetes-preserve-unknown-fields
    pub x_preserve_unknown: bool,
}

impl SchemaProps {
    fn of(type_: PropertyType) -> Self {
        Self {
            type_,
            ..Default::default()
        }
    }

    /// Create a simple string property
    pub fn string() -> Self {
        Self::of(PropertyType::String)
    }

    /// Create a simple integer property
    pub fn integer() -> Self {
        Self::of(PropertyType::Integer)
    }

    /// Create a simple number property
    pub fn number() -> Self {
        Self::of(PropertyType::Number)
    }

    /// Create a simple boolean property
    pub fn boolean() -> Self {
        Self::of(PropertyType::Boolean)
    }

    /// Create an object property with nested properties
    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaProps)>,
    {
        Self {
            type_: PropertyType::Object,
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
            ..Default::default()
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProps) -> Self {
        Self {
            type_: PropertyType::Array,
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Create an object whose values follow `values` (`additionalProperties: {...}`)
    pub fn map_of(values: SchemaProps) -> Self {
        Self {
            type_: PropertyType::Object,
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Default::default()
        }
    }

    /// Create an object accepting any values (`additionalProperties: true`)
    pub fn map_of_any() -> Self {
        Self {
            type_: PropertyType::Object,
            additional_properties: Some(AdditionalProperties::Allowed),
            ..Default::default()
        }
    }

    /// Create an object with arbitrary unknown structure
    pub fn preserve_unknown() -> Self {
        Self {
            type_: PropertyType::Object,
            x_preserve_unknown: true,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_required<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = required.into_iter().map(Into::into).collect();
        self
    }

    /// Check if this property has nested properties
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Check if a nested property is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    /// Unknown or unsupported type
    Unknown(String),
}

impl PropertyType {
    /// Parse from string representation
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Additional properties configuration for objects
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `additionalProperties: true`
    Allowed,
    /// `additionalProperties: false`
    Denied,
    /// Values must match a schema
    Schema(Box<SchemaProps>),
}
