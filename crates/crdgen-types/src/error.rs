//! Error types for crdgen-types

use miette::Diagnostic;
use thiserror::Error;

use crdgen_core::CoreError;

/// Result type for type resolution
pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors raised while resolving and registering types
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TypeError {
    /// No resolution hook accepts the schema node
    #[error("unsupported schema shape for '{name}'")]
    UnsupportedShape { name: String },

    /// Schema type is not string, integer, number or boolean
    #[error("unsupported OpenAPI kind '{kind}'")]
    UnsupportedKind { kind: String },

    /// Array without an item schema
    #[error("array '{name}' has no items schema")]
    MissingItems { name: String },

    /// Every scope-prefixed candidate name is taken
    #[error("failed to find a free name for type {name} {signature} (tried prefixes {scope:?})")]
    NameCollision {
        name: String,
        signature: String,
        scope: Vec<String>,
    },

    /// Signature index points at a type the registry does not hold
    #[error("registry is inconsistent: signature {signature} has no type")]
    Inconsistent { signature: String },

    /// Node resolution failed
    #[error("failed to resolve {name}: {source}")]
    Resolve {
        name: String,
        #[source]
        source: Box<TypeError>,
    },

    /// A composite field failed to register
    #[error("failed to parse {key} type: {source}")]
    Field {
        key: String,
        #[source]
        source: Box<TypeError>,
    },

    /// An array element failed to resolve
    #[error("failed to parse array {name} element type: {source}")]
    ArrayElement {
        name: String,
        #[source]
        source: Box<TypeError>,
    },

    /// A map value failed to resolve
    #[error("failed to parse map {name} value type: {source}")]
    MapValue {
        name: String,
        #[source]
        source: Box<TypeError>,
    },
}

impl TypeError {
    pub(crate) fn resolve(name: &str, source: TypeError) -> Self {
        Self::Resolve {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn field(key: &str, source: TypeError) -> Self {
        Self::Field {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    /// The error at the bottom of the context chain
    pub fn innermost(&self) -> &TypeError {
        match self {
            Self::Resolve { source, .. }
            | Self::Field { source, .. }
            | Self::ArrayElement { source, .. }
            | Self::MapValue { source, .. } => source.innermost(),
            other => other,
        }
    }
}

/// Errors raised while generating types from a CRD stream
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum GenerateError {
    /// The stream could not be framed or a document could not be parsed
    #[error("failed to read CRD: {0}")]
    #[diagnostic(code(crdgen::input))]
    Input(#[from] CoreError),

    /// The CRD declares no versions
    #[error("no versions to generate code from in {kind}")]
    #[diagnostic(code(crdgen::no_versions))]
    NoVersions { kind: String },

    /// The requested version is not declared
    #[error("no version {version:?} to generate code from in {kind}")]
    #[diagnostic(code(crdgen::version_not_found))]
    VersionNotFound {
        kind: String,
        version: String,
        #[help]
        help: Option<String>,
    },

    /// The selected version has no openAPIV3Schema
    #[error("version {version} of {kind} has no openAPIV3Schema")]
    #[diagnostic(code(crdgen::missing_schema))]
    MissingSchema { kind: String, version: String },

    /// Spec or status resolution failed
    #[error("failed to generate {kind}: {source}")]
    #[diagnostic(code(crdgen::resolve))]
    Resolve {
        kind: String,
        #[source]
        source: TypeError,
    },

    /// The emitter rejected a document
    #[error("failed to emit {kind}: {message}")]
    #[diagnostic(code(crdgen::emit))]
    Emit { kind: String, message: String },

    /// Nothing was generated
    #[error("no CRDs were generated ({skipped} skipped, {failed} failed)")]
    #[diagnostic(
        code(crdgen::empty),
        help("check that the input holds CustomResourceDefinitions and that the skip list does not exclude all of them")
    )]
    EmptyStream { skipped: usize, failed: usize },
}

impl GenerateError {
    pub fn emit(kind: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Emit {
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn resolve(kind: &str, source: TypeError) -> Self {
        Self::Resolve {
            kind: kind.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost() {
        let err = TypeError::resolve(
            "GroupSpec",
            TypeError::field("entry", TypeError::UnsupportedKind { kind: "int-or-string".into() }),
        );
        assert!(matches!(err.innermost(), TypeError::UnsupportedKind { .. }));
        assert_eq!(
            err.to_string(),
            "failed to resolve GroupSpec: failed to parse entry type: unsupported OpenAPI kind 'int-or-string'"
        );
    }

    #[test]
    fn test_version_help() {
        let err = GenerateError::VersionNotFound {
            kind: "Group".into(),
            version: "v2".into(),
            help: Some("available versions: v1".into()),
        };
        assert_eq!(err.to_string(), "no version \"v2\" to generate code from in Group");
        assert_eq!(err.help().map(|h| h.to_string()).as_deref(), Some("available versions: v1"));
    }
}
