//! crdgen core - input model for the type generator
//!
//! This crate provides the inputs the resolution engine consumes:
//! - `SchemaProps`: one OpenAPI v3 schema node (the shape-relevant keywords)
//! - `CrdDocument`: a parsed CustomResourceDefinition with its versions
//! - `CrdStream`: framing of a multi-document YAML stream into CRDs
//! - `GenerateConfig`: renames, reserved names, imports and skip list

pub mod config;
pub mod error;
pub mod parser;
pub mod schema;

pub use config::{ErrorPolicy, GenerateConfig, ImportedType};
pub use error::{CoreError, Result};
pub use parser::{CrdParser, CrdStream};
pub use schema::{AdditionalProperties, CrdDocument, CrdNames, CrdVersion, PropertyType, SchemaProps};
