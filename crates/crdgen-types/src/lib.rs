//! crdgen types - schema to type resolution
//!
//! Turns the OpenAPI schemas of CustomResourceDefinitions into a
//! deduplicated graph of named types:
//! - `hooks`: classifies each schema node and resolves it to a draft type
//! - `TypeRegistry`: names, deduplicates and indexes the resolved types
//! - `generate_stream`: drives resolution over a CRD stream and hands each
//!   resolved kind to an `Emitter`
//!
//! # Example
//!
//! ```rust,no_run
//! use crdgen_core::CrdStream;
//! use crdgen_types::{CollectingEmitter, GenerateRequest, TypeRegistry, generate_stream};
//!
//! let yaml = std::fs::read_to_string("crds.yaml").unwrap();
//! let mut registry = TypeRegistry::with_known_types(Default::default());
//! let mut emitter = CollectingEmitter::new();
//! let report = generate_stream(
//!     &GenerateRequest::default(),
//!     &mut registry,
//!     CrdStream::new(&yaml),
//!     &mut emitter,
//! )
//! .unwrap();
//! println!("generated {:?}", report.generated);
//! ```

pub mod driver;
pub mod emit;
pub mod error;
pub mod hooks;
pub mod known;
pub mod model;
pub mod registry;

pub use driver::{
    FailedDocument, GenerateRequest, GenerationReport, ResolvedDocument, generate_stream,
    resolve_document,
};
pub use emit::{CollectingEmitter, EmittedDocument, Emitter, claim_new_types};
pub use error::{GenerateError, Result, TypeError};
pub use hooks::{SchemaNode, Shape, classify, resolve};
pub use model::{
    DescriptorKind, Draft, Field, FieldDescriptor, ImportBinding, Scalar, TypeDescriptor, TypeId,
    TypeKind, TypeNode, TypeRef, title,
};
pub use registry::TypeRegistry;
