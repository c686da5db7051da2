//! Emission seam
//!
//! The driver hands every resolved document to an `Emitter`. Emitters use
//! the registry's generated markers so that a named type shared by several
//! documents is only written out once.

use crate::driver::{GenerationReport, ResolvedDocument};
use crate::error::GenerateError;
use crate::model::TypeDescriptor;
use crate::registry::TypeRegistry;

/// Receives resolved documents from the stream driver
pub trait Emitter {
    fn emit(
        &mut self,
        registry: &mut TypeRegistry,
        document: &ResolvedDocument,
    ) -> Result<(), GenerateError>;

    /// Called once after the last document
    fn finish(
        &mut self,
        _registry: &mut TypeRegistry,
        _report: &GenerationReport,
    ) -> Result<(), GenerateError> {
        Ok(())
    }
}

/// Definitions of the local types a document needs that no earlier
/// document emitted, marking them generated
///
/// Types bound to an external module are never emitted.
pub fn claim_new_types(registry: &mut TypeRegistry, document: &ResolvedDocument) -> Vec<TypeDescriptor> {
    let mut definitions = Vec::new();
    for &id in &document.dependencies {
        let node = registry.node(id);
        if node.import.is_some() || !node.is_composite() {
            continue;
        }
        if registry.mark_generated(id) {
            definitions.push(registry.describe_definition(id));
        }
    }
    definitions
}

/// A document as handed to an emitter, with the types it introduced
#[derive(Debug, Clone)]
pub struct EmittedDocument {
    pub document: ResolvedDocument,
    pub new_types: Vec<TypeDescriptor>,
}

/// Emitter keeping everything in memory
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub documents: Vec<EmittedDocument>,
    pub report: Option<GenerationReport>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, kind: &str) -> Option<&EmittedDocument> {
        self.documents.iter().find(|d| d.document.kind == kind)
    }
}

impl Emitter for CollectingEmitter {
    fn emit(
        &mut self,
        registry: &mut TypeRegistry,
        document: &ResolvedDocument,
    ) -> Result<(), GenerateError> {
        let new_types = claim_new_types(registry, document);
        self.documents.push(EmittedDocument {
            document: document.clone(),
            new_types,
        });
        Ok(())
    }

    fn finish(
        &mut self,
        _registry: &mut TypeRegistry,
        report: &GenerationReport,
    ) -> Result<(), GenerateError> {
        self.report = Some(report.clone());
        Ok(())
    }
}
