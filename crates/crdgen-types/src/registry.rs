//! Type registry
//!
//! Arena of named types for one generation run. Types are indexed by name
//! and by structural signature: two structurally equal types are registered
//! once, and no two registered types share a name. Entries are never
//! removed; the only in-place update is binding an auto-import placeholder
//! to the structure it is first used with.

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crdgen_core::ImportedType;

use crate::error::{Result, TypeError};
use crate::known;
use crate::model::{
    DescriptorKind, Draft, Field, FieldDescriptor, ImportBinding, TypeDescriptor, TypeId,
    TypeKind, TypeNode, TypeRef, title,
};

/// Named types of one generation run
#[derive(Debug, Default)]
pub struct TypeRegistry {
    nodes: Vec<TypeNode>,
    /// Signature of each node, by index
    signatures: Vec<String>,
    by_signature: HashMap<String, TypeId>,
    by_name: IndexMap<String, TypeId>,
    generated: HashSet<TypeId>,
    renames: BTreeMap<String, String>,
}

impl TypeRegistry {
    /// Empty registry applying the given forced names
    pub fn new(renames: BTreeMap<String, String>) -> Self {
        Self {
            renames,
            ..Default::default()
        }
    }

    /// Registry pre-populated with the known external types
    pub fn with_known_types(renames: BTreeMap<String, String>) -> Self {
        let mut registry = Self::new(renames);
        known::seed(&mut registry);
        registry
    }

    /// Register a type as is, without deduplication or renaming
    ///
    /// Used for seeding. A later type under the same name or signature
    /// takes over the index entry.
    pub fn add(&mut self, node: TypeNode) -> TypeId {
        let signature = self.node_signature(&node);
        let id = TypeId(self.nodes.len());
        self.by_name.insert(node.name.clone(), id);
        self.by_signature.insert(signature.clone(), id);
        self.nodes.push(node);
        self.signatures.push(signature);
        id
    }

    /// Make a name unavailable to generated types
    pub fn reserve(&mut self, name: &str) {
        if !self.by_name.contains_key(name) {
            debug!(name, "reserving type name");
            self.add(TypeNode::opaque(name, None));
        }
    }

    /// Claim a kind name for its root type
    ///
    /// Fails if a type generated for an earlier document already owns the
    /// name; reservations and external types do not count.
    pub fn reserve_kind(&mut self, kind: &str) -> Result<()> {
        if let Some(id) = self.lookup(kind) {
            let node = &self.nodes[id.0];
            if node.import.is_none() && node.is_composite() {
                return Err(TypeError::NameCollision {
                    name: kind.to_string(),
                    signature: self.signatures[id.0].clone(),
                    scope: Vec::new(),
                });
            }
        }
        self.reserve(kind);
        Ok(())
    }

    /// Pre-bind a name to an external type
    pub fn add_auto_import(&mut self, imported: &ImportedType) -> TypeId {
        debug!(name = %imported.name, path = %imported.path, "adding auto-import");
        self.add(TypeNode::auto_import(
            imported.name.clone(),
            ImportBinding::from(imported),
        ))
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Node of a handle issued by this registry
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    /// Type registered under a signature
    pub fn find_signature(&self, signature: &str) -> Option<TypeId> {
        self.by_signature.get(signature).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record that a type has been emitted
    ///
    /// Returns `false` if it already was.
    pub fn mark_generated(&mut self, id: TypeId) -> bool {
        self.generated.insert(id)
    }

    pub fn was_generated(&self, id: TypeId) -> bool {
        self.generated.contains(&id)
    }

    /// Canonicalise a draft into a registered type reference
    ///
    /// Scalars and already renamed types pass through. Array and map
    /// wrappers are transparent: their element is renamed at the same
    /// scope. A named draft is, in order:
    /// 1. given its forced name if the rename table has one
    /// 2. bound into an auto-import placeholder of the same name
    /// 3. deduplicated against a structurally equal registered type
    /// 4. registered under the first free name, prefixing the title-cased
    ///    scope elements innermost first
    pub fn rename(&mut self, scope: &[String], draft: Draft) -> Result<TypeRef> {
        match draft {
            Draft::Ref(ty) => Ok(ty),
            Draft::Array(element) => Ok(TypeRef::Array(Box::new(self.rename(scope, *element)?))),
            Draft::Map(element) => Ok(TypeRef::Map(Box::new(self.rename(scope, *element)?))),
            Draft::Named(node) => self.register(scope, node).map(TypeRef::Named),
        }
    }

    fn register(&mut self, scope: &[String], mut node: TypeNode) -> Result<TypeId> {
        if let Some(forced) = self.renames.get(&node.name) {
            debug!(from = %node.name, to = %forced, "applying forced rename");
            node.name = forced.clone();
        }

        if let Some(id) = self.lookup(&node.name) {
            if matches!(self.nodes[id.0].kind, TypeKind::AutoImport) {
                return Ok(self.bind_auto_import(id, node));
            }
        }

        let signature = self.node_signature(&node);
        if let Some(id) = self.find_signature(&signature) {
            let Some(existing) = self.nodes.get(id.0) else {
                return Err(TypeError::Inconsistent { signature });
            };
            debug!(name = %node.name, existing = %existing.name, "reusing structurally equal type");
            return Ok(id);
        }

        node.name = self.free_name(scope, &node.name, &signature)?;
        Ok(self.insert(node, signature))
    }

    /// Register a composite as a type of its own
    ///
    /// Unlike `rename`, the node is never merged into a structurally equal
    /// type nor bound to an auto-import. Its fields must already be renamed.
    /// A taken name gets a scope prefix as usual.
    pub fn register_distinct(&mut self, scope: &[String], mut node: TypeNode) -> Result<TypeId> {
        let signature = self.node_signature(&node);
        node.name = self.free_name(scope, &node.name, &signature)?;
        Ok(self.insert(node, signature))
    }

    fn insert(&mut self, node: TypeNode, signature: String) -> TypeId {
        let id = TypeId(self.nodes.len());
        debug!(name = %node.name, %signature, "registering type");
        self.by_name.insert(node.name.clone(), id);
        self.by_signature.entry(signature.clone()).or_insert(id);
        self.nodes.push(node);
        self.signatures.push(signature);
        id
    }

    /// Give an auto-import placeholder the structure of its first use
    fn bind_auto_import(&mut self, id: TypeId, draft: TypeNode) -> TypeId {
        let placeholder = &mut self.nodes[id.0];
        debug!(name = %placeholder.name, "binding auto-import");
        placeholder.kind = draft.kind;
        let signature = self.node_signature(&self.nodes[id.0]);
        self.by_signature.entry(signature.clone()).or_insert(id);
        self.signatures[id.0] = signature;
        id
    }

    fn free_name(&self, scope: &[String], name: &str, signature: &str) -> Result<String> {
        let mut candidate = name.to_string();
        let mut parents = scope.iter().rev();
        while self.by_name.contains_key(&candidate) {
            let Some(parent) = parents.next() else {
                return Err(TypeError::NameCollision {
                    name: name.to_string(),
                    signature: signature.to_string(),
                    scope: scope.to_vec(),
                });
            };
            candidate = format!("{}{}", title(parent), candidate);
        }
        Ok(candidate)
    }

    /// Structural signature of a type reference
    pub fn signature(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Scalar(scalar) => scalar.type_name().to_string(),
            TypeRef::Named(id) => self.signatures[id.0].clone(),
            TypeRef::Array(element) => format!("[{}]", self.signature(element)),
            TypeRef::Map(element) => format!("map[{}]", self.signature(element)),
        }
    }

    /// Structural signature of a named type
    ///
    /// Composites are identified by their fields, so equal structures with
    /// different names share a signature. A composite without fields is
    /// only identified by its name.
    pub fn node_signature(&self, node: &TypeNode) -> String {
        match &node.kind {
            TypeKind::Composite(fields) if fields.is_empty() => format!("{{{}}}", node.name),
            TypeKind::Composite(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}:{}", f.name, self.signature(&f.ty)))
                    .collect();
                format!("{{{}}}", fields.join(","))
            }
            TypeKind::Opaque | TypeKind::AutoImport => match &node.import {
                Some(import) => format!("{}.{}", import.path, node.name),
                None => node.name.clone(),
            },
        }
    }

    /// Full view of a type, with every named type expanded
    pub fn describe(&self, ty: &TypeRef) -> TypeDescriptor {
        self.describe_with(ty, &|registry: &Self, id: TypeId| {
            registry.describe_node(registry.node(id))
        })
    }

    /// Full view of a named type
    pub fn describe_node(&self, node: &TypeNode) -> TypeDescriptor {
        self.node_descriptor(node, &|registry: &Self, ty: &TypeRef| registry.describe(ty))
    }

    /// View of a named type whose fields refer to other named types by name
    pub fn describe_definition(&self, id: TypeId) -> TypeDescriptor {
        self.node_descriptor(self.node(id), &|registry: &Self, ty: &TypeRef| {
            registry.describe_reference(ty)
        })
    }

    fn describe_reference(&self, ty: &TypeRef) -> TypeDescriptor {
        self.describe_with(ty, &|registry: &Self, id: TypeId| {
            let node = registry.node(id);
            TypeDescriptor {
                name: node.name.clone(),
                kind: DescriptorKind::Reference,
                import: node.import.clone(),
            }
        })
    }

    fn describe_with(
        &self,
        ty: &TypeRef,
        named: &dyn Fn(&Self, TypeId) -> TypeDescriptor,
    ) -> TypeDescriptor {
        match ty {
            TypeRef::Scalar(scalar) => TypeDescriptor {
                name: scalar.type_name().to_string(),
                kind: DescriptorKind::Scalar { scalar: *scalar },
                import: None,
            },
            TypeRef::Named(id) => named(self, *id),
            TypeRef::Array(element) => TypeDescriptor {
                name: "array".to_string(),
                kind: DescriptorKind::Array {
                    element: Box::new(self.describe_with(element, named)),
                },
                import: None,
            },
            TypeRef::Map(element) => TypeDescriptor {
                name: "map".to_string(),
                kind: DescriptorKind::Map {
                    element: Box::new(self.describe_with(element, named)),
                },
                import: None,
            },
        }
    }

    fn node_descriptor(
        &self,
        node: &TypeNode,
        field_type: &dyn Fn(&Self, &TypeRef) -> TypeDescriptor,
    ) -> TypeDescriptor {
        let kind = match &node.kind {
            TypeKind::Composite(fields) => DescriptorKind::Composite {
                fields: fields
                    .iter()
                    .map(|f| field_descriptor(f, field_type(self, &f.ty)))
                    .collect(),
            },
            TypeKind::Opaque => DescriptorKind::Opaque,
            TypeKind::AutoImport => DescriptorKind::AutoImport,
        };
        TypeDescriptor {
            name: node.name.clone(),
            kind,
            import: node.import.clone(),
        }
    }

    /// Named types reachable from the fields, depth first, each once
    pub fn dependencies(&self, fields: &[Field]) -> Vec<TypeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for field in fields {
            self.collect_named(&field.ty, &mut seen, &mut order);
        }
        order
    }

    fn collect_named(&self, ty: &TypeRef, seen: &mut HashSet<TypeId>, order: &mut Vec<TypeId>) {
        let Some(id) = ty.named() else {
            return;
        };
        if !seen.insert(id) {
            return;
        }
        order.push(id);
        for field in self.node(id).fields() {
            self.collect_named(&field.ty, seen, order);
        }
    }
}

fn field_descriptor(field: &Field, ty: TypeDescriptor) -> FieldDescriptor {
    FieldDescriptor {
        name: field.name.clone(),
        source_key: field.source_key.clone(),
        ty,
        required: field.required,
        comment: field.comment.clone(),
        embedded: field.embedded,
    }
}
