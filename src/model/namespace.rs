//! Object namespace: registered entity instances, grouped by kind.
//!
//! Entities live in an arena and are referred to by [`EntityId`] handles;
//! per-kind id maps are insertion-ordered, and the order in which kinds are
//! first declared is the order ambiguity reports enumerate candidates in.
//!
//! The namespace is read-only during a parse except for one designed side
//! effect: [`ObjectNamespace::get_or_create_species`] synthesizes a species
//! from a species type + compartment pair the first time a structured
//! identifier like `atp[c]` is resolved. The operation is idempotent; a
//! re-parse returns the already-synthesized entity.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::trace;

use super::{CaseMatching, Entity, EntityId, EntityKind};

/// One hit from resolving an identifier across the namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub kind: EntityKind,
    /// The canonical (stored) identifier the candidate matched
    pub id: SmolStr,
    pub entity: EntityId,
}

/// Mapping from entity kind to its registered instances, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectNamespace {
    arena: Vec<Entity>,
    kinds: IndexMap<EntityKind, IndexMap<SmolStr, EntityId>>,
}

impl ObjectNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a kind without registering any instances.
    ///
    /// Declaration order is observable: it fixes the order of ambiguity
    /// reports and of the referenced-object groups a parse produces.
    pub fn declare(&mut self, kind: EntityKind) {
        self.kinds.entry(kind).or_default();
    }

    /// Register an entity, returning its handle. Idempotent: re-inserting an
    /// existing identifier returns the existing entity.
    pub fn insert(&mut self, kind: EntityKind, id: &str) -> EntityId {
        self.declare(kind);
        if let Some(&existing) = self.kinds[&kind].get(id) {
            return existing;
        }
        let entity = EntityId::new(self.arena.len());
        self.arena.push(Entity::new(kind, SmolStr::new(id)));
        self.kinds[&kind].insert(SmolStr::new(id), entity);
        entity
    }

    /// Exact-match lookup
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<EntityId> {
        self.kinds.get(&kind)?.get(id).copied()
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.arena[id.index()]
    }

    /// Declared kinds, in declaration order
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.kinds.keys().copied()
    }

    pub fn contains_kind(&self, kind: EntityKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Registered identifiers of one kind, in insertion order
    pub fn ids(&self, kind: EntityKind) -> impl Iterator<Item = &SmolStr> + '_ {
        self.kinds.get(&kind).into_iter().flat_map(IndexMap::keys)
    }

    /// Look `candidate` up in one kind's id map under the given matching
    /// policy. Returns the canonical stored key and the entity handle.
    ///
    /// Under case-fold matching an exact hit wins over a folded one, and the
    /// first folded hit in insertion order wins among collisions.
    pub fn lookup(
        &self,
        kind: EntityKind,
        candidate: &str,
        matching: CaseMatching,
    ) -> Option<(SmolStr, EntityId)> {
        let map = self.kinds.get(&kind)?;
        if let Some((key, &entity)) = map.get_key_value(candidate) {
            return Some((key.clone(), entity));
        }
        match matching {
            CaseMatching::Sensitive => None,
            CaseMatching::Fold => map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(candidate))
                .map(|(key, &entity)| (key.clone(), entity)),
        }
    }

    /// Resolve an identifier against every declared kind, in declaration
    /// order. Zero hits means the identifier is unresolved; more than one
    /// is an ambiguity the caller must report or disambiguate.
    pub fn resolve(&self, candidate: &str, matching: CaseMatching) -> Vec<ResolvedId> {
        let hits: Vec<ResolvedId> = self
            .kinds
            .keys()
            .filter_map(|&kind| {
                self.lookup(kind, candidate, matching)
                    .map(|(id, entity)| ResolvedId { kind, id, entity })
            })
            .collect();
        trace!(
            "[RESOLVE] '{}' -> {} hit(s): {:?}",
            candidate,
            hits.len(),
            hits.iter().map(|hit| hit.kind).collect::<Vec<_>>()
        );
        hits
    }

    /// Get or create the species `type[compartment]`.
    ///
    /// Returns `None` when either component does not resolve; the caller
    /// then reports the whole identifier as unresolved. Idempotent: the
    /// composite id is looked up (exact match on the canonical components)
    /// before anything is created.
    pub fn get_or_create_species(
        &mut self,
        type_ident: &str,
        compartment_ident: &str,
        matching: CaseMatching,
    ) -> Option<EntityId> {
        let (type_key, type_id) = self.lookup(EntityKind::SpeciesType, type_ident, matching)?;
        let (compartment_key, compartment_id) =
            self.lookup(EntityKind::Compartment, compartment_ident, matching)?;

        let composite = SmolStr::new(format!("{type_key}[{compartment_key}]"));
        if let Some(&existing) = self
            .kinds
            .get(&EntityKind::Species)
            .and_then(|map| map.get(&composite))
        {
            return Some(existing);
        }

        trace!("[SYNTHESIZE] species '{}'", composite);
        self.declare(EntityKind::Species);
        let entity = EntityId::new(self.arena.len());
        self.arena.push(Entity::composite(
            EntityKind::Species,
            composite.clone(),
            type_id,
            compartment_id,
        ));
        self.kinds[&EntityKind::Species].insert(composite, entity);
        Some(entity)
    }
}
