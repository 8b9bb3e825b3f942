//! Model-side metadata the expression parser consumes.
//!
//! The schema layer that owns the full entity definitions is an external
//! collaborator; the parser needs only a narrow slice of it:
//! - [`EntityKind`] — the closed set of referenceable entity types, each
//!   carrying its lexical token pattern and disambiguation convention as data
//! - [`MathFun`] — the closed set of math functions expressions may call
//! - [`ExprContext`] — per owning-entity-type metadata: which kinds its
//!   expressions may reference and which functions are legal
//! - [`ObjectNamespace`] — the registered entity instances, grouped by kind
//!
//! Matching logic lives in `parser`; everything here is a pure description
//! plus the namespace storage.

mod context;
mod functions;
mod namespace;

pub use context::{
    FUNCTION_EXPRESSION, OBJECTIVE_FUNCTION, OBSERVABLE_EXPRESSION, RATE_LAW_EXPRESSION,
    STOP_CONDITION_EXPRESSION, ExprContext,
};
pub use functions::{FunctionArityError, MathFun};
pub use namespace::{ObjectNamespace, ResolvedId};

use smol_str::SmolStr;

use crate::parser::lexer::RawKind;

/// How identifiers are matched against namespace keys.
///
/// Captured once per parse and applied everywhere an identifier or a
/// disambiguation type name is compared to a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMatching {
    /// Identifiers must match stored keys exactly
    #[default]
    Sensitive,
    /// Identifiers match stored keys case-insensitively; the resolved id is
    /// always the stored (canonical) key
    Fold,
}

impl CaseMatching {
    pub fn matches(self, candidate: &str, key: &str) -> bool {
        match self {
            Self::Sensitive => candidate == key,
            Self::Fold => candidate.eq_ignore_ascii_case(key),
        }
    }
}

/// The closed set of model entity types an expression can reference.
///
/// Each kind is a descriptor: its display name, the lexical shape its
/// identifiers take in raw text, and whether references to it are written
/// with call syntax (`Function.id()`) or as a dotted name (`Type.id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Compartment,
    SpeciesType,
    Species,
    Parameter,
    Observable,
    Function,
    Reaction,
}

/// Token pattern for species-in-compartment identifiers: `name[name]`
const SPECIES_PATTERN: [RawKind; 4] = [
    RawKind::Name,
    RawKind::LBracket,
    RawKind::Name,
    RawKind::RBracket,
];

impl EntityKind {
    /// Every kind, in a fixed order (used for type-name disambiguation)
    pub const ALL: [Self; 7] = [
        Self::Compartment,
        Self::SpeciesType,
        Self::Species,
        Self::Parameter,
        Self::Observable,
        Self::Function,
        Self::Reaction,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Compartment => "Compartment",
            Self::SpeciesType => "SpeciesType",
            Self::Species => "Species",
            Self::Parameter => "Parameter",
            Self::Observable => "Observable",
            Self::Function => "Function",
            Self::Reaction => "Reaction",
        }
    }

    /// The structured token pattern this kind's identifiers must match, if
    /// any. Kinds without a pattern are referenced by a bare name.
    pub fn token_pattern(self) -> Option<&'static [RawKind]> {
        match self {
            Self::Species => Some(&SPECIES_PATTERN),
            Self::Compartment
            | Self::SpeciesType
            | Self::Parameter
            | Self::Observable
            | Self::Function
            | Self::Reaction => None,
        }
    }

    /// Whether disambiguated references to this kind use call syntax
    /// (`Function.id()`) rather than a dotted name (`Type.id`)
    pub const fn call_syntax(self) -> bool {
        matches!(self, Self::Function)
    }

    /// Find the kind named by a disambiguation prefix
    pub fn from_name(name: &str, matching: CaseMatching) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| matching.matches(name, kind.name()))
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ownership-free handle to an entity registered in an [`ObjectNamespace`].
///
/// The parser never owns entities; annotated tokens refer to them through
/// this id, which stays valid for the life of the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered model entity: its kind and canonical identifier.
///
/// Species synthesized from a species type + compartment pair also record
/// the component entities they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    kind: EntityKind,
    id: SmolStr,
    components: Option<(EntityId, EntityId)>,
}

impl Entity {
    pub(crate) fn new(kind: EntityKind, id: SmolStr) -> Self {
        Self {
            kind,
            id,
            components: None,
        }
    }

    pub(crate) fn composite(
        kind: EntityKind,
        id: SmolStr,
        species_type: EntityId,
        compartment: EntityId,
    ) -> Self {
        Self {
            kind,
            id,
            components: Some((species_type, compartment)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Canonical identifier, e.g. `atp[c]` for a species
    pub fn id(&self) -> &str {
        &self.id
    }

    /// For synthesized species: the (species type, compartment) pair
    pub fn components(&self) -> Option<(EntityId, EntityId)> {
        self.components
    }
}
