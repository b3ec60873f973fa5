//! Classification state of one named class.

use crate::name::{NameId, Names};
use crate::structure::Description;
use oxrdf::NamedNode;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Dense handle of an [`ActiveClass`] inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    /// The `owl:Thing` root of the hierarchy.
    pub const ROOT: Self = Self(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or_else(|_| unreachable!("more than 2^32 classes")))
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A named class and its current position in the hierarchy.
#[derive(Debug, Clone)]
pub struct ActiveClass {
    name: NameId,
    iri: NamedNode,
    /// Everything known to hold for the class: its own name, its definitions
    /// and its asserted super expressions, merged into one conjunction.
    profile: Description,
    definitions: BTreeSet<Description>,
    /// Smallest nested name count among the definitions, used for ordering.
    simplest_definition: Option<usize>,
    pub(super) equivalents: FxHashSet<ClassId>,
    pub(super) supers: FxHashSet<ClassId>,
    pub(super) subs: FxHashSet<ClassId>,
}

impl ActiveClass {
    pub fn new(
        name: NameId,
        iri: NamedNode,
        profile: Description,
        definitions: BTreeSet<Description>,
    ) -> Self {
        let simplest_definition = definitions.iter().map(Description::nested_name_count).min();
        Self {
            name,
            iri,
            profile,
            definitions,
            simplest_definition,
            equivalents: FxHashSet::default(),
            supers: FxHashSet::default(),
            subs: FxHashSet::default(),
        }
    }

    /// The root pseudo-class standing for `owl:Thing`.
    pub(crate) fn root() -> Self {
        Self::new(
            NameId::THING,
            crate::vocab::THING.into_owned(),
            Description::top(),
            BTreeSet::new(),
        )
    }

    pub fn is_root(&self) -> bool {
        self.name == NameId::THING
    }

    pub fn name(&self) -> NameId {
        self.name
    }

    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    pub fn profile(&self) -> &Description {
        &self.profile
    }

    pub fn definitions(&self) -> &BTreeSet<Description> {
        &self.definitions
    }

    /// A class only known as a name: it is asserted but never defined.
    pub fn is_placeholder(&self) -> bool {
        self.definitions.is_empty() && !self.is_root()
    }

    pub fn equivalents(&self) -> &FxHashSet<ClassId> {
        &self.equivalents
    }

    pub fn supers(&self) -> &FxHashSet<ClassId> {
        &self.supers
    }

    pub fn subs(&self) -> &FxHashSet<ClassId> {
        &self.subs
    }

    /// Returns true if the class has no edge at all.
    pub fn is_detached(&self) -> bool {
        self.equivalents.is_empty() && self.supers.is_empty() && self.subs.is_empty()
    }

    /// Returns true if this class subsumes `description`.
    ///
    /// The root subsumes everything. Otherwise either the class name subsumes one
    /// of the names of `description` or one of the definitions subsumes it.
    pub fn subsumes(&self, description: &Description, names: &Names) -> bool {
        self.is_root()
            || (!description.is_complement()
                && description
                    .names()
                    .iter()
                    .any(|name| names.subsumes(self.name, *name)))
            || self
                .definitions
                .iter()
                .any(|definition| definition.subsumes(description, names))
    }

    pub fn subsumes_class(&self, other: &Self, names: &Names) -> bool {
        self.subsumes(&other.profile, names)
    }

    /// Returns true if `description` subsumes this class. Nothing but the root subsumes the root.
    pub fn subsumed_by(&self, description: &Description, names: &Names) -> bool {
        !self.is_root() && description.subsumes(&self.profile, names)
    }

    pub fn equivalent_to(&self, description: &Description, names: &Names) -> bool {
        self.definitions.contains(description)
            || (self.subsumes(description, names) && self.subsumed_by(description, names))
    }

    /// Returns true if the two classes share a definition.
    pub fn definition_match(&self, other: &Self) -> bool {
        !self.definitions.is_disjoint(&other.definitions)
    }

    /// Returns true if a name nested in the profile is in `updated`.
    pub fn mentions_any(&self, updated: &FxHashSet<NameId>) -> bool {
        !updated.is_empty() && self.profile.mentions(&|name| updated.contains(&name))
    }

    /// Insertion order: defined classes first, simplest definition first, then by IRI.
    pub fn order(&self, other: &Self) -> Ordering {
        match (self.simplest_definition, other.simplest_definition) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.iri.cmp(&other.iri))
    }
}
