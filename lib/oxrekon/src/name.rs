//! Registry of atomic names and the hierarchy learned between them.
//!
//! Every class, property, datatype or individual mentioned by an expression is
//! interned once and referred to by a dense [`NameId`]. The registry records
//! super and equivalent names as classification discovers them; structural
//! subsumption between two names is answered from the transitive closure of
//! those relations, recomputed by [`Names::refresh`].

use oxrdf::{NamedNode, NamedNodeRef};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::mem::take;
use tracing::debug;

/// Dense handle of a [`Name`] inside its [`Names`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    /// `owl:Thing`, interned first in every registry.
    pub const THING: Self = Self(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Class,
    ObjectProperty,
    DataProperty,
    Individual,
}

/// One atomic entity and what is currently known about its position.
#[derive(Debug, Clone)]
pub struct Name {
    iri: NamedNode,
    kind: NameKind,
    supers: FxHashSet<NameId>,
    equivalents: FxHashSet<NameId>,
    ancestors: FxHashSet<NameId>,
}

impl Name {
    fn new(iri: NamedNode, kind: NameKind) -> Self {
        Self {
            iri,
            kind,
            supers: FxHashSet::default(),
            equivalents: FxHashSet::default(),
            ancestors: FxHashSet::default(),
        }
    }

    pub fn iri(&self) -> &NamedNode {
        &self.iri
    }

    pub fn kind(&self) -> NameKind {
        self.kind
    }

    /// Direct super names recorded so far.
    pub fn supers(&self) -> &FxHashSet<NameId> {
        &self.supers
    }

    pub fn equivalents(&self) -> &FxHashSet<NameId> {
        &self.equivalents
    }

    /// Every name reachable through supers and equivalents, as of the last refresh.
    pub fn ancestors(&self) -> &FxHashSet<NameId> {
        &self.ancestors
    }
}

/// Arena of [`Name`]s indexed by IRI.
#[derive(Debug, Clone)]
pub struct Names {
    names: Vec<Name>,
    ids: FxHashMap<String, NameId>,
    /// Names that gained a super or an equivalent since the last refresh.
    dirty: FxHashSet<NameId>,
}

impl Default for Names {
    fn default() -> Self {
        Self::new()
    }
}

impl Names {
    pub fn new() -> Self {
        let mut names = Self {
            names: Vec::new(),
            ids: FxHashMap::default(),
            dirty: FxHashSet::default(),
        };
        names.intern(crate::vocab::THING, NameKind::Class);
        names
    }

    /// Returns the handle of `iri`, registering it on first use.
    ///
    /// The kind of a name is the one given when it is first registered.
    pub fn intern(&mut self, iri: NamedNodeRef<'_>, kind: NameKind) -> NameId {
        if let Some(id) = self.ids.get(iri.as_str()) {
            let known = self.names[id.index()].kind;
            if known != kind {
                debug!("{iri} is used as {kind:?} but was registered as {known:?}");
            }
            return *id;
        }
        let id = NameId(
            u32::try_from(self.names.len()).unwrap_or_else(|_| unreachable!("more than 2^32 names")),
        );
        self.names.push(Name::new(iri.into_owned(), kind));
        self.ids.insert(iri.as_str().to_owned(), id);
        id
    }

    pub fn get(&self, iri: NamedNodeRef<'_>) -> Option<NameId> {
        self.ids.get(iri.as_str()).copied()
    }

    pub fn name(&self, id: NameId) -> &Name {
        &self.names[id.index()]
    }

    pub fn iri(&self, id: NameId) -> &NamedNode {
        &self.names[id.index()].iri
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NameId, &Name)> {
        (0..).map(NameId).zip(&self.names)
    }

    /// Records `sup` as a super name of `name`. Returns true if the relation is new.
    pub fn add_super(&mut self, name: NameId, sup: NameId) -> bool {
        if name == sup || sup == NameId::THING {
            return false;
        }
        let added = self.names[name.index()].supers.insert(sup);
        if added {
            self.dirty.insert(name);
        }
        added
    }

    /// Records `a` and `b` as equivalent. Returns true if the relation is new.
    pub fn add_equivalent(&mut self, a: NameId, b: NameId) -> bool {
        if a == b {
            return false;
        }
        let added = self.names[a.index()].equivalents.insert(b);
        let added_back = self.names[b.index()].equivalents.insert(a);
        if added || added_back {
            self.dirty.extend([a, b]);
        }
        added || added_back
    }

    /// Returns true if `general` subsumes `specific` according to what is known so far.
    ///
    /// Relations added since the last [`refresh`](Self::refresh) are not visible yet.
    pub fn subsumes(&self, general: NameId, specific: NameId) -> bool {
        general == NameId::THING
            || general == specific
            || self.names[specific.index()].ancestors.contains(&general)
    }

    /// Returns true if relations were added since the last refresh.
    pub fn is_stale(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Recomputes the ancestor sets that the relations added since the last
    /// refresh may change, and returns the names whose ancestry changed.
    ///
    /// Those are the names that gained a relation and the names that already
    /// reached one of them.
    pub fn refresh(&mut self) -> FxHashSet<NameId> {
        let mut changed = FxHashSet::default();
        let dirty = take(&mut self.dirty);
        if dirty.is_empty() {
            return changed;
        }
        let closures = self
            .iter()
            .filter(|(id, name)| {
                dirty.contains(id) || name.ancestors.iter().any(|a| dirty.contains(a))
            })
            .map(|(id, _)| (id, self.closure(id)))
            .collect::<Vec<_>>();
        for (id, closure) in closures {
            let name = &mut self.names[id.index()];
            if name.ancestors != closure {
                name.ancestors = closure;
                changed.insert(id);
            }
        }
        changed
    }

    fn closure(&self, start: NameId) -> FxHashSet<NameId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            let name = &self.names[current.index()];
            for next in name.supers.iter().chain(&name.equivalents) {
                if *next != start && seen.insert(*next) {
                    stack.push(*next);
                }
            }
        }
        seen
    }

    /// Forgets every learned relation, keeping the interned names.
    pub fn clear_relations(&mut self) {
        for name in &mut self.names {
            name.supers.clear();
            name.equivalents.clear();
            name.ancestors.clear();
        }
        self.dirty.clear();
    }
}
