//! The hierarchy of active classes and the crawl that places a class in it.

use super::active::{ActiveClass, ClassId};
use crate::name::{NameId, Names};
use crate::structure::Description;
use rustc_hash::{FxHashMap, FxHashSet};
use std::mem::take;
use tracing::trace;

/// Arena of [`ActiveClass`]es forming a DAG rooted at [`ClassId::ROOT`].
#[derive(Debug, Clone)]
pub struct ActiveClasses {
    classes: Vec<ActiveClass>,
    by_name: FxHashMap<NameId, ClassId>,
    /// Classes hanging under the root by a super-only link.
    parked: FxHashSet<ClassId>,
    /// Classes whose edges changed since the last [`take_touched`](Self::take_touched).
    touched: FxHashSet<ClassId>,
}

impl Default for ActiveClasses {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveClasses {
    pub fn new() -> Self {
        Self {
            classes: vec![ActiveClass::root()],
            by_name: FxHashMap::from_iter([(NameId::THING, ClassId::ROOT)]),
            parked: FxHashSet::default(),
            touched: FxHashSet::default(),
        }
    }

    /// Adds a detached class. Its name must not be registered yet.
    pub fn insert(&mut self, class: ActiveClass) -> ClassId {
        let id = ClassId::new(self.classes.len());
        self.by_name.insert(class.name(), id);
        self.classes.push(class);
        id
    }

    pub fn get(&self, id: ClassId) -> &ActiveClass {
        &self.classes[id.index()]
    }

    fn get_mut(&mut self, id: ClassId) -> &mut ActiveClass {
        self.touched.insert(id);
        &mut self.classes[id.index()]
    }

    pub fn by_name(&self, name: NameId) -> Option<ClassId> {
        self.by_name.get(&name).copied()
    }

    pub fn root(&self) -> &ActiveClass {
        self.get(ClassId::ROOT)
    }

    /// Number of classes, the root included.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + use<> {
        (0..self.classes.len()).map(ClassId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ActiveClass)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId::new(i), c))
    }

    pub fn take_touched(&mut self) -> FxHashSet<ClassId> {
        take(&mut self.touched)
    }

    /// Links `sub` under `sup`. Linking the root under anything is a no-op.
    pub fn add_sub(&mut self, sup: ClassId, sub: ClassId) {
        if sub == ClassId::ROOT || sub == sup {
            return;
        }
        if sup == ClassId::ROOT {
            self.parked.remove(&sub);
        }
        self.get_mut(sup).subs.insert(sub);
        self.get_mut(sub).supers.insert(sup);
    }

    pub fn remove_sub(&mut self, sup: ClassId, sub: ClassId) {
        if sup == ClassId::ROOT {
            self.parked.remove(&sub);
        }
        self.get_mut(sup).subs.remove(&sub);
        self.get_mut(sub).supers.remove(&sup);
    }

    /// Parks `class` under the root without listing it among the root subs.
    fn park_under_root(&mut self, class: ClassId) {
        self.parked.insert(class);
        self.get_mut(class).supers.insert(ClassId::ROOT);
    }

    /// Returns true if `class` hangs under the root by a super-only link.
    pub fn is_parked(&self, class: ClassId) -> bool {
        self.parked.contains(&class)
    }

    /// Classes directly below `class`, parked classes counting as root subs.
    fn children(&self, class: ClassId) -> Vec<ClassId> {
        let mut children = self.get(class).subs.iter().copied().collect::<Vec<_>>();
        if class == ClassId::ROOT {
            children.extend(self.parked.iter().copied());
        }
        children.sort_unstable();
        children
    }

    /// Makes `a` and `b` equivalent, merging their equivalence buckets.
    pub fn add_equivalent(&mut self, a: ClassId, b: ClassId) {
        if a == b || a == ClassId::ROOT || b == ClassId::ROOT {
            return;
        }
        let mut bucket = self.get(a).equivalents.clone();
        bucket.extend(self.get(b).equivalents.iter().copied());
        bucket.insert(a);
        bucket.insert(b);
        for member in &bucket {
            let others = bucket.iter().copied().filter(|other| other != member);
            self.get_mut(*member).equivalents.extend(others);
        }
    }

    /// Every class reachable through supers, `class` excluded.
    pub fn ancestors(&self, class: ClassId) -> FxHashSet<ClassId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            for sup in &self.get(current).supers {
                if *sup != class && seen.insert(*sup) {
                    stack.push(*sup);
                }
            }
        }
        seen
    }

    /// Places a detached class in the hierarchy.
    ///
    /// The subject and the classes it is equivalent to end up with the same
    /// supers and subs.
    pub fn classify(&mut self, subject: ClassId, names: &Names) {
        let placement = ClassClassifier::new(self, names, subject).run();
        trace!(
            "Placing {} as {:?}",
            self.get(subject).iri(),
            placement
        );
        let Placement {
            equivalents,
            parents,
            adopted,
        } = placement;
        for equivalent in &equivalents {
            self.add_equivalent(subject, *equivalent);
        }
        for parent in &parents {
            for child in &adopted {
                if self.get(*child).supers.contains(parent) {
                    self.remove_sub(*parent, *child);
                }
            }
        }
        let mut members = equivalents;
        members.push(subject);
        for member in members {
            let class = self.get(member);
            let outdated_supers = class
                .supers
                .iter()
                .copied()
                .filter(|sup| !parents.contains(sup))
                .collect::<Vec<_>>();
            let outdated_subs = class
                .subs
                .iter()
                .copied()
                .filter(|sub| !adopted.contains(sub))
                .collect::<Vec<_>>();
            for sup in outdated_supers {
                self.remove_sub(sup, member);
            }
            for sub in outdated_subs {
                self.remove_sub(member, sub);
            }
            for child in &adopted {
                self.add_sub(member, *child);
            }
            for parent in &parents {
                let lone_placeholder = *parent == ClassId::ROOT
                    && adopted.is_empty()
                    && self.get(member).is_placeholder();
                if !lone_placeholder {
                    self.add_sub(*parent, member);
                } else if !self.get(member).supers.contains(parent) {
                    self.park_under_root(member);
                }
            }
        }
    }

    /// Takes a class out of the hierarchy.
    ///
    /// Its equivalents forget it and each former super gains each former sub
    /// as a direct sub, unless the sub still reaches that super another way.
    pub fn detach(&mut self, class: ClassId) {
        trace!("Detaching {}", self.get(class).iri());
        self.parked.remove(&class);
        let removed = self.get_mut(class);
        let equivalents = take(&mut removed.equivalents);
        let supers = take(&mut removed.supers);
        let subs = take(&mut removed.subs);
        for equivalent in &equivalents {
            self.get_mut(*equivalent).equivalents.remove(&class);
        }
        for sup in &supers {
            self.get_mut(*sup).subs.remove(&class);
        }
        for sub in &subs {
            self.get_mut(*sub).supers.remove(&class);
        }
        let mut supers = supers.into_iter().collect::<Vec<_>>();
        let mut subs = subs.into_iter().collect::<Vec<_>>();
        supers.sort_unstable();
        subs.sort_unstable();
        for sub in subs {
            for sup in &supers {
                if !self.ancestors(sub).contains(sup) {
                    self.add_sub(*sup, sub);
                }
            }
        }
    }

    /// Removes every edge of every class.
    pub fn clear_edges(&mut self) {
        for class in &mut self.classes {
            class.equivalents.clear();
            class.supers.clear();
            class.subs.clear();
        }
        self.parked.clear();
        self.touched.clear();
    }

    /// Classes subsuming `description`, including the root.
    pub fn supers_of(&self, description: &Description, names: &Names) -> FxHashSet<ClassId> {
        self.iter()
            .filter(|(_, class)| class.subsumes(description, names))
            .map(|(id, _)| id)
            .collect()
    }

    /// Classes subsumed by `description`.
    pub fn subs_of(&self, description: &Description, names: &Names) -> FxHashSet<ClassId> {
        self.iter()
            .filter(|(_, class)| class.subsumed_by(description, names))
            .map(|(id, _)| id)
            .collect()
    }

    /// Classes equivalent to `description`.
    pub fn equivalents_of(&self, description: &Description, names: &Names) -> FxHashSet<ClassId> {
        self.iter()
            .filter(|(_, class)| class.equivalent_to(description, names))
            .map(|(id, _)| id)
            .collect()
    }

    /// Keeps only the most specific classes of `classes`.
    pub fn most_specific(&self, classes: &FxHashSet<ClassId>) -> FxHashSet<ClassId> {
        let mut redundant = FxHashSet::default();
        for class in classes {
            redundant.extend(self.ancestors(*class).intersection(classes).copied());
        }
        classes.difference(&redundant).copied().collect()
    }

    /// Keeps only the most general classes of `classes`.
    pub fn most_general(&self, classes: &FxHashSet<ClassId>) -> FxHashSet<ClassId> {
        classes
            .iter()
            .copied()
            .filter(|class| self.ancestors(*class).is_disjoint(classes))
            .collect()
    }

    /// Checks the structural invariants of the hierarchy.
    ///
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let root = self.root();
        if !root.supers.is_empty() || !root.equivalents.is_empty() {
            return Err("the root has supers or equivalents".into());
        }
        for (id, class) in self.iter() {
            if class.subs.contains(&ClassId::ROOT) {
                return Err(format!("{} lists the root as a sub", class.iri()));
            }
            if id != ClassId::ROOT && class.supers.is_empty() {
                return Err(format!("{} is not attached to the hierarchy", class.iri()));
            }
            for sub in &class.subs {
                if !self.get(*sub).supers.contains(&id) {
                    return Err(format!(
                        "{} lists {} as a sub but not the other way around",
                        class.iri(),
                        self.get(*sub).iri()
                    ));
                }
            }
            for sup in &class.supers {
                if !self.get(*sup).subs.contains(&id) && !(*sup == ClassId::ROOT && self.is_parked(id)) {
                    return Err(format!(
                        "{} lists {} as a super but not the other way around",
                        class.iri(),
                        self.get(*sup).iri()
                    ));
                }
            }
            for equivalent in &class.equivalents {
                if !self.get(*equivalent).equivalents.contains(&id) {
                    return Err(format!(
                        "{} and {} are not mutually equivalent",
                        class.iri(),
                        self.get(*equivalent).iri()
                    ));
                }
            }
            if self.ancestors(id).contains(&id) {
                return Err(format!("{} is its own ancestor", class.iri()));
            }
        }
        Ok(())
    }
}

/// Where a crawl decided to put its subject.
#[derive(Debug, PartialEq, Eq)]
struct Placement {
    /// Placed classes the subject is equivalent to, with their own equivalents.
    equivalents: Vec<ClassId>,
    /// The most specific subsumers.
    parents: Vec<ClassId>,
    /// The most general subsumed classes.
    adopted: Vec<ClassId>,
}

/// One root-down crawl looking for the position of a class.
struct ClassClassifier<'a> {
    classes: &'a ActiveClasses,
    names: &'a Names,
    subject_id: ClassId,
    subject: &'a ActiveClass,
    visited: FxHashSet<ClassId>,
    subsumers: FxHashSet<ClassId>,
    candidates: Vec<ClassId>,
    equivalents: FxHashSet<ClassId>,
}

impl<'a> ClassClassifier<'a> {
    fn new(classes: &'a ActiveClasses, names: &'a Names, subject: ClassId) -> Self {
        Self {
            classes,
            names,
            subject_id: subject,
            subject: classes.get(subject),
            visited: FxHashSet::default(),
            subsumers: FxHashSet::default(),
            candidates: Vec::new(),
            equivalents: FxHashSet::default(),
        }
    }

    fn run(mut self) -> Placement {
        self.crawl(ClassId::ROOT);

        let mut bucket = FxHashSet::default();
        for equivalent in &self.equivalents {
            bucket.insert(*equivalent);
            bucket.extend(self.classes.get(*equivalent).equivalents.iter().copied());
        }
        bucket.remove(&self.subject_id);

        // The current supers of the equivalents compete with the crawl results.
        let mut candidates = self.candidates.iter().copied().collect::<FxHashSet<_>>();
        for member in &bucket {
            candidates.extend(self.classes.get(*member).supers.iter().copied());
        }
        candidates.retain(|candidate| {
            !bucket.contains(candidate) && self.classes.ancestors(*candidate).is_disjoint(&bucket)
        });
        let mut parents = self
            .classes
            .most_specific(&candidates)
            .into_iter()
            .collect::<Vec<_>>();
        if parents.is_empty() {
            parents.push(ClassId::ROOT);
        }
        parents.sort_unstable();

        let mut found = self.adoptees(&parents);
        for member in &bucket {
            found.extend(self.classes.get(*member).subs.iter().copied());
        }
        found.retain(|class| *class != self.subject_id && !bucket.contains(class));
        let mut adopted = self.classes.most_general(&found).into_iter().collect::<Vec<_>>();
        adopted.sort_unstable();

        let mut equivalents = bucket.into_iter().collect::<Vec<_>>();
        equivalents.sort_unstable();
        Placement {
            equivalents,
            parents,
            adopted,
        }
    }

    /// Returns true if `current` subsumes the subject.
    fn crawl(&mut self, current: ClassId) -> bool {
        if !self.visited.insert(current) {
            return self.subsumers.contains(&current);
        }
        let class = self.classes.get(current);
        if !class.definition_match(self.subject) && !class.subsumes_class(self.subject, self.names) {
            return false;
        }
        self.subsumers.insert(current);
        if current != ClassId::ROOT
            && (class.definition_match(self.subject)
                || self.subject.subsumes_class(class, self.names))
        {
            // Only the descent stops here: siblings may still be more specific subsumers.
            self.equivalents.insert(current);
            return true;
        }
        let mut below = false;
        for sub in self.classes.children(current) {
            if sub != self.subject_id {
                below |= self.crawl(sub);
            }
        }
        if !below {
            self.candidates.push(current);
        }
        true
    }

    /// Classes under `parents` that the subject subsumes, without descending below them.
    fn adoptees(&self, parents: &[ClassId]) -> FxHashSet<ClassId> {
        let mut seen = FxHashSet::default();
        let mut found = FxHashSet::default();
        let mut stack = parents.to_vec();
        while let Some(current) = stack.pop() {
            for sub in self.classes.children(current) {
                if sub == self.subject_id || self.subsumers.contains(&sub) || !seen.insert(sub) {
                    continue;
                }
                if self.subject.subsumes_class(self.classes.get(sub), self.names) {
                    found.insert(sub);
                } else {
                    stack.push(sub);
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameKind;
    use oxrdf::NamedNode;
    use std::collections::BTreeSet;

    struct Fixture {
        names: Names,
        classes: ActiveClasses,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                names: Names::new(),
                classes: ActiveClasses::new(),
            }
        }

        fn name(&mut self, local: &str) -> NameId {
            self.names.intern(
                NamedNode::new_unchecked(format!("http://example.org/{local}")).as_ref(),
                NameKind::Class,
            )
        }

        /// A class asserted under the `supers` names, without definitions.
        fn asserted(&mut self, local: &str, supers: &[&str]) -> ClassId {
            let name = self.name(local);
            let mut profile = Description::named(name);
            for sup in supers {
                profile.insert_name(self.name(sup));
            }
            let iri = self.names.iri(name).clone();
            self.classes
                .insert(ActiveClass::new(name, iri, profile, BTreeSet::new()))
        }

        /// A class defined as the conjunction of `parts`.
        fn defined(&mut self, local: &str, parts: &[&str]) -> ClassId {
            let name = self.name(local);
            let definition = Description::new(
                parts.iter().map(|p| self.name(p)).collect(),
                BTreeSet::new(),
            );
            let mut profile = definition.clone();
            profile.insert_name(name);
            let iri = self.names.iri(name).clone();
            self.classes.insert(ActiveClass::new(
                name,
                iri,
                profile,
                BTreeSet::from([definition]),
            ))
        }
    }

    #[test]
    fn test_insertion_below_the_most_specific_subsumer() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["X"]);
        let b = fx.defined("B", &["X", "Y"]);
        fx.classes.classify(a, &fx.names);
        fx.classes.classify(b, &fx.names);
        assert!(fx.classes.root().subs().contains(&a));
        assert_eq!(fx.classes.get(b).supers(), &FxHashSet::from_iter([a]));
        assert!(fx.classes.check_consistency().is_ok());
    }

    #[test]
    fn test_insertion_above_existing_classes() {
        let mut fx = Fixture::new();
        let b = fx.defined("B", &["X", "Y"]);
        let a = fx.defined("A", &["X"]);
        fx.classes.classify(b, &fx.names);
        fx.classes.classify(a, &fx.names);
        assert_eq!(fx.classes.get(b).supers(), &FxHashSet::from_iter([a]));
        assert_eq!(fx.classes.root().subs(), &FxHashSet::from_iter([a]));
        assert!(fx.classes.check_consistency().is_ok());
    }

    #[test]
    fn test_equivalent_classes_share_edges() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["X"]);
        let b = fx.defined("B", &["X", "Y"]);
        let c = fx.defined("C", &["Y", "X"]);
        for class in [a, b, c] {
            fx.classes.classify(class, &fx.names);
        }
        assert!(fx.classes.get(b).equivalents().contains(&c));
        assert!(fx.classes.get(c).equivalents().contains(&b));
        assert!(fx.classes.get(c).supers().contains(&a));
        assert!(fx.classes.get(a).subs().contains(&c));
        assert!(fx.classes.check_consistency().is_ok());
    }

    #[test]
    fn test_equivalent_subject_keeps_sibling_subsumers() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["P", "Y"]);
        let d = fx.asserted("D", &[]);
        let p = fx.asserted("P", &["Y", "D"]);
        for class in [a, d, p] {
            fx.classes.classify(class, &fx.names);
        }
        assert_eq!(fx.classes.get(p).equivalents(), &FxHashSet::from_iter([a]));
        assert_eq!(fx.classes.get(p).supers(), &FxHashSet::from_iter([d]));
        assert_eq!(fx.classes.get(a).supers(), &FxHashSet::from_iter([d]));
        assert_eq!(fx.classes.get(d).subs(), &FxHashSet::from_iter([a, p]));
        assert!(fx.classes.root().subs().is_empty());
        assert!(fx.classes.check_consistency().is_ok());
    }

    #[test]
    fn test_lonely_placeholder_is_parked() {
        let mut fx = Fixture::new();
        let p = fx.asserted("P", &[]);
        fx.classes.classify(p, &fx.names);
        assert!(fx.classes.is_parked(p));
        assert!(fx.classes.root().subs().is_empty());
        assert!(fx.classes.check_consistency().is_ok());
    }

    #[test]
    fn test_placeholder_adopts_asserted_subs() {
        let mut fx = Fixture::new();
        let b = fx.asserted("B", &["A"]);
        let a = fx.asserted("A", &[]);
        fx.classes.classify(b, &fx.names);
        fx.classes.classify(a, &fx.names);
        assert!(fx.classes.get(a).subs().contains(&b));
        assert!(!fx.classes.root().subs().contains(&b));
        assert!(fx.classes.root().subs().contains(&a));
    }

    #[test]
    fn test_detach_splices_supers_onto_subs() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["X"]);
        let b = fx.defined("B", &["X", "Y"]);
        let c = fx.defined("C", &["X", "Y", "Z"]);
        for class in [a, b, c] {
            fx.classes.classify(class, &fx.names);
        }
        assert_eq!(fx.classes.get(c).supers(), &FxHashSet::from_iter([b]));
        fx.classes.detach(b);
        assert!(fx.classes.get(b).is_detached());
        assert_eq!(fx.classes.get(c).supers(), &FxHashSet::from_iter([a]));
        assert!(fx.classes.check_consistency().is_ok());
        fx.classes.classify(b, &fx.names);
        assert_eq!(fx.classes.get(c).supers(), &FxHashSet::from_iter([b]));
        assert!(!fx.classes.get(a).subs().contains(&c));
    }

    #[test]
    fn test_queries_and_direct_filtering() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["X"]);
        let b = fx.defined("B", &["X", "Y"]);
        for class in [a, b] {
            fx.classes.classify(class, &fx.names);
        }
        let x = fx.name("X");
        let y = fx.name("Y");
        let z = fx.name("Z");
        let query = Description::new(BTreeSet::from([x, y, z]), BTreeSet::new());
        let supers = fx.classes.supers_of(&query, &fx.names);
        assert_eq!(supers, FxHashSet::from_iter([ClassId::ROOT, a, b]));
        assert_eq!(fx.classes.most_specific(&supers), FxHashSet::from_iter([b]));

        let subs = fx.classes.subs_of(&Description::named(x), &fx.names);
        assert_eq!(subs, FxHashSet::from_iter([a, b]));
        assert_eq!(fx.classes.most_general(&subs), FxHashSet::from_iter([a]));

        let equivalents = fx
            .classes
            .equivalents_of(&Description::new(BTreeSet::from([x, y]), BTreeSet::new()), &fx.names);
        assert_eq!(equivalents, FxHashSet::from_iter([b]));
    }

    #[test]
    fn test_root_is_never_a_sub() {
        let mut fx = Fixture::new();
        let a = fx.defined("A", &["X"]);
        fx.classes.add_sub(a, ClassId::ROOT);
        assert!(fx.classes.get(a).subs().is_empty());
        assert!(fx.classes.root().supers().is_empty());
    }
}
