//! Incremental structural classifier.
//!
//! Classes are inserted one by one into a hierarchy rooted at `owl:Thing`.
//! Every placement teaches the [`Names`] registry new subsumptions between
//! names, which may change the outcome of earlier structural tests: the classes
//! mentioning a name whose ancestry changed are detached and placed again, until
//! a pass changes nothing.

pub mod active;
pub mod hierarchy;

use crate::descriptions::Descriptions;
use crate::entity::OwlClass;
use crate::error::{ClassificationError, InputError, RekonError, RekonResult};
use crate::expression::ClassExpression;
use crate::name::{NameId, NameKind, Names};
use crate::ontology::{ClassRecord, Ontology, PropertyKind, PropertyRelation};
use crate::structure::Description;
use active::{ActiveClass, ClassId};
use hierarchy::ActiveClasses;
use oxrdf::NamedNode;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Configuration for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Maximum number of classification passes before giving up.
    pub max_passes: usize,
    /// Maximum time allowed for one classification (None = unlimited).
    pub timeout: Option<Duration>,
    /// Maximum nesting depth of an input expression.
    pub max_depth: usize,
    /// Whether to check the hierarchy invariants once it is stable.
    pub check_consistency: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_passes: 1_000,
            timeout: None,
            max_depth: 100,
            check_consistency: true,
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_check_consistency(mut self, check_consistency: bool) -> Self {
        self.check_consistency = check_consistency;
        self
    }
}

/// Trait for class hierarchy reasoners.
pub trait Reasoner {
    /// Computes the class hierarchy.
    fn classify(&mut self) -> RekonResult<()>;

    /// Returns the classes equivalent to an expression.
    fn get_equivalent_classes(&mut self, expr: &ClassExpression) -> RekonResult<Vec<OwlClass>>;

    /// Returns the super classes of an expression, only the most specific ones if `direct`.
    fn get_super_classes(
        &mut self,
        expr: &ClassExpression,
        direct: bool,
    ) -> RekonResult<Vec<OwlClass>>;

    /// Returns the sub classes of an expression, only the most general ones if `direct`.
    fn get_sub_classes(&mut self, expr: &ClassExpression, direct: bool) -> RekonResult<Vec<OwlClass>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    /// Input was added since the last successful classification.
    Unclassified,
    /// A classification is running or was aborted.
    Converging,
    /// The hierarchy is complete and can be queried.
    Stable,
}

/// Counters describing the last classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStats {
    /// Passes run by the last classification.
    pub passes: usize,
    /// Classes detached and placed again by the last classification.
    pub reclassifications: usize,
    /// Active classes, the root excluded.
    pub classes: usize,
    /// Interned names.
    pub names: usize,
    /// Memoized expression conversions.
    pub cached_expressions: usize,
}

/// Structural subsumption classifier.
///
/// ```
/// use oxrdf::NamedNode;
/// use oxrekon::{ClassExpression, ClassRecord, Classifier, OwlClass, Reasoner};
///
/// let animal = OwlClass::new(NamedNode::new("http://example.com/Animal")?);
/// let dog = OwlClass::new(NamedNode::new("http://example.com/Dog")?);
///
/// let mut classifier = Classifier::new();
/// classifier.add_class(ClassRecord::new(animal.clone()))?;
/// classifier.add_class(ClassRecord::new(dog.clone()).with_asserted_super(animal.clone().into()))?;
/// classifier.classify()?;
///
/// let supers = classifier.get_super_classes(&ClassExpression::class(dog), true)?;
/// assert_eq!(supers, vec![animal]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    names: Names,
    descriptions: Descriptions,
    classes: ActiveClasses,
    /// Classes waiting to be placed in the hierarchy.
    pending: Vec<ClassId>,
    property_relations: Vec<PropertyRelation>,
    state: ClassifierState,
    stats: ClassifierStats,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self {
            config,
            names: Names::new(),
            descriptions: Descriptions::new(),
            classes: ActiveClasses::new(),
            pending: Vec::new(),
            property_relations: Vec::new(),
            state: ClassifierState::Unclassified,
            stats: ClassifierStats::default(),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn classes(&self) -> &ActiveClasses {
        &self.classes
    }

    pub fn stats(&self) -> ClassifierStats {
        ClassifierStats {
            classes: self.classes.len() - 1,
            names: self.names.len(),
            cached_expressions: self.descriptions.cache_len(),
            ..self.stats
        }
    }

    /// Registers a class to classify.
    ///
    /// A rejected record leaves the classifier unchanged.
    pub fn add_class(&mut self, record: ClassRecord) -> RekonResult<()> {
        let iri = record.class.iri();
        if record.class.is_builtin() {
            return Err(InputError::reserved_name(iri.clone()).into());
        }
        if self
            .names
            .get(iri.as_ref())
            .and_then(|name| self.classes.by_name(name))
            .is_some()
        {
            return Err(InputError::duplicate(iri.clone()).into());
        }
        if let Some(depth) = record
            .definitions
            .iter()
            .chain(&record.asserted_supers)
            .map(ClassExpression::depth)
            .find(|depth| *depth > self.config.max_depth)
        {
            return Err(InputError::too_deep(iri.clone(), depth, self.config.max_depth).into());
        }
        if record
            .definitions
            .iter()
            .any(|definition| definition.has_conjunct(&record.class))
        {
            return Err(InputError::cyclic(iri.clone()).into());
        }

        let name = self.names.intern(iri.as_ref(), NameKind::Class);
        let mut profile = Description::named(name);
        let mut definitions = BTreeSet::new();
        for definition in &record.definitions {
            if let Some(structure) = self.descriptions.to_structure(definition, true, &mut self.names) {
                definitions.insert(structure);
            }
            profile.merge(&self.descriptions.profile_part(definition, &mut self.names));
        }
        for sup in &record.asserted_supers {
            profile.merge(&self.descriptions.profile_part(sup, &mut self.names));
        }
        trace!("Registering {iri} with profile {profile}");
        let id = self
            .classes
            .insert(ActiveClass::new(name, iri.clone(), profile, definitions));
        self.pending.push(id);
        self.state = ClassifierState::Unclassified;
        Ok(())
    }

    /// Loads the class records and property hierarchy of an ontology.
    ///
    /// Rejected records are logged and returned, the other ones are registered.
    pub fn load_ontology(&mut self, ontology: &Ontology) -> Vec<RekonError> {
        // The first registration fixes the kind of a name.
        for property in ontology.object_properties() {
            self.names.intern(property.as_ref(), NameKind::ObjectProperty);
        }
        for property in ontology.data_properties() {
            self.names.intern(property.as_ref(), NameKind::DataProperty);
        }
        for relation in ontology.property_hierarchy() {
            self.add_property_relation(relation);
        }
        let mut errors = Vec::new();
        let mut placeholders = 0;
        for record in ontology.class_records() {
            let placeholder = record.is_placeholder();
            match self.add_class(record) {
                Ok(()) => placeholders += usize::from(placeholder),
                Err(e) => {
                    warn!("Skipping class record: {e}");
                    errors.push(e);
                }
            }
        }
        info!(
            "Loaded {} classes from {ontology} ({placeholders} without definition), {} rejected",
            self.classes.len() - 1,
            errors.len()
        );
        errors
    }

    /// Asserts that the object property `sub` is a sub-property of `sup`.
    pub fn add_property_super(&mut self, sub: impl Into<NamedNode>, sup: impl Into<NamedNode>) {
        self.add_property_relation(PropertyRelation::SubPropertyOf {
            kind: PropertyKind::Object,
            sub: sub.into(),
            sup: sup.into(),
        });
    }

    /// Asserts that two object properties are equivalent.
    pub fn add_property_equivalent(&mut self, a: impl Into<NamedNode>, b: impl Into<NamedNode>) {
        self.add_property_relation(PropertyRelation::EquivalentProperties {
            kind: PropertyKind::Object,
            left: a.into(),
            right: b.into(),
        });
    }

    /// Asserts a relation between two object or data properties.
    ///
    /// Classes placed by an earlier run are checked again by the next [`classify`](Self::classify).
    pub fn add_property_relation(&mut self, relation: PropertyRelation) {
        if self.seed_property_relation(&relation) {
            self.state = ClassifierState::Unclassified;
        }
        self.property_relations.push(relation);
    }

    fn seed_property_relation(&mut self, relation: &PropertyRelation) -> bool {
        let kind = match relation.kind() {
            PropertyKind::Object => NameKind::ObjectProperty,
            PropertyKind::Data => NameKind::DataProperty,
        };
        match relation {
            PropertyRelation::SubPropertyOf { sub, sup, .. } => {
                let sub = self.names.intern(sub.as_ref(), kind);
                let sup = self.names.intern(sup.as_ref(), kind);
                self.names.add_super(sub, sup)
            }
            PropertyRelation::EquivalentProperties { left, right, .. } => {
                let left = self.names.intern(left.as_ref(), kind);
                let right = self.names.intern(right.as_ref(), kind);
                self.names.add_equivalent(left, right)
            }
        }
    }

    /// Forgets the computed hierarchy and everything learned about names.
    ///
    /// The next [`classify`](Self::classify) starts over from the registered input.
    pub fn reset(&mut self) {
        self.names.clear_relations();
        for relation in self.property_relations.clone() {
            self.seed_property_relation(&relation);
        }
        self.classes.clear_edges();
        self.pending = self.classes.ids().filter(|id| *id != ClassId::ROOT).collect();
        self.descriptions.thaw();
        self.state = ClassifierState::Unclassified;
        self.stats = ClassifierStats::default();
    }

    /// Runs classification passes until the hierarchy is stable.
    pub fn classify(&mut self) -> RekonResult<()> {
        if self.state == ClassifierState::Stable {
            return Ok(());
        }
        let start = Instant::now();
        self.state = ClassifierState::Converging;
        self.descriptions.thaw();
        self.stats.passes = 0;
        self.stats.reclassifications = 0;

        // Names learned outside of classification, like the property hierarchy,
        // may invalidate classes placed by an earlier run.
        let updated = self.names.refresh();
        self.remove_reclassifiables(&updated);

        while !self.pending.is_empty() {
            if self.stats.passes >= self.config.max_passes {
                warn!(
                    "No fixpoint after {} passes, {} classes still pending",
                    self.stats.passes,
                    self.pending.len()
                );
                return Err(ClassificationError::max_passes_exceeded(self.stats.passes).into());
            }
            self.check_timeout(start)?;
            self.stats.passes += 1;
            let placed = self.absorb_classifiables();
            let updated = self.set_new_name_subsumptions();
            let reclassified = self.remove_reclassifiables(&updated);
            debug!(
                "Pass {}: placed {placed} classes, {} names updated, {reclassified} to reclassify",
                self.stats.passes,
                updated.len()
            );
        }

        self.names.refresh();
        if self.config.check_consistency {
            self.classes
                .check_consistency()
                .map_err(ClassificationError::inconsistent)?;
        }
        self.descriptions.freeze();
        self.state = ClassifierState::Stable;
        info!(
            "Classified {} classes in {} passes ({} reclassifications) in {:?}",
            self.classes.len() - 1,
            self.stats.passes,
            self.stats.reclassifications,
            start.elapsed()
        );
        Ok(())
    }

    fn check_timeout(&self, start: Instant) -> RekonResult<()> {
        if let Some(timeout) = self.config.timeout {
            if start.elapsed() >= timeout {
                return Err(ClassificationError::timeout(timeout).into());
            }
        }
        Ok(())
    }

    /// Places every pending class, in insertion order.
    fn absorb_classifiables(&mut self) -> usize {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(|a, b| self.classes.get(*a).order(self.classes.get(*b)));
        pending.dedup();
        for id in &pending {
            self.classes.classify(*id, &self.names);
        }
        pending.len()
    }

    /// Pushes the edges of every class changed in this pass down to the names.
    ///
    /// Returns the names whose ancestry changed.
    fn set_new_name_subsumptions(&mut self) -> FxHashSet<NameId> {
        for id in self.classes.take_touched() {
            let class = self.classes.get(id);
            if class.is_root() {
                continue;
            }
            let name = class.name();
            for sup in class.supers() {
                let sup = self.classes.get(*sup);
                if !sup.is_root() {
                    self.names.add_super(name, sup.name());
                }
            }
            for equivalent in class.equivalents() {
                self.names.add_equivalent(name, self.classes.get(*equivalent).name());
            }
        }
        self.names.refresh()
    }

    /// Detaches every placed class whose profile mentions an updated name.
    fn remove_reclassifiables(&mut self, updated: &FxHashSet<NameId>) -> usize {
        if updated.is_empty() {
            return 0;
        }
        let pending = self.pending.iter().copied().collect::<FxHashSet<_>>();
        let stale = self
            .classes
            .iter()
            .filter(|(id, class)| {
                !class.is_root() && !pending.contains(id) && class.mentions_any(updated)
            })
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for id in &stale {
            self.classes.detach(*id);
        }
        // Detaching only touches neighbours whose edges are rebuilt by the next pass.
        self.classes.take_touched();
        self.stats.reclassifications += stale.len();
        self.pending.extend(&stale);
        stale.len()
    }

    fn ensure_stable(&self) -> RekonResult<()> {
        if self.state == ClassifierState::Stable {
            Ok(())
        } else {
            Err(ClassificationError::not_classified().into())
        }
    }

    /// The active class an expression names, if any.
    fn active_class_of(&self, expr: &ClassExpression) -> Option<ClassId> {
        let class = expr.as_class()?;
        self.classes.by_name(self.names.get(class.as_ref())?)
    }

    /// A class and its equivalents, excluded from super and sub queries.
    fn with_equivalents(&self, id: ClassId) -> FxHashSet<ClassId> {
        let mut excluded = self.classes.get(id).equivalents().clone();
        excluded.insert(id);
        excluded
    }

    fn to_classes(&self, ids: impl IntoIterator<Item = ClassId>) -> Vec<OwlClass> {
        let mut classes = ids
            .into_iter()
            .map(|id| OwlClass::new(self.classes.get(id).iri().clone()))
            .collect::<Vec<_>>();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Returns the classes equivalent to `expr`.
    pub fn equivalent_classes(&mut self, expr: &ClassExpression) -> RekonResult<Vec<OwlClass>> {
        self.ensure_stable()?;
        if let Some(id) = self.active_class_of(expr) {
            return Ok(self.to_classes(self.classes.get(id).equivalents().iter().copied()));
        }
        let Some(description) = self.descriptions.to_structure(expr, false, &mut self.names) else {
            return Ok(Vec::new());
        };
        Ok(self.to_classes(self.classes.equivalents_of(&description, &self.names)))
    }

    /// Returns the classes subsuming `expr`, `owl:Thing` included.
    pub fn super_classes(&mut self, expr: &ClassExpression, direct: bool) -> RekonResult<Vec<OwlClass>> {
        self.ensure_stable()?;
        let (supers, excluded) = if let Some(id) = self.active_class_of(expr) {
            let class = self.classes.get(id);
            let supers = self.classes.supers_of(class.profile(), &self.names);
            (supers, self.with_equivalents(id))
        } else {
            let profile = self.descriptions.profile_part(expr, &mut self.names);
            let supers = self.classes.supers_of(&profile, &self.names);
            let excluded = match self.descriptions.to_structure(expr, false, &mut self.names) {
                Some(description) => self.classes.equivalents_of(&description, &self.names),
                None => FxHashSet::default(),
            };
            (supers, excluded)
        };
        let mut supers = supers.difference(&excluded).copied().collect::<FxHashSet<_>>();
        if direct {
            supers = self.classes.most_specific(&supers);
        }
        Ok(self.to_classes(supers))
    }

    /// Returns the classes subsumed by `expr`.
    pub fn sub_classes(&mut self, expr: &ClassExpression, direct: bool) -> RekonResult<Vec<OwlClass>> {
        self.ensure_stable()?;
        let (subs, excluded) = if let Some(id) = self.active_class_of(expr) {
            let class = self.classes.get(id);
            let subs = self
                .classes
                .iter()
                .filter(|(other, candidate)| {
                    *other != id && !candidate.is_root() && class.subsumes_class(candidate, &self.names)
                })
                .map(|(other, _)| other)
                .collect::<FxHashSet<_>>();
            (subs, self.with_equivalents(id))
        } else {
            let Some(description) = self.descriptions.to_structure(expr, false, &mut self.names) else {
                return Ok(Vec::new());
            };
            let subs = self.classes.subs_of(&description, &self.names);
            (subs, self.classes.equivalents_of(&description, &self.names))
        };
        let mut subs = subs.difference(&excluded).copied().collect::<FxHashSet<_>>();
        if direct {
            subs = self.classes.most_general(&subs);
        }
        Ok(self.to_classes(subs))
    }

    /// Direct super classes of a registered class, as placed in the hierarchy.
    pub fn direct_super_classes_of(&self, class: &OwlClass) -> RekonResult<Vec<OwlClass>> {
        self.ensure_stable()?;
        Ok(self
            .class_id(class)
            .map(|id| self.to_classes(self.classes.get(id).supers().iter().copied()))
            .unwrap_or_default())
    }

    /// Direct sub classes of a registered class, as placed in the hierarchy.
    pub fn direct_sub_classes_of(&self, class: &OwlClass) -> RekonResult<Vec<OwlClass>> {
        self.ensure_stable()?;
        Ok(self
            .class_id(class)
            .map(|id| self.to_classes(self.classes.get(id).subs().iter().copied()))
            .unwrap_or_default())
    }

    /// Every `(sub, super)` edge of the hierarchy, sorted.
    pub fn subsumption_edges(&self) -> RekonResult<Vec<(OwlClass, OwlClass)>> {
        self.ensure_stable()?;
        let mut edges = self
            .classes
            .iter()
            .flat_map(|(_, class)| {
                class.supers().iter().map(|sup| {
                    (
                        OwlClass::new(class.iri().clone()),
                        OwlClass::new(self.classes.get(*sup).iri().clone()),
                    )
                })
            })
            .collect::<Vec<_>>();
        edges.sort();
        Ok(edges)
    }

    fn class_id(&self, class: &OwlClass) -> Option<ClassId> {
        self.classes.by_name(self.names.get(class.as_ref())?)
    }
}

impl Reasoner for Classifier {
    fn classify(&mut self) -> RekonResult<()> {
        Classifier::classify(self)
    }

    fn get_equivalent_classes(&mut self, expr: &ClassExpression) -> RekonResult<Vec<OwlClass>> {
        self.equivalent_classes(expr)
    }

    fn get_super_classes(
        &mut self,
        expr: &ClassExpression,
        direct: bool,
    ) -> RekonResult<Vec<OwlClass>> {
        self.super_classes(expr, direct)
    }

    fn get_sub_classes(&mut self, expr: &ClassExpression, direct: bool) -> RekonResult<Vec<OwlClass>> {
        self.sub_classes(expr, direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClassificationErrorKind, InputErrorKind};

    fn class(local: &str) -> OwlClass {
        OwlClass::new(NamedNode::new_unchecked(format!("http://example.org/{local}")))
    }

    #[test]
    fn test_queries_need_classification() {
        let mut classifier = Classifier::new();
        classifier.add_class(ClassRecord::new(class("A"))).unwrap();
        let err = classifier
            .super_classes(&ClassExpression::class(class("A")), false)
            .unwrap_err();
        assert!(matches!(
            err,
            RekonError::Classification(e) if e.kind() == ClassificationErrorKind::NotClassified
        ));
        classifier.classify().unwrap();
        assert_eq!(classifier.state(), ClassifierState::Stable);
        assert!(classifier.super_classes(&ClassExpression::class(class("A")), false).is_ok());

        classifier.add_class(ClassRecord::new(class("B"))).unwrap();
        assert_eq!(classifier.state(), ClassifierState::Unclassified);
        assert!(classifier.subsumption_edges().is_err());
    }

    #[test]
    fn test_rejected_records() {
        let mut classifier = Classifier::with_config(ClassifierConfig::default().with_max_depth(2));
        classifier.add_class(ClassRecord::new(class("A"))).unwrap();
        let kind = |e: RekonError| match e {
            RekonError::RejectedInput(e) => e.kind(),
            e => panic!("unexpected {e}"),
        };
        assert_eq!(
            kind(classifier.add_class(ClassRecord::new(class("A"))).unwrap_err()),
            InputErrorKind::Duplicate
        );
        assert_eq!(
            kind(classifier.add_class(ClassRecord::new(OwlClass::thing())).unwrap_err()),
            InputErrorKind::ReservedName
        );
        let deep = ClassExpression::intersection(vec![ClassExpression::intersection(vec![
            ClassExpression::class(class("C")),
        ])]);
        assert_eq!(
            kind(
                classifier
                    .add_class(ClassRecord::new(class("B")).with_definition(deep))
                    .unwrap_err()
            ),
            InputErrorKind::TooDeep
        );
        let cyclic = ClassExpression::intersection(vec![
            ClassExpression::class(class("B")),
            ClassExpression::class(class("C")),
        ]);
        assert_eq!(
            kind(
                classifier
                    .add_class(ClassRecord::new(class("B")).with_definition(cyclic))
                    .unwrap_err()
            ),
            InputErrorKind::Cyclic
        );
        assert_eq!(classifier.stats().classes, 1);
    }

    #[test]
    fn test_pass_limit() {
        let mut classifier = Classifier::with_config(ClassifierConfig::default().with_max_passes(0));
        classifier.add_class(ClassRecord::new(class("A"))).unwrap();
        let err = classifier.classify().unwrap_err();
        assert!(matches!(
            err,
            RekonError::Classification(e) if e.kind() == ClassificationErrorKind::MaxPassesExceeded
        ));
        assert_ne!(classifier.state(), ClassifierState::Stable);
    }

    #[test]
    fn test_names_learn_the_hierarchy() {
        let mut classifier = Classifier::new();
        classifier.add_class(ClassRecord::new(class("A"))).unwrap();
        classifier
            .add_class(ClassRecord::new(class("B")).with_asserted_super(class("A").into()))
            .unwrap();
        classifier.classify().unwrap();
        let names = classifier.names();
        let a = names.get(class("A").as_ref()).unwrap();
        let b = names.get(class("B").as_ref()).unwrap();
        assert!(names.subsumes(a, b));
        assert!(!names.subsumes(b, a));
        assert!(classifier.stats().passes >= 1);
    }
}
