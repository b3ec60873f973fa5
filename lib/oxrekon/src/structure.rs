//! Structural model of class expressions and the subsumption test between them.
//!
//! A class expression is normalized into an [`Expression`]: a conjunction of
//! names with nested restrictions ([`Description`]), a union of descriptions
//! ([`Disjunction`]), a numeric interval ([`NumberRange`]), a boolean value
//! ([`BooleanValue`]) or bottom ([`Expression::Nothing`]).
//!
//! The restriction `∃p.F` is the description `{p}` with the single successor
//! `F`. Subsumption is purely structural. Names are compared through the
//! [`Names`] registry, so the answer changes as the registry learns.

use crate::name::{NameId, Names};
use oxsdatatypes::Decimal;
use std::collections::BTreeSet;
use std::fmt;

/// A structural expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression {
    Description(Description),
    Disjunction(Disjunction),
    NumberRange(NumberRange),
    BooleanValue(BooleanValue),
    /// Bottom: an unsatisfiable branch.
    Nothing,
}

impl Expression {
    /// Returns true if `self` structurally subsumes `other`.
    pub fn subsumes(&self, other: &Self, names: &Names) -> bool {
        match (self, other) {
            (_, Self::Nothing) => true,
            (Self::Nothing, _) => false,
            (Self::Disjunction(a), _) => a.subsumes(other, names),
            (_, Self::Disjunction(b)) => b
                .disjuncts
                .iter()
                .all(|d| self.subsumes_description(d, names)),
            (Self::Description(a), Self::Description(b)) => a.subsumes(b, names),
            (Self::Description(a), _) => a.is_top(),
            (Self::NumberRange(a), Self::NumberRange(b)) => a.subsumes(b),
            (Self::BooleanValue(a), Self::BooleanValue(b)) => a.subsumes(*b),
            _ => false,
        }
    }

    fn subsumes_description(&self, other: &Description, names: &Names) -> bool {
        match self {
            Self::Description(a) => a.subsumes(other, names),
            Self::Disjunction(a) => a.disjuncts.iter().any(|d| d.subsumes(other, names)),
            Self::NumberRange(_) | Self::BooleanValue(_) | Self::Nothing => false,
        }
    }

    /// Exact structural equality or mutual subsumption.
    pub fn is_equivalent(&self, other: &Self, names: &Names) -> bool {
        self == other || (self.subsumes(other, names) && other.subsumes(self, names))
    }

    /// Calls `f` on every name nested anywhere in the expression.
    pub fn for_each_name(&self, f: &mut impl FnMut(NameId)) {
        match self {
            Self::Description(d) => d.for_each_name(f),
            Self::Disjunction(d) => {
                for disjunct in &d.disjuncts {
                    disjunct.for_each_name(f);
                }
            }
            Self::NumberRange(_) | Self::BooleanValue(_) | Self::Nothing => {}
        }
    }
}

impl From<Description> for Expression {
    fn from(description: Description) -> Self {
        Self::Description(description)
    }
}

/// A conjunction of names and nested successors, possibly negated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Description {
    names: BTreeSet<NameId>,
    successors: BTreeSet<Expression>,
    complement: bool,
}

impl Description {
    pub fn new(names: BTreeSet<NameId>, successors: BTreeSet<Expression>) -> Self {
        Self {
            names,
            successors,
            complement: false,
        }
    }

    /// The description made of a single name.
    pub fn named(name: NameId) -> Self {
        Self::new(BTreeSet::from([name]), BTreeSet::new())
    }

    /// `{owl:Thing}`, which subsumes every expression.
    pub fn top() -> Self {
        Self::named(NameId::THING)
    }

    /// The restriction `∃property.filler`.
    pub fn restriction(property: NameId, filler: Expression) -> Self {
        Self::new(BTreeSet::from([property]), BTreeSet::from([filler]))
    }

    pub fn names(&self) -> &BTreeSet<NameId> {
        &self.names
    }

    pub fn successors(&self) -> &BTreeSet<Expression> {
        &self.successors
    }

    pub fn is_complement(&self) -> bool {
        self.complement
    }

    /// Returns the negation of this description.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.complement = !self.complement;
        self
    }

    /// True for `{owl:Thing}` with no successors.
    pub fn is_top(&self) -> bool {
        !self.complement
            && self.successors.is_empty()
            && self.names.iter().all(|n| *n == NameId::THING)
    }

    /// Returns true if this is a single name with no nested structure.
    pub fn is_bare_name(&self) -> bool {
        !self.complement && self.names.len() == 1 && self.successors.is_empty()
    }

    /// Adds the names and successors of `other` to this conjunction.
    ///
    /// Negated descriptions cannot be merged and are ignored.
    pub fn merge(&mut self, other: &Self) {
        if other.complement || self.complement {
            return;
        }
        self.names.extend(other.names.iter().copied());
        self.successors.extend(other.successors.iter().cloned());
    }

    pub fn insert_name(&mut self, name: NameId) {
        self.names.insert(name);
    }

    pub fn insert_successor(&mut self, successor: Expression) {
        self.successors.insert(successor);
    }

    /// Returns true if `self` structurally subsumes `other`.
    ///
    /// Every name of `self` must subsume a name of `other` and every successor
    /// of `self` must subsume at least one successor of `other`, a union
    /// successor being also satisfied by a disjunct subsuming `other` itself.
    /// Two negated descriptions compare the other way around.
    pub fn subsumes(&self, other: &Self, names: &Names) -> bool {
        match (self.complement, other.complement) {
            (false, false) => self.subsumes_positive(other, names),
            (true, true) => other.subsumes_positive(self, names),
            _ => false,
        }
    }

    fn subsumes_positive(&self, other: &Self, names: &Names) -> bool {
        self.names
            .iter()
            .all(|general| other.names.iter().any(|specific| names.subsumes(*general, *specific)))
            && self.successors.iter().all(|general| {
                other
                    .successors
                    .iter()
                    .any(|specific| general.subsumes(specific, names))
                    || match general {
                        // A union conjunct holds as soon as one of its disjuncts covers `other`.
                        Expression::Disjunction(union) => {
                            union.disjuncts.iter().any(|d| d.subsumes(other, names))
                        }
                        _ => false,
                    }
            })
    }

    /// Exact structural equality or mutual subsumption.
    pub fn is_equivalent(&self, other: &Self, names: &Names) -> bool {
        self == other || (self.subsumes(other, names) && other.subsumes(self, names))
    }

    pub fn for_each_name(&self, f: &mut impl FnMut(NameId)) {
        for name in &self.names {
            f(*name);
        }
        for successor in &self.successors {
            successor.for_each_name(f);
        }
    }

    /// Number of name occurrences nested anywhere in the description.
    pub fn nested_name_count(&self) -> usize {
        let mut count = 0;
        self.for_each_name(&mut |_| count += 1);
        count
    }

    /// Returns true if a name nested anywhere in the description satisfies `predicate`.
    pub fn mentions(&self, predicate: &impl Fn(NameId) -> bool) -> bool {
        self.names.iter().any(|n| predicate(*n))
            || self.successors.iter().any(|s| match s {
                Expression::Description(d) => d.mentions(predicate),
                Expression::Disjunction(d) => d.disjuncts.iter().any(|d| d.mentions(predicate)),
                Expression::NumberRange(_) | Expression::BooleanValue(_) | Expression::Nothing => {
                    false
                }
            })
    }
}

/// A union of descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Disjunction {
    disjuncts: BTreeSet<Description>,
}

impl Disjunction {
    pub fn new(disjuncts: BTreeSet<Description>) -> Self {
        Self { disjuncts }
    }

    pub fn disjuncts(&self) -> &BTreeSet<Description> {
        &self.disjuncts
    }

    /// Every disjunct of `other` (or `other` itself) must be subsumed by one of ours.
    pub fn subsumes(&self, other: &Expression, names: &Names) -> bool {
        match other {
            Expression::Disjunction(other) => other
                .disjuncts
                .iter()
                .all(|specific| self.disjuncts.iter().any(|general| general.subsumes(specific, names))),
            Expression::Nothing => true,
            other => self
                .disjuncts
                .iter()
                .any(|general| Expression::Description(general.clone()).subsumes(other, names)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumberKind {
    Integer,
    Float,
    Double,
}

/// An interval of one numeric datatype. An absent bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumberRange {
    kind: NumberKind,
    min: Option<Decimal>,
    max: Option<Decimal>,
}

impl NumberRange {
    pub fn new(kind: NumberKind, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { kind, min, max }
    }

    /// The single value `value`.
    pub fn exact(kind: NumberKind, value: Decimal) -> Self {
        Self::new(kind, Some(value), Some(value))
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    /// The whole value space of `kind`.
    pub fn unbounded(kind: NumberKind) -> Self {
        Self::new(kind, None, None)
    }

    pub fn lower(&self) -> Option<Decimal> {
        self.min
    }

    pub fn upper(&self) -> Option<Decimal> {
        self.max
    }

    /// Returns true if `other` is contained in `self`.
    pub fn subsumes(&self, other: &Self) -> bool {
        self.kind == other.kind
            && match (self.min, other.min) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(a), Some(b)) => a <= b,
            }
            && match (self.max, other.max) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(a), Some(b)) => a >= b,
            }
    }
}

/// A boolean data value. `Any` stands for the whole `xsd:boolean` datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BooleanValue {
    Any,
    True,
    False,
}

impl BooleanValue {
    pub fn subsumes(self, other: Self) -> bool {
        self == Self::Any || self == other
    }
}

impl From<bool> for BooleanValue {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Description(d) => d.fmt(f),
            Self::Disjunction(d) => {
                f.write_str("(")?;
                for (i, disjunct) in d.disjuncts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    disjunct.fmt(f)?;
                }
                f.write_str(")")
            }
            Self::NumberRange(r) => {
                write!(f, "{:?}[", r.kind)?;
                if let Some(min) = r.min {
                    write!(f, "{min}")?;
                }
                f.write_str(",")?;
                if let Some(max) = r.max {
                    write!(f, "{max}")?;
                }
                f.write_str("]")
            }
            Self::BooleanValue(b) => write!(f, "{b:?}"),
            Self::Nothing => f.write_str("Nothing"),
        }
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.complement {
            f.write_str("not ")?;
        }
        f.write_str("{")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}")?;
        }
        for successor in &self.successors {
            write!(f, " {successor}")?;
        }
        f.write_str("}")
    }
}
