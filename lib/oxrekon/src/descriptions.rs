//! Conversion of raw class expressions into the structural model.
//!
//! Every class expression is normalized into a conjunction [`Description`]:
//! its named conjuncts become names and every other conjunct (restriction,
//! union, complement, enumeration) becomes a successor. A restriction `∃p.F`
//! is the successor `{p}` whose single successor is the converted filler.
//!
//! Unrepresentable shapes (universal restrictions, maximum cardinalities,
//! inverse properties, unsupported datatypes) are never an error: they make
//! the conversion return `None`.

use crate::entity::{Individual, OwlClass};
use crate::expression::{ClassExpression, DataRange, ObjectPropertyExpression};
use crate::name::{NameId, NameKind, Names};
use crate::structure::{BooleanValue, Description, Disjunction, Expression, NumberKind, NumberRange};
use crate::vocab;
use oxrdf::vocab::{rdfs, xsd};
use oxrdf::{Literal, NamedNodeRef};
use oxsdatatypes::{Decimal, Double};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Factory and cache of structural expressions.
///
/// Results are memoized by source expression until [`freeze`](Self::freeze)
/// is called. A frozen factory still answers from its cache but stops growing
/// it, so ad-hoc queries do not leak memory.
#[derive(Debug, Default)]
pub struct Descriptions {
    structures: FxHashMap<(ClassExpression, bool), Option<Description>>,
    successors: FxHashMap<ClassExpression, Option<Expression>>,
    frozen: bool,
}

impl Descriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops inserting into the caches.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Allows the caches to grow again, for new input after a stable run.
    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of memoized conversions.
    pub fn cache_len(&self) -> usize {
        self.structures.len() + self.successors.len()
    }

    /// Converts `expr` into a conjunction description.
    ///
    /// Returns `None` if some part of `expr` is unrepresentable, or if `expr` is
    /// a bare class name and `structured_only` is set.
    pub fn to_structure(
        &mut self,
        expr: &ClassExpression,
        structured_only: bool,
        names: &mut Names,
    ) -> Option<Description> {
        if structured_only && expr.is_named() {
            return None;
        }
        let key = (expr.clone(), structured_only);
        if let Some(cached) = self.structures.get(&key) {
            return cached.clone();
        }
        let structure = self.conjunction(expr, names);
        if !self.frozen {
            self.structures.insert(key, structure.clone());
        }
        structure
    }

    /// Converts an expression appearing as a conjunct that is not a bare name.
    ///
    /// Restrictions become `{property}` descriptions with the converted filler
    /// as successor, complements flip the complement flag and unions become
    /// disjunctions. A restriction with an empty filler is [`Expression::Nothing`].
    pub fn to_successor(&mut self, expr: &ClassExpression, names: &mut Names) -> Option<Expression> {
        if let Some(cached) = self.successors.get(expr) {
            return cached.clone();
        }
        let successor = self.convert_successor(expr, names);
        if !self.frozen {
            self.successors.insert(expr.clone(), successor.clone());
        }
        successor
    }

    /// Lenient conversion used to build class profiles.
    ///
    /// Unrepresentable top-level conjuncts are dropped instead of failing the
    /// whole expression: a weaker profile is still a sound one.
    pub fn profile_part(&mut self, expr: &ClassExpression, names: &mut Names) -> Description {
        let mut description = Description::default();
        match expr {
            ClassExpression::ObjectIntersectionOf(operands) => {
                for operand in operands {
                    description.merge(&self.profile_part(operand, names));
                }
            }
            ClassExpression::Class(class) => {
                if let Some(name) = class_name(class, names) {
                    description.insert_name(name);
                }
            }
            _ => {
                if let Some(successor) = self.to_successor(expr, names) {
                    description.insert_successor(successor);
                }
            }
        }
        description
    }

    fn conjunction(&mut self, expr: &ClassExpression, names: &mut Names) -> Option<Description> {
        let mut description = Description::default();
        match expr {
            ClassExpression::Class(class) => match class_name(class, names) {
                Some(name) => description.insert_name(name),
                None => description.insert_successor(Expression::Nothing),
            },
            ClassExpression::ObjectIntersectionOf(operands) => {
                for operand in operands {
                    description.merge(&self.conjunction(operand, names)?);
                }
            }
            _ => description.insert_successor(self.to_successor(expr, names)?),
        }
        Some(description)
    }

    fn convert_successor(&mut self, expr: &ClassExpression, names: &mut Names) -> Option<Expression> {
        match expr {
            ClassExpression::Class(_) | ClassExpression::ObjectIntersectionOf(_) => {
                self.filler(expr, names)
            }
            ClassExpression::ObjectUnionOf(operands) => {
                let mut disjuncts = BTreeSet::new();
                for operand in operands {
                    match self.filler(operand, names)? {
                        Expression::Nothing => {}
                        Expression::Description(d) => {
                            disjuncts.insert(d);
                        }
                        Expression::Disjunction(d) => disjuncts.extend(d.disjuncts().iter().cloned()),
                        Expression::NumberRange(_) | Expression::BooleanValue(_) => return None,
                    }
                }
                Some(disjunction(disjuncts))
            }
            ClassExpression::ObjectComplementOf(operand) => match operand.as_ref() {
                ClassExpression::ObjectComplementOf(inner) => self.filler(inner, names),
                operand => Some(self.conjunction(operand, names)?.negated().into()),
            },
            ClassExpression::ObjectOneOf(individuals) => {
                let mut disjuncts = BTreeSet::new();
                for individual in individuals {
                    disjuncts.insert(Description::named(individual_name(individual, names)?));
                }
                Some(disjunction(disjuncts))
            }
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                let property = object_property_name(property, names)?;
                let filler = self.filler(filler, names)?;
                Some(restriction(property, filler))
            }
            ClassExpression::ObjectHasValue {
                property,
                individual,
            } => {
                let property = object_property_name(property, names)?;
                let individual = individual_name(individual, names)?;
                Some(Description::restriction(property, Description::named(individual).into()).into())
            }
            ClassExpression::ObjectMinCardinality {
                cardinality,
                property,
                filler,
            }
            | ClassExpression::ObjectExactCardinality {
                cardinality,
                property,
                filler,
            } => {
                if *cardinality == 0 {
                    return None;
                }
                let property = object_property_name(property, names)?;
                let filler = match filler {
                    Some(filler) => self.filler(filler, names)?,
                    None => Description::top().into(),
                };
                Some(restriction(property, filler))
            }
            ClassExpression::DataSomeValuesFrom { property, filler } => {
                let property = names.intern(property.as_ref(), NameKind::DataProperty);
                Some(restriction(property, data_range(filler)?))
            }
            ClassExpression::DataHasValue { property, value } => {
                let property = names.intern(property.as_ref(), NameKind::DataProperty);
                Some(restriction(property, literal_value(value)?))
            }
            ClassExpression::DataMinCardinality {
                cardinality,
                property,
                filler,
            }
            | ClassExpression::DataExactCardinality {
                cardinality,
                property,
                filler,
            } => {
                if *cardinality == 0 {
                    return None;
                }
                let property = names.intern(property.as_ref(), NameKind::DataProperty);
                let filler = match filler {
                    Some(filler) => data_range(filler)?,
                    None => Description::top().into(),
                };
                Some(restriction(property, filler))
            }
            ClassExpression::ObjectAllValuesFrom { .. }
            | ClassExpression::ObjectHasSelf(_)
            | ClassExpression::ObjectMaxCardinality { .. }
            | ClassExpression::DataAllValuesFrom { .. }
            | ClassExpression::DataMaxCardinality { .. } => None,
        }
    }

    /// Converts the filler of a restriction.
    fn filler(&mut self, expr: &ClassExpression, names: &mut Names) -> Option<Expression> {
        match expr {
            ClassExpression::Class(class) if class.iri().as_ref() == vocab::NOTHING => {
                Some(Expression::Nothing)
            }
            ClassExpression::ObjectUnionOf(_)
            | ClassExpression::ObjectComplementOf(_)
            | ClassExpression::ObjectOneOf(_) => self.to_successor(expr, names),
            _ => Some(self.conjunction(expr, names)?.into()),
        }
    }
}

/// The name of a class, `None` for the built-in classes that are not names.
fn class_name(class: &OwlClass, names: &mut Names) -> Option<NameId> {
    if class.iri().as_ref() == vocab::THING {
        Some(NameId::THING)
    } else if class.is_builtin() {
        None
    } else {
        Some(names.intern(class.as_ref(), NameKind::Class))
    }
}

fn object_property_name(property: &ObjectPropertyExpression, names: &mut Names) -> Option<NameId> {
    Some(names.intern(property.as_named()?.as_ref(), NameKind::ObjectProperty))
}

fn individual_name(individual: &Individual, names: &mut Names) -> Option<NameId> {
    Some(names.intern(individual.as_named()?.as_ref(), NameKind::Individual))
}

fn restriction(property: NameId, filler: Expression) -> Expression {
    if filler == Expression::Nothing {
        Expression::Nothing
    } else {
        Description::restriction(property, filler).into()
    }
}

fn disjunction(mut disjuncts: BTreeSet<Description>) -> Expression {
    if disjuncts.len() > 1 {
        return Expression::Disjunction(Disjunction::new(disjuncts));
    }
    disjuncts
        .pop_first()
        .map_or(Expression::Nothing, Expression::Description)
}

fn data_range(range: &DataRange) -> Option<Expression> {
    match range {
        DataRange::Datatype(datatype) => datatype_value_space(datatype.as_ref()),
        DataRange::DatatypeRestriction { datatype, facets } => {
            let Some(Expression::NumberRange(base)) = datatype_value_space(datatype.as_ref()) else {
                return None;
            };
            let kind = base.kind();
            let (mut min, mut max) = (base.lower(), base.upper());
            for (facet, value) in facets {
                let value = literal_decimal(value)?;
                let facet = facet.as_ref();
                if facet == vocab::MIN_INCLUSIVE {
                    min = Some(tighter_min(min, value));
                } else if facet == vocab::MAX_INCLUSIVE {
                    max = Some(tighter_max(max, value));
                } else if facet == vocab::MIN_EXCLUSIVE && kind == NumberKind::Integer {
                    min = Some(tighter_min(min, value.checked_floor()?.checked_add(1)?));
                } else if facet == vocab::MAX_EXCLUSIVE && kind == NumberKind::Integer {
                    max = Some(tighter_max(max, value.checked_ceil()?.checked_sub(1)?));
                } else {
                    return None;
                }
            }
            Some(Expression::NumberRange(NumberRange::new(kind, min, max)))
        }
        DataRange::DataOneOf(values) => match values.as_slice() {
            [] => Some(Expression::Nothing),
            [value] => literal_value(value),
            _ => None,
        },
        DataRange::DataIntersectionOf(operands) => match operands.as_slice() {
            [operand] => data_range(operand),
            _ => None,
        },
        DataRange::DataUnionOf(_) | DataRange::DataComplementOf(_) => None,
    }
}

/// The whole value space of a datatype.
fn datatype_value_space(datatype: NamedNodeRef<'_>) -> Option<Expression> {
    if datatype == rdfs::LITERAL {
        return Some(Description::top().into());
    }
    if datatype == xsd::BOOLEAN {
        return Some(Expression::BooleanValue(BooleanValue::Any));
    }
    let (kind, min, max) = numeric_bounds(datatype)?;
    Some(Expression::NumberRange(NumberRange::new(kind, min, max)))
}

fn numeric_bounds(datatype: NamedNodeRef<'_>) -> Option<(NumberKind, Option<Decimal>, Option<Decimal>)> {
    fn integers(min: Option<Decimal>, max: Option<Decimal>) -> Option<(NumberKind, Option<Decimal>, Option<Decimal>)> {
        Some((NumberKind::Integer, min, max))
    }
    match datatype {
        xsd::FLOAT => Some((NumberKind::Float, None, None)),
        xsd::DOUBLE => Some((NumberKind::Double, None, None)),
        xsd::INTEGER => integers(None, None),
        xsd::NON_NEGATIVE_INTEGER => integers(Some(0.into()), None),
        xsd::POSITIVE_INTEGER => integers(Some(1.into()), None),
        xsd::NON_POSITIVE_INTEGER => integers(None, Some(0.into())),
        xsd::NEGATIVE_INTEGER => integers(None, Some((-1).into())),
        xsd::LONG => integers(Some(i64::MIN.into()), Some(i64::MAX.into())),
        xsd::INT => integers(Some(i32::MIN.into()), Some(i32::MAX.into())),
        xsd::SHORT => integers(Some(i16::MIN.into()), Some(i16::MAX.into())),
        xsd::BYTE => integers(Some(i8::MIN.into()), Some(i8::MAX.into())),
        xsd::UNSIGNED_LONG => integers(Some(0.into()), Some(u64::MAX.into())),
        xsd::UNSIGNED_INT => integers(Some(0.into()), Some(u32::MAX.into())),
        xsd::UNSIGNED_SHORT => integers(Some(0.into()), Some(u16::MAX.into())),
        xsd::UNSIGNED_BYTE => integers(Some(0.into()), Some(u8::MAX.into())),
        _ => None,
    }
}

/// A single literal as a data value: an exact numeric range or a boolean.
fn literal_value(literal: &Literal) -> Option<Expression> {
    let datatype = literal.datatype();
    if datatype == xsd::BOOLEAN {
        return match literal.value() {
            "true" | "1" => Some(Expression::BooleanValue(BooleanValue::True)),
            "false" | "0" => Some(Expression::BooleanValue(BooleanValue::False)),
            _ => None,
        };
    }
    let (kind, _, _) = numeric_bounds(datatype)?;
    Some(Expression::NumberRange(NumberRange::exact(
        kind,
        literal_decimal(literal)?,
    )))
}

fn literal_decimal(literal: &Literal) -> Option<Decimal> {
    let value = literal.value().trim();
    Decimal::from_str(value)
        .ok()
        .or_else(|| Decimal::try_from(Double::from_str(value).ok()?).ok())
}

fn tighter_min(current: Option<Decimal>, value: Decimal) -> Decimal {
    current.map_or(value, |current| current.max(value))
}

fn tighter_max(current: Option<Decimal>, value: Decimal) -> Decimal {
    current.map_or(value, |current| current.min(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DataProperty, ObjectProperty};
    use oxrdf::NamedNode;

    fn iri(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.org/{local}"))
    }

    fn class(local: &str) -> ClassExpression {
        ClassExpression::class(OwlClass::new(iri(local)))
    }

    fn object_property(local: &str) -> ObjectProperty {
        ObjectProperty::new(iri(local))
    }

    fn age_between(min: i64, max: i64) -> ClassExpression {
        ClassExpression::data_some_values_from(
            DataProperty::new(iri("hasAge")),
            DataRange::inclusive_range(xsd::INTEGER, Some(min.into()), Some(max.into())),
        )
    }

    #[test]
    fn test_structured_only_skips_bare_names() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        assert!(descriptions.to_structure(&class("A"), true, &mut names).is_none());
        let a = descriptions.to_structure(&class("A"), false, &mut names).unwrap();
        assert!(a.is_bare_name());
        assert_eq!(names.get(iri("A").as_ref()), a.names().first().copied());
    }

    #[test]
    fn test_conjunction_normal_form() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let expr = ClassExpression::intersection(vec![
            class("A"),
            ClassExpression::some_values_from(object_property("hasColor"), class("Red")),
        ]);
        let description = descriptions.to_structure(&expr, true, &mut names).unwrap();
        assert_eq!(description.names().len(), 1);
        assert_eq!(description.successors().len(), 1);
        let has_color = names.get(iri("hasColor").as_ref()).unwrap();
        let red = names.get(iri("Red").as_ref()).unwrap();
        assert!(description.successors().contains(&Expression::from(Description::restriction(
            has_color,
            Description::named(red).into()
        ))));
        assert_eq!(description.nested_name_count(), 3);
    }

    #[test]
    fn test_unrepresentable_definition_fails_but_profile_degrades() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let expr = ClassExpression::intersection(vec![
            class("A"),
            ClassExpression::all_values_from(object_property("hasPart"), class("B")),
        ]);
        assert!(descriptions.to_structure(&expr, true, &mut names).is_none());
        let profile = descriptions.profile_part(&expr, &mut names);
        assert_eq!(profile.names().len(), 1);
        assert!(profile.successors().is_empty());
    }

    #[test]
    fn test_inverse_properties_are_unrepresentable() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let expr = ClassExpression::some_values_from(
            ObjectPropertyExpression::inverse(object_property("p")),
            class("B"),
        );
        assert!(descriptions.to_successor(&expr, &mut names).is_none());
    }

    #[test]
    fn test_empty_filler_is_nothing() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let p = object_property("p");
        for filler in [
            ClassExpression::class(OwlClass::nothing()),
            ClassExpression::union(Vec::new()),
            ClassExpression::ObjectOneOf(Vec::new()),
        ] {
            let expr = ClassExpression::some_values_from(p.clone(), filler);
            assert_eq!(
                descriptions.to_successor(&expr, &mut names),
                Some(Expression::Nothing)
            );
        }
    }

    #[test]
    fn test_cardinality_restrictions() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let p = ObjectPropertyExpression::from(object_property("p"));
        let min_one = ClassExpression::ObjectMinCardinality {
            cardinality: 1,
            property: p.clone(),
            filler: None,
        };
        let some_thing = ClassExpression::some_values_from(p.clone(), ClassExpression::class(OwlClass::thing()));
        assert_eq!(
            descriptions.to_successor(&min_one, &mut names),
            descriptions.to_successor(&some_thing, &mut names)
        );
        let min_zero = ClassExpression::ObjectMinCardinality {
            cardinality: 0,
            property: p.clone(),
            filler: None,
        };
        assert!(descriptions.to_successor(&min_zero, &mut names).is_none());
        let max = ClassExpression::ObjectMaxCardinality {
            cardinality: 2,
            property: p,
            filler: None,
        };
        assert!(descriptions.to_successor(&max, &mut names).is_none());
    }

    #[test]
    fn test_numeric_ranges() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        let adult = descriptions.to_structure(&age_between(18, 65), false, &mut names).unwrap();
        let middle = descriptions.to_structure(&age_between(25, 40), false, &mut names).unwrap();
        assert!(adult.subsumes(&middle, &names));
        assert!(!middle.subsumes(&adult, &names));

        let positive = ClassExpression::data_some_values_from(
            DataProperty::new(iri("hasAge")),
            DataRange::datatype(xsd::POSITIVE_INTEGER),
        );
        let positive = descriptions.to_structure(&positive, false, &mut names).unwrap();
        assert!(positive.subsumes(&adult, &names));
    }

    #[test]
    fn test_exclusive_facets() {
        let exclusive = DataRange::DatatypeRestriction {
            datatype: xsd::INTEGER.into_owned(),
            facets: vec![
                (vocab::MIN_EXCLUSIVE.into_owned(), Literal::from(1)),
                (vocab::MAX_EXCLUSIVE.into_owned(), Literal::from(10)),
            ],
        };
        assert_eq!(
            data_range(&exclusive),
            Some(Expression::NumberRange(NumberRange::new(
                NumberKind::Integer,
                Some(2.into()),
                Some(9.into())
            )))
        );
        let on_double = DataRange::DatatypeRestriction {
            datatype: xsd::DOUBLE.into_owned(),
            facets: vec![(vocab::MIN_EXCLUSIVE.into_owned(), Literal::from(1.5))],
        };
        assert_eq!(data_range(&on_double), None);
        assert_eq!(data_range(&DataRange::datatype(xsd::DECIMAL)), None);
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(
            literal_value(&Literal::from(true)),
            Some(Expression::BooleanValue(BooleanValue::True))
        );
        assert_eq!(
            literal_value(&Literal::from(42)),
            Some(Expression::NumberRange(NumberRange::exact(
                NumberKind::Integer,
                42.into()
            )))
        );
        assert_eq!(literal_value(&Literal::new_simple_literal("forty-two")), None);
        assert_eq!(
            data_range(&DataRange::datatype(rdfs::LITERAL)),
            Some(Description::top().into())
        );
    }

    #[test]
    fn test_frozen_cache_stops_growing() {
        let mut descriptions = Descriptions::new();
        let mut names = Names::new();
        descriptions.to_structure(&age_between(1, 2), false, &mut names);
        let len = descriptions.cache_len();
        assert!(len > 0);
        descriptions.freeze();
        assert!(descriptions.is_frozen());
        descriptions.to_structure(&age_between(3, 4), false, &mut names);
        assert_eq!(descriptions.cache_len(), len);
        assert!(descriptions.to_structure(&age_between(1, 2), false, &mut names).is_some());
    }
}
