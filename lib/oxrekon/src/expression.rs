//! OWL 2 class expressions, object property expressions, and data ranges.
//!
//! These are the raw expressions the classifier is fed with. They are turned
//! into the structural model of [`crate::structure`] by [`crate::Descriptions`].

use crate::entity::{DataProperty, Individual, ObjectProperty, OwlClass};
use oxrdf::{Literal, NamedNode};

/// An OWL 2 class expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassExpression {
    /// A named class
    Class(OwlClass),

    /// ObjectIntersectionOf(C1, ..., Cn)
    ObjectIntersectionOf(Vec<ClassExpression>),

    /// ObjectUnionOf(C1, ..., Cn)
    ObjectUnionOf(Vec<ClassExpression>),

    /// ObjectComplementOf(C)
    ObjectComplementOf(Box<ClassExpression>),

    /// ObjectOneOf(a1, ..., an)
    ObjectOneOf(Vec<Individual>),

    /// ObjectSomeValuesFrom(P, C)
    ObjectSomeValuesFrom {
        property: ObjectPropertyExpression,
        filler: Box<ClassExpression>,
    },

    /// ObjectAllValuesFrom(P, C)
    ObjectAllValuesFrom {
        property: ObjectPropertyExpression,
        filler: Box<ClassExpression>,
    },

    /// ObjectHasValue(P, a)
    ObjectHasValue {
        property: ObjectPropertyExpression,
        individual: Individual,
    },

    /// ObjectHasSelf(P)
    ObjectHasSelf(ObjectPropertyExpression),

    /// ObjectMinCardinality(n, P [, C])
    ObjectMinCardinality {
        cardinality: u32,
        property: ObjectPropertyExpression,
        filler: Option<Box<ClassExpression>>,
    },

    /// ObjectMaxCardinality(n, P [, C])
    ObjectMaxCardinality {
        cardinality: u32,
        property: ObjectPropertyExpression,
        filler: Option<Box<ClassExpression>>,
    },

    /// ObjectExactCardinality(n, P [, C])
    ObjectExactCardinality {
        cardinality: u32,
        property: ObjectPropertyExpression,
        filler: Option<Box<ClassExpression>>,
    },

    /// DataSomeValuesFrom(P, D)
    DataSomeValuesFrom {
        property: DataProperty,
        filler: DataRange,
    },

    /// DataAllValuesFrom(P, D)
    DataAllValuesFrom {
        property: DataProperty,
        filler: DataRange,
    },

    /// DataHasValue(P, v)
    DataHasValue {
        property: DataProperty,
        value: Literal,
    },

    /// DataMinCardinality(n, P [, D])
    DataMinCardinality {
        cardinality: u32,
        property: DataProperty,
        filler: Option<DataRange>,
    },

    /// DataMaxCardinality(n, P [, D])
    DataMaxCardinality {
        cardinality: u32,
        property: DataProperty,
        filler: Option<DataRange>,
    },

    /// DataExactCardinality(n, P [, D])
    DataExactCardinality {
        cardinality: u32,
        property: DataProperty,
        filler: Option<DataRange>,
    },
}

impl ClassExpression {
    /// Creates a named class expression.
    pub fn class(c: impl Into<OwlClass>) -> Self {
        Self::Class(c.into())
    }

    /// Creates an intersection of classes.
    pub fn intersection(classes: Vec<ClassExpression>) -> Self {
        Self::ObjectIntersectionOf(classes)
    }

    /// Creates a union of classes.
    pub fn union(classes: Vec<ClassExpression>) -> Self {
        Self::ObjectUnionOf(classes)
    }

    /// Creates the complement of a class expression.
    pub fn complement(c: ClassExpression) -> Self {
        Self::ObjectComplementOf(Box::new(c))
    }

    /// Creates an existential restriction.
    pub fn some_values_from(
        property: impl Into<ObjectPropertyExpression>,
        filler: ClassExpression,
    ) -> Self {
        Self::ObjectSomeValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    /// Creates a universal restriction.
    pub fn all_values_from(
        property: impl Into<ObjectPropertyExpression>,
        filler: ClassExpression,
    ) -> Self {
        Self::ObjectAllValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    /// Creates a has-value restriction.
    pub fn has_value(
        property: impl Into<ObjectPropertyExpression>,
        individual: impl Into<Individual>,
    ) -> Self {
        Self::ObjectHasValue {
            property: property.into(),
            individual: individual.into(),
        }
    }

    /// Creates an existential data restriction.
    pub fn data_some_values_from(property: impl Into<DataProperty>, filler: DataRange) -> Self {
        Self::DataSomeValuesFrom {
            property: property.into(),
            filler,
        }
    }

    /// Creates a data has-value restriction.
    pub fn data_has_value(property: impl Into<DataProperty>, value: impl Into<Literal>) -> Self {
        Self::DataHasValue {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Returns true if this is a named class.
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Returns the named class if this is one.
    pub fn as_class(&self) -> Option<&OwlClass> {
        match self {
            Self::Class(c) => Some(c),
            _ => None,
        }
    }

    /// Returns true if `class` is the expression itself or one of its top-level conjuncts.
    pub fn has_conjunct(&self, class: &OwlClass) -> bool {
        match self {
            Self::Class(c) => c == class,
            Self::ObjectIntersectionOf(operands) => operands.iter().any(|o| o.has_conjunct(class)),
            _ => false,
        }
    }

    /// Nesting depth of the expression, a bare name being at depth 1.
    pub fn depth(&self) -> usize {
        let nested = match self {
            Self::Class(_) | Self::ObjectOneOf(_) | Self::ObjectHasValue { .. } | Self::ObjectHasSelf(_) => 0,
            Self::ObjectIntersectionOf(operands) | Self::ObjectUnionOf(operands) => {
                operands.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::ObjectComplementOf(operand) => operand.depth(),
            Self::ObjectSomeValuesFrom { filler, .. } | Self::ObjectAllValuesFrom { filler, .. } => {
                filler.depth()
            }
            Self::ObjectMinCardinality { filler, .. }
            | Self::ObjectMaxCardinality { filler, .. }
            | Self::ObjectExactCardinality { filler, .. } => {
                filler.as_deref().map_or(0, Self::depth)
            }
            Self::DataSomeValuesFrom { filler, .. } | Self::DataAllValuesFrom { filler, .. } => {
                filler.depth()
            }
            Self::DataHasValue { .. } => 0,
            Self::DataMinCardinality { filler, .. }
            | Self::DataMaxCardinality { filler, .. }
            | Self::DataExactCardinality { filler, .. } => filler.as_ref().map_or(0, DataRange::depth),
        };
        nested + 1
    }
}

impl From<OwlClass> for ClassExpression {
    fn from(c: OwlClass) -> Self {
        Self::Class(c)
    }
}

/// An OWL 2 object property expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectPropertyExpression {
    ObjectProperty(ObjectProperty),
    /// ObjectInverseOf(P)
    ObjectInverseOf(Box<ObjectProperty>),
}

impl ObjectPropertyExpression {
    /// Creates an inverse property expression.
    pub fn inverse(property: ObjectProperty) -> Self {
        Self::ObjectInverseOf(Box::new(property))
    }

    /// Returns the property if this is a plain (non inverse) property.
    pub fn as_named(&self) -> Option<&ObjectProperty> {
        match self {
            Self::ObjectProperty(p) => Some(p),
            Self::ObjectInverseOf(_) => None,
        }
    }
}

impl From<ObjectProperty> for ObjectPropertyExpression {
    fn from(p: ObjectProperty) -> Self {
        Self::ObjectProperty(p)
    }
}

/// An OWL 2 data range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataRange {
    /// A named datatype (e.g., xsd:integer)
    Datatype(NamedNode),

    /// DataIntersectionOf(D1, ..., Dn)
    DataIntersectionOf(Vec<DataRange>),

    /// DataUnionOf(D1, ..., Dn)
    DataUnionOf(Vec<DataRange>),

    /// DataComplementOf(D)
    DataComplementOf(Box<DataRange>),

    /// DataOneOf(v1, ..., vn)
    DataOneOf(Vec<Literal>),

    /// DatatypeRestriction(D, facet1 value1, ...)
    DatatypeRestriction {
        datatype: NamedNode,
        facets: Vec<(NamedNode, Literal)>,
    },
}

impl DataRange {
    /// Creates a datatype data range.
    pub fn datatype(dt: impl Into<NamedNode>) -> Self {
        Self::Datatype(dt.into())
    }

    /// Creates an inclusive `[min, max]` restriction of a numeric datatype.
    ///
    /// An absent bound leaves that side of the range open.
    pub fn inclusive_range(
        datatype: impl Into<NamedNode>,
        min: Option<Literal>,
        max: Option<Literal>,
    ) -> Self {
        let mut facets = Vec::new();
        if let Some(min) = min {
            facets.push((crate::vocab::MIN_INCLUSIVE.into_owned(), min));
        }
        if let Some(max) = max {
            facets.push((crate::vocab::MAX_INCLUSIVE.into_owned(), max));
        }
        Self::DatatypeRestriction {
            datatype: datatype.into(),
            facets,
        }
    }

    fn depth(&self) -> usize {
        let nested = match self {
            Self::DataIntersectionOf(operands) | Self::DataUnionOf(operands) => {
                operands.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::DataComplementOf(operand) => operand.depth(),
            Self::Datatype(_) | Self::DataOneOf(_) | Self::DatatypeRestriction { .. } => 0,
        };
        nested + 1
    }
}

impl From<NamedNode> for DataRange {
    fn from(node: NamedNode) -> Self {
        Self::Datatype(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> ClassExpression {
        ClassExpression::class(OwlClass::new(NamedNode::new_unchecked(format!(
            "http://example.org/{name}"
        ))))
    }

    #[test]
    fn test_depth_counts_nested_fillers() {
        let has_color = ObjectProperty::new(NamedNode::new_unchecked("http://example.org/hasColor"));
        assert_eq!(class("A").depth(), 1);
        let restriction = ClassExpression::some_values_from(has_color, class("Red"));
        assert_eq!(restriction.depth(), 2);
        assert_eq!(
            ClassExpression::intersection(vec![class("A"), restriction]).depth(),
            3
        );
    }

    #[test]
    fn test_top_level_conjuncts() {
        let has_part = ObjectProperty::new(NamedNode::new_unchecked("http://example.org/hasPart"));
        let a = OwlClass::new(NamedNode::new_unchecked("http://example.org/A"));
        let nested = ClassExpression::some_values_from(has_part, class("A"));
        assert!(class("A").has_conjunct(&a));
        assert!(ClassExpression::intersection(vec![class("B"), class("A")]).has_conjunct(&a));
        assert!(!nested.has_conjunct(&a));
        assert!(!ClassExpression::union(vec![class("A"), class("B")]).has_conjunct(&a));
    }

    #[test]
    fn test_inverse_property_is_not_named() {
        let p = ObjectProperty::new(NamedNode::new_unchecked("http://example.org/p"));
        assert!(ObjectPropertyExpression::from(p.clone()).as_named().is_some());
        assert!(ObjectPropertyExpression::inverse(p).as_named().is_none());
    }
}
