//! OWL 2 axioms relevant to class classification.
//!
//! Only the class and property hierarchy axioms are modelled: they are the
//! ones [`crate::Ontology::class_records`] and
//! [`crate::Ontology::property_hierarchy`] turn into classifier input.

use crate::entity::{DataProperty, ObjectProperty, OwlClass};
use crate::expression::{ClassExpression, ObjectPropertyExpression};

/// An OWL 2 axiom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Axiom {
    /// SubClassOf(sub, super)
    SubClassOf {
        sub_class: ClassExpression,
        super_class: ClassExpression,
    },

    /// EquivalentClasses(C1, C2, ...)
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointUnion(C, C1, ..., Cn)
    DisjointUnion {
        class: OwlClass,
        disjoint_classes: Vec<ClassExpression>,
    },

    /// SubObjectPropertyOf(sub, super)
    SubObjectPropertyOf {
        sub_property: ObjectPropertyExpression,
        super_property: ObjectPropertyExpression,
    },

    /// EquivalentObjectProperties(P1, P2, ...)
    EquivalentObjectProperties(Vec<ObjectProperty>),

    /// SubDataPropertyOf(sub, super)
    SubDataPropertyOf {
        sub_property: DataProperty,
        super_property: DataProperty,
    },

    /// EquivalentDataProperties(P1, P2, ...)
    EquivalentDataProperties(Vec<DataProperty>),

    /// Declaration(Class(C))
    DeclareClass(OwlClass),

    /// Declaration(ObjectProperty(P))
    DeclareObjectProperty(ObjectProperty),

    /// Declaration(DataProperty(P))
    DeclareDataProperty(DataProperty),
}

impl Axiom {
    /// Creates a SubClassOf axiom.
    pub fn subclass_of(sub: impl Into<ClassExpression>, sup: impl Into<ClassExpression>) -> Self {
        Self::SubClassOf {
            sub_class: sub.into(),
            super_class: sup.into(),
        }
    }

    /// Creates an EquivalentClasses axiom.
    pub fn equivalent_classes(classes: Vec<ClassExpression>) -> Self {
        Self::EquivalentClasses(classes)
    }

    /// Creates an EquivalentClasses axiom stating that `class` is defined by `definition`.
    pub fn definition(class: impl Into<OwlClass>, definition: ClassExpression) -> Self {
        Self::EquivalentClasses(vec![ClassExpression::Class(class.into()), definition])
    }

    /// Creates a SubObjectPropertyOf axiom between named properties.
    pub fn sub_object_property_of(sub: ObjectProperty, sup: ObjectProperty) -> Self {
        Self::SubObjectPropertyOf {
            sub_property: sub.into(),
            super_property: sup.into(),
        }
    }
}
