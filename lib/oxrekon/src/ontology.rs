//! OWL 2 ontology, the container the classifier input is extracted from.

use crate::axiom::Axiom;
use crate::entity::{DataProperty, ObjectProperty, OwlClass};
use crate::expression::ClassExpression;
use oxrdf::NamedNode;
use rustc_hash::{FxHashMap, FxHashSet};

/// An OWL 2 ontology: a list of axioms plus declaration indexes.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    iri: Option<NamedNode>,
    axioms: Vec<Axiom>,
    classes: FxHashSet<OwlClass>,
    object_properties: FxHashSet<ObjectProperty>,
    data_properties: FxHashSet<DataProperty>,
}

/// What the ontology says about one named class.
///
/// This is the flat input of the classifier: the class, the expressions it is
/// equivalent to and the expressions it is asserted to be a subclass of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub class: OwlClass,
    /// Expressions from "equivalent-to" axioms.
    pub definitions: Vec<ClassExpression>,
    /// Expressions from "subclass-of" axioms.
    pub asserted_supers: Vec<ClassExpression>,
}

impl ClassRecord {
    /// A record with neither definitions nor asserted supers.
    pub fn new(class: impl Into<OwlClass>) -> Self {
        Self {
            class: class.into(),
            definitions: Vec::new(),
            asserted_supers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_definition(mut self, definition: ClassExpression) -> Self {
        self.definitions.push(definition);
        self
    }

    #[must_use]
    pub fn with_asserted_super(mut self, sup: ClassExpression) -> Self {
        self.asserted_supers.push(sup);
        self
    }

    /// Returns true if the class is only known as a name, with nothing defining it.
    pub fn is_placeholder(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Whether a property points to individuals or to data values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Object,
    Data,
}

/// An asserted relation between two named properties of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyRelation {
    SubPropertyOf {
        kind: PropertyKind,
        sub: NamedNode,
        sup: NamedNode,
    },
    EquivalentProperties {
        kind: PropertyKind,
        left: NamedNode,
        right: NamedNode,
    },
}

impl PropertyRelation {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::SubPropertyOf { kind, .. } | Self::EquivalentProperties { kind, .. } => *kind,
        }
    }
}

impl Ontology {
    /// Creates a new empty ontology.
    pub fn new(iri: Option<NamedNode>) -> Self {
        Self {
            iri,
            ..Self::default()
        }
    }

    /// Returns the ontology IRI.
    pub fn iri(&self) -> Option<&NamedNode> {
        self.iri.as_ref()
    }

    /// Adds an axiom to the ontology.
    pub fn add_axiom(&mut self, axiom: Axiom) {
        match &axiom {
            Axiom::DeclareClass(c) => {
                self.classes.insert(c.clone());
            }
            Axiom::DeclareObjectProperty(p) => {
                self.object_properties.insert(p.clone());
            }
            Axiom::DeclareDataProperty(p) => {
                self.data_properties.insert(p.clone());
            }
            Axiom::SubClassOf {
                sub_class,
                super_class,
            } => {
                self.declare_classes_in_expression(sub_class);
                self.declare_classes_in_expression(super_class);
            }
            Axiom::EquivalentClasses(classes) => {
                for c in classes {
                    self.declare_classes_in_expression(c);
                }
            }
            Axiom::DisjointUnion {
                class,
                disjoint_classes,
            } => {
                self.classes.insert(class.clone());
                for c in disjoint_classes {
                    self.declare_classes_in_expression(c);
                }
            }
            Axiom::SubObjectPropertyOf { .. }
            | Axiom::EquivalentObjectProperties(_)
            | Axiom::SubDataPropertyOf { .. }
            | Axiom::EquivalentDataProperties(_) => {}
        }
        self.axioms.push(axiom);
    }

    fn declare_classes_in_expression(&mut self, expr: &ClassExpression) {
        if let ClassExpression::Class(c) = expr {
            self.classes.insert(c.clone());
        }
    }

    /// Returns all axioms in the ontology.
    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    /// Returns all declared or mentioned named classes.
    pub fn classes(&self) -> impl Iterator<Item = &OwlClass> {
        self.classes.iter()
    }

    /// Returns the declared object properties.
    pub fn object_properties(&self) -> impl Iterator<Item = &ObjectProperty> {
        self.object_properties.iter()
    }

    /// Returns the declared data properties.
    pub fn data_properties(&self) -> impl Iterator<Item = &DataProperty> {
        self.data_properties.iter()
    }

    /// Extracts one [`ClassRecord`] per class that is declared, defined, or asserted
    /// in a class axiom.
    ///
    /// Records come out in order of first mention. `owl:Thing` and `owl:Nothing`
    /// never get a record.
    pub fn class_records(&self) -> Vec<ClassRecord> {
        let mut records = Vec::<ClassRecord>::new();
        let mut positions = FxHashMap::<OwlClass, usize>::default();
        let mut record_of = |class: &OwlClass| -> Option<usize> {
            if class.is_builtin() {
                return None;
            }
            Some(*positions.entry(class.clone()).or_insert_with(|| {
                records.push(ClassRecord::new(class.clone()));
                records.len() - 1
            }))
        };
        let mut updates = Vec::<(usize, Option<ClassExpression>, Option<ClassExpression>)>::new();

        for axiom in &self.axioms {
            match axiom {
                Axiom::SubClassOf {
                    sub_class,
                    super_class,
                } => {
                    if let ClassExpression::Class(sub) = sub_class {
                        if let Some(i) = record_of(sub) {
                            updates.push((i, None, Some(super_class.clone())));
                        }
                    }
                    if let ClassExpression::Class(sup) = super_class {
                        record_of(sup);
                    }
                }
                Axiom::EquivalentClasses(members) => {
                    for (i, member) in members.iter().enumerate() {
                        let ClassExpression::Class(class) = member else {
                            continue;
                        };
                        let Some(position) = record_of(class) else {
                            continue;
                        };
                        for (j, other) in members.iter().enumerate() {
                            if i != j && other != member {
                                updates.push((position, Some(other.clone()), None));
                            }
                        }
                    }
                }
                Axiom::DisjointUnion {
                    class,
                    disjoint_classes,
                } => {
                    let Some(position) = record_of(class) else {
                        continue;
                    };
                    updates.push((
                        position,
                        Some(ClassExpression::ObjectUnionOf(disjoint_classes.clone())),
                        None,
                    ));
                    for part in disjoint_classes {
                        if let ClassExpression::Class(part) = part {
                            if let Some(i) = record_of(part) {
                                updates.push((i, None, Some(ClassExpression::Class(class.clone()))));
                            }
                        }
                    }
                }
                Axiom::DeclareClass(class) => {
                    record_of(class);
                }
                _ => {}
            }
        }

        for (position, definition, sup) in updates {
            let record = &mut records[position];
            if let Some(definition) = definition {
                if !record.definitions.contains(&definition) {
                    record.definitions.push(definition);
                }
            }
            if let Some(sup) = sup {
                if !record.asserted_supers.contains(&sup) {
                    record.asserted_supers.push(sup);
                }
            }
        }
        records
    }

    /// Extracts the asserted hierarchy between named object and data properties.
    ///
    /// Sub-property axioms over inverse properties are skipped.
    pub fn property_hierarchy(&self) -> Vec<PropertyRelation> {
        fn equivalences<'a>(
            kind: PropertyKind,
            properties: impl Iterator<Item = &'a NamedNode>,
        ) -> Vec<PropertyRelation> {
            let properties = properties.collect::<Vec<_>>();
            properties
                .windows(2)
                .map(|pair| PropertyRelation::EquivalentProperties {
                    kind,
                    left: pair[0].clone(),
                    right: pair[1].clone(),
                })
                .collect()
        }

        let mut relations = Vec::new();
        for axiom in &self.axioms {
            match axiom {
                Axiom::SubObjectPropertyOf {
                    sub_property,
                    super_property,
                } => {
                    if let (Some(sub), Some(sup)) = (sub_property.as_named(), super_property.as_named()) {
                        relations.push(PropertyRelation::SubPropertyOf {
                            kind: PropertyKind::Object,
                            sub: sub.iri().clone(),
                            sup: sup.iri().clone(),
                        });
                    }
                }
                Axiom::SubDataPropertyOf {
                    sub_property,
                    super_property,
                } => relations.push(PropertyRelation::SubPropertyOf {
                    kind: PropertyKind::Data,
                    sub: sub_property.iri().clone(),
                    sup: super_property.iri().clone(),
                }),
                Axiom::EquivalentObjectProperties(properties) => relations.extend(equivalences(
                    PropertyKind::Object,
                    properties.iter().map(ObjectProperty::iri),
                )),
                Axiom::EquivalentDataProperties(properties) => relations.extend(equivalences(
                    PropertyKind::Data,
                    properties.iter().map(DataProperty::iri),
                )),
                _ => {}
            }
        }
        relations
    }
}

impl std::fmt::Display for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(iri) = &self.iri {
            write!(f, "Ontology({iri})")?;
        } else {
            write!(f, "Ontology(anonymous)")?;
        }
        write!(f, " [{} axioms]", self.axioms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ObjectPropertyExpression;

    fn class(local: &str) -> OwlClass {
        OwlClass::new(NamedNode::new_unchecked(format!("http://example.org/{local}")))
    }

    fn property(local: &str) -> ObjectProperty {
        ObjectProperty::new(NamedNode::new_unchecked(format!("http://example.org/{local}")))
    }

    #[test]
    fn test_class_records() {
        let mut ontology = Ontology::new(None);
        let restriction = ClassExpression::some_values_from(property("p"), class("C").into());
        ontology.add_axiom(Axiom::subclass_of(class("B"), class("A")));
        ontology.add_axiom(Axiom::definition(class("D"), restriction.clone()));
        ontology.add_axiom(Axiom::subclass_of(class("D"), OwlClass::thing()));
        ontology.add_axiom(Axiom::DeclareClass(class("E")));

        assert_eq!(ontology.axioms().len(), 4);
        assert_eq!(ontology.classes().count(), 5);

        let records = ontology.class_records();
        let classes = records.iter().map(|r| r.class.clone()).collect::<Vec<_>>();
        assert_eq!(classes, vec![class("B"), class("A"), class("D"), class("E")]);
        assert_eq!(records[0].asserted_supers, vec![ClassExpression::from(class("A"))]);
        assert!(records[1].is_placeholder());
        assert_eq!(records[2].definitions, vec![restriction]);
        assert_eq!(records[2].asserted_supers.len(), 1);
    }

    #[test]
    fn test_equivalent_named_classes_define_each_other() {
        let mut ontology = Ontology::new(None);
        ontology.add_axiom(Axiom::equivalent_classes(vec![
            class("A").into(),
            class("B").into(),
        ]));
        let records = ontology.class_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].definitions, vec![ClassExpression::from(class("B"))]);
        assert_eq!(records[1].definitions, vec![ClassExpression::from(class("A"))]);
    }

    #[test]
    fn test_disjoint_union() {
        let mut ontology = Ontology::new(None);
        ontology.add_axiom(Axiom::DisjointUnion {
            class: class("Parent"),
            disjoint_classes: vec![class("Mother").into(), class("Father").into()],
        });
        let records = ontology.class_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].definitions.len(), 1);
        assert_eq!(
            records[1].asserted_supers,
            vec![ClassExpression::from(class("Parent"))]
        );
    }

    #[test]
    fn test_property_hierarchy_skips_inverses() {
        let mut ontology = Ontology::new(None);
        ontology.add_axiom(Axiom::sub_object_property_of(property("p"), property("q")));
        ontology.add_axiom(Axiom::SubObjectPropertyOf {
            sub_property: ObjectPropertyExpression::inverse(property("r")),
            super_property: property("q").into(),
        });
        ontology.add_axiom(Axiom::EquivalentObjectProperties(vec![
            property("q"),
            property("s"),
            property("t"),
        ]));
        assert_eq!(
            ontology.property_hierarchy(),
            vec![
                PropertyRelation::SubPropertyOf {
                    kind: PropertyKind::Object,
                    sub: property("p").into_inner(),
                    sup: property("q").into_inner(),
                },
                PropertyRelation::EquivalentProperties {
                    kind: PropertyKind::Object,
                    left: property("q").into_inner(),
                    right: property("s").into_inner(),
                },
                PropertyRelation::EquivalentProperties {
                    kind: PropertyKind::Object,
                    left: property("s").into_inner(),
                    right: property("t").into_inner(),
                },
            ]
        );
    }

    #[test]
    fn test_property_hierarchy_keeps_data_properties_apart() {
        let mut ontology = Ontology::new(None);
        let data = |local: &str| {
            DataProperty::new(NamedNode::new_unchecked(format!("http://example.org/{local}")))
        };
        ontology.add_axiom(Axiom::SubDataPropertyOf {
            sub_property: data("hasAgeInYears"),
            super_property: data("hasAge"),
        });
        ontology.add_axiom(Axiom::EquivalentDataProperties(vec![data("hasAge"), data("age")]));
        let relations = ontology.property_hierarchy();
        assert_eq!(relations.len(), 2);
        assert!(relations.iter().all(|r| r.kind() == PropertyKind::Data));
    }
}
