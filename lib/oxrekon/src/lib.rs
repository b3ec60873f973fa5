//! Incremental structural subsumption classifier for OWL 2 class hierarchies.
//!
//! This crate computes the class hierarchy of an ontology without a tableau
//! reasoner:
//! - class expressions are normalized into structural descriptions
//! - each named class is inserted into a hierarchy rooted at `owl:Thing` by a
//!   root-down subsumption crawl
//! - discovered subsumptions are fed back into a registry of names and the
//!   classes they affect are placed again until nothing changes
//!
//! The result is sound but intentionally incomplete for expressive constructs
//! like universal restrictions or maximum cardinalities.
//!
//! # Example
//! ```
//! use oxrdf::NamedNode;
//! use oxrekon::{
//!     Axiom, ClassExpression, Classifier, ObjectProperty, Ontology, OwlClass, Reasoner,
//! };
//!
//! let ex = |name: &str| NamedNode::new(format!("http://example.org/{name}"));
//! let vehicle = OwlClass::new(ex("Vehicle")?);
//! let car = OwlClass::new(ex("Car")?);
//! let wheel = OwlClass::new(ex("Wheel")?);
//! let has_part = ObjectProperty::new(ex("hasPart")?);
//!
//! let mut ontology = Ontology::new(None);
//! ontology.add_axiom(Axiom::DeclareClass(vehicle.clone()));
//! ontology.add_axiom(Axiom::definition(
//!     car.clone(),
//!     ClassExpression::intersection(vec![
//!         vehicle.clone().into(),
//!         ClassExpression::some_values_from(has_part, wheel.into()),
//!     ]),
//! ));
//!
//! let mut classifier = Classifier::new();
//! assert!(classifier.load_ontology(&ontology).is_empty());
//! classifier.classify()?;
//! assert_eq!(
//!     classifier.get_sub_classes(&vehicle.into(), true)?,
//!     vec![car]
//! );
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod axiom;
pub mod classifier;
mod descriptions;
mod entity;
mod error;
mod expression;
pub mod name;
mod ontology;
pub mod structure;
mod vocab;

pub use axiom::Axiom;
pub use classifier::{
    Classifier, ClassifierConfig, ClassifierState, ClassifierStats, Reasoner,
};
pub use descriptions::Descriptions;
pub use entity::{DataProperty, Individual, ObjectProperty, OwlClass};
pub use error::{
    ClassificationError, ClassificationErrorKind, InputError, InputErrorKind, RekonError,
    RekonResult,
};
pub use expression::{ClassExpression, DataRange, ObjectPropertyExpression};
pub use ontology::{ClassRecord, Ontology, PropertyKind, PropertyRelation};
