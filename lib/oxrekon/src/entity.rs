//! OWL 2 entity types referenced by class expressions.

use oxrdf::{BlankNode, NamedNode, NamedNodeRef, Term};
use std::fmt;

macro_rules! iri_entity {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NamedNode);

        impl $name {
            #[inline]
            pub fn new(iri: NamedNode) -> Self {
                Self(iri)
            }

            /// Builds the entity from an IRI string, validating it.
            #[inline]
            pub fn new_from_iri(iri: impl Into<String>) -> Result<Self, oxiri::IriParseError> {
                Ok(Self(NamedNode::new(iri)?))
            }

            #[inline]
            pub fn iri(&self) -> &NamedNode {
                &self.0
            }

            #[inline]
            pub fn as_ref(&self) -> NamedNodeRef<'_> {
                self.0.as_ref()
            }

            #[inline]
            pub fn into_inner(self) -> NamedNode {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<NamedNode> for $name {
            fn from(node: NamedNode) -> Self {
                Self(node)
            }
        }

        impl From<NamedNodeRef<'_>> for $name {
            fn from(node: NamedNodeRef<'_>) -> Self {
                Self(node.into_owned())
            }
        }

        impl From<$name> for NamedNode {
            fn from(entity: $name) -> Self {
                entity.0
            }
        }

        impl From<$name> for Term {
            fn from(entity: $name) -> Self {
                entity.0.into()
            }
        }

        impl AsRef<NamedNode> for $name {
            fn as_ref(&self) -> &NamedNode {
                &self.0
            }
        }
    };
}

iri_entity!(
    /// An OWL class (`owl:Class`).
    ///
    /// Every class is a subclass of `owl:Thing`, the root of the computed hierarchy.
    OwlClass
);

iri_entity!(
    /// An OWL object property (`owl:ObjectProperty`).
    ObjectProperty
);

iri_entity!(
    /// An OWL data property (`owl:DatatypeProperty`).
    DataProperty
);

impl OwlClass {
    /// `owl:Thing`, the universal class.
    pub fn thing() -> Self {
        Self(crate::vocab::THING.into_owned())
    }

    /// `owl:Nothing`, the empty class.
    pub fn nothing() -> Self {
        Self(crate::vocab::NOTHING.into_owned())
    }

    /// Returns `true` for `owl:Thing` and `owl:Nothing`, which never get records of their own.
    pub fn is_builtin(&self) -> bool {
        self.0 == crate::vocab::THING || self.0 == crate::vocab::NOTHING
    }
}

/// An OWL individual (named or anonymous).
///
/// Only named individuals take part in structural matching: an anonymous
/// individual has no stable identity to put in the name registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Individual {
    Named(NamedNode),
    Anonymous(BlankNode),
}

impl Individual {
    #[inline]
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    #[inline]
    pub fn as_named(&self) -> Option<&NamedNode> {
        match self {
            Self::Named(n) => Some(n),
            Self::Anonymous(_) => None,
        }
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Anonymous(b) => b.fmt(f),
        }
    }
}

impl From<NamedNode> for Individual {
    fn from(node: NamedNode) -> Self {
        Self::Named(node)
    }
}

impl From<BlankNode> for Individual {
    fn from(node: BlankNode) -> Self {
        Self::Anonymous(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_conversions() {
        let iri = NamedNode::new_unchecked("http://example.org/Person");
        let class = OwlClass::new(iri.clone());
        assert_eq!(class.iri(), &iri);
        assert_eq!(class.to_string(), iri.to_string());
        assert_eq!(NamedNode::from(class), iri);
    }

    #[test]
    fn test_builtin_classes() {
        assert!(OwlClass::thing().is_builtin());
        assert!(OwlClass::nothing().is_builtin());
        assert!(!OwlClass::new_from_iri("http://example.org/A").unwrap().is_builtin());
    }

    #[test]
    fn test_invalid_iri_is_rejected() {
        assert!(ObjectProperty::new_from_iri("not an iri").is_err());
    }

    #[test]
    fn test_individual_kinds() {
        let named = Individual::from(NamedNode::new_unchecked("http://example.org/alice"));
        assert!(named.is_named());
        assert!(named.as_named().is_some());

        let anonymous = Individual::from(BlankNode::default());
        assert!(!anonymous.is_named());
        assert_eq!(anonymous.as_named(), None);
    }
}
