//! Error types for classification.

use oxrdf::NamedNode;
use std::time::Duration;

/// Main error type of the crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RekonError {
    /// A class record was rejected at the boundary.
    #[error(transparent)]
    RejectedInput(#[from] InputError),

    /// The classification itself failed or was used incorrectly.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

/// Result type for classifier operations.
pub type RekonResult<T> = Result<T, RekonError>;

/// A class record that cannot be accepted by the classifier.
///
/// The error is localized to one entity: the other records are unaffected.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Rejected input for {entity} ({kind:?}): {message}")]
pub struct InputError {
    entity: NamedNode,
    kind: InputErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputErrorKind {
    /// The same class was registered twice.
    Duplicate,
    /// The record is for `owl:Thing` or `owl:Nothing`.
    ReservedName,
    /// An expression is nested deeper than the configured limit.
    TooDeep,
    /// A definition has the defined class among its own conjuncts.
    Cyclic,
}

impl InputError {
    pub fn new(entity: NamedNode, kind: InputErrorKind, message: impl Into<String>) -> Self {
        Self {
            entity,
            kind,
            message: message.into(),
        }
    }

    pub fn duplicate(entity: NamedNode) -> Self {
        Self::new(entity, InputErrorKind::Duplicate, "class is already registered")
    }

    pub fn reserved_name(entity: NamedNode) -> Self {
        Self::new(
            entity,
            InputErrorKind::ReservedName,
            "built-in classes cannot be defined",
        )
    }

    pub fn too_deep(entity: NamedNode, depth: usize, max_depth: usize) -> Self {
        Self::new(
            entity,
            InputErrorKind::TooDeep,
            format!("expression nesting depth {depth} exceeds the limit of {max_depth}"),
        )
    }

    pub fn cyclic(entity: NamedNode) -> Self {
        Self::new(
            entity,
            InputErrorKind::Cyclic,
            "the class is one of the conjuncts of its own definition",
        )
    }

    /// The rejected entity.
    pub fn entity(&self) -> &NamedNode {
        &self.entity
    }

    pub fn kind(&self) -> InputErrorKind {
        self.kind
    }
}

/// A failure of the classification run or a misuse of its results.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ClassificationError {
    kind: ClassificationErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationErrorKind {
    /// A query was issued before `classify` reached a stable hierarchy.
    NotClassified,
    /// The fixpoint loop did not stabilize within the configured number of passes.
    MaxPassesExceeded,
    /// The configured deadline elapsed.
    Timeout,
    /// The hierarchy failed its consistency check.
    Inconsistent,
}

impl ClassificationError {
    pub fn new(kind: ClassificationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_classified() -> Self {
        Self::new(
            ClassificationErrorKind::NotClassified,
            "the hierarchy is not stable, call classify first",
        )
    }

    pub fn max_passes_exceeded(passes: usize) -> Self {
        Self::new(
            ClassificationErrorKind::MaxPassesExceeded,
            format!("no fixpoint reached after {passes} passes"),
        )
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::new(
            ClassificationErrorKind::Timeout,
            format!("classification timeout exceeded ({timeout:?})"),
        )
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::new(ClassificationErrorKind::Inconsistent, message)
    }

    pub fn kind(&self) -> ClassificationErrorKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display_names_entity() {
        let entity = NamedNode::new_unchecked("http://example.org/A");
        let error = RekonError::from(InputError::duplicate(entity.clone()));
        assert!(error.to_string().contains("http://example.org/A"));
        match error {
            RekonError::RejectedInput(e) => {
                assert_eq!(e.kind(), InputErrorKind::Duplicate);
                assert_eq!(e.entity(), &entity);
            }
            RekonError::Classification(_) => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_classification_error_kind() {
        let error = ClassificationError::max_passes_exceeded(3);
        assert_eq!(error.kind(), ClassificationErrorKind::MaxPassesExceeded);
        assert!(error.to_string().contains('3'));
    }
}
