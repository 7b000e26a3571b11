//! Errors reported while setting up a covering problem.

use thiserror::Error;

/// Result type alias for problem construction.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A malformed input detected while building the tables of a solver.
///
/// Every variant is reported before the search takes its first step, and
/// an option that fails validation leaves the tables untouched. Item labels
/// are rendered with their [`Debug`](std::fmt::Debug) representation.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum Error {
    /// An item occurs twice in the primary list, twice in the secondary
    /// list, or once in each.
    #[error("item {label} is declared more than once")]
    DuplicateItem { label: String },

    /// An option refers to an item that was never declared.
    #[error("option {option} refers to unknown item {label}")]
    UnknownItem { option: usize, label: String },

    /// An option lists the same item more than once.
    #[error("option {option} contains item {label} more than once")]
    RepeatedItem { option: usize, label: String },

    /// An option is empty or contains only secondary items.
    #[error("option {option} contains no primary item")]
    NoPrimaryItem { option: usize },

    /// The multiplicity bounds are not aligned with the primary items.
    #[error("expected {expected} multiplicity bounds, one per primary item, but got {actual}")]
    BoundsLength { expected: usize, actual: usize },

    /// A primary item has a lower bound exceeding its upper bound.
    #[error("item {label} has minimum multiplicity {min} greater than its maximum {max}")]
    InvalidBounds { label: String, min: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = Error::UnknownItem {
            option: 3,
            label: "\"x\"".to_string(),
        };
        assert_eq!(err.to_string(), "option 3 refers to unknown item \"x\"");

        let err = Error::InvalidBounds {
            label: "'a'".to_string(),
            min: 2,
            max: 1,
        };
        assert_eq!(
            err.to_string(),
            "item 'a' has minimum multiplicity 2 greater than its maximum 1"
        );
    }
}
