//! Selector error types.
//!
//! None of these escape `parse` or `evaluate`: they are logged, recorded as
//! diagnostics, and the selector degrades to fewer matches.

use thiserror::Error;

use crate::item::ItemConditionError;

/// A recovered selector failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The string does not have the `@symbol[args]` shape.
    ///
    /// Recovered by falling back to `@e` with no constraints.
    #[error("malformed selector {input:?}: {reason}")]
    Syntax { input: String, reason: String },

    /// A single argument could not be interpreted and was skipped.
    #[error("skipped selector argument {argument:?}: {reason}")]
    Argument { argument: String, reason: String },

    /// A host lookup failed during evaluation.
    #[error("could not resolve {what}: {reason}")]
    Resolution { what: String, reason: String },
}

impl SelectorError {
    pub(crate) fn syntax(input: &str, reason: impl Into<String>) -> Self {
        Self::Syntax {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn argument(argument: &str, reason: impl Into<String>) -> Self {
        Self::Argument {
            argument: argument.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn resolution(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a `hasitem` sub-parser failure for the given argument.
    pub(crate) fn item_condition(argument: &str, error: &ItemConditionError) -> Self {
        Self::argument(argument, error.to_string())
    }
}

/// Result type for fallible selector operations.
pub type SelectorResult<T> = Result<T, SelectorError>;
