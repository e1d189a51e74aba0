/*!
Errors shared by the readers, the typed records and the file-level stages. Component specific
errors (`ExpansionError`, `ComputationError`, `ClassifierError`) live next to the component that
raises them and are folded into `SrlError` here.
*/
use crate::classifier::ClassifierError;
use crate::expander::ExpansionError;
use crate::metrics::ComputationError;
use crate::token::TokenId;
use thiserror::Error;

/// Top level error of the crate. Every variant is fatal for the file being processed: the
/// pipeline is a deterministic batch transformation and never retries.
#[derive(Debug, Error)]
pub enum SrlError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error while {context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Expansion(#[from] ExpansionError),
    #[error(transparent)]
    Computation(#[from] ComputationError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl SrlError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }
}

/// Malformed input: a line, a field or a whole sentence does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("line {line}: could not split the line into fields")]
    NoFields { line: usize },
    #[error("invalid token index `{0}`")]
    InvalidIndex(String),
    #[error("invalid head `{0}`")]
    InvalidHead(String),
    #[error("expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("expected exactly {expected} columns, found {found}")]
    WrongColumnCount { expected: usize, found: usize },
    #[error("ragged sentence: row has {found} columns but the first row has {expected}")]
    RaggedSentence { expected: usize, found: usize },
    #[error("unknown predicate marker `{0}`")]
    InvalidMarker(String),
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<FormatError>,
    },
}

impl FormatError {
    /// Attaches the 1-based row number of the offending token.
    pub(crate) fn in_row(self, row: usize) -> Self {
        Self::Row {
            row,
            source: Box::new(self),
        }
    }
}

/// A token id was requested that does not exist in the sentence. Returning any position in that
/// case would silently mislabel arguments, so the lookup fails instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no token with index {id} in a sentence of {length} tokens")]
pub struct LookupError {
    pub id: TokenId,
    pub length: usize,
}
