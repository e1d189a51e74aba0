/*!
Typed stage records. Each stage of the pipeline reads and writes sentences of a fixed layout:

* treebank: 10 core columns, the predicate sense, one gold argument column per gold predicate;
* predicate identification: 10 core columns, gold marker, predicted marker, the gold argument
  columns;
* view: 10 core columns, gold marker, predicted marker, the gold argument label of the view's
  predicate, the predicted argument label.

The variable number of gold argument columns is kept as an explicit list of columns
(`GoldArguments`) instead of positional offsets into a row.
*/
use crate::error::FormatError;
use crate::reader::{RawSentence, Record};
use crate::token::{Token, CORE_COLUMNS, PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Column of the predicate sense in a treebank record, and of the gold marker afterwards.
pub const GOLD_PREDICATE_COLUMN: usize = CORE_COLUMNS;
/// Column of the predicted predicate marker.
pub const PREDICTED_PREDICATE_COLUMN: usize = CORE_COLUMNS + 1;
/// Number of columns of a serialized view row.
pub const VIEW_COLUMNS: usize = CORE_COLUMNS + 4;

const PREDICATE_LABEL: &str = "PRED";
const VERB_LABEL: &str = "V";
const ARGUMENT_LABEL: &str = "ARG";

/// Per token, per predicate identification pass: is this token a predicate?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateMarker {
    Predicate,
    Outside,
}

impl PredicateMarker {
    pub fn is_predicate(&self) -> bool {
        matches!(self, Self::Predicate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Predicate => PREDICATE_LABEL,
            Self::Outside => PLACEHOLDER,
        }
    }
}

impl Display for PredicateMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PredicateMarker {
    type Err = FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PREDICATE_LABEL => Ok(Self::Predicate),
            PLACEHOLDER => Ok(Self::Outside),
            other => Err(FormatError::InvalidMarker(String::from(other))),
        }
    }
}

/// Argument label of a token with respect to one predicate. The identification stage only
/// produces `V`, `ARG` and `_`; `Role` holds the labels assigned by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgumentLabel {
    Outside,
    Predicate,
    Argument,
    Role(String),
}

impl ArgumentLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Outside => PLACEHOLDER,
            Self::Predicate => VERB_LABEL,
            Self::Argument => ARGUMENT_LABEL,
            Self::Role(role) => role.as_str(),
        }
    }

    /// Collapses a gold role label (`ARG0`, `ARGM-TMP`, ...) into the identification labels.
    pub fn identification_of(gold: &str) -> Self {
        match gold {
            PLACEHOLDER => Self::Outside,
            VERB_LABEL => Self::Predicate,
            _ => Self::Argument,
        }
    }
}

impl From<&str> for ArgumentLabel {
    fn from(value: &str) -> Self {
        match value {
            PLACEHOLDER => Self::Outside,
            VERB_LABEL => Self::Predicate,
            ARGUMENT_LABEL => Self::Argument,
            role => Self::Role(String::from(role)),
        }
    }
}

impl Display for ArgumentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One label per token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LabelColumn(Vec<String>);

impl LabelColumn {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// The gold argument columns of a sentence: slot `i` holds the argument labels of the `i`-th gold
/// predicate, in token order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GoldArguments {
    columns: Vec<LabelColumn>,
}

impl GoldArguments {
    pub fn new(columns: Vec<LabelColumn>) -> Self {
        Self { columns }
    }

    /// Transposes the trailing fields of `records`, starting at `offset`, into columns.
    fn from_records(records: &[Record], offset: usize, width: usize) -> Self {
        let columns = (offset..width)
            .map(|c| LabelColumn::new(records.iter().map(|r| r[c].clone()).collect()))
            .collect();
        Self { columns }
    }

    pub fn slot(&self, i: usize) -> Option<&LabelColumn> {
        self.columns.get(i)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn write_row(&self, row: usize, record: &mut Vec<String>) {
        for column in self.columns.iter() {
            record.push(String::from(column.get(row).unwrap_or(PLACEHOLDER)));
        }
    }
}

/// Checks that every record has the width of the first one and at least `min` columns.
fn check_rectangular(sentence: &[Record], min: usize) -> Result<usize, FormatError> {
    let width = sentence.first().map_or(min, Vec::len);
    if width < min {
        return Err(FormatError::TooFewColumns {
            expected: min,
            found: width,
        }
        .in_row(1));
    }
    for (i, record) in sentence.iter().enumerate() {
        if record.len() != width {
            return Err(FormatError::RaggedSentence {
                expected: width,
                found: record.len(),
            }
            .in_row(i + 1));
        }
    }
    Ok(width)
}

fn parse_tokens(sentence: &[Record]) -> Result<Vec<Token>, FormatError> {
    sentence
        .iter()
        .enumerate()
        .map(|(i, record)| Token::from_fields(record).map_err(|e| e.in_row(i + 1)))
        .collect()
}

fn parse_markers(sentence: &[Record], column: usize) -> Result<Vec<PredicateMarker>, FormatError> {
    sentence
        .iter()
        .enumerate()
        .map(|(i, record)| record[column].parse().map_err(|e: FormatError| e.in_row(i + 1)))
        .collect()
}

/// Serialization of a stage record into rows of string fields.
pub trait ToRecords {
    fn to_records(&self) -> Vec<Record>;
}

/// A sentence as found in the treebank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreebankSentence {
    pub tokens: Vec<Token>,
    /// Predicate sense per token, `_` when the token is not a gold predicate.
    pub senses: Vec<String>,
    pub gold_arguments: GoldArguments,
}

impl TryFrom<RawSentence> for TreebankSentence {
    type Error = FormatError;
    fn try_from(sentence: RawSentence) -> Result<Self, Self::Error> {
        let width = check_rectangular(&sentence, CORE_COLUMNS + 1)?;
        Ok(Self {
            tokens: parse_tokens(&sentence)?,
            senses: sentence
                .iter()
                .map(|r| r[GOLD_PREDICATE_COLUMN].clone())
                .collect(),
            gold_arguments: GoldArguments::from_records(&sentence, CORE_COLUMNS + 1, width),
        })
    }
}

impl ToRecords for TreebankSentence {
    fn to_records(&self) -> Vec<Record> {
        self.tokens
            .iter()
            .zip(self.senses.iter())
            .enumerate()
            .map(|(i, (token, sense))| {
                let mut record = Vec::with_capacity(CORE_COLUMNS + 1 + self.gold_arguments.len());
                token.write_fields(&mut record);
                record.push(sense.clone());
                self.gold_arguments.write_row(i, &mut record);
                record
            })
            .collect()
    }
}

/// A sentence after predicate identification: gold and predicted predicates side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSentence {
    pub tokens: Vec<Token>,
    pub gold: Vec<PredicateMarker>,
    pub predicted: Vec<PredicateMarker>,
    pub gold_arguments: GoldArguments,
}

impl PredicateSentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_predicates(&self) -> bool {
        self.gold
            .iter()
            .chain(self.predicted.iter())
            .any(PredicateMarker::is_predicate)
    }
}

impl TryFrom<RawSentence> for PredicateSentence {
    type Error = FormatError;
    fn try_from(sentence: RawSentence) -> Result<Self, Self::Error> {
        let width = check_rectangular(&sentence, PREDICTED_PREDICATE_COLUMN + 2)?;
        Ok(Self {
            tokens: parse_tokens(&sentence)?,
            gold: parse_markers(&sentence, GOLD_PREDICATE_COLUMN)?,
            predicted: parse_markers(&sentence, PREDICTED_PREDICATE_COLUMN)?,
            gold_arguments: GoldArguments::from_records(
                &sentence,
                PREDICTED_PREDICATE_COLUMN + 1,
                width,
            ),
        })
    }
}

impl ToRecords for PredicateSentence {
    fn to_records(&self) -> Vec<Record> {
        self.tokens
            .iter()
            .zip(self.gold.iter().zip(self.predicted.iter()))
            .enumerate()
            .map(|(i, (token, (gold, predicted)))| {
                let mut record = Vec::with_capacity(CORE_COLUMNS + 2 + self.gold_arguments.len());
                token.write_fields(&mut record);
                record.push(gold.to_string());
                record.push(predicted.to_string());
                self.gold_arguments.write_row(i, &mut record);
                record
            })
            .collect()
    }
}

/// One row of a single-predicate view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub token: Token,
    pub gold_predicate: PredicateMarker,
    pub predicted_predicate: PredicateMarker,
    /// Gold argument label of this token for the view's predicate.
    pub gold_argument: String,
    /// Predicted argument label of this token for the view's predicate.
    pub predicted_argument: ArgumentLabel,
}

impl TryFrom<&Record> for ViewRow {
    type Error = FormatError;
    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        if record.len() != VIEW_COLUMNS {
            return Err(FormatError::WrongColumnCount {
                expected: VIEW_COLUMNS,
                found: record.len(),
            });
        }
        Ok(Self {
            token: Token::from_fields(record)?,
            gold_predicate: record[GOLD_PREDICATE_COLUMN].parse()?,
            predicted_predicate: record[PREDICTED_PREDICATE_COLUMN].parse()?,
            gold_argument: record[PREDICTED_PREDICATE_COLUMN + 1].clone(),
            predicted_argument: ArgumentLabel::from(
                record[PREDICTED_PREDICATE_COLUMN + 2].as_str(),
            ),
        })
    }
}

/// A single-predicate rendering of a sentence. It has exactly as many rows as the source
/// sentence has tokens, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub rows: Vec<ViewRow>,
}

impl View {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row labelled `V`, if any.
    pub fn predicate(&self) -> Option<&ViewRow> {
        self.rows
            .iter()
            .find(|row| row.predicted_argument == ArgumentLabel::Predicate)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.rows.iter().map(|row| &row.token)
    }
}

impl TryFrom<RawSentence> for View {
    type Error = FormatError;
    fn try_from(sentence: RawSentence) -> Result<Self, Self::Error> {
        let rows = sentence
            .iter()
            .enumerate()
            .map(|(i, record)| ViewRow::try_from(record).map_err(|e| e.in_row(i + 1)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }
}

impl ToRecords for View {
    fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Vec::with_capacity(VIEW_COLUMNS);
                row.token.write_fields(&mut record);
                record.push(row.gold_predicate.to_string());
                record.push(row.predicted_predicate.to_string());
                record.push(row.gold_argument.clone());
                record.push(row.predicted_argument.to_string());
                record
            })
            .collect()
    }
}
