/*!
Sentence expansion. A sentence after predicate identification can carry any number of gold and of
predicted predicates. Downstream stages work on one predicate at a time, so every sentence is
expanded into one view per predicate, each view carrying exactly one gold argument label and one
predicted argument label per token.

The gold and predicted marker columns are walked in lockstep. Two counters drive the walk: the
1-based position of the current token, used to find the predicate for argument identification,
and the number of gold predicates consumed so far, which selects the gold argument column of the
view. Both are carried in an immutable `Cursor` threaded through a fold, so they can only move
together with the token they describe.
*/
use crate::argument::identify_arguments;
use crate::error::LookupError;
use crate::sentence::{
    ArgumentLabel, LabelColumn, PredicateMarker, PredicateSentence, View, ViewRow,
};
use crate::token::{Token, PLACEHOLDER};
use enum_iterator::Sequence;
use itertools::izip;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// Where the predicted argument labels of a predicate found by both the gold annotation and the
/// prediction come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize, Default)]
pub enum ArgumentSource {
    /// Recomputed with the head-dependency rule.
    #[default]
    Rule,
    /// Copied from the gold argument column of the predicate.
    Gold,
}

impl Display for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule => write!(f, "rule"),
            Self::Gold => write!(f, "gold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSourceParsingError(String);

impl Display for ArgumentSourceParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an ArgumentSource",
            self.0
        )
    }
}

impl std::error::Error for ArgumentSourceParsingError {}

impl FromStr for ArgumentSource {
    type Err = ArgumentSourceParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" => Ok(Self::Rule),
            "gold" => Ok(Self::Gold),
            _ => Err(ArgumentSourceParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// A gold predicate has no gold argument column. Substituting a default column would attribute
    /// it to the wrong predicate.
    #[error(
        "gold predicate at position {position} needs gold argument column {slot} but the sentence only has {available}"
    )]
    MissingGoldColumn {
        position: usize,
        slot: usize,
        available: usize,
    },
    #[error("marker columns do not match the sentence: {tokens} tokens, {gold} gold markers, {predicted} predicted markers")]
    MisalignedMarkers {
        tokens: usize,
        gold: usize,
        predicted: usize,
    },
    #[error("gold argument column {slot} has {found} labels for {expected} tokens")]
    MisalignedGoldColumn {
        slot: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// State of the lockstep walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    /// 1-based position of the current token.
    position: usize,
    /// Number of gold predicates consumed so far.
    gold_slot: usize,
}

impl Cursor {
    fn start() -> Self {
        Self {
            position: 1,
            gold_slot: 0,
        }
    }

    fn next(self, consumed_gold: bool) -> Self {
        Self {
            position: self.position + 1,
            gold_slot: self.gold_slot + usize::from(consumed_gold),
        }
    }
}

fn gold_column<'s>(
    sentence: &'s PredicateSentence,
    cursor: Cursor,
) -> Result<&'s LabelColumn, ExpansionError> {
    let column = sentence
        .gold_arguments
        .slot(cursor.gold_slot)
        .ok_or(ExpansionError::MissingGoldColumn {
            position: cursor.position,
            slot: cursor.gold_slot,
            available: sentence.gold_arguments.len(),
        })?;
    if column.len() != sentence.len() {
        return Err(ExpansionError::MisalignedGoldColumn {
            slot: cursor.gold_slot,
            expected: sentence.len(),
            found: column.len(),
        });
    }
    Ok(column)
}

/// Runs the argument identifier for the predicate at the cursor's position. A predicate on an
/// empty node has no integer index to match heads against and gets no arguments.
fn rule_arguments(
    tokens: &[Token],
    cursor: Cursor,
) -> Result<Vec<ArgumentLabel>, ExpansionError> {
    let predicate = &tokens[cursor.position - 1];
    match predicate.word_id() {
        Some(id) => Ok(identify_arguments(tokens, id)?),
        None => {
            warn!(
                "predicate at position {} has the non-integer index {}; no argument identified",
                cursor.position, predicate.index
            );
            Ok(vec![ArgumentLabel::Outside; tokens.len()])
        }
    }
}

fn gold_arguments(column: &LabelColumn) -> Vec<ArgumentLabel> {
    column.iter().map(ArgumentLabel::identification_of).collect()
}

fn build_view<'a, G>(
    sentence: &PredicateSentence,
    gold: G,
    predicted: Vec<ArgumentLabel>,
) -> View
where
    G: IntoIterator<Item = &'a str>,
{
    let rows = izip!(
        sentence.tokens.iter(),
        sentence.gold.iter(),
        sentence.predicted.iter(),
        gold,
        predicted
    )
    .map(
        |(token, gold_predicate, predicted_predicate, gold_argument, predicted_argument)| ViewRow {
            token: token.clone(),
            gold_predicate: *gold_predicate,
            predicted_predicate: *predicted_predicate,
            gold_argument: String::from(gold_argument),
            predicted_argument,
        },
    )
    .collect();
    View { rows }
}

fn outside_labels(len: usize) -> impl Iterator<Item = &'static str> {
    std::iter::repeat(PLACEHOLDER).take(len)
}

/// Expands one sentence into its single-predicate views.
///
/// * A sentence without gold and without predicted predicates gives exactly one view where every
///   label is `_`.
/// * `(PRED, _)`: the gold predicate was missed; its view keeps the gold argument column and has
///   no predicted argument.
/// * `(_, PRED)`: the predicted predicate is not in the gold annotation; its view has no gold
///   argument and rule-identified predicted arguments.
/// * `(PRED, PRED)`: the view keeps the gold argument column and takes its predicted arguments
///   from `source`.
///
/// Every view has the tokens of `sentence`, in the same order.
pub fn expand(
    sentence: &PredicateSentence,
    source: ArgumentSource,
) -> Result<Vec<View>, ExpansionError> {
    let len = sentence.len();
    if sentence.gold.len() != len || sentence.predicted.len() != len {
        return Err(ExpansionError::MisalignedMarkers {
            tokens: len,
            gold: sentence.gold.len(),
            predicted: sentence.predicted.len(),
        });
    }
    if !sentence.has_predicates() {
        let view = build_view(sentence, outside_labels(len), vec![ArgumentLabel::Outside; len]);
        return Ok(vec![view]);
    }

    use PredicateMarker::{Outside, Predicate};
    let (views, _) = izip!(sentence.gold.iter(), sentence.predicted.iter()).try_fold(
        (Vec::new(), Cursor::start()),
        |(mut views, cursor), (gold, predicted)| {
            let consumed_gold = match (gold, predicted) {
                (Outside, Outside) => false,
                (Predicate, Outside) => {
                    let column = gold_column(sentence, cursor)?;
                    views.push(build_view(
                        sentence,
                        column.iter(),
                        vec![ArgumentLabel::Outside; len],
                    ));
                    true
                }
                (Outside, Predicate) => {
                    let predicted = rule_arguments(&sentence.tokens, cursor)?;
                    views.push(build_view(sentence, outside_labels(len), predicted));
                    false
                }
                (Predicate, Predicate) => {
                    let column = gold_column(sentence, cursor)?;
                    let predicted = match source {
                        ArgumentSource::Rule => rule_arguments(&sentence.tokens, cursor)?,
                        ArgumentSource::Gold => gold_arguments(column),
                    };
                    views.push(build_view(sentence, column.iter(), predicted));
                    true
                }
            };
            Ok::<_, ExpansionError>((views, cursor.next(consumed_gold)))
        },
    )?;
    debug!("expanded a sentence of {} tokens into {} views", len, views.len());
    Ok(views)
}

/// Expands every sentence, keeping sentence order and, within a sentence, token order.
pub fn expand_all(
    sentences: &[PredicateSentence],
    source: ArgumentSource,
) -> Result<Vec<Vec<View>>, ExpansionError> {
    let expanded = sentences
        .iter()
        .map(|s| expand(s, source))
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        "expanded {} sentences into {} views ({} arguments)",
        sentences.len(),
        expanded.iter().map(Vec::len).sum::<usize>(),
        source
    );
    Ok(expanded)
}
