/*!
Predicate identification. Predicates are either copied from the gold predicate senses or proposed
by a few syntactic rules over the part of speech and the dependency relation of each token.
*/
use crate::error::FormatError;
use crate::sentence::{PredicateMarker, PredicateSentence, TreebankSentence};
use crate::token::{Token, TokenId, PLACEHOLDER};
use enum_iterator::Sequence;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Relations under which a `VERB` is not a predicate (participial modifiers, prepositional and
/// subordinating uses).
const NON_PREDICATE_VERB_RELATIONS: [&str; 3] = ["amod", "case", "mark"];

/// Fine-grained tags of adjectives that can head a reduced clause.
const CLAUSAL_ADJECTIVE_TAGS: [&str; 2] = ["JJ", "JJR"];

/// How predicates are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize, Default)]
pub enum PredicateMethod {
    /// Tokens with a gold predicate sense.
    Gold,
    /// Syntactic rules.
    #[default]
    Rule,
}

impl Display for PredicateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gold => write!(f, "gold"),
            Self::Rule => write!(f, "rule"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateMethodParsingError(String);

impl Display for PredicateMethodParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a PredicateMethod",
            self.0
        )
    }
}

impl std::error::Error for PredicateMethodParsingError {}

impl FromStr for PredicateMethod {
    type Err = PredicateMethodParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gold" | "predgold" => Ok(Self::Gold),
            "rule" => Ok(Self::Rule),
            _ => Err(PredicateMethodParsingError(String::from(s))),
        }
    }
}

/// A sense marks a gold predicate when it is neither empty nor the placeholder.
pub fn is_gold_predicate(sense: &str) -> bool {
    !sense.is_empty() && sense != PLACEHOLDER
}

/// Applies the syntactic rules to a single token. Tokens without an integer index (empty nodes,
/// multiword ranges) are never predicates.
pub fn is_rule_predicate(token: &Token) -> bool {
    if token.word_id().is_none() {
        return false;
    }
    let deprel = token.deprel.as_str();
    if token.upos == "VERB" && !NON_PREDICATE_VERB_RELATIONS.contains(&deprel) {
        true
    } else if token.upos == "AUX" && !token.feats.is_finite_verb() {
        true
    } else {
        CLAUSAL_ADJECTIVE_TAGS.contains(&token.xpos.as_str())
            && (deprel.contains("cl") || deprel.ends_with("comp"))
    }
}

pub fn gold_predicates<S: AsRef<str>>(senses: &[S]) -> Vec<PredicateMarker> {
    senses
        .iter()
        .map(|sense| marker(is_gold_predicate(sense.as_ref())))
        .collect()
}

pub fn rule_predicates(tokens: &[Token]) -> Vec<PredicateMarker> {
    tokens.iter().map(|t| marker(is_rule_predicate(t))).collect()
}

fn marker(is_predicate: bool) -> PredicateMarker {
    if is_predicate {
        PredicateMarker::Predicate
    } else {
        PredicateMarker::Outside
    }
}

/// Returns the predicate marker column of a treebank sentence for the given method. A sentence
/// without any qualifying token yields an all-`_` column.
pub fn identify_predicates(
    sentence: &TreebankSentence,
    method: PredicateMethod,
) -> Vec<PredicateMarker> {
    match method {
        PredicateMethod::Gold => gold_predicates(&sentence.senses),
        PredicateMethod::Rule => rule_predicates(&sentence.tokens),
    }
}

/// Integer ids of the tokens flagged as predicates, in sentence order.
pub fn predicate_ids(tokens: &[Token], markers: &[PredicateMarker]) -> Vec<TokenId> {
    tokens
        .iter()
        .zip(markers)
        .filter(|(_, m)| m.is_predicate())
        .filter_map(|(t, _)| t.word_id())
        .collect()
}

/// Builds the predicate identification record of a sentence: the gold predicate senses are
/// collapsed into a marker column and the predicted column is computed with `method`.
pub fn identify_sentence(
    sentence: TreebankSentence,
    method: PredicateMethod,
) -> Result<PredicateSentence, FormatError> {
    if sentence.senses.len() != sentence.tokens.len() {
        return Err(FormatError::WrongColumnCount {
            expected: sentence.tokens.len(),
            found: sentence.senses.len(),
        });
    }
    let predicted = identify_predicates(&sentence, method);
    let gold = gold_predicates(&sentence.senses);
    debug!(
        "{} gold and {} predicted predicates in a sentence of {} tokens",
        gold.iter().filter(|m| m.is_predicate()).count(),
        predicted.iter().filter(|m| m.is_predicate()).count(),
        sentence.tokens.len()
    );
    Ok(PredicateSentence {
        tokens: sentence.tokens,
        gold,
        predicted,
        gold_arguments: sentence.gold_arguments,
    })
}
