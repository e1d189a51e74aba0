/*!
Argument identification for a single predicate. Arguments are the direct syntactic dependents of
the predicate; dependents of dependents are never labelled, even when they are semantically
related to the predicate.
*/
use crate::error::LookupError;
use crate::sentence::ArgumentLabel;
use crate::token::{Token, TokenId};

/// Relations that never introduce an argument.
pub const EXCLUDED_RELATIONS: [&str; 4] = ["det", "punct", "mark", "parataxis"];

pub fn is_argument_relation(deprel: &str) -> bool {
    !EXCLUDED_RELATIONS.contains(&deprel)
}

/// Position of the token whose index is `id`.
pub fn position_of(tokens: &[Token], id: TokenId) -> Result<usize, LookupError> {
    tokens
        .iter()
        .position(|t| t.word_id() == Some(id))
        .ok_or(LookupError {
            id,
            length: tokens.len(),
        })
}

/// Labels the predicate `predicate` with `V` and its direct dependents with `ARG`. Every other
/// token is `_`. Fails when no token of the sentence has the index `predicate`.
pub fn identify_arguments(
    tokens: &[Token],
    predicate: TokenId,
) -> Result<Vec<ArgumentLabel>, LookupError> {
    let predicate_position = position_of(tokens, predicate)?;
    let labels = tokens
        .iter()
        .enumerate()
        .map(|(i, token)| {
            if i == predicate_position {
                ArgumentLabel::Predicate
            } else if token.head.token() == Some(predicate)
                && is_argument_relation(&token.deprel)
            {
                ArgumentLabel::Argument
            } else {
                ArgumentLabel::Outside
            }
        })
        .collect();
    Ok(labels)
}

/// Same as `identify_arguments`, with `None` standing for a sentence without any predicate: the
/// result is then a column of `_` and no token is marked `V`.
pub fn identify_arguments_for(
    tokens: &[Token],
    predicate: Option<TokenId>,
) -> Result<Vec<ArgumentLabel>, LookupError> {
    match predicate {
        Some(id) => identify_arguments(tokens, id),
        None => Ok(vec![ArgumentLabel::Outside; tokens.len()]),
    }
}
