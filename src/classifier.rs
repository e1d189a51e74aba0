/*!
Argument classification. The features of a `FeatureRow` are categorical; they are one-hot encoded
as `name=value` indicator features by a `FeatureVocabulary` and fed to a linear multi-class model.

`Perceptron` is an averaged multi-class perceptron. Training is deterministic: the examples are
visited in order for a fixed number of epochs and the labels are sorted, so that two runs on the
same data give the same model.
*/
use crate::features::FeatureRow;
use crate::sentence::{ArgumentLabel, View};
use ahash::AHashMap;
use log::{debug, info};
use ndarray::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;

/// Number of passes over the training data used by `Perceptron::default`.
pub const DEFAULT_EPOCHS: usize = 10;

const BIAS_FEATURE: &str = "bias";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    #[error("the classifier must be fitted before predicting")]
    NotFitted,
    #[error("cannot fit a classifier without training examples")]
    EmptyTrainingSet,
    #[error("{found} predictions for {expected} identified arguments")]
    PredictionCount { expected: usize, found: usize },
}

/// A multi-class classifier over feature rows.
pub trait Classifier {
    /// Learns from `rows`, using their `label` field as target.
    fn fit(&mut self, rows: &[FeatureRow]) -> Result<(), ClassifierError>;
    /// Predicts one label per row, in order. The `label` field of `rows` is ignored.
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<String>, ClassifierError>;
}

/// Maps `name=value` indicator features to column indices. Index 0 is a bias feature active for
/// every row.
#[derive(Debug, Clone, Default)]
pub struct FeatureVocabulary {
    index: AHashMap<String, usize>,
}

fn indicator(name: &str, value: &str) -> String {
    format!("{}={}", name, value)
}

impl FeatureVocabulary {
    /// Collects every feature seen in `rows`. Features are numbered in lexicographic order.
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let names: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.features())
            .map(|(name, value)| indicator(name, &value))
            .collect();
        let index = std::iter::once(String::from(BIAS_FEATURE))
            .chain(names)
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        Self { index }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, feature: &str) -> Option<usize> {
        self.index.get(feature).copied()
    }

    /// Indices of the active features of `row`. Features absent from the vocabulary are dropped.
    pub fn transform(&self, row: &FeatureRow) -> Vec<usize> {
        self.get(BIAS_FEATURE)
            .into_iter()
            .chain(
                row.features()
                    .iter()
                    .filter_map(|(name, value)| self.get(&indicator(name, value))),
            )
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Model {
    labels: Vec<String>,
    vocabulary: FeatureVocabulary,
    /// One row per label, one column per feature.
    weights: Array2<f32>,
}

impl Model {
    fn scores(&self, active: &[usize]) -> Array1<f32> {
        scores(&self.weights, active)
    }

    fn best_label(&self, active: &[usize]) -> &str {
        &self.labels[argmax(&self.scores(active))]
    }
}

fn scores(weights: &Array2<f32>, active: &[usize]) -> Array1<f32> {
    active
        .iter()
        .fold(Array1::zeros(weights.nrows()), |acc, &f| {
            acc + &weights.column(f)
        })
}

/// Index of the highest score, the first one on ties.
fn argmax(scores: &Array1<f32>) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_score), (i, &s)| {
            if s > best_score {
                (i, s)
            } else {
                (best, best_score)
            }
        })
        .0
}

/// Averaged multi-class perceptron.
#[derive(Debug, Clone)]
pub struct Perceptron {
    epochs: usize,
    model: Option<Model>,
}

impl Default for Perceptron {
    fn default() -> Self {
        Self::new(DEFAULT_EPOCHS)
    }
}

impl Perceptron {
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            model: None,
        }
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Labels known to the fitted model, in score order.
    pub fn labels(&self) -> Option<&[String]> {
        self.model.as_ref().map(|m| m.labels.as_slice())
    }
}

impl Classifier for Perceptron {
    fn fit(&mut self, rows: &[FeatureRow]) -> Result<(), ClassifierError> {
        if rows.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let labels: Vec<String> = rows
            .iter()
            .map(|r| r.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let label_index: AHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let vocabulary = FeatureVocabulary::fit(rows);
        let examples: Vec<(Vec<usize>, usize)> = rows
            .iter()
            .map(|r| (vocabulary.transform(r), label_index[r.label.as_str()]))
            .collect();

        let shape = (labels.len(), vocabulary.len());
        let mut weights = Array2::<f32>::zeros(shape);
        // Updates weighted by the step at which they happened; averaging is `w - u / c`.
        let mut timed = Array2::<f32>::zeros(shape);
        let mut step = 1.0_f32;
        for epoch in 0..self.epochs {
            let mut mistakes = 0;
            for (active, gold) in examples.iter() {
                let predicted = argmax(&scores(&weights, active));
                if predicted != *gold {
                    mistakes += 1;
                    for &f in active {
                        weights[[*gold, f]] += 1.0;
                        weights[[predicted, f]] -= 1.0;
                        timed[[*gold, f]] += step;
                        timed[[predicted, f]] -= step;
                    }
                }
                step += 1.0;
            }
            debug!("epoch {}: {} mistakes on {} examples", epoch + 1, mistakes, rows.len());
        }
        let averaged = weights - timed / step;
        info!(
            "fitted a perceptron with {} labels and {} features",
            labels.len(),
            vocabulary.len()
        );
        self.model = Some(Model {
            labels,
            vocabulary,
            weights: averaged,
        });
        Ok(())
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<String>, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotFitted)?;
        Ok(rows
            .iter()
            .map(|row| String::from(model.best_label(&model.vocabulary.transform(row))))
            .collect())
    }
}

/// Replaces the `ARG` labels of `views`, in order, with `predictions`. Only views with a `V` row
/// count, as feature extraction skips the others.
pub fn apply_predictions(views: &mut [View], predictions: &[String]) -> Result<(), ClassifierError> {
    let expected = views
        .iter()
        .filter(|v| v.predicate().is_some())
        .flat_map(|v| v.rows.iter())
        .filter(|r| r.predicted_argument == ArgumentLabel::Argument)
        .count();
    if expected != predictions.len() {
        return Err(ClassifierError::PredictionCount {
            expected,
            found: predictions.len(),
        });
    }
    let rows = views
        .iter_mut()
        .filter(|v| v.predicate().is_some())
        .flat_map(|v| v.rows.iter_mut())
        .filter(|r| r.predicted_argument == ArgumentLabel::Argument);
    for (row, prediction) in rows.zip(predictions) {
        row.predicted_argument = ArgumentLabel::from(prediction.as_str());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Position, Voice};
    use crate::sentence::{PredicateMarker, ViewRow};
    use crate::token::tests::the_cat_sleeps;

    fn row(lemma: &str, deprel: &str, position: Position, label: &str) -> FeatureRow {
        FeatureRow {
            lemma: String::from(lemma),
            arg_pos: String::from("NOUN"),
            head_word: String::from("kicked"),
            deprel: String::from(deprel),
            pred_lemma: String::from("kick"),
            pred_pos: String::from("VERB"),
            position,
            voice: Voice::Active,
            label: String::from(label),
        }
    }

    fn training_rows() -> Vec<FeatureRow> {
        vec![
            row("he", "nsubj", Position::Before, "ARG0"),
            row("ball", "obj", Position::After, "ARG1"),
        ]
    }

    #[test]
    fn test_vocabulary_is_sorted_with_bias_first() {
        let vocabulary = FeatureVocabulary::fit(&training_rows());
        assert_eq!(vocabulary.get("bias"), Some(0));
        assert_eq!(vocabulary.get("arg_pos=NOUN"), Some(1));
        assert!(vocabulary.get("lemma=she").is_none());
        // bias + 2 lemmas + 1 arg_pos + 1 head_word + 2 deprels + 1 pred_lemma + 1 pred_pos
        // + 2 positions + 1 voice
        assert_eq!(vocabulary.len(), 12);
    }

    #[test]
    fn test_unseen_features_are_ignored() {
        let vocabulary = FeatureVocabulary::fit(&training_rows());
        let unseen = row("she", "iobj", Position::Before, "ARG2");
        let active = vocabulary.transform(&unseen);
        // bias, arg_pos, head_word, pred_lemma, pred_pos, position, voice
        assert_eq!(active.len(), 7);
    }

    #[test]
    fn test_perceptron_separates_training_data() {
        let mut classifier = Perceptron::new(5);
        classifier.fit(&training_rows()).unwrap();
        assert_eq!(
            classifier.labels().unwrap(),
            &[String::from("ARG0"), String::from("ARG1")]
        );
        let predictions = classifier.predict(&training_rows()).unwrap();
        assert_eq!(predictions, vec!["ARG0", "ARG1"]);
        let unseen = vec![row("she", "nsubj", Position::Before, "_")];
        assert_eq!(classifier.predict(&unseen).unwrap(), vec!["ARG0"]);
    }

    #[test]
    fn test_training_is_deterministic() {
        let mut rows = training_rows();
        rows.push(row("it", "obj", Position::After, "ARG1"));
        rows.push(row("they", "nsubj", Position::Before, "ARG0"));
        let mut first = Perceptron::default();
        let mut second = Perceptron::default();
        first.fit(&rows).unwrap();
        second.fit(&rows).unwrap();
        assert_eq!(first.predict(&rows).unwrap(), second.predict(&rows).unwrap());
    }

    #[test]
    fn test_ties_go_to_the_first_label() {
        assert_eq!(argmax(&array![0.5, 1.0, 1.0]), 1);
        assert_eq!(argmax(&array![0.0, 0.0]), 0);
    }

    #[test]
    fn test_predict_before_fit() {
        assert_eq!(
            Perceptron::default().predict(&training_rows()),
            Err(ClassifierError::NotFitted)
        );
        assert_eq!(
            Perceptron::default().fit(&[]),
            Err(ClassifierError::EmptyTrainingSet)
        );
    }

    fn view() -> View {
        let labels = [
            ArgumentLabel::Outside,
            ArgumentLabel::Argument,
            ArgumentLabel::Predicate,
        ];
        let rows = the_cat_sleeps()
            .into_iter()
            .zip(labels)
            .map(|(token, label)| ViewRow {
                token,
                gold_predicate: PredicateMarker::Outside,
                predicted_predicate: PredicateMarker::Outside,
                gold_argument: String::from("_"),
                predicted_argument: label,
            })
            .collect();
        View { rows }
    }

    #[test]
    fn test_apply_predictions_in_order() {
        let mut views = vec![view(), view()];
        apply_predictions(&mut views, &[String::from("ARG0"), String::from("ARG1")]).unwrap();
        assert_eq!(
            views[0].rows[1].predicted_argument,
            ArgumentLabel::Role(String::from("ARG0"))
        );
        assert_eq!(
            views[1].rows[1].predicted_argument,
            ArgumentLabel::Role(String::from("ARG1"))
        );
        assert_eq!(views[1].rows[2].predicted_argument, ArgumentLabel::Predicate);
    }

    #[test]
    fn test_apply_predictions_count_mismatch() {
        let mut views = vec![view()];
        assert_eq!(
            apply_predictions(&mut views, &[]),
            Err(ClassifierError::PredictionCount {
                expected: 1,
                found: 0
            })
        );
    }
}
