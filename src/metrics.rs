/**
This module computes the metrics (precision, recall, f-score, support) of a ground-truth label
sequence and a predicted label sequence, label by label, and the confusion matrix between them.
Every position of the two sequences is one sample.
*/
use crate::reporter::{Average, ClassMetricsInner, OverallAverage, Reporter};
use ahash::AHashMap;
use core::fmt;
use itertools::multizip;
use ndarray::{prelude::*, Array, Data, ScalarOperand, Zip};
use ndarray_stats::{errors::MultiInputError, SummaryStatisticsExt};
use num::{Float, Num, NumCast};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Debug, Display},
    str::FromStr,
};
use thiserror::Error;

trait ItemArrayExt<Output> {
    /// Returns the element out of the Array. Can return an error if the array is empty of if the
    /// array has a length superior to 1.
    fn item(&self) -> Result<Output, ComputationError>;
}

impl<F: Clone, T: Data<Elem = F>> ItemArrayExt<F> for ArrayBase<T, Dim<[usize; 1]>> {
    fn item(&self) -> Result<F, ComputationError> {
        match self.len() {
            1 => Ok(self[0].clone()),
            n => Err(ComputationError::EmptyOrNotUnique(n)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// How do we handle cases with a division by zero? Do we replace the result with 1, return an
/// error, or replace the division result with 0? `ReplaceBy0` is the usual choice: a label that is
/// never predicted has a precision of 0.
pub enum DivByZeroStrat {
    /// Returns 1 when the denominator is 0
    ReplaceBy1,
    /// Returns an error when a denominator is 0
    ReturnError,
    /// Returns 0 when the denominator is 0
    #[default]
    ReplaceBy0,
}

impl Display for DivByZeroStrat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplaceBy1 => write!(f, "replaceby1"),
            Self::ReturnError => write!(f, "returnerror"),
            Self::ReplaceBy0 => write!(f, "replaceby0"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse the {0} into a a `DivisionByZeroStrategy`")]
pub struct ParsingDivisionByZeroStrategyError(String);

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "replaceby1" | "replacebyone" | "1" => Ok(DivByZeroStrat::ReplaceBy1),
            "replaceby0" | "replacebyzero" | "0" => Ok(DivByZeroStrat::ReplaceBy0),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

/// Internal extension trait for Num's Float trait
pub trait FloatExt: Float + Send + Sync + Clone + ScalarOperand + Debug {}

impl<T: Float + Send + Sync + Clone + Copy + ScalarOperand + Debug> FloatExt for T {}

#[derive(Debug, Clone, PartialEq, Error)]
/// Enum error encompassing many type of failures that could happen when computing the precison,
/// recall, f-score, support and confusion matrix.
pub enum ComputationError {
    #[error("Beta value is not positive")]
    BetaNotPositive,
    #[error("Inconsistent length between two lists. `y_true` is length {0}, `y_pred` is length {1}")]
    InconsistentLength(usize, usize),
    #[error("Found an empty input in {0}")]
    EmptyInput(String),
    #[error("Encountered division by zero")]
    DivisionByZero,
    #[error(transparent)]
    InputError(#[from] MultiInputError),
    #[error("Found an empty array in {0}")]
    EmptyArray(String),
    #[error("This array contains more than one element or is empty. It has length: {0} Cannot call `item` on it")]
    EmptyOrNotUnique(usize),
}

fn prf_divide<I: Debug + Num + Clone + Copy, D: Dimension>(
    numerator: ArcArray<I, D>,
    denominator: ArrayViewMut<I, D>,
    zero_division: DivByZeroStrat,
) -> Result<ArcArray<I, D>, ComputationError> {
    let (result, zero_mask) = prf_divide_results_and_mask(numerator, denominator);
    let found_zero = zero_mask.iter().any(|m| *m == I::zero());
    match zero_division {
        DivByZeroStrat::ReturnError if found_zero => Err(ComputationError::DivisionByZero),
        DivByZeroStrat::ReplaceBy1 if found_zero => {
            let ones_at_zero = zero_mask.mapv(|m| I::one() - m);
            Ok((result * &zero_mask + ones_at_zero).into_shared())
        }
        DivByZeroStrat::ReplaceBy0 => Ok((result * &zero_mask).into_shared()),
        _ => Ok(result),
    }
}

/// Checks that `y_true` and `y_pred` have the same length and are not empty.
fn check_consistent_length<T>(y_true: &[T], y_pred: &[T]) -> Result<(), ComputationError> {
    if y_true.len() != y_pred.len() {
        return Err(ComputationError::InconsistentLength(
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(ComputationError::EmptyInput(String::from("y_true")));
    }
    Ok(())
}

/// Labels found in either sequence, sorted.
pub fn unique_labels<S: AsRef<str>>(y_true: &[S], y_pred: &[S]) -> Vec<String> {
    let labels: BTreeSet<&str> = y_true
        .iter()
        .chain(y_pred.iter())
        .map(AsRef::as_ref)
        .collect();
    labels.into_iter().map(String::from).collect()
}

/// predicted sum, true positive sum and true sum
type ActualTPCorrect<T> = (Array1<T>, Array1<T>, Array1<T>);

fn extract_tp_actual_correct<S: AsRef<str>>(
    y_true: &[S],
    y_pred: &[S],
    labels: &[String],
) -> ActualTPCorrect<usize> {
    let index: AHashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let mut pred_sum = Array1::<usize>::zeros(labels.len());
    let mut tp_sum = Array1::<usize>::zeros(labels.len());
    let mut true_sum = Array1::<usize>::zeros(labels.len());
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        let (t, p) = (t.as_ref(), p.as_ref());
        if let Some(&i) = index.get(p) {
            pred_sum[i] += 1;
            if t == p {
                tp_sum[i] += 1;
            }
        }
        if let Some(&i) = index.get(t) {
            true_sum[i] += 1;
        }
    }
    (pred_sum, tp_sum, true_sum)
}

/// Type alias for representing the output of the `precision_recall_fscore_support`. Each arrays
/// contain a vector of f32. The first array contains the precision, the second the recall, the
/// third the f-score and the last one the support.
pub type PrecisionRecallFScoreTrueSum = (
    Array<f32, Dim<[usize; 1]>>,
    Array<f32, Dim<[usize; 1]>>,
    Array<f32, Dim<[usize; 1]>>,
    Array<usize, Dim<[usize; 1]>>,
);

/// Computes the precision, recall, fscore and support of every label found in `y_true` or
/// `y_pred`, in sorted label order, or their average.
///
/// * `y_true`: True labels
/// * `y_pred`: Predicted labels
/// * `beta`: Value of the `beta` parameter of the fscore. `beta=1` for F1 and `beta=0.5` for F0.5.
/// * `average`: What type of average to use.
/// * `zero_division`: What to do in case of division by zero.
pub fn precision_recall_fscore_support<F: FloatExt, S: AsRef<str>>(
    y_true: &[S],
    y_pred: &[S],
    beta: F,
    average: Average,
    zero_division: DivByZeroStrat,
) -> Result<PrecisionRecallFScoreTrueSum, ComputationError> {
    check_consistent_length(y_true, y_pred)?;
    let labels = unique_labels(y_true, y_pred);
    let counts = extract_tp_actual_correct(y_true, y_pred, &labels);
    precision_recall_fscore_support_inner(counts, beta, average, zero_division)
}

fn precision_recall_fscore_support_inner<F: FloatExt>(
    counts: ActualTPCorrect<usize>,
    beta: F,
    average: Average,
    zero_division: DivByZeroStrat,
) -> Result<PrecisionRecallFScoreTrueSum, ComputationError> {
    if beta.is_sign_negative() {
        return Err(ComputationError::BetaNotPositive);
    };
    let (mut pred_sum, mut tp_sum, mut true_sum) = counts;
    let beta2 = beta.powi(2);
    if matches!(average, Average::Micro) {
        tp_sum = array![tp_sum.sum()];
        pred_sum = array![pred_sum.sum()];
        true_sum = array![true_sum.sum()];
    };
    let arc_tp_sum = tp_sum.mapv(|x| x as f32).to_shared();
    let precision = prf_divide(
        arc_tp_sum.clone(),
        pred_sum.mapv(|x| x as f32).view_mut(),
        zero_division,
    )?;
    let recall = prf_divide(
        arc_tp_sum,
        true_sum.mapv(|x| x as f32).view_mut(),
        zero_division,
    )?;
    let f_score: ArcArray<f32, Dim<[usize; 1]>> = if beta2.is_infinite() && beta2.is_sign_positive()
    {
        recall.clone()
    } else {
        let beta2_cast: f32 = <f32 as NumCast>::from(beta2).unwrap_or(f32::INFINITY);
        let denom = (precision.mapv(|p| beta2_cast * p) + recall.view()).into_shared();
        let denom_non_zero = replace(denom, 0.0, 1.0);
        let beta2p1 = beta2_cast + 1.0;
        beta2p1 * precision.clone() * recall.view() / denom_non_zero
    };
    match average {
        Average::Weighted => {
            let support = true_sum.sum();
            if support == 0 {
                return match zero_division {
                    DivByZeroStrat::ReturnError => Err(ComputationError::DivisionByZero),
                    _ => Ok((array![0.0], array![0.0], array![0.0], array![0])),
                };
            };
            let weights = true_sum.mapv(|x| x as f32).into_shared();
            let final_precision = array![precision.weighted_mean(&weights)?];
            let final_recall = array![recall.weighted_mean(&weights)?];
            let final_f_score = array![f_score.weighted_mean(&weights)?];
            Ok((final_precision, final_recall, final_f_score, array![support]))
        }
        Average::None => Ok((
            precision.into_owned(),
            recall.into_owned(),
            f_score.into_owned(),
            true_sum,
        )),
        Average::Micro | Average::Macro => {
            let final_precision = array![precision
                .mean()
                .ok_or_else(|| ComputationError::EmptyArray(String::from("precision")))?];
            let final_recall = array![recall
                .mean()
                .ok_or_else(|| ComputationError::EmptyArray(String::from("recall")))?];
            let final_f_score = array![f_score
                .mean()
                .ok_or_else(|| ComputationError::EmptyArray(String::from("fscore")))?];
            Ok((final_precision, final_recall, final_f_score, array![true_sum.sum()]))
        }
    }
}

/// This function computes the result of the division and a mask equal to 0 where the denominator
/// is 0 and to 1 elsewhere. Zero denominators are replaced by 1 before dividing.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn prf_divide_results_and_mask<I: Debug + Num + Clone, D: Dimension>(
    numerator: ArcArray<I, D>,
    mut denominator: ArrayViewMut<I, D>,
) -> (ArcArray<I, D>, Array<I, D>) {
    let zero_at_mask =
        Zip::from(&mut denominator)
            .map_collect(|d| if *d == I::zero() { I::zero() } else { I::one() });
    denominator.mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / denominator, zero_at_mask)
}

/// Helper function to replace values from an array.
fn replace<Data: PartialEq + Copy, D: Dimension>(
    mut array: ArcArray<Data, D>,
    replaced: Data,
    new_value: Data,
) -> ArcArray<Data, D> {
    array.mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Computes the precision, recall, fscore (F1) and support of every label and the micro, macro and
/// weighted averages. The returned structure can be used to prettyprint the results or be
/// converted into a HashSet.
///
/// * `y_true`: True labels
/// * `y_pred`: Predicted labels
/// * `zero_division`: What to do in case of division by zero.
pub fn classification_report<S: AsRef<str>>(
    y_true: &[S],
    y_pred: &[S],
    zero_division: DivByZeroStrat,
) -> Result<Reporter, ComputationError> {
    check_consistent_length(y_true, y_pred)?;
    let labels = unique_labels(y_true, y_pred);
    let counts = extract_tp_actual_correct(y_true, y_pred, &labels);
    let (p, r, f1, s) =
        precision_recall_fscore_support_inner::<f32>(counts.clone(), 1.0, Average::None, zero_division)?;
    let mut reporter = Reporter::default();
    for (name, precision, recall, fscore, support) in multizip((
        labels.into_iter(),
        p.into_iter(),
        r.into_iter(),
        f1.into_iter(),
        s.into_iter(),
    )) {
        reporter.insert(ClassMetricsInner {
            class: name,
            precision,
            recall,
            fscore,
            support,
            average: Average::None,
        });
    }
    for avg in [
        OverallAverage::Micro,
        OverallAverage::Macro,
        OverallAverage::Weighted,
    ] {
        let (p, r, f1, s) = precision_recall_fscore_support_inner::<f32>(
            counts.clone(),
            1.0,
            avg.into(),
            zero_division,
        )?;
        reporter.insert(ClassMetricsInner::new_overall(
            avg,
            p.item()?,
            r.item()?,
            f1.item()?,
            s.item()?,
        ));
    }
    Ok(reporter)
}

/// Counts of (true label, predicted label) pairs. Rows are true labels and columns are predicted
/// labels, both in the order of `labels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Number of samples with true label `truth` predicted as `predicted`.
    pub fn get(&self, truth: &str, predicted: &str) -> Option<usize> {
        let row = self.labels.iter().position(|l| l == truth)?;
        let column = self.labels.iter().position(|l| l == predicted)?;
        Some(self.matrix[[row, column]])
    }
}

/// The confusion matrix acts as a dataframe when displayed: one header line with the predicted
/// labels, then one line per true label.
impl Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "True\\Predicted")?;
        for label in self.labels.iter() {
            write!(f, ", {}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(self.matrix.rows()) {
            write!(f, "{}", label)?;
            for count in row.iter() {
                write!(f, ", {}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn confusion_matrix<S: AsRef<str>>(
    y_true: &[S],
    y_pred: &[S],
) -> Result<ConfusionMatrix, ComputationError> {
    check_consistent_length(y_true, y_pred)?;
    let labels = unique_labels(y_true, y_pred);
    let index: AHashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let mut matrix = Array2::<usize>::zeros((labels.len(), labels.len()));
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(&i), Some(&j)) = (index.get(t.as_ref()), index.get(p.as_ref())) {
            matrix[[i, j]] += 1;
        }
    }
    Ok(ConfusionMatrix { labels, matrix })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub trait CloseEnough {
        fn are_close(&self, other: &Self, eps: f32) -> bool;
    }

    // ClassMetrics does not have the default PartialEq implementation.
    impl CloseEnough for ClassMetricsInner {
        fn are_close(&self, other: &Self, eps: f32) -> bool {
            let are_equal = self == other;
            let precision_is_equal = f32::abs(self.precision - other.precision) < eps;
            let recall_is_equal = f32::abs(self.recall - other.recall) < eps;
            let fscore_is_equal = f32::abs(self.fscore - other.fscore) < eps;
            let support_is_equal = self.support == other.support;
            are_equal && precision_is_equal && recall_is_equal && fscore_is_equal && support_is_equal
        }
    }
    impl CloseEnough for Reporter {
        fn are_close(&self, other: &Self, eps: f32) -> bool {
            self.classes.len() == other.classes.len()
                && self
                    .classes
                    .iter()
                    .zip(other.classes.iter())
                    .all(|(c1, c2)| c1.are_close(c2, eps))
        }
    }

    fn class(name: &str, precision: f32, recall: f32, fscore: f32, support: usize) -> ClassMetricsInner {
        ClassMetricsInner {
            class: String::from(name),
            precision,
            recall,
            fscore,
            support,
            average: Average::None,
        }
    }

    #[test]
    fn test_reporter_output() {
        let y_true = vec!["_", "ARG", "V", "ARG", "_", "_"];
        let y_pred = vec!["_", "ARG", "V", "_", "ARG", "_"];
        let actual = classification_report(&y_true, &y_pred, DivByZeroStrat::ReplaceBy0).unwrap();
        let expected = Reporter {
            classes: BTreeSet::from_iter(vec![
                class("ARG", 0.5, 0.5, 0.5, 2),
                class("V", 1.0, 1.0, 1.0, 1),
                class("_", 2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0, 3),
                ClassMetricsInner::new_overall(
                    OverallAverage::Micro,
                    4.0 / 6.0,
                    4.0 / 6.0,
                    4.0 / 6.0,
                    6,
                ),
                ClassMetricsInner::new_overall(
                    OverallAverage::Macro,
                    (0.5 + 1.0 + 2.0 / 3.0) / 3.0,
                    (0.5 + 1.0 + 2.0 / 3.0) / 3.0,
                    (0.5 + 1.0 + 2.0 / 3.0) / 3.0,
                    6,
                ),
                ClassMetricsInner::new_overall(
                    OverallAverage::Weighted,
                    4.0 / 6.0,
                    4.0 / 6.0,
                    4.0 / 6.0,
                    6,
                ),
            ]),
        };
        assert!(actual.are_close(&expected, 1e-6));
    }

    #[test]
    fn test_never_predicted_label() {
        let y_true = vec!["ARG0", "ARG1", "ARG1"];
        let y_pred = vec!["ARG1", "ARG1", "ARG1"];
        let (p, r, f, s) =
            precision_recall_fscore_support(&y_true, &y_pred, 1.0, Average::None, DivByZeroStrat::ReplaceBy0)
                .unwrap();
        assert_eq!(p, array![0.0, 2.0 / 3.0]);
        assert_eq!(r, array![0.0, 1.0]);
        assert!((f[1] - 0.8).abs() < 1e-6);
        assert_eq!(f[0], 0.0);
        assert_eq!(s, array![1, 2]);

        let (p, _, _, _) =
            precision_recall_fscore_support(&y_true, &y_pred, 1.0, Average::None, DivByZeroStrat::ReplaceBy1)
                .unwrap();
        assert_eq!(p, array![1.0, 2.0 / 3.0]);

        let err =
            precision_recall_fscore_support(&y_true, &y_pred, 1.0, Average::None, DivByZeroStrat::ReturnError);
        assert_eq!(err, Err(ComputationError::DivisionByZero));
    }

    #[test]
    fn test_return_error_only_on_zero_denominator() {
        let y = vec!["A", "B"];
        assert!(
            precision_recall_fscore_support(&y, &y, 1.0, Average::None, DivByZeroStrat::ReturnError)
                .is_ok()
        );
    }

    #[test]
    fn test_beta() {
        let y_true = vec!["A", "A", "B"];
        let y_pred = vec!["A", "B", "B"];
        // A: precision 1, recall 0.5; F2 = 5 * 0.5 / (4 + 0.5)
        let (_, _, f, _) =
            precision_recall_fscore_support(&y_true, &y_pred, 2.0, Average::None, DivByZeroStrat::ReplaceBy0)
                .unwrap();
        assert!((f[0] - 2.5 / 4.5).abs() < 1e-6);
        assert_eq!(
            precision_recall_fscore_support(&y_true, &y_pred, -1.0, Average::None, DivByZeroStrat::ReplaceBy0),
            Err(ComputationError::BetaNotPositive)
        );
    }

    #[rstest]
    #[case(vec!["A"], vec!["A", "B"], ComputationError::InconsistentLength(1, 2))]
    #[case(vec![], vec![], ComputationError::EmptyInput(String::from("y_true")))]
    fn test_invalid_inputs(
        #[case] y_true: Vec<&str>,
        #[case] y_pred: Vec<&str>,
        #[case] expected: ComputationError,
    ) {
        assert_eq!(
            classification_report(&y_true, &y_pred, DivByZeroStrat::ReplaceBy0),
            Err(expected.clone())
        );
        assert_eq!(confusion_matrix(&y_true, &y_pred), Err(expected));
    }

    #[test]
    fn test_confusion_matrix() {
        let y_true = vec!["_", "ARG", "V", "ARG", "_"];
        let y_pred = vec!["_", "ARG", "V", "_", "ARG"];
        let cm = confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(cm.labels, vec!["ARG", "V", "_"]);
        assert_eq!(cm.matrix, array![[1, 0, 1], [0, 1, 0], [1, 0, 1]]);
        assert_eq!(cm.get("ARG", "_"), Some(1));
        assert_eq!(cm.get("ARG", "ARGM"), None);
        assert_eq!(
            cm.to_string(),
            "True\\Predicted, ARG, V, _\nARG, 1, 0, 1\nV, 0, 1, 0\n_, 1, 0, 1\n"
        );
    }

    #[rstest]
    #[case("ReplaceBy0", DivByZeroStrat::ReplaceBy0)]
    #[case("0", DivByZeroStrat::ReplaceBy0)]
    #[case("replacebyone", DivByZeroStrat::ReplaceBy1)]
    #[case("error", DivByZeroStrat::ReturnError)]
    fn test_parse_strategy(#[case] raw: &str, #[case] expected: DivByZeroStrat) {
        assert_eq!(raw.parse::<DivByZeroStrat>(), Ok(expected))
    }

    #[test]
    fn test_weighted_average_without_support() {
        let counts = (array![1], array![0], array![0]);
        let (p, _, _, s) = precision_recall_fscore_support_inner::<f32>(
            counts,
            1.0,
            Average::Weighted,
            DivByZeroStrat::ReplaceBy0,
        )
        .unwrap();
        assert_eq!(p, array![0.0]);
        assert_eq!(s, array![0]);
    }

    #[test]
    fn test_weighted_average_follows_support() {
        let y_true = vec!["A", "A", "A", "B"];
        let y_pred = vec!["A", "A", "B", "B"];
        // A: precision 1, recall 2/3, support 3; B: precision 0.5, recall 1, support 1
        let (p, r, _, s) =
            precision_recall_fscore_support(&y_true, &y_pred, 1.0, Average::Weighted, DivByZeroStrat::ReplaceBy0)
                .unwrap();
        assert!((p[0] - 0.875).abs() < 1e-6);
        assert!((r[0] - 0.75).abs() < 1e-6);
        assert_eq!(s, array![4]);
    }
}
