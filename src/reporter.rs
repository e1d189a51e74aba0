/**
Per-label and overall scores of one evaluation, printable as a comma separated table.
*/
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Scores of every label followed by the micro, macro and weighted averages. Displaying it prints
/// one table line per entry, and it converts into a `HashSet` of `ClassMetrics` for unordered
/// consumption. Built by `classification_report`.
///
/// # Example
///
/// ```rust
/// use rusrl::{classification_report, DivByZeroStrat, OverallAverage};
///
/// let y_true = vec!["_", "ARG", "V", "ARG"];
/// let y_pred = vec!["_", "ARG", "V", "_"];
///
/// let reporter = classification_report(&y_true, &y_pred, DivByZeroStrat::ReplaceBy0).unwrap();
///
/// let arg = reporter.get("ARG").unwrap();
/// assert_eq!(arg.precision, 1.0);
/// assert_eq!(arg.recall, 0.5);
/// assert_eq!(arg.support, 2);
///
/// let micro = reporter.overall(OverallAverage::Micro).unwrap();
/// assert_eq!(micro.fscore, 0.75);
///
/// let table = reporter.to_string();
/// let first_lines: Vec<&str> = table.lines().take(2).collect();
/// assert_eq!(first_lines, vec!["Class, Precision, Recall, Fscore, Support", "ARG, 1, 0.5, 0.6666667, 2"]);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Reporter {
    pub(crate) classes: BTreeSet<ClassMetricsInner>,
}

/// The set drops the table order of the reporter.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().map(ClassMetrics::from).collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: ClassMetricsInner) -> bool {
        self.classes.insert(metrics)
    }

    /// Metrics of a single label.
    pub fn get(&self, class: &str) -> Option<ClassMetrics> {
        self.classes
            .iter()
            .find(|c| c.average == Average::None && c.class == class)
            .cloned()
            .map(ClassMetrics::from)
    }

    pub fn overall(&self, average: OverallAverage) -> Option<ClassMetrics> {
        let average = Average::from(average);
        self.classes
            .iter()
            .find(|c| c.average == average)
            .cloned()
            .map(ClassMetrics::from)
    }

    /// Every line of the report, labels first.
    pub fn metrics(&self) -> Vec<ClassMetrics> {
        self.classes.iter().cloned().map(ClassMetrics::from).collect()
    }
}

/// Header line, then one line per label and per average.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Datastructure holding metrics about a given label.
pub struct ClassMetrics {
    /// The label, such as "ARG0", "ARGM-TMP", "PRED", etc.
    pub class: String,
    /// `None` for a single label, otherwise the kind of overall average
    pub average: Average,
    /// Precision metric
    pub precision: f32,
    /// Recall metric
    pub recall: f32,
    /// Fscore metric
    pub fscore: f32,
    /// Support metric
    pub support: usize,
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

impl From<ClassMetricsInner> for ClassMetrics {
    fn from(value: ClassMetricsInner) -> Self {
        Self {
            class: value.class,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// ClassMetricsInner hold the metrics for a single label. They can't be constructed explicitely
/// and they implement a special version of the `Display` trait, allowing them to be treated as the
/// line of a dataframe. Their ordering puts the labels before the overall averages.
pub(crate) struct ClassMetricsInner {
    pub(crate) class: String,
    pub(crate) average: Average,
    pub(crate) precision: f32,
    pub(crate) recall: f32,
    pub(crate) fscore: f32,
    pub(crate) support: usize,
}
impl PartialEq for ClassMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetricsInner {}

impl PartialOrd for ClassMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassMetricsInner {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.average
            .cmp(&other.average)
            .then_with(|| self.class.cmp(&other.class))
    }
}

impl ClassMetricsInner {
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
    ) -> Self {
        ClassMetricsInner {
            class: average.to_string(),
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// One table line: `class, precision, recall, fscore, support`.
impl Display for ClassMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Kind of a report line: a single label (`None`) or one of the overall averages. Parsed
/// case-insensitively.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}
impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct AverageParsingError(String);
impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an Average",
            self.0
        )
    }
}
impl std::error::Error for AverageParsingError {}

/// Average implements ordering. This is used during the reporting to represent the ClassMetrics
/// with an `average` other than `None` as `Greater` than those with `None`. The overall averages
/// follow the alphabetical order of their display names.
impl PartialOrd for Average {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Average {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(average: &Average) -> u8 {
            match average {
                Average::None => 0,
                Average::Macro => 1,
                Average::Micro => 2,
                Average::Weighted => 3,
            }
        }
        rank(self).cmp(&rank(other))
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}
