/*!
Evaluation of the three tasks of the pipeline. Each task reads its gold and predicted label
sequences from the records written by one stage, one label per token row.
*/
use crate::error::{FormatError, SrlError};
use crate::metrics::{classification_report, confusion_matrix, ConfusionMatrix, DivByZeroStrat};
use crate::reader::RawSentence;
use crate::reporter::Reporter;
use crate::sentence::{ArgumentLabel, PredicateSentence, View};
use enum_iterator::Sequence;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum Task {
    /// Gold predicate marker against predicted marker.
    PredicateIdentification,
    /// Gold argument label, collapsed to `_`, `V` or `ARG`, against the identified label.
    ArgumentIdentification,
    /// Gold argument label against the classified label.
    ArgumentClassification,
}

impl Task {
    /// The label whose scores summarize the task.
    pub fn label_of_interest(&self) -> Option<&'static str> {
        match self {
            Self::PredicateIdentification => Some("PRED"),
            Self::ArgumentIdentification => Some("ARG"),
            Self::ArgumentClassification => None,
        }
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PredicateIdentification => write!(f, "predicate_identification"),
            Self::ArgumentIdentification => write!(f, "argument_identification"),
            Self::ArgumentClassification => write!(f, "argument_classification"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskParsingError(String);

impl Display for TaskParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Impossible to parse the string ({}) into a Task", self.0)
    }
}

impl std::error::Error for TaskParsingError {}

impl FromStr for Task {
    type Err = TaskParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "predicate_identification" | "predicates" => Ok(Self::PredicateIdentification),
            "argument_identification" | "arguments" => Ok(Self::ArgumentIdentification),
            "argument_classification" | "classification" => Ok(Self::ArgumentClassification),
            _ => Err(TaskParsingError(String::from(s))),
        }
    }
}

/// Gold and predicted label sequences, aligned.
pub type GoldAndPredicted = (Vec<String>, Vec<String>);

/// Extracts the label sequences of `task` from the records of the matching stage: predicate
/// identification records for `PredicateIdentification`, views otherwise.
pub fn gold_and_predicted(
    task: Task,
    sentences: Vec<RawSentence>,
) -> Result<GoldAndPredicted, FormatError> {
    let mut gold = Vec::new();
    let mut predicted = Vec::new();
    match task {
        Task::PredicateIdentification => {
            for sentence in sentences {
                let sentence = PredicateSentence::try_from(sentence)?;
                gold.extend(sentence.gold.iter().map(ToString::to_string));
                predicted.extend(sentence.predicted.iter().map(ToString::to_string));
            }
        }
        Task::ArgumentIdentification | Task::ArgumentClassification => {
            for sentence in sentences {
                let view = View::try_from(sentence)?;
                for row in view.rows {
                    let gold_label = if task == Task::ArgumentIdentification {
                        ArgumentLabel::identification_of(&row.gold_argument).to_string()
                    } else {
                        row.gold_argument
                    };
                    gold.push(gold_label);
                    predicted.push(row.predicted_argument.to_string());
                }
            }
        }
    }
    Ok((gold, predicted))
}

/// Scores of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub task: Task,
    pub reporter: Reporter,
    pub confusion: ConfusionMatrix,
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "---------- Evaluation for {} ----------", self.task)?;
        write!(f, "{}", self.reporter)?;
        writeln!(f, "---------- Confusion matrix for {} ----------", self.task)?;
        write!(f, "{}", self.confusion)
    }
}

pub fn evaluate(
    task: Task,
    sentences: Vec<RawSentence>,
    zero_division: DivByZeroStrat,
) -> Result<Evaluation, SrlError> {
    let (gold, predicted) = gold_and_predicted(task, sentences)?;
    let reporter = classification_report(&gold, &predicted, zero_division)?;
    let confusion = confusion_matrix(&gold, &predicted)?;
    info!("evaluated {} on {} tokens", task, gold.len());
    Ok(Evaluation {
        task,
        reporter,
        confusion,
    })
}
