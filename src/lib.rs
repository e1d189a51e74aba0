/*!
Semantic role labeling over dependency-parsed sentences. The library takes a treebank in the
CoNLL-U layout, extended with a predicate sense column and one gold argument column per predicate,
and runs it through a short pipeline whose every stage writes a tab-separated file:

1. predicate identification, from the gold senses or from syntactic rules;
2. argument identification, which expands every sentence into one view per predicate and labels
   the direct dependents of the predicate as arguments;
3. feature extraction over the identified arguments;
4. argument classification with an averaged perceptron;
5. evaluation of each step with per-label precision, recall and F1.

# Terminology
* A sentence is a list of records, one per token. The first ten fields of a record are the
    CoNLL-U fields (index, form, lemma, upos, xpos, feats, head, deprel, deps, misc).
* A predicate marker is `PRED` or `_`. Every intermediate file carries a gold and a predicted
    marker column side by side.
* A view is a copy of a sentence centred on a single predicate. Its predicate row is labeled `V`,
    its arguments `ARG` (or a role such as `ARG0` once classified) and every other row `_`.
* A gold slot is the index of the gold argument column belonging to the n-th gold predicate.

# Example
```rust
use rusrl::{expand, identify_sentence, ArgumentSource, PredicateMethod, TreebankReader, TreebankSentence};
use std::io::Cursor;

let treebank = "1\tDogs\tdog\tNOUN\tNNS\t_\t2\tnsubj\t_\t_\t_\tARG0
2\tbark\tbark\tVERB\tVBP\tVerbForm=Fin\t0\troot\t_\t_\tbark.01\tV
";
let raw = TreebankReader::new(Cursor::new(treebank)).next().unwrap().unwrap();
let sentence = identify_sentence(TreebankSentence::try_from(raw).unwrap(), PredicateMethod::Rule).unwrap();
let views = expand(&sentence, ArgumentSource::Rule).unwrap();
assert_eq!(views.len(), 1);
let labels: Vec<String> = views[0].rows.iter().map(|r| r.predicted_argument.to_string()).collect();
assert_eq!(labels, vec!["ARG", "V"]);
```
*/

mod argument;
mod classifier;
mod config;
mod error;
mod evaluation;
mod expander;
mod features;
mod metrics;
mod pipeline;
mod predicate;
mod reader;
mod reporter;
mod sentence;
mod token;
mod writer;

// The public api starts here
pub use token::{Features, Head, Token, TokenId, TokenIndex, CORE_COLUMNS, PLACEHOLDER};

pub use reader::{
    is_tabular, read_all, read_sentences, RawSentence, Record, TabularReader, TreebankReader,
    TREEBANK_MIN_COLUMNS,
};

pub use sentence::{
    ArgumentLabel, GoldArguments, LabelColumn, PredicateMarker, PredicateSentence, ToRecords,
    TreebankSentence, View, ViewRow, GOLD_PREDICATE_COLUMN, PREDICTED_PREDICATE_COLUMN,
    VIEW_COLUMNS,
};

pub use predicate::{
    gold_predicates, identify_predicates, identify_sentence, is_gold_predicate, is_rule_predicate,
    predicate_ids, rule_predicates, PredicateMethod, PredicateMethodParsingError,
};

pub use argument::{
    identify_arguments, identify_arguments_for, is_argument_relation, position_of,
    EXCLUDED_RELATIONS,
};

pub use expander::{expand, expand_all, ArgumentSource, ArgumentSourceParsingError, ExpansionError};

pub use writer::{write_sentences, write_sentences_to};

pub use features::{
    extract_all, extract_features, read_features, read_features_from, write_features,
    write_features_to, FeatureRow, Position, Voice, ROOT_HEAD,
};

pub use classifier::{
    apply_predictions, Classifier, ClassifierError, FeatureVocabulary, Perceptron, DEFAULT_EPOCHS,
};

pub use metrics::{
    classification_report, confusion_matrix, precision_recall_fscore_support, unique_labels,
    ComputationError, ConfusionMatrix, DivByZeroStrat, FloatExt,
    ParsingDivisionByZeroStrategyError, PrecisionRecallFScoreTrueSum,
};

pub use reporter::{Average, AverageParsingError, ClassMetrics, OverallAverage, Reporter};

pub use evaluation::{evaluate, gold_and_predicted, Evaluation, GoldAndPredicted, Task, TaskParsingError};

pub use config::{PipelineConfig, PipelineConfigBuilder};

pub use pipeline::{
    classify_and_write, evaluate_file, extract_features_in_file, identify_arguments_in_file,
    identify_predicates_in_file, output_path, run_experiment, Experiment, StageEvaluation,
};

pub use error::{FormatError, LookupError, SrlError};
