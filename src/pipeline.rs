/*!
File-level stages of the pipeline. Each stage reads one file, transforms every sentence and writes
its output next to the input, returning the path it wrote. The output name appends a stage suffix
to the stem of the input, so chaining stages gives names such as
`train-pred_iden-rule-arg_iden-rule.tsv`.
*/
use crate::classifier::{apply_predictions, Classifier, Perceptron};
use crate::config::PipelineConfig;
use crate::error::{FormatError, SrlError};
use crate::evaluation::{evaluate, Evaluation, Task};
use crate::expander::{expand_all, ArgumentSource};
use crate::features::{extract_all, read_features_from, write_features_to};
use crate::metrics::DivByZeroStrat;
use crate::predicate::{identify_sentence, PredicateMethod};
use crate::reader::read_all;
use crate::sentence::{PredicateSentence, TreebankSentence, View};
use crate::writer::write_sentences_to;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

/// Path of the file written by a stage: `<dir>/<stem>-<suffix>.tsv`.
pub fn output_path<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}-{}.tsv", stem, suffix))
}

fn read_views<P: AsRef<Path>>(path: P) -> Result<Vec<View>, SrlError> {
    Ok(read_all(path)?
        .into_iter()
        .map(View::try_from)
        .collect::<Result<Vec<_>, FormatError>>()?)
}

/// Reads a treebank and writes its predicate identification records.
pub fn identify_predicates_in_file<P: AsRef<Path>>(
    path: P,
    method: PredicateMethod,
) -> Result<PathBuf, SrlError> {
    let sentences = read_all(path.as_ref())?
        .into_iter()
        .map(|raw| identify_sentence(TreebankSentence::try_from(raw)?, method))
        .collect::<Result<Vec<_>, FormatError>>()?;
    let output = output_path(path, &format!("pred_iden-{}", method));
    write_sentences_to(&sentences, &output)?;
    Ok(output)
}

/// Reads predicate identification records and writes one view per predicate.
pub fn identify_arguments_in_file<P: AsRef<Path>>(
    path: P,
    source: ArgumentSource,
) -> Result<PathBuf, SrlError> {
    let sentences = read_all(path.as_ref())?
        .into_iter()
        .map(PredicateSentence::try_from)
        .collect::<Result<Vec<_>, FormatError>>()?;
    let views: Vec<View> = expand_all(&sentences, source)?.into_iter().flatten().collect();
    let output = output_path(path, &format!("arg_iden-{}", source));
    write_sentences_to(&views, &output)?;
    Ok(output)
}

/// Reads views and writes one feature row per identified argument.
pub fn extract_features_in_file<P: AsRef<Path>>(path: P) -> Result<PathBuf, SrlError> {
    let views = read_views(path.as_ref())?;
    let rows = extract_all(&views)?;
    let output = output_path(path, "features");
    write_features_to(&rows, &output)?;
    info!("extracted {} feature rows", rows.len());
    Ok(output)
}

/// Trains a perceptron on `train_features`, labels `test_features` and writes the views of
/// `test_views` with their `ARG` labels replaced by the predicted roles. The feature file must
/// have been extracted from `test_views`.
pub fn classify_and_write<P, Q, R>(
    train_features: P,
    test_features: Q,
    test_views: R,
    epochs: usize,
) -> Result<PathBuf, SrlError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let train = read_features_from(train_features)?;
    let test = read_features_from(test_features)?;
    let mut classifier = Perceptron::new(epochs);
    classifier.fit(&train)?;
    let predictions = classifier.predict(&test)?;
    let mut views = read_views(test_views.as_ref())?;
    apply_predictions(&mut views, &predictions)?;
    let output = output_path(test_views, "predictions");
    write_sentences_to(&views, &output)?;
    Ok(output)
}

/// Scores the records of `path` for `task`.
pub fn evaluate_file<P: AsRef<Path>>(
    path: P,
    task: Task,
    zero_division: DivByZeroStrat,
) -> Result<Evaluation, SrlError> {
    evaluate(task, read_all(path)?, zero_division)
}

/// One scored step of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvaluation {
    /// Which identification methods fed the evaluated file, e.g. `rule predicates, rule arguments`.
    pub setting: String,
    pub evaluation: Evaluation,
}

impl Display for StageEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Setting: {}", self.setting)?;
        write!(f, "{}", self.evaluation)
    }
}

/// Every evaluation of an experiment, in the order they were computed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Experiment {
    pub stages: Vec<StageEvaluation>,
}

impl Experiment {
    fn push(&mut self, setting: impl Into<String>, evaluation: Evaluation) {
        self.stages.push(StageEvaluation {
            setting: setting.into(),
            evaluation,
        })
    }
}

impl Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.stages {
            writeln!(f, "{}", stage)?;
        }
        Ok(())
    }
}

struct Prepared {
    predicates: PathBuf,
    arguments: PathBuf,
    features: PathBuf,
}

fn prepare<P: AsRef<Path>>(
    path: P,
    method: PredicateMethod,
    source: ArgumentSource,
) -> Result<Prepared, SrlError> {
    let predicates = identify_predicates_in_file(path, method)?;
    let arguments = identify_arguments_in_file(&predicates, source)?;
    let features = extract_features_in_file(&arguments)?;
    Ok(Prepared {
        predicates,
        arguments,
        features,
    })
}

/// Runs the whole comparison on a train and a test treebank:
///
/// 1. predicate identification, argument identification and argument classification with the
///    methods of `config`;
/// 2. argument identification with the rule on top of gold predicates;
/// 3. argument classification on top of gold predicates and gold arguments.
///
/// Intermediate files are written next to the inputs.
pub fn run_experiment<P, Q>(
    train: P,
    test: Q,
    config: &PipelineConfig,
) -> Result<Experiment, SrlError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let (train, test) = (train.as_ref(), test.as_ref());
    let zero_division = config.zero_division;
    let mut experiment = Experiment::default();

    let setting = format!(
        "{} predicates, {} arguments",
        config.predicate_method, config.argument_source
    );
    info!("running experiment with {}", setting);
    let train_files = prepare(train, config.predicate_method, config.argument_source)?;
    let test_files = prepare(test, config.predicate_method, config.argument_source)?;
    for (task, path) in [
        (Task::PredicateIdentification, &test_files.predicates),
        (Task::ArgumentIdentification, &test_files.arguments),
    ] {
        experiment.push(setting.clone(), evaluate_file(path, task, zero_division)?);
    }
    let predictions = classify_and_write(
        &train_files.features,
        &test_files.features,
        &test_files.arguments,
        config.epochs,
    )?;
    experiment.push(
        setting,
        evaluate_file(predictions, Task::ArgumentClassification, zero_division)?,
    );

    let gold_predicates = identify_predicates_in_file(test, PredicateMethod::Gold)?;
    let rule_arguments = identify_arguments_in_file(&gold_predicates, ArgumentSource::Rule)?;
    experiment.push(
        "gold predicates, rule arguments",
        evaluate_file(rule_arguments, Task::ArgumentIdentification, zero_division)?,
    );

    let train_files = prepare(train, PredicateMethod::Gold, ArgumentSource::Gold)?;
    let test_files = prepare(test, PredicateMethod::Gold, ArgumentSource::Gold)?;
    let predictions = classify_and_write(
        &train_files.features,
        &test_files.features,
        &test_files.arguments,
        config.epochs,
    )?;
    experiment.push(
        "gold predicates, gold arguments",
        evaluate_file(predictions, Task::ArgumentClassification, zero_division)?,
    );
    Ok(experiment)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sentence::{ArgumentLabel, PredicateMarker};
    use std::fs;
    use tempfile::TempDir;

    pub(crate) const SAMPLE: &str = "# sent_id = 1
# text = Mary said she would leave .
1\tMary\tmary\tPROPN\tNNP\tNumber=Sing\t2\tnsubj\t_\t_\t_\tARG0\t_
2\tsaid\tsay\tVERB\tVBD\tMood=Ind|Tense=Past|VerbForm=Fin\t0\troot\t_\t_\tsay.01\tV\t_
3\tshe\tshe\tPRON\tPRP\tCase=Nom\t5\tnsubj\t_\t_\t_\t_\tARG0
4\twould\twould\tAUX\tMD\tVerbForm=Fin\t5\taux\t_\t_\t_\t_\tARGM-MOD
5\tleave\tleave\tVERB\tVB\tVerbForm=Inf\t2\tccomp\t_\t_\tleave.01\tARG1\tV
6\t.\t.\tPUNCT\t.\t_\t2\tpunct\t_\t_\t_\t_\t_

# sent_id = 2
# text = The dog barked loudly .
1\tThe\tthe\tDET\tDT\tDefinite=Def\t2\tdet\t_\t_\t_\t_
2\tdog\tdog\tNOUN\tNN\tNumber=Sing\t3\tnsubj\t_\t_\t_\tARG0
3\tbarked\tbark\tVERB\tVBD\tTense=Past|VerbForm=Fin\t0\troot\t_\t_\tbark.01\tV
4\tloudly\tloudly\tADV\tRB\t_\t3\tadvmod\t_\t_\t_\tARGM-MNR
5\t.\t.\tPUNCT\t.\t_\t3\tpunct\t_\t_\t_\t_

";

    fn sample_file() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.conllu");
        fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn test_output_path_appends_suffix_to_stem() {
        assert_eq!(
            output_path("data/train-pred_iden-rule.tsv", "arg_iden-gold"),
            PathBuf::from("data/train-pred_iden-rule-arg_iden-gold.tsv")
        );
        assert_eq!(
            output_path("dev.conllu", "pred_iden-rule"),
            PathBuf::from("dev-pred_iden-rule.tsv")
        );
    }

    #[test]
    fn test_identify_predicates_in_file() {
        let (_dir, path) = sample_file();
        let output = identify_predicates_in_file(&path, PredicateMethod::Rule).unwrap();
        assert!(output.ends_with("sample-pred_iden-rule.tsv"));
        let sentences: Vec<PredicateSentence> = read_all(&output)
            .unwrap()
            .into_iter()
            .map(|s| PredicateSentence::try_from(s).unwrap())
            .collect();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].gold, sentences[0].predicted);
        assert_eq!(sentences[1].predicted[2], PredicateMarker::Predicate);
        assert_eq!(sentences[0].gold_arguments.len(), 2);
    }

    #[test]
    fn test_identify_arguments_in_file() {
        let (_dir, path) = sample_file();
        let predicates = identify_predicates_in_file(&path, PredicateMethod::Gold).unwrap();
        let arguments = identify_arguments_in_file(&predicates, ArgumentSource::Rule).unwrap();
        assert!(arguments.ends_with("sample-pred_iden-gold-arg_iden-rule.tsv"));
        let views = read_views(&arguments).unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views.iter().map(View::len).collect::<Vec<_>>(), vec![6, 6, 5]);
    }

    #[test]
    fn test_extract_features_in_file() {
        let (_dir, path) = sample_file();
        let prepared = prepare(&path, PredicateMethod::Rule, ArgumentSource::Rule).unwrap();
        let rows = read_features_from(&prepared.features).unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["ARG0", "ARG1", "ARG0", "ARGM-MOD", "ARG0", "ARGM-MNR"]);
    }

    #[test]
    fn test_classify_and_write_keeps_the_views() {
        let (_dir, path) = sample_file();
        let prepared = prepare(&path, PredicateMethod::Rule, ArgumentSource::Rule).unwrap();
        let output =
            classify_and_write(&prepared.features, &prepared.features, &prepared.arguments, 10)
                .unwrap();
        assert!(output.ends_with("sample-pred_iden-rule-arg_iden-rule-predictions.tsv"));
        let before = read_views(&prepared.arguments).unwrap();
        let after = read_views(&output).unwrap();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.len(), a.len());
            for (rb, ra) in b.rows.iter().zip(&a.rows) {
                assert_eq!(rb.gold_argument, ra.gold_argument);
                let classified = rb.predicted_argument == ArgumentLabel::Argument;
                assert_eq!(classified, ra.predicted_argument != rb.predicted_argument);
            }
        }
    }

    #[test]
    fn test_evaluate_file_on_predicates() {
        let (_dir, path) = sample_file();
        let predicates = identify_predicates_in_file(&path, PredicateMethod::Rule).unwrap();
        let evaluation =
            evaluate_file(&predicates, Task::PredicateIdentification, DivByZeroStrat::ReplaceBy0)
                .unwrap();
        let pred = evaluation.reporter.get("PRED").unwrap();
        assert_eq!(pred.precision, 1.0);
        assert_eq!(pred.recall, 1.0);
        assert_eq!(pred.support, 3);
    }

    #[test]
    fn test_run_experiment() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join("train.conllu");
        let test = dir.path().join("test.conllu");
        fs::write(&train, SAMPLE).unwrap();
        fs::write(&test, SAMPLE).unwrap();
        let experiment = run_experiment(&train, &test, &PipelineConfig::default()).unwrap();
        let tasks: Vec<Task> = experiment.stages.iter().map(|s| s.evaluation.task).collect();
        assert_eq!(
            tasks,
            vec![
                Task::PredicateIdentification,
                Task::ArgumentIdentification,
                Task::ArgumentClassification,
                Task::ArgumentIdentification,
                Task::ArgumentClassification,
            ]
        );
        let arg = experiment.stages[1].evaluation.reporter.get("ARG").unwrap();
        assert_eq!(arg.recall, 1.0);
        assert!(dir.path().join("test-pred_iden-gold-arg_iden-gold-predictions.tsv").exists());
        assert!(experiment.to_string().contains("gold predicates, rule arguments"));
    }
}
