use rusrl::{
    classify_and_write, evaluate_file, extract_features_in_file, identify_arguments_in_file,
    identify_predicates_in_file, read_all, read_features_from, run_experiment, ArgumentLabel,
    ArgumentSource, DivByZeroStrat, OverallAverage, PipelineConfig, PredicateMethod, Task, View,
    Voice,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = "./tests/data/sample.conllu";

fn copy_fixture(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::copy(FIXTURE, &path).unwrap();
    path
}

fn views(path: &Path) -> Vec<View> {
    read_all(path)
        .unwrap()
        .into_iter()
        .map(|s| View::try_from(s).unwrap())
        .collect()
}

#[test]
fn test_treebank_is_padded_to_the_width_of_the_first_row() {
    let sentences = read_all(FIXTURE).unwrap();
    assert_eq!(sentences.len(), 4);
    assert!(sentences[0].iter().all(|r| r.len() == 13));
    assert!(sentences[3].iter().all(|r| r.len() == 12));
}

#[test]
fn test_rule_predicates_find_every_gold_predicate() {
    let dir = TempDir::new().unwrap();
    let input = copy_fixture(&dir, "dev.conllu");
    let predicates = identify_predicates_in_file(&input, PredicateMethod::Rule).unwrap();
    let evaluation = evaluate_file(
        &predicates,
        Task::PredicateIdentification,
        DivByZeroStrat::ReplaceBy0,
    )
    .unwrap();
    let pred = evaluation.reporter.get("PRED").unwrap();
    assert_eq!(pred.precision, 1.0);
    assert_eq!(pred.recall, 1.0);
    assert_eq!(pred.support, 4);
}

#[test]
fn test_rule_arguments_over_rule_predicates() {
    let dir = TempDir::new().unwrap();
    let input = copy_fixture(&dir, "dev.conllu");
    let predicates = identify_predicates_in_file(&input, PredicateMethod::Rule).unwrap();
    let arguments = identify_arguments_in_file(&predicates, ArgumentSource::Rule).unwrap();
    assert_eq!(
        arguments,
        dir.path().join("dev-pred_iden-rule-arg_iden-rule.tsv")
    );

    let views = views(&arguments);
    assert_eq!(views.len(), 5);
    assert!(views[4].predicate().is_none());
    assert!(views[4]
        .rows
        .iter()
        .all(|r| r.predicted_argument == ArgumentLabel::Outside && r.gold_argument == "_"));

    let evaluation = evaluate_file(
        &arguments,
        Task::ArgumentIdentification,
        DivByZeroStrat::ReplaceBy0,
    )
    .unwrap();
    let arg = evaluation.reporter.get("ARG").unwrap();
    assert!((arg.precision - 8.0 / 9.0).abs() < 1e-6);
    assert_eq!(arg.recall, 1.0);
    assert_eq!(evaluation.confusion.get("_", "ARG"), Some(1));
}

#[test]
fn test_features_and_classification() {
    let dir = TempDir::new().unwrap();
    let input = copy_fixture(&dir, "dev.conllu");
    let predicates = identify_predicates_in_file(&input, PredicateMethod::Gold).unwrap();
    let arguments = identify_arguments_in_file(&predicates, ArgumentSource::Gold).unwrap();
    let features = extract_features_in_file(&arguments).unwrap();

    let rows = read_features_from(&features).unwrap();
    assert_eq!(rows.len(), 8);
    let passive: Vec<_> = rows.iter().filter(|r| r.voice == Voice::Passive).collect();
    assert_eq!(passive.len(), 2);
    assert!(passive.iter().all(|r| r.pred_lemma == "break"));

    let predictions = classify_and_write(&features, &features, &arguments, 20).unwrap();
    let classified = views(&predictions);
    assert!(classified
        .iter()
        .flat_map(|v| v.rows.iter())
        .all(|r| r.predicted_argument != ArgumentLabel::Argument));

    let evaluation = evaluate_file(
        &predictions,
        Task::ArgumentClassification,
        DivByZeroStrat::ReplaceBy0,
    )
    .unwrap();
    let micro = evaluation.reporter.overall(OverallAverage::Micro).unwrap();
    assert!(micro.support > 0);
    assert!(evaluation.reporter.get("V").is_some());
}

#[test]
fn test_experiment_writes_every_stage() {
    let dir = TempDir::new().unwrap();
    let train = copy_fixture(&dir, "train.conllu");
    let test = copy_fixture(&dir, "test.conllu");
    let experiment = run_experiment(&train, &test, &PipelineConfig::default()).unwrap();
    assert_eq!(experiment.stages.len(), 5);
    assert_eq!(
        experiment.stages[0].evaluation.task,
        Task::PredicateIdentification
    );
    for name in [
        "train-pred_iden-rule-arg_iden-rule-features.tsv",
        "test-pred_iden-rule-arg_iden-rule-predictions.tsv",
        "test-pred_iden-gold-arg_iden-rule.tsv",
        "test-pred_iden-gold-arg_iden-gold-predictions.tsv",
    ] {
        assert!(dir.path().join(name).exists(), "{} is missing", name);
    }
}
