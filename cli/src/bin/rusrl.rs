use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rusrl::{
    classify_and_write, evaluate_file, extract_features_in_file, identify_arguments_in_file,
    identify_predicates_in_file, run_experiment, ArgumentSource, DivByZeroStrat, Evaluation,
    PipelineConfig, PredicateMethod, StageEvaluation, Task, DEFAULT_EPOCHS,
};
use serde_jsonlines::write_json_lines;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "rusrl")]
#[command(about = "Rule-based and classifier-based semantic role labeling over CoNLL-U treebanks")]
#[command(version)]
struct Cli {
    /// Also write the evaluations as JSON lines to this file
    #[arg(short, long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Identify the predicates of a treebank
    Predicates {
        input: PathBuf,
        #[arg(short, long, default_value_t = PredicateMethod::Rule)]
        method: PredicateMethod,
    },
    /// Expand predicate identification records into one view per predicate
    Arguments {
        input: PathBuf,
        #[arg(short, long, default_value_t = ArgumentSource::Rule)]
        source: ArgumentSource,
    },
    /// Extract the classification features of identified arguments
    Features { input: PathBuf },
    /// Train on a feature file and label the arguments of a view file
    Classify {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        /// Views the test features were extracted from
        #[arg(long)]
        views: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
        epochs: usize,
    },
    /// Score the output of a stage
    Evaluate {
        input: PathBuf,
        #[arg(short, long)]
        task: Task,
        #[arg(short, long, default_value_t = DivByZeroStrat::ReplaceBy0)]
        zero_division: DivByZeroStrat,
    },
    /// Run every stage on a train and a test treebank and compare rule and gold settings
    Experiment {
        train: PathBuf,
        test: PathBuf,
        #[arg(short, long, default_value_t = PredicateMethod::Rule)]
        method: PredicateMethod,
        #[arg(short, long, default_value_t = ArgumentSource::Rule)]
        source: ArgumentSource,
        #[arg(short, long, default_value_t = DEFAULT_EPOCHS)]
        epochs: usize,
        #[arg(short, long, default_value_t = DivByZeroStrat::ReplaceBy0)]
        zero_division: DivByZeroStrat,
    },
}

fn print_evaluation(evaluation: &Evaluation) {
    if let Some(metrics) = evaluation
        .task
        .label_of_interest()
        .and_then(|label| evaluation.reporter.get(label))
    {
        println!(
            "{}: precision {:.3}, recall {:.3}, fscore {:.3}, support {}",
            metrics.class, metrics.precision, metrics.recall, metrics.fscore, metrics.support
        );
    }
    println!("{}", evaluation);
}

fn write_report(path: &Path, stages: &[StageEvaluation]) -> Result<()> {
    write_json_lines(path, stages)
        .with_context(|| format!("failed to write the report to {}", path.display()))?;
    info!("wrote {} evaluations to {}", stages.len(), path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Predicates { input, method } => {
            let output = identify_predicates_in_file(&input, method)
                .with_context(|| format!("predicate identification failed on {}", input.display()))?;
            println!("{}", output.display());
        }
        Command::Arguments { input, source } => {
            let output = identify_arguments_in_file(&input, source)
                .with_context(|| format!("argument identification failed on {}", input.display()))?;
            println!("{}", output.display());
        }
        Command::Features { input } => {
            let output = extract_features_in_file(&input)
                .with_context(|| format!("feature extraction failed on {}", input.display()))?;
            println!("{}", output.display());
        }
        Command::Classify {
            train,
            test,
            views,
            epochs,
        } => {
            let output = classify_and_write(&train, &test, &views, epochs)
                .with_context(|| format!("classification failed on {}", test.display()))?;
            println!("{}", output.display());
        }
        Command::Evaluate {
            input,
            task,
            zero_division,
        } => {
            let evaluation = evaluate_file(&input, task, zero_division)
                .with_context(|| format!("evaluation failed on {}", input.display()))?;
            print_evaluation(&evaluation);
            if let Some(path) = &cli.report {
                let stage = StageEvaluation {
                    setting: input.display().to_string(),
                    evaluation,
                };
                write_report(path, &[stage])?;
            }
        }
        Command::Experiment {
            train,
            test,
            method,
            source,
            epochs,
            zero_division,
        } => {
            let config = PipelineConfig::builder()
                .predicate_method(method)
                .argument_source(source)
                .epochs(epochs)
                .division_by_zero(zero_division)
                .build();
            info!("experiment configuration:\n {}", config);
            let experiment = run_experiment(&train, &test, &config).with_context(|| {
                format!(
                    "experiment failed on {} and {}",
                    train.display(),
                    test.display()
                )
            })?;
            for stage in &experiment.stages {
                println!("Setting: {}", stage.setting);
                print_evaluation(&stage.evaluation);
            }
            if let Some(path) = &cli.report {
                write_report(path, &experiment.stages)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse())
}
