/*
 * This modules contains the `PipelineConfig` struct, which implements the default trait, and its
 * builder. The config gathers the parameters shared by the file-level stages of the pipeline.
*/
use crate::classifier::DEFAULT_EPOCHS;
use crate::expander::ArgumentSource;
use crate::metrics::DivByZeroStrat;
use crate::predicate::PredicateMethod;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// Config struct used to simplify the inputs of parameters to the pipeline stages. It implements
/// the default trait.
pub struct PipelineConfig {
    /// How predicates are identified.
    pub predicate_method: PredicateMethod,
    /// Where the predicted arguments of predicates found by both the gold annotation and the
    /// prediction come from.
    pub argument_source: ArgumentSource,
    /// What to do when we encounter a division by zero when computing precision and recall. The
    /// most common solution is to replace the results by 0.
    pub zero_division: DivByZeroStrat,
    /// Number of passes over the training features.
    pub epochs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            predicate_method: PredicateMethod::Rule,
            argument_source: ArgumentSource::Rule,
            zero_division: DivByZeroStrat::ReplaceBy0,
            epochs: DEFAULT_EPOCHS,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

impl Display for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Predicate identification: {}\n Argument source: {}\n Strategy when encountering a division by zero: {:?}\n Training epochs: {}",
            self.predicate_method, self.argument_source, self.zero_division, self.epochs
        )
    }
}

impl From<PipelineConfigBuilder> for PipelineConfig {
    fn from(value: PipelineConfigBuilder) -> Self {
        value.config
    }
}

/// This builder can be used to build and customize a `PipelineConfig` stucture.
#[derive(Clone, Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn predicate_method(mut self, method: PredicateMethod) -> Self {
        self.config.predicate_method = method;
        self
    }
    pub fn argument_source(mut self, source: ArgumentSource) -> Self {
        self.config.argument_source = source;
        self
    }
    pub fn division_by_zero(mut self, division_by_zero: DivByZeroStrat) -> Self {
        self.config.zero_division = division_by_zero;
        self
    }
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.config.epochs = epochs;
        self
    }
    pub fn build(self) -> PipelineConfig {
        PipelineConfig::from(self)
    }
}
