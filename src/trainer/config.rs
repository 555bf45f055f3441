use serde::{Deserialize, Serialize};

use crate::{Error, Result, SequenceCriterion};

/// Where the target order is applied with respect to the ordering transform.
///
/// The ordering transform acts on every row independently, hence both strategies yield the same
/// loss and the same gradients up to rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Transforms the encodings in batch order, then arranges the transformed rows in target
    /// order. Their gradient is restored to batch order before the ordering transform's backward
    /// pass.
    TransformThenPermute,
    /// Arranges the encodings in target order, then transforms them. The gradient of the
    /// transform's input is restored to batch order before reaching the encoder.
    #[default]
    PermuteThenTransform,
}

/// Settings of a [`VectorImageOrderer`](super::VectorImageOrderer).
///
/// ```
/// use image_orderer::{trainer::{Strategy, TrainerConfig}, SequenceCriterion};
///
/// # fn main() -> image_orderer::Result<()> {
/// let json = r#"{ "vector_size": 8, "strategy": "transform_then_permute" }"#;
/// let config = TrainerConfig::from_json(json)?;
///
/// assert_eq!(config.vector_size, 8);
/// assert_eq!(config.strategy, Strategy::TransformThenPermute);
/// assert_eq!(config.criterion, SequenceCriterion::Curvature);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    /// Length of the encodings. Must be even and positive.
    pub vector_size: usize,
    /// Gradient descent step size.
    pub learning_rate: f64,
    /// Where the target order is applied.
    pub strategy: Strategy,
    /// Loss evaluated on the anchored sequence.
    pub criterion: SequenceCriterion,
    /// Seed of the parameters' initialization.
    pub seed: u64,
    /// Number of iterations between two progress reports.
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            vector_size: 64,
            learning_rate: 1e-3,
            strategy: Strategy::default(),
            criterion: SequenceCriterion::default(),
            seed: 0,
            log_every: 100,
        }
    }
}

impl TrainerConfig {
    /// Sets the length of the encodings.
    pub fn with_vector_size(mut self, vector_size: usize) -> Self {
        self.vector_size = vector_size;
        self
    }

    /// Sets the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the loss criterion.
    pub fn with_criterion(mut self, criterion: SequenceCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the progress reporting cadence.
    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    /// Checks that every setting is in range.
    pub fn validate(&self) -> Result<()> {
        if self.vector_size == 0 || self.vector_size % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "vector size must be even and positive, got {}",
                self.vector_size
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0. {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        if self.log_every == 0 {
            return Err(Error::InvalidConfig("log_every must be positive".to_string()));
        }

        Ok(())
    }

    /// Parses and validates a JSON configuration. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }
}
