use rand::Rng;

use crate::{check_interval, error::ConfigError};

use super::Choice;

/// Epsilon greedy exploration policy with a multiplicative, floored epsilon schedule
///
/// Epsilon only moves when [`decay`](EpsilonGreedy::decay) is called, which the
/// tabular agents do once per finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
    min: f64,
    decay: f64,
}

impl EpsilonGreedy {
    /// Initialize epsilon greedy policy from a starting epsilon, its floor, and the per-episode decay factor
    ///
    /// **Errors** if any of the values is not in the interval `[0,1]`
    pub fn new(epsilon: f64, min: f64, decay: f64) -> Result<Self, ConfigError> {
        check_interval!(epsilon, closed 0.0, 1.0)?;
        check_interval!(min, closed 0.0, 1.0)?;
        check_interval!(decay, closed 0.0, 1.0)?;
        Ok(Self {
            epsilon,
            min,
            decay,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay
    }

    /// Invoke epsilon greedy policy with the current epsilon
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f64>() > self.epsilon {
            Choice::Exploit
        } else {
            Choice::Explore
        }
    }

    /// `epsilon = max(min, epsilon * decay)`
    pub fn decay(&mut self) {
        self.epsilon = self.min.max(self.epsilon * self.decay);
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<(), ConfigError> {
        check_interval!(epsilon, closed 0.0, 1.0)?;
        self.epsilon = epsilon;
        Ok(())
    }

    pub fn set_min(&mut self, min: f64) -> Result<(), ConfigError> {
        check_interval!(min, closed 0.0, 1.0)?;
        self.min = min;
        Ok(())
    }

    pub fn set_decay_factor(&mut self, decay: f64) -> Result<(), ConfigError> {
        check_interval!(decay, closed 0.0, 1.0)?;
        self.decay = decay;
        Ok(())
    }
}
