pub mod q_table;
pub mod td;

use strum::{AsRefStr, Display, EnumIter, EnumString, VariantArray};

use crate::{error::ConfigError, exploration::EpsilonGreedy, gym::toroidal_field::NUM_FEATURES};

pub use q_table::QTable;
pub use td::{
    ExpectedSarsa, ExpectedSarsaAgent, QLearning, QLearningAgent, Sarsa, SarsaAgent, TdAgent,
    TdTarget,
};

/// A trait for state types that can be used as keys in a [`HashMap`](std::collections::HashMap)
pub trait Hashable: Copy + Eq + std::hash::Hash {}

impl<T> Hashable for T where T: Copy + Eq + std::hash::Hash {}

/// A single on-policy transition, including the action chosen in the next state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exp<S> {
    /// The state before taking the action
    pub state: S,
    /// The index of the action taken in `state`
    pub action: usize,
    /// The reward received for the action
    pub reward: f64,
    /// The state after taking the action
    pub next_state: S,
    /// The index of the action selected in `next_state`
    pub next_action: usize,
    /// Whether the action ended the episode
    pub done: bool,
}

/// A learning agent over discrete action indices
///
/// Implementations own their table exclusively, so switching agents never moves
/// learned values between them.
pub trait Agent<S> {
    /// Which update rule this agent learns with
    fn kind(&self) -> AgentKind;

    /// Choose an action index for `state` with the exploration policy
    ///
    /// Unseen states are added to the table with zeroed values, so this grows the table even without learning.
    fn get_action(&mut self, state: S) -> usize;

    /// Update the value of `(exp.state, exp.action)` and decay epsilon at the end of an episode
    fn train(&mut self, exp: Exp<S>);

    /// Current action values for `state`, `None` if the state has never been seen
    fn q_values(&self, state: &S) -> Option<&[f64]>;

    /// Number of distinct states in the table
    fn table_len(&self) -> usize;

    fn learning_rate(&self) -> f64;

    /// **Errors** if `learning_rate` is not in the interval `(0,1)`, keeping the previous value
    fn set_learning_rate(&mut self, learning_rate: f64) -> Result<(), ConfigError>;

    fn gamma(&self) -> f64;

    /// **Errors** if `gamma` is not in the interval `(0,1)`, keeping the previous value
    fn set_gamma(&mut self, gamma: f64) -> Result<(), ConfigError>;

    fn exploration(&self) -> &EpsilonGreedy;

    fn exploration_mut(&mut self) -> &mut EpsilonGreedy;

    fn epsilon(&self) -> f64 {
        self.exploration().epsilon()
    }
}

/// The available temporal-difference update rules, by display name
#[derive(
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    VariantArray,
    Default,
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
)]
pub enum AgentKind {
    #[default]
    #[strum(serialize = "Q-Learning")]
    QLearning,
    #[strum(serialize = "SARSA")]
    Sarsa,
    #[strum(serialize = "Expected SARSA")]
    ExpectedSarsa,
}

impl AgentKind {
    /// Look up an agent kind by its display name
    ///
    /// **Errors** if the name is not one of "Q-Learning", "SARSA", "Expected SARSA"
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        name.parse().map_err(|_| ConfigError::UnknownAgent(name.to_string()))
    }

    /// Construct a fresh agent of this kind with an empty table
    pub fn build<S: Hashable + 'static>(
        self,
        config: &AgentConfig,
    ) -> Result<Box<dyn Agent<S>>, ConfigError> {
        let agent: Box<dyn Agent<S>> = match self {
            Self::QLearning => Box::new(QLearningAgent::new(config)?),
            Self::Sarsa => Box::new(SarsaAgent::new(config)?),
            Self::ExpectedSarsa => Box::new(ExpectedSarsaAgent::new(config)?),
        };
        Ok(agent)
    }
}

/// Configuration shared by the tabular TD agents
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Length of the feature vector used as the state
    ///
    /// **Default**: `11`
    pub state_size: usize,
    /// Number of actions
    ///
    /// **Default**: `4`
    pub action_size: usize,
    /// Step size of the TD update, must be in `(0,1)`
    ///
    /// **Default**: `0.1`
    pub learning_rate: f64,
    /// Discount factor, must be in `(0,1)`
    ///
    /// **Default**: `0.9`
    pub gamma: f64,
    /// Initial exploration probability
    ///
    /// **Default**: `0.9`
    pub epsilon: f64,
    /// Floor for the exploration probability
    ///
    /// **Default**: `0.01`
    pub epsilon_min: f64,
    /// Factor applied to epsilon at the end of every episode
    ///
    /// **Default**: `0.995`
    pub epsilon_decay: f64,
    /// Seed for the exploration RNG, `None` draws from system entropy
    ///
    /// **Default**: `None`
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            state_size: NUM_FEATURES,
            action_size: 4,
            learning_rate: 0.1,
            gamma: 0.9,
            epsilon: 0.9,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn agent_kinds_by_name() {
        assert_eq!(AgentKind::from_name("Q-Learning"), Ok(AgentKind::QLearning));
        assert_eq!(AgentKind::from_name("SARSA"), Ok(AgentKind::Sarsa));
        assert_eq!(
            AgentKind::from_name("Expected SARSA"),
            Ok(AgentKind::ExpectedSarsa)
        );
        assert_eq!(
            AgentKind::from_name("Double Q"),
            Err(ConfigError::UnknownAgent(String::from("Double Q")))
        );

        for kind in AgentKind::iter() {
            assert_eq!(AgentKind::from_name(&kind.to_string()), Ok(kind), "Names round trip");
        }
    }

    #[test]
    fn built_agents_report_their_kind() {
        let config = AgentConfig::default().with_seed(0);
        for kind in AgentKind::iter() {
            let agent = kind.build::<[u8; 2]>(&config).unwrap();
            assert_eq!(agent.kind(), kind);
            assert_eq!(agent.table_len(), 0, "Table starts empty");
            assert_eq!(agent.epsilon(), 0.9);
        }
    }

    #[test]
    fn build_rejects_bad_config() {
        let config = AgentConfig {
            gamma: 1.0,
            ..Default::default()
        };
        assert!(AgentKind::Sarsa.build::<u8>(&config).is_err());
    }
}
