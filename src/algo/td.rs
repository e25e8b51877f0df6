use std::marker::PhantomData;

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    check_interval,
    error::ConfigError,
    exploration::{Choice, EpsilonGreedy},
};

use super::{
    q_table::{argmax, max_value},
    Agent, AgentConfig, AgentKind, Exp, Hashable, QTable,
};

/// The bootstrapped part of a one-step TD target
///
/// The full target is `reward + gamma * next_value(...)`.
pub trait TdTarget {
    const KIND: AgentKind;

    /// Estimate the value of the next state from its action values
    fn next_value(next_q: &[f64], next_action: usize, epsilon: f64) -> f64;
}

/// Off-policy: bootstrap from the greedy action
#[derive(Debug, Clone, Copy, Default)]
pub struct QLearning;

impl TdTarget for QLearning {
    const KIND: AgentKind = AgentKind::QLearning;

    fn next_value(next_q: &[f64], _next_action: usize, _epsilon: f64) -> f64 {
        max_value(next_q)
    }
}

/// On-policy: bootstrap from the action actually selected next
#[derive(Debug, Clone, Copy, Default)]
pub struct Sarsa;

impl TdTarget for Sarsa {
    const KIND: AgentKind = AgentKind::Sarsa;

    fn next_value(next_q: &[f64], next_action: usize, _epsilon: f64) -> f64 {
        next_q[next_action]
    }
}

/// Bootstrap from the expectation under the epsilon-greedy policy
///
/// Every action tied for the maximum receives the full greedy share `1 - epsilon`
/// on top of `epsilon / n`, so with ties the weights sum to more than one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedSarsa;

impl TdTarget for ExpectedSarsa {
    const KIND: AgentKind = AgentKind::ExpectedSarsa;

    fn next_value(next_q: &[f64], _next_action: usize, epsilon: f64) -> f64 {
        let max = max_value(next_q);
        let explore = epsilon / next_q.len() as f64;
        next_q
            .iter()
            .map(|&q| {
                let greedy = if q == max { 1.0 - epsilon } else { 0.0 };
                q * (explore + greedy)
            })
            .sum()
    }
}

pub type QLearningAgent<S> = TdAgent<QLearning, S>;
pub type SarsaAgent<S> = TdAgent<Sarsa, S>;
pub type ExpectedSarsaAgent<S> = TdAgent<ExpectedSarsa, S>;

/// A tabular one-step temporal-difference agent
///
/// The three variants share action selection and the update
///
/// Q(s,a) ← Q(s,a) + α(target - Q(s,a))
///
/// and differ only in how the [target](TdTarget) bootstraps from the next state.
///
/// ### Generics
/// - `R` - The [`TdTarget`] rule
/// - `S` - The state type, compared and hashed by value
pub struct TdAgent<R: TdTarget, S: Hashable> {
    table: QTable<S>,
    exploration: EpsilonGreedy,
    learning_rate: f64,
    gamma: f64,
    state_size: usize,
    rng: StdRng,
    rule: PhantomData<R>,
}

impl<R: TdTarget, S: Hashable> TdAgent<R, S> {
    /// Initialize a new agent with an empty table
    ///
    /// **Errors** if `learning_rate` or `gamma` is not in `(0,1)`, if any epsilon
    /// parameter is not in `[0,1]`, or if there are no actions
    pub fn new(config: &AgentConfig) -> Result<Self, ConfigError> {
        check_interval!(config.learning_rate, open 0.0, 1.0)?;
        check_interval!(config.gamma, open 0.0, 1.0)?;
        if config.action_size == 0 {
            return Err(ConfigError::NoActions);
        }
        let exploration = EpsilonGreedy::new(
            config.epsilon,
            config.epsilon_min,
            config.epsilon_decay,
        )?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            table: QTable::new(config.action_size),
            exploration,
            learning_rate: config.learning_rate,
            gamma: config.gamma,
            state_size: config.state_size,
            rng,
            rule: PhantomData,
        })
    }

    pub fn table(&self) -> &QTable<S> {
        &self.table
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn action_size(&self) -> usize {
        self.table.action_size()
    }

    /// The TD target for `exp` without applying it
    ///
    /// Missing rows are read as zeros.
    pub fn target(&self, exp: &Exp<S>) -> f64 {
        let zeros = vec![0.0; self.table.action_size()];
        let next_q = self.table.get(&exp.next_state).unwrap_or(&zeros);
        exp.reward
            + self.gamma * R::next_value(next_q, exp.next_action, self.exploration.epsilon())
    }
}

impl<R: TdTarget, S: Hashable> Agent<S> for TdAgent<R, S> {
    fn kind(&self) -> AgentKind {
        R::KIND
    }

    fn get_action(&mut self, state: S) -> usize {
        let row = self.table.row_mut(state);
        match self.exploration.choose(&mut self.rng) {
            Choice::Explore => self.rng.gen_range(0..row.len()),
            Choice::Exploit => argmax(row),
        }
    }

    fn train(&mut self, exp: Exp<S>) {
        self.table.row_mut(exp.state);
        self.table.row_mut(exp.next_state);

        let target = self.target(&exp);
        let q = &mut self.table.row_mut(exp.state)[exp.action];
        *q += self.learning_rate * (target - *q);

        if exp.done {
            self.exploration.decay();
        }
    }

    fn q_values(&self, state: &S) -> Option<&[f64]> {
        self.table.get(state)
    }

    fn table_len(&self) -> usize {
        self.table.len()
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f64) -> Result<(), ConfigError> {
        check_interval!(learning_rate, open 0.0, 1.0)?;
        info!("{}: learning rate {} -> {}", R::KIND, self.learning_rate, learning_rate);
        self.learning_rate = learning_rate;
        Ok(())
    }

    fn gamma(&self) -> f64 {
        self.gamma
    }

    fn set_gamma(&mut self, gamma: f64) -> Result<(), ConfigError> {
        check_interval!(gamma, open 0.0, 1.0)?;
        info!("{}: gamma {} -> {}", R::KIND, self.gamma, gamma);
        self.gamma = gamma;
        Ok(())
    }

    fn exploration(&self) -> &EpsilonGreedy {
        &self.exploration
    }

    fn exploration_mut(&mut self) -> &mut EpsilonGreedy {
        &mut self.exploration
    }
}
