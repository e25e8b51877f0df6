use log::{debug, info, warn};
use strum::VariantArray;

use crate::{
    algo::{Agent, AgentConfig, AgentKind, Exp},
    env::{DiscreteActionSpace, Environment},
    error::ConfigError,
    gym::{Dir, Features, ToroidalField},
};

/// Configuration for the [`Driver`]
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// Side length of the square grid
    ///
    /// **Default**: `20`
    pub grid_size: usize,
    /// Hyperparameters every agent starts with
    ///
    /// **Default**: [`AgentConfig::default`]
    pub agent: AgentConfig,
    /// Agent that is active after construction
    ///
    /// **Default**: [`AgentKind::QLearning`]
    pub initial_agent: AgentKind,
    /// Seed for the environment and, offset per agent, for the agents' exploration
    ///
    /// **Default**: `None`
    pub seed: Option<u64>,
    /// Cut an episode off after this many steps without a terminal training signal
    ///
    /// **Default**: `None`
    pub max_steps_per_episode: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            agent: AgentConfig::default(),
            initial_agent: AgentKind::default(),
            seed: None,
            max_steps_per_episode: None,
        }
    }
}

/// Performance of one finished episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeSample {
    pub agent: AgentKind,
    pub score: u32,
    pub steps: u64,
    /// The episode hit the step limit instead of terminating
    pub truncated: bool,
}

/// Outcome of a single [`Driver::tick`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// The agent moved and the episode continues
    Moved { reward: f64 },
    /// Manual mode and the episode is still running
    Idle,
    /// The episode ended and the environment was reset
    ///
    /// `reward` is that of the final step, `None` if the agent did not move (manual mode).
    Finished {
        sample: EpisodeSample,
        reward: Option<f64>,
    },
}

/// Owns one environment and one agent per [`AgentKind`], of which one is active
///
/// Each call to [`tick`](Driver::tick) runs one perceive, act, learn cycle. Pacing
/// and rendering are up to the caller.
pub struct Driver {
    env: ToroidalField,
    agents: Vec<Box<dyn Agent<Features>>>,
    active: AgentKind,
    manual: bool,
    max_steps: Option<u64>,
    history: Vec<EpisodeSample>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Result<Self, ConfigError> {
        let env = match config.seed {
            Some(seed) => ToroidalField::with_seed(config.grid_size, seed)?,
            None => ToroidalField::new(config.grid_size)?,
        };

        let base_seed = config.seed.or(config.agent.seed);
        let agents = AgentKind::VARIANTS
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let agent_config = AgentConfig {
                    action_size: env.actions().len(),
                    seed: base_seed.map(|s| s.wrapping_add(i as u64 + 1)),
                    ..config.agent.clone()
                };
                kind.build::<Features>(&agent_config)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            env,
            agents,
            active: config.initial_agent,
            manual: false,
            max_steps: config.max_steps_per_episode,
            history: Vec::new(),
        })
    }

    pub fn env(&self) -> &ToroidalField {
        &self.env
    }

    pub fn active_kind(&self) -> AgentKind {
        self.active
    }

    pub fn active_agent(&self) -> &dyn Agent<Features> {
        self.agent(self.active)
    }

    pub fn agent(&self, kind: AgentKind) -> &dyn Agent<Features> {
        self.agents[kind as usize].as_ref()
    }

    fn active_agent_mut(&mut self) -> &mut dyn Agent<Features> {
        self.agents[self.active as usize].as_mut()
    }

    /// Make `kind` the active agent, its table picks up where it left off
    pub fn select_agent(&mut self, kind: AgentKind) {
        if kind != self.active {
            info!("Switching agent from {} to {}", self.active, kind);
            self.active = kind;
        }
    }

    /// **Errors** if `name` is not a known agent, leaving the active agent unchanged
    pub fn select_agent_by_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let kind = AgentKind::from_name(name)?;
        self.select_agent(kind);
        Ok(())
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    /// In manual mode ticks no longer move the snake; use [`manual_step`](Driver::manual_step)
    pub fn set_manual(&mut self, manual: bool) {
        self.manual = manual;
    }

    /// Step the environment with a chosen direction, bypassing the agent
    ///
    /// The reward is returned but nothing is learned from it.
    pub fn manual_step(&mut self, dir: Dir) -> f64 {
        self.env.step(dir)
    }

    /// Run one perceive, act, learn cycle and handle the episode boundary
    pub fn tick(&mut self) -> Tick {
        let reward = if self.manual {
            None
        } else {
            Some(self.learn_step())
        };

        let truncated = self.env.is_active()
            && self
                .max_steps
                .is_some_and(|max| self.env.episode().steps() >= max);

        if !self.env.is_active() || truncated {
            Tick::Finished {
                sample: self.finish_episode(truncated),
                reward,
            }
        } else {
            reward.map_or(Tick::Idle, |reward| Tick::Moved { reward })
        }
    }

    fn learn_step(&mut self) -> f64 {
        let state = self.env.get_state();
        let action = self.active_agent_mut().get_action(state);
        let dir = self
            .env
            .action_from_index(action)
            .expect("agents choose among the environment's actions");
        let reward = self.env.step(dir);

        let next_state = self.env.get_state();
        let done = !self.env.is_active();
        let agent = self.active_agent_mut();
        let next_action = agent.get_action(next_state);
        agent.train(Exp {
            state,
            action,
            reward,
            next_state,
            next_action,
            done,
        });
        reward
    }

    fn finish_episode(&mut self, truncated: bool) -> EpisodeSample {
        let episode = self.env.episode();
        let sample = EpisodeSample {
            agent: self.active,
            score: episode.score(),
            steps: episode.steps(),
            truncated,
        };
        debug!(
            "Episode {} ({}): score {}, steps {}, epsilon {:.4}{}",
            self.history.len(),
            sample.agent,
            sample.score,
            sample.steps,
            self.active_agent().epsilon(),
            if truncated { ", truncated" } else { "" },
        );
        self.history.push(sample);
        self.env.reset();
        sample
    }

    /// Tick until the current episode ends
    ///
    /// **Returns** `None` in manual mode, where ticks cannot end an episode by themselves
    pub fn run_episode(&mut self) -> Option<EpisodeSample> {
        if self.manual {
            return None;
        }
        loop {
            if let Tick::Finished { sample, .. } = self.tick() {
                return Some(sample);
            }
        }
    }

    /// Start a new episode without recording the current one
    pub fn reset(&mut self) -> Features {
        self.env.reset()
    }

    /// Every finished episode, oldest first
    pub fn history(&self) -> &[EpisodeSample] {
        &self.history
    }

    /// Mean score of each complete block of `block` consecutive episodes
    pub fn block_means(&self, block: usize) -> Vec<f64> {
        if block == 0 {
            return Vec::new();
        }
        self.history
            .chunks_exact(block)
            .map(|chunk| chunk.iter().map(|s| s.score as f64).sum::<f64>() / block as f64)
            .collect()
    }

    /// The active agent's action values for the current state, `None` if it has not been seen
    pub fn current_q_values(&self) -> Option<&[f64]> {
        self.active_agent().q_values(&self.env.get_state())
    }

    /// **Errors** if `learning_rate` is not in `(0,1)`, keeping the previous value
    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<(), ConfigError> {
        self.active_agent_mut()
            .set_learning_rate(learning_rate)
            .inspect_err(|e| warn!("Ignoring learning rate edit: {e}"))
    }

    /// **Errors** if `gamma` is not in `(0,1)`, keeping the previous value
    pub fn set_gamma(&mut self, gamma: f64) -> Result<(), ConfigError> {
        self.active_agent_mut()
            .set_gamma(gamma)
            .inspect_err(|e| warn!("Ignoring gamma edit: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(grid_size: usize, seed: u64) -> Driver {
        Driver::new(DriverConfig {
            grid_size,
            seed: Some(seed),
            max_steps_per_episode: Some(1_000),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn tick_learns_into_active_agent_only() {
        let mut driver = driver(8, 1);
        for _ in 0..50 {
            driver.tick();
        }
        assert!(driver.agent(AgentKind::QLearning).table_len() > 0, "Active table grew");
        assert_eq!(driver.agent(AgentKind::Sarsa).table_len(), 0);
        assert_eq!(driver.agent(AgentKind::ExpectedSarsa).table_len(), 0);
    }

    #[test]
    fn switching_agents_keeps_tables_apart() {
        let mut driver = driver(8, 2);
        driver.run_episode().unwrap();
        let q_len = driver.agent(AgentKind::QLearning).table_len();

        driver.select_agent_by_name("Expected SARSA").unwrap();
        assert_eq!(driver.active_kind(), AgentKind::ExpectedSarsa);
        let sample = driver.run_episode().unwrap();
        assert_eq!(sample.agent, AgentKind::ExpectedSarsa);
        assert!(driver.agent(AgentKind::ExpectedSarsa).table_len() > 0);
        assert_eq!(driver.agent(AgentKind::QLearning).table_len(), q_len);

        assert!(driver.select_agent_by_name("TD(lambda)").is_err());
        assert_eq!(driver.active_kind(), AgentKind::ExpectedSarsa, "Unknown name is ignored");
    }

    #[test]
    fn finished_episodes_are_recorded_and_reset() {
        let mut driver = driver(6, 3);
        for _ in 0..10 {
            let sample = driver.run_episode().unwrap();
            assert_eq!(driver.history().last(), Some(&sample));
            assert_eq!(driver.env().episode().steps(), 0, "Environment was reset");
            assert!(driver.env().is_active());
        }
        assert_eq!(driver.history().len(), 10);
        assert!(driver.active_agent().epsilon() < 0.9, "Terminal updates decayed epsilon");
    }

    #[test]
    fn finishing_tick_carries_the_last_reward() {
        let mut driver = driver(6, 8);
        let mut finished = 0;
        while finished < 5 {
            if let Tick::Finished { sample, reward } = driver.tick() {
                finished += 1;
                let reward = reward.unwrap();
                if !sample.truncated {
                    assert!(
                        reward == -10.0 || reward == 10.0,
                        "Episodes end on a collision or a full board, got {reward}"
                    );
                }
            }
        }
    }

    #[test]
    fn reset_discards_the_running_episode() {
        let mut driver = driver(8, 10);
        driver.run_episode().unwrap();
        while driver.env().episode().steps() < 2 {
            driver.tick();
        }
        let history = driver.history().to_vec();

        let state = driver.reset();
        assert_eq!(driver.history(), history, "No sample recorded");
        assert_eq!(driver.env().episode().steps(), 0);
        assert_eq!(driver.env().episode().score(), 0);
        assert!(driver.env().is_active());
        assert_eq!(state, driver.env().get_state());
    }

    #[test]
    fn manual_mode_bypasses_the_agent() {
        let mut driver = driver(6, 4);
        driver.set_manual(true);
        assert_eq!(driver.tick(), Tick::Idle);
        assert_eq!(driver.run_episode(), None);

        let dir = driver.env().episode().dir();
        let reward = driver.manual_step(dir);
        assert!(reward == -0.01 || reward == 10.0, "Going straight never collides");
        assert_eq!(driver.env().episode().steps(), 1);
        assert_eq!(driver.active_agent().table_len(), 0, "Nothing was learned");
        assert_eq!(driver.history().len(), 0);

        // grow once so that reversing hits the body
        while driver.env().episode().snake().len() == 1 {
            let head = driver.env().episode().snake().head();
            let food = driver.env().episode().food().unwrap();
            let dir = if food.0 != head.0 { Dir::Down } else { Dir::Right };
            driver.manual_step(dir);
        }
        let reverse = driver.env().episode().dir().clockwise().clockwise();
        assert_eq!(driver.manual_step(reverse), -10.0);
        assert!(matches!(
            driver.tick(),
            Tick::Finished { sample, reward: None } if !sample.truncated
        ));
        assert_eq!(driver.history().len(), 1);
    }

    #[test]
    fn hyperparameter_edits_apply_to_active_agent() {
        let mut driver = driver(6, 5);
        assert!(driver.set_learning_rate(1.5).is_err());
        assert!(driver.set_gamma(0.0).is_err());
        assert_eq!(driver.active_agent().learning_rate(), 0.1, "Rejected edit ignored");
        assert_eq!(driver.active_agent().gamma(), 0.9, "Rejected edit ignored");

        driver.set_learning_rate(0.3).unwrap();
        driver.set_gamma(0.8).unwrap();
        assert_eq!(driver.active_agent().learning_rate(), 0.3);
        assert_eq!(driver.agent(AgentKind::Sarsa).learning_rate(), 0.1, "Other agents untouched");
    }

    #[test]
    fn q_values_of_current_state() {
        let mut driver = driver(6, 6);
        assert_eq!(driver.current_q_values(), None, "Unseen before any action");
        driver.tick();
        if driver.env().is_active() {
            assert_eq!(driver.current_q_values().map(<[f64]>::len), Some(4));
        }
    }

    #[test]
    fn truncation_ends_looping_episodes() {
        let mut driver = Driver::new(DriverConfig {
            grid_size: 10,
            seed: Some(7),
            max_steps_per_episode: Some(3),
            ..Default::default()
        })
        .unwrap();
        for _ in 0..20 {
            let sample = driver.run_episode().unwrap();
            assert!(sample.steps <= 3);
            if sample.truncated {
                assert_eq!(sample.steps, 3);
            }
        }
        assert!(driver.history().iter().any(|s| s.truncated));
    }

    #[test]
    fn seeded_drivers_are_reproducible() {
        let run = |seed| {
            let mut driver = driver(6, seed);
            (0..20).map(|_| driver.run_episode().unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn rejects_tiny_grid() {
        let result = Driver::new(DriverConfig {
            grid_size: 1,
            ..Default::default()
        });
        assert_eq!(result.err(), Some(ConfigError::GridTooSmall(1)));
    }

    #[test]
    fn q_learning_improves_with_training() {
        use statrs::statistics::Statistics;

        let mut driver = driver(6, 2024);
        for _ in 0..2000 {
            driver.run_episode().unwrap();
        }

        let means = driver.block_means(100);
        assert_eq!(means.len(), 20);

        let first = means[0];
        let late = means[15..].iter().mean();
        assert!(
            late > first * 5.0,
            "Late blocks ({late}) are well above the first block ({first})"
        );

        let mut best = f64::NEG_INFINITY;
        for (i, &mean) in means.iter().enumerate() {
            assert!(
                mean >= best - 3.0,
                "Block {i} mean {mean} fell far below the best so far {best}"
            );
            best = best.max(mean);
        }
    }
}
