use thiserror::Error;

/// Rejected configuration values
///
/// A rejected edit leaves the previous value in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for `{name}`: {value}. Must be in the interval {bounds}.")]
    OutOfInterval {
        name: &'static str,
        value: f64,
        bounds: String,
    },
    #[error("Unknown agent `{0}`. Expected one of \"Q-Learning\", \"SARSA\", \"Expected SARSA\".")]
    UnknownAgent(String),
    #[error("An agent needs at least one action.")]
    NoActions,
    #[error("Grid size {0} is too small. Must be at least 2.")]
    GridTooSmall(usize),
}
