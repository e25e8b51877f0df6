/// Tabular temporal-difference agents
pub mod algo;

/// Driver loop tying the environment to the agents
pub mod driver;

/// Environment
pub mod env;

/// Configuration errors
pub mod error;

/// Exploration policies
pub mod exploration;

/// Testing environments
pub mod gym;

#[doc(hidden)]
pub mod util;
