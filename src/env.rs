/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent.
/// Stepping only yields the reward; the next state is read with [`get_state`](Environment::get_state).
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Determine if the episode is still running or has reached a terminal state
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action, producing the associated reward
    fn step(&mut self, action: Self::Action) -> f64;

    /// Observe the current state without side effects
    fn get_state(&self) -> Self::State;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;
}

/// An environment with a finite, fixed set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions, ordered by action index
    ///
    /// The returned vector should never be empty.
    fn actions(&self) -> Vec<Self::Action>;

    /// Map an action index produced by an agent back to an action
    fn action_from_index(&self, index: usize) -> Option<Self::Action>;
}
