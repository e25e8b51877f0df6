use std::collections::{HashSet, VecDeque};

use log::warn;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use strum::{EnumIter, FromRepr, VariantArray};

use crate::{
    env::{DiscreteActionSpace, Environment},
    error::ConfigError,
};

/// Grid coordinates `(row, col)`
pub type Pos = (usize, usize);

/// Number of entries in a [`Features`] vector
pub const NUM_FEATURES: usize = 11;

/// Binary state abstraction used as the learning state
///
/// `[danger_straight, danger_right, danger_left, dir_left, dir_right, dir_up, dir_down, food_left, food_right, food_up, food_down]`
pub type Features = [u8; NUM_FEATURES];

pub const FOOD_REWARD: f64 = 10.0;
pub const COLLISION_REWARD: f64 = -10.0;
pub const STEP_REWARD: f64 = -0.01;

/// Heading of the snake, discriminants double as action indices
#[derive(EnumIter, VariantArray, FromRepr, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Dir {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Dir {
    /// The heading after a right turn
    pub fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// The heading after a left turn
    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
        }
    }
}

/// Snake body, head first
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    body: VecDeque<Pos>,
    dir: Dir,
}

impl Snake {
    fn new(head: Pos, dir: Dir) -> Self {
        Self {
            body: VecDeque::from([head]),
            dir,
        }
    }

    fn is_intersecting(&self) -> bool {
        let mut uniq = HashSet::new();
        self.body.iter().any(move |x| !uniq.insert(x))
    }

    pub fn head(&self) -> Pos {
        *self.body.front().expect("body is not empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    pub fn contains(&self, pos: &Pos) -> bool {
        self.body.contains(pos)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Pos> {
        self.body.iter()
    }
}

/// Everything that changes over the course of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    snake: Snake,
    food: Option<Pos>,
    score: u32,
    steps: u64,
    terminated: bool,
}

impl EpisodeState {
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    /// Current food cell, `None` only once the snake fills the whole grid
    pub fn food(&self) -> Option<Pos> {
        self.food
    }

    pub fn dir(&self) -> Dir {
        self.snake.dir
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }
}

/// A wrap-around field for the game of snake
///
/// Moving off one edge re-enters from the opposite edge, so the only way to
/// lose is to run into the snake's own body.
pub struct ToroidalField {
    size: usize,
    episode: EpisodeState,
    rng: StdRng,
}

impl ToroidalField {
    /// Create a field of `size * size` cells seeded from system entropy
    ///
    /// **Errors** if `size` is smaller than 2
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        Self::from_rng(size, StdRng::from_entropy())
    }

    /// Create a field whose initial directions and food placements are reproducible
    pub fn with_seed(size: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::from_rng(size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(size: usize, mut rng: StdRng) -> Result<Self, ConfigError> {
        if size < 2 {
            return Err(ConfigError::GridTooSmall(size));
        }
        let episode = Self::initial_episode(size, &mut rng);
        Ok(Self { size, episode, rng })
    }

    fn initial_episode(size: usize, rng: &mut StdRng) -> EpisodeState {
        let dir = *Dir::VARIANTS.choose(rng).expect("there are four directions");
        let snake = Snake::new((size / 2, size / 2), dir);
        let food = spawn_food(rng, &snake, size);
        EpisodeState {
            snake,
            food,
            score: 0,
            steps: 0,
            terminated: false,
        }
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub fn episode(&self) -> &EpisodeState {
        &self.episode
    }

    /// Whether `pos` is off the grid or on the snake
    pub fn is_collision(&self, pos: Pos) -> bool {
        !self.is_in_bounds(pos) || self.episode.snake.contains(&pos)
    }

    fn is_in_bounds(&self, pos: Pos) -> bool {
        pos.0 < self.size && pos.1 < self.size
    }
}

impl Environment for ToroidalField {
    type State = Features;
    type Action = Dir;

    fn is_active(&self) -> bool {
        !self.episode.terminated
    }

    fn reset(&mut self) -> Self::State {
        self.episode = Self::initial_episode(self.size, &mut self.rng);
        self.get_state()
    }

    fn step(&mut self, action: Self::Action) -> f64 {
        let episode = &mut self.episode;
        episode.snake.dir = action;
        let new_head = step_dir(episode.snake.head(), action, self.size);
        episode.steps += 1;

        if episode.snake.contains(&new_head) {
            episode.terminated = true;
            return COLLISION_REWARD;
        }

        episode.snake.body.push_front(new_head);
        let reward = if episode.food == Some(new_head) {
            episode.score += 1;
            episode.food = spawn_food(&mut self.rng, &episode.snake, self.size);
            assert!(
                episode.food.map_or(true, |food| !episode.snake.contains(&food)),
                "food spawned on the snake"
            );
            if episode.food.is_none() {
                warn!("Snake fills all {} cells, ending episode", self.size.pow(2));
                episode.terminated = true;
            }
            FOOD_REWARD
        } else {
            episode.snake.body.pop_back();
            STEP_REWARD
        };

        // O(len) check, debug builds only
        debug_assert!(
            !episode.snake.is_intersecting(),
            "snake body overlaps itself outside of a collision"
        );
        reward
    }

    fn get_state(&self) -> Self::State {
        let snake = &self.episode.snake;
        let head = snake.head();
        let dir = snake.dir;
        let danger = |d: Dir| self.is_collision(step_dir(head, d, self.size));

        let (food_left, food_right, food_up, food_down) = match self.episode.food {
            Some(food) => (
                food.1 < head.1,
                food.1 > head.1,
                food.0 < head.0,
                food.0 > head.0,
            ),
            None => (false, false, false, false),
        };

        [
            danger(dir),
            danger(dir.clockwise()),
            danger(dir.counter_clockwise()),
            dir == Dir::Left,
            dir == Dir::Right,
            dir == Dir::Up,
            dir == Dir::Down,
            food_left,
            food_right,
            food_up,
            food_down,
        ]
        .map(u8::from)
    }
}

impl DiscreteActionSpace for ToroidalField {
    fn actions(&self) -> Vec<Self::Action> {
        Dir::VARIANTS.to_vec()
    }

    fn action_from_index(&self, index: usize) -> Option<Self::Action> {
        Dir::from_repr(index)
    }
}

/// Rejection-sample a free cell, `None` if the snake covers the grid
fn spawn_food(rng: &mut StdRng, snake: &Snake, size: usize) -> Option<Pos> {
    if snake.len() >= size * size {
        return None;
    }
    loop {
        let pos = (rng.gen_range(0..size), rng.gen_range(0..size));
        if !snake.contains(&pos) {
            return Some(pos);
        }
    }
}

/// Move one cell in `dir`, wrapping on the moving axis
fn step_dir(pos: Pos, dir: Dir, size: usize) -> Pos {
    let (row, col) = pos;
    match dir {
        Dir::Up => ((row + size - 1) % size, col),
        Dir::Right => (row, (col + 1) % size),
        Dir::Down => ((row + 1) % size, col),
        Dir::Left => (row, (col + size - 1) % size),
    }
}
