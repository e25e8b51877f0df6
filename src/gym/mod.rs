pub mod toroidal_field;

pub use toroidal_field::{Dir, EpisodeState, Features, Pos, ToroidalField};
