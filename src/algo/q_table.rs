use std::collections::HashMap;

use super::Hashable;

/// A sparse table of action values keyed by state
///
/// Rows are created lazily; a state that has never been touched behaves as if
/// every action had value `0.0`.
#[derive(Debug, Clone)]
pub struct QTable<S: Hashable> {
    rows: HashMap<S, Box<[f64]>>,
    action_size: usize,
}

impl<S: Hashable> QTable<S> {
    pub fn new(action_size: usize) -> Self {
        Self {
            rows: HashMap::new(),
            action_size,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_size
    }

    /// Get the row for `state`, inserting a zeroed row if it is missing
    pub fn row_mut(&mut self, state: S) -> &mut [f64] {
        let action_size = self.action_size;
        self.rows
            .entry(state)
            .or_insert_with(|| vec![0.0; action_size].into_boxed_slice())
    }

    /// Get the row for `state` without inserting
    pub fn get(&self, state: &S) -> Option<&[f64]> {
        self.rows.get(state).map(|row| &**row)
    }

    pub fn contains(&self, state: &S) -> bool {
        self.rows.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.rows.keys()
    }
}

/// Index of the largest value, ties going to the lowest index
///
/// **Panics** if `values` is empty
pub fn argmax(values: &[f64]) -> usize {
    assert!(!values.is_empty(), "argmax of an empty row");
    values
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, values[0]), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

/// Largest value in a row
pub fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
