//! Zero-indexed time series used for every per-compartment trajectory, index `0`
//! holds the initial condition and index `i + 1` is produced from index `i`.

use std::ops::{Index, IndexMut};
use ndarray::Array1;
pub use trajectory_traits::Trajectories;


/// A fixed horizon trajectory of a single state variable
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Array1<f64>,
}

impl TimeSeries {
    /// Allocates a zero filled time series with `len` entries
    pub fn zeros(len: usize) -> Self {
        TimeSeries { values: Array1::zeros(len) }
    }

    /// Allocates a zero filled time series with `len` entries and writes
    /// `initial` to index `0`
    pub fn with_initial(len: usize, initial: f64) -> Self {
        let mut series = TimeSeries::zeros(len);
        if len > 0 {
            series.values[0] = initial;
        }

        series
    }

    /// Number of entries (steps plus one)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns if the time series has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bounds checked access, `None` when `i` is past the horizon
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    /// Reads the value `delay` steps before `i`, `None` if that index
    /// would be before the start of the trajectory
    pub fn delayed(&self, i: usize, delay: usize) -> Option<f64> {
        i.checked_sub(delay).and_then(|index| self.get(index))
    }

    /// Initial condition
    pub fn initial(&self) -> f64 {
        self.values[0]
    }

    /// Last entry of the trajectory
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterates over every entry in order
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Largest entry within `start..end` (clamped to the horizon)
    pub fn max_in(&self, start: usize, end: usize) -> Option<f64> {
        let end = end.min(self.len());
        if start >= end {
            return None;
        }

        self.values.slice(ndarray::s![start..end])
            .iter()
            .copied()
            .max_by(|a, b| a.total_cmp(b))
    }
}

impl Index<usize> for TimeSeries {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.values[i]
    }
}

impl IndexMut<usize> for TimeSeries {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.values[i]
    }
}

/// Lists the trajectories of a component by name, use the
/// `#[derive(Trajectories)]` macro to generate the implementation
pub trait Trajectories {
    fn trajectories(&self) -> Vec<(String, &TimeSeries)>;
}

/// Heaviside step, `0` below zero and `1` at or above it
pub fn heaviside(x: f64) -> f64 {
    if x >= 0. {
        1.
    } else {
        0.
    }
}

/// Number of steps a delay line lags behind, `(pad + 1) / dt` where `pad` is in ms
pub fn delay_steps(pad: f64, dt: f64) -> usize {
    ((pad + 1.) / dt).round() as usize
}
