//! Construction options for `ChainedHashMap`.

/// Number of slots a table starts with when none is given.
pub const DEFAULT_CAPACITY: usize = 100;

/// Growth threshold used when none is given or the given one is invalid.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Capacity and load-factor settings, normalised on use.
///
/// Setters store what they are given; `ChainedHashMap` reads the values
/// through [`Config::effective_capacity`] and
/// [`Config::effective_load_factor`], so a bad load factor never reaches the
/// table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    capacity: usize,
    load_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl Config {
    pub fn new(capacity: usize, load_factor: f64) -> Self {
        Self {
            capacity,
            load_factor,
        }
    }

    /// Initial slot count.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Growth threshold in (0.0, 1.0].
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Slot count the table is built with; a table always has one slot.
    pub fn effective_capacity(&self) -> usize {
        self.capacity.max(1)
    }

    /// The configured load factor, or [`DEFAULT_LOAD_FACTOR`] when it lies
    /// outside (0.0, 1.0]. NaN also falls back.
    pub fn effective_load_factor(&self) -> f64 {
        if self.load_factor > 0.0 && self.load_factor <= 1.0 {
            self.load_factor
        } else {
            log::trace!(
                "load factor {} outside (0, 1], using {}",
                self.load_factor,
                DEFAULT_LOAD_FACTOR
            );
            DEFAULT_LOAD_FACTOR
        }
    }
}
