//! Counters Module
//!
//! Fixed, enumerated accumulators shared by the device controller and the
//! indexes.
//!
//! ## Model
//! - Raw counters are either elapsed time (`f64` seconds) or counts (`u64`)
//! - Derived counters (averages, grand totals) hold no state of their own;
//!   they are computed from raw counters at read time
//! - Each subsystem declares its own counter enum implementing [`CounterId`]

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Value of a single counter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CounterValue {
    /// Elapsed simulated time in seconds
    Time(f64),

    /// Operation, byte or page count
    Count(u64),
}

impl CounterValue {
    /// Numeric value regardless of kind
    pub fn as_f64(self) -> f64 {
        match self {
            CounterValue::Time(t) => t,
            CounterValue::Count(c) => c as f64,
        }
    }

    fn zero_like(self) -> Self {
        match self {
            CounterValue::Time(_) => CounterValue::Time(0.0),
            CounterValue::Count(_) => CounterValue::Count(0),
        }
    }
}

impl fmt::Display for CounterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterValue::Time(t) => write!(f, "{:.6}s", t),
            CounterValue::Count(c) => write!(f, "{}", c),
        }
    }
}

/// How a counter gets its value
#[derive(Debug, Clone, Copy)]
pub enum CounterKind<C: 'static> {
    /// Raw elapsed-time accumulator
    Time,

    /// Raw count accumulator
    Count,

    /// `time / ops`, or 0 when no operations were counted
    Average { time: C, ops: C },

    /// Sum of the listed time counters
    Total(&'static [C]),
}

/// A fixed enumeration of counters belonging to one subsystem
pub trait CounterId: Copy + Eq + fmt::Debug + 'static {
    /// Every counter, in slot order
    const ALL: &'static [Self];

    /// Stable display name
    fn name(self) -> &'static str;

    /// Raw or derived
    fn kind(self) -> CounterKind<Self>;

    /// Position in [`CounterId::ALL`]
    fn slot(self) -> usize;
}

/// A named counter reading, detached from its registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterReading {
    pub name: String,
    pub value: CounterValue,
}

/// Registry of counters for one subsystem
#[derive(Debug, Clone)]
pub struct Counters<C: CounterId> {
    values: Vec<CounterValue>,
    _ids: PhantomData<C>,
}

impl<C: CounterId> Counters<C> {
    /// Create a registry with every raw counter at zero
    pub fn new() -> Self {
        let values = C::ALL
            .iter()
            .map(|id| match id.kind() {
                CounterKind::Time => CounterValue::Time(0.0),
                CounterKind::Count => CounterValue::Count(0),
                // Derived slots are never read directly
                CounterKind::Average { .. } | CounterKind::Total(_) => CounterValue::Time(0.0),
            })
            .collect();

        Self {
            values,
            _ids: PhantomData,
        }
    }

    /// Add elapsed time to a time counter
    pub fn add_time(&mut self, id: C, seconds: f64) {
        if let CounterValue::Time(t) = &mut self.values[id.slot()] {
            *t += seconds;
        } else {
            debug_assert!(false, "{:?} is not a time counter", id);
        }
    }

    /// Add to a count counter
    pub fn add_count(&mut self, id: C, n: u64) {
        if let CounterValue::Count(c) = &mut self.values[id.slot()] {
            *c = c.saturating_add(n);
        } else {
            debug_assert!(false, "{:?} is not a count counter", id);
        }
    }

    /// Read a counter as `(name, value)`
    pub fn get(&self, id: C) -> (&'static str, CounterValue) {
        (id.name(), self.value(id))
    }

    /// Read a counter's value, computing derived counters on the fly
    pub fn value(&self, id: C) -> CounterValue {
        match id.kind() {
            CounterKind::Time | CounterKind::Count => self.values[id.slot()],
            CounterKind::Average { time, ops } => {
                let ops = self.value(ops).as_f64();
                if ops == 0.0 {
                    CounterValue::Time(0.0)
                } else {
                    CounterValue::Time(self.value(time).as_f64() / ops)
                }
            }
            CounterKind::Total(parts) => {
                CounterValue::Time(parts.iter().map(|p| self.value(*p).as_f64()).sum())
            }
        }
    }

    /// Shorthand for a counter's value as seconds
    pub fn time(&self, id: C) -> f64 {
        self.value(id).as_f64()
    }

    /// Shorthand for a count counter's value
    pub fn count(&self, id: C) -> u64 {
        match self.value(id) {
            CounterValue::Count(c) => c,
            CounterValue::Time(t) => t as u64,
        }
    }

    /// Reset one counter. Resetting a derived counter resets its inputs.
    pub fn reset(&mut self, id: C) {
        match id.kind() {
            CounterKind::Time | CounterKind::Count => {
                let slot = id.slot();
                self.values[slot] = self.values[slot].zero_like();
            }
            CounterKind::Average { time, ops } => {
                self.reset(time);
                self.reset(ops);
            }
            CounterKind::Total(parts) => {
                for part in parts {
                    self.reset(*part);
                }
            }
        }
    }

    /// Reset every counter
    pub fn reset_all(&mut self) {
        for value in &mut self.values {
            *value = value.zero_like();
        }
    }

    /// Iterate over all counters, derived ones included
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, CounterValue)> + '_ {
        C::ALL.iter().map(move |id| self.get(*id))
    }

    /// Detached copy of every reading, for reports
    pub fn snapshot(&self) -> Vec<CounterReading> {
        self.iter()
            .map(|(name, value)| CounterReading {
                name: name.to_string(),
                value,
            })
            .collect()
    }
}

impl<C: CounterId> Default for Counters<C> {
    fn default() -> Self {
        Self::new()
    }
}
