//! The combined result of a fan-out.

use std::collections::HashMap;
use std::time::Duration;

/// Outcome of a fan-out where every operation succeeded.
///
/// `data` is a slot-name map for [`Fanout`](super::Fanout) and
/// [`load_all`](super::load_all), and a tuple for [`load3`](super::load3).
/// There is no partial-success form: a single failing operation turns the
/// whole fan-out into an error.
///
/// With the `serde` feature enabled this serializes as
/// `{"success": true, "data": ..., "timeTaken": <ms>}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Aggregate<D> {
    /// Always `true`; kept so the shape matches what callers render.
    pub success: bool,
    /// The values produced by the operations.
    pub data: D,
    /// Wall-clock time from launch until every operation settled.
    #[cfg_attr(feature = "serde", serde(with = "crate::duration_ms"))]
    pub time_taken: Duration,
}

impl<D> Aggregate<D> {
    /// Create a successful aggregate.
    pub fn new(data: D, time_taken: Duration) -> Self {
        Self {
            success: true,
            data,
            time_taken,
        }
    }

    /// Extract the data, discarding timing.
    pub fn into_data(self) -> D {
        self.data
    }

    /// Transform the data, keeping timing.
    pub fn map<D2, F>(self, f: F) -> Aggregate<D2>
    where
        F: FnOnce(D) -> D2,
    {
        Aggregate {
            success: self.success,
            data: f(self.data),
            time_taken: self.time_taken,
        }
    }
}

impl<T> Aggregate<HashMap<String, T>> {
    /// Look up the value produced for a slot.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.data.get(name)
    }
}
