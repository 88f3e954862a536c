//! Phase-rectified signal averaging
//!
//! Deceleration capacity (DC) and acceleration capacity (AC) are the means of
//! the PRSA anchor values taken at lengthening and shortening intervals.

use serde::{Deserialize, Serialize};

/// PRSA output for one RR series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrsaCapacity {
    /// Deceleration capacity (ms); absent when no decelerating anchor exists
    pub dc: Option<f64>,
    /// Acceleration capacity (ms); absent when no accelerating anchor exists
    pub ac: Option<f64>,
}

/// Compute DC and AC over a filtered RR series in a single pass.
///
/// Anchors are the interior indices `2..=n-2`. Equal neighbours contribute to
/// neither set.
pub fn prsa_capacity(rr: &[f64]) -> PrsaCapacity {
    let n = rr.len();
    if n < 4 {
        return PrsaCapacity::default();
    }

    let mut decelerations = Vec::with_capacity(n);
    let mut accelerations = Vec::with_capacity(n);

    for i in 2..=n - 2 {
        let anchor = (rr[i] + rr[i + 1] - rr[i - 1] - rr[i - 2]) / 4.0;
        if rr[i] > rr[i - 1] {
            decelerations.push(anchor);
        } else if rr[i] < rr[i - 1] {
            accelerations.push(anchor);
        }
    }

    PrsaCapacity {
        dc: mean(&decelerations),
        ac: mean(&accelerations),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
