//! TVD slope limiters for MUSCL face reconstruction.
//!
//! `limited_slope(kind, backward, forward)` returns the cell slope (in
//! units of the field per cell) from the backward and forward
//! differences. All limiters return 0 at extrema.

use visco_types::config::LimiterKind;

/// Smallest-magnitude argument when signs agree, 0 otherwise.
#[inline]
pub fn minmod(a: f64, b: f64) -> f64 {
    if a * b <= 0.0 {
        0.0
    } else if a > 0.0 {
        a.min(b)
    } else {
        a.max(b)
    }
}

/// Largest-magnitude argument when signs agree, 0 otherwise.
#[inline]
fn maxmod(a: f64, b: f64) -> f64 {
    if a * b <= 0.0 {
        0.0
    } else if a > 0.0 {
        a.max(b)
    } else {
        a.min(b)
    }
}

pub fn limited_slope(kind: LimiterKind, backward: f64, forward: f64) -> f64 {
    match kind {
        LimiterKind::None => 0.0,
        LimiterKind::Minmod => minmod(backward, forward),
        LimiterKind::VanLeer => {
            if backward * forward <= 0.0 {
                0.0
            } else {
                2.0 * backward * forward / (backward + forward)
            }
        }
        LimiterKind::Superbee => {
            let s1 = minmod(2.0 * backward, forward);
            let s2 = minmod(backward, 2.0 * forward);
            maxmod(s1, s2)
        }
    }
}
