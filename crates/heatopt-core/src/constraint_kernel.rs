// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! C2 — Constraint Kernel.
//!
//! A pure function: clamp, deadband-before-rounding, lockout, step
//! quantization, in exactly that order. See spec §4.2 for why the
//! deadband check happens before rounding rather than after.

use chrono::{DateTime, Utc};
use heatopt_types::constraints::ZoneConstraints;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintOutcome {
    pub applied_c: f64,
    pub changed: bool,
    pub reason_tokens: Vec<String>,
    pub lockout_active: bool,
}

/// See spec §4.2 for the numbered algorithm this mirrors step for step.
pub fn apply(
    proposed_c: f64,
    current_c: f64,
    constraints: &ZoneConstraints,
    last_change_time: DateTime<Utc>,
    now_time: DateTime<Utc>,
) -> ConstraintOutcome {
    // 1. Clamp.
    let clamped = proposed_c.clamp(constraints.min_c, constraints.max_c);

    // 2. Raw delta, pre-rounding.
    let raw_delta = clamped - current_c;

    // 3. Deadband check on the raw delta, before any rounding.
    if raw_delta.abs() < constraints.deadband_c {
        return ConstraintOutcome {
            applied_c: current_c,
            changed: false,
            reason_tokens: vec!["deadband".to_string()],
            lockout_active: false,
        };
    }

    // 4. Lockout check.
    let elapsed_minutes = (now_time - last_change_time).num_minutes();
    let lockout_active = elapsed_minutes < constraints.min_change_minutes;
    if lockout_active {
        // 5.
        return ConstraintOutcome {
            applied_c: current_c,
            changed: false,
            reason_tokens: vec!["lockout".to_string()],
            lockout_active: true,
        };
    }

    // 6. Quantize to device step, then re-clamp.
    let steps = (raw_delta / constraints.step_c).round();
    let stepped = (current_c + steps * constraints.step_c).clamp(constraints.min_c, constraints.max_c);

    // 7. Step may eliminate the change entirely when step_c > 2*raw_delta.
    if stepped == current_c {
        return ConstraintOutcome {
            applied_c: current_c,
            changed: false,
            reason_tokens: vec!["step_eliminates".to_string()],
            lockout_active: false,
        };
    }

    ConstraintOutcome {
        applied_c: stepped,
        changed: true,
        reason_tokens: vec![],
        lockout_active: false,
    }
}
