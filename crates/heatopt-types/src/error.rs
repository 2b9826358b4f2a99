// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Error taxonomy shared by the orchestrator and its adapters.
//!
//! Variant names are kinds, not wrappers around a single external crate's
//! error type: adapters convert their own wire errors into one of these via
//! `#[from]` or a context string. Learners never raise; they absorb bad
//! inputs and lower confidence instead (see `heatopt_core` learner modules).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transient external failure: {0}")]
    TransientExternal(String),

    #[error("stale data: {0}")]
    StaleData(String),

    #[error("invalid telemetry: {0}")]
    InvalidTelemetry(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("persistence full: {0}")]
    PersistenceFull(String),

    #[error("fatal: {0}")]
    Fatal(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
