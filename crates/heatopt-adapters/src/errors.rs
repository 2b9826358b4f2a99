// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Wire-level error taxonomy for HTTP adapters. Kept separate from
//! [`heatopt_types::error::CoreError`] so retry/backoff logic can match
//! on transport specifics; converted into the shared taxonomy at the
//! trait boundary (spec §10.3).

use heatopt_types::error::CoreError;
use thiserror::Error;

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response did not parse: {0}")]
    Parse(String),

    #[error("authentication failed")]
    AuthFailed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AdapterError> for CoreError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::AuthFailed => CoreError::Config("adapter authentication failed".to_string()),
            AdapterError::Http(e) if e.is_timeout() || e.is_connect() => {
                CoreError::TransientExternal(e.to_string())
            }
            AdapterError::Status { status: 401 | 403, body } => {
                CoreError::Config(format!("authentication rejected: {body}"))
            }
            other => CoreError::TransientExternal(other.to_string()),
        }
    }
}
