// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single hour-aligned price. Prices are minor currency units per kWh
/// (integer cents/hellers/etc.) so percentile comparisons never drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
}

impl PricePoint {
    pub fn new(time: DateTime<Utc>, price_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            time,
            price_minor,
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTier {
    VeryCheap,
    Cheap,
    Normal,
    Expensive,
    VeryExpensive,
}

impl PriceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryCheap => "very_cheap",
            Self::Cheap => "cheap",
            Self::Normal => "normal",
            Self::Expensive => "expensive",
            Self::VeryExpensive => "very_expensive",
        }
    }

    pub fn is_cheap_or_better(self) -> bool {
        matches!(self, Self::VeryCheap | Self::Cheap)
    }

    pub fn is_expensive_or_worse(self) -> bool {
        matches!(self, Self::Expensive | Self::VeryExpensive)
    }
}

/// Output of the price analyzer for a single instant against its forward
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub current_price_minor: i64,
    pub percentile_rank: f64,
    pub tier: PriceTier,
    pub window_min_minor: i64,
    pub window_max_minor: i64,
    pub window_len: usize,
}
