// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Two [`PriceProvider`] implementations (spec §6, §9): a retail-tariff
//! API returning the household's contracted price directly, and a
//! day-ahead wholesale market feed that needs a consumer markup applied
//! before it is comparable to a retail tariff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use heatopt_core::traits::{PriceProvider, PriceQuote};
use heatopt_types::error::CoreError;
use heatopt_types::price::PricePoint;
use serde::Deserialize;

use crate::http::RetryingClient;

#[derive(Debug, Deserialize)]
struct RawPricePoint {
    time: DateTime<Utc>,
    price_minor: i64,
}

/// Retail tariff provider: the vendor API already returns the price the
/// household actually pays, so no markup is applied.
pub struct RetailPriceProvider {
    base_url: String,
    token: String,
    client: RetryingClient,
}

impl RetailPriceProvider {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            client: RetryingClient::new()?,
        })
    }
}

#[async_trait]
impl PriceProvider for RetailPriceProvider {
    async fn get_prices(&self, currency: &str) -> Result<PriceQuote, CoreError> {
        let url = format!("{}/api/v1/prices?currency={}", self.base_url, currency);
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&url).bearer_auth(&self.token).send())
            .await?;
        let raw: Vec<RawPricePoint> = response.json().await.map_err(crate::errors::AdapterError::from)?;
        build_quote(raw, currency)
    }
}

/// Day-ahead wholesale market provider (the shape of a spot-market feed
/// such as the Czech/EU day-ahead auction). `markup_minor_per_kwh` and
/// `enable_markup` come straight from settings (spec §6
/// `enable_consumer_markup`): a household on a pure spot tariff pays the
/// market clearing price plus distribution/supplier markup, which this
/// provider must add before the figure is comparable to a retail quote.
pub struct WholesaleDayAheadPriceProvider {
    base_url: String,
    area: String,
    token: String,
    client: RetryingClient,
    markup_minor_per_kwh: i64,
    enable_markup: bool,
}

impl WholesaleDayAheadPriceProvider {
    pub fn new(
        base_url: impl Into<String>,
        area: impl Into<String>,
        token: impl Into<String>,
        markup_minor_per_kwh: i64,
        enable_markup: bool,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            base_url: base_url.into(),
            area: area.into(),
            token: token.into(),
            client: RetryingClient::new()?,
            markup_minor_per_kwh,
            enable_markup,
        })
    }
}

#[async_trait]
impl PriceProvider for WholesaleDayAheadPriceProvider {
    async fn get_prices(&self, currency: &str) -> Result<PriceQuote, CoreError> {
        let url = format!(
            "{}/api/v1/day-ahead?area={}&currency={}",
            self.base_url, self.area, currency
        );
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&url).bearer_auth(&self.token).send())
            .await?;
        let mut raw: Vec<RawPricePoint> = response.json().await.map_err(crate::errors::AdapterError::from)?;
        if self.enable_markup {
            for point in &mut raw {
                point.price_minor += self.markup_minor_per_kwh;
            }
        }
        build_quote(raw, currency)
    }
}

fn build_quote(raw: Vec<RawPricePoint>, currency: &str) -> Result<PriceQuote, CoreError> {
    let series: Vec<PricePoint> = raw
        .into_iter()
        .map(|p| PricePoint::new(p.time, p.price_minor, currency))
        .collect();
    let current = series
        .last()
        .cloned()
        .ok_or_else(|| CoreError::StaleData("price feed returned no points".to_string()))?;
    Ok(PriceQuote {
        current,
        series,
        currency: currency.to_string(),
    })
}
