// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! [`WeatherProvider`] against a generic forecast API (the shape of
//! Open-Meteo's hourly endpoint): current temperature plus an hourly
//! array of outdoor temperature, wind speed and cloud cover.

use async_trait::async_trait;
use heatopt_core::traits::{WeatherForecast, WeatherHourly, WeatherProvider};
use heatopt_types::error::CoreError;
use serde::Deserialize;

use crate::http::RetryingClient;

pub struct HttpWeatherProvider {
    base_url: String,
    client: RetryingClient,
}

impl HttpWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            base_url: base_url.into(),
            client: RetryingClient::new()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    temperature_2m: Vec<f64>,
    wind_speed_10m: Vec<f64>,
    cloud_cover: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_temperature_2m: f64,
    hourly: HourlyBlock,
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherForecast, CoreError> {
        let url = format!(
            "{}/v1/forecast?latitude={lat}&longitude={lon}&hourly=temperature_2m,wind_speed_10m,cloud_cover",
            self.base_url
        );
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&url).send())
            .await?;
        let parsed: ForecastResponse = response.json().await.map_err(crate::errors::AdapterError::from)?;

        let hourly = parsed
            .hourly
            .temperature_2m
            .iter()
            .zip(parsed.hourly.wind_speed_10m.iter())
            .zip(parsed.hourly.cloud_cover.iter())
            .enumerate()
            .map(|(i, ((temp, wind), cloud))| WeatherHourly {
                hours_ahead: i as i64,
                temperature_c: *temp,
                wind_mps: *wind,
                cloud_pct: *cloud,
            })
            .collect();

        Ok(WeatherForecast {
            current_temperature_c: parsed.current_temperature_2m,
            hourly,
        })
    }
}
