// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! Generic heat-pump vendor REST client implementing
//! [`heatopt_core::DeviceAdapter`]. Talks JSON over HTTPS to
//! `{base_url}/api/v1/buildings/{building_id}/devices/...`; any vendor
//! reachable over a REST facade of this shape can be pointed at it by
//! configuring a different `base_url`.

use async_trait::async_trait;
use heatopt_core::traits::{DailyEnergyTotals, DeviceAdapter, DeviceHandle, DeviceZone};
use heatopt_types::device::DeviceSnapshot;
use heatopt_types::error::CoreError;
use serde::Deserialize;
use tracing::debug;

use crate::http::RetryingClient;

pub struct HttpDeviceAdapter {
    base_url: String,
    api_key: String,
    client: RetryingClient,
}

impl HttpDeviceAdapter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, CoreError> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: RetryingClient::new().map_err(Into::<CoreError>::into)?,
        })
    }

    fn devices_url(&self) -> String {
        format!("{}/api/v1/devices", self.base_url)
    }

    fn device_url(&self, building_id: &str, id: &str, suffix: &str) -> String {
        format!(
            "{}/api/v1/buildings/{}/devices/{}/{}",
            self.base_url, building_id, id, suffix
        )
    }
}

#[derive(Debug, Deserialize)]
struct DeviceListEntry {
    id: String,
    name: String,
    building_id: String,
}

#[derive(Debug, Deserialize)]
struct DeviceStateResponse {
    indoor_z1: f64,
    indoor_z2: Option<f64>,
    outdoor: f64,
    tank_temp: Option<f64>,
    setpoint_z1: f64,
    setpoint_z2: Option<f64>,
    setpoint_tank: Option<f64>,
    idle_z1: bool,
}

#[derive(Debug, Deserialize)]
struct EnergyTotalsResponse {
    heat_produced_kwh: f64,
    heat_consumed_kwh: f64,
    dhw_produced_kwh: f64,
    dhw_consumed_kwh: f64,
}

fn zone_path_segment(zone: DeviceZone) -> &'static str {
    match zone {
        DeviceZone::Zone1 => "zone1",
        DeviceZone::Zone2 => "zone2",
        DeviceZone::Tank => "tank",
    }
}

#[async_trait]
impl DeviceAdapter for HttpDeviceAdapter {
    async fn list_devices(&self) -> Result<Vec<DeviceHandle>, CoreError> {
        let devices_url = self.devices_url();
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&devices_url).bearer_auth(&self.api_key).send())
            .await?;
        let entries: Vec<DeviceListEntry> = response.json().await.map_err(crate::errors::AdapterError::from)?;
        Ok(entries
            .into_iter()
            .map(|e| DeviceHandle {
                id: e.id,
                name: e.name,
                building_id: e.building_id,
            })
            .collect())
    }

    async fn snapshot(&self, id: &str, building_id: &str) -> Result<DeviceSnapshot, CoreError> {
        let url = self.device_url(building_id, id, "state");
        debug!(device = id, "fetching device snapshot");
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&url).bearer_auth(&self.api_key).send())
            .await?;
        let state: DeviceStateResponse = response.json().await.map_err(crate::errors::AdapterError::from)?;
        Ok(DeviceSnapshot {
            indoor_z1: state.indoor_z1,
            indoor_z2: state.indoor_z2,
            outdoor: state.outdoor,
            tank_temp: state.tank_temp,
            setpoint_z1: state.setpoint_z1,
            setpoint_z2: state.setpoint_z2,
            setpoint_tank: state.setpoint_tank,
            idle_z1: state.idle_z1,
            daily_heat_produced_kwh: 0.0,
            daily_heat_consumed_kwh: 0.0,
            daily_dhw_produced_kwh: 0.0,
            daily_dhw_consumed_kwh: 0.0,
        })
    }

    async fn set_setpoint(
        &self,
        id: &str,
        building_id: &str,
        zone: DeviceZone,
        target_c: f64,
    ) -> Result<(), CoreError> {
        let url = self.device_url(building_id, id, &format!("{}/setpoint", zone_path_segment(zone)));
        self.client
            .send_checked(|| {
                self.client
                    .inner()
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&serde_json::json!({ "target_c": target_c }))
                    .send()
            })
            .await?;
        Ok(())
    }

    async fn energy_totals_daily(&self, id: &str, building_id: &str) -> Result<DailyEnergyTotals, CoreError> {
        let url = self.device_url(building_id, id, "energy/daily");
        let response = self
            .client
            .send_checked(|| self.client.inner().get(&url).bearer_auth(&self.api_key).send())
            .await?;
        let totals: EnergyTotalsResponse = response.json().await.map_err(crate::errors::AdapterError::from)?;
        Ok(DailyEnergyTotals {
            heat_produced_kwh: totals.heat_produced_kwh,
            heat_consumed_kwh: totals.heat_consumed_kwh,
            dhw_produced_kwh: totals.dhw_produced_kwh,
            dhw_consumed_kwh: totals.dhw_consumed_kwh,
            cop_heat: None,
            cop_dhw: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    #[tokio::test]
    async fn snapshot_parses_device_state_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/buildings/b1/devices/dev1/state")
            .match_header("authorization", "Bearer token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "indoor_z1": 21.0,
                    "indoor_z2": null,
                    "outdoor": 4.0,
                    "tank_temp": 47.0,
                    "setpoint_z1": 21.0,
                    "setpoint_z2": null,
                    "setpoint_tank": 48.0,
                    "idle_z1": false
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = HttpDeviceAdapter::new(server.url(), "token").unwrap();
        let snapshot = adapter.snapshot("dev1", "b1").await.unwrap();

        assert_eq!(snapshot.indoor_z1, 21.0);
        assert_eq!(snapshot.tank_temp, Some(47.0));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn snapshot_surfaces_auth_failure_as_config_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/buildings/b1/devices/dev1/state")
            .with_status(401)
            .create_async()
            .await;

        let adapter = HttpDeviceAdapter::new(server.url(), "bad-token").unwrap();
        let result = adapter.snapshot("dev1", "b1").await;

        assert!(matches!(result, Err(CoreError::Config(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn set_setpoint_posts_target_temperature() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/buildings/b1/devices/dev1/zone1/setpoint")
            .match_body(mockito::Matcher::Json(json!({ "target_c": 21.5 })))
            .with_status(200)
            .create_async()
            .await;

        let adapter = HttpDeviceAdapter::new(server.url(), "token").unwrap();
        let result = adapter.set_setpoint("dev1", "b1", DeviceZone::Zone1, 21.5).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }
}
