//! Outbound HTTP: public IP lookup and report upload

use std::time::Duration;

use crate::error::TelemetryError;
use crate::report::{SystemReport, ALUMINUM_VERSION, BROWSER_NAME};
use crate::settings::TelemetrySettings;
use crate::Result;

pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub fn new(settings: &TelemetrySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(format!("{BROWSER_NAME}/{ALUMINUM_VERSION}"))
            .build()?;

        Ok(Self { client })
    }

    /// Plain-text public IP from `lookup_url`
    pub async fn public_ip(&self, lookup_url: &str) -> Result<String> {
        let response = self.client.get(lookup_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Rejected(status.as_u16()));
        }

        Ok(response.text().await?.trim().to_string())
    }

    /// POST the report as JSON. Returns the response status on success.
    pub async fn upload(&self, endpoint: &str, report: &SystemReport) -> Result<u16> {
        let response = self.client.post(endpoint).json(report).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(TelemetryError::Rejected(status.as_u16()));
        }

        tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Report uploaded");
        Ok(status.as_u16())
    }
}

impl Clone for Transport {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}
