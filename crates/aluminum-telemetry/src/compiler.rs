//! Compile, persist and (optionally) upload a system report

use aluminum_storage::{format_timestamp, Database, SystemDataStore};
use serde::Serialize;
use std::path::PathBuf;

use crate::collector::SystemCollector;
use crate::report::SystemReport;
use crate::settings::TelemetrySettings;
use crate::transport::Transport;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    /// Uploading is switched off
    Disabled,
    Skipped { reason: String },
    Uploaded { http_status: u16 },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileSummary {
    pub record_id: i64,
    pub report: SystemReport,
    pub upload: UploadStatus,
}

pub struct SystemDataCompiler {
    store: SystemDataStore,
    settings: TelemetrySettings,
    transport: Transport,
    profile_dir: Option<PathBuf>,
}

impl SystemDataCompiler {
    pub fn new(db: Database, settings: TelemetrySettings) -> Result<Self> {
        let transport = Transport::new(&settings)?;
        Ok(Self {
            store: SystemDataStore::new(db),
            settings,
            transport,
            profile_dir: None,
        })
    }

    /// Browser profile to read plugins and installed extensions from
    pub fn with_profile_dir(mut self, profile_dir: Option<PathBuf>) -> Self {
        self.profile_dir = profile_dir;
        self
    }

    /// Collect a report, store it, and upload it when enabled.
    ///
    /// Storage failures are returned; network failures only change the
    /// reported `UploadStatus`.
    pub async fn compile(&self) -> Result<CompileSummary> {
        tracing::info!("Starting system data compilation");

        let mut collector = SystemCollector::new();

        // CPU usage is the delta between two refreshes
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;

        let public_ip = self.lookup_public_ip().await;
        let report = collector.collect(public_ip, self.profile_dir.as_deref());

        let data = serde_json::to_value(&report)?;
        let record_id = self.store.insert(
            &report.report_id,
            &format_timestamp(report.generated_at),
            &data,
        )?;
        tracing::info!(record_id, report_id = %report.report_id, "System data saved");

        let upload = self.upload(&report).await;
        tracing::info!(upload = ?upload, "System data compilation completed");

        Ok(CompileSummary {
            record_id,
            report,
            upload,
        })
    }

    async fn lookup_public_ip(&self) -> Option<String> {
        if !self.settings.lookup_public_ip {
            return None;
        }

        match self.transport.public_ip(&self.settings.ip_lookup_url).await {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to retrieve public IP address");
                None
            }
        }
    }

    async fn upload(&self, report: &SystemReport) -> UploadStatus {
        if !self.settings.upload_enabled {
            return UploadStatus::Disabled;
        }

        let Some(endpoint) = self.settings.endpoint.as_deref() else {
            tracing::warn!("Upload enabled but no endpoint configured");
            return UploadStatus::Skipped {
                reason: "no endpoint configured".to_string(),
            };
        };

        let payload = if self.settings.anonymize {
            report.anonymized()
        } else {
            report.clone()
        };

        tracing::info!(endpoint = %endpoint, "Uploading system data");
        match self.transport.upload(endpoint, &payload).await {
            Ok(http_status) => UploadStatus::Uploaded { http_status },
            Err(e) => {
                tracing::error!(error = %e, "Error uploading system data");
                UploadStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Previously compiled reports, newest first
    pub fn history(&self, limit: usize) -> Result<Vec<aluminum_storage::SystemDataRecord>> {
        Ok(self.store.list(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compile_stores_report_without_network() {
        let db = Database::open_in_memory().unwrap();
        let compiler = SystemDataCompiler::new(db, TelemetrySettings::default()).unwrap();

        let summary = compiler.compile().await.unwrap();
        assert_eq!(summary.upload, UploadStatus::Disabled);
        assert_eq!(summary.report.network.ip_address, "Unknown");

        let stored = compiler.history(10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, summary.record_id);
        assert_eq!(stored[0].report_id, summary.report.report_id);
    }

    #[tokio::test]
    async fn test_upload_without_endpoint_is_skipped() {
        let settings = TelemetrySettings {
            upload_enabled: true,
            endpoint: None,
            ..TelemetrySettings::default()
        };
        let compiler =
            SystemDataCompiler::new(Database::open_in_memory().unwrap(), settings).unwrap();

        let summary = compiler.compile().await.unwrap();
        assert!(matches!(summary.upload, UploadStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_failed_upload_still_stores_report() {
        let url = crate::transport::tests::failing_server().await;
        let settings = TelemetrySettings {
            upload_enabled: true,
            endpoint: Some(format!("{url}/report")),
            lookup_public_ip: true,
            ip_lookup_url: format!("{url}/ip"),
            ..TelemetrySettings::default()
        };
        let compiler =
            SystemDataCompiler::new(Database::open_in_memory().unwrap(), settings).unwrap();

        let summary = compiler.compile().await.unwrap();
        assert!(matches!(summary.upload, UploadStatus::Failed { .. }));
        assert_eq!(summary.report.network.ip_address, "Unknown");

        let stored = compiler.history(10).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].report_id, summary.report.report_id);
    }
}
