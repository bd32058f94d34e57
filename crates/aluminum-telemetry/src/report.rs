//! System report data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const BROWSER_NAME: &str = "Aluminum";
pub const ALUMINUM_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemReport {
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
    pub hardware: HardwareInfo,
    pub os: OsInfo,
    pub network: NetworkInfo,
    pub browser: BrowserInfo,
    pub performance: PerformanceMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub gpu: Option<GpuInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfo {
    pub brand: String,
    pub threads: usize,
    pub frequency_mhz: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
}

/// Totals over all mounted disks, in bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub name: String,
    pub memory_total_mb: Option<u64>,
    pub memory_used_mb: Option<u64>,
    pub load_percent: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub kernel_version: Option<String>,
    pub architecture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub hostname: Option<String>,
    /// Public address, or "Unknown" when not looked up
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserInfo {
    pub name: String,
    pub version: String,
    pub user_agent: String,
    pub plugins: Vec<Plugin>,
    pub extensions: Vec<Extension>,
}

/// Entry of `plugins.plugins_list` in the profile's `Preferences`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    pub version: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub cpu_usage_percent: f32,
    pub memory_usage_percent: f64,
    pub disk_io: DiskIo,
    pub network_io: NetworkIo,
}

/// Summed over all processes since they started
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiskIo {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkIo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

impl SystemReport {
    /// Copy with host identifiers replaced by SHA-256 digests
    pub fn anonymized(&self) -> Self {
        let mut report = self.clone();
        report.network.hostname = report.network.hostname.as_deref().map(digest);
        report.network.mac_address = report.network.mac_address.as_deref().map(digest);
        report
    }
}

fn digest(value: &str) -> String {
    let hash = Sha256::digest(value.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn generate_user_agent(os_name: &str, os_release: &str, arch: &str) -> String {
    format!(
        "{BROWSER_NAME}/{ALUMINUM_VERSION} ({os_name} {os_release}; {arch}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SystemReport {
        SystemReport {
            report_id: "r-1".to_string(),
            generated_at: Utc::now(),
            hardware: HardwareInfo {
                cpu: CpuInfo {
                    brand: "Test CPU".to_string(),
                    threads: 8,
                    frequency_mhz: 3200,
                },
                memory: MemoryInfo {
                    total: 16,
                    available: 8,
                },
                disk: DiskInfo {
                    total: 100,
                    used: 40,
                    free: 60,
                },
                gpu: None,
            },
            os: OsInfo {
                name: Some("Linux".to_string()),
                version: None,
                kernel_version: Some("6.1.0".to_string()),
                architecture: "x86_64".to_string(),
            },
            network: NetworkInfo {
                hostname: Some("workstation".to_string()),
                ip_address: "Unknown".to_string(),
                mac_address: Some("aa:bb:cc:dd:ee:ff".to_string()),
                interfaces: vec!["eth0".to_string()],
            },
            browser: BrowserInfo {
                name: BROWSER_NAME.to_string(),
                version: ALUMINUM_VERSION.to_string(),
                user_agent: generate_user_agent("Linux", "6.1.0", "x86_64"),
                plugins: Vec::new(),
                extensions: Vec::new(),
            },
            performance: PerformanceMetrics {
                cpu_usage_percent: 12.5,
                memory_usage_percent: 50.0,
                disk_io: DiskIo::default(),
                network_io: NetworkIo::default(),
            },
        }
    }

    #[test]
    fn test_anonymized_hides_identifiers() {
        let report = sample();
        let anon = report.anonymized();

        let hostname = anon.network.hostname.unwrap();
        assert_eq!(hostname.len(), 64);
        assert_ne!(hostname, "workstation");
        assert_ne!(anon.network.mac_address.unwrap(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(anon.network.interfaces, report.network.interfaces);

        // Stable digests, so reports from one machine still correlate
        assert_eq!(
            report.anonymized().network.hostname,
            Some(hostname)
        );
    }

    #[test]
    fn test_user_agent() {
        let ua = generate_user_agent("Linux", "6.1.0", "x86_64");
        assert!(ua.starts_with("Aluminum/1.0.0 (Linux 6.1.0; x86_64)"));
    }
}
