//! Host data collection

use chrono::Utc;
use std::path::Path;
use std::process::Command;
use sysinfo::{Disks, Networks, System};
use uuid::Uuid;

use crate::report::{
    generate_user_agent, BrowserInfo, CpuInfo, DiskInfo, DiskIo, Extension, GpuInfo,
    HardwareInfo, MemoryInfo, NetworkInfo, NetworkIo, OsInfo, PerformanceMetrics, Plugin,
    SystemReport,
    ALUMINUM_VERSION, BROWSER_NAME,
};

const UNKNOWN: &str = "Unknown";

/// Holds a refreshed `System` between the two samples CPU usage needs.
///
/// Create it, wait at least `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`, then call
/// `collect`.
pub struct SystemCollector {
    system: System,
}

impl SystemCollector {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }

    pub fn collect(&mut self, public_ip: Option<String>, profile_dir: Option<&Path>) -> SystemReport {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        tracing::info!("Collecting system data");

        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();

        let os = self.os_info();
        let browser = browser_info(&os, profile_dir);

        SystemReport {
            report_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            hardware: self.hardware_info(&disks),
            network: network_info(&networks, public_ip),
            performance: self.performance_metrics(&networks),
            os,
            browser,
        }
    }

    fn hardware_info(&self, disks: &Disks) -> HardwareInfo {
        let cpus = self.system.cpus();
        let cpu = CpuInfo {
            brand: cpus
                .first()
                .map(|c| c.brand().trim().to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            threads: cpus.len(),
            frequency_mhz: cpus.first().map(|c| c.frequency()).unwrap_or(0),
        };

        let (total, free) = disks.list().iter().fold((0u64, 0u64), |(t, f), disk| {
            (t + disk.total_space(), f + disk.available_space())
        });

        HardwareInfo {
            cpu,
            memory: MemoryInfo {
                total: self.system.total_memory(),
                available: self.system.available_memory(),
            },
            disk: DiskInfo {
                total,
                used: total.saturating_sub(free),
                free,
            },
            gpu: detect_gpu(),
        }
    }

    fn os_info(&self) -> OsInfo {
        OsInfo {
            name: System::name(),
            version: System::os_version(),
            kernel_version: System::kernel_version(),
            architecture: std::env::consts::ARCH.to_string(),
        }
    }

    fn performance_metrics(&self, networks: &Networks) -> PerformanceMetrics {
        let total_memory = self.system.total_memory();
        let memory_usage_percent = if total_memory > 0 {
            let used = total_memory.saturating_sub(self.system.available_memory());
            used as f64 / total_memory as f64 * 100.0
        } else {
            0.0
        };

        let disk_io = self
            .system
            .processes()
            .values()
            .fold(DiskIo::default(), |mut acc, process| {
                let usage = process.disk_usage();
                acc.read_bytes += usage.total_read_bytes;
                acc.written_bytes += usage.total_written_bytes;
                acc
            });

        let network_io = networks
            .list()
            .values()
            .fold(NetworkIo::default(), |mut acc, data| {
                acc.bytes_sent += data.total_transmitted();
                acc.bytes_recv += data.total_received();
                acc.packets_sent += data.total_packets_transmitted();
                acc.packets_recv += data.total_packets_received();
                acc
            });

        PerformanceMetrics {
            cpu_usage_percent: self.system.global_cpu_usage(),
            memory_usage_percent,
            disk_io,
            network_io,
        }
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn network_info(networks: &Networks, public_ip: Option<String>) -> NetworkInfo {
    let mut interfaces: Vec<String> = networks.list().keys().cloned().collect();
    interfaces.sort();

    // First non-loopback interface with a real hardware address
    let mac_address = interfaces
        .iter()
        .filter(|name| !is_loopback(name))
        .filter_map(|name| networks.list().get(name))
        .map(|data| data.mac_address().to_string())
        .find(|mac| mac != "00:00:00:00:00:00");

    NetworkInfo {
        hostname: System::host_name(),
        ip_address: public_ip.unwrap_or_else(|| UNKNOWN.to_string()),
        mac_address,
        interfaces,
    }
}

fn is_loopback(interface: &str) -> bool {
    interface == "lo" || interface.starts_with("lo0") || interface.starts_with("Loopback")
}

fn browser_info(os: &OsInfo, profile_dir: Option<&Path>) -> BrowserInfo {
    let user_agent = generate_user_agent(
        os.name.as_deref().unwrap_or(UNKNOWN),
        os.kernel_version.as_deref().unwrap_or(UNKNOWN),
        &os.architecture,
    );

    BrowserInfo {
        name: BROWSER_NAME.to_string(),
        version: ALUMINUM_VERSION.to_string(),
        user_agent,
        plugins: profile_dir.map(installed_plugins).unwrap_or_default(),
        extensions: profile_dir.map(installed_extensions).unwrap_or_default(),
    }
}

/// Plugins listed under `plugins.plugins_list` in `<profile>/Preferences`
fn installed_plugins(profile_dir: &Path) -> Vec<Plugin> {
    let path = profile_dir.join("Preferences");
    let Ok(contents) = std::fs::read_to_string(&path) else {
        tracing::debug!(path = %path.display(), "No preferences file");
        return Vec::new();
    };

    let prefs: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(prefs) => prefs,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable preferences file");
            return Vec::new();
        }
    };

    let Some(list) = prefs["plugins"]["plugins_list"].as_array() else {
        return Vec::new();
    };

    let mut plugins: Vec<Plugin> = list
        .iter()
        .filter_map(|entry| {
            let name = entry["name"].as_str().filter(|n| !n.is_empty())?;
            Some(Plugin {
                name: name.to_string(),
                version: entry["version"].as_str().map(str::to_string),
                enabled: entry["enabled"].as_bool().unwrap_or(true),
            })
        })
        .collect();
    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    plugins
}

/// Extensions unpacked under `<profile>/Extensions/<id>/<version>/manifest.json`
fn installed_extensions(profile_dir: &Path) -> Vec<Extension> {
    let root = profile_dir.join("Extensions");
    let Ok(ids) = std::fs::read_dir(&root) else {
        tracing::debug!(path = %root.display(), "No extensions directory");
        return Vec::new();
    };

    let mut extensions = Vec::new();
    for id_dir in ids.flatten().filter(|e| e.path().is_dir()) {
        let Ok(versions) = std::fs::read_dir(id_dir.path()) else {
            continue;
        };
        for version_dir in versions.flatten() {
            let manifest = version_dir.path().join("manifest.json");
            let Ok(contents) = std::fs::read_to_string(&manifest) else {
                continue;
            };
            match serde_json::from_str::<serde_json::Value>(&contents) {
                Ok(json) => extensions.push(Extension {
                    id: id_dir.file_name().to_string_lossy().into_owned(),
                    name: json["name"].as_str().unwrap_or(UNKNOWN).to_string(),
                    version: json["version"]
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| version_dir.file_name().to_string_lossy().into_owned()),
                }),
                Err(e) => {
                    tracing::warn!(path = %manifest.display(), error = %e, "Unreadable extension manifest")
                }
            }
        }
    }

    extensions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    extensions
}

/// Query the first NVIDIA GPU through `nvidia-smi`, when installed
pub fn detect_gpu() -> Option<GpuInfo> {
    let output = Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,memory.total,memory.used,utilization.gpu",
            "--format=csv,noheader,nounits",
        ])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let gpu = parse_nvidia_smi(stdout.lines().next()?);
    if gpu.is_none() {
        tracing::warn!("GPU information not available");
    }
    gpu
}

fn parse_nvidia_smi(line: &str) -> Option<GpuInfo> {
    let mut fields = line.split(',').map(str::trim);
    let name = fields.next().filter(|n| !n.is_empty())?.to_string();

    Some(GpuInfo {
        name,
        memory_total_mb: fields.next().and_then(|v| v.parse().ok()),
        memory_used_mb: fields.next().and_then(|v| v.parse().ok()),
        load_percent: fields.next().and_then(|v| v.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nvidia_smi() {
        let gpu = parse_nvidia_smi("NVIDIA GeForce RTX 3080, 10240, 1536, 7").unwrap();
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 3080");
        assert_eq!(gpu.memory_total_mb, Some(10240));
        assert_eq!(gpu.memory_used_mb, Some(1536));
        assert_eq!(gpu.load_percent, Some(7.0));

        assert!(parse_nvidia_smi("").is_none());
    }

    #[test]
    fn test_installed_extensions() {
        let profile = tempfile::tempdir().unwrap();
        let version_dir = profile.path().join("Extensions").join("abcdef").join("1.2.3_0");
        std::fs::create_dir_all(&version_dir).unwrap();
        std::fs::write(
            version_dir.join("manifest.json"),
            r#"{"name": "Aluminum AdBlocker", "version": "1.2.3"}"#,
        )
        .unwrap();

        let extensions = installed_extensions(profile.path());
        assert_eq!(
            extensions,
            vec![Extension {
                id: "abcdef".to_string(),
                name: "Aluminum AdBlocker".to_string(),
                version: "1.2.3".to_string(),
            }]
        );
        assert!(installed_extensions(&profile.path().join("missing")).is_empty());
    }

    #[test]
    fn test_installed_plugins() {
        let profile = tempfile::tempdir().unwrap();
        std::fs::write(
            profile.path().join("Preferences"),
            r#"{"plugins": {"plugins_list": [
                {"name": "Widevine Content Decryption Module", "version": "4.10", "enabled": true},
                {"name": "Chrome PDF Viewer", "enabled": false},
                {"version": "1.0"}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(
            installed_plugins(profile.path()),
            vec![
                Plugin {
                    name: "Chrome PDF Viewer".to_string(),
                    version: None,
                    enabled: false,
                },
                Plugin {
                    name: "Widevine Content Decryption Module".to_string(),
                    version: Some("4.10".to_string()),
                    enabled: true,
                },
            ]
        );

        std::fs::write(profile.path().join("Preferences"), "{}").unwrap();
        assert!(installed_plugins(profile.path()).is_empty());
        assert!(installed_plugins(&profile.path().join("missing")).is_empty());
    }

    #[test]
    fn test_collect_report_shape() {
        let profile = tempfile::tempdir().unwrap();
        std::fs::write(
            profile.path().join("Preferences"),
            r#"{"plugins": {"plugins_list": [{"name": "Aluminum Media", "version": "2.0"}]}}"#,
        )
        .unwrap();

        let mut collector = SystemCollector::new();
        let report = collector.collect(Some("203.0.113.7".to_string()), Some(profile.path()));
        assert_eq!(report.browser.plugins.len(), 1);
        assert_eq!(report.browser.plugins[0].name, "Aluminum Media");
        assert!(report.browser.plugins[0].enabled);
        assert!(report.browser.extensions.is_empty());

        assert_eq!(report.os.architecture, std::env::consts::ARCH);
        assert_eq!(report.network.ip_address, "203.0.113.7");
        assert_eq!(report.browser.name, BROWSER_NAME);
        assert!(report.hardware.disk.used <= report.hardware.disk.total);

        let json = serde_json::to_value(&report).unwrap();
        for section in ["hardware", "os", "network", "browser", "performance"] {
            assert!(json.get(section).is_some(), "missing {section}");
        }
        assert!(json["browser"]["plugins"].is_array());

        let bare = collector.collect(None, None);
        assert!(bare.browser.plugins.is_empty());
        assert_eq!(bare.network.ip_address, "Unknown");
    }
}
