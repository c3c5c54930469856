pub mod discovery;
pub mod results;
pub mod simulation;
pub mod xml;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cli::ScanPreset;
use crate::config::Config;
use crate::error::{Result, ScanError};
pub use discovery::NmapBinary;
pub use results::{
    HostResult, OsMatch, PortEntry, RunInfo, ScanFailure, ScanOutcome, ScanReport, ServiceInfo,
    SimulatedScan,
};
use xml::{parse_nmap_xml, NmapRun};

/// Local wall-clock time in the format shown on every report.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Preset flags plus `-p <range>` when a range is given and the preset probes ports.
pub fn build_arguments(preset: ScanPreset, port_range: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = preset.flags().iter().map(|f| f.to_string()).collect();

    if let Some(range) = port_range.map(str::trim).filter(|r| !r.is_empty()) {
        if preset != ScanPreset::Ping {
            args.push("-p".to_string());
            args.push(range.to_string());
        }
    }

    args
}

pub struct NmapScanner {
    binary: Option<NmapBinary>,
    scan_timeout: Option<Duration>,
}

impl NmapScanner {
    /// Probes the configured and well-known locations for a working nmap.
    pub async fn discover(explicit: Option<&Path>, config: &Config) -> Self {
        let candidates = discovery::candidate_paths(explicit, config);
        let probe_timeout = Duration::from_secs(config.probe_timeout_secs.max(1));
        let binary = discovery::locate(&candidates, probe_timeout).await;

        if binary.is_none() {
            info!("nmap not found in {} candidate locations; scans will be simulated", candidates.len());
        }

        Self {
            binary,
            scan_timeout: config.scan_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_binary(binary: NmapBinary) -> Self {
        Self { binary: Some(binary), scan_timeout: None }
    }

    pub fn unavailable() -> Self {
        Self { binary: None, scan_timeout: None }
    }

    pub fn with_scan_timeout(mut self, scan_timeout: Option<Duration>) -> Self {
        self.scan_timeout = scan_timeout;
        self
    }

    pub fn binary(&self) -> Option<&NmapBinary> {
        self.binary.as_ref()
    }

    /// Runs one scan. Never fails: problems come back as `ScanOutcome::Failed`.
    pub async fn scan(&self, target: &str, preset: ScanPreset, port_range: Option<&str>) -> ScanOutcome {
        let binary = match &self.binary {
            Some(binary) => binary,
            None => {
                return ScanOutcome::Simulated(simulation::simulate_scan(target, preset, timestamp()));
            }
        };

        let args = build_arguments(preset, port_range);
        info!("Scanning {} with arguments: {}", target, args.join(" "));

        match self.run_nmap(&binary.path, target, &args).await {
            Ok(run) => {
                debug!("nmap reported {} host(s)", run.hosts.len());
                ScanOutcome::Completed(ScanReport {
                    scan_type: preset,
                    timestamp: timestamp(),
                    hosts: run.hosts,
                    run: run.run,
                })
            }
            Err(e) => {
                debug!("Scan of {} failed: {}", target, e);
                ScanOutcome::Failed(ScanFailure {
                    error: e.to_string(),
                    hosts: Vec::new(),
                    scan_type: preset,
                    timestamp: timestamp(),
                })
            }
        }
    }

    async fn run_nmap(&self, nmap: &Path, target: &str, args: &[String]) -> Result<NmapRun> {
        let child = Command::new(nmap)
            .args(["-oX", "-"])
            .args(args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.scan_timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| ScanError::Timeout(limit.as_secs()))?,
            None => child.await,
        }
        .map_err(|source| ScanError::Spawn { path: nmap.to_path_buf(), source })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        match parse_nmap_xml(&stdout) {
            Ok(run) => {
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    warn!("nmap: {}", line.trim());
                }
                Ok(run)
            }
            Err(_) if !stderr.trim().is_empty() => Err(ScanError::NmapReported {
                stderr: stderr.trim().to_string(),
            }),
            Err(_) if !output.status.success() => Err(ScanError::NmapExit {
                code: output.status.code().unwrap_or(-1),
            }),
            Err(e) => Err(e),
        }
    }
}
