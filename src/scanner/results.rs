use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use crate::cli::ScanPreset;

/// Everything a scan can come back with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Simulated(SimulatedScan),
    Failed(ScanFailure),
    Completed(ScanReport),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedScan {
    pub message: String,
    pub install_instructions: InstallInstructions,
    pub target: String,
    pub scan_type: ScanPreset,
    pub timestamp: String,
    pub sample_results: SampleResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallInstructions {
    pub os: String,
    pub steps: Vec<String>,
    pub alternative: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResults {
    pub host_up: bool,
    pub ports: Vec<SamplePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePort {
    pub port: u16,
    pub state: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailure {
    pub error: String,
    pub hosts: Vec<HostResult>,
    pub scan_type: ScanPreset,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_type: ScanPreset,
    pub timestamp: String,
    pub hosts: Vec<HostResult>,
    pub run: RunInfo,
}

/// Metadata from the `<nmaprun>` and `<finished>` elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub nmap_version: Option<String>,
    pub command_line: Option<String>,
    pub elapsed_secs: Option<f64>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    pub address: String,
    pub state: String,
    pub hostnames: Vec<Hostname>,
    /// Port tables keyed by protocol name; BTreeMap keeps protocols sorted.
    pub protocols: BTreeMap<String, Vec<PortEntry>>,
    pub os_matches: Vec<OsMatch>,
}

impl HostResult {
    pub fn new(address: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: state.into(),
            hostnames: Vec::new(),
            protocols: BTreeMap::new(),
            os_matches: Vec::new(),
        }
    }

    pub fn named_hostnames(&self) -> Vec<&str> {
        self.hostnames
            .iter()
            .map(|h| h.name.as_str())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostname {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortEntry {
    pub port: u16,
    pub protocol: String,
    pub state: String,
    pub service: Option<ServiceInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub product: Option<String>,
    pub version: Option<String>,
    pub extra_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsMatch {
    pub name: String,
    pub accuracy: Option<u8>,
}
