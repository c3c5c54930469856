use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::Config;

lazy_static::lazy_static! {
    static ref VERSION_LINE: Regex = Regex::new(r"(?i)nmap version\s+([0-9][^\s]*)").unwrap();
}

/// Locations tried after any explicit path, in order.
const WELL_KNOWN_PATHS: &[&str] = &[
    "nmap",
    r"C:\Program Files (x86)\Nmap\nmap.exe",
    r"C:\Program Files\Nmap\nmap.exe",
    "/usr/bin/nmap",
    "/usr/local/bin/nmap",
    "/data/data/com.termux/files/usr/bin/nmap",
];

#[derive(Debug, Clone, PartialEq)]
pub struct NmapBinary {
    pub path: PathBuf,
    pub version: Option<String>,
}

/// Builds the ordered candidate list: explicit override, config path,
/// well-known locations, then configured extra directories.
pub fn candidate_paths(explicit: Option<&Path>, config: &Config) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    candidates.extend(explicit.map(Path::to_path_buf));
    candidates.extend(config.nmap_path.clone());
    candidates.extend(WELL_KNOWN_PATHS.iter().map(PathBuf::from));
    for dir in &config.extra_search_paths {
        candidates.push(dir.join(executable_name()));
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|p| seen.insert(p.clone()));
    candidates
}

fn executable_name() -> &'static str {
    if cfg!(windows) { "nmap.exe" } else { "nmap" }
}

/// Returns the first candidate whose `--version` exits cleanly.
pub async fn locate(candidates: &[PathBuf], probe_timeout: Duration) -> Option<NmapBinary> {
    for path in candidates {
        match probe(path, probe_timeout).await {
            Some(stdout) => {
                let version = parse_version(&stdout);
                info!("Found nmap at: {}", path.display());
                return Some(NmapBinary { path: path.clone(), version });
            }
            None => debug!("No usable nmap at {}", path.display()),
        }
    }
    None
}

async fn probe(path: &Path, probe_timeout: Duration) -> Option<String> {
    let child = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match timeout(probe_timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("{}: {}", path.display(), e);
            return None;
        }
        Err(_) => {
            debug!("{}: --version timed out", path.display());
            return None;
        }
    };

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn parse_version(stdout: &str) -> Option<String> {
    VERSION_LINE
        .captures(stdout)
        .map(|cap| cap[1].to_string())
}
