use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nmapscope")]
#[command(author = "NmapScope")]
#[command(version = "0.1.0")]
#[command(about = "Terminal front-end for nmap with scan presets and readable reports", long_about = None)]
#[command(after_help = "Examples:\n  nmapscope 192.168.1.1\n  nmapscope example.com --scan-type \"Intense Scan\"\n  nmapscope 192.168.1.1 --ports \"1-1000\"\n\nFor more help: nmapscope --help-detailed")]
pub struct Cli {
    #[arg(required_unless_present = "help_detailed", help = "Target IP address, hostname, or network range")]
    pub target: Option<String>,

    #[arg(short = 's', long, value_enum, help = "Type of scan to perform (default: Quick Scan)")]
    pub scan_type: Option<ScanPreset>,

    #[arg(short, long, help = "Port range (e.g. \"1-1000\" or \"22,80,443\")")]
    pub ports: Option<String>,

    #[arg(short, long, help = "Output file to save results")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text", help = "Report format")]
    pub format: OutputFormat,

    #[arg(long, help = "Path to the nmap executable (skips discovery)")]
    pub nmap_path: Option<PathBuf>,

    #[arg(long, value_name = "SECS", help = "Abort the scan after this many seconds")]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Show banner")]
    pub banner: bool,

    #[arg(long, help = "Show detailed help and examples")]
    pub help_detailed: bool,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
}

impl Cli {
    /// JSON reports own stdout; everything else moves to stderr.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// The five fixed nmap flag bundles offered to the user.
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScanPreset {
    #[value(name = "Quick Scan", alias = "quick", help = "Fast scan of most common ports")]
    #[serde(rename = "Quick Scan")]
    Quick,
    #[value(name = "Intense Scan", alias = "intense", help = "Comprehensive scan with OS detection")]
    #[serde(rename = "Intense Scan")]
    Intense,
    #[value(name = "Ping Scan", alias = "ping", help = "Host discovery scan")]
    #[serde(rename = "Ping Scan")]
    Ping,
    #[value(name = "Port Scan", alias = "port", help = "TCP SYN scan of a port range (requires root)")]
    #[serde(rename = "Port Scan")]
    Port,
    #[value(name = "Service Detection", alias = "service", help = "Identify services and versions")]
    #[serde(rename = "Service Detection")]
    ServiceDetection,
}

impl ScanPreset {
    pub const ALL: [ScanPreset; 5] = [
        ScanPreset::Quick,
        ScanPreset::Intense,
        ScanPreset::Ping,
        ScanPreset::Port,
        ScanPreset::ServiceDetection,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScanPreset::Quick => "Quick Scan",
            ScanPreset::Intense => "Intense Scan",
            ScanPreset::Ping => "Ping Scan",
            ScanPreset::Port => "Port Scan",
            ScanPreset::ServiceDetection => "Service Detection",
        }
    }

    /// Fixed nmap flags for this preset.
    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            ScanPreset::Quick => &["-T4", "-F"],
            ScanPreset::Intense => &["-T4", "-A", "-v"],
            ScanPreset::Ping => &["-sn"],
            ScanPreset::Port => &["-sS"],
            ScanPreset::ServiceDetection => &["-sV"],
        }
    }

    /// Looks a preset up by display name. Unknown names fall back to Quick Scan.
    pub fn from_name(name: &str) -> ScanPreset {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(ScanPreset::Quick)
    }
}

impl std::fmt::Display for ScanPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    #[value(name = "text", help = "Human-readable report")]
    Text,
    #[value(name = "json", help = "JSON output")]
    Json,
}

pub const BANNER: &str = r#"
╔══════════════════════════════════════════════════════════╗
║  🔍 NmapScope - nmap front-end for the terminal          ║
║                                                          ║
║  Presets: Quick / Intense / Ping / Port / Service        ║
║  Docs:    nmapscope --help-detailed                      ║
╚══════════════════════════════════════════════════════════╝
"#;

pub const DETAILED_HELP: &str = r#"
📖 USAGE EXAMPLES:

Basic scans:
  nmapscope 192.168.1.1
  nmapscope example.com
  nmapscope 192.168.1.0/24

Specific scan types:
  nmapscope 192.168.1.1 --scan-type "Quick Scan"
  nmapscope 192.168.1.1 --scan-type "Intense Scan"
  nmapscope 192.168.1.1 --scan-type "Ping Scan"
  nmapscope 192.168.1.1 --scan-type "Service Detection"

Port range scans:
  nmapscope 192.168.1.1 --ports "1-1000"
  nmapscope 192.168.1.1 --ports "22,80,443,8080"
  nmapscope 192.168.1.1 --scan-type "Port Scan" --ports "1-65535"

🎯 SCAN TYPES:
  • Quick Scan        - Fast scan of most common ports     (-T4 -F)
  • Intense Scan      - Comprehensive scan with OS detection (-T4 -A -v)
  • Ping Scan         - Host discovery scan                (-sn)
  • Port Scan         - Custom port range scanning         (-sS)
  • Service Detection - Identify services and versions     (-sV)

📱 ANDROID/TERMUX TIPS:
  • Use WiFi for better performance
  • Avoid intensive scans on mobile data
  • Consider battery usage for long scans
  • Some features require root access
  • Use screen/tmux for long-running scans

⚙️  CONFIGURATION:
  Optional JSON file at <config dir>/nmapscope/config.json with the keys
  nmap_path, extra_search_paths, probe_timeout_secs, default_scan_type
  and scan_timeout_secs. Command-line flags take precedence.

⚠️  LEGAL NOTICE:
Only scan networks and systems you own or have explicit permission to test.
"#;
