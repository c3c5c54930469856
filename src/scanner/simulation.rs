use crate::cli::ScanPreset;
use crate::scanner::results::{InstallInstructions, SamplePort, SampleResults, SimulatedScan};

pub const NOT_FOUND_MESSAGE: &str = "Nmap not found. Install nmap to perform real scans.";

/// Demo payload returned when no working nmap binary was found.
pub fn simulate_scan(target: &str, scan_type: ScanPreset, timestamp: String) -> SimulatedScan {
    SimulatedScan {
        message: NOT_FOUND_MESSAGE.to_string(),
        install_instructions: install_instructions(),
        target: target.to_string(),
        scan_type,
        timestamp,
        sample_results: SampleResults {
            host_up: true,
            ports: vec![
                sample_port(22, "ssh"),
                sample_port(80, "http"),
                sample_port(443, "https"),
            ],
        },
    }
}

fn sample_port(port: u16, service: &str) -> SamplePort {
    SamplePort {
        port,
        state: "open".to_string(),
        service: service.to_string(),
    }
}

/// Install steps for the OS this binary was built for.
pub fn install_instructions() -> InstallInstructions {
    if cfg!(target_os = "windows") {
        windows_instructions()
    } else if cfg!(target_os = "macos") {
        macos_instructions()
    } else {
        linux_instructions()
    }
}

fn windows_instructions() -> InstallInstructions {
    InstallInstructions {
        os: "Windows".to_string(),
        steps: steps(&[
            "1. Download Nmap from https://nmap.org/download.html",
            "2. Run the installer (nmap-X.XX-setup.exe)",
            "3. Follow the installation wizard",
            "4. Restart this application",
        ]),
        alternative: Some("Or use: winget install Nmap.Nmap".to_string()),
    }
}

fn macos_instructions() -> InstallInstructions {
    InstallInstructions {
        os: "macOS".to_string(),
        steps: steps(&[
            "1. Install Homebrew if not installed",
            "2. Run: brew install nmap",
            "3. Restart this application",
        ]),
        alternative: Some("Or download from https://nmap.org/download.html".to_string()),
    }
}

fn linux_instructions() -> InstallInstructions {
    InstallInstructions {
        os: "Linux".to_string(),
        steps: steps(&[
            "1. Ubuntu/Debian: sudo apt install nmap",
            "2. CentOS/RHEL: sudo yum install nmap",
            "3. Arch: sudo pacman -S nmap",
            "4. Restart this application",
        ]),
        alternative: None,
    }
}

fn steps(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}
