use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::cli::OutputFormat;
use crate::scanner::results::{HostResult, PortEntry, ScanFailure, ScanOutcome, ScanReport, SimulatedScan};

fn rule(c: char, width: usize) -> String {
    std::iter::repeat(c).take(width).collect()
}

/// Renders any `ScanOutcome` as the text shown in the terminal and saved to disk.
pub fn format_outcome(outcome: &ScanOutcome, target: &str) -> String {
    match outcome {
        ScanOutcome::Simulated(sim) => format_simulated(sim),
        ScanOutcome::Failed(failure) => format_failed(failure),
        ScanOutcome::Completed(report) => format_completed(report, target),
    }
}

fn format_simulated(sim: &SimulatedScan) -> String {
    let mut out = Vec::new();
    out.push(rule('=', 60));
    out.push("🚨 NMAP NOT INSTALLED - SHOWING DEMO RESULTS".to_string());
    out.push(rule('=', 60));
    out.push(format!("\n📅 Scan Time: {}", sim.timestamp));
    out.push(format!("🎯 Target: {}", sim.target));
    out.push(format!("📊 Scan Type: {}", sim.scan_type));
    out.push(format!("\n{}", sim.message));

    let instructions = &sim.install_instructions;
    out.push(format!("\n📋 Installation Instructions for {}:", instructions.os));
    out.push(rule('-', 40));
    for step in &instructions.steps {
        out.push(format!("   {}", step));
    }
    if let Some(alternative) = &instructions.alternative {
        out.push(format!("\n💡 Alternative: {}", alternative));
    }

    out.push(format!("\n{}", rule('=', 60)));
    out.push("📊 SAMPLE SCAN RESULTS (Demo)".to_string());
    out.push(rule('=', 60));
    let sample = &sim.sample_results;
    out.push(format!("\n🖥️  Host Status: {}", if sample.host_up { "UP" } else { "DOWN" }));
    out.push("\n🔍 Open Ports:".to_string());
    out.push(rule('-', 20));
    for port in &sample.ports {
        out.push(format!(
            "   Port {}/tcp - {} - {}",
            port.port,
            port.state.to_uppercase(),
            port.service
        ));
    }

    out.push(format!("\n{}", rule('=', 60)));
    out.push("ℹ️  Install nmap for real scanning capabilities!".to_string());
    out.push(rule('=', 60));
    out.join("\n")
}

fn format_failed(failure: &ScanFailure) -> String {
    let out = [
        rule('=', 60),
        "❌ SCAN ERROR".to_string(),
        rule('=', 60),
        format!("\n📅 Time: {}", failure.timestamp),
        format!("📊 Scan Type: {}", failure.scan_type),
        format!("\n🚨 Error: {}", failure.error),
        format!("\n{}", rule('=', 60)),
    ];
    out.join("\n")
}

fn format_completed(report: &ScanReport, target: &str) -> String {
    let mut out = Vec::new();
    out.push(rule('=', 60));
    out.push("🔍 NMAP SCAN RESULTS".to_string());
    out.push(rule('=', 60));
    out.push(format!("\n📅 Scan Time: {}", report.timestamp));
    out.push(format!("🎯 Target: {}", target));
    out.push(format!("📊 Scan Type: {}", report.scan_type));

    if report.hosts.is_empty() {
        out.push("\n❌ No hosts found or all hosts are down".to_string());
        return out.join("\n");
    }

    out.push(format!("\n🖥️  Hosts Found: {}", report.hosts.len()));
    out.push(format!("\n{}", rule('=', 60)));

    for host in &report.hosts {
        format_host(host, &mut out);
        out.push(format!("\n{}", rule('-', 60)));
    }

    out.push("\n✅ Scan completed successfully!".to_string());
    out.push(rule('=', 60));
    out.join("\n")
}

fn format_host(host: &HostResult, out: &mut Vec<String>) {
    out.push(format!("\n🌐 Host: {}", host.address));
    out.push(format!("   Status: {}", host.state.to_uppercase()));

    let names = host.named_hostnames();
    if !names.is_empty() {
        out.push(format!("   Hostname: {}", names.join(", ")));
    }

    for (protocol, ports) in &host.protocols {
        out.push(format!("\n   📡 Protocol: {}", protocol.to_uppercase()));
        if ports.is_empty() {
            continue;
        }
        out.push("   🔍 Open Ports:".to_string());
        out.push(format!("   {}", rule('-', 40)));
        for port in ports {
            out.push(format!(
                "      {}/{} - {} - {}",
                port.port,
                port.protocol,
                port.state.to_uppercase(),
                service_label(port)
            ));
        }
    }

    if !host.os_matches.is_empty() {
        out.push("\n   💻 OS Detection:".to_string());
        for os in &host.os_matches {
            let accuracy = os
                .accuracy
                .map(|a| a.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            out.push(format!("      {} (Accuracy: {}%)", os.name, accuracy));
        }
    }
}

/// `name`, or `name (product version)` when nmap identified the product.
fn service_label(port: &PortEntry) -> String {
    let service = match &port.service {
        Some(service) => service,
        None => return "unknown".to_string(),
    };

    let mut label = if service.name.is_empty() {
        "unknown".to_string()
    } else {
        service.name.clone()
    };
    if let Some(product) = &service.product {
        label.push_str(&format!(" ({}", product));
        if let Some(version) = &service.version {
            label.push_str(&format!(" {}", version));
        }
        label.push(')');
    }
    label
}

/// Renders outcomes and optionally saves them alongside a short header.
pub struct OutputWriter {
    format: OutputFormat,
    file: Option<PathBuf>,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, file: Option<PathBuf>) -> Self {
        Self { format, file }
    }

    pub fn render(&self, outcome: &ScanOutcome, target: &str) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(format_outcome(outcome, target)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        }
    }

    /// Writes the rendered report to the configured file, if any.
    pub fn save(&self, rendered: &str, header: &SaveHeader) -> Result<Option<&Path>> {
        let path = match &self.file {
            Some(path) => path,
            None => return Ok(None),
        };

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        if self.format == OutputFormat::Text {
            writer.write_all(header.render().as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.write_all(rendered.as_bytes())?;
        writer.flush()?;

        Ok(Some(path.as_path()))
    }
}

/// Context lines written above a saved text report.
pub struct SaveHeader {
    pub saved_at: String,
    pub target: String,
    pub scan_type: String,
    pub ports: Option<String>,
}

impl SaveHeader {
    pub fn render(&self) -> String {
        let mut header = String::new();
        header.push_str(&format!("Scan Results - {}\n", self.saved_at));
        header.push_str(&rule('=', 60));
        header.push('\n');
        header.push_str(&format!("Target: {}\n", self.target));
        header.push_str(&format!("Scan Type: {}\n", self.scan_type));
        if let Some(ports) = &self.ports {
            header.push_str(&format!("Port Range: {}\n", ports));
        }
        header
    }
}
