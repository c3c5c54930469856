use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

use crate::cli::{Cli, BANNER, DETAILED_HELP};
use crate::config::Config;
use crate::network::{validate_target, TargetKind};
use crate::output::{OutputWriter, SaveHeader};
use crate::scanner::{timestamp, NmapScanner, ScanOutcome};

/// Report text goes to `out`. Console chrome goes there too, except in JSON
/// mode where it moves to `err` so stdout stays parseable.
pub struct Console<W: Write, E: Write> {
    out: W,
    err: E,
    json: bool,
}

impl<W: Write, E: Write> Console<W, E> {
    pub fn new(out: W, err: E, json: bool) -> Self {
        Self { out, err, json }
    }

    pub fn into_parts(self) -> (W, E) {
        (self.out, self.err)
    }

    fn say(&mut self, line: impl Display) -> std::io::Result<()> {
        if self.json {
            writeln!(self.err, "{}", line)
        } else {
            writeln!(self.out, "{}", line)
        }
    }

    fn print(&mut self, line: impl Display) -> std::io::Result<()> {
        writeln!(self.out, "{}", line)
    }
}

/// Runs the whole command and returns the process exit code.
pub async fn run<W: Write, E: Write>(cli: &Cli, config: &Config, console: &mut Console<W, E>) -> Result<i32> {
    if cli.help_detailed {
        console.say(BANNER.truecolor(0, 212, 255))?;
        console.say(DETAILED_HELP)?;
        return Ok(0);
    }

    if cli.banner {
        console.say(BANNER.truecolor(0, 212, 255))?;
    }

    let raw_target = cli.target.clone().unwrap_or_default();
    let target_kind = match validate_target(&raw_target) {
        Ok(kind) => kind,
        Err(e) => {
            console.say(format!("{} {}", "❌ Error:".red().bold(), e))?;
            return Ok(1);
        }
    };

    let scanner = NmapScanner::discover(cli.nmap_path.as_deref(), config).await;
    if let Some(binary) = scanner.binary() {
        debug!(
            "Using nmap {} at {}",
            binary.version.as_deref().unwrap_or("(unknown version)"),
            binary.path.display()
        );
    }

    run_scan(cli, config, raw_target.trim(), &target_kind, scanner, console).await
}

/// Scans a validated target with an already located scanner and reports the result.
pub async fn run_scan<W: Write, E: Write>(
    cli: &Cli,
    config: &Config,
    target: &str,
    target_kind: &TargetKind,
    scanner: NmapScanner,
    console: &mut Console<W, E>,
) -> Result<i32> {
    let preset = cli.scan_type.unwrap_or_else(|| config.default_preset());
    let ports = cli
        .ports
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from);
    let scan_timeout = cli.timeout.or(config.scan_timeout_secs).map(Duration::from_secs);
    let scanner = scanner.with_scan_timeout(scan_timeout);

    console.say(format!("\n🎯 Target: {}", target.bright_white().bold()))?;
    console.say(format!("📊 Scan Type: {}", preset.to_string().truecolor(255, 140, 0).bold()))?;
    if let Some(ports) = &ports {
        console.say(format!("🔍 Port Range: {}", ports))?;
    }
    console.say(format!("⏰ Started: {}", timestamp()))?;
    console.say("=".repeat(60))?;

    if cli.verbose {
        if let Some(count) = target_kind.host_count().filter(|c| *c > 1) {
            console.say(format!("🌐 Addresses in range: {}", count))?;
        }
        console.say(format!("🔍 Starting {} of {}...", preset, target))?;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("⟦{spinner:.bright_magenta}⟧ [{elapsed_precise}] {msg}")?
    );
    spinner.set_message(format!("Scanning {} ({})", target, preset));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut scan = {
        let target = target.to_string();
        let ports = ports.clone();
        tokio::spawn(async move { scanner.scan(&target, preset, ports.as_deref()).await })
    };

    let outcome: ScanOutcome = tokio::select! {
        joined = &mut scan => {
            spinner.finish_and_clear();
            joined?
        }
        _ = tokio::signal::ctrl_c() => {
            spinner.finish_and_clear();
            scan.abort();
            // Wait for the task to drop so the nmap child is killed.
            let _ = scan.await;
            console.say(format!("\n\n{}", "⏹️  Scan interrupted by user".yellow()))?;
            return Ok(1);
        }
    };

    let writer = OutputWriter::new(cli.format, cli.output.clone());
    let rendered = writer.render(&outcome, target)?;
    console.print(&rendered)?;

    let header = SaveHeader {
        saved_at: timestamp(),
        target: target.to_string(),
        scan_type: preset.to_string(),
        ports,
    };
    match writer.save(&rendered, &header) {
        Ok(Some(path)) => console.say(format!("\n💾 Results saved to: {}", path.display()))?,
        Ok(None) => {}
        Err(e) => console.say(format!("{} {}", "❌ Error saving results:".red(), e))?,
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::NmapBinary;
    use clap::Parser;

    type Buffers = Console<Vec<u8>, Vec<u8>>;

    fn console(json: bool) -> Buffers {
        Console::new(Vec::new(), Vec::new(), json)
    }

    fn captured(console: Buffers) -> (String, String) {
        let (out, err) = console.into_parts();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nmapscope").chain(args.iter().copied())).unwrap()
    }

    async fn scan_with(cli: &Cli, scanner: NmapScanner, console: &mut Buffers) -> i32 {
        let target = cli.target.clone().unwrap();
        let kind = validate_target(&target).unwrap();
        run_scan(cli, &Config::default(), target.trim(), &kind, scanner, console)
            .await
            .unwrap()
    }

    fn missing_binary() -> NmapScanner {
        NmapScanner::with_binary(NmapBinary {
            path: "/nonexistent/dir/nmap-for-tests".into(),
            version: None,
        })
    }

    #[tokio::test]
    async fn test_invalid_target_exits_one() {
        let mut console = console(false);
        let code = run(&cli(&["ab"]), &Config::default(), &mut console).await.unwrap();
        assert_eq!(code, 1);

        let (out, _) = captured(console);
        assert!(out.contains("Target seems too short"));
        assert!(!out.contains("Started:"));
    }

    #[tokio::test]
    async fn test_help_detailed_exits_zero() {
        let mut console = console(false);
        let code = run(&cli(&["--help-detailed"]), &Config::default(), &mut console).await.unwrap();
        assert_eq!(code, 0);

        let (out, _) = captured(console);
        assert!(out.contains("USAGE EXAMPLES"));
        assert!(out.contains("LEGAL NOTICE"));
    }

    #[tokio::test]
    async fn test_simulated_outcome_exits_zero() {
        let cli = cli(&["192.168.1.1", "--ports", "22,80", "-v"]);
        let mut console = console(false);
        assert_eq!(scan_with(&cli, NmapScanner::unavailable(), &mut console).await, 0);

        let (out, _) = captured(console);
        assert!(out.contains("🔍 Port Range: 22,80"));
        assert!(out.contains("🔍 Starting Quick Scan of 192.168.1.1..."));
        assert!(out.contains("NMAP NOT INSTALLED"));
        assert!(!out.contains("Results saved to"));
    }

    #[tokio::test]
    async fn test_failed_outcome_exits_zero() {
        let cli = cli(&["10.0.0.1", "-s", "ping"]);
        let mut console = console(false);
        assert_eq!(scan_with(&cli, missing_binary(), &mut console).await, 0);

        let (out, _) = captured(console);
        assert!(out.contains("❌ SCAN ERROR"));
        assert!(out.contains("📊 Scan Type: "));
        assert!(out.contains("Ping Scan"));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().to_string_lossy().into_owned();
        let cli = cli(&["10.0.0.1", "--output", &output]);
        let mut console = console(false);
        assert_eq!(scan_with(&cli, NmapScanner::unavailable(), &mut console).await, 0);

        let (out, _) = captured(console);
        assert!(out.contains("Error saving results:"));
        assert!(!out.contains("Results saved to"));
    }

    #[tokio::test]
    async fn test_saved_report_announced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.txt");
        let output = path.to_string_lossy().into_owned();
        let cli = cli(&["10.0.0.1", "-o", &output]);
        let mut console = console(false);
        assert_eq!(scan_with(&cli, NmapScanner::unavailable(), &mut console).await, 0);

        let (out, _) = captured(console);
        assert!(out.contains(&format!("💾 Results saved to: {}", path.display())));
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("Scan Results - "));
        assert!(saved.contains("NMAP NOT INSTALLED"));
    }

    #[tokio::test]
    async fn test_json_keeps_stdout_clean() {
        let cli = cli(&["10.0.0.1", "--format", "json"]);
        assert!(cli.is_json());
        let mut console = console(cli.is_json());
        assert_eq!(scan_with(&cli, missing_binary(), &mut console).await, 0);

        let (out, err) = captured(console);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["outcome"], "failed");
        assert!(err.contains("⏰ Started:"));
    }
}
