use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use lcc_core::errors::{ErrorInfo, LccError};
use lcc_stats::config::{load_config, AnalysisConfig};
use lcc_stats::serde::to_canonical_json_bytes;
use lcc_stats::{render_per_run, render_text, summarize, Report};
use log::{debug, LevelFilter};
use simple_logger::SimpleLogger;

#[derive(Parser, Debug)]
#[command(
    name = "lcc-conf",
    version,
    about = "Mean and confidence interval summary of repeated LCC simulation runs"
)]
struct Cli {
    /// Headerless result CSV written by the simulation [default: manual_results.csv].
    #[arg(long)]
    input: Option<PathBuf>,
    /// Scenario title printed in the report banner [default: Simulation Results].
    #[arg(long)]
    scenario: Option<String>,
    /// YAML file with analysis settings; flags given here override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Two-sided confidence level of the intervals [default: 0.95].
    #[arg(long)]
    confidence: Option<f64>,
    /// Fail when runs do not all contain the same number of nodes.
    #[arg(long)]
    require_uniform_runs: bool,
    /// Emit the report as canonical JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Append per-run metrics to the text report.
    #[arg(long)]
    per_run: bool,
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG is ignored.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Level chosen by `-q`/`-v` alone; the environment is not consulted.
fn log_level(cli: &Cli) -> LevelFilter {
    if cli.quiet {
        return LevelFilter::Error;
    }
    match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn init_logging(cli: &Cli) {
    if let Err(err) = SimpleLogger::new().with_level(log_level(cli)).init() {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn run(cli: &Cli) -> Result<(), LccError> {
    let config = resolve_config(cli)?;
    debug!("resolved configuration: {config:?}");
    let report = summarize(&config)?;
    let rendered = render(cli, &report)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(rendered.as_bytes())
        .and_then(|_| handle.flush())
        .map_err(|err| {
            LccError::Io(
                ErrorInfo::new("lcc_cli.stdout", "failed to write report")
                    .with_hint(err.to_string()),
            )
        })
}

/// Defaults, then the YAML file, then command line flags.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig, LccError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(input) = &cli.input {
        config.input_path = input.clone();
    }
    if let Some(scenario) = &cli.scenario {
        config.scenario_label = scenario.clone();
    }
    if let Some(level) = cli.confidence {
        config.confidence_level = level;
    }
    if cli.require_uniform_runs {
        config.require_uniform_runs = true;
    }
    config.validate()?;
    Ok(config)
}

fn render(cli: &Cli, report: &Report) -> Result<String, LccError> {
    if cli.json {
        let bytes = to_canonical_json_bytes(report)?;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        text.push('\n');
        return Ok(text);
    }
    let mut text = render_text(report);
    if cli.per_run {
        text.push('\n');
        text.push_str(&render_per_run(report));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn flags_override_yaml() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("analysis.yaml");
        fs::write(
            &path,
            "input_path: from_yaml.csv\nscenario_label: Yaml\nconfidence_level: 0.9\n",
        )
        .expect("write");
        let cli = Cli::parse_from([
            "lcc-conf",
            "--config",
            path.to_str().expect("utf8 path"),
            "--scenario",
            "Flag",
        ]);
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.input_path, PathBuf::from("from_yaml.csv"));
        assert_eq!(config.scenario_label, "Flag");
        assert_eq!(config.confidence_level, 0.9);
    }

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::parse_from(["lcc-conf"]);
        assert_eq!(resolve_config(&cli).expect("config"), AnalysisConfig::default());
    }

    #[test]
    fn invalid_confidence_flag_is_config_error() {
        let cli = Cli::parse_from(["lcc-conf", "--confidence", "1.2"]);
        let err = resolve_config(&cli).expect_err("invalid");
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn log_level_follows_flags() {
        let level = |args: &[&str]| log_level(&Cli::parse_from(args));
        assert_eq!(level(&["lcc-conf"]), LevelFilter::Warn);
        assert_eq!(level(&["lcc-conf", "-v"]), LevelFilter::Info);
        assert_eq!(level(&["lcc-conf", "-vvv"]), LevelFilter::Debug);
        assert_eq!(level(&["lcc-conf", "-q"]), LevelFilter::Error);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["lcc-conf", "-q", "-v"]).is_err());
    }
}
