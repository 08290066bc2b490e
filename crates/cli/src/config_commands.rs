use {anyhow::Result, clap::Subcommand};

use porch_config::validate::{self, Severity};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration as TOML.
    Show,
    /// Print the path the config is read from (or would be created at).
    Path,
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(verbose),
        ConfigAction::Show => {
            let config = porch_config::discover_and_load();
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
        ConfigAction::Path => {
            println!("{}", porch_config::find_or_default_config_path().display());
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(verbose: bool) -> Result<()> {
    let result = validate::validate(None);

    match result.config_path {
        Some(ref path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let shown: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .collect();

    for d in &shown {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Info => CYAN,
        };
        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{}{RESET} {}", d.severity, d.message);
        } else {
            eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
        }
    }
    if !shown.is_empty() {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
