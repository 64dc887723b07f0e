use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use snitch_core::{AuditOptions, AuditReport, Auditor, ConsoleLog};
use snitch_scanner::HttpRenderer;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the process should exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    InsecurityFound,
    Fatal,
}

impl Outcome {
    pub fn from_report(report: &AuditReport) -> Self {
        if report.has_insecurity() {
            Outcome::InsecurityFound
        } else {
            Outcome::Clean
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Outcome::Clean => 0,
            Outcome::Fatal => 1,
            Outcome::InsecurityFound => 2,
        }
    }
}

pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // Diagnostics go to stderr so they never mix with the audit lines
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn audit_options_from_matches(matches: &ArgMatches) -> AuditOptions {
    AuditOptions {
        start_url: matches.get_one::<String>("url").cloned(),
        crawl: matches.get_flag("crawl"),
        log_all_requests: matches.get_flag("logAllRequests"),
        ignore_iframes: matches.get_flag("ignoreIframes"),
        ignore_forms: matches.get_flag("ignoreForms"),
    }
}

/// Expand `~` in a user supplied path
pub fn expand_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn write_report(report: &AuditReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    report
        .write_json(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

pub async fn handle_audit(matches: &ArgMatches) -> Outcome {
    let options = audit_options_from_matches(matches);
    let timeout = *matches.get_one::<u64>("timeout").unwrap_or(&30);
    debug!("Audit options: {:?} (timeout {}s)", options, timeout);

    let renderer = match HttpRenderer::with_timeout(timeout) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            return Outcome::Fatal;
        }
    };

    let mut auditor = Auditor::new(renderer, options, ConsoleLog);
    let report = match auditor.run().await {
        Ok(report) => report,
        // The auditor has already reported why
        Err(_) => return Outcome::Fatal,
    };

    if let Some(raw) = matches.get_one::<String>("output") {
        let path = expand_output_path(raw);
        if let Err(e) = write_report(&report, &path) {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            return Outcome::Fatal;
        }
        println!(
            "{} Report written to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }

    Outcome::from_report(&report)
}
