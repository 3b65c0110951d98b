use crate::config::Config;
use rundata_kernel::{CheckReport, Finding, Layout, ReadOutcome, TestSuite};
use std::fmt::Display;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Where human-readable progress goes.
pub struct Status {
    to_stderr: bool,
}

impl Status {
    pub fn new(to_stderr: bool) -> Self {
        Self { to_stderr }
    }

    pub fn line(&self, message: impl Display) {
        if self.to_stderr {
            eprintln!("{message}");
        } else {
            println!("{message}");
        }
    }
}

pub fn load_config_or_exit(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    Config::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn read_suite_or_exit(root: &Path, layout: &Layout) -> ReadOutcome {
    TestSuite::read(root, layout).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn print_findings(status: &Status, heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    status.line(format!("{heading} ({}):", findings.len()));
    for finding in findings {
        status.line(format!(
            "  {}: {} [{}]",
            finding.test_dir, finding.message, finding.class
        ));
    }
}

pub fn print_report_json(report: &CheckReport) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).expect("json serialization")
    );
}
