use crate::config::Config;
use crate::support::{Status, print_findings, print_report_json, read_suite_or_exit};
use rundata_kernel::{CheckReport, ReadOutcome, TestSuite};
use std::path::Path;
use tracing::info;

fn full_report(outcome: &ReadOutcome) -> CheckReport {
    let report = outcome.suite.check();
    let mut findings = report.errors;
    findings.extend(outcome.discovery.iter().cloned());
    CheckReport::from_findings(outcome.suite.len(), findings)
}

/// Validate without touching the filesystem.
pub fn check(root: &Path, config: &Config, json_output: bool, status: &Status) -> TestSuite {
    let outcome = read_suite_or_exit(root, &config.layout);
    let report = full_report(&outcome);

    if json_output {
        print_report_json(&report);
    } else {
        print_findings(status, "Problems", &report.errors);
    }

    if !report.accepted() {
        eprintln!(
            "error: rundata check failed: {} problem(s) in {} test(s); run with --fix to update",
            report.summary.error_count, report.summary.test_count
        );
        std::process::exit(1);
    }
    if !json_output {
        status.line(format!(
            "rundata check passed: {} test(s)",
            report.summary.test_count
        ));
    }
    outcome.suite
}

/// Compute canonical records and persist the ones that changed.
pub fn fix(root: &Path, config: &Config, status: &Status) -> TestSuite {
    let outcome = read_suite_or_exit(root, &config.layout);
    let report = full_report(&outcome);
    print_findings(status, "Problems before fix", &report.errors);

    if !outcome.discovery.is_empty() {
        eprintln!(
            "error: {} test directories are outside the expected layout; move them before fixing",
            outcome.discovery.len()
        );
        std::process::exit(1);
    }

    let mut suite = outcome.suite;
    let fixed = suite.fix(config.record.default_testbed);
    info!(
        fixed = fixed.fixed,
        propagated = fixed.propagated.len(),
        "computed canonical records"
    );
    if !fixed.errors.is_empty() {
        for err in &fixed.errors {
            eprintln!("error: {err}");
        }
        std::process::exit(1);
    }

    let consistency = suite.check_fixed();
    if !consistency.accepted() {
        print_findings(status, "Conflicts after fix", &consistency.errors);
        eprintln!(
            "error: fixed records conflict in {} place(s); nothing was written",
            consistency.summary.error_count
        );
        std::process::exit(1);
    }

    let summary = suite.write(root, &config.layout).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    if summary.is_noop() {
        status.line("rundata is up to date; nothing changed");
    } else {
        for test_dir in &summary.updated {
            status.line(format!("Updated: {test_dir}"));
        }
    }
    suite
}
