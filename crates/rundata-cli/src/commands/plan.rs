use crate::config::Config;
use rundata_kernel::{TestSuite, write_atomic};
use rundata_plan::{PlanFormat, TreeMerger, build_plan, render};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct Args<'a> {
    pub suite: &'a TestSuite,
    pub config: &'a Config,
    pub format: PlanFormat,
    pub merge: Option<&'a Path>,
    pub output: Option<&'a Path>,
}

fn load_document_or_exit(path: &Path) -> Value {
    let bytes = fs::read(path).unwrap_or_else(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        std::process::exit(1);
    });
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        eprintln!("error: invalid plan document {}: {e}", path.display());
        std::process::exit(1);
    })
}

pub fn run(args: Args<'_>) {
    let plan = build_plan(args.suite).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    let merger = TreeMerger::new(args.format)
        .with_code_url_prefix(args.config.plan.code_url_prefix.as_str());
    let document = match args.merge {
        Some(path) => load_document_or_exit(path),
        None => merger.skeleton(&args.config.plan.title),
    };
    let merged = merger.merge(&plan, &document).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let rendered = render(&merged).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    });

    match args.output {
        Some(path) => {
            write_atomic(path, rendered.as_bytes()).unwrap_or_else(|e| {
                eprintln!("error: {e}");
                std::process::exit(1);
            });
            info!(
                path = %path.display(),
                format = %args.format,
                cases = plan.case_count(),
                "plan document written"
            );
        }
        None => print!("{rendered}"),
    }
}
