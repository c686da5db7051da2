//! Display formatting for CLI output

use console::style;
use std::path::PathBuf;

use crdgen_types::{EmittedDocument, GenerationReport};

/// Summary of a generation run
pub fn print_report(report: &GenerationReport, written: &[PathBuf]) {
    for gvr in &report.generated {
        println!("  {} {}", style("✓").green(), gvr);
    }
    for kind in &report.skipped {
        println!("  {} {} (skipped)", style("-").dim(), kind);
    }
    for failed in &report.failed {
        println!("  {} {}: {}", style("✗").red(), failed.kind, failed.error);
    }
    for path in written {
        println!("  {} wrote {}", style("→").blue(), path.display());
    }
}

/// Types each kind resolved to, as found by `check`
pub fn print_documents(documents: &[EmittedDocument]) {
    for emitted in documents {
        let document = &emitted.document;
        println!(
            "{} {} {}",
            style("→").blue(),
            style(&document.kind).bold(),
            style(&document.gvr).dim()
        );
        for ty in &emitted.new_types {
            println!("    {} ({} fields)", ty.name, ty.fields().len());
        }
    }
}

pub fn print_summary(report: &GenerationReport) {
    let line = format!(
        "{} generated, {} skipped, {} failed",
        report.generated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    if report.failed.is_empty() {
        println!("{} {}", style("✓").green(), line);
    } else {
        println!("{} {}", style("⚠").yellow(), line);
    }
}
