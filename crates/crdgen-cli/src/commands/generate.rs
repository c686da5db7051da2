//! Generate command - write descriptors for every CRD in a stream

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

use crdgen_core::CrdStream;
use crdgen_types::{GenerateRequest, TypeRegistry, generate_stream};

use crate::display;
use crate::emitter::{ManifestEmitter, Target, prepare_directory};
use crate::exit_codes;
use crate::options::ConfigArgs;

pub fn run(args: ConfigArgs, output: Option<PathBuf>, stdout: bool, force: bool) -> Result<()> {
    let config = args.resolve()?;
    let yaml = ConfigArgs::read_input(&config)?;

    let target = if stdout {
        Target::Stdout
    } else {
        let path = output
            .or_else(|| config.output.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        prepare_directory(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        Target::Directory { path, force }
    };

    let request = GenerateRequest::from(&config);
    let mut registry = TypeRegistry::with_known_types(config.renames.clone());
    let mut emitter = ManifestEmitter::new(target);

    info!(input = ?config.input, version = %config.version, "generating");
    let report = generate_stream(&request, &mut registry, CrdStream::new(&yaml), &mut emitter)?;

    if !stdout {
        println!("{} Generated types", style("→").blue());
        display::print_report(&report, emitter.written());
        display::print_summary(&report);
    }

    if !report.failed.is_empty() {
        std::process::exit(exit_codes::PARTIAL_FAILURE);
    }
    Ok(())
}
