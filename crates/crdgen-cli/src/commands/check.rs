//! Check command - resolve every CRD in a stream without writing

use miette::{IntoDiagnostic, Result};

use crdgen_core::CrdStream;
use crdgen_types::{CollectingEmitter, GenerateRequest, TypeRegistry, generate_stream};

use crate::display;
use crate::exit_codes;
use crate::options::ConfigArgs;

pub fn run(args: ConfigArgs, json: bool) -> Result<()> {
    let config = args.resolve()?;
    let yaml = ConfigArgs::read_input(&config)?;

    let request = GenerateRequest::from(&config);
    let mut registry = TypeRegistry::with_known_types(config.renames.clone());
    let mut emitter = CollectingEmitter::new();
    let report = generate_stream(&request, &mut registry, CrdStream::new(&yaml), &mut emitter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    } else {
        display::print_documents(&emitter.documents);
        display::print_report(&report, &[]);
        display::print_summary(&report);
    }

    if !report.failed.is_empty() {
        std::process::exit(exit_codes::PARTIAL_FAILURE);
    }
    Ok(())
}
