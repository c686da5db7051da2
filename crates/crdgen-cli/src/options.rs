//! Options shared by commands that read a CRD stream
//!
//! Command line flags are layered over the configuration file: scalar
//! flags replace the file's value, list flags extend it.

use clap::Args;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::PathBuf;

use crdgen_core::{ErrorPolicy, GenerateConfig};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// CRD YAML stream to read
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Version to generate (default: each CRD's first version)
    #[arg(long = "crd-version", id = "crd_version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Kinds to skip
    #[arg(long = "skip")]
    pub skip: Vec<String>,

    /// Force a type name (FROM=TO)
    #[arg(long = "rename")]
    pub rename: Vec<String>,

    /// Keep a type name unavailable
    #[arg(long = "reserve")]
    pub reserve: Vec<String>,

    /// What to do when a CRD fails to resolve (abort or skip)
    #[arg(long)]
    pub error_policy: Option<ErrorPolicy>,
}

impl ConfigArgs {
    /// Load the configuration file, if any, and apply the flags over it
    pub fn resolve(self) -> Result<GenerateConfig> {
        let mut config = match &self.config {
            Some(path) => GenerateConfig::load(path).into_diagnostic()?,
            None => GenerateConfig::default(),
        };

        if let Some(input) = self.input {
            config.input = Some(input);
        }
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(policy) = self.error_policy {
            config.error_policy = policy;
        }
        config.skip_list.extend(self.skip);
        config.reserved.extend(self.reserve);
        for rename in &self.rename {
            config
                .add_rename(rename)
                .into_diagnostic()
                .wrap_err("Invalid --rename")?;
        }

        Ok(config)
    }

    /// Read the input stream named by the configuration
    pub fn read_input(config: &GenerateConfig) -> Result<String> {
        let input = config
            .input
            .as_ref()
            .ok_or_else(|| miette::miette!(help = "pass --input or set `input` in the config file", "No input CRD file"))?;
        std::fs::read_to_string(input)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", input.display()))
    }
}
