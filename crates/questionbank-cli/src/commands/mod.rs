//! Subcommand implementations.

pub mod bank;
pub mod edit;
pub mod init;
pub mod report;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use questionbank_core::model::Program;
use questionbank_core::parser;
use questionbank_core::QuestionCatalog;

use crate::config::{load_config_from, QuestionBankConfig};
use crate::PathArgs;

/// A loaded catalog and program, plus where the program came from.
pub struct Workspace {
    pub config: QuestionBankConfig,
    pub catalog: QuestionCatalog,
    pub program: Program,
    pub program_path: PathBuf,
}

/// Resolve the config, applying command-line path overrides.
pub fn resolve_config(paths: &PathArgs) -> Result<QuestionBankConfig> {
    let mut config = load_config_from(paths.config.as_deref())?;
    if let Some(catalog) = &paths.catalog {
        config.catalog = catalog.clone();
    }
    if let Some(program) = &paths.program {
        config.program = program.clone();
    }
    Ok(config)
}

impl Workspace {
    pub fn load(paths: &PathArgs) -> Result<Self> {
        let config = resolve_config(paths)?;
        let catalog = parser::parse_catalog(&config.catalog)?;
        let program = parser::parse_program(&config.program)?;
        tracing::debug!(
            catalog = %config.catalog.display(),
            program = %config.program.display(),
            questions = catalog.len(),
            blocks = program.blocks.len(),
            "workspace loaded"
        );
        let program_path = config.program.clone();
        Ok(Self {
            config,
            catalog,
            program,
            program_path,
        })
    }

    /// Write the program back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        parser::save_program(&self.program_path, &self.program)
    }
}
