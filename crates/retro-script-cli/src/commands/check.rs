//! Check command - compile a single script and report diagnostics.

use anyhow::{Context, Result};
use clap::Args;
use retro_script_compiler::Compiler;
use std::path::PathBuf;

use super::report;
use crate::config::load_or_default;

#[derive(Args)]
pub struct CheckCommand {
    /// Script file
    pub script: PathBuf,

    /// Object type the script is compiled for
    #[arg(long = "type", default_value_t = 1)]
    pub object_type: usize,

    /// Project file supplying name tables
    #[arg(long, short = 'p')]
    pub project: Option<PathBuf>,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let project = load_or_default(self.project.as_deref())?;
        let mut compiler = Compiler::new(project.name_tables(), project.compiler_options());
        compiler
            .compile_file(&self.script, self.object_type)
            .with_context(|| format!("Failed to read {}", self.script.display()))?;

        report(compiler.diagnostics());
        let errors = compiler.diagnostics().errors().count();
        if errors > 0 {
            anyhow::bail!("{}: {} error(s)", self.script.display(), errors);
        }

        let program = compiler.program();
        println!(
            "{}: ok ({} code words, {} jump entries)",
            self.script.display(),
            program.code.len(),
            program.jump_table.len()
        );
        Ok(())
    }
}
