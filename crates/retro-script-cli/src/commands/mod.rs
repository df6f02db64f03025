//! Subcommands.

pub mod check;
pub mod compile;
pub mod dump;
pub mod run;

pub use check::CheckCommand;
pub use compile::CompileCommand;
pub use dump::DumpCommand;
pub use run::RunCommand;

use anyhow::{Context, Result};
use retro_script_bytecode::Program;
use retro_script_compiler::{Compiler, Diagnostics};

use crate::config::ProjectConfig;

/// Print diagnostics to stderr
pub fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
}

/// Compile every script of a project into one program
pub fn compile_project(project: &ProjectConfig) -> Result<Program> {
    let mut compiler = Compiler::new(project.name_tables(), project.compiler_options());
    for (path, object_type) in project.resolved_scripts() {
        tracing::info!(script = %path.display(), object_type, "compiling");
        compiler
            .compile_file(&path, object_type)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    report(compiler.diagnostics());
    compiler.finish().map_err(|failure| {
        anyhow::anyhow!(
            "compilation failed with {} error(s)",
            failure.diagnostics.iter().filter(|d| d.is_error()).count()
        )
    })
}
