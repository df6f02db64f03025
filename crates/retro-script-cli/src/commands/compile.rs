//! Compile command - build a bytecode image from a project.

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use super::compile_project;
use crate::config::load_project;

#[derive(Args)]
pub struct CompileCommand {
    /// Project file
    pub project: PathBuf,

    /// Output image
    #[arg(short, long, default_value = "scripts.bin")]
    pub output: PathBuf,
}

impl CompileCommand {
    pub fn run(&self) -> Result<()> {
        let project = load_project(&self.project)?;
        let program = compile_project(&project)?;

        let image = program.export_image(0, 0, 0..project.last_type() + 1);
        let file = File::create(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        let mut writer = BufWriter::new(file);
        image
            .write_to(&mut writer)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        println!(
            "Wrote {} ({} code words, {} jump entries, {} object types, {} functions)",
            self.output.display(),
            image.code.len(),
            image.jump_table.len(),
            image.objects.len(),
            image.functions.len()
        );
        Ok(())
    }
}
