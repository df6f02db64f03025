//! Dump command - disassemble a bytecode image.

use anyhow::{Context, Result};
use clap::Args;
use retro_script_bytecode::{BytecodeImage, Event, ScriptDescriptor, disassemble};
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args)]
pub struct DumpCommand {
    /// Bytecode image
    pub image: PathBuf,

    /// Print the image as JSON instead of a listing
    #[arg(long)]
    pub json: bool,
}

impl DumpCommand {
    pub fn run(&self) -> Result<()> {
        let file = File::open(&self.image)
            .with_context(|| format!("Failed to open {}", self.image.display()))?;
        let image = BytecodeImage::read_from(&mut BufReader::new(file))
            .with_context(|| format!("Failed to decode {}", self.image.display()))?;

        if self.json {
            println!("{}", image.to_json()?);
        } else {
            print!("{}", listing(&image)?);
        }
        Ok(())
    }
}

/// Disassembly of every event and function in an image
pub fn listing(image: &BytecodeImage) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "; {} code words, {} jump entries",
        image.code.len(),
        image.jump_table.len()
    )?;

    for (object_type, script) in image.objects.iter().enumerate() {
        for event in [Event::Startup, Event::Main, Event::Draw] {
            let descriptor = script.event(event);
            if !descriptor.is_set() {
                continue;
            }
            writeln!(out)?;
            writeln!(out, "type {} {}:", object_type, event.keyword())?;
            body(&mut out, image, descriptor)?;
        }
    }

    for (index, descriptor) in image.functions.iter().enumerate() {
        if !descriptor.is_set() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "function {}:", index)?;
        body(&mut out, image, *descriptor)?;
    }
    Ok(out)
}

fn body(out: &mut String, image: &BytecodeImage, descriptor: ScriptDescriptor) -> Result<()> {
    writeln!(
        out,
        "  ; code_ptr={} jump_ptr={}",
        descriptor.code_ptr, descriptor.jump_ptr
    )?;
    let start = usize::try_from(descriptor.code_ptr)
        .with_context(|| format!("negative code pointer {}", descriptor.code_ptr))?;
    for (offset, instruction) in disassemble(&image.code, start)? {
        writeln!(out, "  {:06}  {}", offset, instruction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_script_compiler::{Compiler, CompilerOptions, NameTables};

    fn image(source: &str) -> BytecodeImage {
        let mut compiler = Compiler::new(NameTables::default(), CompilerOptions::default());
        compiler.compile_source("Test.txt", source.as_bytes(), 1);
        let program = compiler.finish().unwrap();
        program.export_image(0, 0, 0..2)
    }

    #[test]
    fn test_listing_names_events_and_functions() {
        let image = image(
            "function Bump\n\
             temp0 += 1\n\
             endfunction\n\
             event ObjectMain\n\
             CallFunction(Bump)\n\
             endevent\n",
        );
        let text = listing(&image).unwrap();
        assert!(text.contains("type 1 eventObjectMain:"));
        assert!(text.contains("function 0:"));
        assert!(text.contains("CallFunction"));
        assert!(!text.contains("eventObjectDraw"));
    }

    #[test]
    fn test_listing_survives_image_round_trip() {
        let image = image("event ObjectDraw\ntemp0 = 3\nendevent\n");
        let bytes = image.to_bytes().unwrap();
        let decoded = BytecodeImage::from_bytes(&bytes).unwrap();
        assert_eq!(listing(&image).unwrap(), listing(&decoded).unwrap());
    }
}
