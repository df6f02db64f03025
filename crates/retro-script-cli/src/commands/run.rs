//! Run command - execute an event of one entity against a logging host.

use anyhow::{Context, Result};
use clap::Args;
use retro_script_bytecode::Event;
use retro_script_vm::world::PRIORITY_ACTIVE;
use retro_script_vm::{Entity, Interpreter, World};
use std::path::PathBuf;

use super::compile_project;
use crate::config::load_project;
use crate::host::LoggingHost;

#[derive(Args)]
pub struct RunCommand {
    /// Project file
    pub project: PathBuf,

    /// Object type of the entity
    #[arg(long = "type")]
    pub object_type: i32,

    /// Event to run: main, draw or startup
    #[arg(long, default_value = "main", value_parser = parse_event)]
    pub event: Event,

    /// Number of frames to run the event for
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// Instruction limit per invocation
    #[arg(long, default_value_t = 1_000_000)]
    pub step_limit: u64,

    /// Print the entity as JSON after the last frame
    #[arg(long)]
    pub json: bool,
}

fn parse_event(name: &str) -> Result<Event, String> {
    Event::from_short_name(name).ok_or_else(|| format!("unknown event '{}'", name))
}

impl RunCommand {
    pub fn run(&self) -> Result<()> {
        let project = load_project(&self.project)?;
        let mut program = compile_project(&project)?;

        let mut world = World::new();
        world.spawn(0, Entity::spawn(self.object_type, 0, 0, 0, PRIORITY_ACTIVE));

        let mut vm = Interpreter::new(LoggingHost::default()).with_step_limit(self.step_limit);
        for frame in 0..self.frames {
            tracing::debug!(frame, "frame");
            vm.run_event(&mut program, &mut world, 0, self.event)
                .with_context(|| format!("{} failed on frame {}", self.event.keyword(), frame))?;
        }

        let entity = &world.entities[0];
        if self.json {
            println!("{}", serde_json::to_string_pretty(entity)?);
        } else {
            println!(
                "type={} state={} x={} y={} frame={} animation={}",
                entity.object_type,
                entity.state,
                entity.xpos,
                entity.ypos,
                entity.frame,
                entity.animation
            );
            for (index, value) in entity.values.iter().enumerate() {
                if *value != 0 {
                    println!("value{}={}", index, value);
                }
            }
        }
        println!("{} host call(s)", vm.host().calls);
        Ok(())
    }
}
