//! Host that logs every forwarded engine call.

use retro_script_vm::{Host, HostCall, VmResult};

/// Logs forwarded opcodes and prints script output to stdout
#[derive(Debug, Default)]
pub struct LoggingHost {
    /// Forwarded calls seen so far
    pub calls: usize,
}

impl Host for LoggingHost {
    fn call(&mut self, call: HostCall<'_>) -> VmResult<()> {
        self.calls += 1;
        if call.text.is_empty() {
            tracing::info!(
                opcode = call.opcode.name(),
                entity = call.entity,
                operands = ?call.operands,
                "host call"
            );
        } else {
            tracing::info!(
                opcode = call.opcode.name(),
                entity = call.entity,
                operands = ?call.operands,
                text = call.text,
                "host call"
            );
        }
        Ok(())
    }

    fn print(&mut self, message: &str) {
        print!("{}", message);
    }

    fn music_volume_changed(&mut self, volume: i32) {
        tracing::info!(volume, "music volume changed");
    }

    fn volumes_changed(&mut self, bgm_volume: i32, sfx_volume: i32) {
        tracing::info!(bgm_volume, sfx_volume, "volumes changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_script_bytecode::Event;
    use retro_script_compiler::{Compiler, CompilerOptions, NameTables};
    use retro_script_vm::{Entity, Interpreter, World};

    #[test]
    fn test_counts_forwarded_calls() {
        let names = NameTables {
            sfx: vec!["Jump".to_string()],
            ..NameTables::default()
        };
        let mut compiler = Compiler::new(names, CompilerOptions::default());
        compiler.compile_source(
            "Test.txt",
            b"event ObjectMain\nPlaySfx(SfxName[Jump],0)\nPlaySfx(SfxName[Jump],0)\nendevent\n",
            1,
        );
        let mut program = compiler.finish().unwrap();

        let mut world = World::new();
        world.spawn(0, Entity::spawn(1, 0, 0, 0, 1));
        let mut vm = Interpreter::new(LoggingHost::default());
        vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
        assert_eq!(vm.host().calls, 2);
    }
}
