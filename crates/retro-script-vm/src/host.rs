//! Engine collaborators
//!
//! Drawing, audio, palettes, collision, file loading and the rest of the
//! engine live outside the VM. The interpreter forwards those opcodes to a
//! [`Host`] along with the decoded operands and the world.

use chrono::{DateTime, Local};
use retro_script_bytecode::{Event, Opcode};

use crate::error::VmResult;
use crate::world::World;

/// Edge of an entity's current hitbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitboxSide {
    /// `object.collisionLeft`
    Left,
    /// `object.collisionTop`
    Top,
    /// `object.collisionRight`
    Right,
    /// `object.collisionBottom`
    Bottom,
}

/// An opcode the interpreter does not implement itself
///
/// For opcodes that write results back, the host stores them in `operands`;
/// the interpreter copies them to the operand variables afterwards.
#[derive(Debug)]
pub struct HostCall<'a> {
    /// The opcode
    pub opcode: Opcode,
    /// Operand values, one per operand record
    pub operands: &'a mut [i32],
    /// Text of the last string operand
    pub text: &'a str,
    /// Slot of the running entity
    pub entity: usize,
    /// Event being executed
    pub event: Event,
    /// `checkResult` register
    pub check_result: &'a mut i32,
    /// Engine state
    pub world: &'a mut World,
}

/// Engine side of the VM
///
/// Every method has a default so hosts only implement what they support.
pub trait Host {
    /// Execute a forwarded opcode
    fn call(&mut self, call: HostCall<'_>) -> VmResult<()> {
        tracing::trace!(
            opcode = call.opcode.name(),
            entity = call.entity,
            "unhandled host call"
        );
        Ok(())
    }

    /// Edge of an entity's current hitbox
    fn hitbox(&self, _world: &World, _entity: usize, _side: HitboxSide) -> i32 {
        0
    }

    /// Output of the `Print` opcode
    fn print(&mut self, message: &str) {
        tracing::info!(target: "script", "{message}");
    }

    /// `music.volume` was written
    fn music_volume_changed(&mut self, _volume: i32) {}

    /// `engine.bgmVolume` or `engine.sfxVolume` was written
    fn volumes_changed(&mut self, _bgm_volume: i32, _sfx_volume: i32) {}

    /// Wall clock used by `engine.timer` and the unix time variables
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A host that implements nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Host for NullHost {}

impl<H: Host + ?Sized> Host for &mut H {
    fn call(&mut self, call: HostCall<'_>) -> VmResult<()> {
        (**self).call(call)
    }

    fn hitbox(&self, world: &World, entity: usize, side: HitboxSide) -> i32 {
        (**self).hitbox(world, entity, side)
    }

    fn print(&mut self, message: &str) {
        (**self).print(message)
    }

    fn music_volume_changed(&mut self, volume: i32) {
        (**self).music_volume_changed(volume)
    }

    fn volumes_changed(&mut self, bgm_volume: i32, sfx_volume: i32) {
        (**self).volumes_changed(bgm_volume, sfx_volume)
    }

    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}
