//! Variable namespace accessors
//!
//! A variable operand is resolved once to a [`Location`]: the variable plus
//! the index selected by its addressing mode. The read pass and the
//! write-back pass both go through the same location, so an opcode that
//! moves the entity cursor cannot redirect its own results.

use chrono::{Datelike, Timelike};
use retro_script_bytecode::{Address, IndexSource, Variable, VariableRef};

use crate::context::Registers;
use crate::error::{VmError, VmResult};
use crate::host::{Host, HitboxSide};
use crate::world::{Entity, World};

/// A resolved storage location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// The variable
    pub variable: Variable,
    /// Entity slot or array index
    pub index: i32,
}

/// Resolve the addressing mode of a variable reference
pub fn resolve(reference: VariableRef, registers: &Registers, entity_pos: i32) -> VmResult<Location> {
    let source = |source: IndexSource| -> VmResult<i32> {
        match source {
            IndexSource::Literal(value) => Ok(value),
            IndexSource::Register(register) => registers
                .array_pos
                .get(usize::from(register))
                .copied()
                .ok_or_else(|| VmError::index("array position", i64::from(register))),
        }
    };
    let index = match reference.address {
        Address::Current => entity_pos,
        Address::Array(index) => source(index)?,
        Address::EntityPlus(offset) => entity_pos.wrapping_add(source(offset)?),
        Address::EntityMinus(offset) => entity_pos.wrapping_sub(source(offset)?),
    };
    Ok(Location {
        variable: reference.variable,
        index,
    })
}

fn element<'a>(values: &'a mut [i32], what: &'static str, index: i32) -> VmResult<&'a mut i32> {
    usize::try_from(index)
        .ok()
        .and_then(|slot| values.get_mut(slot))
        .ok_or_else(|| VmError::index(what, index))
}

fn entity_mut(world: &mut World, index: i32) -> VmResult<&mut Entity> {
    usize::try_from(index)
        .ok()
        .and_then(|slot| world.entities.get_mut(slot))
        .ok_or_else(|| VmError::index("entity", index))
}

fn item_mut<'a, T>(items: &'a mut [T], what: &'static str, index: i32) -> VmResult<&'a mut T> {
    usize::try_from(index)
        .ok()
        .and_then(|slot| items.get_mut(slot))
        .ok_or_else(|| VmError::index(what, index))
}

/// Everything a variable can live in
pub struct Storage<'a> {
    /// Script registers
    pub registers: &'a mut Registers,
    /// Engine state
    pub world: &'a mut World,
    /// Code/data segment, for `local[...]`
    pub data: &'a mut [i32],
}

impl Storage<'_> {
    /// Read a location
    pub fn read<H: Host + ?Sized>(&mut self, location: Location, host: &H) -> VmResult<i32> {
        let Location { variable, index } = location;
        let side = match variable {
            Variable::ObjectCollisionLeft => Some(HitboxSide::Left),
            Variable::ObjectCollisionTop => Some(HitboxSide::Top),
            Variable::ObjectCollisionRight => Some(HitboxSide::Right),
            Variable::ObjectCollisionBottom => Some(HitboxSide::Bottom),
            _ => None,
        };
        if let Some(side) = side {
            entity_mut(self.world, index)?;
            return Ok(host.hitbox(self.world, index as usize, side));
        }

        match variable {
            Variable::ObjectEntityPos => Ok(index),
            Variable::ObjectIXPos => Ok(entity_mut(self.world, index)?.xpos >> 16),
            Variable::ObjectIYPos => Ok(entity_mut(self.world, index)?.ypos >> 16),
            Variable::ObjectOutOfBounds => usize::try_from(index)
                .ok()
                .and_then(|slot| self.world.out_of_bounds(slot))
                .map(i32::from)
                .ok_or_else(|| VmError::index("entity", index)),
            Variable::ScreenXCenter => Ok(self.world.screen.x_center()),
            Variable::ScreenYCenter => Ok(self.world.screen.y_center()),
            Variable::EngineTimer => {
                let now = host.now();
                Ok((((now.year() - 2000) & 0x3F) << 26)
                    | ((now.month() as i32 & 0xF) << 22)
                    | ((now.day() as i32 & 0x1F) << 17)
                    | ((now.hour() as i32 & 0x1F) << 12)
                    | ((now.minute() as i32 & 0x3F) << 6)
                    | (now.second() as i32 & 0x3F))
            }
            Variable::CurrentUnix => Ok(host.now().timestamp() as i32),
            Variable::LocalUnix => {
                let now = host.now();
                let offset = now.offset().local_minus_utc();
                Ok(now.timestamp().wrapping_add(i64::from(offset)) as i32)
            }
            _ => Ok(self.slot(location)?.map_or(0, |slot| *slot)),
        }
    }

    /// Write a location
    ///
    /// Read-only and computed variables ignore writes.
    pub fn write<H: Host + ?Sized>(
        &mut self,
        location: Location,
        value: i32,
        host: &mut H,
    ) -> VmResult<()> {
        let Location { variable, index } = location;
        match variable {
            Variable::ObjectEntityPos
            | Variable::ObjectCollisionLeft
            | Variable::ObjectCollisionTop
            | Variable::ObjectCollisionRight
            | Variable::ObjectCollisionBottom
            | Variable::ObjectOutOfBounds
            | Variable::StageListSize
            | Variable::ScreenXCenter
            | Variable::ScreenYCenter
            | Variable::ScreenXSize
            | Variable::ScreenYSize
            | Variable::TouchscreenDown
            | Variable::TouchscreenXPos
            | Variable::TouchscreenYPos
            | Variable::MusicCurrentTrack
            | Variable::MusicPosition
            | Variable::EnginePlatformId
            | Variable::EngineDeviceType
            | Variable::EngineTimer
            | Variable::CurrentUnix
            | Variable::LocalUnix => Ok(()),
            Variable::ObjectIXPos => {
                entity_mut(self.world, index)?.xpos = value.wrapping_shl(16);
                Ok(())
            }
            Variable::ObjectIYPos => {
                entity_mut(self.world, index)?.ypos = value.wrapping_shl(16);
                Ok(())
            }
            Variable::MusicVolume => {
                self.world.music.volume = value;
                host.music_volume_changed(value);
                Ok(())
            }
            Variable::EngineSfxVolume | Variable::EngineBgmVolume => {
                if variable == Variable::EngineSfxVolume {
                    self.world.engine.sfx_volume = value;
                } else {
                    self.world.engine.bgm_volume = value;
                }
                host.volumes_changed(self.world.engine.bgm_volume, self.world.engine.sfx_volume);
                Ok(())
            }
            _ => {
                if let Some(slot) = self.slot(location)? {
                    *slot = value;
                }
                Ok(())
            }
        }
    }

    /// Plain storage behind a location
    fn slot(&mut self, location: Location) -> VmResult<Option<&mut i32>> {
        let Location { variable, index } = location;
        if let Some(slot) = variable.temp_slot() {
            return Ok(self.registers.temp.get_mut(slot));
        }
        if let Some(slot) = variable.array_position_slot() {
            return Ok(self.registers.array_pos.get_mut(slot));
        }
        if let Some(slot) = variable.input_down_slot() {
            return Ok(self.world.input.down.get_mut(slot));
        }
        if let Some(slot) = variable.input_press_slot() {
            return Ok(self.world.input.press.get_mut(slot));
        }

        let world = &mut *self.world;
        let slot = match variable {
            Variable::CheckResult => &mut self.registers.check_result,
            Variable::Global => element(&mut world.globals, "global", index)?,
            Variable::Local => element(self.data, "local", index)?,
            Variable::ObjectSpriteSheet => {
                let object_type = entity_mut(world, index)?.object_type;
                element(&mut world.sprite_sheets, "object type", object_type)?
            }

            // ==================== Stage ====================
            Variable::StageState => &mut world.stage.mode,
            Variable::StageActiveList => &mut world.stage.active_list,
            Variable::StageListPos => &mut world.stage.list_pos,
            Variable::StageTimeEnabled => &mut world.stage.time_enabled,
            Variable::StageMilliSeconds => &mut world.stage.milliseconds,
            Variable::StageSeconds => &mut world.stage.seconds,
            Variable::StageMinutes => &mut world.stage.minutes,
            Variable::StageActNum => &mut world.stage.act_num,
            Variable::StagePauseEnabled => &mut world.stage.pause_enabled,
            Variable::StageListSize => {
                let list = world.stage.active_list;
                element(&mut world.stage.list_sizes, "stage list", list)?
            }
            Variable::StageNewXBoundary1 => &mut world.stage.new_x_boundary1,
            Variable::StageNewXBoundary2 => &mut world.stage.new_x_boundary2,
            Variable::StageNewYBoundary1 => &mut world.stage.new_y_boundary1,
            Variable::StageNewYBoundary2 => &mut world.stage.new_y_boundary2,
            Variable::StageCurXBoundary1 => &mut world.stage.cur_x_boundary1,
            Variable::StageCurXBoundary2 => &mut world.stage.cur_x_boundary2,
            Variable::StageCurYBoundary1 => &mut world.stage.cur_y_boundary1,
            Variable::StageCurYBoundary2 => &mut world.stage.cur_y_boundary2,
            Variable::StageDeformationData0 => {
                element(&mut world.stage.deformation[0], "deformation", index)?
            }
            Variable::StageDeformationData1 => {
                element(&mut world.stage.deformation[1], "deformation", index)?
            }
            Variable::StageDeformationData2 => {
                element(&mut world.stage.deformation[2], "deformation", index)?
            }
            Variable::StageDeformationData3 => {
                element(&mut world.stage.deformation[3], "deformation", index)?
            }
            Variable::StageWaterLevel => &mut world.stage.water_level,
            Variable::StageActiveLayer => {
                element(&mut world.stage.active_layers, "active layer", index)?
            }
            Variable::StageMidPoint => &mut world.stage.mid_point,
            Variable::StagePlayerListPos => &mut world.stage.player_list_pos,
            Variable::StageDebugMode => &mut world.stage.debug_mode,
            Variable::StageEntityPos => &mut world.entity_pos,

            // ==================== Screen & touch ====================
            Variable::ScreenCameraEnabled => &mut world.screen.camera_enabled,
            Variable::ScreenCameraTarget => &mut world.screen.camera_target,
            Variable::ScreenCameraStyle => &mut world.screen.camera_style,
            Variable::ScreenCameraX => &mut world.screen.camera_x,
            Variable::ScreenCameraY => &mut world.screen.camera_y,
            Variable::ScreenDrawListSize => &mut item_mut(&mut world.draw_lists, "draw list", index)?.size,
            Variable::ScreenXSize => &mut world.screen.x_size,
            Variable::ScreenYSize => &mut world.screen.y_size,
            Variable::ScreenXOffset => &mut world.screen.x_offset,
            Variable::ScreenYOffset => &mut world.screen.y_offset,
            Variable::ScreenShakeX => &mut world.screen.shake_x,
            Variable::ScreenShakeY => &mut world.screen.shake_y,
            Variable::ScreenAdjustCameraY => &mut world.screen.adjust_camera_y,
            Variable::TouchscreenDown => &mut item_mut(&mut world.input.touches, "touch", index)?.down,
            Variable::TouchscreenXPos => &mut item_mut(&mut world.input.touches, "touch", index)?.x,
            Variable::TouchscreenYPos => &mut item_mut(&mut world.input.touches, "touch", index)?.y,

            // ==================== Music & menus ====================
            Variable::MusicVolume => &mut world.music.volume,
            Variable::MusicCurrentTrack => &mut world.music.current_track,
            Variable::MusicPosition => &mut world.music.position,
            Variable::Menu1Selection => &mut world.menu_selection[0],
            Variable::Menu2Selection => &mut world.menu_selection[1],
            Variable::Menu3Selection => &mut world.menu_selection[2],

            // ==================== Tile layers ====================
            Variable::TileLayerXSize => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.x_size,
            Variable::TileLayerYSize => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.y_size,
            Variable::TileLayerType => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.kind,
            Variable::TileLayerAngle => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.angle,
            Variable::TileLayerXPos => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.xpos,
            Variable::TileLayerYPos => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.ypos,
            Variable::TileLayerZPos => &mut item_mut(&mut world.tile_layers, "tile layer", index)?.zpos,
            Variable::TileLayerParallaxFactor => {
                &mut item_mut(&mut world.tile_layers, "tile layer", index)?.parallax_factor
            }
            Variable::TileLayerScrollSpeed => {
                &mut item_mut(&mut world.tile_layers, "tile layer", index)?.scroll_speed
            }
            Variable::TileLayerScrollPos => {
                &mut item_mut(&mut world.tile_layers, "tile layer", index)?.scroll_pos
            }
            Variable::TileLayerDeformationOffset => {
                &mut item_mut(&mut world.tile_layers, "tile layer", index)?.deformation_offset
            }
            Variable::TileLayerDeformationOffsetW => {
                &mut item_mut(&mut world.tile_layers, "tile layer", index)?.deformation_offset_w
            }
            Variable::HParallaxParallaxFactor => {
                element(&mut world.h_parallax.parallax_factor, "parallax", index)?
            }
            Variable::HParallaxScrollSpeed => {
                element(&mut world.h_parallax.scroll_speed, "parallax", index)?
            }
            Variable::HParallaxScrollPos => element(&mut world.h_parallax.scroll_pos, "parallax", index)?,
            Variable::VParallaxParallaxFactor => {
                element(&mut world.v_parallax.parallax_factor, "parallax", index)?
            }
            Variable::VParallaxScrollSpeed => {
                element(&mut world.v_parallax.scroll_speed, "parallax", index)?
            }
            Variable::VParallaxScrollPos => element(&mut world.v_parallax.scroll_pos, "parallax", index)?,

            // ==================== 3D scene ====================
            Variable::Scene3dVertexCount => &mut world.scene.vertex_count,
            Variable::Scene3dFaceCount => &mut world.scene.face_count,
            Variable::Scene3dProjectionX => &mut world.scene.projection_x,
            Variable::Scene3dProjectionY => &mut world.scene.projection_y,
            Variable::Scene3dFogColor => &mut world.scene.fog_color,
            Variable::Scene3dFogStrength => &mut world.scene.fog_strength,
            Variable::VertexBufferX => &mut item_mut(&mut world.scene.vertices, "vertex", index)?.x,
            Variable::VertexBufferY => &mut item_mut(&mut world.scene.vertices, "vertex", index)?.y,
            Variable::VertexBufferZ => &mut item_mut(&mut world.scene.vertices, "vertex", index)?.z,
            Variable::VertexBufferU => &mut item_mut(&mut world.scene.vertices, "vertex", index)?.u,
            Variable::VertexBufferV => &mut item_mut(&mut world.scene.vertices, "vertex", index)?.v,
            Variable::FaceBufferA => &mut item_mut(&mut world.scene.faces, "face", index)?.a,
            Variable::FaceBufferB => &mut item_mut(&mut world.scene.faces, "face", index)?.b,
            Variable::FaceBufferC => &mut item_mut(&mut world.scene.faces, "face", index)?.c,
            Variable::FaceBufferD => &mut item_mut(&mut world.scene.faces, "face", index)?.d,
            Variable::FaceBufferFlag => &mut item_mut(&mut world.scene.faces, "face", index)?.flag,
            Variable::FaceBufferColor => &mut item_mut(&mut world.scene.faces, "face", index)?.color,

            // ==================== Save data & engine ====================
            Variable::SaveRam => element(&mut world.save_ram, "save RAM", index)?,
            Variable::EngineState => &mut world.engine.state,
            Variable::EngineLanguage => &mut world.engine.language,
            Variable::EngineOnlineActive => &mut world.engine.online_active,
            Variable::EngineSfxVolume => &mut world.engine.sfx_volume,
            Variable::EngineBgmVolume => &mut world.engine.bgm_volume,
            Variable::EnginePlatformId => &mut world.engine.platform_id,
            Variable::EngineTrialMode => &mut world.engine.trial_mode,
            Variable::EngineDeviceType => &mut world.engine.device_type,

            _ => return Ok(entity_mut(world, index)?.field_mut(variable)),
        };
        Ok(Some(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn storage_parts() -> (Registers, World, Vec<i32>) {
        (Registers::default(), World::new(), vec![0; 16])
    }

    #[test]
    fn test_resolve_addressing_modes() {
        let mut registers = Registers::default();
        registers.array_pos[2] = 40;
        let reference = |address| VariableRef {
            variable: Variable::ObjectState,
            address,
        };
        let at = |address| resolve(reference(address), &registers, 10).unwrap().index;
        assert_eq!(at(Address::Current), 10);
        assert_eq!(at(Address::Array(IndexSource::Literal(3))), 3);
        assert_eq!(at(Address::Array(IndexSource::Register(2))), 40);
        assert_eq!(at(Address::EntityPlus(IndexSource::Literal(1))), 11);
        assert_eq!(at(Address::EntityMinus(IndexSource::Register(2))), -30);
    }

    #[test]
    fn test_registers_and_globals() {
        let (mut registers, mut world, mut data) = storage_parts();
        let mut host = NullHost;
        let mut storage = Storage {
            registers: &mut registers,
            world: &mut world,
            data: &mut data,
        };
        let temp = Location {
            variable: Variable::Temp3,
            index: 0,
        };
        storage.write(temp, 9, &mut host).unwrap();
        assert_eq!(storage.read(temp, &host).unwrap(), 9);
        let global = Location {
            variable: Variable::Global,
            index: 5,
        };
        storage.write(global, -2, &mut host).unwrap();
        assert_eq!(storage.world.globals[5], -2);
        let local = Location {
            variable: Variable::Local,
            index: 15,
        };
        storage.write(local, 77, &mut host).unwrap();
        assert_eq!(storage.data[15], 77);
        assert!(matches!(
            storage.read(Location { variable: Variable::Local, index: 16 }, &host),
            Err(VmError::IndexOutOfRange { what: "local", index: 16 })
        ));
    }

    #[test]
    fn test_entity_fields() {
        let (mut registers, mut world, mut data) = storage_parts();
        let mut host = NullHost;
        let mut storage = Storage {
            registers: &mut registers,
            world: &mut world,
            data: &mut data,
        };
        let ixpos = Location {
            variable: Variable::ObjectIXPos,
            index: 4,
        };
        storage.write(ixpos, 12, &mut host).unwrap();
        assert_eq!(storage.world.entities[4].xpos, 12 << 16);
        assert_eq!(storage.read(ixpos, &host).unwrap(), 12);
        let value = Location {
            variable: Variable::ObjectValue100,
            index: 4,
        };
        storage.write(value, 3, &mut host).unwrap();
        assert_eq!(storage.world.entities[4].extra_value, 3);
        let entity_pos = Location {
            variable: Variable::ObjectEntityPos,
            index: 4,
        };
        assert_eq!(storage.read(entity_pos, &host).unwrap(), 4);
        storage.write(entity_pos, 99, &mut host).unwrap();
        assert_eq!(storage.read(entity_pos, &host).unwrap(), 4);
    }

    #[test]
    fn test_read_only_variables_ignore_writes() {
        let (mut registers, mut world, mut data) = storage_parts();
        let mut host = NullHost;
        let mut storage = Storage {
            registers: &mut registers,
            world: &mut world,
            data: &mut data,
        };
        let size = Location {
            variable: Variable::ScreenXSize,
            index: 0,
        };
        storage.write(size, 1, &mut host).unwrap();
        assert_eq!(storage.read(size, &host).unwrap(), 424);
        let center = Location {
            variable: Variable::ScreenXCenter,
            index: 0,
        };
        assert_eq!(storage.read(center, &host).unwrap(), 212);
    }
}
