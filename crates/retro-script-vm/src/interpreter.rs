//! Bytecode interpreter
//!
//! Executes one object event at a time. Each instruction goes through four
//! steps: decode the opcode and its operand records, resolve and read every
//! operand into the value registers, dispatch, then write the values back
//! to the resolved variable locations when the opcode stores its results.

use retro_script_bytecode::instruction::{decode_opcode, decode_operands};
use retro_script_bytecode::variable::OBJECT_VALUE_COUNT;
use retro_script_bytecode::{
    Event, MAX_OPERANDS, OBJECT_COUNT, Opcode, Operand, Program, ScriptDescriptor,
    TEMP_OBJECT_POSITION, WriteBack,
};

use crate::context::{CallFrame, ExecutionContext};
use crate::error::{VmError, VmResult};
use crate::host::{Host, HostCall};
use crate::math;
use crate::variables::{Location, Storage, resolve};
use crate::world::{
    BLANK_OBJECT, ENTITY_COUNT, Entity, LAYER_SIZE, PRIORITY_ACTIVE, PRIORITY_ACTIVE_BOUNDS,
    TEMP_ENTITY_START, TYPE_GROUP_COUNT, World,
};

/// Position in the running script
#[derive(Debug, Clone, Copy)]
struct Frame {
    code_ptr: usize,
    jump_ptr: usize,
    pos: usize,
}

impl Frame {
    fn enter(descriptor: ScriptDescriptor, program: &Program) -> VmResult<Self> {
        let invalid = || VmError::InvalidDescriptor {
            code_ptr: descriptor.code_ptr,
            jump_ptr: descriptor.jump_ptr,
        };
        let code_ptr = usize::try_from(descriptor.code_ptr).map_err(|_| invalid())?;
        let jump_ptr = usize::try_from(descriptor.jump_ptr).map_err(|_| invalid())?;
        if code_ptr >= program.code.len() || jump_ptr > program.jump_table.len() {
            return Err(invalid());
        }
        Ok(Self {
            code_ptr,
            jump_ptr,
            pos: code_ptr,
        })
    }
}

/// Result of dispatching one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Continue with the next instruction
    Next {
        /// Write operand values back to their variables
        store: bool,
    },
    /// Continue at a position relative to the script start
    Jump(i32),
    /// Call a script function
    Call(i32),
    /// Return to the caller, or end the invocation at the top level
    Return,
    /// End the invocation
    Stop,
}

impl Step {
    fn next(opcode: Opcode) -> Self {
        Step::Next {
            store: opcode.write_back() == WriteBack::Store,
        }
    }
}

/// The bytecode interpreter
pub struct Interpreter<H: Host> {
    context: ExecutionContext,
    host: H,
    operands: Vec<Operand>,
    locations: [Option<Location>; MAX_OPERANDS],
    values: [i32; MAX_OPERANDS],
}

impl<H: Host> Interpreter<H> {
    /// Create an interpreter driving `host`
    pub fn new(host: H) -> Self {
        Self {
            context: ExecutionContext::new(),
            host,
            operands: Vec::with_capacity(MAX_OPERANDS),
            locations: [None; MAX_OPERANDS],
            values: [0; MAX_OPERANDS],
        }
    }

    /// Limit the instructions a single invocation may execute
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.context.set_step_limit(Some(limit));
        self
    }

    /// Execution context
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Mutable execution context
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// The host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the interpreter and return the host
    pub fn into_host(self) -> H {
        self.host
    }

    /// Run an event of the entity in `slot`
    ///
    /// The event is looked up by the entity's object type; an event the type
    /// never defined does nothing.
    pub fn run_event(
        &mut self,
        program: &mut Program,
        world: &mut World,
        slot: usize,
        event: Event,
    ) -> VmResult<()> {
        let object_type = world
            .entities
            .get(slot)
            .ok_or_else(|| VmError::index("entity", slot as i64))?
            .object_type;
        let descriptor = usize::try_from(object_type)
            .ok()
            .and_then(|object_type| program.event(object_type, event));
        let Some(descriptor) = descriptor.filter(ScriptDescriptor::is_set) else {
            return Ok(());
        };
        world.entity_pos = slot as i32;
        self.execute(program, world, descriptor, event)
    }

    /// Execute a script from its descriptor
    ///
    /// The entity cursor (`world.entity_pos`) must already point at the
    /// running entity.
    pub fn execute(
        &mut self,
        program: &mut Program,
        world: &mut World,
        descriptor: ScriptDescriptor,
        event: Event,
    ) -> VmResult<()> {
        tracing::debug!(
            code_ptr = descriptor.code_ptr,
            entity = world.entity_pos,
            ?event,
            "running script"
        );
        self.context.begin_invocation();
        let mut frame = Frame::enter(descriptor, program)?;

        loop {
            self.context.tick()?;

            let mut pos = frame.pos;
            let opcode = decode_opcode(&program.code, &mut pos)?;
            decode_operands(opcode, &program.code, &mut pos, &mut self.operands)?;
            frame.pos = pos;

            self.read_operands(program, world)?;

            match self.dispatch(opcode, program, world, &frame, event)? {
                Step::Next { store } => {
                    if store {
                        self.write_operands(opcode, program, world)?;
                    }
                }
                Step::Jump(offset) => {
                    frame.pos = frame
                        .code_ptr
                        .checked_add_signed(offset as isize)
                        .filter(|target| *target < program.code.len())
                        .ok_or(VmError::JumpOutOfRange(i64::from(offset)))?;
                }
                Step::Call(function) => {
                    let descriptor = usize::try_from(function)
                        .ok()
                        .and_then(|index| program.functions.get(index).copied())
                        .ok_or_else(|| VmError::index("function", function))?;
                    self.context.call_stack.push(CallFrame {
                        return_pos: frame.pos,
                        code_ptr: frame.code_ptr,
                        jump_ptr: frame.jump_ptr,
                    })?;
                    frame = Frame::enter(descriptor, program)?;
                }
                Step::Return => match self.context.call_stack.try_pop() {
                    Some(caller) => {
                        frame = Frame {
                            code_ptr: caller.code_ptr,
                            jump_ptr: caller.jump_ptr,
                            pos: caller.return_pos,
                        };
                    }
                    None => break,
                },
                Step::Stop => break,
            }
        }
        Ok(())
    }

    // ==================== Operand passes ====================

    fn read_operands(&mut self, program: &mut Program, world: &mut World) -> VmResult<()> {
        let mut storage = Storage {
            registers: &mut self.context.registers,
            world,
            data: &mut program.code,
        };
        for (index, operand) in self.operands.iter().enumerate() {
            let (location, value) = match operand {
                Operand::Variable(reference) => {
                    let location =
                        resolve(*reference, storage.registers, storage.world.entity_pos)?;
                    (Some(location), storage.read(location, &self.host)?)
                }
                Operand::Int(value) => (None, *value),
                Operand::Str(text) => {
                    self.context.text.clone_from(text);
                    (None, 0)
                }
            };
            self.locations[index] = location;
            self.values[index] = value;
        }
        Ok(())
    }

    fn write_operands(
        &mut self,
        opcode: Opcode,
        program: &mut Program,
        world: &mut World,
    ) -> VmResult<()> {
        let mut storage = Storage {
            registers: &mut self.context.registers,
            world,
            data: &mut program.code,
        };
        for index in 0..opcode.arity() {
            if let Some(location) = self.locations[index] {
                storage.write(location, self.values[index], &mut self.host)?;
            }
        }
        Ok(())
    }

    // ==================== Dispatch ====================

    fn dispatch(
        &mut self,
        opcode: Opcode,
        program: &mut Program,
        world: &mut World,
        frame: &Frame,
        event: Event,
    ) -> VmResult<Step> {
        let v = &mut self.values;
        match opcode {
            Opcode::End => return Ok(Step::Stop),

            // ==================== Arithmetic ====================
            Opcode::Equal => v[0] = v[1],
            Opcode::Add => v[0] = v[0].wrapping_add(v[1]),
            Opcode::Sub => v[0] = v[0].wrapping_sub(v[1]),
            Opcode::Inc => v[0] = v[0].wrapping_add(1),
            Opcode::Dec => v[0] = v[0].wrapping_sub(1),
            Opcode::Mul => v[0] = v[0].wrapping_mul(v[1]),
            Opcode::Div => {
                if v[1] == 0 {
                    return Err(VmError::DivisionByZero(opcode));
                }
                v[0] = v[0].wrapping_div(v[1]);
            }
            Opcode::ShR => v[0] = v[0].wrapping_shr(v[1] as u32),
            Opcode::ShL => v[0] = v[0].wrapping_shl(v[1] as u32),
            Opcode::And => v[0] &= v[1],
            Opcode::Or => v[0] |= v[1],
            Opcode::Xor => v[0] ^= v[1],
            Opcode::Mod => {
                if v[1] == 0 {
                    return Err(VmError::DivisionByZero(opcode));
                }
                v[0] = v[0].wrapping_rem(v[1]);
            }
            Opcode::FlipSign => v[0] = v[0].wrapping_neg(),
            Opcode::Not => v[0] = !v[0],
            Opcode::Abs => v[0] = v[0].wrapping_abs(),

            // ==================== Comparison ====================
            Opcode::CheckEqual
            | Opcode::CheckGreater
            | Opcode::CheckLower
            | Opcode::CheckNotEqual => {
                self.context.registers.check_result = i32::from(compare(opcode, v[0], v[1]));
            }

            // ==================== Structured control flow ====================
            Opcode::IfEqual
            | Opcode::IfGreater
            | Opcode::IfGreaterOrEqual
            | Opcode::IfLower
            | Opcode::IfLowerOrEqual
            | Opcode::IfNotEqual => {
                let (slot, taken) = (v[0], compare(opcode, v[1], v[2]));
                self.context.jump_stack.push(slot)?;
                if !taken {
                    return Ok(Step::Jump(jump_entry(program, frame, slot, 0)?));
                }
            }
            Opcode::Else => {
                let slot = self.context.jump_stack.pop()?;
                return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
            }
            Opcode::EndIf | Opcode::EndSwitch => {
                self.context.jump_stack.pop()?;
            }
            Opcode::WEqual
            | Opcode::WGreater
            | Opcode::WGreaterOrEqual
            | Opcode::WLower
            | Opcode::WLowerOrEqual
            | Opcode::WNotEqual => {
                let slot = v[0];
                if !compare(opcode, v[1], v[2]) {
                    return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
                }
                self.context.jump_stack.push(slot)?;
            }
            Opcode::Loop => {
                let slot = self.context.jump_stack.pop()?;
                return Ok(Step::Jump(jump_entry(program, frame, slot, 0)?));
            }
            Opcode::ForEachActive => {
                let slot = v[0];
                let group = usize::try_from(v[1])
                    .ok()
                    .filter(|group| *group < TYPE_GROUP_COUNT);
                let Some(group) = group else {
                    return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
                };
                let cursor = self.context.foreach_stack.advance()?;
                let entity = world
                    .type_groups
                    .get(group)
                    .and_then(|group| group.entity_refs.get(cursor as usize))
                    .copied();
                let Some(entity) = entity else {
                    self.context.foreach_stack.exhaust()?;
                    return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
                };
                self.values[2] = entity;
                self.context.jump_stack.push(slot)?;
                return Ok(Step::Next { store: true });
            }
            Opcode::ForEachAll => {
                let slot = v[0];
                let object_type = v[1];
                if !(0..OBJECT_COUNT as i32).contains(&object_type) {
                    return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
                }
                let limit = if event == Event::Startup {
                    TEMP_ENTITY_START
                } else {
                    ENTITY_COUNT
                };
                let mut cursor = self.context.foreach_stack.advance()?;
                loop {
                    let index = cursor as usize;
                    if index >= limit.min(world.entities.len()) {
                        self.context.foreach_stack.exhaust()?;
                        return Ok(Step::Jump(jump_entry(program, frame, slot, 1)?));
                    }
                    if world.entities[index].object_type == object_type {
                        self.values[2] = cursor;
                        self.context.jump_stack.push(slot)?;
                        return Ok(Step::Next { store: true });
                    }
                    cursor += 1;
                    self.context.foreach_stack.set_current(cursor)?;
                }
            }
            Opcode::Next => {
                let slot = self.context.jump_stack.pop()?;
                self.context.foreach_stack.leave()?;
                return Ok(Step::Jump(jump_entry(program, frame, slot, 0)?));
            }
            Opcode::Switch => {
                let (slot, value) = (v[0], v[1]);
                self.context.jump_stack.push(slot)?;
                let min = jump_entry(program, frame, slot, 0)?;
                let max = jump_entry(program, frame, slot, 1)?;
                let target = if value < min || value > max {
                    jump_entry(program, frame, slot, 2)?
                } else {
                    let case = i64::from(slot) + 4 + i64::from(value) - i64::from(min);
                    let case = i32::try_from(case).map_err(|_| VmError::JumpOutOfRange(case))?;
                    jump_entry(program, frame, case, 0)?
                };
                return Ok(Step::Jump(target));
            }
            Opcode::Break => {
                let slot = self.context.jump_stack.pop()?;
                return Ok(Step::Jump(jump_entry(program, frame, slot, 3)?));
            }

            // ==================== Math ====================
            Opcode::Rand => {
                if v[1] == 0 {
                    return Err(VmError::DivisionByZero(opcode));
                }
                v[0] = self.context.rng.next_value().wrapping_rem(v[1]);
            }
            Opcode::Sin => v[0] = math::sin512(v[1]),
            Opcode::Cos => v[0] = math::cos512(v[1]),
            Opcode::Sin256 => v[0] = math::sin256(v[1]),
            Opcode::Cos256 => v[0] = math::cos256(v[1]),
            Opcode::ATan2 => v[0] = math::atan2(v[1], v[2]),
            Opcode::Interpolate => v[0] = math::interpolate(v[2], v[1], v[3]),
            Opcode::InterpolateXY => {
                let percent = v[6];
                let keep = 0x100i32.wrapping_sub(percent);
                v[0] = (v[3].wrapping_mul(keep) >> 8).wrapping_add(percent.wrapping_mul(v[2]) >> 8);
                v[1] = (v[5].wrapping_mul(keep) >> 8).wrapping_add(percent.wrapping_mul(v[4]) >> 8);
            }
            Opcode::GetBit => {
                v[0] = (v[1] & 1i32.wrapping_shl(v[2] as u32)).wrapping_shr(v[2] as u32);
            }
            Opcode::SetBit => {
                let bit = 1i32.wrapping_shl(v[1] as u32);
                if v[2] <= 0 {
                    v[0] &= !bit;
                } else {
                    v[0] |= bit;
                }
            }

            // ==================== Functions ====================
            Opcode::CallFunction => return Ok(Step::Call(v[0])),
            Opcode::Return => return Ok(Step::Return),

            // ==================== Entities ====================
            Opcode::ResetObjectEntity => {
                let entity = Entity::spawn(v[1], v[2], v[3], v[4], PRIORITY_ACTIVE_BOUNDS);
                *entity_slot(world, v[0])? = entity;
            }
            Opcode::CreateTempObject => {
                let registers = &mut self.context.registers;
                let position = usize::from(TEMP_OBJECT_POSITION);
                let current = registers.array_pos[position];
                if entity_slot(world, current)?.object_type > BLANK_OBJECT {
                    registers.array_pos[position] += 1;
                    if registers.array_pos[position] == ENTITY_COUNT as i32 {
                        registers.array_pos[position] = TEMP_ENTITY_START as i32;
                    }
                }
                let entity = Entity::spawn(v[0], v[1], v[2], v[3], PRIORITY_ACTIVE);
                *entity_slot(world, registers.array_pos[position])? = entity;
            }
            Opcode::GetObjectValue => {
                if let Some(value) = value_index(v[1]) {
                    v[0] = entity_slot(world, v[2])?.values[value];
                }
            }
            Opcode::SetObjectValue => {
                if let Some(value) = value_index(v[1]) {
                    entity_slot(world, v[2])?.values[value] = v[0];
                }
            }
            Opcode::CopyObject => {
                let (destination, source, count) = (v[0], v[1], v[2]);
                for offset in 0..count.max(0) {
                    let entity = entity_slot(world, source.wrapping_add(offset))?.clone();
                    *entity_slot(world, destination.wrapping_add(offset))? = entity;
                }
            }
            Opcode::SetObjectRange => {
                let center = world.screen.x_center();
                world.borders.set_range(v[0], center);
            }

            // ==================== Stage ====================
            Opcode::GetTileLayerEntry => {
                v[0] = *tile_slot(world, v[1], v[2], v[3])?;
            }
            Opcode::SetTileLayerEntry => {
                *tile_slot(world, v[1], v[2], v[3])? = v[0];
            }
            Opcode::ClearDrawList => {
                draw_list(world, v[0])?.size = 0;
            }
            Opcode::AddDrawListEntityRef => {
                let list = draw_list(world, v[0])?;
                let size = list.size;
                *element(&mut list.entity_refs, "draw list entry", size)? = v[1];
                list.size += 1;
            }
            Opcode::GetDrawListEntityRef => {
                v[0] = *element(&mut draw_list(world, v[1])?.entity_refs, "draw list entry", v[2])?;
            }
            Opcode::SetDrawListEntityRef => {
                *element(&mut draw_list(world, v[1])?.entity_refs, "draw list entry", v[2])? = v[0];
            }
            Opcode::CheckTouchRect => {
                let mut result = -1;
                let touches = &world.input.touches;
                for (finger, touch) in touches.iter().take(world.input.touch_count).enumerate() {
                    if touch.down != 0
                        && touch.x > v[0]
                        && touch.x < v[2]
                        && touch.y > v[1]
                        && touch.y < v[3]
                    {
                        result = finger as i32;
                    }
                }
                self.context.registers.check_result = result;
            }
            Opcode::CheckCurrentStageFolder => {
                let matches = world.stage.folder.eq_ignore_ascii_case(&self.context.text);
                self.context.registers.check_result = i32::from(matches);
            }

            // ==================== Tables ====================
            Opcode::GetTableValue => {
                let (index, table) = (v[1], v[2]);
                let count = *element(&mut program.code, "table", table)?;
                if index >= 0 && index < count {
                    let at = table.wrapping_add(index).wrapping_add(1);
                    v[0] = *element(&mut program.code, "table", at)?;
                }
            }
            Opcode::SetTableValue => {
                let (index, table) = (v[1], v[2]);
                let count = *element(&mut program.code, "table", table)?;
                if index >= 0 && index < count {
                    let at = table.wrapping_add(index).wrapping_add(1);
                    *element(&mut program.code, "table", at)? = v[0];
                }
            }

            // ==================== Output ====================
            Opcode::Print => {
                let mut message = if v[1] != 0 {
                    v[0].to_string()
                } else {
                    self.context.text.clone()
                };
                if v[2] != 0 {
                    message.push('\n');
                }
                self.host.print(&message);
            }

            _ => {
                let entity = usize::try_from(world.entity_pos)
                    .map_err(|_| VmError::index("entity", world.entity_pos))?;
                self.host.call(HostCall {
                    opcode,
                    operands: &mut self.values[..opcode.arity()],
                    text: &self.context.text,
                    entity,
                    event,
                    check_result: &mut self.context.registers.check_result,
                    world,
                })?;
            }
        }
        Ok(Step::next(opcode))
    }
}

fn jump_entry(program: &Program, frame: &Frame, slot: i32, offset: i32) -> VmResult<i32> {
    let index = frame.jump_ptr as i64 + i64::from(slot) + i64::from(offset);
    usize::try_from(index)
        .ok()
        .and_then(|index| program.jump_table.get(index).copied())
        .ok_or(VmError::JumpOutOfRange(index))
}

fn compare(opcode: Opcode, a: i32, b: i32) -> bool {
    match opcode {
        Opcode::CheckEqual | Opcode::IfEqual | Opcode::WEqual => a == b,
        Opcode::CheckGreater | Opcode::IfGreater | Opcode::WGreater => a > b,
        Opcode::IfGreaterOrEqual | Opcode::WGreaterOrEqual => a >= b,
        Opcode::CheckLower | Opcode::IfLower | Opcode::WLower => a < b,
        Opcode::IfLowerOrEqual | Opcode::WLowerOrEqual => a <= b,
        _ => a != b,
    }
}

fn value_index(index: i32) -> Option<usize> {
    usize::try_from(index)
        .ok()
        .filter(|index| *index < OBJECT_VALUE_COUNT)
}

fn element<'a>(values: &'a mut [i32], what: &'static str, index: i32) -> VmResult<&'a mut i32> {
    usize::try_from(index)
        .ok()
        .and_then(|index| values.get_mut(index))
        .ok_or_else(|| VmError::index(what, index))
}

fn entity_slot(world: &mut World, index: i32) -> VmResult<&mut Entity> {
    usize::try_from(index)
        .ok()
        .and_then(|index| world.entities.get_mut(index))
        .ok_or_else(|| VmError::index("entity", index))
}

fn draw_list(world: &mut World, index: i32) -> VmResult<&mut crate::world::DrawList> {
    usize::try_from(index)
        .ok()
        .and_then(|index| world.draw_lists.get_mut(index))
        .ok_or_else(|| VmError::index("draw list", index))
}

fn tile_slot(world: &mut World, layer: i32, x: i32, y: i32) -> VmResult<&mut i32> {
    let layer = usize::try_from(layer)
        .ok()
        .and_then(|index| world.tile_layers.get_mut(index))
        .ok_or_else(|| VmError::index("tile layer", layer))?;
    let index = x.wrapping_add((LAYER_SIZE as i32).wrapping_mul(y));
    element(&mut layer.tiles, "tile", index)
}
