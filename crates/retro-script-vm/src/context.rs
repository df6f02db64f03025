//! VM execution context
//!
//! The context holds the script registers, which persist across invocations,
//! and the per-invocation stacks, which are reset every time an event starts.

use retro_script_bytecode::ARRAY_POSITION_COUNT;

use crate::error::{VmError, VmResult};
use crate::math::XorShift;

/// Maximum depth of nested structured blocks
pub const JUMP_STACK_COUNT: usize = 0x400;

/// Maximum nested function calls
pub const CALL_STACK_COUNT: usize = 0x400 / 3;

/// Maximum nested foreach loops
pub const FOREACH_STACK_COUNT: usize = 0x400;

/// Number of `tempN` registers
pub const TEMP_COUNT: usize = 11;

/// A fixed-capacity stack that fails instead of growing
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: Vec<T>,
    capacity: usize,
    name: &'static str,
}

impl<T: Copy> BoundedStack<T> {
    /// Create an empty stack
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(64)),
            capacity,
            name,
        }
    }

    /// Push a value
    pub fn push(&mut self, value: T) -> VmResult<()> {
        if self.items.len() >= self.capacity {
            return Err(VmError::StackOverflow {
                stack: self.name,
                capacity: self.capacity,
            });
        }
        self.items.push(value);
        Ok(())
    }

    /// Pop a value
    pub fn pop(&mut self) -> VmResult<T> {
        self.items.pop().ok_or(VmError::StackUnderflow(self.name))
    }

    /// Pop a value if there is one
    pub fn try_pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Top value
    pub fn peek(&self) -> VmResult<T> {
        self.items
            .last()
            .copied()
            .ok_or(VmError::StackUnderflow(self.name))
    }

    /// Current depth
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every value
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Iteration cursors of nested foreach loops
///
/// Each level keeps its cursor after `next` leaves it, so re-entering the
/// loop header resumes from the previous position. A level is reset to `-1`
/// when its loop is exhausted.
#[derive(Debug, Clone)]
pub struct ForeachStack {
    cursors: Vec<i32>,
    depth: usize,
}

impl ForeachStack {
    /// Create a stack with every cursor reset
    pub fn new(capacity: usize) -> Self {
        Self {
            cursors: vec![-1; capacity],
            depth: 0,
        }
    }

    /// Enter a loop header and advance its cursor
    pub fn advance(&mut self) -> VmResult<i32> {
        let cursor = self
            .cursors
            .get_mut(self.depth)
            .ok_or(VmError::StackOverflow {
                stack: "foreach",
                capacity: FOREACH_STACK_COUNT,
            })?;
        self.depth += 1;
        *cursor = cursor.wrapping_add(1);
        Ok(*cursor)
    }

    /// Overwrite the innermost cursor
    pub fn set_current(&mut self, value: i32) -> VmResult<()> {
        let top = self.depth.checked_sub(1).ok_or(VmError::StackUnderflow("foreach"))?;
        self.cursors[top] = value;
        Ok(())
    }

    /// Leave the innermost loop at the end of an iteration
    pub fn leave(&mut self) -> VmResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(VmError::StackUnderflow("foreach"))?;
        Ok(())
    }

    /// Leave the innermost loop for good
    pub fn exhaust(&mut self) -> VmResult<()> {
        self.set_current(-1)?;
        self.leave()
    }

    /// Current depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reset every cursor
    pub fn reset(&mut self) {
        self.cursors.fill(-1);
        self.depth = 0;
    }
}

/// Saved caller state of a function call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Position after the call instruction
    pub return_pos: usize,
    /// Caller's code pointer
    pub code_ptr: usize,
    /// Caller's jump-table pointer
    pub jump_ptr: usize,
}

/// Script-visible registers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// `temp0` .. `temp10`
    pub temp: [i32; TEMP_COUNT],
    /// `checkResult`
    pub check_result: i32,
    /// `arrayPos0` .. `arrayPos7`, then `tempObjectPos`
    pub array_pos: [i32; ARRAY_POSITION_COUNT],
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            temp: [0; TEMP_COUNT],
            check_result: 0,
            array_pos: [0; ARRAY_POSITION_COUNT],
        }
    }
}

/// State of the interpreter
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Script registers
    pub registers: Registers,
    /// Jump-table slots of the open blocks
    pub jump_stack: BoundedStack<i32>,
    /// Callers of the running function
    pub call_stack: BoundedStack<CallFrame>,
    /// Cursors of the running foreach loops
    pub foreach_stack: ForeachStack,
    /// Text of the last string operand
    pub text: String,
    /// Random number source for `Rand`
    pub rng: XorShift,
    step_limit: Option<u64>,
    steps: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Create a context with empty stacks and zeroed registers
    pub fn new() -> Self {
        Self {
            registers: Registers::default(),
            jump_stack: BoundedStack::new("jump", JUMP_STACK_COUNT),
            call_stack: BoundedStack::new("call", CALL_STACK_COUNT),
            foreach_stack: ForeachStack::new(FOREACH_STACK_COUNT),
            text: String::new(),
            rng: XorShift::default(),
            step_limit: None,
            steps: 0,
        }
    }

    /// Limit the number of instructions a single invocation may execute
    pub fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
    }

    /// Configured step limit
    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    /// Instructions executed by the current or last invocation
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Reset the per-invocation state
    pub fn begin_invocation(&mut self) {
        self.jump_stack.clear();
        self.call_stack.clear();
        self.foreach_stack.reset();
        self.steps = 0;
    }

    /// Count one instruction against the step limit
    pub fn tick(&mut self) -> VmResult<()> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(VmError::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }
}
