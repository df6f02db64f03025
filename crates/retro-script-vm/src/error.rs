//! VM error types

use retro_script_bytecode::{BytecodeError, Opcode};
use thiserror::Error;

/// VM execution errors
#[derive(Debug, Error)]
pub enum VmError {
    /// A bounded stack is full
    #[error("{stack} stack overflow (max {capacity})")]
    StackOverflow {
        /// Which stack
        stack: &'static str,
        /// Its capacity
        capacity: usize,
    },

    /// Pop from an empty stack
    #[error("{0} stack underflow")]
    StackUnderflow(&'static str),

    /// Jump-table slot or code target outside its buffer
    #[error("Jump target out of range: {0}")]
    JumpOutOfRange(i64),

    /// Index outside a world or data buffer
    #[error("{what} index out of range: {index}")]
    IndexOutOfRange {
        /// Storage being indexed
        what: &'static str,
        /// Offending index
        index: i64,
    },

    /// Script descriptor pointing outside the program
    #[error("Invalid script descriptor: code {code_ptr}, jump {jump_ptr}")]
    InvalidDescriptor {
        /// Code pointer
        code_ptr: i32,
        /// Jump-table pointer
        jump_ptr: i32,
    },

    /// Integer division or remainder by zero
    #[error("Division by zero in {0:?}")]
    DivisionByZero(Opcode),

    /// Malformed bytecode
    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    /// A host collaborator failed
    #[error("Host error: {0}")]
    Host(String),

    /// The step limit was reached
    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(u64),
}

impl VmError {
    /// Create an index error
    pub fn index(what: &'static str, index: impl Into<i64>) -> Self {
        Self::IndexOutOfRange {
            what,
            index: index.into(),
        }
    }

    /// Create a host error
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }
}

/// Result type for VM operations
pub type VmResult<T> = std::result::Result<T, VmError>;
