//! Bytecode errors

use thiserror::Error;

/// Errors that can occur during bytecode operations
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// Invalid opcode index
    #[error("Invalid opcode: {0}")]
    InvalidOpcode(i32),

    /// Invalid operand tag
    #[error("Invalid operand tag {tag} at offset {offset}")]
    InvalidOperandTag {
        /// Offending tag value
        tag: i32,
        /// Word offset of the operand
        offset: usize,
    },

    /// Invalid addressing mode
    #[error("Invalid array mode {mode} at offset {offset}")]
    InvalidArrayMode {
        /// Offending mode value
        mode: i32,
        /// Word offset of the operand
        offset: usize,
    },

    /// Invalid array-position register
    #[error("Invalid array register {0}")]
    InvalidRegister(i32),

    /// Variable ordinal outside the namespace
    #[error("Invalid variable: {0}")]
    InvalidVariable(i32),

    /// String constant with a negative or oversized length
    #[error("Invalid string length {length} at offset {offset}")]
    InvalidStringLength {
        /// Declared length
        length: i32,
        /// Word offset of the operand
        offset: usize,
    },

    /// Malformed block header in a persisted image
    #[error("Invalid block header at byte {offset}")]
    InvalidBlock {
        /// Byte offset of the header
        offset: usize,
    },

    /// Unexpected end of bytecode
    #[error("Unexpected end of bytecode")]
    UnexpectedEnd,

    /// A loaded image does not fit the program buffers
    #[error("{what} capacity exceeded ({count} > {capacity})")]
    CapacityExceeded {
        /// Which buffer overflowed
        what: &'static str,
        /// Requested size
        count: usize,
        /// Available size
        capacity: usize,
    },

    /// IO error during serialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BytecodeError {
    /// Create a capacity error
    pub fn capacity(what: &'static str, count: usize, capacity: usize) -> Self {
        Self::CapacityExceeded {
            what,
            count,
            capacity,
        }
    }
}

/// Result type for bytecode operations
pub type Result<T> = std::result::Result<T, BytecodeError>;
