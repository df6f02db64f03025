//! # Retro Script Bytecode
//!
//! This crate defines the bytecode shared by the retro game script compiler
//! and its virtual machine.
//!
//! ## Design Principles
//!
//! - **Positional**: opcodes and variables are identified by their ordinal, so
//!   the catalogs in [`opcode`] and [`variable`] are a stable ABI
//! - **Self-describing operands**: every operand record starts with a tag that
//!   determines how many words follow
//! - **Flat buffers**: code, static data and tables share one word array;
//!   control flow goes through a separate jump table
//! - **Persistable**: programs can be exported to the compact block-encoded
//!   image format and loaded back

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod image;
pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod variable;

pub use error::{BytecodeError, Result};
pub use image::BytecodeImage;
pub use instruction::{Instruction, disassemble};
pub use opcode::{Opcode, WriteBack};
pub use operand::{Address, IndexSource, Operand, VariableRef};
pub use program::{Event, ObjectScript, Program, ScriptDescriptor};
pub use variable::Variable;

/// Size of the shared code/data segment in words
pub const SCRIPT_DATA_COUNT: usize = 0x40000;

/// Size of the jump table in entries
pub const JUMP_TABLE_COUNT: usize = 0x4000;

/// Maximum number of script functions
pub const FUNCTION_COUNT: usize = 0x200;

/// Maximum number of object types
pub const OBJECT_COUNT: usize = 0x100;

/// Largest operand count of any opcode
pub const MAX_OPERANDS: usize = 11;

/// Number of array-position registers (`arrayPos0..7` plus `tempObjectPos`)
pub const ARRAY_POSITION_COUNT: usize = 9;

/// Register index of `tempObjectPos`
pub const TEMP_OBJECT_POSITION: u8 = 8;
