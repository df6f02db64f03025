//! # Retro Script Compiler
//!
//! Compiles the line-oriented game scripting language to bytecode.
//!
//! ## Pipeline
//!
//! 1. Read one statement at a time, dropping whitespace and comments
//! 2. Register aliases, static values, tables and functions at file scope
//! 3. Rewrite shorthand syntax (`if`, `while`, `foreach`, `switch`,
//!    assignment operators) into canonical `Function(args)` calls
//! 4. Emit opcodes and operand records, patching the jump table as
//!    structured blocks close
//!
//! Errors do not stop compilation: every problem is recorded as a
//! [`Diagnostic`] and [`Compiler::finish`] refuses to hand out a program
//! while any error is present.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod builtins;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod literal;
pub mod names;
pub mod reader;
pub mod rewriter;
pub mod symbols;

pub use compiler::{Compiler, CompilerOptions};
pub use error::{CompileError, CompileFailure, CompileResult, Diagnostic, Diagnostics, Severity};
pub use literal::parse_integer;
pub use names::{NameTables, StageList};
pub use reader::{Statement, StatementReader};
