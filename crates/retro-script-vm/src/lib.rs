//! # Retro Script VM
//!
//! Interpreter for compiled retro game scripts.
//!
//! ## Design Principles
//!
//! - **Explicit state**: registers and stacks live in an [`ExecutionContext`],
//!   engine state in a [`World`]; nothing is process-global
//! - **Bounded**: the jump, call and foreach stacks have fixed capacities and
//!   report overflow as errors
//! - **Two-pass operands**: operand locations are resolved once, read before
//!   dispatch and written back afterwards through the same locations
//! - **Host seam**: drawing, audio, collision and file access are forwarded to
//!   a [`Host`] implementation

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod math;
pub mod variables;
pub mod world;

pub use context::{BoundedStack, CallFrame, ExecutionContext, ForeachStack, Registers};
pub use error::{VmError, VmResult};
pub use host::{HitboxSide, Host, HostCall, NullHost};
pub use interpreter::Interpreter;
pub use variables::{Location, Storage};
pub use world::{Entity, World};
