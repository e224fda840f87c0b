//! CursedVM: a 32-bit big-endian register machine with a tagged-value model
//! and a small host-embedding surface.
//!
//! The interpreter decodes and dispatches one instruction word at a time
//! ([`Interpreter::step`]) across eleven active instruction classes, backed
//! by a 32-slot register file (some slots side-effecting on read or write)
//! and five fixed-capacity memory regions. See [`value::Value`] for the
//! tagged-value model and [`interpreter::Interpreter`] for the machine
//! itself.

pub mod environment;
pub mod error;
mod interpreter;
pub mod memory;
pub mod value;

pub use environment::{Binding, Environment, HostArg, HostFunction, HostObject};
pub use error::Fault;
pub use interpreter::{Interpreter, StepOutcome};
pub use value::{Region, Value, ValueKind};
