//! Interpreter fault kinds.
//!
//! Every fault is fatal within a [`crate::Interpreter::step`] call: it stops
//! the instruction that raised it and is handed back to the embedder without
//! unwinding any VM state (spec §7). There is no recoverable-vs-halting
//! distinction the way the teacher's `RuntimeError` has, because CursedVM
//! has no instruction-level panic receipt mechanism to recover into.

use cursedvm_asm::Instruction;

use crate::value::Region;

/// A fatal interpreter error, raised by [`crate::Interpreter::step`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    /// Reserved class, reserved subfunction, or an invalid bit combination
    /// (e.g. a relative call).
    #[error("decode error at pc={pc}: {detail} (instruction {instruction:?})")]
    DecodeError {
        /// Word offset of the faulting instruction.
        pc: u32,
        /// The raw instruction that failed to decode meaningfully.
        instruction: Instruction,
        /// Human-readable detail.
        detail: String,
    },

    /// An operand's type is disallowed for the operation attempted.
    #[error("type error at pc={pc}: {detail}")]
    TypeError {
        /// Word offset of the faulting instruction.
        pc: u32,
        /// Human-readable detail.
        detail: String,
    },

    /// A memory or stack access landed outside its region's bounds.
    #[error("bounds error at pc={pc}: offset {offset} outside {region:?} (capacity {capacity})")]
    BoundsError {
        /// Word offset of the faulting instruction.
        pc: u32,
        /// Region that was accessed.
        region: Region,
        /// The offset that violated bounds.
        offset: i64,
        /// The region's capacity.
        capacity: usize,
    },

    /// A numeric domain violation: division/modulo by zero, a
    /// non-finite-coercible environment fetch, or an unconvertible
    /// environment key.
    #[error("domain error at pc={pc}: {detail}")]
    DomainError {
        /// Word offset of the faulting instruction.
        pc: u32,
        /// Human-readable detail.
        detail: String,
    },
}

impl Fault {
    /// The program counter (word offset) at which this fault was raised.
    pub const fn pc(&self) -> u32 {
        match self {
            Fault::DecodeError { pc, .. }
            | Fault::TypeError { pc, .. }
            | Fault::BoundsError { pc, .. }
            | Fault::DomainError { pc, .. } => *pc,
        }
    }
}

/// Build a [`Fault::TypeError`] with a formatted detail string.
pub(crate) fn type_error(pc: u32, detail: impl Into<String>) -> Fault {
    Fault::TypeError { pc, detail: detail.into() }
}

/// Build a [`Fault::DomainError`] with a formatted detail string.
pub(crate) fn domain_error(pc: u32, detail: impl Into<String>) -> Fault {
    Fault::DomainError { pc, detail: detail.into() }
}

/// Build a [`Fault::DecodeError`] with a formatted detail string.
pub(crate) fn decode_error(pc: u32, instruction: Instruction, detail: impl Into<String>) -> Fault {
    Fault::DecodeError { pc, instruction, detail: detail.into() }
}
