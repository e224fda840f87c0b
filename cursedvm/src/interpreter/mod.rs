//! The interpreter: register file, memory regions, environment, and the
//! decode/dispatch loop that drives the eleven instruction class handlers.
//!
//! Mirrors the teacher's `Interpreter` struct and its `interpreter/`
//! submodule-per-concern layout (`alu.rs`, `flow.rs`, `blockchain.rs`,
//! `memory.rs`): one file per instruction class family here, all operating
//! on the same [`Interpreter`] through `impl` blocks split across files.

use std::io::Write;

use cursedvm_asm::Instruction;
use cursedvm_types::{RegId, Word, OBJECT_MEMORY_CAPACITY, STACK_CAPACITY, VM_REGISTER_COUNT, WORD_MEMORY_CAPACITY};

use crate::environment::Environment;
use crate::error::Fault;
use crate::memory::{ObjectRegion, WordRegion};
use crate::value::{Region, Value};

mod arith;
mod branch;
mod compare;
mod convert;
mod env_ops;
mod memio;
mod nop_exit;
mod stack;
mod sys;

/// Whether a handler left the program counter for [`Interpreter::step`] to
/// advance, or already set it itself (a taken branch, call or return).
pub(crate) enum Control {
    /// Advance PC by one word after this instruction.
    Advance,
    /// PC was already updated by the handler; leave it alone.
    Branched,
}

/// The outcome of a single [`Interpreter::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The VM is still running; no exit or breakpoint was hit.
    Running,
    /// The VM stopped (via `exit` or a `sys` breakpoint) with this value.
    Stopped(Value),
}

/// Index of a fixed special register, for the hooks in
/// [`Interpreter::read_register`]/[`Interpreter::write_register`].
pub(crate) const fn reg_idx(id: RegId) -> usize {
    id.to_u8() as usize
}

/// CursedVM's interpreter: the register file, its four memory regions, the
/// private call stack pointer, and the host environment.
///
/// The internal state is not exposed directly; embedders observe it through
/// [`Interpreter::step`]/[`Interpreter::run`]'s return value and through the
/// read-only accessors below, the same "inspect via receipts, not raw
/// state" posture the teacher's `Interpreter` takes.
pub struct Interpreter {
    registers: [Value; VM_REGISTER_COUNT],
    word_memory: WordRegion,
    object_memory: ObjectRegion,
    call_stack: WordRegion,
    irs: WordRegion,
    data_stack: ObjectRegion,
    csp: u32,
    environment: Environment,
    stopped: bool,
    exit_value: Option<Value>,
    cycles: u64,
    debug_sink: Box<dyn Write>,
    clock: Box<dyn Fn() -> u64>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("registers", &self.registers)
            .field("stopped", &self.stopped)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Build a fresh interpreter with empty regions, a cleared register
    /// file, and no host bindings. Equivalent to [`Interpreter::new`]
    /// followed by [`Interpreter::reset`].
    pub fn new() -> Self {
        let mut vm = Self {
            registers: [Value::Null; VM_REGISTER_COUNT],
            word_memory: WordRegion::new(Region::WordMemory, WORD_MEMORY_CAPACITY),
            object_memory: ObjectRegion::new(Region::ObjectMemory, OBJECT_MEMORY_CAPACITY),
            call_stack: WordRegion::new(Region::CallStack, STACK_CAPACITY),
            irs: WordRegion::new(Region::Irs, STACK_CAPACITY),
            data_stack: ObjectRegion::new(Region::DataStack, STACK_CAPACITY),
            csp: 0,
            environment: Environment::new(),
            stopped: false,
            exit_value: None,
            cycles: 0,
            debug_sink: Box::new(Vec::new()),
            clock: Box::new(|| 0),
        };
        vm.reset();
        vm
    }

    /// Replace the debug/trace byte sink `sys.reg`/`sys.state` write to.
    pub fn with_debug_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.debug_sink = sink;
        self
    }

    /// Supply a clock used to timestamp `sys.state` dumps.
    pub fn with_clock(mut self, clock: Box<dyn Fn() -> u64>) -> Self {
        self.clock = clock;
        self
    }

    /// The host environment, for registering bindings before running a
    /// program.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// Read-only access to the host environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Number of `step` calls executed since construction or the last
    /// `reset` (spec §1's "clock source for cycle accounting").
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// `true` once `exit` or a `sys` breakpoint has stopped execution.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// The value `exit` stopped with, if any. `None` for a breakpoint stop
    /// or while still running.
    pub fn exit_value(&self) -> Option<Value> {
        self.exit_value
    }

    /// Read-only access to the full 32-slot register file, for host-side
    /// introspection between steps (debuggers, single-stepping demos).
    /// Side-effecting slots (`$IPOP`, `$IPTR`, `$POP`) read back their
    /// last-written value here rather than triggering the pop they would
    /// on an in-program read.
    pub fn registers(&self) -> &[Value; VM_REGISTER_COUNT] {
        &self.registers
    }

    /// Zero every region, clear every register except `P0`/`P1`, and
    /// reinitialize `PC`/`SP`/`IRSP` to the start of their regions (spec
    /// §3's "Lifetime", §5's reset semantics).
    pub fn reset(&mut self) {
        let p0 = self.registers[reg_idx(RegId::P0)];
        let p1 = self.registers[reg_idx(RegId::P1)];
        self.registers = [Value::Null; VM_REGISTER_COUNT];
        self.registers[reg_idx(RegId::P0)] = p0;
        self.registers[reg_idx(RegId::P1)] = p1;
        self.registers[reg_idx(RegId::PC)] = Value::Ptr { region: Region::WordMemory, offset: 0 };
        self.registers[reg_idx(RegId::SP)] = Value::Ptr { region: Region::DataStack, offset: 0 };
        self.registers[reg_idx(RegId::IRSP)] = Value::Ptr { region: Region::Irs, offset: 0 };

        self.word_memory.clear();
        self.object_memory.clear();
        self.call_stack.clear();
        self.irs.clear();
        self.data_stack.clear();
        self.csp = 0;
        self.stopped = false;
        self.exit_value = None;
        tracing::debug!("vm reset");
    }

    /// Reset, then copy `words` into word memory starting at offset 0
    /// (spec §6's program format).
    pub fn load_program(&mut self, words: &[Word]) -> Result<(), Fault> {
        self.reset();
        self.word_memory.load_at_zero(words)?;
        tracing::debug!(len = words.len(), "program loaded");
        Ok(())
    }

    /// Push `value` onto the data stack, for bootstrapping a program before
    /// `run` (spec §6's `push(value)`).
    pub fn push(&mut self, value: Value) -> Result<(), Fault> {
        self.data_push(0, value)
    }

    /// Pop a value off the data stack.
    pub fn pop(&mut self) -> Result<Value, Fault> {
        self.data_pop(0)
    }

    /// Decode and dispatch exactly one instruction.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        if self.stopped {
            return Ok(StepOutcome::Stopped(self.exit_value.unwrap_or(Value::Null)));
        }
        self.cycles += 1;

        let pc = self.pc_offset(0)?;
        let raw = self.word_memory.read(pc, pc)? as u32;
        let instr = Instruction::new(raw);
        tracing::trace!(pc, class = instr.class(), c0 = instr.c0(), s = instr.s(), "step");

        let control = dispatch(self, pc, instr).map_err(|error| {
            tracing::warn!(pc, %error, "fault");
            error
        })?;

        if s_meaningful(instr) && instr.s() {
            self.irs_push(pc, instr.imm_signed())?;
        }

        match control {
            Control::Advance => self.set_pc(pc.wrapping_add(1)),
            Control::Branched => {}
        }

        if self.stopped {
            Ok(StepOutcome::Stopped(self.exit_value.unwrap_or(Value::Null)))
        } else {
            Ok(StepOutcome::Running)
        }
    }

    /// Run until `exit` or a breakpoint stops the VM, returning the exit
    /// value.
    pub fn run(&mut self) -> Result<Value, Fault> {
        loop {
            match self.step()? {
                StepOutcome::Running => {}
                StepOutcome::Stopped(value) => return Ok(value),
            }
        }
    }

    // ---- register file hooks ----

    pub(crate) fn read_register(&mut self, pc: u32, id: usize) -> Result<Value, Fault> {
        if id == reg_idx(RegId::ZERO) {
            Ok(Value::Int(0))
        } else if id == reg_idx(RegId::IPOP) {
            Ok(Value::Int(self.irs_pop(pc)?))
        } else if id == reg_idx(RegId::IPTR) {
            let word = self.irs_pop(pc)?;
            Ok(Value::Ptr { region: Region::WordMemory, offset: word as u32 })
        } else if id == reg_idx(RegId::POP) {
            self.data_pop(pc)
        } else {
            Ok(self.registers[id])
        }
    }

    pub(crate) fn write_register(&mut self, pc: u32, id: usize, value: Value) -> Result<(), Fault> {
        if id == reg_idx(RegId::ZERO) {
            // Writes to $ZERO are silently dropped.
        } else if id == reg_idx(RegId::PUSH) {
            self.data_push(pc, value)?;
            self.registers[id] = value;
        } else {
            self.registers[id] = value;
        }
        Ok(())
    }

    fn pc_offset(&self, pc_for_fault: u32) -> Result<u32, Fault> {
        match self.registers[reg_idx(RegId::PC)] {
            Value::Ptr { region: Region::WordMemory, offset } => Ok(offset),
            other => Err(crate::error::type_error(
                pc_for_fault,
                format!("$PC does not hold a Ptr to word memory: {other:?}"),
            )),
        }
    }

    pub(crate) fn set_pc(&mut self, offset: u32) {
        self.registers[reg_idx(RegId::PC)] = Value::Ptr { region: Region::WordMemory, offset };
    }

    // ---- IRS ----

    fn irsp_offset(&self, pc: u32) -> Result<u32, Fault> {
        match self.registers[reg_idx(RegId::IRSP)] {
            Value::Ptr { region: Region::Irs, offset } => Ok(offset),
            other => Err(crate::error::type_error(pc, format!("$IRSP does not hold a Ptr to the IRS: {other:?}"))),
        }
    }

    fn set_irsp(&mut self, offset: u32) {
        self.registers[reg_idx(RegId::IRSP)] = Value::Ptr { region: Region::Irs, offset };
    }

    pub(crate) fn irs_push(&mut self, pc: u32, raw: Word) -> Result<(), Fault> {
        let offset = self.irsp_offset(pc)?;
        self.irs.write(pc, offset, raw)?;
        self.set_irsp(offset.wrapping_add(1));
        Ok(())
    }

    pub(crate) fn irs_pop(&mut self, pc: u32) -> Result<Word, Fault> {
        let offset = self.irsp_offset(pc)?;
        if offset == 0 {
            return Err(Fault::BoundsError { pc, region: Region::Irs, offset: -1, capacity: self.irs.capacity() });
        }
        let new_offset = offset - 1;
        let word = self.irs.read(pc, new_offset)?;
        self.set_irsp(new_offset);
        Ok(word)
    }

    // ---- data stack ----

    fn sp_offset(&self, pc: u32) -> Result<u32, Fault> {
        match self.registers[reg_idx(RegId::SP)] {
            Value::Ptr { region: Region::DataStack, offset } => Ok(offset),
            other => Err(crate::error::type_error(pc, format!("$SP does not hold a Ptr to the data stack: {other:?}"))),
        }
    }

    fn set_sp(&mut self, offset: u32) {
        self.registers[reg_idx(RegId::SP)] = Value::Ptr { region: Region::DataStack, offset };
    }

    pub(crate) fn data_push(&mut self, pc: u32, value: Value) -> Result<(), Fault> {
        let offset = self.sp_offset(pc)?;
        self.data_stack.write(pc, offset, value)?;
        self.set_sp(offset.wrapping_add(1));
        Ok(())
    }

    pub(crate) fn data_pop(&mut self, pc: u32) -> Result<Value, Fault> {
        let offset = self.sp_offset(pc)?;
        if offset == 0 {
            return Err(Fault::BoundsError { pc, region: Region::DataStack, offset: -1, capacity: self.data_stack.capacity() });
        }
        let new_offset = offset - 1;
        let value = self.data_stack.read(pc, new_offset)?;
        self.set_sp(new_offset);
        Ok(value)
    }

    /// The value currently on top of the data stack, without popping it.
    /// Used by `sys.state`.
    pub(crate) fn data_stack_top(&self) -> Option<Value> {
        let offset = self.sp_offset(0).ok()?;
        if offset == 0 {
            None
        } else {
            self.data_stack.read(0, offset - 1).ok()
        }
    }

    // ---- call stack (private, not register-addressed) ----

    pub(crate) fn call_push(&mut self, pc: u32, return_pc: u32) -> Result<(), Fault> {
        if self.csp as usize >= self.call_stack.capacity() {
            return Err(Fault::BoundsError {
                pc,
                region: Region::CallStack,
                offset: self.csp as i64,
                capacity: self.call_stack.capacity(),
            });
        }
        self.call_stack.write(pc, self.csp, return_pc as i32)?;
        self.csp += 1;
        Ok(())
    }

    pub(crate) fn call_pop(&mut self, pc: u32) -> Result<u32, Fault> {
        if self.csp == 0 {
            return Err(Fault::BoundsError { pc, region: Region::CallStack, offset: -1, capacity: self.call_stack.capacity() });
        }
        self.csp -= 1;
        let word = self.call_stack.read(pc, self.csp)?;
        Ok(word as u32)
    }

    /// A window of the call stack's most recent `n` return addresses, most
    /// recent first. Used by `sys.state`.
    pub(crate) fn call_stack_window(&self, n: usize) -> Vec<Word> {
        let mut out = Vec::with_capacity(n);
        for i in 0..n.min(self.csp as usize) {
            if let Ok(w) = self.call_stack.read(0, self.csp - 1 - i as u32) {
                out.push(w);
            }
        }
        out
    }

    // ---- region-by-tag dispatch for the `mem` class ----

    pub(crate) fn read_word_region(&self, pc: u32, region: Region, offset: u32) -> Result<Word, Fault> {
        match region {
            Region::WordMemory => self.word_memory.read(pc, offset),
            Region::CallStack => self.call_stack.read(pc, offset),
            Region::Irs => self.irs.read(pc, offset),
            _ => Err(crate::error::type_error(pc, format!("{region:?} is not word-shaped"))),
        }
    }

    pub(crate) fn write_word_region(&mut self, pc: u32, region: Region, offset: u32, raw: Word) -> Result<(), Fault> {
        match region {
            Region::WordMemory => self.word_memory.write(pc, offset, raw),
            Region::CallStack => self.call_stack.write(pc, offset, raw),
            Region::Irs => self.irs.write(pc, offset, raw),
            _ => Err(crate::error::type_error(pc, format!("{region:?} is not word-shaped"))),
        }
    }

    pub(crate) fn read_object_region(&self, pc: u32, region: Region, offset: u32) -> Result<Value, Fault> {
        match region {
            Region::ObjectMemory => self.object_memory.read(pc, offset),
            Region::DataStack => self.data_stack.read(pc, offset),
            _ => Err(crate::error::type_error(pc, format!("{region:?} is not object-shaped"))),
        }
    }

    pub(crate) fn write_object_region(&mut self, pc: u32, region: Region, offset: u32, value: Value) -> Result<(), Fault> {
        match region {
            Region::ObjectMemory => self.object_memory.write(pc, offset, value),
            Region::DataStack => self.data_stack.write(pc, offset, value),
            _ => Err(crate::error::type_error(pc, format!("{region:?} is not object-shaped"))),
        }
    }

    /// Read a NUL-terminated UTF-8 string out of word memory, one word (4
    /// bytes, big-endian) at a time, unbounded in length (spec §4.2's `env`
    /// key resolution).
    pub(crate) fn read_cstring(&self, pc: u32, mut offset: u32) -> Result<String, Fault> {
        let mut bytes = Vec::new();
        'words: loop {
            let word = self.word_memory.read(pc, offset)? as u32;
            for b in word.to_be_bytes() {
                if b == 0 {
                    break 'words;
                }
                bytes.push(b);
            }
            offset = offset.checked_add(1).ok_or(Fault::BoundsError {
                pc,
                region: Region::WordMemory,
                offset: i64::from(u32::MAX) + 1,
                capacity: self.word_memory.capacity(),
            })?;
        }
        String::from_utf8(bytes).map_err(|_| crate::error::domain_error(pc, "environment key is not valid UTF-8"))
    }

    // ---- sys class support ----

    pub(crate) fn trace_line(&mut self, line: &str) {
        tracing::debug!(%line, tick = (self.clock)(), "sys trace");
        let _ = writeln!(self.debug_sink, "{line}");
    }

    pub(crate) fn stop(&mut self, value: Value) {
        self.stopped = true;
        self.exit_value = Some(value);
    }

    pub(crate) fn breakpoint(&mut self) {
        self.stopped = true;
    }

    pub(crate) fn registers_snapshot(&self) -> [Value; VM_REGISTER_COUNT] {
        self.registers
    }
}

/// Whether the S bit is meaningful for this instruction's class/subclass,
/// per the authoritative table in `cursedvm-asm`'s `isa::MNEMONICS`
/// (spec §4.1's "the handler declared its encoding uses S in this
/// variant").
fn s_meaningful(instr: Instruction) -> bool {
    use cursedvm_asm::Class;
    match Class::from_bits(instr.class()) {
        Class::Nop | Class::Pop | Class::Ret => true,
        Class::Push => instr.c0() & 1 == 1,
        Class::Cmp => instr.c1() == 0 && instr.c0() == 0b100,
        Class::Cvt => instr.c0() == 0,
        _ => false,
    }
}

/// Route a decoded instruction to its class handler.
fn dispatch(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    use cursedvm_asm::Class;
    match Class::from_bits(instr.class()) {
        Class::Nop => nop_exit::nop(vm, pc, instr),
        Class::Exit => nop_exit::exit(vm, pc, instr),
        Class::Push => stack::push(vm, pc, instr),
        Class::Pop => stack::pop(vm, pc, instr),
        Class::Ret => stack::ret(vm, pc, instr),
        Class::Env => env_ops::env(vm, pc, instr),
        Class::Branch => branch::branch(vm, pc, instr),
        Class::Cmp => compare::cmp(vm, pc, instr),
        Class::Cvt => convert::cvt(vm, pc, instr),
        Class::Num => arith::num(vm, pc, instr),
        Class::Mem => memio::mem(vm, pc, instr),
        Class::Sys => sys::sys(vm, pc, instr),
        Class::Reserved(bits) => Err(crate::error::decode_error(pc, instr, format!("reserved class {bits}"))),
    }
}
