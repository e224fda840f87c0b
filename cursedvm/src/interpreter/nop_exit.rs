//! `nop` (class 0) and `exit` (class 1).

use cursedvm_asm::Instruction;

use crate::error::Fault;
use crate::value::Value;

use super::{Control, Interpreter};

pub(crate) fn nop(_vm: &mut Interpreter, _pc: u32, _instr: Instruction) -> Result<Control, Fault> {
    Ok(Control::Advance)
}

pub(crate) fn exit(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let value = if instr.c0() & 1 == 1 {
        vm.read_register(pc, instr.r0())?
    } else {
        Value::Int(instr.imm_signed())
    };
    vm.stop(value);
    Ok(Control::Advance)
}
