//! `push` (class 2), `pop` (class 3) and `ret` (class 4).

use cursedvm_asm::Instruction;

use crate::error::{decode_error, Fault};
use crate::value::{Region, Value};

use super::{Control, Interpreter};

pub(crate) fn push(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let value = if instr.c0() & 1 == 1 {
        vm.read_register(pc, instr.r0())?
    } else {
        Value::Int(instr.imm_signed())
    };
    vm.data_push(pc, value)?;
    Ok(Control::Advance)
}

pub(crate) fn pop(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let value = match instr.c0() & 0b11 {
        0b00 => vm.data_pop(pc)?,
        0b01 => Value::Int(vm.irs_pop(pc)?),
        0b11 => Value::Ptr { region: Region::WordMemory, offset: vm.irs_pop(pc)? as u32 },
        other => return Err(decode_error(pc, instr, format!("reserved pop subfunction {other:02b}"))),
    };
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

pub(crate) fn ret(vm: &mut Interpreter, pc: u32, _instr: Instruction) -> Result<Control, Fault> {
    let target = vm.call_pop(pc)?;
    vm.set_pc(target);
    Ok(Control::Branched)
}
