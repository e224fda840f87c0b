//! `mem` (class 10): load/store through a `Ptr`, region-dispatched between
//! the word-shaped and object-shaped backing stores.

use cursedvm_asm::Instruction;

use crate::error::{decode_error, domain_error, type_error, Fault};
use crate::value::{Region, Value, ValueKind};

use super::{Control, Interpreter};

pub(crate) fn mem(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    match instr.c0() {
        0..=2 => read(vm, pc, instr),
        3 => write(vm, pc, instr),
        other => Err(decode_error(pc, instr, format!("reserved mem subfunction {other:03b}"))),
    }
}

fn offset_value(pc: u32, v: Value) -> Result<i32, Fault> {
    match v {
        Value::Int(i) => Ok(i),
        Value::Ptr { offset, .. } => Ok(offset as i32),
        other => Err(type_error(pc, format!("mem offset operand must be Int or Ptr, found {other:?}"))),
    }
}

fn address(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<(Region, u32), Fault> {
    let base = vm.read_register(pc, instr.r1())?;
    let (region, base_offset) = match base {
        Value::Ptr { region, offset } => (region, offset),
        other => return Err(type_error(pc, format!("mem address operand must be a Ptr, found {other:?}"))),
    };
    let delta = offset_value(pc, vm.read_register(pc, instr.r2())?)?;
    Ok((region, base_offset.wrapping_add(delta as u32)))
}

fn read(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let (region, addr) = address(vm, pc, instr)?;
    let value = if region.is_word_shaped() {
        let raw = vm.read_word_region(pc, region, addr)? as u32;
        let kind = match instr.c0() {
            0 => ValueKind::Int,
            1 => ValueKind::Float,
            2 => ValueKind::Ptr,
            _ => unreachable!("mem() only dispatches 0..=2 here"),
        };
        Value::from_raw(kind, raw).ok_or_else(|| domain_error(pc, "raw word does not name a valid Ptr region"))?
    } else {
        vm.read_object_region(pc, region, addr)?
    };
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn write(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let (region, addr) = address(vm, pc, instr)?;
    let value = vm.read_register(pc, instr.r0())?;
    if region.is_word_shaped() {
        let raw = value.raw_view().ok_or_else(|| type_error(pc, "word-shaped write requires Int, Float or Ptr"))?;
        vm.write_word_region(pc, region, addr, raw as i32)?;
    } else {
        vm.write_object_region(pc, region, addr, value)?;
    }
    Ok(Control::Advance)
}
