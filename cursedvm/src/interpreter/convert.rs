//! `cvt` (class 8): immediate construction, register conversion, and the
//! nested `repr` bit-reinterpretation form.

use cursedvm_asm::Instruction;

use crate::error::{decode_error, type_error, Fault};
use crate::value::{Region, Value};

use super::{Control, Interpreter};

pub(crate) fn cvt(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    if instr.c0() > 3 {
        return Err(decode_error(pc, instr, format!("reserved cvt destination {:03b}", instr.c0())));
    }
    if instr.c1() & 1 == 0 {
        immediate(vm, pc, instr)
    } else if instr.c1() & 0b010 != 0 {
        repr(vm, pc, instr)
    } else {
        register(vm, pc, instr)
    }
}

fn immediate(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let imm = instr.imm_signed();
    let value = match instr.c0() {
        0 => Value::Null,
        1 => Value::Int(imm),
        2 => Value::Float(imm as f32),
        3 => Value::Ptr { region: Region::WordMemory, offset: imm as u32 },
        _ => unreachable!("c0 bounds checked by cvt()"),
    };
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn register(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let src = vm.read_register(pc, instr.r2())?;
    let value = convert_value(pc, instr.c0(), src)?;
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn repr(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let selector = vm.read_register(pc, instr.r1())?;
    let source_kind = selector.kind().ok_or_else(|| type_error(pc, "repr source-type selector must be Int, Float or Ptr"))?;
    let raw_src = vm.read_register(pc, instr.r2())?;
    let raw = raw_src.raw_view().ok_or_else(|| type_error(pc, "repr source register holds Null or Ext, no raw view"))?;
    let reinterpreted = Value::from_raw(source_kind, raw)
        .ok_or_else(|| crate::error::domain_error(pc, "reinterpreted raw bits do not name a valid Ptr region"))?;
    let value = convert_value(pc, instr.c0(), reinterpreted)?;
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn convert_value(pc: u32, dest: u8, src: Value) -> Result<Value, Fault> {
    match dest {
        0 => Ok(Value::Null),
        1 => match src {
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Float(f) => Ok(Value::Int(f as i32)),
            Value::Ptr { offset, .. } => Ok(Value::Int(offset as i32)),
            other => Err(type_error(pc, format!("cannot convert {other:?} to Int"))),
        },
        2 => match src {
            Value::Int(i) => Ok(Value::Float(i as f32)),
            Value::Float(f) => Ok(Value::Float(f)),
            other => Err(type_error(pc, format!("cannot convert {other:?} to Float"))),
        },
        3 => match src {
            Value::Ptr { region, offset } => Ok(Value::Ptr { region, offset }),
            Value::Int(i) => Ok(Value::Ptr { region: Region::WordMemory, offset: i as u32 }),
            other => Err(type_error(pc, format!("cannot convert {other:?} to Ptr"))),
        },
        other => Err(type_error(pc, format!("conversion to destination code {other} is fatal"))),
    }
}
