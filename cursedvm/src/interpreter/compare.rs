//! `cmp` (class 7): immediate mode (destination fixed to `$COMP`) and
//! register-register mode (destination is the `r1` bit-field).

use std::cmp::Ordering;

use cursedvm_asm::Instruction;

use crate::error::{decode_error, domain_error, type_error, Fault};
use crate::value::Value;

use super::{reg_idx, Control, Interpreter};
use cursedvm_types::RegId;

pub(crate) fn cmp(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    if instr.c1() & 1 == 0 {
        immediate_mode(vm, pc, instr)
    } else {
        register_mode(vm, pc, instr)
    }
}

fn immediate_mode(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let result = match instr.c0() {
        0b100 => {
            let v = vm.read_register(pc, instr.r0())?;
            is_zero(pc, v)? as i32
        }
        code @ (0b000 | 0b001 | 0b010 | 0b101 | 0b110) => {
            let lhs = vm.read_register(pc, instr.r0())?;
            let ordering = three_way(pc, lhs, Value::Int(instr.imm_signed()))?;
            ordered_result(code, ordering)
        }
        other => return Err(decode_error(pc, instr, format!("reserved cmp.i subfunction {other:03b}"))),
    };
    vm.write_register(pc, reg_idx(RegId::COMP), Value::Int(result))?;
    Ok(Control::Advance)
}

fn register_mode(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let a = vm.read_register(pc, instr.r0())?;
    let dest = instr.r1();
    let result = match instr.c0() {
        0b011 => a.is_null() as i32,
        0b111 => !a.is_null() as i32,
        0b100 => {
            let b = vm.read_register(pc, instr.r2())?;
            identity_eq(pc, a, b)? as i32
        }
        code @ (0b000 | 0b001 | 0b010 | 0b101 | 0b110) => {
            let b = vm.read_register(pc, instr.r2())?;
            let ordering = three_way(pc, a, b)?;
            ordered_result(code, ordering)
        }
        other => return Err(decode_error(pc, instr, format!("reserved cmp subfunction {other:03b}"))),
    };
    vm.write_register(pc, dest, Value::Int(result))?;
    Ok(Control::Advance)
}

fn ordered_result(code: u8, ordering: i32) -> i32 {
    match code {
        0b000 => (ordering == 0) as i32,
        0b001 => (ordering != 0) as i32,
        0b010 => (ordering < 0) as i32,
        0b101 => (ordering <= 0) as i32,
        0b110 => (ordering >= 0) as i32,
        _ => unreachable!("caller only passes ordered comparison codes"),
    }
}

fn ord_to_i32(o: Ordering) -> i32 {
    match o {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// `-1`/`0`/`1` three-way comparison; the sole primitive the boolean
/// eq/ne/lt/le/ge comparisons are all derived from.
fn three_way(pc: u32, lhs: Value, rhs: Value) -> Result<i32, Fault> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(ord_to_i32(a.cmp(&b))),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(&b).map(ord_to_i32).ok_or_else(|| domain_error(pc, "comparison involving NaN"))
        }
        (Value::Ptr { region: ra, offset: oa }, Value::Ptr { region: rb, offset: ob }) if ra == rb => {
            Ok(ord_to_i32(oa.cmp(&ob)))
        }
        (Value::Ptr { .. }, Value::Ptr { .. }) => Err(type_error(pc, "cannot compare pointers into different regions")),
        _ => Err(type_error(pc, "comparison operands must both be Int, both Float, or pointers into the same region")),
    }
}

fn identity_eq(pc: u32, a: Value, b: Value) -> Result<bool, Fault> {
    if a.kind().is_some() && b.kind().is_some() {
        Ok(a == b)
    } else {
        Err(type_error(pc, "object-identity comparison requires Int, Float or Ptr operands"))
    }
}

fn is_zero(pc: u32, v: Value) -> Result<bool, Fault> {
    match v {
        Value::Int(i) => Ok(i == 0),
        Value::Float(f) => Ok(f == 0.0),
        other => Err(type_error(pc, format!("c.not operand must be Int or Float, found {other:?}"))),
    }
}
