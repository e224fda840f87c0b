//! `branch`/`call` (class 6): relative/absolute, register/immediate target,
//! conditional or not, plus the external-call path through an `Ext` handle.

use cursedvm_asm::Instruction;

use crate::environment::HostArg;
use crate::error::{decode_error, domain_error, type_error, Fault};
use crate::value::{Region, Value};

use super::{reg_idx, Control, Interpreter};
use cursedvm_types::RegId;

pub(crate) fn branch(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    let is_call = instr.c0() & 0b100 != 0;
    let is_absolute = instr.c0() & 0b010 != 0;
    let is_immediate = instr.c0() & 0b001 != 0;
    let is_conditional = instr.c1() & 0b001 != 0;

    if is_call && !is_absolute {
        return Err(decode_error(pc, instr, "relative call is illegal"));
    }

    if is_conditional {
        match vm.read_register(pc, reg_idx(RegId::COMP))? {
            Value::Int(0) => return Ok(Control::Advance),
            Value::Int(_) => {}
            other => return Err(type_error(pc, format!("conditional branch requires $COMP to hold an Int, found {other:?}"))),
        }
    }

    if is_immediate {
        let imm = instr.imm_signed();
        if is_absolute {
            if is_call {
                vm.call_push(pc, pc.wrapping_add(1))?;
            }
            vm.set_pc(imm as u32);
        } else {
            vm.set_pc((pc as i64 + imm as i64) as u32);
        }
        return Ok(Control::Branched);
    }

    let target = vm.read_register(pc, instr.r0())?;
    if is_absolute {
        match target {
            Value::Int(addr) => {
                if is_call {
                    vm.call_push(pc, pc.wrapping_add(1))?;
                }
                vm.set_pc(addr as u32);
                Ok(Control::Branched)
            }
            Value::Ptr { region: Region::WordMemory, offset } => {
                if is_call {
                    vm.call_push(pc, pc.wrapping_add(1))?;
                }
                vm.set_pc(offset);
                Ok(Control::Branched)
            }
            Value::Ptr { .. } => Err(type_error(pc, "absolute branch/call Ptr target must be in word memory")),
            Value::Ext(handle) if is_call => {
                external_call(vm, pc, handle)?;
                Ok(Control::Advance)
            }
            other => Err(type_error(pc, format!("absolute branch/call target must be Int, Ptr, or (call-only) Ext, found {other:?}"))),
        }
    } else {
        match target {
            Value::Int(offset) => {
                vm.set_pc((pc as i64 + offset as i64) as u32);
                Ok(Control::Branched)
            }
            other => Err(type_error(pc, format!("relative branch target register must hold Int, found {other:?}"))),
        }
    }
}

fn external_call(vm: &mut Interpreter, pc: u32, handle: u32) -> Result<(), Fault> {
    let function = vm
        .environment()
        .function_at(handle)
        .cloned()
        .ok_or_else(|| type_error(pc, "Ext handle does not name a callable"))?;

    let result = match function.arity {
        Some(n) => {
            let mut args = Vec::with_capacity(n);
            for _ in 0..n {
                args.push(HostArg::Value(vm.data_pop(pc)?));
            }
            function.call(&args)
        }
        None => {
            let count = match vm.data_pop(pc)? {
                Value::Int(n) if n >= 0 => n as usize,
                Value::Int(_) => return Err(domain_error(pc, "ordinary call argument count must be non-negative")),
                other => return Err(type_error(pc, format!("ordinary call argument count must be an Int, found {other:?}"))),
            };
            let mut args = Vec::with_capacity(count);
            for _ in 0..count {
                let popped = vm.data_pop(pc)?;
                args.push(marshal_arg(vm, pc, popped)?);
            }
            function.call(&args)
        }
    };

    let value = match result {
        Some(binding) => Value::Ext(vm.environment_mut().wrap_ext(binding)),
        None => Value::Null,
    };
    vm.data_push(pc, value)
}

fn marshal_arg(vm: &Interpreter, pc: u32, value: Value) -> Result<HostArg, Fault> {
    match value {
        Value::Ptr { region: Region::WordMemory, offset } => Ok(HostArg::Str(vm.read_cstring(pc, offset)?)),
        Value::Int(i) => Ok(HostArg::Scalar(i as f32)),
        Value::Float(f) => Ok(HostArg::Scalar(f)),
        other => Ok(HostArg::Value(other)),
    }
}
