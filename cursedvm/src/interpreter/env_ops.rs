//! `env` (class 5): get/getp/load/loadp/set/setp against the host
//! environment map and its `Ext` handle table.

use cursedvm_asm::Instruction;

use crate::environment::Binding;
use crate::error::{decode_error, domain_error, type_error, Fault};
use crate::value::{Region, Value};

use super::{Control, Interpreter};

pub(crate) fn env(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    match instr.c0() {
        0 => get(vm, pc, instr, false),
        1 => get(vm, pc, instr, true),
        2 => load(vm, pc, instr, false),
        3 => load(vm, pc, instr, true),
        4 => set(vm, pc, instr, false),
        5 => set(vm, pc, instr, true),
        other => Err(decode_error(pc, instr, format!("reserved env subfunction {other:03b}"))),
    }
}

fn resolve_key(vm: &mut Interpreter, pc: u32, key_value: Value) -> Result<String, Fault> {
    match key_value {
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Ptr { region: Region::WordMemory, offset } => vm.read_cstring(pc, offset),
        Value::Ptr { .. } => Err(type_error(pc, "environment key Ptr must target word memory")),
        Value::Null | Value::Ext(_) => Err(type_error(pc, "environment key must be Int, Float or Ptr")),
    }
}

fn expect_ext(vm: &mut Interpreter, pc: u32, reg: usize) -> Result<u32, Fault> {
    match vm.read_register(pc, reg)? {
        Value::Ext(handle) => Ok(handle),
        other => Err(type_error(pc, format!("property access requires an Ext base, found {other:?}"))),
    }
}

fn binding_for(vm: &Interpreter, is_prop: bool, handle: Option<u32>, key: &str) -> Option<Binding> {
    if is_prop {
        vm.environment().ext(handle.expect("prop access always resolves a handle first"))?.props.get(key).cloned()
    } else {
        vm.environment().get(key).cloned()
    }
}

fn get(vm: &mut Interpreter, pc: u32, instr: Instruction, is_prop: bool) -> Result<Control, Fault> {
    let key_value = vm.read_register(pc, instr.r1())?;
    let key = resolve_key(vm, pc, key_value)?;
    let handle = if is_prop { Some(expect_ext(vm, pc, instr.r2())?) } else { None };
    let binding = binding_for(vm, is_prop, handle, &key);
    let value = match binding {
        None => Value::Null,
        Some(b) => match b.coerce_f32() {
            Some(f) => Value::Float(f),
            None => return Err(domain_error(pc, format!("environment value for `{key}` is not coercible to a finite number"))),
        },
    };
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn load(vm: &mut Interpreter, pc: u32, instr: Instruction, is_prop: bool) -> Result<Control, Fault> {
    let key_value = vm.read_register(pc, instr.r1())?;
    let key = resolve_key(vm, pc, key_value)?;
    let handle = if is_prop { Some(expect_ext(vm, pc, instr.r2())?) } else { None };
    let binding = binding_for(vm, is_prop, handle, &key);
    let value = match binding {
        None => Value::Null,
        Some(b) => Value::Ext(vm.environment_mut().wrap_ext(b)),
    };
    vm.write_register(pc, instr.r0(), value)?;
    Ok(Control::Advance)
}

fn to_binding(vm: &Interpreter, pc: u32, value: Value) -> Result<Binding, Fault> {
    match value {
        Value::Ptr { region: Region::WordMemory, offset } => Ok(Binding::Str(vm.read_cstring(pc, offset)?)),
        Value::Ptr { .. } => Err(type_error(pc, "cannot stringify a Ptr outside word memory")),
        Value::Int(i) => Ok(Binding::Scalar(i as f32)),
        Value::Float(f) => Ok(Binding::Scalar(f)),
        Value::Null => Ok(Binding::Scalar(0.0)),
        Value::Ext(handle) => vm
            .environment()
            .ext(handle)
            .and_then(|o| o.binding.clone())
            .ok_or_else(|| type_error(pc, "unknown Ext handle")),
    }
}

fn set(vm: &mut Interpreter, pc: u32, instr: Instruction, is_prop: bool) -> Result<Control, Fault> {
    let key_value = vm.read_register(pc, instr.r1())?;
    let key = resolve_key(vm, pc, key_value)?;
    let value = vm.read_register(pc, instr.r0())?;
    let binding = to_binding(vm, pc, value)?;
    if is_prop {
        let handle = expect_ext(vm, pc, instr.r2())?;
        let obj = vm.environment_mut().ext_mut(handle).ok_or_else(|| type_error(pc, "unknown Ext handle"))?;
        obj.props.insert(key, binding);
    } else {
        vm.environment_mut().set(key, binding);
    }
    Ok(Control::Advance)
}
