//! `sys` (class 15): debug/trace output, plus a breakpoint flavor of each
//! subfunction that additionally stops the VM.

use cursedvm_asm::Instruction;

use crate::error::{decode_error, Fault};

use super::{Control, Interpreter};

pub(crate) fn sys(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<Control, Fault> {
    match instr.c0() & 0b011 {
        0 => print_register(vm, pc, instr)?,
        1 => print_state(vm, pc),
        other => return Err(decode_error(pc, instr, format!("reserved sys subfunction {other:02b}"))),
    }
    if instr.c0() & 0b100 != 0 {
        vm.breakpoint();
    }
    Ok(Control::Advance)
}

fn print_register(vm: &mut Interpreter, pc: u32, instr: Instruction) -> Result<(), Fault> {
    let value = vm.read_register(pc, instr.r0())?;
    vm.trace_line(&format!("sys.reg ${}={value:?}", instr.r0()));
    Ok(())
}

fn print_state(vm: &mut Interpreter, pc: u32) {
    let registers = vm.registers_snapshot();
    let top = vm.data_stack_top();
    let calls = vm.call_stack_window(4);
    vm.trace_line(&format!(
        "sys.state pc={pc} registers={registers:?} stack_top={top:?} call_stack={calls:?} cycles={}",
        vm.cycles(),
    ));
}
