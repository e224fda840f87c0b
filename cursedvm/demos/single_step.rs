//! Runs a small program one instruction at a time, printing the register a
//! loop counter lives in after every step.

use cursedvm::{Interpreter, StepOutcome};
use cursedvm_asm::{assemble, link};

fn main() {
    let source = "
        cvt.int.i $3, #0
        loop:
        cvt.int.i $4, #1
        add $3, $3, $4
        c.lt.i $3, #5
        bc.i ^loop
        exit.r $3
    ";
    let (text, rodata) = assemble(source).expect("assembly failed");
    let image: Vec<i32> =
        link(&[text, rodata]).expect("link failed").into_iter().map(|w| w as i32).collect();

    let mut vm = Interpreter::new();
    vm.load_program(&image).expect("program too large for word memory");

    loop {
        match vm.step().expect("step faulted") {
            StepOutcome::Running => println!("step {}: $3 = {:?}", vm.cycles(), vm.registers()[3]),
            StepOutcome::Stopped(value) => {
                println!("stopped after {} cycles: {value:?}", vm.cycles());
                break;
            }
        }
    }
}
