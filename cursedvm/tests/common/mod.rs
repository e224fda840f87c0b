use cursedvm::{Fault, Interpreter, StepOutcome, Value};
use cursedvm_asm::{assemble, link};

/// Assemble and link a source string into a flat word image.
pub fn build(source: &str) -> Vec<i32> {
    let (text, rodata) = assemble(source).expect("assembly failed");
    link(&[text, rodata]).expect("link failed").into_iter().map(|w| w as i32).collect()
}

/// Assemble, link, load and run a program to completion.
pub fn run(source: &str) -> Result<Value, Fault> {
    let words = build(source);
    let mut vm = Interpreter::new();
    vm.load_program(&words).expect("program too large for word memory");
    vm.run()
}

/// Assemble, link and load a program without running it, for tests that
/// drive `step` by hand.
pub fn loaded(source: &str) -> Interpreter {
    let words = build(source);
    let mut vm = Interpreter::new();
    vm.load_program(&words).expect("program too large for word memory");
    vm
}

#[allow(dead_code)]
pub fn step_until_stopped(vm: &mut Interpreter, max_steps: usize) -> Value {
    for _ in 0..max_steps {
        if let StepOutcome::Stopped(v) = vm.step().expect("step faulted") {
            return v;
        }
    }
    panic!("program did not stop within {max_steps} steps");
}
