#![no_main]

use cursedvm::Interpreter;
use libfuzzer_sys::fuzz_target;

/// Feeds arbitrary raw words straight into word memory and single-steps
/// the interpreter a bounded number of times. Decoding every 32-bit
/// pattern is infallible (see `Instruction::class`); dispatch on reserved
/// classes, reserved subfunctions, or type-mismatched operands must
/// surface as a `Fault`, never a panic.
fuzz_target!(|words: Vec<i32>| {
    if words.is_empty() {
        return;
    }
    let mut vm = Interpreter::new();
    if vm.load_program(&words).is_err() {
        return;
    }
    for _ in 0..256 {
        match vm.step() {
            Ok(outcome) => {
                if matches!(outcome, cursedvm::StepOutcome::Stopped(_)) {
                    break;
                }
            }
            Err(_fault) => break,
        }
    }
});
