#![no_main]

use libfuzzer_sys::fuzz_target;

/// The assembler must never panic on malformed source; every rejection
/// path is a `LinkError`.
fuzz_target!(|source: &str| {
    let _ = cursedvm_asm::assemble(source);
});
