#![no_main]

use libfuzzer_sys::fuzz_target;

/// Assembles arbitrary source into a text and rodata object and, if that
/// succeeds, links the pair. Linking a successfully-assembled pair may
/// legitimately fail (a dangling `&label`/`^label`), but must never panic,
/// and a successful link must always re-decode cleanly.
fuzz_target!(|source: &str| {
    let Ok((text, rodata)) = cursedvm_asm::assemble(source) else {
        return;
    };
    if let Ok(image) = cursedvm_asm::link(&[text, rodata]) {
        for word in image {
            let _ = cursedvm_asm::Instruction::new(word).class();
        }
    }
});
