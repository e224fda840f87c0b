//! Assembler- and linker-level behavior that doesn't require running the
//! resulting image: label resolution, relocation kinds, and malformed
//! source rejection.

use cursedvm_asm::{assemble, link, Class, Instruction, LinkError};

#[test]
fn absolute_relocation_through_a_call_resolves_to_the_target_word_offset() {
    let source = "
        call.i &sub
        exit.i #0
        sub:
        ret
    ";
    let (text, rodata) = assemble(source).unwrap();
    let image = link(&[text, rodata]).unwrap();

    let call = Instruction::new(image[0]);
    assert_eq!(call.class(), Class::Branch.to_bits());
    assert_eq!(call.imm(), 2); // `sub:` sits two words into the image
}

#[test]
fn forward_relative_branch_resolves_to_a_positive_offset() {
    let source = "
        b.i ^ahead
        exit.i #1
        ahead:
        exit.i #2
    ";
    let (text, rodata) = assemble(source).unwrap();
    let image = link(&[text, rodata]).unwrap();

    let branch = Instruction::new(image[0]);
    assert_eq!(branch.imm_signed(), 2);
}

#[test]
fn string_literals_hoist_into_the_rodata_object_with_null_terminated_padding() {
    let (text, rodata) = assemble("push.i \"ok\"\n").unwrap();
    assert_eq!(text.relocations.len(), 1);
    // "ok\0" is 3 bytes, padded up to the next 4-byte word boundary -> 1 word.
    assert_eq!(rodata.words.len(), 1);
    let bytes = rodata.words[0].to_be_bytes();
    assert_eq!(&bytes[..3], b"ok\0");
}

#[test]
fn two_objects_assembled_separately_link_into_one_contiguous_image() {
    let (text_a, _) = assemble("nop\n").unwrap();
    let (text_b, _) = assemble("exit.i #9\n").unwrap();
    let image = link(&[text_a, text_b]).unwrap();
    assert_eq!(image.len(), 2);
    let second = Instruction::new(image[1]);
    assert_eq!(second.class(), Class::Exit.to_bits());
}

#[test]
fn duplicate_labels_across_the_linked_set_are_rejected() {
    let (a, _) = assemble("loop: nop\n").unwrap();
    let (b, _) = assemble("loop: nop\n").unwrap();
    let err = link(&[a, b]).unwrap_err();
    assert!(matches!(err, LinkError::DuplicateLabel { label } if label == "loop"));
}

#[test]
fn malformed_definex_header_is_reported_with_its_line() {
    let err = assemble("nop\nDEFINEX broken header, no parens\n").unwrap_err();
    match err {
        LinkError::UnrecognizedForm { line, .. } => assert_eq!(line, 2),
        other => panic!("expected UnrecognizedForm, got {other:?}"),
    }
}

#[test]
fn unknown_directive_falls_through_to_mnemonic_lookup() {
    let err = assemble("nop\n.bogus #1\n").unwrap_err();
    match err {
        LinkError::MalformedMnemonic { line, mnemonic } => {
            assert_eq!(line, 2);
            assert_eq!(mnemonic, ".bogus");
        }
        other => panic!("expected MalformedMnemonic, got {other:?}"),
    }
}

#[test]
fn unterminated_string_literal_is_reported() {
    let err = assemble("push.i \"never closed\n").unwrap_err();
    assert!(matches!(err, LinkError::UnterminatedString { line: 1 }));
}

#[test]
fn ipush_not_following_an_s_capable_instruction_is_rejected() {
    let err = assemble("nop\nipush &wherever\n").unwrap_err();
    assert!(matches!(err, LinkError::MisplacedIpush { line: 2 }));
}

#[test]
fn wrong_operand_kind_is_rejected_with_the_mnemonic_name() {
    let err = assemble("add $3, #1, $4\n").unwrap_err();
    match err {
        LinkError::ArgumentKindMismatch { mnemonic, .. } => assert_eq!(mnemonic, "add"),
        other => panic!("expected ArgumentKindMismatch, got {other:?}"),
    }
}
