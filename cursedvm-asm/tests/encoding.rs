use cursedvm_asm::*;

#[test]
fn assembling_every_mnemonic_produces_one_word_each() {
    // One line per table entry, fed plausible operands by kind; what matters
    // here is that every mnemonic in the table actually assembles, not the
    // resulting bit pattern.
    let mut source = String::new();
    for def in MNEMONICS {
        source.push_str(def.name);
        for (i, kind) in def.operands.iter().enumerate() {
            if i > 0 {
                source.push(',');
            }
            source.push(' ');
            match kind {
                OperandKind::Reg => source.push_str("$3"),
                OperandKind::Imm => source.push_str("#1"),
            }
        }
        source.push('\n');
    }

    let (text, _) = assemble(&source).expect("every table mnemonic should assemble");
    assert_eq!(text.words.len(), MNEMONICS.len());
}

#[test]
fn symbolic_register_names_match_numeric_indices() {
    let (a, _) = assemble("sys.reg $PC").unwrap();
    let (b, _) = assemble("sys.reg $2").unwrap();
    assert_eq!(a.words, b.words);
}

#[test]
fn a_small_loop_assembles_and_links_to_a_self_branch() {
    let source = "\
        loop:\n\
        add $3, $3, $ZERO\n\
        b.i ^loop\n";
    let (text, rodata) = assemble(source).unwrap();
    let image = link(&[text, rodata]).unwrap();

    let branch = Instruction::new(image[1]);
    assert_eq!(branch.class(), Class::Branch.to_bits());
    // loop: sits one word behind the branch itself (pc + imm == pc - 1 == loop)
    assert_eq!(branch.imm_signed(), -1);
}

#[test]
fn host_call_argument_strings_hoist_into_a_separate_rodata_image() {
    let source = "push.i \"hello\"\npush.i \"there\"\n";
    let (text, rodata) = assemble(source).unwrap();
    assert_eq!(text.relocations.len(), 2);
    assert_eq!(rodata.labels.len(), 2);
    // "hello\0" -> 6 bytes -> padded to 8 -> 2 words; "there\0" likewise
    assert_eq!(rodata.words.len(), 4);

    let image = link(&[text, rodata]).unwrap();
    let first = Instruction::new(image[0]);
    let second = Instruction::new(image[1]);
    assert_ne!(first.imm(), second.imm());
}

#[test]
fn ipush_deferred_relocation_resolves_at_link_time() {
    let source = "push.r $3\nipush &payload\n.int #0\npayload:\n.int #99\n";
    let (text, rodata) = assemble(source).unwrap();
    let image = link(&[text, rodata]).unwrap();
    let instr = Instruction::new(image[0]);
    assert!(instr.s());
    assert_eq!(instr.imm(), 2); // payload sits two words into the text image
}

#[test]
fn unknown_mnemonic_surfaces_the_offending_line() {
    let err = assemble("nop\nnop\nnotarealinstruction $0").unwrap_err();
    match err {
        LinkError::MalformedMnemonic { line, mnemonic } => {
            assert_eq!(line, 3);
            assert_eq!(mnemonic, "notarealinstruction");
        }
        other => panic!("expected MalformedMnemonic, got {other:?}"),
    }
}

#[test]
fn linking_reports_a_label_no_object_declares() {
    let (text, rodata) = assemble("b.i &nowhere\n").unwrap();
    let err = link(&[text, rodata]).unwrap_err();
    assert!(matches!(err, LinkError::MissingLabel { label } if label == "nowhere"));
}
