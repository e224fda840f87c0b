//! Merges assembled [`Object`]s into one flat word image and resolves every
//! pending relocation into the low 16 bits of its instruction.

use std::collections::HashMap;

use crate::error::LinkError;
use crate::instruction::Instruction;
use crate::object::{
    Object,
    RelocKind,
    Relocation,
};

/// Concatenate `objects` in argument order and resolve all relocations.
///
/// Labels are merged into one namespace; declaring the same label in two
/// objects (or twice within one) is a [`LinkError::DuplicateLabel`].
/// A relocation whose label nothing declares is a [`LinkError::MissingLabel`].
///
/// `&label` resolves to the label's absolute word offset in the returned
/// image. `^label` resolves to `target - site`: the displacement a branch at
/// `site` adds to its own (not-yet-incremented) program counter to land on
/// `target`, matching the interpreter's relative-branch semantics.
pub fn link(objects: &[Object]) -> Result<Vec<u32>, LinkError> {
    let mut words = Vec::new();
    let mut labels: HashMap<String, u32> = HashMap::new();
    let mut relocations: Vec<Relocation> = Vec::new();

    for object in objects {
        let base = words.len() as u32;
        for (name, &offset) in &object.labels {
            if labels.insert(name.clone(), base + offset).is_some() {
                let err = LinkError::DuplicateLabel { label: name.clone() };
                tracing::warn!(%err, "link failed");
                return Err(err);
            }
        }
        for reloc in &object.relocations {
            relocations.push(Relocation {
                site: base + reloc.site,
                label: reloc.label.clone(),
                kind: reloc.kind,
            });
        }
        words.extend_from_slice(&object.words);
    }

    for reloc in &relocations {
        let target = *labels.get(&reloc.label).ok_or_else(|| {
            let err = LinkError::MissingLabel { label: reloc.label.clone() };
            tracing::warn!(%err, "link failed");
            err
        })?;
        let low16 = match reloc.kind {
            RelocKind::Absolute => target,
            RelocKind::Relative => target.wrapping_sub(reloc.site),
        };
        tracing::debug!(site = reloc.site, label = %reloc.label, low16, "relocation resolved");
        let mut instr = Instruction::new(words[reloc.site as usize]);
        instr.set_imm(low16 as u16);
        words[reloc.site as usize] = instr.raw();
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::RelocKind;

    #[test]
    fn concatenates_objects_in_order() {
        let mut a = Object::new();
        a.words.push(1);
        let mut b = Object::new();
        b.words.push(2);
        b.words.push(3);
        assert_eq!(link(&[a, b]).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn relative_relocation_to_its_own_site_resolves_to_zero() {
        // A branch referencing its own address is a self-loop: `pc + imm ==
        // pc` requires `imm == 0` (spec §8's "b.i 0 is an infinite loop").
        let mut obj = Object::new();
        obj.labels.insert("start".to_string(), 0);
        obj.words.push(0x6100_0000); // b.i, low half to be patched
        obj.relocations.push(Relocation {
            site: 0,
            label: "start".to_string(),
            kind: RelocKind::Relative,
        });
        let words = link(&[obj]).unwrap();
        let i = Instruction::new(words[0]);
        assert_eq!(i.imm_signed(), 0);
    }

    #[test]
    fn relative_relocation_to_a_preceding_label_resolves_to_backward_offset() {
        // spec §8 scenario 5: `start: cvt.int.i $3, #1; b.i ^start`.
        let mut obj = Object::new();
        obj.labels.insert("start".to_string(), 0);
        obj.words.push(0x8100_0001); // cvt.int.i $3, #1 (placeholder encoding)
        obj.words.push(0x6100_0000); // b.i, low half to be patched
        obj.relocations.push(Relocation {
            site: 1,
            label: "start".to_string(),
            kind: RelocKind::Relative,
        });
        let words = link(&[obj]).unwrap();
        let i = Instruction::new(words[1]);
        assert_eq!(i.imm_signed(), -1);
    }

    #[test]
    fn absolute_relocation_resolves_to_label_word_offset() {
        let mut text = Object::new();
        text.words.push(0x2000_0000); // push.i, low half to be patched
        text.relocations.push(Relocation {
            site: 0,
            label: "greeting".to_string(),
            kind: RelocKind::Absolute,
        });
        let mut rodata = Object::new();
        rodata.labels.insert("greeting".to_string(), 0);
        rodata.words.push(u32::from_be_bytes(*b"hi\0\0"));

        let words = link(&[text, rodata]).unwrap();
        let i = Instruction::new(words[0]);
        assert_eq!(i.imm(), 1); // rodata starts at word offset 1 in the image
    }

    #[test]
    fn missing_label_is_reported() {
        let mut obj = Object::new();
        obj.words.push(0);
        obj.relocations.push(Relocation {
            site: 0,
            label: "nowhere".to_string(),
            kind: RelocKind::Absolute,
        });
        let err = link(&[obj]).unwrap_err();
        assert!(matches!(err, LinkError::MissingLabel { label } if label == "nowhere"));
    }

    #[test]
    fn duplicate_label_across_objects_is_rejected() {
        let mut a = Object::new();
        a.labels.insert("dup".to_string(), 0);
        a.words.push(0);
        let mut b = Object::new();
        b.labels.insert("dup".to_string(), 0);
        b.words.push(0);
        let err = link(&[a, b]).unwrap_err();
        assert!(matches!(err, LinkError::DuplicateLabel { label } if label == "dup"));
    }
}
