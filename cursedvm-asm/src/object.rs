use std::collections::BTreeMap;

/// Whether a relocation resolves to an absolute address or a
/// caller-relative displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocKind {
    /// Resolves to the label's absolute word offset in the final image.
    Absolute,
    /// Resolves to `label offset - site offset`.
    Relative,
}

/// A deferred fixup: the low 16 bits of the word at `site` must be
/// overwritten once `label` is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Word offset, within the object that owns this relocation, of the
    /// instruction to patch.
    pub site: u32,
    /// The label being referenced.
    pub label: String,
    /// Absolute or relative.
    pub kind: RelocKind,
}

/// One of the assembler's two output sections: a flat word stream with its
/// own label table and pending relocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    /// Emitted words, in order.
    pub words: Vec<u32>,
    /// Label name to word offset, local to this object.
    pub labels: BTreeMap<String, u32>,
    /// Fixups pending resolution at link time.
    pub relocations: Vec<Relocation>,
}

impl Object {
    /// An empty object with no words, labels or relocations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current word offset; the position the next emitted word (or a label
    /// declared right now) would occupy.
    pub fn offset(&self) -> u32 {
        self.words.len() as u32
    }

    /// The most recently emitted word, or zero if this object is still
    /// empty. Feeds the assembler's substrate filler.
    pub fn last_word(&self) -> u32 {
        self.words.last().copied().unwrap_or(0)
    }
}
