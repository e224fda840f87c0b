//! Line-oriented assembler: macro preprocessing, tokenizing, and per-line
//! encoding into a text and a rodata [`Object`].
//!
//! Each instruction word is built in two passes over its own bits: first the
//! class, subfunction and operand fields the mnemonic actually binds are set
//! and marked *bound*; then every bit position left unbound is copied from
//! the previous emitted word, rotated left by one, the "substrate" rule. This
//! is why encoding is stateful across lines rather than a pure per-line
//! function.

use std::collections::HashMap;

use cursedvm_types::{
    lookup_register_name,
    VM_REGISTER_COUNT,
};

use crate::error::LinkError;
use crate::instruction::Instruction;
use crate::isa::{
    self,
    FieldUse,
    LowHalf,
    MnemonicDef,
    OperandKind,
    SRole,
};
use crate::object::{
    Object,
    RelocKind,
    Relocation,
};

const SHIFT_CLASS: u32 = 28;
const MASK_CLASS: u32 = 0xf << SHIFT_CLASS;
const MASK_S: u32 = 1 << 27;
const SHIFT_C0: u32 = 24;
const MASK_C0: u32 = 0x7 << SHIFT_C0;
const SHIFT_C1: u32 = 21;
const MASK_C1: u32 = 0x7 << SHIFT_C1;
const SHIFT_R0: u32 = 16;
const MASK_R0: u32 = 0x1f << SHIFT_R0;
const SHIFT_R1: u32 = 8;
const MASK_R1: u32 = 0x1f << SHIFT_R1;
const MASK_R2: u32 = 0x1f;
const MASK_IMM: u32 = 0xffff;

/// A parsed source-line operand, before it is bound into a word's bit groups.
#[derive(Debug, Clone)]
enum Operand {
    Reg(u8),
    Literal(i32),
    Reloc(RelocKind, String),
}

/// A `DEFINE`/`DEFINEX` macro, recorded during preprocessing.
#[derive(Debug, Clone)]
enum MacroDef {
    /// `DEFINE NAME replacement text...`; `[NAME]` substitutes literally.
    Simple(String),
    /// `DEFINEX (tag;?p1;?p2) template...`; `[tag] a b` substitutes `a`/`b`
    /// for `?p1`/`?p2` in `template`.
    Param {
        params: Vec<String>,
        template: String,
    },
}

/// Assembles one source unit into its text and rodata [`Object`]s.
///
/// Directives and instructions both emit into the text object; the rodata
/// object only ever receives words hoisted automatically from string and
/// float literals used as operands.
pub fn assemble(source: &str) -> Result<(Object, Object), LinkError> {
    let mut asm = Assembler::new();
    assemble_inner(&mut asm, source).map_err(|err| {
        tracing::warn!(%err, "assembly failed");
        err
    })?;
    Ok((asm.text, asm.rodata))
}

fn assemble_inner(asm: &mut Assembler, source: &str) -> Result<(), LinkError> {
    let lines = asm.preprocess(source)?;
    for (line_no, line) in lines {
        asm.assemble_line(line_no, &line)?;
    }
    Ok(())
}

struct Assembler {
    text: Object,
    rodata: Object,
    macros: HashMap<String, MacroDef>,
    rodata_seq: u32,
    /// Whether the most recently emitted text word came from a mnemonic
    /// whose S bit is the sticky IRS-push flag, making `ipush` legal now.
    last_s_capable: bool,
    /// Word offset, in the text object, of the most recently emitted word.
    last_site: Option<u32>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            text: Object::new(),
            rodata: Object::new(),
            macros: HashMap::new(),
            rodata_seq: 0,
            last_s_capable: false,
            last_site: None,
        }
    }

    // ---- preprocessing: comments, DEFINE/DEFINEX, macro expansion ----

    fn preprocess(&mut self, source: &str) -> Result<Vec<(usize, String)>, LinkError> {
        let mut pending = Vec::new();
        for (i, raw) in source.lines().enumerate() {
            let line_no = i + 1;
            let stripped = Self::strip_comment(raw).trim();
            if stripped.is_empty() {
                continue;
            }
            if let Some(rest) = stripped.strip_prefix("DEFINEX") {
                self.add_definex(line_no, rest.trim())?;
                continue;
            }
            if let Some(rest) = stripped.strip_prefix("DEFINE") {
                self.add_define(line_no, rest.trim())?;
                continue;
            }
            for statement in Self::split_statements(stripped) {
                let statement = statement.trim();
                if !statement.is_empty() {
                    pending.push((line_no, statement.to_string()));
                }
            }
        }

        let mut out = Vec::with_capacity(pending.len());
        for (line_no, line) in pending {
            let mut current = line;
            for _ in 0..8 {
                let expanded = self.expand_once(&current);
                if expanded == current {
                    break;
                }
                current = expanded;
            }
            out.push((line_no, current));
        }
        Ok(out)
    }

    /// Split a `\n`-delimited source line into its `;`-terminated statements
    /// (spec §6: "Lines terminate on `\n` or `;`"), leaving `;` inside a
    /// quoted string alone.
    fn split_statements(line: &str) -> Vec<&str> {
        let bytes = line.as_bytes();
        let mut in_string = false;
        let mut start = 0;
        let mut out = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'"' => in_string = !in_string,
                b';' if !in_string => {
                    out.push(&line[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        out.push(&line[start..]);
        out
    }

    /// Cut a line at its first `//` that isn't inside a quoted string.
    fn strip_comment(line: &str) -> &str {
        let bytes = line.as_bytes();
        let mut in_string = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'"' => in_string = !in_string,
                b'/' if !in_string && i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    return &line[..i];
                }
                _ => {}
            }
            i += 1;
        }
        line
    }

    fn add_define(&mut self, line_no: usize, rest: &str) -> Result<(), LinkError> {
        let mut it = rest.splitn(2, char::is_whitespace);
        let name = it
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LinkError::UnrecognizedForm {
                line: line_no,
                what: "DEFINE".to_string(),
            })?;
        let replacement = it.next().unwrap_or("").trim().to_string();
        self.macros.insert(name.to_string(), MacroDef::Simple(replacement));
        Ok(())
    }

    fn add_definex(&mut self, line_no: usize, rest: &str) -> Result<(), LinkError> {
        let malformed = || LinkError::UnrecognizedForm {
            line: line_no,
            what: "DEFINEX".to_string(),
        };
        let rest = rest.trim();
        if !rest.starts_with('(') {
            return Err(malformed());
        }
        let close = rest.find(')').ok_or_else(malformed)?;
        let header = &rest[1..close];
        let template = rest[close + 1..].trim().to_string();
        let mut parts = header.split(';').map(str::trim);
        let tag = parts.next().filter(|s| !s.is_empty()).ok_or_else(malformed)?;
        let params: Vec<String> = parts.map(|p| p.trim_start_matches('?').to_string()).collect();
        self.macros.insert(tag.to_string(), MacroDef::Param { params, template });
        Ok(())
    }

    /// One substitution pass. A line that opens with `[tag]` where `tag`
    /// names a parameterized macro treats the rest of the line as that
    /// macro's positional arguments and replaces the whole line. Otherwise,
    /// every `[name]` naming a simple macro is replaced inline, so a single
    /// line may fire several simple macros (e.g. as operands).
    fn expand_once(&self, line: &str) -> String {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('[') {
            if let Some(close) = rest.find(']') {
                let tag = &rest[..close];
                if let Some(MacroDef::Param { params, template }) = self.macros.get(tag) {
                    let args: Vec<&str> = rest[close + 1..].split_whitespace().collect();
                    let mut expanded = template.clone();
                    for (p, a) in params.iter().zip(args.iter()) {
                        expanded = expanded.replace(&format!("?{p}"), a);
                    }
                    return expanded;
                }
            }
        }

        let mut out = String::with_capacity(line.len());
        let mut i = 0;
        while i < line.len() {
            if line.as_bytes()[i] == b'[' {
                if let Some(rel_close) = line[i..].find(']') {
                    let close = i + rel_close;
                    let name = &line[i + 1..close];
                    if let Some(MacroDef::Simple(repl)) = self.macros.get(name) {
                        out.push_str(repl);
                        i = close + 1;
                        continue;
                    }
                }
            }
            let ch = line[i..].chars().next().expect("i is a char boundary");
            out.push(ch);
            i += ch.len_utf8();
        }
        out
    }

    // ---- tokenizing and dispatch ----

    /// Split on whitespace and commas, keeping a `"..."` string literal
    /// (including its quotes and interior spaces) as a single token.
    fn tokenize(line_no: usize, line: &str) -> Result<Vec<String>, LinkError> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    let mut s = String::from("\"");
                    let mut closed = false;
                    for c2 in chars.by_ref() {
                        s.push(c2);
                        if c2 == '"' {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(LinkError::UnterminatedString { line: line_no });
                    }
                    tokens.push(s);
                }
                ' ' | '\t' | ',' => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        Ok(tokens)
    }

    fn assemble_line(&mut self, line_no: usize, line: &str) -> Result<(), LinkError> {
        let mut tokens = Self::tokenize(line_no, line)?;
        if tokens.is_empty() {
            return Ok(());
        }

        if tokens[0].len() > 1 && tokens[0].ends_with(':') && !tokens[0].starts_with('"') {
            let label = tokens[0][..tokens[0].len() - 1].to_string();
            if self.text.labels.contains_key(&label) {
                return Err(LinkError::DuplicateLabel { label });
            }
            let offset = self.text.offset();
            self.text.labels.insert(label, offset);
            tokens.remove(0);
            if tokens.is_empty() {
                return Ok(());
            }
        }

        let head = tokens[0].clone();
        let args = &tokens[1..];
        match head.as_str() {
            "ipush" => self.handle_ipush(line_no, args),
            ".int" | ".float" | ".ptr" | ".utf8" | ".string" | ".str" => {
                self.handle_directive(line_no, &head, args)
            }
            _ => self.handle_instruction(line_no, &head, args),
        }
    }

    // ---- directives ----

    fn handle_directive(&mut self, line_no: usize, directive: &str, args: &[String]) -> Result<(), LinkError> {
        match directive {
            ".int" | ".ptr" => {
                let v = self.parse_plain_int(line_no, directive, args)?;
                self.text.words.push(v as u32);
            }
            ".float" => {
                let v = self.parse_plain_float(line_no, directive, args)?;
                self.text.words.push(v.to_bits());
            }
            ".utf8" | ".string" | ".str" => {
                let raw = args.first().ok_or_else(|| LinkError::ArgumentKindMismatch {
                    line: line_no,
                    mnemonic: directive.to_string(),
                    detail: "expected a quoted string".to_string(),
                })?;
                if !(raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2) {
                    return Err(LinkError::ArgumentKindMismatch {
                        line: line_no,
                        mnemonic: directive.to_string(),
                        detail: format!("expected a quoted string, found `{raw}`"),
                    });
                }
                for word in Self::pack_utf8(&raw[1..raw.len() - 1]) {
                    self.text.words.push(word);
                }
            }
            _ => unreachable!("dispatched only for known directives"),
        }
        self.last_s_capable = false;
        self.last_site = None;
        Ok(())
    }

    fn parse_plain_int(&self, line_no: usize, directive: &str, args: &[String]) -> Result<i32, LinkError> {
        let tok = args.first().ok_or_else(|| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: "expected a `#<literal>` operand".to_string(),
        })?;
        let lit = tok.strip_prefix('#').ok_or_else(|| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: format!("expected `#<literal>`, found `{tok}`"),
        })?;
        lit.parse().map_err(|_| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: format!("malformed integer literal `{tok}`"),
        })
    }

    fn parse_plain_float(&self, line_no: usize, directive: &str, args: &[String]) -> Result<f32, LinkError> {
        let tok = args.first().ok_or_else(|| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: "expected a `#<literal>` operand".to_string(),
        })?;
        let lit = tok.strip_prefix('#').ok_or_else(|| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: format!("expected `#<literal>`, found `{tok}`"),
        })?;
        lit.parse().map_err(|_| LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: directive.to_string(),
            detail: format!("malformed float literal `{tok}`"),
        })
    }

    /// NUL-terminate and NUL-pad to a 4-byte boundary, then pack into
    /// big-endian words.
    fn pack_utf8(s: &str) -> Vec<u32> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
            .chunks(4)
            .map(|chunk| {
                let mut arr = [0u8; 4];
                arr[..chunk.len()].copy_from_slice(chunk);
                u32::from_be_bytes(arr)
            })
            .collect()
    }

    // ---- ipush ----

    fn handle_ipush(&mut self, line_no: usize, args: &[String]) -> Result<(), LinkError> {
        if !self.last_s_capable {
            return Err(LinkError::MisplacedIpush { line: line_no });
        }
        if args.len() != 1 {
            return Err(LinkError::ArgumentKindMismatch {
                line: line_no,
                mnemonic: "ipush".to_string(),
                detail: format!("expected exactly one operand, found {}", args.len()),
            });
        }
        let operand = self.parse_immediate(line_no, "ipush", &args[0])?;
        let site = self
            .last_site
            .expect("last_s_capable is only set alongside last_site");

        let mut instr = Instruction::new(self.text.words[site as usize]);
        instr.set_s(true);
        match operand {
            Operand::Literal(v) => instr.set_imm(v as u16),
            Operand::Reloc(kind, label) => {
                instr.set_imm(0);
                self.text.relocations.push(Relocation { site, label, kind });
            }
            Operand::Reg(_) => {
                return Err(LinkError::ArgumentKindMismatch {
                    line: line_no,
                    mnemonic: "ipush".to_string(),
                    detail: "expected an immediate operand".to_string(),
                });
            }
        }
        self.text.words[site as usize] = instr.raw();
        self.last_s_capable = false;
        Ok(())
    }

    // ---- instructions ----

    fn handle_instruction(&mut self, line_no: usize, mnemonic: &str, args: &[String]) -> Result<(), LinkError> {
        let def = isa::lookup(mnemonic).ok_or_else(|| LinkError::MalformedMnemonic {
            line: line_no,
            mnemonic: mnemonic.to_string(),
        })?;
        if args.len() != def.operands.len() {
            return Err(LinkError::ArgumentKindMismatch {
                line: line_no,
                mnemonic: mnemonic.to_string(),
                detail: format!("expected {} operand(s), found {}", def.operands.len(), args.len()),
            });
        }
        let mut operands = Vec::with_capacity(args.len());
        for (tok, kind) in args.iter().zip(def.operands.iter()) {
            operands.push(self.parse_operand(line_no, mnemonic, *kind, tok)?);
        }
        self.encode(line_no, def, &operands)
    }

    fn parse_operand(&mut self, line_no: usize, mnemonic: &str, kind: OperandKind, tok: &str) -> Result<Operand, LinkError> {
        match kind {
            OperandKind::Reg => {
                let body = tok.strip_prefix('$').ok_or_else(|| LinkError::ArgumentKindMismatch {
                    line: line_no,
                    mnemonic: mnemonic.to_string(),
                    detail: format!("expected a $register, found `{tok}`"),
                })?;
                let id = lookup_register_name(body)
                    .or_else(|| body.parse::<u8>().ok())
                    .filter(|id| (*id as usize) < VM_REGISTER_COUNT)
                    .ok_or_else(|| LinkError::ArgumentKindMismatch {
                        line: line_no,
                        mnemonic: mnemonic.to_string(),
                        detail: format!("unknown register `{tok}`"),
                    })?;
                Ok(Operand::Reg(id))
            }
            OperandKind::Imm => self.parse_immediate(line_no, mnemonic, tok),
        }
    }

    fn parse_immediate(&mut self, line_no: usize, mnemonic: &str, tok: &str) -> Result<Operand, LinkError> {
        if let Some(label) = tok.strip_prefix('&') {
            return Ok(Operand::Reloc(RelocKind::Absolute, label.to_string()));
        }
        if let Some(label) = tok.strip_prefix('^') {
            return Ok(Operand::Reloc(RelocKind::Relative, label.to_string()));
        }
        if let Some(lit) = tok.strip_prefix("F#") {
            let v: f32 = lit.parse().map_err(|_| LinkError::ArgumentKindMismatch {
                line: line_no,
                mnemonic: mnemonic.to_string(),
                detail: format!("malformed float literal `{tok}`"),
            })?;
            return Ok(Operand::Reloc(RelocKind::Absolute, self.hoist_float(v)));
        }
        if let Some(lit) = tok.strip_prefix('#') {
            let v: i32 = lit.parse().map_err(|_| LinkError::ArgumentKindMismatch {
                line: line_no,
                mnemonic: mnemonic.to_string(),
                detail: format!("malformed immediate literal `{tok}`"),
            })?;
            return Ok(Operand::Literal(v));
        }
        if tok.starts_with('"') && tok.ends_with('"') && tok.len() >= 2 {
            return Ok(Operand::Reloc(RelocKind::Absolute, self.hoist_string(&tok[1..tok.len() - 1])));
        }
        Err(LinkError::ArgumentKindMismatch {
            line: line_no,
            mnemonic: mnemonic.to_string(),
            detail: format!("expected an immediate, relocation or literal, found `{tok}`"),
        })
    }

    fn hoist_string(&mut self, s: &str) -> String {
        let label = format!("__str_{}", self.rodata_seq);
        self.rodata_seq += 1;
        let offset = self.rodata.offset();
        self.rodata.labels.insert(label.clone(), offset);
        for word in Self::pack_utf8(s) {
            self.rodata.words.push(word);
        }
        label
    }

    fn hoist_float(&mut self, v: f32) -> String {
        let label = format!("__f32_{}", self.rodata_seq);
        self.rodata_seq += 1;
        let offset = self.rodata.offset();
        self.rodata.labels.insert(label.clone(), offset);
        self.rodata.words.push(v.to_bits());
        label
    }

    /// Bind `def`'s fixed and operand-sourced bit groups, then substrate-fill
    /// everything left unbound from the previous text word, rotated left 1.
    fn encode(&mut self, line_no: usize, def: &MnemonicDef, operands: &[Operand]) -> Result<(), LinkError> {
        let mut word: u32 = (def.class.to_bits() as u32) << SHIFT_CLASS;
        let mut bound: u32 = MASK_CLASS;

        word |= (def.c0 as u32) << SHIFT_C0;
        bound |= MASK_C0;
        word |= (def.c1 as u32) << SHIFT_C1;
        bound |= MASK_C1;

        match def.s_role {
            SRole::IrsPushFlag => bound |= MASK_S,
            SRole::TypeToggle(set) => {
                if set {
                    word |= MASK_S;
                }
                bound |= MASK_S;
            }
            SRole::NotMeaningful => {}
        }

        if let FieldUse::Operand(idx) = def.r0 {
            let reg = Self::expect_reg(line_no, def.name, operands, idx)?;
            word |= (reg as u32) << SHIFT_R0;
            bound |= MASK_R0;
        }

        let mut reloc = None;
        match def.low {
            LowHalf::Imm(idx) => {
                match operands.get(idx) {
                    Some(Operand::Literal(v)) => word |= (*v as u32) & MASK_IMM,
                    Some(Operand::Reloc(kind, label)) => reloc = Some((*kind, label.clone())),
                    _ => {
                        return Err(LinkError::ArgumentKindMismatch {
                            line: line_no,
                            mnemonic: def.name.to_string(),
                            detail: "expected an immediate operand".to_string(),
                        })
                    }
                }
                bound |= MASK_IMM;
            }
            LowHalf::Regs(r1_use, r2_use) => {
                if let FieldUse::Operand(idx) = r1_use {
                    let reg = Self::expect_reg(line_no, def.name, operands, idx)?;
                    word |= (reg as u32) << SHIFT_R1;
                    bound |= MASK_R1;
                }
                if let FieldUse::Operand(idx) = r2_use {
                    let reg = Self::expect_reg(line_no, def.name, operands, idx)?;
                    word |= reg as u32;
                    bound |= MASK_R2;
                }
            }
        }

        let filler = self.text.last_word().rotate_left(1);
        word |= filler & !bound;

        let site = self.text.offset();
        self.text.words.push(word);
        if let Some((kind, label)) = reloc {
            self.text.relocations.push(Relocation { site, label, kind });
        }
        self.last_s_capable = matches!(def.s_role, SRole::IrsPushFlag);
        self.last_site = Some(site);
        Ok(())
    }

    fn expect_reg(line_no: usize, mnemonic: &str, operands: &[Operand], idx: usize) -> Result<u8, LinkError> {
        match operands.get(idx) {
            Some(Operand::Reg(r)) => Ok(*r),
            _ => Err(LinkError::ArgumentKindMismatch {
                line: line_no,
                mnemonic: mnemonic.to_string(),
                detail: "expected a register operand".to_string(),
            }),
        }
    }
}
