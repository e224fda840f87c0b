//! The mnemonic table: how a parsed assembly line's operands bind to the
//! fixed-position bit groups described by [`crate::instruction::Instruction`].
//!
//! This is deliberately *not* a literal 32-character template string parser.
//! Every CursedVM instruction shares the same field layout (class, S, c0,
//! c1, r0, c2, r1, c3, r2), so a mnemonic only needs to say which of those
//! groups it fixes to an opcode-selecting constant, which it binds to one of
//! the line's parsed operands, and which it leaves to the substrate filler.
//! See [`crate::assembler`] for where the substrate rule itself lives.

use crate::class::Class;

/// How bit group S behaves for a given mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SRole {
    /// S plays no role for this instruction; it is substrate-filled like any
    /// other unbound group.
    NotMeaningful,
    /// S is the sticky IRS-push flag; `ipush` may rewrite it after this
    /// instruction is emitted.
    IrsPushFlag,
    /// S is repurposed as the numeric class's type-toggle `T`, fixed to the
    /// given value by this mnemonic.
    TypeToggle(bool),
}

/// Where an operand taken from the source line lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUse {
    /// The field is not bound by this mnemonic; substrate-fill it.
    Unused,
    /// The field takes the value of the `n`th parsed operand (0-indexed).
    Operand(usize),
}

/// Layout of the low half-word (bits 15..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowHalf {
    /// The whole low half-word is one immediate (or relocatable) operand.
    Imm(usize),
    /// The low half-word is split into r1 (bits 12..8) and r2 (bits 4..0);
    /// c2 and c3 are always substrate-filled in this layout.
    Regs(FieldUse, FieldUse),
}

/// The kind of token an operand slot expects, for validating and decoding
/// the parsed line before binding it into a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A `$`-prefixed register token.
    Reg,
    /// A `#`-prefixed literal, a relocation (`&`/`^`), or a hoisted
    /// string/float constant.
    Imm,
}

/// A single mnemonic's fixed encoding shape.
#[derive(Debug, Clone, Copy)]
pub struct MnemonicDef {
    /// The mnemonic as written in source, e.g. `"cvt.int.repr"`.
    pub name: &'static str,
    /// Instruction class.
    pub class: Class,
    /// Fixed c0 value for this mnemonic.
    pub c0: u8,
    /// Fixed c1 value for this mnemonic (0 where the class does not use c1).
    pub c1: u8,
    /// Where r0 (bits 20..16) comes from.
    pub r0: FieldUse,
    /// Layout of the low half-word.
    pub low: LowHalf,
    /// Role of the S bit for this mnemonic.
    pub s_role: SRole,
    /// Expected operand tokens, in source order.
    pub operands: &'static [OperandKind],
}

macro_rules! mnemonic {
    ($name:literal, $class:expr, $c0:expr, $c1:expr, $r0:expr, $low:expr, $s:expr, $ops:expr) => {
        MnemonicDef {
            name: $name,
            class: $class,
            c0: $c0,
            c1: $c1,
            r0: $r0,
            low: $low,
            s_role: $s,
            operands: $ops,
        }
    };
}

use FieldUse::{
    Operand as Op,
    Unused,
};
use LowHalf::{
    Imm,
    Regs,
};
use OperandKind::{
    Imm as IK,
    Reg as RK,
};
use SRole::{
    IrsPushFlag as IrsPush,
    NotMeaningful as NM,
    TypeToggle as TT,
};

/// Every mnemonic the assembler recognizes. Each one maps to exactly one
/// encoding, as required by the stable assembly-source contract.
pub const MNEMONICS: &[MnemonicDef] = &[
    mnemonic!("nop", Class::Nop, 0, 0, Unused, Regs(Unused, Unused), IrsPush, &[]),
    // exit
    mnemonic!("exit.i", Class::Exit, 0, 0, Unused, Imm(0), NM, &[IK]),
    mnemonic!("exit.r", Class::Exit, 1, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    // push
    mnemonic!("push.i", Class::Push, 0, 0, Unused, Imm(0), NM, &[IK]),
    mnemonic!("push.r", Class::Push, 1, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    // pop
    mnemonic!("pop.d", Class::Pop, 0, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    mnemonic!("pop.i", Class::Pop, 1, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    mnemonic!("pop.p", Class::Pop, 3, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    // ret
    mnemonic!("ret", Class::Ret, 0, 0, Unused, Regs(Unused, Unused), IrsPush, &[]),
    // env
    mnemonic!("env.get", Class::Env, 0, 0, Op(0), Regs(Op(1), Unused), NM, &[RK, RK]),
    mnemonic!("env.getp", Class::Env, 1, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("env.load", Class::Env, 2, 0, Op(0), Regs(Op(1), Unused), NM, &[RK, RK]),
    mnemonic!("env.loadp", Class::Env, 3, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("env.set", Class::Env, 4, 0, Op(0), Regs(Op(1), Unused), NM, &[RK, RK]),
    mnemonic!("env.setp", Class::Env, 5, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    // branch / call -- c0 = mode(call=bit2) | absolute(bit1) | immediate-target(bit0)
    mnemonic!("b.r", Class::Branch, 0b000, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("bc.r", Class::Branch, 0b000, 1, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("b.i", Class::Branch, 0b001, 0, Unused, Imm(0), NM, &[IK]),
    mnemonic!("bc.i", Class::Branch, 0b001, 1, Unused, Imm(0), NM, &[IK]),
    mnemonic!("ba.r", Class::Branch, 0b010, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("bca.r", Class::Branch, 0b010, 1, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("ba.i", Class::Branch, 0b011, 0, Unused, Imm(0), NM, &[IK]),
    mnemonic!("bca.i", Class::Branch, 0b011, 1, Unused, Imm(0), NM, &[IK]),
    mnemonic!("call.r", Class::Branch, 0b110, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("call.i", Class::Branch, 0b111, 0, Unused, Imm(0), NM, &[IK]),
    // cmp, register-register mode (c1 = 1): dest r1, operands r0 and r2
    mnemonic!("c.eq", Class::Cmp, 0, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.ne", Class::Cmp, 1, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.lt", Class::Cmp, 2, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.null", Class::Cmp, 3, 1, Op(1), Regs(Op(0), Unused), NM, &[RK, RK]),
    mnemonic!("c.same", Class::Cmp, 4, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.le", Class::Cmp, 5, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.ge", Class::Cmp, 6, 1, Op(1), Regs(Op(0), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("c.notnull", Class::Cmp, 7, 1, Op(1), Regs(Op(0), Unused), NM, &[RK, RK]),
    // cmp, immediate mode (c1 = 0): destination is always $COMP, never encoded
    mnemonic!("c.eq.i", Class::Cmp, 0, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("c.ne.i", Class::Cmp, 1, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("c.lt.i", Class::Cmp, 2, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("c.not.i", Class::Cmp, 4, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    mnemonic!("c.le.i", Class::Cmp, 5, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("c.ge.i", Class::Cmp, 6, 0, Op(0), Imm(1), NM, &[RK, IK]),
    // cvt, immediate mode (c1 = 0b000)
    mnemonic!("cvt.null.i", Class::Cvt, 0, 0, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    mnemonic!("cvt.int.i", Class::Cvt, 1, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("cvt.float.i", Class::Cvt, 2, 0, Op(0), Imm(1), NM, &[RK, IK]),
    mnemonic!("cvt.ptr.i", Class::Cvt, 3, 0, Op(0), Imm(1), NM, &[RK, IK]),
    // cvt, register mode (c1 bit0 = 1)
    mnemonic!("cvt.null.r", Class::Cvt, 0, 1, Op(0), Regs(Unused, Unused), IrsPush, &[RK]),
    mnemonic!("cvt.int.r", Class::Cvt, 1, 1, Op(0), Regs(Unused, Op(1)), NM, &[RK, RK]),
    mnemonic!("cvt.float.r", Class::Cvt, 2, 1, Op(0), Regs(Unused, Op(1)), NM, &[RK, RK]),
    mnemonic!("cvt.ptr.r", Class::Cvt, 3, 1, Op(0), Regs(Unused, Op(1)), NM, &[RK, RK]),
    // cvt, register mode with repr reinterpretation (c1 bits 1,0 = 1,1)
    mnemonic!("cvt.int.repr", Class::Cvt, 1, 0b011, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("cvt.float.repr", Class::Cvt, 2, 0b011, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("cvt.ptr.repr", Class::Cvt, 3, 0b011, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    // num: z = x `op` y; T toggles per the pairing in the class table
    mnemonic!("add", Class::Num, 0, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("add.f", Class::Num, 0, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("sub", Class::Num, 1, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("sub.f", Class::Num, 1, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("mult", Class::Num, 2, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("mult.f", Class::Num, 2, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("div", Class::Num, 3, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("div.f", Class::Num, 3, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("mod", Class::Num, 4, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("mod.f", Class::Num, 4, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("and", Class::Num, 5, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("or", Class::Num, 5, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("xor", Class::Num, 6, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("xnor", Class::Num, 6, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    mnemonic!("shl", Class::Num, 7, 0, Op(0), Regs(Op(1), Op(2)), TT(false), &[RK, RK, RK]),
    mnemonic!("shr", Class::Num, 7, 0, Op(0), Regs(Op(1), Op(2)), TT(true), &[RK, RK, RK]),
    // mem
    mnemonic!("read.int", Class::Mem, 0, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("read.float", Class::Mem, 1, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("read.ptr", Class::Mem, 2, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    mnemonic!("write", Class::Mem, 3, 0, Op(0), Regs(Op(1), Op(2)), NM, &[RK, RK, RK]),
    // sys
    mnemonic!("sys.reg", Class::Sys, 0, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("sys.state", Class::Sys, 1, 0, Unused, Regs(Unused, Unused), NM, &[]),
    mnemonic!("sys.reg.bp", Class::Sys, 4, 0, Op(0), Regs(Unused, Unused), NM, &[RK]),
    mnemonic!("sys.state.bp", Class::Sys, 5, 0, Unused, Regs(Unused, Unused), NM, &[]),
];

/// Look up a mnemonic's definition by name.
pub fn lookup(name: &str) -> Option<&'static MnemonicDef> {
    MNEMONICS.iter().find(|m| m.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mnemonic_is_unique() {
        for (i, a) in MNEMONICS.iter().enumerate() {
            for b in &MNEMONICS[i + 1..] {
                assert_ne!(a.name, b.name, "duplicate mnemonic {}", a.name);
            }
        }
    }

    #[test]
    fn lookup_finds_known_and_rejects_unknown() {
        assert!(lookup("add").is_some());
        assert!(lookup("div.f").is_some());
        assert!(lookup("frobnicate").is_none());
    }
}
