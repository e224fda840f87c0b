/// Assembler and linker failures.
///
/// Unlike [`crate::Class::Reserved`], these are reported before any word
/// ever reaches the interpreter: they describe malformed *source*, not
/// malformed *runtime behavior*.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A mnemonic token doesn't name any known instruction.
    #[error("line {line}: unrecognized mnemonic `{mnemonic}`")]
    MalformedMnemonic {
        /// 1-based source line number.
        line: usize,
        /// The offending token.
        mnemonic: String,
    },

    /// An operand token's kind (register/immediate/relocation) didn't match
    /// what the mnemonic expects at that position, or the wrong number of
    /// operands was given.
    #[error("line {line}: argument kind mismatch for `{mnemonic}`: {detail}")]
    ArgumentKindMismatch {
        /// 1-based source line number.
        line: usize,
        /// The mnemonic being encoded.
        mnemonic: String,
        /// Human-readable detail.
        detail: String,
    },

    /// A double-quoted string was opened but never closed before end of
    /// line.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString {
        /// 1-based source line number.
        line: usize,
    },

    /// A directive name isn't one of the recognized `.int`/`.float`/`.ptr`/
    /// `.utf8`/`.string`/`.str` forms, or a `DEFINE`/`DEFINEX` macro form
    /// couldn't be parsed.
    #[error("line {line}: unrecognized directive or macro form `{what}`")]
    UnrecognizedForm {
        /// 1-based source line number.
        line: usize,
        /// The offending directive or macro header.
        what: String,
    },

    /// `ipush` appeared somewhere other than immediately after an
    /// instruction whose encoding declares S meaningful.
    #[error("line {line}: `ipush` does not follow an S-capable instruction")]
    MisplacedIpush {
        /// 1-based source line number.
        line: usize,
    },

    /// A label was referenced (via `&name` or `^name`) that no object
    /// defines.
    #[error("missing label `{label}` referenced by a relocation")]
    MissingLabel {
        /// The unresolved label name.
        label: String,
    },

    /// The same label was declared more than once across the linked
    /// objects.
    #[error("duplicate label `{label}`")]
    DuplicateLabel {
        /// The label declared twice.
        label: String,
    },
}
