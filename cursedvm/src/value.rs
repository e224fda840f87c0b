//! The tagged [`Value`] model and the five addressable [`Region`]s a [`Value::Ptr`]
//! can name.

use cursedvm_types::{RawWord, Word};

/// One of the five memory regions a [`Value::Ptr`] can address.
///
/// Word memory and the call stack and IRS are *word-shaped*: each cell holds
/// a raw 32-bit word, reinterpreted on demand. Object memory and the data
/// stack are *object-shaped*: each cell holds a tagged [`Value`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// The large word-shaped region holding the loaded program and any
    /// heap-like data a program builds for itself.
    WordMemory,
    /// Object-shaped scratch memory for tagged values.
    ObjectMemory,
    /// Word-shaped return-address stack, not directly exposed as a register.
    CallStack,
    /// Word-shaped Immediate Reuse Stack, exposed via `$IRSP`.
    Irs,
    /// Object-shaped data stack, exposed via `$SP`.
    DataStack,
}

impl Region {
    /// `true` for regions whose cells hold raw words reinterpreted on
    /// demand, `false` for regions whose cells hold tagged [`Value`]s.
    pub const fn is_word_shaped(self) -> bool {
        matches!(self, Region::WordMemory | Region::CallStack | Region::Irs)
    }

    /// The tag used to encode this region inside a [`Value::Ptr`]'s raw
    /// view (see [`Value::raw_view`] and [`Value::from_raw`]).
    const fn tag(self) -> u8 {
        match self {
            Region::WordMemory => 0,
            Region::ObjectMemory => 1,
            Region::CallStack => 2,
            Region::Irs => 3,
            Region::DataStack => 4,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Region::WordMemory),
            1 => Some(Region::ObjectMemory),
            2 => Some(Region::CallStack),
            3 => Some(Region::Irs),
            4 => Some(Region::DataStack),
            _ => None,
        }
    }
}

/// A CursedVM runtime value: every register, every stack slot and every
/// object-memory cell holds exactly one of these, tagged at all times.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A 32-bit signed integer.
    Int(Word),
    /// A 32-bit IEEE-754 float.
    Float(f32),
    /// A pointer into one of the five regions.
    Ptr {
        /// Which region this pointer addresses.
        region: Region,
        /// Cell offset within that region.
        offset: u32,
    },
    /// An opaque handle into the host environment's object table.
    Ext(u32),
}

impl Value {
    /// The four-byte raw bit-pattern view used by bitwise reinterpretation
    /// (`cvt.*.repr` and raw word reads/writes). `Null` and `Ext` have no
    /// raw view: they carry no bits that would survive a round trip.
    pub fn raw_view(self) -> Option<RawWord> {
        match self {
            Value::Int(i) => Some(i as RawWord),
            Value::Float(f) => Some(f.to_bits()),
            Value::Ptr { region, offset } => {
                Some(((region.tag() as RawWord) << 24) | (offset & 0x00ff_ffff))
            }
            Value::Null | Value::Ext(_) => None,
        }
    }

    /// Build a value of the given [`ValueKind`] by reinterpreting `raw`'s
    /// bits. Returns `None` if `raw` is not a valid encoding for that kind
    /// (currently only possible for `Ptr`, whose region tag might not name
    /// one of the five known regions).
    pub fn from_raw(kind: ValueKind, raw: RawWord) -> Option<Value> {
        match kind {
            ValueKind::Int => Some(Value::Int(raw as Word)),
            ValueKind::Float => Some(Value::Float(f32::from_bits(raw))),
            ValueKind::Ptr => {
                let region = Region::from_tag((raw >> 24) as u8)?;
                Some(Value::Ptr {
                    region,
                    offset: raw & 0x00ff_ffff,
                })
            }
        }
    }

    /// This value's tag, for type checks and the `repr` conversion's
    /// selector-register lookup.
    pub const fn kind(self) -> Option<ValueKind> {
        match self {
            Value::Int(_) => Some(ValueKind::Int),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Ptr { .. } => Some(ValueKind::Ptr),
            Value::Null | Value::Ext(_) => None,
        }
    }

    /// `true` for `Value::Null`.
    pub const fn is_null(self) -> bool {
        matches!(self, Value::Null)
    }
}

/// The three value tags that carry a raw bit-pattern view: `Null` and `Ext`
/// are excluded since neither has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum ValueKind {
    /// Tag of [`Value::Int`].
    Int,
    /// Tag of [`Value::Float`].
    Float,
    /// Tag of [`Value::Ptr`].
    Ptr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_raw_view_round_trips() {
        let v = Value::Int(-7);
        let raw = v.raw_view().unwrap();
        assert_eq!(Value::from_raw(ValueKind::Int, raw), Some(v));
    }

    #[test]
    fn float_raw_view_round_trips() {
        let v = Value::Float(0.5);
        let raw = v.raw_view().unwrap();
        assert_eq!(Value::from_raw(ValueKind::Float, raw), Some(v));
    }

    #[test]
    fn ptr_raw_view_round_trips_region_and_offset() {
        let v = Value::Ptr {
            region: Region::DataStack,
            offset: 1234,
        };
        let raw = v.raw_view().unwrap();
        assert_eq!(Value::from_raw(ValueKind::Ptr, raw), Some(v));
    }

    #[test]
    fn null_and_ext_have_no_raw_view() {
        assert_eq!(Value::Null.raw_view(), None);
        assert_eq!(Value::Ext(3).raw_view(), None);
    }

    #[test]
    fn reinterpreting_across_kinds_truncates_bitwise() {
        let raw = Value::Float(1.0).raw_view().unwrap();
        assert_eq!(Value::from_raw(ValueKind::Int, raw), Some(Value::Int(raw as Word)));
    }

    #[test]
    fn value_kind_iterates_over_exactly_the_three_raw_view_bearing_tags() {
        use strum::IntoEnumIterator;
        let kinds: Vec<ValueKind> = ValueKind::iter().collect();
        assert_eq!(kinds, vec![ValueKind::Int, ValueKind::Float, ValueKind::Ptr]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn value_round_trips_through_json() {
        let values = [
            Value::Null,
            Value::Int(-7),
            Value::Float(0.5),
            Value::Ptr { region: Region::DataStack, offset: 9 },
            Value::Ext(3),
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }
    }
}
