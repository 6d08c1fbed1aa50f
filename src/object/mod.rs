//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The bplist object model.
//!
//! The bplist format version 00 supports the following object kinds:
//!
//! 1. Null and fill bytes.
//! 2. Boolean.
//! 3. Integers, up to 128 bits long on the wire.
//! 4. Real, single- and double-precision.
//! 5. Data.
//! 6. Date.
//! 7. ASCII and UTF-16 strings.
//! 8. Uid.
//! 9. Array, set and dictionary.
//!
//! Container objects do not hold their children; they hold indices into the
//! document offset table. Every edge in the object graph is an integer
//! reference resolved through the decoder, which keeps objects plain values.
//!
//! # References
//!
//! 1. https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h
//! 2. https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c

use ordered_float::OrderedFloat;

use crate::document::ObjectFormat;

/// An integer object of the width declared by its marker byte.
///
/// Widths of up to eight bytes decode to a `u64`. A sixteen-byte integer is
/// retained as its raw big-endian payload; nothing in a chat archive needs
/// its value.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Integer {
    /// A value of 1, 2, 4 or 8 bytes, zero-extended.
    Narrow { value: u64, width: u8 },
    /// A 16-byte value, kept as raw big-endian bytes.
    Wide([u8; 16]),
}

impl Integer {

    /// The unsigned value, when the width permits one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Integer::Narrow { value, .. } => Some(*value),
            Integer::Wide(_) => None,
        }
    }

    /// The value sign-extended from its declared width.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Integer::Narrow { value, width } => {
                let shift = 64 - u32::from(*width) * 8;
                Some(((value << shift) as i64) >> shift)
            }
            Integer::Wide(_) => None,
        }
    }

}

/// A dictionary object: two parallel runs of object references of equal
/// length, keys first. The pair at position `i` is `(keys[i], values[i])`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Dict {
    /// References to the key objects, in encoded order.
    pub keys: Vec<usize>,
    /// References to the value objects, parallel to `keys`.
    pub values: Vec<usize>,
}

impl Dict {
    /// The number of key/value pairs.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the dictionary holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Represents any valid bplist object.
///
/// Unlike normal `f64` values, `Real` and `Date` payloads are carried as
/// `OrderedFloat` so that objects have a defined order and implement `Ord`,
/// `Eq` and `Hash` in addition to `PartialOrd` and `PartialEq`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Object {
    /// The null singleton.
    Null,

    /// Represents a bplist boolean, like `NSNumber`.
    Boolean(bool),

    /// A fill byte, used for padding.
    Fill,

    /// Represents a bplist integral value, like `NSNumber`.
    Integer(Integer),

    /// Represents a bplist floating-point value, like `NSNumber`.
    /// Four-byte payloads are promoted to double precision.
    Real(OrderedFloat<f64>),

    /// Represents a bplist date, like `NSDate`.
    ///
    /// Dates are encoded as `CFAbsoluteTime` values. This is a double-precision 64-bit
    /// offset, in seconds, from the Core Data Epoch, defined as 1 January 2001, 00:00:00 UTC.
    Date(OrderedFloat<f64>),

    /// Represents a bplist data instance, like `NSData`.
    Data(Vec<u8>),

    /// Represents a 7-bit string, like `NSString`, one byte per character.
    ///
    /// The payload is carried verbatim; content validation happens where a
    /// caller needs genuine ASCII.
    AsciiString(Vec<u8>),

    /// Represents a 16-bit string, carried as big-endian UTF-16 code units.
    Utf16String(Vec<u16>),

    /// Represents a bplist UID value, an object index used by NSKeyedArchiver.
    Uid(u64),

    /// Represents a bplist array of object references, like `NSArray<id>`.
    Array(Vec<usize>),

    /// Represents a bplist set of object references. Recognized but not interpreted.
    Set(Vec<usize>),

    /// Represents a bplist dictionary of object references, like `NSDictionary<id,id>`.
    Dictionary(Dict),
}

impl Object {

    /// The wire format this object decoded from.
    pub fn format(&self) -> ObjectFormat {
        match self {
            Object::Null => ObjectFormat::Null,
            Object::Boolean(_) => ObjectFormat::Boolean,
            Object::Fill => ObjectFormat::Fill,
            Object::Integer(_) => ObjectFormat::Integer,
            Object::Real(_) => ObjectFormat::Real,
            Object::Date(_) => ObjectFormat::Date,
            Object::Data(_) => ObjectFormat::Data,
            Object::AsciiString(_) => ObjectFormat::AsciiString,
            Object::Utf16String(_) => ObjectFormat::Utf16String,
            Object::Uid(_) => ObjectFormat::Uid,
            Object::Array(_) => ObjectFormat::Array,
            Object::Set(_) => ObjectFormat::Set,
            Object::Dictionary(_) => ObjectFormat::Dictionary,
        }
    }

    /// Human-readable name of the object kind, as surfaced when browsing.
    pub fn type_name(&self) -> &'static str {
        self.format().name()
    }

    /// The dictionary payload, if this is a dictionary.
    pub fn as_dictionary(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// The element references, if this is an array.
    pub fn as_array(&self) -> Option<&[usize]> {
        match self {
            Object::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// The referenced index, if this is a UID.
    pub fn as_uid(&self) -> Option<u64> {
        match self {
            Object::Uid(value) => Some(*value),
            _ => None,
        }
    }

    /// The string payload bytes, if this is an ASCII string.
    pub fn as_ascii_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::AsciiString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The unsigned integer value, if this is an integer of up to 8 bytes.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Object::Integer(integer) => integer.as_u64(),
            _ => None,
        }
    }

}

/// Presentation hints attached to a dictionary value by the key it is paired
/// with. A `BaseWritingDirection` value is a signed quantity stored in an
/// unsigned integer; an `NS.time` value is an `NSDate` stored in a plain real.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Hints {
    /// The paired key was the ASCII string `BaseWritingDirection`.
    pub base_writing_direction: bool,
    /// The paired key was the ASCII string `NS.time`.
    pub ns_time: bool,
}

impl Hints {

    /// Derives the hints a key confers on its paired value.
    pub fn for_key(key: &Object) -> Hints {
        match key.as_ascii_bytes() {
            Some(b"BaseWritingDirection") => Hints { base_writing_direction: true, ns_time: false },
            Some(b"NS.time") => Hints { base_writing_direction: false, ns_time: true },
            _ => Hints::default(),
        }
    }

}

/// A dictionary value together with the hints its key conferred on it.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Annotated {
    /// The decoded value object.
    pub value: Object,
    /// Presentation hints propagated from the paired key.
    pub hints: Hints,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_sign_extension() {
        // Sign extension honors the declared width, not a fixed 16 bits.
        let cases: &[(u64, u8, i64)] = &[
            (0xFF, 1, -1),
            (0x7F, 1, 127),
            (0xFFFF, 2, -1),
            (0x8000, 2, -32768),
            (0xFFFF_FFFF, 4, -1),
            (0x8000_0000, 4, -2147483648),
            (0xFFFF_FFFF_FFFF_FFFF, 8, -1),
            (0x0000_0000_0001_E240, 8, 123456),
        ];
        for &(value, width, expected) in cases {
            let integer = Integer::Narrow { value, width };
            assert_eq!(integer.as_i64(), Some(expected));
        }
    }

    #[test]
    fn test_wide_integer_has_no_scalar_value() {
        let integer = Integer::Wide([0xFF; 16]);
        assert_eq!(integer.as_u64(), None);
        assert_eq!(integer.as_i64(), None);
    }

    #[test]
    fn test_hints_for_key() {
        let direction = Object::AsciiString(b"BaseWritingDirection".to_vec());
        let time = Object::AsciiString(b"NS.time".to_vec());
        let other = Object::AsciiString(b"NS.string".to_vec());

        assert!(Hints::for_key(&direction).base_writing_direction);
        assert!(Hints::for_key(&time).ns_time);
        assert_eq!(Hints::for_key(&other), Hints::default());
    }
}
