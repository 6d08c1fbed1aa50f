//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    IResult,
    branch::alt,
    bytes::complete::take,
    combinator::{map, verify},
    error::ErrorKind,
    multi::many_m_n,
    number::complete::{be_u16, be_f32, be_f64},
    sequence::tuple,
};

use crate::decode::parser::utils::{be_u64_n, be_usize_n};
use crate::document::ObjectFormat;
use crate::object::{Dict, Integer};

/// Returns a parser which consumes a marker conforming to the specified format.
/// On success, the parser yields both the validated format and the encoded value.
/// This allows the function to be used to verify a marker byte is of the specified
/// format and to decode the value contained therein, if any.
fn marker(
    format: ObjectFormat
) -> impl Fn(&[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    move |input: &[u8]| {
        map(
            verify(take(1usize), move |b: &[u8]| -> bool {
                (b[0] & format.tag_mask()) == format.tag_bits()
            }),
            move |b: &[u8]| -> (ObjectFormat, u8) {
                (format, b[0] & format.value_mask())
            }
        )(input)
    }
}

/// Parses a marker byte and returns both the object format and encoded value.
pub fn any_marker(input: &[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    alt((
        marker(ObjectFormat::Null),
        marker(ObjectFormat::Boolean),
        marker(ObjectFormat::Fill),
        marker(ObjectFormat::Integer),
        marker(ObjectFormat::Real),
        marker(ObjectFormat::Date),
        marker(ObjectFormat::Data),
        marker(ObjectFormat::AsciiString),
        marker(ObjectFormat::Utf16String),
        marker(ObjectFormat::Uid),
        marker(ObjectFormat::Array),
        marker(ObjectFormat::Set),
        marker(ObjectFormat::Dictionary),
    ))(input)
}

/// Parses a boolean object with an encoded value bit.
pub fn boolean(input: &[u8]) -> IResult<&[u8], bool> {
    map(
        marker(ObjectFormat::Boolean),
        |(_, value)| value == 1
    )(input)
}

/// Parses an integer object whose width is 2^n bytes, where n is the value
/// encoded in the marker. Widths of up to 8 bytes decode to a value;
/// a 16-byte integer is retained as raw big-endian bytes.
pub fn integer(input: &[u8]) -> IResult<&[u8], Integer> {
    let (input, (_, exponent)) = marker(ObjectFormat::Integer)(input)?;
    match exponent {
        0..=3 => {
            let width = 1usize << exponent;
            map(
                be_u64_n(width),
                move |value| Integer::Narrow { value, width: width as u8 }
            )(input)
        }
        4 => {
            map(
                take(16usize),
                |bytes: &[u8]| {
                    let mut wide = [0u8; 16];
                    wide.copy_from_slice(bytes);
                    Integer::Wide(wide)
                }
            )(input)
        }
        _ => Err(nom::Err::Error((input, ErrorKind::Verify))),
    }
}

/// Parses a floating point object of 4 or 8 bytes, promoting single
/// precision to double.
pub fn real(input: &[u8]) -> IResult<&[u8], f64> {
    let (input, (_, exponent)) = marker(ObjectFormat::Real)(input)?;
    match exponent {
        2 => map(be_f32, f64::from)(input),
        3 => be_f64(input),
        _ => Err(nom::Err::Error((input, ErrorKind::Verify))),
    }
}

/// Parses a 64-bit double-precision CFAbsoluteTime date value.
pub fn date(input: &[u8]) -> IResult<&[u8], f64> {
    map(
        tuple((
            marker(ObjectFormat::Date),
            be_f64,
        )),
        |(_, value)| value
    )(input)
}

/// Returns a parser for the length of an object payload.
/// The parameter is the value encoded in the marker byte to which the payload corresponds.
/// If the encoded value is:
///   0b0000_0000 ..= 0b0000_1110:
///     No additional input is consumed and the encoded value represents directly
///     the payload count value.
///   0b0000_1111:
///     An integer object with a 1, 2, 4 or 8 byte payload follows.
///     This object is consumed, interpreted as an unsigned value, and returned.
pub fn payload_count(
    encoded_value: u8,
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    assert!((encoded_value & 0b1111_0000) == 0, "encoded length must be a 4-bit value");
    move |input: &[u8]| {
        if encoded_value == 0b0000_1111 {
            let (input, (_, exponent)) = marker(ObjectFormat::Integer)(input)?;
            if exponent > 3 {
                return Err(nom::Err::Error((input, ErrorKind::Verify)));
            }
            be_usize_n(1usize << exponent)(input)
        } else {
            Ok((input, encoded_value as usize))
        }
    }
}

/// Parses a variable-length data object and returns the corresponding slice of the input.
pub fn data(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Data)(input)?;
    let (input, data_length) = payload_count(encoded_value)(input)?;
    take(data_length)(input)
}

/// Parses a variable-length ASCII string object and returns the corresponding
/// slice of the input, one byte per character.
///
/// # Notes
///
/// 1. The payload is carried verbatim; content validation happens where a
///    caller needs genuine ASCII.
/// 2. This is a zero-copy operation.
pub fn ascii_string(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::AsciiString)(input)?;
    let (input, char_count) = payload_count(encoded_value)(input)?;
    take(char_count)(input)
}

/// Parses a variable-length UTF-16 string object and returns its big-endian
/// code units. A string of n characters occupies exactly 2n payload bytes.
///
/// # Notes
///
/// 1. Code units are returned raw; surrogates are not paired and nothing is
///    transcoded at this layer.
/// 2. This is not a zero-copy operation.
pub fn utf16_string(input: &[u8]) -> IResult<&[u8], Vec<u16>> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Utf16String)(input)?;
    let (input, char_count) = payload_count(encoded_value)(input)?;
    many_m_n(
        char_count,
        char_count,
        be_u16
    )(input)
}

/// Parses a variable-length uid object of n + 1 bytes, where n is the value
/// encoded in the marker, and returns its value as an object index.
pub fn uid(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Uid)(input)?;
    let width = encoded_value as usize + 1;
    if width > 8 {
        return Err(nom::Err::Error((input, ErrorKind::Verify)));
    }
    be_u64_n(width)(input)
}

/// Returns a parser for an array with the specified-width object references.
///
/// The value returned by the parser is a list of value object references.
pub fn array(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(ObjectFormat::Array)(input)?;
        let (input, array_length) = payload_count(encoded_value)(input)?;
        many_m_n(
            array_length,
            array_length,
            be_usize_n(object_reference_size)
        )(input)
    }
}

/// Returns a parser for a set with the specified-width object references.
///
/// Sets are recognized so the decoder can report them distinctly, but they
/// are never interpreted beyond their member references.
pub fn set(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(ObjectFormat::Set)(input)?;
        let (input, member_count) = payload_count(encoded_value)(input)?;
        many_m_n(
            member_count,
            member_count,
            be_usize_n(object_reference_size)
        )(input)
    }
}

/// Returns a parser for a dictionary with the specified-width key and value references.
///
/// All key references precede all value references on the wire; the parser
/// returns the two parallel runs as they appear, so the pair at position i
/// is `(keys[i], values[i])`.
pub fn dictionary(
    object_reference_size: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Dict> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(ObjectFormat::Dictionary)(input)?;
        let (input, entry_count) = payload_count(encoded_value)(input)?;

        map(
            tuple((
                many_m_n(entry_count, entry_count, be_usize_n(object_reference_size)),
                many_m_n(entry_count, entry_count, be_usize_n(object_reference_size)),
            )), |(
                keys,
                values
            )| Dict {
                keys,
                values,
            }
        )(input)
    }
}
