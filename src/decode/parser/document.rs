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
    bytes::complete::tag,
    combinator::map,
    multi::many_m_n,
    number::complete::be_u8,
    sequence::tuple,
};

use crate::decode::parser::utils::be_usize_n;
use crate::document::{
    Header,
    OffsetTable,
    Trailer,
    HEADER_MAGIC_NUMBER,
};

/// Parses a fixed-sized 8-byte header object from the input slice.
pub fn header(input: &[u8]) -> IResult<&[u8], Header> {
    map(
        tuple((
            tag(HEADER_MAGIC_NUMBER),
            be_u8,
            be_u8,
        )), |(
            _,
            version_major,
            version_minor,
        )| Header {
            version: (version_major, version_minor)
        }
    )(input)
}

/// Returns a parser for an offset table with the specified number of entries,
/// each of the specified size. Offset table entries must be between
/// 1 and 8 bytes long each, inclusive.
pub fn offset_table(
    entries: usize,
    entry_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], OffsetTable> {
    move |input: &[u8]| {
        many_m_n(
            entries,
            entries,
            be_usize_n(entry_size)
        )(input)
    }
}

/// Parses a fixed-sized 26-byte trailer object from the input array.
///
/// The five unused pad bytes and sort version of the full 32-byte
/// CoreFoundation trailer precede this slice and are not interpreted.
pub fn trailer(input: &[u8]) -> IResult<&[u8], Trailer> {
    map(
        tuple((
            be_usize_n(1),
            be_usize_n(1),
            be_usize_n(8),
            be_usize_n(8),
            be_usize_n(8),
        )), |(
            offset_table_entry_size,
            object_reference_size,
            number_of_objects,
            root_object,
            offset_table_offset,
        )| Trailer {
            offset_table_entry_size,
            object_reference_size,
            number_of_objects,
            root_object,
            offset_table_offset,
        }
    )(input)
}
