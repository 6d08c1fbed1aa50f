//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Chat-log reading and conversion error.
#[derive(Debug)]
pub enum Error {
    /// An underlying file operation failed.
    Io(io::Error),
    /// The input file exceeds the size ceiling applied before loading.
    FileTooLarge { size: u64, limit: u64 },
    /// The bplist magic number is missing or the input is too short to carry one.
    NotBplist,
    /// The version number in the header is not one of the versions supported by this library.
    UnsupportedVersion,
    /// The trailer with the metadata necessary to interpret the offset table and object table is missing or invalid.
    MalformedTrailer,
    /// An object reference, offset, or payload lies outside the input.
    OutOfBounds,
    /// Encountered a marker byte for an object format not supported by this library.
    UnknownTag(u8),
    /// Encountered an integer or real of a width this library cannot read.
    UnsupportedWidth(usize),
    /// A declared unit count multiplied by its unit size exceeds the input length.
    CountOverflow,
    /// The keyed archive is missing a required entry; the payload names the path that failed.
    MalformedArchive(&'static str),
    /// A chat message has an unexpected shape; the payload names the path that failed.
    MalformedMessage(&'static str),
    /// The 'set' object format is recognized but cannot be interpreted.
    UnsupportedSet,
    /// A UTF-16 code unit falls in the surrogate range and cannot stand alone.
    ForbiddenRange(u16),
    /// The input path carries no dot-suffix to derive an output name from.
    NoOutputExtension,
    /// The combination of command-line arguments is invalid.
    Arg(String),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) =>
                write!(formatter, "{}", err),
            Error::FileTooLarge { size, limit } =>
                write!(formatter, "file is {} bytes, over the limit of {} bytes", size, limit),
            Error::NotBplist =>
                formatter.write_str("this is not a bplist file"),
            Error::UnsupportedVersion =>
                formatter.write_str("document is not a version (0,0) bplist"),
            Error::MalformedTrailer =>
                formatter.write_str("missing or invalid bplist trailer"),
            Error::OutOfBounds =>
                formatter.write_str("object data extends past the end of the input"),
            Error::UnknownTag(byte) =>
                write!(formatter, "unable to identify the object with type code byte 0x{:02x}", byte),
            Error::UnsupportedWidth(width) =>
                write!(formatter, "not able to read a {} byte value", width),
            Error::CountOverflow =>
                formatter.write_str("declared object size exceeds the input length"),
            Error::MalformedArchive(path) =>
                write!(formatter, "not a readable iChat archive: no usable '{}' entry", path),
            Error::MalformedMessage(path) =>
                write!(formatter, "malformed chat message: unexpected shape at '{}'", path),
            Error::UnsupportedSet =>
                formatter.write_str("the 'set' object type is not supported"),
            Error::ForbiddenRange(unit) =>
                write!(formatter, "UTF-16 code unit 0x{:04x} falls in the forbidden surrogate range", unit),
            Error::NoOutputExtension =>
                formatter.write_str("could not create output file name: input path has no dot-suffix"),
            Error::Arg(message) =>
                formatter.write_str(message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
