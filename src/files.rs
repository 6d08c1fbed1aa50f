//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Input loading and output naming.
//!
//! The whole input is read into one immutable buffer; everything downstream
//! borrows from it by offset. A fixed size ceiling caps the buffer and every
//! allocation derived from it.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::render::OutputFormat;

/// The input size ceiling: chat logs are small, and refusing anything larger
/// caps all derived allocations.
pub const FILE_SIZE_LIMIT: u64 = 5 * 1024 * 1024;

/// Reads the file to browse or convert into memory, enforcing the ceiling.
pub fn load_input(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)?;
    if metadata.len() > FILE_SIZE_LIMIT {
        return Err(Error::FileTooLarge { size: metadata.len(), limit: FILE_SIZE_LIMIT });
    }
    let contents = fs::read(path)?;
    debug!("loaded {} bytes from {}", contents.len(), path.display());
    Ok(contents)
}

/// Derives the output path: the input path with its final dot-suffix
/// replaced by the format's. An input without a dot-suffix is an error.
pub fn output_path(input: &Path, format: OutputFormat) -> Result<PathBuf> {
    match input.extension() {
        Some(_) => Ok(input.with_extension(format.extension())),
        None => Err(Error::NoOutputExtension),
    }
}

/// Result of attempting to create the output file.
#[derive(Debug)]
pub enum CreateOutcome {
    /// The file was created (or truncated) and is ready for writing.
    Created(File),
    /// A file already exists at the path and overwriting was not requested.
    AlreadyExists,
}

/// Creates the output file. Without `overwrite`, a pre-existing file is
/// reported rather than touched.
pub fn create_output(path: &Path, overwrite: bool) -> Result<CreateOutcome> {
    if overwrite {
        return Ok(CreateOutcome::Created(File::create(path)?));
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(CreateOutcome::Created(file)),
        Err(error) if error.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_suffix() {
        assert_eq!(
            output_path(Path::new("/logs/chat.ichat"), OutputFormat::Txt).unwrap(),
            PathBuf::from("/logs/chat.txt")
        );
        assert_eq!(
            output_path(Path::new("/logs/chat.ichat"), OutputFormat::Rtf).unwrap(),
            PathBuf::from("/logs/chat.rtf")
        );
    }

    #[test]
    fn test_output_path_replaces_only_final_suffix() {
        assert_eq!(
            output_path(Path::new("archive.2004.ichat"), OutputFormat::Txt).unwrap(),
            PathBuf::from("archive.2004.txt")
        );
    }

    #[test]
    fn test_output_path_requires_suffix() {
        assert!(matches!(
            output_path(Path::new("/logs/chat"), OutputFormat::Txt),
            Err(Error::NoOutputExtension)
        ));
    }
}
