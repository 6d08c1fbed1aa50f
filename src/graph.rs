//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Navigation helpers over the decoded object graph.
//!
//! The decoder hands out one object at a time; this layer supplies the
//! traversal idioms everything above it is built from: looking a value up in
//! a dictionary by its ASCII key, indexing into an array, and following a
//! UID edge. Dictionary iteration also attaches the presentation hints a key
//! confers on its paired value.

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::object::{Annotated, Dict, Hints, Object};

/// Read access to a bplist document as a graph of objects connected by
/// integer references.
#[derive(Debug)]
pub struct Graph<'a> {
    decoder: Decoder<'a>,
}

impl<'a> Graph<'a> {

    /// Wraps a loaded decoder.
    pub fn new(decoder: Decoder<'a>) -> Graph<'a> {
        Graph { decoder }
    }

    /// The underlying decoder.
    pub fn decoder(&self) -> &Decoder<'a> {
        &self.decoder
    }

    /// Materializes the object at the given index.
    pub fn get(&self, object: usize) -> Result<Object> {
        self.decoder.decode(object)
    }

    /// Scans the dictionary for the first ASCII-string key whose content is
    /// byte-wise equal to `name` and returns the paired value reference, or
    /// `None` when the key is absent. Keys of other formats are skipped.
    pub fn dict_lookup(&self, dict: &Dict, name: &str) -> Result<Option<usize>> {
        for (position, key_ref) in dict.keys.iter().enumerate() {
            let key = self.get(*key_ref)?;
            if let Some(bytes) = key.as_ascii_bytes() {
                if bytes == name.as_bytes() {
                    return Ok(Some(dict.values[position]));
                }
            }
        }
        Ok(None)
    }

    /// The reference held at the given array position, bounds-checked.
    pub fn array_at(&self, array: &[usize], element: usize) -> Option<usize> {
        array.get(element).copied()
    }

    /// Loads the object at `object`, requires it to be a UID, and returns
    /// its value as an object index, bounds-checked against the document.
    pub fn follow_uid(&self, object: usize) -> Result<usize> {
        let uid = self.get(object)?
            .as_uid()
            .ok_or(Error::MalformedArchive("UID"))?;
        let target = uid as usize;
        if target >= self.decoder.object_count() {
            return Err(Error::OutOfBounds);
        }
        Ok(target)
    }

    /// Decodes the key/value pair at the given dictionary position,
    /// propagating the presentation hints the key confers onto the value.
    pub fn dict_pair(&self, dict: &Dict, position: usize) -> Result<(Object, Annotated)> {
        let key = self.get(dict.keys[position])?;
        let hints = Hints::for_key(&key);
        let value = self.get(dict.values[position])?;
        Ok((key, Annotated { value, hints }))
    }

}
