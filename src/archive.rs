//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The iChat keyed archive.
//!
//! An `.ichat` file is a bplist whose root dictionary is an
//! NSKeyedArchiver-style archive: a `$version` marker, a `$top` entry point,
//! and a flat `$objects` array that every UID in the graph indexes into.
//! This module recognizes the archive, loads the participant table, and
//! locates the ordered list of chat messages.

use ascii::AsciiStr;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::object::{Dict, Object};
use crate::unicode;

/// The only known version of the iChat log format.
pub const ARCHIVE_VERSION: u64 = 100_000;

/// Position inside `$objects` of the dictionary whose `NS.objects` array
/// lists every message in chat order. A fixed position is a property of the
/// archive schema the iChat logger writes.
pub const MESSAGE_LIST_POSITION: u64 = 4;

/// The chat participant table: two parallel runs indexed identically.
/// `names[i]` is the display name for the account identifier `ids[i]`.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Participants {
    /// Display names, from the archive's `Participants` entry.
    pub names: Vec<String>,
    /// Account identifiers, from the archive's `PresentityIDs` entry.
    pub ids: Vec<String>,
}

/// A recognized and loaded iChat archive.
#[derive(Debug)]
pub struct ChatArchive<'a> {
    graph: &'a Graph<'a>,
    objects: Vec<usize>,
    participants: Participants,
    message_list: Vec<usize>,
}

impl<'a> ChatArchive<'a> {

    /// Determines whether the document is an iChat archive: the root must be
    /// a dictionary whose `$version` is the known format version and whose
    /// `$objects` is an array. Anything else is a generic bplist.
    pub fn identify(graph: &Graph) -> Result<bool> {
        let root = graph.get(graph.decoder().root_object())?;
        let root = match root.as_dictionary() {
            Some(dict) => dict.clone(),
            None => return Ok(false),
        };

        let version_ref = match graph.dict_lookup(&root, "$version")? {
            Some(reference) => reference,
            None => return Ok(false),
        };
        match graph.get(version_ref)?.as_u64() {
            Some(version) if version == ARCHIVE_VERSION => {}
            Some(version) => {
                warn!("this is an unknown version of iChat log: {}", version);
                return Ok(false);
            }
            None => return Ok(false),
        }

        let objects_ref = match graph.dict_lookup(&root, "$objects")? {
            Some(reference) => reference,
            None => return Ok(false),
        };
        Ok(graph.get(objects_ref)?.as_array().is_some())
    }

    /// Loads the archive: the `$objects` table, the participant table, and
    /// the ordered message list. All paths must resolve or the archive is
    /// rejected.
    pub fn open(graph: &'a Graph<'a>, trim_email_ids: bool) -> Result<ChatArchive<'a>> {
        let root = graph.get(graph.decoder().root_object())?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive("$top"))?;

        let objects_ref = graph.dict_lookup(&root, "$objects")?
            .ok_or(Error::MalformedArchive("$objects"))?;
        let objects = graph.get(objects_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedArchive("$objects"))?;

        let mut archive = ChatArchive {
            graph,
            objects,
            participants: Participants::default(),
            message_list: Vec::new(),
        };

        // The dictionary at the fixed schema position lists every message.
        let list_dict_ref = archive.element(MESSAGE_LIST_POSITION, "message list")?;
        let list_dict = graph.get(list_dict_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive("message list"))?;
        let list_ref = graph.dict_lookup(&list_dict, "NS.objects")?
            .ok_or(Error::MalformedArchive("NS.objects"))?;
        archive.message_list = graph.get(list_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedArchive("NS.objects"))?;

        // Walk $top → metadata to the dictionary carrying the participant
        // table, keyed through parallel NS.keys/NS.objects arrays.
        let top_ref = graph.dict_lookup(&root, "$top")?
            .ok_or(Error::MalformedArchive("$top"))?;
        let top = graph.get(top_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive("$top"))?;
        let metadata_uid = graph.dict_lookup(&top, "metadata")?
            .ok_or(Error::MalformedArchive("metadata"))?;
        let metadata_ref = archive.follow(metadata_uid, "metadata")?;
        let metadata = graph.get(metadata_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive("metadata"))?;

        let keys_ref = graph.dict_lookup(&metadata, "NS.keys")?
            .ok_or(Error::MalformedArchive("NS.keys"))?;
        let keys = graph.get(keys_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedArchive("NS.keys"))?;

        let mut participants_position = None;
        let mut presentity_position = None;
        for (position, key_ref) in keys.iter().enumerate() {
            let name_ref = archive.follow(*key_ref, "NS.keys")?;
            let name = graph.get(name_ref)?;
            match name.as_ascii_bytes() {
                Some(b"Participants") => participants_position = Some(position),
                Some(b"PresentityIDs") => presentity_position = Some(position),
                Some(_) => {}
                None => return Err(Error::MalformedArchive("NS.keys")),
            }
        }
        let participants_position = participants_position
            .ok_or(Error::MalformedArchive("Participants"))?;
        let presentity_position = presentity_position
            .ok_or(Error::MalformedArchive("PresentityIDs"))?;

        let values_ref = graph.dict_lookup(&metadata, "NS.objects")?
            .ok_or(Error::MalformedArchive("NS.objects"))?;
        let values = graph.get(values_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedArchive("NS.objects"))?;

        let names = archive.account_list(&values, participants_position, false, "Participants")?;
        let ids = archive.account_list(&values, presentity_position, trim_email_ids, "PresentityIDs")?;
        debug!(
            "loaded iChat archive: {} participants, {} messages",
            ids.len(),
            archive.message_list.len()
        );
        archive.participants = Participants { names, ids };

        Ok(archive)
    }

    /// The graph the archive was loaded from.
    pub fn graph(&self) -> &Graph<'a> {
        self.graph
    }

    /// The references held by the `$objects` array.
    pub fn objects(&self) -> &[usize] {
        &self.objects
    }

    /// The participant table.
    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    /// The number of messages in the chat.
    pub fn message_count(&self) -> usize {
        self.message_list.len()
    }

    /// The object reference held at the given position of `$objects`.
    pub fn element(&self, position: u64, path: &'static str) -> Result<usize> {
        self.graph
            .array_at(&self.objects, position as usize)
            .ok_or(Error::MalformedArchive(path))
    }

    /// Loads the object at `object`, requires it to be a UID, and resolves
    /// its value through `$objects` to the referenced object.
    pub fn follow(&self, object: usize, path: &'static str) -> Result<usize> {
        let uid = self.graph.get(object)?
            .as_uid()
            .ok_or(Error::MalformedArchive(path))?;
        self.element(uid, path)
    }

    /// The dictionary for the message at the given chat position. Each
    /// message-list element is a UID whose `$objects` target is the message
    /// dictionary.
    pub fn message_dict(&self, message: usize) -> Result<Dict> {
        let uid_ref = self.graph
            .array_at(&self.message_list, message)
            .ok_or(Error::MalformedArchive("message list"))?;
        let target = self.follow(uid_ref, "message list")?;
        self.graph.get(target)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive("message list"))
    }

    /// Resolves an account-identifier object to a UTF-8 string.
    ///
    /// The archive stores these in one of three shapes: a plain ASCII
    /// string, a UTF-16 string, or a dictionary carrying the string under
    /// `NS.string`. A UTF-16 source keeps only single-byte UTF-8 sequences,
    /// which strips decorative code points such as directional overrides; a
    /// fully-stripped result becomes `<Unicode>` and an empty ASCII source
    /// becomes `<empty>`.
    pub fn resolve_account_string(&self, object: usize, path: &'static str) -> Result<String> {
        match self.graph.get(object)? {
            Object::AsciiString(bytes) =>
                ascii_account(&bytes, path),
            Object::Utf16String(units) => {
                let mut output = String::new();
                for unit in units {
                    if let Ok(encoded) = unicode::utf16_to_utf8(unit) {
                        if let [byte] = encoded.as_bytes() {
                            output.push(char::from(*byte));
                        }
                    }
                }
                if output.is_empty() {
                    output.push_str("<Unicode>");
                }
                Ok(output)
            }
            Object::Dictionary(dict) => {
                let string_ref = self.graph.dict_lookup(&dict, "NS.string")?
                    .ok_or(Error::MalformedArchive(path))?;
                match self.graph.get(string_ref)? {
                    Object::AsciiString(bytes) => ascii_account(&bytes, path),
                    _ => Err(Error::MalformedArchive(path)),
                }
            }
            Object::Set(_) => Err(Error::UnsupportedSet),
            _ => Err(Error::MalformedArchive(path)),
        }
    }

    /// Loads one of the two participant runs: the holder dictionary at the
    /// given metadata position, then one account string per element of its
    /// `NS.objects` array.
    fn account_list(
        &self,
        values: &[usize],
        position: usize,
        trim_email_ids: bool,
        path: &'static str,
    ) -> Result<Vec<String>> {
        let holder_uid = self.graph
            .array_at(values, position)
            .ok_or(Error::MalformedArchive(path))?;
        let holder_ref = self.follow(holder_uid, path)?;
        let holder = self.graph.get(holder_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedArchive(path))?;
        let list_ref = self.graph.dict_lookup(&holder, "NS.objects")?
            .ok_or(Error::MalformedArchive(path))?;
        let list = self.graph.get(list_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedArchive(path))?;

        let mut entries = Vec::with_capacity(list.len());
        for element_ref in list {
            let target = self.follow(element_ref, path)?;
            let mut entry = self.resolve_account_string(target, path)?;
            if trim_email_ids {
                if let Some(at) = entry.find('@') {
                    entry.truncate(at);
                }
            }
            entries.push(entry);
        }
        Ok(entries)
    }

}

/// An ASCII account entry: empty content is replaced by a placeholder, and
/// the bytes must be genuine ASCII to become a string.
fn ascii_account(bytes: &[u8], path: &'static str) -> Result<String> {
    if bytes.is_empty() {
        return Ok(String::from("<empty>"));
    }
    AsciiStr::from_ascii(bytes)
        .map(|content| content.as_str().to_string())
        .map_err(|_| Error::MalformedArchive(path))
}
