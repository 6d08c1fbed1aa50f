//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Chat message interpretation.
//!
//! Each element of the archive's message list resolves to a dictionary
//! describing one event: a chat line, a client status notification, or a
//! file transfer. This module walks that dictionary into a flat `Message`
//! ready for rendering. The order of the checks matters and follows the
//! schema: status classification first, then sender, timestamp, and finally
//! the text-or-transfer split.

use ascii::AsciiStr;
use log::warn;

use crate::archive::ChatArchive;
use crate::date;
use crate::error::{Error, Result};
use crate::object::{Dict, Object};

/// Message body: either the verbatim bytes of an ASCII string or the raw
/// big-endian code units of a UTF-16 string. For a file transfer it holds
/// the transferred file names joined with `", "`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Text {
    /// One byte per character, carried verbatim.
    Ascii(Vec<u8>),
    /// Big-endian UTF-16 code units, transcoded at render time.
    Utf16(Vec<u16>),
}

impl Text {
    /// Whether the body carries 16-bit code units.
    pub fn is_unicode(&self) -> bool {
        matches!(self, Text::Utf16(_))
    }
}

/// One interpreted chat event.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Message {
    /// The message is a known corruption shape relayed over SMS; renderers
    /// skip it silently.
    pub hiccup: bool,
    /// The message comes from the chat client itself, not a participant.
    pub from_client: bool,
    /// Zero for a text message, otherwise the number of files transferred.
    pub file_transfer_count: u64,
    /// Account identifier of the sender, absent for client messages.
    pub sender_id: Option<String>,
    /// Timestamp in short form, `HH:MM:SS`.
    pub time: String,
    /// The message body or the transferred file names.
    pub text: Text,
}

/// Interprets message dictionaries against a loaded archive.
#[derive(Debug)]
pub struct Interpreter<'a> {
    archive: &'a ChatArchive<'a>,
    local_offset_hours: i32,
}

/// Walker failures below a message dictionary concern that message, not the
/// archive framing.
fn as_message_error(error: Error) -> Error {
    match error {
        Error::MalformedArchive(path) => Error::MalformedMessage(path),
        other => other,
    }
}

impl<'a> Interpreter<'a> {

    /// Creates an interpreter applying the given fixed hour offset to
    /// timestamps.
    pub fn new(archive: &'a ChatArchive<'a>, local_offset_hours: i32) -> Interpreter<'a> {
        Interpreter { archive, local_offset_hours }
    }

    /// Interprets the message at the given chat position.
    pub fn interpret(&self, message: usize) -> Result<Message> {
        let dict = self.archive.message_dict(message)?;
        self.interpret_dict(&dict).map_err(as_message_error)
    }

    /// The long-form timestamp of the message at the given chat position,
    /// used once per file as the conversion header.
    pub fn chat_opened(&self, message: usize) -> Result<String> {
        let dict = self.archive.message_dict(message)?;
        let seconds = self.timestamp_seconds(&dict).map_err(as_message_error)?;
        Ok(date::format_long(seconds, self.local_offset_hours))
    }

    fn graph(&self) -> &'a crate::graph::Graph<'a> {
        self.archive.graph()
    }

    fn interpret_dict(&self, dict: &Dict) -> Result<Message> {
        let graph = self.graph();

        // A StatusChatItemStatusType of 1 (came online) or 2 (went offline)
        // marks a client status message. The key may also be present with
        // value 0 on an ordinary chat line, and is usually absent.
        let mut status_client = false;
        if let Some(status_ref) = graph.dict_lookup(dict, "StatusChatItemStatusType")? {
            let status = graph.get(status_ref)?
                .as_u64()
                .ok_or(Error::MalformedMessage("StatusChatItemStatusType"))?;
            if status == 1 || status == 2 {
                status_client = true;
            }
        }

        let mut from_client = status_client;
        let mut sender_id = None;
        let mut subject = None;

        if status_client {
            // The status notification concerns a subject participant whose
            // identifier substitutes into the message text below.
            let subject_uid = graph.dict_lookup(dict, "Subject")?
                .ok_or(Error::MalformedMessage("Subject"))?;
            let subject_ref = self.archive.follow(subject_uid, "Subject")?;
            subject = Some(self.account_through_id(subject_ref, "Subject.ID")?);
        } else {
            let sender_ref = graph.dict_lookup(dict, "Sender")?
                .ok_or(Error::MalformedMessage("Sender"))?;
            let sender_uid = graph.get(sender_ref)?
                .as_uid()
                .ok_or(Error::MalformedMessage("Sender"))?;
            // UID 0 is the archive's $null; a message with a null sender is
            // the client talking even without a status marker.
            if sender_uid == 0 {
                from_client = true;
            } else {
                let target = self.archive.element(sender_uid, "Sender")?;
                sender_id = Some(self.account_through_id(target, "Sender.ID")?);
            }
        }

        let time = date::format_short(self.timestamp_seconds(dict)?, self.local_offset_hours);

        // A message that retains its OriginalMessage entry carries text;
        // without one it describes a file transfer.
        if graph.dict_lookup(dict, "OriginalMessage")?.is_some() {
            let text = self.message_text(dict, status_client, subject.as_deref())?;
            Ok(Message { hiccup: false, from_client, file_transfer_count: 0, sender_id, time, text })
        } else {
            match self.transferred_files(dict)? {
                Some((text, file_transfer_count)) =>
                    Ok(Message { hiccup: false, from_client, file_transfer_count, sender_id, time, text }),
                None => {
                    warn!("SMS hiccup detected; message skipped");
                    Ok(Message {
                        hiccup: true,
                        from_client,
                        file_transfer_count: 0,
                        sender_id,
                        time,
                        text: Text::Ascii(Vec::new()),
                    })
                }
            }
        }
    }

    /// Resolves a sender or subject dictionary through its `ID` entry to the
    /// account-identifier string.
    fn account_through_id(&self, object: usize, path: &'static str) -> Result<String> {
        let graph = self.graph();
        let dict = graph.get(object)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedMessage(path))?;
        let id_uid = graph.dict_lookup(&dict, "ID")?
            .ok_or(Error::MalformedMessage(path))?;
        let target = self.archive.follow(id_uid, path)?;
        self.archive.resolve_account_string(target, path)
    }

    /// The raw NSDate seconds of the message's `Time` entry.
    fn timestamp_seconds(&self, dict: &Dict) -> Result<f64> {
        let graph = self.graph();
        let time_uid = graph.dict_lookup(dict, "Time")?
            .ok_or(Error::MalformedMessage("Time"))?;
        let time_ref = self.archive.follow(time_uid, "Time")?;
        let time_dict = graph.get(time_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedMessage("Time"))?;
        let seconds_ref = graph.dict_lookup(&time_dict, "NS.time")?
            .ok_or(Error::MalformedMessage("Time.NS.time"))?;
        match graph.get(seconds_ref)? {
            Object::Real(seconds) => Ok(seconds.into_inner()),
            _ => Err(Error::MalformedMessage("Time.NS.time")),
        }
    }

    /// The `MessageText` attributed-string dictionary.
    fn message_text_dict(&self, dict: &Dict) -> Result<Dict> {
        let graph = self.graph();
        let text_uid = graph.dict_lookup(dict, "MessageText")?
            .ok_or(Error::MalformedMessage("MessageText"))?;
        let text_ref = self.archive.follow(text_uid, "MessageText")?;
        graph.get(text_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedMessage("MessageText"))
    }

    /// The body of a text message: `MessageText` → `NSString` → `NS.string`.
    ///
    /// An ASCII body is copied verbatim, except that the client's canned
    /// `%@ is now online./offline.` notifications substitute the subject
    /// identifier. A UTF-16 body keeps its raw code units.
    fn message_text(&self, dict: &Dict, status_client: bool, subject: Option<&str>) -> Result<Text> {
        let graph = self.graph();
        let attributed = self.message_text_dict(dict)?;
        let string_uid = graph.dict_lookup(&attributed, "NSString")?
            .ok_or(Error::MalformedMessage("MessageText.NSString"))?;
        let string_ref = self.archive.follow(string_uid, "MessageText.NSString")?;
        let string_dict = graph.get(string_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedMessage("MessageText.NSString"))?;
        let content_ref = graph.dict_lookup(&string_dict, "NS.string")?
            .ok_or(Error::MalformedMessage("NSString.NS.string"))?;

        match graph.get(content_ref)? {
            Object::AsciiString(bytes) => {
                if status_client {
                    if let Some(subject) = subject {
                        for pattern in &["%@ is now online.", "%@ is now offline."] {
                            if bytes == pattern.as_bytes() {
                                let substituted = pattern.replacen("%@", subject, 1);
                                return Ok(Text::Ascii(substituted.into_bytes()));
                            }
                        }
                    }
                }
                Ok(Text::Ascii(bytes))
            }
            Object::Utf16String(units) => Ok(Text::Utf16(units)),
            _ => Err(Error::MalformedMessage("NSString.NS.string")),
        }
    }

    /// The file names carried by a transfer message, or `None` for the SMS
    /// hiccup shape where the expected `NSAttributes` entry is missing.
    fn transferred_files(&self, dict: &Dict) -> Result<Option<(Text, u64)>> {
        let graph = self.graph();
        let attributed = self.message_text_dict(dict)?;

        // NSAttributeInfo is present exactly when several files share the
        // message; their attribute dictionaries then live in an array.
        let multiple = graph.dict_lookup(&attributed, "NSAttributeInfo")?.is_some();

        let attributes_uid = match graph.dict_lookup(&attributed, "NSAttributes")? {
            Some(reference) => reference,
            None => return Ok(None),
        };
        let attributes_ref = self.archive.follow(attributes_uid, "NSAttributes")?;
        let attributes = graph.get(attributes_ref)?
            .as_dictionary().cloned()
            .ok_or(Error::MalformedMessage("NSAttributes"))?;

        let mut names = Vec::new();
        if multiple {
            let list_ref = graph.dict_lookup(&attributes, "NS.objects")?
                .ok_or(Error::MalformedMessage("NSAttributes.NS.objects"))?;
            let list = graph.get(list_ref)?
                .as_array().map(<[usize]>::to_vec)
                .ok_or(Error::MalformedMessage("NSAttributes.NS.objects"))?;
            for element_ref in list {
                let target = self.archive.follow(element_ref, "NSAttributes.NS.objects")?;
                let file_dict = graph.get(target)?
                    .as_dictionary().cloned()
                    .ok_or(Error::MalformedMessage("NSAttributes.NS.objects"))?;
                names.push(self.file_name(&file_dict)?);
            }
        } else {
            names.push(self.file_name(&attributes)?);
        }

        let count = names.len() as u64;
        Ok(Some((Text::Ascii(names.join(", ").into_bytes()), count)))
    }

    /// The transferred file name inside a per-file attributes dictionary,
    /// found by locating `__kIMFilenameAttributeName` in `NS.keys` and
    /// reading the parallel `NS.objects` entry.
    fn file_name(&self, attributes: &Dict) -> Result<String> {
        let graph = self.graph();
        let keys_ref = graph.dict_lookup(attributes, "NS.keys")?
            .ok_or(Error::MalformedMessage("NS.keys"))?;
        let keys = graph.get(keys_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedMessage("NS.keys"))?;
        let values_ref = graph.dict_lookup(attributes, "NS.objects")?
            .ok_or(Error::MalformedMessage("NS.objects"))?;
        let values = graph.get(values_ref)?
            .as_array().map(<[usize]>::to_vec)
            .ok_or(Error::MalformedMessage("NS.objects"))?;

        let mut name_position = None;
        for (position, key_ref) in keys.iter().enumerate() {
            let target = self.archive.follow(*key_ref, "NS.keys")?;
            let key = graph.get(target)?;
            match key.as_ascii_bytes() {
                Some(b"__kIMFilenameAttributeName") => name_position = Some(position),
                Some(_) => {}
                None => return Err(Error::MalformedMessage("NS.keys")),
            }
        }
        let name_position = name_position
            .ok_or(Error::MalformedMessage("__kIMFilenameAttributeName"))?;

        let name_uid = *values.get(name_position)
            .ok_or(Error::MalformedMessage("NS.objects"))?;
        let target = self.archive.follow(name_uid, "__kIMFilenameAttributeName")?;
        match graph.get(target)? {
            Object::AsciiString(bytes) =>
                AsciiStr::from_ascii(&bytes)
                    .map(|name| name.as_str().to_string())
                    .map_err(|_| Error::MalformedMessage("__kIMFilenameAttributeName")),
            _ => Err(Error::MalformedMessage("__kIMFilenameAttributeName")),
        }
    }

}
