//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Conversation rendering.
//!
//! Two output dialects consume the same interpreted message stream: plain
//! text and a small RTF subset with a fixed color table. Both skip messages
//! marked as SMS hiccups and resolve sender display names the same way;
//! everything else is dialect-specific.

mod rtf;
mod txt;

pub use rtf::RtfRenderer;
pub use txt::TxtRenderer;

use std::io::{self, Write};
use std::str::FromStr;

use log::warn;

use crate::archive::Participants;
use crate::error::{Error, Result};
use crate::message::Message;

/// Name written when the message sender is the chat client itself.
pub const CLIENT_NAME: &str = "iChat";

/// The conversion target dialect.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum OutputFormat {
    /// Plain UTF-8 text, one line per message.
    Txt,
    /// RTF with a fixed preamble and per-participant colors.
    Rtf,
}

impl OutputFormat {
    /// The file suffix the converted log is written under.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Rtf => "rtf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(name: &str) -> Result<OutputFormat> {
        match name {
            "TXT" => Ok(OutputFormat::Txt),
            "RTF" => Ok(OutputFormat::Rtf),
            _ => Err(Error::Arg(String::from(
                "you need to supply 'TXT' or 'RTF' as a parameter for the --format argument",
            ))),
        }
    }
}

/// Presentation switches shared by both dialects.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct RenderOptions {
    /// Display participant names instead of account identifiers.
    pub use_real_names: bool,
    /// Strip `@domain` suffixes and service prefixes from displayed
    /// identifiers.
    pub trim_email_ids: bool,
}

/// Locates the sender in the participant table.
///
/// The identifier on a message can differ from its participant-table entry
/// in two known ways: `e:user@domain` may be stored as `e:user`, and
/// `+15551235555` as `15551235555`. The raw identifier is tried first, then
/// a canonicalized copy with the `@` suffix and leading `+` removed.
pub(crate) fn participant_index(sender_id: &str, participants: &Participants) -> Option<usize> {
    let mut canonical = sender_id;
    if let Some(at) = canonical.find('@') {
        canonical = &canonical[.. at];
    }
    if let Some(stripped) = canonical.strip_prefix('+') {
        canonical = stripped;
    }

    let index = participants
        .ids
        .iter()
        .position(|id| id == sender_id || id == canonical);
    if index.is_none() {
        warn!(
            "the sender ID on this message, {}, did not match a known participant ID",
            sender_id
        );
    }
    index
}

/// Resolves the name a message is displayed under, along with the sender's
/// participant index when known.
///
/// With `use_real_names` set and a non-empty display name on file, the name
/// is used; otherwise the account identifier is shown, trimmed of its `e:`
/// service prefix and `@domain` suffix when `trim_email_ids` is set.
pub(crate) fn display_name(
    sender_id: &str,
    participants: &Participants,
    options: &RenderOptions,
) -> (String, Option<usize>) {
    let index = participant_index(sender_id, participants);

    if options.use_real_names {
        if let Some(name) = index.and_then(|index| participants.names.get(index)) {
            if !name.is_empty() {
                return (name.clone(), index);
            }
        }
    }

    let mut id = sender_id;
    if options.trim_email_ids {
        if let Some(colon) = id.find(':') {
            id = &id[colon + 1 ..];
        }
        if let Some(at) = id.find('@') {
            id = &id[.. at];
        }
    }
    (id.to_string(), index)
}

/// A conversion sink for either dialect.
#[derive(Debug)]
pub enum Renderer<W: Write> {
    Txt(TxtRenderer<W>),
    Rtf(RtfRenderer<W>),
}

impl<W: Write> Renderer<W> {

    /// Creates a renderer for the requested dialect.
    pub fn new(format: OutputFormat, out: W, options: RenderOptions) -> Renderer<W> {
        match format {
            OutputFormat::Txt => Renderer::Txt(TxtRenderer::new(out, options)),
            OutputFormat::Rtf => Renderer::Rtf(RtfRenderer::new(out, options)),
        }
    }

    /// Emits whatever the dialect requires before the first message.
    pub fn begin(&mut self) -> io::Result<()> {
        match self {
            Renderer::Txt(_) => Ok(()),
            Renderer::Rtf(renderer) => renderer.write_preamble(),
        }
    }

    /// Emits the once-per-file header carrying the long-form timestamp of
    /// the first message.
    pub fn chat_opened(&mut self, timestamp: &str) -> io::Result<()> {
        match self {
            Renderer::Txt(renderer) => renderer.write_chat_opened(timestamp),
            Renderer::Rtf(renderer) => renderer.write_chat_opened(timestamp),
        }
    }

    /// Emits one message. Messages marked as hiccups are silently skipped.
    pub fn message(&mut self, message: &Message, participants: &Participants) -> Result<()> {
        match self {
            Renderer::Txt(renderer) => renderer.write_message(message, participants),
            Renderer::Rtf(renderer) => renderer.write_message(message, participants),
        }
    }

    /// Closes the dialect and flushes the sink.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Renderer::Txt(renderer) => renderer.finish(),
            Renderer::Rtf(renderer) => renderer.finish(),
        }
    }

}
