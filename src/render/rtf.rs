//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::io::{self, Write};

use crate::archive::Participants;
use crate::error::Result;
use crate::message::{Message, Text};
use crate::render::{display_name, RenderOptions, CLIENT_NAME};

/// RTF conversion sink.
///
/// The dialect is the small subset iChat-era TextEdit understands: one font,
/// a seven-entry color table (black for bodies, gray for timestamps, then
/// five participant colors cycled by table position), and `\uc0\u<n>`
/// escapes for anything outside ASCII.
#[derive(Debug)]
pub struct RtfRenderer<W: Write> {
    out: W,
    options: RenderOptions,
}

impl<W: Write> RtfRenderer<W> {

    /// Creates a renderer writing to the given sink.
    pub fn new(out: W, options: RenderOptions) -> RtfRenderer<W> {
        RtfRenderer { out, options }
    }

    /// Writes the fixed document preamble: font table, color table and
    /// margins.
    pub fn write_preamble(&mut self) -> io::Result<()> {
        self.out.write_all(b"{\\rtf1\\ansi\\ansicpg1252\\cocoartf1038\\cocoasubrtf360\n")?;
        self.out.write_all(b"{\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;}\n")?;
        self.out.write_all(b"{\\colortbl\\red0\\green0\\blue0;\\red128\\green128\\blue128;\\red0\\green0\\blue128;\\red0\\green128\\blue0;")?;
        self.out.write_all(b"\\red255\\green128\\blue0;\\red0\\green128\\blue128;\\red128\\green0\\blue0;}\n")?;
        self.out.write_all(b"\\margl1440\\margr1440\\vieww9000\\viewh8400\\viewkind0\n\n")
    }

    /// Writes the once-per-file header line in timestamp gray.
    pub fn write_chat_opened(&mut self, timestamp: &str) -> io::Result<()> {
        write!(self.out, "\\cf1 Chat window opened on {}:\\\n", timestamp)
    }

    /// Writes one message.
    pub fn write_message(&mut self, message: &Message, participants: &Participants) -> Result<()> {
        if message.hiccup {
            return Ok(());
        }

        if message.from_client {
            // Timestamp in gray, then the client name in bold.
            write!(self.out, "\\cf1 {} \\cf0 \\b1 {}\\b0 ", message.time, CLIENT_NAME)?;
        } else {
            write!(self.out, "\\cf1 {} ", message.time)?;
            self.write_sender_name(message, participants)?;
        }

        if message.file_transfer_count > 0 {
            if let Text::Ascii(names) = &message.text {
                if message.file_transfer_count == 1 {
                    self.out.write_all(b"\\cf0  sent file ")?;
                } else {
                    write!(self.out, "\\cf0  sent {} files: ", message.file_transfer_count)?;
                }
                self.out.write_all(names)?;
                self.out.write_all(b".\\i0 \n")?;
            }
        } else {
            self.out.write_all(b"\\cf0 : ")?;
            match &message.text {
                Text::Ascii(bytes) => {
                    for byte in bytes {
                        self.write_escaped(*byte)?;
                    }
                }
                Text::Utf16(units) => {
                    for unit in units {
                        // ASCII-range units are written directly, with the
                        // same escaping as an 8-bit body; everything else
                        // becomes decimal Unicode markup.
                        if *unit <= 127 {
                            self.write_escaped(*unit as u8)?;
                        } else {
                            write!(self.out, "\\uc0\\u{} ", unit)?;
                        }
                    }
                    self.out.write_all(b"\n")?;
                }
            }
        }

        self.out.write_all(b"\\\n")?;
        Ok(())
    }

    /// Writes the sender display name, colored by participant position and
    /// italicized for file transfers. Unknown senders stay black.
    fn write_sender_name(&mut self, message: &Message, participants: &Participants) -> Result<()> {
        let sender = message.sender_id.as_deref().unwrap_or_default();
        let (name, index) = display_name(sender, participants, &self.options);
        let color = match index {
            Some(index) => (index % 5) + 2,
            None => 0,
        };
        if message.file_transfer_count > 0 {
            self.out.write_all(b"\\i1 ")?;
        }
        write!(self.out, "\\cf{} ", color)?;
        self.out.write_all(name.as_bytes())?;
        Ok(())
    }

    /// Writes one body byte, escaping the characters that carry meaning in
    /// RTF markup along with raw newlines.
    fn write_escaped(&mut self, byte: u8) -> io::Result<()> {
        if byte == b'{' || byte == b'}' || byte == b'\\' || byte == 0x0A {
            self.out.write_all(b"\\")?;
        }
        self.out.write_all(&[byte])
    }

    /// Writes the closing brace and flushes the sink.
    pub fn finish(mut self) -> io::Result<()> {
        self.out.write_all(b"}")?;
        self.out.flush()
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn participants() -> Participants {
        Participants {
            names: vec![String::from("Alice A"), String::from("Bob B")],
            ids: vec![String::from("alice"), String::from("bob")],
        }
    }

    fn render(message: &Message) -> String {
        let mut output = Vec::new();
        let mut renderer = RtfRenderer::new(&mut output, RenderOptions::default());
        renderer.write_message(message, &participants()).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn text_message(sender: &str, text: &[u8]) -> Message {
        Message {
            hiccup: false,
            from_client: false,
            file_transfer_count: 0,
            sender_id: Some(String::from(sender)),
            time: String::from("12:34:56"),
            text: Text::Ascii(text.to_vec()),
        }
    }

    #[test]
    fn test_preamble() {
        let mut output = Vec::new();
        let mut renderer = RtfRenderer::new(&mut output, RenderOptions::default());
        renderer.write_preamble().unwrap();
        let preamble = String::from_utf8(output).unwrap();
        assert!(preamble.starts_with("{\\rtf1\\ansi\\ansicpg1252"));
        assert!(preamble.contains("\\fonttbl\\f0\\fswiss\\fcharset0 Helvetica;"));
        // Seven color table entries: black, gray, navy, green, orange, teal, maroon.
        assert!(preamble.contains(
            "{\\colortbl\\red0\\green0\\blue0;\\red128\\green128\\blue128;\\red0\\green0\\blue128;\
             \\red0\\green128\\blue0;\\red255\\green128\\blue0;\\red0\\green128\\blue128;\
             \\red128\\green0\\blue0;}"
        ));
        assert!(preamble.contains("\\margl1440\\margr1440"));
    }

    #[test]
    fn test_message_uses_participant_color() {
        // Second participant maps to color (1 % 5) + 2 = 3.
        let message = text_message("bob", b"hello");
        assert_eq!(render(&message), "\\cf1 12:34:56 \\cf3 bob\\cf0 : hello\\\n");
    }

    #[test]
    fn test_unknown_sender_is_black() {
        let message = text_message("mallory", b"hi");
        assert_eq!(render(&message), "\\cf1 12:34:56 \\cf0 mallory\\cf0 : hi\\\n");
    }

    #[test]
    fn test_client_message_bold() {
        let message = Message {
            from_client: true,
            sender_id: None,
            ..text_message("", b"done")
        };
        assert_eq!(render(&message), "\\cf1 12:34:56 \\cf0 \\b1 iChat\\b0 \\cf0 : done\\\n");
    }

    #[test]
    fn test_ascii_escaping() {
        let message = text_message("alice", b"a{b}c\\d\ne");
        assert_eq!(
            render(&message),
            "\\cf1 12:34:56 \\cf2 alice\\cf0 : a\\{b\\}c\\\\d\\\ne\\\n"
        );
    }

    #[test]
    fn test_unicode_markup() {
        let message = Message {
            text: Text::Utf16(vec![0x0048, 0x2019, 0x007B]),
            ..text_message("alice", b"")
        };
        assert_eq!(
            render(&message),
            "\\cf1 12:34:56 \\cf2 alice\\cf0 : H\\uc0\\u8217 \\{\n\\\n"
        );
    }

    #[test]
    fn test_file_transfer_is_italic() {
        let message = Message {
            file_transfer_count: 1,
            text: Text::Ascii(b"photo.jpg".to_vec()),
            ..text_message("bob", b"")
        };
        assert_eq!(
            render(&message),
            "\\cf1 12:34:56 \\i1 \\cf3 bob\\cf0  sent file photo.jpg.\\i0 \n\\\n"
        );
    }

    #[test]
    fn test_footer() {
        let mut output = Vec::new();
        let renderer = RtfRenderer::new(&mut output, RenderOptions::default());
        renderer.finish().unwrap();
        assert_eq!(output, b"}");
    }
}
