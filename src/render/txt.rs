//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::io::{self, Write};

use log::warn;

use crate::archive::Participants;
use crate::error::Result;
use crate::message::{Message, Text};
use crate::render::{display_name, RenderOptions, CLIENT_NAME};
use crate::unicode;

/// Plain-text conversion sink.
#[derive(Debug)]
pub struct TxtRenderer<W: Write> {
    out: W,
    options: RenderOptions,
}

impl<W: Write> TxtRenderer<W> {

    /// Creates a renderer writing to the given sink.
    pub fn new(out: W, options: RenderOptions) -> TxtRenderer<W> {
        TxtRenderer { out, options }
    }

    /// Writes the once-per-file header line.
    pub fn write_chat_opened(&mut self, timestamp: &str) -> io::Result<()> {
        write!(self.out, "Chat window opened on {}:\n", timestamp)
    }

    /// Writes one message as a single line.
    pub fn write_message(&mut self, message: &Message, participants: &Participants) -> Result<()> {
        if message.hiccup {
            return Ok(());
        }

        if message.from_client {
            write!(self.out, "{} {} ", message.time, CLIENT_NAME)?;
        } else {
            write!(self.out, "{} ", message.time)?;
            let sender = message.sender_id.as_deref().unwrap_or_default();
            let (name, _) = display_name(sender, participants, &self.options);
            self.out.write_all(name.as_bytes())?;
        }

        if message.file_transfer_count > 0 {
            match &message.text {
                Text::Ascii(names) => {
                    if message.file_transfer_count == 1 {
                        self.out.write_all(b" sent file ")?;
                    } else {
                        write!(self.out, " sent {} files: ", message.file_transfer_count)?;
                    }
                    self.out.write_all(names)?;
                    self.out.write_all(b".\n")?;
                }
                Text::Utf16(_) => {}
            }
            return Ok(());
        }

        self.out.write_all(b": ")?;
        match &message.text {
            Text::Ascii(bytes) => {
                self.out.write_all(bytes)?;
            }
            Text::Utf16(units) => {
                for unit in units {
                    match unicode::utf16_to_utf8(*unit) {
                        Ok(encoded) => self.out.write_all(encoded.as_bytes())?,
                        Err(error) => warn!("failed to convert a Unicode character: {}", error),
                    }
                }
            }
        }
        self.out.write_all(b"\n")?;
        Ok(())
    }

    /// Flushes and returns the sink.
    pub fn finish(mut self) -> io::Result<()> {
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

    fn render(message: &Message, options: RenderOptions) -> String {
        let mut output = Vec::new();
        let mut renderer = TxtRenderer::new(&mut output, options);
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
    fn test_plain_message_line() {
        let message = text_message("alice@x", b"hello");
        assert_eq!(render(&message, RenderOptions::default()), "12:34:56 alice@x: hello\n");
    }

    #[test]
    fn test_real_names() {
        let message = text_message("alice@x", b"hello");
        let options = RenderOptions { use_real_names: true, trim_email_ids: false };
        assert_eq!(render(&message, options), "12:34:56 Alice A: hello\n");
    }

    #[test]
    fn test_client_message_line() {
        let message = Message {
            from_client: true,
            sender_id: None,
            ..text_message("", b"alice@x is now online.")
        };
        assert_eq!(
            render(&message, RenderOptions::default()),
            "12:34:56 iChat : alice@x is now online.\n"
        );
    }

    #[test]
    fn test_single_file_transfer() {
        let message = Message {
            file_transfer_count: 1,
            text: Text::Ascii(b"photo.jpg".to_vec()),
            ..text_message("bob", b"")
        };
        assert_eq!(
            render(&message, RenderOptions::default()),
            "12:34:56 bob sent file photo.jpg.\n"
        );
    }

    #[test]
    fn test_multiple_file_transfer() {
        let message = Message {
            file_transfer_count: 3,
            text: Text::Ascii(b"a.png, b.png, c.png".to_vec()),
            ..text_message("bob", b"")
        };
        assert_eq!(
            render(&message, RenderOptions::default()),
            "12:34:56 bob sent 3 files: a.png, b.png, c.png.\n"
        );
    }

    #[test]
    fn test_unicode_body_is_transcoded() {
        let message = Message {
            text: Text::Utf16(vec![0x0048, 0x0069, 0x2019]),
            ..text_message("alice", b"")
        };
        assert_eq!(
            render(&message, RenderOptions::default()),
            "12:34:56 alice: Hi\u{2019}\n"
        );
    }

    #[test]
    fn test_hiccup_is_skipped() {
        let message = Message { hiccup: true, ..text_message("alice", b"gone") };
        assert_eq!(render(&message, RenderOptions::default()), "");
    }

    #[test]
    fn test_header() {
        let mut output = Vec::new();
        let mut renderer = TxtRenderer::new(&mut output, RenderOptions::default());
        renderer.write_chat_opened("2001-01-01 00:00:00").unwrap();
        assert_eq!(&output[..], &b"Chat window opened on 2001-01-01 00:00:00:\n"[..]);
    }
}
