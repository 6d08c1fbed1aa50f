//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Raw-object and message display for browsing.
//!
//! Browsing shows objects the way they sit in the file: one line per
//! object, prefixed with its zero-padded index, containers either stubbed
//! as `(UID n)` references or chased recursively when link-following is on.
//! A notched ruler marks the nesting depth of long printouts.

use std::io::{self, Write};

use crate::date;
use crate::error::Result;
use crate::graph::Graph;
use crate::message::{Message, Text};
use crate::object::{Hints, Integer, Object};
use crate::render::CLIENT_NAME;
use crate::unicode;

const INDENT_RULER: &str = "  |  |  |  |  |  |  |  |  |  |";

/// Prints decoded objects for interactive browsing.
#[derive(Debug)]
pub struct BrowsePrinter<'a, W: Write> {
    graph: &'a Graph<'a>,
    out: W,
    follow_links: bool,
    local_offset_hours: i32,
    pad_width: usize,
    indent: usize,
}

impl<'a, W: Write> BrowsePrinter<'a, W> {

    /// Creates a printer over the given graph. `follow_links` chases UID
    /// references inside arrays and dictionaries instead of stubbing them.
    pub fn new(
        graph: &'a Graph<'a>,
        out: W,
        follow_links: bool,
        local_offset_hours: i32,
    ) -> BrowsePrinter<'a, W> {
        let pad_width = graph.decoder().object_count().to_string().len();
        BrowsePrinter {
            graph,
            out,
            follow_links,
            local_offset_hours,
            pad_width,
            indent: 0,
        }
    }

    /// Prints the object at the given index.
    pub fn print(&mut self, object: usize) -> Result<()> {
        let value = self.graph.get(object)?;
        self.print_value(object, &value, Hints::default())
    }

    fn ruler(&mut self) -> io::Result<()> {
        let depth = self.indent.min(INDENT_RULER.len());
        self.out.write_all(INDENT_RULER[.. depth].as_bytes())
    }

    fn print_value(&mut self, object: usize, value: &Object, hints: Hints) -> Result<()> {
        write!(self.out, "{:0width$}:", object, width = self.pad_width)?;
        self.ruler()?;

        match value {
            Object::Null =>
                writeln!(self.out, "(null)")?,
            Object::Boolean(value) =>
                writeln!(self.out, "{}", value)?,
            Object::Fill =>
                writeln!(self.out, "(filler)")?,
            Object::Integer(integer) =>
                self.print_integer(integer, hints)?,
            Object::Real(value) => {
                // An NS.time value is an NSDate hiding in a plain real.
                if hints.ns_time {
                    writeln!(self.out, "{}", date::format_long(value.into_inner(), self.local_offset_hours))?;
                } else {
                    writeln!(self.out, "{:.6}", value.into_inner())?;
                }
            }
            Object::Date(value) =>
                writeln!(self.out, "{}", date::format_long(value.into_inner(), self.local_offset_hours))?,
            Object::Data(bytes) =>
                self.print_data(bytes)?,
            Object::AsciiString(bytes) =>
                writeln!(self.out, "'{}'", String::from_utf8_lossy(bytes))?,
            Object::Utf16String(units) =>
                writeln!(self.out, "{}", wide_string_or_placeholder(units))?,
            Object::Uid(value) =>
                writeln!(self.out, "UID {}", value)?,
            Object::Array(elements) =>
                self.print_array(elements)?,
            Object::Set(members) =>
                writeln!(
                    self.out,
                    "Warning: The '{}' type is not supported, but this is a {}-element set.",
                    value.type_name(),
                    members.len()
                )?,
            Object::Dictionary(dict) =>
                self.print_dict(dict)?,
        }
        Ok(())
    }

    fn print_integer(&mut self, integer: &Integer, hints: Hints) -> io::Result<()> {
        match integer {
            Integer::Narrow { .. } => {
                // A BaseWritingDirection of -1 means "natural" and is only
                // readable as a signed quantity.
                if hints.base_writing_direction {
                    writeln!(self.out, "{}", integer.as_i64().unwrap_or_default())
                } else {
                    writeln!(self.out, "{}", integer.as_u64().unwrap_or_default())
                }
            }
            Integer::Wide(bytes) => {
                write!(self.out, "0x")?;
                for byte in bytes {
                    write!(self.out, "{:02x}", byte)?;
                }
                writeln!(self.out)
            }
        }
    }

    fn print_data(&mut self, bytes: &[u8]) -> io::Result<()> {
        writeln!(
            self.out,
            "Printing {} byte{} of raw data:",
            bytes.len(),
            if bytes.len() == 1 { "" } else { "s" }
        )?;
        writeln!(self.out, "hex  dec  char")?;
        for byte in bytes {
            let shown = if byte.is_ascii_graphic() || *byte == b' ' {
                char::from(*byte)
            } else {
                '.'
            };
            writeln!(self.out, "0x{:02x} {:03}  '{}'", byte, byte, shown)?;
        }
        Ok(())
    }

    fn print_array(&mut self, elements: &[usize]) -> Result<()> {
        writeln!(
            self.out,
            "The array has {} element{}:",
            elements.len(),
            if elements.len() == 1 { "" } else { "s" }
        )?;
        self.indent += 1;
        for element in elements {
            if self.follow_links {
                self.print(*element)?;
            } else {
                self.ruler()?;
                writeln!(self.out, "(UID {})", element)?;
            }
        }
        self.indent -= 1;
        Ok(())
    }

    fn print_dict(&mut self, dict: &crate::object::Dict) -> Result<()> {
        writeln!(
            self.out,
            "The dict has {} key/value pair{}.",
            dict.len(),
            if dict.len() == 1 { "" } else { "s" }
        )?;
        self.indent += 1;
        for position in 0 .. dict.len() {
            if self.follow_links {
                let (key, annotated) = self.graph.dict_pair(dict, position)?;
                self.print_value(dict.keys[position], &key, Hints::default())?;
                self.print_value(dict.values[position], &annotated.value, annotated.hints)?;
            } else {
                self.ruler()?;
                writeln!(self.out, "(UID {}, {})", dict.keys[position], dict.values[position])?;
            }
        }
        self.indent -= 1;
        Ok(())
    }

}

/// Prints one interpreted message for smart browsing.
pub fn print_message<W: Write>(out: &mut W, message: &Message) -> io::Result<()> {
    if message.hiccup {
        return writeln!(out, "Message was deemed to be SMS hiccup and was skipped.");
    }

    let sender = message.sender_id.as_deref().unwrap_or("<unknown>");

    if message.file_transfer_count > 0 {
        let names = match &message.text {
            Text::Ascii(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Text::Utf16(units) => unicode::decode_lossy(units),
        };
        if message.file_transfer_count == 1 {
            return writeln!(out, "{} {} sent file {}.", message.time, sender, names);
        }
        return writeln!(
            out,
            "{} {} sent {} files: {}.",
            message.time, sender, message.file_transfer_count, names
        );
    }

    if message.from_client {
        let body = message_body(&message.text);
        return writeln!(out, "{} {}:\n   {}", message.time, CLIENT_NAME, body);
    }

    let body = message_body(&message.text);
    writeln!(out, "{} {} said:\n   {}", message.time, sender, body)
}

fn message_body(text: &Text) -> String {
    match text {
        Text::Ascii(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Text::Utf16(units) => wide_string_or_placeholder(units),
    }
}

/// Multibyte output needs a terminal; without `TERM` in the environment a
/// placeholder is printed instead.
fn wide_string_or_placeholder(units: &[u16]) -> String {
    if std::env::var_os("TERM").is_some() {
        unicode::decode_lossy(units)
    } else {
        String::from("<cannot print Unicode text to this console>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Decoder;

    /// Assembles a complete document around the given object table entries,
    /// with two-byte offsets and one-byte references.
    fn document(objects: &[Vec<u8>], root: usize) -> Vec<u8> {
        let mut buffer = b"bplist00".to_vec();
        let mut offsets = Vec::new();
        for object in objects {
            offsets.push(buffer.len());
            buffer.extend_from_slice(object);
        }
        let table_start = buffer.len();
        for offset in &offsets {
            buffer.extend_from_slice(&(*offset as u16).to_be_bytes());
        }
        buffer.push(2);
        buffer.push(1);
        buffer.extend_from_slice(&(objects.len() as u64).to_be_bytes());
        buffer.extend_from_slice(&(root as u64).to_be_bytes());
        buffer.extend_from_slice(&(table_start as u64).to_be_bytes());
        buffer
    }

    #[test]
    fn test_array_stubs_references_without_follow() {
        let bytes = document(&[
            vec![0xA2, 0x01, 0x02],
            vec![0x10, 0x05],
            vec![0x51, b'x'],
        ], 0);
        let graph = Graph::new(Decoder::new(&bytes).unwrap());
        let mut output = Vec::new();
        BrowsePrinter::new(&graph, &mut output, false, 0).print(0).unwrap();
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("The array has 2 elements:"));
        assert!(printed.contains("(UID 1)"));
        assert!(printed.contains("(UID 2)"));
    }

    #[test]
    fn test_array_follows_references() {
        let bytes = document(&[
            vec![0xA1, 0x01],
            vec![0x51, b'x'],
        ], 0);
        let graph = Graph::new(Decoder::new(&bytes).unwrap());
        let mut output = Vec::new();
        BrowsePrinter::new(&graph, &mut output, true, 0).print(0).unwrap();
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("'x'"));
    }

    #[test]
    fn test_ns_time_real_prints_as_date() {
        let bytes = document(&[
            vec![0xD1, 0x01, 0x02],
            vec![0x57, b'N', b'S', b'.', b't', b'i', b'm', b'e'],
            vec![0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        ], 0);
        let graph = Graph::new(Decoder::new(&bytes).unwrap());
        let mut output = Vec::new();
        BrowsePrinter::new(&graph, &mut output, true, 0).print(0).unwrap();
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("2001-01-01 00:00:00"));
    }

    #[test]
    fn test_print_message_said_shape() {
        let message = Message {
            hiccup: false,
            from_client: false,
            file_transfer_count: 0,
            sender_id: Some(String::from("alice")),
            time: String::from("10:00:00"),
            text: Text::Ascii(b"hello".to_vec()),
        };
        let mut output = Vec::new();
        print_message(&mut output, &message).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "10:00:00 alice said:\n   hello\n"
        );
    }
}
