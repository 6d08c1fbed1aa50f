//
// Copyright 2026 ichatlog Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use structopt::StructOpt;

use ichatlog::archive::ChatArchive;
use ichatlog::browse::{self, BrowsePrinter};
use ichatlog::date::DEFAULT_LOCAL_OFFSET_HOURS;
use ichatlog::decode::Decoder;
use ichatlog::files::{self, CreateOutcome};
use ichatlog::graph::Graph;
use ichatlog::message::Interpreter;
use ichatlog::render::{OutputFormat, RenderOptions, Renderer};
use ichatlog::{Error, Result};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Mode {
    Convert,
    Browse,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(name: &str) -> Result<Mode> {
        match name {
            "convert" => Ok(Mode::Convert),
            "browse" => Ok(Mode::Browse),
            _ => Err(Error::Arg(String::from(
                "you need to supply 'browse' or 'convert' as a parameter for the --mode argument",
            ))),
        }
    }
}

/// Reads a legacy iChat chat log and converts it to TXT or RTF, or lets you
/// browse it (or any other bplist) interactively.
#[derive(StructOpt, Debug)]
#[structopt(name = "ichatlog")]
struct Options {
    /// 'browse' to interactively inspect a .ichat file or any other bplist,
    /// 'convert' to convert a .ichat file to the format given with --format.
    #[structopt(long, possible_values = &["convert", "browse"])]
    mode: Mode,

    /// Path to the .ichat file or other bplist to process.
    #[structopt(long, parse(from_os_str))]
    input: PathBuf,

    /// Output format for the converted log; required in convert mode.
    #[structopt(long, possible_values = &["TXT", "RTF"])]
    format: Option<OutputFormat>,

    /// When browsing, follow UID links to the objects they reference.
    #[structopt(long)]
    follow_links: bool,

    /// When converting, overwrite any existing file with the same name.
    #[structopt(long)]
    overwrite: bool,

    /// Use the "real" names that were attached to participants' accounts in
    /// iChat instead of the chat service account IDs.
    #[structopt(long)]
    real_names: bool,

    /// Write an account ID such as 'john@doe.com' as 'john'.
    #[structopt(long)]
    trim_email_ids: bool,

    /// Fixed hour offset applied to timestamps (default -5). Plain
    /// arithmetic; no DST and no timezone database.
    #[structopt(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,
}

fn main() {
    pretty_env_logger::init();
    let options = Options::from_args();
    if let Err(error) = run(&options) {
        eprintln!("Fatal error: {}", error);
        process::exit(1);
    }
}

fn run(options: &Options) -> Result<()> {
    match (options.mode, options.format) {
        (Mode::Convert, None) => {
            return Err(Error::Arg(String::from(
                "you need to supply the --format argument followed by 'TXT' or 'RTF' \
                 as the format for the converted log",
            )));
        }
        (Mode::Browse, Some(_)) => {
            return Err(Error::Arg(String::from(
                "you supplied the --format argument which is meant for conversion mode, \
                 but you asked for 'browse' mode instead of 'convert' mode",
            )));
        }
        _ => {}
    }

    let contents = files::load_input(&options.input)?;
    let decoder = Decoder::new(&contents)?;
    let graph = Graph::new(decoder);
    let is_ichat = ChatArchive::identify(&graph)?;
    let offset_hours = options.utc_offset.unwrap_or(DEFAULT_LOCAL_OFFSET_HOURS);
    let file_name = display_file_name(&options.input);

    match options.mode {
        Mode::Convert => {
            println!("Converting \"{}\"...", file_name);
            if !is_ichat {
                return Err(Error::Arg(String::from(
                    "conversion of non-iChat binary plists is not supported",
                )));
            }
            // The format was cross-checked against the mode above.
            let format = options.format.ok_or_else(|| {
                Error::Arg(String::from("--format is required in convert mode"))
            })?;
            let archive = ChatArchive::open(&graph, options.trim_email_ids)?;
            convert(&archive, options, format, offset_hours)
        }
        Mode::Browse => {
            println!("Browsing \"{}\"...", file_name);
            if is_ichat {
                browse_ichat(&graph, options, offset_hours)
            } else {
                browse_bplist(&graph, options, offset_hours)
            }
        }
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Converts the loaded archive, writing next to the input file.
fn convert(
    archive: &ChatArchive,
    options: &Options,
    format: OutputFormat,
    offset_hours: i32,
) -> Result<()> {
    let out_path = files::output_path(&options.input, format)?;
    let file = match files::create_output(&out_path, options.overwrite)? {
        CreateOutcome::Created(file) => file,
        CreateOutcome::AlreadyExists => {
            println!(
                "Skipping conversion; \"{}\" already exists.",
                display_file_name(&out_path)
            );
            return Ok(());
        }
    };

    let render_options = RenderOptions {
        use_real_names: options.real_names,
        trim_email_ids: options.trim_email_ids,
    };
    let mut renderer = Renderer::new(format, BufWriter::new(file), render_options);
    let interpreter = Interpreter::new(archive, offset_hours);

    renderer.begin()?;
    for position in 0 .. archive.message_count() {
        let message = interpreter.interpret(position)?;
        if position == 0 {
            // The header carries the first message's timestamp, so it can
            // only be written once that message has been read.
            renderer.chat_opened(&interpreter.chat_opened(0)?)?;
        }
        renderer.message(&message, archive.participants())?;
    }
    renderer.finish()?;
    Ok(())
}

/// Reads one line from stdin, or `None` at end of input.
fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

/// Prompts for a number; any non-numeric input means the user is done.
fn prompt_number(prompt: &str) -> Option<u64> {
    println!("{}", prompt);
    read_line()?.trim().parse().ok()
}

/// Asks whether an iChat log should be browsed smartly or as a raw plist.
fn browse_ichat(graph: &Graph, options: &Options, offset_hours: i32) -> Result<()> {
    println!(
        "The bplist file has been identified as an iChat log. Do you wish to \
         (1) browse it as an iChat log or (2) browse it as a raw plist? \
         Type something other than 1 or 2 to quit."
    );
    match read_line().and_then(|line| line.trim().parse::<u64>().ok()) {
        Some(1) => {
            let archive = ChatArchive::open(graph, options.trim_email_ids)?;
            browse_ichat_menu(&archive, options, offset_hours)
        }
        Some(2) => browse_bplist(graph, options, offset_hours),
        _ => {
            println!("All right, see you later!");
            Ok(())
        }
    }
}

/// The smart-vs-raw menu for a loaded iChat archive.
fn browse_ichat_menu(archive: &ChatArchive, options: &Options, offset_hours: i32) -> Result<()> {
    loop {
        println!(
            "Do you want to (1) browse the chat messages smartly or (2) browse the items \
             in '$objects' as raw plist data? Type something other than 1 or 2 to quit."
        );
        match read_line().and_then(|line| line.trim().parse::<u64>().ok()) {
            Some(1) => browse_messages(archive, offset_hours),
            Some(2) => browse_objects(archive, options, offset_hours),
            _ => {
                println!("All right, maybe next time!");
                return Ok(());
            }
        }
    }
}

/// Interactive browsing of raw offset-table objects.
fn browse_bplist(graph: &Graph, options: &Options, offset_hours: i32) -> Result<()> {
    println!("Printing root object:");
    let mut printer = BrowsePrinter::new(graph, io::stdout(), options.follow_links, offset_hours);
    if let Err(error) = printer.print(graph.decoder().root_object()) {
        eprintln!("Error: {}", error);
        return Ok(());
    }

    loop {
        let prompt = format!(
            "Type any letter to exit, or enter the number [0-{}] of the element in the \
             offset table to print:",
            graph.decoder().object_count() - 1
        );
        let selection = match prompt_number(&prompt) {
            Some(selection) => selection,
            None => {
                println!("Goodbye!");
                return Ok(());
            }
        };
        if selection as usize >= graph.decoder().object_count() {
            println!("Error: Input {} out of range. Try again.", selection);
            continue;
        }
        if let Err(error) = printer.print(selection as usize) {
            eprintln!("Error: {}", error);
            return Ok(());
        }
    }
}

/// Interactive browsing of the `$objects` array of an iChat archive.
fn browse_objects(archive: &ChatArchive, options: &Options, offset_hours: i32) {
    let mut printer = BrowsePrinter::new(
        archive.graph(),
        io::stdout(),
        options.follow_links,
        offset_hours,
    );
    loop {
        let prompt = format!(
            "Type any letter to exit, or enter the UID [0-{}] of the item in '$objects' \
             to print:",
            archive.objects().len().saturating_sub(1)
        );
        let selection = match prompt_number(&prompt) {
            Some(selection) => selection,
            None => {
                println!("Sayonara!");
                return;
            }
        };
        let reference = match archive.objects().get(selection as usize) {
            Some(reference) => *reference,
            None => {
                println!("Error: Input {} out of range. Try again.", selection);
                continue;
            }
        };
        if let Err(error) = printer.print(reference) {
            eprintln!("Error: {}", error);
            return;
        }
    }
}

/// Interactive browsing of interpreted chat messages.
fn browse_messages(archive: &ChatArchive, offset_hours: i32) {
    let interpreter = Interpreter::new(archive, offset_hours);
    loop {
        let prompt = format!(
            "Type any letter to exit, or enter the number [1-{}] of the chat message to \
             print, or enter 0 to print the whole chat:",
            archive.message_count()
        );
        let selection = match prompt_number(&prompt) {
            Some(selection) => selection,
            None => {
                println!("Adios!");
                return;
            }
        };
        if selection == 0 {
            for position in 0 .. archive.message_count() {
                print_one_message(&interpreter, position);
            }
        } else if (selection as usize) <= archive.message_count() {
            print_one_message(&interpreter, selection as usize - 1);
        } else {
            println!("Error: Input {} out of range. Try again.", selection);
        }
    }
}

/// Prints one message; a malformed message aborts only itself.
fn print_one_message(interpreter: &Interpreter, position: usize) {
    match interpreter.interpret(position) {
        Ok(message) => {
            let stdout = io::stdout();
            let _ = browse::print_message(&mut stdout.lock(), &message);
        }
        Err(error) => eprintln!("Error: could not read message {}: {}", position + 1, error),
    }
}
