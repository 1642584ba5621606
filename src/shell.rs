/*!
Interactive dispatcher.

Loop: prompt -> read line -> split on whitespace -> dispatch -> print.

Control commands (`menu`, `exit`) are handled here and never reach the
registry. Anything else is looked up; unknown names print a hint and the loop
continues. Operation panics are caught and reported as a failed command.

Input is abstracted as a `LineSource` so the loop can be driven by a script
in tests; `StdinLines` is the terminal implementation.

Ctrl-C on a terminal never surfaces through `StdinLines`: `read_line` retries
EINTR, so the binary's signal handler prints the farewell with
`write_farewell` and exits. `ReadOutcome::Interrupted` is for sources that
observe the interrupt themselves; the loop ends the same way for both.
*/

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::format::{Role, StyleOptions, color};
use crate::ops::{OpError, format_number};
use crate::registry::{EXIT_COMMAND, MENU_COMMAND, Registry};
use crate::utils::panic_message;
use crate::{log_debug, log_warn};

pub const WELCOME: &str =
    "Welcome to plugcalc! Type 'menu' to see available commands, or 'exit' to quit.";
pub const GOODBYE: &str = "Exiting calculator. Goodbye!";
pub const UNKNOWN_HINT: &str = "Invalid command. Type 'menu' to see available commands.";

/// One attempt at reading a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Input closed (Ctrl-D, end of pipe).
    Eof,
    /// The user interrupted input (Ctrl-C) and the source saw it.
    Interrupted,
}

pub trait LineSource {
    fn next_line(&mut self) -> io::Result<ReadOutcome>;
}

/// Reads lines from any buffered reader, normally stdin.
pub struct StdinLines<R> {
    reader: R,
}

impl StdinLines<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdinLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for StdinLines<R> {
    fn next_line(&mut self) -> io::Result<ReadOutcome> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) => Ok(ReadOutcome::Line(buf)),
            Err(err) => Err(err),
        }
    }
}

/// Goodbye printed when input ends or is interrupted, on a fresh line.
pub fn write_farewell(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{GOODBYE}")?;
    out.flush()
}

/// Pre-recorded input; yields `Eof` once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    queue: VecDeque<ReadOutcome>,
}

impl ScriptedLines {
    pub fn new(outcomes: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            queue: outcomes.into_iter().collect(),
        }
    }

    pub fn lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self::new(lines.into_iter().map(|l| ReadOutcome::Line(l.into())))
    }
}

impl LineSource for ScriptedLines {
    fn next_line(&mut self) -> io::Result<ReadOutcome> {
        Ok(self.queue.pop_front().unwrap_or(ReadOutcome::Eof))
    }
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Value(f64),
    Failed(OpError),
    /// The operation panicked instead of returning an error.
    Fault(String),
    Unknown(String),
}

/// Whether the loop keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<W: Write> {
    registry: Registry,
    out: W,
    style: StyleOptions,
    prompt: String,
}

impl<W: Write> Shell<W> {
    pub fn new(registry: Registry, out: W) -> Self {
        Self {
            registry,
            out,
            style: StyleOptions::plain(),
            prompt: crate::config::DEFAULT_PROMPT.to_string(),
        }
    }

    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until `exit`, end of input or interrupt.
    pub fn run(&mut self, input: &mut dyn LineSource) -> io::Result<()> {
        writeln!(self.out, "{}", color(Role::Primary, WELCOME, &self.style))?;
        loop {
            write!(self.out, "{}", self.prompt)?;
            self.out.flush()?;

            let line = match input.next_line() {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::Eof) | Ok(ReadOutcome::Interrupted) => {
                    return write_farewell(&mut self.out);
                }
                Err(err) => {
                    log_warn!("failed to read input: {err}");
                    return write_farewell(&mut self.out);
                }
            };

            if self.handle_line(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Process one input line and print its outcome.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = tokens.collect();

        match name {
            EXIT_COMMAND => {
                writeln!(self.out, "{GOODBYE}")?;
                return Ok(Flow::Exit);
            }
            MENU_COMMAND => {
                let listing = self.registry.names().join(", ");
                writeln!(self.out, "Available commands: {listing}")?;
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let text = match self.dispatch(name, &args) {
            Response::Value(v) => color(
                Role::Success,
                format!("Result: {}", format_number(v)),
                &self.style,
            ),
            Response::Failed(err) => color(Role::Error, format!("Error: {err}"), &self.style),
            Response::Fault(msg) => color(
                Role::Error,
                format!("Error: command '{name}' failed unexpectedly: {msg}"),
                &self.style,
            ),
            Response::Unknown(_) => color(Role::Warning, UNKNOWN_HINT, &self.style),
        };
        writeln!(self.out, "{text}")?;
        Ok(Flow::Continue)
    }

    /// Look up and invoke `name`, containing any panic from the operation.
    pub fn dispatch(&self, name: &str, args: &[&str]) -> Response {
        let Some(operation) = self.registry.lookup(name) else {
            log_debug!("unrecognized command '{name}'");
            return Response::Unknown(name.to_string());
        };
        match catch_unwind(AssertUnwindSafe(|| operation.execute(args))) {
            Ok(Ok(value)) => Response::Value(value),
            Ok(Err(err)) => Response::Failed(err),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log_warn!("command '{name}' panicked: {msg}");
                Response::Fault(msg)
            }
        }
    }
}
