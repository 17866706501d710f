use crate::Reporter;
use std::fmt::Write as _;
use std::io::{self, Write};

/// A single `print` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Int(i32),
    Str(&'a str),
}

impl std::fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Str(s) => f.write_str(s),
        }
    }
}

/// Expands a printf-style template.
///
/// `%d`, `%i` and `%s` each consume the next argument and render it with its
/// `Display` form. `%%` is a literal percent sign. A directive with no
/// argument left, or an unknown directive, is copied through unchanged.
/// Surplus arguments are ignored.
pub fn format_template(template: &str, args: &[Arg<'_>]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(spec @ ('d' | 'i' | 's')) => {
                chars.next();
                match args.next() {
                    Some(arg) => {
                        let _ = write!(out, "{}", arg);
                    }
                    None => {
                        out.push('%');
                        out.push(spec);
                    }
                }
            }
            _ => out.push('%'),
        }
    }

    out
}

/// Serial-style sink over any byte writer.
/// Each `print` is written and flushed immediately, like a UART data register.
#[derive(Debug)]
pub struct SerialReporter<W: Write> {
    writer: W,
}

impl SerialReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> SerialReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for SerialReporter<W> {
    fn print(&mut self, template: &str, args: &[Arg<'_>]) {
        let line = format_template(template, args);
        if let Err(e) = self
            .writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
        {
            tracing::warn!("Serial write failed, dropping {} bytes: {}", line.len(), e);
        }
    }
}

/// Collects everything printed, optionally echoing it through a serial sink.
#[derive(Debug)]
pub struct CaptureReporter<W: Write = io::Stdout> {
    output: String,
    echo: Option<SerialReporter<W>>,
}

impl Default for CaptureReporter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureReporter<io::Stdout> {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            echo: None,
        }
    }

    pub fn with_echo(echo: bool) -> Self {
        Self {
            output: String::new(),
            echo: echo.then(SerialReporter::stdout),
        }
    }
}

impl<W: Write> CaptureReporter<W> {
    pub fn echoing(writer: W) -> Self {
        Self {
            output: String::new(),
            echo: Some(SerialReporter::new(writer)),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl<W: Write> Reporter for CaptureReporter<W> {
    fn print(&mut self, template: &str, args: &[Arg<'_>]) {
        if let Some(echo) = self.echo.as_mut() {
            echo.print(template, args);
        }
        self.output.push_str(&format_template(template, args));
    }
}
