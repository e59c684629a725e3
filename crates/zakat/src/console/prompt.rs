//! Line-oriented prompting over any reader and writer.
//!
//! End of input and Ctrl-C are both reported as `None` instead of an error:
//! the current operation is abandoned and the menu asks whether to exit.
//! [`Console::take_interrupted`] tells the two apart.

use std::io::{BufRead, Write};

use tracing::debug;

use super::terminal::Interrupt;
use crate::error::Result;
use crate::validate::{self, ValidationError};

/// A prompt/response terminal.
#[derive(Debug)]
pub struct Console<R, W> {
    input: R,
    output: W,
    line: String,
    interrupt: Interrupt,
    interrupted: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Create a console over the given streams.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            line: String::new(),
            interrupt: Interrupt::new(),
            interrupted: false,
        }
    }

    /// Share `interrupt` with whatever raises it on Ctrl-C.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Whether a read was cut short by Ctrl-C since the last call.
    pub fn take_interrupted(&mut self) -> bool {
        std::mem::take(&mut self.interrupted)
    }

    /// Print a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    /// Print text without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn print(&mut self, text: impl AsRef<str>) -> Result<()> {
        write!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    /// Show `prompt` and read one line, without the line terminator.
    ///
    /// Returns `None` at end of input or on Ctrl-C, including a Ctrl-C that
    /// arrived while no prompt was waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        self.line.clear();
        let read = if self.interrupt.is_raised() {
            0
        } else {
            self.input.read_line(&mut self.line)?
        };

        if self.interrupt.take() {
            debug!("Interrupted at prompt {:?}", prompt);
            self.interrupted = true;
            writeln!(self.output)?;
            return Ok(None);
        }
        if read == 0 {
            debug!("End of input at prompt {:?}", prompt);
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Ask until `parse` accepts the answer.
    ///
    /// Each rejected answer prints the validation message and asks again.
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn ask<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> std::result::Result<T, ValidationError>,
    ) -> Result<Option<T>> {
        loop {
            let Some(raw) = self.read_line(prompt)? else {
                return Ok(None);
            };
            match parse(&raw) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => self.say(format!("{}.", capitalize(&err.to_string())))?,
            }
        }
    }

    /// Ask a yes/no question. End of input and Ctrl-C count as no.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or written.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} (y/n): "), validate::confirmation)?;
        Ok(answer.unwrap_or(false))
    }

    /// Access the output stream.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consume the console and return its output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn test_read_line_strips_terminator() {
        let mut c = console("Ali\r\nSiti\n");
        assert_eq!(c.read_line("Name: ").unwrap(), Some("Ali".to_string()));
        assert_eq!(c.read_line("Name: ").unwrap(), Some("Siti".to_string()));
        assert_eq!(c.read_line("Name: ").unwrap(), None);
    }

    #[test]
    fn test_ask_reprompts_until_valid() {
        let mut c = console("\n  \nAli\n");
        let name = c.ask("Name: ", |s| validate::non_empty("name", s)).unwrap();
        assert_eq!(name, Some("Ali".to_string()));

        let out = output(c);
        assert_eq!(out.matches("Name: ").count(), 3);
        assert_eq!(out.matches("Name cannot be empty.").count(), 2);
    }

    #[test]
    fn test_ask_eof_is_none() {
        let mut c = console("abc\n");
        let amount = c
            .ask("Amount: ", |s| validate::positive_amount("amount", s, None))
            .unwrap();
        assert_eq!(amount, None);
        assert!(output(c).contains("Amount must be a number."));
    }

    #[test]
    fn test_confirm() {
        let mut c = console("maybe\ny\nn\n");
        assert!(c.confirm("Save?").unwrap());
        assert!(!c.confirm("Save?").unwrap());
        assert!(!c.confirm("Save?").unwrap());
        assert!(output(c).contains("Please answer y or n."));
    }

    #[test]
    fn test_raised_interrupt_cuts_read() {
        let interrupt = Interrupt::new();
        let mut c = console("Ali\n").with_interrupt(interrupt.clone());

        interrupt.raise();
        assert_eq!(c.read_line("Name: ").unwrap(), None);
        assert!(c.take_interrupted());
        assert!(!c.take_interrupted());

        assert_eq!(c.read_line("Name: ").unwrap(), Some("Ali".to_string()));
        assert!(!c.take_interrupted());
    }

    #[test]
    fn test_eof_is_not_an_interrupt() {
        let mut c = console("");
        assert_eq!(c.read_line("Name: ").unwrap(), None);
        assert!(!c.take_interrupted());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("date is bad"), "Date is bad");
        assert_eq!(capitalize(""), "");
    }
}
