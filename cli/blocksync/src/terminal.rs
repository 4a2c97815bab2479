//! A decision provider that asks on the terminal.

use std::io::{self, BufRead, Write};

use blocksync_engine::{DecisionError, DecisionPort};

/// Prompts on an output stream and reads answers from an input stream.
pub struct TerminalDecisions<R, W> {
    input: R,
    output: W,
}

impl TerminalDecisions<io::StdinLock<'static>, io::Stderr> {
    /// Ask on stderr, read from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalDecisions<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<String, DecisionError> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| DecisionError::Io(e.to_string()))?;
        if read == 0 {
            return Err(DecisionError::Cancelled("end of input".into()));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, text: &str) -> Result<(), DecisionError> {
        write!(self.output, "{text}")
            .and_then(|_| self.output.flush())
            .map_err(|e| DecisionError::Io(e.to_string()))
    }
}

impl<R: BufRead, W: Write> DecisionPort for TerminalDecisions<R, W> {
    fn select_one(&mut self, prompt: &str, options: &[String]) -> Result<usize, DecisionError> {
        let mut menu = format!("{prompt}\n");
        for (i, option) in options.iter().enumerate() {
            menu.push_str(&format!("  [{}] {option}\n", i + 1));
        }
        self.say(&menu)?;

        loop {
            self.say("> ")?;
            let line = self.read_line()?;
            match line.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => self.say(&format!("enter a number from 1 to {}\n", options.len()))?,
            }
        }
    }

    fn request_text(&mut self, prompt: &str) -> Result<String, DecisionError> {
        self.say(&format!("{prompt}\n> "))?;
        self.read_line()
    }
}
