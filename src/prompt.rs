use std::io::{self, BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;

static AFFIRMATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(y|yes)$").expect("valid affirmative pattern"));

/// Yes/no decision source for destructive actions.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;

    /// Context for the next prompt, written where the prompt is written.
    /// Policies that never ask a person drop it.
    fn show(&mut self, _text: &str) {}
}

/// Anything other than `y`/`yes` (any case) declines, including blank input.
pub fn is_affirmative(answer: &str) -> bool {
    AFFIRMATIVE.is_match(answer.trim())
}

/// Asks on `output` and reads one line from `input`. A read error or a
/// closed input counts as "no".
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, message: &str) -> io::Result<bool> {
        write!(self.output, "{message} [yN] ")?;
        self.output.flush()?;
        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }
        Ok(is_affirmative(&answer))
    }

    fn write_context(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        match self.ask(message) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "reading confirmation failed; treating as no");
                false
            }
        }
    }

    fn show(&mut self, text: &str) {
        if let Err(err) = self.write_context(text) {
            tracing::warn!(error = %err, "unable to write prompt context");
        }
    }
}

/// `--force`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!(prompt = message, "auto-confirmed");
        true
    }
}

/// Dry runs without `--force`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!(prompt = message, "auto-declined");
        false
    }
}
