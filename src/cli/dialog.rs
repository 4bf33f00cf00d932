use std::io::{self, BufRead, Write};

use crate::ops::move_ops::Destination;

/// Result of handing one line of input to a dialog
#[derive(Debug, PartialEq, Eq)]
pub enum DialogStep<T> {
    Done(T),
    /// Input rejected; the message is shown and the dialog asks again
    Retry(String),
}

/// A prompt that collects one answer from the user.
pub trait Dialog {
    type Output;

    fn render(&self, out: &mut dyn Write) -> io::Result<()>;

    fn on_submit(&mut self, input: &str) -> DialogStep<Self::Output>;

    /// Called when the user cancels (empty input or end of input).
    fn on_close(&mut self) {}
}

/// Drive `dialog` until it produces an answer or is cancelled.
pub fn run_dialog<D: Dialog, R: BufRead, W: Write>(
    dialog: &mut D,
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<D::Output>> {
    loop {
        dialog.render(out)?;
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            writeln!(out)?;
            dialog.on_close();
            return Ok(None);
        }
        match dialog.on_submit(line.trim()) {
            DialogStep::Done(value) => return Ok(Some(value)),
            DialogStep::Retry(message) => writeln!(out, "{}", message)?,
        }
    }
}

// ---------------------------------------------------------------------------
// Destination picker
// ---------------------------------------------------------------------------

/// One offered destination and the note it resolves to
#[derive(Debug, Clone)]
pub struct DestinationOption {
    pub destination: Destination,
    pub path: String,
}

/// Asks where a to-do should go. Accepts an option number or any
/// destination `Destination::from_str` understands.
pub struct DestinationPicker {
    todo: String,
    options: Vec<DestinationOption>,
    cancelled: bool,
}

impl DestinationPicker {
    pub fn new(todo: impl Into<String>, options: Vec<DestinationOption>) -> Self {
        DestinationPicker {
            todo: todo.into(),
            options,
            cancelled: false,
        }
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Dialog for DestinationPicker {
    type Output = Destination;

    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Move \"{}\" to:", self.todo.trim())?;
        let width = self
            .options
            .iter()
            .map(|o| o.destination.to_string().len())
            .max()
            .unwrap_or(0);
        for (i, option) in self.options.iter().enumerate() {
            writeln!(
                out,
                "  {}) {:<width$}  {}",
                i + 1,
                option.destination.to_string(),
                option.path,
                width = width
            )?;
        }
        writeln!(out, "Or type a date (YYYY-MM-DD), tag:<name> or note:<path>.")
    }

    fn on_submit(&mut self, input: &str) -> DialogStep<Destination> {
        if let Ok(n) = input.parse::<usize>() {
            return match n.checked_sub(1).and_then(|i| self.options.get(i)) {
                Some(option) => DialogStep::Done(option.destination.clone()),
                None => DialogStep::Retry(format!("no option {}", n)),
            };
        }
        match input.parse::<Destination>() {
            Ok(destination) => DialogStep::Done(destination),
            Err(e) => DialogStep::Retry(e),
        }
    }

    fn on_close(&mut self) {
        self.cancelled = true;
    }
}
