//! Terminal input on a dedicated thread.
//!
//! rustyline is synchronous, so it runs on its own OS thread for the whole
//! client lifetime and feeds the async side through an unbounded channel.
//! Keystrokes are observed through the hinter, which rustyline calls on every
//! line refresh.

use std::thread::JoinHandle;

use rustyline::{
    Context, Editor, Helper, completion::Completer, error::ReadlineError,
    highlight::Highlighter, hint::Hinter, history::DefaultHistory, validate::Validator,
};
use tokio::sync::mpsc::UnboundedSender;

/// Line typed by the user to leave the room.
pub const QUIT_COMMAND: &str = "/quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The line being edited changed
    Keystroke,
    /// A non-empty line was submitted
    Line(String),
    /// Ctrl+C, Ctrl+D or `/quit`
    Quit,
}

/// Reports edits of a non-empty line as keystrokes. Never renders a hint.
struct KeystrokeHelper {
    events: UnboundedSender<InputEvent>,
}

impl Completer for KeystrokeHelper {
    type Candidate = String;
}

impl Hinter for KeystrokeHelper {
    type Hint = String;

    fn hint(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if !line.is_empty() {
            self.events.send(InputEvent::Keystroke).ok();
        }
        None
    }
}

impl Highlighter for KeystrokeHelper {}

impl Validator for KeystrokeHelper {}

impl Helper for KeystrokeHelper {}

/// Spawn the readline thread. It exits after sending `Quit` or once the
/// receiving side is dropped.
pub fn spawn_input_thread(prompt: String, events: UnboundedSender<InputEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut rl = match Editor::<KeystrokeHelper, DefaultHistory>::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                events.send(InputEvent::Quit).ok();
                return;
            }
        };
        rl.set_helper(Some(KeystrokeHelper {
            events: events.clone(),
        }));

        let prompt = format!("{}> ", prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == QUIT_COMMAND {
                        events.send(InputEvent::Quit).ok();
                        break;
                    }
                    rl.add_history_entry(line).ok();
                    if events.send(InputEvent::Line(line.to_string())).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    tracing::info!("Input closed");
                    events.send(InputEvent::Quit).ok();
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    events.send(InputEvent::Quit).ok();
                    break;
                }
            }
        }
    })
}
