//! UI utilities for the client.

use std::io::Write;

/// Print formatted output, then redisplay the prompt.
pub fn print_with_prompt(output: &str, prompt: &str) {
    print!("{}", output);
    redisplay_prompt(prompt);
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(prompt: &str) {
    print!("{}> ", prompt);
    std::io::stdout().flush().ok();
}
