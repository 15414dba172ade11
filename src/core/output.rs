//! Status-line rendering helpers for CLI surfaces.
//!
//! Keeps command narration consistent across subcommands: successes, progress
//! notes, and the soft-failure warnings the engine deliberately continues past.

use colored::Colorize;

pub fn ok(msg: &str) {
    println!("  {} {}", "✓".bright_green(), msg);
}

pub fn info(msg: &str) {
    println!("  {} {}", "▸".bright_cyan(), msg);
}

/// Warnings go to stderr so piped output (e.g. `inventory dump`) stays clean.
pub fn warn(msg: &str) {
    eprintln!("  {} {}", "!".bright_yellow(), msg);
}
