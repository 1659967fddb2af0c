//! Styled terminal output utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything except errors.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a header/title
pub fn header(text: &str) {
    if quiet() {
        return;
    }
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print a section header
pub fn section(text: &str) {
    if !quiet() {
        println!("{}", text.bold().white());
    }
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    if !quiet() {
        println!("  {}: {}", key.dimmed(), value);
    }
}

/// Print a success message
pub fn success(text: &str) {
    if !quiet() {
        println!("{} {}", "✔".green().bold(), text.green());
    }
}

/// Print an info message
pub fn info(text: &str) {
    if !quiet() {
        println!("{} {}", "ℹ".blue().bold(), text);
    }
}

/// Print a warning message
pub fn warn(text: &str) {
    if !quiet() {
        println!("{} {}", "⚠".yellow().bold(), text.yellow());
    }
}

/// Print an error message. Never suppressed.
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a hint below an error. Never suppressed.
pub fn hint(text: &str) {
    eprintln!("  {} {}", "help:".cyan().bold(), text);
}

/// Print one link of an error's cause chain. Never suppressed.
pub fn cause(text: &str) {
    eprintln!("  {} {}", "caused by:".red(), text);
}

/// Print a list item
pub fn list_item(text: &str) {
    if !quiet() {
        println!("  {} {}", "•".dimmed(), text);
    }
}

/// Print a newline
pub fn newline() {
    if !quiet() {
        println!();
    }
}

/// Print dimmed text
pub fn dim(text: &str) {
    if !quiet() {
        println!("{}", text.dimmed());
    }
}

/// Style text as success (green)
pub fn style_success(text: &str) -> String {
    text.green().to_string()
}

/// Style text as pending (yellow)
pub fn style_pending(text: &str) -> String {
    text.yellow().to_string()
}

/// Style text as error (red)
pub fn style_error(text: &str) -> String {
    text.red().to_string()
}
