//! Colored output for trond
//!
//! Uses owo-colors for terminal colors. Progress bars live in
//! [`crate::core::progress`].

use owo_colors::OwoColorize;

/// Print an action header (blue, bold)
/// Example: "==> Downloading snapshot backup20250204"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print an action with a host counter (cyan, bold)
/// Example: "(1/3) Node 192.168.1.10"
pub fn action_numbered(current: usize, total: usize, message: &str) {
    println!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message.bold()
    );
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> verifying"
pub fn sub_action(step: &str) {
    println!("  {} {}", "->".cyan(), step);
}

/// Print a detail line (dimmed, indented)
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a key/value pair under a header
pub fn field(key: &str, value: &str) {
    println!("     {:<20} {}", format!("{}:", key).dimmed(), value);
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Print a skip message (dimmed)
pub fn skip(message: &str) {
    println!("{} {}", "==>".dimmed(), message.dimmed());
}

/// Print one item of a listing
pub fn list_item(name: &str) {
    println!("  {}", name);
}

/// Render a byte count the way the snapshot tooling reports sizes.
///
/// Uses binary units with two decimals above one KiB.
pub fn format_size(size: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let s = size as f64;
    if s >= GB {
        format!("{:.2} GB", s / GB)
    } else if s >= MB {
        format!("{:.2} MB", s / MB)
    } else if s >= KB {
        format!("{:.2} KB", s / KB)
    } else {
        format!("{} Bytes", size)
    }
}
