//! Console output for the installer.
//!
//! Status lines use colored prefixes; registry lookups get a spinner.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::borrow::Cow;
use std::time::Duration;

pub struct Output;

impl Output {
    /// Example: `✓ uzp v2.0.0 installed`
    pub fn success(msg: impl AsRef<str>) {
        println!("{} {}", "✓".green().bold(), msg.as_ref());
    }

    /// Example: `✗ Installation failed: ...` (stderr)
    pub fn error(msg: impl AsRef<str>) {
        eprintln!("{} {}", "✗".red().bold(), msg.as_ref().red());
    }

    /// Example: `⚠ Could not create symlink`
    pub fn warning(msg: impl AsRef<str>) {
        println!("{} {}", "⚠".yellow(), msg.as_ref());
    }

    /// Example: `→ Fetching latest version`
    pub fn info(msg: impl AsRef<str>) {
        println!("{} {}", "→".cyan(), msg.as_ref().dimmed());
    }

    /// Example: `  • Existing binary removed`
    pub fn step(msg: impl AsRef<str>) {
        println!("  {} {}", "•".cyan(), msg.as_ref());
    }

    /// Example: `  Binary:        /home/me/.local/share/uzp/bin/uzp`
    pub fn kv(key: impl AsRef<str>, value: impl AsRef<str>) {
        println!("  {:<14} {}", format!("{}:", key.as_ref()).cyan(), value.as_ref());
    }

    /// Example: `  → Run: uzp-install clean-cache` (stderr)
    pub fn hint(msg: impl AsRef<str>) {
        eprintln!("  {} {}", "→".cyan(), msg.as_ref());
    }

    pub fn spinner(msg: impl Into<Cow<'static, str>>) -> Spinner {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(msg);
        pb.enable_steady_tick(Duration::from_millis(80));
        Spinner(pb)
    }

    pub fn blank() {
        println!();
    }
}

pub struct Spinner(ProgressBar);

impl Spinner {
    pub fn finish_success(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✓".green().bold(), msg.as_ref()));
    }

    pub fn finish_error(self, msg: impl AsRef<str>) {
        self.0
            .finish_with_message(format!("{} {}", "✗".red().bold(), msg.as_ref()));
    }
}
