//! Centralized emoji + colored status lines for consistent UX copy.

use crossterm::style::{Color, Stylize};
use serde::Serialize;
use std::sync::{Arc, Mutex};

pub mod emoji {
    pub const SUCCESS: &str = "✅";
    pub const ERROR: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const DISK: &str = "💾";
    pub const SEARCH: &str = "🔍";
    pub const ROCKET: &str = "🚀";
}

pub fn with(emoji: &str, message: &str) -> String {
    format!("{} {}", emoji, message)
}

/// Status-line printer. Color is decided once from [`crate::config::Config`].
///
/// A capturing console keeps lines in memory instead of printing (used by tests).
#[derive(Debug, Clone, Default)]
pub struct Console {
    color: bool,
    captured: Option<Arc<Mutex<Vec<String>>>>,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            captured: None,
        }
    }

    pub fn capturing() -> Self {
        Self {
            color: false,
            captured: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines printed so far by a capturing console.
    pub fn lines(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .and_then(|c| c.lock().ok().map(|l| l.clone()))
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn emit(&self, line: String) {
        match &self.captured {
            Some(buf) => {
                if let Ok(mut lines) = buf.lock() {
                    lines.push(line);
                }
            }
            None => println!("{}", line),
        }
    }

    pub fn line(&self, text: &str) {
        self.emit(text.to_string());
    }

    pub fn colored(&self, text: &str, color: Color) {
        self.emit(self.paint(text, color));
    }

    pub fn success(&self, msg: &str) {
        self.colored(&with(emoji::SUCCESS, msg), Color::Green);
    }

    pub fn error(&self, msg: &str) {
        self.colored(&with(emoji::ERROR, msg), Color::Red);
    }

    pub fn warn(&self, msg: &str) {
        self.colored(&with(emoji::WARN, msg), Color::Yellow);
    }

    pub fn info(&self, msg: &str) {
        self.colored(&with(emoji::INFO, msg), Color::Cyan);
    }

    pub fn header(&self, title: &str) {
        let rule = "=".repeat(60);
        self.colored(&format!("\n{}", rule), Color::Yellow);
        self.colored(title, Color::Yellow);
        self.colored(&rule, Color::Yellow);
    }

    pub fn banner(&self) {
        let rule = "=".repeat(60);
        self.colored(&rule, Color::Magenta);
        self.colored(
            &format!("         {} DSK REPAIR {}", emoji::ROCKET, emoji::ROCKET),
            Color::Green,
        );
        self.colored("   Intelligent Disk Utility for Linux", Color::Cyan);
        self.colored(&rule, Color::Magenta);
    }

    /// Pretty-print a structured result, e.g. a repair summary.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => self.emit(text),
            Err(err) => self.error(&format!("could not render result: {}", err)),
        }
    }

    /// `\n[title]` followed by the pretty JSON of `value`.
    pub fn summary<T: Serialize>(&self, title: &str, value: &T) {
        self.colored(&format!("\n[{}]", title), Color::Cyan);
        self.json(value);
    }
}
