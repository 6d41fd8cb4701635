use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;
use serde::Serialize;

pub struct Icons;

impl Icons {
    pub const ARROW: &str = "→";
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const NOTE: &str = "📌";
    pub const PACKAGE: &str = "📦";
}

pub fn icon_or<'a>(icon: &'a str, fallback: &'a str) -> &'a str {
    if std::env::var_os("DEXTER_NO_EMOJI").is_some() {
        fallback
    } else {
        icon
    }
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));
pub static PROGRESS: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn progress_enabled() -> bool {
    *PROGRESS.read().unwrap()
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap();
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

pub fn vec_string<T: Display + Serialize>(value: Option<Vec<T>>) -> Option<String> {
    value.and_then(|json| serde_json::to_string(&json).ok())
}

/// Prints `value` as pretty JSON when `json` is set, otherwise hands it to
/// `human`. Keeps every command's dual JSON/text output path consistent.
pub fn print_result<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("{} failed to render JSON: {err}", Colored(Color::Red, Icons::CROSS)),
        }
    } else {
        human(value);
    }
}
