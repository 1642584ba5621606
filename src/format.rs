/*!
format.rs

Terminal styling for the shell's human-readable output.

  - StyleOptions { use_color } comes from the resolved settings (NO_COLOR and
    `--no-color` are folded in there); StyleOptions::plain() for tests.
  - color(role, text, &StyleOptions) -> String
  - strip_ansi(s) removes the escape sequences again.

This module never prints; callers decide where the text goes.
*/

use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
}

impl StyleOptions {
    pub fn plain() -> Self {
        StyleOptions { use_color: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Success,
    Warning,
    Error,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45", // cyan-ish
        Role::Success => "38;5;82", // green
        Role::Warning => "38;5;214",
        Role::Error => "38;5;196",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/// Remove CSI escape sequences (`ESC [ ... letter`).
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
