//! Turns chat text into display markup.
//!
//! Formatting is a fixed pipeline of text rewrites over one string. Later
//! rules see the markup produced by earlier ones, so the order of
//! [`FORMAT_PIPELINE`] is part of the output contract.

mod html;
mod time;

pub use html::{ render_turn, typing_indicator };
pub use time::relative_label;

use once_cell::sync::Lazy;
use regex::Regex;

/// One step of the markdown pipeline.
pub struct FormatRule {
    pub name: &'static str,
    pattern: Lazy<Regex>,
    replacement: &'static str,
}

impl FormatRule {
    pub fn apply(&self, input: &str) -> String {
        self.pattern.replace_all(input, self.replacement).into_owned()
    }
}

pub static FENCED_CODE: FormatRule = FormatRule {
    name: "fenced_code",
    pattern: Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_]+)?\n(.*?)```").unwrap()),
    replacement: "<pre><code>${2}</code></pre>",
};

pub static INLINE_CODE: FormatRule = FormatRule {
    name: "inline_code",
    pattern: Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap()),
    replacement: "<code>${1}</code>",
};

pub static BOLD: FormatRule = FormatRule {
    name: "bold",
    pattern: Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap()),
    replacement: "<strong>${1}</strong>",
};

pub static ORDERED_ITEM: FormatRule = FormatRule {
    name: "ordered_item",
    pattern: Lazy::new(|| Regex::new(r"(?mR)^[0-9]+\.\s+(.+)$").unwrap()),
    replacement: "<ol><li>${1}</li></ol>",
};

pub static UNORDERED_ITEM: FormatRule = FormatRule {
    name: "unordered_item",
    pattern: Lazy::new(|| Regex::new(r"(?mR)^[-•]\s+(.+)$").unwrap()),
    replacement: "<ul><li>${1}</li></ul>",
};

pub static LINE_BREAK: FormatRule = FormatRule {
    name: "line_break",
    pattern: Lazy::new(|| Regex::new(r"\n").unwrap()),
    replacement: "<br>",
};

pub static FORMAT_PIPELINE: [&FormatRule; 6] = [
    &FENCED_CODE,
    &INLINE_CODE,
    &BOLD,
    &ORDERED_ITEM,
    &UNORDERED_ITEM,
    &LINE_BREAK,
];

/// Joins consecutive single-item lists of the same kind that the list rules
/// emit one line at a time.
pub fn merge_adjacent_lists(input: &str) -> String {
    input.replace("</ol><br><ol>", "").replace("</ul><br><ul>", "")
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_message(content: &str) -> String {
    let escaped = escape_html(content);
    let formatted = FORMAT_PIPELINE.iter().fold(escaped, |text, rule| rule.apply(&text));
    merge_adjacent_lists(&formatted)
}
