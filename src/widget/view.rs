use chrono::Local;
use std::io::Write;
use std::sync::{ Mutex, MutexGuard, PoisonError };
use crate::models::chat::ChatTurn;
use crate::render::{ relative_label, render_turn, typing_indicator };
use super::WidgetView;

#[derive(Default)]
struct HtmlState {
    fragments: Vec<String>,
    typing: bool,
    badge: Option<String>,
}

/// Keeps the widget's message list as HTML fragments, in render order.
#[derive(Default)]
pub struct HtmlView {
    state: Mutex<HtmlState>,
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HtmlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The message list markup, including the typing indicator when shown.
    pub fn markup(&self) -> String {
        let state = self.state();
        let mut html = state.fragments.concat();
        if state.typing {
            html.push_str(&typing_indicator());
        }
        html
    }

    pub fn fragment_count(&self) -> usize {
        self.state().fragments.len()
    }

    pub fn is_typing(&self) -> bool {
        self.state().typing
    }

    pub fn badge(&self) -> Option<String> {
        self.state().badge.clone()
    }
}

impl WidgetView for HtmlView {
    fn render_turn(&self, turn: &ChatTurn) {
        let fragment = render_turn(turn, &Local::now());
        self.state().fragments.push(fragment);
    }

    fn show_typing(&self) {
        self.state().typing = true;
    }

    fn hide_typing(&self) {
        self.state().typing = false;
    }

    fn reset(&self) {
        let mut state = self.state();
        state.fragments.clear();
        state.typing = false;
    }

    fn set_badge(&self, label: Option<&str>) {
        self.state().badge = label.map(str::to_owned);
    }
}

/// Plain-text view for the interactive terminal client.
pub struct TerminalView;

impl WidgetView for TerminalView {
    fn render_turn(&self, turn: &ChatTurn) {
        let now = Local::now();
        let at = turn.timestamp.with_timezone(&Local);
        println!("[{}] {}: {}\n", relative_label(&at, &now), turn.role, turn.content);
    }

    fn show_typing(&self) {
        print!("assistant is typing...\r");
        let _ = std::io::stdout().flush();
    }

    fn hide_typing(&self) {
        print!("\x1b[2K\r");
        let _ = std::io::stdout().flush();
    }

    fn reset(&self) {}

    fn set_badge(&self, _label: Option<&str>) {}
}
