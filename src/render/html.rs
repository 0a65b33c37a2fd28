use chrono::{ DateTime, TimeZone };
use std::fmt::Display;
use crate::models::chat::{ ChatTurn, Role };
use super::{ format_message, relative_label };

fn avatar(role: Role) -> &'static str {
    match role {
        Role::User => "<div class=\"chat-message-avatar\" data-avatar=\"user\"></div>",
        _ => "<div class=\"chat-message-avatar\" data-avatar=\"assistant\"></div>",
    }
}

/// Markup for one turn: avatar, formatted content and relative time label.
pub fn render_turn<Tz>(turn: &ChatTurn, now: &DateTime<Tz>) -> String
    where Tz: TimeZone, Tz::Offset: Display
{
    let at = turn.timestamp.with_timezone(&now.timezone());
    format!(
        "<div class=\"chat-message {role}\">{avatar}<div><div class=\"chat-message-content\">{content}</div><div class=\"chat-message-time\">{time}</div></div></div>",
        role = turn.role,
        avatar = avatar(turn.role),
        content = format_message(&turn.content),
        time = relative_label(&at, now)
    )
}

pub fn typing_indicator() -> String {
    format!(
        "<div class=\"chat-message assistant\" id=\"typingIndicator\">{}<div class=\"chat-message-content\"><div class=\"chat-typing\"><span></span><span></span><span></span></div></div></div>",
        avatar(Role::Assistant)
    )
}
