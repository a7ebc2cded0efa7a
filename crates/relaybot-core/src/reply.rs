//! Cleanup of generated text before it is sent to Telegram.

use crate::prompt::user_turn_marker;

/// Telegram's limit for a single text message, in characters.
pub const TELEGRAM_MAX_MESSAGE_CHARS: usize = 4096;

const TRUNCATION_MARKER: &str = "…";

/// Strip an echoed prompt and any invented follow-up turns.
///
/// Returns `None` when nothing usable is left.
pub fn clean_completion(prompt_text: &str, generated: &str) -> Option<String> {
    let mut text = generated;

    if !prompt_text.is_empty() {
        if let Some(rest) = text.strip_prefix(prompt_text) {
            text = rest;
        }
    }

    let marker = user_turn_marker();
    if let Some(idx) = text.find(&marker) {
        text = &text[..idx];
    }

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Cap a reply at Telegram's message limit.
pub fn truncate_for_telegram(text: &str) -> String {
    if text.chars().count() <= TELEGRAM_MAX_MESSAGE_CHARS {
        return text.to_string();
    }

    let keep = TELEGRAM_MAX_MESSAGE_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
