//! Conversation Display
//!
//! Pure helpers that turn session state into ratatui lines. Kept free of
//! terminal handles so the wrapping and alignment logic is unit-testable.
//!
//! Assistant replies render left-aligned under a "Cortex" label; user
//! messages render right-aligned, mirroring a chat transcript. While a
//! query is in flight a thinking indicator is appended after the history.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use cortex_core::{Message, MessageId, MessageRole};

/// Accent color for assistant labels and highlights
pub const CORTEX_ACCENT: Color = Color::Rgb(167, 139, 250);

/// Label shown above assistant replies
pub const ASSISTANT_LABEL: &str = "Cortex";

/// Indicator shown while a query is in flight
pub const THINKING_INDICATOR: &str = "Cortex is thinking...";

/// Marker appended to the label of the reply being spoken
pub const SPEAKING_MARKER: &str = "🔊 speaking";

/// Build the full conversation transcript as wrapped lines
///
/// `width` is the usable text width of the conversation panel. `speaking`
/// marks the message currently being read aloud.
pub fn conversation_lines(
    history: &[Message],
    speaking: Option<&MessageId>,
    pending: bool,
    width: usize,
) -> Vec<Line<'static>> {
    let width = width.max(10);
    let mut lines = Vec::new();

    for message in history {
        match message.role {
            MessageRole::Assistant => {
                lines.push(assistant_label(speaking == Some(&message.id)));
                for wrapped in textwrap::wrap(&message.content, width) {
                    lines.push(Line::from(wrapped.to_string()));
                }
            }
            MessageRole::User => {
                for wrapped in textwrap::wrap(&message.content, width) {
                    lines.push(right_aligned(wrapped.to_string(), width));
                }
            }
        }
        lines.push(Line::default());
    }

    if pending {
        lines.push(Line::from(Span::styled(
            THINKING_INDICATOR,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::default());
    }

    lines
}

/// The "Cortex" label line, with the speaking marker when active
fn assistant_label(speaking: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        ASSISTANT_LABEL,
        Style::default()
            .fg(CORTEX_ACCENT)
            .add_modifier(Modifier::BOLD),
    )];
    if speaking {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            SPEAKING_MARKER,
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

/// Pad a user line so its text ends at the right edge
fn right_aligned(text: String, width: usize) -> Line<'static> {
    let pad = width.saturating_sub(text.width());
    Line::from(vec![
        Span::raw(" ".repeat(pad)),
        Span::styled(text, Style::default().fg(Color::Green)),
    ])
}

/// Build the input box content ("You: {draft}_")
pub fn input_line(draft: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("You: ", Style::default().fg(Color::Green)),
        Span::raw(draft.to_string()),
        Span::styled("_", Style::default().fg(Color::DarkGray)),
    ])
}

/// Build the status bar text
pub fn status_text(pending: bool, speaking: bool, scroll_offset: usize) -> String {
    let state = if pending {
        "thinking"
    } else if speaking {
        "speaking"
    } else {
        "ready"
    };
    let scroll = if scroll_offset > 0 {
        format!(" [^{scroll_offset} lines - PgDn to scroll]")
    } else {
        String::new()
    };
    format!(" {state} | Enter send | Ctrl+S speak | Ctrl+N new chat | Ctrl+L logout | Esc quit{scroll}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assistant(content: &str) -> Message {
        Message::new(MessageRole::Assistant, content.to_string())
    }

    fn user(content: &str) -> Message {
        Message::new(MessageRole::User, content.to_string())
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_assistant_message_gets_label_line() {
        let history = vec![assistant("Hello.")];
        let lines = conversation_lines(&history, None, false, 40);
        // Label, content, trailing blank
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[0]), "Cortex");
        assert_eq!(line_text(&lines[1]), "Hello.");
    }

    #[test]
    fn test_user_message_right_aligned() {
        let history = vec![user("hi")];
        let lines = conversation_lines(&history, None, false, 20);
        let text = line_text(&lines[0]);
        assert_eq!(text.len(), 20);
        assert!(text.ends_with("hi"));
    }

    #[test]
    fn test_long_content_wraps() {
        let history = vec![assistant(
            "one two three four five six seven eight nine ten",
        )];
        let lines = conversation_lines(&history, None, false, 12);
        // Label + several wrapped lines + blank
        assert!(lines.len() > 4);
        for line in &lines[1..lines.len() - 1] {
            assert!(line_text(line).width() <= 12);
        }
    }

    #[test]
    fn test_speaking_marker_only_on_active_message() {
        let first = assistant("one");
        let second = assistant("two");
        let speaking_id = second.id.clone();
        let history = vec![first, second];

        let lines = conversation_lines(&history, Some(&speaking_id), false, 40);
        let labels: Vec<String> = lines
            .iter()
            .map(line_text)
            .filter(|t| t.starts_with("Cortex"))
            .collect();
        assert_eq!(labels.len(), 2);
        assert!(!labels[0].contains(SPEAKING_MARKER));
        assert!(labels[1].contains(SPEAKING_MARKER));
    }

    #[test]
    fn test_pending_appends_thinking_indicator() {
        let history = vec![user("hello")];
        let lines = conversation_lines(&history, None, true, 40);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts.iter().any(|t| t == THINKING_INDICATOR));

        let lines = conversation_lines(&history, None, false, 40);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(!texts.iter().any(|t| t == THINKING_INDICATOR));
    }

    #[test]
    fn test_status_text_states() {
        assert!(status_text(true, false, 0).contains("thinking"));
        assert!(status_text(false, true, 0).contains("speaking"));
        assert!(status_text(false, false, 0).contains("ready"));
        assert!(status_text(false, false, 7).contains("^7 lines"));
    }

    #[test]
    fn test_input_line_shows_draft_and_cursor() {
        let line = input_line("hello");
        assert_eq!(line_text(&line), "You: hello_");
    }
}
