//! UI rendering
//!
//! Draws a [`Snapshot`] into a frame. Rendering reads nothing but the
//! snapshot.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{ComposerMode, Snapshot};
use libchirp::MAX_MESSAGE_CHARS;

const BANNER: &str = r"
 ██████╗██╗  ██╗██╗██████╗ ██████╗
██╔════╝██║  ██║██║██╔══██╗██╔══██╗
██║     ███████║██║██████╔╝██████╔╝
██║     ██╔══██║██║██╔══██╗██╔═══╝
╚██████╗██║  ██║██║██║  ██║██║
 ╚═════╝╚═╝  ╚═╝╚═╝╚═╝  ╚═╝╚═╝
";

const ACCENT: Color = Color::Rgb(0x3b, 0x82, 0xf6);

pub fn render(frame: &mut Frame, snapshot: &Snapshot) {
    let banner_height = BANNER.lines().count() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let banner = Paragraph::new(BANNER.trim_start_matches('\n'))
        .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));
    frame.render_widget(banner, chunks[0]);

    let (title, body) = match &snapshot.mode {
        ComposerMode::Idle => ("Compose", compose_lines(snapshot)),
        ComposerMode::Posting { .. } => ("Posting...", plain_lines(&snapshot.text)),
        ComposerMode::Posted { .. } => (
            "Posted!",
            vec![Line::from("Press any key for a new message, Esc to quit")],
        ),
        ComposerMode::Failed(_) => {
            let message = snapshot.error.clone().unwrap_or_default();
            let mut lines = plain_lines(&message);
            lines.push(Line::from(""));
            lines.push(Line::from("Press any key to start over, Esc to quit"));
            ("Error", lines)
        }
    };

    render_box(frame, box_area(chunks[1]), title, body);
    frame.render_widget(status_line(snapshot), chunks[2]);
}

/// Buffer text with a `|` marking the cursor
pub fn text_with_cursor(snapshot: &Snapshot) -> String {
    let mut text: Vec<char> = snapshot.text.chars().collect();
    let cursor = snapshot.cursor.min(text.len());
    text.insert(cursor, '|');
    text.into_iter().collect()
}

fn compose_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let mut lines = plain_lines(&text_with_cursor(snapshot));
    lines.push(Line::from(""));

    let mut footer = vec![Span::styled(
        format!("{}/{}", snapshot.char_count, MAX_MESSAGE_CHARS),
        Style::default().fg(Color::Gray),
    )];
    if snapshot.has_media {
        footer.push(Span::raw("  "));
        footer.push(Span::styled(
            "[image attached]",
            Style::default().fg(Color::Green),
        ));
    }
    lines.push(Line::from(footer));
    lines
}

fn plain_lines(text: &str) -> Vec<Line<'static>> {
    text.split('\n').map(|l| Line::from(l.to_string())).collect()
}

fn render_box(frame: &mut Frame, area: Rect, title: &str, body: Vec<Line<'static>>) {
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT));

    let paragraph = Paragraph::new(body).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn status_line(snapshot: &Snapshot) -> Paragraph<'static> {
    let hints = match snapshot.mode {
        ComposerMode::Idle => "Enter: post | Alt+Enter: newline | Ctrl+V: paste | Esc: quit",
        ComposerMode::Posting { .. } => "Posting... | Esc: quit",
        _ => "Any key: new message | Esc: quit",
    };
    Paragraph::new(hints).style(Style::default().fg(Color::DarkGray))
}

/// Box at most 64 columns wide, left aligned
fn box_area(area: Rect) -> Rect {
    Rect {
        width: area.width.min(64),
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use ratatui::{backend::TestBackend, Terminal};

    fn snapshot(text: &str, cursor: usize) -> Snapshot {
        Snapshot {
            text: text.to_string(),
            cursor,
            char_count: text.chars().count(),
            has_media: false,
            mode: ComposerMode::Idle,
            error: None,
        }
    }

    fn screen(snapshot: &Snapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(frame, snapshot)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_cursor_marker_position() {
        assert_eq!(text_with_cursor(&snapshot("hello", 5)), "hello|");
        assert_eq!(text_with_cursor(&snapshot("hello", 0)), "|hello");
        assert_eq!(text_with_cursor(&snapshot("héllo", 2)), "hé|llo");
    }

    #[test]
    fn test_idle_screen_shows_counter() {
        let rendered = screen(&snapshot("hello", 5));
        assert!(rendered.contains("hello|"));
        assert!(rendered.contains("5/280"));
        assert!(!rendered.contains("[image attached]"));
    }

    #[test]
    fn test_media_indicator() {
        let mut snap = snapshot("look", 4);
        snap.has_media = true;
        assert!(screen(&snap).contains("[image attached]"));
    }

    #[test]
    fn test_error_screen_shows_message() {
        let mut state = AppState::new();
        state.mode = ComposerMode::Failed(libchirp::PostError::MissingCredentials);
        let rendered = screen(&state.snapshot());
        assert!(rendered.contains("No credentials found."));
    }
}
