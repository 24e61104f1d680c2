//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - ConversationSession for all conversation state
//! - Pure display helpers for rendering
//!
//! The App never talks to the backend itself: terminal events become
//! session calls, session events ([`SessionEvent`]) come back out of
//! `poll()`, and rendering reads the session's current state.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use cortex_core::{ChatList, ConversationSession, LayoutResizer, SessionEvent};

use crate::display;

/// Input box height (separator + text line) plus the status bar
const INPUT_HEIGHT: u16 = 2;

/// Sidebar width bounds in terminal columns
const SIDEBAR_INITIAL: u16 = 26;
const SIDEBAR_MIN: u16 = 20;
const SIDEBAR_MAX: u16 = 50;

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// Whether the user chose to log out (the caller clears credentials UI)
    logged_out: bool,

    /// The conversation session (history, pending query, speech)
    session: ConversationSession,
    /// Sidebar chat entries
    chats: ChatList,
    /// Selected sidebar entry
    selected_chat: usize,
    /// Sidebar resize tracking, in terminal columns
    resizer: LayoutResizer,

    /// Scroll offset (lines from bottom, 0 = latest)
    scroll_offset: usize,
    /// Total rendered lines (for scroll bounds)
    total_lines: usize,
    /// Terminal size
    size: (u16, u16),
}

impl App {
    /// Create a new App around an authenticated session
    pub fn new(session: ConversationSession) -> anyhow::Result<Self> {
        let size = crossterm::terminal::size()?;
        Ok(Self {
            running: true,
            logged_out: false,
            session,
            chats: ChatList::new(),
            selected_chat: 0,
            resizer: LayoutResizer::new(SIDEBAR_INITIAL, SIDEBAR_MIN, SIDEBAR_MAX),
            scroll_offset: 0,
            total_lines: 0,
            size,
        })
    }

    /// Whether the user exited via logout
    pub fn logged_out(&self) -> bool {
        self.logged_out
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // ~10 FPS is plenty for a chat transcript
        let frame_duration = Duration::from_millis(100);
        let mut event_stream = EventStream::new();

        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key);
                            }
                            Event::Mouse(mouse) => self.handle_mouse(mouse),
                            Event::Resize(w, h) => self.size = (w, h),
                            _ => {}
                        }
                    }
                }

                // Frame tick - drain session events and render
                () = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.process_session_events();
            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Drain pending events out of the session
    fn process_session_events(&mut self) {
        for event in self.session.poll() {
            match event {
                SessionEvent::ScrollToLatest => self.scroll_offset = 0,
                // Rendering reads the session directly; nothing cached here
                SessionEvent::PendingChanged { .. } | SessionEvent::SpeechChanged { .. } => {}
            }
        }
    }

    /// Handle keyboard input
    fn handle_key(&mut self, key: event::KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Quit
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),

            // Logout clears stored credentials and exits
            KeyCode::Char('l') if ctrl => {
                if let Err(error) = self.session.logout() {
                    tracing::warn!(%error, "Failed to clear stored credentials");
                }
                self.logged_out = true;
                self.running = false;
            }

            // Speak (or silence) the latest reply
            KeyCode::Char('s') if ctrl => {
                if let Some(id) = self.session.latest_assistant_message().map(|m| m.id.clone()) {
                    self.session.request_speech(&id);
                }
            }

            // Sidebar
            KeyCode::Char('n') if ctrl => {
                self.chats.add_chat();
                self.selected_chat = 0;
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(entry) = self.chats.entries().get(self.selected_chat) {
                    let id = entry.id;
                    self.chats.remove(id);
                    self.selected_chat = self
                        .selected_chat
                        .min(self.chats.len().saturating_sub(1));
                }
            }
            KeyCode::Up if ctrl => {
                self.selected_chat = self.selected_chat.saturating_sub(1);
            }
            KeyCode::Down if ctrl => {
                self.selected_chat =
                    (self.selected_chat + 1).min(self.chats.len().saturating_sub(1));
            }

            // Submit message
            KeyCode::Enter => self.session.submit(),

            // Typing
            KeyCode::Char(c) => self.session.push_draft(c),
            KeyCode::Backspace => self.session.backspace_draft(),

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = (self.conversation_height() / 2).max(1) as usize;
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + page).min(max_scroll);
            }
            KeyCode::PageDown => {
                let page = (self.conversation_height() / 2).max(1) as usize;
                self.scroll_offset = self.scroll_offset.saturating_sub(page);
            }
            KeyCode::Home if ctrl => {
                self.scroll_offset = self.total_lines.saturating_sub(1);
            }
            KeyCode::End if ctrl => {
                self.scroll_offset = 0;
            }

            _ => {}
        }
    }

    /// Handle mouse input
    fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                let max_scroll = self.total_lines.saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + 3).min(max_scroll);
            }
            MouseEventKind::ScrollDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(3);
            }

            // Sidebar divider drag
            MouseEventKind::Down(MouseButton::Left) => {
                if self.on_divider(mouse.column) {
                    self.resizer.begin_drag();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.resizer.pointer_move(mouse.column);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.resizer.end_drag();
            }

            _ => {}
        }
    }

    fn quit(&mut self) {
        self.session.shutdown();
        self.running = false;
    }

    /// Whether a pointer column sits on the sidebar divider
    fn on_divider(&self, column: u16) -> bool {
        column.abs_diff(self.sidebar_width()) <= 1
    }

    /// Effective sidebar width, never more than half the terminal
    fn sidebar_width(&self) -> u16 {
        self.resizer.width().min(self.size.0 / 2)
    }

    fn conversation_height(&self) -> u16 {
        self.size.1.saturating_sub(INPUT_HEIGHT + 1)
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let sidebar_width = self.sidebar_width();

        terminal.draw(|frame| {
            let area = frame.area();
            let [sidebar, divider, main] = Layout::horizontal([
                Constraint::Length(sidebar_width),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .areas(area);

            let [conversation, separator, input, status] = Layout::vertical([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(main);

            Self::render_sidebar(frame, sidebar, &self.chats, self.selected_chat);
            Self::render_divider(frame, divider, self.resizer.is_dragging());

            let text_width = conversation.width.saturating_sub(2) as usize;
            let lines = display::conversation_lines(
                self.session.history(),
                self.session.speaking_message(),
                self.session.pending(),
                text_width,
            );
            self.total_lines = lines.len();

            let height = conversation.height as usize;
            let max_scroll = self.total_lines.saturating_sub(height);
            if self.scroll_offset > max_scroll {
                self.scroll_offset = max_scroll;
            }
            let visible_end = self.total_lines.saturating_sub(self.scroll_offset);
            let visible_start = visible_end.saturating_sub(height);

            let visible: Vec<Line<'static>> = lines
                .into_iter()
                .skip(visible_start)
                .take(height)
                .collect();
            let inset = Rect {
                x: conversation.x + 1,
                width: conversation.width.saturating_sub(2),
                ..conversation
            };
            frame.render_widget(Paragraph::new(visible), inset);

            frame.render_widget(
                Paragraph::new("-".repeat(separator.width as usize))
                    .style(Style::default().fg(Color::DarkGray)),
                separator,
            );
            frame.render_widget(
                Paragraph::new(display::input_line(self.session.draft())),
                input,
            );
            frame.render_widget(
                Paragraph::new(display::status_text(
                    self.session.pending(),
                    self.session.speaking_message().is_some(),
                    self.scroll_offset,
                ))
                .style(Style::default().fg(Color::DarkGray)),
                status,
            );
        })?;

        Ok(())
    }

    fn render_sidebar(
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        chats: &ChatList,
        selected: usize,
    ) {
        let mut lines = vec![
            Line::styled(
                " Chats",
                Style::default()
                    .fg(display::CORTEX_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::default(),
        ];
        for (i, entry) in chats.entries().iter().enumerate() {
            let style = if i == selected {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Gray)
            };
            let name: String = entry
                .name
                .chars()
                .take((area.width as usize).saturating_sub(2))
                .collect();
            lines.push(Line::styled(format!(" {name}"), style));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_divider(frame: &mut ratatui::Frame<'_>, area: Rect, dragging: bool) {
        let style = if dragging {
            Style::default().fg(display::CORTEX_ACCENT)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let lines: Vec<Line<'static>> = (0..area.height).map(|_| Line::from("│")).collect();
        frame.render_widget(Paragraph::new(lines).style(style), area);
    }
}
