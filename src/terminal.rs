// SPDX-License-Identifier: GPL-3.0-only

//! Terminal session view
//!
//! Renders the live camera feed with Unicode half-block characters next to
//! the list of captured pages, and drives capture, delete, rename and export
//! from the keyboard.

use crate::backends::camera::{CameraFrame, CameraHandle, CameraStatus, FacingPreference};
use crate::constants::timing;
use crate::pipelines::document::DocumentPipeline;
use crate::pipelines::photo::PhotoEncoder;
use crate::session::CaptureSession;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Widget},
};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Everything the view needs besides the terminal
pub struct ViewOptions {
    pub facing: FacingPreference,
    pub encoder: PhotoEncoder,
    pub pipeline: DocumentPipeline,
    pub session: CaptureSession,
    pub open_after_export: bool,
}

/// Run the interactive session view until the user quits
pub fn run(options: ViewOptions) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal; a failed step must not leave the shell in raw mode
    enable_raw_mode()?;
    let mut stdout = stdout();
    or_undo(execute!(stdout, EnterAlternateScreen), disable_raw_mode)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = or_undo(Terminal::new(backend), || {
        let mut out = io::stdout();
        execute!(out, LeaveAlternateScreen)?;
        disable_raw_mode()
    })?;

    // Run the app
    let result = run_app(&mut terminal, options);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Pass `step` through, running `undo` first when it failed
fn or_undo<T>(step: io::Result<T>, undo: impl FnOnce() -> io::Result<()>) -> io::Result<T> {
    if step.is_err()
        && let Err(e) = undo()
    {
        warn!(error = %e, "Failed to restore terminal");
    }
    step
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    options: ViewOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let ViewOptions {
        facing,
        encoder,
        pipeline,
        session,
        open_after_export,
    } = options;

    let mut camera = CameraHandle::acquire(facing);
    let mut view = SessionView::new(session, open_after_export);

    loop {
        camera.poll();
        let status = camera.status();
        let frame = camera.stream().and_then(|s| s.latest_frame());

        terminal.draw(|f| draw(f, &view, &status, frame))?;

        // Handle input with timeout for frame updates
        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match view.handle_key(key, status.is_ready()) {
                ViewCommand::None => {}
                ViewCommand::Capture => {
                    let frame = camera.stream().and_then(|s| s.latest_frame());
                    view.capture(frame, &encoder);
                }
                ViewCommand::Export => {
                    if let Some(path) = view.export(&pipeline)
                        && view.open_after_export()
                    {
                        open_document(&path);
                    }
                }
                ViewCommand::Quit => break,
            }
        }
    }

    camera.release();
    Ok(())
}

fn open_document(path: &Path) {
    info!(path = %path.display(), "Opening exported document");
    if let Err(e) = open::that(path) {
        warn!(error = %e, "Failed to open document");
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    None,
    Capture,
    Export,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    /// Editing the output name; the buffer is committed on Enter
    EditingName(String),
}

/// Session state behind the terminal view
///
/// Owns the session. Key handling is separate from the camera and the
/// terminal so it can be driven directly.
pub struct SessionView {
    session: CaptureSession,
    selected: usize,
    mode: InputMode,
    open_after_export: bool,
    message: String,
}

impl SessionView {
    pub fn new(session: CaptureSession, open_after_export: bool) -> Self {
        Self {
            selected: session.len().saturating_sub(1),
            session,
            mode: InputMode::Normal,
            open_after_export,
            message: String::new(),
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Index of the highlighted frame, if there are any
    pub fn selected(&self) -> Option<usize> {
        (!self.session.is_empty()).then_some(self.selected)
    }

    pub fn is_editing_name(&self) -> bool {
        matches!(self.mode, InputMode::EditingName(_))
    }

    pub fn open_after_export(&self) -> bool {
        self.open_after_export
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Apply a key press
    ///
    /// Editing keys act on the view directly; capture and export need the
    /// camera or the filesystem and are handed back to the caller. Capture is
    /// only offered while the camera is ready and export only when there is
    /// something to export.
    pub fn handle_key(&mut self, key: KeyEvent, camera_ready: bool) -> ViewCommand {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return ViewCommand::Quit;
        }

        if let InputMode::EditingName(buffer) = &mut self.mode {
            match key.code {
                KeyCode::Enter => {
                    let name = std::mem::take(buffer);
                    self.session.set_output_name(name);
                    self.mode = InputMode::Normal;
                    self.message = format!("Name set to \"{}\"", self.session.output_name());
                }
                KeyCode::Esc => {
                    self.mode = InputMode::Normal;
                    self.message.clear();
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return ViewCommand::None;
        }

        match key.code {
            KeyCode::Char('q') => ViewCommand::Quit,
            KeyCode::Char(' ') | KeyCode::Char('p') if camera_ready => ViewCommand::Capture,
            KeyCode::Char('e') if !self.session.is_empty() => ViewCommand::Export,
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ViewCommand::None
            }
            KeyCode::Down => {
                if self.selected + 1 < self.session.len() {
                    self.selected += 1;
                }
                ViewCommand::None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                self.delete_selected();
                ViewCommand::None
            }
            KeyCode::Char('r') => {
                self.mode = InputMode::EditingName(self.session.output_name().to_string());
                ViewCommand::None
            }
            KeyCode::Char('o') => {
                self.open_after_export = !self.open_after_export;
                self.message = if self.open_after_export {
                    "Open after export: on".to_string()
                } else {
                    "Open after export: off".to_string()
                };
                ViewCommand::None
            }
            _ => ViewCommand::None,
        }
    }

    /// Append the current live frame to the session
    pub fn capture(&mut self, frame: Option<&CameraFrame>, encoder: &PhotoEncoder) {
        let Some(frame) = frame else {
            self.message = "No frame available yet".to_string();
            return;
        };
        match self.session.capture(frame, encoder) {
            Ok(count) => {
                self.selected = count - 1;
                self.message = format!("Captured page {}", count);
            }
            Err(e) => {
                error!(error = %e, "Capture failed");
                self.message = format!("Error: {}", e);
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(index) = self.selected() else {
            return;
        };
        match self.session.delete_frame(index) {
            Ok(_) => {
                self.selected = self.selected.min(self.session.len().saturating_sub(1));
                self.message = format!("Deleted page {}", index + 1);
            }
            Err(e) => {
                self.message = format!("Error: {}", e);
            }
        }
    }

    /// Export the session; returns the written path on success
    pub fn export(&mut self, pipeline: &DocumentPipeline) -> Option<PathBuf> {
        match pipeline.export(&self.session) {
            Ok(Some(path)) => {
                self.message = format!("Saved: {}", path.display());
                Some(path)
            }
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "Export failed");
                self.message = format!("Error: {}", e);
                None
            }
        }
    }

    fn key_hints(&self, camera_ready: bool) -> String {
        if self.is_editing_name() {
            return "Enter: save name | Esc: cancel".to_string();
        }
        let mut hints = Vec::new();
        if camera_ready {
            hints.push("p/Space: capture");
        }
        if !self.session.is_empty() {
            hints.push("↑/↓: select | d: delete | e: export");
        }
        hints.push("r: rename | o: open after export | q: quit");
        hints.join(" | ")
    }
}

fn draw(f: &mut Frame, view: &SessionView, status: &CameraStatus, frame: Option<&CameraFrame>) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(32)])
        .split(rows[0]);

    let preview = FrameWidget { frame, status };
    f.render_widget(&preview, columns[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(columns[1]);

    let (name, name_style) = match &view.mode {
        InputMode::EditingName(buffer) => (
            format!("{}_", buffer),
            Style::default().fg(Color::Yellow),
        ),
        InputMode::Normal => (view.session.output_name().to_string(), Style::default()),
    };
    let name_field = Paragraph::new(name)
        .style(name_style)
        .block(Block::default().borders(Borders::ALL).title(" Name "));
    f.render_widget(name_field, side[0]);

    let items: Vec<ListItem> = view
        .session
        .frames()
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            ListItem::new(format!(
                "{:>3}. {}x{} ({} KiB)",
                i + 1,
                frame.width(),
                frame.height(),
                frame.jpeg().len().div_ceil(1024)
            ))
        })
        .collect();
    let title = format!(" Pages ({}) ", view.session.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(view.selected());
    f.render_stateful_widget(list, side[1], &mut state);

    let status_line = if view.message.is_empty() {
        format!("Camera: {}", status)
    } else {
        format!("Camera: {} | {}", status, view.message)
    };
    f.render_widget(
        StatusBar {
            message: &status_line,
            background: Color::DarkGray,
        },
        rows[1],
    );

    let hints = view.key_hints(status.is_ready());
    f.render_widget(
        StatusBar {
            message: &hints,
            background: Color::Black,
        },
        rows[2],
    );
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    status: &'a CameraStatus,
}

impl Widget for &FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = match self.frame {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                // No frame yet - show the camera status instead
                let msg = match self.status {
                    CameraStatus::Ready => "Waiting for camera...".to_string(),
                    other => other.to_string(),
                };
                let width = msg.chars().count() as u16;
                let x = area.x + (area.width.saturating_sub(width)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_stringn(x, y, &msg, area.width as usize, Style::default());
                }
                return;
            }
        };

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Single-line status widget
struct StatusBar<'a> {
    message: &'a str,
    background: Color,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(self.background);

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(self.background);
            }
        }

        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CapturedFrame;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn view_with_frames(count: u8) -> SessionView {
        let mut session = CaptureSession::with_name("Report-2024-01-01");
        for tag in 0..count {
            session.push(CapturedFrame::from_encoded(4, 3, vec![tag]));
        }
        SessionView::new(session, false)
    }

    fn camera_frame() -> CameraFrame {
        CameraFrame::from_packed(8, 6, vec![200; 8 * 6 * 3])
    }

    #[test]
    fn test_failed_setup_step_is_undone() {
        let undone = std::cell::Cell::new(false);
        let result: io::Result<()> = or_undo(Err(io::Error::other("no tty")), || {
            undone.set(true);
            Ok(())
        });
        assert!(result.is_err());
        assert!(undone.get());

        let undone = std::cell::Cell::new(false);
        let result = or_undo(Ok(7), || {
            undone.set(true);
            Ok(())
        });
        assert_eq!(result.unwrap(), 7);
        assert!(!undone.get());
    }

    #[test]
    fn test_capture_only_when_ready() {
        let mut view = view_with_frames(0);
        assert_eq!(view.handle_key(key(KeyCode::Char('p')), false), ViewCommand::None);
        assert_eq!(view.handle_key(key(KeyCode::Char(' ')), true), ViewCommand::Capture);
        assert_eq!(view.handle_key(key(KeyCode::Char('p')), true), ViewCommand::Capture);
    }

    #[test]
    fn test_export_ignored_when_empty() {
        let mut view = view_with_frames(0);
        assert_eq!(view.handle_key(key(KeyCode::Char('e')), true), ViewCommand::None);

        let mut view = view_with_frames(1);
        assert_eq!(view.handle_key(key(KeyCode::Char('e')), true), ViewCommand::Export);
    }

    #[test]
    fn test_quit_keys() {
        let mut view = view_with_frames(0);
        assert_eq!(view.handle_key(key(KeyCode::Char('q')), false), ViewCommand::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(view.handle_key(ctrl_c, false), ViewCommand::Quit);
    }

    #[test]
    fn test_select_and_delete() {
        let mut view = view_with_frames(3);
        assert_eq!(view.selected(), Some(2));

        view.handle_key(key(KeyCode::Up), true);
        view.handle_key(key(KeyCode::Up), true);
        view.handle_key(key(KeyCode::Up), true);
        assert_eq!(view.selected(), Some(0));

        view.handle_key(key(KeyCode::Down), true);
        view.handle_key(key(KeyCode::Char('d')), true);
        let tags: Vec<u8> = view.session().frames().iter().map(|f| f.jpeg()[0]).collect();
        assert_eq!(tags, vec![0, 2]);
        assert_eq!(view.selected(), Some(1));

        // Deleting the last frame moves the cursor up
        view.handle_key(key(KeyCode::Delete), true);
        assert_eq!(view.selected(), Some(0));
        view.handle_key(key(KeyCode::Delete), true);
        assert_eq!(view.selected(), None);

        // Nothing left to delete
        view.handle_key(key(KeyCode::Char('d')), true);
        assert!(view.session().is_empty());
    }

    #[test]
    fn test_rename_commit_and_cancel() {
        let mut view = view_with_frames(0);

        view.handle_key(key(KeyCode::Char('r')), true);
        assert!(view.is_editing_name());
        for _ in 0.."Report-2024-01-01".len() {
            view.handle_key(key(KeyCode::Backspace), true);
        }
        for c in "Invoice".chars() {
            // Editing keys must not trigger commands
            assert_eq!(view.handle_key(key(KeyCode::Char(c)), true), ViewCommand::None);
        }
        view.handle_key(key(KeyCode::Enter), true);
        assert!(!view.is_editing_name());
        assert_eq!(view.session().output_name(), "Invoice");

        view.handle_key(key(KeyCode::Char('r')), true);
        view.handle_key(key(KeyCode::Char('x')), true);
        view.handle_key(key(KeyCode::Esc), true);
        assert_eq!(view.session().output_name(), "Invoice");
    }

    #[test]
    fn test_q_is_text_while_editing() {
        let mut view = view_with_frames(0);
        view.handle_key(key(KeyCode::Char('r')), true);
        assert_eq!(view.handle_key(key(KeyCode::Char('q')), true), ViewCommand::None);
        assert!(view.is_editing_name());
    }

    #[test]
    fn test_toggle_open_after_export() {
        let mut view = view_with_frames(0);
        assert!(!view.open_after_export());
        view.handle_key(key(KeyCode::Char('o')), true);
        assert!(view.open_after_export());
        view.handle_key(key(KeyCode::Char('o')), true);
        assert!(!view.open_after_export());
    }

    #[test]
    fn test_capture_selects_new_frame() {
        let mut view = view_with_frames(2);
        view.handle_key(key(KeyCode::Up), true);

        let frame = camera_frame();
        view.capture(Some(&frame), &PhotoEncoder::default());
        assert_eq!(view.session().len(), 3);
        assert_eq!(view.selected(), Some(2));

        view.capture(None, &PhotoEncoder::default());
        assert_eq!(view.session().len(), 3);
    }

    #[test]
    fn test_export_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = DocumentPipeline::new(Default::default(), dir.path(), "document");
        let mut view = view_with_frames(0);
        let frame = camera_frame();
        view.capture(Some(&frame), &PhotoEncoder::default());

        let path = view.export(&pipeline).unwrap();
        assert_eq!(path, dir.path().join("Report-2024-01-01.pdf"));
        assert!(path.exists());
        assert!(view.message().starts_with("Saved: "));
        // The session survives the export
        assert_eq!(view.session().len(), 1);
    }

    #[test]
    fn test_frame_widget_renders_half_blocks() {
        let frame = camera_frame();
        let status = CameraStatus::Ready;
        let widget = FrameWidget {
            frame: Some(&frame),
            status: &status,
        };
        let area = Rect::new(0, 0, 8, 3);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(200, 200, 200));
    }
}
