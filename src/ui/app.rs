//! Main application state and UI rendering
//!
//! Manages the TUI application lifecycle, keyboard control of the strips
//! and rendering.

use std::cell::Cell;
use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::config::Config;
use crate::ipc::{BALANCE_STEP, VOLUME_STEP_DB};
use crate::mixer::Mixer;
use crate::routing::RoutingBackend;

use super::widgets::StripView;

/// Target frame rate
const TARGET_FPS: u64 = 30;

/// Narrowest strip drawn
const MIN_STRIP_WIDTH: u16 = 12;

/// Main application state
pub struct App<B> {
    /// Strips and their routing backend
    mixer: Mixer<B>,

    /// Strip under the cursor
    cursor: usize,

    /// Set by strip change notifications
    modified: Rc<Cell<bool>>,

    /// Last message shown in the help bar
    status: Option<String>,

    /// Whether the app should quit
    should_quit: bool,

    /// Last frame time
    last_frame: Instant,

    /// Configuration (for saving gains on exit)
    config: Config,
}

impl<B: RoutingBackend> App<B> {
    /// Create a new application over an already running backend
    pub fn new(config: Config, backend: B) -> Result<Self> {
        let mut mixer = Mixer::from_config(&config, backend)?;

        let modified = Rc::new(Cell::new(false));
        for id in 0..mixer.strips().len() {
            let flag = Rc::clone(&modified);
            mixer.subscribe(id, move |change| {
                log::trace!(
                    "Strip {} {} -> {:.2}",
                    change.strip,
                    change.attribute.name(),
                    change.value
                );
                flag.set(true);
            });
        }

        Ok(Self {
            mixer,
            cursor: 0,
            modified,
            status: None,
            should_quit: false,
            last_frame: Instant::now(),
            config,
        })
    }

    /// Run the main application loop, handing the backend back on exit
    pub fn run(mut self) -> Result<B> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.save_gains();

        result.map(|_| self.mixer.into_backend())
    }

    /// Store the backend gains and the strip links in the config file
    fn save_gains(&mut self) {
        if !self.modified.get() {
            return;
        }
        self.config.update_gains(self.mixer.backend().routes());
        self.config.update_links(self.mixer.links());
        match self.config.save() {
            Ok(()) => log::info!("Saved {} route gains", self.config.gains.len()),
            Err(e) => log::warn!("Failed to save config: {:#}", e),
        }
    }

    /// Main event loop
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let frame_duration = Duration::from_millis(1000 / TARGET_FPS);

        while !self.should_quit {
            self.mixer.backend_mut().flush();
            terminal.draw(|f| self.render(f))?;

            let timeout = frame_duration.saturating_sub(self.last_frame.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            self.last_frame = Instant::now();
        }

        Ok(())
    }

    /// Handle keyboard input
    fn handle_key(&mut self, code: KeyCode) {
        let strips = self.mixer.strips().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left => self.cursor = (self.cursor + strips - 1) % strips,
            KeyCode::Right => self.cursor = (self.cursor + 1) % strips,
            KeyCode::Up => {
                self.mixer.adjust_volume(self.cursor, VOLUME_STEP_DB);
            }
            KeyCode::Down => {
                self.mixer.adjust_volume(self.cursor, -VOLUME_STEP_DB);
            }
            KeyCode::Char(',') => {
                self.mixer.adjust_balance(self.cursor, -BALANCE_STEP);
            }
            KeyCode::Char('.') => {
                self.mixer.adjust_balance(self.cursor, BALANCE_STEP);
            }
            KeyCode::Char('c') => {
                self.mixer.set_balance(self.cursor, 0.0);
            }
            KeyCode::Char('0') => {
                self.mixer.set_volume(self.cursor, 0.0);
            }
            KeyCode::Char(' ') => {
                self.mixer.toggle_selected(self.cursor);
            }
            KeyCode::Char('l') => self.link_selected(),
            KeyCode::Char('u') => {
                if self.mixer.unlink(self.cursor).is_some() {
                    self.modified.set(true);
                    self.status = Some(format!("Unlinked {}", self.strip_name(self.cursor)));
                }
            }
            _ => {}
        }
    }

    /// Make every selected strip follow the strip under the cursor
    fn link_selected(&mut self) {
        let master = self.cursor;
        let mut linked = 0;
        for slave in self.mixer.selected() {
            if slave == master {
                continue;
            }
            match self.mixer.link(master, slave) {
                Ok(()) => {
                    self.modified.set(true);
                    linked += 1;
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    self.status = Some(e.to_string());
                    return;
                }
            }
        }
        self.mixer.clear_selection();
        self.status = Some(format!(
            "{} strip(s) follow {}",
            linked,
            self.strip_name(master)
        ));
    }

    fn strip_name(&self, id: usize) -> &str {
        self.mixer.strip(id).map(|s| s.name()).unwrap_or("?")
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(10),   // Strips
                Constraint::Length(2), // Help
            ])
            .split(frame.area());

        self.render_title(frame, chunks[0]);
        self.render_strips(frame, chunks[1]);
        self.render_help(frame, chunks[2]);
    }

    /// Render the title bar
    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let modified = if self.modified.get() { " [modified]" } else { "" };
        let title = format!(" jackstrip - {}{} ", self.config.client_name, modified);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);
        frame.render_widget(block, area);
    }

    /// Render all strips side by side
    fn render_strips(&self, frame: &mut Frame, area: Rect) {
        let strips = self.mixer.strips();
        if strips.is_empty() {
            return;
        }

        let strip_width = (area.width / strips.len() as u16).max(MIN_STRIP_WIDTH);
        let constraints: Vec<Constraint> = strips
            .iter()
            .map(|_| Constraint::Length(strip_width))
            .collect();
        let strip_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (strip, rect) in strips.iter().zip(strip_chunks.iter()) {
            let id = strip.id();
            let master = self.mixer.master_of(id).map(|m| self.strip_name(m));
            let gains = strip.route_gains(self.mixer.backend());
            let view = StripView::new(strip, gains)
                .focused(id == self.cursor)
                .marked(self.mixer.is_selected(id))
                .master(master);
            frame.render_widget(view, *rect);
        }
    }

    /// Render the help bar
    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
        let help = Line::from(vec![
            key("←/→"),
            Span::raw(" Sel "),
            key("↑/↓"),
            Span::raw(" Vol "),
            key(",/."),
            Span::raw(" Bal "),
            key("c"),
            Span::raw(" Center "),
            key("0"),
            Span::raw(" 0dB "),
            key("Space"),
            Span::raw(" Mark "),
            key("l"),
            Span::raw(" Link "),
            key("u"),
            Span::raw(" Unlink "),
            key("q"),
            Span::raw(" Quit"),
        ]);

        let mut lines = vec![help];
        if let Some(ref status) = self.status {
            lines.push(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(
            Paragraph::new(lines).style(Style::default().fg(Color::Gray)),
            area,
        );
    }
}
