use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::pane::Pane;

/// Longest wait for terminal input between two loop iterations.
const EVENT_WAIT: Duration = Duration::from_millis(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// The terminal session: independent panes stacked top to bottom.
///
/// The loop is single-threaded; each pane brings its own capture thread and,
/// for the offloaded backend, its own worker.
pub struct App {
    pub state: AppState,
    panes: Vec<Pane>,
    areas: Vec<Rect>,
    started: Instant,
}

impl App {
    #[must_use]
    pub fn new(panes: Vec<Pane>) -> Self {
        Self {
            state: AppState::Running,
            areas: vec![Rect::default(); panes.len()],
            panes,
            started: Instant::now(),
        }
    }

    /// Main loop. Returns once a quit key is pressed.
    ///
    /// # Errors
    /// Returns an error if terminal operations fail.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let size = terminal.size()?;
        self.resize_to(size.width, size.height);
        self.start();

        while self.state == AppState::Running {
            if event::poll(EVENT_WAIT)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
            }

            let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
            if self.step(now_ms) {
                terminal.draw(|frame| self.render(frame.buffer_mut()))?;
            }
        }

        for pane in &mut self.panes {
            pane.dispose();
        }
        Ok(())
    }

    /// Rewind every clip.
    pub fn start(&mut self) {
        for pane in &mut self.panes {
            pane.start();
        }
    }

    /// Step every pane once. Returns `true` if any canvas changed.
    pub fn step(&mut self, now_ms: f64) -> bool {
        self.panes
            .iter_mut()
            .fold(false, |changed, pane| pane.step(now_ms) | changed)
    }

    /// The terminal now has `cols × rows` cells; split them between panes.
    pub fn resize_to(&mut self, cols: u16, rows: u16) {
        self.areas = split(Rect::new(0, 0, cols, rows), self.panes.len());
        for (pane, area) in self.panes.iter_mut().zip(&self.areas) {
            pane.resize_to(area.width, area.height);
        }
    }

    /// Copy every pane into its region of `buf`.
    pub fn render(&self, buf: &mut Buffer) {
        for (pane, &area) in self.panes.iter().zip(&self.areas) {
            pane.render(buf, area.intersection(buf.area));
        }
    }

    /// Dispatch one terminal event.
    pub fn handle_event(&mut self, event: &Event) {
        match *event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.state = AppState::Quitting,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    self.state = AppState::Quitting;
                }
                _ => {}
            },
            Event::Resize(cols, rows) => self.resize_to(cols, rows),
            Event::FocusGained => self.set_focused(true),
            Event::FocusLost => self.set_focused(false),
            _ => {}
        }
    }

    fn set_focused(&mut self, focused: bool) {
        for pane in &mut self.panes {
            pane.set_focused(focused);
        }
    }

    #[must_use]
    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }
}

/// Equal-height rows, one per pane.
fn split(area: Rect, count: usize) -> Vec<Rect> {
    Layout::vertical(vec![Constraint::Fill(1); count])
        .split(area)
        .to_vec()
}
