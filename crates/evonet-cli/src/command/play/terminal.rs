use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, KeyCode};
use evonet_env::{CartPole, CartPoleError, EpisodeSummary, Environment, Transition};
use ratatui::{
    DefaultTerminal,
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Text,
};

use super::display::CartPoleDisplay;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub(crate) enum PlayError {
    #[display("{_0}")]
    CartPole(CartPoleError),
    #[display("terminal I/O failed: {_0}")]
    Io(io::Error),
    #[display("playback aborted")]
    Aborted,
}

impl From<CartPoleError> for PlayError {
    fn from(e: CartPoleError) -> Self {
        Self::CartPole(e)
    }
}

impl From<io::Error> for PlayError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A cart-pole that draws itself on the terminal, one frame per step.
///
/// Rendering paces the episode: each frame stays on screen for `frame_time`, during
/// which keys are handled. `q`/`Esc` aborts and space pauses.
pub(crate) struct TerminalCartPole<'a> {
    inner: CartPole,
    terminal: &'a mut DefaultTerminal,
    frame_time: Duration,
    paused: bool,
    total_reward: f64,
}

impl<'a> TerminalCartPole<'a> {
    pub(crate) fn new(
        inner: CartPole,
        terminal: &'a mut DefaultTerminal,
        frame_time: Duration,
    ) -> Self {
        Self {
            inner,
            terminal,
            frame_time,
            paused: false,
            total_reward: 0.0,
        }
    }

    /// Draws the last state with the episode result until the caller moves on.
    pub(crate) fn finish(&mut self, summary: &EpisodeSummary) -> Result<(), PlayError> {
        let help = if summary.finished {
            "Episode over | any key (Quit)"
        } else {
            "Step limit reached | any key (Quit)"
        };
        self.draw(help)
    }

    fn draw(&mut self, help: &str) -> Result<(), PlayError> {
        let display = CartPoleDisplay::new(&self.inner, self.total_reward).paused(self.paused);
        let help = Text::from(help)
            .style(Style::default().fg(Color::DarkGray))
            .centered();
        self.terminal.draw(|frame| {
            let [main_area, help_area] =
                Layout::vertical([Constraint::Min(10), Constraint::Length(1)])
                    .areas::<2>(frame.area());
            frame.render_widget(display, main_area);
            frame.render_widget(help, help_area);
        })?;
        Ok(())
    }

    fn help_text(&self) -> &'static str {
        if self.paused {
            "Controls: space (Resume) | q (Quit)"
        } else {
            "Controls: space (Pause) | q (Quit)"
        }
    }

    /// Handles keys until the frame deadline passes and playback is not paused.
    fn wait_frame(&mut self) -> Result<(), PlayError> {
        let deadline = Instant::now() + self.frame_time;
        loop {
            let timeout = if self.paused {
                self.frame_time
            } else {
                deadline.saturating_duration_since(Instant::now())
            };
            if !self.paused && timeout.is_zero() {
                return Ok(());
            }
            if !event::poll(timeout)? {
                continue;
            }
            if let Some(key) = event::read()?.as_key_event() {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Err(PlayError::Aborted),
                    KeyCode::Char(' ') => {
                        self.paused = !self.paused;
                        self.draw(self.help_text())?;
                    }
                    _ => {}
                }
            }
        }
    }
}

impl Environment for TerminalCartPole<'_> {
    type Error = PlayError;

    fn observation_len(&self) -> usize {
        self.inner.observation_len()
    }

    fn action_count(&self) -> usize {
        self.inner.action_count()
    }

    fn reset(&mut self) -> Result<Vec<f64>, Self::Error> {
        self.total_reward = 0.0;
        Ok(self.inner.reset()?)
    }

    fn step(&mut self, action: usize) -> Result<Transition, Self::Error> {
        let transition = self.inner.step(action)?;
        self.total_reward += transition.reward;
        Ok(transition)
    }

    fn render(&mut self) -> Result<(), Self::Error> {
        self.draw(self.help_text())?;
        self.wait_frame()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(self.inner.close()?)
    }
}
