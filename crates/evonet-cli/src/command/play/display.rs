use evonet_env::{CartPole, EpisodeStatus};
use ratatui::{
    prelude::{Buffer, Rect},
    style::Color,
    text::Line,
    widgets::{
        Block, Widget,
        canvas::{Canvas, Line as CanvasLine, Rectangle},
    },
};

const CART_WIDTH: f64 = 0.5;
const CART_HEIGHT: f64 = 0.3;
/// Share of the track shown beyond the failure threshold on each side.
const TRACK_MARGIN: f64 = 0.2;

/// Side view of the cart on its track with the pole standing on it.
#[derive(Debug)]
pub struct CartPoleDisplay<'a> {
    env: &'a CartPole,
    total_reward: f64,
    paused: bool,
}

impl<'a> CartPoleDisplay<'a> {
    pub fn new(env: &'a CartPole, total_reward: f64) -> Self {
        Self {
            env,
            total_reward,
            paused: false,
        }
    }

    pub fn paused(self, paused: bool) -> Self {
        Self { paused, ..self }
    }

    fn border_color(&self) -> Color {
        match self.env.status() {
            EpisodeStatus::Failed => Color::Red,
            EpisodeStatus::TimeUp => Color::Green,
            EpisodeStatus::NotStarted | EpisodeStatus::Running if self.paused => Color::Yellow,
            EpisodeStatus::NotStarted | EpisodeStatus::Running => Color::White,
        }
    }
}

impl Widget for CartPoleDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &CartPoleDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let config = self.env.config();
        let state = self.env.state();
        let x_bound = config.x_threshold * (1.0 + TRACK_MARGIN);
        let pole_length = 2.0 * config.pole_half_length;

        let title = format!(
            "CART-POLE  step {}  reward {:.0}",
            self.env.steps(),
            self.total_reward
        );
        let stats = format!(
            "x {:+.3}  x' {:+.3}  theta {:+.3}  theta' {:+.3}",
            state.x, state.x_dot, state.theta, state.theta_dot
        );
        let block = Block::bordered()
            .title(Line::from(title).centered())
            .title_bottom(Line::from(stats).centered())
            .border_style(self.border_color());

        let (sin_theta, cos_theta) = state.theta.sin_cos();
        let pivot = (state.x, CART_HEIGHT);
        let tip = (
            pivot.0 + pole_length * sin_theta,
            pivot.1 + pole_length * cos_theta,
        );

        Canvas::default()
            .block(block)
            .x_bounds([-x_bound, x_bound])
            .y_bounds([-0.2, pole_length + CART_HEIGHT + 0.2])
            .paint(|ctx| {
                ctx.draw(&CanvasLine::new(-x_bound, 0.0, x_bound, 0.0, Color::DarkGray));
                for limit in [-config.x_threshold, config.x_threshold] {
                    ctx.draw(&CanvasLine::new(limit, 0.0, limit, CART_HEIGHT, Color::Red));
                }
                ctx.draw(&Rectangle {
                    x: state.x - CART_WIDTH / 2.0,
                    y: 0.0,
                    width: CART_WIDTH,
                    height: CART_HEIGHT,
                    color: Color::Cyan,
                });
                ctx.draw(&CanvasLine::new(pivot.0, pivot.1, tip.0, tip.1, Color::Yellow));
            })
            .render(area, buf);
    }
}
