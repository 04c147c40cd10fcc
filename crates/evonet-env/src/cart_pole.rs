//! The cart-pole balancing task.
//!
//! A pole is hinged on a cart that moves along a frictionless track. Every step the
//! agent pushes the cart left or right with a fixed force, and earns a reward of 1 for
//! each step the pole stays upright and the cart stays on the track.
//!
//! # Dynamics
//!
//! The equations of motion are integrated with explicit Euler steps of
//! [`CartPoleConfig::tau`] seconds:
//!
//! ```text
//! temp   = (F + m_p·l·θ̇²·sin θ) / (m_c + m_p)
//! θ̈      = (g·sin θ − cos θ·temp) / (l·(4/3 − m_p·cos²θ / (m_c + m_p)))
//! ẍ      = temp − m_p·l·θ̈·cos θ / (m_c + m_p)
//! ```
//!
//! where `l` is half the pole length.
//!
//! # Termination
//!
//! The episode is over when `|x|` exceeds [`CartPoleConfig::x_threshold`], when `|θ|`
//! exceeds [`CartPoleConfig::theta_threshold`], or when
//! [`CartPoleConfig::max_episode_steps`] steps have been taken. The step that ends the
//! episode is still rewarded; any step after that yields nothing.

use std::f64::consts::PI;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{Environment, Transition};

/// Physical constants and episode bounds of the cart-pole task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleConfig {
    pub gravity: f64,
    pub cart_mass: f64,
    pub pole_mass: f64,
    /// Half of the pole's length.
    pub pole_half_length: f64,
    pub force_mag: f64,
    /// Seconds between state updates.
    pub tau: f64,
    /// Cart position beyond which the episode fails.
    pub x_threshold: f64,
    /// Pole angle (radians) beyond which the episode fails.
    pub theta_threshold: f64,
    /// Episode is cut off after this many steps. `None` lets it run until failure.
    pub max_episode_steps: Option<usize>,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            pole_half_length: 0.5,
            force_mag: 10.0,
            tau: 0.02,
            x_threshold: 2.4,
            theta_threshold: 12.0 * 2.0 * PI / 360.0,
            max_episode_steps: Some(500),
        }
    }
}

/// Initial state components are drawn uniformly from `-INITIAL_STATE_BOUND..=INITIAL_STATE_BOUND`.
pub const INITIAL_STATE_BOUND: f64 = 0.05;

pub const PUSH_LEFT: usize = 0;
pub const PUSH_RIGHT: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CartPoleState {
    /// Cart position.
    pub x: f64,
    pub x_dot: f64,
    /// Pole angle from vertical, in radians.
    pub theta: f64,
    pub theta_dot: f64,
}

impl CartPoleState {
    #[must_use]
    pub fn observation(&self) -> Vec<f64> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum EpisodeStatus {
    NotStarted,
    Running,
    /// The pole fell or the cart left the track.
    Failed,
    /// The step cap of the episode was reached.
    TimeUp,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CartPoleError {
    #[display("invalid action {action}: cart-pole accepts 0 (left) or 1 (right)")]
    InvalidAction { action: usize },
    #[display("cart-pole stepped before the first reset")]
    NotReset,
}

/// The cart-pole environment.
///
/// Each instance owns its random generator, so two instances created with the same
/// seed produce the same initial states.
///
/// ```
/// use evonet_env::{CartPole, CartPoleConfig, Environment as _, PUSH_RIGHT};
///
/// let mut env = CartPole::new(CartPoleConfig::default(), 7);
/// let observation = env.reset().unwrap();
/// assert_eq!(observation.len(), 4);
///
/// let transition = env.step(PUSH_RIGHT).unwrap();
/// assert_eq!(transition.reward, 1.0);
/// assert!(!transition.done);
/// ```
#[derive(Debug, Clone)]
pub struct CartPole {
    config: CartPoleConfig,
    rng: Pcg32,
    state: CartPoleState,
    status: EpisodeStatus,
    steps: usize,
}

impl CartPole {
    #[must_use]
    pub fn new(config: CartPoleConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(config: CartPoleConfig, rng: Pcg32) -> Self {
        Self {
            config,
            rng,
            state: CartPoleState::default(),
            status: EpisodeStatus::NotStarted,
            steps: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> CartPoleState {
        self.state
    }

    #[must_use]
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Steps taken since the last reset.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn integrate(&mut self, force: f64) {
        let CartPoleConfig {
            gravity,
            cart_mass,
            pole_mass,
            pole_half_length,
            tau,
            ..
        } = self.config;
        let CartPoleState {
            x,
            x_dot,
            theta,
            theta_dot,
        } = self.state;

        let total_mass = cart_mass + pole_mass;
        let pole_mass_length = pole_mass * pole_half_length;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let temp = (force + pole_mass_length * theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (gravity * sin_theta - cos_theta * temp)
            / (pole_half_length * (4.0 / 3.0 - pole_mass * cos_theta.powi(2) / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        self.state = CartPoleState {
            x: x + tau * x_dot,
            x_dot: x_dot + tau * x_acc,
            theta: theta + tau * theta_dot,
            theta_dot: theta_dot + tau * theta_acc,
        };
    }

    fn is_out_of_bounds(&self) -> bool {
        self.state.x.abs() > self.config.x_threshold
            || self.state.theta.abs() > self.config.theta_threshold
    }
}

impl Environment for CartPole {
    type Error = CartPoleError;

    fn observation_len(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Vec<f64>, Self::Error> {
        let bound = INITIAL_STATE_BOUND;
        let mut sample = || self.rng.random_range(-bound..=bound);
        self.state = CartPoleState {
            x: sample(),
            x_dot: sample(),
            theta: sample(),
            theta_dot: sample(),
        };
        self.status = EpisodeStatus::Running;
        self.steps = 0;
        Ok(self.state.observation())
    }

    fn step(&mut self, action: usize) -> Result<Transition, Self::Error> {
        let force = match action {
            PUSH_LEFT => -self.config.force_mag,
            PUSH_RIGHT => self.config.force_mag,
            _ => return Err(CartPoleError::InvalidAction { action }),
        };
        if self.status.is_not_started() {
            return Err(CartPoleError::NotReset);
        }

        let was_running = self.status.is_running();
        self.integrate(force);
        self.steps += 1;

        if was_running {
            if self.is_out_of_bounds() {
                self.status = EpisodeStatus::Failed;
            } else if self
                .config
                .max_episode_steps
                .is_some_and(|max| self.steps >= max)
            {
                self.status = EpisodeStatus::TimeUp;
            }
        }

        Ok(Transition {
            observation: self.state.observation(),
            reward: if was_running { 1.0 } else { 0.0 },
            done: !self.status.is_running(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upright(config: CartPoleConfig) -> CartPole {
        let mut env = CartPole::new(config, 0);
        env.reset().unwrap();
        env.state = CartPoleState::default();
        env
    }

    #[test]
    fn test_reset_draws_small_initial_state() {
        let mut env = CartPole::new(CartPoleConfig::default(), 1);
        for _ in 0..20 {
            let observation = env.reset().unwrap();
            assert_eq!(observation.len(), env.observation_len());
            assert!(observation.iter().all(|v| v.abs() <= INITIAL_STATE_BOUND));
        }
    }

    #[test]
    fn test_same_seed_same_episode() {
        let mut a = CartPole::new(CartPoleConfig::default(), 99);
        let mut b = CartPole::new(CartPoleConfig::default(), 99);
        assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        for action in [0, 1, 1, 0, 1] {
            assert_eq!(a.step(action).unwrap(), b.step(action).unwrap());
        }
    }

    #[test]
    fn test_push_right_accelerates_cart_right() {
        let mut env = upright(CartPoleConfig::default());
        env.step(PUSH_RIGHT).unwrap();
        let state = env.state();
        // position lags velocity by one Euler step
        assert_eq!(state.x, 0.0);
        assert!(state.x_dot > 0.0);
        // the pole tips the other way
        assert!(state.theta_dot < 0.0);
    }

    #[test]
    fn test_single_step_matches_reference_values() {
        let mut env = upright(CartPoleConfig::default());
        env.step(PUSH_RIGHT).unwrap();
        let state = env.state();
        // temp = 10 / 1.1, theta_acc = -temp / (0.5 * (4/3 - 0.1/1.1))
        let temp = 10.0 / 1.1;
        let theta_acc = -temp / (0.5 * (4.0 / 3.0 - 0.1 / 1.1));
        let x_acc = temp - 0.05 * theta_acc / 1.1;
        assert!((state.theta_dot - 0.02 * theta_acc).abs() < 1e-12);
        assert!((state.x_dot - 0.02 * x_acc).abs() < 1e-12);
    }

    #[test]
    fn test_constant_push_fails_and_stops_rewarding() {
        let mut env = CartPole::new(CartPoleConfig::default(), 3);
        env.reset().unwrap();
        let mut rewarded = 0;
        let mut transition = env.step(PUSH_LEFT).unwrap();
        rewarded += 1;
        while !transition.done {
            transition = env.step(PUSH_LEFT).unwrap();
            rewarded += 1;
        }
        assert!(env.status().is_failed());
        assert!(rewarded < 100);

        let after = env.step(PUSH_LEFT).unwrap();
        assert_eq!(after.reward, 0.0);
        assert!(after.done);
    }

    #[test]
    fn test_time_limit() {
        let config = CartPoleConfig {
            max_episode_steps: Some(3),
            ..CartPoleConfig::default()
        };
        let mut env = upright(config);
        // alternating pushes keep a centered pole upright for a few steps
        assert!(!env.step(PUSH_LEFT).unwrap().done);
        assert!(!env.step(PUSH_RIGHT).unwrap().done);
        let last = env.step(PUSH_LEFT).unwrap();
        assert!(last.done);
        assert_eq!(last.reward, 1.0);
        assert!(env.status().is_time_up());
    }

    #[test]
    fn test_invalid_action() {
        let mut env = upright(CartPoleConfig::default());
        assert_eq!(
            env.step(2).unwrap_err(),
            CartPoleError::InvalidAction { action: 2 }
        );
    }

    #[test]
    fn test_step_before_reset() {
        let mut env = CartPole::new(CartPoleConfig::default(), 0);
        assert_eq!(env.step(PUSH_LEFT).unwrap_err(), CartPoleError::NotReset);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: CartPoleConfig =
            serde_json::from_str(r#"{"max_episode_steps": null}"#).unwrap();
        assert_eq!(config.max_episode_steps, None);
        assert_eq!(config.force_mag, 10.0);
    }
}
