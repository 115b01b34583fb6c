use core::ops::Range;
use core::time::Duration;

use bevy::prelude::*;
use bits_helpers::{WINDOW_HEIGHT, WINDOW_WIDTH};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the honeycomb needs at least one row and one column, got {rows}x{cols}")]
    EmptyHoneycomb { rows: usize, cols: usize },

    #[error("a session needs at least one bee")]
    NoBees,

    #[error("{bees} bees cannot all fit into {holes} holes")]
    TooManyBees { bees: usize, holes: usize },

    #[error("the game must last at least one second")]
    ZeroDuration,

    #[error("disruption delay range {0:?} is empty")]
    EmptyDisruptionDelay(Range<Duration>),
}

/// Tunables for a session. `Default` is the regular 25 bee game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub bee_count: usize,
    pub honeycomb_rows: usize,
    pub honeycomb_cols: usize,
    /// Seconds on the countdown.
    pub game_duration: u32,
    /// A drop closer than this to a free hole's center is a match.
    pub drop_threshold: f32,
    pub disruption_delay: Range<Duration>,
    /// Delay before retrying a disruption that found no filled hole.
    pub disruption_retry: Duration,
    pub viewport: Vec2,
    /// Height kept free of spawning bees at the top of the screen, for the honeycomb.
    pub hive_margin: f32,
    /// Distance between neighbouring hole centers.
    pub hole_spacing: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bee_count: 25,
            honeycomb_rows: 5,
            honeycomb_cols: 5,
            game_duration: 180,
            drop_threshold: 50.0,
            disruption_delay: Duration::from_secs(10)..Duration::from_secs(25),
            disruption_retry: Duration::from_secs(5),
            viewport: Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            hive_margin: 300.0,
            hole_spacing: 60.0,
        }
    }
}

impl GameConfig {
    pub const fn hole_count(&self) -> usize {
        self.honeycomb_rows * self.honeycomb_cols
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.honeycomb_rows == 0 || self.honeycomb_cols == 0 {
            return Err(ConfigError::EmptyHoneycomb {
                rows: self.honeycomb_rows,
                cols: self.honeycomb_cols,
            });
        }
        if self.bee_count == 0 {
            return Err(ConfigError::NoBees);
        }
        if self.bee_count > self.hole_count() {
            return Err(ConfigError::TooManyBees {
                bees: self.bee_count,
                holes: self.hole_count(),
            });
        }
        if self.game_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.disruption_delay.is_empty() {
            return Err(ConfigError::EmptyDisruptionDelay(
                self.disruption_delay.clone(),
            ));
        }
        Ok(())
    }

    /// Where freshly spawned and flying bees may go.
    pub fn flight_area(&self) -> Rect {
        const EDGE: f32 = 50.0;
        let half = self.viewport * 0.5;
        let top = (half.y - self.hive_margin).max(-half.y + EDGE);
        Rect::new(-half.x + EDGE, -half.y + EDGE, half.x - EDGE, top)
    }

    /// Center of the first honeycomb row.
    pub fn hive_top(&self) -> Vec2 {
        Vec2::new(0.0, self.viewport.y * 0.5 - self.hole_spacing)
    }

    /// Resting place of the slingshot, bottom center.
    pub fn slingshot_rest(&self) -> Vec2 {
        Vec2::new(0.0, -self.viewport.y * 0.5 + 60.0)
    }

    /// Where the slingshot hides below the screen.
    pub fn slingshot_hidden(&self) -> Vec2 {
        self.slingshot_rest() - Vec2::new(0.0, 150.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_regular_game() {
        let config = GameConfig::default();
        assert_eq!(config.bee_count, 25, "25 bees");
        assert_eq!(config.hole_count(), 25, "5x5 honeycomb");
        assert_eq!(config.game_duration, 180, "three minutes");
        assert_eq!(config.validate(), Ok(()), "default config is valid");
    }

    #[test]
    fn rejects_unwinnable_or_empty_setups() {
        let config = GameConfig {
            honeycomb_cols: 0,
            ..default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyHoneycomb { rows: 5, cols: 0 }),
            "no columns"
        );

        let config = GameConfig {
            bee_count: 26,
            ..default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyBees {
                bees: 26,
                holes: 25
            }),
            "more bees than holes"
        );

        let config = GameConfig {
            bee_count: 0,
            ..default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoBees), "no bees");

        let config = GameConfig {
            game_duration: 0,
            ..default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration), "no time");

        let delay = Duration::from_secs(3)..Duration::from_secs(3);
        let config = GameConfig {
            disruption_delay: delay.clone(),
            ..default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyDisruptionDelay(delay)),
            "empty delay range"
        );
    }

    #[test]
    fn flight_area_stays_below_the_hive() {
        let config = GameConfig::default();
        let area = config.flight_area();
        assert!(
            area.max.y <= config.viewport.y * 0.5 - config.hive_margin,
            "bees must not spawn over the honeycomb"
        );
        assert!(area.min.x > -config.viewport.x * 0.5, "inside the screen");
        assert!(area.width() > 0.0 && area.height() > 0.0, "non empty area");
    }
}
