use crate::engine::{Point, Size};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Tuning table for a run, read from `config.json`
/// - `#[serde(default)]` : any missing key keeps its default below
/// - defaults are the tuned values the game ships with
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_start: Point,
    pub player_size: Size,
    /// velocity set by an arrow key, per axis
    pub player_speed: f64,
    /// leftward scroll per tick
    pub background_speed: f64,
    pub obstacle_spawn_x: f64,
    /// leftward movement per tick
    pub obstacle_speed: f64,
    pub obstacle_size: Size,
    pub spawn_band: f64,
    pub spawn_offset: f64,
    /// ticks between two spawns
    pub spawn_interval: u64,
    /// drop obstacles once they are fully past the left edge
    pub evict_offscreen_obstacles: bool,
    pub show_hitboxes: bool,
    pub assets: AssetPaths,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            player_start: Point { x: 50.0, y: 300.0 },
            player_size: Size {
                width: 100.0,
                height: 100.0,
            },
            player_speed: 10.0,
            background_speed: 3.0,
            obstacle_spawn_x: 1200.0,
            obstacle_speed: 7.0,
            obstacle_size: Size {
                width: 100.0,
                height: 150.0,
            },
            spawn_band: 600.0,
            spawn_offset: 100.0,
            spawn_interval: 40,
            evict_offscreen_obstacles: true,
            show_hitboxes: cfg!(debug_assertions),
            assets: AssetPaths::default(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.spawn_interval > 0, "spawn_interval must be at least 1");
        for (name, size) in [
            ("player_size", &self.player_size),
            ("obstacle_size", &self.obstacle_size),
        ] {
            ensure!(
                size.width > 0.0 && size.height > 0.0,
                "{} must be positive, got {:?}",
                name,
                size
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetPaths {
    pub background_image: String,
    pub player_image: String,
    pub obstacle_image: String,
    pub hit_sound: String,
    pub hit_volume: f64,
}

impl Default for AssetPaths {
    fn default() -> Self {
        AssetPaths {
            background_image: "images/background.png".to_string(),
            player_image: "images/dog.png".to_string(),
            obstacle_image: "images/shampoo.png".to_string(),
            hit_sound: "sounds/bark.mp3".to_string(),
            hit_volume: 0.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_the_other_defaults() {
        let config: GameConfig = serde_json::from_str(
            r#"{ "spawn_interval": 20, "assets": { "hit_volume": 1.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.spawn_interval, 20);
        assert_eq!(config.assets.hit_volume, 1.0);
        assert_eq!(config.assets.hit_sound, "sounds/bark.mp3");
        assert_eq!(config.player_start, Point { x: 50.0, y: 300.0 });
        assert_eq!(config.obstacle_spawn_x, 1200.0);
    }

    #[test]
    fn zero_spawn_interval_is_rejected() {
        let config = GameConfig {
            spawn_interval: 0,
            ..GameConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spawn_interval"));
    }

    #[test]
    fn empty_obstacles_are_rejected() {
        let config = GameConfig {
            obstacle_size: Size {
                width: 0.0,
                height: 150.0,
            },
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
