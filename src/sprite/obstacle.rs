use super::{Entity, Sprite};
use crate::config::GameConfig;
use crate::engine::{ImageId, Point, Size};
use rand::Rng;

pub struct Obstacle {
    entity: Entity,
}

impl Obstacle {
    pub fn new(position: Point, size: Size, speed: f64) -> Self {
        Obstacle {
            entity: Entity::new(position, size, ImageId::Obstacle)
                .with_velocity(Point { x: -speed, y: 0.0 }),
        }
    }

    /// New obstacle just past the right edge
    /// - y = floor(random * band - offset - height) + height
    /// - kept as is, the odd shape of the formula is part of the tuning
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> Self {
        let size = config.obstacle_size;
        let roll: f64 = rng.gen();
        let y = (roll * config.spawn_band - config.spawn_offset - size.height).floor() + size.height;
        Obstacle::new(
            Point {
                x: config.obstacle_spawn_x,
                y,
            },
            size,
            config.obstacle_speed,
        )
    }

    /// Fully past the left edge, it can never be seen or hit again
    pub fn is_offscreen(&self) -> bool {
        self.entity.right() < 0.0
    }
}

impl Sprite for Obstacle {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn update_position(&mut self) {
        self.entity.translate();
    }
}
