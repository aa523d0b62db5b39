use super::{Entity, Sprite};
use crate::engine::{ImageId, Point, Size};

pub struct Player {
    entity: Entity,
    bounds: Size,
}

impl Player {
    pub fn new(position: Point, size: Size, bounds: Size) -> Self {
        Player {
            entity: Entity::new(position, size, ImageId::Player),
            bounds,
        }
    }

    pub fn set_speed_x(&mut self, speed: f64) {
        let velocity = self.entity.velocity();
        self.entity.set_velocity(Point { x: speed, ..velocity });
    }

    pub fn set_speed_y(&mut self, speed: f64) {
        let velocity = self.entity.velocity();
        self.entity.set_velocity(Point { y: speed, ..velocity });
    }

    pub fn stop(&mut self) {
        self.entity.set_velocity(Point::default());
    }
}

impl Sprite for Player {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Clamp LAST tick's position into the surface, then move
    /// - a fast step can still end up to one velocity outside the surface,
    ///   the next tick pulls it back
    /// - plain ifs instead of f64::clamp : that panics when the sprite is
    ///   bigger than the surface, here the far edge simply wins
    fn update_position(&mut self) {
        let mut position = self.entity.position();
        let size = self.entity.size();
        let max_x = self.bounds.width - size.width;
        let max_y = self.bounds.height - size.height;

        if position.x <= 0.0 {
            position.x = 0.0;
        }
        if position.y <= 0.0 {
            position.y = 0.0;
        }
        if position.x >= max_x {
            position.x = max_x;
        }
        if position.y >= max_y {
            position.y = max_y;
        }

        self.entity.set_position(position);
        self.entity.translate();
    }
}
