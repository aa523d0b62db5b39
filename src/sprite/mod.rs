// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                        Sprite Module Layout                              │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ File              │ Movement rule on top of Entity                       │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ mod.rs            │ Entity (position, size, velocity, image) + collision │
// │ player.rs         │ clamped to the surface, then moved                   │
// │ background.rs     │ scrolls left, wraps, drawn twice                     │
// │ obstacle.rs       │ random spawn height, constant leftward speed         │
// └───────────────────┴──────────────────────────────────────────────────────┘
pub mod background;
pub mod obstacle;
pub mod player;

pub use background::Background;
pub use obstacle::Obstacle;
pub use player::Player;

use crate::engine::{ImageId, Point, Rect, Renderer, Size};

/// How far each edge of the SUBJECT is pulled inwards before overlap testing
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

// Tuned by hand, they set how forgiving a near miss feels
pub const HITBOX_INSETS: Insets = Insets {
    top: 25.0,
    right: 50.0,
    bottom: 5.0,
    left: 25.0,
};

/// Moving, drawable rectangle shared by every sprite
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    position: Point,
    size: Size,
    velocity: Point,
    image: ImageId,
}

impl Entity {
    pub fn new(position: Point, size: Size, image: ImageId) -> Self {
        Entity {
            position,
            size,
            velocity: Point::default(),
            image,
        }
    }

    pub fn with_velocity(mut self, velocity: Point) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    pub fn image(&self) -> ImageId {
        self.image
    }

    pub fn left(&self) -> f64 {
        self.position.x
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> f64 {
        self.position.y
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.height
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    /// The inset box `crash_with` tests when this entity is the subject
    pub fn hitbox(&self) -> Rect {
        Rect::new(
            Point {
                x: self.left() + HITBOX_INSETS.left,
                y: self.top() + HITBOX_INSETS.top,
            },
            Size {
                width: self.size.width - HITBOX_INSETS.left - HITBOX_INSETS.right,
                height: self.size.height - HITBOX_INSETS.top - HITBOX_INSETS.bottom,
            },
        )
    }

    /// Overlap test, `self` is the subject and `target` the obstacle
    /// - only the subject's edges are inset, so swapping the arguments can
    ///   change the answer
    /// - strict comparisons : edges exactly touching count as a hit
    pub fn crash_with(&self, target: &Entity) -> bool {
        !(self.bottom() - HITBOX_INSETS.bottom < target.top()
            || self.top() + HITBOX_INSETS.top > target.bottom()
            || self.right() - HITBOX_INSETS.right < target.left()
            || self.left() + HITBOX_INSETS.left > target.right())
    }

    /// Unbounded movement, the default rule
    pub fn translate(&mut self) {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        renderer.draw_image(self.image, &self.bounding_box());
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Point) {
        self.velocity = velocity;
    }
}

/// Per tick contract of everything on screen
pub trait Sprite {
    fn entity(&self) -> &Entity;

    fn update_position(&mut self);

    fn draw(&self, renderer: &dyn Renderer) {
        self.entity().draw(renderer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingRenderer;

    fn square(x: f64, y: f64) -> Entity {
        Entity::new(
            Point { x, y },
            Size {
                width: 100.0,
                height: 100.0,
            },
            ImageId::Player,
        )
    }

    #[test]
    fn edges_span_the_size() {
        let entity = Entity::new(
            Point { x: -12.5, y: 40.0 },
            Size {
                width: 75.0,
                height: 150.0,
            },
            ImageId::Obstacle,
        );
        assert_eq!(entity.right() - entity.left(), 75.0);
        assert_eq!(entity.bottom() - entity.top(), 150.0);
    }

    #[test]
    fn translate_adds_velocity_without_bounds() {
        let mut entity = square(0.0, 0.0).with_velocity(Point { x: -7.0, y: 2.5 });
        for _ in 0..10 {
            entity.translate();
        }
        assert_eq!(entity.position(), Point { x: -70.0, y: 25.0 });
        assert_eq!(entity.right() - entity.left(), 100.0);
    }

    #[test]
    fn draw_blits_the_bounding_box() {
        let renderer = RecordingRenderer::new(Size {
            width: 1200.0,
            height: 600.0,
        });
        let entity = square(5.0, 6.0);
        entity.draw(&renderer);
        assert_eq!(
            renderer.images(),
            vec![(ImageId::Player, entity.bounding_box())]
        );
    }

    #[test]
    fn hitbox_is_the_inset_box() {
        let hitbox = square(0.0, 0.0).hitbox();
        assert_eq!(hitbox.left(), 25.0);
        assert_eq!(hitbox.right(), 50.0);
        assert_eq!(hitbox.top(), 25.0);
        assert_eq!(hitbox.bottom(), 95.0);
    }

    #[test]
    fn far_apart_entities_do_not_crash() {
        assert!(!square(50.0, 300.0).crash_with(&square(1200.0, 300.0)));
    }

    #[test]
    fn crash_is_inclusive_at_every_inset_boundary() {
        let player = square(0.0, 0.0);

        // right edge : 100 - 50 touches left = 50
        assert!(player.crash_with(&square(50.0, 0.0)));
        assert!(!player.crash_with(&square(50.001, 0.0)));

        // left edge : 0 + 25 touches right = 25
        assert!(player.crash_with(&square(-75.0, 0.0)));
        assert!(!player.crash_with(&square(-75.001, 0.0)));

        // bottom edge : 100 - 5 touches top = 95
        assert!(player.crash_with(&square(0.0, 95.0)));
        assert!(!player.crash_with(&square(0.0, 95.001)));

        // top edge : 0 + 25 touches bottom = 25
        assert!(player.crash_with(&square(0.0, -75.0)));
        assert!(!player.crash_with(&square(0.0, -75.001)));
    }

    #[test]
    fn crash_depends_on_which_side_is_the_subject() {
        let player = square(0.0, 0.0);
        let obstacle = square(60.0, 0.0);

        // player's right edge is pulled in to 50, short of 60
        assert!(!player.crash_with(&obstacle));
        // obstacle's left edge is pushed to 85, still inside the player's 100
        assert!(obstacle.crash_with(&player));
    }
}
