use super::{Entity, Sprite};
use crate::engine::{ImageId, Point, Rect, Renderer, Size};

/// Endless scroller
///
/// ┌──────── surface ────────┐
/// ┌──── copy 1 ────┬──── copy 2 ────┐
/// x                x + surface width
///
/// x always stays in (-surface width, 0], so the two copies cover the
/// whole surface at every tick
pub struct Background {
    entity: Entity,
    surface_width: f64,
}

impl Background {
    pub fn new(surface: Size, speed: f64) -> Self {
        Background {
            entity: Entity::new(Point::default(), surface, ImageId::Background)
                .with_velocity(Point { x: -speed, y: 0.0 }),
            surface_width: surface.width,
        }
    }
}

/// `%` on f64 keeps the sign of the dividend, so a leftward scroll already
/// lands in (-width, 0]; anything that ends up right of 0 is shifted one
/// width back
/// - a remainder smaller than half an ulp of `width` rounds to exactly
///   `-width` once shifted, that lands on 0 instead
fn wrap(x: f64, width: f64) -> f64 {
    let wrapped = x % width;
    if wrapped <= 0.0 {
        return wrapped;
    }
    let shifted = wrapped - width;
    if shifted <= -width {
        0.0
    } else {
        shifted
    }
}

impl Sprite for Background {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn update_position(&mut self) {
        let position = self.entity.position();
        let x = wrap(position.x + self.entity.velocity().x, self.surface_width);
        self.entity.set_position(Point { x, ..position });
    }

    fn draw(&self, renderer: &dyn Renderer) {
        let image = self.entity.image();
        let first = self.entity.bounding_box();
        let second = Rect::new(
            Point {
                x: first.position.x + self.surface_width,
                ..first.position
            },
            first.size,
        );
        renderer.draw_image(image, &first);
        renderer.draw_image(image, &second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::RecordingRenderer;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SURFACE: Size = Size {
        width: 1200.0,
        height: 600.0,
    };

    #[test]
    fn scrolls_left_by_its_speed() {
        let mut background = Background::new(SURFACE, 3.0);
        background.update_position();
        assert_eq!(background.entity().left(), -3.0);
        background.update_position();
        assert_eq!(background.entity().left(), -6.0);
    }

    #[test]
    fn wraps_after_one_full_width() {
        let mut background = Background::new(SURFACE, 3.0);
        for _ in 0..400 {
            background.update_position();
        }
        assert_relative_eq!(background.entity().left(), 0.0);
        background.update_position();
        assert_relative_eq!(background.entity().left(), -3.0);
    }

    #[test]
    fn draws_two_copies_one_width_apart() {
        let renderer = RecordingRenderer::new(SURFACE);
        let mut background = Background::new(SURFACE, 3.0);
        background.update_position();
        background.draw(&renderer);

        let images = renderer.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].0, ImageId::Background);
        assert_eq!(images[0].1.left(), -3.0);
        assert_eq!(images[1].1.left(), 1197.0);
        assert_eq!(images[1].1.size, SURFACE);
    }

    #[test]
    fn tiny_rightward_drift_stays_in_wrap_range() {
        for speed in [-1e-14, -1e-300, -f64::MIN_POSITIVE] {
            let mut background = Background::new(SURFACE, speed);
            background.update_position();
            let x = background.entity().left();
            assert!(x > -SURFACE.width && x <= 0.0, "x = {} out of range", x);
        }
    }

    #[test]
    fn stays_in_wrap_range_for_any_speed_and_start() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let speed = rng.gen_range(-2_500.0..2_500.0);
            let mut background = Background::new(SURFACE, speed);
            let start = rng.gen_range(-5_000.0..5_000.0);
            background
                .entity
                .set_position(Point { x: start, y: 0.0 });

            for _ in 0..100 {
                background.update_position();
                let x = background.entity().left();
                assert!(x > -SURFACE.width && x <= 0.0, "x = {} out of range", x);
            }
        }
    }
}
