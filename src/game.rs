use crate::config::GameConfig;
use crate::engine::input::KeyPress;
use crate::engine::{
    Audio, DebugDraw, Game, Point, Rect, Renderer, Size, SoundId, Status, TextStyle,
};
use crate::sprite::{Background, Obstacle, Player, Sprite};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// TABLE
/// ┌──────────────────────── One tick of Dodge ──────────────────────────────┐
/// │                                                                         │
/// │  1. clear surface                                                       │
/// │  2. background : update_position() -> draw()                            │
/// │  3. player     : update_position() -> draw()                            │
/// │  4. obstacles  : update_position() -> draw(), frames += 1               │
/// │                  every `spawn_interval` frames spawn one, score += 1    │
/// │  5. score text                                                          │
/// │  6. player.crash_with(any obstacle) ?                                   │
/// │       no  -> Running                                                    │
/// │       yes -> hit sound, game over overlay -> GameOver (terminal)        │
/// └─────────────────────────────────────────────────────────────────────────┘
pub struct Dodge {
    config: GameConfig,
    surface: Size,
    background: Background,
    player: Player,
    obstacles: Vec<Obstacle>,
    frames: u64,
    score: u32,
    status: Status,
    rng: StdRng,
}

const FONT_FILL: &str = "black";
const SCORE_STYLE: TextStyle = TextStyle {
    font: "30px Verdana",
    fill_style: FONT_FILL,
};
const GAME_OVER_STYLE: TextStyle = TextStyle {
    font: "60px Verdana",
    fill_style: FONT_FILL,
};
const SCORE_POSITION: Point = Point { x: 80.0, y: 40.0 };
const GAME_OVER_POSITION: Point = Point { x: 400.0, y: 100.0 };
const FINAL_SCORE_POSITION: Point = Point { x: 435.0, y: 150.0 };

impl Dodge {
    pub fn new(config: GameConfig, surface: Size) -> Self {
        Self::with_rng(config, surface, StdRng::from_entropy())
    }

    pub fn with_rng(config: GameConfig, surface: Size, rng: StdRng) -> Self {
        Dodge {
            background: Background::new(surface, config.background_speed),
            player: Player::new(config.player_start, config.player_size, surface),
            obstacles: Vec::new(),
            frames: 0,
            score: 0,
            status: Status::Running,
            surface,
            config,
            rng,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn update_obstacles(&mut self, renderer: &dyn Renderer) {
        self.frames += 1;

        for obstacle in self.obstacles.iter_mut() {
            obstacle.update_position();
            obstacle.draw(renderer);
        }

        if self.config.evict_offscreen_obstacles {
            self.obstacles.retain(|obstacle| !obstacle.is_offscreen());
        }

        if self.frames % self.config.spawn_interval == 0 {
            let obstacle = Obstacle::spawn(&mut self.rng, &self.config);
            log::debug!(
                "Spawned obstacle at y = {} (frame {})",
                obstacle.entity().top(),
                self.frames
            );
            self.obstacles.push(obstacle);
            self.score += 1;
        }
    }

    fn draw_hitboxes(&self, renderer: &dyn Renderer) {
        self.player.entity().hitbox().draw_debug(renderer);
        for obstacle in &self.obstacles {
            obstacle.entity().bounding_box().draw_debug(renderer);
        }
    }

    fn draw_score(&self, renderer: &dyn Renderer) {
        renderer.draw_text(
            &format!("Score: {}", self.score),
            &SCORE_POSITION,
            &SCORE_STYLE,
        );
    }

    fn crashed(&self) -> bool {
        let player = self.player.entity();
        self.obstacles
            .iter()
            .any(|obstacle| player.crash_with(obstacle.entity()))
    }

    fn draw_game_over(&self, renderer: &dyn Renderer) {
        renderer.draw_text("Game Over!", &GAME_OVER_POSITION, &GAME_OVER_STYLE);
        renderer.draw_text(
            &format!("Your Final Score: {}", self.score),
            &FINAL_SCORE_POSITION,
            &SCORE_STYLE,
        );
    }
}

impl Game for Dodge {
    /// Arrow keys set one velocity axis each, the last one pressed wins
    /// Releasing ANY key stops both axes
    fn handle_key(&mut self, press: &KeyPress) {
        if self.status == Status::GameOver {
            return;
        }
        let speed = self.config.player_speed;
        match press {
            KeyPress::KeyDown(code) => match code.as_str() {
                "ArrowLeft" => self.player.set_speed_x(-speed),
                "ArrowRight" => self.player.set_speed_x(speed),
                "ArrowUp" => self.player.set_speed_y(-speed),
                "ArrowDown" => self.player.set_speed_y(speed),
                _ => {}
            },
            KeyPress::KeyUp(_) => self.player.stop(),
        }
    }

    fn tick(&mut self, renderer: &dyn Renderer, audio: &dyn Audio) -> Status {
        if self.status == Status::GameOver {
            return self.status;
        }

        renderer.clear(&Rect::new(Point::default(), self.surface));

        // Draw order matters : background -> player -> obstacles -> text
        self.background.update_position();
        self.background.draw(renderer);

        self.player.update_position();
        self.player.draw(renderer);

        self.update_obstacles(renderer);

        if self.config.show_hitboxes {
            self.draw_hitboxes(renderer);
        }

        self.draw_score(renderer);

        if self.crashed() {
            audio.play(SoundId::Hit);
            self.draw_game_over(renderer);
            self.status = Status::GameOver;
            log::info!(
                "Game over after {} frames, final score {}",
                self.frames,
                self.score
            );
        }

        self.status
    }
}
