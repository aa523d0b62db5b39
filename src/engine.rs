use crate::browser::{self, LoopClosure};
use crate::config::AssetPaths;
use self::input::KeyPress;
use anyhow::{anyhow, Context, Result};
use futures::channel::mpsc::UnboundedReceiver;
use serde::{Deserialize, Serialize};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlImageElement};

/// TABLE
/// ┌──────────────────────── Engine Collaborators ───────────────────────────┐
/// │                                                                         │
/// │   browser.rs (DOM)          engine.rs (traits)          game.rs         │
/// │  ┌───────────────┐        ┌────────────────┐        ┌──────────────┐    │
/// │  │ rAF / cancel  ├───────►│ Scheduler      │        │              │    │
/// │  │ canvas 2d ctx ├───────►│ Renderer       ├───────►│    Dodge     │    │
/// │  │ <audio>       ├───────►│ Audio          ├───────►│    tick()    │    │
/// │  │ keydown/keyup ├───────►│ KeyPress chan  ├───────►│ handle_key() │    │
/// │  └───────────────┘        └────────────────┘        └──────────────┘    │
/// │                                                                         │
/// │  GameLoop glues these together, and tests swap the left column for      │
/// │  recording doubles so no browser is needed.                             │
/// └─────────────────────────────────────────────────────────────────────────┘
pub trait Game {
    fn handle_key(&mut self, press: &KeyPress);
    fn tick(&mut self, renderer: &dyn Renderer, audio: &dyn Audio) -> Status;
}

/// Two state machine driving the loop
/// - Running  : keep requesting frames
/// - GameOver : terminal, nothing is scheduled anymore
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Running,
    GameOver,
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
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
}

// ==================== Rendering ====================
/// Opaque handle to a preloaded image, resolved by the renderer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageId {
    Background,
    Player,
    Obstacle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SoundId {
    Hit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub font: &'static str,
    pub fill_style: &'static str,
}

pub trait Renderer {
    fn size(&self) -> Size;
    fn clear(&self, rect: &Rect);
    fn draw_image(&self, image: ImageId, destination: &Rect);
    fn draw_text(&self, text: &str, position: &Point, style: &TextStyle);
    fn stroke_rect(&self, rect: &Rect);
}

pub trait DebugDraw {
    fn draw_debug(&self, renderer: &dyn Renderer);
}

impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &dyn Renderer) {
        renderer.stroke_rect(self);
    }
}

/// The three sprite images, created fire-and-forget
/// - no readiness gating : an image that hasn't arrived yet draws as a no-op
pub struct ImageSet {
    background: HtmlImageElement,
    player: HtmlImageElement,
    obstacle: HtmlImageElement,
}

impl ImageSet {
    pub fn load(paths: &AssetPaths) -> Result<Self> {
        Ok(ImageSet {
            background: browser::load_image(&paths.background_image)?,
            player: browser::load_image(&paths.player_image)?,
            obstacle: browser::load_image(&paths.obstacle_image)?,
        })
    }

    fn get(&self, image: ImageId) -> &HtmlImageElement {
        match image {
            ImageId::Background => &self.background,
            ImageId::Player => &self.player,
            ImageId::Obstacle => &self.obstacle,
        }
    }
}

pub struct CanvasRenderer {
    context: CanvasRenderingContext2d,
    size: Size,
    images: ImageSet,
}

impl CanvasRenderer {
    pub fn new(images: ImageSet) -> Result<Self> {
        let canvas = browser::canvas()?;
        let size = Size {
            width: canvas.width().into(),
            height: canvas.height().into(),
        };
        Ok(CanvasRenderer {
            context: browser::context()?,
            size,
            images,
        })
    }
}

impl Renderer for CanvasRenderer {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    fn draw_image(&self, image: ImageId, destination: &Rect) {
        // a broken image throws, a still loading one is silently skipped
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(
                self.images.get(image),
                destination.position.x,
                destination.position.y,
                destination.size.width,
                destination.size.height,
            )
        {
            log::debug!("Could not draw {:?} : {:#?}", image, err);
        }
    }

    #[allow(deprecated)]
    fn draw_text(&self, text: &str, position: &Point, style: &TextStyle) {
        self.context.set_font(style.font);
        self.context
            .set_fill_style(&JsValue::from_str(style.fill_style));
        if let Err(err) = self.context.fill_text(text, position.x, position.y) {
            log::warn!("Could not draw text '{}' : {:#?}", text, err);
        }
    }

    #[allow(deprecated)]
    fn stroke_rect(&self, rect: &Rect) {
        self.context.set_stroke_style(&JsValue::from_str("#FF0000"));
        self.context.stroke_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }
}

// ==================== Audio ====================
pub trait Audio {
    fn play(&self, sound: SoundId);
}

pub struct BrowserAudio {
    hit: HtmlAudioElement,
}

impl BrowserAudio {
    pub fn new(source: &str, volume: f64) -> Result<Self> {
        let hit = browser::new_audio(source)
            .with_context(|| format!("Failed to create hit sound from : {}", source))?;
        hit.set_volume(volume);
        Ok(BrowserAudio { hit })
    }
}

impl Audio for BrowserAudio {
    fn play(&self, sound: SoundId) {
        let element = match sound {
            SoundId::Hit => &self.hit,
        };
        element.set_current_time(0.0);
        match element.play() {
            // play() resolves later, rejections (autoplay policy, missing
            // file) would otherwise surface as uncaught promise errors
            Ok(promise) => browser::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    log::warn!("Could not play {:?} : {:#?}", sound, err);
                }
            }),
            Err(err) => log::warn!("Could not play {:?} : {:#?}", sound, err),
        }
    }
}

// ==================== Scheduling ====================
/// Handle returned by a frame request, needed to cancel it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

pub trait Scheduler {
    fn request_frame(&mut self) -> Result<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<()>;
}

type SharedLoopClosure = Rc<RefCell<Option<LoopClosure>>>;

/// requestAnimationFrame backed scheduler
/// - holds the loop closure WEAKLY, RunningLoop owns it
/// - otherwise closure -> GameLoop -> scheduler -> closure is an Rc cycle
///   and a finished run would never be freed
pub struct BrowserScheduler {
    closure: Weak<RefCell<Option<LoopClosure>>>,
}

impl Scheduler for BrowserScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle> {
        let slot = self
            .closure
            .upgrade()
            .ok_or_else(|| anyhow!("GameLoop: Loop closure was dropped"))?;
        let closure = slot.borrow();
        let callback = closure
            .as_ref()
            .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?;
        let handle = browser::request_animation_frame(callback)?;
        Ok(FrameHandle(handle))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<()> {
        browser::cancel_animation_frame(handle.0)
    }
}

// ==================== Game Loop ====================
/// One tick per scheduled frame, no fixed timestep accumulation
///
/// ┌──────────────────── frame() ────────────────────┐
/// │ 1. drain queued KeyPress events -> handle_key() │
/// │ 2. game.tick()                  -> Status       │
/// │ 3. Running  -> request next frame               │
/// │    GameOver -> nothing pending, loop is done    │
/// └─────────────────────────────────────────────────┘
pub struct GameLoop<G, S> {
    game: G,
    scheduler: S,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn Audio>,
    keyevent_receiver: UnboundedReceiver<KeyPress>,
    pending: Option<FrameHandle>,
    status: Status,
}

impl<G: Game, S: Scheduler> GameLoop<G, S> {
    pub fn new(
        game: G,
        scheduler: S,
        renderer: Box<dyn Renderer>,
        audio: Box<dyn Audio>,
        keyevent_receiver: UnboundedReceiver<KeyPress>,
    ) -> Self {
        GameLoop {
            game,
            scheduler,
            renderer,
            audio,
            keyevent_receiver,
            pending: None,
            status: Status::Running,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.status == Status::Running && self.pending.is_none() {
            self.pending = Some(self.scheduler.request_frame()?);
        }
        Ok(())
    }

    /// Body of the frame callback
    pub fn frame(&mut self) -> Result<Status> {
        // the callback running right now is the one that was pending
        self.pending = None;
        if self.status == Status::GameOver {
            return Ok(self.status);
        }

        self.process_input();
        self.status = self
            .game
            .tick(self.renderer.as_ref(), self.audio.as_ref());

        match self.status {
            Status::Running => self.pending = Some(self.scheduler.request_frame()?),
            // no frame will drain the queue again, refuse further key events
            Status::GameOver => self.keyevent_receiver.close(),
        }
        Ok(self.status)
    }

    /// Cancel the pending continuation, if any
    pub fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle)?;
        }
        Ok(())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    fn process_input(&mut self) {
        // try_next() :
        // - Ok(Some(press)) -> an event is queued
        // - Ok(None)        -> every sender is gone
        // - Err(_)          -> nothing queued right now
        while let Ok(Some(press)) = self.keyevent_receiver.try_next() {
            self.game.handle_key(&press);
        }
    }
}

/// A GameLoop wired to requestAnimationFrame
/// - dropping it cancels the pending frame and frees the loop closure
pub struct RunningLoop<G: Game + 'static> {
    game_loop: Rc<RefCell<GameLoop<G, BrowserScheduler>>>,
    _closure: SharedLoopClosure,
}

impl<G: Game + 'static> RunningLoop<G> {
    pub fn start(
        game: G,
        renderer: Box<dyn Renderer>,
        audio: Box<dyn Audio>,
        keyevent_receiver: UnboundedReceiver<KeyPress>,
    ) -> Result<Self> {
        let closure: SharedLoopClosure = Rc::new(RefCell::new(None));
        let scheduler = BrowserScheduler {
            closure: Rc::downgrade(&closure),
        };
        let game_loop = Rc::new(RefCell::new(GameLoop::new(
            game,
            scheduler,
            renderer,
            audio,
            keyevent_receiver,
        )));

        let frame_loop = game_loop.clone();
        *closure.borrow_mut() = Some(browser::create_raf_closure(move |_timestamp: f64| {
            match frame_loop.borrow_mut().frame() {
                Ok(Status::GameOver) => log::info!("Game loop halted"),
                Ok(Status::Running) => {}
                Err(err) => log::error!("GameLoop frame failed : {:#?}", err),
            }
        }));

        game_loop.borrow_mut().start()?;
        Ok(RunningLoop {
            game_loop,
            _closure: closure,
        })
    }
}

impl<G: Game + 'static> Drop for RunningLoop<G> {
    fn drop(&mut self) {
        if let Err(err) = self.game_loop.borrow_mut().stop() {
            log::warn!("Could not cancel pending frame : {:#?}", err);
        }
    }
}

// ==================== Input ====================
pub mod input {
    use crate::browser;
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, KeyboardEvent};

    /// Raw key event, carries the DOM `code` ("ArrowLeft", ...)
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum KeyPress {
        KeyDown(String),
        KeyUp(String),
    }

    type KeyClosure = Closure<dyn FnMut(KeyboardEvent)>;

    /// Document key listeners for a single run, removed on drop
    pub struct InputListeners {
        document: Document,
        onkeydown: KeyClosure,
        onkeyup: KeyClosure,
    }

    impl Drop for InputListeners {
        fn drop(&mut self) {
            for (event, listener) in [("keydown", &self.onkeydown), ("keyup", &self.onkeyup)] {
                if let Err(err) = self
                    .document
                    .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
                {
                    log::warn!("Could not remove {} listener : {:#?}", event, err);
                }
            }
        }
    }

    /// DOM key events -> unbounded channel -> GameLoop::process_input()
    pub fn prepare_input() -> Result<(UnboundedReceiver<KeyPress>, InputListeners)> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            // receiver is gone once the run is torn down, nothing to do then
            let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(event.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(event.code()));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let document = browser::document()?;
        document
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not add keydown listener : {:#?}", err))?;
        document
            .add_event_listener_with_callback("keyup", onkeyup.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not add keyup listener : {:#?}", err))?;

        Ok((
            keyevent_receiver,
            InputListeners {
                document,
                onkeydown,
                onkeyup,
            },
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::input::KeyPress;
    use super::testing::*;
    use super::*;
    use futures::channel::mpsc::unbounded;

    /// Ends after `lifetime` ticks and remembers the keys it saw
    struct CountdownGame {
        lifetime: u32,
        ticks: u32,
        keys: Vec<(u32, KeyPress)>,
    }

    impl CountdownGame {
        fn new(lifetime: u32) -> Self {
            CountdownGame {
                lifetime,
                ticks: 0,
                keys: Vec::new(),
            }
        }
    }

    impl Game for CountdownGame {
        fn handle_key(&mut self, press: &KeyPress) {
            self.keys.push((self.ticks, press.clone()));
        }

        fn tick(&mut self, renderer: &dyn Renderer, audio: &dyn Audio) -> Status {
            self.ticks += 1;
            renderer.clear(&Rect::new(Point::default(), renderer.size()));
            if self.ticks >= self.lifetime {
                audio.play(SoundId::Hit);
                Status::GameOver
            } else {
                Status::Running
            }
        }
    }

    fn new_loop(
        lifetime: u32,
    ) -> (
        GameLoop<CountdownGame, ManualScheduler>,
        ManualScheduler,
        RecordingAudio,
        futures::channel::mpsc::UnboundedSender<KeyPress>,
    ) {
        let scheduler = ManualScheduler::default();
        let audio = RecordingAudio::default();
        let (sender, receiver) = unbounded();
        let renderer = RecordingRenderer::new(Size {
            width: 1200.0,
            height: 600.0,
        });
        let game_loop = GameLoop::new(
            CountdownGame::new(lifetime),
            scheduler.clone(),
            Box::new(renderer),
            Box::new(audio.clone()),
            receiver,
        );
        (game_loop, scheduler, audio, sender)
    }

    #[test]
    fn rect_edges_follow_position_and_size() {
        let rect = Rect::new(
            Point { x: 10.0, y: 20.0 },
            Size {
                width: 30.0,
                height: 40.0,
            },
        );
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.bottom(), 60.0);
    }

    #[test]
    fn start_requests_exactly_one_frame() {
        let (mut game_loop, scheduler, _, _) = new_loop(10);
        game_loop.start().unwrap();
        game_loop.start().unwrap();
        assert_eq!(scheduler.requested.borrow().len(), 1);
        assert!(game_loop.is_scheduled());
    }

    #[test]
    fn running_frames_reschedule_themselves() {
        let (mut game_loop, scheduler, _, _) = new_loop(10);
        game_loop.start().unwrap();
        for _ in 0..3 {
            assert_eq!(game_loop.frame().unwrap(), Status::Running);
        }
        assert_eq!(scheduler.requested.borrow().len(), 4);
        assert!(game_loop.is_scheduled());
    }

    #[test]
    fn game_over_stops_scheduling() {
        let (mut game_loop, scheduler, audio, _) = new_loop(2);
        game_loop.start().unwrap();
        assert_eq!(game_loop.frame().unwrap(), Status::Running);
        assert_eq!(game_loop.frame().unwrap(), Status::GameOver);
        assert!(!game_loop.is_scheduled());
        assert_eq!(scheduler.requested.borrow().len(), 2);
        assert_eq!(*audio.played.borrow(), vec![SoundId::Hit]);

        // a stray callback after the end does nothing
        assert_eq!(game_loop.frame().unwrap(), Status::GameOver);
        assert_eq!(game_loop.game().ticks, 2);
        assert_eq!(audio.played.borrow().len(), 1);
    }

    #[test]
    fn stop_cancels_the_pending_frame() {
        let (mut game_loop, scheduler, _, _) = new_loop(10);
        game_loop.start().unwrap();
        game_loop.frame().unwrap();
        game_loop.stop().unwrap();
        assert_eq!(*scheduler.cancelled.borrow(), vec![FrameHandle(2)]);
        assert!(!game_loop.is_scheduled());

        game_loop.stop().unwrap();
        assert_eq!(scheduler.cancelled.borrow().len(), 1);
    }

    #[test]
    fn queued_keys_reach_the_game_before_the_next_tick() {
        let (mut game_loop, _, _, sender) = new_loop(10);
        game_loop.start().unwrap();
        game_loop.frame().unwrap();

        sender
            .unbounded_send(KeyPress::KeyDown("ArrowUp".into()))
            .unwrap();
        sender
            .unbounded_send(KeyPress::KeyUp("ArrowUp".into()))
            .unwrap();
        game_loop.frame().unwrap();

        assert_eq!(
            game_loop.game().keys,
            vec![
                (1, KeyPress::KeyDown("ArrowUp".into())),
                (1, KeyPress::KeyUp("ArrowUp".into())),
            ]
        );
    }

    #[test]
    fn closed_input_channel_does_not_stall_the_loop() {
        let (mut game_loop, _, _, sender) = new_loop(10);
        drop(sender);
        game_loop.start().unwrap();
        assert_eq!(game_loop.frame().unwrap(), Status::Running);
    }

    #[test]
    fn key_events_are_refused_after_game_over() {
        let (mut game_loop, _, _, sender) = new_loop(1);
        game_loop.start().unwrap();
        assert_eq!(game_loop.frame().unwrap(), Status::GameOver);

        assert!(sender.is_closed());
        for _ in 0..100 {
            assert!(sender
                .unbounded_send(KeyPress::KeyDown("ArrowLeft".into()))
                .is_err());
        }
        assert!(game_loop.game().keys.is_empty());
    }
}
