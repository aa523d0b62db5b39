// ==================== Imports ====================
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

mod browser;
pub mod config;
pub mod engine;
pub mod game;
pub mod sprite;

use config::GameConfig;
use engine::input::{self, InputListeners};
use engine::{BrowserAudio, CanvasRenderer, ImageSet, Renderer, RunningLoop};
use game::Dodge;

const CONFIG_PATH: &str = "config.json";

// ==================== Session ====================
/// Everything one run owns
/// - field order is drop order : loop stops first, then listeners go
struct Session {
    _game_loop: RunningLoop<Dodge>,
    _input: InputListeners,
}

impl Session {
    fn start(config: &GameConfig) -> Result<Self> {
        let images = ImageSet::load(&config.assets)?;
        let renderer = CanvasRenderer::new(images)?;
        let audio = BrowserAudio::new(&config.assets.hit_sound, config.assets.hit_volume)?;
        let (keyevent_receiver, listeners) = input::prepare_input()?;

        let game = Dodge::new(config.clone(), renderer.size());
        log::info!("Starting run on a {:?} surface", renderer.size());

        let game_loop = RunningLoop::start(
            game,
            Box::new(renderer),
            Box::new(audio),
            keyevent_receiver,
        )?;
        Ok(Session {
            _game_loop: game_loop,
            _input: listeners,
        })
    }
}

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs panic hook + console logger
/// - fetches config.json, defaults when missing or invalid
/// - wires the start button
#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    browser::init_logger(level).map_err(|err| JsValue::from_str(&format!("{:#}", err)))?;

    browser::spawn_local(async move {
        let config = load_config().await;
        if let Err(err) = wire_start_button(config) {
            log::error!("Could not wire start button : {:#?}", err);
        }
    });

    Ok(())
}

async fn load_config() -> GameConfig {
    let loaded = browser::fetch_json::<GameConfig>(CONFIG_PATH)
        .await
        .and_then(|config| config.validate().map(|()| config));
    match loaded {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Using default config, {} not usable : {:#}", CONFIG_PATH, err);
            GameConfig::default()
        }
    }
}

/// Every click starts a fresh run
/// - the previous run is dropped FIRST : its pending frame is cancelled and
///   its key listeners removed, so two loops never share the canvas
fn wire_start_button(config: GameConfig) -> Result<()> {
    let button = browser::start_button()?;
    let config = Rc::new(config);
    let session: Rc<RefCell<Option<Session>>> = Rc::new(RefCell::new(None));

    let focus_target = button.clone();
    let onclick = browser::closure_wrap(Box::new(move || {
        // keep arrow keys away from the button itself
        if let Err(err) = focus_target.blur() {
            log::warn!("Could not blur start button : {:#?}", err);
        }

        drop(session.borrow_mut().take());
        match Session::start(&config) {
            Ok(started) => *session.borrow_mut() = Some(started),
            Err(err) => log::error!("Could not start game : {:#?}", err),
        }
    }) as Box<dyn FnMut()>);

    button.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    // button lives as long as the page
    onclick.forget();
    Ok(())
}
