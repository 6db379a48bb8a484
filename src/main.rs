//! Marble Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop. The web
//! build drives the simulation from requestAnimationFrame and mirrors state
//! into DOM HUD elements; rendering attaches separately via the handles the
//! chunk manager exposes. The native build runs a headless deterministic
//! session, useful for profiling and tuning.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use marble_rush::settings::{ControlScheme, GameMode, Settings};
    use marble_rush::sim::{ControlMode, TickInput, World, theme, tick};

    /// Game instance holding all state
    struct Game {
        world: World,
        settings: Settings,
        paused: bool,
        /// True while a frame callback chain is scheduled. Guards resume
        /// paths against starting a second concurrent chain while the
        /// pre-pause callback is still pending.
        loop_running: bool,
        last_time: f64,
        input: TickInput,
        steer_left: bool,
        steer_right: bool,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            Self {
                world: build_world(seed, &settings),
                settings,
                paused: false,
                loop_running: true,
                last_time: 0.0,
                input: TickInput::default(),
                steer_left: false,
                steer_right: false,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run one frame of simulation
        fn update(&mut self, dt: f32, time: f64) {
            self.input.lateral =
                (self.steer_right as i32 as f32) - (self.steer_left as i32 as f32);
            let input = self.input;
            tick(&mut self.world, &input, dt);
            // Clear one-shot inputs after processing
            self.input.jump = false;

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn toggle_pause(&mut self) {
            self.paused = !self.paused;
            if self.paused {
                log::info!("Paused");
            } else {
                // Re-anchor the clock so the pause does not arrive as one
                // giant delta on the next frame.
                self.last_time = 0.0;
                log::info!("Resumed");
            }
        }

        fn restart(&mut self, seed: u64) {
            self.world = build_world(seed, &self.settings);
            self.input = TickInput::default();
            self.paused = false;
            log::info!("Restarted with seed {seed}");
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document
                .query_selector("#hud-distance .hud-value")
                .ok()
                .flatten()
            {
                el.set_text_content(Some(&format!("{:.0}m", self.world.distance_traveled())));
            }

            if let Some(el) = document
                .query_selector("#hud-speed .hud-value")
                .ok()
                .flatten()
            {
                el.set_text_content(Some(&format!("{:.1}", self.world.marble.speed() * 60.0)));
            }

            if self.settings.show_fps {
                if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }

            if let Some(el) = document.get_element_by_id("pause-menu") {
                let class = if self.paused { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }

            if let Some(el) = document.get_element_by_id("falling-flash") {
                let class = if self.world.marble.is_falling() {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    fn build_world(seed: u64, settings: &Settings) -> World {
        let control = match settings.control {
            ControlScheme::AutoForward => ControlMode::AutoForward,
            ControlScheme::Direct => ControlMode::Direct,
        };
        match settings.mode {
            GameMode::Classic => {
                let theme = theme::by_name(&settings.theme).unwrap_or_else(theme::default_theme);
                World::new(seed, control, Some(theme))
            }
            GameMode::Chill => World::new_chill(seed, control),
        }
    }

    /// Seed priority: ?seed= URL parameter, then settings override, then clock
    fn pick_seed(settings: &Settings) -> u64 {
        let from_url = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
            .and_then(|params| params.get("seed"))
            .and_then(|s| s.parse::<u64>().ok());
        from_url
            .or(settings.seed_override)
            .unwrap_or_else(|| js_sys::Date::now() as u64)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Marble Rush starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let settings = Settings::load();
        let seed = pick_seed(&settings);
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));
        log::info!("Game initialized with seed: {seed}");

        setup_input_handlers(game.clone());
        setup_restart_button(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Marble Rush running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.steer_left = true,
                    "ArrowRight" | "d" | "D" => g.steer_right = true,
                    "ArrowUp" | "w" | "W" => g.input.active = true,
                    " " => g.input.jump = true,
                    "Escape" => {
                        g.toggle_pause();
                        // Only restart the chain if the pre-pause callback
                        // has already drained; a pending one will carry on
                        // by itself and must not be doubled.
                        let restart = !g.paused && !g.loop_running;
                        if restart {
                            g.loop_running = true;
                        }
                        drop(g);
                        if restart {
                            request_animation_frame(game.clone());
                        }
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.steer_left = false,
                    "ArrowRight" | "d" | "D" => g.steer_right = false,
                    "ArrowUp" | "w" | "W" => g.input.active = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: left half steers left, right half steers right, two-finger
        // tap jumps
        {
            let game = game.clone();
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if event.touches().length() >= 2 {
                    g.input.jump = true;
                    return;
                }
                if let Some(touch) = event.touches().get(0) {
                    let width = window_clone
                        .inner_width()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(1.0);
                    let on_left = (touch.client_x() as f64) < width / 2.0;
                    g.steer_left = on_left;
                    g.steer_right = !on_left;
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end clears steering
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::TouchEvent| {
                event.prevent_default();
                if event.touches().length() == 0 {
                    let mut g = game.borrow_mut();
                    g.steer_left = false;
                    g.steer_right = false;
                }
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            if g.paused {
                // Stop rescheduling; resume restarts the loop with a fresh
                // time anchor.
                g.loop_running = false;
                g.update_hud();
                return;
            }
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.update_hud();
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                let mut g = game.borrow_mut();
                g.restart(seed);
                let restart_loop = !g.loop_running;
                if restart_loop {
                    g.loop_running = true;
                }
                drop(g);
                if restart_loop {
                    request_animation_frame(game.clone());
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if !g.paused {
                        g.toggle_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if !g.paused {
                    g.toggle_pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use marble_rush::consts::MAX_ACTIVE_CHUNKS;
    use marble_rush::sim::{ControlMode, TickInput, World, tick};

    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    log::info!("Marble Rush (native, headless) starting with seed {seed}");

    // Two minutes of auto-forward play at a fixed step; exercises path
    // generation, streaming and fall recovery end to end.
    let mut world = World::new(seed, ControlMode::AutoForward, None);
    let dt = 1.0 / 60.0;
    for _ in 0..7200 {
        tick(&mut world, &TickInput::default(), dt);
        assert!(world.chunks.len() <= MAX_ACTIVE_CHUNKS);
    }

    println!(
        "seed {seed}: {:.0} units generated, marble at {:?}, {} chunks resident",
        world.distance_traveled(),
        world.marble.position,
        world.chunks.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
