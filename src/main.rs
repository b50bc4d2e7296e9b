use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use tile_hero::cli::Cli;
use tile_hero::core::{AnimationClock, FrameLoop, Interval, MountPoint, SurfaceSize};
use tile_hero::window::{key_scroll, wheel_scroll, WindowMount};
use tile_hero::{run_headless, EngineConfig, SceneHost, ScrollSignal};

// === Constants ===

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const INITIAL_WINDOW_WIDTH: u32 = 1280;
const INITIAL_WINDOW_HEIGHT: u32 = 720;

struct App {
    host: SceneHost,
    frames: FrameLoop,
    scroll: ScrollSignal,
    mount: Option<WindowMount>,
    clock: Option<AnimationClock>,
    fps: Interval,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            host: SceneHost::new(config),
            frames: FrameLoop::new(),
            scroll: ScrollSignal::new(),
            mount: None,
            clock: None,
            fps: Interval::new(FPS_UPDATE_INTERVAL),
        }
    }

    fn now(&self) -> f32 {
        self.clock.map_or(0.0, |clock| clock.now())
    }

    fn scroll_by(&self, delta: f32) {
        self.scroll.scroll_by(delta, self.now());
    }

    fn redraw(&mut self) {
        let Some(token) = self.frames.take_due() else {
            return;
        };
        let now = self.now();

        match self.host.frame(token, &mut self.frames, now) {
            Some(stats) => {
                if let Some(fps) = self.fps.tick(stats.frame.delta) {
                    log::info!("{:.1} fps, {} tiles", fps, stats.tiles);
                }
            }
            None if self.host.is_degraded() => {
                let color = self.host.fallback_color();
                if let Some(mount) = self.mount.as_mut() {
                    mount.show_fallback(color);
                }
            }
            None => {}
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.host.unmount(&mut self.frames);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.mount.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Tile Hero")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut mount = WindowMount::new(window);
        self.clock = Some(AnimationClock::start());
        self.host.mount(&mut mount, &mut self.frames, Some(&self.scroll));
        mount.request_redraw();
        self.mount = Some(mount);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                if let Some(delta) = key_scroll(key) {
                    self.scroll_by(delta);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.scroll_by(wheel_scroll(delta)),
            WindowEvent::Resized(size) => self.host.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.frames.is_pending() {
            return;
        }
        if let Some(mount) = &self.mount {
            mount.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter())).init();

    let config = cli.engine_config().context("failed to load configuration")?;

    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    if let Some(frames) = cli.headless {
        log::info!("headless {} run, {} frames", config.variant_name, frames);
        let size = SurfaceSize::new(INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT);
        let report = run_headless(config, frames, size);
        log::info!(
            "{} frames, {} tiles at end (peak {}), {} spawned, {} evicted, {} expired",
            report.frames,
            report.final_tiles,
            report.peak_tiles,
            report.spawned,
            report.evicted,
            report.expired
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(config);

    log::info!("Tile Hero - scroll with the wheel, arrows or PageUp/PageDown, Escape to quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
