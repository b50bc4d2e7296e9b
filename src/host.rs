//! Scene host: owns the scene for the lifetime of one mount and drives the
//! per-frame update and draw.
//!
//! The host never registers a second frame callback while one is pending, and
//! after `unmount` no callback it registered can fire.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use crate::animator::Animator;
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::core::{
    BufferMount, Canvas, DrawOp, Frame, FrameLoop, FrameToken, MountPoint, RenderSurface, SurfaceSize,
};
use crate::error::{EngineError, Result};
use crate::factory::{GridLayout, LayoutPolicy, TileFactory};
use crate::math::Rgb;
use crate::render::TileRenderer;
use crate::scene::{Insertion, SceneState};
use crate::spawn::{ScrollSignal, SpawnController};
use crate::texture::TextureSynthesizer;
use crate::tile::{TileDescriptor, TileId};

/// Tiles prepared against one surface generation
///
/// Committing it after the surface has been resized fails with
/// [`EngineError::ResizeRace`].
#[derive(Debug, Clone)]
pub struct SpawnBatch {
    generation: u64,
    tiles: Vec<TileDescriptor>,
}

impl SpawnBatch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tiles(&self) -> &[TileDescriptor] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// What one frame did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: Frame,
    /// Tiles alive after the frame
    pub tiles: usize,
    /// Tiles that produced draw operations
    pub drawn: usize,
    pub spawned: usize,
    pub evicted: usize,
    pub expired: usize,
}

pub struct SceneHost {
    config: EngineConfig,
    factory: TileFactory,
    animator: Animator,
    renderer: TileRenderer,
    scene: SceneState,
    spawner: SpawnController,
    surface: Option<Box<dyn RenderSurface>>,
    canvas: Canvas,
    camera: Camera,
    size: SurfaceSize,
    pending_resize: Option<SurfaceSize>,
    generation: u64,
    token: Option<FrameToken>,
    mounted: bool,
    degraded: bool,
    populated: bool,
    frame_number: u64,
    last_frame_time: Option<f32>,
}

impl SceneHost {
    pub fn new(config: EngineConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let synthesizer = TextureSynthesizer::new(config.texture.resolution, config.texture.enabled);
        let size = SurfaceSize::default();

        log::debug!("scene seed {}", seed);

        Self {
            factory: TileFactory::new(config.palette.clone(), synthesizer, seed),
            animator: Animator::new(config.animator),
            renderer: TileRenderer::new(config.render),
            scene: SceneState::new(config.capacity),
            spawner: SpawnController::new(config.spawn, None),
            surface: None,
            canvas: Canvas::new(0, 0),
            camera: Camera::new(config.render.projection, size),
            size,
            pending_resize: None,
            generation: 0,
            token: None,
            mounted: false,
            degraded: false,
            populated: false,
            frame_number: 0,
            last_frame_time: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attach to `mount` and start the frame loop.
    ///
    /// When no surface can be acquired the mount gets a flat background
    /// colour instead and no frame is ever requested. Scroll-reactive
    /// layouts subscribe to `scroll` for the lifetime of the mount.
    pub fn mount(&mut self, mount: &mut dyn MountPoint, frames: &mut FrameLoop, scroll: Option<&ScrollSignal>) {
        if self.mounted {
            log::warn!("scene already mounted, ignoring second mount");
            return;
        }

        self.mounted = true;
        self.apply_size(mount.size());

        match mount.acquire_surface() {
            Ok(surface) => {
                self.surface = Some(surface);
                self.degraded = false;
            }
            Err(e) => {
                log::warn!("{}; showing static background", e);
                self.degraded = true;
                mount.show_fallback(self.fallback_color());
                return;
            }
        }

        let subscription = if self.config.layout.is_scroll_reactive() {
            scroll.map(ScrollSignal::subscribe)
        } else {
            None
        };
        self.spawner = SpawnController::new(self.config.spawn, subscription);
        self.token = Some(frames.request_frame());

        log::info!(
            "mounted {} variant ({} layout) at {}x{}",
            self.config.variant_name,
            self.config.layout.name(),
            self.size.width,
            self.size.height
        );
    }

    /// Stop the frame loop and release the surface and scroll subscription
    pub fn unmount(&mut self, frames: &mut FrameLoop) {
        if !self.mounted {
            return;
        }
        if let Some(token) = self.token.take() {
            frames.cancel(token);
        }
        self.spawner.dispose();
        self.surface = None;
        self.scene.clear();
        self.populated = false;
        self.pending_resize = None;
        self.last_frame_time = None;
        self.mounted = false;

        log::info!("unmounted {} variant after {} frames", self.config.variant_name, self.frame_number);
    }

    /// Record a new surface size; it takes effect at the start of the next frame
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        if size == self.pending_resize.unwrap_or(self.size) {
            return;
        }
        self.pending_resize = Some(size);
        self.generation += 1;
        log::debug!("resize to {}x{} queued (generation {})", width, height, self.generation);
    }

    /// Run one frame for `token` at animation time `now`.
    ///
    /// Returns None for a stale or cancelled token, or when the host is not
    /// presenting. Every tile is advanced with the same `now`.
    pub fn frame(&mut self, token: FrameToken, frames: &mut FrameLoop, now: f32) -> Option<FrameStats> {
        if self.token != Some(token) {
            log::trace!("ignoring stale frame callback {:?}", token);
            return None;
        }
        self.token = None;
        if !self.mounted || self.surface.is_none() {
            return None;
        }

        let delta = self.last_frame_time.map_or(0.0, |last| (now - last).max(0.0));
        self.last_frame_time = Some(now);
        self.frame_number += 1;

        let filled = self.apply_pending_resize(now);
        let mut spawned = filled.inserted;
        let mut evicted = filled.evicted.len();

        if !self.populated {
            let batch = self.prepare_initial_batch(now);
            match self.commit_batch(batch) {
                Ok(insertion) => {
                    spawned += insertion.inserted;
                    evicted += insertion.evicted.len();
                    self.populated = true;
                }
                // laid out again next frame
                Err(e) => log::debug!("{}", e),
            }
        }

        for request in self.spawner.poll() {
            let view = self.camera.view_volume();
            let tiles = self.factory.create_batch(request.count, &self.config.layout, &view, now);
            let insertion = self.scene.insert_batch(tiles);
            spawned += insertion.inserted;
            evicted += insertion.evicted.len();
        }

        let (drawn, expired) = self.update_and_draw(now);

        if !self.present() {
            return None;
        }

        self.token = Some(frames.request_frame());

        let stats = FrameStats {
            frame: Frame::new(self.frame_number, now, delta),
            tiles: self.scene.len(),
            drawn,
            spawned,
            evicted,
            expired,
        };
        log::trace!("{:?}", stats);
        Some(stats)
    }

    /// Lay out the initial batch against the current surface
    pub fn prepare_initial_batch(&mut self, now: f32) -> SpawnBatch {
        self.apply_pending_resize(now);

        let view = self.camera.view_volume();
        let count = match &self.config.layout {
            LayoutPolicy::Grid(grid) => {
                let (columns, rows) = grid.dimensions(&view);
                (columns * rows) as usize
            }
            LayoutPolicy::Scatter(_) | LayoutPolicy::ScrollReactive(_) => self.config.spawn.initial_batch,
        };

        SpawnBatch {
            generation: self.generation,
            tiles: self.factory.create_batch(count, &self.config.layout, &view, now),
        }
    }

    /// Insert a prepared batch, unless the surface was resized since it was prepared
    pub fn commit_batch(&mut self, batch: SpawnBatch) -> Result<Insertion> {
        if batch.generation != self.generation {
            return Err(EngineError::ResizeRace {
                prepared: batch.generation,
                current: self.generation,
            });
        }

        let insertion = self.scene.insert_batch(batch.tiles);
        if !insertion.evicted.is_empty() {
            log::debug!("capacity {} reached, evicted {} tiles", self.scene.capacity(), insertion.evicted.len());
        }
        Ok(insertion)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// True once the surface was lost or never acquired
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn has_pending_frame(&self) -> bool {
        self.token.is_some()
    }

    pub fn tile_count(&self) -> usize {
        self.scene.len()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flat colour shown instead of the animation when the surface is unavailable
    pub fn fallback_color(&self) -> Rgb {
        self.config.background
    }

    /// Pixels of the most recently drawn frame
    pub fn frame_pixels(&self) -> &[u8] {
        self.canvas.pixels()
    }

    /// Apply a queued resize; a grid whose lattice grew gets its missing cells filled
    fn apply_pending_resize(&mut self, now: f32) -> Insertion {
        let Some(size) = self.pending_resize.take() else {
            return Insertion::default();
        };

        let grid = match &self.config.layout {
            LayoutPolicy::Grid(grid) if self.populated => Some(*grid),
            _ => None,
        };
        let before = grid.map(|grid| grid.dimensions(&self.camera.view_volume()));

        self.apply_size(size);
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(size);
        }

        let insertion = match grid {
            Some(grid) if before != Some(grid.dimensions(&self.camera.view_volume())) => {
                self.fill_grid_cells(&grid, now)
            }
            _ => Insertion::default(),
        };
        log::debug!(
            "resized to {}x{} ({} grid cells filled)",
            size.width,
            size.height,
            insertion.inserted
        );
        insertion
    }

    /// Spawn tiles for lattice cells no live tile occupies; existing tiles stay put
    fn fill_grid_cells(&mut self, grid: &GridLayout, now: f32) -> Insertion {
        let view = self.camera.view_volume();
        let (columns, rows) = grid.dimensions(&view);
        let occupied: HashSet<(i64, i64)> = self
            .scene
            .iter()
            .map(|tile| grid.cell_of(tile.target_position, &view))
            .collect();

        let missing: Vec<(u32, u32)> = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| (col, row)))
            .filter(|&(col, row)| !occupied.contains(&(col as i64, row as i64)))
            .collect();
        if missing.is_empty() {
            return Insertion::default();
        }

        let tiles = self.factory.create_grid_cells(&missing, grid, &view, now);
        self.scene.insert_batch(tiles)
    }

    fn apply_size(&mut self, size: SurfaceSize) {
        self.size = size;
        self.camera = Camera::new(self.config.render.projection, size);
        self.canvas.resize(size.width, size.height);
    }

    fn update_and_draw(&mut self, now: f32) -> (usize, usize) {
        let bg = self.config.background;
        self.canvas.apply(&DrawOp::Clear(bg.r, bg.g, bg.b, 255));

        let mut drawn = 0;
        let mut expired: HashSet<TileId> = HashSet::new();

        for tile in self.scene.iter() {
            let elapsed = tile.elapsed(now);
            let transform = self.animator.advance(tile, elapsed, now);

            if self.animator.is_expired(elapsed, &transform) {
                expired.insert(tile.id);
                continue;
            }

            let ops = self.renderer.draw_ops(tile, &transform, &self.camera);
            if !ops.is_empty() {
                drawn += 1;
            }
            for op in &ops {
                self.canvas.apply(op);
            }
        }

        let removed = if expired.is_empty() {
            0
        } else {
            self.scene.retain(|tile| !expired.contains(&tile.id))
        };
        (drawn, removed)
    }

    /// Present the canvas; on failure the host degrades and stops requesting frames
    fn present(&mut self) -> bool {
        if self.size.is_empty() {
            return true;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        match surface.present(self.canvas.pixels()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{}; animation stopped", e);
                self.surface = None;
                self.degraded = true;
                false
            }
        }
    }
}

/// Simulated frame rate of headless runs
pub const HEADLESS_FRAME_TIME: f32 = 1.0 / 60.0;
/// Headless runs scroll once every this many frames
pub const HEADLESS_SCROLL_EVERY: u32 = 9;
const HEADLESS_SCROLL_STEP: f32 = 240.0;

/// Totals of a headless run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeadlessReport {
    pub frames: u64,
    pub presented: u64,
    pub spawned: usize,
    pub evicted: usize,
    pub expired: usize,
    pub peak_tiles: usize,
    pub final_tiles: usize,
    pub degraded: bool,
}

/// Drive a full mount, `frames` frames at 60 Hz and unmount against an
/// in-memory surface. Scroll-reactive layouts get a synthetic scroll every
/// few frames.
pub fn run_headless(config: EngineConfig, frames: u32, size: SurfaceSize) -> HeadlessReport {
    let mut mount = BufferMount::new(size.width, size.height);
    let mut frame_loop = FrameLoop::new();
    let scroll = ScrollSignal::new();
    let mut host = SceneHost::new(config);
    let mut report = HeadlessReport::default();

    host.mount(&mut mount, &mut frame_loop, Some(&scroll));

    for index in 0..frames {
        let now = index as f32 * HEADLESS_FRAME_TIME;
        if index > 0 && index % HEADLESS_SCROLL_EVERY == 0 {
            scroll.scroll_by(HEADLESS_SCROLL_STEP, now);
        }

        let Some(token) = frame_loop.take_due() else {
            break;
        };
        let Some(stats) = host.frame(token, &mut frame_loop, now) else {
            break;
        };

        report.frames = stats.frame.number;
        report.spawned += stats.spawned;
        report.evicted += stats.evicted;
        report.expired += stats.expired;
        report.peak_tiles = report.peak_tiles.max(stats.tiles);
        report.final_tiles = stats.tiles;
    }

    report.degraded = host.is_degraded();
    host.unmount(&mut frame_loop);
    report.presented = mount.presented();
    report
}
