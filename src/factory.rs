//! Tile descriptor factory and layout policies.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::math::Rgb;
use crate::texture::{TextureStyle, TextureSynthesizer};
use crate::tile::{TileDescriptor, TileId};

/// One colour of a variant palette, with its surface style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub color: Rgb,
    #[serde(default)]
    pub style: TextureStyle,
}

impl PaletteEntry {
    pub fn new(color: Rgb, style: TextureStyle) -> Self {
        Self { color, style }
    }
}

/// Visible world box the layouts are relative to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewVolume {
    pub center: Vec3,
    pub half_extent: Vec3,
    /// World y grows upward (perspective) rather than downward (screen pixels)
    pub y_up: bool,
}

impl ViewVolume {
    /// Sign that moves a point towards the bottom of the view
    fn down(&self) -> f32 {
        if self.y_up {
            -1.0
        } else {
            1.0
        }
    }

    /// Top-left corner in the view plane
    pub fn top_left(&self) -> Vec3 {
        Vec3::new(
            self.center.x - self.half_extent.x,
            self.center.y - self.down() * self.half_extent.y,
            self.center.z,
        )
    }
}

/// Regular lattice, assembled row-major
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Columns; derived from the view width when unset
    pub columns: Option<u32>,
    /// Rows; derived from the view height when unset
    pub rows: Option<u32>,
    pub spacing: f32,
    pub tile_size: f32,
    pub depth: f32,
    /// Seconds between consecutive lattice entries
    pub stagger: f32,
    pub spawn_scale: f32,
    pub entrance_offset: Vec3,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: None,
            rows: None,
            spacing: 150.0,
            tile_size: 150.0,
            depth: 0.0,
            stagger: 0.04,
            spawn_scale: 0.0,
            entrance_offset: Vec3::ZERO,
        }
    }
}

impl GridLayout {
    /// (columns, rows) covering `view`
    pub fn dimensions(&self, view: &ViewVolume) -> (u32, u32) {
        let cover = |extent: f32| ((extent * 2.0) / self.spacing.max(f32::EPSILON)).ceil() as u32 + 1;
        (
            self.columns.unwrap_or_else(|| cover(view.half_extent.x)).max(1),
            self.rows.unwrap_or_else(|| cover(view.half_extent.y)).max(1),
        )
    }

    /// Nearest lattice cell (column, row) to `position` in `view`; may lie outside the lattice
    pub fn cell_of(&self, position: Vec3, view: &ViewVolume) -> (i64, i64) {
        let spacing = self.spacing.max(f32::EPSILON);
        let top_left = view.top_left();
        let col = (position.x - top_left.x) / spacing - 0.5;
        let row = (position.y - top_left.y) * view.down() / spacing - 0.5;
        (col.round() as i64, row.round() as i64)
    }
}

/// Uniformly scattered tiles for ambient backgrounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterLayout {
    pub size_min: Vec2,
    pub size_max: Vec2,
    pub depth: f32,
    /// Z range relative to the view centre
    pub z_range: Vec2,
    pub max_tilt: f32,
    pub stagger: f32,
    pub spawn_scale: f32,
    pub entrance_offset: Vec3,
}

impl Default for ScatterLayout {
    fn default() -> Self {
        Self {
            size_min: Vec2::new(0.6, 0.6),
            size_max: Vec2::new(1.2, 1.2),
            depth: 0.1,
            z_range: Vec2::new(-6.0, 2.0),
            max_tilt: 0.4,
            stagger: 0.12,
            spawn_scale: 0.6,
            entrance_offset: Vec3::new(0.0, -2.0, 0.0),
        }
    }
}

/// Tiles dropped in from above the viewport in response to scrolling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollLayout {
    /// Gap between the top of the view and the lowest spawn point
    pub spawn_margin: f32,
    pub spawn_jitter: f32,
    /// Horizontal spawn spread as a multiple of the view half-width
    pub spawn_spread: f32,
    /// Fraction of the view the resting positions are drawn from
    pub rest_fill: f32,
    pub z_range: Vec2,
    /// Probability that a tile is a laminate plank
    pub plank_ratio: f32,
    pub max_tilt: f32,
    /// Peak extra spin at spawn, per axis
    pub spawn_spin: Vec3,
    pub stagger: f32,
}

impl Default for ScrollLayout {
    fn default() -> Self {
        Self {
            spawn_margin: 4.0,
            spawn_jitter: 6.0,
            spawn_spread: 1.3,
            rest_fill: 0.9,
            z_range: Vec2::new(-6.0, 2.0),
            plank_ratio: 0.35,
            max_tilt: 0.2,
            spawn_spin: Vec3::new(1.5, 1.2, 1.0),
            stagger: 0.05,
        }
    }
}

/// How a batch positions its tiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayoutPolicy {
    Grid(GridLayout),
    Scatter(ScatterLayout),
    ScrollReactive(ScrollLayout),
}

impl LayoutPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutPolicy::Grid(_) => "grid",
            LayoutPolicy::Scatter(_) => "scatter",
            LayoutPolicy::ScrollReactive(_) => "scroll-reactive",
        }
    }

    pub fn is_scroll_reactive(&self) -> bool {
        matches!(self, LayoutPolicy::ScrollReactive(_))
    }
}

/// Creates tile descriptors with unique, increasing ids
///
/// Each factory owns its own id counter; two scenes never share one.
pub struct TileFactory {
    next_id: u64,
    last_spawn_time: f32,
    rng: StdRng,
    palette: Vec<PaletteEntry>,
    synthesizer: TextureSynthesizer,
}

impl TileFactory {
    pub fn new(palette: Vec<PaletteEntry>, synthesizer: TextureSynthesizer, seed: u64) -> Self {
        Self {
            next_id: 1,
            last_spawn_time: f32::NEG_INFINITY,
            rng: StdRng::seed_from_u64(seed),
            palette,
            synthesizer,
        }
    }

    /// Id the next descriptor will receive
    pub fn next_id(&self) -> TileId {
        TileId(self.next_id)
    }

    /// Produce `count` descriptors laid out by `policy` inside `view`.
    ///
    /// Spawn times start at `now`, or at the previous batch's last spawn time
    /// if that is later, and never decrease.
    pub fn create_batch(
        &mut self,
        count: usize,
        policy: &LayoutPolicy,
        view: &ViewVolume,
        now: f32,
    ) -> Vec<TileDescriptor> {
        let start = now.max(self.last_spawn_time);
        let tiles: Vec<TileDescriptor> = (0..count)
            .map(|index| match policy {
                LayoutPolicy::Grid(grid) => self.grid_tile(index, grid, view, start),
                LayoutPolicy::Scatter(scatter) => self.scatter_tile(index, scatter, view, start),
                LayoutPolicy::ScrollReactive(scroll) => self.scroll_tile(index, scroll, view, start),
            })
            .collect();

        if let Some(last) = tiles.last() {
            self.last_spawn_time = last.spawn_time;
        }

        log::debug!(
            "factory produced {} {} tiles (ids {}..{})",
            tiles.len(),
            policy.name(),
            tiles.first().map_or(self.next_id, |t| t.id.0),
            self.next_id
        );

        tiles
    }

    /// Grid tiles for the given (column, row) cells only, staggered in the order given.
    ///
    /// Used to complete a lattice that grew; spawn times follow the same
    /// monotonic rule as `create_batch`.
    pub fn create_grid_cells(
        &mut self,
        cells: &[(u32, u32)],
        grid: &GridLayout,
        view: &ViewVolume,
        now: f32,
    ) -> Vec<TileDescriptor> {
        let start = now.max(self.last_spawn_time);
        let tiles: Vec<TileDescriptor> = cells
            .iter()
            .enumerate()
            .map(|(index, &(col, row))| self.grid_cell(col, row, grid, view, start + index as f32 * grid.stagger))
            .collect();

        if let Some(last) = tiles.last() {
            self.last_spawn_time = last.spawn_time;
        }
        log::debug!("factory filled {} grid cells", tiles.len());

        tiles
    }

    fn grid_tile(&mut self, index: usize, grid: &GridLayout, view: &ViewVolume, start: f32) -> TileDescriptor {
        let (columns, _) = grid.dimensions(view);
        let col = index as u32 % columns;
        let row = index as u32 / columns;
        self.grid_cell(col, row, grid, view, start + index as f32 * grid.stagger)
    }

    fn grid_cell(&mut self, col: u32, row: u32, grid: &GridLayout, view: &ViewVolume, spawn_time: f32) -> TileDescriptor {
        let (col, row) = (col as f32, row as f32);
        let top_left = view.top_left();

        let target = Vec3::new(
            top_left.x + (col + 0.5) * grid.spacing,
            top_left.y + view.down() * (row + 0.5) * grid.spacing,
            top_left.z,
        );

        self.descriptor(
            target + grid.entrance_offset,
            target,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(grid.tile_size, grid.tile_size, grid.depth),
            grid.spawn_scale,
            spawn_time,
        )
    }

    fn scatter_tile(&mut self, index: usize, scatter: &ScatterLayout, view: &ViewVolume, start: f32) -> TileDescriptor {
        let target = Vec3::new(
            view.center.x + self.rng.gen_range(-1.0f32..=1.0) * view.half_extent.x,
            view.center.y + self.rng.gen_range(-1.0f32..=1.0) * view.half_extent.y,
            view.center.z + self.range(scatter.z_range),
        );
        let size = Vec3::new(
            self.range(Vec2::new(scatter.size_min.x, scatter.size_max.x)),
            self.range(Vec2::new(scatter.size_min.y, scatter.size_max.y)),
            scatter.depth,
        );
        let rotation = self.tilt(scatter.max_tilt);

        self.descriptor(
            target + scatter.entrance_offset,
            target,
            Vec3::ZERO,
            rotation,
            size,
            scatter.spawn_scale,
            start + index as f32 * scatter.stagger,
        )
    }

    fn scroll_tile(&mut self, index: usize, scroll: &ScrollLayout, view: &ViewVolume, start: f32) -> TileDescriptor {
        let top = view.center.y - view.down() * view.half_extent.y;
        let above = top - view.down() * (scroll.spawn_margin + self.rng.gen::<f32>() * scroll.spawn_jitter);

        let spawn = Vec3::new(
            view.center.x + (self.rng.gen::<f32>() - 0.5) * 2.0 * view.half_extent.x * scroll.spawn_spread,
            above,
            view.center.z + self.range(scroll.z_range),
        );
        let target = Vec3::new(
            view.center.x + self.rng.gen_range(-1.0f32..=1.0) * view.half_extent.x * scroll.rest_fill,
            view.center.y + self.rng.gen_range(-1.0f32..=1.0) * view.half_extent.y * scroll.rest_fill,
            view.center.z + self.range(scroll.z_range),
        );

        let size = if self.rng.gen::<f32>() < scroll.plank_ratio {
            Vec3::new(
                (self.rng.gen::<f32>() * 0.4 + 0.2) * 4.0,
                self.rng.gen::<f32>() * 0.2 + 0.2,
                0.08,
            )
        } else {
            Vec3::new(
                self.rng.gen::<f32>() * 0.4 + 0.6,
                self.rng.gen::<f32>() * 0.4 + 0.6,
                0.12,
            )
        };

        let rotation = Vec3::new(
            self.rng.gen::<f32>() * scroll.max_tilt,
            self.rng.gen::<f32>() * scroll.max_tilt,
            self.rng.gen::<f32>() * scroll.max_tilt,
        );
        let spin = Vec3::new(
            self.rng.gen::<f32>() - 0.5,
            self.rng.gen::<f32>() - 0.5,
            self.rng.gen::<f32>() - 0.5,
        ) * scroll.spawn_spin
            * 2.0;

        self.descriptor(
            spawn,
            target,
            rotation + spin,
            rotation,
            size,
            1.0,
            start + index as f32 * scroll.stagger,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn descriptor(
        &mut self,
        spawn_position: Vec3,
        target_position: Vec3,
        spawn_rotation: Vec3,
        rotation: Vec3,
        size: Vec3,
        spawn_scale: f32,
        spawn_time: f32,
    ) -> TileDescriptor {
        let id = self.next_id;
        self.next_id += 1;

        let entry = self.pick_palette_entry();
        let material = self.synthesizer.synthesize(entry.style, entry.color, id);

        TileDescriptor {
            id: TileId(id),
            spawn_position,
            target_position,
            spawn_rotation,
            rotation,
            size,
            spawn_scale,
            material,
            spawn_time,
            phase_seed: self.rng.gen_range(0.0..TAU),
        }
    }

    fn pick_palette_entry(&mut self) -> PaletteEntry {
        if self.palette.is_empty() {
            return PaletteEntry::new(Rgb::WHITE, TextureStyle::Plain);
        }
        self.palette[self.rng.gen_range(0..self.palette.len())]
    }

    /// Uniform sample in [range.x, range.y], tolerant of reversed or empty ranges
    fn range(&mut self, range: Vec2) -> f32 {
        let (lo, hi) = (range.x.min(range.y), range.x.max(range.y));
        lo + (hi - lo) * self.rng.gen::<f32>()
    }

    fn tilt(&mut self, max_tilt: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-1.0f32..=1.0) * max_tilt,
            self.rng.gen_range(-1.0f32..=1.0) * max_tilt,
            self.rng.gen_range(-1.0f32..=1.0) * max_tilt,
        )
    }
}
