use std::fmt;
use std::str::FromStr;

use engine::{Rgba, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TILE_SIZE: f32 = 32.0;

const BUILDING_BLOCK_OFFSET: u32 = 3;
const BUILDING_MIN_SIZE: u32 = 3;
const BUILDING_MAX_SIZE: u32 = 5;
/// `(col, row, size)` of every park square, clipped to the map.
const PARK_STAMPS: [(u32, u32, u32); 5] = [
    (13, 13, 8),
    (49, 37, 10),
    (25, 61, 8),
    (73, 73, 9),
    (61, 13, 7),
];

const NOISE_BASE_FREQUENCY: f64 = 0.08;
const NOISE_OCTAVES: u32 = 4;
const WATER_BELOW: f64 = 0.25;
const SAND_BELOW: f64 = 0.35;
const GRASS_BELOW: f64 = 0.65;
const FLOWER_BELOW: f64 = 0.75;
const STONE_CHANCE: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Road,
    Sidewalk,
    Grass,
    Building,
    Park,
    Crosswalk,
    Water,
    Sand,
    Forest,
    Flower,
    Stone,
    Path,
}

impl TerrainKind {
    pub fn color(self) -> Rgba {
        match self {
            TerrainKind::Road => [58, 58, 66, 255],
            TerrainKind::Sidewalk => [176, 172, 164, 255],
            TerrainKind::Grass => [0x4a, 0x7c, 0x3c, 255],
            TerrainKind::Building => [118, 90, 78, 255],
            TerrainKind::Park => [88, 158, 74, 255],
            TerrainKind::Crosswalk => [226, 226, 220, 255],
            TerrainKind::Water => [0x3d, 0x85, 0xc6, 255],
            TerrainKind::Sand => [0xd4, 0xa5, 0x74, 255],
            TerrainKind::Forest => [0x2d, 0x5a, 0x2d, 255],
            TerrainKind::Flower => [0x5c, 0x8a, 0x4c, 255],
            TerrainKind::Stone => [0x66, 0x66, 0x66, 255],
            TerrainKind::Path => [0x8b, 0x73, 0x55, 255],
        }
    }

    pub fn is_road_surface(self) -> bool {
        matches!(self, TerrainKind::Road | TerrainKind::Crosswalk)
    }

    pub fn is_pedestrian_walkable(self) -> bool {
        matches!(
            self,
            TerrainKind::Sidewalk | TerrainKind::Park | TerrainKind::Crosswalk
        )
    }

    pub fn blocks_movement(self) -> bool {
        self == TerrainKind::Building
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapLayout {
    #[default]
    City,
    Wilderness,
}

impl fmt::Display for MapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapLayout::City => f.write_str("city"),
            MapLayout::Wilderness => f.write_str("wilderness"),
        }
    }
}

impl FromStr for MapLayout {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "city" => Ok(MapLayout::City),
            "wilderness" => Ok(MapLayout::Wilderness),
            other => Err(format!(
                "unknown layout '{other}'; expected 'city' or 'wilderness'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainParams {
    pub layout: MapLayout,
    pub cols: u32,
    pub rows: u32,
    pub tile_size: f32,
    pub road_spacing: u32,
    pub road_width: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            layout: MapLayout::City,
            cols: 100,
            rows: 100,
            tile_size: DEFAULT_TILE_SIZE,
            road_spacing: 12,
            road_width: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("map size must be positive, got {cols}x{rows} tiles")]
    EmptyMap { cols: u32, rows: u32 },
    #[error("tile size must be finite and positive, got {0}")]
    InvalidTileSize(f32),
    #[error("road width {road_width} must be positive and smaller than road spacing {road_spacing}")]
    InvalidRoadGrid { road_spacing: u32, road_width: u32 },
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(GenerationError::EmptyMap {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(GenerationError::InvalidTileSize(self.tile_size));
        }
        if self.layout == MapLayout::City
            && (self.road_width == 0 || self.road_width >= self.road_spacing)
        {
            return Err(GenerationError::InvalidRoadGrid {
                road_spacing: self.road_spacing,
                road_width: self.road_width,
            });
        }
        Ok(())
    }
}

/// Row-major terrain; immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    cols: u32,
    rows: u32,
    tile_size: f32,
    tiles: Vec<TerrainKind>,
}

impl TileGrid {
    pub(crate) fn filled(cols: u32, rows: u32, tile_size: f32, kind: TerrainKind) -> Self {
        Self {
            cols,
            rows,
            tile_size,
            tiles: vec![kind; cols as usize * rows as usize],
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }

    /// Out-of-range coordinates (including negative ones) yield `None`.
    pub fn get(&self, col: i64, row: i64) -> Option<TerrainKind> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        self.tiles
            .get(row as usize * self.cols as usize + col as usize)
            .copied()
    }

    pub(crate) fn set(&mut self, col: u32, row: u32, kind: TerrainKind) {
        if col >= self.cols || row >= self.rows {
            return;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.tiles[index] = kind;
    }

    pub fn tile_coords_at(&self, world: Vec2) -> (i64, i64) {
        (
            (world.x / self.tile_size).floor() as i64,
            (world.y / self.tile_size).floor() as i64,
        )
    }

    pub fn kind_at_world(&self, world: Vec2) -> Option<TerrainKind> {
        if !world.x.is_finite() || !world.y.is_finite() {
            return None;
        }
        let (col, row) = self.tile_coords_at(world);
        self.get(col, row)
    }

    pub fn is_pedestrian_walkable_at(&self, world: Vec2) -> bool {
        self.kind_at_world(world)
            .is_some_and(TerrainKind::is_pedestrian_walkable)
    }

    pub fn tile_center(&self, col: u32, row: u32) -> Vec2 {
        Vec2::new(
            (col as f32 + 0.5) * self.tile_size,
            (row as f32 + 0.5) * self.tile_size,
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, TerrainKind)> + '_ {
        let cols = self.cols;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(index, kind)| (index as u32 % cols, index as u32 / cols, *kind))
    }

    pub fn count(&self, kind: TerrainKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    pub fn colors(&self) -> Vec<Rgba> {
        self.tiles.iter().map(|kind| kind.color()).collect()
    }
}

pub fn generate_terrain(
    params: &TerrainParams,
    rng: &mut impl Rng,
) -> Result<TileGrid, GenerationError> {
    params.validate()?;
    Ok(match params.layout {
        MapLayout::City => generate_city(params, rng),
        MapLayout::Wilderness => generate_wilderness(params, rng),
    })
}

/// True when `index` falls inside a road band of the street grid.
pub(crate) fn is_road_line(index: u32, road_spacing: u32, road_width: u32) -> bool {
    index % road_spacing >= road_spacing - road_width
}

fn generate_city(params: &TerrainParams, rng: &mut impl Rng) -> TileGrid {
    let TerrainParams {
        cols,
        rows,
        road_spacing,
        road_width,
        ..
    } = *params;
    let mut grid = TileGrid::filled(cols, rows, params.tile_size, TerrainKind::Grass);

    for row in 0..rows {
        for col in 0..cols {
            if is_road_line(row, road_spacing, road_width)
                || is_road_line(col, road_spacing, road_width)
            {
                grid.set(col, row, TerrainKind::Road);
            }
        }
    }

    stamp_crosswalks(&mut grid, road_spacing, road_width);
    stamp_sidewalks(&mut grid);

    let interior = road_spacing - road_width;
    let max_size = BUILDING_MAX_SIZE.min(interior.saturating_sub(BUILDING_BLOCK_OFFSET + 1));
    if max_size >= BUILDING_MIN_SIZE {
        for block_row in (0..rows).step_by(road_spacing as usize) {
            for block_col in (0..cols).step_by(road_spacing as usize) {
                let size = rng.gen_range(BUILDING_MIN_SIZE..=max_size);
                stamp_square(
                    &mut grid,
                    block_col + BUILDING_BLOCK_OFFSET,
                    block_row + BUILDING_BLOCK_OFFSET,
                    size,
                    TerrainKind::Building,
                    |kind| kind == TerrainKind::Grass,
                );
            }
        }
    }

    for (col, row, size) in PARK_STAMPS {
        stamp_square(&mut grid, col, row, size, TerrainKind::Park, |kind| {
            matches!(kind, TerrainKind::Grass | TerrainKind::Building)
        });
    }

    grid
}

fn stamp_crosswalks(grid: &mut TileGrid, road_spacing: u32, road_width: u32) {
    let band_starts = |extent: u32| {
        (0..extent)
            .filter(move |index| index % road_spacing == road_spacing - road_width)
            .collect::<Vec<_>>()
    };
    let row_bands = band_starts(grid.rows);
    let col_bands = band_starts(grid.cols);
    for &band_row in &row_bands {
        for &band_col in &col_bands {
            let first_row = band_row.saturating_sub(1);
            let first_col = band_col.saturating_sub(1);
            for row in first_row..=band_row + road_width {
                for col in first_col..=band_col + road_width {
                    if grid.get(col as i64, row as i64) == Some(TerrainKind::Road) {
                        grid.set(col, row, TerrainKind::Crosswalk);
                    }
                }
            }
        }
    }
}

fn stamp_sidewalks(grid: &mut TileGrid) {
    let mut sidewalk_tiles = Vec::new();
    for (col, row, kind) in grid.iter() {
        if kind != TerrainKind::Grass {
            continue;
        }
        let touches_road = neighbors_8(col, row).any(|(n_col, n_row)| {
            grid.get(n_col, n_row)
                .is_some_and(TerrainKind::is_road_surface)
        });
        if touches_road {
            sidewalk_tiles.push((col, row));
        }
    }
    for (col, row) in sidewalk_tiles {
        grid.set(col, row, TerrainKind::Sidewalk);
    }
}

fn stamp_square(
    grid: &mut TileGrid,
    col: u32,
    row: u32,
    size: u32,
    kind: TerrainKind,
    can_overwrite: impl Fn(TerrainKind) -> bool,
) {
    let end_col = col.saturating_add(size).min(grid.cols);
    let end_row = row.saturating_add(size).min(grid.rows);
    for tile_row in row..end_row {
        for tile_col in col..end_col {
            if grid
                .get(tile_col as i64, tile_row as i64)
                .is_some_and(&can_overwrite)
            {
                grid.set(tile_col, tile_row, kind);
            }
        }
    }
}

pub(crate) fn neighbors_8(col: u32, row: u32) -> impl Iterator<Item = (i64, i64)> {
    let (col, row) = (col as i64, row as i64);
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .map(move |(dx, dy)| (col + dx, row + dy))
}

fn generate_wilderness(params: &TerrainParams, rng: &mut impl Rng) -> TileGrid {
    let mut grid = TileGrid::filled(params.cols, params.rows, params.tile_size, TerrainKind::Grass);
    let offset_x = rng.gen_range(0.0..1024.0);
    let offset_y = rng.gen_range(0.0..1024.0);

    for row in 0..params.rows {
        for col in 0..params.cols {
            let value = layered_noise(col as f64 + offset_x, row as f64 + offset_y);
            grid.set(col, row, classify_noise(value));
        }
    }

    let center_row = params.rows / 2;
    let center_col = params.cols / 2;
    for col in 0..params.cols {
        if grid.get(col as i64, center_row as i64) != Some(TerrainKind::Water) {
            grid.set(col, center_row, TerrainKind::Path);
        }
    }
    for row in 0..params.rows {
        if grid.get(center_col as i64, row as i64) != Some(TerrainKind::Water) {
            grid.set(center_col, row, TerrainKind::Path);
        }
    }

    for row in 0..params.rows {
        for col in 0..params.cols {
            if grid.get(col as i64, row as i64) == Some(TerrainKind::Grass)
                && rng.gen_bool(STONE_CHANCE)
            {
                grid.set(col, row, TerrainKind::Stone);
            }
        }
    }

    grid
}

fn classify_noise(value: f64) -> TerrainKind {
    if value < WATER_BELOW {
        TerrainKind::Water
    } else if value < SAND_BELOW {
        TerrainKind::Sand
    } else if value < GRASS_BELOW {
        TerrainKind::Grass
    } else if value < FLOWER_BELOW {
        TerrainKind::Flower
    } else {
        TerrainKind::Forest
    }
}

fn layered_noise(x: f64, y: f64) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = NOISE_BASE_FREQUENCY;
    for _ in 0..NOISE_OCTAVES {
        value += smooth_noise(x * frequency, y * frequency) * amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    (value + 1.0) / 2.0
}

fn smooth_noise(x: f64, y: f64) -> f64 {
    let a = (x * 12.9898 + y * 78.233).sin() * 43758.5453;
    let b = (x * 93.9898 + y * 67.345).sin() * 24634.6345;
    (a + b).sin()
}
