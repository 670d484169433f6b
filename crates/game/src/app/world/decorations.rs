use engine::{Rgba, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;

use super::terrain::{MapLayout, TerrainKind, TileGrid};

const PARK_TREE_CHANCE: f64 = 0.3;
const LAMP_POST_CHANCE: f64 = 0.06;
const SHRUB_CHANCE: f64 = 0.08;
const FOREST_TREE_CHANCE: f64 = 0.6;
const FLOWER_CHANCE: f64 = 0.5;
const GRASS_TUFT_CHANCE: f64 = 0.1;

const FLOWER_PALETTE: [Rgba; 5] = [
    [0xff, 0x6b, 0x6b, 255],
    [0xff, 0xd9, 0x3d, 255],
    [0x6b, 0xcb, 0x77, 255],
    [0x4d, 0x96, 0xff, 255],
    [0xff, 0x85, 0xa2, 255],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    Tree,
    Shrub,
    LampPost,
    Flower,
    Rock,
    GrassTuft,
}

impl DecorationKind {
    pub fn debug_name(self) -> &'static str {
        match self {
            DecorationKind::Tree => "tree",
            DecorationKind::Shrub => "shrub",
            DecorationKind::LampPost => "lamp_post",
            DecorationKind::Flower => "flower",
            DecorationKind::Rock => "rock",
            DecorationKind::GrassTuft => "grass_tuft",
        }
    }
}

/// Purely visual prop; never blocks and never changes after placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
}

pub fn place_decorations(
    grid: &TileGrid,
    layout: MapLayout,
    rng: &mut impl Rng,
) -> Vec<Decoration> {
    let tile = grid.tile_size();
    let mut decorations = Vec::new();
    for (col, row, kind) in grid.iter() {
        let center = grid.tile_center(col, row);
        let decoration = match kind {
            TerrainKind::Park if rng.gen_bool(PARK_TREE_CHANCE) => Some(tree(center, tile, rng)),
            TerrainKind::Forest if rng.gen_bool(FOREST_TREE_CHANCE) => {
                Some(tree(center, tile, rng))
            }
            TerrainKind::Sidewalk if rng.gen_bool(LAMP_POST_CHANCE) => Some(Decoration {
                kind: DecorationKind::LampPost,
                position: center,
                size: Vec2::new(tile * 0.15, tile * 0.6),
                color: [214, 206, 120, 255],
            }),
            TerrainKind::Grass => grass_prop(layout, center, tile, rng),
            TerrainKind::Flower if rng.gen_bool(FLOWER_CHANCE) => {
                let color = FLOWER_PALETTE
                    .choose(rng)
                    .copied()
                    .unwrap_or(FLOWER_PALETTE[0]);
                Some(Decoration {
                    kind: DecorationKind::Flower,
                    position: jitter(center, tile * 0.3, rng),
                    size: Vec2::new(tile * 0.25, tile * 0.25),
                    color,
                })
            }
            TerrainKind::Stone => Some(Decoration {
                kind: DecorationKind::Rock,
                position: center,
                size: Vec2::new(rng.gen_range(12.0..=20.0), rng.gen_range(8.0..=14.0)),
                color: [0x88, 0x88, 0x88, 255],
            }),
            _ => None,
        };
        decorations.extend(decoration);
    }
    decorations
}

fn tree(center: Vec2, tile: f32, rng: &mut impl Rng) -> Decoration {
    let diameter = tile * rng.gen_range(0.55..=0.85);
    Decoration {
        kind: DecorationKind::Tree,
        position: jitter(center, tile * 0.15, rng),
        size: Vec2::new(diameter, diameter),
        color: [0x1e, 0x4d, 0x1e, 255],
    }
}

fn grass_prop(
    layout: MapLayout,
    center: Vec2,
    tile: f32,
    rng: &mut impl Rng,
) -> Option<Decoration> {
    match layout {
        MapLayout::City if rng.gen_bool(SHRUB_CHANCE) => Some(Decoration {
            kind: DecorationKind::Shrub,
            position: jitter(center, tile * 0.25, rng),
            size: Vec2::new(tile * 0.4, tile * 0.3),
            color: [0x3a, 0x6b, 0x2e, 255],
        }),
        MapLayout::Wilderness if rng.gen_bool(GRASS_TUFT_CHANCE) => Some(Decoration {
            kind: DecorationKind::GrassTuft,
            position: jitter(center, tile * 0.3, rng),
            size: Vec2::new(tile * 0.2, tile * 0.25),
            color: [0x3d, 0x6b, 0x35, 255],
        }),
        _ => None,
    }
}

fn jitter(center: Vec2, max_offset: f32, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        center.x + rng.gen_range(-max_offset..=max_offset),
        center.y + rng.gen_range(-max_offset..=max_offset),
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::app::world::terrain::{generate_terrain, MapLayout, TerrainParams};

    #[test]
    fn city_decorations_sit_on_matching_terrain() {
        let grid = generate_terrain(&TerrainParams::default(), &mut ChaCha8Rng::seed_from_u64(2))
            .expect("city");
        let decorations =
            place_decorations(&grid, MapLayout::City, &mut ChaCha8Rng::seed_from_u64(3));
        assert!(!decorations.is_empty());
        assert!(decorations
            .iter()
            .any(|decoration| decoration.kind == DecorationKind::Shrub));
        for decoration in &decorations {
            let (col, row) = grid.tile_coords_at(decoration.position);
            let kind = grid.get(col, row);
            match decoration.kind {
                DecorationKind::LampPost => assert_eq!(kind, Some(TerrainKind::Sidewalk)),
                DecorationKind::Tree => assert_eq!(kind, Some(TerrainKind::Park)),
                DecorationKind::Shrub => assert_eq!(kind, Some(TerrainKind::Grass)),
                other => panic!("unexpected city decoration {other:?}"),
            }
        }
    }

    #[test]
    fn every_stone_tile_gets_a_rock() {
        let params = TerrainParams {
            layout: MapLayout::Wilderness,
            ..TerrainParams::default()
        };
        let grid = generate_terrain(&params, &mut ChaCha8Rng::seed_from_u64(8)).expect("wild");
        let decorations =
            place_decorations(&grid, MapLayout::Wilderness, &mut ChaCha8Rng::seed_from_u64(9));
        let rocks: Vec<_> = decorations
            .iter()
            .filter(|decoration| decoration.kind == DecorationKind::Rock)
            .collect();
        assert_eq!(rocks.len(), grid.count(TerrainKind::Stone));
        for rock in rocks {
            assert!((12.0..=20.0).contains(&rock.size.x));
            assert!((8.0..=14.0).contains(&rock.size.y));
        }
    }

    #[test]
    fn flowers_use_palette_colors() {
        let params = TerrainParams {
            layout: MapLayout::Wilderness,
            ..TerrainParams::default()
        };
        let grid = generate_terrain(&params, &mut ChaCha8Rng::seed_from_u64(4)).expect("wild");
        let decorations =
            place_decorations(&grid, MapLayout::Wilderness, &mut ChaCha8Rng::seed_from_u64(5));
        assert!(decorations
            .iter()
            .filter(|decoration| decoration.kind == DecorationKind::Flower)
            .all(|flower| FLOWER_PALETTE.contains(&flower.color)));
    }

    #[test]
    fn wilderness_grass_gets_tufts_and_never_shrubs() {
        let params = TerrainParams {
            layout: MapLayout::Wilderness,
            ..TerrainParams::default()
        };
        let grid = generate_terrain(&params, &mut ChaCha8Rng::seed_from_u64(12)).expect("wild");
        let decorations =
            place_decorations(&grid, MapLayout::Wilderness, &mut ChaCha8Rng::seed_from_u64(13));
        let tufts = decorations
            .iter()
            .filter(|decoration| decoration.kind == DecorationKind::GrassTuft)
            .count();
        assert!(tufts > 0);
        for decoration in &decorations {
            assert_ne!(decoration.kind, DecorationKind::Shrub);
            assert_ne!(decoration.kind, DecorationKind::LampPost);
            if decoration.kind == DecorationKind::GrassTuft {
                let (col, row) = grid.tile_coords_at(decoration.position);
                assert_eq!(grid.get(col, row), Some(TerrainKind::Grass));
            }
        }
    }
}
