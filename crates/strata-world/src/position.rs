use serde::{Deserialize, Serialize};
use strata_geom::{Aabb, Vec3};

use crate::direction::Direction;

/// Edge length of a cubic section in blocks.
pub const SECTION_SIZE: i32 = 16;

/// Column key in chunk units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Lateral neighbour; vertical directions return `self`.
    #[inline]
    pub fn neighbour(self, dir: Direction) -> Self {
        let (dx, _, dz) = dir.vector();
        self.offset(dx, dz)
    }

    /// Chessboard distance in columns.
    #[inline]
    pub fn chebyshev(self, other: ChunkPosition) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkPosition) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }

    #[inline]
    pub fn section(self, height: i32) -> SectionPosition {
        SectionPosition::new(self.x, height, self.z)
    }
}

impl From<(i32, i32)> for ChunkPosition {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkPosition> for (i32, i32) {
    fn from(value: ChunkPosition) -> Self {
        (value.x, value.z)
    }
}

/// Section key in section units; `y` is the absolute section height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectionPosition {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn chunk(self) -> ChunkPosition {
        ChunkPosition::new(self.x, self.z)
    }

    #[inline]
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.vector();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// World-space corner with the smallest coordinates.
    #[inline]
    pub fn origin(self) -> Vec3 {
        Vec3::new(
            (self.x * SECTION_SIZE) as f32,
            (self.y * SECTION_SIZE) as f32,
            (self.z * SECTION_SIZE) as f32,
        )
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        self.origin() + Vec3::splat(SECTION_SIZE as f32 / 2.0)
    }

    #[inline]
    pub fn aabb(self) -> Aabb {
        let o = self.origin();
        Aabb::new(o, o + Vec3::splat(SECTION_SIZE as f32))
    }

    /// Squared distance in section units.
    #[inline]
    pub fn distance_sq(self, other: SectionPosition) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let dz = i64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for SectionPosition {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Block offset inside a section, each axis in `0..16`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InSectionPosition {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl InSectionPosition {
    pub const MIN: InSectionPosition = InSectionPosition { x: 0, y: 0, z: 0 };
    pub const MAX: InSectionPosition = InSectionPosition {
        x: 15,
        y: 15,
        z: 15,
    };

    #[inline]
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        debug_assert!(x < 16 && y < 16 && z < 16);
        Self { x, y, z }
    }

    #[inline]
    pub fn index(self) -> usize {
        ((self.y as usize) << 8) | ((self.z as usize) << 4) | self.x as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Self {
        Self {
            x: (i & 0xF) as u8,
            y: ((i >> 8) & 0xF) as u8,
            z: ((i >> 4) & 0xF) as u8,
        }
    }

    /// Faces of the section this block touches.
    pub fn border_directions(self) -> impl Iterator<Item = Direction> {
        let p = self;
        Direction::ALL.into_iter().filter(move |d| match d {
            Direction::Down => p.y == 0,
            Direction::Up => p.y == 15,
            Direction::North => p.z == 0,
            Direction::South => p.z == 15,
            Direction::West => p.x == 0,
            Direction::East => p.x == 15,
        })
    }
}

/// Absolute block coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn section(self) -> SectionPosition {
        SectionPosition::new(
            self.x.div_euclid(SECTION_SIZE),
            self.y.div_euclid(SECTION_SIZE),
            self.z.div_euclid(SECTION_SIZE),
        )
    }

    #[inline]
    pub fn in_section(self) -> InSectionPosition {
        InSectionPosition {
            x: self.x.rem_euclid(SECTION_SIZE) as u8,
            y: self.y.rem_euclid(SECTION_SIZE) as u8,
            z: self.z.rem_euclid(SECTION_SIZE) as u8,
        }
    }

    /// Block containing a world-space point.
    #[inline]
    pub fn containing(p: Vec3) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
    }
}
