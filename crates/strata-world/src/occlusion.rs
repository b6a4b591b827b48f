//! Face-to-face sight occlusion of a single section.
//!
//! The mask stores one bit per unordered pair of distinct faces (15 pairs). A set
//! bit means no path of see-through cells connects the two faces, so a sight
//! line entering through one face can never leave through the other.

use crate::direction::Direction;

const SIZE: usize = 16;
const VOLUME: usize = SIZE * SIZE * SIZE;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SectionOcclusion {
    mask: u16,
}

#[inline]
fn pair_bit(a: Direction, b: Direction) -> u16 {
    let (lo, hi) = if a.index() < b.index() {
        (a.index(), b.index())
    } else {
        (b.index(), a.index())
    };
    // Row offsets of the strict upper triangle of a 6x6 matrix.
    const ROW: [usize; 6] = [0, 5, 9, 12, 14, 15];
    1 << (ROW[lo] + (hi - lo - 1))
}

impl SectionOcclusion {
    /// Nothing occluded; an empty or missing section.
    pub const NONE: SectionOcclusion = SectionOcclusion { mask: 0 };
    /// Every pair occluded; a fully opaque section.
    pub const ALL: SectionOcclusion = SectionOcclusion { mask: 0x7FFF };

    #[inline]
    pub fn from_bits(mask: u16) -> Self {
        Self {
            mask: mask & 0x7FFF,
        }
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.mask
    }

    /// Whether sight entering through `from` cannot leave through `to`.
    /// A face is never occluded from itself.
    #[inline]
    pub fn is_occluded(self, from: Direction, to: Direction) -> bool {
        if from == to {
            return false;
        }
        self.mask & pair_bit(from, to) != 0
    }

    /// Flood fills the see-through cells of a 16^3 section and records which
    /// faces each connected region touches. `opaque` is indexed `(y << 8) | (z << 4) | x`.
    pub fn compute(opaque: &[bool]) -> Self {
        debug_assert_eq!(opaque.len(), VOLUME);
        let opaque_count = opaque.iter().filter(|o| **o).count();
        if opaque_count == 0 {
            return Self::NONE;
        }
        if opaque_count == VOLUME {
            return Self::ALL;
        }
        let mut visited = vec![false; VOLUME];
        let mut stack: Vec<usize> = Vec::with_capacity(256);
        let mut connected: u16 = 0;
        for start in 0..VOLUME {
            if opaque[start] || visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);
            let mut faces: u8 = 0;
            while let Some(i) = stack.pop() {
                let x = i & 0xF;
                let z = (i >> 4) & 0xF;
                let y = i >> 8;
                faces |= touched_faces(x, y, z);
                let mut visit = |j: usize| {
                    if !opaque[j] && !visited[j] {
                        visited[j] = true;
                        stack.push(j);
                    }
                };
                if x > 0 {
                    visit(i - 1);
                }
                if x < SIZE - 1 {
                    visit(i + 1);
                }
                if z > 0 {
                    visit(i - SIZE);
                }
                if z < SIZE - 1 {
                    visit(i + SIZE);
                }
                if y > 0 {
                    visit(i - SIZE * SIZE);
                }
                if y < SIZE - 1 {
                    visit(i + SIZE * SIZE);
                }
            }
            for a in Direction::ALL {
                if faces & (1 << a.index()) == 0 {
                    continue;
                }
                for b in Direction::ALL {
                    if b.index() > a.index() && faces & (1 << b.index()) != 0 {
                        connected |= pair_bit(a, b);
                    }
                }
            }
            if connected == 0x7FFF {
                break;
            }
        }
        Self {
            mask: !connected & 0x7FFF,
        }
    }
}

#[inline]
fn touched_faces(x: usize, y: usize, z: usize) -> u8 {
    let mut f = 0u8;
    if y == 0 {
        f |= 1 << Direction::Down.index();
    }
    if y == SIZE - 1 {
        f |= 1 << Direction::Up.index();
    }
    if z == 0 {
        f |= 1 << Direction::North.index();
    }
    if z == SIZE - 1 {
        f |= 1 << Direction::South.index();
    }
    if x == 0 {
        f |= 1 << Direction::West.index();
    }
    if x == SIZE - 1 {
        f |= 1 << Direction::East.index();
    }
    f
}
