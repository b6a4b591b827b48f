use strata_geom::Vec3;
use strata_world::Direction;

/// Unit normal pointing out of a block through `dir`.
#[inline]
pub fn normal(dir: Direction) -> Vec3 {
    let (x, y, z) = dir.vector();
    Vec3::new(x as f32, y as f32, z as f32)
}

/// Origin of the face rectangle of the unit cell at `cell` facing `dir`.
/// Positive faces sit one block further along their axis.
#[inline]
pub fn face_origin(dir: Direction, cell: Vec3) -> Vec3 {
    match dir {
        Direction::Up => Vec3::new(cell.x, cell.y + 1.0, cell.z),
        Direction::East => Vec3::new(cell.x + 1.0, cell.y, cell.z),
        Direction::South => Vec3::new(cell.x, cell.y, cell.z + 1.0),
        Direction::Down | Direction::West | Direction::North => cell,
    }
}

/// Corners `(a, b, c, d)` of a face rectangle of size `(u1, v1)` at `origin`.
/// `u` runs along x for horizontal faces and along the remaining lateral axis otherwise; `v` runs along y.
pub fn face_corners(dir: Direction, origin: Vec3, u1: f32, v1: f32) -> [Vec3; 4] {
    let o = origin;
    match dir {
        Direction::Up => [
            o,
            Vec3::new(o.x + u1, o.y, o.z),
            Vec3::new(o.x + u1, o.y, o.z + v1),
            Vec3::new(o.x, o.y, o.z + v1),
        ],
        Direction::Down => [
            Vec3::new(o.x, o.y, o.z + v1),
            Vec3::new(o.x + u1, o.y, o.z + v1),
            Vec3::new(o.x + u1, o.y, o.z),
            o,
        ],
        Direction::East => [
            Vec3::new(o.x, o.y + v1, o.z + u1),
            Vec3::new(o.x, o.y + v1, o.z),
            o,
            Vec3::new(o.x, o.y, o.z + u1),
        ],
        Direction::West => [
            Vec3::new(o.x, o.y + v1, o.z),
            Vec3::new(o.x, o.y + v1, o.z + u1),
            Vec3::new(o.x, o.y, o.z + u1),
            o,
        ],
        Direction::South => [
            Vec3::new(o.x + u1, o.y + v1, o.z),
            Vec3::new(o.x, o.y + v1, o.z),
            o,
            Vec3::new(o.x + u1, o.y, o.z),
        ],
        Direction::North => [
            Vec3::new(o.x, o.y + v1, o.z),
            Vec3::new(o.x + u1, o.y + v1, o.z),
            Vec3::new(o.x + u1, o.y, o.z),
            o,
        ],
    }
}

/// Shading factor baked into vertex colours so faces read apart without lighting.
#[inline]
pub fn shade(dir: Direction) -> f32 {
    match dir {
        Direction::Up => 1.0,
        Direction::Down => 0.5,
        Direction::North | Direction::South => 0.8,
        Direction::West | Direction::East => 0.65,
    }
}
