use strata_geom::Vec3;
use strata_world::Direction;

use crate::face::{face_corners, normal};

/// Growable vertex/index buffers for one render pass.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.col.reserve(n_quads * 4 * 4);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Appends a quad with explicit per-vertex UVs, fixing the winding to face `n`.
    pub fn add_quad_uv(&mut self, corners: [Vec3; 4], n: Vec3, mut uvs: [(f32, f32); 4], rgba: [u8; 4]) {
        let base = self.vertex_count() as u32;
        let [a, b, c, d] = corners;
        let mut vs = [a, d, c, b];
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..4 {
            self.pos.extend_from_slice(&[vs[i].x, vs[i].y, vs[i].z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[uvs[i].0, -uvs[i].1]);
            self.col.extend_from_slice(&rgba);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Emits a face-aligned rectangle for `dir` at `origin` with size `(u1, v1)`.
    pub fn add_face_rect(&mut self, dir: Direction, origin: Vec3, u1: f32, v1: f32, rgba: [u8; 4]) {
        let [a, b, c, d] = face_corners(dir, origin, u1, v1);
        // Absolute UVs from world-space coordinates keep tiling seamless across sections.
        let uv_from = |p: Vec3| match dir {
            Direction::Up | Direction::Down => (p.x, p.z),
            Direction::East | Direction::West => (p.z, p.y),
            Direction::North | Direction::South => (p.x, p.y),
        };
        let uvs = [uv_from(a), uv_from(d), uv_from(c), uv_from(b)];
        self.add_quad_uv([a, b, c, d], normal(dir), uvs, rgba);
    }

    /// Checks the buffers describe whole quads with in-range indices.
    pub fn check_consistency(&self) -> Result<(), String> {
        let verts = self.vertex_count();
        if self.pos.len() % 3 != 0 {
            return Err(format!("position buffer length {} is not a multiple of 3", self.pos.len()));
        }
        if self.norm.len() != self.pos.len() {
            return Err(format!("{} normals for {} positions", self.norm.len() / 3, verts));
        }
        if self.uv.len() != verts * 2 || self.col.len() != verts * 4 {
            return Err(format!(
                "attribute size mismatch: {} vertices, {} uvs, {} colours",
                verts,
                self.uv.len() / 2,
                self.col.len() / 4
            ));
        }
        if self.idx.len() % 6 != 0 || verts % 4 != 0 {
            return Err(format!("{} indices over {} vertices is not whole quads", self.idx.len(), verts));
        }
        if let Some(bad) = self.idx.iter().find(|i| **i as usize >= verts) {
            return Err(format!("index {bad} out of range for {verts} vertices"));
        }
        Ok(())
    }

    /// Approximate heap size of the buffers in bytes.
    pub fn byte_size(&self) -> usize {
        (self.pos.len() + self.norm.len() + self.uv.len()) * 4 + self.idx.len() * 4 + self.col.len()
    }
}
