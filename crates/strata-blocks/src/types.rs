pub type BlockId = u16;
pub type BlockState = u16;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Block {
    pub id: BlockId,
    pub state: BlockState,
}

impl Block {
    pub const AIR: Block = Block { id: 0, state: 0 };

    #[inline]
    pub const fn new(id: BlockId, state: BlockState) -> Self {
        Self { id, state }
    }

    #[inline]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }
}

/// How a block contributes to geometry and to sight lines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum RenderKind {
    /// No geometry, never blocks sight.
    #[default]
    Invisible,
    /// Full cube that hides neighbours and blocks sight.
    Opaque,
    /// Alpha-tested cube (leaves, glass panes); drawn in the opaque pass but see-through.
    Cutout,
    /// Blended cube drawn in the translucent pass.
    Translucent,
    /// Fluid volume; geometry comes from the fluid mesher.
    Fluid,
}

impl RenderKind {
    #[inline]
    pub fn is_opaque(self) -> bool {
        matches!(self, RenderKind::Opaque)
    }

    #[inline]
    pub fn is_translucent(self) -> bool {
        matches!(self, RenderKind::Translucent | RenderKind::Fluid)
    }

    #[inline]
    pub fn has_geometry(self) -> bool {
        !matches!(self, RenderKind::Invisible)
    }

    pub fn from_str(s: &str) -> Option<RenderKind> {
        match s {
            "invisible" | "air" => Some(RenderKind::Invisible),
            "opaque" | "solid" => Some(RenderKind::Opaque),
            "cutout" => Some(RenderKind::Cutout),
            "translucent" => Some(RenderKind::Translucent),
            "fluid" => Some(RenderKind::Fluid),
            _ => None,
        }
    }
}

/// Fluid level stored in the low three bits of the state; 0 is a source block.
#[inline]
pub fn fluid_level(state: BlockState) -> u8 {
    (state & 0x7) as u8
}

/// Surface height of a fluid cell in block units.
#[inline]
pub fn fluid_height(state: BlockState) -> f32 {
    (8 - fluid_level(state)) as f32 / 9.0
}
