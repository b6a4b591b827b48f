use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::config::{BlocksConfig, ColorDef, SeamPolicyCfg, SeamPolicyFlagsCfg, SeamPolicySimple};
use super::types::{Block, BlockId, RenderKind};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read block config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse block config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("block id 0 is reserved for air (got `{0}`)")]
    ReservedId(String),
    #[error("duplicate block name `{0}`")]
    DuplicateName(String),
    #[error("blocks `{0}` and `{1}` share id {2}")]
    DuplicateId(String, String, BlockId),
    #[error("unknown render kind `{kind}` on block `{block}`")]
    UnknownRenderKind { block: String, kind: String },
    #[error("invalid colour `{value}` on block `{block}`")]
    InvalidColor { block: String, value: String },
    #[error("unknown_block names undefined block `{0}`")]
    UnknownFallback(String),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SeamPolicy {
    /// Faces between two blocks of this type are kept (glass walls, water bodies).
    pub dont_occlude_same: bool,
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub kind: RenderKind,
    pub color: [u8; 4],
    pub seam: SeamPolicy,
    // 6 bits in face order; every face of an opaque cube occludes
    pub occ_mask: u8,
}

impl BlockType {
    fn air() -> Self {
        BlockType {
            id: 0,
            name: "air".into(),
            kind: RenderKind::Invisible,
            color: [0, 0, 0, 0],
            seam: SeamPolicy::default(),
            occ_mask: 0,
        }
    }

    fn placeholder(id: BlockId) -> Self {
        BlockType {
            id,
            name: String::new(),
            ..BlockType::air()
        }
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.kind.is_opaque()
    }

    #[inline]
    pub fn is_fluid(&self) -> bool {
        self.kind == RenderKind::Fluid
    }
}

#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub unknown_block_id: Option<BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Registry holding only air.
    pub fn new() -> Self {
        let air = BlockType::air();
        let by_name = HashMap::from([(air.name.clone(), 0)]);
        Self {
            blocks: vec![air],
            by_name,
            unknown_block_id: None,
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn make_block_by_name(&self, name: &str) -> Option<Block> {
        self.id_by_name(name).map(|id| Block { id, state: 0 })
    }

    /// Render kind of `block`; ids the registry does not know resolve to the fallback, else invisible.
    #[inline]
    pub fn kind_of(&self, block: Block) -> RenderKind {
        self.resolve(block.id).map(|t| t.kind).unwrap_or_default()
    }

    /// Type for `id`, falling back to `unknown_block` for unregistered ids.
    #[inline]
    pub fn resolve(&self, id: BlockId) -> Option<&BlockType> {
        match self.get(id) {
            Some(t) if id == 0 || !t.name.is_empty() => Some(t),
            _ => self.unknown_block_id.and_then(|u| self.get(u)),
        }
    }

    #[inline]
    pub fn is_opaque(&self, block: Block) -> bool {
        self.kind_of(block).is_opaque()
    }

    #[inline]
    pub fn is_fluid(&self, block: Block) -> bool {
        self.kind_of(block) == RenderKind::Fluid
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RegistryError> {
        let cfg: BlocksConfig = toml::from_str(text)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, RegistryError> {
        let mut reg = BlockRegistry::new();
        for def in cfg.blocks.into_iter() {
            if def.name == "air" {
                continue;
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateName(def.name));
            }
            let id = def.id.unwrap_or(reg.blocks.len() as u16);
            if id == 0 {
                return Err(RegistryError::ReservedId(def.name));
            }
            if let Some(prev) = reg.get(id).filter(|t| !t.name.is_empty()) {
                return Err(RegistryError::DuplicateId(prev.name.clone(), def.name, id));
            }
            let kind = match def.render.as_deref() {
                None => RenderKind::Opaque,
                Some(s) => RenderKind::from_str(s).ok_or_else(|| {
                    RegistryError::UnknownRenderKind {
                        block: def.name.clone(),
                        kind: s.to_string(),
                    }
                })?,
            };
            let color = match def.color {
                None => [255, 255, 255, 255],
                Some(c) => parse_color(&c).ok_or_else(|| RegistryError::InvalidColor {
                    block: def.name.clone(),
                    value: format!("{c:?}"),
                })?,
            };
            let seam = match def.seam {
                Some(SeamPolicyCfg::Simple(SeamPolicySimple::DontOccludeSame)) => SeamPolicy {
                    dont_occlude_same: true,
                },
                Some(SeamPolicyCfg::Flags(SeamPolicyFlagsCfg { dont_occlude_same })) => {
                    SeamPolicy { dont_occlude_same }
                }
                Some(SeamPolicyCfg::Simple(SeamPolicySimple::Default)) | None => {
                    // Fluids merge with themselves unless told otherwise.
                    SeamPolicy {
                        dont_occlude_same: false,
                    }
                }
            };
            let ty = BlockType {
                id,
                name: def.name,
                kind,
                color,
                seam,
                occ_mask: if kind.is_opaque() { 0b11_1111 } else { 0 },
            };
            if reg.blocks.len() <= id as usize {
                reg.blocks
                    .resize(id as usize + 1, BlockType::placeholder(id));
            }
            reg.by_name.insert(ty.name.clone(), id);
            reg.blocks[id as usize] = ty;
        }
        if let Some(name) = cfg.unknown_block {
            let id = reg
                .id_by_name(&name)
                .ok_or(RegistryError::UnknownFallback(name))?;
            reg.unknown_block_id = Some(id);
        }
        Ok(reg)
    }

    /// Whether `here` hides its face toward `neighbor`.
    #[inline]
    pub fn occludes_face(&self, here: Block, neighbor: Block) -> bool {
        let Some(n) = self.resolve(neighbor.id) else {
            return false;
        };
        if n.is_opaque() {
            return true;
        }
        if here.id == neighbor.id && here.id != 0 {
            return self
                .resolve(here.id)
                .map(|t| !t.seam.dont_occlude_same && t.kind != RenderKind::Opaque)
                .unwrap_or(false);
        }
        false
    }
}

fn parse_color(c: &ColorDef) -> Option<[u8; 4]> {
    match c {
        ColorDef::Rgba(v) => Some(*v),
        ColorDef::Rgb([r, g, b]) => Some([*r, *g, *b, 255]),
        ColorDef::Hex(s) => {
            let s = s.strip_prefix('#').unwrap_or(s);
            let byte = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
            match s.len() {
                6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
                8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = r##"
        unknown_block = "unknown"

        [[blocks]]
        name = "stone"
        color = "#7f7f7f"

        [[blocks]]
        name = "glass"
        render = "cutout"
        seam = "dont_occlude_same"

        [[blocks]]
        name = "water"
        render = "fluid"
        color = [40, 80, 220, 160]

        [[blocks]]
        name = "unknown"
        id = 9
        color = [255, 0, 255]
    "##;

    #[test]
    fn parses_kinds_and_colours() {
        let reg = BlockRegistry::from_toml_str(BLOCKS).unwrap();
        let stone = reg.get(reg.id_by_name("stone").unwrap()).unwrap();
        assert_eq!(stone.kind, RenderKind::Opaque);
        assert_eq!(stone.color, [0x7f, 0x7f, 0x7f, 255]);
        assert_eq!(stone.occ_mask, 0b11_1111);
        let water = reg.make_block_by_name("water").unwrap();
        assert!(reg.is_fluid(water));
        assert_eq!(reg.get(9).unwrap().color, [255, 0, 255, 255]);
        assert_eq!(reg.kind_of(Block::AIR), RenderKind::Invisible);
    }

    #[test]
    fn unknown_ids_resolve_to_fallback() {
        let reg = BlockRegistry::from_toml_str(BLOCKS).unwrap();
        // id 5 is a hole between registered ids
        assert_eq!(reg.resolve(5).unwrap().name, "unknown");
        assert_eq!(reg.resolve(500).unwrap().name, "unknown");
    }

    #[test]
    fn rejects_reserved_and_duplicate_ids() {
        let err = BlockRegistry::from_toml_str("[[blocks]]\nname = \"x\"\nid = 0\n").unwrap_err();
        assert!(matches!(err, RegistryError::ReservedId(_)));
        let err = BlockRegistry::from_toml_str(
            "[[blocks]]\nname = \"a\"\nid = 3\n[[blocks]]\nname = \"b\"\nid = 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(_, _, 3)));
        let err = BlockRegistry::from_toml_str("[[blocks]]\nname = \"a\"\nrender = \"shiny\"\n")
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRenderKind { .. }));
    }

    #[test]
    fn seam_policy_controls_same_type_faces() {
        let reg = BlockRegistry::from_toml_str(BLOCKS).unwrap();
        let glass = reg.make_block_by_name("glass").unwrap();
        let water = reg.make_block_by_name("water").unwrap();
        let stone = reg.make_block_by_name("stone").unwrap();
        assert!(!reg.occludes_face(glass, glass));
        assert!(reg.occludes_face(water, water));
        assert!(reg.occludes_face(water, stone));
        assert!(!reg.occludes_face(stone, water));
        assert!(!reg.occludes_face(stone, Block::AIR));
    }
}
