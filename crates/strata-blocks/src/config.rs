use serde::Deserialize;

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    // Block substituted for ids the registry does not know when building meshes.
    #[serde(default)]
    pub unknown_block: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    // "opaque" when absent
    #[serde(default)]
    pub render: Option<String>,
    #[serde(default)]
    pub color: Option<ColorDef>,
    #[serde(default)]
    pub seam: Option<SeamPolicyCfg>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ColorDef {
    Rgba([u8; 4]),
    Rgb([u8; 3]),
    Hex(String),
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(untagged)]
pub enum SeamPolicyCfg {
    Simple(SeamPolicySimple),
    Flags(SeamPolicyFlagsCfg),
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SeamPolicySimple {
    Default,
    DontOccludeSame,
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct SeamPolicyFlagsCfg {
    #[serde(default)]
    pub dont_occlude_same: bool,
}
