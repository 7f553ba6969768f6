use serde::{Deserialize, Serialize};

use crate::refine::RefineSettings;
use crate::types::{Scene, SceneSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetFlags {
    pub get_transform: bool,
    pub get_points: bool,
    pub get_normals: bool,
    pub get_tangents: bool,
    pub get_uv: bool,
    pub get_colors: bool,
    pub get_indices: bool,
    pub get_bones: bool,
    pub get_blendshapes: bool,
    pub bake_skin: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GetMessage {
    pub flags: GetFlags,
    pub scene_settings: SceneSettings,
    pub refine_settings: RefineSettings,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetMessage {
    pub scene: Scene,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Identifier {
    pub path: String,
    pub id: i32,
}

impl Identifier {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteMessage {
    pub targets: Vec<Identifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FenceType {
    #[default]
    Unknown,
    SceneBegin,
    SceneEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FenceMessage {
    pub fence_type: FenceType,
}

impl FenceMessage {
    pub fn new(fence_type: FenceType) -> Self {
        Self { fence_type }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextType {
    #[default]
    Normal,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: String,
    pub text_type: TextType,
}

impl TextMessage {
    pub fn new(text: impl Into<String>, text_type: TextType) -> Self {
        Self {
            text: text.into(),
            text_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenshotMessage {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryType {
    #[default]
    Unknown,
    PluginVersion,
    ProtocolVersion,
    HostName,
    RootNodes,
    AllNodes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryMessage {
    pub query_type: QueryType,
}

impl QueryMessage {
    pub fn new(query_type: QueryType) -> Self {
        Self { query_type }
    }
}
