use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::refine::RefineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    #[default]
    Left,
    Right,
    LeftZUp,
    RightZUp,
}

impl Handedness {
    /// The x axis must be mirrored to reach the host's left-handed space.
    pub fn swaps_handedness(self) -> bool {
        matches!(self, Handedness::Right | Handedness::RightZUp)
    }

    /// The y and z axes must be exchanged to reach the host's y-up space.
    pub fn swaps_yz(self) -> bool {
        matches!(self, Handedness::LeftZUp | Handedness::RightZUp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    pub name: String,
    pub handedness: Handedness,
    pub scale_factor: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            handedness: Handedness::Left,
            scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub visible: bool,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
        }
    }
}

impl TransformData {
    pub fn convert_handedness(&mut self, swap_x: bool, swap_yz: bool) {
        if swap_x {
            self.position = flip_x(self.position);
            self.rotation = flip_x_rotation(self.rotation);
        }
        if swap_yz {
            self.position = swap_yz_vec(self.position);
            self.rotation = swap_yz_rotation(self.rotation);
            self.scale = swap_yz_vec(self.scale);
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.position *= scale;
    }
}

pub(crate) fn flip_x(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

pub(crate) fn flip_x_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

pub(crate) fn swap_yz_vec(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

pub(crate) fn swap_yz_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, q.z, q.y, -q.w)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Transform,
    Camera,
    Light,
    Mesh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub is_ortho: bool,
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            is_ortho: false,
            fov: 60.0,
            near_plane: 0.3,
            far_plane: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightType {
    Spot,
    #[default]
    Directional,
    Point,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub light_type: LightType,
    pub color: [f32; 4],
    pub intensity: f32,
    pub range: f32,
    pub spot_angle: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::Directional,
            color: [1.0; 4],
            intensity: 1.0,
            range: 0.0,
            spot_angle: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeshFlags {
    pub has_refine_settings: bool,
    pub has_normals: bool,
    pub has_uv: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub flags: MeshFlags,
    pub refine_settings: RefineSettings,
    pub points: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uv: Vec<Vec2>,
    /// Vertex count of each face.
    pub counts: Vec<u32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_triangulated(&self) -> bool {
        self.counts.iter().all(|&c| c == 3)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityBody {
    Transform,
    Camera(Camera),
    Light(Light),
    Mesh(Mesh),
}

/// A positioned object identified by its path within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i32,
    pub path: String,
    pub transform: TransformData,
    pub body: EntityBody,
}

impl Entity {
    pub fn new(path: impl Into<String>, body: EntityBody) -> Self {
        Self {
            id: 0,
            path: path.into(),
            transform: TransformData::default(),
            body,
        }
    }

    pub fn transform(path: impl Into<String>) -> Self {
        Self::new(path, EntityBody::Transform)
    }

    pub fn mesh(path: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(path, EntityBody::Mesh(mesh))
    }

    pub fn kind(&self) -> EntityKind {
        match self.body {
            EntityBody::Transform => EntityKind::Transform,
            EntityBody::Camera(_) => EntityKind::Camera,
            EntityBody::Light(_) => EntityKind::Light,
            EntityBody::Mesh(_) => EntityKind::Mesh,
        }
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.body {
            EntityBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn convert_handedness(&mut self, swap_x: bool, swap_yz: bool) {
        self.transform.convert_handedness(swap_x, swap_yz);
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.transform.apply_scale_factor(scale);
        match &mut self.body {
            EntityBody::Camera(camera) => {
                camera.near_plane *= scale;
                camera.far_plane *= scale;
            }
            EntityBody::Light(light) => light.range *= scale,
            EntityBody::Transform | EntityBody::Mesh(_) => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    pub time: f32,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Animation {
    pub path: String,
    pub translation: Vec<Key<Vec3>>,
    pub rotation: Vec<Key<Quat>>,
    pub scale: Vec<Key<Vec3>>,
}

impl Animation {
    pub fn convert_handedness(&mut self, swap_x: bool, swap_yz: bool) {
        if swap_x {
            self.translation.iter_mut().for_each(|k| k.value = flip_x(k.value));
            self.rotation
                .iter_mut()
                .for_each(|k| k.value = flip_x_rotation(k.value));
        }
        if swap_yz {
            self.translation
                .iter_mut()
                .for_each(|k| k.value = swap_yz_vec(k.value));
            self.rotation
                .iter_mut()
                .for_each(|k| k.value = swap_yz_rotation(k.value));
            self.scale.iter_mut().for_each(|k| k.value = swap_yz_vec(k.value));
        }
    }

    pub fn apply_scale_factor(&mut self, scale: f32) {
        self.translation.iter_mut().for_each(|k| k.value *= scale);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub animations: Vec<Animation>,
}

/// A snapshot of authored content. Object paths are unique within a scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub settings: SceneSettings,
    pub objects: Vec<Arc<Entity>>,
    pub animations: Vec<AnimationClip>,
}

impl Scene {
    pub fn with_settings(settings: SceneSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn find(&self, path: &str) -> Option<&Arc<Entity>> {
        self.objects.iter().find(|obj| obj.path == path)
    }

    /// Adds an object, replacing any existing object with the same path.
    pub fn insert(&mut self, entity: impl Into<Arc<Entity>>) {
        let entity = entity.into();
        match self.objects.iter_mut().find(|obj| obj.path == entity.path) {
            Some(existing) => *existing = entity,
            None => self.objects.push(entity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.animations.is_empty()
    }
}
