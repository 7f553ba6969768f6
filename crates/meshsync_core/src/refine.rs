//! Scene normalization.
//!
//! Incoming scenes are converted from the client's coordinate convention into
//! the host's (left-handed, y-up, host units); outgoing scenes are converted
//! back using the settings the requesting client sent. Mesh geometry goes
//! through a [`Refiner`], everything else uses the objects' own conversions.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::scene::{flip_x, swap_yz_vec};
use crate::types::{EntityBody, Mesh, Scene, SceneSettings, TransformData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RefineFlags {
    pub swap_handedness: bool,
    pub swap_yz: bool,
    pub triangulate: bool,
    pub split: bool,
    pub optimize_topology: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefineSettings {
    pub flags: RefineFlags,
    pub scale_factor: f32,
    pub smooth_angle: f32,
    pub split_unit: u32,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            flags: RefineFlags::default(),
            scale_factor: 1.0,
            smooth_angle: 0.0,
            split_unit: 0,
        }
    }
}

/// Axis conversion derived from a client's scene settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub swap_handedness: bool,
    pub swap_yz: bool,
    /// `1 / scale_factor`; `None` when the client already works in host units.
    pub inverse_scale: Option<f32>,
}

impl Conversion {
    pub fn from_settings(settings: &SceneSettings) -> Self {
        let inverse_scale = if settings.scale_factor != 1.0 {
            Some(1.0 / settings.scale_factor)
        } else {
            None
        };
        Self {
            swap_handedness: settings.handedness.swaps_handedness(),
            swap_yz: settings.handedness.swaps_yz(),
            inverse_scale,
        }
    }

    pub fn swaps_axes(&self) -> bool {
        self.swap_handedness || self.swap_yz
    }
}

/// Mesh geometry processing applied according to a mesh's refine settings.
pub trait Refiner: Send + Sync {
    fn refine(&self, transform: &mut TransformData, mesh: &mut Mesh);
}

/// Refiner covering axis conversion, unit scaling and triangulation.
///
/// Splitting by `split_unit` and topology optimization are left to
/// specialised refiners; those flags are accepted and ignored here.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRefiner;

impl Refiner for BasicRefiner {
    fn refine(&self, transform: &mut TransformData, mesh: &mut Mesh) {
        let settings = mesh.refine_settings;
        let flags = settings.flags;

        if flags.swap_handedness || flags.swap_yz {
            transform.convert_handedness(flags.swap_handedness, flags.swap_yz);
            convert_points(&mut mesh.points, flags.swap_handedness, flags.swap_yz);
            convert_points(&mut mesh.normals, flags.swap_handedness, flags.swap_yz);
            // a single mirror reverses the winding, two cancel out
            if flags.swap_handedness != flags.swap_yz {
                flip_faces(mesh);
            }
        }

        if settings.scale_factor != 1.0 {
            transform.apply_scale_factor(settings.scale_factor);
            mesh.points
                .iter_mut()
                .for_each(|p| *p *= settings.scale_factor);
        }

        if flags.triangulate && !mesh.is_triangulated() {
            triangulate(mesh);
        }
    }
}

fn convert_points(points: &mut [glam::Vec3], swap_x: bool, swap_yz: bool) {
    for p in points.iter_mut() {
        if swap_x {
            *p = flip_x(*p);
        }
        if swap_yz {
            *p = swap_yz_vec(*p);
        }
    }
}

fn flip_faces(mesh: &mut Mesh) {
    let mut offset = 0usize;
    for &count in &mesh.counts {
        let end = (offset + count as usize).min(mesh.indices.len());
        mesh.indices[offset..end].reverse();
        offset = end;
    }
}

fn triangulate(mesh: &mut Mesh) {
    let mut counts = Vec::with_capacity(mesh.counts.len());
    let mut indices = Vec::with_capacity(mesh.indices.len());
    let mut offset = 0usize;

    for &count in &mesh.counts {
        let count = count as usize;
        let Some(face) = mesh.indices.get(offset..offset + count) else {
            break;
        };
        for i in 1..count.saturating_sub(1) {
            indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
            counts.push(3);
        }
        offset += count;
    }

    mesh.counts = counts;
    mesh.indices = indices;
}

/// Converts a freshly received scene into host space.
///
/// Runs on the rayon pool; callers must not hold the server lock.
pub fn normalize_incoming(scene: &mut Scene, split_unit: u32, refiner: &dyn Refiner) {
    let conversion = Conversion::from_settings(&scene.settings);
    let mesh_settings = RefineSettings {
        flags: RefineFlags {
            swap_handedness: conversion.swap_handedness,
            swap_yz: conversion.swap_yz,
            triangulate: true,
            split: true,
            optimize_topology: true,
        },
        scale_factor: 1.0 / scene.settings.scale_factor,
        smooth_angle: 0.0,
        split_unit,
    };

    scene.objects.par_iter_mut().for_each(|obj| {
        let entity = Arc::make_mut(obj);
        match &mut entity.body {
            EntityBody::Mesh(mesh) => {
                mesh.refine_settings = mesh_settings;
                refiner.refine(&mut entity.transform, mesh);
            }
            _ => {
                if conversion.swaps_axes() {
                    entity.convert_handedness(conversion.swap_handedness, conversion.swap_yz);
                }
                if let Some(scale) = conversion.inverse_scale {
                    entity.apply_scale_factor(scale);
                }
            }
        }
    });

    for clip in &mut scene.animations {
        clip.animations.par_iter_mut().for_each(|anim| {
            if conversion.swaps_axes() {
                anim.convert_handedness(conversion.swap_handedness, conversion.swap_yz);
            }
            if let Some(scale) = conversion.inverse_scale {
                anim.apply_scale_factor(scale);
            }
        });
    }
}

/// Derives the refine settings a get request asks for from its scene settings.
pub fn refine_settings_for(request: &RefineSettings, settings: &SceneSettings) -> RefineSettings {
    let mut refine = *request;
    refine.scale_factor = settings.scale_factor;
    refine.flags.swap_handedness = settings.handedness.swaps_handedness();
    refine.flags.swap_yz = settings.handedness.swaps_yz();
    refine
}

/// Converts every mesh of a host-populated scene into the requesting client's space.
pub fn refine_outgoing(scene: &mut Scene, request: &RefineSettings, refiner: &dyn Refiner) {
    scene.objects.par_iter_mut().for_each(|obj| {
        if obj.as_mesh().is_none() {
            return;
        }
        let entity = Arc::make_mut(obj);
        if let EntityBody::Mesh(mesh) = &mut entity.body {
            mesh.flags.has_refine_settings = true;
            mesh.refine_settings.flags = request.flags;
            mesh.refine_settings.scale_factor = request.scale_factor;
            mesh.refine_settings.smooth_angle = 180.0;
            refiner.refine(&mut entity.transform, mesh);
        }
    });
}
