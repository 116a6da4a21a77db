//! Mesh geometry extraction.
//!
//! Reconstructs per-primitive vertex buffers from accessor data: indices,
//! positions, normals, tangents, texcoord layers, and for skinned meshes
//! joint index/weight layers. Attribute counts are validated against
//! POSITION before anything is returned.

use gltf::Semantic;

use crate::buffers::BufferStore;
use crate::error::{ExtractError, Result};
use crate::resolve::AccessorResolver;
use crate::space::SpaceConversion;

/// Texcoord layers kept per primitive; further layers are dropped.
pub const MAX_TEXCOORD_LAYERS: usize = 4;

/// Joint index/weight layers kept per primitive (4 influences each);
/// further layers are dropped.
pub const MAX_JOINT_LAYERS: usize = 3;

/// Vertex data for one primitive, in target space.
#[derive(Debug, Clone, Default)]
pub struct StaticMeshData {
    /// Triangle-list indices; synthesized 0..n for non-indexed primitives.
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    /// Empty when the primitive has no NORMAL attribute.
    pub normals: Vec<[f32; 3]>,
    /// xyz direction plus w handedness sign; empty when absent.
    pub tangents: Vec<[f32; 4]>,
    /// One entry per TEXCOORD layer; unused layers are empty.
    pub texcoords: [Vec<[f32; 2]>; MAX_TEXCOORD_LAYERS],
}

/// Skinned vertex data: static attributes plus joint influence layers.
#[derive(Debug, Clone, Default)]
pub struct SkeletalMeshData {
    pub mesh: StaticMeshData,
    /// One entry per JOINTS layer; unused layers are empty.
    pub joints: [Vec<[u16; 4]>; MAX_JOINT_LAYERS],
    /// One entry per WEIGHTS layer; unused layers are empty.
    pub weights: [Vec<[f32; 4]>; MAX_JOINT_LAYERS],
}

/// Extract the vertex data of a non-skinned primitive.
///
/// POSITION is mandatory; every other attribute is optional and left empty
/// when absent. Triangle winding is preserved as authored; a left-handed
/// target that needs reversed winding must reverse it itself.
pub fn extract_static_mesh(
    primitive: &gltf::Primitive,
    store: &BufferStore,
    resolver: &AccessorResolver,
    conversion: SpaceConversion,
) -> Result<StaticMeshData> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        tracing::warn!(
            "primitive mode {:?} is treated as a triangle list",
            primitive.mode()
        );
    }

    let position_accessor = primitive
        .get(&Semantic::Positions)
        .ok_or(ExtractError::MissingPositions)?;
    let positions = resolver.read_vec3_f32(store, &position_accessor)?;
    let vertex_count = positions.len();

    let indices = match primitive.indices() {
        Some(accessor) => resolver.read_indices(store, &accessor)?,
        None => (0..vertex_count as u32).collect(),
    };

    let normals = match primitive.get(&Semantic::Normals) {
        Some(accessor) => {
            let normals = resolver.read_vec3_f32(store, &accessor)?;
            check_count("NORMAL", normals.len(), vertex_count)?;
            normals
        }
        None => Vec::new(),
    };

    let tangents = match primitive.get(&Semantic::Tangents) {
        Some(accessor) => {
            let tangents = resolver.read_vec4_f32(store, &accessor)?;
            check_count("TANGENT", tangents.len(), vertex_count)?;
            tangents
        }
        None => Vec::new(),
    };

    let mut texcoords: [Vec<[f32; 2]>; MAX_TEXCOORD_LAYERS] = Default::default();
    for (layer, out) in texcoords.iter_mut().enumerate() {
        let Some(accessor) = primitive.get(&Semantic::TexCoords(layer as u32)) else {
            continue;
        };
        let uvs = resolver.read_texcoords(store, &accessor)?;
        check_count(&format!("TEXCOORD_{layer}"), uvs.len(), vertex_count)?;
        *out = uvs;
    }
    for (semantic, _) in primitive.attributes() {
        if let Semantic::TexCoords(layer) = semantic {
            if layer as usize >= MAX_TEXCOORD_LAYERS {
                tracing::warn!(
                    "TEXCOORD_{} exceeds the {} supported layers and is dropped",
                    layer,
                    MAX_TEXCOORD_LAYERS
                );
            }
        }
    }

    Ok(StaticMeshData {
        indices,
        positions: positions
            .into_iter()
            .map(|p| conversion.position(p))
            .collect(),
        normals: normals
            .into_iter()
            .map(|n| conversion.direction(n))
            .collect(),
        tangents: tangents
            .into_iter()
            .map(|t| conversion.tangent(t))
            .collect(),
        texcoords,
    })
}

/// Extract the vertex data of a skinned primitive.
///
/// Joint index/weight layers are extracted pairwise; an unpaired JOINTS or
/// WEIGHTS accessor drops that layer with a warning rather than failing.
pub fn extract_skeletal_mesh(
    primitive: &gltf::Primitive,
    store: &BufferStore,
    resolver: &AccessorResolver,
    conversion: SpaceConversion,
) -> Result<SkeletalMeshData> {
    let mesh = extract_static_mesh(primitive, store, resolver, conversion)?;
    let vertex_count = mesh.positions.len();

    let mut joints: [Vec<[u16; 4]>; MAX_JOINT_LAYERS] = Default::default();
    let mut weights: [Vec<[f32; 4]>; MAX_JOINT_LAYERS] = Default::default();
    for layer in 0..MAX_JOINT_LAYERS {
        let joint_accessor = primitive.get(&Semantic::Joints(layer as u32));
        let weight_accessor = primitive.get(&Semantic::Weights(layer as u32));
        match (joint_accessor, weight_accessor) {
            (Some(joint_accessor), Some(weight_accessor)) => {
                let layer_joints = resolver.read_joints(store, &joint_accessor)?;
                check_count(&format!("JOINTS_{layer}"), layer_joints.len(), vertex_count)?;
                let layer_weights = resolver.read_weights(store, &weight_accessor)?;
                check_count(
                    &format!("WEIGHTS_{layer}"),
                    layer_weights.len(),
                    vertex_count,
                )?;
                joints[layer] = layer_joints;
                weights[layer] = layer_weights;
            }
            (None, None) => {}
            _ => {
                tracing::warn!(
                    "JOINTS_{0} and WEIGHTS_{0} are not paired, dropping layer {0}",
                    layer
                );
            }
        }
    }
    for (semantic, _) in primitive.attributes() {
        if let Semantic::Joints(layer) = semantic {
            if layer as usize >= MAX_JOINT_LAYERS {
                tracing::warn!(
                    "JOINTS_{}/WEIGHTS_{} exceed the {} supported layers and are dropped",
                    layer,
                    layer,
                    MAX_JOINT_LAYERS
                );
            }
        }
    }

    Ok(SkeletalMeshData {
        mesh,
        joints,
        weights,
    })
}

fn check_count(semantic: &str, count: usize, expected: usize) -> Result<()> {
    if count != expected {
        return Err(ExtractError::AttributeCountMismatch {
            semantic: semantic.to_string(),
            count,
            expected,
        });
    }
    Ok(())
}
