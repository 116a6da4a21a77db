//! Node hierarchy and skin decoding.
//!
//! Computes per-node parentage and local/world transforms, and decodes a
//! skin's joint list and inverse bind matrices.

use glam::{Mat4, Quat, Vec3};

use crate::buffers::BufferStore;
use crate::error::{ExtractError, Result};
use crate::resolve::AccessorResolver;
use crate::space::SpaceConversion;

/// Hierarchy entry for one node, in target space.
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo {
    /// Index of the parent node; `None` for roots.
    pub parent: Option<usize>,
    pub local: Mat4,
    /// Product of ancestor locals in root-to-node order.
    pub world: Mat4,
}

/// Decoded skin: joint node indices plus per-joint inverse bind matrices.
#[derive(Debug, Clone)]
pub struct SkinData {
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

/// Parent index per node.
///
/// A node listed under the `children` of more than one parent makes the
/// document malformed and is rejected.
pub fn node_parents(document: &gltf::Document) -> Result<Vec<Option<usize>>> {
    let mut parents: Vec<Option<usize>> = vec![None; document.nodes().len()];
    for node in document.nodes() {
        for child in node.children() {
            if let Some(first) = parents[child.index()] {
                return Err(ExtractError::AmbiguousParent {
                    child: child.index(),
                    first,
                    second: node.index(),
                });
            }
            parents[child.index()] = Some(node.index());
        }
    }
    Ok(parents)
}

fn local_matrix(node: &gltf::Node) -> Mat4 {
    // A full matrix field wins over TRS when a document supplies both.
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => Mat4::from_cols_array_2d(&matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Mat4::from_scale_rotation_translation(
            Vec3::from_array(scale),
            Quat::from_array(rotation),
            Vec3::from_array(translation),
        ),
    }
}

/// Local and world transform per node, in target space.
///
/// World transforms compose parent before child in an order derived from
/// the parent array; node arrays are not guaranteed to list parents first.
pub fn node_transforms(
    document: &gltf::Document,
    conversion: SpaceConversion,
) -> Result<(Vec<Mat4>, Vec<Mat4>)> {
    let parents = node_parents(document)?;
    let node_count = parents.len();
    let locals: Vec<Mat4> = document.nodes().map(|node| local_matrix(&node)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut pending: Vec<usize> = Vec::new();
    for (index, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(index),
            None => pending.push(index),
        }
    }

    let mut worlds = vec![Mat4::IDENTITY; node_count];
    let mut visited = vec![false; node_count];
    while let Some(index) = pending.pop() {
        worlds[index] = match parents[index] {
            Some(parent) => worlds[parent] * locals[index],
            None => locals[index],
        };
        visited[index] = true;
        pending.extend(children[index].iter().copied());
    }
    if let Some(stray) = visited.iter().position(|&seen| !seen) {
        return Err(ExtractError::CyclicHierarchy(stray));
    }

    Ok((
        locals.into_iter().map(|m| conversion.matrix(m)).collect(),
        worlds.into_iter().map(|m| conversion.matrix(m)).collect(),
    ))
}

/// Parent plus local/world transform per node, computed in one pass over
/// the document.
pub fn node_infos(document: &gltf::Document, conversion: SpaceConversion) -> Result<Vec<NodeInfo>> {
    let parents = node_parents(document)?;
    let (locals, worlds) = node_transforms(document, conversion)?;
    Ok(parents
        .into_iter()
        .zip(locals)
        .zip(worlds)
        .map(|((parent, local), world)| NodeInfo {
            parent,
            local,
            world,
        })
        .collect())
}

/// Inverse bind matrix per joint, in target space.
///
/// A skin without an inverseBindMatrices accessor needs no correction;
/// every joint gets the identity.
pub fn inverse_bind_matrices(
    skin: &gltf::Skin,
    store: &BufferStore,
    resolver: &AccessorResolver,
    conversion: SpaceConversion,
) -> Result<Vec<Mat4>> {
    let joint_count = skin.joints().count();
    let Some(accessor) = skin.inverse_bind_matrices() else {
        return Ok(vec![Mat4::IDENTITY; joint_count]);
    };

    let matrices = resolver.read_mat4_f32(store, &accessor)?;
    if matrices.len() < joint_count {
        return Err(ExtractError::InverseBindCountMismatch {
            skin: skin.index(),
            count: matrices.len(),
            joints: joint_count,
        });
    }
    Ok(matrices
        .into_iter()
        .take(joint_count)
        .map(|m| conversion.matrix(Mat4::from_cols_array_2d(&m)))
        .collect())
}

/// Decode a skin's joint list and inverse bind matrices together.
pub fn extract_skin(
    skin: &gltf::Skin,
    store: &BufferStore,
    resolver: &AccessorResolver,
    conversion: SpaceConversion,
) -> Result<SkinData> {
    Ok(SkinData {
        joints: skin.joints().map(|joint| joint.index()).collect(),
        inverse_bind_matrices: inverse_bind_matrices(skin, store, resolver, conversion)?,
    })
}
