//! gltf-extract library
//!
//! Extracts engine-agnostic geometry, skinning, and animation data from a
//! parsed glTF document. The document graph comes from the `gltf` crate;
//! raw payload bytes are owned by [`BufferStore`], populated once per
//! document before any extractor runs. All byte access flows through
//! [`AccessorResolver`], which turns document indices into typed element
//! arrays; extracted data leaves the core in the target space selected by
//! [`SpaceConversion`].

pub mod animation;
pub mod buffers;
pub mod error;
pub mod mesh;
pub mod resolve;
pub mod skeleton;
pub mod space;

// Re-export the buffer resolution layer
pub use buffers::{BufferSlotKind, BufferStore, ResolvedBytes};
pub use resolve::{AccessorResolver, ImageData};

// Re-export the error taxonomy
pub use error::{ExtractError, Result};

// Re-export key types for mesh extraction
pub use mesh::{
    extract_skeletal_mesh, extract_static_mesh, SkeletalMeshData, StaticMeshData,
    MAX_JOINT_LAYERS, MAX_TEXCOORD_LAYERS,
};

// Re-export skeleton extraction types
pub use skeleton::{
    extract_skin, inverse_bind_matrices, node_infos, node_parents, node_transforms, NodeInfo,
    SkinData,
};

// Re-export animation extraction types
pub use animation::{extract_animation, Interpolation, KeyValue, NodeTrack, TrackKey};

// Re-export the space conversion applied at extractor exits
pub use space::SpaceConversion;
