//! Extraction failure taxonomy.
//!
//! Every public operation returns a structured error carrying the offending
//! index, so a caller processing a batch can log the failed item and move on
//! without aborting its siblings.

use thiserror::Error;

use crate::buffers::BufferSlotKind;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A bufferView index that does not exist in the document.
    #[error("buffer view {0} does not exist in the document")]
    BufferViewOutOfRange(usize),

    /// An image index that does not exist in the document.
    #[error("image {0} does not exist in the document")]
    ImageOutOfRange(usize),

    /// Sparse accessors carry no bufferView and are not supported.
    #[error("accessor {0} has no buffer view")]
    AccessorWithoutView(usize),

    #[error("accessor {accessor}: component type {found:?} is not valid for {expected}")]
    UnsupportedComponentType {
        accessor: usize,
        found: gltf::accessor::DataType,
        expected: &'static str,
    },

    #[error("accessor {accessor}: element type {found:?} is not valid for {expected}")]
    UnsupportedDimensions {
        accessor: usize,
        found: gltf::accessor::Dimensions,
        expected: &'static str,
    },

    #[error("primitive has no POSITION attribute")]
    MissingPositions,

    #[error("attribute {semantic} holds {count} elements but POSITION holds {expected}")]
    AttributeCountMismatch {
        semantic: String,
        count: usize,
        expected: usize,
    },

    #[error("node {child} is listed as a child of both node {first} and node {second}")]
    AmbiguousParent {
        child: usize,
        first: usize,
        second: usize,
    },

    #[error("node hierarchy contains a cycle involving node {0}")]
    CyclicHierarchy(usize),

    #[error("skin {skin}: inverse bind accessor holds {count} matrices for {joints} joints")]
    InverseBindCountMismatch {
        skin: usize,
        count: usize,
        joints: usize,
    },

    #[error("animation {animation} channel {channel}: {times} keyframe times but {values} output values")]
    KeyframeCountMismatch {
        animation: usize,
        channel: usize,
        times: usize,
        values: usize,
    },

    /// The slot was never registered, or its registration failed earlier.
    #[error("{kind:?} slot {index} has no resolved payload")]
    UnresolvedSlot { kind: BufferSlotKind, index: usize },

    #[error("{kind:?} slot {index}: stride {stride} is smaller than the {element_size}-byte element")]
    StrideTooSmall {
        kind: BufferSlotKind,
        index: usize,
        stride: usize,
        element_size: usize,
    },

    #[error("{kind:?} slot {index}: {count} elements of {stride} bytes at offset {byte_start} exceed the {len}-byte payload")]
    RangeOutOfBounds {
        kind: BufferSlotKind,
        index: usize,
        byte_start: usize,
        count: usize,
        stride: usize,
        len: usize,
    },
}
