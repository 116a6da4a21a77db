//! Accessor and image resolution.
//!
//! Translates document-level indices (bufferView, accessor, image) into
//! typed element arrays served by [`BufferStore`]. The extractors never
//! touch raw bytes; they ask this layer for "count elements of T for
//! accessor K" and get the offset/stride arithmetic for free.

use std::mem::size_of;
use std::path::{Path, PathBuf};

use bytemuck::Pod;
use gltf::accessor::{DataType, Dimensions};

use crate::buffers::{BufferSlotKind, BufferStore};
use crate::error::{ExtractError, Result};

/// Encoded image payload handed to the host for decoding, with provenance
/// for asset dependency tracking.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    /// Path the payload was loaded from, if it came from a file.
    pub path: Option<PathBuf>,
}

/// Resolves document indices to typed byte ranges.
///
/// `from_binary` selects the GLB binary-chunk namespace over the external
/// buffer namespace; it is fixed once per document at construction.
#[derive(Clone, Copy, Debug)]
pub struct AccessorResolver {
    from_binary: bool,
}

impl AccessorResolver {
    pub fn new(from_binary: bool) -> Self {
        Self { from_binary }
    }

    fn buffer_kind(&self) -> BufferSlotKind {
        if self.from_binary {
            BufferSlotKind::Binary
        } else {
            BufferSlotKind::Buffer
        }
    }

    /// Resolve a buffer view to `count_override` elements of `T`, or to as
    /// many elements as the view holds, starting `extra_offset` bytes in.
    pub fn buffer_view<T: Pod>(
        &self,
        document: &gltf::Document,
        store: &BufferStore,
        view_index: usize,
        extra_offset: usize,
        count_override: usize,
    ) -> Result<Vec<T>> {
        let view = document
            .views()
            .nth(view_index)
            .ok_or(ExtractError::BufferViewOutOfRange(view_index))?;
        let stride = view.stride().unwrap_or(size_of::<T>());
        let count = if count_override != 0 {
            count_override
        } else {
            view.length() / stride
        };
        store.typed_range(
            self.buffer_kind(),
            view.buffer().index(),
            view.offset() + extra_offset,
            count,
            stride,
        )
    }

    /// Resolve an accessor to its `count` elements of `T`, honoring the
    /// accessor's own byte offset and the view's stride.
    pub fn elements<T: Pod>(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<T>> {
        let view = accessor
            .view()
            .ok_or(ExtractError::AccessorWithoutView(accessor.index()))?;
        let stride = view.stride().unwrap_or(size_of::<T>());
        store.typed_range(
            self.buffer_kind(),
            view.buffer().index(),
            view.offset() + accessor.offset(),
            accessor.count(),
            stride,
        )
    }

    /// Resolve an image to its encoded payload bytes.
    ///
    /// Embedded images resolve through their bufferView; URI images resolve
    /// through the image payload namespace.
    pub fn image(
        &self,
        document: &gltf::Document,
        store: &BufferStore,
        image_index: usize,
    ) -> Result<ImageData> {
        let image = document
            .images()
            .nth(image_index)
            .ok_or(ExtractError::ImageOutOfRange(image_index))?;
        match image.source() {
            gltf::image::Source::View { view, .. } => {
                let bytes = self.buffer_view::<u8>(document, store, view.index(), 0, 0)?;
                Ok(ImageData { bytes, path: None })
            }
            gltf::image::Source::Uri { .. } => {
                let resolved = store.bytes(BufferSlotKind::Image, image_index);
                if resolved.is_empty() {
                    return Err(ExtractError::UnresolvedSlot {
                        kind: BufferSlotKind::Image,
                        index: image_index,
                    });
                }
                Ok(ImageData {
                    bytes: resolved.bytes.to_vec(),
                    path: resolved.path.map(Path::to_path_buf),
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Element readers used by the extractors
    // ------------------------------------------------------------------

    /// Scalar float sequence (animation keyframe times).
    pub fn read_scalars_f32(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<f32>> {
        expect_dimensions(accessor, Dimensions::Scalar, "a float scalar")?;
        expect_f32(accessor, "a float scalar")?;
        self.elements(store, accessor)
    }

    /// Float 3-vectors (positions, normals, translations, scales).
    pub fn read_vec3_f32(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<[f32; 3]>> {
        expect_dimensions(accessor, Dimensions::Vec3, "a float vec3")?;
        expect_f32(accessor, "a float vec3")?;
        self.elements(store, accessor)
    }

    /// Float 4-vectors (tangents, rotation quaternions).
    pub fn read_vec4_f32(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<[f32; 4]>> {
        expect_dimensions(accessor, Dimensions::Vec4, "a float vec4")?;
        expect_f32(accessor, "a float vec4")?;
        self.elements(store, accessor)
    }

    /// Float column-major 4x4 matrices (inverse bind matrices).
    pub fn read_mat4_f32(
        &self,
        store: &BufferStore,
        accessor: &gltf::Accessor,
    ) -> Result<Vec<[[f32; 4]; 4]>> {
        expect_dimensions(accessor, Dimensions::Mat4, "a float mat4")?;
        expect_f32(accessor, "a float mat4")?;
        self.elements(store, accessor)
    }

    /// Texture coordinates, widened to float from the normalized integer
    /// encodings glTF permits.
    pub fn read_texcoords(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<[f32; 2]>> {
        expect_dimensions(accessor, Dimensions::Vec2, "texture coordinates")?;
        match accessor.data_type() {
            DataType::F32 => self.elements(store, accessor),
            DataType::U8 => Ok(self
                .elements::<[u8; 2]>(store, accessor)?
                .into_iter()
                .map(|uv| [unorm8(uv[0]), unorm8(uv[1])])
                .collect()),
            DataType::U16 => Ok(self
                .elements::<[u16; 2]>(store, accessor)?
                .into_iter()
                .map(|uv| [unorm16(uv[0]), unorm16(uv[1])])
                .collect()),
            found => Err(ExtractError::UnsupportedComponentType {
                accessor: accessor.index(),
                found,
                expected: "texture coordinates",
            }),
        }
    }

    /// Joint index 4-tuples, widened to u16.
    pub fn read_joints(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<[u16; 4]>> {
        expect_dimensions(accessor, Dimensions::Vec4, "joint indices")?;
        match accessor.data_type() {
            DataType::U16 => self.elements(store, accessor),
            DataType::U8 => Ok(self
                .elements::<[u8; 4]>(store, accessor)?
                .into_iter()
                .map(|j| [j[0] as u16, j[1] as u16, j[2] as u16, j[3] as u16])
                .collect()),
            found => Err(ExtractError::UnsupportedComponentType {
                accessor: accessor.index(),
                found,
                expected: "joint indices",
            }),
        }
    }

    /// Joint weight 4-tuples, widened to float from the normalized integer
    /// encodings glTF permits.
    pub fn read_weights(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<[f32; 4]>> {
        expect_dimensions(accessor, Dimensions::Vec4, "joint weights")?;
        match accessor.data_type() {
            DataType::F32 => self.elements(store, accessor),
            DataType::U8 => Ok(self
                .elements::<[u8; 4]>(store, accessor)?
                .into_iter()
                .map(|w| [unorm8(w[0]), unorm8(w[1]), unorm8(w[2]), unorm8(w[3])])
                .collect()),
            DataType::U16 => Ok(self
                .elements::<[u16; 4]>(store, accessor)?
                .into_iter()
                .map(|w| [unorm16(w[0]), unorm16(w[1]), unorm16(w[2]), unorm16(w[3])])
                .collect()),
            found => Err(ExtractError::UnsupportedComponentType {
                accessor: accessor.index(),
                found,
                expected: "joint weights",
            }),
        }
    }

    /// Triangle indices, widened to u32.
    pub fn read_indices(&self, store: &BufferStore, accessor: &gltf::Accessor) -> Result<Vec<u32>> {
        expect_dimensions(accessor, Dimensions::Scalar, "triangle indices")?;
        match accessor.data_type() {
            DataType::U32 => self.elements(store, accessor),
            DataType::U16 => Ok(self
                .elements::<u16>(store, accessor)?
                .into_iter()
                .map(u32::from)
                .collect()),
            DataType::U8 => Ok(self
                .elements::<u8>(store, accessor)?
                .into_iter()
                .map(u32::from)
                .collect()),
            found => Err(ExtractError::UnsupportedComponentType {
                accessor: accessor.index(),
                found,
                expected: "triangle indices",
            }),
        }
    }
}

fn expect_dimensions(
    accessor: &gltf::Accessor,
    want: Dimensions,
    expected: &'static str,
) -> Result<()> {
    let found = accessor.dimensions();
    if found != want {
        return Err(ExtractError::UnsupportedDimensions {
            accessor: accessor.index(),
            found,
            expected,
        });
    }
    Ok(())
}

fn expect_f32(accessor: &gltf::Accessor, expected: &'static str) -> Result<()> {
    let found = accessor.data_type();
    if found != DataType::F32 {
        return Err(ExtractError::UnsupportedComponentType {
            accessor: accessor.index(),
            found,
            expected,
        });
    }
    Ok(())
}

fn unorm8(value: u8) -> f32 {
    value as f32 / 255.0
}

fn unorm16(value: u16) -> f32 {
    value as f32 / 65535.0
}
