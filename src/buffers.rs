//! Buffer payload cache for glTF binary data.
//!
//! A document references raw bytes through three namespaces: GLB binary
//! chunks, image entries, and buffer entries. Each namespace keeps its own
//! sparse index remap, so a partially resolved document (some slots loaded,
//! others missing) stays usable.
//!
//! Population happens once per document, before any extractor runs; the
//! store is read-only afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use bytemuck::Pod;
use hashbrown::HashMap;

use crate::error::{ExtractError, Result};

/// Byte payload namespace within a [`BufferStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferSlotKind {
    /// GLB-embedded binary chunks, keyed by chunk order.
    Binary,
    /// Image payloads loaded from files or data URIs, keyed by image index.
    Image,
    /// Buffer payloads loaded from files or data URIs, keyed by buffer index.
    Buffer,
}

/// A resolved byte range plus its provenance. Borrows from the owning store.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolvedBytes<'a> {
    pub bytes: &'a [u8],
    /// Path the payload was loaded from, if it came from a file.
    pub path: Option<&'a Path>,
}

impl ResolvedBytes<'_> {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

struct Payload {
    bytes: Vec<u8>,
    path: Option<PathBuf>,
}

/// Owns every raw byte payload referenced by a document.
///
/// Registration failures leave the slot unregistered and never affect
/// sibling slots; unregistered slots read back as empty, which is a normal
/// condition for sparse references.
#[derive(Default)]
pub struct BufferStore {
    remap: [HashMap<usize, usize>; 3],
    payloads: Vec<Payload>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(kind: BufferSlotKind) -> usize {
        match kind {
            BufferSlotKind::Binary => 0,
            BufferSlotKind::Image => 1,
            BufferSlotKind::Buffer => 2,
        }
    }

    fn insert(&mut self, kind: BufferSlotKind, index: usize, bytes: Vec<u8>, path: Option<PathBuf>) {
        let payload_index = self.payloads.len();
        self.payloads.push(Payload { bytes, path });
        self.remap[Self::table(kind)].insert(index, payload_index);
    }

    /// Register a GLB binary chunk under `index`.
    pub fn cache_binary(&mut self, index: usize, bytes: Vec<u8>) -> bool {
        self.insert(BufferSlotKind::Binary, index, bytes, None);
        true
    }

    /// Register an image entry's payload.
    ///
    /// Embedded images (bufferView source) need no payload here and succeed
    /// immediately; they resolve through the referenced buffer instead.
    pub fn cache_image(&mut self, index: usize, base_dir: &Path, image: &gltf::Image) -> bool {
        match image.source() {
            gltf::image::Source::View { .. } => true,
            gltf::image::Source::Uri { uri, .. } => {
                self.cache_uri(BufferSlotKind::Image, index, base_dir, uri)
            }
        }
    }

    /// Register a buffer entry's payload.
    ///
    /// GLB-chunk buffers carry no URI; their bytes arrive separately via
    /// [`BufferStore::cache_binary`], so they succeed immediately here.
    pub fn cache_buffer(&mut self, index: usize, base_dir: &Path, buffer: &gltf::Buffer) -> bool {
        match buffer.source() {
            gltf::buffer::Source::Bin => true,
            gltf::buffer::Source::Uri(uri) => {
                self.cache_uri(BufferSlotKind::Buffer, index, base_dir, uri)
            }
        }
    }

    /// Register every image and buffer entry in the document.
    ///
    /// Every entry is attempted even after a failure; the result is true
    /// only if all attempts succeeded.
    pub fn cache_all(&mut self, base_dir: &Path, document: &gltf::Document) -> bool {
        let mut ok = true;
        for image in document.images() {
            ok &= self.cache_image(image.index(), base_dir, &image);
        }
        for buffer in document.buffers() {
            ok &= self.cache_buffer(buffer.index(), base_dir, &buffer);
        }
        ok
    }

    fn cache_uri(
        &mut self,
        kind: BufferSlotKind,
        index: usize,
        base_dir: &Path,
        uri: &str,
    ) -> bool {
        if let Some(rest) = uri.strip_prefix("data:") {
            let Some((header, payload)) = rest.split_once(',') else {
                tracing::warn!("{:?} {}: malformed data URI", kind, index);
                return false;
            };
            if !header.ends_with(";base64") {
                tracing::warn!(
                    "{:?} {}: unsupported data URI encoding {:?}",
                    kind,
                    index,
                    header
                );
                return false;
            }
            match base64::engine::general_purpose::STANDARD.decode(payload) {
                Ok(bytes) => {
                    self.insert(kind, index, bytes, None);
                    true
                }
                Err(err) => {
                    tracing::warn!("{:?} {}: base64 decode failed: {}", kind, index, err);
                    false
                }
            }
        } else if uri.contains("://") {
            tracing::warn!("{:?} {}: unsupported URI scheme in {:?}", kind, index, uri);
            false
        } else {
            let path = base_dir.join(uri);
            match fs::read(&path) {
                Ok(bytes) => {
                    let path = fs::canonicalize(&path).unwrap_or(path);
                    self.insert(kind, index, bytes, Some(path));
                    true
                }
                Err(err) => {
                    tracing::warn!("{:?} {}: failed to read {:?}: {}", kind, index, path, err);
                    false
                }
            }
        }
    }

    /// Resolved bytes for a slot.
    ///
    /// Unregistered slots return an empty view rather than an error; sparse
    /// registration is expected, and only computations that need the bytes
    /// treat emptiness as a failure.
    pub fn bytes(&self, kind: BufferSlotKind, index: usize) -> ResolvedBytes<'_> {
        let Some(&payload_index) = self.remap[Self::table(kind)].get(&index) else {
            return ResolvedBytes::default();
        };
        match self.payloads.get(payload_index) {
            Some(payload) => ResolvedBytes {
                bytes: &payload.bytes,
                path: payload.path.as_deref(),
            },
            None => ResolvedBytes::default(),
        }
    }

    /// Copy `count` elements of `T` out of a slot, one element read per
    /// `stride` bytes starting at `byte_start`.
    ///
    /// `stride == 0` means tightly packed; `count == 0` means as many
    /// elements as fit. The whole strided range must lie inside the payload
    /// or the read fails; elements are copied out, never aliased.
    pub fn typed_range<T: Pod>(
        &self,
        kind: BufferSlotKind,
        index: usize,
        byte_start: usize,
        count: usize,
        stride: usize,
    ) -> Result<Vec<T>> {
        let element_size = std::mem::size_of::<T>();
        let stride = if stride == 0 { element_size } else { stride };
        if stride < element_size {
            return Err(ExtractError::StrideTooSmall {
                kind,
                index,
                stride,
                element_size,
            });
        }

        let source = self.bytes(kind, index);
        if source.is_empty() {
            return Err(ExtractError::UnresolvedSlot { kind, index });
        }

        let count = if count == 0 {
            source.len().saturating_sub(byte_start) / stride
        } else {
            count
        };

        let out_of_bounds = Err(ExtractError::RangeOutOfBounds {
            kind,
            index,
            byte_start,
            count,
            stride,
            len: source.len(),
        });
        match count.checked_mul(stride).and_then(|n| n.checked_add(byte_start)) {
            Some(end) if end <= source.len() => {}
            _ => return out_of_bounds,
        }

        let bytes = source.bytes;
        if stride == element_size {
            let packed = &bytes[byte_start..byte_start + count * element_size];
            return Ok(bytemuck::pod_collect_to_vec(packed));
        }

        let mut elements = Vec::with_capacity(count);
        for i in 0..count {
            let at = byte_start + i * stride;
            elements.push(bytemuck::pod_read_unaligned(&bytes[at..at + element_size]));
        }
        Ok(elements)
    }
}
