//! Integration tests for buffer population and accessor/image resolution:
//! data URIs, external files with provenance, and partial failure.


use tempfile::tempdir;

use gltf_extract::{
    extract_static_mesh, BufferSlotKind, ExtractError, SpaceConversion,
};

#[test]
fn external_buffer_resolves_with_file_provenance() {
    let dir = tempdir().expect("temp dir");
    std::fs::write(
        dir.path().join("mesh.bin"),
        gltf_generator::external_positions_bin(),
    )
    .expect("write bin");

    let json = gltf_generator::external_positions_json("mesh.bin");
    let (document, store, resolver, cached) = gltf_generator::load_json(&json, dir.path());
    assert!(cached);

    let resolved = store.bytes(BufferSlotKind::Buffer, 0);
    assert_eq!(resolved.len(), 48);
    let path = resolved.path.expect("file provenance");
    assert!(path.ends_with("mesh.bin"));

    let primitive = document
        .meshes()
        .next()
        .expect("mesh")
        .primitives()
        .next()
        .expect("primitive");
    let data =
        extract_static_mesh(&primitive, &store, &resolver, SpaceConversion::NONE).expect("extract");
    assert_eq!(data.positions.len(), 4);
}

#[test]
fn data_uri_buffer_resolves_without_provenance() {
    use base64::Engine as _;

    let encoded = base64::engine::general_purpose::STANDARD
        .encode(gltf_generator::external_positions_bin());
    let json = gltf_generator::external_positions_json(&format!(
        "data:application/octet-stream;base64,{encoded}"
    ));
    let (document, store, resolver, cached) =
        gltf_generator::load_json(&json, std::path::Path::new("."));
    assert!(cached);

    let resolved = store.bytes(BufferSlotKind::Buffer, 0);
    assert_eq!(resolved.len(), 48);
    assert!(resolved.path.is_none());

    let primitive = document
        .meshes()
        .next()
        .expect("mesh")
        .primitives()
        .next()
        .expect("primitive");
    let data =
        extract_static_mesh(&primitive, &store, &resolver, SpaceConversion::NONE).expect("extract");
    assert_eq!(data.positions[3], [0.0, 1.0, 0.0]);
}

#[test]
fn missing_file_leaves_other_slots_resolved() {
    let dir = tempdir().expect("temp dir");
    let json = gltf_generator::partially_resolved_json();
    let (document, store, resolver, cached) = gltf_generator::load_json(&json, dir.path());

    // Aggregate result reports the failure, but population continued.
    assert!(!cached);
    assert!(!store.bytes(BufferSlotKind::Buffer, 0).is_empty());
    assert!(store.bytes(BufferSlotKind::Buffer, 1).is_empty());

    let good = document.accessors().next().expect("accessor");
    let values = resolver
        .read_scalars_f32(&store, &good)
        .expect("resolved slot should read");
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);

    let bad = document.accessors().nth(1).expect("accessor");
    let result = resolver.read_scalars_f32(&store, &bad);
    assert!(matches!(
        result,
        Err(ExtractError::UnresolvedSlot {
            kind: BufferSlotKind::Buffer,
            index: 1
        })
    ));
}

#[test]
fn oversized_accessor_fails_without_corrupting_the_store() {
    let (document, store, resolver) = gltf_generator::load_glb(&gltf_generator::overrun_glb());
    let primitive = document
        .meshes()
        .next()
        .expect("mesh")
        .primitives()
        .next()
        .expect("primitive");

    let result = extract_static_mesh(&primitive, &store, &resolver, SpaceConversion::NONE);
    assert!(matches!(
        result,
        Err(ExtractError::RangeOutOfBounds { .. })
    ));

    // The binary chunk itself is still readable afterwards.
    assert_eq!(store.bytes(BufferSlotKind::Binary, 0).len(), 48);
}

#[test]
fn buffer_view_index_out_of_range_fails_cleanly() {
    let (document, store, resolver) = gltf_generator::load_glb(&gltf_generator::non_indexed_glb());

    let result = resolver.buffer_view::<u8>(&document, &store, 99, 0, 0);
    assert!(matches!(
        result,
        Err(ExtractError::BufferViewOutOfRange(99))
    ));

    // Unrelated reads keep working.
    let whole_view = resolver
        .buffer_view::<u8>(&document, &store, 0, 0, 0)
        .expect("valid view");
    assert_eq!(whole_view.len(), 48);
}

#[test]
fn images_resolve_from_all_three_sources() {
    let payload = [0x89u8, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let dir = tempdir().expect("temp dir");
    std::fs::write(dir.path().join("tex.png"), payload).expect("write image");

    let glb = gltf_generator::images_glb(&payload, "tex.png");
    let (document, mut store, resolver) = gltf_generator::load_glb(&glb);
    assert!(store.cache_all(dir.path(), &document));

    // Data URI image: bytes, no provenance.
    let from_uri = resolver.image(&document, &store, 0).expect("data uri");
    assert_eq!(from_uri.bytes, payload);
    assert!(from_uri.path.is_none());

    // Embedded image: resolved through its bufferView.
    let embedded = resolver.image(&document, &store, 1).expect("embedded");
    assert_eq!(embedded.bytes, payload);
    assert!(embedded.path.is_none());

    // File image: bytes plus the resolved path.
    let from_file = resolver.image(&document, &store, 2).expect("file");
    assert_eq!(from_file.bytes, payload);
    assert!(from_file.path.expect("provenance").ends_with("tex.png"));

    let missing = resolver.image(&document, &store, 9);
    assert!(matches!(missing, Err(ExtractError::ImageOutOfRange(9))));
}
