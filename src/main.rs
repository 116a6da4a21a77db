//! gltf-extract - glTF extraction inspection tool
//!
//! Loads a glTF/GLB file, resolves its payloads, and reports the geometry,
//! skeleton, and animation data the extraction core produces.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use gltf_extract::{animation, mesh, skeleton, AccessorResolver, BufferStore, SpaceConversion};

#[derive(Parser)]
#[command(name = "gltf-extract")]
#[command(about = "glTF extraction inspection tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a glTF/GLB document
    Info {
        /// Input glTF/GLB file
        input: PathBuf,
    },

    /// Extract a mesh primitive and report its vertex data
    Mesh {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Mesh index (default: first mesh)
        #[arg(short, long)]
        mesh: Option<usize>,

        /// Primitive index within the mesh
        #[arg(short, long, default_value_t = 0)]
        primitive: usize,

        /// Leave data in glTF space instead of converting
        #[arg(long)]
        raw: bool,
    },

    /// Report the node hierarchy with local and world transforms
    Nodes {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Leave data in glTF space instead of converting
        #[arg(long)]
        raw: bool,
    },

    /// Extract a skin's joints and inverse bind matrices
    Skeleton {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Skin index (default: first skin)
        #[arg(short, long)]
        skin: Option<usize>,

        /// List available skins instead of extracting
        #[arg(long)]
        list: bool,

        /// Leave data in glTF space instead of converting
        #[arg(long)]
        raw: bool,
    },

    /// Extract an animation's merged per-node tracks
    Animation {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Animation index (default: first animation)
        #[arg(short, long)]
        animation: Option<usize>,

        /// List available animations instead of extracting
        #[arg(long)]
        list: bool,

        /// Leave data in glTF space instead of converting
        #[arg(long)]
        raw: bool,
    },
}

struct LoadedDocument {
    document: gltf::Document,
    store: BufferStore,
    resolver: AccessorResolver,
}

/// Parse a glTF/GLB file and resolve every payload it references.
fn load(input: &Path) -> Result<LoadedDocument> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::open(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let resolver = AccessorResolver::new(blob.is_some());
    let mut store = BufferStore::new();
    if let Some(bytes) = blob {
        store.cache_binary(0, bytes);
    }
    let base_dir = input.parent().unwrap_or_else(|| Path::new("."));
    if !store.cache_all(base_dir, &document) {
        tracing::warn!("some payloads could not be resolved; dependent items will fail");
    }

    Ok(LoadedDocument {
        document,
        store,
        resolver,
    })
}

fn conversion(raw: bool) -> SpaceConversion {
    if raw {
        SpaceConversion::NONE
    } else {
        SpaceConversion::default()
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => {
            let loaded = load(&input)?;
            let document = &loaded.document;
            let primitive_count: usize =
                document.meshes().map(|mesh| mesh.primitives().count()).sum();
            tracing::info!(
                "{:?}: {} nodes, {} meshes ({} primitives), {} skins, {} animations, {} buffers, {} images",
                input,
                document.nodes().count(),
                document.meshes().count(),
                primitive_count,
                document.skins().count(),
                document.animations().count(),
                document.buffers().count(),
                document.images().count()
            );
        }

        Commands::Mesh {
            input,
            mesh: mesh_index,
            primitive,
            raw,
        } => {
            let loaded = load(&input)?;
            let mesh = match mesh_index {
                Some(index) => loaded
                    .document
                    .meshes()
                    .nth(index)
                    .with_context(|| format!("Mesh index {} not found in glTF", index))?,
                None => loaded
                    .document
                    .meshes()
                    .next()
                    .context("No meshes found in glTF")?,
            };
            let primitive = mesh
                .primitives()
                .nth(primitive)
                .with_context(|| format!("Primitive index {} not found in mesh", primitive))?;

            let skinned = primitive.get(&gltf::Semantic::Joints(0)).is_some();
            if skinned {
                let data = mesh::extract_skeletal_mesh(
                    &primitive,
                    &loaded.store,
                    &loaded.resolver,
                    conversion(raw),
                )?;
                let joint_layers = data.joints.iter().filter(|layer| !layer.is_empty()).count();
                tracing::info!(
                    "Skinned primitive: {} vertices, {} indices, {} joint layer(s)",
                    data.mesh.positions.len(),
                    data.mesh.indices.len(),
                    joint_layers
                );
            } else {
                let data = mesh::extract_static_mesh(
                    &primitive,
                    &loaded.store,
                    &loaded.resolver,
                    conversion(raw),
                )?;
                let uv_layers = data
                    .texcoords
                    .iter()
                    .filter(|layer| !layer.is_empty())
                    .count();
                tracing::info!(
                    "Static primitive: {} vertices, {} indices, normals={}, tangents={}, {} uv layer(s)",
                    data.positions.len(),
                    data.indices.len(),
                    !data.normals.is_empty(),
                    !data.tangents.is_empty(),
                    uv_layers
                );
            }
        }

        Commands::Nodes { input, raw } => {
            let loaded = load(&input)?;
            let infos = skeleton::node_infos(&loaded.document, conversion(raw))?;
            tracing::info!("{} nodes:", infos.len());
            for (index, info) in infos.iter().enumerate() {
                let translation = info.world.w_axis;
                match info.parent {
                    Some(parent) => tracing::info!(
                        "  [{}] parent={} world translation ({:.3}, {:.3}, {:.3})",
                        index,
                        parent,
                        translation.x,
                        translation.y,
                        translation.z
                    ),
                    None => tracing::info!(
                        "  [{}] root world translation ({:.3}, {:.3}, {:.3})",
                        index,
                        translation.x,
                        translation.y,
                        translation.z
                    ),
                }
            }
        }

        Commands::Skeleton {
            input,
            skin: skin_index,
            list,
            raw,
        } => {
            let loaded = load(&input)?;
            if list {
                let skins: Vec<_> = loaded.document.skins().collect();
                if skins.is_empty() {
                    tracing::info!("No skins found in {:?}", input);
                } else {
                    tracing::info!("Skins in {:?}:", input);
                    for skin in &skins {
                        tracing::info!(
                            "  [{}] '{}': {} joints",
                            skin.index(),
                            skin.name().unwrap_or("unnamed"),
                            skin.joints().count()
                        );
                    }
                }
            } else {
                let skin = match skin_index {
                    Some(index) => loaded
                        .document
                        .skins()
                        .nth(index)
                        .with_context(|| format!("Skin index {} not found in glTF", index))?,
                    None => loaded
                        .document
                        .skins()
                        .next()
                        .context("No skins found in glTF file")?,
                };
                let data = skeleton::extract_skin(
                    &skin,
                    &loaded.store,
                    &loaded.resolver,
                    conversion(raw),
                )?;
                tracing::info!(
                    "Skin '{}': {} joints, {} inverse bind matrices",
                    skin.name().unwrap_or("unnamed"),
                    data.joints.len(),
                    data.inverse_bind_matrices.len()
                );
            }
        }

        Commands::Animation {
            input,
            animation: animation_index,
            list,
            raw,
        } => {
            let loaded = load(&input)?;
            if list {
                let animations: Vec<_> = loaded.document.animations().collect();
                if animations.is_empty() {
                    tracing::info!("No animations found in {:?}", input);
                } else {
                    tracing::info!("Animations in {:?}:", input);
                    for anim in &animations {
                        let tracks = animation::extract_animation(
                            anim,
                            &loaded.store,
                            &loaded.resolver,
                            SpaceConversion::NONE,
                        )?;
                        let duration = tracks
                            .iter()
                            .filter_map(|track| track.keys.last())
                            .map(|key| key.time)
                            .fold(0.0f32, f32::max);
                        tracing::info!(
                            "  [{}] '{}': {} channels, {} tracks, {:.2}s",
                            anim.index(),
                            anim.name().unwrap_or("unnamed"),
                            anim.channels().count(),
                            tracks.len(),
                            duration
                        );
                    }
                }
            } else {
                let anim = match animation_index {
                    Some(index) => loaded
                        .document
                        .animations()
                        .nth(index)
                        .with_context(|| format!("Animation index {} not found in glTF", index))?,
                    None => loaded
                        .document
                        .animations()
                        .next()
                        .context("No animations found in glTF file")?,
                };
                let tracks = animation::extract_animation(
                    &anim,
                    &loaded.store,
                    &loaded.resolver,
                    conversion(raw),
                )?;
                tracing::info!(
                    "Animation '{}': {} merged tracks",
                    anim.name().unwrap_or("unnamed"),
                    tracks.len()
                );
                for track in &tracks {
                    tracing::info!("  node {}: {} keyframes", track.node, track.keys.len());
                }
            }
        }
    }

    Ok(())
}
