//! Scene importer bridge
//!
//! External importers (tobj for OBJ/MTL, gltf for glTF/GLB) stay behind one
//! narrow interface: [`import_scene`] turns a scene file into a flat list of
//! [`ImportedPrimitive`]s with positions, normals, texcoords, triangulated
//! indices and {diffuse, specular} texture references. [`plan_textures`]
//! then deduplicates the references into a pool plan, so a file shared by
//! several meshes is decoded exactly once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{ModelVertex, TextureKind};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported scene format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to parse OBJ scene: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("failed to parse glTF scene: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF buffer {0} has no data")]
    MissingBuffer(usize),
}

/// Where a referenced texture's bytes live.
#[derive(Clone, Debug)]
pub enum TextureRef {
    /// An image file next to the scene.
    External(PathBuf),
    /// An image blob embedded in the scene file itself.
    Embedded { tag: String, bytes: Vec<u8> },
}

impl TextureRef {
    /// Identity string used for pool deduplication.
    pub fn identity(&self) -> String {
        match self {
            TextureRef::External(path) => path.display().to_string(),
            TextureRef::Embedded { tag, .. } => tag.clone(),
        }
    }
}

/// One texture reference of an imported primitive.
#[derive(Clone, Debug)]
pub struct ImportedTexture {
    pub kind: TextureKind,
    pub source: TextureRef,
}

/// One triangulated primitive group of the scene.
#[derive(Clone, Debug, Default)]
pub struct ImportedPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Empty when the scene has no texcoords; vertices then default to (0, 0).
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub textures: Vec<ImportedTexture>,
}

impl ImportedPrimitive {
    /// Interleaves the attribute arrays, filling missing texcoords with
    /// (0, 0).
    pub fn vertices(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| ModelVertex {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

/// Everything [`import_scene`] hands back.
#[derive(Clone, Debug, Default)]
pub struct ImportedScene {
    pub primitives: Vec<ImportedPrimitive>,
}

/// Parses a scene file with the importer matching its extension.
pub fn import_scene(path: &Path) -> Result<ImportedScene, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "obj" => import_obj(path),
        "gltf" | "glb" => import_gltf(path),
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

fn import_obj(path: &Path) -> Result<ImportedScene, ImportError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;
    let materials = materials.unwrap_or_else(|err| {
        log::warn!("no usable MTL for {}: {}", path.display(), err);
        Vec::new()
    });
    let directory = path.parent().unwrap_or_else(|| Path::new("."));

    let mut primitives = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> =
            if mesh.normals.len() == mesh.positions.len() && !mesh.normals.is_empty() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect()
            } else {
                vertex_normals(&positions, &mesh.indices)
            };
        let tex_coords: Vec<[f32; 2]> = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect();

        let mut textures = Vec::new();
        if let Some(material_id) = mesh.material_id {
            if let Some(material) = materials.get(material_id) {
                if let Some(diffuse) = &material.diffuse_texture {
                    textures.push(ImportedTexture {
                        kind: TextureKind::Diffuse,
                        source: TextureRef::External(directory.join(diffuse)),
                    });
                }
                if let Some(specular) = &material.specular_texture {
                    textures.push(ImportedTexture {
                        kind: TextureKind::Specular,
                        source: TextureRef::External(directory.join(specular)),
                    });
                }
            }
        }

        primitives.push(ImportedPrimitive {
            positions,
            normals,
            tex_coords,
            indices: mesh.indices.clone(),
            textures,
        });
    }
    Ok(ImportedScene { primitives })
}

fn import_gltf(path: &Path) -> Result<ImportedScene, ImportError> {
    let gltf = gltf::Gltf::open(path)?;
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene")
        .to_string();

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or(ImportError::MissingBuffer(buffer.index()))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                let buffer_path = directory.join(uri);
                let bytes = std::fs::read(&buffer_path).map_err(|source| ImportError::Io {
                    path: buffer_path,
                    source,
                })?;
                buffer_data.push(bytes);
            }
        }
    }

    let mut primitives = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            visit_node(&node, &buffer_data, directory, &stem, &mut primitives);
        }
    }
    Ok(ImportedScene { primitives })
}

/// Depth-first over the node tree, one primitive per mesh primitive group.
fn visit_node(
    node: &gltf::Node,
    buffer_data: &[Vec<u8>],
    directory: &Path,
    stem: &str,
    primitives: &mut Vec<ImportedPrimitive>,
) {
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| {
                buffer_data.get(buffer.index()).map(|data| data.as_slice())
            });
            let Some(positions) = reader.read_positions() else {
                log::warn!("skipping glTF primitive without positions");
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|indices| indices.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|normals| normals.collect())
                .unwrap_or_else(|| vertex_normals(&positions, &indices));
            let tex_coords: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|coords| coords.into_f32().collect())
                .unwrap_or_default();

            let mut textures = Vec::new();
            let material = primitive.material();
            let pbr = material.pbr_metallic_roughness();
            if let Some(info) = pbr.base_color_texture() {
                textures.push(ImportedTexture {
                    kind: TextureKind::Diffuse,
                    source: resolve_image(&info.texture(), buffer_data, directory, stem),
                });
            }
            // the metallic/roughness map is the closest thing glTF has to a
            // specular slot
            if let Some(info) = pbr.metallic_roughness_texture() {
                textures.push(ImportedTexture {
                    kind: TextureKind::Specular,
                    source: resolve_image(&info.texture(), buffer_data, directory, stem),
                });
            }

            primitives.push(ImportedPrimitive {
                positions,
                normals,
                tex_coords,
                indices,
                textures,
            });
        }
    }
    for child in node.children() {
        visit_node(&child, buffer_data, directory, stem, primitives);
    }
}

/// An embedded buffer view wins over an external file when the scene
/// provides both paths to the same image.
fn resolve_image(
    texture: &gltf::Texture,
    buffer_data: &[Vec<u8>],
    directory: &Path,
    stem: &str,
) -> TextureRef {
    let image = texture.source();
    match image.source() {
        gltf::image::Source::View { view, .. } => {
            let data = &buffer_data[view.buffer().index()];
            let bytes = data[view.offset()..view.offset() + view.length()].to_vec();
            TextureRef::Embedded {
                tag: format!("{}#image{}", stem, image.index()),
                bytes,
            }
        }
        gltf::image::Source::Uri { uri, .. } => TextureRef::External(directory.join(uri)),
    }
}

/// Area-weighted vertex normals from triangle cross products, for scenes
/// that ship positions only.
pub(crate) fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let v0 = positions[i0];
        let v1 = positions[i1];
        let v2 = positions[i2];

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &index in &[i0, i1, i2] {
            normals[index][0] += face_normal[0];
            normals[index][1] += face_normal[1];
            normals[index][2] += face_normal[2];
        }
    }

    for normal in &mut normals {
        let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
        if length > 0.0 {
            normal[0] /= length;
            normal[1] /= length;
            normal[2] /= length;
        }
    }
    normals
}

/// The deduplicated texture pool of a scene.
pub(crate) struct TexturePlan {
    /// Pool entries in first-seen order.
    pub sources: Vec<(TextureKind, TextureRef)>,
    /// Per primitive: (kind, pool index) in the primitive's slot order.
    pub per_primitive: Vec<Vec<(TextureKind, usize)>>,
}

/// Collapses texture references by (kind, source identity); two meshes
/// sharing one file end up pointing at one pool entry.
pub(crate) fn plan_textures(scene: &ImportedScene) -> TexturePlan {
    let mut index: HashMap<(TextureKind, String), usize> = HashMap::new();
    let mut sources = Vec::new();
    let mut per_primitive = Vec::with_capacity(scene.primitives.len());

    for primitive in &scene.primitives {
        let mut slots = Vec::with_capacity(primitive.textures.len());
        for texture in &primitive.textures {
            let key = (texture.kind, texture.source.identity());
            let pool_index = *index.entry(key).or_insert_with(|| {
                sources.push((texture.kind, texture.source.clone()));
                sources.len() - 1
            });
            slots.push((texture.kind, pool_index));
        }
        per_primitive.push(slots);
    }

    TexturePlan {
        sources,
        per_primitive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive_with(textures: Vec<ImportedTexture>) -> ImportedPrimitive {
        ImportedPrimitive {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: Vec::new(),
            indices: vec![0, 1, 2],
            textures,
        }
    }

    fn external(kind: TextureKind, path: &str) -> ImportedTexture {
        ImportedTexture {
            kind,
            source: TextureRef::External(PathBuf::from(path)),
        }
    }

    #[test]
    fn shared_texture_file_is_pooled_once() {
        let scene = ImportedScene {
            primitives: vec![
                primitive_with(vec![external(TextureKind::Diffuse, "bricks.png")]),
                primitive_with(vec![external(TextureKind::Diffuse, "bricks.png")]),
            ],
        };
        let plan = plan_textures(&scene);
        assert_eq!(plan.sources.len(), 1);
        assert_eq!(plan.per_primitive[0], vec![(TextureKind::Diffuse, 0)]);
        assert_eq!(plan.per_primitive[1], vec![(TextureKind::Diffuse, 0)]);
    }

    #[test]
    fn same_file_different_kind_stays_separate() {
        let scene = ImportedScene {
            primitives: vec![primitive_with(vec![
                external(TextureKind::Diffuse, "metal.png"),
                external(TextureKind::Specular, "metal.png"),
            ])],
        };
        let plan = plan_textures(&scene);
        assert_eq!(plan.sources.len(), 2);
        assert_eq!(
            plan.per_primitive[0],
            vec![(TextureKind::Diffuse, 0), (TextureKind::Specular, 1)]
        );
    }

    #[test]
    fn embedded_blobs_dedup_by_tag() {
        let embedded = |tag: &str| ImportedTexture {
            kind: TextureKind::Diffuse,
            source: TextureRef::Embedded {
                tag: tag.to_string(),
                bytes: vec![1, 2, 3],
            },
        };
        let scene = ImportedScene {
            primitives: vec![
                primitive_with(vec![embedded("ship#image0")]),
                primitive_with(vec![embedded("ship#image0"), embedded("ship#image1")]),
            ],
        };
        let plan = plan_textures(&scene);
        assert_eq!(plan.sources.len(), 2);
        assert_eq!(plan.per_primitive[1][0].1, 0);
        assert_eq!(plan.per_primitive[1][1].1, 1);
    }

    #[test]
    fn computed_normals_are_unit_length() {
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = vertex_normals(&positions, &[0, 1, 2]);
        for normal in normals {
            let length =
                (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
            // the triangle lies in the XY plane
            assert!((normal[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn missing_texcoords_default_to_zero() {
        let primitive = primitive_with(Vec::new());
        let vertices = primitive.vertices();
        assert_eq!(vertices.len(), 3);
        assert!(vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]));
    }
}
