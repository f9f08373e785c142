//! Mesh group conversion and scene upload.
//!
//! [`MeshGroupBuilder`] turns one flat-array [`MeshGroup`] into a target-space
//! [`Surface`]. It owns the level-wide collision face list and bounds, so a
//! single builder is used for every group of a level.

use std::{collections::HashMap, fmt};

use anyhow::Context;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{
            CollisionFaceSet, GpuLevel, GpuMaterial, GpuSurface, ModelVertex, SceneMesh, Surface,
            SurfaceMaterial,
        },
        texture::{Texture, color_to_rgba8},
        transform::{Bounds, to_target},
    },
    resources::{
        documents::MeshGroup,
        texture::{TextureIndex, surface_texture_layout, upload_texture},
    },
};

/// Why a group produced no surface. None of these stop the load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupSkip {
    TooFewVertices { vertex_count: usize },
    InsufficientPositions { needed: usize, found: usize },
    NoTriangles,
}

impl fmt::Display for GroupSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSkip::TooFewVertices { vertex_count } => {
                write!(f, "only {vertex_count} vertices")
            }
            GroupSkip::InsufficientPositions { needed, found } => {
                write!(f, "{found} position floats for {needed} needed")
            }
            GroupSkip::NoTriangles => f.write_str("no usable triangles"),
        }
    }
}

pub struct MeshGroupBuilder {
    collision_min_tris: usize,
    collision: CollisionFaceSet,
    bounds: Bounds,
}

impl MeshGroupBuilder {
    pub fn new(collision_min_tris: usize) -> Self {
        Self {
            collision_min_tris,
            collision: CollisionFaceSet::new(),
            bounds: Bounds::empty(),
        }
    }

    /// Convert one group.
    ///
    /// Positions and normals go through [`to_target`], UVs are copied, and every
    /// triangle `(a, b, c)` is emitted as `(a, c, b)`. Triangles that reference a
    /// vertex past `vertex_count` or repeat an index are dropped. Groups that
    /// declare at least `collision_min_tris` triangles also append their
    /// triangles to the collision face list.
    pub fn build(&mut self, group: &MeshGroup, material: SurfaceMaterial) -> Result<Surface, GroupSkip> {
        let n = group.vertex_count;
        if n < 3 {
            return Err(GroupSkip::TooFewVertices { vertex_count: n });
        }
        let needed = match n.checked_mul(3) {
            Some(needed) if needed <= group.positions.len() => needed,
            needed => {
                return Err(GroupSkip::InsufficientPositions {
                    needed: needed.unwrap_or(usize::MAX),
                    found: group.positions.len(),
                });
            }
        };

        let positions: Vec<[f32; 3]> = group.positions[..needed]
            .chunks_exact(3)
            .map(|p| to_target([p[0], p[1], p[2]]))
            .collect();
        let normals: Vec<[f32; 3]> = if group.normals.len() >= needed {
            group.normals[..needed]
                .chunks_exact(3)
                .map(|p| to_target([p[0], p[1], p[2]]))
                .collect()
        } else {
            Vec::new()
        };
        let uvs: Vec<[f32; 2]> = if group.uvs.len() >= 2 * n {
            group.uvs[..2 * n].chunks_exact(2).map(|t| [t[0], t[1]]).collect()
        } else {
            Vec::new()
        };

        let mut indices = Vec::with_capacity(group.indices.len());
        for tri in group
            .indices
            .chunks_exact(3)
            .take(group.declared_triangles())
        {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if [a, b, c].iter().any(|&i| i as usize >= n) || a == b || b == c || a == c {
                continue;
            }
            indices.extend_from_slice(&[a, c, b]);
        }
        if indices.is_empty() {
            return Err(GroupSkip::NoTriangles);
        }

        if group.declared_triangles() >= self.collision_min_tris {
            for tri in indices.chunks_exact(3) {
                self.collision.push_triangle(
                    positions[tri[0] as usize],
                    positions[tri[1] as usize],
                    positions[tri[2] as usize],
                );
            }
        }
        for p in &positions {
            self.bounds.include(*p);
        }

        Ok(Surface {
            group_id: group.id,
            section_id: group.section_id,
            positions,
            normals,
            uvs,
            indices,
            material,
        })
    }

    pub fn collision(&self) -> &CollisionFaceSet {
        &self.collision
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn finish(self) -> (CollisionFaceSet, Bounds) {
        (self.collision, self.bounds)
    }
}

/**
 * Level geometry has no tangents, so they are derived from UVs for normal
 * mapping. Each vertex gets the average over the triangles that use it.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let v0 = vertices[i0];
        let v1 = vertices[i1];
        let v2 = vertices[i2];

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        // Degenerate UVs (all zero when the group has none) give no direction
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped for right-handed normal maps in wgpu texture space
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + cgmath::Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent =
                (bitangent + cgmath::Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

/// Upload every surface of the scene mesh.
///
/// Each distinct texture or flat color becomes one [`GpuMaterial`]; surfaces
/// marked alpha-blended land in [`GpuLevel::transparent`].
pub fn upload_scene_mesh(
    mesh: &SceneMesh,
    textures: &TextureIndex,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<GpuLevel> {
    let layout = surface_texture_layout(device);
    let mut materials: Vec<GpuMaterial> = Vec::new();
    let mut material_ids: HashMap<String, usize> = HashMap::new();
    let mut opaque = Vec::new();
    let mut transparent = Vec::new();

    for surface in &mesh.surfaces {
        let key = material_key(&surface.material);
        let material = match material_ids.get(&key) {
            Some(id) => *id,
            None => {
                let diffuse = match &surface.material {
                    SurfaceMaterial::Textured { texture, .. } => {
                        let loaded = textures
                            .get(texture)
                            .with_context(|| format!("Texture {texture} is not in the index"))?;
                        upload_texture(loaded, device, queue)?
                    }
                    SurfaceMaterial::Flat { color } => {
                        Texture::solid_color(device, queue, color_to_rgba8(*color), &key)
                    }
                    SurfaceMaterial::NormalDebug => {
                        Texture::solid_color(device, queue, Texture::DEFAULT_NORMAL, &key)
                    }
                };
                let normal = Texture::create_default_normal_map(device, queue);
                materials.push(GpuMaterial::new(device, &key, diffuse, normal, &layout));
                material_ids.insert(key, materials.len() - 1);
                materials.len() - 1
            }
        };

        let mut vertices = surface.to_vertices();
        compute_tangents(&mut vertices, &surface.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Group {} Vertex Buffer", surface.group_id)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Group {} Index Buffer", surface.group_id)),
            contents: bytemuck::cast_slice(&surface.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let gpu_surface = GpuSurface {
            group_id: surface.group_id,
            vertex_buffer,
            index_buffer,
            num_elements: surface.indices.len() as u32,
            material,
        };
        if surface.is_transparent() {
            transparent.push(gpu_surface);
        } else {
            opaque.push(gpu_surface);
        }
    }

    Ok(GpuLevel {
        opaque,
        transparent,
        materials,
        model_matrix: mesh.transform.to_raw(),
    })
}

fn material_key(material: &SurfaceMaterial) -> String {
    match material {
        SurfaceMaterial::Textured { texture, .. } => format!("texture:{texture}"),
        SurfaceMaterial::Flat { color } => format!("flat:{:?}", color_to_rgba8(*color)),
        SurfaceMaterial::NormalDebug => "normals".to_string(),
    }
}
