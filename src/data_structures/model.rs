//! Assembled level geometry: surfaces, the combined scene mesh, collision faces
//! and their GPU counterparts.
//!
//! - [`Surface`] is one converted mesh group with its material binding
//! - [`SceneMesh`] holds every surface of a level under one shared transform
//! - [`CollisionFaceSet`] is the flat triangle soup fed to physics
//! - [`GpuSurface`] and [`GpuMaterial`] are the uploaded versions used for drawing

use std::collections::HashMap;

use crate::data_structures::{instance::Instance, texture::Texture, transform::Bounds};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// How a surface is drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceMaterial {
    /// Sampled from a loaded texture, keyed by its canonical name.
    Textured { texture: String, alpha_blend: bool },
    /// A single color, used for unresolved materials and the flat display mode.
    Flat { color: [f32; 4] },
    /// Normals visualized as color.
    NormalDebug,
}

impl SurfaceMaterial {
    pub fn is_transparent(&self) -> bool {
        matches!(
            self,
            SurfaceMaterial::Textured {
                alpha_blend: true,
                ..
            }
        )
    }

    pub fn texture_name(&self) -> Option<&str> {
        match self {
            SurfaceMaterial::Textured { texture, .. } => Some(texture),
            _ => None,
        }
    }
}

/// One renderable surface built from one mesh group, already in target space
/// with flipped winding.
#[derive(Clone, Debug)]
pub struct Surface {
    pub group_id: i64,
    pub section_id: Option<i64>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material: SurfaceMaterial,
}

impl Surface {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_transparent(&self) -> bool {
        self.material.is_transparent()
    }

    /// Interleaved vertices with zeroed tangents. Missing normals or UVs read as zero.
    pub fn to_vertices(&self) -> Vec<ModelVertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| ModelVertex {
                position: *position,
                tex_coords: self.uvs.get(i).copied().unwrap_or([0.0; 2]),
                normal: self.normals.get(i).copied().unwrap_or([0.0; 3]),
                tangent: [0.0; 3],
                bitangent: [0.0; 3],
            })
            .collect()
    }
}

/// All surfaces of a level, in input group order, sharing one transform.
#[derive(Clone, Debug, Default)]
pub struct SceneMesh {
    pub surfaces: Vec<Surface>,
    pub transform: Instance,
}

impl SceneMesh {
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(Surface::triangle_count).sum()
    }

    pub fn opaque(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(|s| !s.is_transparent())
    }

    pub fn transparent(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter().filter(|s| s.is_transparent())
    }
}

/// Flat triangle list: three consecutive vertices per face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionFaceSet {
    pub vertices: Vec<[f32; 3]>,
}

impl CollisionFaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_triangle(&mut self, a: [f32; 3], b: [f32; 3], c: [f32; 3]) {
        self.vertices.extend_from_slice(&[a, b, c]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn to_shape(&self) -> CollisionShape {
        CollisionShape::from_faces(self)
    }
}

/// Indexed version of a [`CollisionFaceSet`] with bit-identical vertices merged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionShape {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub bounds: Bounds,
}

impl CollisionShape {
    pub fn from_faces(faces: &CollisionFaceSet) -> Self {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(faces.vertices.len());
        let mut bounds = Bounds::empty();

        for v in &faces.vertices {
            // -0.0 and 0.0 are the same point
            let key = v.map(|c| if c == 0.0 { 0 } else { c.to_bits() });
            let index = *lookup.entry(key).or_insert_with(|| {
                vertices.push(*v);
                bounds.include(*v);
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }

        Self {
            vertices,
            indices,
            bounds,
        }
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A texture uploaded together with the bind group the level shaders sample from.
pub struct GpuMaterial {
    pub name: String,
    pub diffuse_texture: Texture,
    pub normal_texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        normal_texture: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&normal_texture.sampler),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            diffuse_texture,
            normal_texture,
            bind_group,
        }
    }
}

/// One surface in GPU memory.
pub struct GpuSurface {
    pub group_id: i64,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    /// Index into [`GpuLevel::materials`].
    pub material: usize,
}

/// The uploaded scene mesh, partitioned for the opaque and alpha-blended passes.
pub struct GpuLevel {
    pub opaque: Vec<GpuSurface>,
    pub transparent: Vec<GpuSurface>,
    pub materials: Vec<GpuMaterial>,
    pub model_matrix: [[f32; 4]; 4],
}

impl GpuLevel {
    pub fn surface_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(material: SurfaceMaterial) -> Surface {
        Surface {
            group_id: 0,
            section_id: None,
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 1.0, 0.0]],
            uvs: vec![],
            indices: vec![0, 2, 1],
            material,
        }
    }

    #[test]
    fn vertices_fill_missing_attributes_with_zero() {
        let vertices = surface(SurfaceMaterial::NormalDebug).to_vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0; 3]);
        assert_eq!(vertices[2].tex_coords, [0.0; 2]);
    }

    #[test]
    fn scene_mesh_partitions_by_blend() {
        let mesh = SceneMesh {
            surfaces: vec![
                surface(SurfaceMaterial::Textured {
                    texture: "glass".into(),
                    alpha_blend: true,
                }),
                surface(SurfaceMaterial::Flat { color: [0.5; 4] }),
            ],
            transform: Instance::new(),
        };
        assert_eq!(mesh.opaque().count(), 1);
        assert_eq!(mesh.transparent().count(), 1);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn collision_shape_merges_shared_corners() {
        let mut faces = CollisionFaceSet::new();
        faces.push_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]);
        faces.push_triangle([1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [-0.0, 0.0, 1.0]);
        assert_eq!(faces.face_count(), 2);

        let shape = faces.to_shape();
        assert_eq!(shape.vertices.len(), 4);
        assert_eq!(shape.indices, vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(shape.face_count(), 2);
        assert_eq!(shape.bounds.max, cgmath::Vector3::new(1.0, 0.0, 1.0));
    }
}
