//! The texture index and texture upload.
//!
//! [`TextureIndex`] is built by one pass over the texture directory and is
//! read-only afterwards. Names are file stems. Every file claims its exact-case
//! stem; the lowercase form of the stem is registered as an alias only while
//! no other file holds it. Files are visited all-lowercase names first, so
//! `wall.png` owns `"wall"` even when `Wall.png` is present.

use std::{
    collections::{HashMap, hash_map::Entry},
    path::{Path, PathBuf},
    sync::Arc,
};

use image::RgbaImage;

use crate::{
    data_structures::texture::Texture,
    error::{AssembleError, Diagnostics, Fallback},
    resources::collect_files,
};

/// A decoded texture file.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedTexture {
    /// Exact-case file stem.
    pub name: String,
    pub path: PathBuf,
    pub image: RgbaImage,
}

impl LoadedTexture {
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let image = image::open(path)
            .map_err(|source| AssembleError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            path: path.to_path_buf(),
            image,
        })
    }
}

#[derive(Clone, Debug)]
struct Slot {
    texture: Arc<LoadedTexture>,
    exact: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TextureIndex {
    slots: HashMap<String, Slot>,
    files: Vec<PathBuf>,
}

impl TextureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every image in `dir` whose extension is in `extensions`.
    ///
    /// A missing directory gives an empty index; files that fail to decode are
    /// skipped. Both are recorded in `diagnostics`.
    pub fn scan(dir: &Path, extensions: &[String], diagnostics: &mut Diagnostics) -> Self {
        let mut index = Self::new();
        let mut files = match collect_files(dir, extensions, false, diagnostics) {
            Ok(files) => files,
            Err(e) => {
                diagnostics.record(
                    Fallback::MissingInput,
                    format!("texture directory {} unavailable: {e}", dir.display()),
                );
                return index;
            }
        };
        sort_lowercase_first(&mut files);

        for path in files {
            match LoadedTexture::open(&path) {
                Ok(texture) => index.register(texture),
                Err(e) => diagnostics.record(Fallback::MalformedRecord, e.to_string()),
            }
        }
        log::info!(
            "Loaded {} textures from {}",
            index.loaded_count(),
            dir.display()
        );
        index
    }

    /// Register under the exact stem, and under its lowercase form if unclaimed.
    ///
    /// An exact registration replaces an alias but never another exact name.
    pub fn register(&mut self, texture: LoadedTexture) {
        let exact = texture.name.clone();
        let alias = exact.to_lowercase();
        let texture = Arc::new(texture);

        let mut claimed = false;
        match self.slots.entry(exact.clone()) {
            Entry::Occupied(mut slot) => {
                if !slot.get().exact {
                    slot.insert(Slot {
                        texture: texture.clone(),
                        exact: true,
                    });
                    claimed = true;
                } else {
                    log::debug!(
                        "Texture {} shadowed by {}",
                        texture.path.display(),
                        slot.get().texture.path.display()
                    );
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Slot {
                    texture: texture.clone(),
                    exact: true,
                });
                claimed = true;
            }
        }
        if alias != exact {
            if let Entry::Vacant(slot) = self.slots.entry(alias) {
                slot.insert(Slot {
                    texture: texture.clone(),
                    exact: false,
                });
                claimed = true;
            }
        }
        if claimed {
            self.files.push(texture.path.clone());
        }
    }

    /// Exact key lookup.
    pub fn get(&self, name: &str) -> Option<&LoadedTexture> {
        self.slots.get(name).map(|slot| slot.texture.as_ref())
    }

    /// Exact, then lowercase. Returns the key that matched with the texture.
    pub fn resolve(&self, name: &str) -> Option<(&str, &LoadedTexture)> {
        self.slots
            .get_key_value(name)
            .or_else(|| self.slots.get_key_value(&name.to_lowercase()))
            .map(|(key, slot)| (key.as_str(), slot.texture.as_ref()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of files that own at least one name.
    pub fn loaded_count(&self) -> usize {
        self.files.len()
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// All-lowercase file names first, then lexicographic.
fn sort_lowercase_first(files: &mut [PathBuf]) {
    files.sort_by_cached_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name != name.to_lowercase(), name)
    });
}

/// Bind group layout shared by every surface material: diffuse texture and
/// sampler, then normal texture and sampler.
pub fn surface_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
        ],
        label: Some("Surface texture_bind_group_layout"),
    })
}

pub fn upload_texture(
    texture: &LoadedTexture,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    Texture::from_image(device, queue, &texture.image, Some(&texture.name), false)
}
