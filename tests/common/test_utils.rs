#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use stage_ngin::LevelPaths;
use tempfile::TempDir;

/// A single-triangle glTF with its vertex buffer inlined as a data URI.
const TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "buffers": [{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
  "accessors": [{
    "bufferView": 0,
    "componentType": 5126,
    "count": 3,
    "type": "VEC3",
    "min": [0.0, 0.0, 0.0],
    "max": [1.0, 1.0, 0.0]
  }]
}"#;

/// A level laid out on disk the way `LevelPaths::from_root` expects it.
pub struct LevelFixture {
    pub dir: TempDir,
    pub level: String,
}

impl LevelFixture {
    pub fn new(level: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        for sub in ["levels", "textures", "models", "materials"] {
            std::fs::create_dir_all(dir.path().join(sub)).expect("create fixture dir");
        }
        Self {
            dir,
            level: level.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> LevelPaths {
        LevelPaths::from_root(self.root(), &self.level)
    }

    fn write_json(&self, path: PathBuf, value: &Value) {
        std::fs::write(path, serde_json::to_vec_pretty(value).expect("serialize fixture"))
            .expect("write fixture");
    }

    pub fn write_geometry(&self, value: &Value) {
        self.write_json(self.root().join("levels").join(format!("{}.json", self.level)), value);
    }

    pub fn write_level_texture_map(&self, value: &Value) {
        self.write_json(
            self.root().join("levels").join(format!("{}_texture_map.json", self.level)),
            value,
        );
    }

    pub fn write_global_texture_map(&self, value: &Value) {
        self.write_json(self.root().join("texture_map.json"), value);
    }

    pub fn write_assignment(&self, value: &Value) {
        self.write_json(
            self.root().join("levels").join(format!("{}_materials.json", self.level)),
            value,
        );
    }

    pub fn write_entities(&self, value: &Value) {
        self.write_json(
            self.root().join("levels").join(format!("{}_entities.json", self.level)),
            value,
        );
    }

    pub fn write_nsa(&self, file_name: &str, text: &str) {
        std::fs::write(self.root().join("materials").join(file_name), text).expect("write nsa");
    }

    /// A 2x2 PNG filled with `shade`.
    pub fn write_texture(&self, file_name: &str, shade: u8) -> PathBuf {
        let path = self.root().join("textures").join(file_name);
        write_png(&path, shade);
        path
    }

    pub fn write_model(&self, relative: &str) -> PathBuf {
        let path = self.root().join("models").join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create model dir");
        }
        std::fs::write(&path, TRIANGLE_GLTF).expect("write model");
        path
    }
}

pub fn write_png(path: &Path, shade: u8) {
    image::RgbaImage::from_pixel(2, 2, image::Rgba([shade, shade, shade, 255]))
        .save(path)
        .expect("write png");
}

/// A source-space group: a strip of `tris` triangles on the source ground
/// plane (z = 0) with `tris + 2` vertices.
pub fn strip_group(id: i64, tris: usize) -> Value {
    let n = tris + 2;
    let mut positions = Vec::with_capacity(n * 3);
    let mut normals = Vec::with_capacity(n * 3);
    let mut uvs = Vec::with_capacity(n * 2);
    for i in 0..n {
        let (x, y) = ((i / 2) as f32, (i % 2) as f32);
        positions.extend_from_slice(&[x, y, 0.0]);
        normals.extend_from_slice(&[0.0, 0.0, 1.0]);
        uvs.extend_from_slice(&[x, y]);
    }
    let mut indices = Vec::with_capacity(tris * 3);
    for t in 0..tris as u32 {
        if t % 2 == 0 {
            indices.extend_from_slice(&[t, t + 1, t + 2]);
        } else {
            indices.extend_from_slice(&[t + 1, t, t + 2]);
        }
    }
    json!({
        "id": id,
        "section_id": 0,
        "vertex_count": n,
        "triangle_count": tris,
        "positions": positions,
        "normals": normals,
        "uvs": uvs,
        "indices": indices,
    })
}

pub fn geometry(groups: Vec<Value>) -> Value {
    json!({ "header": { "materials": [] }, "mesh_groups": groups })
}
