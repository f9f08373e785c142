mod common;

use common::test_utils::write_png;
use stage_ngin::{Diagnostics, Fallback, resources::texture::TextureIndex};

fn extensions() -> Vec<String> {
    stage_ngin::AssemblerConfig::default().texture_extensions
}

fn shade_of(index: &TextureIndex, name: &str) -> Option<u8> {
    index.get(name).map(|t| t.image.get_pixel(0, 0)[0])
}

#[test]
fn lowercase_file_owns_the_lowercase_name() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("Wall.png"), 10);
    write_png(&dir.path().join("wall.png"), 20);
    write_png(&dir.path().join("WALL_spec.png"), 30);

    let mut diagnostics = Diagnostics::new();
    let index = TextureIndex::scan(dir.path(), &extensions(), &mut diagnostics);

    assert_eq!(shade_of(&index, "wall"), Some(20));
    assert_eq!(
        index.get("wall").map(|t| t.path.file_name().unwrap().to_owned()),
        Some("wall.png".into())
    );
    assert_eq!(shade_of(&index, "Wall"), Some(10));
    assert_eq!(shade_of(&index, "WALL_spec"), Some(30));
    assert_eq!(shade_of(&index, "wall_spec"), Some(30));
    assert_eq!(index.loaded_count(), 3);
    assert!(diagnostics.is_empty());
}

#[test]
fn mixed_case_file_gets_alias_when_unclaimed() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("GE_Grate_01.png"), 40);

    let index = TextureIndex::scan(dir.path(), &extensions(), &mut Diagnostics::new());
    assert_eq!(shade_of(&index, "GE_Grate_01"), Some(40));
    assert_eq!(shade_of(&index, "ge_grate_01"), Some(40));
    assert_eq!(index.names(), vec!["GE_Grate_01", "ge_grate_01"]);
}

#[test]
fn unknown_extensions_and_broken_files() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("good.png"), 50);
    std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"ignored").unwrap();
    std::fs::write(dir.path().join("raw.dds"), b"ignored").unwrap();

    let mut diagnostics = Diagnostics::new();
    let index = TextureIndex::scan(dir.path(), &extensions(), &mut diagnostics);
    assert_eq!(index.loaded_count(), 1);
    assert!(index.get("broken").is_none());
    assert!(index.get("raw").is_none());
    assert_eq!(diagnostics.count(Fallback::MalformedRecord), 1);
}

#[test]
fn extension_case_does_not_matter() {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("upper.PNG"), 60);
    let index = TextureIndex::scan(dir.path(), &extensions(), &mut Diagnostics::new());
    assert_eq!(shade_of(&index, "upper"), Some(60));
}
