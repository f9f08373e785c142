//! stage-probe: assemble one level and print its load summary.
//!
//! Usage:
//!   stage-probe <data-root> <level> [--config assembler.json] [--section N]
//! Example:
//!   stage-probe ./extracted level1 --section 0 --mode flat

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use stage_ngin::{
    AssemblerConfig, DisplayMode, Fallback, LevelPaths, SceneAssembler,
    data_structures::transform::Bounds,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Textured,
    Flat,
    Normals,
}

impl From<Mode> for DisplayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Textured => DisplayMode::Textured,
            Mode::Flat => DisplayMode::Flat,
            Mode::Normals => DisplayMode::Normals,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "stage-probe")]
#[command(about = "Assemble an extracted level and report what resolved")]
struct Cli {
    /// Root of the extracted data (contains levels/, textures/, models/)
    root: PathBuf,
    /// Level name, e.g. `level1` for levels/level1.json
    level: String,
    /// JSON file with assembler settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only assemble groups from this section
    #[arg(long)]
    section: Option<i64>,
    /// Display mode applied after loading
    #[arg(long, value_enum, default_value_t = Mode::Textured)]
    mode: Mode,
    /// Print every recorded fallback
    #[arg(long)]
    verbose: bool,
}

fn describe_framing(bounds: &Bounds) -> String {
    let min: [f32; 3] = bounds.min.into();
    let max: [f32; 3] = bounds.max.into();
    let eye = bounds.framing_eye();
    let center = bounds.center();
    format!(
        "bounds: {min:?} .. {max:?}, camera eye ({:.1}, {:.1}, {:.1}) looking at ({:.1}, {:.1}, {:.1})",
        eye.x, eye.y, eye.z, center.x, center.y, center.z
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AssemblerConfig::from_file(path)
            .with_context(|| format!("load assembler config {}", path.display()))?,
        None => AssemblerConfig::default(),
    };
    if cli.section.is_some() {
        config.section_filter = cli.section;
    }

    let paths = LevelPaths::from_root(&cli.root, &cli.level);
    let mut level = SceneAssembler::new(config)
        .assemble(&paths)
        .with_context(|| format!("assemble level '{}'", cli.level))?;
    level.apply_display_mode(cli.mode.into());

    println!("{}", level.summary);
    println!("{}", describe_framing(&level.bounds));
    let shape = level.collision_shape();
    println!(
        "collision shape: {} vertices, {} faces",
        shape.vertices.len(),
        shape.face_count()
    );
    for kind in [
        Fallback::MissingInput,
        Fallback::MalformedRecord,
        Fallback::UnresolvedReference,
    ] {
        println!("{kind}: {}", level.diagnostics.count(kind));
    }
    if cli.verbose {
        for event in level.diagnostics.events() {
            println!("  [{}] {}", event.kind, event.detail);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn framing_line_lists_corners_and_center() {
        let mut bounds = Bounds::empty();
        bounds.include([0.0, 0.0, 0.0]);
        bounds.include([2.0, 4.0, -6.0]);
        let line = describe_framing(&bounds);
        assert!(line.starts_with("bounds: [0.0, 0.0, -6.0] .. [2.0, 4.0, 0.0]"));
        assert!(line.ends_with("looking at (1.0, 2.0, -3.0)"));
        assert_eq!(bounds.center(), Vector3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn cli_parses_mode_and_section() {
        let cli = Cli::parse_from(["stage-probe", "data", "level1", "--section", "0", "--mode", "flat"]);
        assert_eq!(cli.section, Some(0));
        assert_eq!(DisplayMode::from(cli.mode), DisplayMode::Flat);
    }
}
