//! Compass and font loading from files on disk.

use renderer::{Compass, RenderAssets, RenderConfig, TextRenderer};
use test_utils::{create_icon_png, find_system_font, temp_test_dir, workspace_root, write_asset};

const SMALL_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50">
  <rect width="100" height="50" fill="#000000"/>
</svg>"##;

#[test]
fn test_bundled_compass_ships_with_crate() {
    let path = workspace_root().join("crates/renderer/assets/compass_rose.svg");
    assert!(path.exists());

    let from_file = Compass::load(Some(&path)).unwrap();
    let bundled = Compass::bundled().unwrap();
    assert_eq!(from_file.width(), bundled.width());
    assert_eq!(from_file.height(), bundled.height());
}

#[test]
fn test_compass_from_svg_file_keeps_aspect() {
    let dir = temp_test_dir();
    let path = write_asset(dir.path(), "rosa.svg", SMALL_SVG.as_bytes());

    let compass = Compass::load(Some(&path)).unwrap();
    assert_eq!(compass.width(), 2 * compass.height());
}

#[test]
fn test_compass_from_png_file() {
    let dir = temp_test_dir();
    let path = write_asset(dir.path(), "rosa.png", &create_icon_png(20, 30, [0, 0, 0, 255]));

    let compass = Compass::load(Some(&path)).unwrap();
    assert_eq!((compass.width(), compass.height()), (20, 30));
}

#[test]
fn test_missing_compass_is_asset_missing() {
    let dir = temp_test_dir();
    let err = Compass::load(Some(&dir.path().join("nope.png"))).unwrap_err();
    assert_eq!(err.kind(), "AssetMissing");

    let garbage = write_asset(dir.path(), "broken.svg", b"not an svg");
    assert_eq!(Compass::load(Some(&garbage)).unwrap_err().kind(), "AssetMissing");
}

#[test]
fn test_assets_without_compass_still_load() {
    let dir = temp_test_dir();
    let config = RenderConfig {
        compass_path: Some(dir.path().join("missing.svg")),
        ..Default::default()
    };
    let assets = RenderAssets::load(&config);
    assert!(assets.compass.is_none());
}

#[test]
fn test_configured_font_is_used() {
    let Some(font) = find_system_font() else {
        eprintln!("SKIPPED: no TrueType font installed");
        return;
    };
    let text = TextRenderer::load(Some(&font));
    assert!(text.has_font());

    let (narrow, _) = text.measure("i", 20.0);
    let (wide, _) = text.measure("Legenda", 20.0);
    assert!(wide > narrow);
}

#[test]
fn test_unreadable_font_falls_back() {
    let dir = temp_test_dir();
    let bogus = write_asset(dir.path(), "fake.ttf", b"definitely not a font");
    let text = TextRenderer::load(Some(&bogus));
    // System fonts may or may not exist; either way measuring must work.
    let (width, height) = text.measure("Brasil", 10.0);
    assert!(width > 0.0);
    assert!(height > 0.0);
}
