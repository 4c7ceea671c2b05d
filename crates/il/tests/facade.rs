//! Facade tests against an in-process image plugin.

use std::path::Path;

use opal_il::{IlError, Image, ImagePlugin, PixelFormat, load_image, store_image};
use opal_plugin::{Db, PluginHost, parse_manifest};
use opal_plugin_sdk::export_plugin;
use pretty_assertions::assert_eq;

/// Treats a file's raw bytes as one row of grayscale pixels.
struct RawGray;

impl ImagePlugin for RawGray {
    fn load(&self, path: &Path) -> Result<Image, IlError> {
        let bytes = std::fs::read(path)?;
        let width = bytes.len() as u32;
        Image::from_data(width, 1, PixelFormat::L8, bytes)
    }

    fn store(&self, path: &Path, image: &Image) -> Result<(), IlError> {
        std::fs::write(path, image.data())?;
        Ok(())
    }
}

/// Outranks RawGray on merit but rejects everything.
struct Picky;

impl ImagePlugin for Picky {
    fn load(&self, _path: &Path) -> Result<Image, IlError> {
        Err(IlError::Codec("not my format".into()))
    }

    fn store(&self, _path: &Path, _image: &Image) -> Result<(), IlError> {
        Err(IlError::Codec("not my format".into()))
    }
}

export_plugin! {
    interface: dyn ImagePlugin,
    init: || true,
    uninit: || true,
    create: |id| match id {
        "rawgray" => Some(Box::new(RawGray) as Box<dyn ImagePlugin>),
        "picky" => Some(Box::new(Picky) as Box<dyn ImagePlugin>),
        _ => None,
    },
}

const MANIFEST: &str = r#"<openimagelib>
  <plugin name="picky" type="input" extension="gray bad" filename="libimgtest.so" merit="9"/>
  <plugin name="rawgray" type="input" extension="gray" filename="libimgtest.so" merit="1"/>
  <plugin name="ghost" type="input" extension="ghost" filename="libimgghost.so"/>
</openimagelib>"#;

fn host() -> PluginHost {
    let host = PluginHost::new();
    host.register_builtin("libimgtest.so", openplugin_entry_points())
        .unwrap();
    host.insert_import(
        parse_manifest(MANIFEST, Path::new("/virtual/img.opl")).unwrap(),
        Db::Custom,
    );
    host
}

#[test]
fn store_then_load_round_trips() {
    let host = host();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("strip.gray");

    let original = Image::from_data(4, 1, PixelFormat::L8, vec![10, 20, 30, 40]).unwrap();
    store_image(&host, &path, &original).unwrap();

    let loaded = load_image(&host, &path).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn higher_merit_failure_falls_back() {
    // "picky" wins on merit and rejects the file; "rawgray" is next
    // in line and succeeds.
    let host = host();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.gray");
    std::fs::write(&path, [1, 2, 3]).unwrap();

    let image = load_image(&host, &path).unwrap();
    assert_eq!(image.width(), 3);
    assert_eq!(image.format(), PixelFormat::L8);
}

#[test]
fn exhausted_candidates_report_first_failure() {
    // Only "picky" claims .bad, so its codec error surfaces.
    let host = host();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.bad");
    std::fs::write(&path, [1, 2, 3]).unwrap();

    let err = load_image(&host, &path).unwrap_err();
    assert!(matches!(err, IlError::Codec(_)));
}

#[test]
fn unresolvable_library_surfaces_as_plugin_error() {
    // Only "ghost" claims .ghost, and its library does not exist, so
    // the load failure is reported rather than "unsupported".
    let host = host();
    let err = load_image(&host, Path::new("/tmp/frame.ghost")).unwrap_err();
    assert!(matches!(err, IlError::Plugin(_)));
}

#[test]
fn unknown_extension_is_unsupported() {
    let host = host();
    let err = load_image(&host, Path::new("/tmp/missing.webp")).unwrap_err();
    assert!(matches!(err, IlError::UnsupportedExtension(_)));
}

#[test]
fn extensionless_path_is_unsupported() {
    let host = host();
    let err = load_image(&host, Path::new("/tmp/no-extension")).unwrap_err();
    assert!(matches!(err, IlError::UnsupportedExtension(_)));
}
