//! Manifest (`.opl`) import.
//!
//! A manifest is a small XML document grouping `<plugin>` declarations
//! under library-family elements:
//!
//! ```xml
//! <openmedialib auto_load="true">
//!   <plugin name="avformat"
//!           type="input"
//!           extension="mp4 mov"
//!           filename="libavformat_plugin.so"
//!           merit="5"/>
//! </openmedialib>
//! ```
//!
//! Unknown elements and attributes are ignored; a malformed merit or
//! extension pattern fails the whole file.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::PluginError;
use crate::item::PluginItem;

/// The result of importing one manifest file.
#[derive(Debug, Default)]
pub struct ManifestImport {
    /// Every plugin the manifest declares.
    pub items: Vec<PluginItem>,
    /// Items from families marked `auto_load="true"`, to be
    /// instantiated as soon as the manifest is registered.
    pub auto_load: Vec<PluginItem>,
}

/// Read and parse one manifest file.
pub fn import_manifest(path: &Path) -> Result<ManifestImport, PluginError> {
    let text = std::fs::read_to_string(path).map_err(|e| PluginError::ManifestParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_manifest(&text, path)
}

/// Parse manifest text. `manifest_path` anchors relative library
/// filenames.
pub fn parse_manifest(text: &str, manifest_path: &Path) -> Result<ManifestImport, PluginError> {
    let fail = |reason: String| PluginError::ManifestParse {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let mut reader = Reader::from_str(text);
    let mut import = ManifestImport::default();

    // Innermost enclosing family element and its auto_load flag.
    let mut families: Vec<(String, bool)> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| fail(e.to_string()))? {
            Event::Start(e) => {
                if e.name().as_ref() == b"plugin" {
                    push_item(&e, &families, manifest_path, &mut import)?;
                } else {
                    families.push(read_family(&e, manifest_path)?);
                }
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"plugin" {
                    push_item(&e, &families, manifest_path, &mut import)?;
                }
            }
            Event::End(e) => {
                if e.name().as_ref() != b"plugin" {
                    families.pop();
                }
            }
            Event::Eof => break,
            // Text, comments, declarations and processing
            // instructions carry no plugin data.
            _ => {}
        }
    }

    Ok(import)
}

fn read_family(e: &BytesStart<'_>, manifest_path: &Path) -> Result<(String, bool), PluginError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut auto_load = false;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PluginError::ManifestParse {
            path: manifest_path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if attr.key.as_ref() == b"auto_load" {
            auto_load = attr.value.as_ref() == b"true";
        }
    }
    Ok((name, auto_load))
}

fn push_item(
    e: &BytesStart<'_>,
    families: &[(String, bool)],
    manifest_path: &Path,
    import: &mut ManifestImport,
) -> Result<(), PluginError> {
    let fail = |reason: String| PluginError::ManifestParse {
        path: manifest_path.to_path_buf(),
        reason,
    };

    let (libname, auto_load) = match families.last() {
        Some((name, auto)) => (name.clone(), *auto),
        None => return Err(fail("<plugin> outside a library family element".into())),
    };

    let mut item = PluginItem {
        name: String::new(),
        kind: String::new(),
        mime: String::new(),
        category: String::new(),
        libname,
        in_filter: String::new(),
        out_filter: String::new(),
        merit: 0,
        manifest_path: manifest_path.to_path_buf(),
        extensions: Vec::new(),
        filenames: Vec::new(),
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|e| fail(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| fail(e.to_string()))?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => item.name = value,
            b"type" => item.kind = value,
            b"mime" => item.mime = value,
            b"category" => item.category = value,
            b"in_filter" => item.in_filter = value,
            b"out_filter" => item.out_filter = value,
            b"merit" => {
                item.merit = value
                    .parse()
                    .map_err(|_| fail(format!("invalid merit '{value}'")))?;
            }
            b"extension" => {
                for token in value.split([' ', ',']).filter(|t| !t.is_empty()) {
                    let re = PluginItem::compile_extension(token)
                        .map_err(|e| fail(format!("bad extension pattern '{token}': {e}")))?;
                    item.extensions.push(re);
                }
            }
            b"filename" => {
                item.filenames = PluginItem::expand_filenames(&value, manifest_path);
            }
            _ => {}
        }
    }

    if auto_load {
        import.auto_load.push(item.clone());
    }
    import.items.push(item);
    Ok(())
}
