//! The manifest registry: every plugin description the host knows
//! about, keyed by library family.
//!
//! Two databases are kept. The standard database is populated by
//! directory scans over the configured search path; the custom
//! database holds manifests registered explicitly at runtime. Queries
//! walk the custom database first so runtime registrations shadow the
//! installed set.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::PluginError;
use crate::item::PluginItem;
use crate::manifest::{ManifestImport, import_manifest};

/// Which database a manifest lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Db {
    /// Installed manifests found by scanning the search path.
    Std,
    /// Manifests registered explicitly at runtime.
    Custom,
}

/// Multimap of [`PluginItem`]s keyed by library family name.
#[derive(Debug, Default)]
pub struct ManifestRegistry {
    std_db: HashMap<String, Vec<PluginItem>>,
    custom_db: HashMap<String, Vec<PluginItem>>,
}

impl ManifestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every directory in a search-path string for `.opl`
    /// manifests and load them into the standard database.
    ///
    /// `paths` is split on `:` and `;`. Unreadable directories and
    /// unparseable manifests are logged and skipped; the scan never
    /// fails as a whole. Returns the items that requested auto-load.
    pub fn scan_paths(&mut self, paths: &str) -> Vec<PluginItem> {
        let mut auto_load = Vec::new();
        for dir in paths.split([':', ';']).filter(|p| !p.is_empty()) {
            auto_load.extend(self.scan_directory(Path::new(dir)));
        }
        auto_load
    }

    /// Scan one directory for `.opl` manifests, loading each into the
    /// standard database. Per-file failures are logged and skipped.
    pub fn scan_directory(&mut self, dir: &Path) -> Vec<PluginItem> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(directory = %dir.display(), error = %e, "skipping unreadable plugin directory");
                return Vec::new();
            }
        };

        let mut auto_load = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("opl") {
                continue;
            }
            match import_manifest(&path) {
                Ok(import) => {
                    debug!(manifest = %path.display(), items = import.items.len(), "imported manifest");
                    auto_load.extend(self.insert(import, Db::Std));
                }
                Err(e) => {
                    warn!(manifest = %path.display(), error = %e, "skipping unparseable manifest");
                }
            }
        }
        auto_load
    }

    /// Load one manifest file into the chosen database. Unlike a
    /// directory scan, an explicit registration reports its failure.
    /// Returns the items that requested auto-load.
    pub fn register_manifest(&mut self, path: &Path, db: Db) -> Result<Vec<PluginItem>, PluginError> {
        let import = import_manifest(path)?;
        Ok(self.insert(import, db))
    }

    /// Insert an already-parsed import.
    pub fn insert(&mut self, import: ManifestImport, db: Db) -> Vec<PluginItem> {
        let target = match db {
            Db::Std => &mut self.std_db,
            Db::Custom => &mut self.custom_db,
        };
        for item in import.items {
            target.entry(item.libname.clone()).or_default().push(item);
        }
        import.auto_load
    }

    /// All items registered under a library family, custom database
    /// first, each in registration order.
    pub fn items(&self, libname: &str) -> impl Iterator<Item = &PluginItem> {
        self.custom_db
            .get(libname)
            .into_iter()
            .flatten()
            .chain(self.std_db.get(libname).into_iter().flatten())
    }

    /// Every registered item, custom database first.
    pub fn all_items(&self) -> impl Iterator<Item = &PluginItem> {
        self.custom_db
            .values()
            .flatten()
            .chain(self.std_db.values().flatten())
    }

    /// Total number of registered items.
    pub fn len(&self) -> usize {
        self.custom_db.values().map(Vec::len).sum::<usize>()
            + self.std_db.values().map(Vec::len).sum::<usize>()
    }

    /// Whether the registry holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn import(text: &str, path: &str) -> ManifestImport {
        parse_manifest(text, Path::new(path)).unwrap()
    }

    const STD: &str = r#"<openimagelib>
  <plugin name="png" type="input" extension="png" filename="libpng.so" merit="1"/>
</openimagelib>"#;

    const CUSTOM: &str = r#"<openimagelib>
  <plugin name="png-fast" type="input" extension="png" filename="libpngf.so" merit="9"/>
</openimagelib>"#;

    #[test]
    fn custom_db_is_searched_first() {
        let mut registry = ManifestRegistry::new();
        registry.insert(import(STD, "/std/png.opl"), Db::Std);
        registry.insert(import(CUSTOM, "/custom/png.opl"), Db::Custom);

        let names: Vec<&str> = registry
            .items("openimagelib")
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["png-fast", "png"]);
    }

    #[test]
    fn unknown_family_yields_nothing() {
        let mut registry = ManifestRegistry::new();
        registry.insert(import(STD, "/std/png.opl"), Db::Std);
        assert_eq!(registry.items("openmedialib").count(), 0);
    }

    #[test]
    fn directory_scan_skips_broken_manifests() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.opl");
        std::fs::write(&good, STD).unwrap();

        let mut bad = std::fs::File::create(dir.path().join("bad.opl")).unwrap();
        bad.write_all(b"<openimagelib><plugin merit=\"nope\"/></openimagelib>")
            .unwrap();

        std::fs::write(dir.path().join("notes.txt"), "not a manifest").unwrap();

        let mut registry = ManifestRegistry::new();
        let auto = registry.scan_directory(dir.path());
        assert!(auto.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_directory_is_tolerated() {
        let mut registry = ManifestRegistry::new();
        registry.scan_paths("/definitely/not/here:/also/missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn auto_load_items_are_returned_on_insert() {
        let text = r#"<openimagelib auto_load="true">
  <plugin name="png" type="input" filename="libpng.so"/>
</openimagelib>"#;
        let mut registry = ManifestRegistry::new();
        let auto = registry.insert(import(text, "/std/auto.opl"), Db::Std);
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].name, "png");
    }
}
