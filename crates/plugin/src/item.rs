//! One registered plugin description, as declared by a manifest entry.

use std::path::{Path, PathBuf};

use regex::Regex;

/// Metadata for a single plugin, parsed from one manifest `<plugin>`
/// element.
///
/// An item describes where a plugin lives and what it claims to
/// handle; the library itself is not touched until something asks to
/// instantiate the plugin.
#[derive(Debug, Clone)]
pub struct PluginItem {
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin kind within its library family (e.g. `input`, `filter`).
    pub kind: String,
    /// MIME type the plugin handles.
    pub mime: String,
    /// Free-form category tag.
    pub category: String,
    /// The library family this plugin belongs to (the manifest's
    /// enclosing family element name).
    pub libname: String,
    /// Input filter expression, matched verbatim by queries.
    pub in_filter: String,
    /// Output filter expression, matched verbatim by queries.
    pub out_filter: String,
    /// Selection priority; higher merit wins.
    pub merit: i32,
    /// The manifest file this item came from.
    pub manifest_path: PathBuf,
    /// Compiled extension patterns. Each matches a whole extension
    /// string, case-insensitively.
    pub extensions: Vec<Regex>,
    /// Candidate shared-library paths, in resolution order.
    pub filenames: Vec<PathBuf>,
}

impl PluginItem {
    /// Compile one manifest extension token into its anchored,
    /// case-insensitive matcher.
    pub(crate) fn compile_extension(token: &str) -> Result<Regex, regex::Error> {
        Regex::new(&format!("(?i)^(?:{token})$"))
    }

    /// Whether any of the item's extension patterns matches the whole
    /// of `extension`.
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|re| re.is_match(extension))
    }

    /// Split a manifest `filename` attribute into candidate paths and
    /// append, for every relative candidate, a copy resolved against
    /// the manifest's directory. Bare names stay first so an explicit
    /// loader search path still wins.
    pub(crate) fn expand_filenames(attr: &str, manifest_path: &Path) -> Vec<PathBuf> {
        let listed: Vec<PathBuf> = attr.split_whitespace().map(PathBuf::from).collect();
        let mut out = listed.clone();
        if let Some(dir) = manifest_path.parent() {
            for candidate in &listed {
                if candidate.is_relative() {
                    out.push(dir.join(candidate));
                }
            }
        }
        out
    }
}
