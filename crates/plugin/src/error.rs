//! Plugin host error types.

use std::path::PathBuf;

/// Errors from manifest import, library resolution and plugin lifecycle
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A manifest document could not be parsed. Reported per file; a
    /// directory scan continues past it.
    #[error("failed to parse manifest '{path}': {reason}")]
    ManifestParse {
        /// The offending manifest file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// None of an item's candidate library files could be opened.
    #[error("no loadable library found; tried {tried:?}")]
    LibraryNotFound {
        /// Every candidate path that was tried, in listed order.
        tried: Vec<PathBuf>,
    },

    /// A library opened but one of the four fixed entry points was
    /// missing.
    #[error("symbol '{symbol}' not found in '{library}': {reason}")]
    SymbolResolution {
        /// The library that was opened.
        library: PathBuf,
        /// The missing symbol name.
        symbol: &'static str,
        /// The underlying loader error.
        reason: String,
    },

    /// The library's `openplugin_init` returned false; the library has
    /// been unloaded again.
    #[error("plugin library '{library}' failed to initialize")]
    InitFailed {
        /// The library that refused to initialize.
        library: PathBuf,
    },

    /// An unload was requested for a library that is not loaded.
    #[error("library '{library}' is not loaded (double unload?)")]
    DoubleUnload {
        /// The library named in the unload request.
        library: PathBuf,
    },

    /// A builtin module was registered twice under the same name.
    #[error("a module is already registered as '{library}'")]
    AlreadyRegistered {
        /// The conflicting registration key.
        library: PathBuf,
    },

    /// A plugin class identifier contained an interior NUL and cannot
    /// cross the C ABI.
    #[error("invalid plugin class id '{0}'")]
    InvalidTypeId(String),

    /// No discovered candidate produced a plugin instance.
    #[error("no plugin could be instantiated for '{request}' ({candidates} candidate(s))")]
    NoViableCandidate {
        /// What was asked for, for diagnostics.
        request: String,
        /// How many candidates the query matched.
        candidates: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_not_found_lists_candidates() {
        let err = PluginError::LibraryNotFound {
            tried: vec![PathBuf::from("/a/libx.so"), PathBuf::from("/b/libx.so")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/libx.so"));
        assert!(msg.contains("/b/libx.so"));
    }

    #[test]
    fn symbol_resolution_names_the_symbol() {
        let err = PluginError::SymbolResolution {
            library: PathBuf::from("libpng_plugin.so"),
            symbol: "openplugin_create_plugin",
            reason: "undefined symbol".into(),
        };
        assert!(err.to_string().contains("openplugin_create_plugin"));
    }
}
