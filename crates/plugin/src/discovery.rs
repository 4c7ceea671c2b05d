//! Registry queries.
//!
//! A [`QueryTraits`] implementation describes what a caller is looking
//! for; [`Discovery`] snapshots the matching items, best merit first,
//! and hands out [`PluginProxy`] handles that can instantiate the
//! plugin on demand.

use crate::abi::PluginInstance;
use crate::error::PluginError;
use crate::host::PluginHost;
use crate::item::PluginItem;

/// The shape of a discovery query.
///
/// Only the library family is mandatory; every other accessor
/// defaults to "match anything".
pub trait QueryTraits {
    /// The library family to search (e.g. `openmedialib`).
    fn libname(&self) -> &str;

    /// Plugin kind to require, or empty for any.
    fn kind(&self) -> &str {
        ""
    }

    /// An extension (or similar token) the item's extension patterns
    /// must match, or empty for any.
    fn to_match(&self) -> &str {
        ""
    }

    /// Required input filter expression, compared verbatim, or empty
    /// for any.
    fn in_filter(&self) -> &str {
        ""
    }

    /// Required output filter expression, compared verbatim, or empty
    /// for any.
    fn out_filter(&self) -> &str {
        ""
    }

    /// Minimum merit a candidate must carry, or `None` for any.
    fn merit(&self) -> Option<i32> {
        None
    }
}

/// A plainly-stated query; covers most lookups without a dedicated
/// traits type.
#[derive(Debug, Default, Clone)]
pub struct Query {
    /// Library family to search.
    pub libname: String,
    /// Required plugin kind, empty for any.
    pub kind: String,
    /// Extension to match, empty for any.
    pub to_match: String,
    /// Minimum merit, `None` for any.
    pub merit: Option<i32>,
}

impl Query {
    /// A query over one library family.
    pub fn family(libname: impl Into<String>) -> Self {
        Self {
            libname: libname.into(),
            ..Self::default()
        }
    }

    /// Require a plugin kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Require an extension match.
    pub fn matching(mut self, to_match: impl Into<String>) -> Self {
        self.to_match = to_match.into();
        self
    }

    /// Require a minimum merit.
    pub fn min_merit(mut self, merit: i32) -> Self {
        self.merit = Some(merit);
        self
    }
}

impl QueryTraits for Query {
    fn libname(&self) -> &str {
        &self.libname
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn to_match(&self) -> &str {
        &self.to_match
    }

    fn merit(&self) -> Option<i32> {
        self.merit
    }
}

fn matches(item: &PluginItem, query: &dyn QueryTraits) -> bool {
    if item.libname != query.libname() {
        return false;
    }
    if !query.kind().is_empty() && item.kind != query.kind() {
        return false;
    }
    if !query.to_match().is_empty() && !item.matches_extension(query.to_match()) {
        return false;
    }
    if !query.in_filter().is_empty() && item.in_filter != query.in_filter() {
        return false;
    }
    if !query.out_filter().is_empty() && item.out_filter != query.out_filter() {
        return false;
    }
    if let Some(min) = query.merit()
        && item.merit < min
    {
        return false;
    }
    true
}

/// The result of one registry query: matching items, highest merit
/// first. Items of equal merit keep their registry order.
pub struct Discovery<'h> {
    host: &'h PluginHost,
    items: Vec<PluginItem>,
}

impl<'h> Discovery<'h> {
    pub(crate) fn run(host: &'h PluginHost, query: &dyn QueryTraits) -> Self {
        let mut items = host.matching_items(query.libname(), |item| matches(item, query));
        // sort_by is stable, so equal merit preserves registry order.
        items.sort_by(|a, b| b.merit.cmp(&a.merit));
        Self { host, items }
    }

    /// Number of matching plugins.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The matching items, best first.
    pub fn items(&self) -> &[PluginItem] {
        &self.items
    }

    /// Reorder the view with a caller-supplied comparator. Stable,
    /// like the default best-merit-first ordering it replaces.
    pub fn sort_by<F>(&mut self, cmp: F)
    where
        F: FnMut(&PluginItem, &PluginItem) -> std::cmp::Ordering,
    {
        self.items.sort_by(cmp);
    }

    /// Iterate the matches as instantiable proxies, best first.
    pub fn iter(&self) -> impl Iterator<Item = PluginProxy<'_>> {
        self.items.iter().map(|item| PluginProxy {
            host: self.host,
            item,
        })
    }
}

/// One discovered plugin, not yet loaded.
///
/// Holding a proxy costs nothing; the library is resolved only when
/// [`create_plugin`](Self::create_plugin) is called.
pub struct PluginProxy<'h> {
    host: &'h PluginHost,
    item: &'h PluginItem,
}

impl PluginProxy<'_> {
    /// The item's metadata.
    pub fn item(&self) -> &PluginItem {
        self.item
    }

    /// Load the plugin's library (if not already loaded) and
    /// instantiate the plugin class named by the item.
    ///
    /// Returns `Ok(None)` if the library loads but does not provide
    /// the class.
    pub fn create_plugin(&self) -> Result<Option<PluginInstance>, PluginError> {
        let module = self.host.load_module(self.item)?;
        module.create_instance(&self.item.name)
    }
}
