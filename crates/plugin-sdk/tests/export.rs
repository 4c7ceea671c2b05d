//! End-to-end exercise of the generated entry points through a host.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use opal_plugin::{Db, PluginHost, Query, parse_manifest};
use opal_plugin_sdk::export_plugin;

trait Counter: Send + Sync {
    fn value(&self) -> u64;
}

struct Fixed(u64);

impl Counter for Fixed {
    fn value(&self) -> u64 {
        self.0
    }
}

static INITS: AtomicUsize = AtomicUsize::new(0);
static UNINITS: AtomicUsize = AtomicUsize::new(0);

export_plugin! {
    interface: dyn Counter,
    init: || {
        INITS.fetch_add(1, Ordering::SeqCst);
        true
    },
    uninit: || {
        UNINITS.fetch_add(1, Ordering::SeqCst);
        true
    },
    create: |id| match id {
        "fixed" => Some(Box::new(Fixed(7)) as Box<dyn Counter>),
        _ => None,
    },
}

const MANIFEST: &str = r#"<openmedialib>
  <plugin name="fixed" type="input" extension="fix" filename="libcounter.so"/>
</openmedialib>"#;

// One test so the shared init/uninit counters see a single,
// deterministic lifecycle.
#[test]
fn exported_plugin_round_trip() {
    let host = PluginHost::new();
    host.register_builtin("libcounter.so", openplugin_entry_points())
        .unwrap();
    host.insert_import(
        parse_manifest(MANIFEST, Path::new("/virtual/counter.opl")).unwrap(),
        Db::Custom,
    );
    assert_eq!(INITS.load(Ordering::SeqCst), 1);

    let instance = host
        .instantiate(&Query::family("openmedialib").matching("fix"))
        .unwrap();
    let counter: &dyn Counter = unsafe { instance.interface::<dyn Counter>() };
    assert_eq!(counter.value(), 7);

    // Unload is deferred past the live instance.
    host.unload(Path::new("libcounter.so")).unwrap();
    assert_eq!(UNINITS.load(Ordering::SeqCst), 0);
    drop(instance);
    assert_eq!(UNINITS.load(Ordering::SeqCst), 1);

    // A second load cycle runs the hooks again.
    assert!(openplugin_init());
    assert_eq!(INITS.load(Ordering::SeqCst), 2);
    assert!(openplugin_init());
    assert_eq!(INITS.load(Ordering::SeqCst), 2);
    assert!(openplugin_uninit());
    assert!(openplugin_uninit());
    assert_eq!(UNINITS.load(Ordering::SeqCst), 2);
}
