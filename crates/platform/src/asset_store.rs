//! Read-only embedded asset store
//!
//! Static assets (OSD font images, glyph tables) are linked into the
//! firmware image and looked up by name at runtime. On hardware the
//! returned slices point straight into flash (zero-copy).
//!
//! # Naming
//!
//! Names are plain file names as produced by the asset build step, e.g.
//! `osd_font.bin`. Lookups are exact and case-sensitive.

/// Read-only store of named byte blobs.
pub trait AssetStore {
    /// Return the contents of `name`, or `None` if it is absent.
    fn find(&self, name: &str) -> Option<&[u8]>;

    /// Return the size in bytes of `name`, or `None` if it is absent.
    fn asset_size(&self, name: &str) -> Option<usize> {
        self.find(name).map(<[u8]>::len)
    }

    /// Return `true` if `name` is present in the store.
    fn asset_exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl<T: AssetStore + ?Sized> AssetStore for &T {
    fn find(&self, name: &str) -> Option<&[u8]> {
        (**self).find(name)
    }
}

/// Asset store over a table built at compile time.
///
/// ```
/// use platform::{AssetStore, StaticAssetStore};
///
/// static FONT: [u8; 4] = [0x55; 4];
/// static TABLE: [(&str, &[u8]); 1] = [("osd_font.bin", &FONT)];
/// static ASSETS: StaticAssetStore = StaticAssetStore::new(&TABLE);
///
/// assert_eq!(ASSETS.asset_size("osd_font.bin"), Some(4));
/// assert!(!ASSETS.asset_exists("missing.bin"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticAssetStore {
    entries: &'static [(&'static str, &'static [u8])],
}

impl StaticAssetStore {
    /// Wrap a `(name, contents)` table.
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }
}

impl AssetStore for StaticAssetStore {
    fn find(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, data)| *data)
    }
}
