//! Load-time configuration.

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::pdb::codec::registry::DecoderRegistry;
use crate::pdb::types::error::{PdbError, Result};

/// How the app-info block is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppInfoLayout {
    /// The whole block is kept as opaque bytes.
    #[default]
    Opaque,
    /// The block starts with the standard 16-slot category table.
    Standard,
}

/// Options controlling how a container is loaded.
///
/// Priority for the text encoding of fixed-width names (database name and
/// category names): the explicit `encoding` here, which defaults to
/// Windows-1252, the closest standard match to the Palm Latin character set.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub encoding: &'static Encoding,
    pub appinfo_layout: AppInfoLayout,
    pub registry: DecoderRegistry,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: WINDOWS_1252,
            appinfo_layout: AppInfoLayout::Opaque,
            registry: DecoderRegistry::default(),
        }
    }
}

impl LoadOptions {
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Overrides the encoding by label (`"utf-8"`, `"shift_jis"`, ...).
    ///
    /// # Errors
    /// [`PdbError::UnknownEncoding`] if `encoding_rs` does not know the label.
    pub fn with_encoding_label(mut self, label: &str) -> Result<Self> {
        self.encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| PdbError::UnknownEncoding(label.to_string()))?;
        Ok(self)
    }

    pub fn with_appinfo_layout(mut self, layout: AppInfoLayout) -> Self {
        self.appinfo_layout = layout;
        self
    }

    pub fn with_registry(mut self, registry: DecoderRegistry) -> Self {
        self.registry = registry;
        self
    }
}
