use std::{path::Path, sync::Arc};

use parking_lot::Mutex;

use crate::{
    caption::{CaptionConfig, CaptionLayout, layout_caption},
    error::LayoutError,
    font_storage::FontStorage,
    metrics::FaceId,
    style::SpeakerStyle,
};

/// High-level entry point for caption layout against real fonts.
///
/// Wraps a [`FontStorage`] in a `Mutex` so one system can be shared between
/// threads; each layout call holds the lock for its whole duration.
///
/// The field is public to allow direct access to the storage when necessary
/// (e.g. to run [`crate::text::parse`] and friends step by step).
pub struct FontSystem {
    /// The underlying font storage.
    pub font_storage: Mutex<FontStorage>,
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FontSystem {
    /// Creates a font system with empty storage.
    pub fn new() -> Self {
        Self {
            font_storage: Mutex::new(FontStorage::new()),
        }
    }
}

/// font storage initialization
impl FontSystem {
    /// Loads the system fonts into the storage.
    pub fn load_system_fonts(&self) {
        self.font_storage.lock().load_system_fonts();
    }

    /// Loads a font from binary data. Returns the first face found, if any.
    pub fn load_font_binary(&self, data: impl Into<Vec<u8>>) -> Option<FaceId> {
        self.font_storage.lock().load_font_binary(data)
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&self, path: impl AsRef<Path>) -> Result<FaceId, LayoutError> {
        self.font_storage.lock().load_font_file(path.as_ref())
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&self, dir: impl AsRef<Path>) {
        self.font_storage.lock().load_fonts_dir(dir.as_ref())
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_storage.lock().is_empty()
    }

    /// Returns the number of loaded faces.
    pub fn len(&self) -> usize {
        self.font_storage.lock().len()
    }
}

/// font querying
impl FontSystem {
    /// Queries for a face matching the description.
    pub fn query(&self, query: &fontdb::Query) -> Option<FaceId> {
        self.font_storage.lock().query(query)
    }

    /// Retrieves a loaded font by face.
    pub fn font(&self, face: FaceId) -> Option<Arc<fontdue::Font>> {
        self.font_storage.lock().font(face)
    }

    /// Returns face info for a face.
    ///
    /// # Performance
    /// This method clones the face info to avoid holding a lock on the storage.
    /// If you need reference access, lock `font_storage` directly.
    pub fn face(&self, face: FaceId) -> Option<fontdb::FaceInfo> {
        self.font_storage.lock().face(face).cloned()
    }
}

/// caption layout
impl FontSystem {
    /// Runs [`layout_caption`] using the fonts in this system.
    pub fn layout_caption(
        &self,
        text: &str,
        speakers: &[SpeakerStyle],
        config: &CaptionConfig,
        artwork_height: Option<u32>,
    ) -> Result<CaptionLayout, LayoutError> {
        let mut font_storage = self.font_storage.lock();
        layout_caption(text, speakers, config, artwork_height, &mut *font_storage)
    }
}
