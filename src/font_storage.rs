use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::LayoutError,
    metrics::{FaceId, FontHandle, FontMetrics},
};

/// Font backend built on `fontdb` and `fontdue`.
///
/// Faces live in a `fontdb` database; the `fontdue` instance used for
/// measuring is only parsed the first time a face is measured. Every face
/// handed to the layout engine gets a compact [`FaceId`].
pub struct FontStorage {
    /// This is the font set that has been loaded by fontdb.
    font_db: fontdb::Database,
    /// `FaceId` index -> fontdb id.
    faces: Vec<fontdb::ID>,
    face_ids: HashMap<fontdb::ID, FaceId, fxhash::FxBuildHasher>,
    /// Files already registered through [`FontMetrics::load`].
    paths: HashMap<PathBuf, FaceId, fxhash::FxBuildHasher>,
    /// This is the font that has been loaded by fontdue.
    /// Not all fonts in fontdb are necessarily loaded here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates a new empty font storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            faces: Vec::new(),
            face_ids: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            paths: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }

    /// Returns the [`FaceId`] for a fontdb face, assigning one if needed.
    pub fn face_id(&mut self, id: fontdb::ID) -> FaceId {
        if let Some(face) = self.face_ids.get(&id) {
            return *face;
        }
        let face = FaceId::new(self.faces.len() as u32);
        self.faces.push(id);
        self.face_ids.insert(id, face);
        face
    }

    /// Returns the fontdb id behind a [`FaceId`].
    pub fn fontdb_id(&self, face: FaceId) -> Option<fontdb::ID> {
        self.faces.get(face.index()).copied()
    }
}

/// Loading fonts into fontdb.
impl FontStorage {
    /// Loads a font from binary data and returns its first face.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) -> Option<FaceId> {
        let data: Vec<u8> = data.into();
        let ids = self
            .font_db
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));
        let first = ids.first().copied()?;
        Some(self.face_id(first))
    }

    /// Loads a font file and returns its first face.
    pub fn load_font_file(&mut self, path: &Path) -> Result<FaceId, LayoutError> {
        if let Some(face) = self.paths.get(path) {
            return Ok(*face);
        }

        let data = std::fs::read(path).map_err(|source| LayoutError::FontIo {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(face) = self.load_font_binary(data) else {
            log::warn!("No face found in font file '{}'", path.display());
            return Err(LayoutError::NoFace(path.to_path_buf()));
        };

        log::debug!("Loaded font '{}' as {:?}", path.display(), face);
        self.paths.insert(path.to_path_buf(), face);
        Ok(face)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&mut self, dir: &Path) {
        self.font_db.load_fonts_dir(dir)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of faces known to fontdb.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }
}

/// Get `Font`
impl FontStorage {
    /// Queries fontdb for a face matching the description.
    pub fn query(&mut self, query: &fontdb::Query) -> Option<FaceId> {
        let id = self.font_db.query(query)?;
        Some(self.face_id(id))
    }

    /// Retrieves the parsed font behind a face, loading it if necessary.
    pub fn font(&mut self, face: FaceId) -> Option<Arc<fontdue::Font>> {
        use std::collections::hash_map::Entry;

        let id = self.fontdb_id(face)?;
        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Some(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self.font_db.with_face_data(id, |data, index| {
                    fontdue::Font::from_bytes(
                        data,
                        fontdue::FontSettings {
                            collection_index: index,
                            scale: 40.0,
                            load_substitutions: true,
                        },
                    )
                })?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Some(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        None
                    }
                }
            }
        }
    }

    /// Returns face info for a face.
    pub fn face(&self, face: FaceId) -> Option<&fontdb::FaceInfo> {
        self.font_db.face(self.fontdb_id(face)?)
    }
}

impl FontMetrics for FontStorage {
    fn load(&mut self, path: &Path, pixel_height: u32) -> Result<FontHandle, LayoutError> {
        let face = self.load_font_file(path)?;
        Ok(FontHandle::new(face, pixel_height))
    }

    /// Sums glyph advances, applying kerning between neighbouring glyphs.
    fn advance_width(&mut self, font: FontHandle, text: &str) -> f32 {
        let Some(face) = self.font(font.face()) else {
            return 0.0;
        };
        let px = font.pixel_height() as f32;

        let mut width = 0.0;
        let mut last_glyph: Option<u16> = None;
        for ch in text.chars() {
            let glyph_idx = face.lookup_glyph_index(ch);
            if let Some(last) = last_glyph {
                width += face
                    .horizontal_kern_indexed(last, glyph_idx, px)
                    .unwrap_or(0.0);
            }
            width += face.metrics_indexed(glyph_idx, px).advance_width;
            last_glyph = Some(glyph_idx);
        }
        width
    }
}
