//! Effect Catalog
//!
//! Loaded-once table of base effect definitions, parsed from a RON document.
//! Each definition names a frame-grid sprite sheet and two durations: `anim`,
//! the length of one animation cycle, and `ttl`, how long a spawned instance
//! lives. Both are stored in milliseconds on disk and seconds in memory.
//!
//! Parsing is separated from texture loading: [`EffectCatalog::parse`] works
//! without a GPU context (so load-time behaviour is unit-testable), and
//! [`EffectCatalog::load_textures`] attaches the sprite sheets afterwards.

use macroquad::prelude::*;
use serde::Deserialize;

/// Directory holding effect sprite sheets, joined with each `gfx` path.
pub const SPFX_GFX_DIR: &str = "assets/gfx/spfx";

/// Error type for catalog loading
#[derive(Debug)]
pub enum LoadError {
    /// File I/O error
    Io(String),
    /// Malformed document (bad root structure or field)
    Parse(String),
    /// Document parsed but contains no entries
    Empty(&'static str),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::Parse(msg) => write!(f, "Malformed document: {}", msg),
            LoadError::Empty(what) => write!(f, "Document contains no {}", what),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

/// Deserialize a RON document with `implicit_some` enabled, so data files
/// write `gfx: (path: ...)` rather than `gfx: Some((path: ...))`.
pub(crate) fn ron_from_str<T: serde::de::DeserializeOwned>(source: &str) -> Result<T, LoadError> {
    ron::Options::default()
        .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
        .from_str(source)
        .map_err(|e| LoadError::Parse(e.to_string()))
}

fn default_cols() -> u32 {
    6
}

fn default_rows() -> u32 {
    5
}

/// Reference to a sprite sheet: path relative to [`SPFX_GFX_DIR`] plus the
/// frame grid it is cut into. The 6x5 grid is the house convention for
/// effect sheets, so the dimensions may be omitted in data.
#[derive(Debug, Clone, Deserialize)]
pub struct GfxRef {
    pub path: String,
    #[serde(default = "default_cols")]
    pub cols: u32,
    #[serde(default = "default_rows")]
    pub rows: u32,
}

/// A loaded sprite sheet with its frame grid.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub texture: Texture2D,
    pub cols: u32,
    pub rows: u32,
}

impl SpriteSheet {
    /// Total frames in the grid.
    pub fn frames(&self) -> u32 {
        self.cols * self.rows
    }

    /// Pixel size of one frame.
    pub fn frame_size(&self) -> (f32, f32) {
        (
            self.texture.width() / self.cols as f32,
            self.texture.height() / self.rows as f32,
        )
    }
}

/// One base effect definition. Immutable after load.
#[derive(Debug, Clone)]
pub struct EffectDef {
    pub name: String,
    /// Lifetime of a spawned instance, seconds.
    pub ttl: f32,
    /// Duration of one animation cycle, seconds.
    pub anim: f32,
    pub gfx: Option<GfxRef>,
    /// Attached by `load_textures`; `None` until then (or if loading failed).
    pub sheet: Option<SpriteSheet>,
}

impl EffectDef {
    /// Frame grid of this effect, falling back to the data-declared grid
    /// when the texture itself is not loaded.
    pub fn grid(&self) -> Option<(u32, u32)> {
        if let Some(sheet) = &self.sheet {
            return Some((sheet.cols, sheet.rows));
        }
        self.gfx.as_ref().map(|g| (g.cols, g.rows))
    }
}

/// Raw document shapes. Durations are milliseconds here; `EffectDef` holds
/// seconds.
#[derive(Deserialize)]
struct EffectsDoc {
    effects: Vec<RawEffect>,
}

struct RawEffect {
    name: String,
    ttl: f32,
    anim: f32,
    gfx: Option<GfxRef>,
}

/// Struct key that preserves unrecognized names instead of routing them to
/// serde's silent-skip path, so data-file typos surface as warnings.
pub(crate) struct FieldName(pub(crate) String);

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FieldNameVisitor;

        impl<'de> serde::de::Visitor<'de> for FieldNameVisitor {
            type Value = FieldName;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a field name")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<FieldName, E> {
                Ok(FieldName(v.to_owned()))
            }
        }

        deserializer.deserialize_identifier(FieldNameVisitor)
    }
}

// Hand-written so an unknown field warns and is skipped; the derived form
// would swallow it without a diagnostic.
impl<'de> Deserialize<'de> for RawEffect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RawEffectVisitor;

        impl<'de> serde::de::Visitor<'de> for RawEffectVisitor {
            type Value = RawEffect;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an effect definition")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawEffect, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut name: Option<String> = None;
                let mut ttl = 0.0;
                let mut anim = 0.0;
                let mut gfx = None;
                while let Some(key) = map.next_key::<FieldName>()? {
                    match key.0.as_str() {
                        "name" => name = Some(map.next_value()?),
                        "ttl" => ttl = map.next_value()?,
                        "anim" => anim = map.next_value()?,
                        "gfx" => gfx = map.next_value()?,
                        unknown => {
                            eprintln!("Warning: spfx definition has unknown field '{}'", unknown);
                            map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(RawEffect {
                    name: name.ok_or_else(|| serde::de::Error::missing_field("name"))?,
                    ttl,
                    anim,
                    gfx,
                })
            }
        }

        deserializer.deserialize_struct(
            "RawEffect",
            &["name", "ttl", "anim", "gfx"],
            RawEffectVisitor,
        )
    }
}

/// The loaded-once effect table. Indices into it are stable for the life of
/// the catalog and are what the rest of the engine passes around. Sprite
/// sheet handles are released when the catalog is dropped.
#[derive(Debug)]
pub struct EffectCatalog {
    effects: Vec<EffectDef>,
}

impl EffectCatalog {
    /// Parse a catalog from RON source. Fails on a malformed root structure
    /// or an empty effect list; missing per-entry fields warn and default.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let doc: EffectsDoc = ron_from_str(source)?;
        if doc.effects.is_empty() {
            return Err(LoadError::Empty("effects"));
        }

        let effects = doc
            .effects
            .into_iter()
            .map(|raw| {
                // ms -> s
                let anim = raw.anim / 1000.0;
                let mut ttl = raw.ttl / 1000.0;
                if ttl == 0.0 {
                    ttl = anim;
                }
                if anim == 0.0 {
                    eprintln!("Warning: spfx '{}' missing/invalid 'anim'", raw.name);
                }
                if ttl == 0.0 {
                    eprintln!("Warning: spfx '{}' missing/invalid 'ttl'", raw.name);
                }
                if raw.gfx.is_none() {
                    eprintln!("Warning: spfx '{}' missing 'gfx'", raw.name);
                }
                EffectDef {
                    name: raw.name,
                    ttl,
                    anim,
                    gfx: raw.gfx,
                    sheet: None,
                }
            })
            .collect();

        Ok(Self { effects })
    }

    /// Load a catalog from a RON file on disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &str) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Attach sprite sheets for every definition that names one. Failures
    /// warn and leave the entry without a sheet; rendering skips those.
    pub async fn load_textures(&mut self) {
        for def in &mut self.effects {
            let Some(gfx) = &def.gfx else { continue };
            let path = format!("{}/{}", SPFX_GFX_DIR, gfx.path);
            match load_texture(&path).await {
                Ok(texture) => {
                    texture.set_filter(FilterMode::Nearest);
                    def.sheet = Some(SpriteSheet {
                        texture,
                        cols: gfx.cols,
                        rows: gfx.rows,
                    });
                }
                Err(e) => {
                    eprintln!("Warning: spfx '{}' failed to load '{}': {}", def.name, path, e);
                }
            }
        }
    }

    /// Index of the effect with the given name. Linear scan, first match.
    /// Callers treat `None` as non-fatal where the lookup is optional.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.effects.iter().position(|e| e.name == name)
    }

    pub fn def(&self, index: usize) -> Option<&EffectDef> {
        self.effects.get(index)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_ttl_from_anim() {
        // ttl omitted (0) -> defaults to anim; both converted ms -> s
        let cat = EffectCatalog::parse(
            r#"(effects: [(name: "boom", ttl: 0.0, anim: 500.0, gfx: (path: "boom.png"))])"#,
        )
        .unwrap();
        assert_eq!(cat.len(), 1);
        let def = cat.def(0).unwrap();
        assert!((def.ttl - 0.5).abs() < 1e-6);
        assert!((def.anim - 0.5).abs() < 1e-6);
        // Grid defaults to the house 6x5 convention
        assert_eq!(def.grid(), Some((6, 5)));
    }

    #[test]
    fn test_parse_missing_gfx_still_installs() {
        let cat = EffectCatalog::parse(r#"(effects: [(name: "flash", anim: 200.0)])"#).unwrap();
        assert_eq!(cat.len(), 1);
        assert!(cat.def(0).unwrap().gfx.is_none());
        assert_eq!(cat.get("flash"), Some(0));
    }

    #[test]
    fn test_parse_unknown_field_is_nonfatal() {
        // A typoed key ('tttl') is skipped with a warning; the entry still
        // installs and the real field falls back to its default (anim)
        let cat = EffectCatalog::parse(
            r#"(effects: [(name: "boom", tttl: 500.0, anim: 500.0, gfx: (path: "boom.png"))])"#,
        )
        .unwrap();
        assert_eq!(cat.len(), 1);
        let def = cat.def(0).unwrap();
        assert!((def.ttl - 0.5).abs() < 1e-6);
        assert!((def.anim - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_malformed_root_fails() {
        let err = EffectCatalog::parse(r#"(sprites: [])"#).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_parse_empty_fails() {
        let err = EffectCatalog::parse(r#"(effects: [])"#).unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn test_get_scans_in_file_order() {
        let cat = EffectCatalog::parse(
            r#"(effects: [
                (name: "boom", anim: 500.0, gfx: (path: "boom.png")),
                (name: "flare", anim: 300.0, gfx: (path: "flare.png", cols: 4, rows: 4)),
            ])"#,
        )
        .unwrap();
        assert_eq!(cat.get("boom"), Some(0));
        assert_eq!(cat.get("flare"), Some(1));
        assert_eq!(cat.get("missing"), None);
        assert_eq!(cat.def(1).unwrap().grid(), Some((4, 4)));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_load_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"(effects: [(name: "boom", anim: 500.0, gfx: (path: "boom.png"))])"#
        )
        .unwrap();
        let cat = EffectCatalog::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cat.get("boom"), Some(0));
    }
}
