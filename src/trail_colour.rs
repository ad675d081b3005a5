//! Trail Colour Catalog
//!
//! Named colour profiles for trail rendering, loaded once from a RON
//! document. Each profile carries four slots keyed to the emitter's state:
//! idling, glowing (throttle), afterburning, and jumping. Slots absent from
//! the data default to fully transparent so the renderer can blend them
//! without special cases.

use macroquad::prelude::*;
use serde::Deserialize;

use crate::catalog::{ron_from_str, FieldName, LoadError};

/// RGBA channels as they appear in the data file.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct RawColour {
    #[serde(default)]
    r: f32,
    #[serde(default)]
    g: f32,
    #[serde(default)]
    b: f32,
    #[serde(default)]
    a: f32,
}

impl From<RawColour> for Color {
    fn from(c: RawColour) -> Self {
        Color::new(c.r, c.g, c.b, c.a)
    }
}

#[derive(Deserialize)]
struct TrailsDoc {
    trails: Vec<RawProfile>,
}

struct RawProfile {
    name: String,
    idle: Option<RawColour>,
    glow: Option<RawColour>,
    afterburn: Option<RawColour>,
    jumping: Option<RawColour>,
}

// Hand-written so an unknown slot warns and is skipped; the derived form
// would swallow it without a diagnostic.
impl<'de> Deserialize<'de> for RawProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RawProfileVisitor;

        impl<'de> serde::de::Visitor<'de> for RawProfileVisitor {
            type Value = RawProfile;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a trail colour profile")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawProfile, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut name: Option<String> = None;
                let mut idle = None;
                let mut glow = None;
                let mut afterburn = None;
                let mut jumping = None;
                while let Some(key) = map.next_key::<FieldName>()? {
                    match key.0.as_str() {
                        "name" => name = Some(map.next_value()?),
                        "idle" => idle = map.next_value()?,
                        "glow" => glow = map.next_value()?,
                        "afterburn" => afterburn = map.next_value()?,
                        "jumping" => jumping = map.next_value()?,
                        unknown => {
                            eprintln!(
                                "Warning: trail colour profile has unknown field '{}'",
                                unknown
                            );
                            map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(RawProfile {
                    name: name.ok_or_else(|| serde::de::Error::missing_field("name"))?,
                    idle,
                    glow,
                    afterburn,
                    jumping,
                })
            }
        }

        deserializer.deserialize_struct(
            "RawProfile",
            &["name", "idle", "glow", "afterburn", "jumping"],
            RawProfileVisitor,
        )
    }
}

/// One named colour profile. Immutable after load.
#[derive(Debug, Clone)]
pub struct TrailColourProfile {
    pub name: String,
    pub idle: Color,
    pub glow: Color,
    pub afterburn: Color,
    pub jumping: Color,
}

/// Loaded-once table of trail colour profiles.
pub struct TrailColourCatalog {
    profiles: Vec<TrailColourProfile>,
}

impl TrailColourCatalog {
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let doc: TrailsDoc = ron_from_str(source)?;
        if doc.trails.is_empty() {
            return Err(LoadError::Empty("trail profiles"));
        }

        let transparent = Color::new(0.0, 0.0, 0.0, 0.0);
        let profiles = doc
            .trails
            .into_iter()
            .map(|raw| TrailColourProfile {
                name: raw.name,
                idle: raw.idle.map_or(transparent, Into::into),
                glow: raw.glow.map_or(transparent, Into::into),
                afterburn: raw.afterburn.map_or(transparent, Into::into),
                jumping: raw.jumping.map_or(transparent, Into::into),
            })
            .collect();

        Ok(Self { profiles })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &str) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Index of a profile by name. Missing names warn (a content typo
    /// should be visible) and return `None`.
    pub fn get(&self, name: &str) -> Option<usize> {
        let found = self.profiles.iter().position(|p| p.name == name);
        if found.is_none() {
            eprintln!("Warning: trail colour profile '{}' not found", name);
        }
        found
    }

    pub fn profile(&self, index: usize) -> Option<&TrailColourProfile> {
        self.profiles.get(index)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_profile() {
        let cat = TrailColourCatalog::parse(
            r#"(trails: [(
                name: "plasma",
                idle: (r: 1.0, g: 0.6, b: 0.2, a: 0.7),
                glow: (r: 1.0, g: 0.8, b: 0.4, a: 0.9),
                afterburn: (r: 1.0, g: 1.0, b: 1.0, a: 1.0),
                jumping: (r: 0.4, g: 0.6, b: 1.0, a: 0.8),
            )])"#,
        )
        .unwrap();
        let idx = cat.get("plasma").unwrap();
        let p = cat.profile(idx).unwrap();
        assert!((p.idle.r - 1.0).abs() < 1e-6);
        assert!((p.idle.a - 0.7).abs() < 1e-6);
        assert!((p.jumping.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_slots_default_transparent() {
        let cat =
            TrailColourCatalog::parse(r#"(trails: [(name: "bare", idle: (r: 0.5, a: 0.5))])"#)
                .unwrap();
        let p = cat.profile(0).unwrap();
        // Omitted channels default to zero
        assert!((p.idle.r - 0.5).abs() < 1e-6);
        assert!(p.idle.g.abs() < 1e-6);
        // Omitted slots are fully transparent
        assert!(p.glow.a.abs() < 1e-6);
        assert!(p.afterburn.a.abs() < 1e-6);
        assert!(p.jumping.a.abs() < 1e-6);
    }

    #[test]
    fn test_unknown_field_is_nonfatal() {
        // A typoed slot ('glowy') is skipped with a warning; the profile
        // still installs and the intended slot stays transparent
        let cat = TrailColourCatalog::parse(
            r#"(trails: [(name: "a", idle: (r: 1.0, a: 1.0), glowy: (r: 1.0))])"#,
        )
        .unwrap();
        let p = cat.profile(0).unwrap();
        assert!((p.idle.r - 1.0).abs() < 1e-6);
        assert!(p.glow.a.abs() < 1e-6);
    }

    #[test]
    fn test_empty_document_fails() {
        assert!(matches!(
            TrailColourCatalog::parse(r#"(trails: [])"#),
            Err(LoadError::Empty(_))
        ));
    }

    #[test]
    fn test_unknown_name_returns_none() {
        let cat = TrailColourCatalog::parse(r#"(trails: [(name: "a")])"#).unwrap();
        assert_eq!(cat.get("b"), None);
    }
}
