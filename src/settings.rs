//! User configuration persisted between sessions as JSON.

use crate::colour_cache::RecentColours;
use crate::pixel_grid::Colour;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base archive (or unpacked pack) opened last.
    pub archive: Option<PathBuf>,
    /// Pack directory opened or saved last.
    pub pack_root: Option<PathBuf>,
    pub recent_colours: Vec<[u8; 4]>,
    pub colour: [u8; 4],
    pub original_alpha: u8,
    pub original_on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive: None,
            pack_root: None,
            recent_colours: RecentColours::default().iter().map(|c| c.0).collect(),
            colour: [0, 0, 0, 255],
            original_alpha: u8::MAX,
            original_on_top: false,
        }
    }
}

impl Settings {
    /// Reads settings from `path`, falling back to defaults when missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                log::warn!("Could not read settings {}: {err}", path.display());
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!("Ignoring corrupt settings {}: {err}", path.display());
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| format!("Failed to serialize settings: {err}"))?;
        fs::write(path, json).map_err(|err| format!("Failed to write {}: {err}", path.display()))
    }

    pub fn colour(&self) -> Colour {
        Rgba(self.colour)
    }

    /// Rebuilds the swatch cache, oldest colour first.
    pub fn recent_colours(&self) -> RecentColours {
        let mut recent = RecentColours::new(
            crate::constants::SWATCH_COLUMNS,
            crate::constants::SWATCH_ROWS,
        );
        for colour in &self.recent_colours {
            recent.add(Rgba(*colour));
        }
        recent
    }

    pub fn set_recent_colours(&mut self, recent: &RecentColours) {
        self.recent_colours = recent.iter().map(|c| c.0).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "original_alpha": 12 }"#).unwrap();
        assert_eq!(settings.original_alpha, 12);
        assert_eq!(settings.colour, [0, 0, 0, 255]);
        assert_eq!(settings.recent_colours.len(), 3);
    }

    #[test]
    fn test_recent_colours_round_trip() {
        let mut recent = RecentColours::new(16, 4);
        recent.add(Rgba([1, 2, 3, 4]));
        recent.add(Rgba([5, 6, 7, 8]));

        let mut settings = Settings::default();
        settings.set_recent_colours(&recent);
        let json = serde_json::to_string(&settings).unwrap();
        let restored: Settings = serde_json::from_str(&json).unwrap();
        let colours: Vec<Colour> = restored.recent_colours().iter().collect();
        assert_eq!(colours, vec![Rgba([1, 2, 3, 4]), Rgba([5, 6, 7, 8])]);
    }

    #[test]
    fn test_load_falls_back_on_corrupt_file() {
        let path = std::env::temp_dir().join(format!("pack-skinner-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        fs::remove_file(&path).unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
    }
}
