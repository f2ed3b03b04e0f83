// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Emissive texture annotations (`.rad` files).
//!
//! Each non-empty line reads `texture r g b [scale]` or `texture value`.
//! The texture token may carry a wad prefix, `wad/texture`. Colors are on a
//! 0-255 scale when a scale is given, and every color is multiplied by
//! [`EMISSIVE_SCALE`] before use.
//!
//! Two files are read per map: the global `maps/lights.rad`, then the
//! map-specific file named after the map. Later entries override earlier ones,
//! including entries with a zero color, which disable a texture.

use super::error::AnnotationError;
use ahash::AHashMap;
use photon_core::io::TextSource;
use photon_core::math::Vec3;
use std::path::PathBuf;

/// Factor applied to every annotated color.
pub const EMISSIVE_SCALE: f32 = 0.1;

/// The global annotation file, read for every map.
pub const GLOBAL_ANNOTATIONS: &str = "maps/lights.rad";

/// One annotated texture.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissiveEntry {
    /// Color after scaling.
    pub emissive: Vec3,
    /// `false` when every component is zero.
    pub enabled: bool,
    /// Wad name from a `wad/texture` token.
    pub wad: Option<String>,
}

/// A parsed line.
#[derive(Debug, Clone, PartialEq)]
pub struct RadLine {
    /// Lowercased texture name.
    pub texture: String,
    /// The annotation.
    pub entry: EmissiveEntry,
}

/// Parses one line.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(file: &str, line_number: usize, line: &str) -> Result<Option<RadLine>, AnnotationError> {
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return Ok(None);
    };
    if name.contains("//") {
        return Err(AnnotationError::Commented {
            file: file.to_string(),
            line: line_number,
            name: name.to_string(),
        });
    }

    let mut values = [0.0f32; 4];
    let mut count = 0;
    for token in tokens.take(values.len()) {
        match token.parse::<f32>() {
            Ok(v) => {
                values[count] = v;
                count += 1;
            }
            Err(_) => break,
        }
    }

    let color = match count {
        1 => Vec3::splat(values[0]),
        3 => Vec3::new(values[0], values[1], values[2]),
        4 => Vec3::new(values[0], values[1], values[2]) * (values[3] / 255.0),
        _ => {
            return Err(AnnotationError::ValueCount {
                file: file.to_string(),
                line: line_number,
                name: name.to_string(),
                count,
            })
        }
    };

    let (wad, texture) = match name.split_once('/') {
        Some((wad, texture)) => (Some(wad.to_string()), texture),
        None => (None, name),
    };

    Ok(Some(RadLine {
        texture: texture.to_ascii_lowercase(),
        entry: EmissiveEntry {
            emissive: color * EMISSIVE_SCALE,
            enabled: color != Vec3::ZERO,
            wad,
        },
    }))
}

/// Name of the map-specific annotation file: the map name with a trailing
/// `.bsp` (any case) replaced by `.rad`.
pub fn map_annotation_path(map_name: &str) -> String {
    let stem = match map_name.len().checked_sub(4) {
        Some(cut)
            if map_name.is_char_boundary(cut) && map_name[cut..].eq_ignore_ascii_case(".bsp") =>
        {
            &map_name[..cut]
        }
        _ => map_name,
    };
    format!("{stem}.rad")
}

/// Emissive annotations keyed by lowercased texture name.
#[derive(Debug, Clone, Default)]
pub struct EmissiveTable {
    entries: AHashMap<String, EmissiveEntry>,
}

impl EmissiveTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the global file and the file for `map_name`.
    ///
    /// Missing or unreadable files are logged and skipped.
    pub fn load(source: &dyn TextSource, map_name: &str) -> Self {
        let mut table = Self::new();
        let mut found = 0;
        for path in [GLOBAL_ANNOTATIONS.to_string(), map_annotation_path(map_name)] {
            match source.read_text(&path) {
                Ok(Some(text)) => {
                    let added = table.merge_text(&path, &text);
                    log::info!("Loaded {added} light annotations from {path}");
                    found += 1;
                }
                Ok(None) => log::debug!("No light annotations at {path}"),
                Err(source) => {
                    let err = AnnotationError::Read {
                        path: PathBuf::from(&path),
                        source,
                    };
                    log::warn!("{err}");
                }
            }
        }
        if found == 0 {
            log::warn!("No light annotations found for {map_name}; the map will be completely black");
        }
        table
    }

    /// Parses `text` and adds its entries, replacing existing ones.
    ///
    /// Returns the number of entries read.
    pub fn merge_text(&mut self, file: &str, text: &str) -> usize {
        let mut added = 0;
        for (index, line) in text.lines().enumerate() {
            match parse_line(file, index + 1, line) {
                Ok(Some(parsed)) => {
                    log::trace!(
                        "Annotation {} -> {:?}{}",
                        parsed.texture,
                        parsed.entry.emissive,
                        if parsed.entry.enabled { "" } else { " (disabled)" }
                    );
                    self.entries.insert(parsed.texture, parsed.entry);
                    added += 1;
                }
                Ok(None) => {}
                Err(err) => log::warn!("{err}"),
            }
        }
        added
    }

    /// Color of an enabled texture, looked up case-insensitively.
    pub fn emissive_for_texture(&self, texture: &str) -> Option<Vec3> {
        self.entry(texture)
            .filter(|entry| entry.enabled)
            .map(|entry| entry.emissive)
    }

    /// The annotation for a texture, enabled or not.
    pub fn entry(&self, texture: &str) -> Option<&EmissiveEntry> {
        self.entries.get(&texture.to_ascii_lowercase())
    }

    /// Number of annotated textures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was annotated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
