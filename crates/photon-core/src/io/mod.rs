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

//! Read access to small text assets addressed by virtual path.
//!
//! Paths use forward slashes and are relative to the game data root,
//! e.g. `maps/lights.rad`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;

/// A source of text files.
pub trait TextSource: Debug {
    /// Reads the file at `path`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the file does not exist.
    fn read_text(&self, path: &str) -> io::Result<Option<String>>;
}

/// Reads files below a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryTextSource {
    root: PathBuf,
}

impl DirectoryTextSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory paths are resolved against.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl TextSource for DirectoryTextSource {
    fn read_text(&self, path: &str) -> io::Result<Option<String>> {
        let full = path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part));
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::trace!("TextSource: '{}' not found", full.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// In-memory files keyed by virtual path.
impl TextSource for HashMap<String, String> {
    fn read_text(&self, path: &str) -> io::Result<Option<String>> {
        Ok(self.get(path).cloned())
    }
}
