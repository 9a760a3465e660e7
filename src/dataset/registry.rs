use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

/// Append-only list mapping class names to stable integer ids.
///
/// Backed by a newline-delimited file; a class's id is its line number
/// (0-based). Ids never change once assigned.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    path:    PathBuf,
    classes: Vec<String>,
}

impl ClassRegistry {
    /// Reads the registry at `path`. A missing file is an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let classes = match std::fs::read_to_string(&path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(ClassRegistry { path, classes })
    }

    /// Id of `name`, if registered.
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == name)
    }

    /// Id of `name`, appending it when unseen. The flag is `true` on append.
    ///
    /// Names spanning more than one line are refused: the file holds one
    /// name per line, so they would shift every later id on reload.
    /// Linear lookup; registries stay at tens to low hundreds of entries.
    pub fn get_or_create_id(&mut self, name: &str) -> Result<(usize, bool)> {
        if let Some(id) = self.id_of(name) {
            return Ok((id, false));
        }
        if !is_single_line(name) {
            return Err(Error::InvalidLabel(name.to_owned()));
        }
        self.classes.push(name.to_owned());
        Ok((self.classes.len() - 1, true))
    }

    /// Rewrites the whole registry file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = self.classes.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(&self.path, text)?;
        info!(path = %self.path.display(), classes = self.classes.len(), "class registry saved");
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `true` if `name` is non-blank and contains no line break.
pub fn is_single_line(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['\n', '\r'])
}
