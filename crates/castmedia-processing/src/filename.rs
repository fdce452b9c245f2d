//! Sanitized, collision-free filenames inside a target directory.
//!
//! A name is reserved by creating it with `create_new`, so two allocators
//! racing on the same directory can never hand out the same name. The caller
//! then overwrites the empty placeholder with the real content.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

const MAX_BASE_LEN: usize = 50;
const MAX_EXTENSION_LEN: usize = 10;
const FALLBACK_BASE: &str = "file";

#[derive(Debug, thiserror::Error)]
pub enum AllocateError {
    #[error("Target directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Could not reserve a filename in {}: {}", .dir.display(), .source)]
    Io {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No free filename for '{base}' in {}", .dir.display())]
    Exhausted { base: String, dir: PathBuf },
}

#[derive(Debug, Clone, Copy)]
pub struct FilenameAllocator {
    /// `name`, `name_1`, ... `name_{n-1}` are tried before random suffixes.
    pub sequential_attempts: u32,
    pub random_attempts: u32,
}

impl Default for FilenameAllocator {
    fn default() -> Self {
        Self {
            sequential_attempts: 100,
            random_attempts: 8,
        }
    }
}

impl FilenameAllocator {
    /// Split `original` into a sanitized base and extension.
    ///
    /// Only `[A-Za-z0-9_-]` survive; the base is cut to 50 characters and
    /// falls back to `file` when nothing is left.
    pub fn sanitize(original: &str) -> (String, Option<String>) {
        // Client filenames may carry either separator.
        let name = original
            .rsplit(&['/', '\\'][..])
            .next()
            .unwrap_or(original);

        let (stem, extension) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
            _ => (name, None),
        };

        let mut base: String = stem.chars().filter(is_safe_char).take(MAX_BASE_LEN).collect();
        if base.is_empty() {
            base = FALLBACK_BASE.to_string();
        }

        let extension = extension
            .map(|ext| {
                ext.chars()
                    .filter(char::is_ascii_alphanumeric)
                    .take(MAX_EXTENSION_LEN)
                    .collect::<String>()
            })
            .filter(|ext| !ext.is_empty());

        (base, extension)
    }

    /// Reserve a unique filename for `original` inside `dir` and return it
    /// (not the full path). The reserved file exists and is empty.
    pub fn allocate(&self, original: &str, dir: &Path) -> Result<String, AllocateError> {
        if !dir.is_dir() {
            return Err(AllocateError::MissingDirectory(dir.to_path_buf()));
        }

        let (base, extension) = Self::sanitize(original);
        let compose = |suffix: Option<String>| {
            let stem = match suffix {
                Some(s) => format!("{}_{}", base, s),
                None => base.clone(),
            };
            match &extension {
                Some(ext) => format!("{}.{}", stem, ext),
                None => stem,
            }
        };

        let sequential = (0..self.sequential_attempts)
            .map(|n| if n == 0 { None } else { Some(n.to_string()) });
        let random = (0..self.random_attempts).map(|_| Some(short_random_suffix()));

        for candidate in sequential.chain(random).map(compose) {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&candidate))
            {
                Ok(_) => {
                    tracing::debug!(dir = %dir.display(), filename = %candidate, "Filename reserved");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(AllocateError::Io {
                        dir: dir.to_path_buf(),
                        source,
                    })
                }
            }
        }

        Err(AllocateError::Exhausted {
            base,
            dir: dir.to_path_buf(),
        })
    }
}

/// [`FilenameAllocator::allocate`] with default attempt bounds.
pub fn allocate_unique_filename(original: &str, dir: &Path) -> Result<String, AllocateError> {
    FilenameAllocator::default().allocate(original, dir)
}

fn is_safe_char(c: &char) -> bool {
    c.is_ascii_alphanumeric() || *c == '_' || *c == '-'
}

fn short_random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
