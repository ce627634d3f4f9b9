//! The client's authoritative copy of file contents.

use std::collections::HashMap;

/// Filename -> full contents, owned by the client.
///
/// The mirror is independent of the worker's lifetime: when the worker dies
/// and is respawned, replaying the mirror is the sole way its state is
/// rebuilt. Only final contents per file are held, so replay order does
/// not matter.
#[derive(Debug, Default)]
pub struct FileMirror {
    files: HashMap<String, String>,
}

impl FileMirror {
    /// Create an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file's current contents, inserting or replacing.
    pub fn update(&mut self, filename: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(filename.into(), contents.into());
    }

    /// Drop a file, returning its last contents if it was tracked.
    pub fn remove(&mut self, filename: &str) -> Option<String> {
        self.files.remove(filename)
    }

    /// Whether `filename` is currently tracked.
    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the mirror tracks no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over `(filename, contents)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
