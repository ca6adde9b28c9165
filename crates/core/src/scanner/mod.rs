//! Classpath scanning: turns classpath roots into component descriptors.
//!
//! Roots are opened lazily as the [`Scan`] iterator reaches them. Anything that
//! cannot be read or resolved is recorded as a [`ScanIssue`] and skipped; the
//! aggregate decision is made by [`Scan::finish`].

mod manifest;
pub mod roots;
pub mod scan;

pub use manifest::{ComponentManifest, ManifestEntry};
pub use roots::*;
pub use scan::*;

use serde::Serialize;
use std::path::PathBuf;

/// Kind of problem recorded while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanIssueKind {
    /// Root missing, not a directory or manifest, or not readable
    UnreadableRoot,
    /// Directory entry below a root could not be read
    UnreadableEntry,
    /// Manifest could not be decoded or declares an invalid component
    InvalidManifest,
    /// Factory token not present in the component catalog
    UnresolvedFactory,
    /// Identity already discovered earlier in the scan
    DuplicateIdentity,
}

/// Problem recorded and skipped while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub root: String,
    pub path: Option<PathBuf>,
    pub kind: ScanIssueKind,
    pub message: String,
}

impl ScanIssue {
    pub fn new(
        root: impl Into<String>,
        path: Option<PathBuf>,
        kind: ScanIssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            path,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {}: {}", self.root, path.display(), self.message),
            None => write!(f, "[{}] {}", self.root, self.message),
        }
    }
}
