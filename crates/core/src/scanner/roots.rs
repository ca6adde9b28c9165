use std::fmt;
use std::path::{Path, PathBuf};

use crate::scanner::ComponentManifest;

/// One entry of the classpath handed to the scanner by the host launcher
#[derive(Debug, Clone)]
pub enum ClasspathRoot {
    /// Directory walked recursively for manifest files
    Directory(PathBuf),
    /// A single manifest file
    Manifest(PathBuf),
    /// Manifest supplied in memory by the host
    Embedded {
        name: String,
        manifest: ComponentManifest,
    },
}

impl ClasspathRoot {
    /// Classify a path; anything that is not an existing file is treated as a directory root
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_file() {
            ClasspathRoot::Manifest(path)
        } else {
            ClasspathRoot::Directory(path)
        }
    }

    pub fn embedded(name: impl Into<String>, manifest: ComponentManifest) -> Self {
        ClasspathRoot::Embedded {
            name: name.into(),
            manifest,
        }
    }

    /// Filesystem path of the root, if it lives on disk
    pub fn path(&self) -> Option<&Path> {
        match self {
            ClasspathRoot::Directory(path) | ClasspathRoot::Manifest(path) => Some(path),
            ClasspathRoot::Embedded { .. } => None,
        }
    }

    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClasspathRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClasspathRoot::Directory(path) | ClasspathRoot::Manifest(path) => {
                write!(f, "{}", path.display())
            }
            ClasspathRoot::Embedded { name, .. } => write!(f, "embedded:{}", name),
        }
    }
}
