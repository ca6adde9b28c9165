use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::components::{Capability, ComponentCatalog, ComponentDescriptor, ComponentId, DescriptorSource};
use crate::errors::BootstrapError;
use crate::platform::PlatformTag;
use crate::scanner::manifest::{self, ComponentManifest};
use crate::scanner::{ClasspathRoot, ScanIssue, ScanIssueKind};

/// Enumerates classpath roots and extracts component descriptors
#[derive(Debug, Clone)]
pub struct ClasspathScanner {
    catalog: Arc<ComponentCatalog>,
}

impl ClasspathScanner {
    pub fn new(catalog: Arc<ComponentCatalog>) -> Self {
        Self { catalog }
    }

    /// Start a scan of `roots` for the active `platform`
    ///
    /// Nothing is read until the returned iterator is advanced. A consumed scan
    /// cannot be restarted; scanning again re-enumerates the roots.
    pub fn scan(&self, roots: Vec<ClasspathRoot>, platform: &PlatformTag) -> Scan {
        Scan {
            catalog: self.catalog.clone(),
            platform: platform.clone(),
            roots: roots.into(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
            issues: Vec::new(),
            discovered: 0,
            roots_scanned: 0,
        }
    }
}

/// Result of a drained scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Descriptors in discovery order
    pub descriptors: Vec<ComponentDescriptor>,
    /// Problems recorded and skipped
    pub issues: Vec<ScanIssue>,
    pub roots_scanned: usize,
}

/// Lazy, single-pass sequence of discovered descriptors
#[derive(Debug)]
pub struct Scan {
    catalog: Arc<ComponentCatalog>,
    platform: PlatformTag,
    roots: VecDeque<ClasspathRoot>,
    pending: VecDeque<ComponentDescriptor>,
    seen: HashSet<ComponentId>,
    issues: Vec<ScanIssue>,
    discovered: usize,
    roots_scanned: usize,
}

impl Iterator for Scan {
    type Item = ComponentDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(descriptor) = self.pending.pop_front() {
                return Some(descriptor);
            }
            let root = self.roots.pop_front()?;
            self.load_root(root);
        }
    }
}

impl Scan {
    /// Problems recorded so far
    pub fn issues(&self) -> &[ScanIssue] {
        &self.issues
    }

    /// Drain the remaining roots and decide whether the scan as a whole failed
    ///
    /// Fails when nothing was discovered, or when problems were recorded and a
    /// `required` capability has no descriptor. A missing required capability on
    /// an otherwise clean scan is left to the platform registry.
    pub fn finish(mut self, required: &[Capability]) -> Result<ScanOutcome, BootstrapError> {
        let descriptors: Vec<ComponentDescriptor> = self.by_ref().collect();

        for issue in &self.issues {
            tracing::warn!(kind = ?issue.kind, "Skipped during scan: {}", issue);
        }

        if descriptors.is_empty() {
            return Err(BootstrapError::scan_failure(
                format!(
                    "no components discovered in {} classpath root(s) ({} issue(s) recorded)",
                    self.roots_scanned,
                    self.issues.len()
                ),
                self.issues,
            ));
        }

        if !self.issues.is_empty() {
            let unsatisfied: Vec<&str> = required
                .iter()
                .filter(|cap| !descriptors.iter().any(|d| d.provides(cap)))
                .map(Capability::as_str)
                .collect();

            if !unsatisfied.is_empty() {
                return Err(BootstrapError::scan_failure(
                    format!(
                        "required capabilities [{}] have no descriptor after skipping {} scan issue(s)",
                        unsatisfied.join(", "),
                        self.issues.len()
                    ),
                    self.issues,
                ));
            }
        }

        tracing::info!(
            components = descriptors.len(),
            roots = self.roots_scanned,
            issues = self.issues.len(),
            "Classpath scan complete"
        );

        Ok(ScanOutcome {
            descriptors,
            issues: self.issues,
            roots_scanned: self.roots_scanned,
        })
    }

    fn load_root(&mut self, root: ClasspathRoot) {
        self.roots_scanned += 1;
        let root_name = root.display_name();
        tracing::debug!(root = %root_name, "Scanning classpath root");

        match root {
            ClasspathRoot::Embedded { manifest, .. } => {
                self.accept_manifest(&root_name, None, manifest);
            }
            ClasspathRoot::Manifest(path) => {
                if path.is_file() {
                    self.load_manifest_file(&root_name, &path);
                } else {
                    self.record(&root_name, None, ScanIssueKind::UnreadableRoot, "manifest file does not exist");
                }
            }
            ClasspathRoot::Directory(path) => {
                if !path.is_dir() {
                    self.record(&root_name, None, ScanIssueKind::UnreadableRoot, "directory does not exist");
                    return;
                }
                match self.collect_manifests(&root_name, &path) {
                    Ok(files) => {
                        for file in files {
                            self.load_manifest_file(&root_name, &file);
                        }
                    }
                    Err(e) => {
                        self.record(&root_name, None, ScanIssueKind::UnreadableRoot, e.to_string());
                    }
                }
            }
        }
    }

    /// Manifest files below `dir` in lexicographic path order
    ///
    /// Symlinked directories are not followed. Unreadable subdirectories are
    /// recorded and skipped; only an unreadable root directory is an error.
    fn collect_manifests(&mut self, root_name: &str, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut manifests = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        let mut is_root = true;

        while let Some(current) = stack.pop() {
            let entries = match std::fs::read_dir(&current) {
                Ok(entries) => entries,
                Err(e) if is_root => return Err(e),
                Err(e) => {
                    self.record(root_name, Some(current), ScanIssueKind::UnreadableEntry, e.to_string());
                    continue;
                }
            };
            is_root = false;

            let mut children: Vec<PathBuf> = Vec::new();
            for entry in entries {
                match entry {
                    Ok(entry) => children.push(entry.path()),
                    Err(e) => {
                        self.record(root_name, Some(current.clone()), ScanIssueKind::UnreadableEntry, e.to_string());
                    }
                }
            }

            for child in children {
                let Ok(metadata) = std::fs::symlink_metadata(&child) else {
                    self.record(root_name, Some(child), ScanIssueKind::UnreadableEntry, "metadata unavailable");
                    continue;
                };
                if metadata.is_dir() {
                    stack.push(child);
                } else if manifest::is_manifest_file(&child) {
                    manifests.push(child);
                }
            }
        }

        manifests.sort();
        Ok(manifests)
    }

    fn load_manifest_file(&mut self, root_name: &str, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                self.record(root_name, Some(path.to_path_buf()), ScanIssueKind::UnreadableEntry, e.to_string());
                return;
            }
        };

        match manifest::decode(path, &content) {
            Ok(manifest) => self.accept_manifest(root_name, Some(path.to_path_buf()), manifest),
            Err(message) => {
                self.record(root_name, Some(path.to_path_buf()), ScanIssueKind::InvalidManifest, message);
            }
        }
    }

    fn accept_manifest(&mut self, root_name: &str, path: Option<PathBuf>, manifest: ComponentManifest) {
        for entry in &manifest.components {
            let source = DescriptorSource::new(root_name, path.clone());
            let descriptor = match entry.to_descriptor(source) {
                Ok(descriptor) => descriptor,
                Err(message) => {
                    self.record(root_name, path.clone(), ScanIssueKind::InvalidManifest, message);
                    continue;
                }
            };

            if self.seen.contains(descriptor.id()) {
                self.record(
                    root_name,
                    path.clone(),
                    ScanIssueKind::DuplicateIdentity,
                    format!("component '{}' already discovered; keeping the first declaration", descriptor.id()),
                );
                continue;
            }

            // Factories for other platforms are not expected in this host
            if descriptor.is_eligible_on(&self.platform) && !self.catalog.contains(descriptor.factory()) {
                self.record(
                    root_name,
                    path.clone(),
                    ScanIssueKind::UnresolvedFactory,
                    format!(
                        "component '{}' names factory '{}' which is not in the catalog",
                        descriptor.id(),
                        descriptor.factory()
                    ),
                );
                continue;
            }

            self.seen.insert(descriptor.id().clone());
            let descriptor = descriptor.with_discovery_index(self.discovered);
            self.discovered += 1;
            self.pending.push_back(descriptor);
        }
    }

    fn record(&mut self, root: &str, path: Option<PathBuf>, kind: ScanIssueKind, message: impl Into<String>) {
        self.issues.push(ScanIssue::new(root, path, kind, message));
    }
}
