//! Mods folder scanner.
//!
//! Walks a mods folder, reads each package's `manifest.json`, and classifies
//! every folder into a [`PackageDescriptor`] for the graph builder.

pub mod paths;

use globset::{Glob, GlobSet, GlobSetBuilder};
use moddeps_core::package::{Manifest, ModKind, PackageDescriptor};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("mods folder not found: {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("game folder not found: {}", .0.display())]
    GameDirNotFound(PathBuf),
    #[error("{} looks like a game folder, but it has no Mods folder", .0.display())]
    NoModsFolder(PathBuf),
    #[error("failed to read directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// Scanner settings.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Folder-name (or relative path) globs classified as Ignored.
    pub exclude: Vec<String>,
}

/// Scan a mods folder and describe every package folder in it.
///
/// Folders are visited in file-name order. A folder without a manifest but
/// with subfolders is searched recursively and yields no descriptor itself.
/// A folder that cannot be read is classified Invalid with the reason; only
/// failing to read `root` itself aborts the scan.
pub fn scan_mods_folder(
    root: &Path,
    options: &ScanOptions,
) -> Result<Vec<PackageDescriptor>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let exclude = build_exclude_set(&options.exclude)?;
    let mut scan = Scan {
        root,
        exclude,
        visited: HashSet::new(),
        found: Vec::new(),
    };
    scan.visited.insert(canonical(root));
    let children = subdirectories(root)?;
    scan.visit_children(children);
    Ok(scan.found)
}

/// Keep only descriptors the graph should draw (drops Ignored and Invalid).
pub fn renderable(descriptors: Vec<PackageDescriptor>) -> Vec<PackageDescriptor> {
    descriptors
        .into_iter()
        .filter(|d| d.kind.is_renderable())
        .collect()
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p)?);
    }
    Ok(builder.build()?)
}

/// A child folder, or the path of a child that could not be inspected.
type Child = Result<PathBuf, (PathBuf, walkdir::Error)>;

struct Scan<'a> {
    root: &'a Path,
    exclude: GlobSet,
    /// Canonical paths already entered, so symlinked folders are not
    /// scanned twice or followed around a cycle.
    visited: HashSet<PathBuf>,
    found: Vec<PackageDescriptor>,
}

impl Scan<'_> {
    fn visit_children(&mut self, children: Vec<Child>) {
        for child in children {
            match child {
                Ok(folder) => self.visit(&folder),
                Err((folder, err)) => self.unreadable(&folder, &err.to_string()),
            }
        }
    }

    fn visit(&mut self, folder: &Path) {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rel = relative_name(self.root, folder);

        if name.starts_with('.') || self.exclude.is_match(&name) || self.exclude.is_match(&rel) {
            debug!(folder = %rel, "ignored");
            self.found.push(PackageDescriptor::without_manifest(
                folder,
                rel,
                ModKind::Ignored,
                None,
            ));
            return;
        }

        if !self.visited.insert(canonical(folder)) {
            self.unreadable(folder, "file system loop found: folder was already scanned");
            return;
        }

        let manifest_path = match find_manifest(folder) {
            Ok(path) => path,
            Err(err) => return self.unreadable(folder, &err.to_string()),
        };
        if let Some(manifest_path) = manifest_path {
            let descriptor = read_package(folder, &rel, &manifest_path);
            debug!(folder = %rel, kind = %descriptor.kind, "scanned");
            self.found.push(descriptor);
            return;
        }

        let children = match subdirectories(folder) {
            Ok(children) => children,
            Err(err) => return self.unreadable(folder, &err.to_string()),
        };
        if children.is_empty() {
            debug!(folder = %rel, "no manifest found");
            self.found.push(PackageDescriptor::without_manifest(
                folder,
                rel,
                ModKind::Unknown,
                Some("no manifest found".to_string()),
            ));
        } else {
            self.visit_children(children);
        }
    }

    /// Record a folder that could not be read and keep scanning.
    fn unreadable(&mut self, folder: &Path, reason: &str) {
        let rel = relative_name(self.root, folder);
        warn!(folder = %rel, error = %reason, "cannot read folder");
        self.found.push(PackageDescriptor::without_manifest(
            folder,
            rel,
            ModKind::Invalid,
            Some(format!("cannot read folder: {}", reason)),
        ));
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// List the folders directly inside `dir` in file-name order, following
/// symlinks. Failing to read `dir` itself is an error; a child that cannot be
/// inspected (dangling link, link cycle, no permission) is returned as such.
fn subdirectories(dir: &Path) -> Result<Vec<Child>, walkdir::Error> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(Ok(entry.into_path())),
            Ok(_) => {}
            Err(err) if err.depth() > 0 => {
                let path = err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                dirs.push(Err((path, err)));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(dirs)
}

/// Find `manifest.json` directly inside the folder, ignoring file-name case.
fn find_manifest(folder: &Path) -> Result<Option<PathBuf>, walkdir::Error> {
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                debug!(folder = %folder.display(), error = %err, "skipping unreadable entry");
                continue;
            }
            Err(err) => return Err(err),
        };
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(MANIFEST_FILE)
        {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

fn relative_name(root: &Path, folder: &Path) -> String {
    folder
        .strip_prefix(root)
        .unwrap_or(folder)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read and classify one package folder. Never fails: unusable manifests
/// become Invalid descriptors carrying the reason.
fn read_package(folder: &Path, rel: &str, manifest_path: &Path) -> PackageDescriptor {
    let invalid = |reason: String| {
        PackageDescriptor::without_manifest(folder, rel, ModKind::Invalid, Some(reason))
    };

    let content = match fs::read_to_string(manifest_path) {
        Ok(c) => c,
        Err(e) => return invalid(format!("failed to read manifest: {}", e)),
    };
    let manifest = match Manifest::from_json(&content) {
        Ok(m) => m,
        Err(e) => return invalid(format!("manifest parse error: {}", e)),
    };
    if manifest.unique_id.trim().is_empty() {
        return invalid("manifest has no UniqueID field".to_string());
    }
    PackageDescriptor::from_manifest(folder, rel, manifest)
}
