//! Uploaded files and local folder scanning.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::thread;
use tracing::debug;

use ctxbuf_utils::error::ImportError;
use ctxbuf_utils::types::{FileMap, FileRecord};

/// A file handed to the importer.
///
/// `relative_path` starts with the uploaded folder's name, as browsers report
/// it for directory uploads (`my-app/src/main.ts`).
pub trait UploadedFile: Sync {
    fn name(&self) -> &str;

    fn relative_path(&self) -> &str;

    /// # Errors
    ///
    /// Returns `ImportError::ReadFailed` when the file cannot be read as text.
    fn read_text(&self) -> Result<String, ImportError>;
}

/// An [`UploadedFile`] backed by the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: Utf8PathBuf,
    relative_path: String,
}

impl LocalFile {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, relative_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative_path: relative_path.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl UploadedFile for LocalFile {
    fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    fn relative_path(&self) -> &str {
        &self.relative_path
    }

    fn read_text(&self) -> Result<String, ImportError> {
        fs::read_to_string(&self.path).map_err(|e| ImportError::ReadFailed {
            path: self.path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// A file's text and its path inside the imported project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArtifact {
    pub path: String,
    pub content: String,
}

/// Path of an uploaded file with the leading folder segment removed.
#[must_use]
pub fn artifact_path(relative_path: &str) -> String {
    relative_path
        .split('/')
        .skip(1)
        .collect::<Vec<_>>()
        .join("/")
}

/// Read every file on scoped worker threads. Output order matches input order.
///
/// # Errors
///
/// Returns the first read failure in input order, or `ImportError::ReadFailed`
/// if a worker thread panicked.
pub fn read_artifacts<F: UploadedFile>(files: &[F]) -> Result<Vec<FileArtifact>, ImportError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let workers = thread::available_parallelism().map_or(4, |n| n.get());
    let chunk_size = files.len().div_ceil(workers);

    let results = thread::scope(|s| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|file| {
                            Ok(FileArtifact {
                                path: artifact_path(file.relative_path()),
                                content: file.read_text()?,
                            })
                        })
                        .collect::<Vec<Result<FileArtifact, ImportError>>>()
                })
            })
            .collect();

        let mut all = Vec::with_capacity(files.len());
        for handle in handles {
            let chunk = handle.join().map_err(|_| ImportError::ReadFailed {
                path: String::new(),
                reason: "worker thread panicked while reading files".to_string(),
            })?;
            all.extend(chunk);
        }
        Ok::<_, ImportError>(all)
    })?;

    results.into_iter().collect()
}

/// Text and binary files found under a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderScan {
    pub folder_name: String,
    pub files: Vec<LocalFile>,
    /// Artifact paths of files that are not valid UTF-8 text.
    pub binary_files: Vec<String>,
}

/// Walk `root` and sort its files into text and binary.
///
/// Paths for which `is_ignored` returns true (checked on the path relative
/// to `root`) are skipped. A file is binary when it holds a NUL byte or is
/// not valid UTF-8.
///
/// # Errors
///
/// Returns `ImportError::ReadFailed` when a directory or file cannot be read.
pub fn scan_folder(
    root: &Utf8Path,
    is_ignored: impl Fn(&str) -> bool,
) -> Result<FolderScan, ImportError> {
    let folder_name = root.file_name().unwrap_or("project").to_string();
    let mut scan = FolderScan {
        folder_name: folder_name.clone(),
        ..FolderScan::default()
    };

    for path in walk_files(root)? {
        let inner = relative_to(&path, root);
        if is_ignored(&inner) {
            continue;
        }

        let bytes = read_bytes(&path)?;
        if is_binary(&bytes) {
            scan.binary_files.push(inner);
        } else {
            scan.files
                .push(LocalFile::new(path, format!("{folder_name}/{inner}")));
        }
    }

    debug!(
        folder = %folder_name,
        text_files = scan.files.len(),
        binary_files = scan.binary_files.len(),
        "Scanned folder"
    );
    Ok(scan)
}

/// Load `root` as a [`FileMap`] keyed under `project_root`.
///
/// # Errors
///
/// Returns `ImportError::ReadFailed` when a directory or file cannot be read.
pub fn load_file_map(root: &Utf8Path, project_root: &str) -> Result<FileMap, ImportError> {
    let mut files = FileMap::new();
    for path in walk_files(root)? {
        let bytes = read_bytes(&path)?;
        let key = format!("{project_root}{}", relative_to(&path, root));
        let record = match String::from_utf8(bytes) {
            Ok(text) if !text.contains('\0') => FileRecord::text(text),
            _ => FileRecord::binary(),
        };
        files.insert(key, record);
    }
    Ok(files)
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.contains(&0) || std::str::from_utf8(bytes).is_err()
}

fn relative_to(path: &Utf8Path, root: &Utf8Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.as_str().replace('\\', "/"))
        .unwrap_or_else(|_| path.to_string())
}

fn read_bytes(path: &Utf8Path) -> Result<Vec<u8>, ImportError> {
    fs::read(path).map_err(|e| ImportError::ReadFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Files under `root` in sorted order. `.git` directories are not entered.
fn walk_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ImportError> {
    let mut files = Vec::new();
    walk_directory(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_directory(dir: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<(), ImportError> {
    let read_failed = |e: std::io::Error| ImportError::ReadFailed {
        path: dir.to_string(),
        reason: e.to_string(),
    };

    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let Ok(path) = Utf8PathBuf::try_from(entry.path()) else {
            debug!(path = ?entry.path(), "Skipping non UTF-8 path");
            continue;
        };

        if path.is_dir() {
            if path.file_name() != Some(".git") {
                walk_directory(&path, files)?;
            }
        } else {
            files.push(path);
        }
    }
    Ok(())
}
