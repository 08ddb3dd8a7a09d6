use crate::language::Language;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Files above this size are skipped; they are generated artifacts far more
/// often than hand-written source.
const MAX_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// Scanner for finding chunkable source files in a repository
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Scan the repository for source files (.gitignore aware)
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes)",
                                path.display(),
                                meta.len()
                            );
                            continue;
                        }
                    }

                    if Self::is_noise_file(path) {
                        log::debug!("Skipping noisy artifact {}", path.display());
                        continue;
                    }

                    if Language::from_path(path) == Language::Unknown {
                        continue;
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files", files.len());
        files
    }

    /// Lockfiles and minified bundles carry no retrieval signal
    fn is_noise_file(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        matches!(
            name,
            "Cargo.lock" | "package-lock.json" | "yarn.lock" | "poetry.lock"
        ) || name.ends_with(".min.js")
    }
}
