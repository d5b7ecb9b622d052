use crate::documents::{read_text, DocumentKind};
use shared::{ChatError, ContextItem};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: String,
    pub error: ChatError,
}

/// Outcome of loading a batch of picked paths.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub items: Vec<ContextItem>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    fn fail(&mut self, path: &Path, error: ChatError) {
        tracing::warn!(path = %path.display(), %error, "skipping file");
        self.failures.push(LoadFailure {
            path: path.display().to_string(),
            error,
        });
    }
}

/// Load every picked path. Directories contribute the supported files
/// directly inside them (not recursive, sorted by name). One bad file never
/// stops the rest of the batch.
pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut report = LoadReport::default();

    for path in paths {
        let path = path.as_ref();
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                report.fail(path, ChatError::read_failure(path.display().to_string(), e));
                continue;
            }
        };

        if meta.is_dir() {
            for file in supported_files_in(path) {
                match load_file(&file) {
                    Ok(item) => report.items.push(item),
                    Err(e) => report.fail(&file, e),
                }
            }
        } else {
            match load_file(path) {
                Ok(item) => report.items.push(item),
                Err(e) => report.fail(path, e),
            }
        }
    }

    tracing::info!(
        loaded = report.items.len(),
        failed = report.failures.len(),
        "context batch processed"
    );
    report
}

/// Supported files directly inside `dir`, symlinks resolved. Unsupported
/// files are left out without being reported.
pub fn supported_files_in(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| DocumentKind::from_path(p).is_some())
        .collect()
}

/// Read one file into a context item, sized from its on-disk length.
pub fn load_file(path: &Path) -> Result<ContextItem, ChatError> {
    let content = read_text(path)?;
    let size = fs::metadata(path)
        .map_err(|e| ChatError::read_failure(path.display().to_string(), e))?
        .len();
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ContextItem::new(
        path.display().to_string(),
        name,
        content,
        size,
    ))
}
