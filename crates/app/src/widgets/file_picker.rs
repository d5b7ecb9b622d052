//! Native file and folder dialogs (rfd) for choosing context files.

use std::path::PathBuf;

/// Filter for file types.
#[derive(Clone, Debug)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn documents() -> Self {
        Self::new("Documents", services::SUPPORTED_EXTENSIONS)
    }

    pub fn text_files() -> Self {
        Self::new("Text Files", &["txt", "md"])
    }

    pub fn word_documents() -> Self {
        Self::new("Word Documents", &["docx"])
    }

    pub fn all_files() -> Self {
        Self::new("All Files", &["*"])
    }

    /// Filters offered when adding context files, in dialog order.
    pub fn context_filters() -> Vec<Self> {
        vec![
            Self::documents(),
            Self::text_files(),
            Self::word_documents(),
            Self::all_files(),
        ]
    }
}

/// Dialog settings remembered between picks.
pub struct FilePickerWidget {
    filters: Vec<FileFilter>,
    /// Folder of the last pick; the next dialog opens there
    start_dir: Option<PathBuf>,
}

impl Default for FilePickerWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl FilePickerWidget {
    pub fn new() -> Self {
        Self {
            filters: FileFilter::context_filters(),
            start_dir: None,
        }
    }

    /// Blocking multi-file dialog. Empty when cancelled.
    pub fn pick_files(&mut self) -> Vec<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title("Add context files");
        for filter in &self.filters {
            let ext_refs: Vec<&str> = filter.extensions.iter().map(|s| s.as_str()).collect();
            dialog = dialog.add_filter(&filter.name, &ext_refs);
        }
        if let Some(ref dir) = self.start_dir {
            dialog = dialog.set_directory(dir);
        }

        let files = dialog.pick_files().unwrap_or_default();
        if let Some(parent) = files.first().and_then(|f| f.parent()) {
            self.start_dir = Some(parent.to_path_buf());
        }
        files
    }

    /// Blocking folder dialog. `None` when cancelled.
    pub fn pick_folder(&mut self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title("Add a folder of documents");
        if let Some(ref dir) = self.start_dir {
            dialog = dialog.set_directory(dir);
        }

        let folder = dialog.pick_folder();
        if let Some(ref path) = folder {
            self.start_dir = Some(path.clone());
        }
        folder
    }
}
