#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::path::Path;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use super::DocumentLoader;

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Picks a loader by file extension, falling back to plain text.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DocumentLoader>>,
    fallback: Box<dyn DocumentLoader>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut loaders: Vec<Box<dyn DocumentLoader>> = Vec::new();
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(PdfLoader::default()));
        loaders.push(Box::new(TextLoader::default()));
        Self {
            loaders,
            fallback: Box::new(TextLoader::default()),
        }
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.loaders.len())
            .finish_non_exhaustive()
    }
}

impl LoaderRegistry {
    #[must_use]
    pub fn for_path(&self, path: &Path) -> &dyn DocumentLoader {
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
        else {
            return self.fallback.as_ref();
        };
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map_or(self.fallback.as_ref(), AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_extensions_resolve_to_text_loader() {
        let registry = LoaderRegistry::default();
        let loader = registry.for_path(Path::new("notes.md"));
        assert!(loader.supported_extensions().contains(&"md"));
    }

    #[test]
    fn missing_extension_uses_fallback() {
        let registry = LoaderRegistry::default();
        let loader = registry.for_path(Path::new("LICENSE"));
        assert!(loader.supported_extensions().contains(&"txt"));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_extension_case_insensitive() {
        let registry = LoaderRegistry::default();
        let loader = registry.for_path(Path::new("Report.PDF"));
        assert_eq!(loader.supported_extensions(), &["pdf"]);
    }

    #[test]
    fn file_name_of_strips_directories() {
        assert_eq!(file_name_of(Path::new("/a/b/c.txt")), "c.txt");
        assert_eq!(file_name_of(Path::new("/")), "");
    }
}
