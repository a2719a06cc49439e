// file: src/source/scanner.rs
// description: file discovery over the source directory with pattern matching
// reference: https://docs.rs/walkdir

use crate::config::PipelineConfig;
use crate::source::classifier::DocumentKind;
use crate::source::pattern::FilePattern;
use crate::utils::Validator;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A discovered file and the document kind implied by its extension.
/// `kind` is `None` when a pattern matched a file with an unsupported
/// extension; dispatch reports that as a per-file error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub kind: Option<DocumentKind>,
}

impl CandidateFile {
    pub fn new(path: PathBuf) -> Self {
        let kind = DocumentKind::from_path(&path);
        Self { path, kind }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<CandidateFile>,
    pub warnings: Vec<String>,
}

pub struct FileLocator {
    root: PathBuf,
    patterns: Vec<String>,
}

impl FileLocator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            root: Self::absolute_root(&config.source_directory),
            patterns: config.file_patterns.clone(),
        }
    }

    fn absolute_root(dir: &Path) -> PathBuf {
        dir.canonicalize()
            .or_else(|_| std::path::absolute(dir))
            .unwrap_or_else(|_| dir.to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves every pattern and returns the union of matches, deduplicated
    /// and sorted lexicographically by path. Missing directories, malformed
    /// patterns and patterns matching nothing produce warnings, never errors.
    pub fn locate(&self) -> Discovery {
        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut warnings = Vec::new();

        for raw in &self.patterns {
            let pattern = match FilePattern::parse(&self.root, raw) {
                Ok(pattern) => pattern,
                Err(e) => {
                    warnings.push(format!("Ignoring pattern '{}': {}", raw, e));
                    continue;
                }
            };

            if let Err(e) = Validator::validate_directory(pattern.directory()) {
                warnings.push(format!("Pattern '{}' matched no files: {}", raw, e));
                continue;
            }

            let matched = self.scan_pattern(&pattern);
            if matched.is_empty() {
                warnings.push(format!("Pattern '{}' matched no files", raw));
                continue;
            }

            let before = found.len();
            for path in matched {
                found.entry(path.to_string_lossy().to_string()).or_insert(path);
            }
            debug!(
                "Pattern '{}' added {} new files",
                pattern.raw(),
                found.len() - before
            );
        }

        Discovery {
            files: found.into_values().map(CandidateFile::new).collect(),
            warnings,
        }
    }

    fn scan_pattern(&self, pattern: &FilePattern) -> Vec<PathBuf> {
        let max_depth = if pattern.is_recursive() { usize::MAX } else { 1 };

        WalkDir::new(pattern.directory())
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| pattern.matches_path(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path, patterns: &[&str]) -> PipelineConfig {
        PipelineConfig {
            source_directory: root.to_path_buf(),
            file_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            ..PipelineConfig::default()
        }
    }

    fn names(discovery: &Discovery) -> Vec<String> {
        discovery.files.iter().map(|f| f.file_name()).collect()
    }

    #[test]
    fn test_locate_sorted_and_deduplicated() {
        let temp = TempDir::new().unwrap();
        for name in ["c.js", "b-review.html", "a-review.html", "notes.txt"] {
            fs::write(temp.path().join(name), "x").unwrap();
        }

        let locator = FileLocator::new(&config(temp.path(), &["*.html", "*-review.html", "*.js"]));
        let discovery = locator.locate();

        assert_eq!(
            names(&discovery),
            vec!["a-review.html", "b-review.html", "c.js"]
        );
        assert!(discovery.warnings.is_empty());
        assert!(discovery.files.iter().all(|f| f.path.is_absolute()));
        assert_eq!(discovery.files[2].kind, Some(DocumentKind::Script));
    }

    #[test]
    fn test_missing_directory_is_a_warning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("xm-review.html"), "x").unwrap();

        let locator = FileLocator::new(&config(temp.path(), &["missing/*.html", "*.html"]));
        let discovery = locator.locate();

        assert_eq!(names(&discovery), vec!["xm-review.html"]);
        assert_eq!(discovery.warnings.len(), 1);
        assert!(discovery.warnings[0].contains("missing/*.html"));
    }

    #[test]
    fn test_pattern_without_matches_is_a_warning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a-review.html"), "x").unwrap();

        let discovery = FileLocator::new(&config(temp.path(), &["*.html", "*.js"])).locate();

        assert_eq!(names(&discovery), vec!["a-review.html"]);
        assert_eq!(
            discovery.warnings,
            vec!["Pattern '*.js' matched no files".to_string()]
        );
    }

    #[test]
    fn test_missing_source_directory_yields_nothing() {
        let locator = FileLocator::new(&config(Path::new("/nonexistent/scraped"), &["*.html"]));
        let discovery = locator.locate();

        assert!(discovery.files.is_empty());
        assert_eq!(discovery.warnings.len(), 1);
    }

    #[test]
    fn test_non_recursive_by_default() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/deep.js"), "x").unwrap();
        fs::write(temp.path().join("top.js"), "x").unwrap();

        let flat = FileLocator::new(&config(temp.path(), &["*.js"])).locate();
        assert_eq!(names(&flat), vec!["top.js"]);

        let deep = FileLocator::new(&config(temp.path(), &["**/*.js"])).locate();
        assert_eq!(names(&deep), vec!["deep.js", "top.js"]);
    }

    #[test]
    fn test_unsupported_extension_still_discovered() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("data.json"), "{}").unwrap();

        let discovery = FileLocator::new(&config(temp.path(), &["*"])).locate();
        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.files[0].kind, None);
    }
}
