// file: src/source/pattern.rs
// description: shell-style file patterns matched against base names only
// reference: https://docs.rs/regex

use crate::error::{PipelineError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// A configured pattern split into the directory it scans and the glob
/// applied to each file's base name. `*` matches any run of characters,
/// `?` exactly one. A `**` directory segment makes the scan recursive.
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    directory: PathBuf,
    recursive: bool,
    matcher: Regex,
}

impl FilePattern {
    pub fn parse(root: &Path, raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace('\\', "/");
        let (dir_part, name_part) = match normalized.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => (String::new(), normalized.clone()),
        };

        if name_part.is_empty() {
            return Err(PipelineError::Config(format!(
                "Pattern has no file name component: {}",
                raw
            )));
        }

        let mut directory = if dir_part.starts_with('/') {
            PathBuf::from("/")
        } else {
            root.to_path_buf()
        };
        let mut recursive = false;

        for segment in dir_part.split('/').filter(|s| !s.is_empty() && *s != ".") {
            if segment == "**" {
                recursive = true;
                break;
            }
            if segment.contains('*') || segment.contains('?') {
                return Err(PipelineError::Config(format!(
                    "Wildcards are only supported in the file name or as '**': {}",
                    raw
                )));
            }
            directory.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            directory,
            recursive,
            matcher: Self::compile(&name_part)?,
        })
    }

    fn compile(glob: &str) -> Result<Regex> {
        let mut expr = String::from("(?s)^");
        for ch in glob.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        Regex::new(&expr)
            .map_err(|e| PipelineError::Config(format!("Invalid pattern {}: {}", glob, e)))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn matches_name(&self, file_name: &str) -> bool {
        self.matcher.is_match(file_name)
    }

    /// Matches on the base name of `path`; directory segments are ignored.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| self.matches_name(name))
            .unwrap_or(false)
    }
}
