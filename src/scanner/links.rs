// src/scanner/links.rs
// =============================================================================
// Pulls URL-shaped strings out of a file's text.
//
// Pipeline for one file:
// 0. skip binary files (a NUL byte anywhere, the same test grep uses)
// 1. find every match of URL_PATTERN (plain regex, no markdown/html parsing:
//    links in code and config files count too)
// 2. run each match through the configured transforms, in order
// 3. drop empty results and anything matching an ignore pattern
// 4. sort and deduplicate
//
// The character class and the default ignore patterns are kept exactly as
// existing configurations expect them (including the unescaped dots).
// =============================================================================

use crate::config::{Config, TransformConfig};
use crate::error::{LedgerError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

pub const URL_PATTERN: &str = r"(http|https)://[a-zA-Z0-9./?=_%:\\\-]*";

pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    r"^https?://localhost",
    r"^https?://127.0.0.1",
    r"^https?://web.archive.org",
];

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| LedgerError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
struct Transform {
    pattern: Regex,
    replacement: String,
}

#[derive(Debug, Clone)]
pub struct LinkScanner {
    url_pattern: Regex,
    ignore: Vec<Regex>,
    transforms: Vec<Transform>,
}

impl LinkScanner {
    /// Scanner with the default ignore list plus `extra_ignore`, applying
    /// `transforms` in the given order.
    pub fn new(extra_ignore: &[String], transforms: &[TransformConfig]) -> Result<Self> {
        let ignore = DEFAULT_IGNORE_PATTERNS
            .iter()
            .copied()
            .chain(extra_ignore.iter().map(String::as_str))
            .map(compile)
            .collect::<Result<Vec<_>>>()?;

        let transforms = transforms
            .iter()
            .map(|t| -> Result<Transform> {
                Ok(Transform {
                    pattern: compile(&t.pattern)?,
                    replacement: t.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LinkScanner {
            url_pattern: compile(URL_PATTERN)?,
            ignore,
            transforms,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.ignore, &config.transforms)
    }

    /// Sorted, deduplicated URLs found in `text`.
    pub fn scan_text(&self, text: &str) -> Vec<String> {
        let mut found = BTreeSet::new();

        for hit in self.url_pattern.find_iter(text) {
            let mut url = hit.as_str().to_string();
            for transform in &self.transforms {
                url = transform
                    .pattern
                    .replace_all(&url, transform.replacement.as_str())
                    .into_owned();
            }

            if url.is_empty() || self.is_ignored(&url) {
                continue;
            }
            found.insert(url);
        }

        found.into_iter().collect()
    }

    /// Scans `file` (relative to `workdir`). Unreadable and binary files
    /// yield nothing.
    pub fn scan_file(&self, workdir: &Path, file: &str) -> Vec<String> {
        let path = workdir.join(file);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable file");
                return Vec::new();
            }
        };

        // images, archives, PDFs: whatever looks like a URL in there is noise
        if is_binary(&bytes) {
            debug!(path = %path.display(), "skipping binary file");
            return Vec::new();
        }

        // text with the odd invalid byte still gets scanned
        self.scan_text(&String::from_utf8_lossy(&bytes))
    }

    fn is_ignored(&self, url: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.is_match(url))
    }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

/// Per-repository list of file path patterns that are never scanned.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(FileFilter { patterns })
    }

    pub fn is_ignored(&self, file: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> LinkScanner {
        LinkScanner::new(&[], &[]).unwrap()
    }

    #[test]
    fn extracts_sorted_unique_urls() {
        let text = "One [example link](https://example.org/) in it. \
                    And a [bogus link](http://bogus.gov) in it. \
                    Again https://example.org/ and ftp://nope.example";
        assert_eq!(
            scanner().scan_text(text),
            vec!["http://bogus.gov".to_string(), "https://example.org/".to_string()]
        );
    }

    #[test]
    fn stops_at_characters_outside_the_class() {
        let text = r#"see <https://example.org/a?b=c&d=e> and "http://x.test/p#frag""#;
        assert_eq!(
            scanner().scan_text(text),
            vec!["http://x.test/p".to_string(), "https://example.org/a?b=c".to_string()]
        );
    }

    #[test]
    fn default_ignores_apply() {
        let text = "http://localhost:4000/ https://127.0.0.1/x \
                    https://web.archive.org/web/2020/https://example.org/ https://kept.test/";
        // the archive link swallows its embedded target: one match, ignored
        assert_eq!(scanner().scan_text(text), vec!["https://kept.test/".to_string()]);
    }

    #[test]
    fn transforms_run_in_order_before_ignores() {
        let transforms = vec![
            TransformConfig { pattern: r"\.$".into(), replacement: String::new() },
            TransformConfig { pattern: "^http://".into(), replacement: "https://".into() },
        ];
        let ignore = vec![r"^https://skip\.test".to_string()];
        let scanner = LinkScanner::new(&ignore, &transforms).unwrap();

        let urls = scanner.scan_text("Visit http://docs.test/guide. Or http://skip.test/x");
        assert_eq!(urls, vec!["https://docs.test/guide".to_string()]);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = LinkScanner::new(&["(".to_string()], &[]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPattern { pattern, .. } if pattern == "("));
    }

    #[test]
    fn scan_file_reads_relative_to_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/a.md"), "link: https://example.net/\n").unwrap();

        let scanner = scanner();
        assert_eq!(scanner.scan_file(dir.path(), "docs/a.md"), vec!["https://example.net/".to_string()]);
        assert!(scanner.scan_file(dir.path(), "missing.md").is_empty());
    }

    #[test]
    fn binary_files_yield_no_urls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"\x89PNG\0\0https://binary.example.org/meta").unwrap();
        std::fs::write(dir.path().join("latin1.txt"), b"caf\xe9 https://text.example.org/\n").unwrap();

        let scanner = scanner();
        assert!(scanner.scan_file(dir.path(), "logo.png").is_empty());
        // invalid UTF-8 without NUL bytes is still text
        assert_eq!(
            scanner.scan_file(dir.path(), "latin1.txt"),
            vec!["https://text.example.org/".to_string()]
        );
    }

    #[test]
    fn file_filter_matches_paths() {
        let filter = FileFilter::new(&["^vendor/".to_string(), r"\.png$".to_string()]).unwrap();
        assert!(filter.is_ignored("vendor/lib.js"));
        assert!(filter.is_ignored("img/logo.png"));
        assert!(!filter.is_ignored("README.md"));
        assert!(!FileFilter::default().is_ignored("anything"));
    }
}
