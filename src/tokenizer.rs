//! Token estimation and binary-file detection.
//!
//! Counting is approximate by design: characters times a per-provider
//! ratio, nudged by a per-extension multiplier. The estimates are
//! conservative so that model selection errs toward the high-context set
//! rather than overflowing a context window.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::gitignore::GitignoreFilter;

/// How many leading bytes to sample when sniffing for NUL bytes.
const BINARY_SNIFF_LEN: usize = 8192;

lazy_static! {
    /// Extensions that are always treated as binary, no content read
    /// needed.
    static ref BINARY_EXTENSIONS: HashSet<&'static str> = [
        // Executables and compiled artifacts
        ".exe", ".dll", ".so", ".dylib", ".class", ".jar", ".pyc", ".pyo",
        ".o", ".obj", ".a", ".lib",
        // Archives
        ".zip", ".tar", ".gz", ".bz2", ".xz", ".7z", ".rar",
        // Images
        ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".tiff", ".webp",
        // Audio and video
        ".mp3", ".wav", ".flac", ".ogg", ".m4a",
        ".mp4", ".avi", ".mkv", ".mov", ".webm",
        // Fonts
        ".ttf", ".otf", ".woff", ".woff2",
        // Documents and databases
        ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx",
        ".db", ".sqlite", ".sqlite3",
    ]
    .iter()
    .cloned()
    .collect();
}

/// Character-to-token ratio for a provider name. Unknown providers get
/// the most conservative ratio.
pub fn provider_ratio(provider: &str) -> f64 {
    match provider.to_lowercase().as_str() {
        "openai" => 0.25,
        "anthropic" => 0.24,
        "google" => 0.23,
        "openrouter" => 0.25,
        _ => 0.27,
    }
}

/// Per-extension multiplier on the base ratio. Code is denser in tokens
/// than prose, markup denser still.
fn extension_adjustment(path: &Path) -> f64 {
    match extension_of(path).as_deref() {
        Some(".py") | Some(".js") | Some(".ts") | Some(".cpp") => 1.15,
        Some(".go") | Some(".rs") => 1.12,
        Some(".java") => 1.18,
        Some(".c") => 1.10,
        Some(".md") => 0.95,
        Some(".json") | Some(".html") => 1.20,
        Some(".yaml") => 1.10,
        Some(".xml") => 1.25,
        _ => 1.0,
    }
}

/// Canonical form of a user-supplied extension: lowercased, with exactly
/// one leading dot. Accepts "md", ".md", and ".MD" alike.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.').to_lowercase();
    format!(".{}", trimmed)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Apply include/exclude extension filters to a file path. At most one of
/// the two lists may be non-empty; callers validate that upstream.
pub fn should_process_extension(path: &Path, include: &[String], exclude: &[String]) -> bool {
    if include.is_empty() && exclude.is_empty() {
        return true;
    }

    let ext = extension_of(path);

    if !include.is_empty() {
        match ext {
            Some(ext) => include.iter().any(|i| normalize_extension(i) == ext),
            None => false,
        }
    } else {
        match ext {
            Some(ext) => !exclude.iter().any(|e| normalize_extension(e) == ext),
            None => true,
        }
    }
}

pub fn is_binary_by_extension(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => BINARY_EXTENSIONS.contains(ext.as_str()),
        None => false,
    }
}

fn has_nul_prefix(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let mut buffer = [0u8; BINARY_SNIFF_LEN];
    let read = match file.read(&mut buffer) {
        Ok(read) => read,
        Err(_) => return false,
    };

    buffer[..read].contains(&0)
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    match extension_of(path)?.as_str() {
        ".txt" | ".text" | ".log" => Some("text/plain"),
        ".md" | ".markdown" => Some("text/markdown"),
        ".csv" => Some("text/csv"),
        ".html" | ".htm" => Some("text/html"),
        ".css" => Some("text/css"),
        ".js" => Some("application/javascript"),
        ".json" => Some("application/json"),
        ".xml" => Some("application/xml"),
        ".svg" => Some("image/svg+xml"),
        ".sh" => Some("application/x-sh"),
        ".yaml" | ".yml" => Some("application/x-yaml"),
        ".toml" => Some("application/toml"),
        _ => None,
    }
}

fn classify_media_type(media_type: &str) -> Option<bool> {
    if media_type.starts_with("text/") {
        return Some(false);
    }

    match media_type {
        "application/json"
        | "application/javascript"
        | "application/xml"
        | "application/x-sh"
        | "application/x-yaml"
        | "application/toml"
        | "image/svg+xml" => Some(false),
        "application/pdf"
        | "application/zip"
        | "application/gzip"
        | "application/x-tar"
        | "application/octet-stream" => Some(true),
        other => {
            if other.starts_with("image/")
                || other.starts_with("audio/")
                || other.starts_with("video/")
                || other.starts_with("font/")
            {
                Some(true)
            } else {
                None
            }
        }
    }
}

/// Heuristic binary check, cheapest signal first: known-binary extension,
/// then a NUL byte in the leading bytes, then the sniffed media type.
/// Unreadable or nonexistent files are "not binary" so the eventual full
/// read produces its own, more specific error.
pub fn is_binary_file(path: &Path) -> bool {
    if is_binary_by_extension(path) {
        return true;
    }

    if !path.is_file() {
        return false;
    }

    if has_nul_prefix(path) {
        return true;
    }

    guess_media_type(path)
        .and_then(classify_media_type)
        .unwrap_or(false)
}

/// Character-ratio token counter bound to one provider and one discovery
/// root.
pub struct TokenCounter {
    ratio: f64,
    filter: GitignoreFilter,
    include_ext: Vec<String>,
    exclude_ext: Vec<String>,
}

impl TokenCounter {
    pub fn new(
        provider: &str,
        root: &Path,
        gitignore: bool,
        include_ext: &[String],
        exclude_ext: &[String],
    ) -> TokenCounter {
        let filter = if gitignore {
            GitignoreFilter::new(root)
        } else {
            GitignoreFilter::disabled(root)
        };

        TokenCounter {
            ratio: provider_ratio(provider),
            filter,
            include_ext: include_ext.to_vec(),
            exclude_ext: exclude_ext.to_vec(),
        }
    }

    pub fn count_text_tokens(&self, text: &str) -> usize {
        (text.chars().count() as f64 * self.ratio) as usize
    }

    /// Estimated tokens for one file. Binary files count as zero.
    pub fn count_file_tokens(&self, path: &Path) -> ::std::result::Result<usize, String> {
        if !path.is_file() {
            return Err(format!("File not found: {}", path.display()));
        }

        if is_binary_file(path) {
            debug!("Skipping binary file: {:?}", path);
            return Ok(0);
        }

        let bytes = fs::read(path)
            .map_err(|err| format!("Error reading file {}: {}", path.display(), err))?;
        let content = String::from_utf8_lossy(&bytes);

        let base = self.count_text_tokens(&content);
        Ok((base as f64 * extension_adjustment(path)) as usize)
    }

    /// Estimated tokens for every countable file under a directory.
    /// Per-file failures are collected, never fatal.
    pub fn count_directory_tokens(&self, dir: &Path) -> (usize, Vec<String>) {
        if !dir.is_dir() {
            return (0, vec![format!("Directory not found: {}", dir.display())]);
        }

        let mut total = 0;
        let mut errors = Vec::new();

        let walker = WalkDir::new(dir).into_iter().filter_map(|entry| entry.ok());
        for entry in walker {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !should_process_extension(path, &self.include_ext, &self.exclude_ext) {
                continue;
            }
            if self.filter.should_ignore(path) {
                debug!("Skipping gitignored file: {:?}", path);
                continue;
            }

            match self.count_file_tokens(path) {
                Ok(tokens) => total += tokens,
                Err(err) => errors.push(err),
            }
        }

        (total, errors)
    }

    /// Estimated total for a mixed list of files and directories, with
    /// accumulated per-path error strings.
    pub fn estimate_model_tokens(&self, paths: &[PathBuf]) -> (usize, Vec<String>) {
        let mut total = 0;
        let mut errors = Vec::new();

        for path in paths {
            if path.is_file() {
                match self.count_file_tokens(path) {
                    Ok(tokens) => total += tokens,
                    Err(err) => errors.push(err),
                }
            } else if path.is_dir() {
                let (tokens, dir_errors) = self.count_directory_tokens(path);
                total += tokens;
                errors.extend(dir_errors);
            } else {
                errors.push(format!("Invalid path: {}", path.display()));
            }
        }

        (total, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn counter(provider: &str, root: &Path) -> TokenCounter {
        TokenCounter::new(provider, root, true, &[], &[])
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("md"), ".md");
        assert_eq!(normalize_extension(".md"), ".md");
        assert_eq!(normalize_extension(".MD"), ".md");
        assert_eq!(normalize_extension(" .Rs "), ".rs");
    }

    #[test]
    fn test_should_process_extension_include() {
        let include = vec![String::from("md"), String::from(".RS")];
        assert!(should_process_extension(Path::new("a.md"), &include, &[]));
        assert!(should_process_extension(Path::new("a.rs"), &include, &[]));
        assert!(!should_process_extension(Path::new("a.py"), &include, &[]));
        assert!(!should_process_extension(Path::new("no_ext"), &include, &[]));
    }

    #[test]
    fn test_should_process_extension_exclude() {
        let exclude = vec![String::from(".log")];
        assert!(!should_process_extension(Path::new("a.log"), &[], &exclude));
        assert!(should_process_extension(Path::new("a.rs"), &[], &exclude));
        assert!(should_process_extension(Path::new("no_ext"), &[], &exclude));
    }

    #[test]
    fn test_binary_by_extension() {
        assert!(is_binary_by_extension(Path::new("file.exe")));
        assert!(is_binary_by_extension(Path::new("library.dll")));
        assert!(is_binary_by_extension(Path::new("archive.zip")));
        assert!(is_binary_by_extension(Path::new("Image.PNG")));
        assert!(is_binary_by_extension(Path::new("audio.mp3")));
        assert!(is_binary_by_extension(Path::new("module.pyc")));
        assert!(is_binary_by_extension(Path::new("app.class")));

        assert!(!is_binary_by_extension(Path::new("script.py")));
        assert!(!is_binary_by_extension(Path::new("readme.md")));
        assert!(!is_binary_by_extension(Path::new("file.unknownext")));
        assert!(!is_binary_by_extension(Path::new("no_ext")));
    }

    #[test]
    fn test_binary_extension_wins_without_reading() {
        // The file does not even exist; the extension alone decides.
        assert!(is_binary_file(Path::new("/nonexistent/picture.png")));
    }

    #[test]
    fn test_nul_byte_means_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob");
        fs::write(&path, b"ELF\x00\x01\x02junk").unwrap();

        assert!(is_binary_file(&path));
    }

    #[test]
    fn test_no_extension_script_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("install");
        fs::write(&path, "#!/bin/sh\necho hello\n").unwrap();

        assert!(!is_binary_file(&path));
    }

    #[test]
    fn test_empty_file_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, "").unwrap();

        assert!(!is_binary_file(&path));
    }

    #[test]
    fn test_nonexistent_file_is_not_binary() {
        assert!(!is_binary_file(Path::new("/nonexistent/file.unknownext")));
    }

    #[test]
    fn test_provider_ratios() {
        assert_eq!(provider_ratio("openai"), 0.25);
        assert_eq!(provider_ratio("Anthropic"), 0.24);
        assert_eq!(provider_ratio("google"), 0.23);
        assert_eq!(provider_ratio("openrouter"), 0.25);
        assert_eq!(provider_ratio("mystery"), 0.27);
    }

    #[test]
    fn test_count_text_tokens() {
        let dir = TempDir::new().unwrap();
        let counter = counter("openai", dir.path());

        assert_eq!(counter.count_text_tokens(""), 0);
        assert_eq!(counter.count_text_tokens(&"x".repeat(100)), 25);
    }

    #[test]
    fn test_count_file_tokens_applies_adjustment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "x".repeat(400)).unwrap();
        let counter = counter("openai", dir.path());

        // 400 chars * 0.25 = 100 base tokens, * 0.95 markdown adjustment.
        assert_eq!(counter.count_file_tokens(&path).unwrap(), 95);
    }

    #[test]
    fn test_count_file_tokens_missing_file() {
        let dir = TempDir::new().unwrap();
        let counter = counter("openai", dir.path());

        let err = counter
            .count_file_tokens(&dir.path().join("missing.txt"))
            .unwrap_err();
        assert!(err.contains("File not found"));
    }

    #[test]
    fn test_directory_count_skips_ignored_and_binary() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join(".gitignore"), "*.log\n").unwrap();
        fs::write(root.join("kept.txt"), "x".repeat(40)).unwrap();
        fs::write(root.join("dropped.log"), "x".repeat(4000)).unwrap();
        fs::write(root.join("blob.png"), b"\x89PNG").unwrap();
        let counter = counter("openai", &root);

        let (total, errors) = counter.count_directory_tokens(&root);
        // Only kept.txt and the .gitignore itself contribute.
        assert!(errors.is_empty());
        assert_eq!(total, 10 + counter.count_text_tokens("*.log\n"));
    }

    #[test]
    fn test_estimate_model_tokens_collects_errors() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("a.txt"), "x".repeat(40)).unwrap();
        let counter = counter("openai", &root);

        let (total, errors) = counter.estimate_model_tokens(&[
            root.join("a.txt"),
            root.join("missing.txt"),
        ]);
        assert_eq!(total, 10);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Invalid path"));
    }
}
