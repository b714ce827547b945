//! Discovery of context files to hand to the underlying tool.
//!
//! Three sources feed the final list: `glance.md` marker files near the
//! root, leyline documents under `docs/leyline/`, and paths named
//! explicitly by the user. Everything funnels through one
//! [`GitignoreFilter`] so ignored files never leak into the result.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config;
use crate::error::{Error, Result};
use crate::gitignore::GitignoreFilter;
use crate::pathop;
use crate::tokenizer;

/// What to discover and how to filter it.
#[derive(Builder, Clone, Debug)]
#[builder(setter(into), build_fn(validate = "DiscoveryBuilder::validate"))]
pub struct Discovery {
    /// Collect glance.md files near the root.
    #[builder(default)]
    pub include_glance: bool,
    /// Collect leyline documents under docs/leyline/.
    #[builder(default)]
    pub include_leyline: bool,
    /// Files and directories named directly by the user.
    #[builder(default)]
    pub explicit_paths: Vec<PathBuf>,
    /// Honor .gitignore files during discovery.
    #[builder(default = "true")]
    pub gitignore: bool,
    /// Only keep explicit files with these extensions.
    #[builder(default)]
    pub include_ext: Vec<String>,
    /// Drop explicit files with these extensions.
    #[builder(default)]
    pub exclude_ext: Vec<String>,
    /// Where to look for glance.md files; defaults to the root alone.
    #[builder(default)]
    pub search_paths: Vec<PathBuf>,
    /// Discovery root.
    #[builder(default = "default_root()")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl DiscoveryBuilder {
    fn validate(&self) -> ::std::result::Result<(), String> {
        if let (Some(include), Some(exclude)) = (&self.include_ext, &self.exclude_ext) {
            if !include.is_empty() && !exclude.is_empty() {
                return Err(String::from(
                    "include-ext and exclude-ext cannot be used together",
                ));
            }
        }

        Ok(())
    }
}

/// Run a full discovery pass and return the sorted, deduplicated list of
/// context paths.
///
/// Explicit files go through both the extension filter and the gitignore
/// filter; explicit directories only through the gitignore filter, since
/// the tool recurses into them itself. Nonexistent paths are logged and
/// skipped, never fatal.
pub fn find_context_files(discovery: &Discovery) -> Result<Vec<PathBuf>> {
    if !discovery.include_ext.is_empty() && !discovery.exclude_ext.is_empty() {
        return Err(Error::Config(String::from(
            "include-ext and exclude-ext cannot be used together",
        )));
    }

    let root = pathop::absolute(&discovery.root);
    let filter = if discovery.gitignore {
        GitignoreFilter::new(&root)
    } else {
        GitignoreFilter::disabled(&root)
    };

    let mut found: BTreeSet<PathBuf> = BTreeSet::new();

    if discovery.include_glance {
        found.extend(find_glance_files(&root, &discovery.search_paths, &filter));
    }

    if discovery.include_leyline {
        found.extend(find_leyline_files(&root, &filter));
    }

    for path in &discovery.explicit_paths {
        let abs = if path.is_absolute() {
            pathop::absolute(path)
        } else {
            pathop::absolute(&root.join(path))
        };

        if abs.is_file() {
            if !tokenizer::should_process_extension(
                &abs,
                &discovery.include_ext,
                &discovery.exclude_ext,
            ) {
                debug!("Skipping {:?}: extension filtered", abs);
                continue;
            }
            if filter.should_ignore(&abs) {
                debug!("Skipping {:?}: gitignored", abs);
                continue;
            }
            found.insert(abs);
        } else if abs.is_dir() {
            if filter.should_ignore(&abs) {
                warn!("Skipping ignored directory: {:?}", abs);
                continue;
            }
            found.insert(abs);
        } else {
            warn!("Skipping nonexistent path: {:?}", abs);
        }
    }

    Ok(found.into_iter().collect())
}

/// Find `glance.md` files within [`config::MAX_GLANCE_DEPTH`] levels of
/// each search base (or of the root, when no bases are given).
pub fn find_glance_files(
    root: &Path,
    search_paths: &[PathBuf],
    filter: &GitignoreFilter,
) -> Vec<PathBuf> {
    let bases: Vec<PathBuf> = if search_paths.is_empty() {
        vec![root.to_owned()]
    } else {
        search_paths.to_vec()
    };

    let mut found = BTreeSet::new();
    for base in bases {
        if base.is_file() {
            // A search path may name a glance file directly.
            if base.file_name().map_or(false, |name| name == "glance.md")
                && !filter.should_ignore(&base)
            {
                found.insert(pathop::absolute(&base));
            }
            continue;
        }
        if !base.is_dir() {
            warn!("Skipping nonexistent search path: {:?}", base);
            continue;
        }

        let walker = WalkDir::new(&base)
            .max_depth(config::MAX_GLANCE_DEPTH)
            .into_iter()
            .filter_map(|entry| entry.ok());
        for entry in walker {
            if entry.file_type().is_file()
                && entry.file_name() == "glance.md"
                && !filter.should_ignore(entry.path())
            {
                found.insert(pathop::absolute(entry.path()));
            }
        }
    }

    debug!("Found {} glance files", found.len());
    found.into_iter().collect()
}

/// Find leyline documents: every `.md` under `docs/leyline/`, recursively.
/// When that directory is absent or empty, fall back to philosophy
/// documents directly inside `docs/`.
pub fn find_leyline_files(root: &Path, filter: &GitignoreFilter) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();

    let leyline = root.join("docs").join("leyline");
    if leyline.is_dir() {
        let walker = WalkDir::new(&leyline)
            .into_iter()
            .filter_map(|entry| entry.ok());
        for entry in walker {
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == "md")
                && !filter.should_ignore(entry.path())
            {
                found.insert(pathop::absolute(entry.path()));
            }
        }
    }

    if found.is_empty() {
        found.extend(find_philosophy_files(root, filter));
    }

    debug!("Found {} leyline files", found.len());
    found.into_iter().collect()
}

fn find_philosophy_files(root: &Path, filter: &GitignoreFilter) -> BTreeSet<PathBuf> {
    let mut found = BTreeSet::new();

    let docs = root.join("docs");
    let entries = match fs::read_dir(&docs) {
        Ok(entries) => entries,
        Err(_) => return found,
    };

    let pattern = match glob::Pattern::new(config::PHILOSOPHY_PATTERN) {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!("Bad philosophy pattern {:?}: {}", config::PHILOSOPHY_PATTERN, err);
            return found;
        }
    };

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let name = entry.file_name();
        if path.is_file()
            && pattern.matches(&name.to_string_lossy())
            && !filter.should_ignore(&path)
        {
            found.insert(pathop::absolute(&path));
        }
    }

    found
}
