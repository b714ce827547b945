//! Layered `.gitignore` handling.
//!
//! A [`GitignoreFilter`] answers "should this path be ignored?" for paths
//! under a single root directory, reproducing Git's precedence rules:
//! every `.gitignore` from the root down to the path's parent contributes
//! rules, deeper files override shallower ones, later lines override
//! earlier ones, and a pattern naming a directory ignores the whole
//! subtree beneath it.
//!
//! Pattern sets are loaded lazily and cached per directory for the
//! lifetime of the filter. The cache is a pure performance optimization;
//! [`GitignoreFilter::clear_cache`] lets long-lived callers observe edits.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use globset::{GlobBuilder, GlobMatcher};

use crate::pathop;

/// One rule parsed from a line of a `.gitignore` file.
#[derive(Debug)]
struct Rule {
    raw: String,
    negated: bool,
    dir_only: bool,
    anchored: bool,
    matcher: GlobMatcher,
}

impl Rule {
    /// Parse one line. Returns `None` for blanks, comments, and patterns
    /// the glob backend rejects (the latter are logged and skipped, never
    /// fatal).
    fn parse(line: &str) -> Option<Rule> {
        if line.starts_with('#') {
            return None;
        }

        let mut pattern = trim_trailing_whitespace(line);
        if pattern.is_empty() {
            return None;
        }

        let mut negated = false;
        if pattern.starts_with('!') {
            negated = true;
            pattern.remove(0);
        } else if pattern.starts_with("\\#") || pattern.starts_with("\\!") {
            pattern.remove(0);
        }

        let mut dir_only = false;
        if pattern.ends_with('/') && !pattern.ends_with("\\/") {
            dir_only = true;
            pattern.pop();
        }

        if pattern.is_empty() {
            return None;
        }

        // A slash anywhere except the end anchors the pattern to the
        // owning directory; otherwise it may match at any depth below it.
        let anchored = pattern.contains('/');
        if pattern.starts_with('/') {
            pattern.remove(0);
        }

        let mut glob = pattern.clone();
        if !anchored {
            glob = format!("**/{}", glob);
        }

        match GlobBuilder::new(&glob).literal_separator(true).build() {
            Ok(compiled) => Some(Rule {
                raw: pattern,
                negated,
                dir_only,
                anchored,
                matcher: compiled.compile_matcher(),
            }),
            Err(err) => {
                warn!("Skipping unparseable ignore pattern {:?}: {}", line, err);
                None
            }
        }
    }

    /// Whether this rule matches `rel`, the slash-separated path of the
    /// query relative to the rule's owning directory.
    fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }

        self.matcher.is_match(rel)
    }
}

fn trim_trailing_whitespace(line: &str) -> String {
    let mut s = String::from(line);

    while s.ends_with(' ') || s.ends_with('\t') {
        if s.ends_with("\\ ") {
            // Backslash escapes the final space.
            s.truncate(s.len() - 2);
            s.push(' ');
            break;
        }

        s.pop();
    }

    s
}

/// The ordered rules of one `.gitignore` file, tagged with the directory
/// that owns them. Match paths for these rules are relative to the owning
/// directory, not the filter root.
#[derive(Debug)]
pub struct PatternSet {
    origin: PathBuf,
    rules: Vec<Rule>,
}

impl PatternSet {
    /// Parse the raw text of a `.gitignore` file. Returns `None` when no
    /// rules survive comment and blank stripping.
    pub fn parse(text: &str, origin: &Path) -> Option<PatternSet> {
        let rules: Vec<Rule> = text.lines().filter_map(Rule::parse).collect();

        if rules.is_empty() {
            None
        } else {
            Some(PatternSet {
                origin: origin.to_owned(),
                rules,
            })
        }
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Per-root cache mapping a directory to its loaded [`PatternSet`], or the
/// recorded absence of one. Owned by a single [`GitignoreFilter`]; not
/// designed for concurrent access.
#[derive(Debug, Default)]
pub struct IgnoreIndex {
    cache: RefCell<HashMap<PathBuf, Option<Rc<PatternSet>>>>,
}

impl IgnoreIndex {
    pub fn new() -> IgnoreIndex {
        IgnoreIndex::default()
    }

    /// The pattern set for `directory`, loading it on first request.
    pub fn get(&self, directory: &Path) -> Option<Rc<PatternSet>> {
        if let Some(cached) = self.cache.borrow().get(directory) {
            return cached.clone();
        }

        let loaded = load_pattern_set(directory).map(Rc::new);
        self.cache
            .borrow_mut()
            .insert(directory.to_owned(), loaded.clone());
        loaded
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

fn load_pattern_set(directory: &Path) -> Option<PatternSet> {
    let gitignore = directory.join(".gitignore");
    if !gitignore.is_file() {
        return None;
    }

    match fs::read(&gitignore) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let set = PatternSet::parse(&text, directory);
            if let Some(set) = &set {
                debug!("Loaded {} patterns from {:?}", set.len(), gitignore);
            }
            set
        }
        Err(err) => {
            warn!("Unable to read {:?}: {}", gitignore, err);
            None
        }
    }
}

/// Gitignore-aware path filter for one root directory.
#[derive(Debug)]
pub struct GitignoreFilter {
    root: PathBuf,
    enabled: bool,
    index: IgnoreIndex,
}

impl GitignoreFilter {
    pub fn new(root: &Path) -> GitignoreFilter {
        let enabled = backend_available();
        if !enabled {
            warn!("glob backend unavailable - gitignore filtering disabled");
        }

        GitignoreFilter {
            root: pathop::absolute(root),
            enabled,
            index: IgnoreIndex::new(),
        }
    }

    /// A filter that ignores nothing. Used when filtering is switched off
    /// but callers still want a filter-shaped collaborator.
    pub fn disabled(root: &Path) -> GitignoreFilter {
        GitignoreFilter {
            root: pathop::absolute(root),
            enabled: false,
            index: IgnoreIndex::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clear_cache(&self) {
        self.index.clear();
    }

    /// Whether `path` is excluded by the `.gitignore` files between the
    /// filter root and the path.
    ///
    /// Paths outside the root are never ignored. Each ancestor directory
    /// is judged on its own, shallowest first, with last-matching-rule
    /// precedence over the concatenated root-to-deepest rule list; an
    /// ignored ancestor excludes the entire subtree, and a deeper
    /// negation cannot re-include anything inside it. The path itself is
    /// judged last, with directory-only rules applying only when it is a
    /// directory.
    pub fn should_ignore(&self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }

        let abs = if path.is_absolute() {
            pathop::absolute(path)
        } else {
            pathop::absolute(&self.root.join(path))
        };

        let rel = match abs.strip_prefix(&self.root) {
            Ok(rel) => rel.to_owned(),
            Err(_) => return false,
        };
        if rel.as_os_str().is_empty() {
            return false;
        }

        let parts: Vec<OsString> = rel.iter().map(OsString::from).collect();
        let sets = self.applicable_sets(&parts);

        let mut ancestor = self.root.clone();
        for part in &parts[..parts.len() - 1] {
            ancestor.push(part);
            if evaluate(&sets, &ancestor, true) == Some(true) {
                debug!("Ignoring {:?}: ancestor {:?} is ignored", path, ancestor);
                return true;
            }
        }

        let ignored = evaluate(&sets, &abs, abs.is_dir()).unwrap_or(false);
        if ignored {
            debug!("Ignoring {:?}: matched ignore pattern", path);
        }

        ignored
    }

    /// Drop ignored entries from `paths`, preserving input order.
    pub fn filter_paths(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths
            .iter()
            .filter(|path| {
                let ignored = self.should_ignore(path);
                if ignored {
                    debug!("Filtered out ignored path: {:?}", path);
                }
                !ignored
            })
            .cloned()
            .collect()
    }

    /// Pattern sets along the lineage from the root to the parent of the
    /// path described by `parts`, in root-to-deepest order. The ordering
    /// is load-bearing: it is what lets deeper rules override shallower
    /// ones in [`evaluate`].
    fn applicable_sets(&self, parts: &[OsString]) -> Vec<Rc<PatternSet>> {
        let mut sets = Vec::new();

        let mut dir = self.root.clone();
        if let Some(set) = self.index.get(&dir) {
            sets.push(set);
        }

        for part in parts.iter().take(parts.len().saturating_sub(1)) {
            dir.push(part);
            if let Some(set) = self.index.get(&dir) {
                sets.push(set);
            }
        }

        sets
    }
}

/// Last-matching-rule verdict for one concrete path: `Some(true)` ignored,
/// `Some(false)` re-included by a negation, `None` if no rule matched.
fn evaluate(sets: &[Rc<PatternSet>], target: &Path, is_dir: bool) -> Option<bool> {
    let mut verdict = None;

    for set in sets {
        let rel = match target.strip_prefix(set.origin()) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if rel.as_os_str().is_empty() {
            // A .gitignore never applies to its own directory.
            continue;
        }

        let rel = pathop::slashed(rel);
        for rule in &set.rules {
            if rule.matches(&rel, is_dir) {
                verdict = Some(!rule.negated);
            }
        }
    }

    verdict
}

fn backend_available() -> bool {
    GlobBuilder::new("*").literal_separator(true).build().is_ok()
}
