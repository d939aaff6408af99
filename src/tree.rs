//! Defines the [`TreeModel`], the in-memory picture of a source directory
//! that both the page writer ([`crate::write`]) and the navigation renderer
//! ([`crate::nav`]) work from, along with the [`Scanner`] which builds one by
//! walking the file system.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The file name suffixes used when no project file overrides them: C and C++
/// sources and headers.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cpp", ".hpp", ".h", ".c"];

/// The path of a directory relative to the source root, with `/` as the
/// separator regardless of the host OS. The source root itself has the empty
/// key (see [`PathKey::root`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey(String);

impl PathKey {
    /// The key of the source root.
    pub fn root() -> PathKey {
        PathKey(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a single path segment. Joining onto the root key yields just
    /// `name`, so keys never start with a separator.
    pub fn join(&self, name: &str) -> PathKey {
        match self.is_root() {
            true => PathKey(name.to_owned()),
            false => PathKey(format!("{}/{}", self.0, name)),
        }
    }

    /// The last segment of the key, or the empty string for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(i) => &self.0[i + 1..],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the key back into a relative path using the host separator.
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Builds a key from a relative file system path. Returns [`None`] if any
    /// segment isn't valid UTF-8.
    fn from_relative(path: &Path) -> Option<PathKey> {
        let mut key = PathKey::root();
        for component in path.components() {
            if let Component::Normal(name) = component {
                key = key.join(name.to_str()?);
            }
        }
        Some(key)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of file name suffixes which make a file "qualifying", i.e. worth
/// a page of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Builds an extension list. Blank entries are dropped, a leading `.` is
    /// added where it's missing and duplicates are removed (first one wins).
    pub fn new<I, S>(extensions: I) -> Extensions
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut v: Vec<String> = Vec::new();
        for extension in extensions {
            let extension = extension.as_ref().trim();
            if extension.is_empty() {
                continue;
            }
            let extension = match extension.starts_with('.') {
                true => extension.to_owned(),
                false => format!(".{}", extension),
            };
            if !v.contains(&extension) {
                v.push(extension);
            }
        }
        Extensions(v)
    }

    /// Reports whether `file_name` ends with one of the extensions. Matching
    /// is case-sensitive.
    pub fn matches(&self, file_name: &str) -> bool {
        self.0.iter().any(|e| file_name.ends_with(e.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Extensions::new(DEFAULT_EXTENSIONS)
    }
}

/// One directory of the source tree: the names of its subdirectories and of
/// its qualifying files, each sorted by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub key: PathKey,
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl DirEntry {
    fn new(key: PathKey) -> DirEntry {
        DirEntry {
            key,
            directories: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// Maps every directory of the source tree to its [`DirEntry`].
///
/// The model is only grown through [`TreeModel::add_directory`] and
/// [`TreeModel::add_file`], which keep the invariant that every subdirectory
/// named by a [`DirEntry`] has an entry of its own. Lookups never create
/// entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeModel {
    entries: BTreeMap<PathKey, DirEntry>,
}

impl TreeModel {
    /// Creates a model holding only an empty root entry.
    pub fn new() -> TreeModel {
        let mut model = TreeModel::default();
        model.insert(PathKey::root());
        model
    }

    pub fn get(&self, key: &PathKey) -> Option<&DirEntry> {
        self.entries.get(key)
    }

    pub fn root(&self) -> Option<&DirEntry> {
        self.get(&PathKey::root())
    }

    /// Records the directory `name` under `parent` and gives it an (empty)
    /// entry of its own. Returns the child's key.
    pub fn add_directory(&mut self, parent: &PathKey, name: &str) -> PathKey {
        let child = parent.join(name);
        self.insert(parent.clone()).directories.push(name.to_owned());
        self.insert(child.clone());
        child
    }

    /// Records the qualifying file `name` under `parent`.
    pub fn add_file(&mut self, parent: &PathKey, name: &str) {
        self.insert(parent.clone()).files.push(name.to_owned());
    }

    /// The number of directories in the model, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all directories in key order.
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.values()
    }

    /// Iterates over every qualifying file as a pair of the containing
    /// directory's key and the file name.
    pub fn files(&self) -> impl Iterator<Item = (&PathKey, &str)> + '_ {
        self.entries.values().flat_map(|entry| {
            entry
                .files
                .iter()
                .map(move |file| (&entry.key, file.as_str()))
        })
    }

    fn insert(&mut self, key: PathKey) -> &mut DirEntry {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| DirEntry::new(key))
    }
}

/// Walks a source directory and builds a [`TreeModel`] from it.
pub struct Scanner<'a> {
    /// Which files are kept.
    extensions: &'a Extensions,

    /// A path that is skipped along with everything below it. Used to keep
    /// an output directory that lives inside the source tree out of the
    /// model.
    exclude: Option<&'a Path>,
}

impl<'a> Scanner<'a> {
    pub fn new(extensions: &'a Extensions) -> Scanner<'a> {
        Scanner {
            extensions,
            exclude: None,
        }
    }

    /// Skips `path` (if it exists) during the walk.
    pub fn excluding(mut self, path: &'a Path) -> Scanner<'a> {
        self.exclude = Some(path);
        self
    }

    /// Walks `source_root` once, depth first, visiting the entries of each
    /// directory in file name order. Every directory becomes an entry of the
    /// model; regular files are kept only if they match the extensions.
    /// Symbolic links aren't followed and entries whose names aren't valid
    /// UTF-8 are skipped with a warning.
    ///
    /// Any I/O problem during the walk is fatal.
    pub fn scan(&self, source_root: &Path) -> Result<TreeModel> {
        let root = fs::canonicalize(source_root).map_err(|err| Error::Root {
            path: source_root.to_owned(),
            err,
        })?;
        if !root.is_dir() {
            return Err(Error::NotADirectory(source_root.to_owned()));
        }
        let exclude = self.exclude.and_then(|path| fs::canonicalize(path).ok());

        let mut model = TreeModel::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| {
                if let Some(exclude) = &exclude {
                    if entry.path() == exclude.as_path() {
                        debug!("Skipping output directory {}", entry.path().display());
                        return false;
                    }
                }
                if entry.file_name().to_str().is_none() {
                    warn!("Skipping non-UTF-8 path {}", entry.path().display());
                    return false;
                }
                true
            });

        for result in walker {
            let entry = result?;
            let relative = match entry.path().strip_prefix(&root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let parent = match relative.parent().and_then(PathKey::from_relative) {
                Some(parent) => parent,
                None => continue,
            };
            let name = match entry.file_name().to_str() {
                Some(name) => name,
                None => continue,
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                let key = model.add_directory(&parent, name);
                debug!("Found directory `{}`", key);
            } else if file_type.is_file() && self.extensions.matches(name) {
                model.add_file(&parent, name);
            }
        }

        Ok(model)
    }
}

/// Builds the [`TreeModel`] for `source_root`, keeping files that match
/// `extensions`. Shorthand for [`Scanner::scan`] without exclusions.
pub fn build(source_root: &Path, extensions: &Extensions) -> Result<TreeModel> {
    Scanner::new(extensions).scan(source_root)
}

/// The result of a fallible scan.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error scanning the source directory.
#[derive(Debug)]
pub enum Error {
    /// Returned when the source root can't be resolved (usually because it
    /// doesn't exist).
    Root { path: PathBuf, err: io::Error },

    /// Returned when the source root is not a directory.
    NotADirectory(PathBuf),

    /// Returned for I/O errors during the walk.
    Walk(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Root { path, err } => {
                write!(f, "Reading source directory '{}': {}", path.display(), err)
            }
            Error::NotADirectory(path) => {
                write!(f, "Source '{}' is not a directory", path.display())
            }
            Error::Walk(err) => write!(f, "Walking source directory: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Root { path: _, err } => Some(err),
            Error::NotADirectory(_) => None,
            Error::Walk(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while iterating over a walk.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn touch(root: &Path, relative: &str) -> io::Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, relative)
    }

    fn fixture(files: &[&str]) -> io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        for file in files {
            touch(dir.path(), file)?;
        }
        Ok(dir)
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_path_key_join() {
        let key = PathKey::root().join("src").join("net");
        assert_eq!("src/net", key.as_str());
        assert_eq!("net", key.name());
        assert_eq!(PathBuf::from("src").join("net"), key.to_path());
        assert!(!key.is_root());
    }

    #[test]
    fn test_path_key_root() {
        let root = PathKey::root();
        assert!(root.is_root());
        assert_eq!("", root.name());
        assert_eq!(PathBuf::new(), root.to_path());
        assert_eq!("lib", root.join("lib").as_str());
    }

    #[test]
    fn test_extensions_normalize() {
        let extensions = Extensions::new(vec!["rs", ".toml", " ", ".rs"]);
        assert_eq!(vec![".rs", ".toml"], extensions.iter().collect::<Vec<_>>());
        assert!(extensions.matches("main.rs"));
        assert!(!extensions.matches("main.rst"));
    }

    #[test]
    fn test_default_extensions() {
        let extensions = Extensions::default();
        for name in &["a.cpp", "a.hpp", "a.h", "a.c"] {
            assert!(extensions.matches(name), "{}", name);
        }
        for name in &["a.txt", "README.md", "a.C", "Makefile"] {
            assert!(!extensions.matches(name), "{}", name);
        }
    }

    #[test]
    fn test_model_add_directory_inserts_child() {
        let mut model = TreeModel::new();
        let src = model.add_directory(&PathKey::root(), "src");
        model.add_file(&src, "main.c");

        assert_eq!(2, model.len());
        assert_eq!(names(&["src"]), model.root().unwrap().directories);
        assert_eq!(names(&["main.c"]), model.get(&src).unwrap().files);
        assert!(model.get(&PathKey::root().join("missing")).is_none());
    }

    #[test]
    fn test_build_filters_and_sorts() -> TestResult {
        let dir = fixture(&[
            "z.cpp",
            "a.h",
            "notes.txt",
            "README.md",
            "sub/b.h",
            "sub/deep/c.c",
            "lib/x.hpp",
            "empty/.keep",
        ])?;

        let model = build(dir.path(), &Extensions::default())?;

        let root = model.root().unwrap();
        assert_eq!(names(&["empty", "lib", "sub"]), root.directories);
        assert_eq!(names(&["a.h", "z.cpp"]), root.files);

        let sub = model.get(&PathKey::root().join("sub")).unwrap();
        assert_eq!(names(&["deep"]), sub.directories);
        assert_eq!(names(&["b.h"]), sub.files);

        let empty = model.get(&PathKey::root().join("empty")).unwrap();
        assert!(empty.directories.is_empty());
        assert!(empty.files.is_empty());

        let deep = model.get(&PathKey::root().join("sub").join("deep")).unwrap();
        assert_eq!(names(&["c.c"]), deep.files);
        Ok(())
    }

    #[test]
    fn test_build_every_subdirectory_has_entry() -> TestResult {
        let dir = fixture(&["a/b/c/d.c", "a/e/f.h", "g/h.cpp"])?;
        let model = build(dir.path(), &Extensions::default())?;

        assert_eq!(6, model.len());
        for entry in model.entries() {
            for name in &entry.directories {
                assert!(model.get(&entry.key.join(name)).is_some(), "{}", name);
            }
        }
        Ok(())
    }

    #[test]
    fn test_build_files_iterator() -> TestResult {
        let dir = fixture(&["a.cpp", "sub/b.h", "sub/c.txt"])?;
        let model = build(dir.path(), &Extensions::default())?;

        let files: Vec<String> = model
            .files()
            .map(|(key, name)| key.join(name).as_str().to_owned())
            .collect();
        assert_eq!(names(&["a.cpp", "sub/b.h"]), files);
        Ok(())
    }

    #[test]
    fn test_build_custom_extensions() -> TestResult {
        let dir = fixture(&["main.rs", "main.c", "Cargo.toml"])?;
        let model = build(dir.path(), &Extensions::new(vec![".rs", "toml"]))?;
        assert_eq!(
            names(&["Cargo.toml", "main.rs"]),
            model.root().unwrap().files
        );
        Ok(())
    }

    #[test]
    fn test_build_missing_root() -> TestResult {
        let dir = tempfile::tempdir()?;
        match build(&dir.path().join("nope"), &Extensions::default()) {
            Err(Error::Root { .. }) => Ok(()),
            other => panic!("wanted Error::Root, got {:?}", other),
        }
    }

    #[test]
    fn test_build_root_is_a_file() -> TestResult {
        let dir = fixture(&["a.c"])?;
        match build(&dir.path().join("a.c"), &Extensions::default()) {
            Err(Error::NotADirectory(_)) => Ok(()),
            other => panic!("wanted Error::NotADirectory, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_build_unreadable_root() -> TestResult {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture(&["locked/a.c"])?;
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        // Privileged users read the directory regardless of its mode.
        let result = match fs::read_dir(&locked) {
            Ok(_) => None,
            Err(_) => Some(build(&locked, &Extensions::default())),
        };
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        match result {
            None | Some(Err(Error::Walk(_))) => Ok(()),
            Some(other) => panic!("wanted Error::Walk, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_excluding() -> TestResult {
        let dir = fixture(&["a.c", "out/a.c.html", "out/nested/b.h"])?;
        let extensions = Extensions::default();
        let out = dir.path().join("out");
        let model = Scanner::new(&extensions).excluding(&out).scan(dir.path())?;

        assert!(model.root().unwrap().directories.is_empty());
        assert_eq!(1, model.len());
        Ok(())
    }

    #[test]
    fn test_scan_excluding_missing_path() -> TestResult {
        let dir = fixture(&["sub/a.c"])?;
        let extensions = Extensions::default();
        let out = dir.path().join("out");
        let model = Scanner::new(&extensions).excluding(&out).scan(dir.path())?;
        assert_eq!(names(&["sub"]), model.root().unwrap().directories);
        Ok(())
    }
}
