//! Defines the [`Config`] for a run: the directories from the command line,
//! optionally merged with a YAML project file.
//!
//! A project file looks like this (every key is optional):
//!
//! ```yaml
//! title: My Project
//! extensions: [".rs", ".toml"]
//! theme: theme
//! ```
//!
//! `theme` is a directory relative to the project file. It may contain an
//! `index.html` template and `styles.css`/`scripts.js` replacing the built-in
//! ones.

use crate::tree::Extensions;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// The name of the project file looked up in the source directory when none
/// is given explicitly.
pub const PROJECT_FILE_NAME: &str = "codeview.yaml";

/// The index page title used when the project file doesn't set one.
pub const DEFAULT_TITLE: &str = "Code Viewer";

/// The file name of a theme's index template.
pub const THEME_INDEX_TEMPLATE: &str = "index.html";

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct Project {
    title: Option<String>,
    extensions: Option<Vec<String>>,
    theme: Option<PathBuf>,
}

/// Everything [`crate::build::build_site`] needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory tree to render.
    pub source_directory: PathBuf,

    /// Where the site is written. Created if missing.
    pub output_directory: PathBuf,

    /// Which files get pages.
    pub extensions: Extensions,

    /// The title of the index page.
    pub title: String,

    /// A template file replacing the built-in index document.
    pub index_template: Option<PathBuf>,

    /// A directory whose `styles.css`/`scripts.js` replace the built-in ones.
    pub theme_directory: Option<PathBuf>,

    /// Whether to zip the output directory once it's complete.
    pub zip: bool,
}

impl Config {
    /// A configuration with the default title, extensions and assets.
    pub fn new(source_directory: &Path, output_directory: &Path) -> Config {
        Config {
            source_directory: source_directory.to_owned(),
            output_directory: output_directory.to_owned(),
            extensions: Extensions::default(),
            title: DEFAULT_TITLE.to_owned(),
            index_template: None,
            theme_directory: None,
            zip: false,
        }
    }

    /// Loads the project file at `path` on top of the defaults from
    /// [`Config::new`]. Relative theme paths are resolved against the project
    /// file's directory.
    pub fn from_project_file(
        path: &Path,
        source_directory: &Path,
        output_directory: &Path,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;

        let mut config = Config::new(source_directory, output_directory);
        if let Some(title) = project.title {
            config.title = title;
        }
        if let Some(extensions) = project.extensions {
            config.extensions = Extensions::new(extensions);
            if config.extensions.iter().next().is_none() {
                return Err(Error::NoExtensions(path.to_owned()));
            }
        }
        if let Some(theme) = project.theme {
            let theme_dir = match path.parent() {
                Some(project_root) => project_root.join(theme),
                None => theme,
            };
            if !theme_dir.is_dir() {
                return Err(Error::MissingTheme(theme_dir));
            }
            let template = theme_dir.join(THEME_INDEX_TEMPLATE);
            if template.is_file() {
                config.index_template = Some(template);
            }
            config.theme_directory = Some(theme_dir);
        }
        Ok(config)
    }

    /// Loads `project_file` if given, otherwise `{source_directory}/codeview.yaml`
    /// if it exists, otherwise falls back to [`Config::new`].
    pub fn load(
        project_file: Option<&Path>,
        source_directory: &Path,
        output_directory: &Path,
    ) -> Result<Config> {
        match project_file {
            Some(path) => Config::from_project_file(path, source_directory, output_directory),
            None => {
                let path = source_directory.join(PROJECT_FILE_NAME);
                match path.is_file() {
                    true => Config::from_project_file(&path, source_directory, output_directory),
                    false => Ok(Config::new(source_directory, output_directory)),
                }
            }
        }
    }
}

/// The result of loading a configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: io::Error },

    /// Returned when the project file isn't valid.
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when `extensions` is present but has no usable entries.
    NoExtensions(PathBuf),

    /// Returned when the configured theme directory doesn't exist.
    MissingTheme(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading project file '{}': {}", path.display(), err)
            }
            Error::NoExtensions(path) => {
                write!(f, "Project file '{}' lists no extensions", path.display())
            }
            Error::MissingTheme(path) => {
                write!(f, "Theme directory '{}' does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            Error::NoExtensions(_) => None,
            Error::MissingTheme(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn fixture(project: &str) -> io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(PROJECT_FILE_NAME), project)?;
        Ok(dir)
    }

    #[test]
    fn test_defaults() {
        let config = Config::new(Path::new("src"), Path::new("out"));
        assert_eq!(DEFAULT_TITLE, config.title);
        assert_eq!(Extensions::default(), config.extensions);
        assert_eq!(None, config.index_template);
        assert!(!config.zip);
    }

    #[test]
    fn test_load_without_project_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::load(None, dir.path(), Path::new("out"))?;
        assert_eq!(Config::new(dir.path(), Path::new("out")), config);
        Ok(())
    }

    #[test]
    fn test_load_discovers_project_file() -> TestResult {
        let dir = fixture("title: Kernel\nextensions: [rs, .toml]\n")?;
        let config = Config::load(None, dir.path(), Path::new("out"))?;
        assert_eq!("Kernel", config.title);
        assert_eq!(Extensions::new(vec![".rs", ".toml"]), config.extensions);
        Ok(())
    }

    #[test]
    fn test_empty_project_file_keeps_defaults() -> TestResult {
        let dir = fixture("{}\n")?;
        let config = Config::load(None, dir.path(), Path::new("out"))?;
        assert_eq!(Config::new(dir.path(), Path::new("out")), config);
        Ok(())
    }

    #[test]
    fn test_theme_is_relative_to_project_file() -> TestResult {
        let dir = fixture("theme: theme\n")?;
        let theme = dir.path().join("theme");
        fs::create_dir(&theme)?;
        fs::write(theme.join(THEME_INDEX_TEMPLATE), "{{ .nav }}")?;

        let config = Config::load(None, dir.path(), Path::new("out"))?;
        assert_eq!(Some(theme.clone()), config.theme_directory);
        assert_eq!(Some(theme.join(THEME_INDEX_TEMPLATE)), config.index_template);
        Ok(())
    }

    #[test]
    fn test_missing_theme() -> TestResult {
        let dir = fixture("theme: nowhere\n")?;
        match Config::load(None, dir.path(), Path::new("out")) {
            Err(Error::MissingTheme(path)) => {
                assert_eq!(dir.path().join("nowhere"), path);
                Ok(())
            }
            other => panic!("wanted Error::MissingTheme, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_extensions() -> TestResult {
        let dir = fixture("extensions: []\n")?;
        match Config::load(None, dir.path(), Path::new("out")) {
            Err(Error::NoExtensions(_)) => Ok(()),
            other => panic!("wanted Error::NoExtensions, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key() -> TestResult {
        let dir = fixture("tilte: typo\n")?;
        match Config::load(None, dir.path(), Path::new("out")) {
            Err(Error::Parse { .. }) => Ok(()),
            other => panic!("wanted Error::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_project_file_must_exist() -> TestResult {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.yaml");
        match Config::load(Some(&missing), dir.path(), Path::new("out")) {
            Err(Error::Open { .. }) => Ok(()),
            other => panic!("wanted Error::Open, got {:?}", other),
        }
    }
}
