//! Exports the [`build_site`] function which stitches together the high-level
//! steps of generating the viewer: scanning the source tree
//! ([`crate::tree`]), writing one page per source file and the index page
//! ([`crate::write`]), placing the static assets ([`crate::assets`]) and
//! optionally zipping the result ([`crate::archive`]).

use crate::archive::{self, Error as ArchiveError};
use crate::assets::{self, Error as AssetError};
use crate::config::{Config, Error as ConfigError};
use crate::tree::{Error as ScanError, Scanner};
use crate::write::{self, Error as WriteError, Writer};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// What a completed run produced. A run can complete while some pages,
/// assets or the archive failed; those failures are listed here rather than
/// aborting the run.
#[derive(Debug, Default)]
pub struct Report {
    /// The number of pages written.
    pub pages: usize,

    /// The path of the index page.
    pub index: PathBuf,

    /// The path of the zip archive, if one was requested and written.
    pub archive: Option<PathBuf>,

    /// Everything that went wrong without stopping the run.
    pub failures: Vec<Error>,
}

impl Report {
    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the site described by `config`.
///
/// The source tree is scanned before anything is written, so an unreadable
/// source directory leaves the output untouched. An output directory nested
/// inside the source tree is left out of the scan. Failures for individual
/// pages, assets and the archive are collected in the [`Report`]; failing to
/// scan, to load the index template or to write the index page is fatal.
pub fn build_site(config: &Config) -> Result<Report> {
    let template = load_template(config.index_template.as_deref())?;

    info!(
        "Starting to process files in {}",
        config.source_directory.display()
    );
    let model = Scanner::new(&config.extensions)
        .excluding(&config.output_directory)
        .scan(&config.source_directory)?;

    fs::create_dir_all(&config.output_directory).map_err(|err| Error::CreateOutput {
        path: config.output_directory.clone(),
        err,
    })?;

    let writer = Writer {
        source_directory: &config.source_directory,
        output_directory: &config.output_directory,
        index_template: &template,
        title: &config.title,
    };
    let (pages, page_failures) = writer.write_pages(&model);
    let index = writer.write_index(&model)?;

    let mut report = Report {
        pages,
        index,
        archive: None,
        failures: page_failures.into_iter().map(Error::from).collect(),
    };

    for err in assets::write_assets(config.theme_directory.as_deref(), &config.output_directory) {
        error!("{}", err);
        report.failures.push(err.into());
    }

    if config.zip {
        match archive::create_archive(&config.output_directory) {
            Ok(path) => report.archive = Some(path),
            Err(err) => {
                error!("{}", err);
                report.failures.push(err.into());
            }
        }
    }

    Ok(report)
}

// Reads and parses the index template, falling back to the built-in one.
fn load_template(path: Option<&Path>) -> Result<gtmpl::Template> {
    match path {
        None => Ok(write::parse_template(None)?),
        Some(path) => {
            let source = fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
                path: path.to_owned(),
                err,
            })?;
            Ok(write::parse_template(Some(&source))?)
        }
    }
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can come from loading the
/// configuration, scanning, writing, placing assets and archiving.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the configuration.
    Config(ConfigError),

    /// Returned for errors scanning the source directory.
    Scan(ScanError),

    /// Returned for errors writing pages or the index.
    Write(WriteError),

    /// Returned for errors placing static assets.
    Asset(AssetError),

    /// Returned for errors creating the archive.
    Archive(ArchiveError),

    /// Returned when the output directory can't be created.
    CreateOutput { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while opening the index template file.
    OpenTemplateFile { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Scan(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Asset(err) => err.fmt(f),
            Error::Archive(err) => err.fmt(f),
            Error::CreateOutput { path, err } => {
                write!(f, "Creating output directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Scan(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Asset(err) => Some(err),
            Error::Archive(err) => Some(err),
            Error::CreateOutput { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<ScanError> for Error {
    /// Converts [`ScanError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ScanError) -> Error {
        Error::Scan(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<AssetError> for Error {
    /// Converts [`AssetError`]s into [`Error`].
    fn from(err: AssetError) -> Error {
        Error::Asset(err)
    }
}

impl From<ArchiveError> for Error {
    /// Converts [`ArchiveError`]s into [`Error`].
    fn from(err: ArchiveError) -> Error {
        Error::Archive(err)
    }
}
