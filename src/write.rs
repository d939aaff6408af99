//! Writes the generated site to disk: one escaped page per qualifying source
//! file (see [`emit`]) and the `index.html` document which wraps the
//! navigation list from [`crate::nav`] in an HTML template.

use crate::escape::escape;
use crate::nav::{self, PAGE_SUFFIX};
use crate::tree::{PathKey, TreeModel};
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// The index document used when the theme doesn't provide one. It expects
/// `styles.css` and `scripts.js` next to it.
pub const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

/// The file name of the index document inside the output directory.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Writes pages and the index for a [`TreeModel`].
pub struct Writer<'a> {
    /// The directory the model was scanned from.
    pub source_directory: &'a Path,

    /// The directory the site is written into. Pages mirror the source
    /// tree underneath it.
    pub output_directory: &'a Path,

    /// The template for `index.html`.
    pub index_template: &'a Template,

    /// Made available to the index template as `title`.
    pub title: &'a str,
}

impl Writer<'_> {
    /// Emits a page for every qualifying file in `model`. A failure for one
    /// file is logged and collected; the remaining files are still written.
    /// Returns the number of pages written along with the failures.
    pub fn write_pages(&self, model: &TreeModel) -> (usize, Vec<Error>) {
        let mut written = 0;
        let mut failures = Vec::new();

        for (directory, file) in model.files() {
            let source = self
                .source_directory
                .join(directory.to_path())
                .join(file);
            match emit(&source, self.source_directory, self.output_directory) {
                Ok(_) => written += 1,
                Err(err) => {
                    error!("{}", err);
                    failures.push(err);
                }
            }
        }

        (written, failures)
    }

    /// Renders the index document for `model` and writes it to
    /// `{output_directory}/index.html`.
    pub fn write_index(&self, model: &TreeModel) -> Result<PathBuf> {
        let html = index_document(self.index_template, self.title, model)?;
        let path = self.output_directory.join(INDEX_FILE_NAME);
        fs::write(&path, html).map_err(|err| Error::WriteIndex {
            path: path.clone(),
            err,
        })?;
        info!("Index page created at {}", path.display());
        Ok(path)
    }
}

/// Writes the page for a single source `file`: its escaped content, with no
/// wrapper, at `{output_root}/{path relative to source_root}.html`. The
/// original extension is kept, so `foo.cpp` becomes `foo.cpp.html`. Missing
/// parent directories are created. Bytes that aren't valid UTF-8 are replaced
/// with U+FFFD.
///
/// Returns the path of the written page.
pub fn emit(file: &Path, source_root: &Path, output_root: &Path) -> Result<PathBuf> {
    let relative = file
        .strip_prefix(source_root)
        .map_err(|_| Error::OutsideSourceRoot(file.to_owned()))?;
    let destination = page_path(output_root, relative);

    let bytes = fs::read(file).map_err(|err| Error::ReadSource {
        path: file.to_owned(),
        err,
    })?;
    let content = escape(&String::from_utf8_lossy(&bytes));

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::CreateDirectory {
            path: parent.to_owned(),
            err,
        })?;
    }
    fs::write(&destination, content).map_err(|err| Error::WritePage {
        path: destination.clone(),
        err,
    })?;

    info!("Processed {} -> {}", file.display(), destination.display());
    Ok(destination)
}

/// Appends [`PAGE_SUFFIX`] to the full file name of `relative` and places it
/// under `output_root`.
fn page_path(output_root: &Path, relative: &Path) -> PathBuf {
    let mut path: OsString = output_root.join(relative).into_os_string();
    path.push(PAGE_SUFFIX);
    PathBuf::from(path)
}

/// Parses an index template. `None` selects [`DEFAULT_INDEX_TEMPLATE`].
pub fn parse_template(source: Option<&str>) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(source.unwrap_or(DEFAULT_INDEX_TEMPLATE))
        .map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// Renders the complete index document. The template sees two values:
/// `title` (escaped), and `nav` which holds the navigation list items for the
/// whole model (already escaped; the template inserts it verbatim).
pub fn index_document(template: &Template, title: &str, model: &TreeModel) -> Result<String> {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(escape(title)));
    m.insert(
        "nav".to_owned(),
        Value::String(nav::render(model, &PathKey::root())),
    );

    let mut out: Vec<u8> = Vec::new();
    template.execute(&mut out, &Context::from(Value::Object(m))?)?;
    String::from_utf8(out).map_err(|e| Error::Template(e.to_string()))
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation. Every I/O variant names
/// the path it failed on.
#[derive(Debug)]
pub enum Error {
    /// Returned when a file to emit isn't below the source root.
    OutsideSourceRoot(PathBuf),

    /// Returned when a source file can't be read.
    ReadSource { path: PathBuf, err: io::Error },

    /// Returned when an output directory can't be created.
    CreateDirectory { path: PathBuf, err: io::Error },

    /// Returned when a page can't be written.
    WritePage { path: PathBuf, err: io::Error },

    /// Returned when the index document can't be written.
    WriteIndex { path: PathBuf, err: io::Error },

    /// Returned for errors parsing the index template.
    ParseTemplate(String),

    /// Returned for errors executing the index template.
    Template(String),
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OutsideSourceRoot(path) => {
                write!(f, "'{}' is not inside the source directory", path.display())
            }
            Error::ReadSource { path, err } => {
                write!(f, "Reading source file '{}': {}", path.display(), err)
            }
            Error::CreateDirectory { path, err } => {
                write!(f, "Creating directory '{}': {}", path.display(), err)
            }
            Error::WritePage { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
            Error::WriteIndex { path, err } => {
                write!(f, "Writing index '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing index template: {}", err),
            Error::Template(err) => write!(f, "Rendering index template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OutsideSourceRoot(_) => None,
            Error::ReadSource { path: _, err } => Some(err),
            Error::CreateDirectory { path: _, err } => Some(err),
            Error::WritePage { path: _, err } => Some(err),
            Error::WriteIndex { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Template(_) => None,
        }
    }
}
