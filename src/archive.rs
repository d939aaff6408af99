//! Packages a generated site as a single zip file.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zips the contents of `directory` into `{directory}.zip`, placed next to
/// the directory itself. Entry names are relative to `directory` and use `/`
/// as the separator. Returns the path of the archive. On failure no partial
/// archive is left behind.
pub fn create_archive(directory: &Path) -> Result<PathBuf> {
    let directory = fs::canonicalize(directory).map_err(|err| Error::Io {
        path: directory.to_owned(),
        err,
    })?;
    let destination = archive_path(&directory)?;

    let file = File::create(&destination).map_err(|err| Error::Io {
        path: destination.clone(),
        err,
    })?;
    if let Err(err) = write_archive(&directory, file) {
        if let Err(remove_err) = fs::remove_file(&destination) {
            warn!(
                "Removing incomplete archive {}: {}",
                destination.display(),
                remove_err
            );
        }
        return Err(err);
    }

    info!("Created zip archive {}", destination.display());
    Ok(destination)
}

fn write_archive(directory: &Path, file: File) -> Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for result in WalkDir::new(directory)
        .min_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = result?;
        let name = match entry_name(directory, entry.path()) {
            Some(name) => name,
            None => return Err(Error::InvalidName(entry.path().to_owned())),
        };

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            debug!("Adding {} to archive", name);
            zip.start_file(name, options)?;
            let mut source = File::open(entry.path()).map_err(|err| Error::Io {
                path: entry.path().to_owned(),
                err,
            })?;
            io::copy(&mut source, &mut zip).map_err(|err| Error::Io {
                path: entry.path().to_owned(),
                err,
            })?;
        }
    }
    zip.finish()?;
    Ok(())
}

/// `/parent/out` becomes `/parent/out.zip`.
fn archive_path(directory: &Path) -> Result<PathBuf> {
    match (directory.parent(), directory.file_name()) {
        (Some(parent), Some(name)) => {
            let mut file_name = name.to_owned();
            file_name.push(".zip");
            Ok(parent.join(file_name))
        }
        _ => Err(Error::InvalidName(directory.to_owned())),
    }
}

fn entry_name(directory: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(directory).ok()?;
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<&str>>>()?;
    Some(segments.join("/"))
}

/// The result of a fallible archive operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error creating an archive.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O errors on a specific path.
    Io { path: PathBuf, err: io::Error },

    /// Returned when a path can't be turned into an archive entry name (the
    /// file system root, or a name that isn't valid UTF-8).
    InvalidName(PathBuf),

    /// Returned for errors walking the directory.
    WalkDir(walkdir::Error),

    /// Returned for errors encoding the archive.
    Zip(zip::result::ZipError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "Archiving '{}': {}", path.display(), err),
            Error::InvalidName(path) => {
                write!(f, "Can't archive '{}': invalid name", path.display())
            }
            Error::WalkDir(err) => write!(f, "Archiving: {}", err),
            Error::Zip(err) => write!(f, "Writing archive: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::InvalidName(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Zip(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<zip::result::ZipError> for Error {
    /// Converts a [`zip::result::ZipError`] into an [`Error`].
    fn from(err: zip::result::ZipError) -> Error {
        Error::Zip(err)
    }
}
