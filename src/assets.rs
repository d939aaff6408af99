//! Places the index page's static dependencies, `styles.css` and
//! `scripts.js`, in the output directory. A theme directory can supply its
//! own copy of either file; otherwise the built-in one is written.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The stylesheet linked from the default index template.
pub const STYLESHEET: &str = include_str!("../assets/styles.css");

/// The client script that loads pages into the content pane.
pub const SCRIPT: &str = include_str!("../assets/scripts.js");

/// Every static asset as a pair of file name and built-in contents.
pub const ASSETS: &[(&str, &str)] = &[("styles.css", STYLESHEET), ("scripts.js", SCRIPT)];

/// Writes each of [`ASSETS`] into `output_directory`, copying the theme's
/// version when `theme_directory` has one. Every asset is attempted; the
/// failures are returned.
pub fn write_assets(theme_directory: Option<&Path>, output_directory: &Path) -> Vec<Error> {
    ASSETS
        .iter()
        .filter_map(|(name, builtin)| {
            write_asset(theme_directory, output_directory, name, builtin).err()
        })
        .collect()
}

fn write_asset(
    theme_directory: Option<&Path>,
    output_directory: &Path,
    name: &str,
    builtin: &str,
) -> Result<()> {
    let destination = output_directory.join(name);
    if let Some(theme_directory) = theme_directory {
        let source = theme_directory.join(name);
        if source.is_file() {
            fs::copy(&source, &destination).map_err(|err| Error::Copy {
                source: source.clone(),
                destination: destination.clone(),
                err,
            })?;
            info!("Copied {} to {}", source.display(), destination.display());
            return Ok(());
        }
        debug!("Theme has no {}, using the built-in one", name);
    }

    fs::write(&destination, builtin).map_err(|err| Error::Write {
        path: destination.clone(),
        err,
    })?;
    info!("Wrote {}", destination.display());
    Ok(())
}

/// The result of a fallible asset operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error placing a static asset.
#[derive(Debug)]
pub enum Error {
    /// Returned when a theme asset can't be copied.
    Copy {
        source: PathBuf,
        destination: PathBuf,
        err: io::Error,
    },

    /// Returned when a built-in asset can't be written.
    Write { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Copy {
                source,
                destination,
                err,
            } => write!(
                f,
                "Copying '{}' to '{}': {}",
                source.display(),
                destination.display(),
                err
            ),
            Error::Write { path, err } => {
                write!(f, "Writing asset '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Copy { err, .. } => Some(err),
            Error::Write { err, .. } => Some(err),
        }
    }
}
