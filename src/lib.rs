//! The library code for the `codeview` static site generator, which turns a
//! directory of source files into a browsable HTML code viewer. A run breaks
//! down into these steps:
//!
//! 1. Scanning the source directory into a [`tree::TreeModel`]
//! 2. Writing one escaped page per qualifying file ([`write::emit`])
//! 3. Rendering the model as nested navigation ([`nav`]) and wrapping it in
//!    the index document ([`write::Writer::write_index`])
//! 4. Placing the static assets the index depends on ([`assets`])
//! 5. Optionally zipping the output directory ([`archive`])
//!
//! [`build::build_site`] runs all of them from a [`config::Config`].
//!
//! The output mirrors the source tree: `src/net/socket.c` becomes
//! `{output}/src/net/socket.c.html`. Pages hold nothing but the escaped
//! source text; the index page's script fetches them on click and shows them
//! in the content pane.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod archive;
pub mod assets;
pub mod build;
pub mod config;
pub mod escape;
pub mod nav;
pub mod tree;
pub mod write;
