//! Renders a [`TreeModel`] as the nested `<li>`/`<ul>` navigation list shown
//! in the index page's side panel.
//!
//! Each directory becomes a navigation group (`<li>name<ul>...</ul></li>`)
//! holding its subdirectories' groups followed by its files. A file is an
//! anchor whose `data-url` attribute is the relative URL of its page; the
//! client script reads that attribute and loads the page into the content
//! pane.

use crate::escape::push_escaped;
use crate::tree::{PathKey, TreeModel};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// The label used for the root directory's group.
pub const ROOT_LABEL: &str = "Root";

/// The suffix appended to a source file's relative path to get its page.
pub const PAGE_SUFFIX: &str = ".html";

// Bytes that can't appear raw in a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Renders the subtree starting at `start` into a fresh string. See
/// [`push_nav`].
pub fn render(model: &TreeModel, start: &PathKey) -> String {
    let mut out = String::new();
    push_nav(&mut out, model, start);
    out
}

/// Appends the navigation markup for the directory at `key` (and everything
/// below it) to `out`. Keys missing from the model render nothing.
///
/// The root directory only gets a group of its own when it has no
/// subdirectories. Otherwise its children are rendered directly into the
/// surrounding list so they aren't all indented under a lone "Root" item.
pub fn push_nav(out: &mut String, model: &TreeModel, key: &PathKey) {
    let entry = match model.get(key) {
        Some(entry) => entry,
        None => return,
    };

    let grouped = !key.is_root() || entry.directories.is_empty();
    if grouped {
        out.push_str("<li>");
        push_escaped(
            out,
            match key.is_root() {
                true => ROOT_LABEL,
                false => key.name(),
            },
        );
        out.push_str("<ul>");
    }

    for directory in &entry.directories {
        push_nav(out, model, &key.join(directory));
    }

    for file in &entry.files {
        out.push_str(r##"<li><a href="#" data-url=""##);
        push_escaped(out, &page_url(key, file));
        out.push_str(r#"">"#);
        push_escaped(out, file);
        out.push_str("</a></li>");
    }

    if grouped {
        out.push_str("</ul></li>");
    }
}

/// The URL of a file's page relative to the index, e.g. `sub/b.h.html` for
/// the file `b.h` in directory `sub`. Every segment is percent-encoded, so
/// `we#ird.c` links to `we%23ird.c.html`.
pub fn page_url(directory: &PathKey, file: &str) -> String {
    let key = directory.join(file);
    let mut url = key
        .as_str()
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<String>>()
        .join("/");
    url.push_str(PAGE_SUFFIX);
    url
}

#[cfg(test)]
mod test {
    use super::*;

    fn root() -> PathKey {
        PathKey::root()
    }

    fn item(url: &str, label: &str) -> String {
        format!(r##"<li><a href="#" data-url="{}">{}</a></li>"##, url, label)
    }

    #[test]
    fn test_render_root_with_only_files() {
        let mut model = TreeModel::new();
        model.add_file(&root(), "a.cpp");
        model.add_file(&root(), "b.h");

        assert_eq!(
            format!(
                "<li>Root<ul>{}{}</ul></li>",
                item("a.cpp.html", "a.cpp"),
                item("b.h.html", "b.h")
            ),
            render(&model, &root()),
        );
    }

    #[test]
    fn test_render_empty_root() {
        assert_eq!("<li>Root<ul></ul></li>", render(&TreeModel::new(), &root()));
    }

    #[test]
    fn test_render_root_with_subdirectory_has_no_root_group() {
        let mut model = TreeModel::new();
        let sub = model.add_directory(&root(), "sub");
        model.add_file(&sub, "b.h");
        model.add_file(&root(), "a.cpp");

        assert_eq!(
            format!(
                "<li>sub<ul>{}</ul></li>{}",
                item("sub/b.h.html", "b.h"),
                item("a.cpp.html", "a.cpp")
            ),
            render(&model, &root()),
        );
    }

    #[test]
    fn test_render_nested_groups() {
        let mut model = TreeModel::new();
        let src = model.add_directory(&root(), "src");
        let net = model.add_directory(&src, "net");
        model.add_file(&net, "socket.c");
        model.add_file(&src, "main.c");

        assert_eq!(
            format!(
                "<li>src<ul><li>net<ul>{}</ul></li>{}</ul></li>",
                item("src/net/socket.c.html", "socket.c"),
                item("src/main.c.html", "main.c")
            ),
            render(&model, &root()),
        );
    }

    #[test]
    fn test_render_directories_before_files() {
        let mut model = TreeModel::new();
        let src = model.add_directory(&root(), "src");
        model.add_file(&src, "a.c");
        model.add_directory(&src, "z");

        let html = render(&model, &src);
        let group = html.find("<li>z<ul>").unwrap();
        let file = html.find("a.c.html").unwrap();
        assert!(group < file, "{}", html);
        assert!(html.starts_with("<li>src<ul>"), "{}", html);
    }

    #[test]
    fn test_render_empty_directory_group() {
        let mut model = TreeModel::new();
        model.add_directory(&root(), "empty");
        assert_eq!("<li>empty<ul></ul></li>", render(&model, &root()));
    }

    #[test]
    fn test_render_missing_key() {
        let model = TreeModel::new();
        assert_eq!("", render(&model, &root().join("nope")));
    }

    #[test]
    fn test_render_escapes_names() {
        let mut model = TreeModel::new();
        let dir = model.add_directory(&root(), "a&b");
        model.add_file(&dir, "x\"y.h");

        assert_eq!(
            format!(
                "<li>a&amp;b<ul>{}</ul></li>",
                item("a&amp;b/x%22y.h.html", "x&quot;y.h")
            ),
            render(&model, &root()),
        );
    }

    #[test]
    fn test_page_url() {
        assert_eq!("a.cpp.html", page_url(&root(), "a.cpp"));
        assert_eq!(
            "src/net/b.h.html",
            page_url(&root().join("src").join("net"), "b.h")
        );
    }

    #[test]
    fn test_page_url_encodes_segments() {
        assert_eq!("we%23ird%2520.c.html", page_url(&root(), "we#ird%20.c"));
        assert_eq!(
            "a%3Fb/c%20d.h.html",
            page_url(&root().join("a?b"), "c d.h")
        );
    }

    #[test]
    fn test_render_labels_keep_bare_names() {
        let mut model = TreeModel::new();
        model.add_file(&root(), "we#ird%20.c");

        assert_eq!(
            format!(
                "<li>Root<ul>{}</ul></li>",
                item("we%23ird%2520.c.html", "we#ird%20.c")
            ),
            render(&model, &root()),
        );
    }
}
