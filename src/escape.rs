//! Exports [`escape`], which makes arbitrary source text safe to embed in an
//! HTML document.

/// Replaces the five HTML-significant characters with their character
/// references: `&` becomes `&amp;`, `<` becomes `&lt;`, `>` becomes `&gt;`, `"`
/// becomes `&quot;` and `'` becomes `&#039;`. Nothing else is touched.
///
/// The input is scanned once, character by character, so an ampersand
/// introduced by one replacement is never escaped a second time.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

/// Like [`escape`] but appends to an existing buffer.
pub fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
}
