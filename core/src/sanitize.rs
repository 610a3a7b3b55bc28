/// Strip markup from rich-text descriptions for display.
///
/// WooCommerce descriptions arrive as HTML fragments. Every tag is removed,
/// the handful of entities stores actually emit are decoded, and runs of
/// whitespace collapse to a single space so tag boundaries still separate
/// words.
#[must_use]
pub fn strip_markup(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // Tag boundaries act as word separators
                text.push(' ');
            }
            _ if in_tag => {}
            _ => text.push(c),
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the common HTML entities. `&amp;` goes last so double-encoded
/// input is not decoded twice.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}
