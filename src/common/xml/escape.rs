use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Built once, shared by every serializer in the crate
static XML_ESCAPER: Lazy<Option<AhoCorasick>> =
    Lazy::new(|| AhoCorasick::builder().build(["&", "<", ">", "\""]).ok());

/// Escape a string for use in XML text or a double-quoted attribute value.
///
/// # Examples
///
/// ```
/// use litchi_pptx::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<r:id=\"rId1\">"), "&lt;r:id=&quot;rId1&quot;&gt;");
/// assert_eq!(escape_xml("it's"), "it's");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    match XML_ESCAPER.as_ref() {
        Some(ac) => ac.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;"]),
        None => s
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;"),
    }
}
