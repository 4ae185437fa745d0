//! Shared helpers for the quick-xml streaming parsers.

use quick_xml::events::BytesStart;

/// Local part of a qualified name, with any namespace prefix stripped.
pub(crate) fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|&b| b == b':') {
        Some(pos) => &qname[pos + 1..],
        None => qname,
    }
}

/// Attribute value by local name, ignoring any namespace prefix on the key.
pub(crate) fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == name.as_bytes() {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Qualified element name as a UTF-8 string.
pub(crate) fn qname(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}
