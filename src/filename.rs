//! # Filename mapping
//!
//! `filename(k) = urlEncode(k) + ".json"`. Percent-encoding (via the
//! `urlencoding` crate) covers the spec's unreserved-set contract and
//! already encodes the filesystem-hostile bytes it calls out by name
//! (`/`, `\`, `:`, `?`, `*`, `<`, `>`, `|`, space, control bytes,
//! non-ASCII) because none of them is in the unreserved set
//! `[A-Za-z0-9.\-_~]`. The mapping is deterministic and losslessly
//! invertible via [`parse_filename`].

pub const DOCUMENT_EXTENSION: &str = ".json";

/// Compute the on-disk filename for a primary key.
pub fn filename(key: &str) -> String {
    format!("{}{DOCUMENT_EXTENSION}", urlencoding::encode(key))
}

/// Recover the primary key from a filename previously produced by
/// [`filename`]. Returns `None` if the name doesn't end with
/// [`DOCUMENT_EXTENSION`] or the stem isn't valid percent-encoding.
pub fn parse_filename(name: &str) -> Option<String> {
    let stem = name.strip_suffix(DOCUMENT_EXTENSION)?;
    urlencoding::decode(stem).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_key_round_trips() {
        let name = filename("u1");
        assert_eq!(name, "u1.json");
        assert_eq!(parse_filename(&name).as_deref(), Some("u1"));
    }

    #[test]
    fn path_separators_are_encoded_out_of_the_filename() {
        // Scenario 5: "user/admin/123" -> "user%2Fadmin%2F123.json"
        let name = filename("user/admin/123");
        assert_eq!(name, "user%2Fadmin%2F123.json");
        assert!(!name.contains('/'));
        assert_eq!(parse_filename(&name).as_deref(), Some("user/admin/123"));
    }

    #[test]
    fn non_ascii_and_control_bytes_round_trip() {
        let key = "caf\u{e9}\u{0}\\:*?<>|";
        let name = filename(key);
        for forbidden in ['/', '\\', ':', '*', '?', '<', '>', '|', ' '] {
            assert!(!name[..name.len() - DOCUMENT_EXTENSION.len()].contains(forbidden));
        }
        assert_eq!(parse_filename(&name).as_deref(), Some(key));
    }

    #[test]
    fn non_matching_extension_is_rejected() {
        assert_eq!(parse_filename("u1.txt"), None);
    }
}
