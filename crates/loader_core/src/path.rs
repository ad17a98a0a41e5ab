/// Returns true for one or more `[A-Za-z0-9-]+` groups joined by single slashes.
///
/// Leading, trailing or doubled slashes and any other character are rejected.
pub fn is_valid_fragment_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

/// Strips the leading `#` of a location hash. `None` for `""` and `"#"`.
pub fn strip_hash(hash: &str) -> Option<&str> {
    hash.strip_prefix('#').filter(|rest| !rest.is_empty())
}

/// Cache key: the document a fragment was requested from plus the fragment itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentKey {
    pub document_path: String,
    pub fragment_path: String,
}

impl FragmentKey {
    pub fn new(document_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            document_path: document_path.into(),
            fragment_path: fragment_path.into(),
        }
    }
}

/// One lookup the content service should attempt, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCandidate {
    /// `<document path>/<fragment path>`, disambiguates same-named children.
    Nested(String),
    /// The fragment path on its own.
    Path(String),
    /// Bare last segment across generic content types.
    Slug(String),
}

/// Resolution order the content service is expected to follow.
///
/// The slug search is only offered when the request carried no document path
/// at all; otherwise `a/same-name` and `b/same-name` could collide.
pub fn lookup_order(fragment_path: &str, document_path: &str) -> Vec<LookupCandidate> {
    let mut candidates = Vec::with_capacity(3);
    let parent = document_path.trim_matches('/');
    if !parent.is_empty() {
        candidates.push(LookupCandidate::Nested(format!("{parent}/{fragment_path}")));
    }
    candidates.push(LookupCandidate::Path(fragment_path.to_string()));
    if document_path.is_empty() {
        let slug = fragment_path.rsplit('/').next().unwrap_or(fragment_path);
        candidates.push(LookupCandidate::Slug(slug.to_string()));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_accepts_nested_segments() {
        assert!(is_valid_fragment_path("undergrad"));
        assert!(is_valid_fragment_path("Undergrad/Fine-Arts-2"));
        assert!(is_valid_fragment_path("a/b/c"));
    }

    #[test]
    fn grammar_rejects_empty_segments_and_foreign_chars() {
        for path in ["", "/a", "a/", "a//b", "a b", "a_b", "a.b", "a?b", "ngh\u{1ec7}-thu\u{1ead}t"] {
            assert!(!is_valid_fragment_path(path), "{path:?} should be rejected");
        }
    }

    #[test]
    fn strip_hash_requires_content() {
        assert_eq!(strip_hash("#a/b"), Some("a/b"));
        assert_eq!(strip_hash("#"), None);
        assert_eq!(strip_hash(""), None);
        assert_eq!(strip_hash("a"), None);
    }

    #[test]
    fn lookup_prefers_nested_path() {
        assert_eq!(
            lookup_order("fine-arts", "/undergrad/"),
            vec![
                LookupCandidate::Nested("undergrad/fine-arts".into()),
                LookupCandidate::Path("fine-arts".into()),
            ]
        );
    }

    #[test]
    fn slug_fallback_only_without_document_path() {
        assert_eq!(
            lookup_order("undergrad/fine-arts", ""),
            vec![
                LookupCandidate::Path("undergrad/fine-arts".into()),
                LookupCandidate::Slug("fine-arts".into()),
            ]
        );
        assert_eq!(
            lookup_order("fine-arts", "/"),
            vec![LookupCandidate::Path("fine-arts".into())]
        );
    }
}
