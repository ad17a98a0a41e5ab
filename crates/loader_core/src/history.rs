/// Browser history state recorded for a fragment load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    pub fragment_path: String,
}

impl HistoryEntry {
    pub fn new(fragment_path: impl Into<String>) -> Self {
        Self {
            fragment_path: fragment_path.into(),
        }
    }
}

/// A navigation-menu link the loader knows about, used for titles and hash lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub href: String,
    pub label: String,
}

impl MenuLink {
    pub fn new(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            label: label.into(),
        }
    }
}

/// `<document path>#<fragment path>`, the URL pushed for a fragment load.
pub fn fragment_url(document_path: &str, fragment_path: &str) -> String {
    format!("{document_path}#{fragment_path}")
}
