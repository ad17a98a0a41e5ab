use url::Url;

use crate::path::is_valid_fragment_path;

/// Which designated DOM zone a clicked link lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkZone {
    Menu,
    Content,
    Outside,
}

/// A clicked anchor as seen by the delegated click listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickedLink {
    /// Raw `href` attribute, unresolved.
    pub href: String,
    pub zone: LinkZone,
}

impl ClickedLink {
    pub fn new(href: impl Into<String>, zone: LinkZone) -> Self {
        Self {
            href: href.into(),
            zone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Intercept and load the fragment in place.
    LoadFragment(String),
    /// Same-document anchor that is not a fragment path; the browser scrolls to it.
    SamePageAnchor,
    /// Leave the click to the browser.
    Default,
}

impl Disposition {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Disposition::LoadFragment(_))
    }
}

/// Decides what a click on `link` means while the document is at `location`.
pub fn classify(link: &ClickedLink, location: &Url) -> Disposition {
    let href = link.href.as_str();
    if href.is_empty() {
        return Disposition::Default;
    }

    if link.zone == LinkZone::Menu && href.starts_with('#') && href.len() > 1 {
        return Disposition::LoadFragment(href[1..].to_string());
    }

    if link.zone != LinkZone::Content || !href.contains('#') {
        return Disposition::Default;
    }

    let Ok(target) = location.join(href) else {
        return Disposition::Default;
    };
    if target.origin() != location.origin() || target.path() != location.path() {
        return Disposition::Default;
    }

    match target.fragment() {
        Some(hash) if is_valid_fragment_path(hash) => Disposition::LoadFragment(hash.to_string()),
        Some(hash) if !hash.is_empty() => Disposition::SamePageAnchor,
        _ => Disposition::Default,
    }
}
