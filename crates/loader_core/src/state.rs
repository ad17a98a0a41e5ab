use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use crate::submenu::SubmenuTimers;
use crate::view_model::LoaderView;
use crate::{FragmentCache, FragmentKey, LoaderSettings, MenuLink};

pub type RequestId = u64;
pub type MenuItemId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailureKind {
    /// Malformed fragment path or missing validation token.
    Validation,
    /// Validation token refused by the service.
    Forbidden,
    NotFound,
    /// Service answered success without a content body.
    EmptyContent,
    /// Network failure or unusable response.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: LoadFailureKind,
    /// Human-readable message supplied by the service, if any.
    pub message: Option<String>,
}

impl LoadFailure {
    pub fn new(kind: LoadFailureKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: LoadFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{:?}: {message}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadStage {
    /// Waiting out the fade-out window.
    FadingOut,
    /// Request dispatched, awaiting the service.
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingLoad {
    pub(crate) request: RequestId,
    pub(crate) key: FragmentKey,
    pub(crate) replay: bool,
    pub(crate) stage: LoadStage,
}

/// Which fragment is shown, under which document, and whether a load is running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub(crate) active: Option<FragmentKey>,
    pub(crate) pending: Option<PendingLoad>,
}

impl NavigationState {
    pub fn active_fragment_path(&self) -> Option<&str> {
        self.active.as_ref().map(|key| key.fragment_path.as_str())
    }

    pub fn active_document_path(&self) -> Option<&str> {
        self.active.as_ref().map(|key| key.document_path.as_str())
    }

    pub fn active_key(&self) -> Option<&FragmentKey> {
        self.active.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub(crate) key: FragmentKey,
    pub(crate) replay: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderState {
    settings: LoaderSettings,
    location: Url,
    menu_links: Vec<MenuLink>,
    pub(crate) nav: NavigationState,
    pub(crate) cache: FragmentCache,
    pub(crate) in_flight: BTreeMap<RequestId, InFlight>,
    pub(crate) submenus: SubmenuTimers,
    next_request: RequestId,
    dirty: bool,
}

impl LoaderState {
    pub fn new(settings: LoaderSettings, location: Url, menu_links: Vec<MenuLink>) -> Self {
        Self {
            settings,
            location,
            menu_links,
            nav: NavigationState::default(),
            cache: FragmentCache::new(),
            in_flight: BTreeMap::new(),
            submenus: SubmenuTimers::default(),
            next_request: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> LoaderView {
        LoaderView {
            active_fragment: self.nav.active_fragment_path().map(ToOwned::to_owned),
            active_document: self.nav.active_document_path().map(ToOwned::to_owned),
            loading: self.nav.is_loading(),
            cached_fragments: self.cache.len(),
            requests_in_flight: self.in_flight.len(),
            dirty: self.dirty,
        }
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn document_path(&self) -> &str {
        self.location.path()
    }

    pub fn menu_links(&self) -> &[MenuLink] {
        &self.menu_links
    }

    /// Returns true if a menu link targets exactly `hash` (including the `#`).
    pub fn has_menu_link(&self, hash: &str) -> bool {
        self.menu_links.iter().any(|link| link.href == hash)
    }

    pub(crate) fn menu_label(&self, hash: &str) -> Option<String> {
        self.menu_links
            .iter()
            .find(|link| link.href == hash)
            .map(|link| link.label.trim().to_string())
            .filter(|label| !label.is_empty())
    }

    pub(crate) fn set_location(&mut self, location: Url) {
        self.location = location;
    }

    pub(crate) fn set_menu_links(&mut self, links: Vec<MenuLink>) {
        self.menu_links = links;
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the state changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
