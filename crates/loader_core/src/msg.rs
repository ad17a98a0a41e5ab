use url::Url;

use crate::{ClickedLink, FragmentPayload, HistoryEntry, LoadFailure, MenuItemId, MenuLink, RequestId, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Document finished loading; `hash` is the location hash at that moment.
    PageReady { hash: Option<String> },
    /// Delegated click on an anchor.
    LinkClicked(ClickedLink),
    /// Location hash changed without a document navigation.
    HashChanged { hash: String },
    /// Back/forward traversal. `hash` is the location hash after the traversal.
    PopState {
        entry: Option<HistoryEntry>,
        hash: Option<String>,
    },
    /// The document location changed (path or hash).
    LocationChanged(Url),
    /// Menu links were added or removed after start-up.
    MenuLinksChanged(Vec<MenuLink>),
    /// The content service answered (or failed) for a request.
    FetchCompleted {
        request: RequestId,
        result: Result<FragmentPayload, LoadFailure>,
    },
    /// A timer scheduled through `Effect::StartTimer` fired.
    TimerElapsed(Timer),
    /// Pointer entered a menu item that owns a submenu.
    PointerEntered { item: MenuItemId },
    /// Pointer left a menu item; `open` tells whether its submenu was showing.
    PointerLeft { item: MenuItemId, open: bool },
    /// Fallback for placeholder wiring.
    NoOp,
}
