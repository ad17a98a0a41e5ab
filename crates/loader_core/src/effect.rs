use std::time::Duration;

use crate::{FragmentPayload, HistoryEntry, MenuItemId, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Suppress the browser's default action for the current click.
    PreventDefault,
    /// Mark the menu link targeting `#fragment_path` active, clear all others.
    HighlightMenuLink { fragment_path: Option<String> },
    /// Add the fading-out classes to the content region and hero.
    FadeOut,
    /// Replace the content region with the loading indicator.
    ShowLoading { message: String },
    /// Ask the content service for a fragment.
    Fetch(FetchRequest),
    /// Inject content and update hero image/title.
    ApplyPayload(FragmentPayload),
    /// Replace the content region with an inline error message.
    ShowError { message: String },
    /// Swap fading-out for fading-in on the content region and hero.
    FadeIn,
    /// Drop the fading-in class once the fade-in window has passed.
    ClearFadeIn,
    /// Empty the content region (history went back before the first fragment).
    ClearContent,
    /// Rebind widgets inside the content region.
    ReinitWidgets,
    PushHistory {
        entry: HistoryEntry,
        title: Option<String>,
        url: String,
    },
    /// Notify external listeners that a payload was applied.
    ContentLoaded(FragmentPayload),
    StartTimer { timer: Timer, after: Duration },
    CancelTimer { timer: Timer },
    /// Close an open submenu and its item.
    CloseSubmenu { item: MenuItemId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub request: RequestId,
    pub fragment_path: String,
    pub document_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timer {
    /// Fade-out window ended; swap in cached content or start the fetch.
    SwapContent(RequestId),
    ClearFadeIn(RequestId),
    ReinitWidgets(RequestId),
    CloseSubmenu(MenuItemId),
}
