//! Page loader core: pure navigation state machine for in-place fragment loads.
mod cache;
mod classify;
mod effect;
mod history;
mod msg;
mod path;
mod settings;
mod state;
mod submenu;
mod update;
mod view_model;

pub use cache::{FragmentCache, FragmentPayload};
pub use classify::{classify, ClickedLink, Disposition, LinkZone};
pub use effect::{Effect, FetchRequest, Timer};
pub use history::{fragment_url, HistoryEntry, MenuLink};
pub use msg::Msg;
pub use path::{is_valid_fragment_path, lookup_order, strip_hash, FragmentKey, LookupCandidate};
pub use settings::LoaderSettings;
pub use state::{
    LoadFailure, LoadFailureKind, LoaderState, MenuItemId, NavigationState, RequestId,
};
pub use update::update;
pub use view_model::LoaderView;
