//! Page loader engine: content-service client, background fetch worker and the headless page.
mod engine;
mod fetch;
mod page;
mod types;
mod widgets;

pub use engine::EngineHandle;
pub use fetch::{parse_envelope, ContentClient, ReqwestContentClient};
pub use page::{decode_entities, parse_selector, Page, SelectorError};
pub use types::{ClientSettings, ContentError, ContentRequest, EngineEvent};
pub use widgets::{ReinitSummary, WidgetLabels, WidgetRegistry, EXPANDABLE_THRESHOLD};

pub use ego_tree::NodeId;
pub use scraper::Selector;
