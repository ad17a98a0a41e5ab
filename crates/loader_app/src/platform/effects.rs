use std::collections::HashMap;

use loader_core::{Effect, FetchRequest, FragmentPayload, MenuItemId, RequestId};
use loader_engine::{decode_entities, ContentRequest, EngineHandle, Page, WidgetRegistry};
use loader_logging::{loader_debug, loader_info, loader_warn};
use url::Url;

use super::bindings::PageBindings;
use super::history::BrowserHistory;
use super::timers::TimerQueue;

const FADE_OUT: &str = "ajax-fade-out";
const HERO_FADE_OUT: &str = "ajax-hero-fade-out";
const FADE_IN: &str = "ajax-fade-in";
const HERO_FADE_IN: &str = "ajax-hero-fade-in";
const OPEN_ITEM_CLASSES: [&str; 4] = ["current-dropdown", "active", "open", "is-open"];
const OPEN_SUBMENU_CLASSES: [&str; 3] = ["open", "active", "is-open"];

pub type ContentListener = Box<dyn FnMut(&FragmentPayload)>;

/// Applies core effects to the page and owns the engine, timers and history they drive.
pub struct EffectRunner {
    pub(super) engine: EngineHandle,
    pub(super) bindings: PageBindings,
    pub(super) widgets: WidgetRegistry,
    pub(super) timers: TimerQueue,
    pub(super) history: BrowserHistory,
    /// Requests sent to the engine and not yet answered, with their fragment path.
    pub(super) outstanding: HashMap<RequestId, String>,
    listeners: Vec<ContentListener>,
    default_prevented: bool,
    location_changed: Option<Url>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        bindings: PageBindings,
        widgets: WidgetRegistry,
        location: Url,
    ) -> Self {
        Self {
            engine,
            bindings,
            widgets,
            timers: TimerQueue::default(),
            history: BrowserHistory::new(location),
            outstanding: HashMap::new(),
            listeners: Vec::new(),
            default_prevented: false,
            location_changed: None,
        }
    }

    pub fn add_listener(&mut self, listener: ContentListener) {
        self.listeners.push(listener);
    }

    /// Whether the last batch asked to suppress the click's default action. Resets the flag.
    pub fn take_default_prevented(&mut self) -> bool {
        std::mem::take(&mut self.default_prevented)
    }

    /// New location if the last batch pushed history.
    pub fn take_location_change(&mut self) -> Option<Url> {
        self.location_changed.take()
    }

    pub fn run(&mut self, page: &mut Page, effects: Vec<Effect>) {
        for effect in effects {
            self.apply(page, effect);
        }
    }

    fn apply(&mut self, page: &mut Page, effect: Effect) {
        match effect {
            Effect::PreventDefault => self.default_prevented = true,
            Effect::HighlightMenuLink { fragment_path } => {
                self.highlight(page, fragment_path.as_deref());
            }
            Effect::FadeOut => {
                page.add_class(self.bindings.content, FADE_OUT);
                if let Some(hero) = self.bindings.hero {
                    page.add_class(hero, HERO_FADE_OUT);
                }
            }
            Effect::ShowLoading { message } => {
                let content = self.bindings.content;
                page.set_inner_html(
                    content,
                    &format!(
                        r#"<div class="loading-content"><i class="icon-spinner"></i> {}</div>"#,
                        message
                    ),
                );
                page.remove_class(content, FADE_OUT);
                page.add_class(content, FADE_IN);
            }
            Effect::Fetch(request) => self.fetch(request),
            Effect::ApplyPayload(payload) => self.apply_payload(page, &payload),
            Effect::ShowError { message } => {
                page.set_inner_html(
                    self.bindings.content,
                    &format!(r#"<div class="error-content">{}</div>"#, message),
                );
            }
            Effect::FadeIn => {
                let content = self.bindings.content;
                page.remove_class(content, FADE_OUT);
                page.add_class(content, FADE_IN);
                if let Some(hero) = self.bindings.hero {
                    page.remove_class(hero, HERO_FADE_OUT);
                    page.add_class(hero, HERO_FADE_IN);
                }
            }
            Effect::ClearFadeIn => {
                page.remove_class(self.bindings.content, FADE_IN);
                if let Some(hero) = self.bindings.hero {
                    page.remove_class(hero, HERO_FADE_IN);
                }
            }
            Effect::ClearContent => page.clear_children(self.bindings.content),
            Effect::ReinitWidgets => {
                let summary = self.widgets.reinitialize(page, self.bindings.content);
                loader_debug!("Widgets reinitialized: {:?}", summary);
            }
            Effect::PushHistory { entry, title, url } => {
                let title = title.map(|title| decode_entities(&title));
                if let Some(title) = title.as_deref() {
                    page.set_title(title);
                }
                let location = self.history.push(Some(entry), title, &url).clone();
                loader_info!("History push {}", location);
                self.location_changed = Some(location);
            }
            Effect::ContentLoaded(payload) => {
                for listener in &mut self.listeners {
                    listener(&payload);
                }
            }
            Effect::StartTimer { timer, after } => self.timers.schedule(timer, after),
            Effect::CancelTimer { timer } => {
                self.timers.cancel(timer);
            }
            Effect::CloseSubmenu { item } => self.close_submenu(page, item),
        }
    }

    fn highlight(&self, page: &mut Page, fragment_path: Option<&str>) {
        let target = fragment_path.map(|path| format!("#{path}"));
        for link in page.select_within(self.bindings.menu, &self.bindings.link) {
            let is_target = target.is_some() && page.attr(link, "href") == target.as_deref();
            if is_target {
                page.add_class(link, "active");
            } else {
                page.remove_class(link, "active");
            }
        }
    }

    fn fetch(&mut self, request: FetchRequest) {
        loader_info!(
            "Fetch request {} for '{}' from {}",
            request.request,
            request.fragment_path,
            request.document_path
        );
        self.engine.request(
            request.request,
            ContentRequest::new(request.fragment_path.clone(), request.document_path),
        );
        self.outstanding
            .insert(request.request, request.fragment_path);
    }

    fn apply_payload(&self, page: &mut Page, payload: &FragmentPayload) {
        page.set_inner_html(self.bindings.content, &payload.content);
        let Some(hero) = self.bindings.hero else {
            return;
        };

        let image_url = payload
            .featured_image_url
            .as_deref()
            .filter(|url| !url.is_empty());
        if let Some(url) = image_url {
            match page.select_within(hero, &self.bindings.hero_image).first() {
                Some(&img) => {
                    page.set_attr(img, "src", url);
                    for attr in ["srcset", "data-src"] {
                        if page.attr(img, attr).is_some() {
                            page.set_attr(img, attr, url);
                        }
                    }
                }
                None => loader_warn!("Hero has no image to update"),
            }
        }

        let title = payload.title.as_deref().filter(|title| !title.is_empty());
        if let Some(title) = title {
            if let Some(&heading) = page.select_within(hero, &self.bindings.hero_title).first() {
                page.set_inner_html(heading, &decode_entities(title));
            }
        }
    }

    fn close_submenu(&self, page: &mut Page, item: MenuItemId) {
        let Some(binding) = self.bindings.submenu(item) else {
            loader_warn!("Close requested for unknown submenu {}", item);
            return;
        };
        for class in OPEN_ITEM_CLASSES {
            page.remove_class(binding.item, class);
        }
        for class in OPEN_SUBMENU_CLASSES {
            page.remove_class(binding.submenu, class);
        }
        page.set_display(binding.submenu, None);
        loader_debug!("Submenu {} closed", item);
    }
}
