use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use loader_core::{
    update, ClickedLink, FragmentPayload, LoadFailure, LoadFailureKind, LoaderState, LoaderView,
    Msg, RequestId,
};
use loader_engine::{parse_selector, EngineEvent, EngineHandle, NodeId, Page, WidgetRegistry};
use loader_logging::{loader_debug, loader_info, loader_trace, loader_warn};
use log::LevelFilter;
use url::Url;

use super::bindings::PageBindings;
use super::config::LoaderConfig;
use super::effects::EffectRunner;
use super::history::HistoryRecord;
use super::logging::{self, LogDestination};
use super::session::SessionScript;

const FADE_TRANSITION: &str = "ajax-fade-transition";
const OPEN_DROPDOWN: &str = "current-dropdown";
/// Upper bound on waiting for one service response while settling.
const RESPONSE_WAIT: Duration = Duration::from_secs(30);

pub fn run_app() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [config_path, session_path] = args.as_slice() else {
        bail!("usage: page_loader <config.ron> <session.ron>");
    };

    let level = std::env::var("PAGE_LOADER_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    logging::initialize(LogDestination::File, level);

    let config = LoaderConfig::load(Path::new(config_path))?;
    let script = SessionScript::load(Path::new(session_path))?;
    let html = std::fs::read_to_string(&script.page)
        .with_context(|| format!("reading page {}", script.page.display()))?;
    let location = Url::parse(&script.location)
        .with_context(|| format!("invalid location '{}'", script.location))?;

    let mut session = PageSession::new(&config, &html, location)?;
    session.on_content_loaded(|payload| {
        println!("loaded #{}", payload.fragment_path);
    });
    for step in &script.steps {
        step.apply(&mut session)?;
    }
    session.settle();

    loader_info!(
        "Session finished at {} ({:?}) with {} history entries: {:?}",
        session.location(),
        session.page().title(),
        session.history_len(),
        session.view()
    );
    println!("{}", session.content_html());
    Ok(())
}

/// What happened to a simulated click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A content widget consumed the click.
    Widget,
    /// The loader suppressed the default action.
    Intercepted,
    /// Default action followed an in-document hash.
    Anchor(String),
    /// Default action would leave the document.
    Navigated(String),
    /// Not a link.
    Ignored,
}

/// One loaded document with the loader attached: the page, the core state and
/// everything effects act on.
pub struct PageSession {
    state: Option<LoaderState>,
    page: Page,
    runner: EffectRunner,
    response_wait: Duration,
}

impl PageSession {
    pub fn new(config: &LoaderConfig, html: &str, location: Url) -> anyhow::Result<Self> {
        Self::start(config, html, location, EngineHandle::new(config.client_settings()))
    }

    /// Attaches the loader with a caller-supplied content client instead of the HTTP one.
    #[cfg(test)]
    pub fn with_client(
        config: &LoaderConfig,
        html: &str,
        location: Url,
        client: std::sync::Arc<dyn loader_engine::ContentClient>,
    ) -> anyhow::Result<Self> {
        Self::start(config, html, location, EngineHandle::with_client(client))
    }

    fn start(
        config: &LoaderConfig,
        html: &str,
        location: Url,
        engine: EngineHandle,
    ) -> anyhow::Result<Self> {
        let mut page = Page::parse(html);
        let bindings = PageBindings::capture(&page, &config.selectors)?;
        page.add_class(bindings.content, FADE_TRANSITION);

        let menu_links = bindings.menu_links(&page);
        loader_info!(
            "Loader attached at {} with {} menu link(s)",
            location,
            menu_links.len()
        );
        let hash = location.fragment().map(|fragment| format!("#{fragment}"));
        let state = LoaderState::new(config.settings(), location.clone(), menu_links);
        let widgets = WidgetRegistry::new(config.widget_labels(), config.lazy_images);

        let mut session = Self {
            state: Some(state),
            page,
            runner: EffectRunner::new(engine, bindings, widgets, location),
            response_wait: RESPONSE_WAIT,
        };
        session.dispatch(Msg::PageReady { hash });
        Ok(session)
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let Some(state) = self.state.take() else {
            loader_warn!("Dropping message while no state is attached");
            return;
        };
        loader_trace!("Dispatch {:?}", msg);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            loader_debug!("State changed: {:?}", state.view());
        }
        self.state = Some(state);
        self.runner.run(&mut self.page, effects);

        if let Some(location) = self.runner.take_location_change() {
            self.dispatch(Msg::LocationChanged(location));
        }
    }

    /// Clicks the first element matching `selector`.
    pub fn click(&mut self, selector: &str) -> anyhow::Result<ClickOutcome> {
        let target = self.find(selector)?;
        Ok(self.click_node(target))
    }

    /// Widgets see the click first; an anchor they consume never reaches the loader.
    pub fn click_node(&mut self, target: NodeId) -> ClickOutcome {
        if self.runner.widgets.handle_click(&mut self.page, target) {
            return ClickOutcome::Widget;
        }
        let Some(link) = self.page.closest(target, &self.runner.bindings.link) else {
            return ClickOutcome::Ignored;
        };
        let Some(href) = self.page.attr(link, "href").map(str::to_string) else {
            return ClickOutcome::Ignored;
        };

        let zone = self.runner.bindings.zone(&self.page, link);
        self.dispatch(Msg::LinkClicked(ClickedLink::new(href.clone(), zone)));
        if self.runner.take_default_prevented() {
            return ClickOutcome::Intercepted;
        }
        self.follow_default(&href)
    }

    fn follow_default(&mut self, href: &str) -> ClickOutcome {
        let location = self.runner.history.location().clone();
        let Ok(target) = location.join(href) else {
            loader_warn!("Unresolvable link '{}'", href);
            return ClickOutcome::Ignored;
        };
        let same_document = target.origin() == location.origin()
            && target.path() == location.path()
            && target.query() == location.query();

        match target.fragment() {
            Some(fragment) if same_document => {
                let hash = format!("#{fragment}");
                self.set_hash(&hash);
                ClickOutcome::Anchor(hash)
            }
            _ => {
                loader_info!("Link leaves the document: {}", target);
                ClickOutcome::Navigated(target.to_string())
            }
        }
    }

    /// Changes the location hash the way an address-bar edit or anchor does.
    pub fn set_hash(&mut self, hash: &str) {
        let hash = if hash.starts_with('#') {
            hash.to_string()
        } else {
            format!("#{hash}")
        };
        if self.runner.history.current().hash().as_deref() == Some(hash.as_str()) {
            return;
        }
        let location = self.runner.history.push(None, None, &hash).clone();
        self.dispatch(Msg::LocationChanged(location));
        self.dispatch(Msg::HashChanged { hash });
    }

    pub fn back(&mut self) -> bool {
        let before = self.runner.history.current().hash();
        match self.runner.history.back().cloned() {
            Some(record) => {
                self.traverse(record, before);
                true
            }
            None => false,
        }
    }

    pub fn forward(&mut self) -> bool {
        let before = self.runner.history.current().hash();
        match self.runner.history.forward().cloned() {
            Some(record) => {
                self.traverse(record, before);
                true
            }
            None => false,
        }
    }

    /// Browsers fire popstate first, then hashchange when the fragment differs.
    fn traverse(&mut self, record: HistoryRecord, before: Option<String>) {
        if let Some(title) = record.title.as_deref() {
            self.page.set_title(title);
        }
        let hash = record.hash();
        self.dispatch(Msg::LocationChanged(record.url.clone()));
        self.dispatch(Msg::PopState {
            entry: record.state,
            hash: hash.clone(),
        });
        if hash != before {
            if let Some(hash) = hash {
                self.dispatch(Msg::HashChanged { hash });
            }
        }
    }

    /// Pointer enters a submenu item; the theme opens its dropdown.
    pub fn hover(&mut self, selector: &str) -> anyhow::Result<()> {
        let target = self.find(selector)?;
        if let Some(item) = self.runner.bindings.submenu_for(&self.page, target) {
            if let Some(binding) = self.runner.bindings.submenu(item) {
                self.page.add_class(binding.item, OPEN_DROPDOWN);
            }
            self.dispatch(Msg::PointerEntered { item });
        }
        Ok(())
    }

    pub fn leave(&mut self, selector: &str) -> anyhow::Result<()> {
        let target = self.find(selector)?;
        if let Some(item) = self.runner.bindings.submenu_for(&self.page, target) {
            let open = self.runner.bindings.submenu(item).is_some_and(|binding| {
                ["current-dropdown", "active", "open"]
                    .iter()
                    .any(|class| self.page.has_class(binding.item, class))
            });
            self.dispatch(Msg::PointerLeft { item, open });
        }
        Ok(())
    }

    /// Advances the virtual clock, firing due timers and delivering any responses already in.
    pub fn advance(&mut self, by: Duration) {
        let until = self.runner.timers.now() + by;
        loop {
            self.pump_engine();
            match self.runner.timers.pop_due(until) {
                Some(timer) => self.dispatch(Msg::TimerElapsed(timer)),
                None => break,
            }
        }
        self.runner.timers.advance_to(until);
        self.pump_engine();
    }

    /// Blocks until every outstanding request has answered. Timers do not fire.
    ///
    /// A request still silent after the response wait fails as a transport error.
    pub fn await_responses(&mut self) {
        self.pump_engine();
        while !self.runner.outstanding.is_empty() {
            match self.runner.engine.recv_timeout(self.response_wait) {
                Some(event) => self.handle_engine_event(event),
                None => self.abandon_outstanding(),
            }
        }
    }

    fn abandon_outstanding(&mut self) {
        let abandoned: Vec<(RequestId, String)> = self.runner.outstanding.drain().collect();
        for (request, fragment_path) in abandoned {
            loader_warn!(
                "Gave up waiting on request {} for '{}' after {:?}",
                request,
                fragment_path,
                self.response_wait
            );
            self.dispatch(Msg::FetchCompleted {
                request,
                result: Err(LoadFailure::new(LoadFailureKind::Transport)),
            });
        }
    }

    /// Shortens how long `await_responses` waits on a silent service.
    #[cfg(test)]
    fn set_response_wait(&mut self, wait: Duration) {
        self.response_wait = wait;
    }

    /// Runs until no timer or request is left.
    pub fn settle(&mut self) {
        loop {
            self.await_responses();
            match self.runner.timers.pop_next() {
                Some(timer) => self.dispatch(Msg::TimerElapsed(timer)),
                None => break,
            }
        }
    }

    fn pump_engine(&mut self) {
        while let Some(event) = self.runner.engine.try_recv() {
            self.handle_engine_event(event);
        }
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::FetchCompleted { request_id, result } => {
                self.runner.outstanding.remove(&request_id);
                self.dispatch(Msg::FetchCompleted {
                    request: request_id,
                    result,
                });
            }
        }
    }

    /// Re-reads the menu's hash links after the menu markup changed.
    pub fn refresh_menu_links(&mut self) {
        let links = self.runner.bindings.menu_links(&self.page);
        self.dispatch(Msg::MenuLinksChanged(links));
    }

    /// Appends a hash link to the menu's first list, as a late-running script would.
    pub fn add_menu_link(&mut self, href: &str, label: &str) -> anyhow::Result<()> {
        let menu = self.runner.bindings.menu;
        let target = self
            .page
            .select_within(menu, &parse_selector("ul")?)
            .into_iter()
            .next()
            .unwrap_or(menu);
        let link = self
            .page
            .append_html(target, "<li><a></a></li>")
            .into_iter()
            .find_map(|item| self.page.child_elements(item).into_iter().next())
            .context("menu item markup produced no link")?;
        self.page.set_attr(link, "href", href);
        self.page.set_text(link, label);
        self.refresh_menu_links();
        Ok(())
    }

    pub fn on_content_loaded(&mut self, listener: impl FnMut(&FragmentPayload) + 'static) {
        self.runner.add_listener(Box::new(listener));
    }

    pub fn content_html(&self) -> String {
        self.page.inner_html(self.runner.bindings.content)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn view(&self) -> LoaderView {
        self.state.as_ref().map(LoaderState::view).unwrap_or_default()
    }

    pub fn location(&self) -> &Url {
        self.runner.history.location()
    }

    pub fn history_len(&self) -> usize {
        self.runner.history.len()
    }

    #[cfg(test)]
    fn content(&self) -> NodeId {
        self.runner.bindings.content
    }

    fn find(&self, selector: &str) -> anyhow::Result<NodeId> {
        self.page
            .select_first(&parse_selector(selector)?)
            .with_context(|| format!("nothing matches '{selector}'"))
    }
}
