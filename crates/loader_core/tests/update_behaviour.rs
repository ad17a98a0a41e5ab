use std::sync::Once;
use std::time::Duration;

use loader_core::{
    update, ClickedLink, Effect, FetchRequest, FragmentKey, FragmentPayload, LinkZone,
    LoadFailure, LoadFailureKind, LoaderSettings, LoaderState, MenuLink, Msg, Timer,
};
use url::Url;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(loader_logging::initialize_for_tests);
}

fn new_state() -> LoaderState {
    LoaderState::new(
        LoaderSettings::default(),
        Url::parse("https://example.edu/programs/").unwrap(),
        vec![
            MenuLink::new("#undergrad", "Undergraduate"),
            MenuLink::new("#graduate", "Graduate"),
            MenuLink::new("#bad path", "Broken"),
        ],
    )
}

fn click_menu(state: LoaderState, href: &str) -> (LoaderState, Vec<Effect>) {
    update(
        state,
        Msg::LinkClicked(ClickedLink::new(href, LinkZone::Menu)),
    )
}

fn swap_timer(effects: &[Effect]) -> Option<Timer> {
    effects.iter().find_map(|effect| match effect {
        Effect::StartTimer {
            timer: timer @ Timer::SwapContent(_),
            ..
        } => Some(*timer),
        _ => None,
    })
}

fn fetch_request(effects: &[Effect]) -> Option<FetchRequest> {
    effects.iter().find_map(|effect| match effect {
        Effect::Fetch(request) => Some(request.clone()),
        _ => None,
    })
}

fn applied(effects: &[Effect]) -> Option<&FragmentPayload> {
    effects.iter().find_map(|effect| match effect {
        Effect::ApplyPayload(payload) => Some(payload),
        _ => None,
    })
}

fn history_pushes(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::PushHistory { .. }))
        .count()
}

fn payload(path: &str, content: &str) -> FragmentPayload {
    FragmentPayload::new(path, content)
}

/// Click a menu link, let the fade-out elapse and return the dispatched fetch.
fn click_and_fetch(state: LoaderState, href: &str) -> (LoaderState, FetchRequest) {
    let (state, effects) = click_menu(state, href);
    let timer = swap_timer(&effects).expect("swap timer");
    let (state, effects) = update(state, Msg::TimerElapsed(timer));
    let request = fetch_request(&effects).expect("fetch effect");
    (state, request)
}

fn complete(state: LoaderState, request: &FetchRequest, content: &str) -> (LoaderState, Vec<Effect>) {
    update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Ok(payload(&request.fragment_path, content)),
        },
    )
}

#[test]
fn menu_click_fades_out_then_fetches() {
    init_logging();
    let (mut state, effects) = click_menu(new_state(), "#undergrad");

    assert_eq!(
        effects,
        vec![
            Effect::PreventDefault,
            Effect::HighlightMenuLink {
                fragment_path: Some("undergrad".to_string())
            },
            Effect::FadeOut,
            Effect::StartTimer {
                timer: Timer::SwapContent(1),
                after: Duration::from_millis(300),
            },
        ]
    );
    let view = state.view();
    assert!(view.loading);
    assert_eq!(view.active_fragment.as_deref(), Some("undergrad"));
    assert_eq!(view.active_document.as_deref(), Some("/programs/"));
    assert!(state.consume_dirty());

    let (state, effects) = update(state, Msg::TimerElapsed(Timer::SwapContent(1)));
    assert_eq!(
        effects,
        vec![
            Effect::ShowLoading {
                message: "Loading...".to_string()
            },
            Effect::Fetch(FetchRequest {
                request: 1,
                fragment_path: "undergrad".to_string(),
                document_path: "/programs/".to_string(),
            }),
        ]
    );
    assert_eq!(state.view().requests_in_flight, 1);
}

#[test]
fn successful_fetch_applies_caches_and_records_history() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    let (state, effects) = complete(state, &request, "<p>Undergraduate programs</p>");

    assert_eq!(
        applied(&effects).map(|p| p.content.as_str()),
        Some("<p>Undergraduate programs</p>")
    );
    assert!(effects.contains(&Effect::FadeIn));
    assert!(effects.contains(&Effect::StartTimer {
        timer: Timer::ReinitWidgets(request.request),
        after: Duration::from_millis(100),
    }));
    assert!(effects.contains(&Effect::PushHistory {
        entry: loader_core::HistoryEntry::new("undergrad"),
        title: Some("Undergraduate".to_string()),
        url: "/programs/#undergrad".to_string(),
    }));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::ContentLoaded(p) if p.fragment_path == "undergrad")));

    let view = state.view();
    assert!(!view.loading);
    assert_eq!(view.cached_fragments, 1);
    assert_eq!(view.requests_in_flight, 0);
}

#[test]
fn payload_title_wins_over_menu_label() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#graduate");
    let mut result = payload("graduate", "<p>g</p>");
    result.title = Some("Graduate Studies".to_string());
    let (_state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Ok(result),
        },
    );

    let title = effects.iter().find_map(|effect| match effect {
        Effect::PushHistory { title, .. } => title.clone(),
        _ => None,
    });
    assert_eq!(title.as_deref(), Some("Graduate Studies"));
}

#[test]
fn repeat_click_on_active_fragment_is_noop() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    let (state, _effects) = complete(state, &request, "<p>u</p>");
    let before = state.view();

    let (state, effects) = click_menu(state, "#undergrad");

    // Still intercepted, but nothing else happens.
    assert_eq!(effects, vec![Effect::PreventDefault]);
    assert_eq!(state.view(), before);
}

#[test]
fn clicks_while_loading_are_ignored() {
    init_logging();
    let (state, _effects) = click_menu(new_state(), "#undergrad");
    let (state, effects) = click_menu(state, "#graduate");

    assert_eq!(effects, vec![Effect::PreventDefault]);
    assert_eq!(state.view().active_fragment.as_deref(), Some("undergrad"));
}

#[test]
fn cache_is_keyed_by_document_path() {
    init_logging();
    let doc_a = Url::parse("https://example.edu/undergrad/").unwrap();
    let doc_b = Url::parse("https://example.edu/graduate/").unwrap();

    let (state, _) = update(new_state(), Msg::LocationChanged(doc_a.clone()));
    let (state, request_a) = click_and_fetch(state, "#arts");
    assert_eq!(request_a.document_path, "/undergrad/");
    let (state, _) = complete(state, &request_a, "<p>undergrad arts</p>");

    let (state, _) = update(state, Msg::LocationChanged(doc_b));
    let (state, request_b) = click_and_fetch(state, "#arts");
    assert_eq!(request_b.document_path, "/graduate/");
    let (state, _) = complete(state, &request_b, "<p>graduate arts</p>");
    assert_eq!(state.view().cached_fragments, 2);

    // Back under A: served from cache, no network.
    let (state, _) = update(state, Msg::LocationChanged(doc_a));
    let (state, effects) = click_menu(state, "#arts");
    let timer = swap_timer(&effects).expect("swap timer");
    let (state, effects) = update(state, Msg::TimerElapsed(timer));

    assert!(fetch_request(&effects).is_none());
    assert_eq!(
        applied(&effects).map(|p| p.content.as_str()),
        Some("<p>undergrad arts</p>")
    );
    assert_eq!(history_pushes(&effects), 1);
    assert!(!state.view().loading);
}

#[test]
fn superseded_response_is_cached_but_not_applied() {
    init_logging();
    let (state, first) = click_and_fetch(new_state(), "#undergrad");
    let (state, _) = complete(state, &first, "<p>u</p>");

    // p1 = graduate goes in flight.
    let (state, p1) = click_and_fetch(state, "#graduate");

    // Back to undergrad supersedes it.
    let (state, effects) = update(
        state,
        Msg::PopState {
            entry: Some(loader_core::HistoryEntry::new("undergrad")),
            hash: Some("#undergrad".to_string()),
        },
    );
    let timer = swap_timer(&effects).expect("replay swap timer");
    assert_eq!(state.view().active_fragment.as_deref(), Some("undergrad"));

    // p1's late answer must not touch the page.
    let (state, effects) = complete(state, &p1, "<p>graduate</p>");
    assert!(applied(&effects).is_none());
    assert!(!effects.iter().any(|e| matches!(e, Effect::ShowError { .. })));
    assert_eq!(history_pushes(&effects), 1);
    assert!(state.view().loading, "replay still owns the loading flag");
    assert!(state
        .cache()
        .contains(&FragmentKey::new("/programs/", "graduate")));

    // The replay finishes from cache.
    let (state, effects) = update(state, Msg::TimerElapsed(timer));
    assert_eq!(applied(&effects).map(|p| p.content.as_str()), Some("<p>u</p>"));
    assert_eq!(history_pushes(&effects), 0);

    // A later direct request for p1 is a cache hit.
    let (state, effects) = click_menu(state, "#graduate");
    let timer = swap_timer(&effects).expect("swap timer");
    let (_state, effects) = update(state, Msg::TimerElapsed(timer));
    assert!(fetch_request(&effects).is_none());
    assert_eq!(
        applied(&effects).map(|p| p.content.as_str()),
        Some("<p>graduate</p>")
    );
}

fn history_urls(effects: &[Effect]) -> Vec<(loader_core::HistoryEntry, String)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::PushHistory { entry, url, .. } => Some((entry.clone(), url.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn history_records_the_requested_path_not_the_resolved_one() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    // The service resolved the fragment through its full page path.
    let (state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Ok(payload("programs/undergrad", "<p>u</p>")),
        },
    );
    assert_eq!(
        history_urls(&effects),
        vec![(
            loader_core::HistoryEntry::new("undergrad"),
            "/programs/#undergrad".to_string()
        )]
    );

    // A superseded answer records its own request too.
    let (state, p1) = click_and_fetch(state, "#graduate");
    let (state, _) = update(
        state,
        Msg::PopState {
            entry: Some(loader_core::HistoryEntry::new("undergrad")),
            hash: Some("#undergrad".to_string()),
        },
    );
    let (_state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: p1.request,
            result: Ok(payload("programs/graduate", "<p>g</p>")),
        },
    );
    assert!(applied(&effects).is_none());
    assert_eq!(
        history_urls(&effects),
        vec![(
            loader_core::HistoryEntry::new("graduate"),
            "/programs/#graduate".to_string()
        )]
    );
}

#[test]
fn superseded_failure_records_history_without_touching_the_page() {
    init_logging();
    let (state, first) = click_and_fetch(new_state(), "#undergrad");
    let (state, _) = complete(state, &first, "<p>u</p>");
    let (state, p1) = click_and_fetch(state, "#graduate");
    let (state, _) = update(
        state,
        Msg::PopState {
            entry: Some(loader_core::HistoryEntry::new("undergrad")),
            hash: Some("#undergrad".to_string()),
        },
    );

    let (_state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: p1.request,
            result: Err(LoadFailure::new(LoadFailureKind::Transport)),
        },
    );
    assert!(!effects.iter().any(|e| matches!(
        e,
        Effect::ShowError { .. } | Effect::FadeIn | Effect::ApplyPayload(_)
    )));
    assert_eq!(
        history_urls(&effects),
        vec![(
            loader_core::HistoryEntry::new("graduate"),
            "/programs/#graduate".to_string()
        )]
    );
}

#[test]
fn transport_error_releases_loading_flag() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    let (state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Err(LoadFailure::with_message(
                LoadFailureKind::Transport,
                "connection reset",
            )),
        },
    );

    assert!(effects.contains(&Effect::ShowError {
        message: "Something went wrong. Please try again later.".to_string()
    }));
    assert!(effects.contains(&Effect::FadeIn));
    assert!(!state.view().loading);
    assert_eq!(state.view().cached_fragments, 0);

    // Next load goes through normally.
    let (state, effects) = click_menu(state, "#graduate");
    assert!(swap_timer(&effects).is_some());
    assert_eq!(state.view().active_fragment.as_deref(), Some("graduate"));
}

#[test]
fn not_found_shows_service_message_and_allows_retry() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    let (state, effects) = update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Err(LoadFailure::with_message(
                LoadFailureKind::NotFound,
                "Content not found.",
            )),
        },
    );
    assert!(effects.contains(&Effect::ShowError {
        message: "Content not found.".to_string()
    }));
    assert_eq!(history_pushes(&effects), 1);
    assert!(state.view().active_fragment.is_none());

    let (_state, effects) = click_menu(state, "#undergrad");
    assert!(swap_timer(&effects).is_some(), "failed fragment can be retried");
}

#[test]
fn empty_content_is_an_error_and_not_cached() {
    init_logging();
    let (state, request) = click_and_fetch(new_state(), "#undergrad");
    let (state, effects) = complete(state, &request, "   ");

    assert!(effects.contains(&Effect::ShowError {
        message: "Something went wrong. Please try again later.".to_string()
    }));
    assert_eq!(state.view().cached_fragments, 0);
    assert!(!state.view().loading);
}

#[test]
fn malformed_menu_fragment_fails_without_fetch() {
    init_logging();
    let (state, effects) = click_menu(new_state(), "#bad path");
    let timer = swap_timer(&effects).expect("menu links skip the grammar check");
    let (state, effects) = update(state, Msg::TimerElapsed(timer));

    assert!(fetch_request(&effects).is_none());
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::ShowError { .. })));
    assert!(!state.view().loading);
}

#[test]
fn unknown_request_completion_is_ignored() {
    init_logging();
    let state = new_state();
    let (next, effects) = update(
        state.clone(),
        Msg::FetchCompleted {
            request: 42,
            result: Ok(payload("x", "<p>x</p>")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn fade_in_and_reinit_timers_map_to_effects() {
    init_logging();
    let (state, effects) = update(new_state(), Msg::TimerElapsed(Timer::ClearFadeIn(9)));
    assert_eq!(effects, vec![Effect::ClearFadeIn]);
    let (_state, effects) = update(state, Msg::TimerElapsed(Timer::ReinitWidgets(9)));
    assert_eq!(effects, vec![Effect::ReinitWidgets]);
}

#[test]
fn submenu_closes_after_pointer_leaves() {
    init_logging();
    let (state, effects) = update(new_state(), Msg::PointerLeft { item: 0, open: true });
    assert_eq!(
        effects,
        vec![Effect::StartTimer {
            timer: Timer::CloseSubmenu(0),
            after: Duration::from_millis(1800),
        }]
    );
    let (_state, effects) = update(state, Msg::TimerElapsed(Timer::CloseSubmenu(0)));
    assert_eq!(effects, vec![Effect::CloseSubmenu { item: 0 }]);
}
