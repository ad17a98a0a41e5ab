use std::sync::Once;

use loader_core::{
    update, ClickedLink, Effect, FetchRequest, FragmentPayload, HistoryEntry, LinkZone,
    LoaderSettings, LoaderState, MenuLink, Msg, Timer,
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
        ],
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

fn highlight(effects: &[Effect]) -> Option<Option<String>> {
    effects.iter().find_map(|effect| match effect {
        Effect::HighlightMenuLink { fragment_path } => Some(fragment_path.clone()),
        _ => None,
    })
}

fn pushes(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::PushHistory { url, .. } => Some(url.clone()),
            _ => None,
        })
        .collect()
}

/// Runs a full load of `fragment` through fetch and returns the final effects.
fn load_through_network(state: LoaderState, msg: Msg) -> (LoaderState, Vec<Effect>) {
    let (state, effects) = update(state, msg);
    let timer = swap_timer(&effects).expect("swap timer");
    let (state, effects) = update(state, Msg::TimerElapsed(timer));
    let Some(request) = fetch_request(&effects) else {
        return (state, effects);
    };
    let content = format!("<p>{}</p>", request.fragment_path);
    update(
        state,
        Msg::FetchCompleted {
            request: request.request,
            result: Ok(FragmentPayload::new(request.fragment_path, content)),
        },
    )
}

fn menu_click(href: &str) -> Msg {
    Msg::LinkClicked(ClickedLink::new(href, LinkZone::Menu))
}

fn pop(fragment: &str) -> Msg {
    Msg::PopState {
        entry: Some(HistoryEntry::new(fragment)),
        hash: Some(format!("#{fragment}")),
    }
}

#[test]
fn back_replays_from_cache_without_pushing_history() {
    init_logging();
    let (state, effects) = load_through_network(new_state(), menu_click("#undergrad"));
    assert_eq!(pushes(&effects), vec!["/programs/#undergrad".to_string()]);
    let (state, effects) = load_through_network(state, menu_click("#graduate"));
    assert_eq!(pushes(&effects), vec!["/programs/#graduate".to_string()]);

    let (state, effects) = update(state, pop("undergrad"));
    assert_eq!(highlight(&effects), Some(Some("undergrad".to_string())));
    let timer = swap_timer(&effects).expect("swap timer");
    let (state, effects) = update(state, Msg::TimerElapsed(timer));

    assert!(fetch_request(&effects).is_none());
    assert!(pushes(&effects).is_empty());
    assert!(effects.iter().any(
        |effect| matches!(effect, Effect::ApplyPayload(p) if p.content == "<p>undergrad</p>")
    ));
    assert_eq!(state.view().active_fragment.as_deref(), Some("undergrad"));
}

#[test]
fn replay_that_misses_the_cache_fetches_without_pushing() {
    init_logging();
    let (_state, effects) = load_through_network(new_state(), pop("graduate"));
    assert!(pushes(&effects).is_empty());
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::ApplyPayload(_))));
}

#[test]
fn pop_without_entry_returns_to_baseline() {
    init_logging();
    let (state, _) = load_through_network(new_state(), menu_click("#undergrad"));

    let (state, effects) = update(
        state,
        Msg::PopState {
            entry: None,
            hash: None,
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::ClearContent,
            Effect::HighlightMenuLink {
                fragment_path: None
            },
        ]
    );
    assert!(state.view().active_fragment.is_none());

    // The same link loads again afterwards.
    let (_state, effects) = update(state, menu_click("#undergrad"));
    assert!(swap_timer(&effects).is_some());
}

#[test]
fn pop_without_entry_cancels_a_fading_load() {
    init_logging();
    let (state, effects) = update(new_state(), menu_click("#undergrad"));
    let timer = swap_timer(&effects).expect("swap timer");

    let (state, effects) = update(
        state,
        Msg::PopState {
            entry: None,
            hash: None,
        },
    );
    assert_eq!(effects[0], Effect::CancelTimer { timer });
    assert!(!state.view().loading);

    // A late firing of the cancelled timer does nothing.
    let (_state, effects) = update(state, Msg::TimerElapsed(timer));
    assert!(effects.is_empty());
}

#[test]
fn pop_onto_plain_anchor_is_left_alone() {
    init_logging();
    let (state, _) = load_through_network(new_state(), menu_click("#undergrad"));
    let (state, effects) = update(
        state,
        Msg::PopState {
            entry: None,
            hash: Some("#section-2".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().active_fragment.as_deref(), Some("undergrad"));
}

#[test]
fn initial_hash_loads_on_page_ready() {
    init_logging();
    let (state, effects) = update(
        new_state(),
        Msg::PageReady {
            hash: Some("#undergrad/arts".to_string()),
        },
    );
    // Not intercepting a click, so no PreventDefault.
    assert!(!effects.contains(&Effect::PreventDefault));
    assert_eq!(highlight(&effects), Some(Some("undergrad/arts".to_string())));
    assert_eq!(state.view().active_fragment.as_deref(), Some("undergrad/arts"));
}

#[test]
fn initial_hash_outside_the_grammar_is_ignored() {
    init_logging();
    for hash in ["#", "#Top!", "#a//b"] {
        let (state, effects) = update(
            new_state(),
            Msg::PageReady {
                hash: Some(hash.to_string()),
            },
        );
        assert!(effects.is_empty(), "{hash} should not load");
        assert!(!state.view().loading);
    }
}

#[test]
fn hash_change_loads_unless_a_menu_link_owns_it() {
    init_logging();
    let (_state, effects) = update(
        new_state(),
        Msg::HashChanged {
            hash: "#undergrad".to_string(),
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = update(
        new_state(),
        Msg::HashChanged {
            hash: "#faculty/arts".to_string(),
        },
    );
    assert!(swap_timer(&effects).is_some());
    assert_eq!(state.view().active_fragment.as_deref(), Some("faculty/arts"));
}

#[test]
fn menu_links_update_changes_history_titles() {
    init_logging();
    let (state, _) = update(
        new_state(),
        Msg::MenuLinksChanged(vec![MenuLink::new("#research", "  Research  ")]),
    );
    assert!(state.has_menu_link("#research"));
    assert!(!state.has_menu_link("#undergrad"));

    let (_state, effects) = load_through_network(state, menu_click("#research"));
    let title = effects.iter().find_map(|effect| match effect {
        Effect::PushHistory { title, .. } => title.clone(),
        _ => None,
    });
    assert_eq!(title.as_deref(), Some("Research"));
}
