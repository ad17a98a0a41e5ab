use crate::history::fragment_url;
use crate::path::{is_valid_fragment_path, strip_hash};
use crate::state::{InFlight, LoadStage, PendingLoad};
use crate::{
    classify, Disposition, Effect, FetchRequest, FragmentKey, FragmentPayload, HistoryEntry,
    LoadFailure, LoadFailureKind, LoaderState, Msg, RequestId, Timer,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: LoaderState, msg: Msg) -> (LoaderState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageReady { hash } => match hash {
            Some(hash) => initial_hash(&mut state, &hash),
            None => Vec::new(),
        },
        Msg::LinkClicked(link) => match classify(&link, state.location()) {
            Disposition::LoadFragment(fragment_path) => {
                let mut effects = vec![Effect::PreventDefault];
                effects.extend(start_load(&mut state, fragment_path, false));
                effects
            }
            Disposition::SamePageAnchor | Disposition::Default => Vec::new(),
        },
        Msg::HashChanged { hash } => hash_changed(&mut state, &hash),
        Msg::PopState { entry, hash } => match entry {
            Some(entry) => start_load(&mut state, entry.fragment_path, true),
            None => pop_to_baseline(&mut state, hash.as_deref()),
        },
        Msg::LocationChanged(location) => {
            state.set_location(location);
            Vec::new()
        }
        Msg::MenuLinksChanged(links) => {
            state.set_menu_links(links);
            Vec::new()
        }
        Msg::FetchCompleted { request, result } => fetch_completed(&mut state, request, result),
        Msg::TimerElapsed(timer) => timer_elapsed(&mut state, timer),
        Msg::PointerEntered { item } => state.submenus.pointer_entered(item),
        Msg::PointerLeft { item, open } => {
            let delay = state.settings().submenu_close_delay;
            state.submenus.pointer_left(item, open, delay)
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn initial_hash(state: &mut LoaderState, hash: &str) -> Vec<Effect> {
    let Some(fragment_path) = strip_hash(hash) else {
        return Vec::new();
    };
    if state.has_menu_link(hash) || is_valid_fragment_path(fragment_path) {
        start_load(state, fragment_path.to_string(), false)
    } else {
        Vec::new()
    }
}

fn hash_changed(state: &mut LoaderState, hash: &str) -> Vec<Effect> {
    let Some(fragment_path) = strip_hash(hash) else {
        return Vec::new();
    };
    // Menu clicks were already intercepted; don't handle them twice.
    if state.has_menu_link(hash) || !is_valid_fragment_path(fragment_path) {
        return Vec::new();
    }
    start_load(state, fragment_path.to_string(), false)
}

fn pop_to_baseline(state: &mut LoaderState, hash: Option<&str>) -> Vec<Effect> {
    // A plain in-page anchor left a hash behind; that is not ours to undo.
    if let Some(hash) = hash.filter(|h| strip_hash(h).is_some()) {
        if !state.has_menu_link(hash) {
            return Vec::new();
        }
    }

    let mut effects = Vec::new();
    if let Some(pending) = state.nav.pending.take() {
        if pending.stage == LoadStage::FadingOut {
            effects.push(Effect::CancelTimer {
                timer: Timer::SwapContent(pending.request),
            });
        }
    }
    state.nav.active = None;
    state.mark_dirty();
    effects.push(Effect::ClearContent);
    effects.push(Effect::HighlightMenuLink {
        fragment_path: None,
    });
    effects
}

fn start_load(state: &mut LoaderState, fragment_path: String, replay: bool) -> Vec<Effect> {
    let key = FragmentKey::new(state.document_path(), fragment_path.as_str());
    if state.nav.active.as_ref() == Some(&key) {
        return Vec::new();
    }

    let mut effects = Vec::new();
    if state.nav.is_loading() {
        // Back/forward cannot be refused; it supersedes the running load.
        if !replay {
            return Vec::new();
        }
        if let Some(superseded) = state.nav.pending.take() {
            if superseded.stage == LoadStage::FadingOut {
                effects.push(Effect::CancelTimer {
                    timer: Timer::SwapContent(superseded.request),
                });
            }
        }
    }

    let request = state.next_request_id();
    state.nav.active = Some(key.clone());
    state.nav.pending = Some(PendingLoad {
        request,
        key,
        replay,
        stage: LoadStage::FadingOut,
    });
    state.mark_dirty();

    effects.push(Effect::HighlightMenuLink {
        fragment_path: Some(fragment_path),
    });
    effects.push(Effect::FadeOut);
    effects.push(Effect::StartTimer {
        timer: Timer::SwapContent(request),
        after: state.settings().fade_out_delay,
    });
    effects
}

fn timer_elapsed(state: &mut LoaderState, timer: Timer) -> Vec<Effect> {
    match timer {
        Timer::SwapContent(request) => swap_content(state, request),
        Timer::ClearFadeIn(_) => vec![Effect::ClearFadeIn],
        Timer::ReinitWidgets(_) => vec![Effect::ReinitWidgets],
        Timer::CloseSubmenu(item) => state.submenus.elapsed(item),
    }
}

fn swap_content(state: &mut LoaderState, request: RequestId) -> Vec<Effect> {
    let Some(pending) = state.nav.pending.clone() else {
        return Vec::new();
    };
    if pending.request != request || pending.stage != LoadStage::FadingOut {
        return Vec::new();
    }

    if let Some(payload) = state.cache.get(&pending.key).cloned() {
        state.nav.pending = None;
        state.mark_dirty();
        return present(state, request, &pending.key, payload, !pending.replay);
    }

    if !is_valid_fragment_path(&pending.key.fragment_path) {
        state.nav.pending = None;
        let failure = LoadFailure::new(LoadFailureKind::Validation);
        return fail(state, request, &pending.key, pending.replay, &failure, true);
    }

    if let Some(pending) = state.nav.pending.as_mut() {
        pending.stage = LoadStage::Fetching;
    }
    state.in_flight.insert(
        request,
        InFlight {
            key: pending.key.clone(),
            replay: pending.replay,
        },
    );
    vec![
        Effect::ShowLoading {
            message: state.settings().loading_text.clone(),
        },
        Effect::Fetch(FetchRequest {
            request,
            fragment_path: pending.key.fragment_path,
            document_path: pending.key.document_path,
        }),
    ]
}

fn fetch_completed(
    state: &mut LoaderState,
    request: RequestId,
    result: Result<FragmentPayload, LoadFailure>,
) -> Vec<Effect> {
    let Some(flight) = state.in_flight.remove(&request) else {
        return Vec::new();
    };
    if state
        .nav
        .pending
        .as_ref()
        .is_some_and(|pending| pending.request == request)
    {
        state.nav.pending = None;
    }
    state.mark_dirty();

    let is_current = state.nav.active.as_ref() == Some(&flight.key);
    match result {
        Ok(payload) if payload.has_content() => {
            state.cache.insert(flight.key.clone(), payload.clone());
            if is_current {
                present(state, request, &flight.key, payload, !flight.replay)
            } else if flight.replay {
                Vec::new()
            } else {
                vec![push_history(
                    state,
                    &flight.key.fragment_path,
                    payload.title.as_deref(),
                )]
            }
        }
        Ok(_) => {
            let failure = LoadFailure::new(LoadFailureKind::EmptyContent);
            fail(state, request, &flight.key, flight.replay, &failure, is_current)
        }
        Err(failure) => fail(state, request, &flight.key, flight.replay, &failure, is_current),
    }
}

/// Effects that put `payload` on screen, shared by cache hits and fresh fetches.
/// History records the requested `key`, whatever path the payload reports.
fn present(
    state: &LoaderState,
    request: RequestId,
    key: &FragmentKey,
    payload: FragmentPayload,
    record_history: bool,
) -> Vec<Effect> {
    let settings = state.settings();
    let mut effects = vec![
        Effect::ApplyPayload(payload.clone()),
        Effect::FadeIn,
        Effect::StartTimer {
            timer: Timer::ClearFadeIn(request),
            after: settings.fade_in_duration,
        },
    ];
    if record_history {
        effects.push(push_history(
            state,
            &key.fragment_path,
            payload.title.as_deref(),
        ));
    }
    effects.push(Effect::StartTimer {
        timer: Timer::ReinitWidgets(request),
        after: settings.reinit_delay,
    });
    effects.push(Effect::ContentLoaded(payload));
    effects
}

fn fail(
    state: &mut LoaderState,
    request: RequestId,
    key: &FragmentKey,
    replay: bool,
    failure: &LoadFailure,
    is_current: bool,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    if is_current {
        // Keep the highlight but let the same link retry.
        state.nav.active = None;
        state.mark_dirty();
        effects.push(Effect::ShowError {
            message: failure_message(state, failure),
        });
        effects.push(Effect::FadeIn);
        effects.push(Effect::StartTimer {
            timer: Timer::ClearFadeIn(request),
            after: state.settings().fade_in_duration,
        });
    }
    if !replay {
        effects.push(push_history(state, &key.fragment_path, None));
    }
    effects
}

fn failure_message(state: &LoaderState, failure: &LoadFailure) -> String {
    let generic = &state.settings().error_text;
    match failure.kind {
        LoadFailureKind::Transport | LoadFailureKind::EmptyContent => generic.clone(),
        LoadFailureKind::Validation | LoadFailureKind::Forbidden | LoadFailureKind::NotFound => {
            failure
                .message
                .clone()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| generic.clone())
        }
    }
}

fn push_history(state: &LoaderState, fragment_path: &str, title: Option<&str>) -> Effect {
    let hash = format!("#{fragment_path}");
    let title = title
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| state.menu_label(&hash));
    Effect::PushHistory {
        entry: HistoryEntry::new(fragment_path),
        title,
        url: fragment_url(state.document_path(), fragment_path),
    }
}
