use std::time::Duration;

/// Presentation timings and user-facing strings.
///
/// The delays stand in for CSS transition completion; nothing waits on
/// animation events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Fade-out window before the content region is swapped.
    pub fade_out_delay: Duration,
    /// How long the fade-in class stays on after injection.
    pub fade_in_duration: Duration,
    /// Delay between injection and widget reinitialization.
    pub reinit_delay: Duration,
    /// Pointer-leave grace period before an open submenu closes.
    pub submenu_close_delay: Duration,
    pub loading_text: String,
    pub error_text: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            fade_out_delay: Duration::from_millis(300),
            fade_in_duration: Duration::from_millis(400),
            reinit_delay: Duration::from_millis(100),
            submenu_close_delay: Duration::from_millis(1800),
            loading_text: "Loading...".to_string(),
            error_text: "Something went wrong. Please try again later.".to_string(),
        }
    }
}
