/// Read-only snapshot of the loader for the platform layer and tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoaderView {
    pub active_fragment: Option<String>,
    pub active_document: Option<String>,
    pub loading: bool,
    pub cached_fragments: usize,
    pub requests_in_flight: usize,
    pub dirty: bool,
}
