use loader_core::HistoryEntry;
use url::Url;

/// One session-history entry: location, optional pushed state and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub url: Url,
    pub state: Option<HistoryEntry>,
    pub title: Option<String>,
}

impl HistoryRecord {
    /// Location hash including `#`, or `None` when the URL has no fragment.
    pub fn hash(&self) -> Option<String> {
        self.url.fragment().map(|fragment| format!("#{fragment}"))
    }
}

/// Joint session history of the simulated tab.
#[derive(Debug, Clone)]
pub struct BrowserHistory {
    entries: Vec<HistoryRecord>,
    index: usize,
}

impl BrowserHistory {
    pub fn new(location: Url) -> Self {
        Self {
            entries: vec![HistoryRecord {
                url: location,
                state: None,
                title: None,
            }],
            index: 0,
        }
    }

    pub fn current(&self) -> &HistoryRecord {
        &self.entries[self.index]
    }

    pub fn location(&self) -> &Url {
        &self.current().url
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Adds an entry after the current one, dropping any forward entries.
    /// `url` is resolved against the current location.
    pub fn push(&mut self, state: Option<HistoryEntry>, title: Option<String>, url: &str) -> &Url {
        let url = self
            .location()
            .join(url)
            .unwrap_or_else(|_| self.location().clone());
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryRecord { url, state, title });
        self.index = self.entries.len() - 1;
        self.location()
    }

    pub fn back(&mut self) -> Option<&HistoryRecord> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&HistoryRecord> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}
