use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use loader_logging::loader_info;
use serde::Deserialize;

use super::app::{ClickOutcome, PageSession};

/// A scripted browsing session replayed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionScript {
    /// HTML document to load, relative to the script file.
    pub page: PathBuf,
    /// Initial location, e.g. `https://example.edu/programs/#undergrad`.
    pub location: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum Step {
    /// Click the first element matching the selector.
    Click(String),
    Back,
    Forward,
    SetHash(String),
    Hover(String),
    Leave(String),
    /// Append a hash link to the menu after start-up.
    AddMenuLink { href: String, label: String },
    /// Advance the virtual clock by this many milliseconds.
    Wait(u64),
    /// Run until no timer or request is outstanding.
    Settle,
    /// Print the content region.
    Dump,
}

impl SessionScript {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading session {}", path.display()))?;
        let mut script: Self = ron::from_str(&content)
            .with_context(|| format!("parsing session {}", path.display()))?;
        if script.page.is_relative() {
            if let Some(dir) = path.parent() {
                script.page = dir.join(&script.page);
            }
        }
        Ok(script)
    }
}

impl Step {
    pub fn apply(&self, session: &mut PageSession) -> anyhow::Result<()> {
        match self {
            Step::Click(selector) => {
                let outcome = session.click(selector)?;
                loader_info!("Click {} -> {:?}", selector, outcome);
                if let ClickOutcome::Navigated(url) = outcome {
                    println!("navigated away: {url}");
                }
            }
            Step::Back => {
                if !session.back() {
                    loader_info!("Back: already at the first entry");
                }
            }
            Step::Forward => {
                if !session.forward() {
                    loader_info!("Forward: already at the last entry");
                }
            }
            Step::SetHash(hash) => session.set_hash(hash),
            Step::Hover(selector) => session.hover(selector)?,
            Step::Leave(selector) => session.leave(selector)?,
            Step::AddMenuLink { href, label } => session.add_menu_link(href, label)?,
            Step::Wait(ms) => session.advance(Duration::from_millis(*ms)),
            Step::Settle => session.settle(),
            Step::Dump => {
                loader_info!("Dump: {:?}", session.view());
                println!("{}", session.content_html());
            }
        }
        Ok(())
    }
}
