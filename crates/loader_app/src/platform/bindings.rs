use anyhow::Context;
use loader_core::{LinkZone, MenuItemId, MenuLink};
use loader_engine::{parse_selector, NodeId, Page, Selector};
use loader_logging::{loader_info, loader_warn};

use super::config::SelectorConfig;

const SUBMENU_ITEMS: &str = "li.menu-item-has-children, li.has-dropdown";
const SUBMENUS: &str = "ul.sub-menu, .nav-dropdown, ul.children";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmenuBinding {
    pub item: NodeId,
    pub submenu: NodeId,
}

/// Element handles captured once at start-up. Injected content never changes them.
#[derive(Debug, Clone)]
pub struct PageBindings {
    pub menu: NodeId,
    pub content: NodeId,
    pub hero: Option<NodeId>,
    pub submenus: Vec<SubmenuBinding>,
    pub hero_title: Selector,
    pub hero_image: Selector,
    pub link: Selector,
}

impl PageBindings {
    /// Locates the menu, then the content and hero regions. The menu's
    /// `data-content-selector` / `data-hero-selector` override the configured selectors.
    pub fn capture(page: &Page, selectors: &SelectorConfig) -> anyhow::Result<Self> {
        let menu = page
            .select_first(&parse_selector(&selectors.menu)?)
            .with_context(|| format!("no menu element matches '{}'", selectors.menu))?;

        let content_selector = override_attr(page, menu, "data-content-selector")
            .unwrap_or_else(|| selectors.content.clone());
        let content = page
            .select_first(&parse_selector(&content_selector)?)
            .with_context(|| format!("no content region matches '{content_selector}'"))?;

        let hero_selector = override_attr(page, menu, "data-hero-selector")
            .unwrap_or_else(|| selectors.hero.clone());
        let hero = page.select_first(&parse_selector(&hero_selector)?);
        if hero.is_none() {
            loader_warn!("No hero matches '{}'; image and title updates disabled", hero_selector);
        }

        let item_selector = parse_selector(SUBMENU_ITEMS)?;
        let submenu_selector = parse_selector(SUBMENUS)?;
        let submenus: Vec<SubmenuBinding> = page
            .select_within(menu, &item_selector)
            .into_iter()
            .filter_map(|item| {
                let submenu = page.select_within(item, &submenu_selector).into_iter().next()?;
                Some(SubmenuBinding { item, submenu })
            })
            .collect();

        loader_info!(
            "Bound menu, content '{}' and {} submenu(s)",
            content_selector,
            submenus.len()
        );
        Ok(Self {
            menu,
            content,
            hero,
            submenus,
            hero_title: parse_selector(&selectors.hero_title)?,
            hero_image: parse_selector("img")?,
            link: parse_selector("a")?,
        })
    }

    /// Hash links currently in the menu, with their trimmed labels.
    pub fn menu_links(&self, page: &Page) -> Vec<MenuLink> {
        page.select_within(self.menu, &self.link)
            .into_iter()
            .filter_map(|link| {
                let href = page.attr(link, "href")?;
                href.starts_with('#')
                    .then(|| MenuLink::new(href, page.text(link).trim()))
            })
            .collect()
    }

    /// Menu membership wins when a link sits in both regions.
    pub fn zone(&self, page: &Page, link: NodeId) -> LinkZone {
        if page.contains(self.menu, link) {
            LinkZone::Menu
        } else if page.contains(self.content, link) {
            LinkZone::Content
        } else {
            LinkZone::Outside
        }
    }

    /// Innermost submenu-owning item that contains `target`.
    pub fn submenu_for(&self, page: &Page, target: NodeId) -> Option<MenuItemId> {
        self.submenus
            .iter()
            .rposition(|binding| page.contains(binding.item, target))
    }

    pub fn submenu(&self, item: MenuItemId) -> Option<SubmenuBinding> {
        self.submenus.get(item).copied()
    }
}

fn override_attr(page: &Page, menu: NodeId, name: &str) -> Option<String> {
    page.attr(menu, name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
