use std::collections::HashMap;
use std::sync::OnceLock;

use ego_tree::NodeId;
use loader_logging::{loader_debug, loader_warn};

use crate::{parse_selector, Page, Selector};

/// Groups with more items than this get a "show more" button.
pub const EXPANDABLE_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetLabels {
    pub expand: String,
    pub collapse: String,
}

impl Default for WidgetLabels {
    fn default() -> Self {
        Self {
            expand: "More questions".to_string(),
            collapse: "Show less".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetAction {
    ToggleAccordion { accordion: NodeId },
    SelectTab { group: NodeId },
    ToggleOverflow { hidden: NodeId },
}

/// What one reinitialization pass bound, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReinitSummary {
    pub accordion_titles: usize,
    pub tab_links: usize,
    pub expanded_groups: usize,
    pub lazy_images: usize,
}

struct Selectors {
    accordion: Selector,
    accordion_title: Selector,
    accordion_title_active: Selector,
    accordion_item: Selector,
    accordion_inner: Selector,
    tabbed_content: Selector,
    tab_link: Selector,
    tab_panel: Selector,
    lazy_image: Selector,
    expandable: Selector,
    load_more: Selector,
    button_label: Selector,
}

fn selectors() -> Option<&'static Selectors> {
    static SELECTORS: OnceLock<Option<Selectors>> = OnceLock::new();
    SELECTORS
        .get_or_init(|| {
            let parse = |s: &str| parse_selector(s).ok();
            Some(Selectors {
                accordion: parse(".accordion")?,
                accordion_title: parse(".accordion-title")?,
                accordion_title_active: parse(".accordion-title.active")?,
                accordion_item: parse(".accordion-item")?,
                accordion_inner: parse(".accordion-inner")?,
                tabbed_content: parse(".tabbed-content")?,
                tab_link: parse(".nav-tabs a")?,
                tab_panel: parse(".tab-panels .panel")?,
                lazy_image: parse("img[data-src]")?,
                expandable: parse(".expandable-accordion")?,
                load_more: parse(".load-more-accordion")?,
                button_label: parse(".button-label")?,
            })
        })
        .as_ref()
}

/// Click bindings for widgets inside injected content, keyed by element.
///
/// Binding the same element twice replaces the earlier binding.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    bindings: HashMap<NodeId, WidgetAction>,
    labels: WidgetLabels,
    lazy_images: bool,
}

impl WidgetRegistry {
    pub fn new(labels: WidgetLabels, lazy_images: bool) -> Self {
        Self {
            bindings: HashMap::new(),
            labels,
            lazy_images,
        }
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Rebinds every widget below `scope`.
    pub fn reinitialize(&mut self, page: &mut Page, scope: NodeId) -> ReinitSummary {
        let Some(sel) = selectors() else {
            loader_warn!("Widget selectors failed to parse; skipping reinit");
            return ReinitSummary::default();
        };
        let root = page.root();
        self.bindings.retain(|node, _| page.contains(root, *node));

        let mut summary = ReinitSummary::default();
        for accordion in page.select_within(scope, &sel.accordion) {
            for title in page.select_within(accordion, &sel.accordion_title) {
                self.bindings
                    .insert(title, WidgetAction::ToggleAccordion { accordion });
                summary.accordion_titles += 1;
            }
        }

        for group in page.select_within(scope, &sel.tabbed_content) {
            for link in page.select_within(group, &sel.tab_link) {
                self.bindings.insert(link, WidgetAction::SelectTab { group });
                summary.tab_links += 1;
            }
        }

        if self.lazy_images {
            for image in page.select_within(scope, &sel.lazy_image) {
                if let Some(source) = page.attr(image, "data-src").map(str::to_string) {
                    page.set_attr(image, "src", source);
                    summary.lazy_images += 1;
                }
            }
        }

        for group in page.select_within(scope, &sel.expandable) {
            if self.init_expandable(page, group, sel) {
                summary.expanded_groups += 1;
            }
        }

        loader_debug!("Widgets rebound: {:?}", summary);
        summary
    }

    fn init_expandable(&mut self, page: &mut Page, group: NodeId, sel: &Selectors) -> bool {
        if page.attr(group, "data-expandable-initialized").is_some() {
            return false;
        }
        let items: Vec<NodeId> = page
            .child_elements(group)
            .into_iter()
            .filter(|child| page.matches(*child, &sel.accordion_item))
            .collect();
        if items.len() <= EXPANDABLE_THRESHOLD {
            return false;
        }

        let Some(hidden) = page.wrap_all(
            &items[EXPANDABLE_THRESHOLD..],
            r#"<div class="hidden-accordion-items" style="display: none;"></div>"#,
        ) else {
            return false;
        };
        let inserted = page.insert_html_after(
            group,
            r#"<div class="wrapper-button"><button class="load-more-accordion"><span class="icon-plus"></span><span class="button-label"></span></button></div>"#,
        );
        for wrapper in inserted {
            for button in page.select_within(wrapper, &sel.load_more) {
                for label in page.select_within(button, &sel.button_label) {
                    page.set_text(label, &self.labels.expand);
                }
                self.bindings
                    .insert(button, WidgetAction::ToggleOverflow { hidden });
            }
        }
        page.set_attr(group, "data-expandable-initialized", "true");
        true
    }

    /// Runs the handler bound to `target` or its nearest bound ancestor.
    /// Returns false when nothing is bound along that path.
    pub fn handle_click(&self, page: &mut Page, target: NodeId) -> bool {
        let Some(sel) = selectors() else {
            return false;
        };
        let bound = page.node(target).and_then(|node| {
            std::iter::once(node)
                .chain(node.ancestors())
                .find_map(|node| self.bindings.get(&node.id()).map(|a| (node.id(), *a)))
        });
        let Some((element, action)) = bound else {
            return false;
        };

        match action {
            WidgetAction::ToggleAccordion { accordion } => {
                toggle_accordion(page, sel, accordion, element)
            }
            WidgetAction::SelectTab { group } => select_tab(page, sel, group, element),
            WidgetAction::ToggleOverflow { hidden } => {
                let open = page.toggle_class(element, "active");
                let text = if open {
                    &self.labels.collapse
                } else {
                    &self.labels.expand
                };
                for label in page.select_within(element, &sel.button_label) {
                    page.set_text(label, text);
                }
                let display = if page.is_hidden(hidden) { "block" } else { "none" };
                page.set_display(hidden, Some(display));
            }
        }
        true
    }
}

fn accordion_panels(page: &Page, sel: &Selectors, title: NodeId) -> Vec<NodeId> {
    page.parent_element(title)
        .filter(|item| page.matches(*item, &sel.accordion_item))
        .map(|item| page.select_within(item, &sel.accordion_inner))
        .unwrap_or_default()
}

fn toggle_accordion(page: &mut Page, sel: &Selectors, accordion: NodeId, title: NodeId) {
    if page.has_class(title, "active") {
        page.remove_class(title, "active");
        for panel in accordion_panels(page, sel, title) {
            page.set_display(panel, Some("none"));
        }
        return;
    }

    if !page.has_class(accordion, "accordion-multiple") {
        for open in page.select_within(accordion, &sel.accordion_title_active) {
            page.remove_class(open, "active");
            for panel in accordion_panels(page, sel, open) {
                page.set_display(panel, Some("none"));
            }
        }
    }
    page.add_class(title, "active");
    for panel in accordion_panels(page, sel, title) {
        page.set_display(panel, Some("block"));
    }
}

fn select_tab(page: &mut Page, sel: &Selectors, group: NodeId, link: NodeId) {
    if let Some(tab) = page.parent_element(link) {
        page.add_class(tab, "active");
        if let Some(list) = page.parent_element(tab) {
            for sibling in page.child_elements(list) {
                if sibling != tab {
                    page.remove_class(sibling, "active");
                }
            }
        }
    }

    for panel in page.select_within(group, &sel.tab_panel) {
        page.remove_class(panel, "active");
    }
    let Some(target) = page.attr(link, "href").map(str::to_string) else {
        return;
    };
    match parse_selector(&target) {
        Ok(target) => {
            for panel in page.select_within(group, &target) {
                page.add_class(panel, "active");
            }
        }
        Err(err) => loader_warn!("Tab link target is not usable: {}", err),
    }
}
