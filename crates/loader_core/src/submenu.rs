use std::collections::BTreeSet;
use std::time::Duration;

use crate::{Effect, MenuItemId, Timer};

/// Armed auto-close timers, at most one per menu item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct SubmenuTimers {
    armed: BTreeSet<MenuItemId>,
}

impl SubmenuTimers {
    pub(crate) fn pointer_left(&mut self, item: MenuItemId, open: bool, delay: Duration) -> Vec<Effect> {
        if !open {
            return Vec::new();
        }
        let timer = Timer::CloseSubmenu(item);
        let mut effects = Vec::with_capacity(2);
        if !self.armed.insert(item) {
            effects.push(Effect::CancelTimer { timer });
        }
        effects.push(Effect::StartTimer {
            timer,
            after: delay,
        });
        effects
    }

    pub(crate) fn pointer_entered(&mut self, item: MenuItemId) -> Vec<Effect> {
        if self.armed.remove(&item) {
            vec![Effect::CancelTimer {
                timer: Timer::CloseSubmenu(item),
            }]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn elapsed(&mut self, item: MenuItemId) -> Vec<Effect> {
        if self.armed.remove(&item) {
            vec![Effect::CloseSubmenu { item }]
        } else {
            Vec::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self, item: MenuItemId) -> bool {
        self.armed.contains(&item)
    }
}
