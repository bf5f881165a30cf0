// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::Cell;
use std::rc::Rc;

/// Scroll state of the host page. Clones share the same suspension count.
#[derive(Debug, Clone, Default)]
pub struct PageScroll {
    holds: Rc<Cell<usize>>,
}

impl PageScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suspended(&self) -> bool {
        self.holds.get() > 0
    }

    /// Suspends page scrolling until the returned guard is dropped.
    pub fn suspend(&self) -> ScrollSuspension {
        self.holds.set(self.holds.get().saturating_add(1));
        ScrollSuspension {
            holds: Rc::clone(&self.holds),
        }
    }
}

#[derive(Debug)]
pub struct ScrollSuspension {
    holds: Rc<Cell<usize>>,
}

impl Drop for ScrollSuspension {
    fn drop(&mut self) {
        self.holds.set(self.holds.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::PageScroll;

    #[test]
    fn suspension_releases_on_drop() {
        let scroll = PageScroll::new();
        assert!(!scroll.is_suspended());

        let guard = scroll.suspend();
        assert!(scroll.is_suspended());

        drop(guard);
        assert!(!scroll.is_suspended());
    }

    #[test]
    fn nested_suspensions_release_independently() {
        let scroll = PageScroll::new();
        let first = scroll.suspend();
        let second = scroll.clone().suspend();

        drop(first);
        assert!(scroll.is_suspended());
        drop(second);
        assert!(!scroll.is_suspended());
    }
}
