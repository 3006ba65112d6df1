//! Per-document page cache

use crate::page::Page;

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Empty,
    /// A render has been requested and not yet delivered
    Pending,
    Ready(Box<Page>),
}

/// Rendered pages of the open document, indexed by 1-based page number.
#[derive(Debug, Clone)]
pub struct PageCache {
    slots: Vec<Slot>,
}

impl PageCache {
    pub fn new(page_count: u32) -> Self {
        Self {
            slots: vec![Slot::Empty; page_count as usize],
        }
    }

    pub fn page_count(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count()
    }

    pub fn get(&self, page: u32) -> Option<&Page> {
        match self.slot(page)? {
            Slot::Ready(p) => Some(p.as_ref()),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, page: u32) -> Option<&mut Page> {
        match self.slot_mut(page)? {
            Slot::Ready(p) => Some(p.as_mut()),
            _ => None,
        }
    }

    pub fn is_ready(&self, page: u32) -> bool {
        self.get(page).is_some()
    }

    pub fn is_pending(&self, page: u32) -> bool {
        matches!(self.slot(page), Some(Slot::Pending))
    }

    /// Mark a page as being rendered. Returns false if it is already ready or
    /// pending, or out of range.
    pub fn begin_render(&mut self, page: u32) -> bool {
        match self.slot_mut(page) {
            Some(slot @ Slot::Empty) => {
                *slot = Slot::Pending;
                true
            }
            _ => false,
        }
    }

    /// Store a rendered page. An existing page is kept, since it may
    /// already carry marks.
    pub fn insert(&mut self, page: Page) -> bool {
        match self.slot_mut(page.index()) {
            Some(Slot::Ready(_)) | None => false,
            Some(slot) => {
                *slot = Slot::Ready(Box::new(page));
                true
            }
        }
    }

    /// A render failed; allow it to be requested again.
    pub fn abort_render(&mut self, page: u32) {
        if let Some(slot @ Slot::Pending) = self.slot_mut(page) {
            *slot = Slot::Empty;
        }
    }

    /// Ready pages in page order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Ready(p) => Some(p.as_ref()),
            _ => None,
        })
    }

    /// Page numbers with no rendered bitmap yet
    pub fn missing(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !matches!(s, Slot::Ready(_)))
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    fn slot(&self, page: u32) -> Option<&Slot> {
        page.checked_sub(1).and_then(|i| self.slots.get(i as usize))
    }

    fn slot_mut(&mut self, page: u32) -> Option<&mut Slot> {
        page.checked_sub(1)
            .and_then(move |i| self.slots.get_mut(i as usize))
    }
}
