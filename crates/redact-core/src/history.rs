//! Two-stack undo/redo history

/// Committed entries in commit order plus the entries taken back by undo.
///
/// An entry is in exactly one of the two stacks at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    committed: Vec<T>,
    undone: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            committed: Vec::new(),
            undone: Vec::new(),
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry. Anything previously undone can no longer be redone.
    pub fn push(&mut self, entry: T) {
        self.committed.push(entry);
        self.undone.clear();
    }

    pub fn undo(&mut self) -> Option<&T> {
        let entry = self.committed.pop()?;
        self.undone.push(entry);
        self.undone.last()
    }

    pub fn redo(&mut self) -> Option<&T> {
        let entry = self.undone.pop()?;
        self.committed.push(entry);
        self.committed.last()
    }

    pub fn committed(&self) -> &[T] {
        &self.committed
    }

    pub fn undone(&self) -> &[T] {
        &self.undone
    }

    pub fn can_undo(&self) -> bool {
        !self.committed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.undone.clear();
    }

    /// Empty both stacks, handing back what was committed.
    pub fn take_committed(&mut self) -> Vec<T> {
        self.undone.clear();
        std::mem::take(&mut self.committed)
    }
}
