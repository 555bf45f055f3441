use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
};

use super::utils::next_operation_id;

/// The tape of the operations a variable depends on.
///
/// Operations are keyed by their id, which grows with creation order, thus iterating the tape
/// yields a topological ordering of the graph. Merging two tapes that share an ancestor keeps a
/// single copy of it.
#[derive(Clone)]
pub(crate) struct History<T>
where
    T: Clone,
{
    path: BTreeMap<usize, T>,
    buffer: RefCell<Vec<T>>,
}

impl<T> History<T>
where
    T: Clone,
{
    /// Performs the merge between this history and another one.
    pub(crate) fn merge(&mut self, mut other: Self) {
        self.path.append(&mut other.path);
        self.buffer.borrow_mut().truncate(0);
    }

    /// Appends a new operation to the history.
    pub(crate) fn insert(&mut self, op: T) {
        self.path.insert(next_operation_id(), op);
        self.buffer.borrow_mut().truncate(0);
    }

    pub(crate) fn len(&self) -> usize {
        self.path.len()
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.buffer.borrow().len()
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.path.values().cloned().collect()
    }

    pub(crate) fn buffer(&self) -> Ref<[T]> {
        Ref::map(self.buffer.borrow(), |buffer| &buffer[..])
    }

    pub(crate) fn buffer_mut(&self) -> RefMut<Vec<T>> {
        self.buffer.borrow_mut()
    }
}

impl<T> Default for History<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self {
            path: BTreeMap::new(),
            buffer: RefCell::new(Vec::new()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn merge_deduplicates_and_orders() {
        let mut shared = History::default();
        shared.insert("a");

        let mut left = shared.clone();
        left.insert("b");
        let mut right = shared;
        right.insert("c");

        left.merge(right);
        left.insert("d");

        assert_eq!(left.to_vec(), vec!["a", "b", "c", "d"]);
        assert_eq!(left.len(), 4);
    }
}
