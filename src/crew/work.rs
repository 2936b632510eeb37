/*!
 * Work List
 *
 * FIFO of work items stored in an index arena. Nodes link by slot index,
 * so nothing aliases a node: an item is owned by the list until
 * `pop_front` moves it out to exactly one worker.
 */

use serde::{Deserialize, Serialize};

/// Unit of work handed to one worker
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkItem {
    pub data: Vec<f64>,
}

impl WorkItem {
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Item carrying a single value
    pub fn single(value: f64) -> Self {
        Self { data: vec![value] }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

#[derive(Debug)]
struct Node {
    item: WorkItem,
    next: Option<usize>,
}

/// Singly linked FIFO with head/tail slot indices
#[derive(Debug, Default)]
pub struct WorkList {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail; sets the head too when the list was empty
    pub fn push_back(&mut self, item: WorkItem) {
        let node = Node { item, next: None };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.slots[tail].as_mut() {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Detach the head item; clears the tail when the list becomes empty
    pub fn pop_front(&mut self) -> Option<WorkItem> {
        let index = self.head?;
        let node = self.slots[index].take()?;
        self.free.push(index);

        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(node.item)
    }

    /// Drop every queued item, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.len;
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Arena slot of the head node, `None` when empty
    pub fn head_id(&self) -> Option<usize> {
        self.head
    }

    /// Arena slot of the tail node, `None` when empty
    pub fn tail_id(&self) -> Option<usize> {
        self.tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_and_tail_cleared() {
        let mut list = WorkList::new();
        assert!(list.is_empty());

        list.push_back(WorkItem::single(1.0));
        list.push_back(WorkItem::single(2.0));
        assert_eq!(list.len(), 2);
        assert_ne!(list.head_id(), list.tail_id());

        assert_eq!(list.pop_front(), Some(WorkItem::single(1.0)));
        assert_eq!(list.head_id(), list.tail_id());

        assert_eq!(list.pop_front(), Some(WorkItem::single(2.0)));
        assert_eq!(list.head_id(), None);
        assert_eq!(list.tail_id(), None);
        assert_eq!(list.pop_front(), None);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = WorkList::new();
        for round in 0..3 {
            list.push_back(WorkItem::single(round as f64));
            list.push_back(WorkItem::single(round as f64 + 0.5));
            list.pop_front();
            list.pop_front();
        }
        assert!(list.slots.len() <= 2);
    }

    #[test]
    fn test_push_after_drain_sets_head() {
        let mut list = WorkList::new();
        list.push_back(WorkItem::single(1.0));
        list.pop_front();
        list.push_back(WorkItem::single(3.0));
        assert_eq!(list.head_id(), list.tail_id());
        assert_eq!(list.pop_front().map(|i| i.sum()), Some(3.0));
    }

    #[test]
    fn test_clear() {
        let mut list = WorkList::new();
        for i in 0..5 {
            list.push_back(WorkItem::new(vec![i as f64; 3]));
        }
        assert_eq!(list.clear(), 5);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.tail_id(), None);
    }
}
