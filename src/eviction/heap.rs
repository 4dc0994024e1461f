//! Indexed Min-Heap
//!
//! Binary min-heap whose elements live in a slot arena and always know
//! their own position in the heap array. A `Handle` to a slot stays valid
//! across arbitrary sifts, which gives O(log n) priority updates and
//! removals without scanning. Freed slots are reused; a generation counter
//! keeps handles to removed elements from reaching the slot's next tenant.

/// Stable reference to an element pushed onto an `IndexedHeap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    slot: usize,
    generation: u32,
}

#[derive(Debug)]
struct Node<T, P> {
    item: T,
    priority: P,
    /// Current index of this node in `heap`
    pos: usize,
}

#[derive(Debug)]
struct Slot<T, P> {
    generation: u32,
    node: Option<Node<T, P>>,
}

// == Indexed Heap ==
#[derive(Debug)]
pub struct IndexedHeap<T, P> {
    /// Slot arena; a `None` node marks a free slot
    slots: Vec<Slot<T, P>>,
    /// Free slot indices available for reuse
    free: Vec<usize>,
    /// Heap-ordered slot indices
    heap: Vec<usize>,
}

impl<T, P: Ord + Copy> IndexedHeap<T, P> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            heap: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    // == Push ==
    /// Inserts `item` and returns a handle for later updates.
    pub fn push(&mut self, item: T, priority: P) -> Handle {
        let pos = self.heap.len();
        let node = Node { item, priority, pos };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot].node = Some(node);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        };
        self.heap.push(slot);
        self.sift_up(pos);
        Handle {
            slot,
            generation: self.slots[slot].generation,
        }
    }

    // == Peek ==
    /// The element with the lowest priority, without removing it.
    pub fn peek(&self) -> Option<(&T, P)> {
        let slot = *self.heap.first()?;
        let node = self.node(slot);
        Some((&node.item, node.priority))
    }

    // == Pop ==
    /// Removes and returns the element with the lowest priority.
    pub fn pop(&mut self) -> Option<(T, P)> {
        let slot = *self.heap.first()?;
        let generation = self.slots[slot].generation;
        self.remove(Handle { slot, generation })
    }

    // == Update ==
    /// Changes the priority of a live element and restores heap order.
    ///
    /// Returns false if the handle no longer refers to a live element.
    pub fn update(&mut self, handle: Handle, priority: P) -> bool {
        let Some(node) = self.live_mut(handle) else {
            return false;
        };
        node.priority = priority;
        let pos = node.pos;
        self.fix(pos);
        true
    }

    // == Remove ==
    /// Removes the element behind `handle` from anywhere in the heap.
    pub fn remove(&mut self, handle: Handle) -> Option<(T, P)> {
        let pos = self.live(handle)?.pos;
        let last = self.heap.len() - 1;
        if pos != last {
            self.swap(pos, last);
        }
        self.heap.pop();
        if pos < self.heap.len() {
            self.fix(pos);
        }

        let slot = &mut self.slots[handle.slot];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.slot);
        Some((node.item, node.priority))
    }

    pub fn get(&self, handle: Handle) -> Option<(&T, P)> {
        let node = self.live(handle)?;
        Some((&node.item, node.priority))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.heap.clear();
    }

    fn live(&self, handle: Handle) -> Option<&Node<T, P>> {
        let slot = self.slots.get(handle.slot)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn live_mut(&mut self, handle: Handle) -> Option<&mut Node<T, P>> {
        let slot = self.slots.get_mut(handle.slot)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn node(&self, slot: usize) -> &Node<T, P> {
        self.slots[slot]
            .node
            .as_ref()
            .unwrap_or_else(|| unreachable!("heap references free slot {slot}"))
    }

    fn priority_at(&self, pos: usize) -> P {
        self.node(self.heap[pos]).priority
    }

    /// Swaps two heap positions and records each node's new position.
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        for pos in [a, b] {
            let slot = self.heap[pos];
            if let Some(node) = self.slots[slot].node.as_mut() {
                node.pos = pos;
            }
        }
    }

    fn fix(&mut self, pos: usize) {
        if !self.sift_up(pos) {
            self.sift_down(pos);
        }
    }

    /// Returns true if the element moved.
    fn sift_up(&mut self, mut pos: usize) -> bool {
        let start = pos;
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.priority_at(pos) >= self.priority_at(parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos != start
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.priority_at(right) < self.priority_at(left) {
                right
            } else {
                left
            };
            if self.priority_at(child) >= self.priority_at(pos) {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
    }
}

impl<T, P: Ord + Copy> Default for IndexedHeap<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(heap: &mut IndexedHeap<&'static str, i64>) -> Vec<(&'static str, i64)> {
        std::iter::from_fn(|| heap.pop()).collect()
    }

    #[test]
    fn test_pop_in_priority_order() {
        let mut heap = IndexedHeap::new();
        for (item, priority) in [("c", 3), ("a", 1), ("e", 5), ("b", 2), ("d", 4)] {
            heap.push(item, priority);
        }

        assert_eq!(heap.peek(), Some((&"a", 1)));
        assert_eq!(
            drain(&mut heap),
            vec![("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]
        );
        assert!(heap.is_empty());
    }

    #[test]
    fn test_update_moves_element() {
        let mut heap = IndexedHeap::new();
        let a = heap.push("a", 1);
        heap.push("b", 2);
        let c = heap.push("c", 3);

        assert!(heap.update(a, 10));
        assert!(heap.update(c, 0));

        assert_eq!(heap.len(), 3);
        assert_eq!(drain(&mut heap), vec![("c", 0), ("b", 2), ("a", 10)]);
    }

    #[test]
    fn test_remove_from_middle() {
        let mut heap = IndexedHeap::new();
        let handles: Vec<_> = (0..8).map(|i| heap.push("x", i)).collect();

        assert_eq!(heap.remove(handles[3]), Some(("x", 3)));
        assert_eq!(heap.remove(handles[3]), None);
        assert!(!heap.update(handles[3], 1));

        let order: Vec<i64> = drain(&mut heap).into_iter().map(|(_, p)| p).collect();
        assert_eq!(order, vec![0, 1, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn test_stale_handle_misses_reused_slot() {
        let mut heap = IndexedHeap::new();
        let a = heap.push("a", 1);
        heap.pop();
        let b = heap.push("b", 2);

        assert_ne!(a, b);
        assert_eq!(heap.get(a), None);
        assert!(!heap.update(a, 0));
        assert_eq!(heap.remove(a), None);
        assert_eq!(heap.get(b), Some((&"b", 2)));
    }

    #[test]
    fn test_handles_survive_reordering() {
        let mut heap = IndexedHeap::new();
        let handles: Vec<_> = (0..32).rev().map(|i| (i, heap.push(i, i))).collect();

        for (item, handle) in &handles {
            assert_eq!(heap.get(*handle), Some((item, *item)));
        }
    }
}
