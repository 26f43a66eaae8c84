use {
    braid_math::{IsZero, NumberConst, Uint128},
    braid_types::Addr,
    std::collections::{BTreeSet, HashMap},
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    addr: Addr,
    value: Uint128,
    in_sorted: bool,
}

/// A registry of users ranked by balance, with a bounded sorted region.
///
/// Only the top `max_sorted_size` users by value are kept in sorted order;
/// the rest spill into an unsorted overflow region. Both regions are
/// enumerable, so membership stays exactly "value is non-zero" regardless of
/// the bound. Handles are stable slab indexes, so re-ranking a user does not
/// invalidate iteration snapshots taken beforehand.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RankingTree {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    lookup: HashMap<Addr, u32>,
    /// Ordered by (value, slot) ascending; the maximum is the last element.
    sorted: BTreeSet<(Uint128, u32)>,
    /// Overflow slots, ordered by slot for deterministic enumeration.
    unsorted: BTreeSet<u32>,
    max_sorted_size: usize,
}

impl RankingTree {
    pub fn new(max_sorted_size: usize) -> Self {
        Self {
            max_sorted_size,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn contains(&self, addr: Addr) -> bool {
        self.lookup.contains_key(&addr)
    }

    pub fn value_of(&self, addr: Addr) -> Uint128 {
        self.lookup
            .get(&addr)
            .and_then(|slot| self.nodes[*slot as usize].as_ref())
            .map(|node| node.value)
            .unwrap_or(Uint128::ZERO)
    }

    /// The best-ranked user: the maximum of the sorted region, or an
    /// arbitrary (but deterministic) overflow user if the sorted region is
    /// empty.
    pub fn head(&self) -> Option<Addr> {
        if let Some((_, slot)) = self.sorted.iter().next_back() {
            return self.nodes[*slot as usize].as_ref().map(|node| node.addr);
        }

        self.unsorted
            .iter()
            .next()
            .and_then(|slot| self.nodes[*slot as usize].as_ref())
            .map(|node| node.addr)
    }

    /// Set a user's value. A zero value removes the user; a non-zero value
    /// inserts or re-ranks them.
    pub fn update(&mut self, addr: Addr, value: Uint128) {
        self.remove(addr);

        if value.is_zero() {
            return;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(Node {
                    addr,
                    value,
                    in_sorted: false,
                });
                slot
            },
            None => {
                self.nodes.push(Some(Node {
                    addr,
                    value,
                    in_sorted: false,
                }));
                (self.nodes.len() - 1) as u32
            },
        };

        self.lookup.insert(addr, slot);
        self.place(slot, value);
    }

    pub fn remove(&mut self, addr: Addr) {
        let Some(slot) = self.lookup.remove(&addr) else {
            return;
        };

        let node = self.nodes[slot as usize]
            .take()
            .unwrap_or_else(|| unreachable!("lookup points at an empty slot"));

        if node.in_sorted {
            self.sorted.remove(&(node.value, slot));
        } else {
            self.unsorted.remove(&slot);
        }

        self.free.push(slot);
    }

    /// Change the sorted region bound, rebalancing existing members.
    pub fn set_max_sorted_size(&mut self, max_sorted_size: usize) {
        self.max_sorted_size = max_sorted_size;

        // Shrink: evict the smallest sorted members into overflow.
        while self.sorted.len() > self.max_sorted_size {
            let (value, slot) = *self
                .sorted
                .iter()
                .next()
                .unwrap_or_else(|| unreachable!("sorted region is non-empty"));
            self.sorted.remove(&(value, slot));
            self.unsorted.insert(slot);
            if let Some(node) = self.nodes[slot as usize].as_mut() {
                node.in_sorted = false;
            }
        }

        // Grow: pull overflow members back in, largest first.
        while self.sorted.len() < self.max_sorted_size && !self.unsorted.is_empty() {
            let (slot, value) = self
                .unsorted
                .iter()
                .filter_map(|slot| {
                    self.nodes[*slot as usize]
                        .as_ref()
                        .map(|node| (*slot, node.value))
                })
                .max_by_key(|(slot, value)| (*value, *slot))
                .unwrap_or_else(|| unreachable!("overflow region is non-empty"));
            self.unsorted.remove(&slot);
            self.sorted.insert((value, slot));
            if let Some(node) = self.nodes[slot as usize].as_mut() {
                node.in_sorted = true;
            }
        }
    }

    /// Snapshot of all members, best-ranked first: the sorted region in
    /// descending value order, then the overflow region.
    pub fn snapshot_descending(&self) -> Vec<Addr> {
        let mut out = Vec::with_capacity(self.len());

        for (_, slot) in self.sorted.iter().rev() {
            if let Some(node) = self.nodes[*slot as usize].as_ref() {
                out.push(node.addr);
            }
        }

        for slot in &self.unsorted {
            if let Some(node) = self.nodes[*slot as usize].as_ref() {
                out.push(node.addr);
            }
        }

        out
    }

    fn place(&mut self, slot: u32, value: Uint128) {
        if self.sorted.len() < self.max_sorted_size {
            self.sorted.insert((value, slot));
            if let Some(node) = self.nodes[slot as usize].as_mut() {
                node.in_sorted = true;
            }
            return;
        }

        // Sorted region is full. Displace its minimum if the newcomer ranks
        // higher; otherwise the newcomer goes to overflow.
        let displace = match self.sorted.iter().next() {
            Some((min_value, _)) if value > *min_value => true,
            _ => false,
        };

        if displace {
            let (min_value, min_slot) = *self
                .sorted
                .iter()
                .next()
                .unwrap_or_else(|| unreachable!("sorted region is full, hence non-empty"));
            self.sorted.remove(&(min_value, min_slot));
            self.unsorted.insert(min_slot);
            if let Some(node) = self.nodes[min_slot as usize].as_mut() {
                node.in_sorted = false;
            }

            self.sorted.insert((value, slot));
            if let Some(node) = self.nodes[slot as usize].as_mut() {
                node.in_sorted = true;
            }
        } else {
            self.unsorted.insert(slot);
        }
    }
}
