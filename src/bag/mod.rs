//! Bounded, priority-stratified container with probabilistic selection
//! and capacity-based forgetting.

use crate::entity::Budget;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::trace;

/// Anything a [`Bag`] can hold: a keyed, budgeted value
pub trait Item {
    type Key: Clone + Eq + Hash;

    fn key(&self) -> Self::Key;
    fn budget(&self) -> &Budget;
    fn budget_mut(&mut self) -> &mut Budget;

    /// Absorbs a newcomer that has the same key
    fn merge(&mut self, other: Self)
    where
        Self: Sized,
    {
        self.budget_mut().merge(other.budget());
    }
}

/// Holds at most `capacity` items, each key once.
///
/// Items sit in one of `levels` priority levels. [`Bag::take`] picks a level
/// with probability proportional to its priority mass (resident count times
/// the level's priority), then serves that level round-robin: the front key
/// leaves, and a re-inserted item joins the back. Overflow evicts the
/// lowest-priority resident, ties going to the one resident longest in its
/// level.
#[derive(Debug)]
pub struct Bag<I: Item> {
    capacity: usize,
    levels: Vec<VecDeque<I::Key>>,
    items: HashMap<I::Key, (I, usize)>,
    forget_cycles: f32,
}

impl<I: Item> Bag<I> {
    /// Empty bag; `forget_cycles` sets how fast taken items decay
    pub fn new(capacity: usize, levels: usize, forget_cycles: f32) -> Self {
        let levels = levels.max(1);
        Self {
            capacity: capacity.max(1),
            levels: (0..levels).map(|_| VecDeque::new()).collect(),
            items: HashMap::new(),
            forget_cycles,
        }
    }

    /// Number of resident items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is resident
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most items the bag will hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `key` is resident
    pub fn contains(&self, key: &I::Key) -> bool {
        self.items.contains_key(key)
    }

    /// Resident item for `key`, without touching its budget
    pub fn get(&self, key: &I::Key) -> Option<&I> {
        self.items.get(key).map(|(item, _)| item)
    }

    fn level_of(&self, priority: f32) -> usize {
        let n = self.levels.len();
        ((priority * n as f32) as usize).min(n - 1)
    }

    fn insert(&mut self, key: I::Key, item: I) {
        let level = self.level_of(item.budget().priority());
        self.levels[level].push_back(key.clone());
        self.items.insert(key, (item, level));
    }

    /// Inserts or merges. Returns the item evicted to stay within capacity,
    /// which may be `item` itself when it is the weakest.
    pub fn put(&mut self, item: I) -> Option<I> {
        let key = item.key();
        if let Some(mut existing) = self.pick_out(&key) {
            existing.merge(item);
            self.insert(key, existing);
            return None;
        }
        self.insert(key, item);
        if self.items.len() > self.capacity {
            self.evict_lowest()
        } else {
            None
        }
    }

    /// Removes `key` without charging it any attention
    pub fn pick_out(&mut self, key: &I::Key) -> Option<I> {
        let (item, level) = self.items.remove(key)?;
        if let Some(pos) = self.levels[level].iter().position(|k| k == key) {
            self.levels[level].remove(pos);
        }
        Some(item)
    }

    /// Applies `f` to a resident item and re-stratifies it
    pub fn modify<T>(&mut self, key: &I::Key, f: impl FnOnce(&mut I) -> T) -> Option<T> {
        let mut item = self.pick_out(key)?;
        let result = f(&mut item);
        self.insert(key.clone(), item);
        Some(result)
    }

    fn evict_lowest(&mut self) -> Option<I> {
        let level = self.levels.iter().position(|l| !l.is_empty())?;
        let mut lowest: Option<(usize, f32)> = None;
        for (pos, key) in self.levels[level].iter().enumerate() {
            let priority = self.items.get(key).map(|(i, _)| i.budget().priority()).unwrap_or(0.0);
            if lowest.map_or(true, |(_, p)| priority < p) {
                lowest = Some((pos, priority));
            }
        }
        let (pos, priority) = lowest?;
        let key = self.levels[level].remove(pos)?;
        trace!(event = "bag.evicted", level, priority, "evicted lowest-priority item");
        self.items.remove(&key).map(|(item, _)| item)
    }

    /// Takes an item out for processing, decaying its priority once as the
    /// cost of being attended to. `None` when empty.
    pub fn take<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<I> {
        if self.items.is_empty() {
            return None;
        }
        let weight = |level: usize, len: usize| len as f32 * (level + 1) as f32;
        let total: f32 = self
            .levels
            .iter()
            .enumerate()
            .map(|(l, keys)| weight(l, keys.len()))
            .sum();

        let mut remaining = rng.random::<f32>() * total;
        let mut chosen = None;
        for (l, keys) in self.levels.iter().enumerate().rev() {
            if keys.is_empty() {
                continue;
            }
            chosen = Some(l);
            let w = weight(l, keys.len());
            if remaining < w {
                break;
            }
            remaining -= w;
        }

        let key = self.levels[chosen?].pop_front()?;
        let (mut item, _) = self.items.remove(&key)?;
        item.budget_mut().decay(self.forget_cycles);
        Some(item)
    }

    /// Read-only view, highest level first; budgets are untouched
    pub fn iter(&self) -> impl Iterator<Item = &I> + '_ {
        self.levels
            .iter()
            .rev()
            .flat_map(|keys| keys.iter())
            .filter_map(move |key| self.items.get(key).map(|(item, _)| item))
    }

    /// Resident with the highest priority, without touching it
    pub fn peek(&self) -> Option<&I> {
        self.iter().max_by(|a, b| {
            a.budget()
                .priority()
                .partial_cmp(&b.budget().priority())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Mean priority over residents; 0 when empty
    pub fn average_priority(&self) -> f32 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.items.values().map(|(i, _)| i.budget().priority()).sum::<f32>() / self.items.len() as f32
    }
}
