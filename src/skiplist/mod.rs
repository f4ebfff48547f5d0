//! Skip-list index over the arena, encoded as a flat vector of integers.
//!
//! Instead of one heap allocation per node, every node is a run of
//! `4 + height` consecutive `usize` slots in a single vector: arena
//! offset, key length, value length, height, then one forward pointer
//! per level. A forward pointer is the slot-0 index of the next node on
//! that level, with `0` meaning end of level. Keeping the index flat
//! keeps node records cache-dense and concentrates all growth on two
//! vectors, the index and the arena.
//!
//! Slot 0 holds the head sentinel: a payload-less node of maximum
//! height whose forward pointers are the entry point of every scan.
//!
//! Tower heights come from a seeded generator so that repeated runs
//! build identical towers. Updates rewrite a node's payload slots in
//! place; deletes unlink the node but leave its slots (and its bytes in
//! the arena) dead until the table is discarded.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::arena::Arena;
use crate::Config;

/// Tallest tower a node can have.
pub const MAX_HEIGHT: usize = 12;

/// Default seed for the tower-height generator.
///
/// Fixed so that two tables fed the same keys build the same towers,
/// which keeps benchmarks comparable across runs. [`Config::seed`]
/// overrides it.
pub const DEFAULT_SEED: u64 = 0xCAFE_BABE;

// Slot layout of a node record, relative to the node's first slot.
const OFFSET: usize = 0;
const KEY_LEN: usize = 1;
const VALUE_LEN: usize = 2;
const HEIGHT: usize = 3;
const FORWARD: usize = 4;

/// The predecessor at each level from the latest trail-recording scan.
type Trail = [usize; MAX_HEIGHT];

/// Ordered byte-key index over an [`Arena`].
///
/// All methods assume a non-empty key; the [`Store`](crate::Store)
/// facade validates input before taking its lock.
pub struct SkipList {
    arena: Arena,
    /// Node records, head sentinel first. Never compacted.
    slots: Vec<usize>,
    /// Highest level at which the head has ever pointed at a node.
    /// Scans start at `max_height - 1`. Never lowered, even when the
    /// tallest node is deleted.
    max_height: usize,
    live_bytes: usize,
    entries: usize,
    rng: StdRng,
}

impl SkipList {
    /// Creates an empty index with the head sentinel installed.
    pub fn new(config: &Config) -> Self {
        let mut slots = vec![0; FORWARD + MAX_HEIGHT];
        slots[HEIGHT] = MAX_HEIGHT;
        Self {
            arena: Arena::with_capacity(config.capacity),
            slots,
            max_height: 1,
            live_bytes: 0,
            entries: 0,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Inserts `key` with `value`, or updates the value if the key is
    /// already present.
    pub fn write(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(!key.is_empty());

        let mut trail = [0; MAX_HEIGHT];
        let (entry, matched) = self.scan(key, Some(&mut trail));
        if matched {
            // Update path: fresh bytes go to the arena, the node keeps
            // its tower and only repoints its payload slots. The old
            // bytes stay dead in the arena.
            let offset = self.arena.append(key, value);
            let old_len = self.slots[entry + VALUE_LEN];
            self.slots[entry + OFFSET] = offset;
            self.slots[entry + VALUE_LEN] = value.len();
            self.live_bytes = self.live_bytes - old_len + value.len();
            trace!(entry, offset, value_len = value.len(), "updated entry");
            return;
        }

        let height = self.random_height();
        if height > self.max_height {
            // The new tower pokes above every existing one, so the head
            // is its predecessor at the fresh levels.
            for slot in &mut trail[self.max_height..height] {
                *slot = 0;
            }
            self.max_height = height;
        }

        let offset = self.arena.append(key, value);
        let entry = self.slots.len();
        self.slots
            .extend_from_slice(&[offset, key.len(), value.len(), height]);
        for (level, &prev) in trail[..height].iter().enumerate() {
            let link = prev + FORWARD + level;
            self.slots.push(self.slots[link]);
            self.slots[link] = entry;
        }

        self.live_bytes += key.len() + value.len();
        self.entries += 1;
        trace!(entry, offset, height, "inserted entry");
    }

    /// Returns the value bytes for `key`, borrowed from the arena.
    ///
    /// The borrow is tied to `&self`; it cannot outlive a subsequent
    /// mutation, which is what makes handing out arena slices safe.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let (entry, matched) = self.scan(key, None);
        if !matched {
            return None;
        }
        let offset = self.slots[entry + OFFSET] + self.slots[entry + KEY_LEN];
        Some(self.arena.slice(offset, self.slots[entry + VALUE_LEN]))
    }

    /// True if `key` is present. Allocates nothing.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.scan(key, None).1
    }

    /// Unlinks `key` from every level it participates in. Returns false
    /// if the key is absent. The node's slots and bytes stay behind,
    /// unreachable.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        debug_assert!(!key.is_empty());

        let mut trail = [0; MAX_HEIGHT];
        let (entry, matched) = self.scan(key, Some(&mut trail));
        if !matched {
            return false;
        }

        let height = self.slots[entry + HEIGHT];
        for (level, &prev) in trail[..height].iter().enumerate() {
            self.slots[prev + FORWARD + level] = self.slots[entry + FORWARD + level];
        }

        self.live_bytes -= self.slots[entry + KEY_LEN] + self.slots[entry + VALUE_LEN];
        self.entries -= 1;
        debug!(entry, height, "deleted entry");
        true
    }

    /// Spare arena capacity before the next reallocation.
    pub fn available(&self) -> usize {
        self.arena.available()
    }

    /// Total key plus value bytes across live entries. Unlike the arena
    /// length this shrinks on delete and can shrink on update.
    pub fn live_size(&self) -> usize {
        self.live_bytes
    }

    /// Number of live distinct keys.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Top-down search for `key`, starting at the head on level
    /// `max_height - 1`.
    ///
    /// On each level the scan advances while the next node's key is
    /// less than `key` (a `0` pointer compares as greater, ending the
    /// level), then descends. Returns the first node whose key is not
    /// less than `key`, with the match flag.
    ///
    /// With `trail`, the predecessor on every level is recorded and the
    /// scan always descends to level 0, so the caller gets the complete
    /// splice trail. Without it, the scan returns as soon as equality
    /// is observed on any level.
    fn scan(&self, key: &[u8], mut trail: Option<&mut Trail>) -> (usize, bool) {
        let mut entry = 0;
        let mut level = self.max_height - 1;
        loop {
            let next = self.slots[entry + FORWARD + level];
            let ord = if next == 0 {
                Ordering::Greater
            } else {
                self.node_key(next).cmp(key)
            };
            if ord == Ordering::Less {
                entry = next;
                continue;
            }
            match trail.as_mut() {
                Some(trail) => trail[level] = entry,
                None if ord == Ordering::Equal => return (next, true),
                None => {}
            }
            if level == 0 {
                return (next, ord == Ordering::Equal);
            }
            level -= 1;
        }
    }

    fn node_key(&self, entry: usize) -> &[u8] {
        self.arena
            .slice(self.slots[entry + OFFSET], self.slots[entry + KEY_LEN])
    }

    /// Draws a tower height in `1..=MAX_HEIGHT`: each level is kept
    /// with probability 1/4, so roughly a quarter of nodes reach level
    /// 2, a sixteenth level 3, and so on.
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_HEIGHT && self.rng.gen::<u32>() % 4 == 0 {
            height += 1;
        }
        height
    }
}

#[cfg(test)]
impl SkipList {
    /// Keys on the forward chain at `level`, in chain order.
    fn level_keys(&self, level: usize) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        let mut entry = self.slots[FORWARD + level];
        while entry != 0 {
            keys.push(self.node_key(entry).to_vec());
            entry = self.slots[entry + FORWARD + level];
        }
        keys
    }

    /// Tower heights of live nodes, in key order.
    fn heights(&self) -> Vec<usize> {
        let mut heights = Vec::new();
        let mut entry = self.slots[FORWARD];
        while entry != 0 {
            heights.push(self.slots[entry + HEIGHT]);
            entry = self.slots[entry + FORWARD];
        }
        heights
    }

    /// Checks every structural invariant against the level-0 chain.
    fn check_invariants(&self) {
        let bottom = self.level_keys(0);
        for pair in bottom.windows(2) {
            assert!(pair[0] < pair[1], "level 0 out of order: {:?}", pair);
        }
        assert_eq!(bottom.len(), self.entries, "entry count drifted");

        let mut live = 0;
        let mut entry = self.slots[FORWARD];
        while entry != 0 {
            live += self.slots[entry + KEY_LEN] + self.slots[entry + VALUE_LEN];
            entry = self.slots[entry + FORWARD];
        }
        assert_eq!(live, self.live_bytes, "live size drifted");

        for level in 1..MAX_HEIGHT {
            let keys = self.level_keys(level);
            for pair in keys.windows(2) {
                assert!(pair[0] < pair[1], "level {} out of order", level);
            }
            for key in &keys {
                assert!(
                    bottom.binary_search(key).is_ok(),
                    "level {} key missing from level 0",
                    level
                );
            }
        }
    }
}
