//! Authoritative set of tracked processes.
//!
//! Records live in a slab of slots addressed by generation-tagged handles;
//! a `HashMap` indexes them by pid. A record is only ever removed by
//! [`ProcessRegistry::sweep`], so a process disappears exactly when it stops
//! showing up in the sampler's output.

use crate::process::record::{ProcessRecord, TickContext};
use crate::process::sampler::{Pid, RawSample};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<ProcessRecord>,
}

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<Pid, RecordHandle>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn handle_of(&self, pid: Pid) -> Option<RecordHandle> {
        self.index.get(&pid).copied()
    }

    /// `None` if the handle's record has been swept, even when its slot has
    /// since been reused.
    pub fn get(&self, handle: RecordHandle) -> Option<&ProcessRecord> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.record.as_ref()
    }

    pub fn lookup(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.handle_of(pid).and_then(|h| self.get(h))
    }

    /// First live record whose display name or executable name is `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&ProcessRecord> {
        self.all_live().find(|p| p.name == name || p.basename == name)
    }

    /// Returns the record for `pid`, creating an empty one with unknown
    /// baselines on first sight.
    pub fn get_or_create(&mut self, pid: Pid) -> &mut ProcessRecord {
        let handle = match self.handle_of(pid) {
            Some(handle) => handle,
            None => self.insert(ProcessRecord::new(pid)),
        };
        self.slots[handle.index as usize]
            .record
            .get_or_insert_with(|| ProcessRecord::new(pid))
    }

    /// `get_or_create` followed by [`ProcessRecord::apply_sample`].
    pub fn upsert(&mut self, sample: &RawSample, ctx: &TickContext) -> &mut ProcessRecord {
        let record = self.get_or_create(sample.pid);
        record.apply_sample(sample, ctx);
        record
    }

    fn insert(&mut self, record: ProcessRecord) -> RecordHandle {
        let pid = record.pid;
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                RecordHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                RecordHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.index.insert(pid, handle);
        handle
    }

    /// Drops every record not refreshed at `tick`. Returns how many were removed.
    pub fn sweep(&mut self, tick: u64) -> usize {
        let mut removed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let stale = matches!(&slot.record, Some(r) if r.time_stamp != tick);
            if !stale {
                continue;
            }
            if let Some(record) = slot.record.take() {
                self.index.remove(&record.pid);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(i as u32);
            removed += 1;
        }
        removed
    }

    /// Every tracked record, in no particular order.
    pub fn all_live(&self) -> impl Iterator<Item = &ProcessRecord> + '_ {
        self.slots.iter().filter_map(|slot| slot.record.as_ref())
    }

    /// Sets each record's `io_perc` to its share of the bytes moved by all
    /// records during the last tick. Nobody gets a share of zero traffic.
    pub fn distribute_io_share(&mut self) {
        let total: u64 = self.all_live().map(|p| p.io_delta).sum();
        for record in self.slots.iter_mut().filter_map(|s| s.record.as_mut()) {
            record.io_perc = if total == 0 {
                0.0
            } else {
                (100.0 * record.io_delta as f64 / total as f64) as f32
            };
        }
    }

    /// Drops every record at once. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        self.index.clear();
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.record = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(i as u32);
        }
    }

    /// Index and slab agree: every indexed pid resolves to its own record and
    /// every occupied slot is indexed.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let indexed_ok = self.index.iter().all(|(pid, handle)| {
            self.get(*handle).map(|r| r.pid == *pid).unwrap_or(false)
        });
        let occupied = self.slots.iter().filter(|s| s.record.is_some()).count();
        let free_ok = self
            .free
            .iter()
            .all(|&i| self.slots[i as usize].record.is_none());
        indexed_ok && occupied == self.index.len() && free_ok
    }
}
