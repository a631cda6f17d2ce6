//! Bounded top-K selection over an unbounded insertion stream.
//!
//! Held elements live in a small vector kept in non-increasing order. Every
//! candidate is first compared against the current floor (the last element),
//! so for the usual K of about ten a pass over a few thousand processes costs
//! one comparison for most of them.

use crate::error::SelectorError;
use std::cmp::Ordering;

pub struct BoundedSelector<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    max_size: usize,
    compare: F,
    held: Vec<T>,
}

impl<T, F> BoundedSelector<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// `compare(a, b)` returns `Greater` when `a` ranks above `b`.
    pub fn new(max_size: usize, compare: F) -> Result<Self, SelectorError> {
        if max_size == 0 {
            return Err(SelectorError::ZeroCapacity);
        }
        Ok(Self {
            max_size,
            compare,
            held: Vec::with_capacity(max_size),
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.held.len() == self.max_size
    }

    /// Smallest element currently held.
    pub fn floor(&self) -> Option<&T> {
        self.held.last()
    }

    /// Offers a candidate. Returns `false` if it was discarded.
    pub fn insert(&mut self, candidate: T) -> bool {
        if self.is_full() {
            // Equal to the floor is not enough to displace it.
            match self.held.last() {
                Some(floor) if (self.compare)(&candidate, floor) != Ordering::Greater => {
                    return false;
                }
                _ => {}
            }
        }

        // Insert after every element ranking at least as high.
        let at = self
            .held
            .partition_point(|held| (self.compare)(held, &candidate) != Ordering::Less);
        self.held.insert(at, candidate);

        if self.held.len() > self.max_size {
            self.held.pop();
        }
        true
    }

    /// Held elements from greatest to least; consumes the selector.
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.held
    }

    /// Fills `out` from the front in decreasing order and clears the trailing
    /// slots. Consumes the selector, so a pass cannot be drained twice.
    pub fn drain_into(self, out: &mut [Option<T>]) {
        let mut held = self.held.into_iter();
        for slot in out.iter_mut() {
            *slot = held.next();
        }
    }
}
