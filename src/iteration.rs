//! Batching over arbitrary iterators.
//!
//! [`Batch`] splits any sequential source into bounded groups while keeping
//! the original order. Each group is produced lazily: elements are pulled
//! from the source only as the group is consumed.
//!
//! ```
//! use skills_utils::iteration::Batch;
//!
//! # fn main() -> skills_utils::error::Result<()> {
//! let mut batch = Batch::new(0..100, 30)?;
//! let mut sizes = Vec::new();
//! while let Some(group) = batch.next_group() {
//!     sizes.push(group.count());
//! }
//! assert_eq!(sizes, vec![30, 30, 30, 10]);
//! # Ok(())
//! # }
//! ```
//!
//! # Consumption order
//!
//! A [`Group`] mutably borrows its [`Batch`], so the next group cannot be
//! requested while a previous one is still alive. Dropping a group before it
//! is exhausted discards the rest of that group; the following group still
//! starts on the correct boundary.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::{Result, SkillsError};

/// Splits an iterator into groups of at most `limit` elements.
pub struct Batch<I: Iterator> {
    iterator: I,
    limit: Option<usize>,
    /// Lookahead element; the first item of the next group.
    current: Option<I::Item>,
    on_going: bool,
}

impl<I: Iterator> Batch<I> {
    /// Create a batch producing groups of at most `limit` elements.
    ///
    /// One element is pulled from `source` immediately to find out whether
    /// it is empty.
    pub fn new<S>(source: S, limit: usize) -> Result<Self>
    where
        S: IntoIterator<IntoIter = I>,
    {
        if limit == 0 {
            return Err(SkillsError::invalid_argument(
                "batch limit must be greater than zero",
            ));
        }
        Ok(Self::with_limit(source, Some(limit)))
    }

    /// Create a batch whose single group holds every element of `source`.
    pub fn unbounded<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self::with_limit(source, None)
    }

    fn with_limit<S>(source: S, limit: Option<usize>) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        let mut iterator = source.into_iter();
        let current = iterator.next();
        let on_going = current.is_some();
        Batch {
            iterator,
            limit,
            current,
            on_going,
        }
    }

    /// The maximum group size, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether the underlying source has been drained.
    pub fn is_exhausted(&self) -> bool {
        !self.on_going
    }

    /// Start the next group, or `None` once the source is drained.
    pub fn next_group(&mut self) -> Option<Group<'_, I>> {
        if !self.on_going {
            return None;
        }
        Some(Group {
            batch: self,
            yielded: 0,
            done: false,
        })
    }
}

impl<I: Iterator> fmt::Debug for Batch<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("limit", &self.limit)
            .field("on_going", &self.on_going)
            .finish()
    }
}

/// Owned-chunk form: each item is a fully collected group.
impl<I: Iterator> Iterator for Batch<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_group().map(|group| group.collect())
    }
}

impl<I: Iterator> FusedIterator for Batch<I> {}

/// A lazy group of a [`Batch`].
pub struct Group<'a, I: Iterator> {
    batch: &'a mut Batch<I>,
    yielded: usize,
    done: bool,
}

impl<I: Iterator> Group<'_, I> {
    /// Number of elements yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<I: Iterator> Iterator for Group<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.done {
            return None;
        }

        if self.yielded == 0 {
            return match self.batch.current.take() {
                Some(item) => {
                    self.yielded = 1;
                    Some(item)
                }
                None => {
                    self.batch.on_going = false;
                    self.done = true;
                    None
                }
            };
        }

        let full = self.batch.limit.is_some_and(|limit| self.yielded >= limit);
        match self.batch.iterator.next() {
            Some(item) if full => {
                // The excess element opens the next group.
                self.batch.current = Some(item);
                self.done = true;
                None
            }
            Some(item) => {
                self.yielded += 1;
                Some(item)
            }
            None => {
                self.batch.on_going = false;
                self.done = true;
                None
            }
        }
    }
}

impl<I: Iterator> FusedIterator for Group<'_, I> {}

impl<I: Iterator> Drop for Group<'_, I> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if self.batch.limit.is_none() {
            // Nothing follows an unbounded group, and the source may be infinite.
            self.batch.current = None;
            self.batch.on_going = false;
            return;
        }
        while self.next().is_some() {}
    }
}

/// Shorthand for [`Batch::new`].
pub fn batch<S: IntoIterator>(source: S, limit: usize) -> Result<Batch<S::IntoIter>> {
    Batch::new(source, limit)
}
