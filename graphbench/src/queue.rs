/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A double-buffered sliding queue with thread-local staging buffers.
//!
//! A single bounded buffer with three indexes: appends land at `in`,
//! iteration covers `[out_start, out_end)`, and
//! [`slide_window`](SlidingQueue::slide_window) publishes everything pushed
//! since the previous slide. Pushes performed during a parallel traversal
//! therefore stay invisible until the traversal is over, which is exactly
//! the two-phase discipline frontier-based kernels rely on.
//!
//! Parallel producers append through a [`QueueBuffer`], which stages pushes
//! locally and flushes them in bulk by reserving a range of the shared
//! buffer with a fetch-and-add, avoiding false sharing on the shared index.

use crate::pvec::ParVec;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-thread staging capacity, in elements.
const BUFFER_CAPACITY: usize = 16384;

/// A bounded queue whose read window lags its write index by one
/// [`slide_window`](SlidingQueue::slide_window).
pub struct SlidingQueue<T: Copy> {
    shared: ParVec<T>,
    in_: AtomicUsize,
    out_start: usize,
    out_end: usize,
}

impl<T: Copy> SlidingQueue<T> {
    /// Creates a queue able to hold `capacity` elements over its whole
    /// lifetime between [`reset`](SlidingQueue::reset)s.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: ParVec::uninit(capacity),
            in_: AtomicUsize::new(0),
            out_start: 0,
            out_end: 0,
        }
    }

    /// Appends an element from the owning thread.
    ///
    /// Parallel producers use a [`QueueBuffer`] instead.
    pub fn push(&mut self, value: T) {
        let i = *self.in_.get_mut();
        assert!(i < self.shared.len(), "sliding queue overflow");
        self.shared[i] = value;
        *self.in_.get_mut() = i + 1;
    }

    /// Whether the current window is empty.
    pub fn is_empty(&self) -> bool {
        self.out_start == self.out_end
    }

    /// The number of elements in the current window.
    pub fn len(&self) -> usize {
        self.out_end - self.out_start
    }

    /// Empties the queue and rewinds all indexes.
    pub fn reset(&mut self) {
        self.out_start = 0;
        self.out_end = 0;
        *self.in_.get_mut() = 0;
    }

    /// Advances the read window over everything pushed since the last
    /// slide.
    pub fn slide_window(&mut self) {
        self.out_start = self.out_end;
        self.out_end = *self.in_.get_mut();
    }

    /// The current window.
    #[inline]
    pub fn window(&self) -> &[T] {
        &self.shared[self.out_start..self.out_end]
    }

    /// The position of the current window in the underlying buffer.
    ///
    /// Level-structured kernels record these positions to revisit earlier
    /// windows through [`slice`](SlidingQueue::slice).
    #[inline]
    pub fn window_start(&self) -> usize {
        self.out_start
    }

    /// A range of the underlying buffer, bounded by positions previously
    /// obtained from [`window_start`](SlidingQueue::window_start).
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &[T] {
        &self.shared[start..end]
    }

    /// Creates a staging buffer appending to this queue.
    pub fn buffer(&self) -> QueueBuffer<'_, T> {
        QueueBuffer {
            queue: self,
            local: Vec::with_capacity(BUFFER_CAPACITY),
        }
    }
}

/// A thread-local staging buffer for parallel pushes into a
/// [`SlidingQueue`].
///
/// Unflushed elements are flushed on drop.
pub struct QueueBuffer<'a, T: Copy> {
    queue: &'a SlidingQueue<T>,
    local: Vec<T>,
}

impl<T: Copy> QueueBuffer<'_, T> {
    /// Stages an element, flushing first if the buffer is full.
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.local.len() == BUFFER_CAPACITY {
            self.flush();
        }
        self.local.push(value);
    }

    /// Copies the staged elements into a freshly reserved range of the
    /// shared buffer.
    pub fn flush(&mut self) {
        if self.local.is_empty() {
            return;
        }
        let start = self.queue.in_.fetch_add(self.local.len(), Ordering::Relaxed);
        assert!(
            start + self.local.len() <= self.queue.shared.len(),
            "sliding queue overflow"
        );
        // SAFETY: the fetch-and-add reserved [start, start + len) for this
        // buffer alone; nothing reads the range before the next
        // slide_window, which is sequenced after the parallel region.
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.local.as_ptr(),
                self.queue.shared.shared_ptr().add(start),
                self.local.len(),
            );
        }
        self.local.clear();
    }
}

impl<T: Copy> Drop for QueueBuffer<'_, T> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn pushes_stay_invisible_until_slide() {
        let mut q = SlidingQueue::new(8);
        q.push(1);
        q.push(2);
        assert!(q.is_empty());
        q.slide_window();
        assert_eq!(q.window(), &[1, 2]);
        q.push(3);
        assert_eq!(q.window(), &[1, 2]);
        q.slide_window();
        assert_eq!(q.window(), &[3]);
        q.slide_window();
        assert!(q.is_empty());
    }

    #[test]
    fn parallel_buffered_pushes_all_arrive() {
        let mut q = SlidingQueue::new(100_000);
        (0..100_000_i32)
            .into_par_iter()
            .chunks(1000)
            .for_each(|chunk| {
                let mut buf = q.buffer();
                for v in chunk {
                    buf.push(v);
                }
            });
        q.slide_window();
        let mut seen: Vec<i32> = q.window().to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..100_000).collect::<Vec<_>>());
    }

    #[test]
    fn reset_rewinds_everything() {
        let mut q = SlidingQueue::new(4);
        q.push(9);
        q.slide_window();
        q.reset();
        assert!(q.is_empty());
        q.push(1);
        q.slide_window();
        assert_eq!(q.window(), &[1]);
    }
}
