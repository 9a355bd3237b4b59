/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Atomic views over plain integer slices.
//!
//! Kernels update shared scalar slots (`dist`, `parent`, `comp`, path
//! counts, scatter offsets) with compare-and-swap and fetch-and-add while
//! the surrounding array is owned and returned as plain data. These helpers
//! reinterpret an exclusively borrowed slice as a slice of atomics for the
//! duration of a parallel region.

use std::sync::atomic::{AtomicI32, AtomicI64};

/// Views a mutable slice of `i32` as a slice of [`AtomicI32`].
#[inline]
pub fn as_atomic_i32(slice: &mut [i32]) -> &[AtomicI32] {
    // SAFETY: AtomicI32 has the same in-memory representation as i32, and
    // the exclusive borrow rules out concurrent non-atomic access for the
    // lifetime of the returned view.
    unsafe { std::mem::transmute::<&mut [i32], &[AtomicI32]>(slice) }
}

/// Views a mutable slice of `i64` as a slice of [`AtomicI64`].
#[inline]
pub fn as_atomic_i64(slice: &mut [i64]) -> &[AtomicI64] {
    // SAFETY: as above for AtomicI64/i64.
    unsafe { std::mem::transmute::<&mut [i64], &[AtomicI64]>(slice) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn concurrent_fetch_add_lands_once_per_call() {
        let mut counts = vec![0_i32; 16];
        let view = as_atomic_i32(&mut counts);
        (0..16_000_usize).into_par_iter().for_each(|i| {
            view[i % 16].fetch_add(1, Ordering::Relaxed);
        });
        assert!(counts.iter().all(|&c| c == 1000));
    }

    #[test]
    fn compare_exchange_observes_plain_writes() {
        let mut slots = vec![-1_i64; 4];
        {
            let view = as_atomic_i64(&mut slots);
            assert!(view[2]
                .compare_exchange(-1, 7, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok());
        }
        assert_eq!(slots, vec![-1, -1, 7, -1]);
    }
}
