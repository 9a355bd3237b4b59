/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A fixed-size bit array with atomic and non-atomic write paths.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-size bit array over 64-bit words.
///
/// [`set_atomic`](Bitmap::set_atomic) and [`get`](Bitmap::get) may be called
/// concurrently from any number of threads; [`set`](Bitmap::set) takes the
/// bitmap exclusively, so mixing the two paths on the same word cannot be
/// expressed.
pub struct Bitmap {
    words: Box<[AtomicU64]>,
}

impl Bitmap {
    /// Creates a bitmap of `num_bits` cleared bits.
    pub fn new(num_bits: usize) -> Self {
        Self {
            words: (0..num_bits.div_ceil(WORD_BITS))
                .map(|_| AtomicU64::new(0))
                .collect(),
        }
    }

    #[inline]
    fn split(pos: usize) -> (usize, u64) {
        (pos / WORD_BITS, 1 << (pos % WORD_BITS))
    }

    /// Clears every bit.
    pub fn reset(&mut self) {
        for word in self.words.iter_mut() {
            *word.get_mut() = 0;
        }
    }

    /// Sets the bit at `pos` without synchronization.
    #[inline]
    pub fn set(&mut self, pos: usize) {
        let (word, bit) = Self::split(pos);
        *self.words[word].get_mut() |= bit;
    }

    /// Sets the bit at `pos` with an atomic read-modify-write.
    #[inline]
    pub fn set_atomic(&self, pos: usize) {
        let (word, bit) = Self::split(pos);
        self.words[word].fetch_or(bit, Ordering::Relaxed);
    }

    /// Returns the bit at `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        let (word, bit) = Self::split(pos);
        self.words[word].load(Ordering::Relaxed) & bit != 0
    }

    /// Ors every bit of `other` into this bitmap.
    pub fn or_with(&mut self, other: &Bitmap) {
        for (word, other_word) in self.words.iter_mut().zip(other.words.iter()) {
            *word.get_mut() |= other_word.load(Ordering::Relaxed);
        }
    }

    /// Exchanges the contents of two bitmaps.
    pub fn swap(&mut self, other: &mut Bitmap) {
        std::mem::swap(&mut self.words, &mut other.words);
    }
}
