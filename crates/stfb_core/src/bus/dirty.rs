/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    bus::dirty.rs

    Byte-granular dirty logging for video memory

*/

//! Video memory writes are logged one bit per byte. A redraw cycle takes a
//! [DirtySnapshot] over the framebuffer range, which copies the bits for that range
//! and clears them in the live [DirtyBitmap] in the same step. Writes that land after
//! the snapshot accumulate into the next cycle.

const WORD_BITS: usize = 64;

#[inline]
fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// Mask with bits `[lo, hi)` of a single word set. `hi` may be 64.
#[inline]
fn span_mask(lo: usize, hi: usize) -> u64 {
    debug_assert!(lo <= hi && hi <= WORD_BITS);
    if hi - lo == WORD_BITS {
        u64::MAX
    }
    else {
        ((1u64 << (hi - lo)) - 1) << lo
    }
}

#[derive(Clone, Debug)]
pub struct DirtyBitmap {
    bits: Vec<u64>,
    len:  usize,
}

impl DirtyBitmap {
    /// Create a bitmap covering `len` bytes. Everything starts dirty so that the first
    /// redraw after power-on paints the whole frame.
    pub fn new(len: usize) -> Self {
        let mut bitmap = Self {
            bits: vec![0; words_for(len)],
            len,
        };
        bitmap.mark_all();
        bitmap
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mark_all(&mut self) {
        self.mark(0, self.len);
    }

    /// Mark `[offset, offset + len)` dirty, clipped to the bitmap.
    pub fn mark(&mut self, offset: usize, len: usize) {
        self.apply(offset, len, |word, mask| *word |= mask);
    }

    /// Clear `[offset, offset + len)`, clipped to the bitmap.
    pub fn clear(&mut self, offset: usize, len: usize) {
        self.apply(offset, len, |word, mask| *word &= !mask);
    }

    pub fn is_dirty(&self, offset: usize, len: usize) -> bool {
        self.clone_range_words(offset, len).iter().any(|word| *word != 0)
    }

    /// Copy out the bits of `[offset, offset + len)` realigned so that bit 0 of the
    /// result is `offset`, then clear that range.
    pub fn snapshot_and_clear(&mut self, offset: usize, len: usize) -> Vec<u64> {
        let words = self.clone_range_words(offset, len);
        self.clear(offset, len);
        words
    }

    fn clone_range_words(&self, offset: usize, len: usize) -> Vec<u64> {
        let start = offset.min(self.len);
        let end = offset.saturating_add(len).min(self.len);
        let mut out = vec![0u64; words_for(len)];

        let span = end - start;
        for (k, out_word) in out.iter_mut().enumerate().take(words_for(span)) {
            let bit = start + k * WORD_BITS;
            let word_idx = bit / WORD_BITS;
            let shift = bit % WORD_BITS;

            let mut value = self.bits[word_idx] >> shift;
            if shift != 0 && word_idx + 1 < self.bits.len() {
                value |= self.bits[word_idx + 1] << (WORD_BITS - shift);
            }

            let remaining = span - k * WORD_BITS;
            if remaining < WORD_BITS {
                value &= span_mask(0, remaining);
            }
            *out_word = value;
        }
        out
    }

    fn apply<F>(&mut self, offset: usize, len: usize, mut op: F)
    where
        F: FnMut(&mut u64, u64),
    {
        let start = offset.min(self.len);
        let end = offset.saturating_add(len).min(self.len);
        if start >= end {
            return;
        }

        let first_word = start / WORD_BITS;
        let last_word = (end - 1) / WORD_BITS;

        for word_idx in first_word..=last_word {
            let lo = if word_idx == first_word { start % WORD_BITS } else { 0 };
            let hi = if word_idx == last_word {
                (end - 1) % WORD_BITS + 1
            }
            else {
                WORD_BITS
            };
            op(&mut self.bits[word_idx], span_mask(lo, hi));
        }
    }
}

#[derive(Clone, Debug)]
enum SnapshotBits {
    All,
    Bitmap(Vec<u64>),
}

/// An immutable capture of which bytes of an address range were written since the
/// previous capture.
#[derive(Clone, Debug)]
pub struct DirtySnapshot {
    address: u32,
    len: usize,
    bits: SnapshotBits,
}

impl DirtySnapshot {
    /// Build a snapshot from bits aligned so that bit 0 is `address`.
    pub fn from_bits(address: u32, len: usize, bits: Vec<u64>) -> Self {
        Self {
            address,
            len,
            bits: SnapshotBits::Bitmap(bits),
        }
    }

    /// A snapshot reporting every byte in range as dirty.
    pub fn all_dirty(address: u32, len: usize) -> Self {
        Self {
            address,
            len,
            bits: SnapshotBits::All,
        }
    }

    #[inline]
    pub fn address(&self) -> u32 {
        self.address
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if any byte of `[offset, offset + len)` is dirty. `offset` is
    /// relative to the start of the snapshot. Bytes outside the snapshot are clean.
    pub fn is_dirty(&self, offset: usize, len: usize) -> bool {
        let start = offset.min(self.len);
        let end = offset.saturating_add(len).min(self.len);
        if start >= end {
            return false;
        }

        let bits = match &self.bits {
            SnapshotBits::All => return true,
            SnapshotBits::Bitmap(bits) => bits,
        };

        let first_word = start / WORD_BITS;
        let last_word = (end - 1) / WORD_BITS;

        for word_idx in first_word..=last_word {
            let lo = if word_idx == first_word { start % WORD_BITS } else { 0 };
            let hi = if word_idx == last_word {
                (end - 1) % WORD_BITS + 1
            }
            else {
                WORD_BITS
            };
            if bits[word_idx] & span_mask(lo, hi) != 0 {
                return true;
            }
        }
        false
    }

    /// Count of dirty bytes in the snapshot. Used for statistics only.
    pub fn dirty_bytes(&self) -> usize {
        match &self.bits {
            SnapshotBits::All => self.len,
            SnapshotBits::Bitmap(bits) => bits.iter().map(|w| w.count_ones() as usize).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bitmap_starts_dirty() {
        let bitmap = DirtyBitmap::new(1000);
        assert!(bitmap.is_dirty(0, 1000));
        assert!(bitmap.is_dirty(999, 1));
    }

    #[test]
    fn snapshot_clears_live_range_only() {
        let mut bitmap = DirtyBitmap::new(512);
        bitmap.clear(0, 512);

        bitmap.mark(10, 1);
        bitmap.mark(300, 4);

        let bits = bitmap.snapshot_and_clear(0, 256);
        let snap = DirtySnapshot::from_bits(0, 256, bits);
        assert!(snap.is_dirty(10, 1));
        assert!(!snap.is_dirty(11, 100));
        assert_eq!(snap.dirty_bytes(), 1);

        // Outside the snapshot range, the live state is untouched.
        assert!(!bitmap.is_dirty(0, 256));
        assert!(bitmap.is_dirty(300, 1));
    }

    #[test]
    fn snapshot_realigns_unaligned_ranges() {
        let mut bitmap = DirtyBitmap::new(4096);
        bitmap.clear(0, 4096);
        bitmap.mark(1000, 1);
        bitmap.mark(1130, 2);

        let bits = bitmap.snapshot_and_clear(997, 200);
        let snap = DirtySnapshot::from_bits(997, 200, bits);

        assert!(snap.is_dirty(3, 1));
        assert!(!snap.is_dirty(0, 3));
        assert!(!snap.is_dirty(4, 129));
        assert!(snap.is_dirty(133, 1));
        assert!(snap.is_dirty(134, 1));
        assert!(!snap.is_dirty(135, 65));
        assert_eq!(snap.dirty_bytes(), 3);
    }

    #[test]
    fn writes_after_snapshot_go_to_next_cycle() {
        let mut bitmap = DirtyBitmap::new(128);
        let first = DirtySnapshot::from_bits(0, 128, bitmap.snapshot_and_clear(0, 128));
        assert!(first.is_dirty(0, 128));

        bitmap.mark(64, 1);
        let second = DirtySnapshot::from_bits(0, 128, bitmap.snapshot_and_clear(0, 128));
        assert!(!second.is_dirty(0, 64));
        assert!(second.is_dirty(64, 1));

        let third = DirtySnapshot::from_bits(0, 128, bitmap.snapshot_and_clear(0, 128));
        assert!(!third.is_dirty(0, 128));
    }

    #[test]
    fn all_dirty_snapshot_respects_bounds() {
        let snap = DirtySnapshot::all_dirty(0x1000, 64);
        assert!(snap.is_dirty(0, 1));
        assert!(snap.is_dirty(63, 10));
        assert!(!snap.is_dirty(64, 10));
    }
}
