//! Sub-byte position tracking.

/// Position inside a partially filled byte.
///
/// Values narrower than a byte are packed LSB-first: the first value occupies the low-order bits
/// of a byte and every following value the next higher bits. Values that do not fit in the
/// remaining bits spill over into the next byte.
///
/// An offset of `0` means that the cursor is byte-aligned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BitCursor {
    byte: u8,
    offset: u8,
}

impl BitCursor {
    /// Whether no bits of the current byte are in use.
    pub fn is_aligned(&self) -> bool {
        self.offset == 0
    }

    /// Appends the low `width` bits of `value`, calling `commit` with every completed byte.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pack(&mut self, value: u64, width: u8, mut commit: impl FnMut(u8)) {
        let mut value = value & mask(width);
        let mut remaining = width;
        while remaining > 0 {
            let take = (8 - self.offset).min(remaining);
            self.byte |= ((value & mask(take)) as u8) << self.offset;
            self.offset += take;
            value >>= take;
            remaining -= take;
            if self.offset == 8 {
                commit(self.byte);
                *self = Self::default();
            }
        }
    }

    /// Commits the partially filled byte, zero-padding the unused high-order bits.
    pub fn flush(&mut self, commit: impl FnOnce(u8)) {
        if !self.is_aligned() {
            commit(self.byte);
            *self = Self::default();
        }
    }

    /// Extracts the next `width` bits, calling `next` whenever a new byte is needed.
    ///
    /// # Errors
    ///
    /// Returns the error of `next` if a byte cannot be fetched.
    pub fn unpack<E>(
        &mut self,
        width: u8,
        mut next: impl FnMut() -> Result<u8, E>,
    ) -> Result<u64, E> {
        let mut value = 0u64;
        let mut filled = 0u8;
        while filled < width {
            if self.is_aligned() {
                self.byte = next()?;
            }
            let take = (8 - self.offset).min(width - filled);
            value |= (u64::from(self.byte >> self.offset) & mask(take)) << filled;
            filled += take;
            self.offset += take;
            if self.offset == 8 {
                *self = Self::default();
            }
        }
        Ok(value)
    }

    /// Discards the unread bits of the current byte.
    pub fn align(&mut self) {
        *self = Self::default();
    }
}

/// Returns a mask covering the low `width` bits.
pub(crate) const fn mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::gen_range;

    #[test]
    fn pack_two_nibbles() {
        let mut cursor = BitCursor::default();
        let mut bytes = Vec::new();
        cursor.pack(0x4, 4, |byte| bytes.push(byte));
        assert!(bytes.is_empty());
        assert!(!cursor.is_aligned());
        cursor.pack(0xc, 4, |byte| bytes.push(byte));
        assert_eq!(bytes, [0xc4]);
        assert!(cursor.is_aligned());
    }

    #[test]
    fn pack_masks_wider_values() {
        let mut cursor = BitCursor::default();
        let mut bytes = Vec::new();
        cursor.pack(0xff, 3, |byte| bytes.push(byte));
        cursor.flush(|byte| bytes.push(byte));
        assert_eq!(bytes, [0b0000_0111]);
    }

    #[test]
    fn pack_spills_into_next_byte() {
        let mut cursor = BitCursor::default();
        let mut bytes = Vec::new();
        cursor.pack(0b11_0101, 6, |byte| bytes.push(byte));
        cursor.pack(0b1011, 4, |byte| bytes.push(byte));
        cursor.flush(|byte| bytes.push(byte));
        assert_eq!(bytes, [0b1111_0101, 0b0000_0010]);
    }

    #[test]
    fn flush_aligned_is_noop() {
        let mut cursor = BitCursor::default();
        let mut bytes = Vec::<u8>::new();
        cursor.flush(|byte| bytes.push(byte));
        assert!(bytes.is_empty());
    }

    #[test]
    fn unpack_reverses_pack() {
        let mut bytes = [0b1111_0101, 0b0000_0010].into_iter();
        let mut cursor = BitCursor::default();
        let mut next = || bytes.next().ok_or(());
        assert_eq!(cursor.unpack(6, &mut next), Ok(0b11_0101));
        assert_eq!(cursor.unpack(4, &mut next), Ok(0b1011));
        cursor.align();
        assert_eq!(cursor.unpack(1, &mut next), Err(()));
    }

    #[test]
    fn random_widths_pack_densely() {
        for _ in 0..100 {
            let width = gen_range(1..=8u8);
            let count = gen_range(1..=32usize);
            let values: Vec<u64> = (0..count).map(|_| gen_range(0..=mask(width))).collect();

            let mut cursor = BitCursor::default();
            let mut bytes = Vec::new();
            for value in &values {
                cursor.pack(*value, width, |byte| bytes.push(byte));
            }
            cursor.flush(|byte| bytes.push(byte));
            assert_eq!(bytes.len(), (count * usize::from(width)).div_ceil(8));

            let mut source = bytes.into_iter();
            let mut cursor = BitCursor::default();
            for value in values {
                assert_eq!(cursor.unpack(width, || source.next().ok_or(())), Ok(value));
            }
        }
    }
}
