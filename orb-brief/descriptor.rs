/// Number of bits of one descriptor.
pub const DESCRIPTOR_BITS: usize = 256;

/// Number of bytes of one serialized descriptor.
pub const DESCRIPTOR_BYTES: usize = DESCRIPTOR_BITS / 8;

const WORDS: usize = DESCRIPTOR_BITS / 64;

/// 256-bit binary descriptor; bit `i` is the outcome of the `i`-th intensity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbDescriptor([u64; WORDS]);

impl OrbDescriptor {
    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    pub const fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        debug_assert!(index < DESCRIPTOR_BITS);
        (self.0[index / 64] >> (index % 64)) & 1 == 1
    }

    #[inline]
    pub fn set_bit(&mut self, index: usize, value: bool) {
        debug_assert!(index < DESCRIPTOR_BITS);
        let mask = 1u64 << (index % 64);
        if value {
            self.0[index / 64] |= mask;
        } else {
            self.0[index / 64] &= !mask;
        }
    }

    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|word| word.count_ones()).sum()
    }

    /// Number of differing bits, range [0, 256].
    #[inline]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        calculate_hamming_distance(self, other)
    }

    /// Serialized form, bit `i` at byte `i / 8`, bit position `i % 8`.
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_BYTES] {
        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; DESCRIPTOR_BYTES]) -> Self {
        let mut words = [0u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word_bytes = [0u8; 8];
            word_bytes.copy_from_slice(chunk);
            *word = u64::from_le_bytes(word_bytes);
        }
        Self(words)
    }
}

/// Population count of `a XOR b`.
#[inline]
pub fn calculate_hamming_distance(a: &OrbDescriptor, b: &OrbDescriptor) -> u32 {
    (a.0[0] ^ b.0[0]).count_ones()
        + (a.0[1] ^ b.0[1]).count_ones()
        + (a.0[2] ^ b.0[2]).count_ones()
        + (a.0[3] ^ b.0[3]).count_ones()
}
