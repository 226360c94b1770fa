//! Deterministic seed derivation shared by authority and predicting peers.
//!
//! Each character owns one [`SeedSequence`] created from a root seed that is
//! transmitted with the full-state sync. Every spawn attempt draws the next
//! seed, whether or not the spawn succeeds, so both peers walk the sequence in
//! the same order. Spawned effects expand their seed with [`EffectRng`].

/// Cursor over the per-activation seeds derived from a root seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedSequence {
    root: u64,
    cursor: u64,
}

impl SeedSequence {
    pub const fn new(root: u64) -> Self {
        Self { root, cursor: 0 }
    }

    pub const fn with_cursor(root: u64, cursor: u64) -> Self {
        Self { root, cursor }
    }

    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Number of seeds drawn so far.
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: u64) {
        self.cursor = cursor;
    }

    /// Seed the next draw will return.
    pub fn peek(&self) -> u64 {
        derive_seed(self.root, self.cursor)
    }

    /// Returns the seed at the cursor and advances.
    pub fn next_seed(&mut self) -> u64 {
        let seed = self.peek();
        self.cursor = self.cursor.wrapping_add(1);
        seed
    }
}

/// Mixes the root seed with a draw index.
///
/// Constants are the SplitMix64 / FxHash multipliers followed by the
/// MurmurHash3 finalizer.
pub fn derive_seed(root: u64, index: u64) -> u64 {
    let mut hash = root;
    hash ^= index.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (index >> 32).wrapping_mul(0x517cc1b727220a95);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

/// PCG-XSH-RR stream used inside a single spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectRng {
    state: u64,
}

impl EffectRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        let state = self.state;
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform value in `[-magnitude, magnitude)`.
    pub fn next_signed(&mut self, magnitude: f32) -> f32 {
        (self.next_unit() * 2.0 - 1.0) * magnitude
    }
}
