//! Benchmark fixtures for the holdfast ownership primitives.
//!
//! Payload builders shared by the criterion benches in `benches/`.

#![forbid(unsafe_code)]

/// A cache-line sized payload, large enough that allocation dominates.
#[derive(Clone, Debug, Default)]
pub struct Payload {
    /// Opaque data.
    pub words: [u64; 8],
}

impl Payload {
    /// A payload filled with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { words: [seed; 8] }
    }
}

/// `n` shared handles over `n` independent groups.
pub fn shared_groups(n: usize) -> Vec<holdfast::SharedBox<Payload>> {
    (0..n as u64)
        .map(|i| holdfast::SharedBox::new(Payload::new(i)))
        .collect()
}
