use std::sync::OnceLock;

pub const DESCRIPTOR_BYTES: usize = 32;
pub const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// 256 packed intensity comparisons.
pub type BinaryDescriptor = [u8; DESCRIPTOR_BYTES];

/// Patch radius of the rotated ORB tests (31x31 patch).
pub const ORB_PATCH_RADIUS: f32 = 15.0;
/// Half extent of the unrotated BRIEF tests.
pub const BRIEF_HALF_EXTENT: f32 = 20.0;

/// One binary test: bit is set when `p1` is darker than `p2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestPair {
    pub p1: (f32, f32),
    pub p2: (f32, f32),
}

/// Test points drawn uniformly from the disc of `ORB_PATCH_RADIUS`, so every
/// rotation stays inside the patch.
pub fn disc_pattern() -> &'static [TestPair] {
    static CACHE: OnceLock<Vec<TestPair>> = OnceLock::new();
    CACHE.get_or_init(|| {
        let mut rng = XorShift64::new(0xDEAD_BEEF_CAFE_BABE);
        generate(&mut rng, |rng| loop {
            let x = rng.next_signed() * ORB_PATCH_RADIUS;
            let y = rng.next_signed() * ORB_PATCH_RADIUS;
            if x * x + y * y <= ORB_PATCH_RADIUS * ORB_PATCH_RADIUS {
                return (x, y);
            }
        })
    })
}

/// Integer test points drawn uniformly from the square of
/// `BRIEF_HALF_EXTENT`.
pub fn square_pattern() -> &'static [TestPair] {
    static CACHE: OnceLock<Vec<TestPair>> = OnceLock::new();
    CACHE.get_or_init(|| {
        let mut rng = XorShift64::new(0x5EED_B41E_F00D_1234);
        generate(&mut rng, |rng| {
            let x = (rng.next_signed() * BRIEF_HALF_EXTENT).round();
            let y = (rng.next_signed() * BRIEF_HALF_EXTENT).round();
            (x, y)
        })
    })
}

fn generate<F>(rng: &mut XorShift64, mut point: F) -> Vec<TestPair>
where
    F: FnMut(&mut XorShift64) -> (f32, f32),
{
    let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
    while pairs.len() < DESCRIPTOR_BITS {
        let p1 = point(rng);
        let p2 = point(rng);
        if p1 != p2 {
            pairs.push(TestPair { p1, p2 });
        }
    }
    pairs
}

struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 7;
        x ^= x >> 9;
        x ^= x << 8;
        self.state = x;
        x
    }

    /// Uniform in [-1, 1).
    fn next_signed(&mut self) -> f32 {
        let bits = self.next_u64() >> 40;
        (bits as f32) / (1u64 << 24) as f32 * 2.0 - 1.0
    }
}

/// Sets bit `index` of a packed descriptor.
#[inline]
pub fn set_bit(bytes: &mut BinaryDescriptor, index: usize) {
    bytes[index / 8] |= 1 << (index & 7);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_stay_inside_their_patch() {
        let disc = disc_pattern();
        assert_eq!(disc.len(), DESCRIPTOR_BITS);
        let r2 = ORB_PATCH_RADIUS * ORB_PATCH_RADIUS;
        assert!(disc.iter().all(|t| {
            t.p1.0 * t.p1.0 + t.p1.1 * t.p1.1 <= r2 && t.p2.0 * t.p2.0 + t.p2.1 * t.p2.1 <= r2
        }));

        let square = square_pattern();
        assert_eq!(square.len(), DESCRIPTOR_BITS);
        for t in square {
            for v in [t.p1.0, t.p1.1, t.p2.0, t.p2.1] {
                assert!(v.abs() <= BRIEF_HALF_EXTENT);
                assert_eq!(v, v.round());
            }
        }
    }

    #[test]
    fn patterns_are_deterministic() {
        assert_eq!(disc_pattern().as_ptr(), disc_pattern().as_ptr());
        assert_ne!(disc_pattern()[0], square_pattern()[0]);
    }
}
