//! Signature computation: a triple full-image hash plus a 3x3 spatial grid.
//!
//! Every candidate variant and every reference entry is reduced to the same
//! [`Signature`] shape, so matching is a pure comparison of bit vectors.
//!
//! # Algorithms
//!
//! Three independent 64-bit perceptual hashes cover different visual
//! properties: phash (DCT preprocess + mean, frequency-domain structure),
//! dhash (gradient direction), and ahash (coarse brightness). The grid
//! signature applies phash to each cell of a 3x3 partition so that crops
//! and partial occlusions can still be recognized spatially.

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};

/// Hash edge length; every hash is 8x8 = 64 bits.
pub const HASH_SIZE: u32 = 8;

/// Edge of the spatial partition.
pub const GRID_DIM: u32 = 3;

/// Number of cells in a grid signature, always `GRID_DIM` squared.
pub const GRID_CELLS: usize = (GRID_DIM * GRID_DIM) as usize;

/// Whether two hashes of the same algorithm agree within `threshold`.
///
/// The cutoff is inclusive: a pair at exactly `threshold` bits apart counts.
pub fn within(a: &ImageHash, b: &ImageHash, threshold: u32) -> bool {
    a.dist(b) <= threshold
}

/// The three whole-frame hashes for one image variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FullSignature {
    pub phash: ImageHash,
    pub dhash: ImageHash,
    pub ahash: ImageHash,
}

/// One phash per cell of the 3x3 partition, row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSignature(pub [ImageHash; GRID_CELLS]);

/// The unit compared during matching: full-image and spatial-grid hashes
/// computed for one frame at one orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub full: FullSignature,
    pub grid: GridSignature,
}

impl Signature {
    /// Count how many of the three full-image algorithms agree with `other`
    /// within `threshold` (0..=3).
    pub fn votes_against(&self, other: &Signature, threshold: u32) -> u32 {
        let pairs = [
            (&self.full.phash, &other.full.phash),
            (&self.full.dhash, &other.full.dhash),
            (&self.full.ahash, &other.full.ahash),
        ];
        pairs
            .iter()
            .filter(|(a, b)| within(a, b, threshold))
            .count() as u32
    }

    /// Count how many of the nine cell pairs agree with `other` within
    /// `threshold` (0..=9).
    pub fn grid_matches_against(&self, other: &Signature, threshold: u32) -> u32 {
        self.grid
            .0
            .iter()
            .zip(other.grid.0.iter())
            .filter(|(a, b)| within(a, b, threshold))
            .count() as u32
    }
}

/// Configured hashers for signature computation.
///
/// Computation is pure and deterministic: identical input pixels always
/// produce bit-identical hashes.
pub struct SignatureHasher {
    phash: Hasher,
    dhash: Hasher,
    ahash: Hasher,
}

impl SignatureHasher {
    pub fn new() -> Self {
        let phash = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .preproc_dct()
            .hash_alg(HashAlg::Mean)
            .to_hasher();
        let dhash = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Gradient)
            .to_hasher();
        let ahash = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Mean)
            .to_hasher();
        Self {
            phash,
            dhash,
            ahash,
        }
    }

    /// Compute the complete signature for one oriented frame.
    pub fn compute(&self, image: &DynamicImage) -> Signature {
        Signature {
            full: self.full(image),
            grid: self.grid(image),
        }
    }

    fn full(&self, image: &DynamicImage) -> FullSignature {
        FullSignature {
            phash: self.phash.hash_image(image),
            dhash: self.dhash.hash_image(image),
            ahash: self.ahash.hash_image(image),
        }
    }

    fn grid(&self, image: &DynamicImage) -> GridSignature {
        let (w, h) = (image.width(), image.height());
        // Remainder pixels past the last multiple of 3 are dropped on the
        // right/bottom edge; stored reference signatures depend on these
        // exact bounds.
        let gw = w / GRID_DIM;
        let gh = h / GRID_DIM;
        // Inputs narrower/shorter than 3 px get 1 px cells so the partition
        // still yields nine hashable regions.
        let cw = gw.max(1);
        let ch = gh.max(1);
        let cells = std::array::from_fn(|i| {
            let col = i as u32 % GRID_DIM;
            let row = i as u32 / GRID_DIM;
            let x = (col * gw).min(w.saturating_sub(cw));
            let y = (row * gh).min(h.saturating_sub(ch));
            let cell = image.crop_imm(x, y, cw, ch);
            self.phash.hash_image(&cell)
        });
        GridSignature(cells)
    }
}

impl Default for SignatureHasher {
    fn default() -> Self {
        Self::new()
    }
}
