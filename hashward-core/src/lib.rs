//! Hashward Core - perceptual-signature matching engine for image spam.
//!
//! Computes robust perceptual signatures for still and animated images and
//! evaluates them against a reference database of known spam images. A
//! candidate matches when enough of three independent full-image hashes
//! agree (the voting rule) or enough cells of a 3x3 spatial grid agree (the
//! grid rule), checked across sampled frames and the four axis-aligned
//! rotations.
//!
//! # Example
//!
//! ```no_run
//! use hashward_core::{check_bytes, MatcherConfig, SignatureStore};
//!
//! # fn example() -> hashward_core::Result<()> {
//! let store = SignatureStore::open("references")?;
//! let candidate = std::fs::read("suspect.png")?;
//!
//! let config = MatcherConfig::default();
//! if let Some(hit) = check_bytes(&candidate, &store.snapshot(), &config) {
//!     println!("matched {} via {} at {}", hit.reference, hit.reason, hit.rotation);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod frames;
pub mod matcher;
pub mod orient;
pub mod scan;
pub mod signature;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{HashwardError, Result};
pub use frames::{sample_frames, DEFAULT_FRAME_LIMIT};
pub use matcher::{check_bytes, check_frame, evaluate, MatchOutcome, MatchReason, MatcherConfig};
pub use orient::Rotation;
pub use scan::{
    collect_image_urls, extract_image_urls, AttachmentRef, HttpFetcher, ImageFetcher,
    MessageContent, ScanMatch, Scanner, DEFAULT_FETCH_TIMEOUT,
};
pub use signature::{FullSignature, GridSignature, Signature, SignatureHasher};
pub use store::{
    has_image_extension, ReferenceEntry, SignatureDatabase, SignatureStore, IMAGE_EXTENSIONS,
};
