//! Frame sampling for still and animated candidates.
//!
//! Animated images are reduced to a bounded, evenly spaced subset of frames
//! so matching cost stays fixed regardless of animation length. Every frame
//! is normalized to 3-channel RGB8 before hashing.

use std::collections::BTreeSet;
use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat};
use tracing::debug;

/// Default maximum number of frames sampled from an animation.
pub const DEFAULT_FRAME_LIMIT: usize = 8;

/// Decode raw bytes into up to `limit` representative frames.
///
/// Non-animated input yields a single frame. Undecodable input yields an
/// empty sequence: the candidate then cannot match anything, which is the
/// designed fail-open behavior, never an error.
pub fn sample_frames(bytes: &[u8], limit: usize) -> Vec<DynamicImage> {
    let animated = match image::guess_format(bytes) {
        Ok(ImageFormat::Gif) => GifDecoder::new(Cursor::new(bytes))
            .ok()
            .map(collect_animation_frames),
        Ok(ImageFormat::WebP) => WebPDecoder::new(Cursor::new(bytes))
            .ok()
            .filter(|decoder| decoder.has_animation())
            .map(collect_animation_frames),
        _ => None,
    };

    let frames = match animated {
        Some(frames) if !frames.is_empty() => frames,
        _ => match image::load_from_memory(bytes) {
            Ok(image) => vec![DynamicImage::ImageRgb8(image.to_rgb8())],
            Err(err) => {
                debug!(error = %err, "candidate failed to decode, skipping");
                return Vec::new();
            }
        },
    };

    let total = frames.len();
    if total <= 1 {
        return frames;
    }

    let keep = sample_indices(total, limit);
    frames
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, frame)| frame)
        .collect()
}

/// Decode every frame of an animation, skipping frames that fail.
fn collect_animation_frames<'a, D>(decoder: D) -> Vec<DynamicImage>
where
    D: AnimationDecoder<'a>,
{
    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        match frame {
            Ok(frame) => {
                let rgb = DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8();
                frames.push(DynamicImage::ImageRgb8(rgb));
            }
            Err(err) => debug!(error = %err, "skipping undecodable frame"),
        }
    }
    frames
}

/// Evenly spaced frame indices: `idx(i) = round(i * (total-1) / (limit-1))`.
///
/// Short animations produce duplicate indices, which the set removes, so
/// the result spans `0..total` and always includes the first and last frame.
pub(crate) fn sample_indices(total: usize, limit: usize) -> BTreeSet<usize> {
    let mut keep = BTreeSet::new();
    if total == 0 {
        return keep;
    }
    if limit <= 1 {
        keep.insert(0);
        return keep;
    }
    for i in 0..limit {
        let idx = (i as f64 * (total - 1) as f64 / (limit - 1) as f64).round() as usize;
        keep.insert(idx.min(total - 1));
    }
    keep
}
