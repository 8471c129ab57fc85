//! Orientation variants for rotation-invariant matching.
//!
//! Screenshots of a known spam image are sometimes reposted rotated, so
//! every candidate frame is checked at the four axis-aligned rotations.
//! Stored references stay unrotated; expanding the candidate is equivalent
//! and keeps the database at one entry per distinct image.

use std::fmt;

use image::DynamicImage;
use serde::Serialize;

/// An axis-aligned rotation applied to a candidate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Evaluation order: unrotated first, then quarter turns.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Rotate without cropping: 90/270 swap the bounding box, 0 is identity.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Rotation::Deg0 => image.clone(),
            Rotation::Deg90 => image.rotate90(),
            Rotation::Deg180 => image.rotate180(),
            Rotation::Deg270 => image.rotate270(),
        }
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn test_image() -> DynamicImage {
        let img = ImageBuffer::from_fn(30, 20, |x, y| Rgb([x as u8, y as u8, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_identity_rotation() {
        let image = test_image();
        assert_eq!(Rotation::Deg0.apply(&image), image);
    }

    #[test]
    fn test_quarter_turns_swap_bounding_box() {
        let image = test_image();
        let rotated = Rotation::Deg90.apply(&image);
        assert_eq!((rotated.width(), rotated.height()), (20, 30));
        let rotated = Rotation::Deg270.apply(&image);
        assert_eq!((rotated.width(), rotated.height()), (20, 30));
        let rotated = Rotation::Deg180.apply(&image);
        assert_eq!((rotated.width(), rotated.height()), (30, 20));
    }

    #[test]
    fn test_evaluation_order() {
        let degrees: Vec<u32> = Rotation::ALL.iter().map(|r| r.degrees()).collect();
        assert_eq!(degrees, [0, 90, 180, 270]);
    }

    #[test]
    fn test_full_turn_round_trips() {
        let image = test_image();
        let once = Rotation::Deg180.apply(&image);
        assert_eq!(Rotation::Deg180.apply(&once), image);
    }
}
