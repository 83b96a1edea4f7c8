use serde::{Deserialize, Serialize};

use crate::data_structures::primitive::ElementKind;

/// A 24-bit `0xRRGGBB` colour value, the key of the material cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
    pub const BLACK: Colour = Colour(0x000000);

    pub fn to_rgb(self) -> [f32; 3] {
        let channel = |shift: u32| ((self.0 >> shift) & 0xff) as f32 / 255.0;
        [channel(16), channel(8), channel(0)]
    }

    pub fn to_rgba(self) -> [f32; 4] {
        let [r, g, b] = self.to_rgb();
        [r, g, b, 1.0]
    }

    /// CSS notation, e.g. `#8b4513`.
    pub fn hex(self) -> String {
        format!("#{:06x}", self.0 & 0xff_ffff)
    }
}

/// Default colour per element kind.
pub fn colour_for(kind: ElementKind) -> Colour {
    match kind {
        ElementKind::Wall => Colour(0xcccccc),
        ElementKind::Slab => Colour(0x999999),
        ElementKind::Window => Colour(0x87ceeb),
        ElementKind::Door => Colour(0x8b4513),
        ElementKind::Column => Colour(0x666666),
        ElementKind::Beam => Colour(0x8d6e63),
        ElementKind::Stair => Colour(0xa0522d),
        ElementKind::Ramp => Colour(0xb0bec5),
        ElementKind::Other => Colour(0x4caf50),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_channels() {
        assert_eq!(Colour(0xff8000).to_rgb(), [1.0, 128.0 / 255.0, 0.0]);
        assert_eq!(Colour(0x8b4513).hex(), "#8b4513");
        assert_eq!(Colour(0x0000ff).hex(), "#0000ff");
    }
}
