use serde::{Deserialize, Serialize};

/// Color channel of the source imagery that carries the overlay's value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    R,
    G,
    #[default]
    B,
}

impl Channel {
    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        }
    }
}

/// How an overlay turns one 8-bit channel back into a physical value and then
/// into color.
///
/// Imagery is encoded as `value / encoded_max * 255`; the ramp saturates at
/// `display_cap` and uses the normalized value as opacity.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerStyle {
    pub visible: bool,
    pub channel: Channel,
    pub encoded_max: f32,
    pub display_cap: f32,
    /// Fraction of a turn added to texture `u` before sampling.
    pub lon_offset: f32,
    /// Lift above the globe surface as a fraction of its radius.
    pub lift: f32,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            channel: Channel::B,
            encoded_max: 110.0,
            display_cap: 70.0,
            lon_offset: 0.25,
            lift: 0.002,
        }
    }
}

/// Texel-level operations a renderer samples with. The core never decodes
/// imagery itself; it hands the style out with the overlay's asset.
impl LayerStyle {
    /// Decoded physical value of a texel.
    pub fn decode(&self, rgb: [u8; 3]) -> f32 {
        f32::from(rgb[self.channel.index()]) / 255.0 * self.encoded_max
    }

    /// Overlay color (RGBA, straight alpha) for a texel.
    pub fn shade(&self, rgb: [u8; 3]) -> [f32; 4] {
        if !self.visible || self.display_cap <= 0.0 {
            return [0.0; 4];
        }
        let t = (self.decode(rgb) / self.display_cap).clamp(0.0, 1.0);
        [1.0, 0.0, 0.0, t]
    }

    /// Texture coordinate after the longitude shift, wrapped into `[0, 1)`.
    pub fn wrap_u(&self, u: f32) -> f32 {
        (u + self.lon_offset).rem_euclid(1.0)
    }
}
