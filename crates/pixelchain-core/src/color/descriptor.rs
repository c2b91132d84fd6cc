//! Partial RGBA color used as a swap match filter or replacement.

use serde::{Deserialize, Serialize};

use crate::config::SwapMatching;

/// An RGBA color where every channel is optional.
///
/// As a match filter an absent channel matches any value. As a replacement
/// an absent channel leaves the pixel's channel untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<u8>,
}

impl ColorDescriptor {
    /// A descriptor with no channels set.
    pub const fn any() -> Self {
        Self {
            r: None,
            g: None,
            b: None,
            a: None,
        }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: Some(r),
            g: Some(g),
            b: Some(b),
            a: None,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: Some(r),
            g: Some(g),
            b: Some(b),
            a: Some(a),
        }
    }

    pub const fn with_r(mut self, r: u8) -> Self {
        self.r = Some(r);
        self
    }

    pub const fn with_g(mut self, g: u8) -> Self {
        self.g = Some(g);
        self
    }

    pub const fn with_b(mut self, b: u8) -> Self {
        self.b = Some(b);
        self
    }

    pub const fn with_a(mut self, a: u8) -> Self {
        self.a = Some(a);
        self
    }

    /// Channels in RGBA order.
    pub const fn channels(&self) -> [Option<u8>; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Whether every channel set in `self` matches the pixel.
    ///
    /// Under [`SwapMatching::Legacy`] a channel set to `0` behaves like an
    /// absent one, so a filter cannot single out zero-valued samples.
    pub fn matches(&self, px: &[u8; 4], matching: SwapMatching) -> bool {
        self.channels()
            .iter()
            .zip(px)
            .all(|(want, have)| match (want, matching) {
                (None, _) => true,
                (Some(0), SwapMatching::Legacy) => true,
                (Some(v), _) => v == have,
            })
    }

    /// Overwrite the pixel's channels that are set in `self`.
    pub fn paint(&self, px: &mut [u8; 4]) {
        for (slot, value) in px.iter_mut().zip(self.channels()) {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

impl From<palette::Srgba<u8>> for ColorDescriptor {
    fn from(color: palette::Srgba<u8>) -> Self {
        Self::rgba(color.red, color.green, color.blue, color.alpha)
    }
}

impl From<palette::Srgb<u8>> for ColorDescriptor {
    fn from(color: palette::Srgb<u8>) -> Self {
        Self::rgb(color.red, color.green, color.blue)
    }
}
