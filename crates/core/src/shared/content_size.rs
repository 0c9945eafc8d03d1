/// Logical size at which content is displayed, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContentSize {
    pub width: u32,
    pub height: u32,
}

impl ContentSize {
    pub const ZERO: ContentSize = ContentSize {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, i.e. the content is not ready.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both sides by `scale`, rounding and keeping each side at least 1.
    pub fn scaled(&self, scale: f32) -> ContentSize {
        let side = |v: u32| ((v as f32 * scale).round() as u32).max(1);
        ContentSize {
            width: side(self.width),
            height: side(self.height),
        }
    }
}

impl From<(u32, u32)> for ContentSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}
