use std::fmt;

/// Frame dimensions in pixels. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

/// Capture modes understood by the server's `--video-mode` flag.
pub const RESOLUTION_MODES: [(u32, Resolution); 11] = [
    (1, Resolution::from_raw(160, 120)),
    (2, Resolution::from_raw(176, 144)),
    (3, Resolution::from_raw(320, 176)),
    (4, Resolution::from_raw(320, 240)),
    (5, Resolution::from_raw(352, 288)),
    (6, Resolution::from_raw(432, 240)),
    (7, Resolution::from_raw(544, 288)),
    (8, Resolution::from_raw(640, 360)),
    (9, Resolution::from_raw(640, 480)),
    (10, Resolution::from_raw(800, 480)),
    (11, Resolution::from_raw(1024, 768)),
];

impl Resolution {
    const fn from_raw(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }

    /// Look up a mode id in [`RESOLUTION_MODES`].
    pub fn from_mode(mode: u32) -> Option<Self> {
        RESOLUTION_MODES
            .iter()
            .find(|(id, _)| *id == mode)
            .map(|(_, resolution)| *resolution)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
