use serde::{Deserialize, Serialize};

/// Position and size of a player's visual surface, relative to its host container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackGeometry {
    /// Left edge in container coordinates
    pub x: i32,
    /// Top edge in container coordinates
    pub y: i32,
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
}

impl PlaybackGeometry {
    pub const DEFAULT_WIDTH: u32 = 640;
    pub const DEFAULT_HEIGHT: u32 = 360;

    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Update the upper left corner, keeping the size
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Update the size, keeping the position
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Default for PlaybackGeometry {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let geometry = PlaybackGeometry::default();
        assert_eq!(geometry, PlaybackGeometry::new(0, 0, 640, 360));
    }

    #[test]
    fn test_position_and_size_are_independent() {
        let mut geometry = PlaybackGeometry::default();
        geometry.set_position(-20, 15);
        assert_eq!((geometry.width, geometry.height), (640, 360));

        geometry.set_size(1280, 720);
        assert_eq!((geometry.x, geometry.y), (-20, 15));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let geometry: PlaybackGeometry = toml::from_str("width = 320").unwrap();
        assert_eq!(geometry, PlaybackGeometry::new(0, 0, 320, 360));
    }
}
