//! Draw colors and the color palette.

use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::error::PaletteError;

/// An RGBA color with each channel in `[0, 1]`.
///
/// Serializes as `{"r":..,"g":..,"b":..,"a":..}`, which is the form used on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Rgba = Rgba::new(1.0, 0.92, 0.016, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channels in `r, g, b, a` order, paired with their names.
    pub fn channels(&self) -> [(&'static str, f32); 4] {
        [("r", self.r), ("g", self.g), ("b", self.b), ("a", self.a)]
    }

    /// True if every channel is finite and within `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        self.channels()
            .iter()
            .all(|(_, v)| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::new([c.r, c.g, c.b, c.a])
    }
}

/// Fixed set of colors the annotating participant picks from.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Rgba>,
    selected: usize,
}

impl Palette {
    /// Create a palette. The first color starts selected; an empty list
    /// falls back to black.
    pub fn new(colors: Vec<Rgba>) -> Self {
        let colors = if colors.is_empty() { vec![Rgba::BLACK] } else { colors };
        Self { colors, selected: 0 }
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Rgba {
        self.colors[self.selected]
    }

    /// Select a color by index and return it.
    pub fn select(&mut self, index: usize) -> Result<Rgba, PaletteError> {
        if index >= self.colors.len() {
            return Err(PaletteError::OutOfRange {
                index,
                len: self.colors.len(),
            });
        }
        self.selected = index;
        Ok(self.colors[index])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(vec![
            Rgba::BLACK,
            Rgba::WHITE,
            Rgba::RED,
            Rgba::GREEN,
            Rgba::BLUE,
            Rgba::YELLOW,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette_starts_black() {
        let palette = Palette::default();
        assert_eq!(palette.selected_index(), 0);
        assert_eq!(palette.selected(), Rgba::BLACK);
    }

    #[test]
    fn test_select_color() {
        let mut palette = Palette::default();
        assert_eq!(palette.select(2), Ok(Rgba::RED));
        assert_eq!(palette.selected(), Rgba::RED);
    }

    #[test]
    fn test_select_out_of_range_keeps_selection() {
        let mut palette = Palette::default();
        palette.select(1).unwrap();
        let err = palette.select(42).unwrap_err();
        assert_eq!(err, PaletteError::OutOfRange { index: 42, len: 6 });
        assert_eq!(palette.selected(), Rgba::WHITE);
    }

    #[test]
    fn test_empty_palette_falls_back_to_black() {
        let palette = Palette::new(Vec::new());
        assert_eq!(palette.colors(), &[Rgba::BLACK]);
    }

    #[test]
    fn test_validity() {
        assert!(Rgba::YELLOW.is_valid());
        assert!(!Rgba::new(1.5, 0.0, 0.0, 1.0).is_valid());
        assert!(!Rgba::new(f32::NAN, 0.0, 0.0, 1.0).is_valid());
    }

    #[test]
    fn test_into_peniko() {
        let color: Color = Rgba::new(0.25, 0.5, 0.75, 1.0).into();
        assert_eq!(color.components, [0.25, 0.5, 0.75, 1.0]);
    }
}
