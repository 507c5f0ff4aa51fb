//! Display driver trait

/// Errors that can occur with the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus transfer failed
    Communication,
    /// Frame buffer could not hold the draw call
    BufferOverflow,
}

/// Fonts available to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    /// 8 px, status lines and the date
    Small,
    /// 12 px, temperature and humidity
    Medium,
    /// 18 px, time of day
    Large,
}

impl Font {
    /// Nominal glyph height in pixels
    pub fn height(&self) -> u8 {
        match self {
            Font::Small => 8,
            Font::Medium => 12,
            Font::Large => 18,
        }
    }
}

/// Text measurement, needed to lay out centered strings
pub trait TextMetrics {
    /// Display width in pixels
    fn width(&self) -> u16;

    /// Rendered width of `text` in pixels
    fn text_width(&self, text: &str, font: Font) -> u16;
}

/// Trait for a buffered pixel display
///
/// Draw calls go to a frame buffer; nothing is visible until [`flush`].
///
/// [`flush`]: DisplayDriver::flush
pub trait DisplayDriver: TextMetrics {
    /// Clear the frame buffer
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw text with its baseline at `y`, starting at `x`
    fn draw_text(&mut self, text: &str, x: i16, y: i16, font: Font) -> Result<(), DisplayError>;

    /// Send the frame buffer to the panel
    fn flush(&mut self) -> Result<(), DisplayError>;
}
