//! Horizontal layout helpers

/// Origin that centers a `text_width` px string on a `display_width` px line
///
/// `(W - w) / 2` with integer division; text wider than the display is
/// pinned to the left edge.
pub fn center_x(display_width: u16, text_width: u16) -> i16 {
    (display_width.saturating_sub(text_width) / 2) as i16
}
