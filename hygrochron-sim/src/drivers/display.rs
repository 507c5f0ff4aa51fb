//! Terminal stand-in for the OLED panel
//!
//! Draw calls are collected into a frame; on flush the frame is rendered
//! as text lines (grouped by baseline) and logged when it differs from the
//! previous one.

use hygrochron_core::traits::{DisplayDriver, DisplayError, Font, TextMetrics};
use log::{info, trace};

/// Panel width in pixels
const WIDTH: u16 = 128;

#[derive(Debug, Clone, PartialEq)]
struct Glyphs {
    text: String,
    x: i16,
    y: i16,
}

/// Logs every changed frame
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    pending: Vec<Glyphs>,
    shown: Vec<String>,
    frames: u32,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn advance(font: Font) -> u16 {
        match font {
            Font::Small => 6,
            Font::Medium => 8,
            Font::Large => 12,
        }
    }

    /// Lines of the last flushed frame, top to bottom
    pub fn lines(&self) -> &[String] {
        &self.shown
    }

    /// Join runs sharing a baseline, left to right
    fn compose(runs: &[Glyphs]) -> Vec<String> {
        let mut sorted: Vec<&Glyphs> = runs.iter().collect();
        sorted.sort_by_key(|g| (g.y, g.x));

        let mut lines: Vec<(i16, String)> = Vec::new();
        for glyphs in sorted {
            match lines.last_mut() {
                Some((y, line)) if *y == glyphs.y => line.push_str(&glyphs.text),
                _ => lines.push((glyphs.y, glyphs.text.clone())),
            }
        }
        lines.into_iter().map(|(_, line)| line).collect()
    }
}

impl TextMetrics for TerminalDisplay {
    fn width(&self) -> u16 {
        WIDTH
    }

    fn text_width(&self, text: &str, font: Font) -> u16 {
        (text.chars().count() as u16).saturating_mul(Self::advance(font))
    }
}

impl DisplayDriver for TerminalDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i16, y: i16, _font: Font) -> Result<(), DisplayError> {
        self.pending.push(Glyphs {
            text: text.to_owned(),
            x,
            y,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let lines = Self::compose(&self.pending);
        self.frames = self.frames.wrapping_add(1);
        if lines != self.shown {
            info!(target: "display", "| {}", lines.join(" | "));
            self.shown = lines;
        } else {
            trace!(target: "display", "frame {} unchanged", self.frames);
        }
        Ok(())
    }
}
