use ratatui::style::Color;

use crate::model::UiConfig;
use crate::model::task::BlockType;
use crate::ops::deadline::DeadlineStatus;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    /// Slot borders
    pub slot: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x1E, 0x1E, 0x1E),
            text: Color::Rgb(0xE0, 0xE0, 0xE0),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0x55, 0xFF, 0x55),
            dim: Color::Rgb(0x6B, 0x6B, 0x6B),
            slot: Color::Rgb(0x8B, 0x8B, 0x8B),
            red: Color::Rgb(0xFF, 0x55, 0x55),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x55, 0xFF, 0x55),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

pub fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

impl Theme {
    /// Create a theme from `[ui.colors]`, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            match key.as_str() {
                "background" => theme.background = color,
                "text" => theme.text = color,
                "text_bright" => theme.text_bright = color,
                "highlight" => theme.highlight = color,
                "dim" => theme.dim = color,
                "slot" => theme.slot = color,
                "red" => theme.red = color,
                "yellow" => theme.yellow = color,
                "green" => theme.green = color,
                _ => {}
            }
        }
        theme
    }

    /// Main colour of a block's glyph
    pub fn block_color(&self, block: BlockType) -> Color {
        rgb(block.palette()[0])
    }

    pub fn deadline_color(&self, status: DeadlineStatus) -> Color {
        match status {
            DeadlineStatus::None | DeadlineStatus::Ok => self.text,
            DeadlineStatus::Urgent => self.yellow,
            DeadlineStatus::Overdue => self.red,
        }
    }

    /// Mix `color` toward the background; `amount` 1.0 keeps the colour, 0.0 is background
    pub fn fade(&self, color: Color, amount: f32) -> Color {
        let (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) = (color, self.background) else {
            return color;
        };
        let t = amount.clamp(0.0, 1.0);
        let mix = |c: u8, base: u8| (base as f32 + (c as f32 - base as f32) * t).round() as u8;
        Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
    }
}
