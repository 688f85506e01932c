// src/core/color.rs

use colored::{Color, ColoredString, Colorize};

/// Colors cycled through when jobs do not name one (parallel aliases).
const JOB_PALETTE: &[Color] = &[
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::BrightRed,
];

/// Parses a color name from the configuration. Unknown names fall back to white.
pub fn parse_color_name(name: &str) -> Color {
    match name.trim().to_lowercase().as_str() {
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::BrightBlack,
        "orange" => Color::TrueColor {
            r: 255,
            g: 175,
            b: 0,
        },
        "pink" => Color::TrueColor {
            r: 255,
            g: 95,
            b: 255,
        },
        "lime" => Color::BrightGreen,
        "white" => Color::White,
        other => {
            if !other.is_empty() {
                log::debug!("Unknown color '{}', using white.", other);
            }
            Color::White
        }
    }
}

/// Color of the `index`-th job of a parallel alias.
pub fn palette_color(index: usize) -> Color {
    JOB_PALETTE
        .get(index % JOB_PALETTE.len())
        .copied()
        .unwrap_or(Color::White)
}

/// The `[label]` prefix printed in front of every line of a parallel job.
pub fn label_prefix(label: &str, color: Color) -> ColoredString {
    format!("[{}]", label).color(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown_colors() {
        assert_eq!(parse_color_name("Red"), Color::Red);
        assert_eq!(parse_color_name("gray"), Color::BrightBlack);
        assert_eq!(parse_color_name("nope"), Color::White);
        assert_eq!(parse_color_name(""), Color::White);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), Color::Blue);
        assert_eq!(palette_color(JOB_PALETTE.len()), Color::Blue);
        assert_eq!(palette_color(1), Color::Green);
    }
}
