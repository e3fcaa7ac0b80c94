//! Colouring of status words, when the terminal supports it

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout accepts colour
fn colour_enabled() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if colour_enabled() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colouring output by what it reports
pub trait Colorize {
    /// Something that holds (green)
    fn success(&self) -> String;
    /// Something still outstanding (amber)
    fn warning(&self) -> String;
    /// Neutral information (blue)
    fn info(&self) -> String;
    /// Secondary detail
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), |text| text.dimmed().to_string())
    }
}
