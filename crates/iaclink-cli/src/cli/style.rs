use std::fmt::Display;

use ansi_term::{Colour, Style};

/// What a highlighted word in the command output conveys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Info,
    Warning,
    Failure,
}

impl Tone {
    fn style(self) -> Style {
        let colour = match self {
            Tone::Success => Colour::Green,
            Tone::Info => Colour::Cyan,
            Tone::Warning => Colour::Yellow,
            Tone::Failure => Colour::Red,
        };
        colour.bold()
    }
}

/// Highlights `text` when stdout is a terminal; piped output stays plain.
pub fn paint(tone: Tone, text: impl Display) -> String {
    paint_if(atty::is(atty::Stream::Stdout), tone, text)
}

fn paint_if(enabled: bool, tone: Tone, text: impl Display) -> String {
    let text = text.to_string();
    if enabled {
        tone.style().paint(text).to_string()
    } else {
        text
    }
}

/// `1 edge`, `3 edges`
pub fn count(value: usize, noun: &str) -> String {
    match value {
        1 => format!("1 {}", noun),
        n => format!("{} {}s", n, noun),
    }
}
