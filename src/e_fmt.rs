use crate::e_types::Outcome;
use nu_ansi_term::Color;
use std::io::IsTerminal;
use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    } else if minutes > 0 {
        format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
    } else {
        format!("{:02}.{:03}", seconds, millis)
    }
}

/// Helper: Format a Duration in a human-readable way.
pub fn format_duration_secs(d: Duration) -> String {
    let secs = d.as_secs();
    let millis = d.subsec_millis();
    format!("{}.{:03} secs", secs, millis)
}

/// Outcome text, coloured green or red when stdout is a terminal.
pub fn paint_outcome(outcome: Outcome) -> String {
    if !std::io::stdout().is_terminal() {
        return outcome.to_string();
    }
    let color = if outcome.is_success() {
        Color::Green
    } else {
        Color::Red
    };
    color.bold().paint(outcome.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1_250)), "01.250");
        assert_eq!(format_duration(Duration::from_secs(61)), "01:01.000");
        assert_eq!(format_duration(Duration::from_secs(3_661)), "01:01:01.000");
        assert_eq!(format_duration_secs(Duration::from_millis(30_005)), "30.005 secs");
    }
}
