//! SRT / WebVTT cue parsing.
//!
//! Both formats are read as blank-line separated blocks. A block is an
//! optional identifier line, a `start --> end` timing line and one or more
//! text lines. Blocks that do not fit that shape are skipped on their own;
//! the remaining blocks still parse.

use crate::types::CaptionEntry;

/// Parse caption text in SRT (`00:00:01,000`) or WebVTT (`00:00:01.000`) form.
pub fn parse_captions(raw: &str) -> Vec<CaptionEntry> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = normalized.trim_start_matches('\u{feff}');

    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in normalized.lines() {
        if line.trim().is_empty() {
            if let Some(entry) = parse_block(&block) {
                entries.push(entry);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }
    if let Some(entry) = parse_block(&block) {
        entries.push(entry);
    }

    entries
}

fn parse_block(lines: &[&str]) -> Option<CaptionEntry> {
    let timing_at = lines.iter().take(2).position(|l| l.contains("-->"))?;
    let text_lines = &lines[timing_at + 1..];
    if text_lines.is_empty() {
        return None;
    }

    let (start, end) = parse_timing_line(lines[timing_at])?;
    if end <= start {
        return None;
    }

    let text = text_lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");

    Some(CaptionEntry { start, end, text })
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    // WebVTT cue settings may follow the end timestamp
    let end_token = right.split_whitespace().next()?;
    Some((parse_timestamp(left.trim())?, parse_timestamp(end_token)?))
}

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or the WebVTT short form `MM:SS.mmm`.
pub fn parse_timestamp(stamp: &str) -> Option<f64> {
    let split_at = stamp.rfind([',', '.'])?;
    let (clock, millis) = (&stamp[..split_at], &stamp[split_at + 1..]);
    if millis.len() != 3 || !millis.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let millis: u32 = millis.parse().ok()?;

    let parts: Vec<u32> = clock
        .split(':')
        .map(|p| {
            if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
                None
            } else {
                p.parse().ok()
            }
        })
        .collect::<Option<_>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return None,
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}
