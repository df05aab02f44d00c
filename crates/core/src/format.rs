use crate::{captions::AlignedCaptions, timeline::TrimWindow};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Trim window as `[MM:SS–MM:SS]`
pub fn format_trim(trim: &TrimWindow) -> String {
    format!(
        "[{}–{}]",
        format_timestamp(trim.start()),
        format_timestamp(trim.end())
    )
}

/// Aligned captions inside the trim window, one card per caption.
pub fn format_aligned_readable(captions: &AlignedCaptions, trim: &TrimWindow) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Captions {}\n\n", format_trim(trim)));

    let mut shown = 0;
    for (index, caption) in captions.visible_in(trim) {
        let start = format_timestamp(caption.start);
        let end = format_timestamp(caption.end);
        output.push_str(&format!(
            "{:>3}. [{}–{}] {}\n",
            index + 1,
            start,
            end,
            caption.source_text.trim()
        ));
        if caption.target_text.trim().is_empty() {
            output.push_str("     → (no translation)\n");
        } else {
            output.push_str(&format!("     → {}\n", caption.target_text.trim()));
        }
        shown += 1;
    }

    if shown == 0 {
        output.push_str("(no captions in range)\n");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlignedCaption;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(59.99), "00:59");
        assert_eq!(format_timestamp(61.0), "01:01");
        assert_eq!(format_timestamp(3723.0), "62:03");
        assert_eq!(format_timestamp(-4.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
    }

    #[test]
    fn test_readable_listing_respects_trim() {
        let captions = AlignedCaptions::new(vec![
            AlignedCaption {
                start: 0.0,
                end: 5.0,
                source_text: "Hello".into(),
                target_text: "Bonjour".into(),
            },
            AlignedCaption {
                start: 65.0,
                end: 70.0,
                source_text: "Later".into(),
                target_text: String::new(),
            },
        ]);

        let mut trim = TrimWindow::new(80.0);
        let all = format_aligned_readable(&captions, &trim);
        assert!(all.contains("1. [00:00–00:05] Hello"));
        assert!(all.contains("→ Bonjour"));
        assert!(all.contains("2. [01:05–01:10] Later"));
        assert!(all.contains("(no translation)"));

        trim.set(10.0, 20.0);
        let none = format_aligned_readable(&captions, &trim);
        assert!(none.starts_with("# Captions [00:10–00:20]"));
        assert!(none.contains("(no captions in range)"));
    }
}
