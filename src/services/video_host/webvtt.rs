//! Minimal WebVTT parser for caption tracks.
//!
//! Only what transcripts need: cue timings and text. Styling blocks,
//! cue settings and inline tags are dropped.

use super::TranscriptCue;

/// Parse a WebVTT document into ordered cues.
///
/// Returns `Err` when the `WEBVTT` signature is missing. Malformed cues are
/// skipped rather than failing the whole track.
pub fn parse(input: &str) -> Result<Vec<TranscriptCue>, String> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut blocks = normalized.split("\n\n").map(str::trim).filter(|b| !b.is_empty());

    match blocks.next() {
        Some(header) if header.starts_with("WEBVTT") => {}
        _ => return Err("missing WEBVTT header".to_string()),
    }

    let mut cues = Vec::new();
    for block in blocks {
        if block.starts_with("NOTE") || block.starts_with("STYLE") || block.starts_with("REGION")
        {
            continue;
        }

        let mut lines = block.lines();
        let Some(first) = lines.next() else { continue };
        // Optional cue identifier line
        let timing = if first.contains("-->") {
            first
        } else {
            match lines.next() {
                Some(line) if line.contains("-->") => line,
                _ => continue,
            }
        };

        let Some((start_ms, end_ms)) = parse_timing(timing) else {
            continue;
        };

        let text = lines
            .map(strip_tags)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }

        cues.push(TranscriptCue {
            start_ms,
            end_ms,
            text: decode_entities(&text),
        });
    }

    Ok(cues)
}

/// `00:00:01.000 --> 00:00:04.000 align:start` → (1000, 4000)
fn parse_timing(line: &str) -> Option<(i64, i64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    let start_ms = parse_timestamp(start.trim())?;
    let end_ms = parse_timestamp(end)?;
    (end_ms >= start_ms).then_some((start_ms, end_ms))
}

/// Accepts `hh:mm:ss.ttt` and `mm:ss.ttt`. Out-of-range hours yield `None`.
fn parse_timestamp(ts: &str) -> Option<i64> {
    let (clock, millis) = ts.split_once('.')?;
    if millis.len() != 3 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        _ => return None,
    };
    if minutes > 59 || seconds > 59 {
        return None;
    }

    let total = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1000 + millis)?;
    i64::try_from(total).ok()
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\
        Kind: captions\n\
        \n\
        NOTE generated by Mux\n\
        \n\
        1\n\
        00:00:00.000 --> 00:00:02.500\n\
        Welcome to the course.\n\
        \n\
        00:00:02.500 --> 00:00:05.000 align:start position:0%\n\
        <v Speaker>Today we look at</v>\n\
        ownership &amp; borrowing.\n\
        \n\
        01:00:00.000 --> 01:00:01.250\n\
        Bye\n";

    #[test]
    fn test_parses_cues_with_identifiers_and_settings() {
        let cues = parse(SAMPLE).unwrap();
        assert_eq!(cues.len(), 3);

        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].end_ms, 2500);
        assert_eq!(cues[0].text, "Welcome to the course.");

        assert_eq!(cues[1].start_ms, 2500);
        assert_eq!(cues[1].text, "Today we look at ownership & borrowing.");

        assert_eq!(cues[2].start_ms, 3_600_000);
        assert_eq!(cues[2].end_ms, 3_601_250);
    }

    #[test]
    fn test_crlf_and_bom() {
        let input = "\u{feff}WEBVTT\r\n\r\n00:01.000 --> 00:02.000\r\nHello\r\n";
        let cues = parse(input).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].text, "Hello");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        assert!(parse("00:00.000 --> 00:01.000\nHi").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_malformed_cues_are_skipped() {
        let input = "WEBVTT\n\n00:00:05.000 --> 00:00:01.000\nbackwards\n\n\
                     garbage line\nmore garbage\n\n00:00:01.00 --> 00:00:02.000\nshort millis\n\n\
                     00:00:03.000 --> 00:00:04.000\nkept\n";
        let cues = parse(input).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "kept");
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(parse_timestamp("00:00:01.000"), Some(1000));
        assert_eq!(parse_timestamp("02:03.004"), Some(123_004));
        assert_eq!(parse_timestamp("00:61:00.000"), None);
        assert_eq!(parse_timestamp("1.5"), None);
    }

    #[test]
    fn test_oversized_hours_skip_the_cue() {
        let input = "WEBVTT\n\n\
            99999999999999999:00:00.000 --> 99999999999999999:00:01.000\n\
            Overflow\n\n\
            00:00:01.000 --> 00:00:02.000\n\
            Kept";
        let cues = parse(input).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Kept");
        assert_eq!(parse_timestamp("-1:00.000"), None);
    }
}
