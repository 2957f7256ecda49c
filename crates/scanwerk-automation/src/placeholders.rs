// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output-path placeholder expansion — date/time tokens plus one
// auto-incrementing counter resolved against the destination directory.
//
// The counter has no in-process cache: every resolution re-scans the
// directory, so the filesystem stays the single source of truth and a
// number is never reused across process invocations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use scanwerk_core::error::{Result, ScanwerkError};

/// Date and time substitutions, applied verbatim and case-sensitively
/// ($(MM) is the month, $(mm) the minute).
const DATE_TIME_TOKENS: [(&str, &str); 7] = [
    ("$(YYYY)", "%Y"),
    ("$(YY)", "%y"),
    ("$(MM)", "%m"),
    ("$(DD)", "%d"),
    ("$(hh)", "%H"),
    ("$(mm)", "%M"),
    ("$(ss)", "%S"),
];

/// Expand every placeholder in `template` and return the concrete path.
///
/// `$(n)`, `$(nn)`, … `$(nnnnnn)` is the auto-increment token: the digit
/// count sets the zero-padding width, and the value is one past the highest
/// number found among existing files matching the template's prefix/suffix
/// in the destination directory. Values may outgrow the padding width.
pub fn resolve(template: &str, now: DateTime<Local>) -> Result<PathBuf> {
    let expanded = expand_date_time(template, now);

    let Some(token) = find_counter_token(&expanded) else {
        return Ok(PathBuf::from(expanded));
    };

    // The counter must sit in the file name, not a directory component.
    let file_start = expanded
        .rfind(['/', '\\'])
        .map(|i| i + 1)
        .unwrap_or(0);
    if token.start < file_start {
        return Err(ScanwerkError::Configuration(
            "the auto-increment placeholder must be in the file name, not a directory".into(),
        ));
    }

    let dir: PathBuf = if file_start == 0 {
        PathBuf::from(".")
    } else {
        PathBuf::from(&expanded[..file_start])
    };
    let prefix = &expanded[file_start..token.start];
    let suffix = &expanded[token.start + token.len..];

    let next = next_counter(&dir, prefix, suffix);
    let number = format!("{next:0width$}", width = token.width);
    debug!(next, width = token.width, "auto-increment resolved");

    Ok(dir.join(format!("{prefix}{number}{suffix}")))
}

/// Expand only the date/time tokens.
pub fn expand_date_time(template: &str, now: DateTime<Local>) -> String {
    let mut out = template.to_string();
    for (token, fmt) in DATE_TIME_TOKENS {
        if out.contains(token) {
            out = out.replace(token, &now.format(fmt).to_string());
        }
    }
    out
}

struct CounterToken {
    start: usize,
    len: usize,
    width: usize,
}

/// Find the first `$(n…n)` token (1 to 6 repeated n's).
fn find_counter_token(s: &str) -> Option<CounterToken> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while let Some(offset) = s[i..].find("$(") {
        let start = i + offset;
        let mut cursor = start + 2;
        let mut width = 0;
        while cursor < bytes.len() && bytes[cursor] == b'n' {
            width += 1;
            cursor += 1;
        }
        if (1..=6).contains(&width) && cursor < bytes.len() && bytes[cursor] == b')' {
            return Some(CounterToken {
                start,
                len: cursor + 1 - start,
                width,
            });
        }
        i = start + 2;
    }
    None
}

/// One past the highest counter value among existing files shaped
/// `<prefix><digits><suffix>`. A missing directory or no matches yields 1.
fn next_counter(dir: &Path, prefix: &str, suffix: &str) -> u64 {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 1;
    };

    let mut highest = 0u64;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        let Some(digits) = rest.strip_suffix(suffix) else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(value) = digits.parse::<u64>() {
            highest = highest.max(value);
        }
    }
    highest + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 6, 14, 5, 9).unwrap()
    }

    #[test]
    fn date_and_time_tokens_expand() {
        let out = expand_date_time("$(YYYY)-$(MM)-$(DD)_$(hh)$(mm)$(ss).pdf", fixed_now());
        assert_eq!(out, "2026-08-06_140509.pdf");
    }

    #[test]
    fn month_and_minute_are_distinct() {
        let out = expand_date_time("$(MM)-$(mm)", fixed_now());
        assert_eq!(out, "08-05");
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let path = resolve("/data/scans/out.pdf", fixed_now()).unwrap();
        assert_eq!(path, PathBuf::from("/data/scans/out.pdf"));
    }

    #[test]
    fn counter_starts_at_one_in_an_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let template = format!("{}/scan_$(nnnn).pdf", dir.path().display());
        let path = resolve(&template, fixed_now()).unwrap();
        assert_eq!(path, dir.path().join("scan_0001.pdf"));
    }

    #[test]
    fn counter_skips_past_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scan_0001.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("scan_0007.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("scan_abcd.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("other_0009.pdf"), b"x").unwrap();

        let template = format!("{}/scan_$(nnnn).pdf", dir.path().display());
        let path = resolve(&template, fixed_now()).unwrap();
        assert_eq!(path, dir.path().join("scan_0008.pdf"));
    }

    #[test]
    fn resolving_after_each_write_is_strictly_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let template = format!("{}/job$(nn).pdf", dir.path().display());

        let mut previous = 0u64;
        for _ in 0..3 {
            let path = resolve(&template, fixed_now()).unwrap();
            assert!(!path.exists(), "resolver must never return an existing path");
            let name = path.file_name().unwrap().to_str().unwrap().to_string();
            let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
            let value: u64 = digits.parse().unwrap();
            assert!(value > previous);
            previous = value;
            std::fs::write(&path, b"x").unwrap();
        }
    }

    #[test]
    fn counter_value_may_outgrow_its_width() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s99.pdf"), b"x").unwrap();
        let template = format!("{}/s$(nn).pdf", dir.path().display());
        let path = resolve(&template, fixed_now()).unwrap();
        assert_eq!(path, dir.path().join("s100.pdf"));
    }

    #[test]
    fn counter_in_directory_component_is_rejected() {
        let result = resolve("/data/$(nn)/scan.pdf", fixed_now());
        assert!(matches!(result, Err(ScanwerkError::Configuration(_))));
    }

    #[test]
    fn counter_combines_with_date_tokens() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2026-08-06_001.pdf"), b"x").unwrap();
        let template = format!("{}/$(YYYY)-$(MM)-$(DD)_$(nnn).pdf", dir.path().display());
        let path = resolve(&template, fixed_now()).unwrap();
        assert_eq!(path, dir.path().join("2026-08-06_002.pdf"));
    }
}
