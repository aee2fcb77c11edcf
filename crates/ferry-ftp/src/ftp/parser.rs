//! LIST / MLSD line parser.
//!
//! Supports three formats:
//! 1. **Unix-style** (`ls -l`): `-rwxr-xr-x 1 owner group 1234 Jan  1 12:00 file.txt`
//! 2. **Windows/IIS-style**: `01-01-26  12:00AM       1234 file.txt`
//! 3. **MLSD facts** (RFC 3659): `type=file;size=1234;modify=20260101120000; file.txt`
//!
//! MLSD is tried first (if the line contains `=` and `;`), then Unix, then
//! Windows. Anything else becomes an `EntryKind::Other` entry named after
//! the whole line.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use ferry_core::remote::{EntryKind, RemoteEntry};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref UNIX_LINE: Regex = Regex::new(
        r"(?x)
        ^([dlcbps-][rwxsStT-]{9})[+@.]?\s+  # permissions (optional ACL marker)
        (\d+)\s+                            # link count
        (\S+)\s+                            # owner
        (\S+)\s+                            # group
        (\d+)\s+                            # size
        (\w{3}\s+\d{1,2}\s+[\d:]+)\s+       # date
        (.+)$                               # filename (possibly with -> target)
        ",
    )
    .expect("valid unix LIST regex");
    static ref WINDOWS_LINE: Regex = Regex::new(
        r"(?x)
        ^(\d{2}-\d{2}-\d{2,4})\s+           # date
        (\d{1,2}:\d{2}(?:AM|PM)?)\s+        # time
        (<DIR>|\d+)\s+                      # size or <DIR>
        (.+)$                               # filename
        ",
    )
    .expect("valid windows LIST regex");
}

/// Parse the lines returned by a LIST / MLSD command, dropping `.` / `..`.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<RemoteEntry> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty() && !l.starts_with("total "))
        .map(parse_line)
        .filter(|e| !e.is_pseudo())
        .collect()
}

/// Parse a single line from a listing.
pub fn parse_line(line: &str) -> RemoteEntry {
    if line.contains(';') && line.contains('=') {
        if let Some(e) = parse_mlsd(line) {
            return e;
        }
    }

    if let Some(e) = parse_unix(line) {
        return e;
    }

    if let Some(e) = parse_windows(line) {
        return e;
    }

    RemoteEntry {
        name: line.to_string(),
        kind: EntryKind::Other,
        size: 0,
        modified: None,
    }
}

// ─── MLSD parser ─────────────────────────────────────────────────────

/// Parse MLSD fact-line: `fact1=val1;fact2=val2; filename`
fn parse_mlsd(line: &str) -> Option<RemoteEntry> {
    let (facts_str, name) = if let Some(pos) = line.find("; ") {
        (&line[..pos + 1], line[pos + 2..].to_string())
    } else if let Some(pos) = line.rfind(' ') {
        (&line[..pos], line[pos + 1..].to_string())
    } else {
        return None;
    };

    if name.is_empty() {
        return None;
    }

    let facts: HashMap<String, String> = facts_str
        .split(';')
        .filter_map(|seg| seg.trim().split_once('='))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect();

    let kind = match facts.get("type").map(|s| s.to_lowercase()).as_deref() {
        Some("dir") | Some("cdir") | Some("pdir") => EntryKind::Directory,
        Some("file") => EntryKind::File,
        Some("os.unix=symlink") | Some("os.unix=slink") => EntryKind::Symlink,
        _ => EntryKind::Other,
    };

    let size = facts
        .get("size")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    Some(RemoteEntry {
        name,
        kind,
        size,
        modified: facts.get("modify").and_then(|v| parse_mlsd_time(v)),
    })
}

/// Parse MLSD timestamp: `YYYYMMDDHHmmSS[.fraction]`
fn parse_mlsd_time(s: &str) -> Option<DateTime<Utc>> {
    let base = s.get(..14).unwrap_or(s);
    NaiveDateTime::parse_from_str(base, "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}

// ─── Unix-style parser ───────────────────────────────────────────────

/// Parse a Unix `ls -l` line:
/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<RemoteEntry> {
    let caps = UNIX_LINE.captures(line)?;

    let perms = caps.get(1)?.as_str();
    let size = caps.get(5)?.as_str().parse::<u64>().unwrap_or(0);
    let date_str = caps.get(6)?.as_str();
    let name_raw = caps.get(7)?.as_str();

    let kind = match perms.as_bytes().first() {
        Some(b'd') => EntryKind::Directory,
        Some(b'l') => EntryKind::Symlink,
        Some(b'-') => EntryKind::File,
        _ => EntryKind::Other,
    };

    let name = match (kind, name_raw.find(" -> ")) {
        (EntryKind::Symlink, Some(pos)) => name_raw[..pos].to_string(),
        _ => name_raw.to_string(),
    };

    Some(RemoteEntry {
        name,
        kind,
        size,
        modified: parse_unix_date(date_str, Utc::now()),
    })
}

/// Parse the date portion: "Jan  1 12:00" or "Jan  1  2025".
///
/// The time-of-day form omits the year; `ls` uses it for the last six
/// months, so a date that lands in the future belongs to the previous year.
fn parse_unix_date(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let normalised = s.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(dt) = NaiveDateTime::parse_from_str(
        &format!("{} {}", now.year(), normalised),
        "%Y %b %d %H:%M",
    ) {
        let stamped = Utc.from_utc_datetime(&dt);
        if stamped > now + Duration::days(1) {
            let last_year = NaiveDateTime::parse_from_str(
                &format!("{} {}", now.year() - 1, normalised),
                "%Y %b %d %H:%M",
            )
            .ok()?;
            return Some(Utc.from_utc_datetime(&last_year));
        }
        return Some(stamped);
    }

    let date = NaiveDate::parse_from_str(&normalised, "%b %d %Y").ok()?;
    Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

// ─── Windows-style parser ────────────────────────────────────────────

/// Parse Windows / IIS style line:
/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<RemoteEntry> {
    let caps = WINDOWS_LINE.captures(line)?;

    let date_str = caps.get(1)?.as_str();
    let time_str = caps.get(2)?.as_str();
    let size_or_dir = caps.get(3)?.as_str();
    let name = caps.get(4)?.as_str().to_string();

    let (kind, size) = if size_or_dir == "<DIR>" {
        (EntryKind::Directory, 0)
    } else {
        (EntryKind::File, size_or_dir.parse::<u64>().unwrap_or(0))
    };

    Some(RemoteEntry {
        name,
        kind,
        size,
        modified: parse_windows_date(date_str, time_str),
    })
}

fn parse_windows_date(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let combined = format!("{} {}", date, time);
    ["%m-%d-%y %I:%M%p", "%m-%d-%y %H:%M", "%m-%d-%Y %I:%M%p", "%m-%d-%Y %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&combined, fmt).ok())
        .map(|dt| Utc.from_utc_datetime(&dt))
}
