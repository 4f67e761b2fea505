use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

// Parse an "as of" string like "2d", "YYYY-MM-DD", or RFC3339 into a naive UTC timestamp.
// Returns Some(ts) on success; None if unparseable.
pub fn parse_as_of(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    // "2d" -> now - 2 days
    if let Some(stripped) = s.strip_suffix('d') {
        if let Ok(days) = stripped.parse::<i64>() {
            if days < 0 {
                return None;
            }
            // out-of-range offsets are rejected rather than overflowing
            return TimeDelta::try_days(days).and_then(|d| Utc::now().naive_utc().checked_sub_signed(d));
        }
    }
    parse_timestamp(s)
}

// Sitemap lastmod values follow the W3C datetime profile. Offsets are folded
// into UTC and then dropped, so every result is a naive UTC wall clock.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    // chrono's %:z does not accept a bare "Z"
    let with_offset = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => s.to_string(),
    };
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.naive_utc());
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    // "YYYY-MM-DD" and the coarser "YYYY-MM" and "YYYY"
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .ok()
        .or_else(|| year_only(s));
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn year_only(s: &str) -> Option<NaiveDate> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)
}

/// Report timestamps use the same layout as a spreadsheet export.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
