//! Hand-rolled ICS feed parser.
//!
//! Turns raw iCalendar text into structured event records, one per
//! `BEGIN:VEVENT`…`END:VEVENT` block. The parser is deliberately lenient:
//! unknown properties are ignored, parameters are discarded, and a block
//! without a parseable start time is dropped rather than failing the whole
//! feed.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::text::unescape_text;
use crate::constants::{
    DEFAULT_ALL_DAY_DURATION_MS, DEFAULT_EVENT_TITLE, DEFAULT_TIMED_DURATION_MS,
};

/// One event parsed out of an ICS feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIcsEvent {
    pub uid: String,
    pub title: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Raw RRULE value, carried through without interpretation.
    pub recurrence_rule: Option<String>,
}

/// Parse a whole ICS document into an ordered sequence of events.
///
/// Never fails: malformed blocks are skipped and anomalies within a block
/// are defaulted.
pub fn parse_ics(input: &str) -> Vec<ParsedIcsEvent> {
    let unfolded = unfold(input);

    let mut events = Vec::new();
    let mut current: Option<EventAccumulator> = None;

    for line in unfolded.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            current = Some(EventAccumulator::default());
            continue;
        }

        if line.eq_ignore_ascii_case("END:VEVENT") {
            if let Some(event) = current.take().and_then(EventAccumulator::finish) {
                events.push(event);
            }
            continue;
        }

        if let Some(acc) = current.as_mut() {
            acc.absorb(line);
        }
    }

    events
}

/// Remove CRLF/LF folding (continuation lines start with a space or tab)
/// and normalize all line endings to `\n`.
fn unfold(input: &str) -> String {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    normalized.replace("\n ", "").replace("\n\t", "")
}

#[derive(Debug, Clone, Copy)]
struct IcsInstant {
    ms: i64,
    all_day: bool,
}

#[derive(Default)]
struct EventAccumulator {
    uid: Option<String>,
    summary: Option<String>,
    start: Option<IcsInstant>,
    end: Option<IcsInstant>,
    description: Option<String>,
    location: Option<String>,
    recurrence_rule: Option<String>,
}

impl EventAccumulator {
    /// Apply one content line to the accumulator.
    fn absorb(&mut self, line: &str) {
        let Some((name_part, value)) = line.split_once(':') else {
            return;
        };

        // The property name precedes any `;`-delimited parameters.
        let name = name_part.split(';').next().unwrap_or(name_part).trim().to_ascii_uppercase();

        match name.as_str() {
            "UID" => self.uid = non_empty(value),
            "SUMMARY" => self.summary = non_empty(&unescape_text(value)),
            "DTSTART" => self.start = parse_instant(value),
            "DTEND" => self.end = parse_instant(value),
            "DESCRIPTION" => self.description = non_empty(&unescape_text(value)),
            "LOCATION" => self.location = non_empty(&unescape_text(value)),
            "RRULE" => self.recurrence_rule = non_empty(value),
            _ => {}
        }
    }

    /// Close the block. Returns `None` when no start time was found.
    fn finish(self) -> Option<ParsedIcsEvent> {
        let start = self.start?;

        let default_duration =
            if start.all_day { DEFAULT_ALL_DAY_DURATION_MS } else { DEFAULT_TIMED_DURATION_MS };
        let end_ms = self.end.map_or(start.ms + default_duration, |end| end.ms);

        Some(ParsedIcsEvent {
            uid: self.uid.unwrap_or_else(synthesize_uid),
            title: self.summary.unwrap_or_else(|| DEFAULT_EVENT_TITLE.to_string()),
            start_ms: start.ms,
            end_ms,
            all_day: start.all_day,
            description: self.description,
            location: self.location,
            recurrence_rule: self.recurrence_rule,
        })
    }
}

/// Parse an ICS date or date-time value.
///
/// A bare 8-digit string is an all-day date (midnight UTC); a
/// `YYYYMMDDTHHMMSSZ` string is a timed UTC instant; without the `Z` it is
/// floating time, interpreted as local wall-clock (falling back to UTC when
/// the local instant does not exist, e.g. inside a DST gap). Anything else
/// falls back to an RFC 3339 attempt.
fn parse_instant(raw: &str) -> Option<IcsInstant> {
    let mut value = raw.trim();

    // Malformed feeds sometimes leak the TZID parameter into the value.
    if let Some(rest) = value.strip_prefix("TZID=") {
        value = rest.split_once(':').map_or(rest, |(_, after)| after);
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(IcsInstant { ms: midnight.and_utc().timestamp_millis(), all_day: true });
    }

    let date_time_part = value.strip_suffix('Z').unwrap_or(value);
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_time_part, "%Y%m%dT%H%M%S") {
        let ms = if value.ends_with('Z') {
            dt.and_utc().timestamp_millis()
        } else {
            floating_to_ms(dt)
        };
        return Some(IcsInstant { ms, all_day: false });
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| IcsInstant { ms: dt.with_timezone(&Utc).timestamp_millis(), all_day: false })
}

/// Interpret a floating (zone-less) date-time as local wall-clock time.
/// An ambiguous time (DST fold) takes the earlier instant; a nonexistent
/// one falls back to UTC.
fn floating_to_ms(dt: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&dt)
        .earliest()
        .map_or_else(|| dt.and_utc().timestamp_millis(), |local| local.timestamp_millis())
}

fn synthesize_uid() -> String {
    format!("imported-{}-{:08x}", Utc::now().timestamp_millis(), rand::random::<u32>())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
