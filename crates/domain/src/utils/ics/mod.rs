//! Dependency-free iCalendar (RFC 5545 subset) codec.
//!
//! Supports the `VCALENDAR`/`VEVENT` property subset CalBridge cares about:
//! `UID`, `DTSTAMP`, `DTSTART`, `DTEND`, `SUMMARY`, `DESCRIPTION`,
//! `LOCATION` and a passthrough `RRULE`. Timezone blocks, alarms and
//! recurrence expansion are out of scope.

pub mod generator;
pub mod parser;
pub mod text;

pub use generator::{generate_ics, wire_uid, IcsCalendarOptions};
pub use parser::{parse_ics, ParsedIcsEvent};
pub use text::{escape_text, unescape_text};
