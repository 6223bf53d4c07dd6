//! Command handlers, grouped by whether they mutate the store.

pub mod lifecycle;
pub mod read;

use helpdesk_core::model::ticket::{ParseEnumError, Severity, Status};

pub(crate) fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse().map_err(|e: ParseEnumError| e.to_string())
}

pub(crate) fn parse_status(s: &str) -> Result<Status, String> {
    s.parse().map_err(|e: ParseEnumError| e.to_string())
}
