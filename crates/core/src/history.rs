//! Append-only request audit trail.
//!
//! Every lifecycle transition appends one JSON line to `history.jsonl` in
//! the request's record directory. Records are mutated in place, so the
//! trail is what keeps a request's path through the state machine
//! reconstructible after the fact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use psx_uuid::TimestampUuid;
use serde::{Deserialize, Serialize};

use crate::constants::HISTORY_FILENAME;
use crate::request::RequestStatus;
use crate::{RequestError, RequestResult};

/// The action that caused a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryAction {
    Submitted,
    QuoteReceived,
    AcceptQuote,
    CancelRequest,
    StopSearch,
    ConfirmOrder,
    DeclineOrder,
    DispatchOrder,
    Refill,
}

/// One recorded transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusEvent {
    pub at: DateTime<Utc>,
    pub action: HistoryAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<RequestStatus>,
    pub to: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<TimestampUuid>,
}

impl StatusEvent {
    /// A fresh event stamped with the current time.
    pub fn now(
        action: HistoryAction,
        from: Option<RequestStatus>,
        to: RequestStatus,
        quote_id: Option<TimestampUuid>,
    ) -> Self {
        Self {
            at: Utc::now(),
            action,
            from,
            to,
            quote_id,
        }
    }
}

/// Appends one event to the request directory's trail.
pub fn append_event(record_dir: &Path, event: &StatusEvent) -> RequestResult<()> {
    let line = serde_json::to_string(event).map_err(RequestError::Serialization)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(record_dir.join(HISTORY_FILENAME))
        .map_err(RequestError::FileWrite)?;

    writeln!(file, "{}", line).map_err(RequestError::FileWrite)
}

/// Reads the trail back, oldest first.
///
/// Unparseable lines are skipped with a warning rather than failing the
/// whole read; the trail is diagnostic, not authoritative.
pub fn read_events(record_dir: &Path) -> RequestResult<Vec<StatusEvent>> {
    let path = record_dir.join(HISTORY_FILENAME);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(&path).map_err(RequestError::FileRead)?;

    let mut events = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StatusEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("skipping unparseable history line in {}: {}", path.display(), e);
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read_round_trip() {
        let dir = TempDir::new().unwrap();

        let first = StatusEvent::now(
            HistoryAction::Submitted,
            None,
            RequestStatus::Pending,
            None,
        );
        let second = StatusEvent::now(
            HistoryAction::QuoteReceived,
            Some(RequestStatus::Pending),
            RequestStatus::Quoted,
            Some(TimestampUuid::generate(None)),
        );

        append_event(dir.path(), &first).unwrap();
        append_event(dir.path(), &second).unwrap();

        let events = read_events(dir.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, HistoryAction::Submitted);
        assert_eq!(events[1].action, HistoryAction::QuoteReceived);
        assert_eq!(events[1].from, Some(RequestStatus::Pending));
        assert!(events[1].quote_id.is_some());
    }

    #[test]
    fn test_read_missing_trail_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_events(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let event = StatusEvent::now(
            HistoryAction::Submitted,
            None,
            RequestStatus::Pending,
            None,
        );
        append_event(dir.path(), &event).unwrap();

        // Corrupt the trail with a non-JSON line
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(HISTORY_FILENAME))
            .unwrap();
        writeln!(file, "not json").unwrap();

        append_event(dir.path(), &event).unwrap();

        let events = read_events(dir.path()).unwrap();
        assert_eq!(events.len(), 2);
    }
}
