// src/ledger/status.rs
// =============================================================================
// Pass/fail timeline of a single URL.
//
// A status record only remembers three things:
// - the most recent result code
// - when the URL last answered 200
// - the current failure streak, if there is one (first failure + latest one)
//
// When a URL recovers the whole streak is forgotten; the success timestamp is
// the only trace left of it.
//
// JSON shape (kept compatible with existing results files):
//   { "status": 0, "200": "<when>", "fail": { "from": ..., "from-code": ...,
//                                             "to": ..., "to-code": ... } }
// =============================================================================

use crate::context::Timestamp;
use serde::{Deserialize, Serialize};

/// The only code that counts as healthy.
pub const SUCCESS_CODE: i32 = 200;

/// Recorded when the probe could not get any answer (timeout, DNS, TLS...).
pub const UNREACHABLE_CODE: i32 = 0;

/// Recorded by a dry run in place of a real probe result.
pub const DRY_RUN_CODE: i32 = -1;

/// First and latest failure of the current unbroken failure streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailWindow {
    pub from: Timestamp,
    #[serde(rename = "from-code")]
    pub from_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Timestamp>,
    #[serde(rename = "to-code", default, skip_serializing_if = "Option::is_none")]
    pub to_code: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Latest result code; `None` until the URL has been probed once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,

    #[serde(rename = "200", default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<Timestamp>,

    #[serde(rename = "fail", default, skip_serializing_if = "Option::is_none")]
    pub fail_window: Option<FailWindow>,
}

impl StatusRecord {
    /// Folds one probe result into the record.
    pub fn record(&mut self, code: i32, when: Timestamp) {
        self.status = Some(code);

        // recovery: the streak is forgotten, only the success time is kept
        if code == SUCCESS_CODE {
            self.fail_window = None;
            self.last_success = Some(when);
            return;
        }

        match self.fail_window.as_mut() {
            // a streak is already running: only move its end
            Some(window) => {
                window.to = Some(when);
                window.to_code = Some(code);
            }
            // first failure after a success (or ever): open a new streak
            None => {
                self.fail_window = Some(FailWindow {
                    from: when,
                    from_code: code,
                    to: None,
                    to_code: None,
                });
            }
        }
    }

    /// Builder-style variant of [`StatusRecord::record`].
    pub fn recorded(mut self, code: i32, when: Timestamp) -> Self {
        self.record(code, when);
        self
    }

    pub fn is_passing(&self) -> bool {
        self.status == Some(SUCCESS_CODE)
    }

    pub fn has_been_checked(&self) -> bool {
        self.status.is_some()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Option<i32> for status instead of a "not checked" code?
//    - a URL found for the first time has no status at all, and with
//      skip_serializing_if the key is simply absent from the JSON
//
// 2. What does #[serde(rename = "200")] do?
//    - the Rust field is `last_success`, but on disk the key is the string
//      "200"; serde maps between the two in both directions
// -----------------------------------------------------------------------------
