// src/ledger/mod.rs
// =============================================================================
// The persisted state of link-ledger.
//
// Submodules:
// - status: pass/fail timeline of one URL
// - usage: which repositories and files reference one URL
// - store: the map of all URL records, plus loading and saving it
// =============================================================================

mod status;
mod store;
mod usage;

pub use status::{DRY_RUN_CODE, SUCCESS_CODE, UNREACHABLE_CODE};
pub use store::{write_json_atomically, LinkStore, UrlRecord};
