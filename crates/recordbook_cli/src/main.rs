//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `recordbook_core` linkage and report version/schema metadata.
//! - With a database path argument, open (create + migrate) that store and
//!   report collection sizes.

use recordbook_core::db::migrations::latest_version;
use recordbook_core::RecordStore;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    println!("recordbook_core ping={}", recordbook_core::ping());
    println!("recordbook_core version={}", recordbook_core::core_version());
    println!("recordbook_core schema_version={}", latest_version());

    let Some(path) = std::env::args_os().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let store = match RecordStore::open(path).await {
        Ok(store) => store,
        Err(err) => {
            eprintln!("recordbook store open failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    match (store.list_users().await, store.list_entries().await) {
        (Ok(users), Ok(entries)) => {
            println!("recordbook store users={} entries={}", users.len(), entries.len());
            ExitCode::SUCCESS
        }
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("recordbook store scan failed: {err}");
            ExitCode::FAILURE
        }
    }
}
