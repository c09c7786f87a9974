//! `commandeer status` command

use anyhow::Result;

use crate::cli::StatusArgs;
use commandeer::ops::{backend_status, fallback_note, format_status};
use commandeer::util::diagnostic::emit;
use commandeer::Runtime;

pub fn execute(args: StatusArgs) -> Result<()> {
    let runtime = Runtime::from_env();
    let status = backend_status(&runtime);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", format_status(&status));
        if let Some(note) = fallback_note(&status) {
            emit(&note, false);
        }
    }

    Ok(())
}
