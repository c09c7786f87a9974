//! `commandeer doctor` command
//!
//! The native engine is optional, so a failing self test is reported but
//! does not fail the command.

use anyhow::Result;
use serde_json::json;

use crate::cli::DoctorArgs;
use commandeer::ops::{
    backend_status, format_guidance, format_report, format_status, test_backend,
    troubleshooting_guidance,
};
use commandeer::Runtime;

pub fn execute(args: DoctorArgs, verbose: bool) -> Result<()> {
    let runtime = Runtime::from_env();
    let status = backend_status(&runtime);
    let report = test_backend(&runtime);
    let guidance = troubleshooting_guidance();

    if args.json {
        let doc = json!({
            "status": status,
            "test": report,
            "guidance": guidance,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("commandeer doctor");
    println!("=================\n");
    print!("{}", format_status(&status));
    println!();
    print!("{}", format_report(&report, verbose));

    if !report.success || verbose {
        println!();
        print!("{}", format_guidance(&guidance));
    }

    Ok(())
}
