//! `cloe version`: print the CLI's own version.

use crate::error::CliResult;

pub async fn execute() -> CliResult<()> {
    println!("cloe {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
