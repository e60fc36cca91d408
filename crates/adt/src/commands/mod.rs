//! Command dispatch: bridges CLI args -> client calls -> output formatting.

pub mod arm;
pub mod config_cmd;
pub mod status;
pub mod watch;

use adt_core::AdtClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a portal-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &AdtClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(client, args, global).await,
        Command::Arm(args) => arm::arm(client, args, global).await,
        Command::Disarm(args) => arm::disarm(client, args, global).await,
        Command::Watch(args) => watch::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
