//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`encode`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod encode;
pub mod health;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::WayfarerError;

pub async fn dispatch(cli: Cli) -> Result<(), WayfarerError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Encode(ref args)) => {
            encode::encode(args);
            Ok(())
        }
        Some(Commands::Decode(ref args)) => encode::decode(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  wayfarer v{version} \u{2014} forwarding HTTP gateway\n\n  \
         No command provided. To get started:\n\n    \
         wayfarer run                      Start the gateway on port 3000\n    \
         wayfarer encode example.com       Print the /proxy/ path for a site\n    \
         wayfarer --help                   See all commands and options\n"
    );
}
