use crate::admin::{list_contractors, run_scan, verify_contractor, ListArgs, ScanArgs, VerifyArgs};
use crate::server;
use civicfix::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "CivicFix",
    about = "Run the CivicFix backend and administer contractors from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect and verify registered contractors
    Contractors {
        #[command(subcommand)]
        command: ContractorCommand,
    },
    /// Classify local images and print one JSON result per line
    Scan(ScanArgs),
}

#[derive(Subcommand, Debug)]
enum ContractorCommand {
    /// List registered contractors without credentials
    List(ListArgs),
    /// Mark a contractor verified, or revoke verification
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Contractors {
            command: ContractorCommand::List(args),
        } => list_contractors(args).await,
        Command::Contractors {
            command: ContractorCommand::Verify(args),
        } => verify_contractor(args).await,
        Command::Scan(args) => run_scan(args).await,
    }
}
