use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bridgewatch",
    about = "Bridgewatch - trading bridge watchdog and account cache",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "BRIDGEWATCH_PORT")]
    pub port: Option<u16>,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(
        long,
        global = true,
        env = "BRIDGEWATCH_URL",
        help = "Daemon base URL for client commands (default: http://127.0.0.1:<port>)"
    )]
    pub url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the watchdog daemon (default if no command specified)")]
    Serve,

    #[command(about = "Show health verdict and healing state")]
    Status {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "List cached account balances")]
    Accounts {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Show recent alerts")]
    Alerts {
        #[arg(short = 'n', long, default_value = "20", help = "Number of alerts to show")]
        limit: usize,
    },

    #[command(about = "Start a refresh cycle now")]
    Sync,

    #[command(about = "Request a bridge restart, bypassing the failure threshold")]
    Heal,

    #[command(about = "Reset the healing controller to Healthy")]
    Reset,

    #[command(subcommand, about = "Inspect the local configuration")]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the effective configuration (secrets masked)")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Validate the configuration file")]
    Validate,

    #[command(about = "Write a default configuration file if none exists")]
    Init,
}
