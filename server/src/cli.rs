use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "netwatch")]
#[command(author, version, about = "Network statistics and account API", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override listen address
    #[arg(long, env = "NETWATCH_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Override SQLite user database path
    #[arg(long, env = "NETWATCH_DATABASE_PATH")]
    pub database_path: Option<String>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log directory
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Override number of runtime worker threads
    #[arg(long)]
    pub runtime_threads: Option<usize>,
}
