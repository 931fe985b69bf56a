pub mod describe;
pub mod init;
pub mod list;
pub mod prune;
pub mod run;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Write a new config file
    Init(init::InitArgs),
    /// Dump the database, upload it and prune old backups
    Run(run::RunArgs),
    /// List remote backups, newest first
    List(list::ListArgs),
    /// Delete remote backups beyond the retention count
    Prune(prune::PruneArgs),
    /// Show the effective configuration
    Config(describe::ConfigArgs),
}
