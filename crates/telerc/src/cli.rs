//! Argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "telerc",
    version,
    about = "Remote control for TVs: pair once, then send keys over the network"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the config file (defaults to the XDG config dir).
    #[arg(long, global = true, env = "TELERC_CONFIG")]
    pub config: Option<PathBuf>,

    /// TV profile to use (defaults to the configured default).
    #[arg(long, global = true)]
    pub tv: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pair with a TV: the TV displays a PIN to confirm.
    Pair(PairArgs),

    /// Send one remote key to the paired TV.
    Send(SendArgs),

    /// Send a Wake-on-LAN packet to the TV.
    Wake,

    /// Show the current target and pairing state.
    Status,

    /// Forget the pairing (deletes the credential artifact).
    Unpair,

    /// Manage configured TVs.
    #[command(subcommand)]
    Tv(TvCommand),
}

#[derive(Debug, Args)]
pub struct PairArgs {
    /// TV address (IP or host name).
    pub address: String,

    /// Display name for the TV.
    #[arg(long)]
    pub name: Option<String>,

    /// Hardware address for Wake-on-LAN.
    #[arg(long)]
    pub mac: Option<String>,

    /// Profile name to store the TV under (defaults to the display
    /// name, else the address).
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Key to send (e.g. power, volume-up, ok, home, play).
    pub key: telerc_core::KeyCode,
}

#[derive(Debug, Subcommand)]
pub enum TvCommand {
    /// List configured TVs.
    List,

    /// Add or update a TV profile.
    Add(TvAddArgs),

    /// Remove a TV profile.
    Remove { name: String },

    /// Make a TV the default target.
    Use { name: String },
}

#[derive(Debug, Args)]
pub struct TvAddArgs {
    /// Profile name.
    pub name: String,

    /// TV address (IP or host name).
    pub address: String,

    /// Display name.
    #[arg(long)]
    pub display_name: Option<String>,

    /// Hardware address for Wake-on-LAN.
    #[arg(long)]
    pub mac: Option<String>,
}
