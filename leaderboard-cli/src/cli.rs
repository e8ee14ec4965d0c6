use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Input file read when no path is given.
pub const DEFAULT_INPUT_PATH: &str = "./leaderboard-data.json";

#[derive(Clone, Debug, Parser)]
#[command(
    name = "leaderboard",
    about = "Sync XP records into the leaderboard store and print the ranking",
    version
)]
pub struct Cli {
    /// Also log debug output from the leaderboard crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Upsert every record of an input file, then print the leaderboard
    Sync {
        /// JSON array of {telegram_username, xp, x_handle?} records
        #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
        input: PathBuf,
    },

    /// Print the current leaderboard
    Show {
        /// Only print the top N entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Use the compact board layout
        #[arg(long)]
        board: bool,
    },

    /// Set the X handle for a user, creating the entry with 0 XP if needed
    Register { username: String, handle: String },
}

impl Cli {
    /// The requested command, falling back to `sync` with the default input.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_else(|| Command::Sync {
            input: PathBuf::from(DEFAULT_INPUT_PATH),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Command, DEFAULT_INPUT_PATH};

    #[test]
    fn no_subcommand_means_sync_with_default_input() {
        let cli = Cli::parse_from(["leaderboard"]);
        assert_eq!(
            cli.command(),
            Command::Sync {
                input: PathBuf::from(DEFAULT_INPUT_PATH)
            }
        );
    }

    #[test]
    fn parses_show_and_register() {
        let cli = Cli::parse_from(["leaderboard", "show", "--limit", "5", "--board", "-v"]);
        assert!(cli.verbose);
        assert_eq!(
            cli.command(),
            Command::Show {
                limit: Some(5),
                board: true
            }
        );

        let cli = Cli::parse_from(["leaderboard", "register", "alice", "@alice"]);
        assert_eq!(
            cli.command(),
            Command::Register {
                username: "alice".to_owned(),
                handle: "@alice".to_owned()
            }
        );
    }

    #[test]
    fn sync_accepts_an_input_path() {
        let cli = Cli::parse_from(["leaderboard", "sync", "--input", "data/batch.json"]);
        assert_eq!(
            cli.command(),
            Command::Sync {
                input: PathBuf::from("data/batch.json")
            }
        );
    }
}
