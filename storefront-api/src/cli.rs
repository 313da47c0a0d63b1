//! Command-line interface for the storefront server binary.
//!
//! Running the binary without a subcommand starts the HTTP server.

use clap::{Parser, Subcommand};

/// Storefront API server
#[derive(Parser, Debug)]
#[command(name = "storefront-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run, `serve` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve { seed: false })
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply migrations and start the HTTP server
    Serve {
        /// Insert built-in roles, demo users and demo products before serving
        #[arg(long, env = "SEED_DATABASE")]
        seed: bool,
    },

    /// Apply pending migrations and report the schema version
    Migrate {
        /// Create the database first if it does not exist
        #[arg(long)]
        create_database: bool,
    },

    /// Insert built-in roles and demo data into an empty database
    Seed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["storefront-api"]).unwrap();
        assert_eq!(cli.command(), Command::Serve { seed: false });
    }

    #[test]
    fn test_serve_with_seed() {
        let cli = Cli::try_parse_from(["storefront-api", "serve", "--seed"]).unwrap();
        assert_eq!(cli.command(), Command::Serve { seed: true });
    }

    #[test]
    fn test_migrate_create_database() {
        let cli = Cli::try_parse_from(["storefront-api", "migrate", "--create-database"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Migrate {
                create_database: true
            }
        );
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["storefront-api", "explode"]).is_err());
    }
}
