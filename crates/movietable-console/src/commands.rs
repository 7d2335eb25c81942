use std::path::PathBuf;

use clap::Subcommand;
use rust_decimal::Decimal;

/// Operations the console can run against the Movies table.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the table (year/title key) if it does not exist.
    CreateTable,
    /// Write the two sample movies in one batched write.
    Seed,
    /// Load movies from a JSON array file, one insert per movie.
    Load {
        /// Path to the JSON file.
        file: PathBuf,
    },
    /// Set rating, plot and actors on one movie.
    Update {
        year: i64,
        title: String,
        #[arg(long)]
        rating: Decimal,
        #[arg(long)]
        plot: String,
        #[arg(long)]
        actors: String,
    },
    /// Scan movies in an inclusive year range, printing each page as it arrives.
    Scan {
        #[arg(long, default_value_t = 1990)]
        from: i64,
        #[arg(long, default_value_t = 2000)]
        to: i64,
    },
    /// List the movies released in one year.
    Query { year: i64 },
    /// Show one movie.
    Get { year: i64, title: String },
    /// Seed, update "Example 5", scan 1990-2000, then query 1990.
    Demo,
}
