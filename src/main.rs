use clap::{
    Parser,
    Subcommand,
};
use genoseek::analysis;
use genoseek::config::{
    PoolConfig,
    StoreConfig,
};
use genoseek::errors::Result;
use genoseek::storage::genomes::{
    read_genome_csv_file,
    DEFAULT_SEQUENCE_LENGTH_LIMIT,
};
use genoseek::storage::{
    BatchWriter,
    ConnectionPool,
    FailureMode,
};
use indicatif::ProgressBar;
use log::{
    error,
    info,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "genoseek",
    version,
    about = "Search genomic sequences for patterns and compare them for variations",
    arg_required_else_help = true
)]
struct Cli {
    /// SQLite database holding genomes, patterns and logged results
    #[arg(long, env = "GENOSEEK_DB", default_value = "genoseek.sqlite")]
    db: PathBuf,
    #[arg(long, env = "GENOSEEK_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: usize,
    /// Seconds to wait for a free database connection
    #[arg(long, env = "GENOSEEK_ACQUIRE_TIMEOUT", default_value_t = 30)]
    acquire_timeout: u64,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the tables and the sample patterns
    Init,
    /// Load genomes from a CSV file (genome_id,description,sequence)
    Load {
        csv: PathBuf,
        /// Roll back the whole load on the first bad row instead of skipping it
        #[arg(long)]
        abort_on_error: bool,
        #[arg(long, default_value_t = DEFAULT_SEQUENCE_LENGTH_LIMIT)]
        max_length: usize,
    },
    /// List stored genomes
    Genomes,
    /// List saved patterns
    Patterns,
    /// Search a genome for a regex pattern
    Search {
        genome_id: i64,
        /// Custom regex pattern
        #[arg(long, conflicts_with = "saved", required_unless_present = "saved")]
        pattern: Option<String>,
        /// Name of a saved pattern
        #[arg(long)]
        saved: Option<String>,
        /// Log the matches to the database
        #[arg(long)]
        log: bool,
    },
    /// Compare two genomes position by position
    Compare {
        reference_id: i64,
        comparison_id: i64,
        /// Log the variations to the database
        #[arg(long)]
        log: bool,
        /// How many variations to print
        #[arg(long, default_value_t = 100)]
        preview: usize,
    },
    /// Search a genome for every saved pattern and log the matches
    Scan { genome_id: i64 },
    /// GC content of a genome
    Gc { genome_id: i64 },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: Commands, pool: &ConnectionPool, json: bool) -> Result<()> {
    match command {
        Commands::Init => {
            let added = analysis::initialize(pool)?;
            println!("Database ready, {} sample pattern(s) added.", added);
        }
        Commands::Load {
            csv,
            abort_on_error,
            max_length,
        } => {
            info!("Reading data from {:?}", csv);
            let rows: Vec<_> = read_genome_csv_file(&csv)?
                .into_iter()
                .map(|row| row.truncated(max_length))
                .collect();
            println!("Found {} rows to insert.", rows.len());

            let mode = if abort_on_error {
                FailureMode::AbortOnError
            } else {
                FailureMode::SkipOnError
            };
            let progress = if json {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(rows.len() as u64)
            };
            let writer = BatchWriter::new(mode).with_progress(progress);
            let report = analysis::load_genomes(pool, &rows, &writer)?;
            if json {
                return print_json(&report);
            }
            for failure in &report.skipped {
                println!(
                    "Error on row {} (genome_id: {}). Skipped: {}",
                    failure.row + 1,
                    rows[failure.row].genome_id,
                    failure.message
                );
            }
            println!(
                "Inserted {} genome(s), skipped {}.",
                report.inserted,
                report.skipped.len()
            );
        }
        Commands::Genomes => {
            let genomes = analysis::list_genomes(pool)?;
            if json {
                return print_json(&genomes);
            }
            for genome in genomes {
                println!(
                    "{}\t{}\t{} bp",
                    genome.genome_id, genome.description, genome.length
                );
            }
        }
        Commands::Patterns => {
            let patterns = analysis::list_patterns(pool)?;
            if json {
                return print_json(&patterns);
            }
            for pattern in patterns {
                println!(
                    "{} ({})\t{}",
                    pattern.pattern_name, pattern.regex_pattern, pattern.description
                );
            }
        }
        Commands::Search {
            genome_id,
            pattern,
            saved,
            log,
        } => {
            let report = match (pattern, saved) {
                (Some(pattern), _) if pattern.is_empty() => {
                    println!("Please enter a pattern to search for.");
                    return Ok(());
                }
                (Some(pattern), _) => analysis::search(pool, genome_id, &pattern)?,
                (None, Some(name)) => analysis::search_saved(pool, genome_id, &name)?,
                (None, None) => unreachable!("clap requires --pattern or --saved"),
            };

            if json {
                print_json(&report)?;
            } else {
                if let Some(diagnostic) = &report.diagnostic {
                    println!("Warning: {}", diagnostic);
                }
                println!("Found {} match(es)!", report.matches.len());
                for (i, hit) in report.matches.iter().enumerate() {
                    println!(
                        "{}\t{}\t{}\t{}",
                        i + 1,
                        hit.start,
                        hit.end,
                        hit.matched_sequence
                    );
                }
            }

            if log && !report.matches.is_empty() {
                let logged =
                    analysis::log_matches(pool, genome_id, report.pattern_id, &report.matches)?;
                println!("Logged {} match(es) to the database.", logged);
            }
        }
        Commands::Compare {
            reference_id,
            comparison_id,
            log,
            preview,
        } => {
            let report = analysis::compare(pool, reference_id, comparison_id)?;
            let mutations = report.mutations();

            if json {
                print_json(&report)?;
            } else {
                println!(
                    "Comparison complete! Found {} variations.",
                    mutations.len()
                );
                println!("Variation Rate: {:.2}%", report.variation_rate);
                for mutation in mutations.iter().take(preview) {
                    println!(
                        "{}\t{}\t{}\t{}",
                        mutation.kind.as_str(),
                        mutation.position,
                        mutation.original,
                        mutation.mutated
                    );
                }
            }

            if log && !mutations.is_empty() {
                match analysis::log_mutations(pool, comparison_id, mutations) {
                    Ok(logged) => println!(
                        "Transaction successful. {} variations logged to the database!",
                        logged
                    ),
                    Err(e) => {
                        println!("Transaction failed. Rolling back. Error: {}", e);
                        return Err(e);
                    }
                }
            }
        }
        Commands::Scan { genome_id } => {
            let hits = analysis::scan_catalog(pool, genome_id)?;
            if json {
                return print_json(&hits);
            }
            for hit in hits.iter().filter(|h| h.matches > 0) {
                println!(
                    "Found {} match(es) for pattern '{}'",
                    hit.matches, hit.pattern.pattern_name
                );
            }
            println!("Pattern search and logging complete.");
        }
        Commands::Gc { genome_id } => {
            let gc = analysis::genome_gc_content(pool, genome_id)?;
            if json {
                return print_json(&serde_json::json!({ "genome_id": genome_id, "gc_content": gc }));
            }
            println!("GC content of genome {}: {:.2}%", genome_id, gc);
        }
    }
    Ok(())
}

fn main() {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config = StoreConfig::new(cli.db).with_pool(PoolConfig {
        max_connections: cli.max_connections,
        acquire_timeout: Duration::from_secs(cli.acquire_timeout),
        ..Default::default()
    });

    let pool = match ConnectionPool::open(&config) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to the database: {}", e);
            eprintln!("Failed to connect to the database: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = run(cli.command, &pool, cli.json);
    pool.close();
    if let Err(e) = outcome {
        error!("{:?}", e);
        eprintln!("An error occurred: {}", e);
        std::process::exit(1);
    }
}
