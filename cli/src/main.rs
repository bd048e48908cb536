use anyhow::Result;
use clap::Parser;
use cli::{
    read_published_ballots, read_votes, sign_in, sign_votes, tally, utils::*, votes_hash,
};
use log::info;
use retro_core::{validate_ballot, Address, Calculation, CalculationOptions, VoteCaps};
use secp256k1::SecretKey;
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Clone)]
pub enum Commands {
    /// Print the commitment hash for a votes file
    HashVotes {
        #[arg(long, help = "JSON file with a vote list or a ballot body")]
        file: PathBuf,
    },
    /// Print the address controlled by a secret key
    Address {
        #[arg(long, env = "VOTER_SECRET_KEY", value_parser = parse_secret)]
        secret_key: SecretKey,
    },
    /// Validate a votes file against round caps
    CheckVotes {
        #[arg(long)]
        file: PathBuf,

        #[arg(long, value_parser = parse_non_negative)]
        max_votes_total: f64,

        #[arg(long, value_parser = parse_non_negative)]
        max_votes_project: f64,
    },
    /// Sign a ballot and print the publish request body
    SignBallot {
        #[arg(long, env = "VOTER_SECRET_KEY", value_parser = parse_secret)]
        secret_key: SecretKey,

        #[arg(long, env, default_value = "10")]
        chain_id: u64,

        #[arg(long)]
        file: PathBuf,
    },
    /// Sign a sign-in nonce and print the session request body
    SignIn {
        #[arg(long, env = "VOTER_SECRET_KEY", value_parser = parse_secret)]
        secret_key: SecretKey,

        #[arg(long)]
        nonce: String,
    },
    /// Compute round results from an export of published ballots
    Tally {
        #[arg(long, help = "JSON array of {voter_id, votes}")]
        file: PathBuf,

        #[arg(long, default_value = "false")]
        is_compressed: bool,

        #[arg(long, default_value = "sqrt", value_parser = parse_calculation)]
        calculation: Calculation,

        #[arg(long, help = "Minimum distinct voters per project")]
        threshold: Option<u32>,

        #[arg(long, value_parser = parse_non_negative)]
        pool_amount: Option<f64>,
    },
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(false)
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Commands::HashVotes { file } => {
            let votes = read_votes(&file)?;
            info!("Read {} votes from {:?}", votes.len(), file);
            println!("{}", votes_hash(&votes));
        }
        Commands::Address { secret_key } => {
            println!("{}", Address::from_secret_key(&secret_key));
        }
        Commands::CheckVotes {
            file,
            max_votes_total,
            max_votes_project,
        } => {
            let votes = read_votes(&file)?;
            let caps = VoteCaps {
                max_votes_total,
                max_votes_project,
            };
            validate_ballot(&votes, &caps)?;
            info!("{} votes are within caps", votes.len());
            println!("ok");
        }
        Commands::SignBallot {
            secret_key,
            chain_id,
            file,
        } => {
            let votes = read_votes(&file)?;
            let signed = sign_votes(&secret_key, chain_id, &votes)?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Commands::SignIn { secret_key, nonce } => {
            let signed = sign_in(&secret_key, &nonce)?;
            println!("{}", serde_json::to_string_pretty(&signed)?);
        }
        Commands::Tally {
            file,
            is_compressed,
            calculation,
            threshold,
            pool_amount,
        } => {
            let ballots = read_published_ballots(&file, is_compressed)?;
            let options = CalculationOptions {
                calculation,
                threshold,
            };
            let results = tally(&ballots, &options, pool_amount);
            info!(
                "{} voters, {} projects",
                results.total_voters,
                results.projects.len()
            );
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
