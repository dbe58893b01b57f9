mod cli;
mod config;
mod download;
mod paths;
mod reader;
mod stats;
mod writer;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Monthly {
            product,
            variable,
            start_date,
            end_date,
            threshold,
            verbose,
        } => {
            let start = command::parse_date(start_date)?;
            let end = command::parse_date(end_date)?;
            match command::monthly(&config, product, variable, start, end, *threshold, *verbose) {
                Ok(n) => println!("Wrote statistics for {} months", n),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Commands::Snowfall {
            product,
            variable,
            start_date,
            end_date,
            threshold,
            verbose,
        } => {
            let start = command::parse_date(start_date)?;
            let end = command::parse_date(end_date)?;
            match command::snowfall(&config, product, variable, start, end, *threshold, *verbose) {
                Ok(n) => println!("Wrote statistics for {} months", n),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Commands::Accumulation {
            product,
            start_year,
            end_year,
            verbose,
        } => match command::accumulation(&config, product, *start_year, *end_year, *verbose) {
            Ok(path) => println!("File saved to `{}`", path.display()),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Climatology {
            file,
            start_year,
            end_year,
            verbose,
        } => match command::climatology(file, *start_year, *end_year, *verbose) {
            Ok(path) => println!("File saved to `{}`", path.display()),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Download {
            manifest,
            product,
            variable,
            begin,
            end,
            overwrite,
            verbose,
        } => {
            let begin = begin.as_deref().map(command::parse_date).transpose()?;
            let end = end.as_deref().map(command::parse_date).transpose()?;
            match command::download(
                &config, manifest, product, variable, begin, end, *overwrite, *verbose,
            )
            .await
            {
                Ok(n) => println!("Downloaded {} files", n),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }

    Ok(())
}
