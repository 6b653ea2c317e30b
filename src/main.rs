use clap::{Parser as ClapParser, Subcommand};
use sprig_lang::cli::{self, CheckOptions, CliError, RunOptions, RunOutcome};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "sprig")]
#[command(about = "Sprig - a tree transformation language for labeled document trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a recipe against a source document
    Run {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Source document (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Parameter override as NAME=VALUE (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Pretty-print the output tree
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a recipe without executing it
    Check {
        /// Path to the recipe file
        recipe: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            recipe,
            input,
            params,
            pretty,
        } => run_recipe(recipe, input, params, pretty),
        Commands::Check { recipe } => check_recipe(recipe),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_recipe(
    recipe: PathBuf,
    input: Option<PathBuf>,
    params: Vec<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let recipe = fs::read_to_string(recipe).map_err(CliError::Io)?;

    let input = match input {
        Some(path) => Some(fs::read_to_string(path).map_err(CliError::Io)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let params = params
        .iter()
        .map(|spec| cli::parse_param(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let options = RunOptions {
        recipe,
        input,
        params,
        pretty,
    };

    match cli::execute_run(options)? {
        RunOutcome::Tree(text) => println!("{}", text),
        RunOutcome::Empty => {}
    }
    Ok(())
}

fn check_recipe(recipe: PathBuf) -> Result<(), CliError> {
    let recipe = fs::read_to_string(recipe).map_err(CliError::Io)?;
    cli::execute_check(&CheckOptions { recipe })?;
    println!("Recipe is valid");
    Ok(())
}
