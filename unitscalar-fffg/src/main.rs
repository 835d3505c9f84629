//! FFFg ejection charge calculator
//!
//! Sizes the black powder charge for a rocket recovery chamber.
//!
//! Flags:
//! - `--fixed-molar-mass`: use the fitted 69.78 g/mol instead of the KNO3/S/C mix
//! - `--verbose`: debug logging on stderr

mod charge;
mod formula;

use std::process::ExitCode;
use clap::Parser;
use tracing::{error, Level};
use charge::{ChargeDesign, MolarMassSource, FIXED_MOLAR_MASS_G_PER_MOL};

/// Black powder ejection charge calculator
#[derive(Parser, Debug)]
#[command(name = "fffg")]
#[command(about = "Size an FFFg ejection charge for the reference recovery chamber", long_about = None)]
#[command(version)]
struct Args {
    /// Use the fitted 69.78 g/mol molar mass instead of the KNO3/S/C mix
    #[arg(long)]
    fixed_molar_mass: bool,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn source(&self) -> MolarMassSource {
        if self.fixed_molar_mass {
            MolarMassSource::Fixed(FIXED_MOLAR_MASS_G_PER_MOL)
        } else {
            MolarMassSource::CustomMix
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the results
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let result = ChargeDesign::reference().and_then(|design| charge::report(&design, args.source()));
    match result {
        Ok((molar_mass, mass)) => {
            println!("FFFg Molar Mass is: {}", molar_mass);
            println!("FFFg Mass: {}", mass);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("charge calculation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
