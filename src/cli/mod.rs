use autotax::config::Regime;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "autotax")]
#[command(
    version,
    about = "Croatian capital income tax (JOPPD) generator for vested stock units"
)]
#[command(
    long_about = "Convert the USD value of vested GSUs to EUR at the HNB middle rate, compute capital income tax and municipal surtax, and write the JOPPD XML report for e-Porezna."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to a TOML config file (overrides $AUTOTAX_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate an OIB and show its expected check digit
    Oib {
        /// The 11-digit OIB
        oib: String,
    },

    /// Show the JOPPD period code (YYDDD) for a date
    Code {
        /// Date (YYYY-MM-DD or DD.MM.YYYY)
        date: String,
    },

    /// Show the HNB EUR/USD middle rate for a date
    Rate {
        /// Date (YYYY-MM-DD or DD.MM.YYYY)
        date: String,
    },

    /// List known towns with their city code and surtax
    Towns {
        /// Only show towns matching this text
        query: Option<String>,
    },

    /// Compute the tax on a vesting event and write the JOPPD report
    Joppd(JoppdArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct JoppdArgs {
    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// OIB (11 digits)
    #[arg(long)]
    pub oib: String,

    /// Vesting date (YYYY-MM-DD or DD.MM.YYYY)
    #[arg(long)]
    pub date: String,

    /// Town of residence (e.g. "Zagreb", "Velika Gorica")
    #[arg(long)]
    pub town: String,

    /// Street name
    #[arg(long)]
    pub street_name: String,

    /// Street number
    #[arg(long)]
    pub street_number: u32,

    /// Contact e-mail
    #[arg(long)]
    pub email: String,

    /// GSU price in USD on the vesting date
    #[arg(long)]
    pub gsu_price: String,

    /// Number of vested GSUs
    #[arg(long)]
    pub gsu_amount: u32,

    /// EUR/USD rate to use instead of querying HNB (e.g. 1,0854)
    #[arg(long)]
    pub rate: Option<String>,

    /// Which rate schedule to apply
    #[arg(long, value_enum, default_value_t = RegimeArg::Auto)]
    pub regime: RegimeArg,

    /// Directory to write the report into (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Compute and show the result without writing the report
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeArg {
    /// Decide by the vesting year
    Auto,
    /// Capital income tax only
    Flat,
    /// Capital income tax plus municipal surtax
    Surtax,
}

impl From<RegimeArg> for Regime {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::Auto => Regime::Auto,
            RegimeArg::Flat => Regime::Flat,
            RegimeArg::Surtax => Regime::Surtax,
        }
    }
}
