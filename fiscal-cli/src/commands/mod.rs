//! One module per command family. Every command returns the JSON document
//! that the output layer prints.

pub mod inflation;
pub mod investment;
pub mod loan;
pub mod projection;
pub mod settings;
pub mod structures;
pub mod tax;

use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;

use crate::app::Session;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare SASU, EURL and sole proprietorship for the profile's activity
    Compare(structures::CompareArgs),
    /// Find the SASU net salary that maximizes the owner's net income
    Optimize(structures::OptimizeArgs),
    /// Household income tax and social levies
    Tax(tax::TaxArgs),
    /// Loan cost and yearly amortization of a property purchase
    Loan,
    /// Year-by-year projection of a rental property
    Rental,
    /// Year-by-year projection of fund shares (SCPI)
    FundShares,
    /// Growth of a yearly contribution plan
    Invest,
    /// Trailing inflation averages from a local history file
    Inflation(inflation::InflationArgs),
    /// Store one setting in the profile
    Set(settings::SetArgs),
    /// Remove one setting from the profile
    Unset(settings::UnsetArgs),
    /// List the profile's settings
    Show,
    /// List stored profiles
    Profiles,
    /// List bracket schedules stored in the database
    Schedules,
}

impl Command {
    /// Commands whose only purpose is to change the profile.
    pub fn persists(&self) -> bool {
        matches!(self, Command::Set(_))
    }
}

pub async fn run(
    command: Command,
    session: &mut Session<'_>,
) -> Result<Value> {
    match command {
        Command::Compare(args) => structures::compare(&args, session).await,
        Command::Optimize(args) => structures::optimize(&args, session).await,
        Command::Tax(args) => tax::household(&args, session).await,
        Command::Loan => loan::summary(session),
        Command::Rental => projection::rental(session),
        Command::FundShares => projection::fund_shares(session),
        Command::Invest => investment::contributions(session),
        Command::Inflation(args) => inflation::averages(&args).await,
        Command::Set(args) => settings::set(&args, session),
        Command::Unset(args) => settings::unset(&args, session).await,
        Command::Show => settings::show(session),
        Command::Profiles => settings::profiles(session).await,
        Command::Schedules => settings::schedules(session).await,
    }
}
