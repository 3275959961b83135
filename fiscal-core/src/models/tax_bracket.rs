use std::fmt;

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Upper bound of a tax bracket.
///
/// The JSON form is either a number (or numeric string) or the literal
/// `"Infinity"` for the open-ended top bracket. `null` is read as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BracketLimit {
    Amount(Decimal),
    Unbounded,
}

const INFINITY_SENTINEL: &str = "Infinity";

impl BracketLimit {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            BracketLimit::Amount(value) => Some(*value),
            BracketLimit::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, BracketLimit::Unbounded)
    }
}

impl fmt::Display for BracketLimit {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            BracketLimit::Amount(value) => write!(f, "{value}"),
            BracketLimit::Unbounded => f.write_str(INFINITY_SENTINEL),
        }
    }
}

fn is_infinity_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.eq_ignore_ascii_case(INFINITY_SENTINEL)
        || trimmed.eq_ignore_ascii_case("inf")
        || trimmed == "∞"
}

impl std::str::FromStr for BracketLimit {
    type Err = rust_decimal::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().is_empty() || is_infinity_sentinel(raw) {
            return Ok(BracketLimit::Unbounded);
        }
        raw.trim().parse::<Decimal>().map(BracketLimit::Amount)
    }
}

impl Serialize for BracketLimit {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            BracketLimit::Amount(value) => Serialize::serialize(value, serializer),
            BracketLimit::Unbounded => serializer.serialize_str(INFINITY_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for BracketLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Null,
            Amount(Decimal),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Null => Ok(BracketLimit::Unbounded),
            Raw::Amount(value) => Ok(BracketLimit::Amount(value)),
            Raw::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

/// One row of a progressive tax schedule.
///
/// `up_to` is the exclusive upper bound of the bracket; the lower bound is
/// the previous bracket's `up_to` once the schedule is sorted. Rates are
/// fractions (`0.11` for 11 %).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    #[serde(default)]
    pub id: u32,
    pub up_to: BracketLimit,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        id: u32,
        up_to: BracketLimit,
        rate: Decimal,
    ) -> Self {
        Self { id, up_to, rate }
    }

    /// French schedule applied to 2024 income (2025 tax year).
    pub fn france_2025() -> Vec<TaxBracket> {
        schedule(&[
            (Some(amount(11497, 0)), amount(0, 0)),
            (Some(amount(29316, 0)), amount(11, 2)),
            (Some(amount(83824, 0)), amount(30, 2)),
            (Some(amount(180294, 0)), amount(41, 2)),
            (None, amount(45, 2)),
        ])
    }

    /// French schedule applied to 2022 income, kept for the household
    /// calculator's historical default.
    pub fn france_2023() -> Vec<TaxBracket> {
        schedule(&[
            (Some(amount(10777, 0)), amount(0, 0)),
            (Some(amount(27478, 0)), amount(11, 2)),
            (Some(amount(78570, 0)), amount(30, 2)),
            (Some(amount(168994, 0)), amount(41, 2)),
            (None, amount(45, 2)),
        ])
    }
}

fn amount(
    num: i64,
    scale: u32,
) -> Decimal {
    Decimal::new(num, scale)
}

fn schedule(rows: &[(Option<Decimal>, Decimal)]) -> Vec<TaxBracket> {
    rows.iter()
        .enumerate()
        .map(|(index, (up_to, rate))| {
            let limit = match up_to {
                Some(value) => BracketLimit::Amount(*value),
                None => BracketLimit::Unbounded,
            };
            TaxBracket::new(index as u32 + 1, limit, *rate)
        })
        .collect()
}

/// Serializes a bracket table to its JSON form.
pub fn brackets_to_json(brackets: &[TaxBracket]) -> Result<String, serde_json::Error> {
    serde_json::to_string(brackets)
}

/// Parses a bracket table from its JSON form.
pub fn brackets_from_json(json: &str) -> Result<Vec<TaxBracket>, serde_json::Error> {
    serde_json::from_str(json)
}
