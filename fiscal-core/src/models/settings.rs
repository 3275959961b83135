//! Flat key/value settings consumed by every simulation.
//!
//! The store never fails a read: each typed getter takes the engine default
//! and falls back to it when the entry is missing, of the wrong kind,
//! unparseable, or outside the accepted range. Fallbacks on present but
//! malformed entries are logged at `warn` level.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::tax_bracket::{TaxBracket, brackets_from_json, brackets_to_json};

/// Longest horizon accepted for any year-count setting.
pub const MAX_YEARS: u32 = 100;

/// A single stored setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SettingValue {
    Number(Decimal),
    Flag(bool),
    Text(String),
}

impl SettingValue {
    /// Storage tag used by persistence backends.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingValue::Number(_) => "number",
            SettingValue::Flag(_) => "flag",
            SettingValue::Text(_) => "text",
        }
    }

    /// Rebuilds a value from its storage tag and textual payload.
    ///
    /// Returns `None` for an unknown tag or a payload that does not match it.
    pub fn from_stored(
        kind: &str,
        raw: &str,
    ) -> Option<SettingValue> {
        match kind {
            "number" => parse_number(raw).map(SettingValue::Number),
            "flag" => parse_flag(raw).map(SettingValue::Flag),
            "text" => Some(SettingValue::Text(raw.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            SettingValue::Number(value) => write!(f, "{value}"),
            SettingValue::Flag(value) => write!(f, "{value}"),
            SettingValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<Decimal> for SettingValue {
    fn from(value: Decimal) -> Self {
        SettingValue::Number(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Flag(value)
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        SettingValue::Number(Decimal::from(value))
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

fn parse_number(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(&normalized).ok())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings snapshot handed to the engine for one computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    entries: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SettingValue>,
    ) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<SettingValue> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Copies every entry of `other` over this snapshot.
    pub fn merge(
        &mut self,
        other: &Settings,
    ) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Numeric entry, parsing text values. A decimal comma is accepted.
    pub fn decimal(
        &self,
        key: &str,
        default: Decimal,
    ) -> Decimal {
        match self.entries.get(key) {
            None => default,
            Some(SettingValue::Number(value)) => *value,
            Some(SettingValue::Text(raw)) => parse_number(raw).unwrap_or_else(|| {
                warn!(key, value = %raw, "unparseable numeric setting, using default");
                default
            }),
            Some(SettingValue::Flag(_)) => {
                warn!(key, "flag stored where a number was expected, using default");
                default
            }
        }
    }

    /// Non-negative amount.
    pub fn amount(
        &self,
        key: &str,
        default: Decimal,
    ) -> Decimal {
        self.bounded(key, default, Some(Decimal::ZERO), None)
    }

    /// Rate expressed as a fraction in `0..=1`.
    pub fn rate(
        &self,
        key: &str,
        default: Decimal,
    ) -> Decimal {
        self.bounded(key, default, Some(Decimal::ZERO), Some(Decimal::ONE))
    }

    /// Growth rate expressed as a fraction in `-1..=1`.
    pub fn signed_rate(
        &self,
        key: &str,
        default: Decimal,
    ) -> Decimal {
        self.bounded(key, default, Some(Decimal::NEGATIVE_ONE), Some(Decimal::ONE))
    }

    /// Whole number of years in `0..=MAX_YEARS`. Fractions are truncated.
    pub fn years(
        &self,
        key: &str,
        default: u32,
    ) -> u32 {
        let value = self.bounded(
            key,
            Decimal::from(default),
            Some(Decimal::ZERO),
            Some(Decimal::from(MAX_YEARS)),
        );
        value.trunc().to_u32().unwrap_or(default)
    }

    /// Whole number of months in `0..=12`.
    pub fn months(
        &self,
        key: &str,
        default: u32,
    ) -> u32 {
        let value = self.bounded(
            key,
            Decimal::from(default),
            Some(Decimal::ZERO),
            Some(Decimal::from(12)),
        );
        value.trunc().to_u32().unwrap_or(default)
    }

    pub fn flag(
        &self,
        key: &str,
        default: bool,
    ) -> bool {
        match self.entries.get(key) {
            None => default,
            Some(SettingValue::Flag(value)) => *value,
            Some(SettingValue::Text(raw)) => parse_flag(raw).unwrap_or_else(|| {
                warn!(key, value = %raw, "unparseable flag setting, using default");
                default
            }),
            Some(SettingValue::Number(value)) => !value.is_zero(),
        }
    }

    pub fn text(
        &self,
        key: &str,
        default: &str,
    ) -> String {
        match self.entries.get(key) {
            Some(SettingValue::Text(value)) => value.clone(),
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    }

    /// Bracket table stored as JSON under `key`.
    ///
    /// Falls back to `default` when the entry is absent, malformed, or empty.
    pub fn tax_brackets(
        &self,
        key: &str,
        default: Vec<TaxBracket>,
    ) -> Vec<TaxBracket> {
        match self.entries.get(key) {
            None => default,
            Some(SettingValue::Text(json)) => match brackets_from_json(json) {
                Ok(brackets) if !brackets.is_empty() => brackets,
                Ok(_) => {
                    warn!(key, "empty bracket table, using default schedule");
                    default
                }
                Err(err) => {
                    warn!(key, error = %err, "malformed bracket table, using default schedule");
                    default
                }
            },
            Some(_) => {
                warn!(key, "bracket table is not stored as text, using default schedule");
                default
            }
        }
    }

    pub fn set_tax_brackets(
        &mut self,
        key: &str,
        brackets: &[TaxBracket],
    ) {
        match brackets_to_json(brackets) {
            Ok(json) => self.set(key, json),
            Err(err) => warn!(key, error = %err, "could not serialize bracket table"),
        }
    }

    fn bounded(
        &self,
        key: &str,
        default: Decimal,
        lower: Option<Decimal>,
        upper: Option<Decimal>,
    ) -> Decimal {
        let value = self.decimal(key, default);
        let too_low = lower.is_some_and(|bound| value < bound);
        let too_high = upper.is_some_and(|bound| value > bound);
        if too_low || too_high {
            warn!(key, %value, "setting out of range, using default");
            return default;
        }
        value
    }
}

impl<K, V> FromIterator<(K, V)> for Settings
where
    K: Into<String>,
    V: Into<SettingValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut settings = Settings::new();
        for (key, value) in iter {
            settings.set(key, value);
        }
        settings
    }
}

/// Reads an engine input from a settings snapshot, applying defaults, and
/// writes the effective values back.
pub trait FromSettings: Sized {
    fn from_settings(settings: &Settings) -> Self;

    fn write_settings(
        &self,
        settings: &mut Settings,
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::tax_bracket::BracketLimit;

    // ===== decimal tests =====

    #[test]
    fn decimal_returns_default_when_missing() {
        let settings = Settings::new();

        assert_eq!(settings.decimal("company.revenue", dec!(83625)), dec!(83625));
    }

    #[test]
    fn decimal_reads_numbers_and_numeric_text() {
        let settings: Settings = [
            ("a", SettingValue::Number(dec!(12.5))),
            ("b", SettingValue::Text("3,75".to_string())),
            ("c", SettingValue::Text(" 1e3 ".to_string())),
        ]
        .into_iter()
        .collect();

        assert_eq!(settings.decimal("a", Decimal::ZERO), dec!(12.5));
        assert_eq!(settings.decimal("b", Decimal::ZERO), dec!(3.75));
        assert_eq!(settings.decimal("c", Decimal::ZERO), dec!(1000));
    }

    #[test]
    fn decimal_substitutes_default_for_garbage() {
        let settings: Settings = [("a", "twelve"), ("b", "")].into_iter().collect();

        assert_eq!(settings.decimal("a", dec!(7)), dec!(7));
        assert_eq!(settings.decimal("b", dec!(8)), dec!(8));
    }

    #[test]
    fn decimal_substitutes_default_for_flag() {
        let mut settings = Settings::new();
        settings.set("a", true);

        assert_eq!(settings.decimal("a", dec!(1.5)), dec!(1.5));
    }

    // ===== range tests =====

    #[test]
    fn amount_rejects_negative_values() {
        let mut settings = Settings::new();
        settings.set("loan.property_price", dec!(-5));

        assert_eq!(settings.amount("loan.property_price", dec!(200000)), dec!(200000));
    }

    #[test]
    fn rate_accepts_unit_interval_only() {
        let mut settings = Settings::new();
        settings.set("ok", dec!(0.035));
        settings.set("percent", dec!(3.5));

        assert_eq!(settings.rate("ok", dec!(0.01)), dec!(0.035));
        assert_eq!(settings.rate("percent", dec!(0.01)), dec!(0.01));
    }

    #[test]
    fn signed_rate_accepts_negative_growth() {
        let mut settings = Settings::new();
        settings.set("growth", dec!(-0.02));

        assert_eq!(settings.signed_rate("growth", Decimal::ZERO), dec!(-0.02));
        assert_eq!(settings.rate("growth", Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn years_truncates_and_caps() {
        let mut settings = Settings::new();
        settings.set("a", dec!(20.9));
        settings.set("b", dec!(500));
        settings.set("c", "15");

        assert_eq!(settings.years("a", 10), 20);
        assert_eq!(settings.years("b", 10), 10);
        assert_eq!(settings.years("c", 10), 15);
    }

    #[test]
    fn months_are_capped_at_a_year() {
        let mut settings = Settings::new();
        settings.set("delay", 13u32);

        assert_eq!(settings.months("delay", 3), 3);
    }

    // ===== flag / text tests =====

    #[test]
    fn flag_parses_text_and_numbers() {
        let settings: Settings = [
            ("a", SettingValue::Text("true".to_string())),
            ("b", SettingValue::Text("off".to_string())),
            ("c", SettingValue::Number(dec!(0))),
            ("d", SettingValue::Text("maybe".to_string())),
        ]
        .into_iter()
        .collect();

        assert!(settings.flag("a", false));
        assert!(!settings.flag("b", true));
        assert!(!settings.flag("c", true));
        assert!(settings.flag("d", true));
        assert!(settings.flag("missing", true));
    }

    #[test]
    fn text_renders_non_text_values() {
        let mut settings = Settings::new();
        settings.set("owner", "usufruct");
        settings.set("n", dec!(4));

        assert_eq!(settings.text("owner", "full"), "usufruct");
        assert_eq!(settings.text("n", "x"), "4");
        assert_eq!(settings.text("missing", "full"), "full");
    }

    // ===== bracket table tests =====

    #[test]
    fn tax_brackets_fall_back_on_malformed_json() {
        let mut settings = Settings::new();
        settings.set("tax.brackets", "{not json");

        assert_eq!(
            settings.tax_brackets("tax.brackets", TaxBracket::france_2023()),
            TaxBracket::france_2023()
        );
    }

    #[test]
    fn tax_brackets_fall_back_on_empty_table() {
        let mut settings = Settings::new();
        settings.set("tax.brackets", "[]");

        assert_eq!(
            settings.tax_brackets("tax.brackets", TaxBracket::france_2025()),
            TaxBracket::france_2025()
        );
    }

    #[test]
    fn tax_brackets_read_back_what_was_stored() {
        let table = vec![
            TaxBracket::new(1, BracketLimit::Amount(dec!(10000)), dec!(0)),
            TaxBracket::new(2, BracketLimit::Unbounded, dec!(0.2)),
        ];
        let mut settings = Settings::new();
        settings.set_tax_brackets("tax.brackets", &table);

        assert_eq!(
            settings.tax_brackets("tax.brackets", TaxBracket::france_2025()),
            table
        );
    }

    // ===== storage tests =====

    #[test]
    fn from_stored_restores_each_kind() {
        assert_eq!(
            SettingValue::from_stored("number", "0.172"),
            Some(SettingValue::Number(dec!(0.172)))
        );
        assert_eq!(
            SettingValue::from_stored("flag", "false"),
            Some(SettingValue::Flag(false))
        );
        assert_eq!(
            SettingValue::from_stored("text", "usufruct"),
            Some(SettingValue::Text("usufruct".to_string()))
        );
        assert_eq!(SettingValue::from_stored("number", "abc"), None);
        assert_eq!(SettingValue::from_stored("blob", "x"), None);
    }

    #[test]
    fn merge_overwrites_existing_entries() {
        let mut base: Settings = [("a", dec!(1)), ("b", dec!(2))].into_iter().collect();
        let overlay: Settings = [("b", dec!(20)), ("c", dec!(30))].into_iter().collect();

        base.merge(&overlay);

        assert_eq!(base.len(), 3);
        assert_eq!(base.decimal("b", Decimal::ZERO), dec!(20));
    }
}
