use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use fiscal_core::{BracketLimit, RepositoryError, SettingsRepository, TaxBracket};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Rate {rate} of bracket {position} in schedule '{schedule}' is outside 0..=1")]
    InvalidRate {
        schedule: String,
        position: u32,
        rate: Decimal,
    },

    #[error("Bracket position {position} appears twice in schedule '{schedule}'")]
    DuplicatePosition { schedule: String, position: u32 },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

impl From<serde_json::Error> for BracketLoaderError {
    fn from(err: serde_json::Error) -> Self {
        BracketLoaderError::JsonParse(err.to_string())
    }
}

/// One bracket row of a CSV file.
///
/// - `schedule`: schedule name, e.g. `fr-2025`
/// - `position`: 1-based order within the schedule
/// - `up_to`: exclusive upper bound; empty or `Infinity` for the top bracket
/// - `rate`: fraction, `0.11` for 11 %
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub schedule: String,
    pub position: u32,
    #[serde(deserialize_with = "deserialize_limit")]
    pub up_to: BracketLimit,
    pub rate: Decimal,
}

impl BracketRecord {
    pub fn to_bracket(&self) -> TaxBracket {
        TaxBracket::new(self.position, self.up_to, self.rate)
    }
}

fn deserialize_limit<'de, D>(deserializer: D) -> Result<BracketLimit, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(BracketLimit::Unbounded),
        Some(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

/// Reads bracket schedules and writes them through any
/// [`SettingsRepository`].
pub struct BracketLoader;

impl BracketLoader {
    /// Parses `schedule,position,up_to,rate` rows.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parses the bracket-table JSON used by the settings store. Positions
    /// follow the array order.
    pub fn parse_json<R: Read>(
        reader: R,
        schedule: &str,
    ) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let brackets: Vec<TaxBracket> = serde_json::from_reader(reader)?;

        Ok(brackets
            .into_iter()
            .enumerate()
            .map(|(index, bracket)| BracketRecord {
                schedule: schedule.to_string(),
                position: index as u32 + 1,
                up_to: bracket.up_to,
                rate: bracket.rate,
            })
            .collect())
    }

    /// Replaces every schedule named in `records` and returns the number of
    /// brackets written.
    ///
    /// All records are validated before anything is deleted, so a bad file
    /// leaves the stored schedules untouched. Loading the same file twice
    /// gives the same result.
    pub async fn load<R: SettingsRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let groups = Self::group(records)?;
        let mut inserted = 0;

        for (schedule, mut group) in groups {
            group.sort_by_key(|record| record.position);

            repo.delete_tax_brackets(&schedule).await?;
            for record in &group {
                repo.insert_tax_bracket(&schedule, record.position, &record.to_bracket())
                    .await?;
                inserted += 1;
            }
            debug!(schedule = %schedule, brackets = group.len(), "bracket schedule loaded");
        }

        Ok(inserted)
    }

    fn group(
        records: &[BracketRecord]
    ) -> Result<BTreeMap<String, Vec<&BracketRecord>>, BracketLoaderError> {
        let mut groups: BTreeMap<String, Vec<&BracketRecord>> = BTreeMap::new();
        let mut seen: BTreeSet<(&str, u32)> = BTreeSet::new();

        for record in records {
            if record.rate < Decimal::ZERO || record.rate > Decimal::ONE {
                return Err(BracketLoaderError::InvalidRate {
                    schedule: record.schedule.clone(),
                    position: record.position,
                    rate: record.rate,
                });
            }
            if !seen.insert((record.schedule.as_str(), record.position)) {
                return Err(BracketLoaderError::DuplicatePosition {
                    schedule: record.schedule.clone(),
                    position: record.position,
                });
            }
            groups.entry(record.schedule.clone()).or_default().push(record);
        }

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const FR_2025_CSV: &str = "schedule,position,up_to,rate
fr-2025,1,11497,0
fr-2025,2,29316,0.11
fr-2025,3,83824,0.30
fr-2025,4,180294,0.41
fr-2025,5,,0.45
";

    fn record(
        schedule: &str,
        position: u32,
        rate: Decimal,
    ) -> BracketRecord {
        BracketRecord {
            schedule: schedule.to_string(),
            position,
            up_to: BracketLimit::Unbounded,
            rate,
        }
    }

    // ===== CSV tests =====

    #[test]
    fn parses_a_full_schedule() {
        let records = BracketLoader::parse_csv(FR_2025_CSV.as_bytes()).expect("Failed to parse CSV");

        let brackets: Vec<TaxBracket> = records.iter().map(BracketRecord::to_bracket).collect();

        assert_eq!(brackets, TaxBracket::france_2025());
    }

    #[test]
    fn infinity_marks_the_top_bracket() {
        let csv = "schedule,position,up_to,rate\nflat,1, Infinity ,0.2";

        let records = BracketLoader::parse_csv(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records, vec![record("flat", 1, dec!(0.2))]);
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let csv = "schedule,position\nfr-2025,1";

        let err = BracketLoader::parse_csv(csv.as_bytes()).expect_err("Should fail");

        let BracketLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {}", msg);
    }

    #[test]
    fn bad_limit_is_a_csv_error() {
        let csv = "schedule,position,up_to,rate\nfr-2025,1,lots,0.11";

        let result = BracketLoader::parse_csv(csv.as_bytes());

        assert!(matches!(result, Err(BracketLoaderError::CsvParse(_))));
    }

    #[test]
    fn header_only_file_is_empty() {
        let records = BracketLoader::parse_csv("schedule,position,up_to,rate\n".as_bytes())
            .expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // ===== JSON tests =====

    #[test]
    fn json_positions_follow_array_order() {
        let json = r#"[{"upTo": 10000, "rate": 0}, {"upTo": "Infinity", "rate": 0.25}]"#;

        let records = BracketLoader::parse_json(json.as_bytes(), "custom").expect("Should parse");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, 1);
        assert_eq!(records[0].up_to, BracketLimit::Amount(dec!(10000)));
        assert_eq!(records[1], record("custom", 2, dec!(0.25)));
    }

    #[test]
    fn malformed_json_is_reported() {
        let result = BracketLoader::parse_json("{".as_bytes(), "custom");

        assert!(matches!(result, Err(BracketLoaderError::JsonParse(_))));
    }

    // ===== validation tests =====

    #[test]
    fn rate_above_one_is_rejected() {
        let records = vec![record("fr-2025", 1, dec!(11))];

        let err = BracketLoader::group(&records).expect_err("Should reject");

        assert_eq!(
            err.to_string(),
            "Rate 11 of bracket 1 in schedule 'fr-2025' is outside 0..=1"
        );
    }

    #[test]
    fn duplicate_position_is_rejected() {
        let records = vec![
            record("fr-2025", 1, dec!(0)),
            record("fr-2025", 1, dec!(0.11)),
        ];

        let result = BracketLoader::group(&records);

        assert!(matches!(
            result,
            Err(BracketLoaderError::DuplicatePosition { position: 1, .. })
        ));
    }

    #[test]
    fn same_position_in_two_schedules_is_fine() {
        let records = vec![record("a", 1, dec!(0.1)), record("b", 1, dec!(0.2))];

        let groups = BracketLoader::group(&records).expect("Should group");

        assert_eq!(groups.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
