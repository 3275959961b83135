//! Loading reference data into a real SQLite repository.

use fiscal_core::calculations::{
    InflationHistoryProvider, progressive_tax, trailing_averages,
};
use fiscal_core::{SettingsRepository, TaxBracket};
use fiscal_data::{BracketLoader, BracketLoaderError, FileInflationHistory};
use fiscal_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const BRACKETS_CSV: &str = include_str!("../test-data/brackets_fr.csv");
const FLAT_JSON: &str = include_str!("../test-data/brackets_flat.json");
const INFLATION_CSV: &str = include_str!("../test-data/inflation.csv");

/// Migrated database with no seed data.
async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo
}

#[tokio::test]
async fn loads_every_schedule_in_the_file() {
    let repo = setup_test_db().await;

    let records = BracketLoader::parse_csv(BRACKETS_CSV.as_bytes()).expect("Failed to parse CSV");
    let inserted = BracketLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    assert_eq!(inserted, 10);
    assert_eq!(
        repo.list_bracket_schedules().await.expect("Should list"),
        vec!["fr-2023".to_string(), "fr-2025".to_string()]
    );
    assert_eq!(
        repo.get_tax_brackets("fr-2025").await.expect("Should get"),
        TaxBracket::france_2025()
    );
    assert_eq!(
        repo.get_tax_brackets("fr-2023").await.expect("Should get"),
        TaxBracket::france_2023()
    );
}

#[tokio::test]
async fn reloading_replaces_instead_of_duplicating() {
    let repo = setup_test_db().await;
    let records = BracketLoader::parse_csv(BRACKETS_CSV.as_bytes()).expect("Failed to parse CSV");

    BracketLoader::load(&repo, &records).await.expect("First load");
    BracketLoader::load(&repo, &records).await.expect("Second load");

    assert_eq!(
        repo.get_tax_brackets("fr-2025").await.expect("Should get").len(),
        5
    );
}

#[tokio::test]
async fn invalid_file_leaves_existing_schedule_untouched() {
    let repo = setup_test_db().await;
    let records = BracketLoader::parse_csv(BRACKETS_CSV.as_bytes()).expect("Failed to parse CSV");
    BracketLoader::load(&repo, &records).await.expect("Should load");

    let bad = "schedule,position,up_to,rate\nfr-2025,1,11497,0\nfr-2025,2,,30";
    let bad_records = BracketLoader::parse_csv(bad.as_bytes()).expect("Parses as CSV");
    let result = BracketLoader::load(&repo, &bad_records).await;

    assert!(matches!(result, Err(BracketLoaderError::InvalidRate { position: 2, .. })));
    assert_eq!(
        repo.get_tax_brackets("fr-2025").await.expect("Should get"),
        TaxBracket::france_2025()
    );
}

#[tokio::test]
async fn json_schedule_drives_the_tax_calculation() {
    let repo = setup_test_db().await;

    let records =
        BracketLoader::parse_json(FLAT_JSON.as_bytes(), "flat-test").expect("Failed to parse JSON");
    BracketLoader::load(&repo, &records).await.expect("Should load");

    let brackets = repo.get_tax_brackets("flat-test").await.expect("Should get");
    let result = progressive_tax(dec!(30000), &brackets, false);

    assert_eq!(result.tax, dec!(4000));
    assert_eq!(result.marginal_rate, dec!(0.20));
}

#[tokio::test]
async fn loader_works_through_a_trait_object() {
    let repo: Box<dyn SettingsRepository> = Box::new(setup_test_db().await);
    let records = BracketLoader::parse_csv(BRACKETS_CSV.as_bytes()).expect("Failed to parse CSV");

    let inserted = BracketLoader::load(repo.as_ref(), &records)
        .await
        .expect("Failed to load brackets");

    assert_eq!(inserted, 10);
}

#[tokio::test]
async fn inflation_file_yields_trailing_averages() {
    let history =
        FileInflationHistory::from_csv(INFLATION_CSV.as_bytes()).expect("Failed to parse CSV");

    let france = trailing_averages(&history.fetch("FRA").await.expect("Should find France"));

    assert_eq!(france.len(), 6);
    assert_eq!(france[0].window, 5);
    assert_eq!(france[0].first_year, 2019);
    assert_eq!(france[0].average, Some(dec!(2.66)));
    assert_eq!(france[1].average, Some(dec!(1.69)));
    assert_eq!(france[2].observations, 10);
    assert_eq!(france[2].average, Some(dec!(1.69)));
}

#[tokio::test]
async fn trailing_window_ends_at_last_published_year() {
    let history =
        FileInflationHistory::from_csv(INFLATION_CSV.as_bytes()).expect("Failed to parse CSV");

    let germany = trailing_averages(&history.fetch("DEU").await.expect("Should find Germany"));

    assert_eq!(germany[0].last_year, 2022);
    assert_eq!(germany[0].observations, 4);
    assert_eq!(germany[0].average, Some(dec!(2.875)));
}
