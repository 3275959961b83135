pub mod fiscal_year_config;
pub mod settings;
pub mod tax_bracket;

pub use fiscal_year_config::FiscalYearConfig;
pub use settings::{FromSettings, MAX_YEARS, SettingValue, Settings};
pub use tax_bracket::{BracketLimit, TaxBracket, brackets_from_json, brackets_to_json};
