//! Rendering of command results.
//!
//! Commands hand back a [`serde_json::Value`]. Objects become `Field | Value`
//! tables, arrays of objects become one row per item, and nested sections
//! are printed below their parent with a dotted title.

use std::str::FromStr;

use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use tabled::settings::Style;
use tabled::{Table, builder::Builder};

/// Wide arrays with this many items or fewer are printed one column per item.
const TRANSPOSE_MAX_ITEMS: usize = 4;
const TRANSPOSE_MIN_FIELDS: usize = 8;
const LABEL_FIELDS: [&str; 2] = ["kind", "name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn print(
    format: OutputFormat,
    value: &Value,
) {
    println!("{}", render(format, value));
}

pub fn render(
    format: OutputFormat,
    value: &Value,
) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("JSON serialization error: {e}")),
        OutputFormat::Table => {
            let mut sections = Vec::new();
            collect_sections(None, value, &mut sections);
            sections.join("\n\n")
        }
    }
}

fn collect_sections(
    title: Option<&str>,
    value: &Value,
    out: &mut Vec<String>,
) {
    match value {
        Value::Object(map) => {
            let scalars: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !is_nested(v)).collect();
            if !scalars.is_empty() {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                for (key, val) in scalars {
                    builder.push_record([key.clone(), format_value(val)]);
                }
                out.push(titled(title, finish(builder)));
            }

            for (key, nested) in map.iter().filter(|(_, v)| is_nested(v)) {
                let name = match title {
                    Some(parent) => format!("{parent}.{key}"),
                    None => key.clone(),
                };
                collect_sections(Some(&name), nested, out);
            }
        }
        Value::Array(items) => out.push(titled(title, array_table(items))),
        other => out.push(titled(title, format_value(other))),
    }
}

fn is_nested(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn titled(
    title: Option<&str>,
    body: String,
) -> String {
    match title {
        Some(title) => format!("{title}\n{body}"),
        None => body,
    }
}

fn finish(builder: Builder) -> String {
    let mut table = Table::from(builder);
    table.with(Style::rounded());
    table.to_string()
}

fn array_table(items: &[Value]) -> String {
    if items.is_empty() {
        return "(empty)".to_string();
    }

    let Some(Value::Object(first)) = items.first() else {
        return items.iter().map(format_value).collect::<Vec<_>>().join("\n");
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let rows: Vec<&Map<String, Value>> = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if rows.len() <= TRANSPOSE_MAX_ITEMS && headers.len() >= TRANSPOSE_MIN_FIELDS {
        return transposed_table(&headers, &rows);
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in &rows {
        builder.push_record(headers.iter().map(|h| cell(row, h)));
    }
    finish(builder)
}

/// One column per item, labelled by its `kind` or `name` field when present.
fn transposed_table(
    headers: &[String],
    rows: &[&Map<String, Value>],
) -> String {
    let label = headers
        .iter()
        .find(|h| LABEL_FIELDS.contains(&h.as_str()))
        .unwrap_or(&headers[0]);

    let mut builder = Builder::default();
    let mut title_row = vec!["Field".to_string()];
    title_row.extend(rows.iter().map(|row| cell(row, label)));
    builder.push_record(title_row);

    for header in headers.iter().filter(|h| *h != label) {
        let mut record = vec![header.clone()];
        record.extend(rows.iter().map(|row| cell(row, header)));
        builder.push_record(record);
    }
    finish(builder)
}

fn cell(
    row: &Map<String, Value>,
    header: &str,
) -> String {
    row.get(header).map(format_value).unwrap_or_default()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match Decimal::from_str(s) {
            Ok(d) => format_decimal(d),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Amounts keep two decimals, rates and factors four.
pub fn format_decimal(value: Decimal) -> String {
    let places = if value.abs() >= Decimal::ONE { 2 } else { 4 };
    value
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    // ===== decimal tests =====

    #[test]
    fn amounts_are_rounded_to_cents() {
        assert_eq!(format_decimal(dec!(46418.330689)), "46418.33");
        assert_eq!(format_decimal(dec!(-12.345)), "-12.35");
        assert_eq!(format_decimal(dec!(1200.00)), "1200");
    }

    #[test]
    fn rates_keep_four_places() {
        assert_eq!(format_decimal(dec!(0.0472149)), "0.0472");
        assert_eq!(format_decimal(dec!(0.30)), "0.3");
    }

    // ===== table tests =====

    #[test]
    fn object_prints_field_value_rows() {
        let value = json!({"tax": "6665.2900", "kind": "sasu", "decote": null});

        let out = render(OutputFormat::Table, &value);

        assert!(out.contains("Field"), "got:\n{out}");
        assert!(out.contains("6665.29"), "got:\n{out}");
        assert!(!out.contains("6665.2900"), "got:\n{out}");
        assert!(out.contains("sasu"), "got:\n{out}");
    }

    #[test]
    fn nested_sections_get_dotted_titles() {
        let value = json!({
            "summary": {"net": "10"},
            "years": [{"year": 1, "cash_flow": "5"}],
        });

        let out = render(OutputFormat::Table, &value);

        assert!(out.contains("summary\n"), "got:\n{out}");
        assert!(out.contains("years\n"), "got:\n{out}");
        assert!(out.contains("cash_flow"), "got:\n{out}");
    }

    #[test]
    fn wide_short_arrays_are_transposed() {
        let item = |kind: &str| {
            json!({
                "b": "1", "c": "2", "d": "3", "kind": kind,
                "e": "4", "f": "5", "g": "6", "h": "7",
            })
        };
        let value = json!([item("SASU"), item("EURL")]);

        let out = render(OutputFormat::Table, &value);
        let header = out.lines().nth(1).unwrap_or_default();

        assert!(header.contains("SASU") && header.contains("EURL"), "got:\n{out}");
    }

    #[test]
    fn empty_array_is_marked() {
        assert_eq!(render(OutputFormat::Table, &json!([])), "(empty)");
    }

    #[test]
    fn scalar_array_prints_one_per_line() {
        assert_eq!(render(OutputFormat::Table, &json!(["a", "b"])), "a\nb");
    }

    // ===== JSON tests =====

    #[test]
    fn json_keeps_full_precision() {
        let value = json!({"rate": "0.0472149"});

        let out = render(OutputFormat::Json, &value);

        assert_eq!(out, "{\n  \"rate\": \"0.0472149\"\n}");
    }
}
