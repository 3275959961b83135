use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Value, json};

use fiscal_core::RepositoryError;

use crate::app::{Session, parse_setting_value};

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Setting key, e.g. `company.revenue`
    pub key: String,

    /// Number, `true`/`false`, or text
    pub value: String,
}

#[derive(Debug, Args)]
pub struct UnsetArgs {
    pub key: String,
}

pub fn set(
    args: &SetArgs,
    session: &mut Session<'_>,
) -> Result<Value> {
    let value = parse_setting_value(&args.value);
    let shown = json!({
        "key": args.key,
        "kind": value.kind(),
        "value": value.to_string(),
    });
    session.set(&args.key, value);
    Ok(shown)
}

pub async fn unset(
    args: &UnsetArgs,
    session: &mut Session<'_>,
) -> Result<Value> {
    let profile = session.profile().to_string();
    match session.repo().delete_setting(&profile, &args.key).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            bail!("'{}' is not set in profile '{}'", args.key, profile)
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to remove '{}'", args.key));
        }
    }
    session.remove(&args.key);

    Ok(json!({ "removed": args.key, "profile": profile }))
}

pub fn show(session: &Session<'_>) -> Result<Value> {
    let rows: Vec<Value> = session
        .settings()
        .iter()
        .map(|(key, value)| {
            json!({
                "key": key,
                "kind": value.kind(),
                "value": value.to_string(),
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

pub async fn profiles(session: &Session<'_>) -> Result<Value> {
    let profiles = session
        .repo()
        .list_profiles()
        .await
        .context("Failed to list profiles")?;
    Ok(json!(profiles))
}

pub async fn schedules(session: &Session<'_>) -> Result<Value> {
    let repo = session.repo();
    let names = repo
        .list_bracket_schedules()
        .await
        .context("Failed to list bracket schedules")?;

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let brackets = repo
            .get_tax_brackets(&name)
            .await
            .with_context(|| format!("Failed to read bracket schedule '{name}'"))?;
        let top_rate = brackets.last().map(|bracket| bracket.rate);
        rows.push(json!({
            "name": name,
            "brackets": brackets.len(),
            "top_rate": top_rate,
        }));
    }
    Ok(Value::Array(rows))
}
