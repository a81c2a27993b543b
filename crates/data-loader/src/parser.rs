//! Parser for episode catalog documents.
//!
//! Catalogs arrive in several JSON layouts. All of them are reduced to a flat
//! list of raw records (plus an optional season hint taken from the
//! surrounding structure) and then normalized one record at a time:
//!
//! - `[ {season, episode|number, title, ...}, ... ]`
//! - `{ "episodes": [...] }`
//! - `{ "seasons": { "1": [...], "2": [...] } }`
//! - `{ "seasons": [ { "number": 1, "episodes": [...] } ] }`
//! - `{ "1": [...], "2": [...] }`
//! - `{ "shows": { "<id>": { "title", "core_arcs", "seasons": ... } } }`
//!
//! A record that cannot be normalized is skipped and reported, never fatal.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// Output of parsing one catalog document
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    pub show_id: Option<String>,
    pub title: Option<String>,
    pub core_arcs: BTreeSet<ArcTag>,
    pub episodes: Vec<Episode>,
    pub skipped: Vec<SkippedRecord>,
}

/// A record as found in the document, before normalization
struct RawRecord<'a> {
    value: &'a Value,
    season_hint: Option<SeasonNumber>,
}

/// Parse a catalog from JSON text
pub fn parse_catalog_str(json: &str, show: Option<&str>) -> Result<ParsedCatalog> {
    let doc: Value = serde_json::from_str(json)?;
    parse_catalog(&doc, show)
}

/// Parse an already-decoded JSON document.
///
/// `show` selects one show from a multi-show document; it is ignored for
/// single-show layouts.
pub fn parse_catalog(doc: &Value, show: Option<&str>) -> Result<ParsedCatalog> {
    let mut parsed = ParsedCatalog::default();

    let records = match doc {
        Value::Array(items) => collect_list(items, None),
        Value::Object(map) => {
            if let Some(Value::Object(shows)) = map.get("shows") {
                let (show_id, show_doc) = select_show(shows, show)?;
                parsed.show_id = Some(show_id.to_string());
                read_show_metadata(show_doc, &mut parsed);
                collect_show(show_doc)?
            } else {
                parsed.show_id = map
                    .get("show_id")
                    .or_else(|| map.get("showId"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                read_show_metadata(map, &mut parsed);
                collect_show(map)?
            }
        }
        other => {
            return Err(DataLoadError::UnsupportedLayout(format!(
                "expected a list or an object at the top level, found {}",
                value_kind(other)
            )));
        }
    };

    for (position, raw) in records.into_iter().enumerate() {
        match normalize_record(raw.value, raw.season_hint) {
            Ok(episode) => parsed.episodes.push(episode),
            Err(reason) => {
                warn!("Skipping episode record {}: {}", position, reason);
                parsed.skipped.push(SkippedRecord { position, reason });
            }
        }
    }

    Ok(parsed)
}

/// Pick a show from the `shows` map
fn select_show<'a>(
    shows: &'a Map<String, Value>,
    wanted: Option<&str>,
) -> Result<(&'a str, &'a Map<String, Value>)> {
    let (id, value) = match wanted {
        Some(id) => shows
            .iter()
            .find(|(key, _)| key.as_str() == id)
            .ok_or_else(|| DataLoadError::ShowNotFound(id.to_string()))?,
        None if shows.len() == 1 => shows.iter().next().ok_or_else(|| {
            DataLoadError::UnsupportedLayout("empty shows map".to_string())
        })?,
        None => {
            let ids: Vec<&str> = shows.keys().map(String::as_str).collect();
            return Err(DataLoadError::UnsupportedLayout(format!(
                "document contains several shows ({}); select one",
                ids.join(", ")
            )));
        }
    };

    match value {
        Value::Object(show_doc) => Ok((id.as_str(), show_doc)),
        other => Err(DataLoadError::UnsupportedLayout(format!(
            "show {} is a {}, expected an object",
            id,
            value_kind(other)
        ))),
    }
}

fn read_show_metadata(map: &Map<String, Value>, parsed: &mut ParsedCatalog) {
    if let Some(title) = map.get("title").and_then(Value::as_str) {
        parsed.title = Some(title.to_string());
    }
    if let Some(arcs) = map.get("core_arcs").or_else(|| map.get("coreArcs")) {
        parsed.core_arcs = coerce_arcs(arcs);
    }
}

/// Flatten a single-show object into raw records
fn collect_show(map: &Map<String, Value>) -> Result<Vec<RawRecord<'_>>> {
    if let Some(Value::Array(items)) = map.get("episodes") {
        return Ok(collect_list(items, None));
    }

    match map.get("seasons") {
        Some(Value::Object(seasons)) => return Ok(collect_season_map(seasons)),
        Some(Value::Array(seasons)) => return Ok(collect_season_list(seasons)),
        _ => {}
    }

    // Last resort: a bare {season: [...]} map
    let records = collect_season_map(map);
    if records.is_empty() && !has_numeric_list_key(map) {
        return Err(DataLoadError::UnsupportedLayout(
            "no `episodes`, `seasons` or season-keyed lists found".to_string(),
        ));
    }
    Ok(records)
}

fn collect_list(items: &[Value], season_hint: Option<SeasonNumber>) -> Vec<RawRecord<'_>> {
    items
        .iter()
        .map(|value| RawRecord { value, season_hint })
        .collect()
}

/// `{ "1": [...], "2": [...] }`; keys that are not season numbers are ignored
fn collect_season_map(seasons: &Map<String, Value>) -> Vec<RawRecord<'_>> {
    let mut records = Vec::new();
    for (key, value) in seasons {
        let Some(season) = key.trim().parse::<SeasonNumber>().ok().filter(|s| *s > 0) else {
            continue;
        };
        if let Value::Array(items) = value {
            records.extend(collect_list(items, Some(season)));
        }
    }
    records
}

/// `[ { "number": 1, "episodes": [...] }, ... ]`
fn collect_season_list(seasons: &[Value]) -> Vec<RawRecord<'_>> {
    let mut records = Vec::new();
    for season in seasons {
        let Value::Object(season_doc) = season else {
            continue;
        };
        let hint = season_doc
            .get("number")
            .or_else(|| season_doc.get("season"))
            .and_then(coerce_positive);
        if let Some(Value::Array(items)) = season_doc.get("episodes") {
            records.extend(collect_list(items, hint));
        }
    }
    records
}

fn has_numeric_list_key(map: &Map<String, Value>) -> bool {
    map.iter()
        .any(|(key, value)| key.trim().parse::<u64>().is_ok() && value.is_array())
}

/// Normalize one raw record into an `Episode`.
///
/// Returns the reason as an `Err` when the record has no usable season or
/// episode number.
fn normalize_record(
    value: &Value,
    season_hint: Option<SeasonNumber>,
) -> std::result::Result<Episode, String> {
    let Value::Object(record) = value else {
        return Err(format!("record is a {}, expected an object", value_kind(value)));
    };

    let season = match record.get("season") {
        Some(raw) if !raw.is_null() => coerce_positive(raw)
            .ok_or_else(|| format!("invalid season {}", raw))?,
        _ => season_hint.ok_or_else(|| "missing season".to_string())?,
    };

    let number = match record.get("episode").or_else(|| record.get("number")) {
        Some(raw) if !raw.is_null() => coerce_positive(raw)
            .ok_or_else(|| format!("invalid episode number {}", raw))?,
        _ => return Err("missing episode number".to_string()),
    };

    let id = record
        .get("id")
        .and_then(coerce_text)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| default_episode_id(season, number));

    let title = record.get("title").and_then(coerce_text).unwrap_or_default();
    let summary = ["summary", "synopsis", "summary_short"]
        .iter()
        .filter_map(|key| record.get(*key).and_then(coerce_text))
        .find(|text| !text.is_empty())
        .unwrap_or_default();

    let arcs = record.get("arcs").map(coerce_arcs).unwrap_or_default();

    let embedding = match record.get("embedding").or_else(|| record.get("vector")) {
        Some(Value::Null) | None => None,
        Some(raw) => {
            let vector = coerce_vector(raw);
            if vector.is_none() {
                warn!("Dropping unusable embedding on episode {}", id);
            }
            vector
        }
    };

    Ok(Episode {
        id,
        season,
        number,
        title,
        summary,
        arcs,
        embedding,
    })
}

/// Accepts positive integers, integral floats and numeric strings
fn coerce_positive(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n > 0)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A list of tags, or a single tag string
fn coerce_arcs(value: &Value) -> BTreeSet<ArcTag> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(coerce_text)
            .filter(|arc| !arc.is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => BTreeSet::from([s.trim().to_string()]),
        _ => BTreeSet::new(),
    }
}

fn coerce_vector(value: &Value) -> Option<Vec<f32>> {
    let Value::Array(items) = value else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_f64().map(|f| f as f32).filter(|f| f.is_finite()))
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
