//! Movie data for ingest and update: random objects, property mutation and
//! JSON file import.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rand::Rng;
use serde_json::{Map, Number, Value};

use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{DataType, Property};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Lowercase ASCII string of `len` characters.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect()
}

/// Release date between 1980-01-02 and roughly 2021, RFC 3339 at midnight UTC.
pub fn random_release_date<R: Rng + ?Sized>(rng: &mut R) -> String {
    let base = Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).single().unwrap_or_default();
    (base + Duration::days(rng.random_range(1..=15_000)))
        .format(DATE_FORMAT)
        .to_string()
}

/// Random movie matching [`crate::models::movie_properties`].
///
/// `tag` is inserted after each text prefix, e.g. `-update` yields
/// `title-updateabcdefghij`.
pub fn random_movie<R: Rng + ?Sized>(rng: &mut R, tag: &str) -> Map<String, Value> {
    let mut text = |prefix: &str, len: usize| {
        Value::String(format!("{prefix}{tag}{}", random_string(&mut *rng, len)))
    };

    let mut movie = Map::new();
    movie.insert("title".into(), text("title", 10));
    movie.insert("genres".into(), text("genre", 3));
    movie.insert("keywords".into(), text("keywords", 3));
    movie.insert("director".into(), text("director", 3));
    movie.insert("runtime".into(), text("runtime", 3));
    movie.insert("cast".into(), text("cast", 3));
    movie.insert("originalLanguage".into(), text("language", 3));
    movie.insert("tagline".into(), text("tagline", 3));
    movie.insert("status".into(), text("status", 3));
    movie.insert(
        "popularity".into(),
        float_value(f64::from(rng.random_range(1..=200u32))),
    );
    movie.insert(
        "budget".into(),
        Value::from(rng.random_range(1_000_000i64..=10_000_000_000)),
    );
    movie.insert(
        "revenue".into(),
        Value::from(rng.random_range(1_000_000i64..=100_000_000_000)),
    );
    movie.insert("releaseDate".into(), Value::String(random_release_date(rng)));
    movie
}

/// Uniform `[0, 1)` vector of `dimensions` components.
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, dimensions: usize) -> Vec<f32> {
    (0..dimensions).map(|_| rng.random::<f32>()).collect()
}

/// Deterministic in-place modification used by `update data` without
/// `--randomize`: text gains an `updated-` prefix, numbers grow by one and
/// dates move one day forward.
///
/// Types come from `schema` when the property is known, otherwise from the
/// JSON value itself.
pub fn mutate_properties(
    properties: &Map<String, Value>,
    schema: &[Property],
) -> Map<String, Value> {
    properties
        .iter()
        .map(|(name, value)| {
            let data_type = schema
                .iter()
                .find(|p| &p.name == name)
                .map(|p| &p.data_type);
            (name.clone(), mutate_value(value, data_type))
        })
        .collect()
}

fn mutate_value(value: &Value, data_type: Option<&DataType>) -> Value {
    match (data_type, value) {
        (Some(DataType::Date), Value::String(raw)) => match shift_date(raw) {
            Some(shifted) => Value::String(shifted),
            None => value.clone(),
        },
        (Some(DataType::Number), Value::Number(n)) => {
            float_value(n.as_f64().unwrap_or_default() + 1.0)
        }
        (Some(DataType::Int), Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i.saturating_add(1)),
            None => value.clone(),
        },
        (_, Value::String(s)) => Value::String(format!("updated-{s}")),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i.saturating_add(1)),
            None => float_value(n.as_f64().unwrap_or_default() + 1.0),
        },
        _ => value.clone(),
    }
}

fn shift_date(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(
        (parsed.with_timezone(&Utc) + Duration::days(1))
            .format(DATE_FORMAT)
            .to_string(),
    )
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Read a JSON array of movie records, keeping at most `limit` entries.
pub fn load_records(path: &Path, limit: usize) -> WeaviateResult<Vec<Map<String, Value>>> {
    let data_file_error = |message: String| WeaviateError::DataFile {
        path: path.display().to_string(),
        message,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| data_file_error(e.to_string()))?;
    let records: Vec<Map<String, Value>> =
        serde_json::from_str(&raw).map_err(|e| data_file_error(e.to_string()))?;
    Ok(records.into_iter().take(limit).collect())
}

/// Shape a raw record into the collection's schema.
///
/// Only properties present in `schema` are kept. Numbers are coerced to
/// floats and `YYYY-MM-DD` dates become RFC 3339. `release_date` in the
/// source maps onto `releaseDate`.
pub fn convert_record(
    record: &Map<String, Value>,
    schema: &[Property],
) -> WeaviateResult<Map<String, Value>> {
    let mut converted = Map::new();
    for property in schema {
        let value = record.get(&property.name).or_else(|| {
            (property.name == "releaseDate")
                .then(|| record.get("release_date"))
                .flatten()
        });
        let Some(value) = value else {
            continue;
        };
        let value = match property.data_type {
            DataType::Number => float_value(coerce_number(&property.name, value)?),
            DataType::Date => Value::String(coerce_date(&property.name, value)?),
            _ => value.clone(),
        };
        converted.insert(property.name.clone(), value);
    }
    Ok(converted)
}

fn coerce_number(name: &str, value: &Value) -> WeaviateResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WeaviateError::Validation(format!("property {name}: {value} is not a number")))
}

fn coerce_date(name: &str, value: &Value) -> WeaviateResult<String> {
    let invalid = || WeaviateError::Validation(format!("property {name}: {value} is not a date"));
    let raw = value.as_str().ok_or_else(invalid)?;
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Ok(raw.to_string());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    Ok(date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(invalid)?
        .and_utc()
        .format(DATE_FORMAT)
        .to_string())
}
