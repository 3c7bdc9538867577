//! Report normalization.
//!
//! Converts the heterogeneous report shapes delivered by update sources into
//! one canonical [`EntityUpdate`]. Two shapes are understood:
//!
//! * flat objects: `{id, position: {lat, lng, altitude}, speed, battery, ...}`
//! * GeoJSON features: `{geometry: {coordinates: [lng, lat, alt]}, properties: {serial, ...}}`
//!
//! Each field is resolved from the top-level object first, then from the
//! nested geometry/properties equivalent, then from a default constant.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{EntityUpdate, Position};
use crate::rules::{
    DEFAULT_BATTERY_PCT, DEFAULT_DISPLAY_NAME, DEFAULT_HEADING_DEG, DEFAULT_SIGNAL_PCT,
    DEFAULT_SPEED_MPS, DEFAULT_STATUS_LABEL,
};

/// Reasons a single report is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("report is not an object")]
    NotAnObject,
    #[error("report has no resolvable id")]
    MissingId,
}

/// Split a batch into its individual reports.
///
/// Accepts an array of reports or a feature collection (`{features: [...]}`).
/// A lone object is treated as a batch of one; anything else is empty.
pub fn reports_in(batch: &Value) -> Vec<&Value> {
    match batch {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("features") {
            Some(Value::Array(features)) => features.iter().collect(),
            Some(_) => Vec::new(),
            None => vec![batch],
        },
        _ => Vec::new(),
    }
}

/// Normalize one raw report, using `now` when it carries no timestamp.
pub fn normalize(report: &Value, now: DateTime<Utc>) -> Result<EntityUpdate, NormalizeError> {
    let top = report.as_object().ok_or(NormalizeError::NotAnObject)?;
    let props = top.get("properties").and_then(Value::as_object);
    let nested_position = top.get("position").and_then(Value::as_object);
    let coordinates = top
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);
    let coordinate = |idx: usize| coordinates.and_then(|c| c.get(idx));

    let id = resolve_id(top, props).ok_or(NormalizeError::MissingId)?;

    let latitude = number(first_of(&[
        field(nested_position, &["lat", "latitude"]),
        field(Some(top), &["lat", "latitude"]),
        coordinate(1),
        field(props, &["lat", "latitude"]),
    ]))
    .unwrap_or(0.0);
    let longitude = number(first_of(&[
        field(nested_position, &["lng", "lon", "longitude"]),
        field(Some(top), &["lng", "lon", "longitude"]),
        coordinate(0),
        field(props, &["lng", "lon", "longitude"]),
    ]))
    .unwrap_or(0.0);
    let altitude = number(first_of(&[
        field(nested_position, &["altitude", "alt"]),
        field(Some(top), &["altitude", "alt"]),
        field(props, &["altitude", "alt"]),
        coordinate(2),
    ]))
    .unwrap_or(0.0);

    let heading = top_then_props(top, props, &["heading", "yaw"])
        .and_then(number_value)
        .unwrap_or(DEFAULT_HEADING_DEG);
    let speed = top_then_props(top, props, &["speed"])
        .and_then(number_value)
        .unwrap_or(DEFAULT_SPEED_MPS);
    let battery_pct = top_then_props(top, props, &["battery", "batteryPct", "battery_pct"])
        .and_then(number_value)
        .unwrap_or(DEFAULT_BATTERY_PCT);
    let signal_pct = top_then_props(top, props, &["signal", "signalPct", "signal_pct"])
        .and_then(number_value)
        .unwrap_or(DEFAULT_SIGNAL_PCT);

    let display_name = top_then_props(top, props, &["name", "displayName", "display_name"])
        .and_then(text)
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());
    let status_label = top_then_props(top, props, &["status", "statusLabel", "status_label"])
        .and_then(text)
        .unwrap_or_else(|| DEFAULT_STATUS_LABEL.to_string());

    let registration = top_then_props(top, props, &["registration"]).cloned();

    let observed_at = top_then_props(top, props, &["lastUpdate", "last_update", "timestamp"])
        .and_then(timestamp)
        .unwrap_or(now);

    Ok(EntityUpdate {
        id,
        display_name,
        status_label,
        registration,
        position: Position::new(latitude, longitude, altitude),
        heading,
        speed,
        battery_pct,
        signal_pct,
        observed_at,
    })
}

fn resolve_id(top: &Map<String, Value>, props: Option<&Map<String, Value>>) -> Option<String> {
    [
        top.get("id"),
        field(props, &["serial", "id"]),
        top.get("serial"),
    ]
    .into_iter()
    .flatten()
    .find_map(id_text)
}

/// Ids must be non-empty strings or integers.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// First present, non-null value under any of `keys`.
fn field<'a>(obj: Option<&'a Map<String, Value>>, keys: &[&str]) -> Option<&'a Value> {
    let obj = obj?;
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

fn top_then_props<'a>(
    top: &'a Map<String, Value>,
    props: Option<&'a Map<String, Value>>,
    keys: &[&str],
) -> Option<&'a Value> {
    field(Some(top), keys).or_else(|| field(props, keys))
}

fn first_of<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| number_value(v).is_some())
}

fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(number_value)
}

/// Finite number from a JSON number or numeric string.
fn number_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// RFC 3339 string or epoch milliseconds.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.trim().parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
