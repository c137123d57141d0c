use super::{TranscodeError, expected_for};
use crate::registry::{FieldKind, FieldMapping, FieldValue, RefEncoding, ScalarType};
use chrono::NaiveDate;
use serde_json::Value;

/// One member of a relationship field as the CMS reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// Short description of a JSON value for error messages.
#[must_use]
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Values the CMS uses to say "nothing here".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Meta registered without `single` comes back wrapped in a one-item array.
fn unwrap_single(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

/// Decodes one field the document supplied. A blank value decodes to
/// [`FieldValue::Cleared`] so that merging it empties the local field.
pub(super) fn decode_field<T>(
    field: &FieldMapping<T>,
    raw: &Value,
) -> Result<FieldValue, TranscodeError> {
    if is_blank(raw) {
        return Ok(FieldValue::Cleared);
    }

    let shape_error = || TranscodeError::UnexpectedShape {
        field: field.local_name.to_string(),
        expected: expected_for(field.kind),
        found: describe(raw),
    };
    let invalid = |value: &str| TranscodeError::InvalidValue {
        field: field.local_name.to_string(),
        value: value.to_string(),
    };

    let value = match field.kind {
        FieldKind::Scalar(ScalarType::Text) => {
            text(unwrap_single(raw)).ok_or_else(shape_error)?.map(FieldValue::Text)
        }
        FieldKind::Scalar(ScalarType::Integer) => match unwrap_single(raw) {
            Value::Number(n) => Some(FieldValue::Integer(
                n.as_i64()
                    .or_else(|| n.as_f64().and_then(whole_number))
                    .ok_or_else(|| invalid(&n.to_string()))?,
            )),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(FieldValue::Integer(
                s.trim().parse().map_err(|_| invalid(s))?,
            )),
            _ => return Err(shape_error()),
        },
        FieldKind::Scalar(ScalarType::Number) => match unwrap_single(raw) {
            Value::Number(n) => Some(FieldValue::Number(
                n.as_f64().ok_or_else(|| invalid(&n.to_string()))?,
            )),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(FieldValue::Number(
                s.trim().parse().map_err(|_| invalid(s))?,
            )),
            _ => return Err(shape_error()),
        },
        FieldKind::Date => match unwrap_single(raw) {
            Value::String(s) => parse_date(s)
                .map_err(|()| invalid(s))?
                .map(FieldValue::Date),
            _ => return Err(shape_error()),
        },
        FieldKind::RepeatableText => {
            let items: Vec<String> = match raw {
                Value::Array(items) => items
                    .iter()
                    .map(|item| text(item).ok_or_else(shape_error))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .flatten()
                    .collect(),
                single => text(single).ok_or_else(shape_error)?.into_iter().collect(),
            };
            Some(FieldValue::TextList(items))
        }
        FieldKind::Relationship(rel) => {
            let refs = decode_refs(raw).map_err(|found| TranscodeError::UnexpectedShape {
                field: field.local_name.to_string(),
                expected: expected_for(field.kind),
                found,
            })?;
            let value = match rel.encoding {
                RefEncoding::Names => {
                    FieldValue::TextList(refs.into_iter().filter_map(|r| r.name).collect())
                }
                RefEncoding::RemoteIds => FieldValue::IdList(
                    refs.into_iter()
                        .map(|r| r.id.ok_or_else(|| invalid(r.name.as_deref().unwrap_or(""))))
                        .collect::<Result<_, _>>()?,
                ),
            };
            Some(value)
        }
    };

    Ok(value.unwrap_or(FieldValue::Cleared))
}

/// `96.0` is accepted as an integer; fractions and values beyond `i64` are not.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; the cast rounds it up to 2^63.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then(|| f as i64)
}

/// Text from a string, a number, or a `{ "raw": ..., "rendered": ... }` object.
/// `raw` is only present in `context=edit` responses and is preferred since
/// `rendered` carries HTML entities.
///
/// Outer `None` means the shape is wrong; inner `None` means blank.
fn text(value: &Value) -> Option<Option<String>> {
    match value {
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        Value::Null | Value::Bool(false) => Some(None),
        Value::Object(map) => map.get("raw").or_else(|| map.get("rendered")).and_then(text),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD`, `YYYYMMDD` and `YYYY-MM-DD HH:MM:SS`.
/// `0000-00-00` is the empty date Pods stores for unset fields.
fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ()> {
    let s = raw.trim();
    if s.is_empty() || s.starts_with("0000-00-00") {
        return Ok(None);
    }

    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y%m%d"))
        .map(Some)
        .map_err(|_| ())
}

/// Decodes a relationship field into its members.
///
/// Accepts post ids, names, `{ID, post_title}`-style objects, or a single
/// such value. The error carries a description of the offending shape.
pub fn decode_refs(raw: &Value) -> Result<Vec<RemoteRef>, String> {
    if is_blank(raw) {
        return Ok(Vec::new());
    }

    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    items
        .into_iter()
        .filter(|item| !is_blank(item))
        .map(|item| one_ref(item).ok_or_else(|| describe(item)))
        .collect()
}

fn one_ref(item: &Value) -> Option<RemoteRef> {
    match item {
        Value::Number(n) => n.as_i64().map(|id| RemoteRef {
            id: Some(id),
            name: None,
        }),
        Value::String(s) => Some(RemoteRef {
            id: s.trim().parse().ok(),
            name: Some(s.clone()),
        }),
        Value::Object(map) => {
            let id = ["ID", "id", "term_id"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| match v {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                });
            let name = ["post_title", "title", "name"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|v| text(v).flatten());
            (id.is_some() || name.is_some()).then_some(RemoteRef { id, name })
        }
        _ => None,
    }
}
