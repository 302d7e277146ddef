//! Date constructor and Date.prototype methods
//!
//! The sandbox has no host timezone: local time is UTC, so every local
//! accessor is the same function as its UTC twin.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::JsError;
use crate::interpreter::{Interpreter, PreferredType};
use crate::prelude::math;
use crate::value::{JsValue, ObjectData};

use super::{arg, create_constructor};

const MS_PER_DAY: f64 = 86_400_000.0;
/// Largest representable distance from the epoch, in milliseconds
const MAX_TIME: f64 = 8.64e15;

// Field positions used by the setters
const YEAR: usize = 0;
const MONTH: usize = 1;
const DATE: usize = 2;
const HOURS: usize = 3;
const MINUTES: usize = 4;
const SECONDS: usize = 5;
const MILLISECONDS: usize = 6;

/// Initialize the Date constructor and Date.prototype
pub fn init_date(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) = create_constructor(interp, "Date", 7, date_constructor, object)?;
    interp.intrinsics.date = constructor;

    interp.register_method(constructor, "now", date_now, 0)?;
    interp.register_method(constructor, "parse", date_parse, 1)?;
    interp.register_method(constructor, "UTC", date_utc, 7)?;

    const GETTERS: [(&str, &str, usize); 7] = [
        ("getFullYear", "getUTCFullYear", YEAR),
        ("getMonth", "getUTCMonth", MONTH),
        ("getDate", "getUTCDate", DATE),
        ("getHours", "getUTCHours", HOURS),
        ("getMinutes", "getUTCMinutes", MINUTES),
        ("getSeconds", "getUTCSeconds", SECONDS),
        ("getMilliseconds", "getUTCMilliseconds", MILLISECONDS),
    ];
    for (local, utc, field) in GETTERS {
        for name in [local, utc] {
            interp.register_method(
                proto,
                name,
                move |interp, this, _args| date_get_field(interp, &this, name, field),
                0,
            )?;
        }
    }

    // (local, utc, first field, how many fields the setter accepts)
    const SETTERS: [(&str, &str, usize, usize); 7] = [
        ("setFullYear", "setUTCFullYear", YEAR, 3),
        ("setMonth", "setUTCMonth", MONTH, 2),
        ("setDate", "setUTCDate", DATE, 1),
        ("setHours", "setUTCHours", HOURS, 4),
        ("setMinutes", "setUTCMinutes", MINUTES, 3),
        ("setSeconds", "setUTCSeconds", SECONDS, 2),
        ("setMilliseconds", "setUTCMilliseconds", MILLISECONDS, 1),
    ];
    for (local, utc, first, count) in SETTERS {
        for name in [local, utc] {
            interp.register_method(
                proto,
                name,
                move |interp, this, args| date_set_fields(interp, &this, args, name, first, count),
                count as u32,
            )?;
        }
    }

    interp.register_method(proto, "getDay", date_get_day, 0)?;
    interp.register_method(proto, "getUTCDay", date_get_day, 0)?;
    interp.register_method(proto, "getYear", date_get_year, 0)?;
    interp.register_method(proto, "setYear", date_set_year, 1)?;
    interp.register_method(proto, "getTime", date_get_time, 0)?;
    interp.register_method(proto, "setTime", date_set_time, 1)?;
    interp.register_method(proto, "getTimezoneOffset", date_get_timezone_offset, 0)?;
    interp.register_method(proto, "valueOf", date_get_time, 0)?;

    interp.register_method(proto, "toString", date_to_string, 0)?;
    interp.register_method(proto, "toDateString", date_to_date_string, 0)?;
    interp.register_method(proto, "toTimeString", date_to_time_string, 0)?;
    interp.register_method(proto, "toISOString", date_to_iso_string, 0)?;
    interp.register_method(proto, "toJSON", date_to_json, 1)?;
    interp.register_method(proto, "toUTCString", date_to_utc_string, 0)?;
    interp.register_method(proto, "toGMTString", date_to_utc_string, 0)?;
    interp.register_method(proto, "toLocaleString", date_to_locale_string, 0)?;
    interp.register_method(proto, "toLocaleDateString", date_to_locale_date_string, 0)?;
    interp.register_method(proto, "toLocaleTimeString", date_to_locale_time_string, 0)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Time arithmetic
// ═══════════════════════════════════════════════════════════════════════════════

/// Truncate to an integral time value, NaN when out of range
fn time_clip(t: f64) -> f64 {
    if !t.is_finite() || t.abs() > MAX_TIME {
        return f64::NAN;
    }
    math::trunc(t) + 0.0
}

fn to_datetime(t: f64) -> Option<DateTime<Utc>> {
    if !t.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(t as i64).single()
}

/// Build a time value from fields that may overflow their ranges
/// (month 12 is January next year, day 0 is the last day of the previous
/// month, hour -1 is 23:00 the day before).
fn make_time(fields: &[f64; 7]) -> f64 {
    if fields.iter().any(|f| !f.is_finite()) {
        return f64::NAN;
    }
    let [year, month, date, hours, minutes, seconds, ms] = fields.map(math::trunc);
    let year = year + math::floor(month / 12.0);
    let month = math::rem_euclid(month, 12.0);
    let Some(first_of_month) = NaiveDate::from_ymd_opt(year as i32, month as u32 + 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return f64::NAN;
    };
    let day_start = first_of_month.and_utc().timestamp_millis() as f64;
    day_start
        + (date - 1.0) * MS_PER_DAY
        + hours * 3_600_000.0
        + minutes * 60_000.0
        + seconds * 1000.0
        + ms
}

/// The seven broken-down fields of a valid time value
fn fields_of(t: f64) -> Option<[f64; 7]> {
    let dt = to_datetime(t)?;
    Some([
        f64::from(dt.year()),
        f64::from(dt.month0()),
        f64::from(dt.day()),
        f64::from(dt.hour()),
        f64::from(dt.minute()),
        f64::from(dt.second()),
        f64::from(dt.timestamp_subsec_millis()),
    ])
}

/// Two-digit years in constructor arguments mean the 1900s
fn full_year(year: f64) -> f64 {
    let integral = math::trunc(year);
    if (0.0..=99.0).contains(&integral) {
        1900.0 + integral
    } else {
        year
    }
}

/// `(year, month, date?, hours?, minutes?, seconds?, ms?)` as a time value
fn time_from_args(interp: &Interpreter, args: &[JsValue]) -> Result<f64, JsError> {
    let mut fields = [f64::NAN, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    for (field, value) in fields.iter_mut().zip(args) {
        *field = interp.to_number(value)?;
    }
    fields[YEAR] = full_year(fields[YEAR]);
    Ok(time_clip(make_time(&fields)))
}

fn now() -> f64 {
    Utc::now().timestamp_millis() as f64
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parsing and formatting
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse the formats Date itself produces plus ISO 8601 and RFC 2822.
pub(crate) fn parse_date(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.timestamp_millis() as f64;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return dt.timestamp_millis() as f64;
    }
    // `toString` output, with or without the zone name in parentheses
    let without_zone_name = match text.rfind(" (") {
        Some(at) if text.ends_with(')') => text.get(..at).unwrap_or(text),
        _ => text,
    };
    if let Ok(dt) = DateTime::parse_from_str(without_zone_name, "%a %b %d %Y %H:%M:%S GMT%z") {
        return dt.timestamp_millis() as f64;
    }
    let iso = text.strip_suffix('Z').unwrap_or(text);
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%a, %d %b %Y %H:%M:%S GMT",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(iso, format) {
            return dt.and_utc().timestamp_millis() as f64;
        }
    }
    for format in ["%Y-%m-%d", "%a %b %d %Y", "%b %d %Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(iso, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|d| d.and_utc().timestamp_millis() as f64)
                .unwrap_or(f64::NAN);
        }
    }
    // Year-month and bare year forms of ISO 8601
    let padded = match iso.len() {
        4 => format!("{}-01-01", iso),
        7 => format!("{}-01", iso),
        _ => return f64::NAN,
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc().timestamp_millis() as f64)
        .unwrap_or(f64::NAN)
}

fn format_with(t: f64, format: &str) -> String {
    match to_datetime(t) {
        Some(dt) => dt.format(format).to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// What `String(date)` prints, e.g. `Sun Oct 18 2026 00:00:00 GMT+0000 (UTC)`
pub(crate) fn format_date(t: f64) -> String {
    format_with(t, "%a %b %d %Y %H:%M:%S GMT+0000 (UTC)")
}

/// ISO 8601 with milliseconds; years outside 0..=9999 use the six-digit form
pub(crate) fn format_iso(t: f64) -> Option<String> {
    let [year, month, date, hours, minutes, seconds, ms] = fields_of(t)?.map(|f| f as i64);
    let year = if (0..=9999).contains(&year) {
        format!("{:04}", year)
    } else {
        format!("{:+07}", year)
    };
    Some(format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month + 1,
        date,
        hours,
        minutes,
        seconds,
        ms
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constructor and statics
// ═══════════════════════════════════════════════════════════════════════════════

/// `Date(...)` returns the current date as a string; `new Date(...)` builds
/// a Date object.
pub fn date_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(id) = this else {
        return Ok(JsValue::from(format_date(now())));
    };
    if !interp.is_constructing() {
        return Ok(JsValue::from(format_date(now())));
    }
    let t = match args {
        [] => now(),
        [value] => {
            let copied = match value {
                JsValue::Object(other) => match interp.object(*other)?.data {
                    ObjectData::Date(t) => Some(t),
                    _ => None,
                },
                _ => None,
            };
            match copied {
                Some(t) => t,
                None => match interp.to_primitive(value, PreferredType::Default)? {
                    JsValue::String(s) => parse_date(s.as_str()),
                    other => time_clip(interp.to_number(&other)?),
                },
            }
        }
        _ => time_from_args(interp, args)?,
    };
    interp.object_mut(id)?.data = ObjectData::Date(t);
    Ok(this)
}

/// Date.now()
pub fn date_now(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(now()))
}

/// Date.parse(string)
pub fn date_parse(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = interp.to_string(&arg(args, 0))?;
    Ok(JsValue::Number(parse_date(text.as_str())))
}

/// Date.UTC(year, month, ...)
pub fn date_utc(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(time_from_args(interp, args)?))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Accessors
// ═══════════════════════════════════════════════════════════════════════════════

fn this_time(interp: &Interpreter, this: &JsValue, method: &str) -> Result<f64, JsError> {
    if let JsValue::Object(id) = this {
        if let ObjectData::Date(t) = interp.object(*id)?.data {
            return Ok(t);
        }
    }
    Err(JsError::type_error(format!(
        "Date.prototype.{} called on a non-Date object",
        method
    )))
}

fn store_time(interp: &mut Interpreter, this: &JsValue, t: f64) -> Result<JsValue, JsError> {
    if let JsValue::Object(id) = this {
        interp.object_mut(*id)?.data = ObjectData::Date(t);
    }
    Ok(JsValue::Number(t))
}

fn date_get_field(
    interp: &Interpreter,
    this: &JsValue,
    method: &str,
    field: usize,
) -> Result<JsValue, JsError> {
    let t = this_time(interp, this, method)?;
    let value = fields_of(t)
        .and_then(|fields| fields.get(field).copied())
        .unwrap_or(f64::NAN);
    Ok(JsValue::Number(value))
}

/// Shared body of every setter: replace up to `count` fields starting at
/// `first` and recompute the time value.
fn date_set_fields(
    interp: &mut Interpreter,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    first: usize,
    count: usize,
) -> Result<JsValue, JsError> {
    let t = this_time(interp, this, method)?;
    let mut values = Vec::with_capacity(count);
    for value in args.iter().take(count) {
        values.push(interp.to_number(value)?);
    }
    // An invalid date only becomes valid again through its year
    let base = if t.is_nan() && first == YEAR { 0.0 } else { t };
    let Some(mut fields) = fields_of(base) else {
        return store_time(interp, this, f64::NAN);
    };
    if values.is_empty() {
        return store_time(interp, this, f64::NAN);
    }
    for (slot, value) in fields.iter_mut().skip(first).zip(values) {
        *slot = value;
    }
    store_time(interp, this, time_clip(make_time(&fields)))
}

pub fn date_get_day(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "getDay")?;
    Ok(JsValue::Number(
        to_datetime(t)
            .map(|dt| f64::from(dt.weekday().num_days_from_sunday()))
            .unwrap_or(f64::NAN),
    ))
}

/// Date.prototype.getYear(): full year minus 1900
pub fn date_get_year(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "getYear")?;
    let year = fields_of(t).map(|f| f[YEAR] - 1900.0).unwrap_or(f64::NAN);
    Ok(JsValue::Number(year))
}

/// Date.prototype.setYear(year): two-digit years mean the 1900s
pub fn date_set_year(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let year = full_year(interp.to_number(&arg(args, 0))?);
    date_set_fields(interp, &this, &[JsValue::Number(year)], "setYear", YEAR, 1)
}

pub fn date_get_time(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_time(interp, &this, "getTime")?))
}

pub fn date_set_time(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    this_time(interp, &this, "setTime")?;
    let t = time_clip(interp.to_number(&arg(args, 0))?);
    store_time(interp, &this, t)
}

/// Always 0: local time is UTC
pub fn date_get_timezone_offset(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "getTimezoneOffset")?;
    Ok(JsValue::Number(if t.is_nan() { f64::NAN } else { 0.0 }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// String forms
// ═══════════════════════════════════════════════════════════════════════════════

pub fn date_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toString")?;
    Ok(JsValue::from(format_date(t)))
}

pub fn date_to_date_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toDateString")?;
    Ok(JsValue::from(format_with(t, "%a %b %d %Y")))
}

pub fn date_to_time_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toTimeString")?;
    Ok(JsValue::from(format_with(t, "%H:%M:%S GMT+0000 (UTC)")))
}

/// Date.prototype.toISOString(): RangeError for an invalid date
pub fn date_to_iso_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toISOString")?;
    format_iso(t)
        .map(JsValue::from)
        .ok_or_else(|| JsError::range_error("Invalid time value"))
}

/// Date.prototype.toJSON(): null for an invalid date
pub fn date_to_json(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toJSON")?;
    Ok(format_iso(t).map(JsValue::from).unwrap_or(JsValue::Null))
}

pub fn date_to_utc_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toUTCString")?;
    Ok(JsValue::from(format_with(t, "%a, %d %b %Y %H:%M:%S GMT")))
}

pub fn date_to_locale_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toLocaleString")?;
    Ok(JsValue::from(format_with(t, "%-m/%-d/%Y, %-I:%M:%S %p")))
}

pub fn date_to_locale_date_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toLocaleDateString")?;
    Ok(JsValue::from(format_with(t, "%-m/%-d/%Y")))
}

pub fn date_to_locale_time_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let t = this_time(interp, &this, "toLocaleTimeString")?;
    Ok(JsValue::from(format_with(t, "%-I:%M:%S %p")))
}
