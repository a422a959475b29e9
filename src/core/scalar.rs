//! Purpose: Routines for scalar-like targets.
//! Exports: `load_none`, `load_basic`, `coerce`, `load_literal`, `load_any`, `load_temporal`,
//!   `load_str_constructed`, `load_new_type`.
//! Role: Leaf routines of the dispatch table plus the new-type unwrap.
//! Invariants: A value whose kind already matches is returned without conversion.
//! Invariants: Container-shaped input to a scalar target is a type mismatch; unparsable
//!   content is a value error.

use time::{Date, Month, PrimitiveDateTime, Time};

use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::types::{Scalar, Type};
use crate::core::value::Value;

pub fn load_none(_loader: &mut Loader, value: &Value, _ty: &Type) -> Result<Loaded, Error> {
    match value {
        Value::Null => Ok(Loaded::None),
        _ => Err(Error::new(ErrorKind::Value).with_message("not none")),
    }
}

pub fn load_basic(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Scalar(target) = ty else {
        return Err(mismatch(value, ty));
    };
    if value.scalar_kind() == Some(*target) {
        return Ok(Loaded::from_value(value));
    }
    if !loader.config().basic_cast {
        return Err(Error::new(ErrorKind::Value).with_message(format!(
            "got {value} of type {}, expected {ty}",
            value.type_label()
        )));
    }
    coerce(value, *target)
}

/// Best-effort conversion of `value` into `target`.
pub fn coerce(value: &Value, target: Scalar) -> Result<Loaded, Error> {
    let ty = Type::Scalar(target);
    match (target, value) {
        (_, Value::Seq(_)) if target != Scalar::Bytes => Err(mismatch(value, &ty)),
        (_, Value::Map(_) | Value::Object(_)) => Err(mismatch(value, &ty)),

        (Scalar::None, Value::Null) => Ok(Loaded::None),
        (Scalar::None, _) => Err(Error::new(ErrorKind::Value).with_message("not none")),

        (Scalar::Int, Value::Bool(b)) => Ok(Loaded::Int(i64::from(*b))),
        (Scalar::Int, Value::Float(f)) => float_to_int(*f),
        (Scalar::Int, Value::Str(text)) => parse_int(text),
        (Scalar::Int, Value::Bytes(bytes)) => parse_int(utf8(bytes)?),

        (Scalar::Float, Value::Bool(b)) => Ok(Loaded::Float(if *b { 1.0 } else { 0.0 })),
        (Scalar::Float, Value::Int(n)) => Ok(Loaded::Float(*n as f64)),
        (Scalar::Float, Value::Str(text)) => parse_float(text),
        (Scalar::Float, Value::Bytes(bytes)) => parse_float(utf8(bytes)?),

        (Scalar::Str, Value::Bool(b)) => Ok(Loaded::Str(b.to_string())),
        (Scalar::Str, Value::Int(n)) => Ok(Loaded::Str(n.to_string())),
        (Scalar::Str, Value::Float(f)) => Ok(Loaded::Str(float_text(*f))),
        (Scalar::Str, Value::Bytes(bytes)) => Ok(Loaded::Str(utf8(bytes)?.to_string())),

        (Scalar::Bool, Value::Int(n)) => Ok(Loaded::Bool(*n != 0)),
        (Scalar::Bool, Value::Float(f)) => Ok(Loaded::Bool(*f != 0.0)),
        (Scalar::Bool, Value::Str(text)) => parse_bool(text),

        (Scalar::Bytes, Value::Str(text)) => Ok(Loaded::Bytes(text.as_bytes().to_vec())),
        (Scalar::Bytes, Value::Seq(items)) => items
            .iter()
            .map(|item| match item {
                Value::Int(n) => u8::try_from(*n).map_err(|_| {
                    Error::new(ErrorKind::Value).with_message("bytes must be in range(0, 256)")
                }),
                other => Err(Error::new(ErrorKind::Value).with_message(format!(
                    "{} cannot be interpreted as a byte",
                    other.type_label()
                ))),
            })
            .collect::<Result<Vec<u8>, Error>>()
            .map(Loaded::Bytes),

        (_, _) if value.scalar_kind() == Some(target) => Ok(Loaded::from_value(value)),
        _ => Err(mismatch(value, &ty)),
    }
}

fn mismatch(value: &Value, ty: &Type) -> Error {
    Error::new(ErrorKind::TypeMismatch).with_message(format!(
        "{} cannot be converted to {ty}",
        value.type_label()
    ))
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes)
        .map_err(|err| Error::new(ErrorKind::Value).with_message(format!("invalid utf-8: {err}")))
}

/// Shortest round-trip text; exponents are signed and at least two digits (`1e+20`, `1.5e-05`).
fn float_text(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{f:?}");
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

fn float_to_int(f: f64) -> Result<Loaded, Error> {
    let truncated = f.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(Error::new(ErrorKind::Value)
            .with_message(format!("cannot convert float {f:?} to int")));
    }
    Ok(Loaded::Int(truncated as i64))
}

fn parse_int(text: &str) -> Result<Loaded, Error> {
    let cleaned = text.trim().replace('_', "");
    cleaned.parse::<i64>().map(Loaded::Int).map_err(|err| {
        Error::new(ErrorKind::Value)
            .with_message(format!("invalid literal for int: {text:?}"))
            .with_source(err)
    })
}

fn parse_float(text: &str) -> Result<Loaded, Error> {
    text.trim().parse::<f64>().map(Loaded::Float).map_err(|err| {
        Error::new(ErrorKind::Value)
            .with_message(format!("could not convert string to float: {text:?}"))
            .with_source(err)
    })
}

fn parse_bool(text: &str) -> Result<Loaded, Error> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Loaded::Bool(true)),
        "false" => Ok(Loaded::Bool(false)),
        _ => Err(Error::new(ErrorKind::Value).with_message(format!("not a boolean: {text:?}"))),
    }
}

pub fn load_literal(_loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    match ty {
        Type::Literal(allowed) if allowed.contains(value) => Ok(Loaded::from_value(value)),
        _ => Err(Error::new(ErrorKind::Value)
            .with_message(format!("not one of the allowed values in {ty}"))),
    }
}

pub fn load_any(_loader: &mut Loader, value: &Value, _ty: &Type) -> Result<Loaded, Error> {
    Ok(Loaded::Raw(value.clone()))
}

/// Builds a date, time or datetime from positional integer components.
pub fn load_temporal(_loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let temporal_error =
        |message: String| Error::new(ErrorKind::TypeMismatch).with_message(message);
    let Value::Seq(items) = value else {
        return Err(temporal_error(format!(
            "{ty} needs a sequence of integers, got {}",
            value.type_label()
        )));
    };
    let args = items
        .iter()
        .map(|item| match item {
            Value::Int(n) => Ok(*n),
            other => Err(temporal_error(format!(
                "{ty} arguments must be integers, got {}",
                other.type_label()
            ))),
        })
        .collect::<Result<Vec<i64>, Error>>()?;

    let (min, max) = match ty {
        Type::Date => (3, 3),
        Type::Time => (0, 4),
        _ => (3, 7),
    };
    if args.len() < min || args.len() > max {
        return Err(temporal_error(format!(
            "{ty} takes {min} to {max} arguments ({} given)",
            args.len()
        )));
    }

    let result = match ty {
        Type::Date => build_date(&args).map(Loaded::Date),
        Type::Time => build_time(&args).map(Loaded::Time),
        _ => build_date(&args[..3]).and_then(|date| {
            build_time(&args[3..]).map(|time| Loaded::DateTime(PrimitiveDateTime::new(date, time)))
        }),
    };
    result.map_err(temporal_error)
}

fn component<T: TryFrom<i64>>(args: &[i64], idx: usize, name: &str) -> Result<T, String> {
    let raw = args.get(idx).copied().unwrap_or(0);
    T::try_from(raw).map_err(|_| format!("{name} {raw} is out of range"))
}

fn build_date(args: &[i64]) -> Result<Date, String> {
    let year: i32 = component(args, 0, "year")?;
    let month: u8 = component(args, 1, "month")?;
    let day: u8 = component(args, 2, "day")?;
    let month = Month::try_from(month).map_err(|err| err.to_string())?;
    Date::from_calendar_date(year, month, day).map_err(|err| err.to_string())
}

fn build_time(args: &[i64]) -> Result<Time, String> {
    let hour: u8 = component(args, 0, "hour")?;
    let minute: u8 = component(args, 1, "minute")?;
    let second: u8 = component(args, 2, "second")?;
    let micro: u32 = component(args, 3, "microsecond")?;
    Time::from_hms_micro(hour, minute, second, micro).map_err(|err| err.to_string())
}

pub fn load_str_constructed(
    _loader: &mut Loader,
    value: &Value,
    ty: &Type,
) -> Result<Loaded, Error> {
    let Type::External(def) = ty else {
        return Err(mismatch(value, ty));
    };
    let Value::Str(text) = value else {
        return Err(Error::new(ErrorKind::TypeMismatch).with_message(format!(
            "{ty} is constructed from a string, got {}",
            value.type_label()
        )));
    };
    def.parse(text).map_err(Error::from)
}

pub fn load_new_type(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::NewType(def) = ty else {
        return Err(mismatch(value, ty));
    };
    loader.load(value, def.supertype())
}
