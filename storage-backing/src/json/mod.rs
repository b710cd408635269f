// SPDX-License-Identifier: GPL-3.0-only

//! `json:{...}` pseudo-filenames.
//!
//! Both the nested (`{"file": {"driver": "file"}}`) and the flattened
//! (`{"file.driver": "file"}`) spellings are normalized up front, so the
//! driver handlers only ever see nested objects.

mod deflatten;
mod drivers;
mod props;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BackingError, Result};
use crate::spec::BackingSpec;
use props::Props;

pub(crate) fn parse(spec: &str, body: &str) -> Result<BackingSpec> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| BackingError::malformed(spec, format!("invalid JSON: {err}")))?;
    if !value.is_object() {
        return Err(BackingError::malformed(spec, "JSON pseudo-filename must be an object"));
    }

    let root = deflatten::deflatten(value).map_err(|reason| BackingError::malformed(spec, reason))?;
    let Value::Object(root) = root else {
        return Err(BackingError::malformed(spec, "JSON pseudo-filename must be an object"));
    };

    // {"file": {...}} wrapper without a driver of its own
    let object = match root.get("file") {
        Some(Value::Object(file)) if !root.contains_key("driver") => file,
        _ => &root,
    };

    parse_driver(spec, object, true)
}

fn parse_driver(spec: &str, object: &Map<String, Value>, allow_format: bool) -> Result<BackingSpec> {
    let driver = match object.get("driver") {
        Some(Value::String(driver)) => driver.as_str(),
        Some(_) => return Err(BackingError::malformed(spec, "'driver' must be a string")),
        None => return Err(BackingError::malformed(spec, "missing 'driver'")),
    };
    debug!(driver, "parsing JSON backing store");

    let props = Props::new(spec, driver, object);
    match driver {
        "raw" if allow_format => parse_raw(props),
        "raw" => Err(props.error("format drivers cannot be nested")),
        other => drivers::parse_protocol(props, other),
    }
}

/// `raw` wraps a protocol driver, optionally restricted to a byte range.
fn parse_raw(props: Props<'_>) -> Result<BackingSpec> {
    let offset = props.number("offset")?;
    let size = props.number("size")?;
    let file = props
        .object("file")?
        .ok_or_else(|| props.error("missing 'file'"))?;

    let mut parsed = parse_driver(props.spec, file, false)?;
    if offset.is_some() || size.is_some() {
        parsed.source.slice = Some(storage_types::StorageSlice { offset, size });
    }
    Ok(parsed)
}
