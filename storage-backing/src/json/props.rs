// SPDX-License-Identifier: GPL-3.0-only

use serde_json::{Map, Value};
use storage_types::NetHost;

use crate::error::{BackingError, Result};

/// Typed access to the properties of one driver object.
#[derive(Clone, Copy)]
pub(super) struct Props<'a> {
    pub spec: &'a str,
    pub driver: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Props<'a> {
    pub fn new(spec: &'a str, driver: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { spec, driver, map }
    }

    /// Properties of a nested object, reported under the same driver.
    pub fn nested(&self, map: &'a Map<String, Value>) -> Self {
        Self { map, ..*self }
    }

    pub fn error(&self, reason: impl std::fmt::Display) -> BackingError {
        BackingError::malformed(self.spec, format!("{} driver: {reason}", self.driver))
    }

    pub fn str(&self, key: &str) -> Result<Option<&'a str>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(self.error(format_args!("'{key}' must be a string"))),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str> {
        self.str(key)?
            .ok_or_else(|| self.error(format_args!("missing '{key}'")))
    }

    /// A number given either as a JSON number or as a decimal string.
    pub fn number(&self, key: &str) -> Result<Option<u64>> {
        let invalid = || self.error(format_args!("'{key}' must be a non-negative number"));
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => number.as_u64().map(Some).ok_or_else(invalid),
            Some(Value::String(text)) => text.trim().parse().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    pub fn port(&self, key: &str) -> Result<Option<u16>> {
        match self.number(key)? {
            None => Ok(None),
            Some(port) => u16::try_from(port)
                .map(Some)
                .map_err(|_| self.error(format_args!("port {port} out of range"))),
        }
    }

    /// A boolean given as JSON bool or as `on`/`off`, `yes`/`no`, `true`/`false`.
    pub fn flag(&self, key: &str) -> Result<Option<bool>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(Value::String(text)) => match text.as_str() {
                "on" | "yes" | "true" => Ok(Some(true)),
                "off" | "no" | "false" => Ok(Some(false)),
                other => Err(self.error(format_args!("invalid value '{other}' for '{key}'"))),
            },
            Some(_) => Err(self.error(format_args!("'{key}' must be a boolean"))),
        }
    }

    pub fn object(&self, key: &str) -> Result<Option<&'a Map<String, Value>>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.error(format_args!("'{key}' must be an object"))),
        }
    }

    pub fn array(&self, key: &str) -> Result<Option<&'a Vec<Value>>> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(self.error(format_args!("'{key}' must be an array"))),
        }
    }
}

/// `{"host": ..., "port": ...}` without a type tag.
pub(super) fn inet_address(props: &Props<'_>) -> Result<NetHost> {
    let host = props.required_str("host")?;
    Ok(NetHost::tcp(host, props.port("port")?))
}

/// Socket address tagged with `type`: `inet`/`tcp` or `unix`.
pub(super) fn socket_address(props: &Props<'_>) -> Result<NetHost> {
    match props.required_str("type")? {
        "inet" | "tcp" => inet_address(props),
        "unix" => {
            let socket = match props.str("path")? {
                Some(path) => path,
                None => props.required_str("socket")?,
            };
            Ok(NetHost::unix(socket))
        }
        other => Err(props.error(format_args!("unsupported socket address type '{other}'"))),
    }
}

/// Every element of a `server` array, each an object.
pub(super) fn server_objects<'a>(props: &Props<'a>) -> Result<Vec<Props<'a>>> {
    let Some(items) = props.array("server")? else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => Ok(props.nested(map)),
            _ => Err(props.error("'server' entries must be objects")),
        })
        .collect()
}
