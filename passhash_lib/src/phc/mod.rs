//! PHC string format.
//!
//! `$<id>[$v=<version>][$<k1>=<v1>,<k2>=<v2>,...]$<salt>$<hash>`
//!
//! Salt and hash are written in unpadded standard base64. The grammar is closed: every
//! field must be recognized, and values must be written canonically, so that a decoded
//! record re-encodes to exactly the same string.

use std::fmt::Display;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD as b64_stdnopad;

use crate::Error;

mod params;
pub use params::Params;

const DELIMITER: char = '$';
const MAX_NAME_LENGTH: usize = 32;

/// Structured form of a PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub version: Option<u32>,
    pub params: Params,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl Record {
    #[must_use]
    pub fn new(id: impl Into<String>, salt: Vec<u8>, hash: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            version: None,
            params: Params::new(),
            salt,
            hash,
        }
    }

    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

fn is_name(value: &str) -> bool {
    (1..=MAX_NAME_LENGTH).contains(&value.len())
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn parse_number(value: &str) -> Option<u64> {
    let digits = !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit());
    let canonical = value == "0" || (digits && !value.starts_with('0'));

    if !canonical {
        return None;
    }

    value.parse().ok()
}

pub fn serialize(record: &Record) -> Result<String, Error> {
    if !is_name(&record.id) {
        return Err(Error::Encoding("id must be 1 to 32 characters of [a-z0-9-]"));
    }

    for key in record.params.keys() {
        if !is_name(key) {
            return Err(Error::Encoding(
                "parameter names must be 1 to 32 characters of [a-z0-9-]",
            ));
        }

        if key == "v" {
            return Err(Error::Encoding("parameter name v is reserved for the version"));
        }
    }

    if record.salt.is_empty() {
        return Err(Error::Encoding("salt is empty"));
    }

    if record.hash.is_empty() {
        return Err(Error::Encoding("hash is empty"));
    }

    let mut output = format!("{DELIMITER}{}", record.id);

    if let Some(version) = record.version {
        output.push_str(&format!("{DELIMITER}v={version}"));
    }

    if !record.params.is_empty() {
        output.push_str(&format!("{DELIMITER}{}", record.params));
    }

    output.push(DELIMITER);
    b64_stdnopad.encode_string(&record.salt, &mut output);
    output.push(DELIMITER);
    b64_stdnopad.encode_string(&record.hash, &mut output);

    Ok(output)
}

fn deserialize_params(field: &str) -> Result<Params, Error> {
    let mut params = Params::new();

    for pair in field.split(',') {
        let (key, value) = pair
            .split_once('=')
            .ok_or(Error::Decoding("parameters must be written as key=value"))?;

        if !is_name(key) || key == "v" {
            return Err(Error::Decoding("invalid parameter name"));
        }

        if params.contains(key) {
            return Err(Error::Decoding("duplicate parameter"));
        }

        let value = parse_number(value)
            .ok_or(Error::Decoding("parameter values must be non-negative integers"))?;

        params.insert(key, value);
    }

    Ok(params)
}

fn deserialize_bytes(field: &str, name: &'static str) -> Result<Vec<u8>, Error> {
    if field.is_empty() {
        return Err(Error::Decoding(name));
    }

    b64_stdnopad.decode(field).map_err(|e| {
        log::debug!("Invalid base64 in PHC field: {e}");
        Error::Decoding(name)
    })
}

pub fn deserialize(value: &str) -> Result<Record, Error> {
    let rest = value
        .strip_prefix(DELIMITER)
        .ok_or(Error::Decoding("missing leading delimiter"))?;

    let mut fields = rest.split(DELIMITER).peekable();

    let id = fields.next().unwrap_or_default();
    if !is_name(id) {
        return Err(Error::Decoding("invalid id"));
    }

    let version = match fields.peek() {
        Some(field) if field.starts_with("v=") => {
            let version = fields
                .next()
                .and_then(|f| f.strip_prefix("v="))
                .and_then(parse_number)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or(Error::Decoding("version must be written as v=<integer>"))?;

            Some(version)
        }
        _ => None,
    };

    let params = match fields.peek() {
        Some(field) if field.contains('=') => {
            let field = fields.next().unwrap_or_default();
            deserialize_params(field)?
        }
        _ => Params::new(),
    };

    let (Some(salt), Some(hash), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(Error::Decoding("unexpected number of fields"));
    };

    Ok(Record {
        id: id.to_owned(),
        version,
        params,
        salt: deserialize_bytes(salt, "invalid salt encoding")?,
        hash: deserialize_bytes(hash, "invalid hash encoding")?,
    })
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let serialized = serialize(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&serialized)
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        deserialize(s)
    }
}
