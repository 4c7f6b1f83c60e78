/*
 *  deutils.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lenient serde helpers for loosely typed push payloads
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a number, a numeric string, an empty string or null.
///
/// Track numbers arrive as `3`, `"3"` or `""` depending on the music service.
pub fn deserialize_optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let v = Option::<Value>::deserialize(deserializer)?;
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => {
            let n = v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| D::Error::custom("non-integer"))?
                .try_into()
                .map_err(|_| D::Error::custom("overflow"))?;
            Ok(Some(n))
        }
    }
}

/// Accepts a string, a number or a boolean and renders it as text; null stays `None`.
pub fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        // arrays and objects carry nothing we can show
        Some(_) => None,
    })
}

/// Like [`deserialize_optional_text`], with null and unusable shapes read as an empty string.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_text(deserializer)?.unwrap_or_default())
}
