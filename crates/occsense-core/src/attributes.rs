//! Named sensor attributes.
//!
//! Projects values out of a [`Response`] using hwmon-style names:
//! `temp{n}_input`, `temp{n}_label`, `freq{n}_input`, `freq{n}_label`,
//! `power{n}_input`, `power{n}_label` and `all`. `n` is 1-based and maps to
//! record `n - 1` of the last block of that kind.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

use crate::response::{BlockKind, Response, SensorRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("unknown attribute name: {name}")]
    UnknownName { name: String },
    #[error("attribute {name} is not available in this response")]
    Unavailable { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeField {
    Input,
    Label,
}

/// A parsed attribute name.
///
/// # Examples
/// ```
/// use occsense_core::{Attribute, AttributeField, BlockKind};
///
/// let attr: Attribute = "temp3_input".parse()?;
/// assert_eq!(
///     attr,
///     Attribute::Sensor { kind: BlockKind::Temperature, index: 3, field: AttributeField::Input }
/// );
/// assert_eq!(attr.to_string(), "temp3_input");
/// # Ok::<(), occsense_core::AttributeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Text dump of every block.
    All,
    /// One field of one sensor; `index` is 1-based.
    Sensor {
        kind: BlockKind,
        index: usize,
        field: AttributeField,
    },
}

fn prefix(kind: BlockKind) -> Option<&'static str> {
    match kind {
        BlockKind::Temperature => Some("temp"),
        BlockKind::Frequency => Some("freq"),
        BlockKind::Power => Some("power"),
        BlockKind::Unknown => None,
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let unknown = || AttributeError::UnknownName {
            name: name.to_string(),
        };
        if name == "all" {
            return Ok(Attribute::All);
        }

        let (sensor, field) = if let Some(sensor) = name.strip_suffix("_input") {
            (sensor, AttributeField::Input)
        } else if let Some(sensor) = name.strip_suffix("_label") {
            (sensor, AttributeField::Label)
        } else {
            return Err(unknown());
        };

        for kind in [BlockKind::Temperature, BlockKind::Frequency, BlockKind::Power] {
            let Some(number) = prefix(kind).and_then(|p| sensor.strip_prefix(p)) else {
                continue;
            };
            if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
                return Err(unknown());
            }
            let index: usize = number.parse().map_err(|_| unknown())?;
            if index == 0 {
                return Err(unknown());
            }
            return Ok(Attribute::Sensor { kind, index, field });
        }
        Err(unknown())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::All => f.write_str("all"),
            Attribute::Sensor { kind, index, field } => {
                let suffix = match field {
                    AttributeField::Input => "input",
                    AttributeField::Label => "label",
                };
                write!(f, "{}{}_{}", prefix(*kind).unwrap_or("unknown"), index, suffix)
            }
        }
    }
}

/// Value produced by reading an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Reading(u16),
    SensorId(u16),
    Dump(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Reading(value) => write!(f, "{value}"),
            AttributeValue::SensorId(id) => write!(f, "sensor id: {id}"),
            AttributeValue::Dump(text) => f.write_str(text),
        }
    }
}

/// Read `attribute` from `response`.
///
/// # Errors
/// Returns [`AttributeError::Unavailable`] when the block or the sensor
/// index does not exist in this response.
pub fn read_attribute(
    response: &Response,
    attribute: Attribute,
) -> Result<AttributeValue, AttributeError> {
    match attribute {
        Attribute::All => Ok(AttributeValue::Dump(dump(response))),
        Attribute::Sensor { kind, index, field } => {
            let record = response
                .block_index(kind)
                .zip(index.checked_sub(1))
                .and_then(|(block, i)| response.sensor_by_index(block, i))
                .ok_or_else(|| AttributeError::Unavailable {
                    name: attribute.to_string(),
                })?;
            Ok(match field {
                AttributeField::Input => AttributeValue::Reading(record.value()),
                AttributeField::Label => AttributeValue::SensorId(record.sensor_id()),
            })
        }
    }
}

fn dump(response: &Response) -> String {
    let mut out = String::new();
    let header = response.header();
    let _ = writeln!(out, "code_level: {}", header.code_level);
    let _ = writeln!(out, "num_of_sensor_blocks: {}", response.blocks().len());
    for (index, block) in response.blocks().iter().enumerate() {
        let descriptor = block.descriptor();
        let _ = writeln!(
            out,
            "block {index}: sensor_type: {} num_of_sensors: {} sensor_length: {}",
            descriptor.tag, descriptor.record_count, descriptor.stride
        );
        if block.kind() == BlockKind::Unknown && !descriptor.is_empty() {
            let _ = writeln!(out, "  skipped: unsupported sensor type");
            continue;
        }
        for record in block.records() {
            match record {
                SensorRecord::Value(value) => {
                    let _ = writeln!(
                        out,
                        "  sensor_id: {} value: {}",
                        value.sensor_id, value.value
                    );
                }
                SensorRecord::Power(power) => {
                    let _ = writeln!(
                        out,
                        "  sensor_id: {} value: {} update_tag: {} accumulator: {}",
                        power.sensor_id, power.value, power.update_tag, power.accumulator
                    );
                }
            }
        }
    }
    out
}
