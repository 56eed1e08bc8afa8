// SPDX-License-Identifier: Apache-2.0
//! T=11 SENTINEL — unattended sensor node report.
//!
//! ```text
//! v=1  sensorCount u8 (<=32)  t u32  lat i32  lon i32  nodeId u32  flags u8
//!      [inMask u8  outMask u8]       if flags & IO
//!      [label: u8 len, utf8 <=32]    if flags & LABEL
//!      (type u8, value i16) * sensorCount
//! ```

use crate::bytes::{ByteReader, ByteWriter};
use crate::error::{CodecError, TemplateId};
use crate::templates::common::{decode_coord, decode_minutes, encode_coord, encode_minutes, require_version};

const VERSION: u8 = 1;
const TEMPLATE: TemplateId = TemplateId::Sentinel;

/// Maximum number of sensor readings a payload may carry.
pub const MAX_SENSORS: usize = 32;
/// Maximum byte length of the `label` field.
pub const LABEL_CAP: usize = 32;

/// Flag bits gating SENTINEL's optional trailers.
pub mod flags {
    /// Payload carries an active alert.
    pub const ALERT: u8 = 1 << 0;
    /// Payload carries digital I/O masks.
    pub const IO: u8 = 1 << 1;
    /// Payload carries a short label.
    pub const LABEL: u8 = 1 << 2;
}

/// One `(type, value)` sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Sensor type code.
    pub sensor_type: u8,
    /// Signed reading value.
    pub value: i16,
}

/// Decoded SENTINEL payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentinel {
    /// Unix milliseconds (minute precision) of the report.
    pub t: u64,
    /// Node location.
    pub lat: f64,
    /// Node location.
    pub lon: f64,
    /// Node identifier.
    pub node_id: u32,
    /// Whether the node is reporting an active alert.
    pub alert: bool,
    /// Digital input/output masks, if carried.
    pub io: Option<(u8, u8)>,
    /// Short label, if carried.
    pub label: Option<String>,
    /// Sensor readings, at most [`MAX_SENSORS`].
    pub sensors: Vec<SensorReading>,
}

/// Encode a [`Sentinel`] to its binary payload.
///
/// # Errors
///
/// Returns [`CodecError::InvalidField`] if `sensors.len()` exceeds
/// [`MAX_SENSORS`].
pub fn encode(v: &Sentinel) -> Result<Vec<u8>, CodecError> {
    if v.sensors.len() > MAX_SENSORS {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "sensorCount",
            reason: format!("at most {MAX_SENSORS} sensors, got {}", v.sensors.len()),
        });
    }

    let mut flag_byte = 0u8;
    if v.alert {
        flag_byte |= flags::ALERT;
    }
    if v.io.is_some() {
        flag_byte |= flags::IO;
    }
    if v.label.is_some() {
        flag_byte |= flags::LABEL;
    }

    let mut w = ByteWriter::with_capacity(15 + v.sensors.len() * 3);
    w.write_u8(VERSION);
    #[allow(clippy::cast_possible_truncation)]
    w.write_u8(v.sensors.len() as u8);
    w.write_u32(encode_minutes(v.t));
    w.write_i32(encode_coord(v.lat));
    w.write_i32(encode_coord(v.lon));
    w.write_u32(v.node_id);
    w.write_u8(flag_byte);
    if let Some((in_mask, out_mask)) = v.io {
        w.write_u8(in_mask);
        w.write_u8(out_mask);
    }
    if let Some(label) = &v.label {
        w.write_str_u8(label, LABEL_CAP);
    }
    for reading in &v.sensors {
        w.write_u8(reading.sensor_type);
        w.write_i16(reading.value);
    }
    Ok(w.into_vec())
}

/// Decode a SENTINEL binary payload.
///
/// # Errors
///
/// See [`CodecError`].
pub fn decode(bytes: &[u8]) -> Result<Sentinel, CodecError> {
    let mut r = ByteReader::new(bytes, TEMPLATE);
    require_version(r.read_u8("version")?, VERSION, TEMPLATE)?;
    let sensor_count = r.read_u8("sensorCount")? as usize;
    if sensor_count > MAX_SENSORS {
        return Err(CodecError::InvalidField {
            template: TEMPLATE,
            field: "sensorCount",
            reason: format!("at most {MAX_SENSORS} sensors, got {sensor_count}"),
        });
    }
    let t = decode_minutes(r.read_u32("t")?);
    let lat = decode_coord(r.read_i32("lat")?);
    let lon = decode_coord(r.read_i32("lon")?);
    let node_id = r.read_u32("nodeId")?;
    let flag_byte = r.read_u8("flags")?;

    let alert = flag_byte & flags::ALERT != 0;
    let io = if flag_byte & flags::IO != 0 {
        let in_mask = r.read_u8("inMask")?;
        let out_mask = r.read_u8("outMask")?;
        Some((in_mask, out_mask))
    } else {
        None
    };
    let label = (flag_byte & flags::LABEL != 0)
        .then(|| r.read_str_u8("label"))
        .transpose()?;

    let mut sensors = Vec::with_capacity(sensor_count);
    for _ in 0..sensor_count {
        let sensor_type = r.read_u8("sensorType")?;
        let value = r.read_i16("value")?;
        sensors.push(SensorReading { sensor_type, value });
    }

    Ok(Sentinel {
        t,
        lat,
        lon,
        node_id,
        alert,
        io,
        label,
        sensors,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Sentinel {
        Sentinel {
            t: 60_000,
            lat: 35.0,
            lon: -80.0,
            node_id: 42,
            alert: true,
            io: Some((0b0101, 0b1010)),
            label: Some("Gate sensor".to_owned()),
            sensors: vec![
                SensorReading { sensor_type: 1, value: -200 },
                SensorReading { sensor_type: 2, value: 300 },
            ],
        }
    }

    #[test]
    fn round_trips() {
        let v = sample();
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn minimal_has_no_io_or_label() {
        let v = Sentinel {
            io: None,
            label: None,
            sensors: vec![],
            ..sample()
        };
        let decoded = decode(&encode(&v).unwrap()).unwrap();
        assert!(decoded.io.is_none());
        assert!(decoded.label.is_none());
        assert!(decoded.sensors.is_empty());
    }

    #[test]
    fn thirty_two_sensors_accepted() {
        let v = Sentinel {
            sensors: (0..32)
                .map(|i| SensorReading { sensor_type: i as u8, value: i as i16 })
                .collect(),
            ..sample()
        };
        assert!(encode(&v).is_ok());
    }

    #[test]
    fn thirty_three_sensors_rejected() {
        let v = Sentinel {
            sensors: (0..33)
                .map(|i| SensorReading { sensor_type: i as u8, value: i as i16 })
                .collect(),
            ..sample()
        };
        assert!(encode(&v).is_err());
    }
}
