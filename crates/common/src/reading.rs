use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One inbound sensor reading, exactly as emitted by the ingest pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub value: f64,
    pub sensor_id: i64,
    pub metric: String,
    pub station_id: i64,
    #[serde(with = "station_datetime")]
    pub datetime: NaiveDateTime,
    pub unit: String,
}

/// The ingest pipeline formats timestamps as `2024-05-01 13:45:00`,
/// without a zone offset.
pub mod station_datetime {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
