pub const READINGS_STREAM: &str = "AQUAWATCH_READINGS";
pub const READINGS_SUBJECT: &str = "aquawatch.readings.>";
pub const READINGS_SUBJECT_PREFIX: &str = "aquawatch.readings";
pub const CONSUMER_NAME: &str = "aquawatch-engine";

pub const NOTIFICATIONS_STREAM: &str = "AQUAWATCH_NOTIFICATIONS";
pub const NOTIFICATIONS_SUBJECT: &str = "aquawatch.notifications";

pub fn subject_for_station(station_id: i64) -> String {
    format!("{READINGS_SUBJECT_PREFIX}.{station_id}")
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub name: String,
    pub subjects: Vec<String>,
    pub max_bytes: i64,
    pub max_age_secs: u64,
}

impl StreamConfig {
    pub fn readings() -> Self {
        Self {
            name: READINGS_STREAM.into(),
            subjects: vec![READINGS_SUBJECT.into()],
            max_bytes: 1_073_741_824,
            max_age_secs: 86400 * 7,
        }
    }

    pub fn notifications() -> Self {
        Self {
            name: NOTIFICATIONS_STREAM.into(),
            subjects: vec![NOTIFICATIONS_SUBJECT.into()],
            max_bytes: 268_435_456,
            max_age_secs: 86400 * 30,
        }
    }
}
