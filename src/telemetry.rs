//! Synthetic sensor readings in the platform's property-report format.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const PROPERTY_POST_METHOD: &str = "thing.event.property.post";

pub const TEMP_RANGE: Range<u32> = 20..30;
pub const HUMI_RANGE: Range<u32> = 50..70;
pub const DUST_RANGE: Range<u32> = 10..60;
pub const ECO2_RANGE: Range<u32> = 400..600;
pub const TVOC_RANGE: Range<u32> = 0..200;
pub const HCHO_RANGE: Range<u32> = 0..100;

/// One set of readings, keyed by the property identifiers of the product model
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SensorReadings {
    #[serde(rename = "Temp")]
    pub temp: u32,
    #[serde(rename = "Humi")]
    pub humi: u32,
    #[serde(rename = "Dust")]
    pub dust: u32,
    #[serde(rename = "eCO2")]
    pub eco2: u32,
    #[serde(rename = "TVOC")]
    pub tvoc: u32,
    #[serde(rename = "HCHO")]
    pub hcho: u32,
}

impl SensorReadings {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            temp: rng.gen_range(TEMP_RANGE),
            humi: rng.gen_range(HUMI_RANGE),
            dust: rng.gen_range(DUST_RANGE),
            eco2: rng.gen_range(ECO2_RANGE),
            tvoc: rng.gen_range(TVOC_RANGE),
            hcho: rng.gen_range(HCHO_RANGE),
        }
    }
}

/// Property report envelope
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PropertyPost {
    /// Message id, epoch milliseconds at generation time
    pub id: i64,
    pub params: SensorReadings,
    pub method: String,
}

impl PropertyPost {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, id_ms: i64) -> Self {
        Self {
            id: id_ms,
            params: SensorReadings::random(rng),
            method: PROPERTY_POST_METHOD.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
