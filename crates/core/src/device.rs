use serde::{Deserialize, Serialize};

use crate::{MAX_TEMPERATURE, MIN_TEMPERATURE, TEMPERATURE_UNSET};

/// A controllable light.
///
/// `temperature` is `None` when unset; storage keeps the `0` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    pub name: String,
    pub is_on: bool,
    pub temperature: Option<u32>,
}

impl Device {
    /// A freshly created light: off, no temperature.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), is_on: false, temperature: None }
    }
}

/// Whether `value` is an accepted light temperature in Kelvin.
#[must_use]
pub const fn is_valid_temperature(value: u32) -> bool {
    value >= MIN_TEMPERATURE && value <= MAX_TEMPERATURE
}

/// Storage form of a temperature: `None` becomes the `0` sentinel.
#[must_use]
pub fn temperature_to_stored(value: Option<u32>) -> i64 {
    value.map_or(TEMPERATURE_UNSET, i64::from)
}

/// Domain form of a stored temperature: `0` (or anything non-positive) is unset.
#[must_use]
pub fn temperature_from_stored(stored: i64) -> Option<u32> {
    if stored <= TEMPERATURE_UNSET { None } else { u32::try_from(stored).ok() }
}
