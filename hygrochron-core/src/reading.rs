//! Reading source
//!
//! Wraps the climate sensor and turns each measurement into a [`Reading`].
//! A failed transfer or a non-numeric value is a fault; a value outside the
//! sensor's physical range is still a valid reading (the bounds are for
//! sanity checks by consumers, not an error condition).

use log::{debug, warn};

use crate::traits::{ClimateSensor, SensorError};

/// Documented temperature range of the sensor (°C)
pub const TEMPERATURE_RANGE_C: (f32, f32) = (-40.0, 85.0);

/// Documented humidity range of the sensor (% RH)
pub const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);

/// One tick's sample
///
/// Produced once per tick and never mutated; the next tick supersedes it.
/// When `valid` is false the numeric fields carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %, when the sensor supports it
    pub humidity: Option<f32>,
    /// Whether the sample came from a successful measurement
    pub valid: bool,
}

impl Reading {
    /// A valid reading
    pub const fn new(temperature: f32, humidity: Option<f32>) -> Self {
        Self {
            temperature,
            humidity,
            valid: true,
        }
    }

    /// Fault marker
    pub const fn fault() -> Self {
        Self {
            temperature: 0.0,
            humidity: None,
            valid: false,
        }
    }

    /// Check the values against the documented physical ranges
    pub fn within_physical_range(&self) -> bool {
        let (t_min, t_max) = TEMPERATURE_RANGE_C;
        let (h_min, h_max) = HUMIDITY_RANGE_PCT;
        let temp_ok = self.temperature >= t_min && self.temperature <= t_max;
        let hum_ok = self.humidity.map_or(true, |h| h >= h_min && h <= h_max);
        temp_ok && hum_ok
    }
}

/// Sensor wrapper producing validated readings
pub struct ReadingSource<S> {
    sensor: S,
    /// Faults since the last good reading
    consecutive_faults: u32,
    /// Faults since boot
    total_faults: u32,
}

impl<S: ClimateSensor> ReadingSource<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            consecutive_faults: 0,
            total_faults: 0,
        }
    }

    /// Initialize the underlying sensor
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.sensor.init()
    }

    /// Whether readings carry humidity
    pub fn supports_humidity(&self) -> bool {
        self.sensor.supports_humidity()
    }

    /// Take one reading
    pub fn read(&mut self) -> Reading {
        let sample = match self.sensor.read() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Sensor read failed: {:?}", e);
                return self.fault();
            }
        };

        let humidity = if self.sensor.supports_humidity() {
            sample.humidity_pct
        } else {
            None
        };

        let finite = sample.temperature_c.is_finite() && humidity.map_or(true, |h| h.is_finite());
        if !finite {
            warn!("Sensor returned a non-numeric value");
            return self.fault();
        }

        let reading = Reading::new(sample.temperature_c, humidity);
        if !reading.within_physical_range() {
            debug!(
                "Reading outside documented range: {}°C {:?}%",
                reading.temperature, reading.humidity
            );
        }

        self.consecutive_faults = 0;
        reading
    }

    /// Faults since the last good reading
    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    /// Faults since boot
    pub fn total_faults(&self) -> u32 {
        self.total_faults
    }

    /// Access the wrapped sensor
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    fn fault(&mut self) -> Reading {
        self.consecutive_faults = self.consecutive_faults.saturating_add(1);
        self.total_faults = self.total_faults.saturating_add(1);
        Reading::fault()
    }
}
