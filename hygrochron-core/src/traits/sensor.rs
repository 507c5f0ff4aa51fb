//! Climate sensor trait

/// Errors that can occur with the climate sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor did not acknowledge on the bus
    NotPresent,
    /// Bus transfer failed
    Communication,
    /// Measurement did not complete in time
    Timeout,
    /// Checksum or status byte mismatch
    InvalidData,
}

/// One raw measurement as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent, if the sensor measures it
    pub humidity_pct: Option<f32>,
}

/// Trait for temperature/humidity sensors
///
/// Implementations must return promptly; a driver that can block wraps its
/// bus access in a timeout and reports [`SensorError::Timeout`].
pub trait ClimateSensor {
    /// Bring the sensor up (soft reset, calibration load, etc.)
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Take one measurement
    fn read(&mut self) -> Result<RawSample, SensorError>;

    /// Whether the sensor reports relative humidity
    fn supports_humidity(&self) -> bool;
}
