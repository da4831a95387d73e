//! Sample fixtures shared by the distribution and end-to-end tests

use airnode_core::sample::PhysicalSample;

/// Indoor climate reading, gas channel absent
pub fn climate(timestamp: u64, temperature: f32, humidity: f32, pressure: f32) -> PhysicalSample {
    PhysicalSample::new(timestamp)
        .with_temperature(temperature)
        .with_humidity(humidity)
        .with_pressure(pressure)
}

/// Reading with every channel
pub fn full(timestamp: u64) -> PhysicalSample {
    climate(timestamp, 21.0, 40.0, 101_300.0).with_gas_resistance(85_000.0)
}

/// A, B (same values as A), C (temperature changed)
pub fn abc() -> [PhysicalSample; 3] {
    [
        climate(1, 21.0, 40.0, 1013.0),
        climate(2, 21.0, 40.0, 1013.0),
        climate(3, 21.5, 40.0, 1013.0),
    ]
}

/// Slowly drifting temperature; every sample differs from the previous one
pub fn drifting(count: usize) -> Vec<PhysicalSample> {
    (0..count)
        .map(|i| climate(i as u64, 20.0 + i as f32 * 0.25, 45.0, 100_900.0))
        .collect()
}
