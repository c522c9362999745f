/*
 * Copyright 2019 Michael Lodato <zvxryb@gmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use serde::{Deserialize, Serialize};

/// Tunables for the sky simulation and the message overlay.
///
/// Every field has a default, so a JSON override only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub cloud_count: usize,
    pub rain_drops: usize,
    pub birds_per_strike: usize,
    /// pixels per frame
    pub sweep_speed: f32,
    /// full width of the turbulence jitter, in pixels
    pub shake_amplitude: f32,
    pub altitude_period_ms: f64,
    pub altitude_divisor: i32,
    pub message_hold_ms: u32,
    pub message_fade_ms: u32,
    pub companion_delay_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self{
            cloud_count: 40,
            rain_drops: 100,
            birds_per_strike: 3,
            sweep_speed: 0.5,
            shake_amplitude: 8.0,
            altitude_period_ms: 100.0,
            altitude_divisor: 20,
            message_hold_ms: 4000,
            message_fade_ms: 500,
            companion_delay_ms: 1500,
        }
    }
}

impl Config {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        let mut config: Config = serde_json::from_str(source)?;
        config.validate();
        Ok(config)
    }

    fn validate(&mut self) {
        let defaults = Config::default();
        if !(self.sweep_speed.is_finite() && self.sweep_speed > 0.0) {
            self.sweep_speed = defaults.sweep_speed;
        }
        if !self.shake_amplitude.is_finite() || self.shake_amplitude < 0.0 {
            self.shake_amplitude = defaults.shake_amplitude;
        }
        if !(self.altitude_period_ms.is_finite() && self.altitude_period_ms > 0.0) {
            self.altitude_period_ms = defaults.altitude_period_ms;
        }
        if self.altitude_divisor < 1 {
            self.altitude_divisor = defaults.altitude_divisor;
        }
    }
}
