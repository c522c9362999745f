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

const FLIGHT_LEVEL_FLOOR: i32 = 18000;

/// Displayed altitude, eased toward its target on a fixed period rather
/// than every frame.
pub struct Altimeter {
    current: i32,
    target: i32,
    period_ms: f64,
    divisor: i32,
    elapsed_ms: f64,
}

impl Altimeter {
    pub fn new(period_ms: f64, divisor: i32) -> Self {
        Self{
            current: 0,
            target: 0,
            period_ms,
            divisor: divisor.max(1),
            elapsed_ms: 0.0,
        }
    }

    pub fn current(&self) -> i32 { self.current }
    pub fn target(&self) -> i32 { self.target }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Restarts the easing cadence.
    pub fn set_target(&mut self, target: i32) {
        self.target = target;
        self.elapsed_ms = 0.0;
    }

    /// One easing tick: move by ceil(gap / divisor), clamped to the target.
    pub fn step(&mut self) {
        let gap = self.target - self.current;
        if gap > 0 {
            let delta = (gap + self.divisor - 1) / self.divisor;
            self.current = (self.current + delta).min(self.target);
        } else if gap < 0 {
            let delta = (-gap + self.divisor - 1) / self.divisor;
            self.current = (self.current - delta).max(self.target);
        }
    }

    pub fn advance(&mut self, dt_ms: f64) {
        if self.is_settled() {
            self.elapsed_ms = 0.0;
            return;
        }
        self.elapsed_ms += dt_ms;
        while self.elapsed_ms >= self.period_ms && !self.is_settled() {
            self.elapsed_ms -= self.period_ms;
            self.step();
        }
    }

    pub fn label(&self) -> String {
        if self.current >= FLIGHT_LEVEL_FLOOR {
            format!("ALT: FL{}", (self.current as f64 / 100.0).round() as i32)
        } else {
            format!("ALT: {} FT", self.current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climb_log(from: i32, to: i32) -> Vec<i32> {
        let mut altimeter = Altimeter::new(100.0, 20);
        altimeter.current = from;
        altimeter.set_target(to);
        let mut log = vec![altimeter.current()];
        for _ in 0..10_000 {
            if altimeter.is_settled() { break; }
            altimeter.step();
            log.push(altimeter.current());
        }
        log
    }

    #[test]
    fn climb_is_monotonic_and_exact() {
        let log = climb_log(0, 36000);
        assert!(log.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*log.last().unwrap(), 36000);
    }

    #[test]
    fn descent_is_monotonic_and_exact() {
        let log = climb_log(34000, 8000);
        assert!(log.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(*log.last().unwrap(), 8000);
    }

    #[test]
    fn never_overshoots_small_gaps() {
        for gap in 1..50 {
            let up = climb_log(800, 800 + gap);
            assert!(up.iter().all(|&a| a <= 800 + gap));
            let down = climb_log(800, 800 - gap);
            assert!(down.iter().all(|&a| a >= 800 - gap));
        }
    }

    #[test]
    fn first_tick_moves_by_a_twentieth() {
        let mut altimeter = Altimeter::new(100.0, 20);
        altimeter.set_target(36000);
        altimeter.step();
        assert_eq!(altimeter.current(), 1800);
    }

    #[test]
    fn advance_waits_for_full_periods() {
        let mut altimeter = Altimeter::new(100.0, 20);
        altimeter.set_target(1000);
        altimeter.advance(99.0);
        assert_eq!(altimeter.current(), 0);
        altimeter.advance(1.0);
        assert_eq!(altimeter.current(), 50);
        altimeter.advance(250.0);
        assert_eq!(altimeter.current(), 50 + 48 + 46);
    }

    #[test]
    fn labels_switch_to_flight_levels() {
        let mut altimeter = Altimeter::new(100.0, 20);
        assert_eq!(altimeter.label(), "ALT: 0 FT");
        altimeter.current = 8000;
        assert_eq!(altimeter.label(), "ALT: 8000 FT");
        altimeter.current = 17999;
        assert_eq!(altimeter.label(), "ALT: 17999 FT");
        altimeter.current = 34000;
        assert_eq!(altimeter.label(), "ALT: FL340");
        altimeter.current = 35960;
        assert_eq!(altimeter.label(), "ALT: FL360");
    }
}
