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

//! Timed chains of session steps, driven by a virtual clock.

use crate::audio::Channel;

pub type MessageId = u32;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    StartTurbulence,
    Say(&'static str),
    /// first officer response recorded for the given incident
    Companion(usize),
    OpenGate,
    Play(Channel),
    SpawnBirds,
    FadeMessage(MessageId),
    ClearMessage(MessageId),
}

/// One entry of a chain; the delay counts from the previous beat.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Beat {
    pub delay_ms: u32,
    pub step: Step,
}

const fn beat(delay_ms: u32, step: Step) -> Beat {
    Beat{delay_ms, step}
}

pub const TURBULENCE_LINE: &str =
    "Captain, we're experiencing moderate turbulence. Recommend we request a different altitude.";
pub const BIRD_STRIKE_LINE: &str =
    "Captain! Bird strike! Checking all systems... engines look normal, aircraft is stable.";
pub const TOUCHDOWN_LINE: &str =
    "Smooth landing, Captain! Welcome to the gate. Excellent flight management today.";

pub const AFTER_TAKEOFF: &[Beat] = &[
    beat(2000, Step::StartTurbulence),
    beat( 500, Step::Say(TURBULENCE_LINE)),
    beat(1000, Step::OpenGate),
];

pub const TURBULENCE_RESOLVED: &[Beat] = &[
    beat(1500, Step::OpenGate),
    beat(4000, Step::Play(Channel::NavigationError)),
];

pub const NAVIGATION_RESOLVED: &[Beat] = &[
    beat(6000, Step::SpawnBirds),
];

pub const BIRDS_DOWN: &[Beat] = &[
    beat( 800, Step::Say(BIRD_STRIKE_LINE)),
    beat(1500, Step::OpenGate),
];

pub const BIRD_STRIKE_RESOLVED: &[Beat] = &[
    beat(2000, Step::OpenGate),
];

pub const TOUCHDOWN: &[Beat] = &[
    beat(1000, Step::Play(Channel::Applause)),
    beat(   0, Step::Say(TOUCHDOWN_LINE)),
    beat(1500, Step::OpenGate),
];

pub fn companion_chain(incident: usize, delay_ms: u32) -> [Beat; 1] {
    [beat(delay_ms, Step::Companion(incident))]
}

pub fn message_lifetime(id: MessageId, hold_ms: u32, fade_ms: u32) -> [Beat; 2] {
    [
        beat(hold_ms, Step::FadeMessage(id)),
        beat(fade_ms, Step::ClearMessage(id)),
    ]
}

struct Scheduled {
    due_ms: f64,
    step: Step,
}

/// Pending steps sorted by due time; equal due times keep scheduling
/// order. Nothing here is cancellable.
#[derive(Default)]
pub struct Timeline {
    pending: Vec<Scheduled>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, now_ms: f64, chain: &[Beat]) {
        let mut due_ms = now_ms;
        for beat in chain {
            due_ms += beat.delay_ms as f64;
            let at = self.pending.partition_point(|s| s.due_ms <= due_ms);
            self.pending.insert(at, Scheduled{due_ms, step: beat.step});
        }
    }

    /// Removes the earliest step due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(f64, Step)> {
        match self.pending.first() {
            Some(first) if first.due_ms <= now_ms => {
                let Scheduled{due_ms, step} = self.pending.remove(0);
                Some((due_ms, step))
            },
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<f64> {
        self.pending.first().map(|s| s.due_ms)
    }
}
