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

use wasm_bindgen::prelude::*;

use web_sys::HtmlAudioElement;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Channel {
    Takeoff,
    Turbulence,
    BirdStrike,
    Rain,
    Applause,
    NavigationError,
    Music,
}

pub const CHANNELS: [Channel; 7] = [
    Channel::Takeoff,
    Channel::Turbulence,
    Channel::BirdStrike,
    Channel::Rain,
    Channel::Applause,
    Channel::NavigationError,
    Channel::Music,
];

impl Channel {
    pub fn source(self) -> &'static str {
        match self {
            Channel::Takeoff         => "02_sound_effects/takeoff_sound.mp3",
            Channel::Turbulence      => "02_sound_effects/turbulence_sound.mp3",
            Channel::BirdStrike      => "02_sound_effects/bird_strike_sound.mp3",
            Channel::Rain            => "02_sound_effects/rain_sound.mp3",
            Channel::Applause        => "02_sound_effects/applause_sound.mp3",
            Channel::NavigationError => "02_sound_effects/flight_path_error_sound.mp3",
            Channel::Music           => "03_music/background_music.mp3",
        }
    }

    pub fn gain(self) -> f32 {
        match self {
            Channel::Takeoff         => 0.3,
            Channel::Turbulence      => 0.25,
            Channel::BirdStrike      => 0.4,
            Channel::Rain            => 0.2,
            Channel::Applause        => 0.4,
            Channel::NavigationError => 0.35,
            Channel::Music           => 0.05,
        }
    }

    pub fn is_looping(self) -> bool {
        match self {
            Channel::Turbulence
            | Channel::Rain
            | Channel::NavigationError
            | Channel::Music => true,
            _ => false,
        }
    }
}

/// The two slider scalars, each in 0..=1.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Volumes {
    music: f32,
    fx: f32,
}

impl Default for Volumes {
    fn default() -> Self {
        Self{music: 1.0, fx: 1.0}
    }
}

impl Volumes {
    pub fn set_music(&mut self, value: f32) {
        self.music = clamp_unit(value);
    }

    pub fn set_fx(&mut self, value: f32) {
        self.fx = clamp_unit(value);
    }

    pub fn channel_volume(&self, channel: Channel) -> f32 {
        let scalar = match channel {
            Channel::Music => self.music,
            _ => self.fx,
        };
        channel.gain() * scalar
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0).min(1.0) } else { 1.0 }
}

/// Slider percentage (0..=100) to a volume scalar.
pub fn percent_to_volume(percent: f64) -> f32 {
    clamp_unit((percent / 100.0) as f32)
}

pub struct Mixer {
    channels: Vec<(Channel, HtmlAudioElement)>,
    volumes: Volumes,
    music_started: bool,
    ignore_rejection: Closure<dyn FnMut(JsValue)>,
}

impl Mixer {
    pub fn new() -> Result<Self, JsValue> {
        let channels = CHANNELS.iter()
            .map(|&channel| {
                let element = HtmlAudioElement::new_with_src(channel.source())?;
                element.set_loop(channel.is_looping());
                Ok((channel, element))
            })
            .collect::<Result<Vec<_>, JsValue>>()?;
        let mut mixer = Self{
            channels,
            volumes: Volumes::default(),
            music_started: false,
            ignore_rejection: Closure::wrap(Box::new(|_: JsValue| {}) as Box<dyn FnMut(_)>),
        };
        mixer.apply_volumes();
        Ok(mixer)
    }

    fn element(&self, channel: Channel) -> Option<&HtmlAudioElement> {
        self.channels.iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, element)| element)
    }

    fn apply_volumes(&mut self) {
        for (channel, element) in &self.channels {
            element.set_volume(self.volumes.channel_volume(*channel) as f64);
        }
    }

    pub fn set_music_volume(&mut self, value: f32) {
        self.volumes.set_music(value);
        self.apply_volumes();
    }

    pub fn set_fx_volume(&mut self, value: f32) {
        self.volumes.set_fx(value);
        self.apply_volumes();
    }

    /// Autoplay policies reject `play()` until the page has seen a user
    /// gesture; those rejections are dropped.
    pub fn play(&self, channel: Channel) {
        if let Some(element) = self.element(channel) {
            match element.play() {
                Ok(promise) => { let _ = promise.catch(&self.ignore_rejection); },
                Err(_) => log::debug!("{:?} refused to play", channel),
            }
        }
    }

    pub fn stop(&self, channel: Channel) {
        if let Some(element) = self.element(channel) {
            let _ = element.pause();
            element.set_current_time(0.0);
        }
    }

    pub fn start_music(&mut self) {
        if self.music_started {
            return;
        }
        self.music_started = true;
        self.play(Channel::Music);
    }
}
