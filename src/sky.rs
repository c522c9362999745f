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

use crate::config::Config;

use cgmath::prelude::*;
use rand::prelude::*;

use cgmath::{Point2, Vector2};

pub const CLOUD_RECYCLE_DEPTH: f32 = 0.05;
pub const BIRD_CRASH_DEPTH: f32 = 0.25;
pub const CLOUD_VARIANTS: usize = 2;
pub const BIRD_FRAMES: usize = 3;
const BIRD_FRAME_TICKS: u32 = 8;
const RAIN_SLANT: f32 = 0.577;
const RAIN_MARGIN: f32 = 50.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self{width, height}
    }
}

/// Screen-space rectangle centered on `center`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quad {
    pub center: Point2<f32>,
    pub size: Vector2<f32>,
}

impl Quad {
    /// Loose cull: the quad is kept if any part of a box twice its size
    /// overlaps the viewport.
    pub fn is_visible(&self, viewport: &Viewport) -> bool {
        let Quad{center, size} = *self;
        !(center.x + size.x < 0.0
            || center.x - size.x > viewport.width
            || center.y - size.y > viewport.height
            || center.y + size.y < 0.0)
    }
}

/// Pinhole projection shared by clouds and birds, differing only in
/// constants.
#[derive(Copy, Clone, Debug)]
pub struct Projection {
    /// horizontal spread as a fraction of viewport width
    pub spread_x: f32,
    /// vertical spread as a fraction of viewport height
    pub spread_y: f32,
    /// reference line as a fraction of viewport height
    pub reference_y: f32,
    pub scale: f32,
    pub aspect: Vector2<f32>,
}

pub const CLOUD_PROJECTION: Projection = Projection{
    spread_x: 0.4,
    spread_y: 0.8,
    reference_y: 0.45,
    scale: 12.0,
    aspect: Vector2{x: 4.0, y: 2.0},
};

pub const BIRD_PROJECTION: Projection = Projection{
    spread_x: 0.3,
    spread_y: 0.6,
    reference_y: 0.35,
    scale: 18.0,
    aspect: Vector2{x: 4.0, y: 4.0},
};

impl Projection {
    pub fn project(&self, viewport: &Viewport, pos: Point2<f32>, z: f32) -> Quad {
        let scale = self.scale / z;
        let center = Point2::new(
            viewport.width / 2.0 + pos.x * viewport.width * self.spread_x / z,
            viewport.height * self.reference_y + pos.y * viewport.height * self.spread_y / z);
        Quad{
            center,
            size: self.aspect * scale,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cloud {
    pub pos: Point2<f32>,
    pub z: f32,
    pub speed: f32,
    pub variant: usize,
}

impl Cloud {
    fn spawn<R: Rng>(rng: &mut R) -> Self {
        let mut cloud = Cloud{
            pos: Point2::origin(),
            z: 1.0,
            speed: 0.0,
            variant: 0,
        };
        cloud.recycle(rng);
        cloud
    }

    /// Re-randomizes in place. Depth lands in (0.1, 1.0].
    fn recycle<R: Rng>(&mut self, rng: &mut R) {
        self.pos = Point2::new(rng.gen_range(-1.0, 1.0), rng.gen_range(-0.1, 0.5));
        self.z = 1.0 - rng.gen::<f32>() * 0.9;
        self.speed = (1.0 - self.z) * 0.004 + 0.0008;
        self.variant = rng.gen_range(0, CLOUD_VARIANTS);
    }
}

pub struct CloudField {
    clouds: Vec<Cloud>,
    active: bool,
}

impl CloudField {
    pub fn new<R: Rng>(count: usize, rng: &mut R) -> Self {
        Self{
            clouds: (0..count).map(|_| Cloud::spawn(rng)).collect(),
            active: false,
        }
    }

    pub fn is_active(&self) -> bool { self.active }
    pub fn set_active(&mut self, active: bool) { self.active = active; }
    pub fn clouds(&self) -> &[Cloud] { &self.clouds }

    pub fn step<R: Rng>(&mut self, rng: &mut R) {
        if !self.active {
            return;
        }
        for cloud in &mut self.clouds {
            cloud.z -= cloud.speed;
            if cloud.z <= CLOUD_RECYCLE_DEPTH {
                cloud.recycle(rng);
            }
        }
    }

    /// On-screen clouds with their sprite variant.
    pub fn visible<'a>(&'a self, viewport: &'a Viewport) -> impl Iterator<Item = (usize, Quad)> + 'a {
        self.clouds.iter()
            .map(move |cloud| (cloud.variant, CLOUD_PROJECTION.project(viewport, cloud.pos, cloud.z)))
            .filter(move |(_, quad)| quad.is_visible(viewport))
    }
}

#[derive(Clone, Debug)]
pub struct Bird {
    pub pos: Point2<f32>,
    pub z: f32,
    pub speed: f32,
    pub frame: usize,
    frame_tick: u32,
    pub crashed: bool,
    /// where the bird was drawn on the latest step, if it was still flying
    pub quad: Option<Quad>,
}

impl Bird {
    fn spawn<R: Rng>(rng: &mut R) -> Self {
        let center_x = if rng.gen_bool(0.5) { -0.15 } else { 0.15 };
        Bird{
            pos: Point2::new(
                center_x + (rng.gen::<f32>() - 0.5) * 0.12,
                rng.gen_range(-0.1, 0.0)),
            z: 1.6 + rng.gen::<f32>() * 0.6,
            speed: 0.006 + rng.gen::<f32>() * 0.0002,
            frame: 0,
            frame_tick: 0,
            crashed: false,
            quad: None,
        }
    }
}

/// Birds of one strike plus the splat markers they leave behind.
#[derive(Default)]
pub struct Flock {
    birds: Vec<Bird>,
    crashes: Vec<Point2<f32>>,
    spawned: bool,
    settled: bool,
}

impl Flock {
    pub fn birds(&self) -> &[Bird] { &self.birds }
    pub fn crashes(&self) -> &[Point2<f32>] { &self.crashes }
    pub fn is_spawned(&self) -> bool { self.spawned }
    pub fn is_settled(&self) -> bool { self.settled }

    /// Returns false if a strike is already underway or finished.
    pub fn spawn<R: Rng>(&mut self, count: usize, rng: &mut R) -> bool {
        if self.spawned || self.settled {
            return false;
        }
        self.spawned = true;
        self.birds = (0..count).map(|_| Bird::spawn(rng)).collect();
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns true once, on the first step that finds every bird down.
    fn step(&mut self, viewport: &Viewport) -> bool {
        if !self.spawned {
            return false;
        }
        let all_down = self.birds.iter().all(|bird| bird.crashed);
        for bird in self.birds.iter_mut() {
            if bird.crashed {
                bird.quad = None;
                continue;
            }
            bird.z -= bird.speed;
            let quad = BIRD_PROJECTION.project(viewport, bird.pos, bird.z);
            bird.quad = Some(quad);
            bird.frame_tick += 1;
            if bird.frame_tick >= BIRD_FRAME_TICKS {
                bird.frame = (bird.frame + 1) % BIRD_FRAMES;
                bird.frame_tick = 0;
            }
            if bird.z <= BIRD_CRASH_DEPTH {
                self.crashes.push(quad.center);
                bird.crashed = true;
            }
        }
        if all_down && !self.settled {
            self.settled = true;
            return true;
        }
        false
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Raindrop {
    pub pos: Point2<f32>,
    pub speed: f32,
    pub length: f32,
}

impl Raindrop {
    /// Far end of the streak.
    pub fn tail(&self) -> Point2<f32> {
        self.pos + Vector2::new(self.length * RAIN_SLANT, self.length)
    }
}

pub struct Rain {
    drops: Vec<Raindrop>,
    capacity: usize,
    active: bool,
}

impl Rain {
    pub fn new(capacity: usize) -> Self {
        Self{
            drops: Vec::with_capacity(capacity),
            capacity,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool { self.active }
    pub fn set_active(&mut self, active: bool) { self.active = active; }
    pub fn drops(&self) -> &[Raindrop] { &self.drops }

    fn replenish<R: Rng>(&mut self, viewport: &Viewport, rng: &mut R) {
        while self.drops.len() < self.capacity {
            self.drops.push(Raindrop{
                pos: Point2::new(
                    rng.gen::<f32>() * viewport.width,
                    rng.gen::<f32>() * viewport.height - viewport.height),
                speed: rng.gen_range(8.0, 12.0),
                length: rng.gen_range(15.0, 25.0),
            });
        }
    }

    pub fn step<R: Rng>(&mut self, viewport: &Viewport, rng: &mut R) {
        if !self.active {
            return;
        }
        let floor = viewport.height + RAIN_MARGIN;
        for drop in &mut self.drops {
            drop.pos = drop.pos + Vector2::new(drop.speed * RAIN_SLANT, drop.speed);
        }
        self.drops.retain(|drop| drop.pos.y <= floor);
        self.replenish(viewport, rng);
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SweepKind {
    Takeoff,
    Landing,
}

/// Background slide between two scenes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sweep {
    pub kind: SweepKind,
    pub offset: f32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SkyEvent {
    CloudsOn,
    SweepFinished(SweepKind),
    BirdsDown,
}

pub struct Sky {
    viewport: Viewport,
    sweep_speed: f32,
    shake_amplitude: f32,
    birds_per_strike: usize,
    clouds: CloudField,
    flock: Flock,
    rain: Rain,
    sweep: Option<Sweep>,
    turbulence: bool,
    shake: Vector2<f32>,
}

impl Sky {
    pub fn new<R: Rng>(viewport: Viewport, config: &Config, rng: &mut R) -> Self {
        Self{
            viewport,
            sweep_speed: config.sweep_speed,
            shake_amplitude: config.shake_amplitude,
            birds_per_strike: config.birds_per_strike,
            clouds: CloudField::new(config.cloud_count, rng),
            flock: Flock::default(),
            rain: Rain::new(config.rain_drops),
            sweep: None,
            turbulence: false,
            shake: Vector2::zero(),
        }
    }

    pub fn viewport(&self) -> &Viewport { &self.viewport }
    pub fn clouds(&self) -> &CloudField { &self.clouds }
    pub fn clouds_mut(&mut self) -> &mut CloudField { &mut self.clouds }
    pub fn flock(&self) -> &Flock { &self.flock }
    pub fn flock_mut(&mut self) -> &mut Flock { &mut self.flock }
    pub fn rain(&self) -> &Rain { &self.rain }
    pub fn rain_mut(&mut self) -> &mut Rain { &mut self.rain }
    pub fn sweep(&self) -> Option<Sweep> { self.sweep }
    pub fn shake(&self) -> Vector2<f32> { self.shake }
    pub fn turbulence(&self) -> bool { self.turbulence }

    pub fn set_turbulence(&mut self, active: bool) {
        self.turbulence = active;
        if !active {
            self.shake = Vector2::zero();
        }
    }

    pub fn start_sweep(&mut self, kind: SweepKind) {
        self.sweep = Some(Sweep{kind, offset: 0.0});
    }

    pub fn spawn_birds<R: Rng>(&mut self, rng: &mut R) -> bool {
        self.flock.spawn(self.birds_per_strike, rng)
    }

    fn step_sweep(&mut self, events: &mut Vec<SkyEvent>) {
        let height = self.viewport.height;
        if let Some(sweep) = &mut self.sweep {
            sweep.offset += self.sweep_speed;
            if sweep.kind == SweepKind::Takeoff
                && sweep.offset >= height / 4.0
                && !self.clouds.is_active()
            {
                self.clouds.set_active(true);
                events.push(SkyEvent::CloudsOn);
            }
            if sweep.offset >= height {
                events.push(SkyEvent::SweepFinished(sweep.kind));
                self.sweep = None;
            }
        }
    }

    /// Advances everything by one frame.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Vec<SkyEvent> {
        let mut events = Vec::new();

        self.shake = if self.turbulence {
            let half = self.shake_amplitude / 2.0;
            if half > 0.0 {
                Vector2::new(rng.gen_range(-half, half), rng.gen_range(-half, half))
            } else {
                Vector2::zero()
            }
        } else {
            Vector2::zero()
        };

        self.step_sweep(&mut events);
        self.clouds.step(rng);
        if self.flock.step(&self.viewport) {
            events.push(SkyEvent::BirdsDown);
        }
        self.rain.step(&self.viewport, rng);

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed_c10d)
    }

    fn viewport() -> Viewport {
        Viewport::new(960.0, 540.0)
    }

    fn assert_near(actual: Point2<f32>, expected: Point2<f32>) {
        assert!((actual - expected).magnitude() < 1e-3,
            "expected {:?}, got {:?}", expected, actual);
    }

    #[test]
    fn projection_matches_parallax_law() {
        let vp = viewport();
        let quad = CLOUD_PROJECTION.project(&vp, Point2::new(0.5, 0.25), 0.5);
        assert_near(quad.center, Point2::new(480.0 + 384.0, 243.0 + 216.0));
        assert_eq!(quad.size, Vector2::new(96.0, 48.0));

        let quad = BIRD_PROJECTION.project(&vp, Point2::new(0.0, 0.0), 2.0);
        assert_near(quad.center, Point2::new(480.0, 189.0));
        assert_eq!(quad.size, Vector2::new(36.0, 36.0));
    }

    #[test]
    fn offscreen_quads_are_culled() {
        let vp = viewport();
        let quad = |x, y| Quad{center: Point2::new(x, y), size: Vector2::new(10.0, 10.0)};
        assert!(quad(480.0, 270.0).is_visible(&vp));
        assert!(quad(-9.0, 270.0).is_visible(&vp));
        assert!(!quad(-11.0, 270.0).is_visible(&vp));
        assert!(!quad(971.0, 270.0).is_visible(&vp));
        assert!(!quad(480.0, 551.0).is_visible(&vp));
        assert!(!quad(480.0, -11.0).is_visible(&vp));
    }

    #[test]
    fn clouds_never_rest_at_or_below_recycle_depth() {
        let mut rng = rng();
        let mut field = CloudField::new(40, &mut rng);
        field.set_active(true);
        for cloud in field.clouds() {
            assert!(cloud.z > 0.1 && cloud.z <= 1.0);
        }
        for _ in 0..2000 {
            field.step(&mut rng);
            assert_eq!(field.clouds().len(), 40);
            for cloud in field.clouds() {
                assert!(cloud.z > CLOUD_RECYCLE_DEPTH, "depth {} escaped recycling", cloud.z);
                assert!(cloud.z <= 1.0);
                assert!(cloud.variant < CLOUD_VARIANTS);
            }
        }
    }

    #[test]
    fn closer_clouds_move_faster() {
        let mut rng = rng();
        let field = CloudField::new(40, &mut rng);
        let mut clouds = field.clouds().to_vec();
        clouds.sort_by(|a, b| a.z.partial_cmp(&b.z).unwrap());
        assert!(clouds.windows(2).all(|w| w[0].speed >= w[1].speed));
    }

    #[test]
    fn idle_clouds_hold_still() {
        let mut rng = rng();
        let mut field = CloudField::new(4, &mut rng);
        let before: Vec<f32> = field.clouds().iter().map(|c| c.z).collect();
        field.step(&mut rng);
        let after: Vec<f32> = field.clouds().iter().map(|c| c.z).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn rain_pool_stays_full() {
        let vp = viewport();
        let mut rng = rng();
        let mut rain = Rain::new(100);
        rain.step(&vp, &mut rng);
        assert!(rain.drops().is_empty());

        rain.set_active(true);
        for _ in 0..500 {
            rain.step(&vp, &mut rng);
            assert_eq!(rain.drops().len(), 100);
            assert!(rain.drops().iter().all(|d| d.pos.y <= vp.height + RAIN_MARGIN));
        }
    }

    #[test]
    fn raindrops_fall_on_a_slant() {
        let vp = viewport();
        let mut rng = rng();
        let mut rain = Rain::new(1);
        rain.set_active(true);
        rain.step(&vp, &mut rng);
        let before = rain.drops()[0];
        rain.step(&vp, &mut rng);
        let after = rain.drops()[0];
        assert!((after.pos.y - before.pos.y - before.speed).abs() < 1e-3);
        assert!((after.pos.x - before.pos.x - before.speed * RAIN_SLANT).abs() < 1e-3);
    }

    #[test]
    fn flock_crashes_then_settles_once() {
        let vp = viewport();
        let mut rng = rng();
        let mut flock = Flock::default();
        assert!(flock.spawn(3, &mut rng));
        assert!(!flock.spawn(3, &mut rng));
        assert_eq!(flock.birds().len(), 3);

        let mut settled_at = None;
        for tick in 0..1000 {
            if flock.step(&vp) {
                assert!(settled_at.is_none());
                settled_at = Some(tick);
            }
        }
        assert!(settled_at.is_some());
        assert_eq!(flock.crashes().len(), 3);
        assert!(flock.birds().iter().all(|b| b.crashed && b.quad.is_none()));

        assert!(!flock.spawn(3, &mut rng));
        flock.reset();
        assert!(flock.crashes().is_empty());
        assert!(flock.spawn(3, &mut rng));
    }

    #[test]
    fn bird_frames_cycle_every_eight_ticks() {
        let vp = viewport();
        let mut rng = rng();
        let mut flock = Flock::default();
        flock.spawn(1, &mut rng);
        for _ in 0..7 {
            flock.step(&vp);
        }
        assert_eq!(flock.birds()[0].frame, 0);
        flock.step(&vp);
        assert_eq!(flock.birds()[0].frame, 1);
        for _ in 0..16 {
            flock.step(&vp);
        }
        assert_eq!(flock.birds()[0].frame, 0);
    }

    #[test]
    fn takeoff_sweep_wakes_clouds_at_a_quarter() {
        let mut rng = rng();
        let config = Config::default();
        let mut sky = Sky::new(Viewport::new(100.0, 40.0), &config, &mut rng);
        sky.start_sweep(SweepKind::Takeoff);

        let mut log = Vec::new();
        for frame in 1..=80 {
            for event in sky.step(&mut rng) {
                log.push((frame, event));
            }
        }
        assert_eq!(log, vec![
            (20, SkyEvent::CloudsOn),
            (80, SkyEvent::SweepFinished(SweepKind::Takeoff)),
        ]);
        assert_eq!(sky.sweep(), None);
        assert!(sky.clouds().is_active());
    }

    #[test]
    fn landing_sweep_leaves_clouds_alone() {
        let mut rng = rng();
        let config = Config::default();
        let mut sky = Sky::new(Viewport::new(100.0, 40.0), &config, &mut rng);
        sky.start_sweep(SweepKind::Landing);
        let events: Vec<SkyEvent> = (0..80).flat_map(|_| sky.step(&mut rng)).collect();
        assert_eq!(events, vec![SkyEvent::SweepFinished(SweepKind::Landing)]);
        assert!(!sky.clouds().is_active());
    }

    #[test]
    fn shake_stays_in_range_and_stops() {
        let mut rng = rng();
        let config = Config::default();
        let mut sky = Sky::new(viewport(), &config, &mut rng);
        sky.set_turbulence(true);
        for _ in 0..200 {
            sky.step(&mut rng);
            let shake = sky.shake();
            assert!(shake.x >= -4.0 && shake.x < 4.0);
            assert!(shake.y >= -4.0 && shake.y < 4.0);
        }
        sky.set_turbulence(false);
        sky.step(&mut rng);
        assert_eq!(sky.shake(), Vector2::zero());
    }
}
