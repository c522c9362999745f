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

//! The incident/phase state machine.
//!
//! `Session` owns every piece of per-page state. Player input, frames and
//! the clock all come in through methods here; everything the page should
//! do in response goes out as `Cue`s, drained by the web layer.

use crate::altimeter::Altimeter;
use crate::audio::Channel;
use crate::choreography::{self, Beat, MessageId, Step, Timeline};
use crate::config::Config;
use crate::incidents::{Incident, IncidentKind, Phase};
use crate::input::Trigger;
use crate::sky::{Sky, SkyEvent, SweepKind, Viewport};

use log::{debug, info};
use rand::Rng;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    Started,
    StartMusic,
    Phase(Phase),
    /// visibility of the start/continue prompt
    Prompt(bool),
    OpenPanel(usize),
    ClosePanel,
    Feedback{incident: usize, verdict: Verdict},
    Score(u32),
    Play(Channel),
    Stop(Channel),
    Message{id: MessageId, text: String},
    MessageFading(MessageId),
    MessageCleared(MessageId),
    EndScreen{score: u32, completed: u32},
}

/// Incidents unlocked but not yet opened by the player.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Pending {
    pub turbulence: bool,
    pub navigation: bool,
    pub bird_strike: bool,
    pub landing: bool,
}

impl Pending {
    pub fn count(&self) -> usize {
        [self.turbulence, self.navigation, self.bird_strike, self.landing]
            .iter()
            .filter(|&&flag| flag)
            .count()
    }

    /// Consumes the highest-priority flag and names its incident.
    fn take_next(&mut self) -> Option<IncidentKind> {
        if self.landing {
            self.landing = false;
            Some(IncidentKind::Landing)
        } else if self.bird_strike {
            self.bird_strike = false;
            Some(IncidentKind::BirdStrike)
        } else if self.turbulence {
            self.turbulence = false;
            Some(IncidentKind::Turbulence)
        } else if self.navigation {
            self.navigation = false;
            Some(IncidentKind::Navigation)
        } else {
            None
        }
    }
}

pub struct Session {
    config: Config,
    incidents: Vec<Incident>,
    phase: Phase,
    altimeter: Altimeter,
    sky: Sky,
    timeline: Timeline,
    now_ms: f64,
    active_incident: Option<usize>,
    scenario_active: bool,
    answered_correctly: bool,
    attempted_wrong: bool,
    score: u32,
    completed: u32,
    pending: Pending,
    gate: bool,
    companion: Option<usize>,
    started: bool,
    show_end_screen: bool,
    complete: bool,
    next_message: MessageId,
    cues: Vec<Cue>,
}

impl Session {
    pub fn new<R: Rng>(config: Config, incidents: Vec<Incident>, viewport: Viewport, rng: &mut R) -> Self {
        let altimeter = Altimeter::new(config.altitude_period_ms, config.altitude_divisor);
        let sky = Sky::new(viewport, &config, rng);
        Self{
            config,
            incidents,
            phase: Phase::Takeoff,
            altimeter,
            sky,
            timeline: Timeline::new(),
            now_ms: 0.0,
            active_incident: None,
            scenario_active: false,
            answered_correctly: false,
            attempted_wrong: false,
            score: 0,
            completed: 0,
            pending: Pending::default(),
            gate: false,
            companion: None,
            started: false,
            show_end_screen: false,
            complete: false,
            next_message: 0,
            cues: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn score(&self) -> u32 { self.score }
    pub fn completed(&self) -> u32 { self.completed }
    pub fn gate(&self) -> bool { self.gate }
    pub fn pending(&self) -> Pending { self.pending }
    pub fn is_panel_open(&self) -> bool { self.scenario_active }
    pub fn active_incident(&self) -> Option<usize> { self.active_incident }
    pub fn answered_correctly(&self) -> bool { self.answered_correctly }
    pub fn attempted_wrong(&self) -> bool { self.attempted_wrong }
    pub fn is_started(&self) -> bool { self.started }
    pub fn is_complete(&self) -> bool { self.complete }
    pub fn altimeter(&self) -> &Altimeter { &self.altimeter }
    pub fn sky(&self) -> &Sky { &self.sky }
    pub fn now(&self) -> f64 { self.now_ms }

    pub fn incident(&self, index: usize) -> Option<&Incident> {
        self.incidents.get(index)
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::replace(&mut self.cues, Vec::new())
    }

    fn emit(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    fn schedule(&mut self, chain: &[Beat]) {
        self.timeline.schedule(self.now_ms, chain);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("phase {} -> {}", self.phase, phase);
        }
        self.phase = phase;
        self.emit(Cue::Phase(phase));
    }

    fn set_gate(&mut self, open: bool) {
        self.gate = open;
        self.emit(Cue::Prompt(open));
    }

    /// Briefing done: the flight starts on the runway with the gate open.
    pub fn begin(&mut self) {
        if self.started {
            return;
        }
        info!("session started");
        self.started = true;
        self.emit(Cue::Started);
        self.emit(Cue::StartMusic);
        self.set_phase(Phase::Takeoff);
        self.altimeter.set_target(0);
        self.set_gate(true);
    }

    pub fn show_incident_by_index(&mut self, index: usize) {
        let (phase, target_altitude) = match self.incidents.get(index) {
            Some(incident) => (incident.phase, incident.target_altitude),
            None => {
                debug!("ignoring unknown incident {}", index);
                return;
            },
        };

        self.set_gate(false);

        if IncidentKind::from_index(index) == Some(IncidentKind::Navigation) {
            self.emit(Cue::Stop(Channel::NavigationError));
        }

        self.active_incident = Some(index);
        self.scenario_active = true;
        self.answered_correctly = false;
        self.attempted_wrong = false;

        self.set_phase(phase);
        self.altimeter.set_target(target_altitude);

        debug!("incident {} opened", index);
        self.emit(Cue::OpenPanel(index));
    }

    pub fn choose_option(&mut self, option: usize) {
        if !self.scenario_active || self.answered_correctly {
            return;
        }
        let index = match self.active_incident {
            Some(index) => index,
            None => return,
        };
        let (option_count, is_correct) = match self.incidents.get(index) {
            Some(incident) => (incident.options.len(), incident.is_correct(option)),
            None => return,
        };
        if option >= option_count {
            debug!("ignoring option {} of incident {}", option, index);
            return;
        }

        if is_correct {
            self.answered_correctly = true;
            if !self.attempted_wrong {
                self.score += 1;
                let score = self.score;
                self.emit(Cue::Score(score));
            }
            self.emit(Cue::Feedback{incident: index, verdict: Verdict::Correct});
            self.companion = Some(index);
        } else {
            self.attempted_wrong = true;
            self.emit(Cue::Feedback{incident: index, verdict: Verdict::Incorrect});
        }
    }

    pub fn close_incident(&mut self) {
        if !self.scenario_active {
            return;
        }
        let closed = self.active_incident.take();
        self.scenario_active = false;
        self.completed += 1;
        self.emit(Cue::ClosePanel);
        self.set_gate(false);

        match closed.and_then(IncidentKind::from_index) {
            Some(IncidentKind::Takeoff) => {
                self.sky.start_sweep(SweepKind::Takeoff);
                self.emit(Cue::Play(Channel::Takeoff));
            },
            Some(IncidentKind::Turbulence) => {
                self.sky.set_turbulence(false);
                self.pending.navigation = true;
                self.emit(Cue::Stop(Channel::Turbulence));
                self.schedule(choreography::TURBULENCE_RESOLVED);
            },
            Some(IncidentKind::Navigation) => {
                let flock = self.sky.flock();
                if !flock.is_spawned() && !flock.is_settled() {
                    self.schedule(choreography::NAVIGATION_RESOLVED);
                }
            },
            Some(IncidentKind::BirdStrike) => {
                self.sky.flock_mut().reset();
                self.pending.bird_strike = false;
                self.pending.landing = true;
                self.sky.clouds_mut().set_active(false);
                self.sky.rain_mut().set_active(true);
                self.emit(Cue::Play(Channel::Rain));
                self.schedule(choreography::BIRD_STRIKE_RESOLVED);
            },
            Some(IncidentKind::Landing) => {
                self.sky.start_sweep(SweepKind::Landing);
            },
            None => {},
        }

        if let Some(companion) = self.companion.take() {
            let chain = choreography::companion_chain(companion, self.config.companion_delay_ms);
            self.schedule(&chain);
        }
    }

    /// Returns true if the trigger did something.
    pub fn trigger(&mut self, trigger: Trigger) -> bool {
        if self.scenario_active {
            if self.answered_correctly {
                self.close_incident();
                return true;
            }
            return false;
        }
        if trigger != Trigger::Action {
            return false;
        }
        if !self.gate || self.complete || !self.started {
            return false;
        }

        if self.show_end_screen {
            info!("flight complete: {} of {}", self.score, self.completed);
            self.complete = true;
            self.set_gate(false);
            let (score, completed) = (self.score, self.completed);
            self.emit(Cue::EndScreen{score, completed});
            return true;
        }

        let next = if self.phase == Phase::Takeoff {
            Some(IncidentKind::Takeoff)
        } else {
            self.pending.take_next()
        };
        match next {
            Some(kind) => {
                self.emit(Cue::StartMusic);
                self.show_incident_by_index(kind.index());
                true
            },
            None => false,
        }
    }

    fn show_message(&mut self, text: String) {
        let id = self.next_message;
        self.next_message += 1;
        self.emit(Cue::Message{id, text});
        let lifetime = choreography::message_lifetime(id,
            self.config.message_hold_ms,
            self.config.message_fade_ms);
        self.schedule(&lifetime);
    }

    fn apply_step<R: Rng>(&mut self, step: Step, rng: &mut R) {
        match step {
            Step::StartTurbulence => {
                self.sky.set_turbulence(true);
                self.pending.turbulence = true;
                self.emit(Cue::Play(Channel::Turbulence));
            },
            Step::Say(text) => self.show_message(text.to_string()),
            Step::Companion(index) => {
                if let Some(text) = self.incidents.get(index).map(|i| i.companion.clone()) {
                    self.show_message(text);
                }
            },
            Step::OpenGate => {
                if self.scenario_active || self.sky.sweep().is_some() || self.complete {
                    debug!("gate stays closed");
                } else {
                    self.set_gate(true);
                }
            },
            Step::Play(channel) => self.emit(Cue::Play(channel)),
            Step::SpawnBirds => {
                if self.sky.spawn_birds(rng) {
                    info!("bird strike inbound");
                    self.emit(Cue::Play(Channel::BirdStrike));
                }
            },
            Step::FadeMessage(id) => self.emit(Cue::MessageFading(id)),
            Step::ClearMessage(id) => self.emit(Cue::MessageCleared(id)),
        }
    }

    /// Fires every step due by `now_ms`, then eases the altimeter.
    pub fn advance_clock<R: Rng>(&mut self, now_ms: f64, rng: &mut R) {
        if !(now_ms >= self.now_ms) {
            return;
        }
        let dt_ms = now_ms - self.now_ms;
        while let Some((due_ms, step)) = self.timeline.pop_due(now_ms) {
            self.now_ms = due_ms;
            self.apply_step(step, rng);
        }
        self.now_ms = now_ms;
        self.altimeter.advance(dt_ms);
    }

    /// One render tick of the simulation.
    pub fn frame<R: Rng>(&mut self, rng: &mut R) {
        if !self.started {
            return;
        }
        for event in self.sky.step(rng) {
            match event {
                SkyEvent::CloudsOn => debug!("clouds on"),
                SkyEvent::SweepFinished(SweepKind::Takeoff) => {
                    self.set_phase(Phase::Cruise);
                    self.schedule(choreography::AFTER_TAKEOFF);
                },
                SkyEvent::SweepFinished(SweepKind::Landing) => {
                    self.set_phase(Phase::Landing);
                    self.show_end_screen = true;
                    self.emit(Cue::Stop(Channel::Rain));
                    self.schedule(choreography::TOUCHDOWN);
                },
                SkyEvent::BirdsDown => {
                    self.pending.bird_strike = true;
                    self.schedule(choreography::BIRDS_DOWN);
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::choreography::{BIRD_STRIKE_LINE, TOUCHDOWN_LINE, TURBULENCE_LINE};
    use crate::incidents::builtin_incidents;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FRAME_MS: f64 = 16.0;

    fn session() -> (Session, StdRng) {
        let mut rng = StdRng::seed_from_u64(0xc0c4_9177);
        let incidents = builtin_incidents().expect("embedded incidents should load");
        let session = Session::new(Config::default(), incidents, Viewport::new(160.0, 40.0), &mut rng);
        (session, rng)
    }

    fn check_invariants(session: &Session) {
        if session.is_panel_open() || session.sky().sweep().is_some() {
            assert!(!session.gate(), "gate open during panel or sweep");
        }
        assert!(session.pending().count() <= 1, "pending flags overlap: {:?}", session.pending());
        if !session.sky().flock().crashes().is_empty() {
            assert!(session.sky().flock().is_spawned());
        }
    }

    /// Runs frames until `done` holds, collecting every cue on the way.
    fn run_until<F>(session: &mut Session, rng: &mut StdRng, done: F) -> Vec<Cue>
    where
        F: Fn(&Session) -> bool
    {
        let mut cues = Vec::new();
        for _ in 0..20_000 {
            let now = session.now() + FRAME_MS;
            session.advance_clock(now, rng);
            session.frame(rng);
            check_invariants(session);
            cues.extend(session.drain_cues());
            if done(session) {
                return cues;
            }
        }
        panic!("condition never reached");
    }

    fn answer_and_dismiss(session: &mut Session, option: usize) {
        session.choose_option(option);
        assert!(session.trigger(Trigger::Dismiss));
        assert!(!session.is_panel_open());
    }

    fn messages(cues: &[Cue]) -> Vec<String> {
        cues.iter()
            .filter_map(|cue| match cue {
                Cue::Message{text, ..} => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn nothing_happens_before_the_briefing() {
        let (mut session, mut rng) = session();
        assert!(!session.trigger(Trigger::Action));
        session.frame(&mut rng);
        assert!(session.sky().sweep().is_none());
        assert!(session.drain_cues().is_empty());
    }

    #[test]
    fn begin_opens_the_gate_on_the_runway() {
        let (mut session, _) = session();
        session.begin();
        assert!(session.gate());
        assert_eq!(session.phase(), Phase::Takeoff);
        assert_eq!(session.drain_cues(), vec![
            Cue::Started,
            Cue::StartMusic,
            Cue::Phase(Phase::Takeoff),
            Cue::Prompt(true),
        ]);
        session.begin();
        assert!(session.drain_cues().is_empty());
    }

    #[test]
    fn wrong_then_right_scores_nothing() {
        let (mut session, _) = session();
        session.begin();
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(0));
        session.drain_cues();

        session.choose_option(0);
        session.choose_option(1);
        assert_eq!(session.drain_cues(), vec![
            Cue::Feedback{incident: 0, verdict: Verdict::Incorrect},
            Cue::Feedback{incident: 0, verdict: Verdict::Correct},
        ]);
        assert_eq!(session.score(), 0);
        assert!(session.answered_correctly());
        assert!(session.attempted_wrong());
    }

    #[test]
    fn right_first_scores_one() {
        let (mut session, _) = session();
        session.begin();
        session.trigger(Trigger::Action);
        session.drain_cues();

        session.choose_option(1);
        assert_eq!(session.drain_cues(), vec![
            Cue::Score(1),
            Cue::Feedback{incident: 0, verdict: Verdict::Correct},
        ]);
        assert_eq!(session.score(), 1);

        session.choose_option(1);
        session.choose_option(0);
        assert!(session.drain_cues().is_empty());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn repeated_wrong_answers_keep_the_panel_open() {
        let (mut session, _) = session();
        session.begin();
        session.trigger(Trigger::Action);
        session.choose_option(0);
        session.choose_option(2);
        assert!(session.is_panel_open());
        assert!(!session.trigger(Trigger::Dismiss));
        assert!(!session.trigger(Trigger::Action));
        assert!(session.is_panel_open());
        session.choose_option(7);
        assert!(!session.answered_correctly());
    }

    #[test]
    fn unknown_incident_is_ignored() {
        let (mut session, _) = session();
        session.begin();
        session.drain_cues();
        session.show_incident_by_index(5);
        assert!(!session.is_panel_open());
        assert!(session.gate());
        assert!(session.drain_cues().is_empty());
    }

    #[test]
    fn opening_sets_phase_and_altitude_target() {
        let (mut session, mut rng) = session();
        session.begin();
        session.show_incident_by_index(1);
        assert_eq!(session.phase(), Phase::Cruise);
        assert_eq!(session.altimeter().target(), 36000);
        assert!(!session.gate());
        session.advance_clock(60_000.0, &mut rng);
        assert_eq!(session.altimeter().current(), 36000);
        assert_eq!(session.altimeter().label(), "ALT: FL360");
    }

    #[test]
    fn opening_navigation_silences_the_error_loop() {
        let (mut session, _) = session();
        session.begin();
        session.drain_cues();
        session.show_incident_by_index(2);
        let cues = session.drain_cues();
        assert!(cues.contains(&Cue::Stop(Channel::NavigationError)));
        assert_eq!(cues.last(), Some(&Cue::OpenPanel(2)));
    }

    #[test]
    fn closing_takeoff_sweeps_with_the_gate_shut() {
        let (mut session, mut rng) = session();
        session.begin();
        session.trigger(Trigger::Action);
        answer_and_dismiss(&mut session, 1);
        assert!(!session.gate());
        assert!(session.sky().sweep().is_some());
        assert!(session.drain_cues().contains(&Cue::Play(Channel::Takeoff)));

        assert!(!session.trigger(Trigger::Action));
        session.advance_clock(1500.0, &mut rng);
        let cues = session.drain_cues();
        assert_eq!(messages(&cues), vec![session.incident(0).unwrap().companion.clone()]);
        assert_eq!(session.phase(), Phase::Takeoff);
    }

    #[test]
    fn gate_stays_shut_while_a_panel_is_open() {
        let (mut session, mut rng) = session();
        session.begin();
        session.show_incident_by_index(1);
        session.choose_option(0);
        session.close_incident();
        assert!(session.pending().navigation);

        // reopening out of band before the deferred gate fires
        session.show_incident_by_index(1);
        session.advance_clock(5_000.0, &mut rng);
        assert!(!session.gate());
        assert!(session.is_panel_open());
    }

    #[test]
    fn pending_priority_prefers_landing() {
        let (mut session, _) = session();
        session.begin();
        session.phase = Phase::Cruise;
        session.pending.turbulence = true;
        session.pending.landing = true;
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(4));
        assert_eq!(session.pending(), Pending{turbulence: true, ..Pending::default()});
    }

    #[test]
    fn message_lifetime_follows_config() {
        let (mut session, mut rng) = session();
        session.show_message("hello".to_string());
        assert_eq!(session.drain_cues(), vec![Cue::Message{id: 0, text: "hello".to_string()}]);
        session.advance_clock(3_999.0, &mut rng);
        assert!(session.drain_cues().is_empty());
        session.advance_clock(4_000.0, &mut rng);
        assert_eq!(session.drain_cues(), vec![Cue::MessageFading(0)]);
        session.advance_clock(4_500.0, &mut rng);
        assert_eq!(session.drain_cues(), vec![Cue::MessageCleared(0)]);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let (mut session, mut rng) = session();
        session.advance_clock(100.0, &mut rng);
        session.advance_clock(50.0, &mut rng);
        assert_eq!(session.now(), 100.0);
    }

    #[test]
    fn full_flight() {
        let (mut session, mut rng) = session();
        session.begin();

        // takeoff
        assert!(session.trigger(Trigger::Action));
        answer_and_dismiss(&mut session, 1);
        let cues = run_until(&mut session, &mut rng, |s| s.gate());
        assert_eq!(session.phase(), Phase::Cruise);
        assert!(session.sky().clouds().is_active());
        assert!(session.sky().turbulence());
        assert_eq!(session.pending(), Pending{turbulence: true, ..Pending::default()});
        assert!(cues.contains(&Cue::Play(Channel::Turbulence)));
        assert!(messages(&cues).contains(&TURBULENCE_LINE.to_string()));

        // turbulence
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(1));
        assert_eq!(session.pending().count(), 0);
        answer_and_dismiss(&mut session, 0);
        assert!(!session.sky().turbulence());
        assert!(session.pending().navigation);
        let cues = run_until(&mut session, &mut rng, |s| s.gate());
        assert!(!cues.contains(&Cue::Play(Channel::NavigationError)));

        // navigation; the error loop starts while the gate is already open
        let gate_opened = session.now();
        let cues = run_until(&mut session, &mut rng, move |s| s.now() >= gate_opened + 4_000.0);
        assert!(cues.contains(&Cue::Play(Channel::NavigationError)));
        assert!(session.gate());
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(2));
        answer_and_dismiss(&mut session, 0);
        let cues = run_until(&mut session, &mut rng, |s| s.gate());
        assert!(cues.contains(&Cue::Play(Channel::BirdStrike)));
        assert!(messages(&cues).contains(&BIRD_STRIKE_LINE.to_string()));
        assert!(session.pending().bird_strike);
        assert_eq!(session.sky().flock().crashes().len(), 3);

        // bird strike
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(3));
        assert_eq!(session.phase(), Phase::Descent);
        answer_and_dismiss(&mut session, 0);
        assert!(session.sky().flock().crashes().is_empty());
        assert!(session.sky().rain().is_active());
        assert!(!session.sky().clouds().is_active());
        assert!(session.pending().landing);
        run_until(&mut session, &mut rng, |s| s.gate());
        assert_eq!(session.sky().rain().drops().len(), 100);

        // landing
        assert!(session.trigger(Trigger::Action));
        assert_eq!(session.active_incident(), Some(4));
        assert_eq!(session.phase(), Phase::Approach);
        answer_and_dismiss(&mut session, 0);
        let cues = run_until(&mut session, &mut rng, |s| s.gate());
        assert_eq!(session.phase(), Phase::Landing);
        assert!(cues.contains(&Cue::Stop(Channel::Rain)));
        assert!(cues.contains(&Cue::Play(Channel::Applause)));
        assert!(messages(&cues).contains(&TOUCHDOWN_LINE.to_string()));

        // end screen
        assert!(session.trigger(Trigger::Action));
        assert!(session.is_complete());
        assert!(!session.gate());
        assert_eq!(session.drain_cues().last(), Some(&Cue::EndScreen{score: 5, completed: 5}));
        assert!(!session.trigger(Trigger::Action));
    }
}
