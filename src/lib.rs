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

extern crate cgmath;
extern crate console_error_panic_hook;
extern crate js_sys;
extern crate log;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate thiserror;
extern crate wasm_bindgen;
extern crate web_sys;

use wasm_bindgen::prelude::*;

use log::{debug, Level, LevelFilter, Metadata, Record};
use rand::rngs::ThreadRng;
use wasm_bindgen::JsCast;
use web_sys::{
    Element,
    Event,
    EventTarget,
    KeyboardEvent,
};

#[wasm_bindgen]
extern {
    #[wasm_bindgen(js_namespace = console)]
    fn log(_: &str);
    #[wasm_bindgen(js_namespace = console)]
    fn warn(_: &str);
    #[wasm_bindgen(js_namespace = console)]
    fn error(_: &str);
}

mod altimeter;
mod audio;
mod choreography;
mod config;
mod incidents;
mod input;
mod render;
mod session;
mod sky;
mod ui;

use audio::{percent_to_volume, Mixer};
use choreography::MessageId;
use config::Config;
use incidents::builtin_incidents;
use input::{KeyBinds, Trigger};
use render::{Painter, Sprites};
use session::{Cue, Session, Verdict};
use sky::Viewport;
use ui::{get_ui, UI};

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => error(&line),
            Level::Warn  => warn(&line),
            _            => log(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn js_error<E: Display>(err: E) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn report(result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::error!("{:?}", err);
    }
}

fn show(element: &Element) -> Result<(), JsValue> {
    element.class_list().remove_1("cockpit_hidden")
}

fn hide(element: &Element) -> Result<(), JsValue> {
    element.class_list().add_1("cockpit_hidden")
}

fn listen<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static
{
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

struct Application {
    ui: UI,
    session: Session,
    painter: Painter,
    mixer: Mixer,
    binds: KeyBinds,
    rng: ThreadRng,
    messages: Vec<(MessageId, Element)>,
    altitude_label: String,
}

impl Application {
    fn from_ui(ui: UI, config: Config) -> Result<Self, JsValue> {
        let viewport = Viewport::new(ui.canvas.width() as f32, ui.canvas.height() as f32);
        let incidents = builtin_incidents().map_err(js_error)?;
        let mut rng = rand::thread_rng();
        let session = Session::new(config, incidents, viewport, &mut rng);
        let painter = Painter::new(&ui.canvas, Sprites::load()?)?;
        let mixer = Mixer::new()?;
        Ok(Self{
            ui,
            session,
            painter,
            mixer,
            binds: KeyBinds::default(),
            rng,
            messages: Vec::new(),
            altitude_label: String::new(),
        })
    }

    fn now(&self) -> f64 {
        self.ui.window.performance()
            .map(|performance| performance.now())
            .unwrap_or_else(|| self.session.now())
    }

    fn sync_clock(&mut self) {
        let now = self.now();
        self.session.advance_clock(now, &mut self.rng);
    }

    fn dispatch(&mut self, trigger: Trigger) -> Result<bool, JsValue> {
        self.sync_clock();
        let acted = self.session.trigger(trigger);
        self.flush_cues()?;
        Ok(acted)
    }

    fn choose(&mut self, option: usize) -> Result<(), JsValue> {
        self.session.choose_option(option);
        self.flush_cues()
    }

    fn begin(&mut self) -> Result<(), JsValue> {
        hide(&self.ui.briefing_screen)?;
        self.sync_clock();
        self.session.begin();
        self.flush_cues()
    }

    fn set_music_volume(&mut self, percent: f64) {
        self.mixer.set_music_volume(percent_to_volume(percent));
        self.ui.volume_value.set_text_content(Some(&format!("{}%", percent)));
    }

    fn set_fx_volume(&mut self, percent: f64) {
        self.mixer.set_fx_volume(percent_to_volume(percent));
        self.ui.fx_value.set_text_content(Some(&format!("{}%", percent)));
    }

    fn open_panel(&self, index: usize) -> Result<(), JsValue> {
        let incident = match self.session.incident(index) {
            Some(incident) => incident,
            None => return Ok(()),
        };
        self.ui.incident_text.set_text_content(Some(&incident.scenario));
        self.ui.feedback.set_text_content(Some(""));
        hide(&self.ui.continue_btn)?;
        for (i, button) in self.ui.options.iter().enumerate() {
            match incident.options.get(i) {
                Some(option) => {
                    button.set_text_content(Some(&format!("{}. {}", i + 1, option)));
                    button.set_disabled(false);
                    show(button)?;
                },
                None => hide(button)?,
            }
        }
        show(&self.ui.overlay)
    }

    fn show_feedback(&self, index: usize, verdict: Verdict) -> Result<(), JsValue> {
        let incident = match self.session.incident(index) {
            Some(incident) => incident,
            None => return Ok(()),
        };
        match verdict {
            Verdict::Correct => {
                self.ui.feedback.set_text_content(Some(&format!("\u{2705} {}", incident.feedback_correct)));
                for button in &self.ui.options {
                    button.set_disabled(true);
                }
                show(&self.ui.continue_btn)?;
            },
            Verdict::Incorrect => {
                self.ui.feedback.set_text_content(Some(
                    &format!("\u{26a0}\u{fe0f} {}  Try again.", incident.feedback_incorrect)));
            },
        }
        Ok(())
    }

    fn show_message(&mut self, id: MessageId, text: &str) -> Result<(), JsValue> {
        let document = &self.ui.document;
        let message = document.create_element("div")?;
        message.set_class_name("fo-message");
        let title = document.create_element("div")?;
        title.set_class_name("fo-title");
        title.set_text_content(Some("\u{2708}\u{fe0f} First Officer"));
        let body = document.create_element("div")?;
        body.set_text_content(Some(&format!("\"{}\"", text)));
        message.append_child(&title)?;
        message.append_child(&body)?;
        self.ui.messages.append_child(&message)?;
        self.ui.first_officer.class_list().add_1("fo-speaking")?;
        self.messages.push((id, message));
        Ok(())
    }

    fn fade_message(&self, id: MessageId) -> Result<(), JsValue> {
        self.ui.first_officer.class_list().remove_1("fo-speaking")?;
        if let Some((_, message)) = self.messages.iter().find(|(m, _)| *m == id) {
            message.class_list().add_1("fo-fading")?;
        }
        Ok(())
    }

    fn clear_message(&mut self, id: MessageId) {
        if let Some(at) = self.messages.iter().position(|(m, _)| *m == id) {
            let (_, message) = self.messages.remove(at);
            message.remove();
        }
    }

    fn apply_cue(&mut self, cue: Cue) -> Result<(), JsValue> {
        debug!("cue {:?}", cue);
        match cue {
            Cue::Started => show(&self.ui.first_officer)?,
            Cue::StartMusic => self.mixer.start_music(),
            Cue::Phase(phase) => {
                self.ui.hud_phase.set_text_content(Some(&format!("PHASE: {}", phase.label())));
            },
            Cue::Prompt(true) => show(&self.ui.start_box)?,
            Cue::Prompt(false) => hide(&self.ui.start_box)?,
            Cue::OpenPanel(index) => self.open_panel(index)?,
            Cue::ClosePanel => hide(&self.ui.overlay)?,
            Cue::Feedback{incident, verdict} => self.show_feedback(incident, verdict)?,
            Cue::Score(score) => self.ui.score.set_text_content(Some(&score.to_string())),
            Cue::Play(channel) => self.mixer.play(channel),
            Cue::Stop(channel) => self.mixer.stop(channel),
            Cue::Message{id, text} => self.show_message(id, &text)?,
            Cue::MessageFading(id) => self.fade_message(id)?,
            Cue::MessageCleared(id) => self.clear_message(id),
            Cue::EndScreen{score, ..} => {
                self.ui.final_score.set_text_content(Some(&score.to_string()));
                show(&self.ui.end_screen)?;
            },
        }
        Ok(())
    }

    fn flush_cues(&mut self) -> Result<(), JsValue> {
        for cue in self.session.drain_cues() {
            self.apply_cue(cue)?;
        }
        Ok(())
    }

    fn draw_frame(&mut self) -> Result<(), JsValue> {
        self.sync_clock();
        self.session.frame(&mut self.rng);
        self.painter.paint(&self.session)?;
        self.flush_cues()?;

        if self.session.is_started() {
            let label = self.session.altimeter().label();
            if label != self.altitude_label {
                self.ui.hud_alt.set_text_content(Some(&label));
                self.altitude_label = label;
            }
        }
        Ok(())
    }

    fn setup_events(app: Rc<RefCell<Self>>) -> Result<(), JsValue> {
        let ui = app.borrow().ui.clone();

        listen(&ui.window, "keydown", {
            let app = app.clone();
            move |event: Event| {
                let event = match event.dyn_ref::<KeyboardEvent>() {
                    Some(event) => event,
                    None => return,
                };
                let trigger = app.borrow().binds.key(&event.code());
                if let Some(trigger) = trigger {
                    match app.borrow_mut().dispatch(trigger) {
                        Ok(true) => event.prevent_default(),
                        Ok(false) => {},
                        Err(err) => report(Err(err)),
                    }
                }
            }
        })?;

        for button in [&ui.start_btn, &ui.continue_btn].iter() {
            let id = button.id();
            let app = app.clone();
            listen(button, "click", move |_| {
                let trigger = app.borrow().binds.click(&id);
                if let Some(trigger) = trigger {
                    report(app.borrow_mut().dispatch(trigger).map(|_| ()));
                }
            })?;
        }

        for (option, button) in ui.options.iter().enumerate() {
            let app = app.clone();
            listen(button, "click", move |_| {
                report(app.borrow_mut().choose(option));
            })?;
        }

        listen(&ui.menu_start_btn, "click", {
            let ui = ui.clone();
            move |_| {
                report(hide(&ui.main_menu).and_then(|_| show(&ui.briefing_screen)));
            }
        })?;

        listen(&ui.menu_settings_btn, "click", {
            let ui = ui.clone();
            move |_| {
                report(hide(&ui.main_menu).and_then(|_| show(&ui.settings_screen)));
            }
        })?;

        listen(&ui.settings_back_btn, "click", {
            let ui = ui.clone();
            move |_| {
                report(hide(&ui.settings_screen).and_then(|_| show(&ui.main_menu)));
            }
        })?;

        listen(&ui.briefing_start_btn, "click", {
            let app = app.clone();
            move |_| report(app.borrow_mut().begin())
        })?;

        listen(&ui.replay_btn, "click", {
            let window = ui.window.clone();
            move |_| report(window.location().reload())
        })?;

        for button in [&ui.menu_exit_btn, &ui.end_exit_btn].iter() {
            let window = ui.window.clone();
            listen(button, "click", move |_| report(window.close()))?;
        }

        listen(&ui.volume_slider, "input", {
            let app = app.clone();
            let slider = ui.volume_slider.clone();
            move |_| app.borrow_mut().set_music_volume(slider.value_as_number())
        })?;

        listen(&ui.fx_slider, "input", {
            let app = app.clone();
            let slider = ui.fx_slider.clone();
            move |_| app.borrow_mut().set_fx_volume(slider.value_as_number())
        })?;

        Ok(())
    }
}

/// Entry point; `config_json` optionally overrides tuning constants.
#[wasm_bindgen]
pub fn cockpit_main(config_json: Option<String>) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }

    let config = match config_json {
        Some(json) => Config::from_json(&json).map_err(js_error)?,
        None => Config::default(),
    };

    let app = Rc::new(RefCell::new(Application::from_ui(get_ui()?, config)?));
    Application::setup_events(app.clone())?;

    let animation_cb: Rc<RefCell<Option<Closure<_>>>> = Rc::new(RefCell::new(None));

    *animation_cb.borrow_mut() = Some({
        let app = app.clone();
        let animation_cb = animation_cb.clone();
        Closure::wrap(Box::new(move || {
            report(app.borrow_mut().draw_frame());
            if let Some(callback) = animation_cb.borrow().as_ref() {
                report(app.borrow().ui.window
                    .request_animation_frame(callback.as_ref().unchecked_ref())
                    .map(|_| ()));
            }
        }) as Box<dyn FnMut()>)
    });

    if let Some(callback) = animation_cb.borrow().as_ref() {
        app.borrow().ui.window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }
    Ok(())
}
