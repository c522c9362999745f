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

use wasm_bindgen::JsCast;
use web_sys::{
    Document,
    HtmlButtonElement,
    HtmlCanvasElement,
    HtmlDivElement,
    HtmlElement,
    HtmlImageElement,
    HtmlInputElement,
    Window,
};

#[derive(Clone)]
pub struct UI {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub overlay: HtmlDivElement,
    pub incident_text: HtmlElement,
    pub feedback: HtmlElement,
    pub options: Vec<HtmlButtonElement>,
    pub continue_btn: HtmlButtonElement,
    pub start_box: HtmlDivElement,
    pub start_btn: HtmlButtonElement,
    pub score: HtmlElement,
    pub final_score: HtmlElement,
    pub hud_alt: HtmlElement,
    pub hud_phase: HtmlElement,
    pub first_officer: HtmlImageElement,
    pub messages: HtmlDivElement,
    pub main_menu: HtmlDivElement,
    pub briefing_screen: HtmlDivElement,
    pub settings_screen: HtmlDivElement,
    pub end_screen: HtmlDivElement,
    pub menu_start_btn: HtmlButtonElement,
    pub menu_settings_btn: HtmlButtonElement,
    pub menu_exit_btn: HtmlButtonElement,
    pub briefing_start_btn: HtmlButtonElement,
    pub settings_back_btn: HtmlButtonElement,
    pub replay_btn: HtmlButtonElement,
    pub end_exit_btn: HtmlButtonElement,
    pub volume_slider: HtmlInputElement,
    pub volume_value: HtmlElement,
    pub fx_slider: HtmlInputElement,
    pub fx_value: HtmlElement,
}

/// Number of option buttons in the incident panel.
pub const OPTION_BUTTONS: usize = 3;

pub fn get_ui() -> Result<UI, JsValue> {
    let window = web_sys::window()
        .ok_or_else(|| JsValue::from_str("failed to get window"))?;

    let document = window.document()
        .ok_or_else(|| JsValue::from_str("failed to get document"))?;

    fn get_as<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
        document.get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("failed to get {}", id)))?
            .dyn_into::<T>()
            .map_err(|_| JsValue::from_str(&format!("failed to cast {}", id)))
    }

    let canvas             = get_as::<HtmlCanvasElement>(&document, "skyCanvas")?;
    let overlay            = get_as::<HtmlDivElement   >(&document, "incident-overlay")?;
    let incident_text      = get_as::<HtmlElement      >(&document, "incident-text")?;
    let feedback           = get_as::<HtmlElement      >(&document, "feedback")?;
    let continue_btn       = get_as::<HtmlButtonElement>(&document, "continue-btn")?;
    let start_box          = get_as::<HtmlDivElement   >(&document, "start-box")?;
    let start_btn          = get_as::<HtmlButtonElement>(&document, "start-btn")?;
    let score              = get_as::<HtmlElement      >(&document, "score")?;
    let final_score        = get_as::<HtmlElement      >(&document, "final-score")?;
    let hud_alt            = get_as::<HtmlElement      >(&document, "hud-alt")?;
    let hud_phase          = get_as::<HtmlElement      >(&document, "hud-phase")?;
    let first_officer      = get_as::<HtmlImageElement >(&document, "first-officer-image")?;
    let messages           = get_as::<HtmlDivElement   >(&document, "fo-messages")?;
    let main_menu          = get_as::<HtmlDivElement   >(&document, "main-menu")?;
    let briefing_screen    = get_as::<HtmlDivElement   >(&document, "briefing-screen")?;
    let settings_screen    = get_as::<HtmlDivElement   >(&document, "settings-screen")?;
    let end_screen         = get_as::<HtmlDivElement   >(&document, "end-screen")?;
    let menu_start_btn     = get_as::<HtmlButtonElement>(&document, "menu-start-btn")?;
    let menu_settings_btn  = get_as::<HtmlButtonElement>(&document, "menu-settings-btn")?;
    let menu_exit_btn      = get_as::<HtmlButtonElement>(&document, "menu-exit-btn")?;
    let briefing_start_btn = get_as::<HtmlButtonElement>(&document, "briefing-start-btn")?;
    let settings_back_btn  = get_as::<HtmlButtonElement>(&document, "settings-back-btn")?;
    let replay_btn         = get_as::<HtmlButtonElement>(&document, "replay-btn")?;
    let end_exit_btn       = get_as::<HtmlButtonElement>(&document, "end-exit-btn")?;
    let volume_slider      = get_as::<HtmlInputElement >(&document, "volume-slider")?;
    let volume_value       = get_as::<HtmlElement      >(&document, "volume-value")?;
    let fx_slider          = get_as::<HtmlInputElement >(&document, "fx-slider")?;
    let fx_value           = get_as::<HtmlElement      >(&document, "fx-value")?;

    let options = (0..OPTION_BUTTONS)
        .map(|i| get_as::<HtmlButtonElement>(&document, &format!("option-{}", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UI{
        window,
        document,
        canvas,
        overlay,
        incident_text,
        feedback,
        options,
        continue_btn,
        start_box,
        start_btn,
        score,
        final_score,
        hud_alt,
        hud_phase,
        first_officer,
        messages,
        main_menu,
        briefing_screen,
        settings_screen,
        end_screen,
        menu_start_btn,
        menu_settings_btn,
        menu_exit_btn,
        briefing_start_btn,
        settings_back_btn,
        replay_btn,
        end_exit_btn,
        volume_slider,
        volume_value,
        fx_slider,
        fx_value,
    })
}
