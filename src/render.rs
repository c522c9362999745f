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

use crate::incidents::Phase;
use crate::session::Session;
use crate::sky::{Quad, Sweep, SweepKind, Viewport};

use wasm_bindgen::prelude::*;

use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d,
    HtmlCanvasElement,
    HtmlImageElement,
};

const SKY_COLOR: &str = "#7c9cf5";
const SEAM_COLOR: &str = "#9bb0f7";
const IDLE_COLOR: &str = "#000";
const RAIN_COLOR: &str = "rgba(174, 194, 224, 0.6)";
const RAIN_WIDTH: f64 = 5.0;
const CRASH_SIZE: f64 = 180.0;
const CRASH_ALPHA: f64 = 0.9;

fn load_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_src(src);
    Ok(image)
}

pub struct Sprites {
    takeoff: HtmlImageElement,
    landing: HtmlImageElement,
    clouds: Vec<HtmlImageElement>,
    birds: Vec<HtmlImageElement>,
    bird_hit: HtmlImageElement,
}

impl Sprites {
    pub fn load() -> Result<Self, JsValue> {
        Ok(Self{
            takeoff: load_image("01_images/takeoff.png")?,
            landing: load_image("01_images/landing.png")?,
            clouds: vec![
                load_image("01_images/cloud_sprite.png")?,
                load_image("01_images/cloud_sprite_2.png")?,
            ],
            birds: vec![
                load_image("01_images/bird1.png")?,
                load_image("01_images/bird2.png")?,
                load_image("01_images/bird3.png")?,
            ],
            bird_hit: load_image("01_images/bird_hit.png")?,
        })
    }
}

pub struct Painter {
    ctx: CanvasRenderingContext2d,
    sprites: Sprites,
}

impl Painter {
    pub fn new(canvas: &HtmlCanvasElement, sprites: Sprites) -> Result<Self, JsValue> {
        let ctx = canvas.get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self{ctx, sprites})
    }

    /// Draws only once the image has finished loading.
    fn blit(&self, image: &HtmlImageElement, x: f64, y: f64, w: f64, h: f64) -> Result<(), JsValue> {
        if !image.complete() {
            return Ok(());
        }
        self.ctx.save();
        self.ctx.set_image_smoothing_enabled(false);
        let result = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h);
        self.ctx.restore();
        result
    }

    fn blit_quad(&self, image: &HtmlImageElement, quad: &Quad) -> Result<(), JsValue> {
        let (w, h) = (quad.size.x as f64, quad.size.y as f64);
        self.blit(image,
            (quad.center.x as f64 - w / 2.0).floor(),
            (quad.center.y as f64 - h / 2.0).floor(),
            w.ceil(),
            h.ceil())
    }

    fn fill(&self, color: &str, x: f64, y: f64, w: f64, h: f64) {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(x, y, w, h);
    }

    /// Sky-blue fade covering the strip from `top` to `bottom`.
    fn fill_seam(&self, top: f64, bottom: f64, w: f64) -> Result<(), JsValue> {
        let gradient = self.ctx.create_linear_gradient(0.0, top, 0.0, bottom);
        gradient.add_color_stop(0.0, SEAM_COLOR)?;
        gradient.add_color_stop(0.5, SKY_COLOR)?;
        gradient.add_color_stop(1.0, SKY_COLOR)?;
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill_rect(0.0, top, w, bottom - top);
        Ok(())
    }

    fn paint_background(&self, session: &Session, viewport: &Viewport) -> Result<(), JsValue> {
        let (w, h) = (viewport.width as f64, viewport.height as f64);
        self.fill(SKY_COLOR, 0.0, 0.0, w, h);
        match session.sky().sweep() {
            Some(Sweep{kind: SweepKind::Takeoff, offset}) => {
                let offset = offset as f64;
                self.blit(&self.sprites.takeoff, 0.0, offset, w, h)?;
                self.fill_seam(offset - h, offset, w)?;
            },
            Some(Sweep{kind: SweepKind::Landing, offset}) => {
                let offset = offset as f64;
                self.fill_seam(-offset, h - offset, w)?;
                self.blit(&self.sprites.landing, 0.0, h - offset, w, h)?;
            },
            None => match session.phase() {
                Phase::Takeoff => self.blit(&self.sprites.takeoff, 0.0, 0.0, w, h)?,
                Phase::Landing => self.blit(&self.sprites.landing, 0.0, 0.0, w, h)?,
                _ => {},
            },
        }
        Ok(())
    }

    fn paint_scene(&self, session: &Session) -> Result<(), JsValue> {
        let sky = session.sky();
        let viewport = sky.viewport();

        self.paint_background(session, viewport)?;

        if sky.clouds().is_active() {
            for (variant, quad) in sky.clouds().visible(viewport) {
                if let Some(image) = self.sprites.clouds.get(variant) {
                    self.blit_quad(image, &quad)?;
                }
            }
        }

        for bird in sky.flock().birds() {
            if let (Some(quad), Some(image)) = (bird.quad, self.sprites.birds.get(bird.frame)) {
                self.blit_quad(image, &quad)?;
            }
        }

        let crashes = sky.flock().crashes();
        if !crashes.is_empty() {
            self.ctx.save();
            self.ctx.set_global_alpha(CRASH_ALPHA);
            for crash in crashes {
                self.blit(&self.sprites.bird_hit,
                    crash.x as f64 - CRASH_SIZE / 2.0,
                    crash.y as f64 - CRASH_SIZE / 2.0,
                    CRASH_SIZE,
                    CRASH_SIZE)?;
            }
            self.ctx.restore();
        }

        if sky.rain().is_active() {
            self.ctx.save();
            self.ctx.set_stroke_style_str(RAIN_COLOR);
            self.ctx.set_line_width(RAIN_WIDTH);
            for drop in sky.rain().drops() {
                let tail = drop.tail();
                self.ctx.begin_path();
                self.ctx.move_to(drop.pos.x as f64, drop.pos.y as f64);
                self.ctx.line_to(tail.x as f64, tail.y as f64);
                self.ctx.stroke();
            }
            self.ctx.restore();
        }

        Ok(())
    }

    /// Full repaint of the current frame.
    pub fn paint(&self, session: &Session) -> Result<(), JsValue> {
        let viewport = session.sky().viewport();
        if !session.is_started() {
            self.fill(IDLE_COLOR, 0.0, 0.0, viewport.width as f64, viewport.height as f64);
            return Ok(());
        }

        let shake = session.sky().shake();
        self.ctx.save();
        self.ctx.translate(shake.x as f64, shake.y as f64)?;
        let result = self.paint_scene(session);
        self.ctx.restore();
        result
    }
}
