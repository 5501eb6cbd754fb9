//! Canvas drawing for one frame. Reads the session, never advances it (apart
//! from consuming the screen-shake offset).

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::layout::Layout;
use crate::session::GameSession;

const TAU: f64 = std::f64::consts::TAU;
const RAIL_WIDTH: f64 = 6.0;

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        Self { canvas, ctx }
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn clear(&self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    /// Back to front: vignette, tracks, match zone, smoke, gate, train,
    /// particles, success flash, confetti.
    pub fn draw(&self, session: &mut GameSession, now: f64) {
        self.clear();
        let layout = *session.layout();
        self.draw_vignette(&layout);
        self.draw_tracks(&layout, session.scene().track_offset, session.config().tie_spacing);
        if session.is_running() {
            self.draw_match_zone(session, now);
        }
        self.draw_smoke(session);
        self.draw_gate(session, now);
        let shake = session.effects_mut().shake_offset();
        self.draw_train(&layout, shake);
        self.draw_particles(session);
        self.draw_flash(session);
        self.draw_confetti(session);
    }

    fn draw_vignette(&self, l: &Layout) {
        let ctx = &self.ctx;
        if let Ok(g) = ctx.create_radial_gradient(
            l.cx,
            l.height / 2.0,
            l.height * 0.3,
            l.cx,
            l.height / 2.0,
            l.height * 0.9,
        ) {
            g.add_color_stop(0.0, "rgba(0,0,0,0)").ok();
            g.add_color_stop(1.0, "rgba(0,0,0,0.45)").ok();
            ctx.set_fill_style_canvas_gradient(&g);
            ctx.fill_rect(0.0, 0.0, l.width, l.height);
        }
    }

    fn draw_tracks(&self, l: &Layout, offset: f64, tie_spacing: f64) {
        let ctx = &self.ctx;
        let lx = l.cx - l.track_width / 2.0;
        let rx = l.cx + l.track_width / 2.0;

        // corridor
        ctx.set_fill_style_str("rgba(10,10,25,0.35)");
        ctx.fill_rect(lx - 22.0, 0.0, l.track_width + 44.0, l.height);

        // ties scroll down with the offset
        ctx.set_stroke_style_str("#64748b");
        ctx.set_line_width(5.0);
        let mut y = offset - tie_spacing;
        while y < l.height + tie_spacing {
            line(ctx, lx - 10.0, y, rx + 10.0, y);
            y += tie_spacing;
        }

        ctx.set_fill_style_str("#94a3b8");
        ctx.fill_rect(lx - RAIL_WIDTH / 2.0, 0.0, RAIL_WIDTH, l.height);
        ctx.fill_rect(rx - RAIL_WIDTH / 2.0, 0.0, RAIL_WIDTH, l.height);
        ctx.set_fill_style_str("rgba(236,239,241,0.35)");
        ctx.fill_rect(lx - RAIL_WIDTH / 2.0 + 1.0, 0.0, 2.0, l.height);
        ctx.fill_rect(rx - RAIL_WIDTH / 2.0 + 1.0, 0.0, 2.0, l.height);
    }

    fn draw_match_zone(&self, session: &GameSession, now: f64) {
        let Some(gate) = session.gate() else { return };
        if gate.is_done() {
            return;
        }
        let l = session.layout();
        let ctx = &self.ctx;
        let (x0, x1) = (l.cx - l.gate_w / 2.0, l.cx + l.gate_w / 2.0);
        let pulse = 0.12 + (now * 0.003).sin() * 0.06;
        ctx.set_fill_style_str(&format!("rgba(76,175,80,{pulse:.3})"));
        ctx.fill_rect(x0, l.zone.top, l.gate_w, l.zone.bottom - l.zone.top);

        let dash = js_sys::Array::of2(&JsValue::from_f64(8.0), &JsValue::from_f64(5.0));
        ctx.set_line_dash(&dash).ok();
        ctx.set_stroke_style_str("rgba(76,175,80,0.45)");
        ctx.set_line_width(2.0);
        line(ctx, x0, l.zone.top, x1, l.zone.top);
        line(ctx, x0, l.zone.bottom, x1, l.zone.bottom);
        ctx.set_line_dash(&js_sys::Array::new()).ok();

        ctx.set_fill_style_str("rgba(76,175,80,0.65)");
        ctx.set_font("bold 11px sans-serif");
        ctx.set_text_align("center");
        ctx.set_text_baseline("alphabetic");
        ctx.fill_text("▼ MATCH ZONE ▼", l.cx, l.zone.top - 5.0).ok();
    }

    fn draw_gate(&self, session: &GameSession, now: f64) {
        let Some(gate) = session.gate() else { return };
        if gate.is_done() {
            return;
        }
        let l = session.layout();
        let ctx = &self.ctx;
        let emotion = gate.spec.emotion;
        let color = emotion.color();
        let (gx, gy, gw, gh) = (l.cx - l.gate_w / 2.0, gate.y, l.gate_w, l.gate_h);

        ctx.save();

        // pillars
        ctx.set_fill_style_str(color);
        ctx.set_shadow_color(emotion.glow());
        ctx.set_shadow_blur(16.0);
        round_rect(ctx, gx - 14.0, gy - 10.0, 14.0, gh + 20.0, 6.0);
        ctx.fill();
        round_rect(ctx, gx + gw, gy - 10.0, 14.0, gh + 20.0, 6.0);
        ctx.fill();
        ctx.set_shadow_blur(0.0);

        // top bar turns green once matched
        let bar = ctx.create_linear_gradient(gx, gy, gx + gw, gy);
        bar.add_color_stop(0.0, color).ok();
        bar.add_color_stop(1.0, if gate.is_matched() { "#22c55e" } else { color })
            .ok();
        ctx.set_fill_style_canvas_gradient(&bar);
        round_rect(ctx, gx, gy, gw, 10.0, 4.0);
        ctx.fill();

        // plate
        ctx.set_fill_style_str("rgba(0,0,0,.55)");
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(2.0);
        round_rect(ctx, gx, gy + 14.0, gw, gh - 14.0, 12.0);
        ctx.fill();
        ctx.stroke();

        if gate.in_zone() {
            let p = 0.4 + (now * 0.01).sin() * 0.4;
            ctx.set_stroke_style_str(&format!("rgba(255,255,255,{:.3})", p * 0.6));
            ctx.set_line_width(3.0);
            round_rect(ctx, gx - 3.0, gy - 3.0, gw + 6.0, gh + 6.0, 10.0);
            ctx.stroke();
        }

        ctx.set_text_align("center");
        ctx.set_text_baseline("alphabetic");
        ctx.set_font(&format!("{:.0}px serif", gh * 0.44));
        ctx.fill_text(emotion.emoji(), l.cx, gy + gh / 2.0 + gh * 0.22).ok();

        ctx.set_font("600 13px sans-serif");
        ctx.set_fill_style_str(color);
        ctx.fill_text(emotion.label(), l.cx, gy + gh - 4.0).ok();

        if gate.is_matched() {
            ctx.set_font("700 16px sans-serif");
            ctx.set_fill_style_str("#22c55e");
            ctx.fill_text("✓ MATCHED!", l.cx, gy - 16.0).ok();
        }

        ctx.restore();
    }

    fn draw_train(&self, l: &Layout, (dx, dy): (f64, f64)) {
        let ctx = &self.ctx;
        let (cx, ty, tw, th) = (l.cx, l.train_y, l.train_w, l.train_h);
        ctx.save();
        ctx.translate(dx, dy).ok();

        // shadow
        ctx.set_fill_style_str("rgba(0,0,0,0.25)");
        ctx.begin_path();
        ctx.ellipse(cx, ty + th + 6.0, tw * 0.42, 5.0, 0.0, 0.0, TAU).ok();
        ctx.fill();

        // body
        let body = ctx.create_linear_gradient(cx - tw / 2.0, 0.0, cx + tw / 2.0, 0.0);
        body.add_color_stop(0.0, "#4338ca").ok();
        body.add_color_stop(0.4, "#6366f1").ok();
        body.add_color_stop(1.0, "#3730a3").ok();
        ctx.set_fill_style_canvas_gradient(&body);
        round_rect(ctx, cx - tw / 2.0, ty, tw, th, 10.0);
        ctx.fill();

        ctx.set_shadow_color("rgba(99,102,241,.5)");
        ctx.set_shadow_blur(18.0);
        ctx.set_stroke_style_str("rgba(165,180,252,0.45)");
        ctx.set_line_width(2.0);
        round_rect(ctx, cx - tw / 2.0, ty, tw, th, 10.0);
        ctx.stroke();
        ctx.set_shadow_blur(0.0);

        // nose + headlight
        ctx.set_fill_style_str("#4f46e5");
        ctx.begin_path();
        ctx.move_to(cx - tw * 0.28, ty);
        ctx.line_to(cx, ty - 18.0);
        ctx.line_to(cx + tw * 0.28, ty);
        ctx.close_path();
        ctx.fill();
        if let Ok(glow) = ctx.create_radial_gradient(cx, ty - 13.0, 2.0, cx, ty - 13.0, 14.0) {
            glow.add_color_stop(0.0, "rgba(255,255,200,0.85)").ok();
            glow.add_color_stop(1.0, "rgba(255,255,200,0)").ok();
            ctx.set_fill_style_canvas_gradient(&glow);
            circle(ctx, cx, ty - 13.0, 14.0);
        }
        ctx.set_fill_style_str("#fbbf24");
        circle(ctx, cx, ty - 13.0, 3.5);

        // window + stripe
        ctx.set_fill_style_str("#a5b4fc");
        round_rect(ctx, cx - tw * 0.22, ty + 12.0, tw * 0.44, th * 0.28, 4.0);
        ctx.fill();
        ctx.set_fill_style_str("#fbbf24");
        ctx.fill_rect(cx - tw / 2.0 + 6.0, ty + th * 0.55, tw - 12.0, 3.0);

        // wheels
        for wx in [cx - tw * 0.28, cx + tw * 0.28] {
            ctx.set_fill_style_str("#1e1b4b");
            circle(ctx, wx, ty + th, 9.0);
            ctx.set_fill_style_str("#78909c");
            circle(ctx, wx, ty + th, 3.5);
        }

        // chimney
        ctx.set_fill_style_str("#546e7a");
        round_rect(ctx, cx + tw * 0.12, ty - 4.0, 12.0, 8.0, 2.0);
        ctx.fill();
        ctx.set_fill_style_str("#37474f");
        round_rect(ctx, cx + tw * 0.12 - 2.0, ty - 7.0, 16.0, 4.0, 2.0);
        ctx.fill();

        ctx.restore();
    }

    fn draw_smoke(&self, session: &GameSession) {
        let ctx = &self.ctx;
        ctx.set_fill_style_str("#90a4ae");
        for s in &session.effects().smoke {
            ctx.set_global_alpha(s.alpha.max(0.0));
            circle(ctx, s.x, s.y, s.r);
        }
        ctx.set_global_alpha(1.0);
    }

    fn draw_particles(&self, session: &GameSession) {
        let ctx = &self.ctx;
        for p in &session.effects().particles {
            ctx.set_global_alpha(p.alpha.max(0.0));
            ctx.set_fill_style_str(p.color);
            circle(ctx, p.x, p.y, p.r);
        }
        ctx.set_global_alpha(1.0);
    }

    fn draw_confetti(&self, session: &GameSession) {
        let ctx = &self.ctx;
        for c in &session.effects().confetti {
            ctx.save();
            ctx.translate(c.x, c.y).ok();
            ctx.rotate(c.rot).ok();
            ctx.set_fill_style_str(c.color);
            ctx.fill_rect(-c.w / 2.0, -c.h / 2.0, c.w, c.h);
            ctx.restore();
        }
    }

    fn draw_flash(&self, session: &GameSession) {
        let Some(gate) = session.gate() else { return };
        if gate.flash <= 0.0 {
            return;
        }
        let l = session.layout();
        self.ctx.set_global_alpha(gate.flash);
        self.ctx.set_fill_style_str(gate.spec.emotion.color());
        self.ctx.fill_rect(0.0, 0.0, l.width, l.height);
        self.ctx.set_global_alpha(1.0);
    }
}

fn line(ctx: &CanvasRenderingContext2d, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
}

fn circle(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) {
    ctx.begin_path();
    ctx.arc(x, y, r, 0.0, TAU).ok();
    ctx.fill();
}

fn round_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.quadratic_curve_to(x + w, y, x + w, y + r);
    ctx.line_to(x + w, y + h - r);
    ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
    ctx.line_to(x + r, y + h);
    ctx.quadratic_curve_to(x, y + h, x, y + h - r);
    ctx.line_to(x, y + r);
    ctx.quadratic_curve_to(x, y, x + r, y);
    ctx.close_path();
}
