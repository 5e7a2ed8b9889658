//! 2D canvas rendering of the project blocks
//!
//! Blocks are drawn as chamfered outlines in their project color. Walls are
//! off-screen and never drawn.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::platform::SetupError;
use crate::scene::Scene;
use crate::sim::{PhysicsWorld, Viewport};

const BLOCK_FILL: &str = "rgba(255,255,255,0.04)";
const BLOCK_LINE_WIDTH: f64 = 1.5;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SetupError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or(SetupError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SetupError::NoContext)?;
        Ok(Self {
            canvas,
            ctx,
            dpr: 1.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Match the backing store to the viewport at device pixel ratio `dpr`
    pub fn resize(&mut self, viewport: Viewport, dpr: f64) {
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.canvas
            .set_width((viewport.width as f64 * self.dpr).round() as u32);
        self.canvas
            .set_height((viewport.height as f64 * self.dpr).round() as u32);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", viewport.width));
        let _ = style.set_property("height", &format!("{}px", viewport.height));
    }

    pub fn render<W: PhysicsWorld>(&self, scene: &Scene<W>) {
        let ctx = &self.ctx;
        let _ = ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
        let vp = scene.viewport();
        ctx.clear_rect(0.0, 0.0, vp.width as f64, vp.height as f64);

        for (index, block) in scene.blocks().iter().enumerate() {
            let Some(t) = scene.block_transform(index) else {
                continue;
            };
            let color = block
                .project
                .accent()
                .map(|c| c.to_hex())
                .unwrap_or_else(|| block.project.color.clone());

            ctx.save();
            let _ = ctx.translate(t.position.x as f64, t.position.y as f64);
            let _ = ctx.rotate(t.angle as f64);
            self.rounded_rect(
                block.size.x as f64,
                block.size.y as f64,
                block.chamfer as f64,
            );
            ctx.set_fill_style_str(BLOCK_FILL);
            ctx.fill();
            ctx.set_stroke_style_str(&color);
            ctx.set_line_width(BLOCK_LINE_WIDTH);
            ctx.stroke();
            ctx.restore();
        }
    }

    /// Path for a `w`×`h` rectangle centered on the origin
    fn rounded_rect(&self, w: f64, h: f64, r: f64) {
        let ctx = &self.ctx;
        let (x0, y0, x1, y1) = (-w / 2.0, -h / 2.0, w / 2.0, h / 2.0);
        ctx.begin_path();
        ctx.move_to(x0 + r, y0);
        let _ = ctx.arc_to(x1, y0, x1, y1, r);
        let _ = ctx.arc_to(x1, y1, x0, y1, r);
        let _ = ctx.arc_to(x0, y1, x0, y0, r);
        let _ = ctx.arc_to(x0, y0, x1, y0, r);
        ctx.close_path();
    }
}
