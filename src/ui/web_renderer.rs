use essence_core::composite::{GlowCompositor, GlowPlan};
use essence_core::raster::TrailRaster;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Draws trail rasters onto a page canvas.
///
/// The raster is uploaded to an offscreen canvas at grid resolution, then
/// stretched onto the target three times with the browser's own blur filter
/// and additive blending.
pub struct CanvasCompositor {
    ctx: CanvasRenderingContext2d,
    offscreen: HtmlCanvasElement,
    offscreen_ctx: CanvasRenderingContext2d,
}

impl CanvasCompositor {
    pub fn new(ctx: CanvasRenderingContext2d) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let offscreen: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        let offscreen_ctx: CanvasRenderingContext2d = offscreen
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        Ok(Self {
            ctx,
            offscreen,
            offscreen_ctx,
        })
    }

    fn upload(&mut self, raster: &TrailRaster) -> Result<(), JsValue> {
        let (w, h) = (raster.width() as u32, raster.height() as u32);
        if self.offscreen.width() != w || self.offscreen.height() != h {
            self.offscreen.set_width(w);
            self.offscreen.set_height(h);
        }
        let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(raster.pixels()), w, h)?;
        self.offscreen_ctx.put_image_data(&image, 0.0, 0.0)
    }

    fn try_composite(&mut self, raster: &TrailRaster, plan: &GlowPlan) -> Result<(), JsValue> {
        self.upload(raster)?;
        self.composite_uploaded(plan)
    }

    /// Blends the uploaded raster onto the target; the target's drawing state is
    /// restored even when a pass fails.
    fn composite_uploaded(&self, plan: &GlowPlan) -> Result<(), JsValue> {
        self.ctx.save();
        let drawn = self.draw_passes(plan);
        self.ctx.restore();
        drawn
    }

    /// Draws the glow passes additively. The caller brackets this with save/restore.
    fn draw_passes(&self, plan: &GlowPlan) -> Result<(), JsValue> {
        self.ctx.set_global_composite_operation("lighter")?;
        self.ctx.set_image_smoothing_enabled(true);
        for pass in &plan.passes {
            let blur = if pass.blur_px > 0.0 {
                format!("blur({:.2}px)", pass.blur_px)
            } else {
                "none".to_string()
            };
            self.ctx.set_filter(&blur);
            self.ctx.set_global_alpha(f64::from(pass.opacity));
            let pad = f64::from(pass.pad_px);
            self.ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
                &self.offscreen,
                -pad,
                -pad,
                f64::from(plan.dest_width) + pad * 2.0,
                f64::from(plan.dest_height) + pad * 2.0,
            )?;
        }
        Ok(())
    }
}

impl GlowCompositor for CanvasCompositor {
    fn composite(&mut self, raster: &TrailRaster, plan: &GlowPlan) {
        if let Err(e) = self.try_composite(raster, plan) {
            web_sys::console::warn_1(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn page_context() -> CanvasRenderingContext2d {
        let document = web_sys::window().unwrap().document().unwrap();
        let canvas: HtmlCanvasElement = document.create_element("canvas").unwrap().dyn_into().unwrap();
        canvas.set_width(64);
        canvas.set_height(64);
        canvas.get_context("2d").unwrap().unwrap().dyn_into().unwrap()
    }

    #[wasm_bindgen_test]
    fn failed_pass_leaves_page_context_untouched() {
        let ctx = page_context();
        let compositor = CanvasCompositor::new(ctx.clone()).unwrap();
        let raster = TrailRaster::new(8, 8);
        let plan = GlowPlan::for_raster(&raster, 7.0);

        // A zero-sized source canvas makes drawImage throw.
        compositor.offscreen.set_width(0);
        assert!(compositor.composite_uploaded(&plan).is_err());

        assert_eq!(ctx.global_composite_operation().unwrap(), "source-over");
        assert_eq!(ctx.filter(), "none");
        assert_eq!(ctx.global_alpha(), 1.0);
    }

    #[wasm_bindgen_test]
    fn composite_restores_state_after_drawing() {
        let ctx = page_context();
        let mut compositor = CanvasCompositor::new(ctx.clone()).unwrap();
        let raster = TrailRaster::new(8, 8);
        let plan = GlowPlan::for_raster(&raster, 7.0);

        compositor.composite(&raster, &plan);

        assert_eq!(ctx.global_composite_operation().unwrap(), "source-over");
        assert_eq!(ctx.filter(), "none");
    }
}
