pub mod app;
pub mod ui;

#[cfg(target_arch = "wasm32")]
use crate::app::App;
#[cfg(target_arch = "wasm32")]
use crate::ui::web_renderer::CanvasCompositor;
#[cfg(target_arch = "wasm32")]
use essence_core::config::AppConfig;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
fn set_field(obj: &js_sys::Object, key: &str, value: JsValue) {
    let _ = js_sys::Reflect::set(obj, &JsValue::from_str(key), &value);
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct Simulation {
    app: App,
    compositor: Option<(JsValue, CanvasCompositor)>,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Result<Simulation, JsValue> {
        console_error_panic_hook::set_once();

        let mut config = AppConfig::default();
        config.viewport.width = width;
        config.viewport.height = height;
        config.simulation.seed = Some((js_sys::Math::random() * 9_007_199_254_740_991.0) as u64);
        let app = App::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Simulation {
            app,
            compositor: None,
        })
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.app.resize(width, height);
    }

    /// Advances one frame; `dt` is the elapsed time in seconds.
    pub fn tick(&mut self, dt: f32) {
        self.app.tick(dt);
    }

    pub fn draw(&mut self, ctx: &web_sys::CanvasRenderingContext2d) -> Result<(), JsValue> {
        let key = JsValue::from(ctx.clone());
        let stale = !matches!(&self.compositor, Some((current, _)) if *current == key);
        if stale {
            self.compositor = Some((key, CanvasCompositor::new(ctx.clone())?));
        }
        if let Some((_, compositor)) = self.compositor.as_mut() {
            self.app.render(compositor);
        }
        Ok(())
    }

    pub fn sample(&self, x: f32, y: f32) -> js_sys::Object {
        let s = self.app.field().sample(x, y, self.app.current_tick());
        let obj = js_sys::Object::new();
        set_field(&obj, "value", JsValue::from_f64(f64::from(s.value)));
        set_field(&obj, "authorId", JsValue::from_f64(f64::from(s.author_id)));
        set_field(&obj, "age", JsValue::from_f64(s.age));
        obj
    }

    pub fn export_state(&self) -> Result<String, JsValue> {
        essence_io::to_json(&self.app.export_state()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Restores a save; returns `{ applied, rejected }` channel counts.
    pub fn import_state(&mut self, json: &str) -> Result<js_sys::Object, JsValue> {
        let loaded = essence_io::from_json::<serde_json::Value>(json)
            .and_then(essence_io::decode_state)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let report = self.app.import_state(&loaded);

        let obj = js_sys::Object::new();
        set_field(&obj, "applied", JsValue::from_f64(report.applied_count() as f64));
        set_field(&obj, "rejected", JsValue::from_f64(report.rejected_count() as f64));
        Ok(obj)
    }

    pub fn get_stats(&self) -> js_sys::Object {
        let stats = self.app.field().stats();
        let obj = js_sys::Object::new();
        set_field(&obj, "tick", JsValue::from_f64(f64::from(self.app.current_tick())));
        set_field(&obj, "mass", JsValue::from_f64(stats.total_mass));
        set_field(&obj, "occupied", JsValue::from_f64(stats.occupied_cells as f64));
        obj
    }
}
