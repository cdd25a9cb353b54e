pub mod macros;

use essence_core::config::TrailConfig;
use essence_core::trail::TrailField;
use essence_data::Tick;

type FieldMod = Box<dyn FnOnce(&mut TrailField)>;

/// Builds trail fields on a unit-cell grid so pixel and cell coordinates coincide.
#[allow(dead_code)]
pub struct FieldBuilder {
    config: TrailConfig,
    width: f32,
    height: f32,
    mods: Vec<FieldMod>,
    publish: bool,
}

#[allow(dead_code)]
impl FieldBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            config: TrailConfig {
                cell_size: 1.0,
                ..Default::default()
            },
            width: width as f32,
            height: height as f32,
            mods: Vec::new(),
            publish: false,
        }
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut TrailConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn without_diffusion(self) -> Self {
        self.with_config(|c| c.diffusion_enabled = false)
    }

    pub fn without_evaporation(self) -> Self {
        self.with_config(|c| c.evaporation_per_sec = 0.0)
    }

    /// Deposits at the center of cell `(cx, cy)`.
    pub fn with_deposit(mut self, cx: usize, cy: usize, amount: f32, author: u32, tick: Tick) -> Self {
        self.mods.push(Box::new(move |field| {
            let (x, y) = cell_center(field, cx, cy);
            field.deposit(x, y, amount, author, tick);
        }));
        self
    }

    /// Captures a snapshot after all deposits.
    pub fn published(mut self) -> Self {
        self.publish = true;
        self
    }

    pub fn build(self) -> TrailField {
        let mut field = TrailField::with_viewport(self.config, self.width, self.height);
        for modifier in self.mods {
            modifier(&mut field);
        }
        if self.publish {
            field.capture_snapshot();
        }
        field
    }
}

/// Pixel position of the center of cell `(cx, cy)`.
#[allow(dead_code)]
pub fn cell_center(field: &TrailField, cx: usize, cy: usize) -> (f32, f32) {
    let s = field.cell_size();
    ((cx as f32 + 0.5) * s, (cy as f32 + 0.5) * s)
}

/// Live amount of cell `(cx, cy)`.
#[allow(dead_code)]
pub fn amount_at(field: &TrailField, cx: usize, cy: usize) -> f32 {
    field.live().amount[cy * field.width() + cx]
}

#[allow(dead_code)]
pub fn total_mass(field: &TrailField) -> f64 {
    field.live().amount.iter().map(|v| f64::from(*v)).sum()
}
