//! Named bundles of tunables the viewer can cycle through at runtime.

use crate::{settings::Settings, trail::DiffusionStrategy};

pub struct Preset {
    pub name: String,
    pub settings: Settings,
}

impl Preset {
    pub fn new(name: String, settings: Settings) -> Self {
        Self { name, settings }
    }

    /// This preset's tunables on a field of the given size.
    pub fn settings_for_field(&self, field_width: u32, field_height: u32) -> Settings {
        Settings {
            field_width,
            field_height,
            ..self.settings.clone()
        }
    }
}

/// Presets in the order the viewer cycles through them.
#[derive(Default)]
pub struct PresetManager {
    presets: Vec<Preset>,
}

impl PresetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_preset(&mut self, preset: Preset) {
        self.presets.push(preset);
    }

    pub fn get_preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// The preset following `current`, wrapping around. `None` starts from the first.
    pub fn next_after(&self, current: Option<usize>) -> Option<(usize, &Preset)> {
        if self.presets.is_empty() {
            return None;
        }

        let index = current.map_or(0, |i| (i + 1) % self.presets.len());
        self.presets.get(index).map(|preset| (index, preset))
    }

    pub fn get_preset_names(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.name.clone()).collect()
    }
}

pub fn init_preset_manager() -> PresetManager {
    let mut preset_manager = PresetManager::new();
    preset_manager.add_preset(Preset::new("Default".to_string(), Settings::default()));
    preset_manager.add_preset(Preset::new(
        "Serial CPU".to_string(),
        Settings {
            agent_count: 1000,
            diffusion_strategy: DiffusionStrategy::Serial,
            ..Settings::default()
        },
    ));
    preset_manager.add_preset(Preset::new(
        "Dense".to_string(),
        Settings {
            agent_count: 20000,
            agent_speed: 3.0,
            deposition_amount: 64.0,
            decay_factor: 0.95,
            ..Settings::default()
        },
    ));
    preset_manager.add_preset(Preset::new(
        "Wanderers".to_string(),
        Settings {
            agent_count: 3000,
            turn_speed: 4.0,
            sensor_offset_distance: 12.0,
            sensor_angle: 45.0,
            decay_factor: 0.8,
            ..Settings::default()
        },
    ));
    preset_manager.add_preset(Preset::new(
        "Long Reach".to_string(),
        Settings {
            agent_speed: 3.0,
            sensor_offset_distance: 70.0,
            sensor_size: 2,
            sense_weight: 1.0,
            deposit_size: 2,
            diffusion_radius: 2,
            diffusion_divisor: 26.0,
            ..Settings::default()
        },
    ));
    preset_manager
}
