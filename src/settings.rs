use crate::{errors::SlimeError, kernel::Kernel, trail::DiffusionStrategy};
use config::{Config, Environment, File, FileFormat};
use log::info;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";
/// Environment variable naming an alternative settings file.
pub const SETTINGS_FILE_ENV_VAR: &str = "SLIME_SETTINGS";
/// Prefix of environment variables overriding individual settings, e.g. `SLIME_AGENT_COUNT`.
pub const SETTINGS_ENV_PREFIX: &str = "SLIME";

// Field settings
pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;
pub const FIELD_DIMENSION_MAXIMUM: u32 = 8192;

// Agent settings
pub const AGENT_COUNT: usize = 5000;
pub const AGENT_COUNT_MAXIMUM: usize = 1_000_000;
pub const AGENT_SPEED: f64 = 5.0;
pub const AGENT_TURN_SPEED: f64 = 10.0;
pub const DELTA_TIME: f64 = 1.0;
pub const SENSOR_OFFSET_DISTANCE: f64 = 35.0;
pub const SENSOR_SIZE: u32 = 1;
pub const SENSOR_SIZE_MAXIMUM: u32 = 8;
pub const SENSE_WEIGHT: f64 = 3.0;
/// Angle between the forward sensor and each side sensor. (In degrees)
pub const SENSOR_ANGLE: f64 = 90.0;
pub const DEPOSITION_AMOUNT: f64 = 255.0;
pub const DEPOSIT_SIZE: u32 = 4;
pub const DEPOSIT_SIZE_MAXIMUM: u32 = 32;

// Trail settings
pub const TRAIL_MAXIMUM: f64 = 255.0;
/// Fraction of the trail that survives each tick. An 8-bit surface faded by 230/255 every frame.
pub const DECAY_FACTOR: f64 = 230.0 / 255.0;
pub const DIFFUSION_RADIUS: usize = 1;
pub const DIFFUSION_RADIUS_MAXIMUM: usize = 8;
pub const DIFFUSION_DIVISOR: f64 = 9.5;

// Display settings
pub const TARGET_FPS: u32 = 30;
pub const DISPLAY_SCALE: f64 = 255.0;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub field_width: u32,
    pub field_height: u32,
    pub agent_count: usize,
    pub agent_speed: f64,
    pub turn_speed: f64,
    pub delta_time: f64,
    pub sensor_offset_distance: f64,
    pub sensor_size: u32,
    pub sense_weight: f64,
    pub sensor_angle: f64,
    pub deposition_amount: f64,
    pub deposit_size: u32,
    pub trail_maximum: Option<f64>,
    pub decay_factor: f64,
    pub diffusion_radius: usize,
    pub diffusion_divisor: f64,
    pub diffusion_strategy: DiffusionStrategy,
    pub seed: Option<u64>,
    pub target_fps: u32,
    pub display_scale: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: WIDTH,
            field_height: HEIGHT,
            agent_count: AGENT_COUNT,
            agent_speed: AGENT_SPEED,
            turn_speed: AGENT_TURN_SPEED,
            delta_time: DELTA_TIME,
            sensor_offset_distance: SENSOR_OFFSET_DISTANCE,
            sensor_size: SENSOR_SIZE,
            sense_weight: SENSE_WEIGHT,
            sensor_angle: SENSOR_ANGLE,
            deposition_amount: DEPOSITION_AMOUNT,
            deposit_size: DEPOSIT_SIZE,
            trail_maximum: Some(TRAIL_MAXIMUM),
            decay_factor: DECAY_FACTOR,
            diffusion_radius: DIFFUSION_RADIUS,
            diffusion_divisor: DIFFUSION_DIVISOR,
            diffusion_strategy: DiffusionStrategy::default(),
            seed: None,
            target_fps: TARGET_FPS,
            display_scale: DISPLAY_SCALE,
        }
    }
}

impl Settings {
    /// Loads settings from `settings_file_name`, then applies `SLIME_*` environment overrides.
    pub fn load_from_file(settings_file_name: &str) -> Result<Self, SlimeError> {
        let settings = Self::load(File::with_name(settings_file_name))?;

        info!(
            "successfully loaded settings from '{}'",
            &settings_file_name
        );

        Ok(settings)
    }

    /// Like [`Settings::load_from_file`], but a missing file just means defaults.
    pub fn load_or_default(settings_file_name: &str) -> Result<Self, SlimeError> {
        Self::load(File::with_name(settings_file_name).required(false))
    }

    /// Parses settings from TOML text. Environment overrides are not applied.
    pub fn from_toml_str(contents: &str) -> Result<Self, SlimeError> {
        let mut settings = Config::default();
        settings.merge(File::from_str(contents, FileFormat::Toml))?;
        let settings: Settings = settings.try_into()?;
        settings.validate()?;

        Ok(settings)
    }

    fn load<T>(source: T) -> Result<Self, SlimeError>
    where
        T: config::Source + Send + Sync + 'static,
    {
        let mut settings = Config::default();
        settings.merge(source)?;
        settings.merge(Environment::with_prefix(SETTINGS_ENV_PREFIX))?;
        let settings: Settings = settings.try_into()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Rejects every configuration that can't produce a valid simulation.
    pub fn validate(&self) -> Result<(), SlimeError> {
        if self.field_width == 0 || self.field_height == 0 {
            return Err(SlimeError::InvalidDimensions {
                width: self.field_width,
                height: self.field_height,
            });
        }

        if self.field_width > FIELD_DIMENSION_MAXIMUM
            || self.field_height > FIELD_DIMENSION_MAXIMUM
        {
            return Err(SlimeError::InvalidSetting {
                name: "field_width/field_height",
                reason: format!(
                    "{}x{} is larger than {}x{}",
                    self.field_width,
                    self.field_height,
                    FIELD_DIMENSION_MAXIMUM,
                    FIELD_DIMENSION_MAXIMUM
                ),
            });
        }

        if self.agent_count == 0 {
            return Err(SlimeError::NoAgents);
        }

        at_most("agent_count", self.agent_count, AGENT_COUNT_MAXIMUM)?;
        at_most("sensor_size", self.sensor_size as usize, SENSOR_SIZE_MAXIMUM as usize)?;
        at_most("deposit_size", self.deposit_size as usize, DEPOSIT_SIZE_MAXIMUM as usize)?;
        at_most("diffusion_radius", self.diffusion_radius, DIFFUSION_RADIUS_MAXIMUM)?;

        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(SlimeError::InvalidDecayFactor(self.decay_factor));
        }

        Kernel::box_blur(self.diffusion_radius, self.diffusion_divisor)?;

        non_negative("agent_speed", self.agent_speed)?;
        non_negative("turn_speed", self.turn_speed)?;
        positive("delta_time", self.delta_time)?;
        non_negative("sensor_offset_distance", self.sensor_offset_distance)?;
        non_negative("sense_weight", self.sense_weight)?;
        finite("sensor_angle", self.sensor_angle)?;
        non_negative("deposition_amount", self.deposition_amount)?;
        positive("display_scale", self.display_scale)?;

        if let Some(maximum) = self.trail_maximum {
            positive("trail_maximum", maximum)?;
        }

        if self.deposit_size == 0 {
            return Err(SlimeError::InvalidSetting {
                name: "deposit_size",
                reason: "an agent's footprint must cover at least one cell".to_owned(),
            });
        }

        if self.target_fps == 0 {
            return Err(SlimeError::InvalidSetting {
                name: "target_fps",
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(())
    }

    pub fn log_summary(&self) {
        info!(
            r#"
FIELD	{}x{}
AGENT_COUNT	{:?}
AGENT_SPEED	{:?}
AGENT_TURN_SPEED	{:?}
DELTA_TIME	{:?}
SENSOR_OFFSET	{:?}
SENSOR_SIZE	{:?}
SENSE_WEIGHT	{:?}
SENSOR_ANGLE	{:?}
DEPOSITION_AMOUNT	{:?}
DEPOSIT_SIZE	{:?}
TRAIL_MAXIMUM	{:?}
DECAY_FACTOR	{:?}
DIFFUSION	radius {:?} / divisor {:?} ({:?})
"#,
            self.field_width,
            self.field_height,
            self.agent_count,
            self.agent_speed,
            self.turn_speed,
            self.delta_time,
            self.sensor_offset_distance,
            self.sensor_size,
            self.sense_weight,
            self.sensor_angle,
            self.deposition_amount,
            self.deposit_size,
            self.trail_maximum,
            self.decay_factor,
            self.diffusion_radius,
            self.diffusion_divisor,
            self.diffusion_strategy,
        );
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), SlimeError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SlimeError::InvalidSetting {
            name,
            reason: format!("must be finite, got {}", value),
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SlimeError> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SlimeError::InvalidSetting {
            name,
            reason: format!("must not be negative, got {}", value),
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), SlimeError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SlimeError::InvalidSetting {
            name,
            reason: format!("must be positive, got {}", value),
        })
    }
}

fn at_most(name: &'static str, value: usize, maximum: usize) -> Result<(), SlimeError> {
    if value <= maximum {
        Ok(())
    } else {
        Err(SlimeError::InvalidSetting {
            name,
            reason: format!("must be at most {}, got {}", maximum, value),
        })
    }
}
