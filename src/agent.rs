use crate::{
    rect::Rect,
    settings::{
        Settings, AGENT_SPEED, AGENT_TURN_SPEED, DELTA_TIME, DEPOSITION_AMOUNT, DEPOSIT_SIZE,
        SENSE_WEIGHT, SENSOR_OFFSET_DISTANCE, SENSOR_SIZE,
    },
    trail::TrailField,
    Point2,
};
use log::trace;
use rand::prelude::*;
use rand::rngs::SmallRng;
use std::f64::consts::{FRAC_PI_2, TAU};
use typed_builder::TypedBuilder;

/// Weighted sums read by the (left, forward, right) sensors.
pub type SensorReading = (f64, f64, f64);

#[derive(TypedBuilder, Clone, Debug)]
pub struct Agent {
    // Only used to tell agents apart in logs
    #[builder(default)]
    id: usize,
    position: Point2<f64>,
    // The heading an agent is facing. (In radians, from the +x axis towards +y)
    #[builder(default)]
    heading: f64,
    // Distance covered per unit of time
    #[builder(default = AGENT_SPEED)]
    speed: f64,
    // Scales the turning speed; see `turning_speed`
    #[builder(default = AGENT_TURN_SPEED)]
    turn_speed: f64,
    #[builder(default = DELTA_TIME)]
    delta_time: f64,
    // How far out a sensor is from the agent
    #[builder(default = SENSOR_OFFSET_DISTANCE)]
    sensor_offset_distance: f64,
    // Half the side of the square window a sensor sums over, minus the centre cell
    #[builder(default = SENSOR_SIZE)]
    sensor_size: u32,
    #[builder(default = SENSE_WEIGHT)]
    sense_weight: f64,
    // Angle between the forward sensor and each side sensor. (In radians)
    #[builder(default = FRAC_PI_2)]
    sensor_angle: f64,
    #[builder(default = DEPOSITION_AMOUNT)]
    deposition_amount: f64,
    // Side of the square footprint left on the trail
    #[builder(default = DEPOSIT_SIZE)]
    deposit_size: u32,
    #[builder(default = default_rng())]
    rng: SmallRng,
}

impl Agent {
    /// A new agent at a uniformly random position with a random heading. Its own
    /// generator is seeded from `rng`, so a seeded `rng` gives a reproducible agent.
    pub fn new_from_settings<R: Rng>(id: usize, settings: &Settings, rng: &mut R) -> Self {
        let position = Point2::new(
            rng.gen_range(0.0..(settings.field_width as f64)),
            rng.gen_range(0.0..(settings.field_height as f64)),
        );

        let mut agent = Agent::builder()
            .id(id)
            .position(position)
            .speed(settings.agent_speed)
            .turn_speed(settings.turn_speed)
            .delta_time(settings.delta_time)
            .sensor_offset_distance(settings.sensor_offset_distance)
            .sensor_size(settings.sensor_size)
            .sense_weight(settings.sense_weight)
            .sensor_angle(settings.sensor_angle.to_radians())
            .deposition_amount(settings.deposition_amount)
            .deposit_size(settings.deposit_size)
            .rng(SmallRng::seed_from_u64(rng.gen()))
            .build();

        agent.randomize_heading();
        agent
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Largest turn per tick, in radians.
    ///
    /// Computed as `turn_speed · 2π · delta_time`, a quantity measured in
    /// degrees, so the reference `turn_speed` of 10 allows turns of about 63°.
    pub fn turning_speed(&self) -> f64 {
        (self.turn_speed * TAU * self.delta_time).to_radians()
    }

    /// Sums the trail in a square window around a probe point
    /// `sensor_offset_distance` away in the direction `heading + angle_offset`.
    pub fn sense(&self, trail: &TrailField, angle_offset: f64) -> f64 {
        let probe = self
            .position
            .offset(self.heading + angle_offset, self.sensor_offset_distance);
        // truncation, not flooring, picks the probe cell
        let (probe_x, probe_y) = (probe.x() as i64, probe.y() as i64);
        let size = self.sensor_size as i64;

        let mut sum = 0.0;
        for offset_x in -size..=size {
            for offset_y in -size..=size {
                sum += self.sense_weight
                    * trail.sample(
                        probe_x.saturating_add(offset_x),
                        probe_y.saturating_add(offset_y),
                    );
            }
        }

        sum
    }

    pub fn read_sensors(&self, trail: &TrailField) -> SensorReading {
        (
            self.sense(trail, self.sensor_angle),
            self.sense(trail, 0.0),
            self.sense(trail, -self.sensor_angle),
        )
    }

    /// Picks a rotation (in radians) from the three sensor readings.
    ///
    /// Holding course wins every tie with a side sensor. When both sides beat
    /// the forward sensor the agent turns a random amount either way;
    /// otherwise it turns a random amount towards the stronger side.
    pub fn judge_sensory_input(&mut self, (left, forward, right): SensorReading) -> f64 {
        let turning_speed = self.turning_speed();

        if forward >= left && forward >= right {
            trace!("Agent {}'s forward reading is strongest, holding course", self.id);
            0.0
        } else if forward < left && forward < right {
            trace!("Agent {} has no clear gradient, turning randomly", self.id);
            (self.rng.gen::<f64>() - 0.5) * 2.0 * turning_speed
        } else if right > left {
            trace!("Agent {} is turning right", self.id);
            -self.rng.gen::<f64>() * turning_speed
        } else if right < left {
            trace!("Agent {} is turning left", self.id);
            self.rng.gen::<f64>() * turning_speed
        } else {
            // only NaN readings get this far
            trace!("Agent {} is doing nothing (final fallthrough case)", self.id);
            0.0
        }
    }

    pub fn rotate(&mut self, rotation_in_radians: f64) {
        self.heading = wrap_angle(self.heading + rotation_in_radians);
        trace!("new heading is {}", self.heading);
    }

    /// Senses `trail` and turns. Does not move the agent.
    pub fn steer(&mut self, trail: &TrailField) {
        let sensory_input = self.read_sensors(trail);
        let rotation_towards_sensory_input = self.judge_sensory_input(sensory_input);
        self.rotate(rotation_towards_sensory_input);
    }

    /// Advances along the current heading. Bounds are not enforced here.
    pub fn move_forward(&mut self) {
        let step = self.speed * self.delta_time;
        let direction = Point2::unit(self.heading);

        self.position
            .move_relative(direction.x() * step, direction.y() * step);
    }

    /// Pulls the agent back inside `boundary_rect`, picking a new random heading
    /// if it had left. Returns whether it had.
    pub fn bounce(&mut self, boundary_rect: &Rect<u32>) -> bool {
        if boundary_rect.clamp(&mut self.position) {
            trace!("Agent {} bounced off the edge at {}", self.id, self.position);
            self.randomize_heading();
            true
        } else {
            false
        }
    }

    pub fn randomize_heading(&mut self) {
        // Sampling inside the unit disc keeps every direction equally likely.
        // The zero vector has no direction and is drawn again.
        let direction = loop {
            let candidate: Point2<f64> = Point2::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            let magnitude_squared = candidate.magnitude_squared();

            if magnitude_squared > 0.0 && magnitude_squared <= 1.0 {
                break candidate;
            }
        };

        self.heading = wrap_angle(direction.angle());
    }

    /// Leaves this agent's footprint on `trail`.
    pub fn deposit(&self, trail: &mut TrailField) {
        trail.deposit_square(self.position, self.deposit_size, self.deposition_amount);
    }
}

/// Wraps an angle in radians into `[0, 2π)`.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);

    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

fn default_rng() -> SmallRng {
    SmallRng::from_entropy()
}
