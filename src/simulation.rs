use crate::{
    agent::Agent,
    errors::SlimeError,
    rect::Rect,
    render::{Frame, RenderSink},
    settings::Settings,
    trail::TrailField,
};
use log::{debug, info};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Ends [`Simulation::run`]. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns the trail and the agents and advances them in lockstep.
pub struct Simulation {
    agents: Vec<Agent>,
    trail: TrailField,
    settings: Settings,
    boundary_rect: Rect<u32>,
    seed: u64,
    ticks: u64,
}

impl Simulation {
    /// Validates `settings` and scatters `agent_count` agents over an empty trail.
    ///
    /// Without a configured seed one is drawn and logged so the run can be repeated.
    pub fn new(settings: Settings) -> Result<Self, SlimeError> {
        settings.validate()?;

        let seed = settings.seed.unwrap_or_else(|| thread_rng().gen());
        info!("seeding simulation with {}", seed);
        settings.log_summary();

        let trail = TrailField::from_settings(&settings)?;

        info!("generating {} agents", settings.agent_count);
        let mut rng = SmallRng::seed_from_u64(seed);
        let agents: Vec<_> = (0..settings.agent_count)
            .map(|id| Agent::new_from_settings(id, &settings, &mut rng))
            .collect();

        Ok(Self::assemble(settings, trail, agents, seed))
    }

    /// Builds a simulation around agents placed by the caller. `agent_count` is
    /// taken from `agents` and every agent must start inside the field.
    ///
    /// Only the field, trail and seed settings apply. Each agent keeps the speed,
    /// turning, sensor and deposit tunables it was built with, so use
    /// [`Agent::new_from_settings`] when `settings` should drive those too.
    pub fn with_agents(settings: Settings, agents: Vec<Agent>) -> Result<Self, SlimeError> {
        if agents.is_empty() {
            return Err(SlimeError::NoAgents);
        }

        let settings = Settings {
            agent_count: agents.len(),
            ..settings
        };
        settings.validate()?;

        let boundary_rect = Rect::new(0, 0, settings.field_width, settings.field_height);
        if let Some(agent) = agents
            .iter()
            .find(|agent| !boundary_rect.contains(&agent.position()))
        {
            return Err(SlimeError::AgentOutOfBounds { id: agent.id() });
        }

        let trail = TrailField::from_settings(&settings)?;
        let seed = settings.seed.unwrap_or_default();

        Ok(Self::assemble(settings, trail, agents, seed))
    }

    fn assemble(settings: Settings, trail: TrailField, agents: Vec<Agent>, seed: u64) -> Self {
        let boundary_rect = Rect::new(0, 0, settings.field_width, settings.field_height);

        Self {
            agents,
            trail,
            settings,
            boundary_rect,
            seed,
            ticks: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn trail(&self) -> &TrailField {
        &self.trail
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances one tick: decay, diffuse, steer every agent, move and bounce
    /// every agent, then deposit every agent's footprint.
    pub fn step(&mut self) {
        self.trail.decay(self.settings.decay_factor);
        self.trail.diffuse();

        // All agents sense the same trail; nothing is deposited until everyone has steered.
        let trail = &self.trail;
        self.agents
            .par_iter_mut()
            .for_each(|agent| agent.steer(trail));

        let boundary_rect = &self.boundary_rect;
        self.agents.par_iter_mut().for_each(|agent| {
            agent.move_forward();
            agent.bounce(boundary_rect);
        });

        let trail = &mut self.trail;
        self.agents.iter().for_each(|agent| agent.deposit(trail));

        self.ticks += 1;
        debug!(
            "finished tick {}, total trail mass is {}",
            self.ticks,
            self.trail.total_mass()
        );
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame::new(self.ticks, &self.trail, &self.agents)
    }

    pub fn render_to<S: RenderSink + ?Sized>(&self, sink: &mut S) -> Result<(), SlimeError> {
        sink.render(&self.frame())
    }

    /// One step followed by handing the result to `sink`.
    pub fn tick<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), SlimeError> {
        self.step();
        self.render_to(sink)
    }

    /// Ticks until `stop` is raised, returning the number of ticks run so far.
    pub fn run<S: RenderSink + ?Sized>(
        &mut self,
        sink: &mut S,
        stop: &StopSignal,
    ) -> Result<u64, SlimeError> {
        info!("running simulation with {} agents", self.agents.len());

        while !stop.is_stopped() {
            self.tick(sink)?;
        }

        info!("simulation stopped after {} ticks", self.ticks);
        Ok(self.ticks)
    }
}
