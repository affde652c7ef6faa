//! The boundary between the engine and whatever puts it on screen.

use crate::{agent::Agent, errors::SlimeError, trail::TrailField, Point2};
use colorgrad::Gradient;

/// Consumes one frame per tick. Sinks only ever see a read-only view.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), SlimeError>;
}

/// A read-only view of the simulation after a tick.
pub struct Frame<'a> {
    tick: u64,
    trail: &'a TrailField,
    agents: &'a [Agent],
}

impl<'a> Frame<'a> {
    pub fn new(tick: u64, trail: &'a TrailField, agents: &'a [Agent]) -> Self {
        Self {
            tick,
            trail,
            agents,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn trail(&self) -> &'a TrailField {
        self.trail
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_positions(&self) -> impl Iterator<Item = Point2<f64>> + 'a {
        self.agents.iter().map(Agent::position)
    }
}

pub enum Palette {
    Grayscale,
    Gradient(Gradient),
}

const AGENT_COLOR: [u8; 4] = [0xff, 0x40, 0x40, 0xff];

/// Paints frames into an RGBA8 buffer with one pixel per trail cell.
pub struct FramePainter {
    palette: Palette,
    // Trail concentration shown at full brightness
    display_scale: f64,
    show_agents: bool,
}

impl FramePainter {
    pub fn new(display_scale: f64) -> Self {
        Self {
            palette: Palette::Grayscale,
            display_scale,
            show_agents: false,
        }
    }

    /// Switches between black & white and a color gradient.
    pub fn toggle_color_mode(&mut self) {
        self.palette = match self.palette {
            Palette::Grayscale => Palette::Gradient(colorgrad::turbo()),
            Palette::Gradient(_) => Palette::Grayscale,
        };
    }

    pub fn toggle_agents(&mut self) {
        self.show_agents = !self.show_agents;
    }

    /// Assumes the buffer and the trail grid have the same dimensions.
    pub fn paint(&self, frame: &Frame<'_>, buffer: &mut [u8]) -> Result<(), SlimeError> {
        let trail = frame.trail();
        if buffer.len() != trail.len() * 4 {
            return Err(SlimeError::Render(format!(
                "pixel buffer {{len = {}}} and trail grid {{len = {}}} length mismatch",
                buffer.len() / 4,
                trail.len()
            )));
        }

        for (pixel, concentration) in buffer.chunks_exact_mut(4).zip(trail.iter()) {
            // clamp to renderable range
            let intensity = (concentration / self.display_scale).max(0.0).min(1.0);

            match &self.palette {
                Palette::Grayscale => {
                    let value = (intensity * 255.0).round() as u8;
                    pixel.copy_from_slice(&[value, value, value, 0xff]);
                }
                Palette::Gradient(gradient) => {
                    let (r, g, b, a) = gradient.at(intensity).rgba_u8();
                    pixel.copy_from_slice(&[r, g, b, a]);
                }
            }
        }

        if self.show_agents {
            let width = trail.width();
            for position in frame.agent_positions() {
                let (col, row) = (position.x() as usize, position.y() as usize);
                if col < width && row < trail.height() {
                    let offset = (row * width + col) * 4;
                    buffer[offset..offset + 4].copy_from_slice(&AGENT_COLOR);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn grayscale_maps_concentration_onto_brightness() {
        let mut trail = TrailField::new(2, 1).unwrap();
        trail.deposit(0, 0, 127.5);
        trail.deposit(1, 0, 1000.0);
        let painter = FramePainter::new(255.0);
        let mut buffer = vec![0u8; 8];

        painter
            .paint(&Frame::new(0, &trail, &[]), &mut buffer)
            .unwrap();

        assert_eq!(buffer, vec![128, 128, 128, 0xff, 255, 255, 255, 0xff]);
    }

    #[test]
    fn agents_are_marked_when_enabled() {
        let trail = TrailField::new(3, 3).unwrap();
        let agents = vec![Agent::builder()
            .position(Point2::new(1.4, 2.9))
            .rng(SmallRng::seed_from_u64(1))
            .build()];
        let mut painter = FramePainter::new(255.0);
        painter.toggle_agents();
        let mut buffer = vec![0u8; 36];

        painter
            .paint(&Frame::new(3, &trail, &agents), &mut buffer)
            .unwrap();

        let offset = (2 * 3 + 1) * 4;
        assert_eq!(&buffer[offset..offset + 4], &AGENT_COLOR);
        assert_eq!(&buffer[0..4], &[0, 0, 0, 0xff]);
    }

    #[test]
    fn gradient_palette_paints_opaque_pixels() {
        let mut trail = TrailField::new(2, 2).unwrap();
        trail.deposit(1, 1, 100.0);
        let mut painter = FramePainter::new(255.0);
        painter.toggle_color_mode();
        let mut buffer = vec![0u8; 16];

        painter
            .paint(&Frame::new(0, &trail, &[]), &mut buffer)
            .unwrap();

        assert!(buffer.chunks_exact(4).all(|pixel| pixel[3] == 0xff));
        assert_ne!(&buffer[0..4], &buffer[12..16]);
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        let trail = TrailField::new(4, 4).unwrap();
        let painter = FramePainter::new(255.0);
        let mut buffer = vec![0u8; 10];

        assert!(matches!(
            painter.paint(&Frame::new(0, &trail, &[]), &mut buffer),
            Err(SlimeError::Render(_))
        ));
    }
}
