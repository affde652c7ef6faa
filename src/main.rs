use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use slime_trails::{
    errors::SlimeError,
    presets::init_preset_manager,
    render::{Frame, FramePainter, RenderSink},
    settings::{Settings, DEFAULT_SETTINGS_FILE, SETTINGS_FILE_ENV_VAR},
    timing::{frame_period, FrameTimer},
    Simulation, StopSignal,
};
use std::time::Instant;
use winit::{
    dpi::LogicalSize,
    event::{Event, VirtualKeyCode},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use winit_input_helper::WinitInputHelper;

/// Number of frames the FPS counter averages over
const FPS_WINDOW: usize = 30;

struct PixelsSink<'a> {
    pixels: &'a mut Pixels,
    painter: &'a FramePainter,
}

impl RenderSink for PixelsSink<'_> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), SlimeError> {
        self.painter.paint(frame, self.pixels.get_frame())?;
        self.pixels
            .render()
            .map_err(|e| SlimeError::Render(e.to_string()))
    }
}

fn main() -> Result<(), SlimeError> {
    dotenv::dotenv().ok();
    env_logger::init();

    let settings_file_name =
        std::env::var(SETTINGS_FILE_ENV_VAR).unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_owned());
    let settings = Settings::load_or_default(&settings_file_name)?;
    let (field_width, field_height) = (settings.field_width, settings.field_height);
    let presets = init_preset_manager();
    let mut preset_index = None;

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let window = {
        let size = LogicalSize::new(field_width as f64, field_height as f64);
        WindowBuilder::new()
            .with_title("Slime")
            .with_inner_size(size)
            .with_min_inner_size(size)
            .build(&event_loop)?
    };

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(field_width, field_height, surface_texture)?
    };

    let mut painter = FramePainter::new(settings.display_scale);
    let period = frame_period(settings.target_fps);
    let mut simulation = Simulation::new(settings)?;
    let mut frame_timer = FrameTimer::new(FPS_WINDOW);
    let stop = StopSignal::new();
    let mut next_tick = Instant::now();

    info!("press C to toggle color, A to show agents, P to cycle presets, Escape to quit");

    event_loop.run(move |event, _, control_flow| {
        // Draw the current frame
        if let Event::RedrawRequested(_) = event {
            let mut sink = PixelsSink {
                pixels: &mut pixels,
                painter: &painter,
            };

            if let Err(e) = simulation.render_to(&mut sink) {
                error!("rendering failed: {}", e);
                stop.stop();
            }
        }

        // Handle input events
        if input.update(&event) {
            // Close events
            if input.key_pressed(VirtualKeyCode::Escape) || input.quit() {
                stop.stop();
            }

            if input.key_pressed(VirtualKeyCode::C) {
                painter.toggle_color_mode();
            }

            if input.key_pressed(VirtualKeyCode::A) {
                painter.toggle_agents();
            }

            if input.key_pressed(VirtualKeyCode::P) {
                if let Some((index, preset)) = presets.next_after(preset_index) {
                    match Simulation::new(preset.settings_for_field(field_width, field_height)) {
                        Ok(new_simulation) => {
                            info!("switched to preset '{}'", preset.name);
                            simulation = new_simulation;
                            preset_index = Some(index);
                        }
                        Err(e) => warn!("couldn't load preset '{}': {}", preset.name, e),
                    }
                }
            }

            // Resize the window
            if let Some(size) = input.window_resized() {
                pixels.resize_surface(size.width, size.height);
            }

            // Update internal state and request a redraw
            let now = Instant::now();
            if now >= next_tick {
                simulation.step();
                frame_timer.tick();
                next_tick = now + period;

                if simulation.ticks() % FPS_WINDOW as u64 == 0 {
                    if let Some(fps) = frame_timer.frames_per_second() {
                        window.set_title(&format!("Slime - {:.0} fps", fps));
                    }
                }

                window.request_redraw();
            }
        }

        if stop.is_stopped() {
            info!("exiting after {} ticks", simulation.ticks());
            *control_flow = ControlFlow::Exit;
        } else {
            *control_flow = ControlFlow::WaitUntil(next_tick);
        }
    });
}
