use anyhow::Context;
use clap::Parser;
use floorplan_acoustics::render::quantize;
use floorplan_acoustics::{
    init_tracing, mask, InputEvent, InputSource, Key, LoopState, MouseButton, Orchestrator, Rgb,
    SimConfig,
};
use macroquad::prelude::{
    clear_background, draw_text, draw_texture_ex, get_fps, is_key_pressed,
    is_mouse_button_pressed, mouse_position, next_frame, screen_height, screen_width, vec2,
    Color, Conf, DrawTextureParams, FilterMode, KeyCode, BLACK, WHITE,
};
use macroquad::texture::{Image, Texture2D};
use ndarray::Array2;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{error, info};

/// Interactive acoustic simulator: click to clap, Esc to quit, R to reset.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Floor-plan image; dark strokes become walls. Omit for open air.
    #[arg(short, long)]
    floorplan: Option<PathBuf>,

    /// TOML file overriding the simulation constants.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Floor-plan Acoustics".to_string(),
        window_width: 600,
        window_height: 600,
        ..Default::default()
    }
}

/// Collects this frame's macroquad input into simulator events.
#[derive(Default)]
struct MacroquadInput {
    pending: VecDeque<InputEvent>,
}

impl MacroquadInput {
    fn poll_window(&mut self) {
        if is_mouse_button_pressed(macroquad::input::MouseButton::Left) {
            let (mx, my) = mouse_position();
            self.pending.push_back(InputEvent::Press {
                button: MouseButton::Primary,
                position: (mx / screen_width(), my / screen_height()),
            });
        }
        if is_key_pressed(KeyCode::Escape) {
            self.pending.push_back(InputEvent::Key(Key::Escape));
        }
        if is_key_pressed(KeyCode::R) {
            self.pending.push_back(InputEvent::Key(Key::Reset));
        }
    }
}

impl InputSource for MacroquadInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }
}

/// Copy the color buffer into the RGBA image backing the window texture.
fn blit(pixels: &Array2<Rgb>, image: &mut Image) {
    let width = pixels.dim().0;
    image
        .bytes
        .par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, rgba) in row.chunks_exact_mut(4).enumerate() {
                let [r, g, b] = pixels[[x, y]];
                rgba[0] = quantize(r);
                rgba[1] = quantize(g);
                rgba[2] = quantize(b);
                rgba[3] = 255;
            }
        });
}

fn setup() -> anyhow::Result<Orchestrator> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => SimConfig::default(),
    };
    config.log_summary();

    let walls = mask::acquire(cli.floorplan.as_deref(), config.width(), config.height());
    Orchestrator::new(config, walls).context("Refusing to start the simulation")
}

#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();
    info!("Floor-plan acoustics starting...");

    let mut orchestrator = match setup() {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("{e:#}");
            return;
        }
    };

    let (width, height) = (orchestrator.config().width(), orchestrator.config().height());
    let mut image = Image::gen_image_color(width as u16, height as u16, BLACK);
    let texture = Texture2D::from_image(&image);
    texture.set_filter(FilterMode::Nearest);
    let mut input = MacroquadInput::default();

    info!("Simulator ready");
    loop {
        input.poll_window();
        match orchestrator.run_frame(&mut input) {
            Ok(LoopState::Running) => {}
            Ok(LoopState::Terminated) => break,
            Err(e) => {
                error!("Stopping simulation: {e}");
                break;
            }
        }

        blit(orchestrator.pixels(), &mut image);
        texture.update(&image);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        let hud = format!("frame {}  |  {} fps", orchestrator.frame(), get_fps());
        draw_text(&hud, 10.0, 20.0, 24.0, Color::new(1.0, 1.0, 1.0, 0.8));

        next_frame().await
    }

    info!("Simulation ended after {} frames", orchestrator.frame());
}
