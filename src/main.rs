//! Pinpon entry point
//!
//! There is no window here: the binary runs a headless autoplay match and
//! logs what happens, which is handy for checking tuning files.
//!
//! Usage: `pinpon [settings.json] [seed] [seconds]`

use pinpon::consts::SIM_DT;
use pinpon::hud::Hud;
use pinpon::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use pinpon::{Difficulty, Settings};

fn main() {
    env_logger::init();
    log::info!("Pinpon (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(arg) => match Difficulty::from_str(&arg) {
            Some(difficulty) => Settings::from_difficulty(difficulty),
            None => Settings::load(&arg),
        },
        None => Settings::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(60.0);

    log::info!(
        "Difficulty {} | seed {} | {:.0}s",
        settings.difficulty.as_str(),
        seed,
        seconds
    );

    let mut state = GameState::with_settings(seed, settings);
    let mut hud = Hud::new();
    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };

    let ticks = (seconds / SIM_DT) as u64;
    let mut returns = 0u32;
    for _ in 0..ticks {
        tick(&mut state, &input, SIM_DT);
        hud.observe(&state.events);
        hud.update(SIM_DT);

        for event in &state.events {
            match event {
                GameEvent::Timing(result) => {
                    returns += 1;
                    log::info!("{}", result.label().replace('\n', " / "));
                }
                GameEvent::PlayerFailed {
                    reason,
                    failures,
                    max_failures,
                } => log::info!("Point lost ({:?}) {}/{}", reason, failures, max_failures),
                _ => log::debug!("{:?}", event),
            }
        }

        if state.phase() == GamePhase::GameOver {
            break;
        }
    }

    let snapshot = hud.snapshot(&state);
    println!(
        "{:.1}s simulated, {} returns, {}",
        state.time_ticks as f32 * SIM_DT,
        returns,
        snapshot.failures
    );
    if let Some(text) = snapshot.game_over {
        println!("{}", text);
    }
}
