//! Tempo Core headless demo
//!
//! Runs a scripted encounter against the core and logs what happened.
//! Usage: `tempo-core [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::rc::Rc;

    use glam::Vec2;
    use tempo_core::audio::LogSink;
    use tempo_core::consts::FRAME_MS;
    use tempo_core::sim::state::ENEMY_HP;
    use tempo_core::sim::{CoreEvent, Encounter, EncounterOutcome, FrameInput, PlayerCommand, TileGrid};
    use tempo_core::{AudioBus, Settings};

    env_logger::init();
    log::info!("Tempo Core (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);

    let map = TileGrid::from_rows(&[
        "####################",
        "#..................#",
        "#....P.......\"\"....#",
        "#..................#",
        "#.......D..........#",
        "#..................#",
        "#....P.............#",
        "#..................#",
        "####################",
    ]);
    let audio = Rc::new(AudioBus::with_settings(Box::new(LogSink), &settings.audio));
    let mut encounter = Encounter::new(&settings, map, Vec2::new(64.0, 144.0), seed, audio);
    encounter.spawn_enemy(Vec2::new(520.0, 80.0), 40, ENEMY_HP);
    encounter.spawn_enemy(Vec2::new(520.0, 208.0), 30, ENEMY_HP);

    let mut reaction_frames = 0u32;
    let mut dodged = 0u32;
    let mut impacts = 0u32;
    for _ in 0..20_000 {
        if encounter.outcome() != EncounterOutcome::Ongoing {
            break;
        }
        if let Some(actor) = encounter.next_turn() {
            if actor == encounter.player.actor {
                let target = encounter.enemies.first().map_or(Vec2::ZERO, |e| e.pos);
                let command = if encounter.scheduler.turn_count() % 3 == 2 {
                    PlayerCommand::FireSpread(target)
                } else {
                    PlayerCommand::FireAimed(target)
                };
                encounter.player_command(command);
            }
        }

        // Simulated reflexes: react on the 12th frame of every window
        reaction_frames = if encounter.reaction_pending() { reaction_frames + 1 } else { 0 };
        let input = FrameInput {
            dodge: reaction_frames == 12,
            focus: None,
        };
        encounter.frame(&input, FRAME_MS);

        for event in encounter.drain_events() {
            match event {
                CoreEvent::ReactionWindowSucceeded => dodged += 1,
                CoreEvent::ImpactFreezeStarted => impacts += 1,
                _ => {}
            }
        }
    }

    log::info!(
        "Finished after {} frames: {:?}, {} turns, player hp {}, {} dodges, {} grazes, {} kills",
        encounter.frame_count,
        encounter.outcome(),
        encounter.scheduler.turn_count(),
        encounter.player.hp,
        dodged,
        encounter.graze_count,
        impacts,
    );
    println!(
        "{:?} after {} frames ({} turns)",
        encounter.outcome(),
        encounter.frame_count,
        encounter.scheduler.turn_count()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on wasm; hosts drive it directly
}
