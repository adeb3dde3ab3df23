//! Junkyard Dash headless runner
//!
//! Plays a seeded session with a simple autopilot and logs how it went.
//! Useful for soak-testing balance changes without a window.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use glam::Vec2;
    use junkyard_dash::consts::TICK_MS;
    use junkyard_dash::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use junkyard_dash::{Settings, Variant, distance};

    /// Throw when an enemy gets this close
    const THREAT_RANGE: f32 = 150.0;

    #[derive(Debug)]
    pub struct Cli {
        pub seed: u64,
        pub ticks: u64,
        pub variant: Option<Variant>,
        pub config: Option<PathBuf>,
        pub help: bool,
    }

    impl Default for Cli {
        fn default() -> Self {
            Self {
                seed: 1,
                ticks: 60 * 60 * 3,
                variant: None,
                config: None,
                help: false,
            }
        }
    }

    pub fn usage() -> &'static str {
        "Usage: junkyard-dash [--seed N] [--ticks N] [--variant classic|arsenal|full] [--config PATH]"
    }

    pub fn parse_args() -> Result<Cli, String> {
        let mut cli = Cli::default();
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => cli.help = true,
                "--seed" => {
                    let value = args.next().ok_or("--seed requires a value")?;
                    cli.seed = value
                        .parse()
                        .map_err(|e| format!("invalid --seed {value}: {e}"))?;
                }
                "--ticks" => {
                    let value = args.next().ok_or("--ticks requires a value")?;
                    cli.ticks = value
                        .parse()
                        .map_err(|e| format!("invalid --ticks {value}: {e}"))?;
                }
                "--variant" => {
                    let value = args.next().ok_or("--variant requires a value")?;
                    let variant = Variant::from_str(&value)
                        .ok_or_else(|| format!("unknown variant {value}"))?;
                    cli.variant = Some(variant);
                }
                "--config" => {
                    let value = args.next().ok_or("--config requires a path")?;
                    cli.config = Some(PathBuf::from(value));
                }
                other => return Err(format!("unknown argument {other}")),
            }
        }
        Ok(cli)
    }

    fn settings_for(cli: &Cli) -> Settings {
        let mut settings = match &cli.config {
            Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
                log::warn!("Ignoring settings file {}: {e}", path.display());
                Settings::default()
            }),
            None => Settings::load(),
        };
        if let Some(variant) = cli.variant {
            settings.apply_variant(variant);
        }
        settings
    }

    /// Pick this frame's input from the current state
    fn autopilot(state: &GameState) -> TickInput {
        let mut input = TickInput::default();
        match state.phase {
            GamePhase::Intro | GamePhase::GameOver => {
                input.confirm = true;
                return input;
            }
            GamePhase::BossWarning { .. } => return input,
            GamePhase::Playing => {}
        }

        let me = state.player.body.center;
        let goal = if state.player.is_carrying() {
            Some(state.cashier.body.center)
        } else {
            state
                .parts
                .iter()
                .map(|p| p.body.center)
                .min_by(|a, b| distance(me, *a).total_cmp(&distance(me, *b)))
        };
        if let Some(goal) = goal {
            steer_toward(&mut input, me, goal);
        }

        let threat = state
            .enemies
            .iter()
            .map(|e| e.body.center)
            .chain(state.boss.as_ref().map(|b| b.body.center))
            .filter(|c| distance(me, *c) < THREAT_RANGE)
            .min_by(|a, b| distance(me, *a).total_cmp(&distance(me, *b)));
        if let Some(target) = threat.filter(|_| state.player.has_boomerang) {
            input.throw = true;
            input.pointer = Some(target);
        }
        input
    }

    fn steer_toward(input: &mut TickInput, from: Vec2, to: Vec2) {
        let delta = to - from;
        let dead_zone = 2.0;
        input.left = delta.x < -dead_zone;
        input.right = delta.x > dead_zone;
        input.up = delta.y < -dead_zone;
        input.down = delta.y > dead_zone;
    }

    pub fn run(cli: &Cli) {
        let settings = settings_for(cli);
        log::info!(
            "Running seed {} for {} ticks (boomerang: {}, speed boost: {}, boss: {})",
            cli.seed,
            cli.ticks,
            settings.boomerang_enabled,
            settings.speed_boost_enabled,
            settings.boss_enabled
        );

        let mut state = GameState::new(cli.seed, settings, 0);
        let mut now = 0;
        let mut runs = 0u32;
        let mut best = 0u32;
        let mut bosses_defeated = 0u32;

        for _ in 0..cli.ticks {
            now += TICK_MS;
            let input = autopilot(&state);
            tick(&mut state, &input, now);

            for event in &state.events {
                match event {
                    GameEvent::GameOver => {
                        runs += 1;
                        best = best.max(state.delivered);
                        log::info!(
                            "Run {runs} over at {:.1}s with {} parts delivered",
                            now as f64 / 1000.0,
                            state.delivered
                        );
                    }
                    GameEvent::BossDefeated => bosses_defeated += 1,
                    _ => {}
                }
            }
        }

        best = best.max(state.delivered);
        let snapshot = state.snapshot();
        log::info!(
            "Finished: {runs} runs caught, best {best} deliveries, {bosses_defeated} bosses defeated, \
             final phase {:?} with {} entities on screen",
            snapshot.phase,
            snapshot.entities.len()
        );
        println!("runs={runs} best={best} bosses_defeated={bosses_defeated} ticks={}", cli.ticks);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Junkyard Dash (headless) starting...");

    let cli = match headless::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}\n{}", headless::usage());
            std::process::exit(2);
        }
    };
    if cli.help {
        println!("{}", headless::usage());
        return;
    }
    headless::run(&cli);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host drives the simulation directly through the library
}
