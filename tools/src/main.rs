//! mission-runner: headless runner for Armada mission scripts.
//!
//! Usage:
//!   mission-runner --mission data/missions/training.json --ticks 3000 --db run.db
//!   mission-runner --mission data/missions/training.json --attrition 0.02 --seed 7
//!   mission-runner --mission data/missions/training.json --ipc-mode

mod attrition;

use anyhow::{Context, Result};
use armada_script::{
    config::EngineConfig,
    descriptor::MissionDescriptor,
    engine::MissionEngine,
    hud::MessageQueue,
    mission::MissionState,
    objective::ObjectiveState,
    store::ScriptStore,
    types::{Millis, Tick},
};
use attrition::Attrition;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Destroy { id: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:            Tick,
    elapsed_ms:      Millis,
    paused:          bool,
    mission:         String,
    state:           MissionState,
    pending_actions: usize,
    objectives:      Vec<ObjectiveState>,
    spacecraft:      Vec<SpacecraftView>,
    messages:        Vec<String>,
}

#[derive(serde::Serialize)]
struct SpacecraftView {
    id:    String,
    name:  String,
    team:  Option<String>,
    alive: bool,
    hull:  f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 6_000u64);
    let hit_chance = parse_arg(&args, "--attrition", 0.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let mission_path = string_arg(&args, "--mission")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{data_dir}/missions/training.json"));

    let config = EngineConfig::load(data_dir)?;
    let descriptor = MissionDescriptor::load(&mission_path)?;
    let mission_name = descriptor.name.clone().unwrap_or_else(|| mission_path.clone());

    if !ipc_mode {
        println!("Armada — mission-runner");
        println!("  mission:   {mission_path}");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  attrition: {hit_chance}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = if db == ":memory:" {
        ScriptStore::in_memory()?
    } else {
        ScriptStore::open(db)?
    };
    store.migrate()?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    store.insert_run(&run_id, &mission_name, env!("CARGO_PKG_VERSION"))?;

    let mut engine = MissionEngine::build(run_id.clone(), descriptor, config, store)
        .with_context(|| format!("build mission from {mission_path}"))?;
    let mut attrition = Attrition::new(seed, hit_chance);

    if ipc_mode {
        run_ipc_loop(&mut engine, &mut attrition)?;
    } else {
        let ran = run_ticks(&mut engine, &mut attrition, ticks)?;
        print_summary(&engine, &run_id, ran)?;
    }

    Ok(())
}

/// Steps the engine one tick at a time so attrition lands between ticks.
/// Stops early once the mission is over.
fn run_ticks(engine: &mut MissionEngine, attrition: &mut Attrition, count: u64) -> Result<u64> {
    let mut ran = 0;
    while ran < count && !engine.mission().is_finished() {
        attrition.apply(engine.mission_mut().world_mut());
        engine.run_ticks(1)?;
        ran += 1;
    }
    Ok(ran)
}

fn run_ipc_loop(engine: &mut MissionEngine, attrition: &mut Attrition) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                run_ticks(engine, attrition, count)?;
            }
            IpcCommand::Destroy { id } => {
                if !engine.mission_mut().world_mut().destroy(&id) {
                    log::warn!("destroy: no spacecraft '{id}'");
                }
            }
            IpcCommand::GetState => {}
        }
        let state = build_ui_state(engine);
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &MissionEngine) -> UiState {
    let mission = engine.mission();
    let spacecraft = mission
        .spacecrafts()
        .map(|(_, sc)| SpacecraftView {
            id:    sc.id().to_string(),
            name:  sc.display_name().to_string(),
            team:  sc.team().map(str::to_string),
            alive: sc.is_alive(),
            hull:  sc.hull_integrity(),
        })
        .collect();
    let messages = mission
        .hud_as::<MessageQueue>()
        .map(|queue| queue.messages().map(|m| m.text.clone()).collect())
        .unwrap_or_default();

    UiState {
        tick: engine.clock.current_tick,
        elapsed_ms: mission.elapsed(),
        paused: engine.clock.paused,
        mission: mission.name().to_string(),
        state: mission.state(),
        pending_actions: mission.pending_actions(),
        objectives: mission.objectives(),
        spacecraft,
        messages,
    }
}

fn print_summary(engine: &MissionEngine, run_id: &str, ticks: u64) -> Result<()> {
    let mission = engine.mission();
    let store = engine.store();
    let fired = store.event_count_of_type(run_id, "trigger_fired")?;
    let executed = store.event_count_of_type(run_id, "action_executed")?;
    let messages = store.event_count_of_type(run_id, "message_queued")?;
    let ended_at = store.first_tick_of_type(run_id, "mission_state_changed")?;
    let losses = mission.spacecrafts().filter(|(_, sc)| !sc.is_alive()).count();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {run_id}");
    println!("  mission:         {}", mission.name());
    println!("  ticks run:       {ticks}");
    println!("  final tick:      {}", engine.clock.current_tick);
    println!("  mission time:    {} ms", mission.elapsed());
    println!("  state:           {:?}", mission.state());
    if let Some(tick) = ended_at {
        println!("  state changed:   tick {tick}");
    }
    println!("  triggers fired:  {fired}");
    println!("  actions run:     {executed}");
    println!("  messages:        {messages}");
    println!("  pending actions: {}", mission.pending_actions());
    println!("  spacecraft lost: {losses}");

    println!();
    println!("=== OBJECTIVES ===");
    let objectives = mission.objectives();
    if objectives.is_empty() {
        println!("  (Free play, no objectives)");
    } else {
        for o in &objectives {
            println!("  [{:?}] {:?}: {}", o.kind, o.status, o.text);
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
