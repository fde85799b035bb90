use clap::Parser;
use pokemon_battle_engine::battle::state::BattleState;
use pokemon_battle_engine::{
    Battle, BattleConfig, BattleObserver, BattleResult, Combatant, Dex, JsonLinesObserver, RandomProvider, SeededRng,
    Side, SideId, TracingObserver,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run a seeded battle between two random-choice players.
#[derive(Parser, Debug)]
#[command(name = "battle-demo", version)]
struct Args {
    /// Seed for the battle and both players
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the turn cap from the config
    #[arg(long)]
    max_turns: Option<u32>,

    /// RON file with battle rule overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print events as JSON lines on stdout instead of log text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "battle aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> BattleResult<()> {
    let mut config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }

    let dex = Dex::standard()?;
    let red = vec![
        Combatant::build(&dex, "Pikachu", 50, &["Thunderbolt", "Quick Attack", "Thunder Wave", "Agility"])?,
        Combatant::build(&dex, "Charmander", 50, &["Ember", "Scratch", "Growl", "Will-O-Wisp"])?,
        Combatant::build(&dex, "Gengar", 50, &["Shadow Ball", "Hypnosis", "Sludge Bomb", "Lick"])?,
    ];
    let blue = vec![
        Combatant::build(&dex, "Squirtle", 50, &["Water Gun", "Tackle", "Tail Whip", "Bite"])?,
        Combatant::build(&dex, "Bulbasaur", 50, &["Vine Whip", "Sleep Powder", "Toxic", "Razor Leaf"])?,
        Combatant::build(&dex, "Snorlax", 50, &["Body Slam", "Recover", "Headbutt", "Refresh"])?,
    ];
    let state = BattleState::new(
        format!("demo-{}", args.seed),
        Side::new(SideId::Player1, "Red", red)?,
        Side::new(SideId::Player2, "Blue", blue)?,
    );

    let observer: Box<dyn BattleObserver> = if args.json {
        Box::new(JsonLinesObserver::new(std::io::stdout()))
    } else {
        Box::new(TracingObserver)
    };
    let mut battle = Battle::new(
        state,
        Box::new(RandomProvider::new(args.seed.wrapping_add(1))),
        Box::new(RandomProvider::new(args.seed.wrapping_add(2))),
        Box::new(SeededRng::new(args.seed)),
        config,
    )
    .with_observer(observer);

    let outcome = battle.run()?;
    info!(winner = ?outcome.winner, turns = outcome.turns, reason = ?outcome.reason, "done");
    Ok(())
}
