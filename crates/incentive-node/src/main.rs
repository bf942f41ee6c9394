//! incentive-node: replays incentive state transitions against a local store.
//!
//! Reads a JSON-lines transition log, applies it serially to the SQLite
//! store and prints one JSON line per receipt and per closed block. Logs go
//! to stderr so stdout stays machine-readable.

mod config;
mod replay;

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use incentive_db::{KvStore, SqliteStore};
use incentive_keeper::genesis::GenesisState;
use incentive_keeper::query::QueryRewardsParams;
use incentive_keeper::Keeper;
use incentive_types::{Address, ClaimTypeFilter};
use tracing::info;

use crate::config::NodeConfig;
use crate::replay::{Output, Replayer};

const USAGE: &str = "usage: incentive-node [--config PATH] [--genesis PATH] \
<replay LOG | export-genesis | rewards [OWNER] [hard|usdx_minting]>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Replay(PathBuf),
    ExportGenesis,
    Rewards {
        owner: Option<String>,
        claim_type: Option<String>,
    },
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: PathBuf,
    genesis: Option<PathBuf>,
    command: Command,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut config = PathBuf::from("incentive.toml");
    let mut genesis = None;
    let mut positional = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = iter.next().context(USAGE)?.into(),
            "--genesis" => genesis = Some(iter.next().context(USAGE)?.into()),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("replay") => Command::Replay(positional.next().context(USAGE)?.into()),
        Some("export-genesis") => Command::ExportGenesis,
        Some("rewards") => Command::Rewards {
            owner: positional.next(),
            claim_type: positional.next(),
        },
        _ => anyhow::bail!(USAGE),
    };
    Ok(Args {
        config,
        genesis,
        command,
    })
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = NodeConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?),
        )
        .init();

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = config.db_path();
    let mut store = incentive_db::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    info!(path = %db_path.display(), "store opened");

    let keeper = open_keeper(&mut store, &config, args.genesis.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Replay(log) => replay(&mut store, &keeper, &log, &mut out)?,
        Command::ExportGenesis => {
            let genesis = keeper.export_genesis(&store)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&genesis)?)?;
        }
        Command::Rewards { owner, claim_type } => {
            let owner = owner.map(|o| o.parse::<Address>()).transpose()?;
            let claim_type = claim_type
                .map(|t| t.parse::<ClaimTypeFilter>())
                .transpose()?;
            let params = QueryRewardsParams::new(owner, claim_type, 1, 0);
            let records = keeper.get_rewards(&store, &params)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        }
    }
    Ok(())
}

/// Build the keeper, writing genesis first when the store is fresh.
fn open_keeper(
    store: &mut SqliteStore,
    config: &NodeConfig,
    genesis_path: Option<&std::path::Path>,
) -> anyhow::Result<Keeper> {
    let fresh = store.last_height()?.is_none() && store.scan_prefix(&[])?.is_empty();
    if !fresh {
        return Ok(Keeper::new(config.params.clone())?);
    }

    let genesis = match genesis_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading genesis {}", path.display()))?;
            serde_json::from_str(&content)?
        }
        None => GenesisState::new(config.params.clone()),
    };
    let keeper = Keeper::init_genesis(store, &genesis)?;
    info!(
        claims = genesis.claims.len(),
        indexes = genesis.reward_indexes.len(),
        "genesis written"
    );
    Ok(keeper)
}

fn replay<W: Write>(
    store: &mut SqliteStore,
    keeper: &Keeper,
    log: &std::path::Path,
    out: &mut W,
) -> anyhow::Result<()> {
    let resume_after = store.last_height()?;
    if let Some(height) = resume_after {
        info!(height, "resuming after last applied block");
    }
    let file = std::fs::File::open(log).with_context(|| format!("opening {}", log.display()))?;
    let mut replayer = Replayer::new(keeper, resume_after);

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let outputs = replayer
            .apply_line(store, &line)
            .with_context(|| format!("line {}", number + 1))?;
        for output in outputs {
            emit(store, out, &output)?;
        }
    }
    if let Some(output) = replayer.finish(&*store)? {
        emit(store, out, &output)?;
    }
    info!(height = ?replayer.height(), "replay finished");
    Ok(())
}

fn emit<W: Write>(store: &SqliteStore, out: &mut W, output: &Output) -> anyhow::Result<()> {
    if let Output::Block(block) = output {
        store.set_last_height(block.height)?;
    }
    writeln!(out, "{}", serde_json::to_string(output)?)?;
    Ok(())
}
