mod cache;
mod config;
mod error;
mod logging;
mod pokeapi;
mod pokemon;
mod tasks;
#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use cache::{CacheLayer, CacheStorage, MemoryStorage, SqliteStorage, TieredStorage};
use pokeapi::PokeApiClient;
use pokemon::{ImageSlot, ListOptions, PokemonService, ResolveOptions};
use tasks::RefreshTask;

#[derive(Parser, Debug)]
#[command(name = "pokecache")]
#[command(about = "Cache-first aggregation of PokeAPI data")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pokecache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Enable the shared SQLite cache at the default data path
  #[arg(long)]
  shared_cache: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Keep the shared cache warm until interrupted.
  ///
  /// Image references point at `<public_url>/pokemon/<id>/<slot>-image`; serving
  /// those paths is left to the router in front of this cache.
  Warm,
  /// Print the simplified record for a pokemon
  Get {
    /// Pokemon id or name
    id: String,
    #[arg(long)]
    ignore_cache: bool,
  },
  /// Print one page of pokemon names
  List {
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(long, default_value_t = 0)]
    offset: usize,
    #[arg(long)]
    ignore_cache: bool,
  },
  /// Write a pokemon sprite to a file or stdout
  Image {
    id: String,
    #[arg(value_enum)]
    slot: ImageSlot,
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Rebuild the shared cache once
  Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if args.shared_cache {
    config.enable_default_shared_cache()?;
  }

  // Held for the lifetime of the process so the log file gets flushed
  let _log_guard = logging::init(&config.log)?;
  for warning in &config.warnings {
    warn!("{}", warning);
  }

  let shared: Option<Box<dyn CacheStorage>> = match &config.cache.shared_path {
    Some(path) => {
      info!(path = %path.display(), "Using shared SQLite cache");
      Some(Box::new(SqliteStorage::open(path, config.cache.shared_ttl())?))
    }
    None => None,
  };
  let memory = MemoryStorage::with_max_bytes(
    Some(config.cache.memory_ttl()),
    config.cache.memory_max_bytes,
  );
  let storage = TieredStorage::new(memory, shared);

  let api = Arc::new(PokeApiClient::new(&config.pokeapi)?);
  let service = Arc::new(PokemonService::new(
    api,
    CacheLayer::new(storage),
    config.public_url.clone(),
  ));

  match args.command {
    Command::Warm => {
      let handle = RefreshTask::new(Arc::clone(&service), &config.refresh).spawn();
      info!("Refresh job started, press Ctrl-C to stop");
      tokio::signal::ctrl_c().await?;
      handle.abort();
      info!("Shutting down");
    }
    Command::Get { id, ignore_cache } => {
      let options = ResolveOptions {
        ignore_cache,
        ..ResolveOptions::default()
      };
      print_json(&service.resolve(&id, options).await?)?;
    }
    Command::List {
      limit,
      offset,
      ignore_cache,
    } => {
      let options = ListOptions {
        ignore_cache,
        limit,
        offset,
      };
      print_json(&service.list(options).await?)?;
    }
    Command::Image { id, slot, output } => {
      let bytes = service.get_image(&id, slot).await?;
      match output {
        Some(path) => std::fs::write(&path, &bytes)
          .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?,
        None => std::io::stdout().write_all(&bytes)?,
      }
    }
    Command::Refresh => {
      let summary = RefreshTask::new(Arc::clone(&service), &config.refresh)
        .refresh_all()
        .await
        .ok_or_else(|| eyre!("Refresh did not run, see log for details"))?;
      print_json(&summary)?;
    }
  }

  Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
