//! In-memory doubles for the upstream API and cache storage, shared by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::cache::{CacheStorage, MemoryStorage};
use crate::error::{Error, Result};
use crate::pokeapi::api_types::{
  ApiDamageRelations, ApiGeneration, ApiNamedResource, ApiPokemon, ApiPokemonList,
  ApiPokemonType, ApiSpecies, ApiSprites, ApiType,
};
use crate::pokeapi::PokeApi;

pub const BASE: &str = "https://pokeapi.test/api/v2";
pub const ELECTRIC_URL: &str = "https://pokeapi.test/api/v2/type/13/";
pub const GENERATION_I_URL: &str = "https://pokeapi.test/api/v2/generation/1/";
pub const PIKACHU_FRONT: &str = "https://sprites.test/pokemon/25.png";
pub const PIKACHU_BACK: &str = "https://sprites.test/pokemon/back/25.png";
pub const PUBLIC_URL: &str = "http://localhost:3000";

pub fn named(name: &str, url: &str) -> ApiNamedResource {
  ApiNamedResource {
    name: name.to_string(),
    url: url.to_string(),
  }
}

fn type_refs(names: &[&str]) -> Vec<ApiNamedResource> {
  names
    .iter()
    .map(|n| named(n, &format!("{}/type/{}/", BASE, n)))
    .collect()
}

/// A pokemon record with no sprites and no types.
pub fn bare_pokemon(id: u32, name: &str) -> ApiPokemon {
  ApiPokemon {
    id,
    name: name.to_string(),
    sprites: ApiSprites::default(),
    types: Vec::new(),
  }
}

pub fn pikachu() -> ApiPokemon {
  ApiPokemon {
    sprites: ApiSprites {
      front_default: Some(PIKACHU_FRONT.to_string()),
      back_default: Some(PIKACHU_BACK.to_string()),
    },
    types: vec![ApiPokemonType {
      type_ref: named("electric", ELECTRIC_URL),
    }],
    ..bare_pokemon(25, "pikachu")
  }
}

pub fn electric() -> ApiType {
  ApiType {
    damage_relations: ApiDamageRelations {
      double_damage_from: type_refs(&["ground"]),
      half_damage_from: type_refs(&["flying", "steel", "electric"]),
      no_damage_from: Vec::new(),
    },
  }
}

pub fn species_in_generation_i() -> ApiSpecies {
  ApiSpecies {
    generation: Some(named("generation-i", GENERATION_I_URL)),
  }
}

pub fn generation_i() -> ApiGeneration {
  ApiGeneration {
    main_region: named("kanto", &format!("{}/region/1/", BASE)),
  }
}

/// Upstream with pikachu fully populated: detail, species, type, generation and both sprites.
pub fn pikachu_api() -> FakePokeApi {
  FakePokeApi::default()
    .with_pokemon(pikachu())
    .with_species("pikachu", species_in_generation_i())
    .with_type(ELECTRIC_URL, electric())
    .with_generation(GENERATION_I_URL, generation_i())
    .with_image(PIKACHU_FRONT, b"front-png".to_vec())
    .with_image(PIKACHU_BACK, b"back-png".to_vec())
}

#[derive(Default)]
pub struct CallCounts {
  pub list: AtomicUsize,
  pub detail: AtomicUsize,
  pub species: AtomicUsize,
  pub types: AtomicUsize,
  pub generation: AtomicUsize,
  pub binary: AtomicUsize,
}

pub fn hits(counter: &AtomicUsize) -> usize {
  counter.load(Ordering::SeqCst)
}

/// Scriptable in-memory upstream.
#[derive(Default)]
pub struct FakePokeApi {
  pokemon: HashMap<String, ApiPokemon>,
  species: HashMap<String, ApiSpecies>,
  types: HashMap<String, ApiType>,
  generations: HashMap<String, ApiGeneration>,
  images: HashMap<String, Vec<u8>>,
  names: Vec<String>,
  /// Remaining scripted failures of the detail fetch, per id or name
  detail_failures: Mutex<HashMap<String, usize>>,
  broken_details: HashSet<String>,
  list_broken: bool,
  in_flight: AtomicUsize,
  pub max_in_flight: AtomicUsize,
  pub calls: CallCounts,
}

impl FakePokeApi {
  /// Register a pokemon under both its id and its name.
  pub fn with_pokemon(mut self, pokemon: ApiPokemon) -> Self {
    self.pokemon.insert(pokemon.id.to_string(), pokemon.clone());
    self.pokemon.insert(pokemon.name.clone(), pokemon);
    self
  }

  pub fn with_species(mut self, id_or_name: &str, species: ApiSpecies) -> Self {
    self.species.insert(id_or_name.to_string(), species);
    self
  }

  pub fn with_type(mut self, url: &str, type_detail: ApiType) -> Self {
    self.types.insert(url.to_string(), type_detail);
    self
  }

  pub fn with_generation(mut self, url: &str, generation: ApiGeneration) -> Self {
    self.generations.insert(url.to_string(), generation);
    self
  }

  pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
    self.images.insert(url.to_string(), bytes);
    self
  }

  /// Populate the list endpoint with bare pokemon named `names`.
  pub fn with_index(mut self, names: &[&str]) -> Self {
    for (i, name) in names.iter().enumerate() {
      self = self.with_pokemon(bare_pokemon(i as u32 + 1, name));
    }
    self.names = names.iter().map(|n| n.to_string()).collect();
    self
  }

  /// Fail the next `times` detail fetches for `id_or_name`.
  pub fn failing_detail(self, id_or_name: &str, times: usize) -> Self {
    if let Ok(mut failures) = self.detail_failures.lock() {
      failures.insert(id_or_name.to_string(), times);
    }
    self
  }

  /// Fail every detail fetch for `id_or_name`.
  pub fn broken_detail(mut self, id_or_name: &str) -> Self {
    self.broken_details.insert(id_or_name.to_string());
    self
  }

  pub fn broken_list(mut self) -> Self {
    self.list_broken = true;
    self
  }

  fn take_scripted_failure(&self, id_or_name: &str) -> bool {
    let mut failures = self.detail_failures.lock().unwrap();
    match failures.get_mut(id_or_name) {
      Some(remaining) if *remaining > 0 => {
        *remaining -= 1;
        true
      }
      _ => false,
    }
  }
}

#[async_trait]
impl PokeApi for FakePokeApi {
  async fn fetch_list(&self, limit: usize, offset: usize) -> Result<ApiPokemonList> {
    self.calls.list.fetch_add(1, Ordering::SeqCst);
    if self.list_broken {
      return Err(Error::upstream(format!("{}/pokemon", BASE), "HTTP 500"));
    }

    Ok(ApiPokemonList {
      count: self.names.len(),
      results: self
        .names
        .iter()
        .skip(offset)
        .take(limit)
        .map(|n| named(n, &format!("{}/pokemon/{}/", BASE, n)))
        .collect(),
    })
  }

  async fn fetch_detail(&self, id_or_name: &str) -> Result<ApiPokemon> {
    self.calls.detail.fetch_add(1, Ordering::SeqCst);
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    // Give concurrently polled fetches a chance to overlap
    tokio::task::yield_now().await;
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    let url = format!("{}/pokemon/{}", BASE, id_or_name);
    if self.broken_details.contains(id_or_name) || self.take_scripted_failure(id_or_name) {
      return Err(Error::upstream(url, "HTTP 503"));
    }

    self
      .pokemon
      .get(id_or_name)
      .cloned()
      .ok_or_else(|| Error::pokemon_not_found(id_or_name))
  }

  async fn fetch_species(&self, id_or_name: &str) -> Result<ApiSpecies> {
    self.calls.species.fetch_add(1, Ordering::SeqCst);
    self.species.get(id_or_name).cloned().ok_or_else(|| {
      Error::upstream(format!("{}/pokemon-species/{}", BASE, id_or_name), "HTTP 404")
    })
  }

  async fn fetch_type(&self, url: &str) -> Result<ApiType> {
    self.calls.types.fetch_add(1, Ordering::SeqCst);
    self
      .types
      .get(url)
      .cloned()
      .ok_or_else(|| Error::upstream(url, "HTTP 500"))
  }

  async fn fetch_generation(&self, url: &str) -> Result<ApiGeneration> {
    self.calls.generation.fetch_add(1, Ordering::SeqCst);
    self
      .generations
      .get(url)
      .cloned()
      .ok_or_else(|| Error::upstream(url, "HTTP 500"))
  }

  async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
    self.calls.binary.fetch_add(1, Ordering::SeqCst);
    self
      .images
      .get(url)
      .cloned()
      .ok_or_else(|| Error::upstream(url, "HTTP 404"))
  }
}

/// Memory storage that counts writes per key and can pose as a shared tier.
pub struct RecordingStorage {
  inner: MemoryStorage,
  writes: Mutex<HashMap<String, usize>>,
  shared: bool,
}

impl RecordingStorage {
  pub fn new() -> Arc<Self> {
    Self::with_shared(false)
  }

  pub fn with_shared(shared: bool) -> Arc<Self> {
    Arc::new(Self {
      inner: MemoryStorage::new(None),
      writes: Mutex::new(HashMap::new()),
      shared,
    })
  }

  /// Store a value without counting it as a write.
  pub async fn seed(&self, key: &str, value: Vec<u8>) {
    self.inner.set(key, value).await.unwrap();
  }

  pub async fn peek(&self, key: &str) -> Option<Vec<u8>> {
    self.inner.get(key).await.unwrap()
  }

  pub fn writes(&self, key: &str) -> usize {
    self.writes.lock().unwrap().get(key).copied().unwrap_or(0)
  }

  pub fn total_writes(&self) -> usize {
    self.writes.lock().unwrap().values().sum()
  }
}

#[async_trait]
impl CacheStorage for Arc<RecordingStorage> {
  fn name(&self) -> &'static str {
    "recording"
  }

  fn is_shared(&self) -> bool {
    self.shared
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    self.inner.get(key).await
  }

  async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
    *self
      .writes
      .lock()
      .unwrap()
      .entry(key.to_string())
      .or_insert(0) += 1;
    self.inner.set(key, value).await
  }
}

/// Records the level and message of every event while installed.
#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedEvents {
  /// Capture events on the current thread until the guard is dropped.
  pub fn install(&self) -> tracing::subscriber::DefaultGuard {
    tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
  }

  pub fn count(&self, level: Level, message: &str) -> usize {
    self
      .0
      .lock()
      .unwrap()
      .iter()
      .filter(|(l, m)| *l == level && m == message)
      .count()
  }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
  fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
    if field.name() == "message" {
      self.0 = format!("{:?}", value);
    }
  }
}

impl<S: Subscriber> Layer<S> for CapturedEvents {
  fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
    let mut visitor = MessageVisitor(String::new());
    event.record(&mut visitor);
    self
      .0
      .lock()
      .unwrap()
      .push((*event.metadata().level(), visitor.0));
  }
}
