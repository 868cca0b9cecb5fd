use crate::source::{ApiError, ApiResult, DataSource};
use crate::{Boxscore, Game, Player, SeasonTotals, Team, TeamLeaderGroup, TeamRecordGroup};
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Logical name of every collection the store knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Teams,
    Players,
    Games,
    PlayerTotals,
    TeamLeaders,
    TeamRecords,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Teams,
        Collection::Players,
        Collection::Games,
        Collection::PlayerTotals,
        Collection::TeamLeaders,
        Collection::TeamRecords,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Teams => "teams",
            Collection::Players => "players",
            Collection::Games => "games",
            Collection::PlayerTotals => "player_totals",
            Collection::TeamLeaders => "team_leaders",
            Collection::TeamRecords => "team_records",
        }
    }

    /// Derived collections are precomputed from games and live under `derived/`.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Collection::PlayerTotals | Collection::TeamLeaders | Collection::TeamRecords
        )
    }

    pub fn resource_path(&self) -> String {
        if self.is_derived() {
            format!("derived/{}.json", self.name())
        } else {
            format!("{}.json", self.name())
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
                format!("unknown collection '{s}' (expected one of {})", names.join(", "))
            })
    }
}

/// An entity type that is served as one named collection.
pub trait Entity: DeserializeOwned + Serialize + Send + Sync + 'static {
    const COLLECTION: Collection;
}

impl Entity for Team {
    const COLLECTION: Collection = Collection::Teams;
}
impl Entity for Player {
    const COLLECTION: Collection = Collection::Players;
}
impl Entity for Game {
    const COLLECTION: Collection = Collection::Games;
}
impl Entity for SeasonTotals {
    const COLLECTION: Collection = Collection::PlayerTotals;
}
impl Entity for TeamLeaderGroup {
    const COLLECTION: Collection = Collection::TeamLeaders;
}
impl Entity for TeamRecordGroup {
    const COLLECTION: Collection = Collection::TeamRecords;
}

type CachedCollection = Arc<dyn Any + Send + Sync>;

/// Read-through, populate-once cache over a [`DataSource`].
///
/// The first `get` for a collection fetches and parses it; every later call
/// returns the same `Arc`. Nothing is ever evicted: the dataset is assumed not
/// to change for the life of the store. A failed load is cached as an empty
/// collection so callers never have to special-case errors.
///
/// Two tasks asking for the same uncached collection at once may both fetch;
/// whichever finishes first is kept and the other result is dropped.
pub struct DataStore<S> {
    source: S,
    cache: RwLock<HashMap<Collection, CachedCollection>>,
}

impl<S: DataSource> DataStore<S> {
    pub fn new(source: S) -> Self {
        Self { source, cache: RwLock::new(HashMap::new()) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get<T: Entity>(&self) -> Arc<Vec<T>> {
        if let Some(hit) = self.cached::<T>() {
            return hit;
        }

        let collection = T::COLLECTION;
        let loaded: Vec<T> = match self.load::<Vec<T>>(&collection.resource_path()).await {
            Ok(items) => {
                debug!("loaded {} {collection}", items.len());
                items
            }
            Err(e) => {
                warn!("could not load {collection}, using empty collection: {e}");
                Vec::new()
            }
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(collection)
            .or_insert_with(|| Arc::new(loaded) as CachedCollection);
        Arc::clone(entry).downcast::<Vec<T>>().unwrap_or_default()
    }

    pub async fn teams(&self) -> Arc<Vec<Team>> {
        self.get().await
    }

    pub async fn players(&self) -> Arc<Vec<Player>> {
        self.get().await
    }

    pub async fn games(&self) -> Arc<Vec<Game>> {
        self.get().await
    }

    pub async fn player_totals(&self) -> Arc<Vec<SeasonTotals>> {
        self.get().await
    }

    pub async fn team_leaders(&self) -> Arc<Vec<TeamLeaderGroup>> {
        self.get().await
    }

    pub async fn team_records(&self) -> Arc<Vec<TeamRecordGroup>> {
        self.get().await
    }

    /// Whether `collection` has been loaded (successfully or not) already.
    pub fn is_cached(&self, collection: Collection) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&collection)
    }

    /// Fetch one game's boxscore. Never cached: boxscores are only needed while
    /// a log or a derived collection is being assembled.
    pub async fn boxscore(&self, game: &Game) -> ApiResult<Boxscore> {
        self.load(&game.boxscore_path()).await
    }

    fn cached<T: Entity>(&self) -> Option<Arc<Vec<T>>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let entry = cache.get(&T::COLLECTION)?;
        Arc::clone(entry).downcast::<Vec<T>>().ok()
    }

    async fn load<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.source.fetch(path).await?;
        if body.trim().is_empty() {
            return Err(ApiError::Other(format!("{path} is empty")));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Parsing(e, path.to_owned()))
    }
}
