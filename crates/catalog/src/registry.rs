use std::collections::HashMap;

use tracing::info;

use crate::decision::DecisionChannel;
use crate::resolver::FuzzyResolver;
use crate::splitter::normalize;
use crate::store::CatalogStore;
use crate::CatalogError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArtist {
    pub name: String,
    pub id: u64,
}

#[derive(Debug, Default)]
pub struct ArtistRegistry {
    ids: HashMap<String, u64>,
    names: Vec<String>,
}

impl ArtistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &CatalogStore) -> Result<Self, CatalogError> {
        let mut registry = Self::new();
        for artist in store.load_artists()? {
            registry.remember(artist.name, artist.id);
        }
        info!("Loaded {} artists", registry.len());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Option<u64> {
        self.ids.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn remember(&mut self, name: String, id: u64) {
        if self.ids.insert(name.clone(), id).is_none() {
            self.names.push(name);
        }
    }

    pub fn resolve_or_create(
        &mut self,
        name: &str,
        store: &CatalogStore,
        resolver: &FuzzyResolver,
        channel: &mut dyn DecisionChannel,
    ) -> Result<ResolvedArtist, CatalogError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(CatalogError::BlankArtistName);
        }
        if let Some(id) = self.id_of(&name) {
            return Ok(ResolvedArtist { name, id });
        }

        let suggestions = resolver.suggest(&name, &self.names);
        let chosen = resolver
            .decide(&name, &suggestions, channel)
            .map_err(CatalogError::Decision)?;
        let chosen = normalize(&chosen);
        if chosen.is_empty() {
            return Err(CatalogError::BlankArtistName);
        }
        if let Some(id) = self.id_of(&chosen) {
            return Ok(ResolvedArtist { name: chosen, id });
        }

        let id = store.insert_artist(&chosen)?;
        self.remember(chosen.clone(), id);
        info!("New artist {:?} (id {})", chosen, id);
        Ok(ResolvedArtist { name: chosen, id })
    }
}
