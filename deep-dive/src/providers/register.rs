// MLBAM -> FanGraphs id resolution from the Chadwick Bureau people register.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::providers::{IdResolver, ProviderError};

/// The two register columns we need. Everything else is ignored; ids are
/// blank for people who never appeared in the respective system.
#[derive(Debug, Deserialize)]
struct RegisterRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    key_mlbam: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    key_fangraphs: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChadwickRegister {
    ids: HashMap<u32, u32>,
    overrides: HashMap<u32, u32>,
}

impl ChadwickRegister {
    /// Overrides only; every other id is unknown.
    pub fn with_overrides(overrides: HashMap<u32, u32>) -> Self {
        Self {
            ids: HashMap::new(),
            overrides,
        }
    }

    /// Load the register CSV. A missing file leaves only the overrides and
    /// logs a warning; an unreadable one is an error.
    pub fn load(path: &Path, overrides: HashMap<u32, u32>) -> Result<Self, ProviderError> {
        if !path.exists() {
            warn!(
                "id register {} not found; only configured overrides will resolve",
                path.display()
            );
            return Ok(Self::with_overrides(overrides));
        }
        let register_error = |source| ProviderError::Register {
            path: path.display().to_string(),
            source,
        };
        let file = std::fs::File::open(path)
            .map_err(|e| register_error(csv::Error::from(e)))?;
        let ids = load_ids_from_reader(file).map_err(register_error)?;
        info!("loaded {} id mappings from {}", ids.len(), path.display());
        Ok(Self { ids, overrides })
    }

    pub fn from_reader<R: Read>(rdr: R, overrides: HashMap<u32, u32>) -> Result<Self, csv::Error> {
        Ok(Self {
            ids: load_ids_from_reader(rdr)?,
            overrides,
        })
    }

    pub fn lookup(&self, mlbam: u32) -> Option<u32> {
        self.overrides
            .get(&mlbam)
            .or_else(|| self.ids.get(&mlbam))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn positive_id(value: Option<i64>) -> Option<u32> {
    value.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0)
}

fn load_ids_from_reader<R: Read>(rdr: R) -> Result<HashMap<u32, u32>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut ids = HashMap::new();
    for result in reader.deserialize::<RegisterRow>() {
        match result {
            Ok(row) => {
                if let (Some(mlbam), Some(fg)) =
                    (positive_id(row.key_mlbam), positive_id(row.key_fangraphs))
                {
                    ids.insert(mlbam, fg);
                }
            }
            Err(e) => {
                warn!("skipping malformed register row: {}", e);
            }
        }
    }
    Ok(ids)
}

#[async_trait]
impl IdResolver for ChadwickRegister {
    async fn fangraphs_id(&self, mlbam: u32) -> anyhow::Result<Option<u32>> {
        Ok(self.lookup(mlbam))
    }
}
