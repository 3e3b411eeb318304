//! Confirmed workouts and their persistence.
//!
//! The whole list is serialized and written after every mutation; the
//! in-memory list only changes once that write has succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mapty_client::Coordinate;
use tracing::{debug, warn};

use crate::domains::Workout;
use crate::{MaptyError, MaptyResult, WorkoutId};

/// Namespace the workout list is stored under.
pub const STORAGE_KEY: &str = "workouts";

/// Key-value persistence holding the serialized workout list.
pub trait Persistence {
    fn read(&self) -> MaptyResult<Option<String>>;
    fn write(&mut self, data: &str) -> MaptyResult<()>;
}

/// JSON file `<dir>/workouts.json`, replaced atomically on every write.
#[derive(Clone, Debug)]
pub struct FilePersistence {
    dir: PathBuf,
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(format!("{STORAGE_KEY}.json"));
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for FilePersistence {
    fn read(&self) -> MaptyResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &str) -> MaptyResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| MaptyError::Storage(e.error.to_string()))?;
        Ok(())
    }
}

/// In-memory persistence. Clones share the same slot, so a test can keep
/// a handle while the store owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(data.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }
}

impl Persistence for MemoryPersistence {
    fn read(&self) -> MaptyResult<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| MaptyError::Storage(e.to_string()))?;
        Ok(slot.clone())
    }

    fn write(&mut self, data: &str) -> MaptyResult<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| MaptyError::Storage(e.to_string()))?;
        *slot = Some(data.to_string());
        Ok(())
    }
}

pub struct WorkoutStore<P: Persistence> {
    persistence: P,
    workouts: Vec<Workout>,
}

impl<P: Persistence> WorkoutStore<P> {
    /// Open the store, loading whatever the persistence layer holds.
    pub fn open(persistence: P) -> Self {
        let workouts = load_from(&persistence);
        Self {
            persistence,
            workouts,
        }
    }

    /// Read the persisted list again. Absent or corrupted data yields an
    /// empty list.
    pub fn load(&self) -> Vec<Workout> {
        load_from(&self.persistence)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn get(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: WorkoutId) -> bool {
        self.get(id).is_some()
    }

    pub fn add(&mut self, workout: Workout) -> MaptyResult<()> {
        let mut next = self.workouts.clone();
        next.push(workout);
        self.commit(next)
    }

    /// Remove the workout with `id`. Unknown ids are an error and leave the
    /// persisted list untouched.
    pub fn remove(&mut self, id: WorkoutId) -> MaptyResult<Workout> {
        let index = self
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or(MaptyError::NotFound(id))?;
        let mut next = self.workouts.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> MaptyResult<()> {
        self.commit(Vec::new())
    }

    /// Attach route geometry to a stored workout.
    pub fn set_route(&mut self, id: WorkoutId, route: Vec<Coordinate>) -> MaptyResult<()> {
        let mut next = self.workouts.clone();
        let workout = next
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(MaptyError::NotFound(id))?;
        workout.route = Some(route);
        self.commit(next)
    }

    fn commit(&mut self, next: Vec<Workout>) -> MaptyResult<()> {
        let data = serde_json::to_string(&next)?;
        self.persistence.write(&data)?;
        debug!(count = next.len(), "workouts persisted");
        self.workouts = next;
        Ok(())
    }
}

fn load_from<P: Persistence>(persistence: &P) -> Vec<Workout> {
    let data = match persistence.read() {
        Ok(Some(data)) if !data.trim().is_empty() => data,
        Ok(_) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "could not read stored workouts");
            return Vec::new();
        }
    };
    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&data) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "stored workouts are corrupted; starting empty");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Workout>(entry) {
            Ok(workout) => Some(workout),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable stored workout");
                None
            }
        })
        .collect()
}
