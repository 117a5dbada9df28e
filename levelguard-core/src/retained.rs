//! State that survives deep sleep
//!
//! On the reference board this lives in RTC slow memory, which keeps its
//! contents through deep sleep but not through a power loss or a brown-out.
//! The store abstraction lets a hosted build keep the same state in a file
//! and lets tests inspect it.
//!
//! A store that has nothing, or holds something unreadable, is not an error
//! for the device: it starts cold with an empty history and the nominal
//! speed-of-sound estimate, and logs that it did so.

use crate::errors::{ConfigResult, StoreError};
use crate::history::HistoryBuffer;
use crate::sound::SpeedOfSoundEstimate;

/// Everything carried from one wake cycle to the next
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetainedState {
    /// Readings not yet confirmed by the uplink
    pub history: HistoryBuffer,
    /// Last estimate from an accepted calibration
    pub last_estimate: Option<SpeedOfSoundEstimate>,
    /// Completed cycles since cold start
    pub cycle_count: u32,
    /// Publish failure streak feeding the backoff policy
    pub consecutive_publish_failures: u32,
}

impl RetainedState {
    /// Fresh state for a cold start
    pub fn cold(history_capacity: usize) -> ConfigResult<Self> {
        Ok(Self {
            history: HistoryBuffer::new(history_capacity)?,
            last_estimate: None,
            cycle_count: 0,
            consecutive_publish_failures: 0,
        })
    }
}

/// Where [`RetainedState`] is kept between cycles
pub trait RetainedStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&mut self) -> Result<Option<RetainedState>, StoreError>;

    fn save(&mut self, state: &RetainedState) -> Result<(), StoreError>;
}

/// In-memory store, the hosted stand-in for RTC memory
#[derive(Debug, Clone, Default)]
pub struct RtcRetainedStore {
    slot: Option<RetainedState>,
}

impl RtcRetainedStore {
    /// Empty slot, as after power loss
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `state`, as after a previous wake
    pub fn with_state(state: RetainedState) -> Self {
        Self { slot: Some(state) }
    }

    /// What the last `save` wrote
    pub fn state(&self) -> Option<&RetainedState> {
        self.slot.as_ref()
    }

    /// Simulate a power loss
    pub fn wipe(&mut self) {
        self.slot = None;
    }
}

impl RetainedStore for RtcRetainedStore {
    fn load(&mut self) -> Result<Option<RetainedState>, StoreError> {
        Ok(self.slot.clone())
    }

    fn save(&mut self, state: &RetainedState) -> Result<(), StoreError> {
        self.slot = Some(state.clone());
        Ok(())
    }
}

impl<T: RetainedStore + ?Sized> RetainedStore for &mut T {
    fn load(&mut self) -> Result<Option<RetainedState>, StoreError> {
        (**self).load()
    }

    fn save(&mut self, state: &RetainedState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

#[cfg(feature = "std")]
pub use file::FileRetainedStore;

#[cfg(feature = "std")]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{RetainedState, RetainedStore};
    use crate::errors::StoreError;

    /// JSON snapshot on disk
    ///
    /// Saves go to a sibling `.tmp` file first and are renamed into place,
    /// so a crash mid-write leaves the previous snapshot intact.
    #[derive(Debug, Clone)]
    pub struct FileRetainedStore {
        path: PathBuf,
    }

    impl FileRetainedStore {
        /// Store backed by the JSON file at `path`
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Location of the snapshot file
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone().into_os_string();
            tmp.push(".tmp");
            PathBuf::from(tmp)
        }
    }

    impl RetainedStore for FileRetainedStore {
        fn load(&mut self) -> Result<Option<RetainedState>, StoreError> {
            let bytes = match fs::read(&self.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(_) => return Err(StoreError::Io),
            };
            serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|_| StoreError::Corrupt { reason: "snapshot is not valid state JSON" })
        }

        fn save(&mut self, state: &RetainedState) -> Result<(), StoreError> {
            let json = serde_json::to_vec(state)
                .map_err(|_| StoreError::Corrupt { reason: "state could not be encoded" })?;
            let tmp = self.temp_path();
            fs::write(&tmp, json).map_err(|_| StoreError::Io)?;
            fs::rename(&tmp, &self.path).map_err(|_| StoreError::Io)
        }
    }
}
