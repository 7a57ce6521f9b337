//! The visitor's locally persisted profile.
//!
//! The profile is only used to enrich catalog queries and listings.
//! Storage problems never surface to callers:
//! an unreadable or corrupt profile is replaced by the default one
//! and failed writes are logged and dropped.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use fslock::LockFile;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{SerializeError, serialize_atomically, traceable_path};

pub const PROFILE_FILENAME: &str = "profile.json";

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 12;
pub const BUDGET_MIN: f64 = 1.0;
pub const BUDGET_MAX: f64 = 1_000_000.0;

/// A single exam result, e.g. `IELTS 7.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamScore {
    pub exam: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    /// Integer amount in USD, or empty if unset.
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub exams: Vec<ExamScore>,
}

impl Profile {
    /// The budget if it is set to a positive amount.
    pub fn budget_value(&self) -> Option<u64> {
        self.budget.parse::<u64>().ok().filter(|budget| *budget > 0)
    }

    /// The latest recorded score of an exam, matched case-insensitively.
    pub fn exam_score(&self, exam: &str) -> Option<f64> {
        self.exams
            .iter()
            .rev()
            .find(|entry| entry.exam.eq_ignore_ascii_case(exam))
            .map(|entry| entry.score)
    }
}

/// Rejected profile edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileValidationError {
    #[error("username must be {NAME_MIN_LEN}-{NAME_MAX_LEN} characters long, got {0}")]
    NameLength(usize),
    #[error("username may only contain latin letters and digits")]
    NameCharacters,
    #[error("exam name must not be empty")]
    MissingExamName,
    #[error("exam score must be a number")]
    InvalidExamScore,
    #[error("no exam at position {index}, profile has {len} exams")]
    ExamIndexOutOfRange { index: usize, len: usize },
}

/// Validate and normalize a username.
pub fn validate_name(raw: &str) -> Result<String, ProfileValidationError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(ProfileValidationError::NameLength(len));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ProfileValidationError::NameCharacters);
    }
    Ok(name.to_string())
}

/// Normalize a committed budget input.
///
/// Numbers are clamped to [BUDGET_MIN, BUDGET_MAX] and rounded,
/// anything else clears the budget.
pub fn normalize_budget(raw: &str) -> String {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let value = value.clamp(BUDGET_MIN, BUDGET_MAX).round();
            format!("{value:.0}")
        },
        _ => {
            debug!(budget = raw, "clearing non-numeric budget");
            String::new()
        },
    }
}

#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("couldn't acquire profile file lock")]
    AcquireLock(#[source] fslock::Error),
    #[error("couldn't create profile directory")]
    CreateDir(#[source] std::io::Error),
    #[error("couldn't read profile file")]
    ReadFile(#[source] std::io::Error),
    #[error("couldn't parse profile")]
    Parse(#[source] serde_json::Error),
    #[error("couldn't serialize profile")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write profile file")]
    WriteFile(#[source] SerializeError),
    #[error("failed to remove profile file")]
    RemoveFile(#[source] std::io::Error),
    #[error("profile storage is unavailable")]
    Unavailable,
}

/// A single persistent slot holding the profile.
pub trait ProfileBackend: Debug + Send + Sync {
    /// Returns the stored profile or `None` if nothing was stored yet.
    fn read(&self) -> Result<Option<Profile>, ProfileStoreError>;
    fn write(&self, profile: &Profile) -> Result<(), ProfileStoreError>;
    fn clear(&self) -> Result<(), ProfileStoreError>;
}

impl<T: ProfileBackend + ?Sized> ProfileBackend for Arc<T> {
    fn read(&self) -> Result<Option<Profile>, ProfileStoreError> {
        (**self).read()
    }

    fn write(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        (**self).write(profile)
    }

    fn clear(&self) -> Result<(), ProfileStoreError> {
        (**self).clear()
    }
}

/// Stores the profile as a JSON file.
///
/// Writes go through a temporary file and a rename,
/// guarded by a lock file next to the profile.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A backend using [PROFILE_FILENAME] in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(PROFILE_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The lock file is never removed, its presence doesn't indicate an active lock.
    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self) -> Result<LockFile, ProfileStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(ProfileStoreError::CreateDir)?;
        }
        let lock_path = self.lock_path();
        let mut lock =
            LockFile::open(lock_path.as_os_str()).map_err(ProfileStoreError::AcquireLock)?;
        lock.lock().map_err(ProfileStoreError::AcquireLock)?;
        Ok(lock)
    }
}

impl ProfileBackend for FileBackend {
    fn read(&self) -> Result<Option<Profile>, ProfileStoreError> {
        if !self.path.exists() {
            debug!(path = traceable_path(&self.path), "profile file not found");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(ProfileStoreError::ReadFile)?;
        let parsed = serde_json::from_str(&contents).map_err(ProfileStoreError::Parse)?;
        Ok(Some(parsed))
    }

    fn write(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        debug!(path = traceable_path(&self.path), "writing profile file");
        let lock = self.lock()?;
        serialize_atomically(profile, &self.path, lock).map_err(ProfileStoreError::WriteFile)
    }

    fn clear(&self) -> Result<(), ProfileStoreError> {
        let _lock = self.lock()?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProfileStoreError::RemoveFile(e)),
        }
    }
}

/// Keeps the serialized profile in memory.
///
/// Can be switched unavailable to behave like storage that rejects all access.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding raw, possibly malformed, content.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The raw stored content.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().expect("profile slot poisoned").clone()
    }

    fn check_available(&self) -> Result<(), ProfileStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Unavailable);
        }
        Ok(())
    }
}

impl ProfileBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Profile>, ProfileStoreError> {
        self.check_available()?;
        let slot = self.slot.lock().expect("profile slot poisoned");
        slot.as_deref()
            .map(serde_json::from_str::<Profile>)
            .transpose()
            .map_err(ProfileStoreError::Parse)
    }

    fn write(&self, profile: &Profile) -> Result<(), ProfileStoreError> {
        self.check_available()?;
        let contents = serde_json::to_string(profile).map_err(ProfileStoreError::Serialize)?;
        *self.slot.lock().expect("profile slot poisoned") = Some(contents);
        Ok(())
    }

    fn clear(&self) -> Result<(), ProfileStoreError> {
        self.check_available()?;
        *self.slot.lock().expect("profile slot poisoned") = None;
        Ok(())
    }
}

/// The profile together with the slot it is persisted to.
///
/// Every accepted mutation is persisted immediately.
#[derive(Debug)]
pub struct ProfileStore {
    backend: Box<dyn ProfileBackend>,
    profile: Profile,
}

impl ProfileStore {
    /// Open a store, loading the persisted profile or the default one.
    pub fn open(backend: impl ProfileBackend + 'static) -> Self {
        let mut store = Self {
            backend: Box::new(backend),
            profile: Profile::default(),
        };
        store.load();
        store
    }

    /// Re-read the profile from storage.
    ///
    /// Never fails, unreadable profiles are replaced by the default.
    pub fn load(&mut self) -> Profile {
        self.profile = match self.backend.read() {
            Ok(Some(profile)) => profile,
            Ok(None) => Profile::default(),
            Err(e) => {
                warn!(error = %e, "couldn't load profile, using defaults");
                Profile::default()
            },
        };
        self.profile.clone()
    }

    /// Replace and persist the profile, best-effort.
    pub fn save(&mut self, profile: Profile) {
        self.profile = profile;
        self.persist();
    }

    /// The current profile.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn set_name(&mut self, raw: &str) -> Result<(), ProfileValidationError> {
        self.profile.name = validate_name(raw)?;
        self.persist();
        Ok(())
    }

    /// Commit a budget input, returning the stored value.
    pub fn commit_budget(&mut self, raw: &str) -> &str {
        self.profile.budget = normalize_budget(raw);
        self.persist();
        &self.profile.budget
    }

    /// Append an exam result that was already validated by the catalog.
    pub fn add_exam(&mut self, exam: ExamScore) {
        self.profile.exams.push(exam);
        self.persist();
    }

    pub fn remove_exam(&mut self, index: usize) -> Result<ExamScore, ProfileValidationError> {
        let len = self.profile.exams.len();
        if index >= len {
            return Err(ProfileValidationError::ExamIndexOutOfRange { index, len });
        }
        let removed = self.profile.exams.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Reset to the default profile and clear the storage slot.
    pub fn clear(&mut self) {
        self.profile = Profile::default();
        if let Err(e) = self.backend.clear() {
            warn!(error = %e, "couldn't clear stored profile");
        }
    }

    fn persist(&self) {
        if let Err(e) = self.backend.write(&self.profile) {
            warn!(error = %e, "couldn't persist profile");
        }
    }
}
