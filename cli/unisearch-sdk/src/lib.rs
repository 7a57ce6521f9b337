//! Controllers tying the query codec, the profile and the catalog together.

pub mod badges;
pub mod debounce;
pub mod detail;
pub mod list;
pub mod profile;

use std::sync::{Arc, Mutex, MutexGuard};

use unisearch_catalog::CatalogClientError;
use unisearch_core::profile::ProfileStore;

/// The profile store, shared between the listing and profile editing.
///
/// The lock must not be held across an `.await`.
pub type SharedProfile = Arc<Mutex<ProfileStore>>;

pub fn shared_profile(store: ProfileStore) -> SharedProfile {
    Arc::new(Mutex::new(store))
}

pub fn lock_profile(profile: &SharedProfile) -> MutexGuard<'_, ProfileStore> {
    profile.lock().expect("profile store mutex poisoned")
}

/// A message for failed catalog requests that can be shown as is.
pub fn failure_message(error: &CatalogClientError) -> String {
    match error {
        CatalogClientError::Network(_) => {
            "Couldn't reach the catalog. Check that the catalog service is running.".to_string()
        },
        CatalogClientError::Http { status, .. } => {
            format!("The catalog responded with an error ({status}).")
        },
        CatalogClientError::InvalidResponse(_) => {
            "The catalog sent a response that couldn't be read.".to_string()
        },
        CatalogClientError::Validation { message } => message.clone(),
        CatalogClientError::Other(message) => message.clone(),
    }
}
