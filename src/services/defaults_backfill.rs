use serde::Serialize;

use crate::backend::{BackendClient, BackendError};
use crate::models::{ProfileChanges, UserProfile, DEFAULT_DEPARTMENT, DEFAULT_DESIGNATION};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Fields of `profile` that are empty and should receive the import defaults.
pub fn missing_defaults(profile: &UserProfile) -> ProfileChanges {
    let is_blank = |field: &Option<String>| field.as_deref().map_or(true, str::is_empty);

    ProfileChanges {
        department: is_blank(&profile.department).then(|| DEFAULT_DEPARTMENT.to_string()),
        designation: is_blank(&profile.designation).then(|| DEFAULT_DESIGNATION.to_string()),
    }
}

/// Fills empty department/designation fields on every user profile.
///
/// Only the missing fields are patched. A failed update is logged and counted;
/// the run continues with the next profile.
pub async fn backfill_missing_defaults(
    backend: &dyn BackendClient,
) -> Result<BackfillReport, BackendError> {
    let profiles = backend.list_user_profiles().await?;
    log::info!("🔎 Scanning {} user profiles", profiles.len());

    let mut report = BackfillReport {
        scanned: profiles.len(),
        ..Default::default()
    };

    for profile in &profiles {
        let changes = missing_defaults(profile);
        if changes.is_empty() {
            continue;
        }

        match backend.update_user_profile(&profile.id, &changes).await {
            Ok(rows) if !rows.is_empty() => {
                log::info!("✅ Updated user {} → {:?}", profile.id, changes);
                report.updated += 1;
            }
            Ok(_) => {
                log::warn!("❌ Failed to update user {}: no data returned", profile.id);
                report.failed += 1;
            }
            Err(e) => {
                log::warn!("❌ Failed to update user {}: {}", profile.id, e);
                report.failed += 1;
            }
        }
    }

    log::info!(
        "🏁 Backfill finished: {} updated, {} failed, {} scanned",
        report.updated,
        report.failed,
        report.scanned
    );
    Ok(report)
}
