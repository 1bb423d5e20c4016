//! Setup and profile forms. Validation happens up front; a form that fails
//! it never reaches the store.

use crate::backend::Backend;
use crate::catalog::{canonical, MAJORS};
use crate::error::{FormError, StoreError};
use crate::models::Profile;
use anyhow::Result;
use tracing::info;

/// Resolves a typed university name against the list. Only exact
/// (case-insensitive) picks count as confirmed.
pub fn confirm_university(universities: &[&str], input: &str) -> Result<String, FormError> {
    if input.trim().is_empty() {
        return Err(FormError::MissingUniversity);
    }
    canonical(universities, input)
        .map(str::to_string)
        .ok_or_else(|| FormError::UnconfirmedUniversity(input.trim().to_string()))
}

fn confirm_major(input: &str) -> Result<String, FormError> {
    canonical(MAJORS, input)
        .map(str::to_string)
        .ok_or_else(|| FormError::UnknownMajor(input.trim().to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct SetupForm {
    pub display_name: String,
    pub university: String,
}

impl SetupForm {
    pub fn validate(&self, user_id: &str, universities: &[&str]) -> Result<Profile, FormError> {
        let display_name = self.display_name.trim();
        if display_name.is_empty() {
            return Err(FormError::MissingDisplayName);
        }
        let university = confirm_university(universities, &self.university)?;
        Ok(Profile::new(user_id, display_name, &university))
    }

    pub fn submit<B: Backend>(
        &self,
        backend: &mut B,
        user_id: &str,
        universities: &[&str],
    ) -> Result<Profile> {
        let profile = self.validate(user_id, universities)?;
        if backend.profile(user_id)?.is_some() {
            return Err(StoreError::ProfileExists(user_id.to_string()).into());
        }
        backend.insert_profile(profile.clone())?;
        info!(user = user_id, "Created profile");
        Ok(profile)
    }
}

/// Changes to apply to an existing profile. `None` leaves a field alone;
/// `major2: Some(None)` clears the second major.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub university: Option<String>,
    pub major1: Option<String>,
    pub major2: Option<Option<String>>,
    pub incognito: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply(&self, profile: &Profile, universities: &[&str]) -> Result<Profile, FormError> {
        let mut updated = profile.clone();

        if let Some(name) = &self.display_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(FormError::MissingDisplayName);
            }
            updated.display_name = name.to_string();
        }
        if let Some(university) = &self.university {
            updated.university = confirm_university(universities, university)?;
        }
        if let Some(major1) = &self.major1 {
            updated.major1 = confirm_major(major1)?;
        }
        if let Some(major2) = &self.major2 {
            updated.major2 = match major2.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(m) => Some(confirm_major(m)?),
            };
        }
        if updated.major2.is_some() && updated.major2.as_deref() == Some(updated.major1.as_str()) {
            return Err(FormError::DuplicateMajor);
        }
        if let Some(incognito) = self.incognito {
            updated.incognito = incognito;
        }
        Ok(updated)
    }

    pub fn submit<B: Backend>(
        &self,
        backend: &mut B,
        user_id: &str,
        universities: &[&str],
    ) -> Result<Profile> {
        let current = backend
            .profile(user_id)?
            .ok_or_else(|| StoreError::ProfileMissing(user_id.to_string()))?;
        let updated = self.apply(&current, universities)?;
        backend.update_profile(&updated)?;
        info!(user = user_id, "Updated profile");
        Ok(updated)
    }
}

/// Adds a unit to the list. Blank names and repeats are ignored.
pub fn add_unit(units: &mut Vec<String>, unit: &str) -> bool {
    let unit = unit.trim();
    if unit.is_empty() || units.iter().any(|u| u == unit) {
        return false;
    }
    units.push(unit.to_string());
    true
}

pub fn remove_unit(units: &mut Vec<String>, unit: &str) -> bool {
    let before = units.len();
    units.retain(|u| u != unit);
    units.len() != before
}
