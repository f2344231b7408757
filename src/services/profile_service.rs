// ProfileService - one profile per user, keyed by the authenticated subject

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{AuthUser, SocialStore},
    models::{
        Education, EducationRequest, Experience, ExperienceRequest, Profile, ProfileFields,
        ProfileRequest, Social, UserRef, UserSummary,
    },
    validation::{optional_text, Validator},
};

const PROFILE_NOT_FOUND: &str = "Profile not found";

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn SocialStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Create the caller's profile, or update it if one already exists.
    #[instrument(skip(self, request))]
    pub async fn upsert(&self, auth: AuthUser, request: ProfileRequest) -> AppResult<Profile> {
        let fields = validate_profile(request)?;

        if self.store.find_user(auth.user_id).await?.is_none() {
            return Err(AppError::invalid_token());
        }

        let profile = match self.store.find_profile_by_user(auth.user_id).await? {
            Some(mut existing) => {
                existing.apply(fields);
                info!(user_id = %auth.user_id, "Profile updated");
                existing
            }
            None => {
                info!(user_id = %auth.user_id, "Profile created");
                Profile::new(auth.user_id, fields)
            }
        };

        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn me(&self, auth: AuthUser) -> AppResult<Profile> {
        let profile = self
            .store
            .find_profile_by_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("There is no profile for this user".to_string()))?;
        self.populate(profile).await
    }

    pub async fn list(&self) -> AppResult<Vec<Profile>> {
        let profiles = self.store.list_profiles().await?;
        try_join_all(profiles.into_iter().map(|profile| self.populate(profile))).await
    }

    pub async fn by_user(&self, user_id: Uuid) -> AppResult<Profile> {
        let profile = self
            .store
            .find_profile_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))?;
        self.populate(profile).await
    }

    #[instrument(skip(self, request))]
    pub async fn add_experience(
        &self,
        auth: AuthUser,
        request: ExperienceRequest,
    ) -> AppResult<Profile> {
        let experience = validate_experience(request)?;
        let mut profile = self.own_profile(auth).await?;
        profile.add_experience(experience);
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn remove_experience(&self, auth: AuthUser, exp_id: Uuid) -> AppResult<Profile> {
        let mut profile = self.own_profile(auth).await?;
        if !profile.remove_experience(exp_id) {
            return Err(AppError::NotFound("Experience not found".to_string()));
        }
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    #[instrument(skip(self, request))]
    pub async fn add_education(
        &self,
        auth: AuthUser,
        request: EducationRequest,
    ) -> AppResult<Profile> {
        let education = validate_education(request)?;
        let mut profile = self.own_profile(auth).await?;
        profile.add_education(education);
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn remove_education(&self, auth: AuthUser, edu_id: Uuid) -> AppResult<Profile> {
        let mut profile = self.own_profile(auth).await?;
        if !profile.remove_education(edu_id) {
            return Err(AppError::NotFound("Education not found".to_string()));
        }
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    async fn own_profile(&self, auth: AuthUser) -> AppResult<Profile> {
        self.store
            .find_profile_by_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(PROFILE_NOT_FOUND.to_string()))
    }

    /// Replace the owner id with the owner's name and avatar. Profiles whose
    /// owner has vanished keep the bare id.
    async fn populate(&self, mut profile: Profile) -> AppResult<Profile> {
        if let Some(owner) = self.store.find_user(profile.owner_id()).await? {
            profile.user = UserRef::Populated(UserSummary::from(&owner));
        }
        Ok(profile)
    }
}

fn validate_profile(request: ProfileRequest) -> AppResult<ProfileFields> {
    let mut v = Validator::new();
    let status = v.required("status", request.status.as_deref(), "Status is required");
    let skills = request
        .skills
        .map(|skills| skills.into_list())
        .filter(|skills| !skills.is_empty());
    if skills.is_none() {
        v.reject("skills", "Skills is required");
    }

    v.finish(|| {
        Some(ProfileFields {
            company: optional_text(request.company),
            website: optional_text(request.website),
            location: optional_text(request.location),
            bio: optional_text(request.bio),
            status: status?,
            githubusername: optional_text(request.githubusername),
            skills: skills?,
            social: Social {
                youtube: optional_text(request.youtube),
                twitter: optional_text(request.twitter),
                facebook: optional_text(request.facebook),
                linkedin: optional_text(request.linkedin),
                instagram: optional_text(request.instagram),
            },
        })
    })
}

fn validate_experience(request: ExperienceRequest) -> AppResult<Experience> {
    let mut v = Validator::new();
    let title = v.required("title", request.title.as_deref(), "Title is required");
    let company = v.required("company", request.company.as_deref(), "Company is required");
    let from = v.required_date("from", request.from.as_deref(), "From date is required");
    let to = v.optional_date("to", request.to.as_deref());
    let current = request.current.unwrap_or(false);

    v.finish(|| {
        Some(Experience {
            id: Uuid::new_v4(),
            title: title?,
            company: company?,
            location: optional_text(request.location),
            from: from?,
            // An ongoing position has no end date.
            to: if current { None } else { to? },
            current,
            description: optional_text(request.description),
        })
    })
}

fn validate_education(request: EducationRequest) -> AppResult<Education> {
    let mut v = Validator::new();
    let school = v.required("school", request.school.as_deref(), "School is required");
    let degree = v.required("degree", request.degree.as_deref(), "Degree is required");
    let fieldofstudy = v.required(
        "fieldofstudy",
        request.fieldofstudy.as_deref(),
        "Field of study is required",
    );
    let from = v.required_date("from", request.from.as_deref(), "From date is required");
    let to = v.optional_date("to", request.to.as_deref());
    let current = request.current.unwrap_or(false);

    v.finish(|| {
        Some(Education {
            id: Uuid::new_v4(),
            school: school?,
            degree: degree?,
            fieldofstudy: fieldofstudy?,
            from: from?,
            to: if current { None } else { to? },
            current,
            description: optional_text(request.description),
        })
    })
}
