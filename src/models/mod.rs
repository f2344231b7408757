// Documents stored by the social store, plus the request payloads that build them

pub mod post;
pub mod profile;
pub mod user;

pub use post::{Comment, Like, Post, TextRequest};
pub use profile::{
    Education, EducationRequest, Experience, ExperienceRequest, Profile, ProfileFields,
    ProfileRequest, SkillsInput, Social,
};
pub use user::{
    gravatar_url, normalize_email, LoginRequest, RegisterRequest, TokenResponse, User,
    UserRecord, UserRef, UserSummary,
};
