//! Resources served by the portfolio backend
//!
//! Fields the backend may leave out are `Option`s or default to empty, so a
//! partially populated profile still decodes.

use serde::{Deserialize, Serialize};

/// A numeric record identifier
pub type Id = u64;

/// The signed-in user, as returned by `me/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
    /// User identifier
    pub id: Id,
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Email address
    pub email: String,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// URL of the profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// The user's profile, when expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

/// The editable portfolio profile
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Profile identifier
    #[serde(default)]
    pub id: Id,
    /// Identifier of the owning user
    #[serde(default)]
    pub user: Id,
    /// Login name of the owning user
    #[serde(default)]
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    #[serde(default)]
    pub email: String,
    /// Free-form biography
    #[serde(default)]
    pub bio: String,
    /// Job title
    #[serde(default)]
    pub title: String,
    /// Where the user is based
    #[serde(default)]
    pub location: String,
    /// Contact phone number
    #[serde(default)]
    pub phone: String,
    /// Personal website
    #[serde(default)]
    pub website: String,
    /// GitHub profile URL
    #[serde(default)]
    pub github: String,
    /// LinkedIn profile URL
    #[serde(default)]
    pub linkedin: String,
    /// Twitter profile URL
    #[serde(default)]
    pub twitter: String,
    /// URL of the profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl UserProfile {
    /// The user's full name, trimmed, possibly empty
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// A partial profile update
///
/// Only the fields that are set are sent, so the backend leaves the rest
/// untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// New login name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New biography
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New job title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// New GitHub profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    /// New LinkedIn profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    /// New Twitter profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

/// Response to a profile image upload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    /// Where the uploaded image is served from
    pub image_url: String,
}

/// A skill with a self-assessed level
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill identifier
    pub id: Id,
    /// Skill name
    pub name: String,
    /// Self-assessed level, usually a percentage
    pub level: u32,
    /// Identifier of the owning [`SkillCategory`]
    pub category: Id,
    /// Name of the owning category, when expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
}

/// A skill to be created
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewSkill {
    /// Skill name
    pub name: String,
    /// Self-assessed level
    pub level: u32,
    /// Identifier of the owning [`SkillCategory`]
    pub category: Id,
}

/// A named group of skills
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    /// Category identifier
    pub id: Id,
    /// Category name
    pub name: String,
    /// Skills in this category
    #[serde(default)]
    pub skills: Vec<Skill>,
}

/// Who issued a [`Certification`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationKind {
    /// Amazon Web Services
    Aws,
    /// ALX Africa
    Alx,
    /// Any other issuer
    #[serde(other)]
    Other,
}

/// A professional certification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// Certification identifier
    pub id: Id,
    /// Certification title
    pub title: String,
    /// Issuing organization
    pub issuer: String,
    /// Date awarded, as sent by the backend
    #[serde(default)]
    pub date: String,
    /// Whether the certification is still being worked on
    #[serde(default)]
    pub in_progress: bool,
    /// URL of the badge image
    #[serde(default)]
    pub badge: String,
    /// The kind of issuer
    #[serde(rename = "type")]
    pub kind: CertificationKind,
}

/// A certification to be created
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewCertification {
    /// Certification title
    pub title: String,
    /// Issuing organization
    pub issuer: String,
    /// Date awarded
    pub date: String,
    /// Whether the certification is still being worked on
    pub in_progress: bool,
    /// URL of the badge image
    pub badge: String,
    /// The kind of issuer
    #[serde(rename = "type")]
    pub kind: CertificationKind,
}

/// How well a [`Language`] is spoken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Proficiency {
    /// Beginner
    Basic,
    /// Conversational
    Intermediate,
    /// Professional working proficiency
    Proficient,
    /// Full professional proficiency
    Fluent,
    /// First language
    Native,
}

/// A spoken language
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language identifier
    pub id: Id,
    /// Language name
    pub name: String,
    /// How well it is spoken
    pub proficiency: Proficiency,
}

/// A language to be created
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewLanguage {
    /// Language name
    pub name: String,
    /// How well it is spoken
    pub proficiency: Proficiency,
}

/// The public "about" section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    /// Record identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Display name
    pub name: String,
    /// Biography
    #[serde(default)]
    pub bio: String,
    /// URL of the profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Free-form skills summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
}

/// A showcased project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier
    pub id: Id,
    /// Project title
    #[serde(alias = "name")]
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Link to the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// URL of a screenshot or logo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Creation timestamp, as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A project to be created
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewProject {
    /// Project title
    pub title: String,
    /// Description
    pub description: String,
    /// Link to the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// URL of a screenshot or logo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A published blog post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Post identifier
    pub id: Id,
    /// Title
    pub title: String,
    /// URL slug
    pub slug: String,
    /// Body
    #[serde(default)]
    pub content: String,
    /// Creation timestamp, as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A message left through the contact form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    /// Record identifier, assigned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Sender's name
    pub name: String,
    /// Sender's email address
    pub email: String,
    /// Message body
    pub message: String,
    /// Creation timestamp, assigned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ContactMessage {
    /// A new message, ready to be sent
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            message: message.into(),
            created_at: None,
        }
    }
}
