use std::sync::Arc;

use folio_reqwest::{ApiClient, ApiError, ApiRequest};
use folio_tokens::{
    exchange::{LoginError, LoginExchange, RefreshExchange, SessionUser},
    session::{SessionError, SessionStore},
    PasswordRef, SharedRefreshError, TokenPair, TokenRefresher, UsernameRef,
};
use reqwest::multipart::{Form, Part};
use serde::de::IgnoredAny;
use thiserror::Error;

use crate::{
    config::FolioConfig,
    model::{
        About, BlogPost, Certification, ContactMessage, Id, ImageUpload, Language, Me,
        NewCertification, NewLanguage, NewProject, NewSkill, Project, ProfileUpdate, Skill, SkillCategory,
        UserProfile,
    },
};

/// The multipart field the backend reads a profile image from
const PROFILE_IMAGE_FIELD: &str = "profile_image";

/// An error while signing in
#[derive(Debug, Error)]
pub enum SignInError {
    /// The backend refused the credentials or could not be reached
    #[error(transparent)]
    Login(#[from] LoginError),
    /// The issued tokens could not be stored
    #[error("error storing session")]
    Session(#[source] SessionError),
}

/// A client for the portfolio backend
///
/// Public resources are read without credentials. Profile resources, and
/// changes to public resources, carry the session's access token, which is
/// refreshed before a request if it has expired.
#[derive(Clone, Debug)]
pub struct Portfolio {
    public: ApiClient,
    owner: ApiClient,
    auth: ApiClient,
    refresher: TokenRefresher,
    login: LoginExchange,
}

impl Portfolio {
    /// Constructs a client from configuration, backed by `session`
    pub fn new(config: &FolioConfig, session: Arc<dyn SessionStore>) -> reqwest::Result<Self> {
        Ok(Self::with_client(config, config.http_client()?, session))
    }

    /// Constructs a client that sends all requests through `client`
    pub fn with_client(
        config: &FolioConfig,
        client: reqwest::Client,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let refresher = TokenRefresher::new(
            session,
            RefreshExchange::new(client.clone(), config.refresh_url()),
        );
        let login = LoginExchange::new(client.clone(), config.login_url(), config.me_url());

        Self {
            public: ApiClient::public(client.clone(), config.api_base_url().clone()),
            owner: ApiClient::authenticated(
                client.clone(),
                config.api_base_url().clone(),
                refresher.clone(),
            ),
            auth: ApiClient::authenticated(client, config.auth_base_url().clone(), refresher.clone()),
            refresher,
            login,
        }
    }

    /// The session backing this client
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.refresher.session()
    }

    /// The dispatcher for public resources
    pub fn public_api(&self) -> &ApiClient {
        &self.public
    }

    /// The dispatcher for authenticated resources
    pub fn auth_api(&self) -> &ApiClient {
        &self.auth
    }

    /// Signs in and stores the issued tokens in the session
    pub async fn sign_in(
        &self,
        username: &UsernameRef,
        password: &PasswordRef,
    ) -> Result<SessionUser, SignInError> {
        let signed_in = self.login.sign_in(username, password).await?;
        self.session()
            .replace(Some(signed_in.tokens))
            .await
            .map_err(SignInError::Session)?;
        Ok(signed_in.user)
    }

    /// Clears the session
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.session().replace(None).await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// The tokens currently held by the session
    pub async fn tokens(&self) -> Result<Option<TokenPair>, SessionError> {
        self.session().current().await
    }

    /// Refreshes the session's tokens now, whether or not they have expired
    pub async fn refresh(&self) -> Result<Option<TokenPair>, SharedRefreshError> {
        self.refresher.refresh_now().await
    }

    /// The signed-in user
    pub async fn me(&self) -> Result<Me, ApiError> {
        self.auth.get("me/").await
    }

    /// The signed-in user's profile
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.auth.get("profile/").await
    }

    /// Updates the fields of the profile that are set in `update`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.auth.post_json("profile/update/", update).await
    }

    /// Uploads a new profile image
    pub async fn upload_profile_image(
        &self,
        file_name: impl Into<String>,
        image: Vec<u8>,
    ) -> Result<ImageUpload, ApiError> {
        let form = Form::new().part(
            PROFILE_IMAGE_FIELD,
            Part::bytes(image).file_name(file_name.into()),
        );
        self.auth.post_multipart("profile/upload-image/", form).await
    }

    /// All skills
    pub async fn skills(&self) -> Result<Vec<Skill>, ApiError> {
        self.auth.get("profile/skills/").await
    }

    /// A single skill
    pub async fn skill(&self, id: Id) -> Result<Skill, ApiError> {
        self.auth.get(&format!("profile/skills/{id}/")).await
    }

    /// Adds a skill
    pub async fn add_skill(&self, skill: &NewSkill) -> Result<Skill, ApiError> {
        self.auth.post_json("profile/skills/", skill).await
    }

    /// Removes a skill
    pub async fn delete_skill(&self, id: Id) -> Result<(), ApiError> {
        delete(&self.auth, &format!("profile/skills/{id}/")).await
    }

    /// All skill categories, each with its skills
    pub async fn skill_categories(&self) -> Result<Vec<SkillCategory>, ApiError> {
        self.auth.get("profile/skill-categories/").await
    }

    /// A single skill category
    pub async fn skill_category(&self, id: Id) -> Result<SkillCategory, ApiError> {
        self.auth
            .get(&format!("profile/skill-categories/{id}/"))
            .await
    }

    /// All certifications
    pub async fn certifications(&self) -> Result<Vec<Certification>, ApiError> {
        self.auth.get("profile/certifications/").await
    }

    /// A single certification
    pub async fn certification(&self, id: Id) -> Result<Certification, ApiError> {
        self.auth
            .get(&format!("profile/certifications/{id}/"))
            .await
    }

    /// Adds a certification
    pub async fn add_certification(
        &self,
        certification: &NewCertification,
    ) -> Result<Certification, ApiError> {
        self.auth
            .post_json("profile/certifications/", certification)
            .await
    }

    /// Removes a certification
    pub async fn delete_certification(&self, id: Id) -> Result<(), ApiError> {
        delete(&self.auth, &format!("profile/certifications/{id}/")).await
    }

    /// All spoken languages
    pub async fn languages(&self) -> Result<Vec<Language>, ApiError> {
        self.auth.get("profile/languages/").await
    }

    /// A single spoken language
    pub async fn language(&self, id: Id) -> Result<Language, ApiError> {
        self.auth.get(&format!("profile/languages/{id}/")).await
    }

    /// Adds a spoken language
    pub async fn add_language(&self, language: &NewLanguage) -> Result<Language, ApiError> {
        self.auth.post_json("profile/languages/", language).await
    }

    /// Removes a spoken language
    pub async fn delete_language(&self, id: Id) -> Result<(), ApiError> {
        delete(&self.auth, &format!("profile/languages/{id}/")).await
    }

    /// The public "about" section
    pub async fn about(&self) -> Result<About, ApiError> {
        self.public.get("about/").await
    }

    /// All showcased projects
    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.public.get("projects/").await
    }

    /// Adds a project owned by the signed-in user
    pub async fn add_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        self.owner.post_json("projects/", project).await
    }

    /// Removes a project owned by the signed-in user
    pub async fn delete_project(&self, id: Id) -> Result<(), ApiError> {
        delete(&self.owner, &format!("projects/{id}/")).await
    }

    /// All published blog posts
    pub async fn blog_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        self.public.get("blog/").await
    }

    /// The blog post with the given slug, if one exists
    ///
    /// The backend answers a slug query with a filtered list; the first match
    /// wins.
    pub async fn blog_post(&self, slug: &str) -> Result<Option<BlogPost>, ApiError> {
        let posts: Vec<BlogPost> = self
            .public
            .send(ApiRequest::get("blog/").query("slug", slug))
            .await?;
        Ok(posts.into_iter().find(|p| p.slug == slug))
    }

    /// Sends a message through the contact form
    pub async fn contact(&self, message: &ContactMessage) -> Result<ContactMessage, ApiError> {
        self.public.post_json("contact/", message).await
    }
}

async fn delete(api: &ApiClient, path: &str) -> Result<(), ApiError> {
    // Some deletions answer with the removed record, others with nothing.
    let _: IgnoredAny = api.delete(path).await?;
    Ok(())
}
