use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use color_eyre::{eyre::Report, Section};
use folio::{model::ContactMessage, ApiError, FolioConfig, Portfolio};
use folio_tokens::{session::FileSession, Password, Username};
use reqwest::Url;
use serde::Serialize;

/// Manage a portfolio from the command line
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opts {
    /// Base URL for public resources
    #[arg(long, env = "FOLIO_API_BASE_URL", default_value = folio::DEFAULT_API_BASE_URL)]
    api_base_url: Url,

    /// Base URL for authentication and profile resources
    #[arg(long, env = "FOLIO_AUTH_BASE_URL", default_value = folio::DEFAULT_AUTH_BASE_URL)]
    auth_base_url: Url,

    /// The local file used to keep the session between runs
    #[arg(
        short = 'f',
        long,
        env = "FOLIO_SESSION_FILE",
        value_name = "FILE",
        default_value = folio::DEFAULT_SESSION_FILE
    )]
    session_file: PathBuf,

    /// Per-request timeout, in seconds
    #[arg(long, env = "FOLIO_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and keep the session
    Login {
        /// The account's login name
        #[arg(short, long, env = "FOLIO_USERNAME")]
        username: Username,

        /// The account's password
        #[arg(short, long, env = "FOLIO_PASSWORD", hide_env_values = true)]
        password: Password,
    },
    /// Forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Refresh the access token now
    Refresh,
    /// Show the profile
    Profile,
    /// Upload a new profile image
    UploadImage {
        /// The image file to upload
        path: PathBuf,
    },
    /// List skills
    Skills,
    /// List skill categories with their skills
    SkillCategories,
    /// List certifications
    Certifications,
    /// List spoken languages
    Languages,
    /// Show the public "about" section
    About,
    /// List projects
    Projects,
    /// List blog posts, or show the one with the given slug
    Blog {
        /// Only show the post with this slug
        #[arg(long)]
        slug: Option<String>,
    },
    /// Send a message through the contact form
    Contact {
        /// Your name
        #[arg(long)]
        name: String,

        /// Your email address
        #[arg(long)]
        email: String,

        /// The message
        #[arg(long)]
        message: String,
    },
}

impl Opts {
    fn config(&self) -> color_eyre::Result<FolioConfig> {
        let mut config = FolioConfig::new(self.api_base_url.clone(), self.auth_base_url.clone())?
            .with_session_file(&self.session_file);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let config = opts.config()?;
    let session = Arc::new(FileSession::new(config.session_file()));
    let portfolio = Portfolio::new(&config, session)?;

    match opts.command {
        Command::Login { username, password } => {
            let user = portfolio.sign_in(&username, &password).await?;
            let name = user.display_name();
            if name.is_empty() {
                println!("Signed in as {}", user.email);
            } else {
                println!("Signed in as {} <{}>", name, user.email);
            }
        }
        Command::Logout => {
            portfolio.sign_out().await.map_err(Report::msg)?;
            println!("Signed out");
        }
        Command::Whoami => print_json(&hint_sign_in(portfolio.me().await)?)?,
        Command::Refresh => match portfolio.refresh().await {
            Ok(Some(tokens)) => match tokens.expires_at() {
                Some(exp) => println!("Access token refreshed, expires at {}", exp.0),
                None => println!("Access token refreshed"),
            },
            Ok(None) => println!("Not signed in"),
            Err(err) => {
                return Err(Report::new(err).suggestion("run `folio login` to sign in again"))
            }
        },
        Command::Profile => print_json(&hint_sign_in(portfolio.profile().await)?)?,
        Command::UploadImage { path } => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "profile-image".to_owned());
            let image = tokio::fs::read(&path).await?;
            let uploaded = hint_sign_in(portfolio.upload_profile_image(file_name, image).await)?;
            println!("{}", uploaded.image_url);
        }
        Command::Skills => print_json(&hint_sign_in(portfolio.skills().await)?)?,
        Command::SkillCategories => {
            print_json(&hint_sign_in(portfolio.skill_categories().await)?)?
        }
        Command::Certifications => {
            print_json(&hint_sign_in(portfolio.certifications().await)?)?
        }
        Command::Languages => print_json(&hint_sign_in(portfolio.languages().await)?)?,
        Command::About => print_json(&portfolio.about().await?)?,
        Command::Projects => print_json(&portfolio.projects().await?)?,
        Command::Blog { slug: None } => print_json(&portfolio.blog_posts().await?)?,
        Command::Blog { slug: Some(slug) } => match portfolio.blog_post(&slug).await? {
            Some(post) => print_json(&post)?,
            None => return Err(Report::msg(format!("no blog post with slug {slug:?}"))),
        },
        Command::Contact {
            name,
            email,
            message,
        } => {
            portfolio
                .contact(&ContactMessage::new(name, email, message))
                .await?;
            println!("Message sent");
        }
    }

    Ok(())
}

fn hint_sign_in<T>(result: Result<T, ApiError>) -> color_eyre::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.requires_sign_in() => {
            Err(Report::new(err).suggestion("run `folio login` to sign in again"))
        }
        Err(err) => Err(err.into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
