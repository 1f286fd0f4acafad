mod api;
mod forms;
mod render;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use api::{ApiClient, Registration};
use session::{Session, SessionStore};

#[derive(Parser)]
#[command(name = "clipshare")]
#[command(about = "Command-line client for the Clipshare video sharing API", long_about = None)]
struct Cli {
    #[arg(long, env = "CLIPSHARE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[arg(long, env = "CLIPSHARE_SESSION", default_value = ".clipshare-session")]
    session: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create an account; the password arrives by email")]
    Register {
        #[arg(short, long)]
        firstname: String,
        #[arg(short, long)]
        lastname: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        mobile: String,
    },

    #[command(about = "Log in and store the session token")]
    Login {
        #[arg(help = "Email address (or first name)")]
        identifier: String,
        #[arg(short, long)]
        password: String,
    },

    #[command(about = "Forget the stored session token")]
    Logout,

    #[command(about = "Show whether a session token is stored")]
    Status,

    #[command(about = "Show your own profile")]
    Me,

    #[command(about = "Show a user's public profile")]
    User { id: String },

    #[command(about = "List every user")]
    Users,

    #[command(about = "Replace your bio")]
    Bio { text: String },

    #[command(about = "Upload a new profile picture (png or jpeg, up to 3 MiB)")]
    UploadPicture { file: PathBuf },

    #[command(about = "Publish a video (mp4, up to 6 MiB) with its thumbnail")]
    UploadVideo {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, help = "At most 30 words")]
        description: String,
        #[arg(short, long)]
        video: PathBuf,
        #[arg(short = 'n', long)]
        thumbnail: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = SessionStore::new(&cli.session);
    let session = store.load();
    let client = ApiClient::new(&cli.api_url, session.token().map(str::to_string));

    match cli.command {
        Commands::Register {
            firstname,
            lastname,
            email,
            mobile,
        } => {
            let registration = Registration {
                firstname: forms::require("firstname", &firstname)?.to_string(),
                lastname: forms::require("lastname", &lastname)?.to_string(),
                email: forms::require("email", &email)?.to_string(),
                mobile: forms::require("mobile", &mobile)?.to_string(),
            };
            forms::check_email(&registration.email)?;

            let message = client.register(&registration).await?;
            println!("✅ {}", message);
        }
        Commands::Login {
            identifier,
            password,
        } => {
            let token = client.login(&identifier, &password).await?;
            store
                .save(&Session::Authenticated { token })
                .with_context(|| format!("saving session to {}", store.path().display()))?;
            println!("✅ Logged in as {}", identifier);
        }
        Commands::Logout => {
            store
                .clear()
                .with_context(|| format!("removing {}", store.path().display()))?;
            println!("👋 Logged out");
        }
        Commands::Status => match session {
            Session::Anonymous => println!("Not logged in"),
            Session::Authenticated { .. } => println!("Logged in (token stored)"),
        },
        Commands::Me => render::print_profile(&client.me().await?),
        Commands::User { id } => render::print_profile(&client.user(&id).await?),
        Commands::Users => render::print_users(&client.users().await?),
        Commands::Bio { text } => {
            let message = client.update_bio(&text).await?;
            println!("✅ {}", message);
        }
        Commands::UploadPicture { file } => {
            let url = client.upload_profile_picture(&file).await?;
            println!("✅ Profile picture updated");
            println!("   URL: {}", url);
        }
        Commands::UploadVideo {
            title,
            description,
            video,
            thumbnail,
        } => {
            let video = client
                .upload_video(&title, &description, &video, &thumbnail)
                .await?;
            println!("✅ Video uploaded successfully!");
            render::print_video(&video);
        }
    }

    Ok(())
}
