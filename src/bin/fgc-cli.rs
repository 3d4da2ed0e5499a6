use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::fs;

const TOKEN_FILE: &str = ".fgc_token";

#[derive(Parser)]
#[command(name = "fgc-cli")]
#[command(about = "CLI for the fighting-game notebook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:11111")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        confirm: Option<String>,
    },
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// List the supported games
    Games,
    Dashboard,
    Notebook {
        #[arg(short, long)]
        game: String,
        #[arg(short, long)]
        character: String,
    },
    Save {
        #[arg(short, long)]
        game: String,
        #[arg(short, long)]
        character: String,
        #[arg(short = 't', long)]
        content: String,
    },
    Logout,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

fn with_token(request: RequestBuilder) -> RequestBuilder {
    let token = fs::read_to_string(TOKEN_FILE).unwrap_or_default();
    request.bearer_auth(token.trim())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Signup { username, email, password, confirm } => {
            let password_confirm = confirm.unwrap_or_else(|| password.clone());
            let res = client.post(format!("{}/signup", cli.url))
                .json(&json!({
                    "username": username,
                    "email": email,
                    "password": password,
                    "password_confirm": password_confirm,
                }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Login { username, password } => {
            let res = client.post(format!("{}/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: LoginResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Logged in. Token saved to {TOKEN_FILE}");
            } else {
                println!("Login failed: {}", res.text().await?);
            }
        }
        Commands::Games => {
            let res = client.get(format!("{}/", cli.url)).send().await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Dashboard => {
            let res = with_token(client.get(format!("{}/dashboard", cli.url)))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Notebook { game, character } => {
            let mut url = reqwest::Url::parse(&cli.url)?;
            url.path_segments_mut()
                .map_err(|_| "base URL cannot hold a path")?
                .pop_if_empty()
                .extend(["notebook", game.as_str(), character.as_str()]);
            let res = with_token(client.get(url)).send().await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Save { game, character, content } => {
            let res = with_token(client.post(format!("{}/save_notes", cli.url)))
                .json(&json!({ "game": game, "character": character, "content": content }))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Logout => {
            let res = with_token(client.post(format!("{}/logout", cli.url)))
                .send()
                .await?;
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed): {}", res.text().await?);
        }
    }

    Ok(())
}
