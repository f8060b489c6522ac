use clap::{Parser, Subcommand};
use chatline::core::config::{self, ChatlineConfig, CliOverrides};
use chatline::net::auth;
use chatline::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

/// Read from the environment when `--login` or `register` is used.
const PASSWORD_ENV: &str = "CHATLINE_PASSWORD";

#[derive(Parser)]
#[command(name = "chatline", about = "Terminal client for a real-time private messaging server")]
struct Args {
    /// Server base URL (e.g. http://localhost:8080)
    #[arg(short, long)]
    server: Option<String>,

    /// WebSocket URL, if it isn't <server>/ws
    #[arg(long)]
    ws_url: Option<String>,

    /// Session token (value of the session_token cookie)
    #[arg(short, long)]
    token: Option<String>,

    /// Your own user id, hidden from the peer list
    #[arg(short, long)]
    user_id: Option<String>,

    /// Log in with this email or nickname (password from CHATLINE_PASSWORD)
    #[arg(short, long)]
    login: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account (password from CHATLINE_PASSWORD), then exit
    Register {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        age: u32,
        #[arg(long, default_value = "")]
        gender: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
}

fn password_from_env(flag: &str) -> std::io::Result<String> {
    std::env::var(PASSWORD_ENV)
        .map_err(|_| std::io::Error::other(format!("{flag} needs {PASSWORD_ENV} to be set")))
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            server: self.server.clone(),
            ws_url: self.ws_url.clone(),
            token: self.token.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to chatline.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("chatline.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring config file: {}", e);
        eprintln!("warning: {e}; using defaults");
        ChatlineConfig::default()
    });
    let mut resolved = config::resolve(&file_config, &args.overrides());
    log::info!(
        "Chatline starting up against {} (ws: {})",
        resolved.base_url,
        resolved.ws_url
    );

    if let Some(Command::Register {
        nickname,
        email,
        age,
        gender,
        first_name,
        last_name,
    }) = args.command
    {
        let registration = auth::Registration {
            nickname,
            age,
            gender,
            first_name,
            last_name,
            email,
            password: password_from_env("register")?,
        };
        auth::register(&resolved.base_url, &registration)
            .await
            .map_err(std::io::Error::other)?;
        println!("Registered {}. Log in with --login.", registration.nickname.trim());
        return Ok(());
    }

    // Only log in when no session was supplied; the session is ours to end
    let mut owns_session = false;
    if let Some(identifier) = args.login.as_deref()
        && resolved.session_token.is_none()
    {
        let password = password_from_env("--login")?;
        let token = auth::login(&resolved.base_url, identifier, &password)
            .await
            .map_err(std::io::Error::other)?;
        resolved.session_token = Some(token);
        owns_session = true;
    }

    let base_url = resolved.base_url.clone();
    let token = resolved.session_token.clone();
    let result = tui::run(resolved);

    if owns_session && let Some(token) = token {
        if let Err(e) = auth::logout(&base_url, &token).await {
            log::warn!("Logout failed: {}", e);
        }
    }

    result
}
