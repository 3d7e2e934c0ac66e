use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("registration not created: {outcome}")]
    NotCreated { outcome: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "registry-cli", about = "Account registry API CLI")]
struct Cli {
    #[arg(long, env = "REGISTRY_BASE_URL", default_value = "http://127.0.0.1:3001")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the registry service is up.
    Ping,
    /// Register a player account.
    Register {
        username: String,
        #[arg(env = "REGISTRY_PASSWORD")]
        password: String,
    },
    /// Ask the service whether the game server accepts connections.
    Status,
    /// Print the number of accounts in the store.
    Count,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base_url = cli.base_url.trim_end_matches('/');

    match cli.command {
        Command::Ping => run_ping(&client, base_url).await,
        Command::Register { username, password } => run_register(&client, base_url, &username, &password).await,
        Command::Status => {
            let json = get_json(&client, &url(base_url, "/api/server-status")).await?;
            print_json(&json)
        }
        Command::Count => {
            let json = get_json(&client, &url(base_url, "/api/accounts/count")).await?;
            print_json(&json)
        }
    }
}

fn url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn run_ping(client: &reqwest::Client, base_url: &str) -> Result<(), CliError> {
    let response = client.get(url(base_url, "/healthz")).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_register(client: &reqwest::Client, base_url: &str, username: &str, password: &str) -> Result<(), CliError> {
    let response = client
        .post(url(base_url, "/api/register"))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    let status = response.status();
    let value = response
        .json::<Value>()
        .await
        .unwrap_or(Value::Null);
    print_json(&value)?;

    if status.is_server_error() {
        return Err(CliError::ServerError { status: status.as_u16(), message: value.to_string() });
    }
    match outcome(&value) {
        Some("created") => Ok(()),
        other => Err(CliError::NotCreated { outcome: other.unwrap_or("unknown").to_owned() }),
    }
}

fn outcome(value: &Value) -> Option<&str> {
    value.get("outcome").and_then(Value::as_str)
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value, CliError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let value = response
        .json::<Value>()
        .await
        .unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: value.to_string() });
    }
    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(url("http://host:3001/", "/healthz"), "http://host:3001/healthz");
        assert_eq!(url("http://host:3001", "/healthz"), "http://host:3001/healthz");
    }

    #[test]
    fn outcome_reads_string_field() {
        assert_eq!(outcome(&serde_json::json!({ "outcome": "duplicate" })), Some("duplicate"));
        assert_eq!(outcome(&Value::Null), None);
    }

    #[test]
    fn cli_parses_register_arguments() {
        let cli = Cli::try_parse_from(["registry-cli", "--base-url", "http://x", "register", "alice", "pw"]).unwrap();
        assert_eq!(cli.base_url, "http://x");
        assert!(matches!(cli.command, Command::Register { ref username, ref password } if username == "alice" && password == "pw"));
    }
}
