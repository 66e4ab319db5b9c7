mod session;

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use tandem_core::alarm::Notifier;
use tandem_core::category::CategoryPolicy;
use tandem_core::config::Config;
use tandem_core::gateway::ModelClient;
use tandem_core::gateway::StoreGateway;
use tandem_core::prompt::build_system_instruction;
use tandem_gateway::FileStore;
use tandem_gateway::ScriptedModel;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use crate::session::Session;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("tandem {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "chat" => {
            let chat_args = parse_chat_args(args.collect::<Vec<_>>())?;
            chat(chat_args).await
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

struct ChatArgs {
    data_dir: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_chat_args(args: Vec<String>) -> Result<ChatArgs, Box<dyn std::error::Error>> {
    let mut data_dir = None;
    let mut script = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--data-dir requires a path".into());
                };
                data_dir = Some(PathBuf::from(value));
                i += 2;
            }
            "--script" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--script requires a path".into());
                };
                script = Some(PathBuf::from(value));
                i += 2;
            }
            other => {
                return Err(format!("unsupported argument: {other}").into());
            }
        }
    }
    Ok(ChatArgs { data_dir, script })
}

fn load_config() -> Config {
    let Some(path) = dirs::config_dir().map(|dir| dir.join("tandem").join("config.toml")) else {
        return Config::default();
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return Config::default();
    };
    match toml::from_str(&raw) {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "config unreadable, using defaults");
            Config::default()
        }
    }
}

fn load_category_policy(data_dir: &Path) -> CategoryPolicy {
    let path = data_dir.join("categories.yaml");
    let Ok(raw) = fs::read_to_string(&path) else {
        return CategoryPolicy::default();
    };
    match CategoryPolicy::from_yaml(&raw) {
        Ok(policy) => policy,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "category rules unreadable, using defaults");
            CategoryPolicy::default()
        }
    }
}

fn load_script(path: &Path) -> Result<ScriptedModel, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    let responses: Vec<String> = serde_json::from_str(&raw)?;
    Ok(ScriptedModel::new(responses))
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) {
        println!("[alert] {title}: {body}");
    }
}

async fn chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = load_config();
    let data_dir = args
        .data_dir
        .or_else(|| config.storage.data_dir.clone())
        .or_else(|| dirs::data_dir().map(|dir| dir.join("tandem")))
        .unwrap_or_else(|| PathBuf::from("."));

    let store = FileStore::open(&data_dir)?;
    let mut updates = store.subscribe();
    let watcher = store.spawn_watcher(Duration::from_secs(2));

    let model = match args.script.as_ref() {
        Some(path) => Some(load_script(path)?),
        None => None,
    };

    let policy = load_category_policy(&data_dir);
    let mut session = Session::new(&store, policy, config.alarms.offsets_min.clone());
    session.hydrate().await;

    let mut tick = tokio::time::interval(Duration::from_secs(config.alarms.tick_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let notifier = ConsoleNotifier;

    println!("tandem {} (data: {})", env!("CARGO_PKG_VERSION"), data_dir.display());
    println!("Type a request, paste a command batch, or /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text == "/quit" || text == "/exit" {
                    break;
                }
                let now = chrono::Local::now().naive_local();
                let raw = match model.as_ref() {
                    Some(model) => {
                        let prompt = format!(
                            "{}\n\nUser: {text}",
                            build_system_instruction(&session.state, now)
                        );
                        match model.complete(&prompt).await {
                            Ok(raw) => raw,
                            Err(error) => {
                                println!("(model unavailable: {error})");
                                continue;
                            }
                        }
                    }
                    None => text.to_string(),
                };
                let reply = session.user_turn(&raw, now).await;
                println!("{reply}");
            }
            _ = tick.tick() => {
                let now = chrono::Local::now().naive_local();
                session.scan_alerts(now, &notifier);
            }
            update = updates.recv() => {
                let Some(domain) = update else { continue };
                session.remote_update(domain).await;
                tracing::info!(%domain, "domain refreshed from an external change");
            }
        }
    }

    watcher.abort();
    Ok(())
}

fn print_help() {
    println!("tandem {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  tandem chat [--data-dir PATH] [--script FILE]");
    println!("  tandem --help");
    println!("  tandem --version");
}
