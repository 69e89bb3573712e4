use std::io::{self, Write};
use std::process::ExitCode;

use orchestrate_bridge::config::{BridgeConfig, ENDPOINT_ENV, VARIANT_ENV};
use orchestrate_bridge::document::DEFAULT_PREVIEW_CHARS;
use orchestrate_bridge::{AgentBridge, Conversation, DocumentContext, MessageRole, PayloadVariant};
use tracing_subscriber::EnvFilter;

const GREETING: &str = "Hello! Upload a file or ask me a question.";

#[derive(Default)]
struct CliOverrides {
    endpoint: Option<String>,
    variant: Option<PayloadVariant>,
    timeout_ms: Option<u64>,
    attach: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let overrides = parse_args(std::env::args().skip(1).collect())?;
    let config = load_config(&overrides)?;
    let bridge = AgentBridge::new(config)?;

    eprintln!(
        "orchestrate_chat: variant={}, endpoint={}, commands=/attach /detach /history /clear /exit /quit",
        bridge.variant(),
        bridge.endpoint()
    );

    let mut document = match &overrides.attach {
        Some(path) => Some(attach(path)?),
        None => None,
    };

    let mut conversation = Conversation::with_greeting(GREETING);
    println!("{GREETING}");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }

        match parse_command(&input) {
            Command::Empty => {}
            Command::Exit => break,
            Command::Clear => {
                conversation = Conversation::with_greeting(GREETING);
                println!("(history cleared)");
            }
            Command::History => print_history(&conversation),
            Command::Detach => {
                document = None;
                println!("(document detached)");
            }
            Command::Attach(path) => match attach(path) {
                Ok(loaded) => document = Some(loaded),
                Err(err) => eprintln!("error: {err}"),
            },
            Command::Message(user_text) => {
                let reply = bridge
                    .run_turn(&mut conversation, user_text, document.as_ref())
                    .await;
                println!("{}", reply.content);
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Exit,
    Clear,
    History,
    Detach,
    Attach(&'a str),
    Message(&'a str),
}

fn parse_command(input: &str) -> Command<'_> {
    let line = input.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head.to_ascii_lowercase().as_str() {
        "/exit" | "/quit" if rest.is_empty() => Command::Exit,
        "/clear" if rest.is_empty() => Command::Clear,
        "/history" if rest.is_empty() => Command::History,
        "/detach" if rest.is_empty() => Command::Detach,
        "/attach" => Command::Attach(rest),
        _ => Command::Message(line),
    }
}

fn attach(path: &str) -> Result<DocumentContext, Box<dyn std::error::Error>> {
    if path.is_empty() {
        return Err("usage: /attach <path to .txt, .csv, .tsv or .json>".into());
    }

    let document = DocumentContext::load(path)?;
    println!(
        "(attached {}; its content is added to every message)\n{}",
        document.source().unwrap_or(path),
        document.preview(DEFAULT_PREVIEW_CHARS)
    );
    Ok(document)
}

fn print_history(conversation: &Conversation) {
    for message in conversation.messages() {
        let speaker = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "agent",
        };
        println!("[{speaker}] {}", message.content);
    }
}

fn load_config(overrides: &CliOverrides) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let mut config = BridgeConfig::from_lookup(|name| {
        if name == ENDPOINT_ENV && overrides.endpoint.is_some() {
            return overrides.endpoint.clone();
        }
        if name == VARIANT_ENV && overrides.variant.is_some() {
            return overrides.variant.map(|variant| variant.as_str().to_string());
        }
        std::env::var(name).ok()
    })?;

    if let Some(timeout_ms) = overrides.timeout_ms {
        config = config.with_timeout_ms(timeout_ms)?;
    }

    Ok(config)
}

fn parse_args(args: Vec<String>) -> Result<CliOverrides, Box<dyn std::error::Error>> {
    let mut overrides = CliOverrides::default();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--endpoint" => {
                let value = args.get(i + 1).ok_or("missing value for --endpoint")?;
                overrides.endpoint = Some(value.trim().to_string());
                i += 2;
            }
            "--variant" => {
                let value = args
                    .get(i + 1)
                    .ok_or("missing value for --variant (single_turn|multi_turn)")?;
                overrides.variant = Some(
                    PayloadVariant::parse(value)
                        .ok_or("invalid --variant value (expected single_turn|multi_turn)")?,
                );
                i += 2;
            }
            "--timeout-ms" => {
                let value = args.get(i + 1).ok_or("missing value for --timeout-ms")?;
                overrides.timeout_ms = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| "--timeout-ms must be a positive integer")?,
                );
                i += 2;
            }
            "--attach" => {
                let value = args.get(i + 1).ok_or("missing value for --attach")?;
                overrides.attach = Some(value.clone());
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(format!("unknown argument: {other}").into());
            }
        }
    }

    Ok(overrides)
}

fn print_help() {
    println!(
        "Usage:\n  cargo run --bin orchestrate_chat -- [--endpoint URL] [--variant single_turn|multi_turn] [--timeout-ms N] [--attach PATH]\n\nEnv:\n  WATSONX_API_KEY (required)\n  WATSONX_ORCHESTRATE_ENDPOINT (required unless --endpoint)\n  WATSONX_ORCHESTRATE_VARIANT\n  WATSONX_ORCHESTRATE_TIMEOUT_MS\n  WATSONX_IAM_TOKEN_URL\n\nCommands:\n  /attach PATH  add a .txt, .csv, .tsv or .json file as context\n  /detach       stop sending the attached file\n  /history      print the transcript\n  /clear        start a new conversation\n  /exit         quit\n  /quit         quit"
    );
}
