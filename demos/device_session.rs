//! Device session against a running inspector.
//!
//! Demonstrates:
//! - Building a session with custom capabilities
//! - Serving storage requests from an in-memory store
//! - Exposing a console root (`app.version`, `app.greet('you')`)
//! - Forwarding logs and network request updates
//!
//! Usage:
//!   cargo run --example device_session -- 192.168.1.10 8080
//!   cargo run --example device_session -- 127.0.0.1 8080 --debug
//!   cargo run --example device_session -- 127.0.0.1 8080 --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use kaiware::{
    Capabilities, CommandError, Completion, ConsoleHooks, ConsoleMethod, HandlerError, HttpMethod,
    Inspectable, LogArg, Member, Result, Session, StorageType, StringMap,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    address: String,
    port: u16,
    debug: bool,
    no_wait: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = args.iter().filter(|a| !a.starts_with("--"));

        Self {
            address: positional
                .next()
                .cloned()
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: positional
                .next()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug { "kaiware=debug" } else { "kaiware=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Device
// ============================================================================

#[derive(Default)]
struct Device {
    local: Mutex<StringMap>,
    session: Mutex<StringMap>,
}

impl Device {
    fn area(&self, storage_type: StorageType) -> &Mutex<StringMap> {
        match storage_type {
            StorageType::Local => &self.local,
            StorageType::Session => &self.session,
        }
    }
}

#[async_trait]
impl Capabilities for Device {
    async fn get_elements(&self) -> std::result::Result<String, HandlerError> {
        Ok("<html><body><h1>Hello</h1></body></html>".to_string())
    }

    async fn get_storage(
        &self,
        storage_type: StorageType,
    ) -> std::result::Result<StringMap, HandlerError> {
        Ok(self.area(storage_type).lock().clone())
    }

    async fn set_storage(
        &self,
        storage_type: StorageType,
        data: StringMap,
    ) -> std::result::Result<(), HandlerError> {
        self.area(storage_type).lock().extend(data);
        Ok(())
    }

    fn console_root(&self) -> Option<Arc<dyn Inspectable>> {
        Some(Arc::new(Globals))
    }
}

// ============================================================================
// Console Root
// ============================================================================

struct Globals;

#[async_trait]
impl Inspectable for Globals {
    fn member(&self, name: &str) -> Option<Member> {
        (name == "app").then(|| Member::Object(Arc::new(App)))
    }

    fn keys(&self) -> Vec<String> {
        vec!["app".to_string()]
    }

    async fn call(&self, name: &str, _args: Vec<Value>) -> std::result::Result<Member, CommandError> {
        Err(CommandError::not_callable(name))
    }
}

struct App;

#[async_trait]
impl Inspectable for App {
    fn member(&self, name: &str) -> Option<Member> {
        match name {
            "version" => Some(json!(env!("CARGO_PKG_VERSION")).into()),
            "features" => Some(json!(["storage", "console"]).into()),
            "greet" => Some(Member::Method),
            _ => None,
        }
    }

    fn keys(&self) -> Vec<String> {
        ["version", "features", "greet"].map(String::from).to_vec()
    }

    async fn call(&self, name: &str, args: Vec<Value>) -> std::result::Result<Member, CommandError> {
        match name {
            "greet" => {
                let who = args.first().and_then(Value::as_str).unwrap_or("world");
                Ok(json!(format!("Hello, {who}!")).into())
            }
            _ => Err(CommandError::not_callable(name)),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Device Session ===\n");

    let session = Session::builder()
        .address(&args.address)
        .port(args.port)
        .device_name("Demo Handset")
        .source_id("device-demo")
        .hooks(ConsoleHooks::all())
        .network_requests(true)
        .capabilities(Device::default())
        .build()?;

    println!("[1] Connecting to {}...", session.endpoint());
    session.connect().await?;
    println!("    ✓ {}\n", session.state());

    // ========================================================================
    // Logs
    // ========================================================================

    println!("[2] Forwarding logs...");
    let logger = session.logger();
    logger.info(["demo started"]);
    logger.console(
        ConsoleMethod::Warn,
        [LogArg::from("low battery"), LogArg::from(json!({ "level": 12 }))],
    );
    logger.report_error(&std::io::Error::other("sample failure"));
    println!("    ✓ Sent\n");

    // ========================================================================
    // Network
    // ========================================================================

    println!("[3] Reporting a network request...");
    let network = session.network();
    let id = network.on_start(HttpMethod::Get, "https://example.com/api/items", None);
    network.on_header_set(&id, "Accept", "application/json");
    network.on_complete(
        &id,
        Completion {
            status_code: Some(200),
            response_body: Some(r#"{"items":[]}"#.to_string()),
            response_type: Some("json".to_string()),
            ..Completion::default()
        },
    );
    println!("    ✓ {id}\n");

    // ========================================================================
    // Serve
    // ========================================================================

    if args.no_wait {
        println!("[--no-wait] Skipping wait");
    } else {
        println!("Serving inspector requests. Press Ctrl+C to exit.");
        tokio::signal::ctrl_c().await?;
    }

    session.disconnect()?;
    println!("\n=== Done ===");
    Ok(())
}
