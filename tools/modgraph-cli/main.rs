use clap::{Parser, Subcommand};
use modgraph::execution::{ExecutionEvent, MessageLevel};
use modgraph::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Validate, encode and run module graphs against an execution service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a graph document for errors and warnings
    Validate {
        /// Path to the graph document JSON file
        graph_path: String,
        /// Path to the module catalog JSON file
        #[arg(short, long)]
        catalog: String,
    },
    /// Print the wire form of a graph document
    Encode {
        graph_path: String,
        #[arg(short, long)]
        catalog: String,
    },
    /// Validate a graph document and execute it on the service
    Run {
        graph_path: String,
        #[arg(short, long)]
        catalog: String,
        /// Execution service base URL (overrides MODGRAPH_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Write the execution log to this file
        #[arg(long)]
        log: Option<String>,
        /// Skip the pause between replay steps
        #[arg(long)]
        no_delay: bool,
    },
    /// List the modules offered by the service
    Modules {
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Load and validate every preset graph offered by the service
    Presets {
        #[arg(long)]
        api_url: Option<String>,
        /// Print the wire form of the named preset instead of the summary
        #[arg(long)]
        show: Option<String>,
    },
    /// Check that the service is reachable
    Health {
        #[arg(long)]
        api_url: Option<String>,
    },
}

/// Prints replay progress as it is published.
struct ConsoleObserver;

impl ExecutionObserver for ConsoleObserver {
    fn on_event(&mut self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::NodeExecuting {
                node_id: Some(node_id),
            } => println!("  -> {}", node_id),
            ExecutionEvent::Message(message) => {
                let prefix = match message.level {
                    MessageLevel::Success => "OK",
                    MessageLevel::Warning => "Warning",
                    MessageLevel::Error => "Error",
                };
                match &message.detail {
                    Some(detail) => println!("{}: {} ({})", prefix, message.text, detail),
                    None => println!("{}: {}", prefix, message.text),
                }
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate {
            graph_path,
            catalog,
        } => run_validate(&graph_path, &catalog),
        Command::Encode {
            graph_path,
            catalog,
        } => run_encode(&graph_path, &catalog),
        Command::Run {
            graph_path,
            catalog,
            api_url,
            log,
            no_delay,
        } => run_execute(&graph_path, &catalog, api_url, log, no_delay).await,
        Command::Modules { api_url } => run_modules(api_url).await,
        Command::Presets { api_url, show } => run_presets(api_url, show).await,
        Command::Health { api_url } => run_health(api_url).await,
    }
}

fn load_session(graph_path: &str, catalog_path: &str) -> (GraphSession, ModuleCatalog) {
    let catalog_json = fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read catalog file '{}': {}",
            catalog_path, e
        ))
    });
    let catalog = ModuleCatalog::from_json(&catalog_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse catalog JSON: {}", e)));
    let document = GraphDocument::from_file(graph_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load graph: {}", e)));

    let mut session = GraphSession::new();
    session.load_document(&document, &catalog);
    (session, catalog)
}

fn print_validation(result: &ValidationResult) {
    for issue in result.errors.iter().chain(&result.warnings) {
        println!("  {}", issue);
    }
    if result.valid && result.warnings.is_empty() {
        println!("Graph is valid");
    } else if result.valid {
        println!("Graph has {} warning(s)", result.warnings.len());
    } else {
        println!("Graph has {} error(s)", result.errors.len());
    }
}

fn run_validate(graph_path: &str, catalog_path: &str) {
    let (mut session, _) = load_session(graph_path, catalog_path);
    let result = session.validate().clone();
    print_validation(&result);
    if !result.valid {
        std::process::exit(1);
    }
}

fn run_encode(graph_path: &str, catalog_path: &str) {
    let (session, _) = load_session(graph_path, catalog_path);
    let wire = WireCodec::encode(session.graph());
    let json = serde_json::to_string_pretty(&wire)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize graph: {}", e)));
    println!("{}", json);
}

fn build_config(api_url: Option<String>, no_delay: bool) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::from_env()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid configuration: {}", e)));
    if let Some(url) = api_url {
        config = config.with_api_url(url);
    }
    if no_delay {
        config = config.with_step_delay(std::time::Duration::ZERO);
    }
    config
}

async fn run_execute(
    graph_path: &str,
    catalog_path: &str,
    api_url: Option<String>,
    log_path: Option<String>,
    no_delay: bool,
) {
    let total_start = Instant::now();
    let (mut session, _) = load_session(graph_path, catalog_path);
    let config = build_config(api_url, no_delay);

    let service = HttpExecutionService::new(&config)
        .unwrap_or_else(|e| exit_with_error(&format!("Could not create client: {}", e)));
    println!("Executing on {}", service.base_url());

    let mut orchestrator = ExecutionOrchestrator::new(service, config);
    orchestrator.add_observer(Box::new(ConsoleObserver));

    let outcome = session.run(&mut orchestrator).await;
    if let Some(result) = session.validation_result() {
        if !result.valid {
            print_validation(result);
        }
    }

    if let Some(path) = log_path {
        let log = ExecutionLogFormatter::format_log(
            session.graph(),
            &orchestrator.results(),
            orchestrator.history(),
        );
        fs::write(&path, log)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write log '{}': {}", path, e)));
        println!("Execution log written to {}", path);
    }

    println!("Total: {:?}", total_start.elapsed());
    match outcome {
        ExecutionOutcome::Completed(_) | ExecutionOutcome::Empty => {}
        _ => std::process::exit(1),
    }
}

fn connect(api_url: Option<String>) -> HttpExecutionService {
    let config = build_config(api_url, false);
    HttpExecutionService::new(&config)
        .unwrap_or_else(|e| exit_with_error(&format!("Could not create client: {}", e)))
}

async fn run_modules(api_url: Option<String>) {
    let service = connect(api_url);
    let catalog = service
        .fetch_modules()
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to fetch modules: {}", e)));

    for module in catalog.modules() {
        println!("{} [{}]", module.module_type, module.category);
        for port in &module.inputs {
            let marker = if port.optional { "?" } else { "" };
            println!("    in  {}{}: {}", port.name, marker, port.port_type);
        }
        for port in &module.outputs {
            println!("    out {}: {}", port.name, port.port_type);
        }
    }
}

async fn run_presets(api_url: Option<String>, show: Option<String>) {
    let service = connect(api_url);
    let catalog = service
        .fetch_modules()
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to fetch modules: {}", e)));
    let presets = service
        .fetch_presets()
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to fetch presets: {}", e)));

    if let Some(name) = show {
        let preset = presets
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| exit_with_error(&format!("No preset named '{}'", name)));
        let json = serde_json::to_string_pretty(&preset.to_wire())
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize preset: {}", e)));
        println!("{}", json);
        return;
    }

    let layout = LayeredLayout::default();
    for preset in &presets {
        let mut session = GraphSession::new();
        session.load_wire(&preset.to_wire(), &catalog, &layout);
        let graph = session.graph();
        let (nodes, edges) = (graph.nodes.len(), graph.edges.len());
        let result = session.validate();
        let status = if result.valid { "valid" } else { "invalid" };
        println!(
            "{} ({} nodes, {} edges, {})",
            preset.name, nodes, edges, status
        );
        if !preset.description.is_empty() {
            println!("    {}", preset.description);
        }
        for issue in &result.errors {
            println!("    {}", issue);
        }
    }
}

async fn run_health(api_url: Option<String>) {
    let service = connect(api_url);
    match service.health().await {
        Ok(health) => println!(
            "{}: {} (version {})",
            service.base_url(),
            health.status,
            health.version
        ),
        Err(e) => exit_with_error(&format!("Service unreachable: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
