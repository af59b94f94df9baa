//! Terminal client for live wormhole maps.
//!
//! Provides the `linked` binary. `watch` follows a map exactly as the map
//! view does (full load, live events, reloads on sync errors) and prints a
//! summary after every store change. `events` prints the raw event stream.
//! The remaining subcommands issue single mutations through the same actions
//! the view uses; their results arrive on any open `watch`.
//!
//! Connection settings are read from flags, falling back to the
//! `LINKED_API_URL`, `LINKED_SESSION` and `LINKED_RECONNECT_MS` environment
//! variables.

use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use linked_core::{
    EventId, LifetimeStatus, LinkId, MapDetail, MapEvent, MapId, MassStatus, NodeId, Position,
};
use linked_sync::render::{render_edges, render_nodes};
use linked_sync::{
    ActionError, ApiClient, ClientConfig, ConfigError, DeletionOutcome, GraphState, MapActions,
    MapEventStream, MapView, StreamMessage, TracingNotifier, ViewExit,
};

/// Live wormhole map client.
#[derive(Parser)]
#[command(name = "linked", about = "Live wormhole map client")]
struct Cli {
    #[command(flatten)]
    connection: Connection,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Backend base URL [env: LINKED_API_URL].
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Value of the `session` cookie [env: LINKED_SESSION].
    #[arg(long, global = true)]
    session: Option<String>,

    /// Event stream reconnect delay in milliseconds [env: LINKED_RECONNECT_MS].
    #[arg(long, global = true)]
    reconnect_ms: Option<u64>,
}

impl Connection {
    fn config(&self) -> Result<ClientConfig, ConfigError> {
        self.config_with(|var| std::env::var(var).ok())
    }

    /// Flags win over `env`.
    fn config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, ConfigError> {
        ClientConfig::from_lookup(|var| {
            let flag = match var {
                "LINKED_API_URL" => self.api_url.clone(),
                "LINKED_SESSION" => self.session.clone(),
                "LINKED_RECONNECT_MS" => self.reconnect_ms.map(|ms| ms.to_string()),
                _ => None,
            };
            flag.or_else(|| env(var))
        })
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Follow a map live, printing a summary after every change.
    Watch {
        /// Map ID.
        map: Uuid,
    },

    /// Print a map's raw event stream.
    Events {
        /// Map ID.
        map: Uuid,

        /// Replay every event after this event ID first.
        #[arg(long)]
        from: Option<String>,
    },

    /// Print a map's full state as JSON.
    Snapshot {
        /// Map ID.
        map: Uuid,
    },

    /// Lock an unlocked node, or unlock a locked one.
    Lock {
        map: Uuid,
        node: Uuid,
    },

    /// Move a node. Locked nodes stay put.
    Move {
        map: Uuid,
        node: Uuid,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Swap a connection's source and target.
    Reverse {
        map: Uuid,
        link: Uuid,
    },

    /// Set a connection's mass status: stable, destabilized or critical.
    Mass {
        map: Uuid,
        link: Uuid,
        status: String,
    },

    /// Set a connection's lifetime status: stable, aging, critical or eol.
    Lifetime {
        map: Uuid,
        link: Uuid,
        status: String,
    },

    /// Delete nodes and connections. Locked nodes are kept.
    Delete {
        map: Uuid,

        /// Node to delete (repeatable).
        #[arg(long = "node")]
        nodes: Vec<Uuid>,

        /// Connection to delete (repeatable).
        #[arg(long = "link")]
        links: Vec<Uuid>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match cli.connection.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(3);
        }
    };

    let exit_code = match cli.command {
        Commands::Watch { map } => run_watch(&config, MapId(map)).await,
        Commands::Events { map, from } => run_events(&config, MapId(map), from).await,
        Commands::Snapshot { map } => run_snapshot(&config, MapId(map)).await,
        Commands::Lock { map, node } => run_lock(&config, MapId(map), NodeId(node)).await,
        Commands::Move { map, node, x, y } => {
            run_move(&config, MapId(map), NodeId(node), Position { x, y }).await
        }
        Commands::Reverse { map, link } => {
            let result = actions(&config).reverse_edge(MapId(map), LinkId(link)).await;
            report(result, "connection reversed")
        }
        Commands::Mass { map, link, status } => match parse_mass_status(&status) {
            Ok(status) => {
                let result = actions(&config)
                    .update_edge_mass_status(MapId(map), LinkId(link), status)
                    .await;
                report(result, "mass status updated")
            }
            Err(msg) => {
                eprintln!("Error: {}", msg);
                2
            }
        },
        Commands::Lifetime { map, link, status } => match parse_lifetime_status(&status) {
            Ok(status) => {
                let result = actions(&config)
                    .update_edge_lifetime_status(MapId(map), LinkId(link), status)
                    .await;
                report(result, "lifetime status updated")
            }
            Err(msg) => {
                eprintln!("Error: {}", msg);
                2
            }
        },
        Commands::Delete { map, nodes, links } => {
            run_delete(&config, MapId(map), nodes, links).await
        }
    };

    process::exit(exit_code);
}

fn actions(config: &ClientConfig) -> MapActions {
    MapActions::new(ApiClient::new(config), Arc::new(TracingNotifier))
}

/// Prints `done` on success. Failures were already logged as toasts.
fn report(result: Result<(), ActionError>, done: &str) -> i32 {
    match result {
        Ok(()) => {
            println!("{}", done);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn load(client: &ApiClient, map_id: MapId) -> Result<MapDetail, i32> {
    client.load_map(map_id).await.map_err(|e| {
        eprintln!("Error: failed to load map {}: {}", map_id, e);
        1
    })
}

// ---------------------------------------------------------------------------
// Live commands
// ---------------------------------------------------------------------------

/// Execute the watch subcommand.
///
/// Returns exit code: 0 = left the map or stream closed, 1 = load failed.
async fn run_watch(config: &ClientConfig, map_id: MapId) -> i32 {
    let view = MapView::new(config, Arc::new(TracingNotifier));

    let mut changes = view.store().subscribe();
    let session = view.session().clone();
    let printer = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().clone();
            print_summary(&state, session.state().read_only);
        }
    });

    let exit = tokio::select! {
        exit = view.run(map_id) => exit,
        _ = tokio::signal::ctrl_c() => {
            info!(%map_id, "interrupted");
            view.leave();
            Ok(ViewExit::StreamClosed)
        }
    };
    printer.abort();

    match exit {
        Ok(ViewExit::Left(reason)) => {
            println!("left map {}: {:?}", map_id, reason);
            0
        }
        Ok(ViewExit::StreamClosed) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_summary(state: &GraphState, read_only: bool) {
    let Some(map) = state.map() else {
        return;
    };
    let nodes = render_nodes(state, read_only);
    let edges = render_edges(state);
    let pinned = nodes.iter().filter(|n| !n.draggable).count();

    println!(
        "[rev {}] {}{}: {} systems ({} pinned), {} connections",
        state.revision(),
        map.name,
        if read_only { " (read-only)" } else { "" },
        nodes.len(),
        pinned,
        edges.len()
    );
    for edge in &edges {
        println!(
            "  {} [{}] -> {} [{}]  {} / {}",
            system_label(state, edge.source),
            edge.source_label,
            system_label(state, edge.target),
            edge.target_label,
            edge.data.mass_usage.as_str(),
            edge.data.lifetime_status.as_str()
        );
    }
}

fn system_label(state: &GraphState, node_id: NodeId) -> String {
    match state.node(node_id) {
        Some(node) => node
            .system_name
            .clone()
            .unwrap_or_else(|| node.system_id.to_string()),
        None => node_id.to_string(),
    }
}

/// Execute the events subcommand. Runs until the server closes the stream,
/// a `sync_error` arrives, or Ctrl-C.
async fn run_events(config: &ClientConfig, map_id: MapId, from: Option<String>) -> i32 {
    let mut stream = MapEventStream::open(ApiClient::new(config), map_id, from.map(EventId));

    loop {
        let message = tokio::select! {
            message = stream.next() => message,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(message) = message else {
            break;
        };

        match message {
            StreamMessage::Connected => info!(%map_id, "connected"),
            StreamMessage::TransportError(e) => eprintln!("stream interrupted: {}", e),
            StreamMessage::Event { id, event } => {
                let id = id.as_ref().map(EventId::as_str).unwrap_or("-");
                println!("{}\t{}", id, describe(&event));
            }
            StreamMessage::Closed => break,
        }
    }

    stream.close();
    if let Some(cursor) = stream.last_event_id() {
        info!(%map_id, cursor = cursor.as_str(), "resume with --from");
    }
    0
}

fn describe(event: &MapEvent) -> String {
    match event {
        MapEvent::NodeCreated(node) | MapEvent::NodeUpdated(node) => {
            format!("{} {} system={}", event.kind(), node.id, node.system_id)
        }
        MapEvent::NodeDeleted(id) => format!("{} {}", event.kind(), id),
        MapEvent::LinkCreated(link) | MapEvent::LinkUpdated(link) => format!(
            "{} {} {} -> {}",
            event.kind(),
            link.id,
            link.source_node_id,
            link.target_node_id
        ),
        MapEvent::LinkDeleted(id) => format!("{} {}", event.kind(), id),
        MapEvent::MapUpdated(map) => format!("{} {}", event.kind(), map.name),
        MapEvent::CharacterPresence {
            node_id,
            change,
            character,
        } => format!(
            "{} {:?} {} at {}",
            event.kind(),
            change,
            character.character_name,
            node_id
        ),
        MapEvent::SyncError { message } => format!(
            "{} {}",
            event.kind(),
            message.as_deref().unwrap_or("(no message)")
        ),
        other => other.kind().to_string(),
    }
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

async fn run_snapshot(config: &ClientConfig, map_id: MapId) -> i32 {
    let detail = match load(&ApiClient::new(config), map_id).await {
        Ok(detail) => detail,
        Err(code) => return code,
    };
    let json = serde_json::to_string_pretty(&detail)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize map: {}\"}}", e));
    println!("{}", json);
    0
}

async fn run_lock(config: &ClientConfig, map_id: MapId, node_id: NodeId) -> i32 {
    let client = ApiClient::new(config);
    let detail = match load(&client, map_id).await {
        Ok(detail) => detail,
        Err(code) => return code,
    };
    let Some(node) = detail.nodes.iter().find(|n| n.id == node_id) else {
        eprintln!("Error: node {} is not on map {}", node_id, map_id);
        return 2;
    };

    let done = if node.locked { "node unlocked" } else { "node locked" };
    let result = MapActions::new(client, Arc::new(TracingNotifier))
        .toggle_node_lock(map_id, node)
        .await;
    report(result, done)
}

async fn run_move(config: &ClientConfig, map_id: MapId, node_id: NodeId, to: Position) -> i32 {
    let client = ApiClient::new(config);
    let detail = match load(&client, map_id).await {
        Ok(detail) => detail,
        Err(code) => return code,
    };
    let Some(node) = detail.nodes.iter().find(|n| n.id == node_id) else {
        eprintln!("Error: node {} is not on map {}", node_id, map_id);
        return 2;
    };

    match MapActions::new(client, Arc::new(TracingNotifier))
        .move_selection(map_id, &[(node, to)])
        .await
    {
        Ok(0) => {
            eprintln!("Error: node {} is locked", node_id);
            2
        }
        Ok(_) => {
            println!("node moved to ({}, {})", to.x, to.y);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn run_delete(
    config: &ClientConfig,
    map_id: MapId,
    nodes: Vec<Uuid>,
    links: Vec<Uuid>,
) -> i32 {
    let client = ApiClient::new(config);
    let detail = match load(&client, map_id).await {
        Ok(detail) => detail,
        Err(code) => return code,
    };

    let mut selected_nodes = Vec::with_capacity(nodes.len());
    for id in nodes.into_iter().map(NodeId) {
        match detail.nodes.iter().find(|n| n.id == id) {
            Some(node) => selected_nodes.push(node),
            None => {
                eprintln!("Error: node {} is not on map {}", id, map_id);
                return 2;
            }
        }
    }
    let mut selected_links = Vec::with_capacity(links.len());
    for id in links.into_iter().map(LinkId) {
        match detail.links.iter().find(|l| l.id == id) {
            Some(link) => selected_links.push(link),
            None => {
                eprintln!("Error: connection {} is not on map {}", id, map_id);
                return 2;
            }
        }
    }

    match MapActions::new(client, Arc::new(TracingNotifier))
        .delete_selection(map_id, &selected_nodes, &selected_links)
        .await
    {
        Ok(DeletionOutcome::Completed(plan)) => {
            println!(
                "deleted {} systems and {} connections ({} locked systems kept)",
                plan.nodes.len(),
                plan.links.len(),
                plan.skipped_locked.len()
            );
            0
        }
        Ok(DeletionOutcome::Cancelled { locked }) => {
            eprintln!("Error: all {} selected systems are locked", locked.len());
            2
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// Parse a mass status, accepting the fresh/reduced display names too.
fn parse_mass_status(s: &str) -> Result<MassStatus, String> {
    match s.to_ascii_lowercase().as_str() {
        "stable" | "fresh" => Ok(MassStatus::Stable),
        "destabilized" | "reduced" => Ok(MassStatus::Destabilized),
        "critical" => Ok(MassStatus::Critical),
        _ => Err(format!(
            "invalid mass status '{}', expected stable/destabilized/critical",
            s
        )),
    }
}

fn parse_lifetime_status(s: &str) -> Result<LifetimeStatus, String> {
    match s.to_ascii_lowercase().as_str() {
        "stable" => Ok(LifetimeStatus::Stable),
        "aging" => Ok(LifetimeStatus::Aging),
        "critical" => Ok(LifetimeStatus::Critical),
        "eol" => Ok(LifetimeStatus::Eol),
        _ => Err(format!(
            "invalid lifetime status '{}', expected stable/aging/critical/eol",
            s
        )),
    }
}
