//! deskview - Browser-based remote desktop
//!
//! Streams one monitor as JPEG frames over a WebSocket to a logged-in viewer
//! and relays the viewer's clicks, pointer moves, scrolls and keys back to
//! the host.

use anyhow::{Context, Result};
use clap::Parser;
use deskview_auth::Credentials;
use deskview_capture::{open_source, probe_monitor};
use deskview_core::{CaptureBackend, Config, FrameTransport, InputEvent};
use deskview_input::{detect_activator, InputRelay, UinputInjector};
use deskview_server::{
    broadcast::AppState, create_router, load_rustls_config, Broadcaster, SourceFactory,
    StreamSession,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// deskview - Share this desktop with a browser
#[derive(Parser, Debug)]
#[command(name = "deskview")]
#[command(version, about, long_about = None)]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Target frame rate (upper bound)
    #[arg(short, long, default_value = "80")]
    fps: u32,

    /// Maximum width of streamed frames
    #[arg(short = 'W', long, default_value = "1920")]
    max_width: u32,

    /// Maximum height of streamed frames
    #[arg(short = 'H', long, default_value = "1080")]
    max_height: u32,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "80")]
    quality: u8,

    /// Capture backend (shm, x11)
    #[arg(short, long, default_value = "shm")]
    backend: CaptureBackend,

    /// Monitor to capture: 0 is the whole desktop, 1 the first monitor
    #[arg(short, long, default_value = "1")]
    monitor: usize,

    /// Frame transport on the viewer socket (json, binary)
    #[arg(long, default_value = "json")]
    transport: FrameTransport,

    /// Credentials file (JSON with username and password)
    #[arg(short, long)]
    credentials: Option<PathBuf>,

    /// How long a disconnect waits for the capture loop, in milliseconds
    #[arg(long, default_value = "1000")]
    join_timeout_ms: u64,

    /// Pause between window activation and scrolling, in milliseconds
    #[arg(long, default_value = "100")]
    scroll_settle_ms: u64,

    /// Serve HTTPS
    #[arg(long)]
    tls: bool,

    /// Path to TLS certificate file (PEM format); self-signed if omitted
    #[arg(long, requires = "tls")]
    cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long, requires = "tls")]
    key: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("deskview v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::new()
        .with_fps(args.fps)
        .with_max_size(args.max_width, args.max_height)
        .with_quality(args.quality)
        .with_backend(args.backend)
        .with_monitor(args.monitor)
        .with_port(args.port)
        .with_transport(args.transport)
        .with_join_timeout(Duration::from_millis(args.join_timeout_ms))
        .with_scroll_settle(Duration::from_millis(args.scroll_settle_ms));
    config.validate().context("Invalid configuration")?;

    let credentials_path = match args.credentials {
        Some(path) => path,
        None => Credentials::default_path()?,
    };
    let credentials = Credentials::load(&credentials_path)
        .with_context(|| format!("Cannot start without credentials ({:?})", credentials_path))?;

    let geometry = probe_monitor(config.monitor)
        .with_context(|| format!("Failed to open monitor {}", config.monitor))?;
    info!(
        "Monitor {}: {}x{} at {},{} (desktop {}x{})",
        config.monitor,
        geometry.width,
        geometry.height,
        geometry.x,
        geometry.y,
        geometry.desktop_width,
        geometry.desktop_height
    );

    // Input relay on its own thread so injection never blocks the runtime
    let (input_tx, input_rx) = mpsc::channel::<InputEvent>(64);
    let injector = match UinputInjector::new(
        geometry.desktop_width,
        geometry.desktop_height,
        geometry.x,
        geometry.y,
    ) {
        Ok(injector) => Some(injector),
        Err(e) => {
            warn!("Input injection unavailable, viewer input will be ignored: {}", e);
            None
        }
    };
    spawn_input_relay(input_rx, injector, config.scroll_settle)
        .context("Failed to start input relay thread")?;

    let backend = config.backend;
    let monitor = config.monitor;
    let factory: SourceFactory = Arc::new(move || open_source(backend, monitor));

    let broadcaster = Broadcaster::new();
    let stream = StreamSession::new(config.clone(), factory, broadcaster.clone());

    let state = Arc::new(AppState::new(
        config.clone(),
        (geometry.width, geometry.height),
        broadcaster,
        stream,
        input_tx,
        credentials,
    ));

    let router = create_router(state.clone());
    let addr = SocketAddr::new(args.bind, config.port);

    let local_ip = get_local_ip().unwrap_or_else(|| "localhost".to_string());
    let protocol = if args.tls { "https" } else { "http" };
    info!("");
    info!("  Access URL: {}://{}:{}", protocol, local_ip, config.port);

    if args.tls {
        let hostnames = vec![local_ip.clone(), "localhost".to_string()];
        let (tls_config, fingerprint) =
            load_rustls_config(args.cert.as_deref(), args.key.as_deref(), &hostnames).await?;

        info!("  Cert fingerprint: {}", fingerprint);
        info!("");
        info!("Press Ctrl+C to stop.");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
        });

        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;
    } else {
        info!("");
        info!("Press Ctrl+C to stop.");

        let shutdown = async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        };

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
    }

    state.stream.stop().await;

    info!("Goodbye!");
    Ok(())
}

/// Drain input events on a dedicated thread, in receipt order
fn spawn_input_relay(
    mut input_rx: mpsc::Receiver<InputEvent>,
    injector: Option<UinputInjector>,
    settle: Duration,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("input-relay".to_string())
        .spawn(move || {
            match injector {
                Some(injector) => {
                    let mut relay = InputRelay::new(injector, detect_activator(), settle);
                    while let Some(event) = input_rx.blocking_recv() {
                        relay.on_event(event);
                    }
                }
                None => {
                    while let Some(event) = input_rx.blocking_recv() {
                        debug!("No input injector, dropping {:?}", event);
                    }
                }
            }
            debug!("Input relay stopped");
        })
}

/// Get the local IP address
fn get_local_ip() -> Option<String> {
    use std::net::UdpSocket;

    // Connecting a UDP socket sends nothing but selects the outbound interface
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let addr = socket.local_addr().ok()?;
    Some(addr.ip().to_string())
}
