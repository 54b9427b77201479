//! Storage Cluster Operator
//!
//! Watches StorageCluster resources and converges each one into its child
//! resources: cephfs and rbd storage classes, a CephFilesystem, a
//! CephBlockPool and, where the platform calls for them, a CephObjectStore
//! and CephObjectStoreUser.

use clap::Parser;
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::Client;
use prometheus::IntCounter;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storage_cluster_operator::{
    CloudPlatform, Error, ErrorAction, KubeStore, ReconcileRequest, Reconciler, Result,
    StorageCluster,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Cluster Operator - StorageCluster initialization reconciler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment platform detected at install time (aws, gce, azure, ...)
    #[arg(long, env = "PLATFORM", default_value = "unknown")]
    platform: String,

    /// Namespace to watch for StorageClusters
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "openshift-storage")]
    namespace: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Controller Context
// =============================================================================

struct Ctx {
    reconciler: Reconciler,
    reconciles: IntCounter,
    failures: IntCounter,
}

impl Ctx {
    fn new(reconciler: Reconciler) -> Result<Self> {
        let reconciles = prometheus::register_int_counter!(
            "storage_cluster_reconciles_total",
            "Total number of reconciliation passes"
        )
        .map_err(|e| Error::Internal(format!("Failed to register metrics: {}", e)))?;
        let failures = prometheus::register_int_counter!(
            "storage_cluster_reconcile_failures_total",
            "Total number of failed reconciliation passes"
        )
        .map_err(|e| Error::Internal(format!("Failed to register metrics: {}", e)))?;
        Ok(Self {
            reconciler,
            reconciles,
            failures,
        })
    }
}

async fn reconcile(cluster: Arc<StorageCluster>, ctx: Arc<Ctx>) -> Result<Action> {
    ctx.reconciles.inc();
    let request = ReconcileRequest::new(
        cluster.metadata.namespace.clone().unwrap_or_default(),
        cluster.name(),
    );
    let outcome = ctx.reconciler.reconcile(&request).await.map_err(|e| {
        ctx.failures.inc();
        e
    })?;
    Ok(match outcome.requeue_after {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    })
}

fn error_policy(_cluster: Arc<StorageCluster>, err: &Error, _ctx: Arc<Ctx>) -> Action {
    match err.action() {
        ErrorAction::RequeueWithBackoff => Action::requeue(Duration::from_secs(5)),
        ErrorAction::RequeueAfter(delay) => Action::requeue(delay),
        ErrorAction::NoRequeue => Action::await_change(),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    let platform = CloudPlatform::resolve(Some(&args.platform));

    info!("Starting Storage Cluster Operator");
    info!("  Version: {}", storage_cluster_operator::VERSION);
    info!("  Platform: {}", platform);
    info!("  Namespace: {}", args.namespace);

    let client = Client::try_default().await?;
    let store = Arc::new(KubeStore::new(client.clone(), &args.namespace));
    let reconciler = Reconciler::new(store, platform);
    let ctx = Arc::new(Ctx::new(reconciler)?);

    // Start health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = args.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr).await {
            error!("Metrics server error: {}", e);
        }
    });

    let clusters: Api<StorageCluster> = Api::namespaced(client, &args.namespace);

    info!("Watching StorageClusters in {}", args.namespace);
    Controller::new(clusters, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((cluster, _)) => debug!(name = %cluster.name, "Reconciliation complete"),
                Err(e) => warn!(error = %e, "Reconciliation failed"),
            }
        })
        .await;

    info!("Operator shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("kube=info".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

async fn run_health_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/healthz" | "/livez" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                "/readyz" => Response::builder()
                    .status(StatusCode::OK)
                    .body(Body::from("ok"))
                    .unwrap(),
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid health server address: {}", e)))?;

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};
    use prometheus::{Encoder, TextEncoder};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = prometheus::gather();
                    let mut buffer = Vec::new();
                    encoder.encode(&metric_families, &mut buffer).unwrap();

                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", encoder.format_type())
                        .body(Body::from(buffer))
                        .unwrap()
                }
                _ => Response::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Body::from("not found"))
                    .unwrap(),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::Internal(format!("Invalid metrics server address: {}", e)))?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
