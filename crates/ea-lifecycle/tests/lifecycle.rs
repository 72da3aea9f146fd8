//! Orchestrator integration tests.
//!
//! Drives initialize, deploy, upgrade and test against the in-memory
//! runtime, a static tag source and an in-memory journal.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use ea_core::{
    AdapterStaticConfig, ChainVars, ConfigResolver, ExtensionRegistry, HostEnvironment,
    ManagerConfig,
};
use ea_journal::{MemoryJournal, OperationKind, Outcome};
use ea_lifecycle::{
    AttachOutcome, LifecycleError, LifecycleResult, NewestTag, Orchestrator, ResourceStatus, Step,
    TagSelector,
};
use ea_probe::{Prober, ProberConfig};
use ea_registry::{StaticTagSource, TagResolver};
use ea_runtime::{
    ContainerRuntime, ContainerState, FailPoint, MemoryRuntime, NetworkSpec, RuntimeCall,
};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const COINGECKO_REPO: &str = "public.ecr.aws/chainlink/adapters/coingecko-adapter";
const TIINGO_REPO: &str = "public.ecr.aws/chainlink/adapters/tiingo-adapter";

struct Harness {
    orchestrator: Orchestrator,
    runtime: Arc<MemoryRuntime>,
    journal: Arc<MemoryJournal>,
    dir: TempDir,
}

impl Harness {
    fn entries(&self, kind: OperationKind) -> Vec<ea_journal::OperationRecord> {
        self.journal
            .records()
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }
}

fn shared_network() -> NetworkSpec {
    NetworkSpec {
        name: "eas-net".into(),
        driver: "bridge".into(),
        subnet: "192.168.0.0/16".into(),
        gateway: Ipv4Addr::new(192, 168, 0, 1),
    }
}

fn host_environment() -> HostEnvironment {
    HostEnvironment {
        credentials: [("COINGECKO_API_KEY", "abc123"), ("TIINGO_API_KEY", "")]
            .into_iter()
            .collect(),
        chains: ChainVars::new(),
        adapters: [
            (
                "coingecko",
                AdapterStaticConfig {
                    ip_address: Some(Ipv4Addr::new(192, 168, 1, 113)),
                    port: Some(1113),
                    api_key_variable_name: Some("COINGECKO_API_KEY".into()),
                    subscription_tier_variable_name: Some("COINGECKO_SUB_HTTP".into()),
                },
            ),
            (
                "tiingo",
                AdapterStaticConfig {
                    ip_address: Some(Ipv4Addr::new(192, 168, 1, 120)),
                    port: Some(1120),
                    api_key_variable_name: Some("TIINGO_API_KEY".into()),
                    subscription_tier_variable_name: None,
                },
            ),
        ]
        .into_iter()
        .collect(),
    }
}

fn harness_with(runtime: MemoryRuntime, tags: StaticTagSource, probe_port: u16) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ManagerConfig::default();
    config.cache.data_dir = dir.path().join("cache").join("redis");

    let runtime = Arc::new(runtime);
    let journal = Arc::new(MemoryJournal::new());
    let resolver = ConfigResolver::new(
        Arc::new(host_environment()),
        config.network_defaults(),
        config.adapters.clone(),
        ExtensionRegistry::builtin(),
    );
    let prober = Prober::new(
        runtime.clone(),
        ProberConfig {
            port: probe_port,
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_millis(500),
            ..ProberConfig::default()
        },
    );
    let orchestrator = Orchestrator::new(
        runtime.clone(),
        resolver,
        TagResolver::new(Arc::new(tags), 10),
        prober,
        journal.clone(),
        config.cache,
    );
    Harness {
        orchestrator,
        runtime,
        journal,
        dir,
    }
}

fn default_tags() -> StaticTagSource {
    StaticTagSource::new()
        .with_tags(COINGECKO_REPO, ["3.1.0", "3.2.1", "3.2.0"])
        .with_tags(TIINGO_REPO, ["1.0.0", "latest", "1.1.0"])
}

fn harness(runtime: MemoryRuntime) -> Harness {
    harness_with(runtime, default_tags(), 1113)
}

/// Runtime where initialize has already run.
fn initialized() -> MemoryRuntime {
    MemoryRuntime::new().with_network(shared_network())
}

fn assert_no_success(h: &Harness, kind: OperationKind) {
    assert!(
        h.entries(kind)
            .iter()
            .all(|r| r.outcome == Outcome::Failure),
        "unexpected SUCCESS entry: {:?}",
        h.journal.lines()
    );
}

// ── Initialize ─────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_creates_network_and_cache() {
    let h = harness(MemoryRuntime::new());
    let report = h.orchestrator.initialize().await.unwrap();

    assert_eq!(report.network, ResourceStatus::Created);
    assert_eq!(report.cache, ResourceStatus::Created);
    assert_eq!(report.cache_container, "redis-cache");
    assert_eq!(
        report.cache_attachment,
        AttachOutcome::Static(Ipv4Addr::new(192, 168, 1, 1))
    );
    assert!(h.runtime.has_network("eas-net"));
    assert!(h.dir.path().join("cache").join("redis").is_dir());

    let spec = h.runtime.container_spec("redis-cache").unwrap();
    assert_eq!(spec.command, vec!["redis-server", "--maxclients", "2500"]);

    let entries = h.entries(OperationKind::Initialize);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, Outcome::Success);
}

#[tokio::test]
async fn initialize_reports_uncreatable_data_dir() {
    let h = harness(MemoryRuntime::new());
    // A file where the data directory's parent should be.
    std::fs::write(h.dir.path().join("cache"), "x").unwrap();

    let err = h.orchestrator.initialize().await.unwrap_err();
    assert!(matches!(err, LifecycleError::CacheDir { .. }));
    assert!(h.runtime.container("redis-cache").is_none());
    assert_no_success(&h, OperationKind::Initialize);
}

#[tokio::test]
async fn initialize_twice_performs_no_creation_the_second_time() {
    let h = harness(MemoryRuntime::new());
    h.orchestrator.initialize().await.unwrap();
    let after_first = h.runtime.creation_count();

    let report = h.orchestrator.initialize().await.unwrap();
    assert_eq!(report.network, ResourceStatus::AlreadyPresent);
    assert_eq!(report.cache, ResourceStatus::AlreadyPresent);
    assert!(matches!(report.cache_attachment, AttachOutcome::AlreadyAttached(_)));
    assert_eq!(h.runtime.creation_count(), after_first);
}

#[tokio::test]
async fn initialize_with_everything_present_creates_nothing() {
    let runtime = initialized().with_container("redis-cache", "redis", ContainerState::Running);
    let h = harness(runtime);

    let report = h.orchestrator.initialize().await.unwrap();
    assert_eq!(report.network, ResourceStatus::AlreadyPresent);
    assert_eq!(report.cache, ResourceStatus::AlreadyPresent);
    assert_eq!(h.runtime.creation_count(), 0);
    assert_eq!(h.entries(OperationKind::Initialize)[0].outcome, Outcome::Success);
}

#[tokio::test]
async fn initialize_falls_back_to_dynamic_address() {
    let runtime = MemoryRuntime::new();
    runtime.reject_static_addresses();
    let h = harness(runtime);

    let report = h.orchestrator.initialize().await.unwrap();
    match &report.cache_attachment {
        AttachOutcome::Dynamic {
            requested, assigned, ..
        } => {
            assert_eq!(*requested, Ipv4Addr::new(192, 168, 1, 1));
            assert!(assigned.is_some());
        }
        other => panic!("expected dynamic attachment, got {other:?}"),
    }

    let entry = &h.entries(OperationKind::Initialize)[0];
    assert_eq!(entry.outcome, Outcome::Success);
    assert!(entry.detail.as_deref().unwrap().contains("192.168.1.1"));
}

#[tokio::test]
async fn initialize_network_failure_is_journaled() {
    let runtime = MemoryRuntime::new();
    runtime.fail_on(FailPoint::CreateNetwork);
    let h = harness(runtime);

    let err = h.orchestrator.initialize().await.unwrap_err();
    assert_eq!(err.step(), Some(Step::CreateNetwork));
    assert_eq!(h.runtime.container_count(), 0);
    let entry = &h.entries(OperationKind::Initialize)[0];
    assert_eq!(entry.outcome, Outcome::Failure);
    assert!(entry.detail.as_deref().unwrap().contains("create network"));
}

// ── Deploy ─────────────────────────────────────────────────────────

#[tokio::test]
async fn deploy_requires_network() {
    let h = harness(MemoryRuntime::new());
    let err = h
        .orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Precondition { .. }));
    assert!(err.to_string().contains("initialize"));
    assert!(
        !h.runtime
            .calls()
            .iter()
            .any(|c| matches!(c, RuntimeCall::RunContainer { .. }))
    );
    assert_no_success(&h, OperationKind::Deploy);
}

#[tokio::test]
async fn deploy_twice_leaves_one_container_with_the_tag() {
    let h = harness(initialized());

    h.orchestrator
        .deploy("coingecko", Some("3.2.0"), &NewestTag)
        .await
        .unwrap();
    let report = h
        .orchestrator
        .deploy("coingecko", Some("3.2.0"), &NewestTag)
        .await
        .unwrap();

    assert_eq!(report.replaced, 1);
    assert_eq!(h.runtime.container_count(), 1);
    let container = h.runtime.container("coingecko-redis").unwrap();
    assert_eq!(container.state, ContainerState::Running);
    assert_eq!(container.image, format!("{COINGECKO_REPO}:3.2.0"));
    assert!(h.runtime.calls().contains(&RuntimeCall::RemoveContainer {
        name: "coingecko-redis".into(),
        force: true,
    }));
}

#[tokio::test]
async fn deploy_replaces_stopped_container() {
    let runtime = initialized().with_container(
        "coingecko-redis",
        "old-image:0.1.0",
        ContainerState::Exited,
    );
    let h = harness(runtime);

    let report = h
        .orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap();
    assert_eq!(report.replaced, 1);
    assert_eq!(
        h.runtime.container("coingecko-redis").unwrap().image,
        format!("{COINGECKO_REPO}:3.2.1")
    );
}

#[tokio::test]
async fn deploy_without_tag_selects_newest() {
    let h = harness(initialized());
    let report = h
        .orchestrator
        .deploy("coingecko", None, &NewestTag)
        .await
        .unwrap();

    assert_eq!(report.tag, "3.2.1");
    assert_eq!(report.image, format!("{COINGECKO_REPO}:3.2.1"));
    let entry = &h.entries(OperationKind::Deploy)[0];
    assert_eq!(entry.outcome, Outcome::Success);
    assert_eq!(entry.subject.as_deref(), Some("coingecko"));
    assert_eq!(entry.detail.as_deref(), Some("Tag: 3.2.1"));
}

#[tokio::test]
async fn deploy_uses_custom_selector() {
    struct Oldest;
    #[async_trait]
    impl TagSelector for Oldest {
        async fn select(&self, _adapter: &str, tags: &[String]) -> LifecycleResult<String> {
            Ok(tags.last().cloned().unwrap_or_default())
        }
    }

    let h = harness(initialized());
    let report = h.orchestrator.deploy("tiingo", None, &Oldest).await.unwrap();
    assert_eq!(report.tag, "latest");
}

/// Deploys the same adapter from inside `select`; deadlocks if selection
/// ran under the adapter's lock.
struct Reentrant<'a> {
    orchestrator: &'a Orchestrator,
}

#[async_trait]
impl TagSelector for Reentrant<'_> {
    async fn select(&self, adapter: &str, tags: &[String]) -> LifecycleResult<String> {
        self.orchestrator
            .deploy(adapter, Some("3.2.0"), &NewestTag)
            .await?;
        Ok(tags[0].clone())
    }
}

#[tokio::test]
async fn tag_selection_runs_outside_the_adapter_lock() {
    let h = harness(initialized());
    let selector = Reentrant {
        orchestrator: &h.orchestrator,
    };

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        h.orchestrator.deploy("coingecko", None, &selector),
    )
    .await
    .expect("deploy blocked on its own lock")
    .unwrap();

    assert_eq!(report.tag, "3.2.1");
    assert_eq!(report.replaced, 1);
    assert_eq!(h.entries(OperationKind::Deploy).len(), 2);
    assert_eq!(
        h.runtime.container("coingecko-redis").unwrap().image,
        format!("{COINGECKO_REPO}:3.2.1")
    );
}

#[tokio::test]
async fn upgrade_selection_runs_outside_the_adapter_lock() {
    let runtime = initialized().with_container(
        "coingecko-redis",
        "old-image:0.1.0",
        ContainerState::Running,
    );
    let h = harness(runtime);
    let selector = Reentrant {
        orchestrator: &h.orchestrator,
    };

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        h.orchestrator.upgrade("coingecko", None, &selector),
    )
    .await
    .expect("upgrade blocked on its own lock")
    .unwrap();

    assert_eq!(report.previous_image, format!("{COINGECKO_REPO}:3.2.0"));
    assert_eq!(report.deploy.tag, "3.2.1");
}

#[tokio::test]
async fn deploy_with_no_tags_fails() {
    let h = harness_with(initialized(), StaticTagSource::new(), 1113);
    let err = h
        .orchestrator
        .deploy("coingecko", None, &NewestTag)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NoTags(_)));
    assert_eq!(h.runtime.container_count(), 0);
    assert_no_success(&h, OperationKind::Deploy);
}

#[tokio::test]
async fn deploy_unknown_adapter_is_config_error() {
    let h = harness(initialized());
    let err = h
        .orchestrator
        .deploy("nonexistent", Some("1.0.0"), &NewestTag)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Config(_)));
    assert_eq!(h.runtime.creation_count(), 0);
}

#[tokio::test]
async fn deploy_launch_spec_for_coingecko() {
    let h = harness(initialized());
    h.orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap();

    let spec = h.runtime.container_spec("coingecko-redis").unwrap();
    assert_eq!(spec.env["API_KEY"], "abc123");
    assert_eq!(spec.env["CACHE_KEY_GROUP"], "coingecko");
    assert_eq!(spec.env["RATE_LIMIT_API_PROVIDER"], "coingecko");
    assert_eq!(spec.env["METRICS_NAME"], "coingecko");
    assert_eq!(spec.env["EA_PORT"], "1113");
    assert!(!spec.env.contains_key("RATE_LIMIT_API_TIER"));
    assert_eq!(spec.ports[0].container_port, 1113);
    assert_eq!(spec.labels["prometheus-scrape.job_name"], "coingecko-redis");
    assert_eq!(
        h.runtime.attachments("coingecko-redis").get("eas-net"),
        Some(&Ipv4Addr::new(192, 168, 1, 113))
    );
}

#[tokio::test]
async fn deploy_empty_credential_is_omitted() {
    let h = harness(initialized());
    h.orchestrator
        .deploy("tiingo", Some("1.1.0"), &NewestTag)
        .await
        .unwrap();
    let spec = h.runtime.container_spec("tiingo-redis").unwrap();
    assert!(!spec.env.contains_key("API_KEY"));
}

#[tokio::test]
async fn deploy_static_address_conflict_falls_back() {
    let runtime = initialized().with_container("squatter", "img", ContainerState::Running);
    runtime
        .connect_network("eas-net", "squatter", Some(Ipv4Addr::new(192, 168, 1, 113)))
        .await
        .unwrap();
    let h = harness(runtime);

    let report = h
        .orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap();
    assert!(matches!(report.attachment, AttachOutcome::Dynamic { .. }));
    assert_eq!(
        h.runtime.container("coingecko-redis").unwrap().state,
        ContainerState::Running
    );

    let entry = &h.entries(OperationKind::Deploy)[0];
    assert_eq!(entry.outcome, Outcome::Success);
    let detail = entry.detail.as_deref().unwrap();
    assert!(detail.starts_with("Tag: 3.2.1, static IP 192.168.1.113 unavailable"));
}

#[tokio::test]
async fn deploy_keeps_container_when_attach_fails_entirely() {
    let runtime = initialized();
    runtime.fail_on(FailPoint::ConnectNetwork);
    let h = harness(runtime);

    let report = h
        .orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap();
    assert!(matches!(report.attachment, AttachOutcome::Detached { .. }));
    assert!(h.runtime.container("coingecko-redis").is_some());
    assert_eq!(h.entries(OperationKind::Deploy)[0].outcome, Outcome::Success);
}

#[tokio::test]
async fn deploy_run_failure_names_step() {
    let runtime = initialized();
    runtime.fail_on(FailPoint::RunContainer);
    let h = harness(runtime);

    let err = h
        .orchestrator
        .deploy("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(Step::RunContainer));

    let entry = &h.entries(OperationKind::Deploy)[0];
    assert_eq!(entry.outcome, Outcome::Failure);
    let detail = entry.detail.as_deref().unwrap();
    assert!(detail.starts_with("Tag: 3.2.1, run container failed for coingecko-redis"));
}

// ── Upgrade ────────────────────────────────────────────────────────

#[tokio::test]
async fn upgrade_missing_container_is_not_found() {
    let h = harness(initialized());
    let err = h
        .orchestrator
        .upgrade("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NotFound(ref name) if name == "coingecko-redis"));
    assert_eq!(h.runtime.creation_count(), 0);
    assert_eq!(h.entries(OperationKind::Upgrade).len(), 1);
    assert_no_success(&h, OperationKind::Upgrade);
    assert!(h.entries(OperationKind::Deploy).is_empty());
}

#[tokio::test]
async fn upgrade_replaces_image() {
    let h = harness(initialized());
    h.orchestrator
        .deploy("coingecko", Some("3.1.0"), &NewestTag)
        .await
        .unwrap();

    let report = h
        .orchestrator
        .upgrade("coingecko", None, &NewestTag)
        .await
        .unwrap();
    assert_eq!(report.previous_image, format!("{COINGECKO_REPO}:3.1.0"));
    assert_eq!(report.deploy.tag, "3.2.1");
    assert_eq!(h.runtime.container_count(), 1);
    assert_eq!(
        h.runtime.container("coingecko-redis").unwrap().image,
        format!("{COINGECKO_REPO}:3.2.1")
    );

    let calls = h.runtime.calls();
    let stop = calls
        .iter()
        .position(|c| *c == RuntimeCall::StopContainer("coingecko-redis".into()))
        .unwrap();
    let remove = calls
        .iter()
        .rposition(|c| {
            *c == RuntimeCall::RemoveContainer {
                name: "coingecko-redis".into(),
                force: false,
            }
        })
        .unwrap();
    assert!(stop < remove);

    let upgrades = h.entries(OperationKind::Upgrade);
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].detail.as_deref(), Some("Tag: 3.2.1"));
    assert_eq!(h.entries(OperationKind::Deploy).len(), 1);
}

#[tokio::test]
async fn upgrade_launch_failure_leaves_adapter_absent() {
    let h = harness(initialized());
    h.orchestrator
        .deploy("coingecko", Some("3.1.0"), &NewestTag)
        .await
        .unwrap();

    h.runtime.fail_on(FailPoint::RunContainer);
    let err = h
        .orchestrator
        .upgrade("coingecko", Some("3.2.1"), &NewestTag)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::UpgradeIncomplete { .. }));
    assert_eq!(err.step(), Some(Step::RunContainer));
    assert!(err.to_string().contains("now absent"));
    assert!(h.runtime.container("coingecko-redis").is_none());
    assert_no_success(&h, OperationKind::Upgrade);
}

#[tokio::test]
async fn upgrade_without_tags_keeps_old_container() {
    let runtime = initialized().with_container(
        "coingecko-redis",
        "old-image:0.1.0",
        ContainerState::Running,
    );
    let h = harness_with(runtime, StaticTagSource::new(), 1113);

    let err = h
        .orchestrator
        .upgrade("coingecko", None, &NewestTag)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NoTags(_)));
    assert_eq!(
        h.runtime.container("coingecko-redis").unwrap().state,
        ContainerState::Running
    );
}

// ── Test ───────────────────────────────────────────────────────────

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_unreachable_is_journaled_with_pair() {
    let port = closed_port().await;
    let h = harness_with(initialized(), default_tags(), port);

    let err = h
        .orchestrator
        .test("127.0.0.1", "ETH", "USD")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Probe(ea_probe::ProbeError::Unreachable { .. })
    ));

    let entries = h.entries(OperationKind::Test);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, Outcome::Failure);
    assert_eq!(entries[0].subject.as_deref(), Some("127.0.0.1"));
    assert_eq!(entries[0].detail.as_deref(), Some("FROM: ETH, TO: USD"));
}

#[tokio::test]
async fn test_success_records_result() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.ends_with(b"}}") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let body = r#"{"result":"67000.12"}"#;
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
    });

    let h = harness_with(initialized(), default_tags(), port);
    let report = h.orchestrator.test("127.0.0.1", "BTC", "USD").await.unwrap();
    assert_eq!(report.result, "67000.12");
    assert_eq!(report.port, port);

    let entry = &h.entries(OperationKind::Test)[0];
    assert_eq!(entry.outcome, Outcome::Success);
    assert_eq!(
        entry.detail.as_deref(),
        Some("FROM: BTC, TO: USD, Result: 67000.12")
    );
}

#[tokio::test]
async fn probe_port_follows_adapter_config() {
    let h = harness(initialized());
    assert_eq!(h.orchestrator.probe_port("tiingo-redis"), 1120);
    assert_eq!(h.orchestrator.probe_port("unknown-redis"), 1113);
    assert_eq!(h.orchestrator.probe_port("some-host"), 1113);
}

// ── Queries ────────────────────────────────────────────────────────

#[tokio::test]
async fn fleet_is_sorted_with_container_state() {
    let h = harness(initialized());
    h.orchestrator
        .deploy("tiingo", Some("1.1.0"), &NewestTag)
        .await
        .unwrap();

    let fleet = h.orchestrator.fleet().await.unwrap();
    let names: Vec<&str> = fleet.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["coingecko", "tiingo"]);
    assert!(fleet[0].container.is_none());
    assert_eq!(
        fleet[1].container.as_ref().unwrap().state,
        ContainerState::Running
    );
}

#[tokio::test]
async fn available_tags_are_newest_first() {
    let h = harness(initialized());
    let tags = h.orchestrator.available_tags("tiingo").await.unwrap();
    assert_eq!(tags, vec!["1.1.0", "1.0.0", "latest"]);
}
