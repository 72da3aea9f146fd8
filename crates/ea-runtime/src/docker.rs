//! Docker CLI backend.
//!
//! Every action is one `docker` invocation. Argument vectors are built by
//! plain functions so they can be checked without a daemon; stderr text is
//! classified into the benign races the trait contract tolerates.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{RuntimeError, RuntimeResult};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerSpec, ContainerState, ContainerSummary, NetworkCreate, NetworkSpec};

/// Drives a docker daemon through the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

struct CommandOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn exec(&self, args: &[String]) -> RuntimeResult<CommandOutput> {
        self.exec_with_env(args, &BTreeMap::new()).await
    }

    /// `env` is set on the child process only; the argv names the keys and
    /// never carries their values.
    async fn exec_with_env(
        &self,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> RuntimeResult<CommandOutput> {
        debug!(program = %self.program, ?args, "docker");
        let output = Command::new(&self.program)
            .args(args)
            .envs(env)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn failed(&self, args: &[String], out: CommandOutput) -> RuntimeError {
        RuntimeError::CommandFailed {
            command: format!("{} {}", self.program, args.join(" ")),
            code: out.code,
            stderr: out.stderr,
        }
    }
}

fn exact_name_filter(name: &str) -> String {
    format!("name=^{name}$")
}

pub fn network_ls_args(name: &str) -> Vec<String> {
    vec![
        "network".into(),
        "ls".into(),
        "--filter".into(),
        exact_name_filter(name),
        "--format".into(),
        "{{.Name}}".into(),
    ]
}

pub fn network_create_args(spec: &NetworkSpec) -> Vec<String> {
    vec![
        "network".into(),
        "create".into(),
        "--driver".into(),
        spec.driver.clone(),
        "--subnet".into(),
        spec.subnet.clone(),
        "--gateway".into(),
        spec.gateway.to_string(),
        spec.name.clone(),
    ]
}

pub fn ps_args(name: &str) -> Vec<String> {
    vec![
        "ps".into(),
        "--all".into(),
        "--no-trunc".into(),
        "--filter".into(),
        exact_name_filter(name),
        "--format".into(),
        "{{json .}}".into(),
    ]
}

pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "run".into(),
        "--detach".into(),
        "--name".into(),
        spec.name.clone(),
        "--restart".into(),
        spec.restart.as_str().into(),
    ];
    for port in &spec.ports {
        args.push("--publish".into());
        args.push(format!("{}:{}/tcp", port.host_port, port.container_port));
    }
    for volume in &spec.volumes {
        let mode = if volume.read_only { "ro" } else { "rw" };
        args.push("--volume".into());
        args.push(format!(
            "{}:{}:{mode}",
            volume.host_path.display(),
            volume.container_path
        ));
    }
    // Values are inherited from the docker client's environment.
    for key in spec.env.keys() {
        args.push("--env".into());
        args.push(key.clone());
    }
    for (key, value) in &spec.labels {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

pub fn connect_args(network: &str, container: &str, address: Option<Ipv4Addr>) -> Vec<String> {
    let mut args: Vec<String> = vec!["network".into(), "connect".into()];
    if let Some(ip) = address {
        args.push("--ip".into());
        args.push(ip.to_string());
    }
    args.push(network.into());
    args.push(container.into());
    args
}

pub fn inspect_networks_args(container: &str) -> Vec<String> {
    vec![
        "inspect".into(),
        "--type".into(),
        "container".into(),
        "--format".into(),
        "{{json .NetworkSettings.Networks}}".into(),
        container.into(),
    ]
}

#[derive(Debug, Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Image")]
    image: String,
    #[serde(rename = "State")]
    state: ContainerState,
}

/// Parse `docker ps --format '{{json .}}'` output, keeping only rows whose
/// name is exactly `name` (the filter is a regex on the daemon side and
/// older daemons ignore anchors).
pub fn parse_ps(output: &str, name: &str) -> RuntimeResult<Vec<ContainerSummary>> {
    let mut containers = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let row: PsRow =
            serde_json::from_str(line).map_err(|e| RuntimeError::Decode(e.to_string()))?;
        if row.names.split(',').any(|n| n == name) {
            containers.push(ContainerSummary {
                id: row.id,
                name: name.to_string(),
                image: row.image,
                state: row.state,
            });
        }
    }
    Ok(containers)
}

#[derive(Debug, Deserialize)]
struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: String,
}

/// Parse the per-network endpoint map from `docker inspect`.
pub fn parse_network_address(output: &str, network: &str) -> RuntimeResult<Option<Ipv4Addr>> {
    let trimmed = output.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    let networks: BTreeMap<String, EndpointSettings> =
        serde_json::from_str(trimmed).map_err(|e| RuntimeError::Decode(e.to_string()))?;
    let Some(endpoint) = networks.get(network) else {
        return Ok(None);
    };
    if endpoint.ip_address.is_empty() {
        return Ok(None);
    }
    endpoint
        .ip_address
        .parse()
        .map(Some)
        .map_err(|_| RuntimeError::Decode(format!("bad address {:?}", endpoint.ip_address)))
}

fn is_missing(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("no such container") || lower.contains("no such object")
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn network_exists(&self, name: &str) -> RuntimeResult<bool> {
        let args = network_ls_args(name);
        let out = self.exec(&args).await?;
        if !out.success {
            return Err(self.failed(&args, out));
        }
        Ok(out.stdout.lines().any(|l| l.trim() == name))
    }

    async fn create_network(&self, spec: &NetworkSpec) -> RuntimeResult<NetworkCreate> {
        let args = network_create_args(spec);
        let out = self.exec(&args).await?;
        if out.success {
            return Ok(NetworkCreate::Created);
        }
        if out.stderr.contains("already exists") {
            debug!(network = %spec.name, "network created concurrently");
            return Ok(NetworkCreate::AlreadyExists);
        }
        Err(self.failed(&args, out))
    }

    async fn list_containers(&self, name: &str) -> RuntimeResult<Vec<ContainerSummary>> {
        let args = ps_args(name);
        let out = self.exec(&args).await?;
        if !out.success {
            return Err(self.failed(&args, out));
        }
        parse_ps(&out.stdout, name)
    }

    async fn run_container(&self, spec: &ContainerSpec) -> RuntimeResult<String> {
        let args = run_args(spec);
        let out = self.exec_with_env(&args, &spec.env).await?;
        if out.success {
            return Ok(out.stdout.trim().to_string());
        }
        if out.stderr.contains("is already in use") {
            return Err(RuntimeError::Conflict(spec.name.clone()));
        }
        Err(self.failed(&args, out))
    }

    async fn stop_container(&self, name: &str) -> RuntimeResult<()> {
        let args: Vec<String> = vec!["stop".into(), name.into()];
        let out = self.exec(&args).await?;
        if out.success {
            return Ok(());
        }
        if is_missing(&out.stderr) {
            return Err(RuntimeError::NoSuchContainer(name.to_string()));
        }
        Err(self.failed(&args, out))
    }

    async fn remove_container(&self, name: &str, force: bool) -> RuntimeResult<()> {
        let mut args: Vec<String> = vec!["rm".into()];
        if force {
            args.push("--force".into());
        }
        args.push(name.into());
        let out = self.exec(&args).await?;
        if out.success || is_missing(&out.stderr) {
            return Ok(());
        }
        Err(self.failed(&args, out))
    }

    async fn connect_network(
        &self,
        network: &str,
        container: &str,
        address: Option<Ipv4Addr>,
    ) -> RuntimeResult<()> {
        let args = connect_args(network, container, address);
        let out = self.exec(&args).await?;
        if out.success {
            return Ok(());
        }
        if out.stderr.contains("already exists in network") {
            warn!(%container, %network, "container already attached");
            return Ok(());
        }
        if out.stderr.to_ascii_lowercase().contains("no such network") {
            return Err(RuntimeError::NoSuchNetwork(network.to_string()));
        }
        if is_missing(&out.stderr) {
            return Err(RuntimeError::NoSuchContainer(container.to_string()));
        }
        if let Some(ip) = address {
            return Err(RuntimeError::AddressUnavailable {
                network: network.to_string(),
                address: ip.to_string(),
                reason: out.stderr,
            });
        }
        Err(self.failed(&args, out))
    }

    async fn container_address(
        &self,
        container: &str,
        network: &str,
    ) -> RuntimeResult<Option<Ipv4Addr>> {
        let args = inspect_networks_args(container);
        let out = self.exec(&args).await?;
        if !out.success {
            if is_missing(&out.stderr) {
                return Ok(None);
            }
            return Err(self.failed(&args, out));
        }
        parse_network_address(&out.stdout, network)
    }
}
