//! In-memory model of the generated Ansible playbook.
//!
//! Field declaration order is serialization order, so the structs below fix
//! the key order of `deploy.yml`.

use serde::Serialize;
use serde_yaml::Mapping;

/// The whole generated playbook plus the addresses listed in the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningDocument {
    plays: Vec<Play>,
    inventory: Vec<String>,
}

impl ProvisioningDocument {
    pub fn new(plays: Vec<Play>, inventory: Vec<String>) -> Self {
        Self { plays, inventory }
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    /// Host addresses in inventory order, one `server<n>` group each.
    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    /// Per-host plays, in inventory order.
    pub fn host_plays(&self) -> impl Iterator<Item = &Play> {
        self.plays.iter().filter(|p| p.hosts != ALL_HOSTS)
    }
}

pub const ALL_HOSTS: &str = "all";

pub fn host_group(index: usize) -> String {
    format!("server{}", index + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Play {
    pub hosts: String,
    #[serde(rename = "become")]
    pub escalate: bool,
    pub tasks: Vec<Task>,
}

impl Play {
    pub fn new(hosts: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            hosts: hosts.into(),
            escalate: true,
            tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub name: String,
    #[serde(flatten)]
    pub action: Action,
}

impl Task {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

/// One Ansible module invocation. Serializes as `<module>: <args>` next to the
/// task name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Apt(Apt),
    AptKey(AptKey),
    AptRepository(AptRepository),
    User(User),
    GetUrl(GetUrl),
    File(File),
    Shell(String),
    Pip(Pip),
    DockerImage(DockerImage),
    Parted(Parted),
    Filesystem(Filesystem),
    Mount(Mount),
    DockerCompose(DockerCompose),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Packages {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Packages {
    fn from(name: &str) -> Self {
        Packages::One(name.to_owned())
    }
}

impl From<&[&str]> for Packages {
    fn from(names: &[&str]) -> Self {
        Packages::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Apt {
    pub name: Packages,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_apt_get: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AptKey {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AptRepository {
    pub repo: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub groups: String,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetUrl {
    pub url: String,
    pub dest: String,
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct File {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    pub state: String,
}

impl File {
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            state: "directory".to_owned(),
            ..Default::default()
        }
    }

    pub fn link(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            dest: Some(dest.into()),
            state: "link".to_owned(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pip {
    pub name: Packages,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerImage {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parted {
    pub device: String,
    pub number: u32,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filesystem {
    pub device: String,
    pub force: bool,
    pub fstype: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mount {
    pub path: String,
    pub src: String,
    pub fstype: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockerCompose {
    pub project_name: String,
    pub definition: Composition,
}

/// A docker-compose (v2 file format) definition for one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub version: String,
    pub services: Services,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Mapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Services {
    pub zookeeper: ServiceDefinition,
    pub kafka: ServiceDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDefinition {
    pub image: String,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub environment: Mapping,
    pub restart: String,
}
