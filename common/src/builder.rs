use std::str::FromStr;

use serde_yaml::Mapping;
use tracing::{debug, info};

use crate::{
    config::ClusterSpec,
    error::{ConfigError, Result},
    playbook::*,
    services::{Kafka, ServiceConfig, Topology, ZooKeeper, KAFKA_IMAGE, ZOOKEEPER_IMAGE},
};

const DOCKER_GPG_KEY: &str = "https://download.docker.com/linux/ubuntu/gpg";
const DOCKER_REPO: &str = "deb https://download.docker.com/linux/ubuntu bionic stable";
const DOCKER_DEPENDENCIES: &[&str] = &[
    "apt-transport-https",
    "ca-certificates",
    "gnupg-agent",
    "software-properties-common",
    "python3-pip",
];
const DOCKER_PACKAGES: &[&str] = &["docker-ce", "docker-ce-cli", "containerd.io"];
const COMPOSE_URL: &str =
    "https://github.com/docker/compose/releases/download/1.25.5/docker-compose-Linux-x86_64";
const COMPOSE_BIN: &str = "/usr/local/bin/docker-compose";
const COMPOSE_LINK: &str = "/usr/bin/docker-compose";
const PYTHON_MODULES: &[&str] = &["docker", "docker-compose"];
const DATA_FSTYPE: &str = "ext4";
const COMPOSE_VERSION: &str = "2";

/// An attached data disk, parsed from `<device>:<mount point>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskMount {
    pub device: String,
    pub mount_point: String,
}

impl DiskMount {
    /// The single partition created on the device.
    pub fn partition(&self) -> String {
        format!("{}1", self.device)
    }

    /// Directory under the mount point holding one service's data.
    pub fn data_dir(&self, service: &str) -> String {
        format!("{}/{service}", self.mount_point.trim_end_matches('/'))
    }
}

impl FromStr for DiskMount {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split(':').collect::<Vec<&str>>()[..] {
            [device, mount_point] if device.starts_with('/') && mount_point.starts_with('/') => {
                Ok(DiskMount {
                    device: device.to_owned(),
                    mount_point: mount_point.to_owned(),
                })
            }
            _ => Err(ConfigError::MalformedMount(s.to_owned())),
        }
    }
}

/// Where a service keeps its data on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeSource<'a> {
    /// Managed by docker, needs a top level `volumes` declaration
    Named(&'a str),
    /// Bind mounted host directory
    HostPath(&'a str),
}

impl<'a> VolumeSource<'a> {
    pub fn parse(identifier: &'a str) -> Self {
        if identifier.starts_with('/') {
            VolumeSource::HostPath(identifier)
        } else {
            VolumeSource::Named(identifier)
        }
    }
}

/// Words YAML 1.1 parsers (PyYAML, hence Ansible) load as booleans.
const YAML11_BOOLS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "true", "True", "TRUE", "false",
    "False", "FALSE", "on", "On", "ON", "off", "Off", "OFF",
];

/// Rejects values that are emitted as a bare scalar and would lose their
/// string type downstream.
fn check_scalar(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if YAML11_BOOLS.contains(&value) {
        return Err(ConfigError::AmbiguousValue {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

/// Builds the full playbook for `spec`. Pure: nothing is read or written.
pub fn build(spec: &ClusterSpec) -> Result<ProvisioningDocument> {
    if spec.private_ip.is_empty() {
        return Err(ConfigError::EmptyHostList.into());
    }

    let public_ip = if spec.public_ip.is_empty() {
        &spec.private_ip
    } else if spec.public_ip.len() == spec.private_ip.len() {
        &spec.public_ip
    } else {
        return Err(ConfigError::AddressCountMismatch {
            public: spec.public_ip.len(),
            private: spec.private_ip.len(),
        }
        .into());
    };

    let mount = spec
        .mount
        .as_deref()
        .map(DiskMount::from_str)
        .transpose()?;

    let (zookeeper_volume, kafka_volume) = match &mount {
        Some(m) => (m.data_dir(ZooKeeper.name()), m.data_dir(Kafka.name())),
        None => (spec.zookeeper_volume.clone(), spec.kafka_volume.clone()),
    };
    if zookeeper_volume.is_empty() {
        return Err(ConfigError::EmptyVolume("zookeeper").into());
    }
    if kafka_volume.is_empty() {
        return Err(ConfigError::EmptyVolume("kafka").into());
    }
    check_scalar("user", &spec.credentials.user)?;
    check_scalar("project name", &spec.tunables.project_name)?;
    check_scalar("zookeeper volume", &zookeeper_volume)?;
    check_scalar("kafka volume", &kafka_volume)?;

    let mut plays = vec![Play::new(ALL_HOSTS, all_hosts_tasks(spec))];
    if let Some(mount) = &mount {
        info!("preparing data disk {} at {}", mount.device, mount.mount_point);
        plays.push(Play::new(ALL_HOSTS, disk_tasks(mount)));
    }

    let topology = Topology {
        private_ip: &spec.private_ip,
        public_ip,
        tunables: &spec.tunables,
    };
    let volumes = volume_declarations(&[zookeeper_volume.as_str(), kafka_volume.as_str()]);
    for index in 0..spec.private_ip.len() {
        debug!(
            "host {} ({}): {} and {}",
            host_group(index),
            spec.private_ip[index],
            ZooKeeper.name(),
            Kafka.name()
        );
        let compose = DockerCompose {
            project_name: spec.tunables.project_name.clone(),
            definition: Composition {
                version: COMPOSE_VERSION.to_owned(),
                services: Services {
                    zookeeper: ZooKeeper.definition(&zookeeper_volume, &topology, index),
                    kafka: Kafka.definition(&kafka_volume, &topology, index),
                },
                volumes: volumes.clone(),
            },
        };
        plays.push(Play::new(
            host_group(index),
            vec![Task::new(
                "Run ZooKeeper and Kafka",
                Action::DockerCompose(compose),
            )],
        ));
    }

    info!("built playbook with {} plays", plays.len());
    Ok(ProvisioningDocument::new(plays, public_ip.clone()))
}

fn volume_declarations(identifiers: &[&str]) -> Option<Mapping> {
    let mut volumes = Mapping::new();
    for id in identifiers {
        if let VolumeSource::Named(name) = VolumeSource::parse(id) {
            let mut driver = Mapping::new();
            driver.insert("driver".into(), "local".into());
            volumes.insert(name.into(), driver.into());
        }
    }
    (!volumes.is_empty()).then_some(volumes)
}

fn all_hosts_tasks(spec: &ClusterSpec) -> Vec<Task> {
    let user = &spec.credentials.user;
    let mut tasks = vec![
        Task::new(
            "Install aptitude using apt",
            Action::Apt(Apt {
                name: "aptitude".into(),
                state: "latest".to_owned(),
                update_cache: Some(true),
                force_apt_get: Some(true),
            }),
        ),
        Task::new(
            "Install Docker's dependencies",
            Action::Apt(Apt {
                name: DOCKER_DEPENDENCIES.into(),
                state: "present".to_owned(),
                update_cache: Some(true),
                force_apt_get: None,
            }),
        ),
        Task::new(
            "Add Docker's official GPG key",
            Action::AptKey(AptKey {
                url: DOCKER_GPG_KEY.to_owned(),
                state: "present".to_owned(),
            }),
        ),
        Task::new(
            "Add Docker repository",
            Action::AptRepository(AptRepository {
                repo: DOCKER_REPO.to_owned(),
                state: "present".to_owned(),
            }),
        ),
        Task::new(
            "Install Docker",
            Action::Apt(Apt {
                name: DOCKER_PACKAGES.into(),
                state: "present".to_owned(),
                update_cache: Some(true),
                force_apt_get: None,
            }),
        ),
        Task::new(
            format!("Add user \"{user}\" into \"docker\" group"),
            Action::User(User {
                name: user.clone(),
                groups: "docker".to_owned(),
                append: true,
            }),
        ),
        Task::new(
            "Install Docker Compose",
            Action::GetUrl(GetUrl {
                url: COMPOSE_URL.to_owned(),
                dest: COMPOSE_BIN.to_owned(),
                mode: "0755".to_owned(),
            }),
        ),
        Task::new(
            "Create symbolic link for Docker Compose",
            Action::File(File::link(COMPOSE_BIN, COMPOSE_LINK)),
        ),
        Task::new(
            "Upgrade pip",
            Action::Shell("python3 -m pip install -U pip".to_owned()),
        ),
        Task::new(
            "Install Python modules",
            Action::Pip(Pip {
                name: PYTHON_MODULES.into(),
                state: "latest".to_owned(),
            }),
        ),
    ];

    if spec.tunables.pull_images {
        for (name, image) in [("ZooKeeper", ZOOKEEPER_IMAGE), ("Kafka", KAFKA_IMAGE)] {
            tasks.push(Task::new(
                format!("Pull {name} Docker image"),
                Action::DockerImage(DockerImage {
                    name: image.to_owned(),
                    source: "pull".to_owned(),
                }),
            ));
        }
    }
    tasks
}

fn disk_tasks(mount: &DiskMount) -> Vec<Task> {
    vec![
        Task::new(
            "Install partition tool \"parted\"",
            Action::Apt(Apt {
                name: "parted".into(),
                state: "present".to_owned(),
                update_cache: None,
                force_apt_get: None,
            }),
        ),
        Task::new(
            "Create partition for data disk",
            Action::Parted(Parted {
                device: mount.device.clone(),
                number: 1,
                state: "present".to_owned(),
            }),
        ),
        Task::new(
            "Format data disk",
            Action::Filesystem(Filesystem {
                device: mount.partition(),
                force: true,
                fstype: DATA_FSTYPE.to_owned(),
            }),
        ),
        Task::new(
            "Create a mount point for data disk",
            Action::File(File::directory(&mount.mount_point)),
        ),
        Task::new(
            "Mount data disk",
            Action::Mount(Mount {
                path: mount.mount_point.clone(),
                src: mount.partition(),
                fstype: DATA_FSTYPE.to_owned(),
                state: "mounted".to_owned(),
            }),
        ),
        Task::new(
            "Create data directory for ZooKeeper",
            Action::File(File::directory(mount.data_dir(ZooKeeper.name()))),
        ),
        Task::new(
            "Create data directory for Kafka",
            Action::File(File::directory(mount.data_dir(Kafka.name()))),
        ),
    ]
}
