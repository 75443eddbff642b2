use serde_yaml::Mapping;

use crate::{config::Tunables, playbook::ServiceDefinition};

pub const ZOOKEEPER_IMAGE: &str = "nexgus/zookeeper:3.6.1";
pub const KAFKA_IMAGE: &str = "nexgus/kafka:2.12-2.4.1";

pub const ZOOKEEPER_CLIENT_PORT: u16 = 2181;
pub const ZOOKEEPER_PEER_PORT: u16 = 2888;
pub const ZOOKEEPER_ELECTION_PORT: u16 = 3888;
pub const KAFKA_INTERNET_PORT: u16 = 9092;
pub const KAFKA_INTRANET_PORT: u16 = 9094;

const RESTART_POLICY: &str = "unless-stopped";

/// Addresses and tunables shared by every host of the cluster. Built by the
/// builder once the address lists have been validated.
#[derive(Debug, Clone)]
pub struct Topology<'a> {
    pub private_ip: &'a [String],
    pub public_ip: &'a [String],
    pub tunables: &'a Tunables,
}

impl Topology<'_> {
    /// `host:2181,...` over every private address, with the chroot appended.
    pub fn zookeeper_connect(&self) -> String {
        let hosts = self
            .private_ip
            .iter()
            .map(|ip| format!("{ip}:{ZOOKEEPER_CLIENT_PORT}"))
            .collect::<Vec<String>>()
            .join(",");

        match &self.tunables.zookeeper_chroot {
            Some(chroot) => format!("{hosts}/{chroot}"),
            None => hosts,
        }
    }
}

/// One of the two containers run on every host.
pub trait ServiceConfig {
    /// Service key in the compose file
    fn name(&self) -> &'static str;
    fn image(&self) -> &'static str;
    fn ports(&self) -> Vec<u16>;
    /// Where the container keeps its persistent data
    fn data_dir(&self) -> &'static str;
    /// Ordered environment for the host at `index`
    fn environment(&self, topology: &Topology, index: usize) -> Mapping;

    fn definition(&self, volume: &str, topology: &Topology, index: usize) -> ServiceDefinition {
        ServiceDefinition {
            image: self.image().to_owned(),
            ports: self.ports().iter().map(|p| format!("{p}:{p}")).collect(),
            volumes: vec![format!("{volume}:{}", self.data_dir())],
            environment: self.environment(topology, index),
            restart: RESTART_POLICY.to_owned(),
        }
    }
}

pub struct ZooKeeper;

impl ServiceConfig for ZooKeeper {
    fn name(&self) -> &'static str {
        "zookeeper"
    }

    fn image(&self) -> &'static str {
        ZOOKEEPER_IMAGE
    }

    fn ports(&self) -> Vec<u16> {
        vec![
            ZOOKEEPER_CLIENT_PORT,
            ZOOKEEPER_PEER_PORT,
            ZOOKEEPER_ELECTION_PORT,
        ]
    }

    fn data_dir(&self) -> &'static str {
        "/var/lib/zookeeper"
    }

    fn environment(&self, topology: &Topology, index: usize) -> Mapping {
        let mut env = Mapping::new();
        // 1-based, unlike the Kafka broker id
        env.insert("ZK_ID".into(), (index + 1).to_string().into());
        env.insert("ZK_dataDir".into(), self.data_dir().into());
        for (peer, ip) in topology.private_ip.iter().enumerate() {
            env.insert(
                format!("ZK_server_{}", peer + 1).into(),
                format!("{ip}:{ZOOKEEPER_PEER_PORT}:{ZOOKEEPER_ELECTION_PORT}").into(),
            );
        }
        env
    }
}

pub struct Kafka;

impl ServiceConfig for Kafka {
    fn name(&self) -> &'static str {
        "kafka"
    }

    fn image(&self) -> &'static str {
        KAFKA_IMAGE
    }

    fn ports(&self) -> Vec<u16> {
        vec![KAFKA_INTERNET_PORT, KAFKA_INTRANET_PORT]
    }

    fn data_dir(&self) -> &'static str {
        "/var/lib/kafka"
    }

    fn environment(&self, topology: &Topology, index: usize) -> Mapping {
        let tunables = topology.tunables;
        let mut env = Mapping::new();
        env.insert("KK_BROKER_ID".into(), index.to_string().into());
        env.insert("KK_LOG_DIR".into(), self.data_dir().into());
        env.insert(
            "KK_LISTENERS".into(),
            format!(
                "INTRANET://0.0.0.0:{KAFKA_INTRANET_PORT},INTERNET://0.0.0.0:{KAFKA_INTERNET_PORT}"
            )
            .into(),
        );
        env.insert(
            "KK_ADVERTISED_LISTENERS".into(),
            format!(
                "INTRANET://{}:{KAFKA_INTRANET_PORT},INTERNET://{}:{KAFKA_INTERNET_PORT}",
                topology.private_ip[index], topology.public_ip[index]
            )
            .into(),
        );
        env.insert(
            "KK_LISTENER_SECURITY_PROTOCOL_MAP".into(),
            "INTRANET:PLAINTEXT,INTERNET:PLAINTEXT".into(),
        );
        env.insert("KK_INTER_BROKER_LISTENER_NAME".into(), "INTRANET".into());
        env.insert(
            "KK_ZOOKEEPER_CONNECT".into(),
            topology.zookeeper_connect().into(),
        );
        if let Some(hours) = tunables.log_roll_hours {
            env.insert("KK_LOG_ROLL_HOURS".into(), hours.to_string().into());
        }
        if let Some(hours) = tunables.log_retention_hours {
            env.insert("KK_LOG_RETENTION_HOURS".into(), hours.to_string().into());
        }
        if let Some(ms) = tunables.zookeeper_connection_timeout_ms {
            env.insert(
                "KK_ZOOKEEPER_CONNECTION_TIMEOUT_MS".into(),
                ms.to_string().into(),
            );
        }
        env
    }
}
