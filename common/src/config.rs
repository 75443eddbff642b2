use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ConfigError;

pub const DEFAULT_PRIVATE_IP: &str = "localhost";
pub const DEFAULT_KEY: &str = "~/.ssh/id_rsa";
pub const DEFAULT_WORKDIR: &str = "./playbook";
pub const DEFAULT_ZOOKEEPER_VOLUME: &str = "zookeeper";
pub const DEFAULT_KAFKA_VOLUME: &str = "kafka";
pub const DEFAULT_PROJECT_NAME: &str = "nexcom";
pub const DEFAULT_LOG_ROLL_HOURS: u32 = 7 * 24;
pub const DEFAULT_ZOOKEEPER_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Configuration file layout. Every key is optional; anything left out falls
/// back to the command line or to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cluster: ClusterArgs,
    pub kafka: KafkaArgs,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterArgs {
    pub private_ip: Option<Vec<String>>,
    pub public_ip: Option<Vec<String>>,
    pub user: Option<String>,
    pub key: Option<String>,
    pub zookeeper_volume: Option<String>,
    pub kafka_volume: Option<String>,
    pub mount: Option<String>,
    pub workdir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KafkaArgs {
    pub project_name: Option<String>,
    pub log_retention_hours: Option<u32>,
    pub log_roll_hours: Option<u32>,
    pub zookeeper_chroot: Option<String>,
    pub zookeeper_connection_timeout_ms: Option<u64>,
    pub pull_images: Option<bool>,
}

/// SSH identity written into the inventory for every host.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub private_key: PathBuf,
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.private_key.is_file() {
            return Err(ConfigError::MissingCredential(self.private_key.clone()));
        }
        Ok(())
    }
}

/// Service tunables. The defaults reproduce what the generated cluster has
/// always been deployed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Tunables {
    pub project_name: String,
    pub log_retention_hours: Option<u32>,
    pub log_roll_hours: Option<u32>,
    /// Stored without a leading `/`.
    pub zookeeper_chroot: Option<String>,
    pub zookeeper_connection_timeout_ms: Option<u64>,
    pub pull_images: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_owned(),
            log_retention_hours: None,
            log_roll_hours: Some(DEFAULT_LOG_ROLL_HOURS),
            zookeeper_chroot: None,
            zookeeper_connection_timeout_ms: Some(DEFAULT_ZOOKEEPER_TIMEOUT_MS),
            pull_images: false,
        }
    }
}

/// Everything the playbook builder needs to know about the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    pub private_ip: Vec<String>,
    /// Empty means "same as `private_ip`".
    pub public_ip: Vec<String>,
    pub credentials: Credentials,
    pub zookeeper_volume: String,
    pub kafka_volume: String,
    pub mount: Option<String>,
    pub tunables: Tunables,
}

impl ClusterSpec {
    /// A spec with default volumes and tunables for the given hosts.
    pub fn new(private_ip: Vec<String>, credentials: Credentials) -> Self {
        Self {
            private_ip,
            public_ip: Vec::new(),
            credentials,
            zookeeper_volume: DEFAULT_ZOOKEEPER_VOLUME.to_owned(),
            kafka_volume: DEFAULT_KAFKA_VOLUME.to_owned(),
            mount: None,
            tunables: Tunables::default(),
        }
    }
}

impl Config {
    /// Layers `other` on top of `self`: any value set in `other` wins.
    pub fn merge(self, other: Config) -> Config {
        Config {
            cluster: ClusterArgs {
                private_ip: other.cluster.private_ip.or(self.cluster.private_ip),
                public_ip: other.cluster.public_ip.or(self.cluster.public_ip),
                user: other.cluster.user.or(self.cluster.user),
                key: other.cluster.key.or(self.cluster.key),
                zookeeper_volume: other
                    .cluster
                    .zookeeper_volume
                    .or(self.cluster.zookeeper_volume),
                kafka_volume: other.cluster.kafka_volume.or(self.cluster.kafka_volume),
                mount: other.cluster.mount.or(self.cluster.mount),
                workdir: other.cluster.workdir.or(self.cluster.workdir),
            },
            kafka: KafkaArgs {
                project_name: other.kafka.project_name.or(self.kafka.project_name),
                log_retention_hours: other
                    .kafka
                    .log_retention_hours
                    .or(self.kafka.log_retention_hours),
                log_roll_hours: other.kafka.log_roll_hours.or(self.kafka.log_roll_hours),
                zookeeper_chroot: other
                    .kafka
                    .zookeeper_chroot
                    .or(self.kafka.zookeeper_chroot),
                zookeeper_connection_timeout_ms: other
                    .kafka
                    .zookeeper_connection_timeout_ms
                    .or(self.kafka.zookeeper_connection_timeout_ms),
                pull_images: other.kafka.pull_images.or(self.kafka.pull_images),
            },
        }
    }

    pub fn workdir(&self) -> PathBuf {
        PathBuf::from(
            self.cluster
                .workdir
                .as_deref()
                .unwrap_or(DEFAULT_WORKDIR),
        )
    }

    /// Fills in defaults. Address counts and the mount descriptor are checked
    /// later by the builder.
    pub fn into_spec(self) -> Result<ClusterSpec, ConfigError> {
        let user = match self.cluster.user {
            Some(user) => user,
            None => std::env::var("USER").map_err(|_| ConfigError::MissingUser)?,
        };
        let private_key = expand_home(self.cluster.key.as_deref().unwrap_or(DEFAULT_KEY));

        let defaults = Tunables::default();
        let tunables = Tunables {
            project_name: self.kafka.project_name.unwrap_or(defaults.project_name),
            log_retention_hours: self.kafka.log_retention_hours,
            log_roll_hours: self.kafka.log_roll_hours.or(defaults.log_roll_hours),
            zookeeper_chroot: self
                .kafka
                .zookeeper_chroot
                .as_deref()
                .and_then(normalize_chroot),
            zookeeper_connection_timeout_ms: self
                .kafka
                .zookeeper_connection_timeout_ms
                .or(defaults.zookeeper_connection_timeout_ms),
            pull_images: self.kafka.pull_images.unwrap_or(defaults.pull_images),
        };

        Ok(ClusterSpec {
            private_ip: self
                .cluster
                .private_ip
                .unwrap_or_else(|| vec![DEFAULT_PRIVATE_IP.to_owned()]),
            public_ip: self.cluster.public_ip.unwrap_or_default(),
            credentials: Credentials { user, private_key },
            zookeeper_volume: self
                .cluster
                .zookeeper_volume
                .unwrap_or_else(|| DEFAULT_ZOOKEEPER_VOLUME.to_owned()),
            kafka_volume: self
                .cluster
                .kafka_volume
                .unwrap_or_else(|| DEFAULT_KAFKA_VOLUME.to_owned()),
            mount: self.cluster.mount,
            tunables,
        })
    }
}

pub fn parse_config(file: &Path) -> Result<Config, ConfigError> {
    let config = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(source) => {
            error!("Could not read config file {}", file.display());
            return Err(ConfigError::Read {
                path: file.to_owned(),
                source,
            });
        }
    };

    let config = match toml::from_str(&config) {
        Ok(c) => c,
        Err(source) => {
            error!("Could not parse config file {}", file.display());
            return Err(ConfigError::Parse {
                path: file.to_owned(),
                source,
            });
        }
    };

    info!("config file parsed");
    Ok(config)
}

/// Expands a leading `~` against the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };

    match home::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn normalize_chroot(chroot: &str) -> Option<String> {
    let chroot = chroot.trim_start_matches('/');
    (!chroot.is_empty()).then(|| chroot.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_user(mut config: Config) -> Config {
        config.cluster.user = Some("deployer".to_owned());
        config
    }

    #[test]
    fn defaults_fill_in_missing_values() {
        let spec = with_user(Config::default()).into_spec().unwrap();

        assert_eq!(spec.private_ip, vec!["localhost".to_owned()]);
        assert!(spec.public_ip.is_empty());
        assert_eq!(spec.zookeeper_volume, "zookeeper");
        assert_eq!(spec.kafka_volume, "kafka");
        assert_eq!(spec.mount, None);
        assert_eq!(spec.tunables, Tunables::default());
        assert!(spec.credentials.private_key.ends_with(".ssh/id_rsa"));
    }

    #[test]
    fn later_layer_wins_on_merge() {
        let file: Config = toml::from_str(
            r#"
            [cluster]
            private_ip = ["10.0.0.1", "10.0.0.2"]
            user = "from-file"

            [kafka]
            log_retention_hours = 72
            "#,
        )
        .unwrap();
        let mut cli = Config::default();
        cli.cluster.user = Some("from-cli".to_owned());

        let merged = file.merge(cli);
        assert_eq!(merged.cluster.user.as_deref(), Some("from-cli"));
        assert_eq!(
            merged.cluster.private_ip,
            Some(vec!["10.0.0.1".to_owned(), "10.0.0.2".to_owned()])
        );
        assert_eq!(merged.kafka.log_retention_hours, Some(72));
    }

    #[test]
    fn chroot_loses_leading_separator() {
        let mut config = with_user(Config::default());
        config.kafka.zookeeper_chroot = Some("//kafka/prod".to_owned());
        let spec = config.into_spec().unwrap();
        assert_eq!(spec.tunables.zookeeper_chroot.as_deref(), Some("kafka/prod"));

        let mut config = with_user(Config::default());
        config.kafka.zookeeper_chroot = Some("/".to_owned());
        assert_eq!(config.into_spec().unwrap().tunables.zookeeper_chroot, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cluster]\nprivate_ips = [\"h1\"]\n").unwrap();

        assert!(matches!(
            parse_config(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse_config(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn home_is_expanded_only_at_the_start() {
        assert_eq!(expand_home("/etc/key"), PathBuf::from("/etc/key"));
        assert_eq!(expand_home("~other/key"), PathBuf::from("~other/key"));
        if let Some(home) = home::home_dir() {
            assert_eq!(expand_home("~/.ssh/id_rsa"), home.join(".ssh/id_rsa"));
        }
    }

    #[test]
    fn credential_must_be_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials {
            user: "deployer".to_owned(),
            private_key: dir.path().to_owned(),
        };
        assert!(matches!(
            credentials.validate(),
            Err(ConfigError::MissingCredential(_))
        ));

        let key = dir.path().join("id_rsa");
        std::fs::write(&key, "key").unwrap();
        let credentials = Credentials {
            private_key: key,
            ..credentials
        };
        assert!(credentials.validate().is_ok());
    }
}
