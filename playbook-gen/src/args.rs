use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use common::config::{ClusterArgs, Config, KafkaArgs};

#[derive(Debug, Parser)]
#[command(name = "playbook-gen")]
#[command(author, version, about = "Ansible playbook generator for ZooKeeper and Kafka clusters", long_about = None)]
pub struct Cli {
    /// Verbose logging
    #[arg(long, short, action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    /// Configuration file, command line options take precedence over it
    #[arg(long, short, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write ansible.cfg, hosts and deploy.yml into the work directory
    Generate(GenerateArgs),
    /// Print the generated deploy.yml
    Show(ClusterOpts),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Generated playbook directory [default: ./playbook]
    #[arg(long, short)]
    pub workdir: Option<String>,

    #[command(flatten)]
    pub cluster: ClusterOpts,
}

#[derive(Debug, Clone, Args)]
pub struct ClusterOpts {
    /// Kafka inter-server IPs/hostnames [default: localhost]
    #[arg(long, short = 'i', num_args = 1..)]
    pub private_ip: Option<Vec<String>>,

    /// Kafka advertised IPs/hostnames, also used to reach the hosts over SSH
    #[arg(long, short = 'a', num_args = 1..)]
    pub public_ip: Option<Vec<String>>,

    /// SSH user name [default: $USER]
    #[arg(long, short)]
    pub user: Option<String>,

    /// Path to SSH private key [default: ~/.ssh/id_rsa]
    #[arg(long, short)]
    pub key: Option<String>,

    /// ZooKeeper volume or path on the host machine [default: zookeeper]
    #[arg(long)]
    pub zookeeper_volume: Option<String>,

    /// Kafka volume or path on the host machine [default: kafka]
    #[arg(long)]
    pub kafka_volume: Option<String>,

    /// Data disk as "<device>:<mount point>", sets both volumes to directories
    /// under the mount point
    #[arg(long, short)]
    pub mount: Option<String>,

    /// docker-compose project name [default: nexcom]
    #[arg(long)]
    pub project_name: Option<String>,

    /// Kafka log retention in hours
    #[arg(long)]
    pub log_retention_hours: Option<u32>,

    /// Kafka log segment roll in hours [default: 168]
    #[arg(long)]
    pub log_roll_hours: Option<u32>,

    /// ZooKeeper chroot path for Kafka's metadata
    #[arg(long)]
    pub zookeeper_chroot: Option<String>,

    /// Kafka's ZooKeeper connection timeout [default: 3600000]
    #[arg(long)]
    pub zookeeper_timeout_ms: Option<u64>,

    /// Pull both images while provisioning every host
    #[arg(long, action = ArgAction::SetTrue)]
    pub pull_images: bool,
}

impl ClusterOpts {
    pub fn to_config(&self, workdir: Option<String>) -> Config {
        Config {
            cluster: ClusterArgs {
                private_ip: self.private_ip.clone(),
                public_ip: self.public_ip.clone(),
                user: self.user.clone(),
                key: self.key.clone(),
                zookeeper_volume: self.zookeeper_volume.clone(),
                kafka_volume: self.kafka_volume.clone(),
                mount: self.mount.clone(),
                workdir,
            },
            kafka: KafkaArgs {
                project_name: self.project_name.clone(),
                log_retention_hours: self.log_retention_hours,
                log_roll_hours: self.log_roll_hours,
                zookeeper_chroot: self.zookeeper_chroot.clone(),
                zookeeper_connection_timeout_ms: self.zookeeper_timeout_ms,
                pull_images: self.pull_images.then_some(true),
            },
        }
    }
}
