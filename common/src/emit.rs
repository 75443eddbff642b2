use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    config::Credentials,
    error::{ConfigError, Error, Result},
    playbook::{host_group, ProvisioningDocument},
};

pub const ANSIBLE_CFG: &str = "ansible.cfg";
pub const INVENTORY: &str = "hosts";
pub const PLAYBOOK: &str = "deploy.yml";

const ANSIBLE_CFG_CONTENT: &str = "[defaults]
inventory=./hosts
host_key_checking=False
interpreter_python=/usr/bin/python3
";

/// Writes `ansible.cfg`, `hosts` and `deploy.yml` into `out_dir`, creating it
/// if needed. Returns the written paths in that order.
pub fn emit(
    document: &ProvisioningDocument,
    credentials: &Credentials,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    prepare_dir(out_dir)?;

    let files = [
        (ANSIBLE_CFG, ANSIBLE_CFG_CONTENT.to_owned()),
        (INVENTORY, inventory(document, credentials)),
        (PLAYBOOK, render(document)?),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = out_dir.join(name);
        write_file(&path, content.as_bytes())?;
        written.push(path);
    }

    info!("playbook written to {}", out_dir.display());
    Ok(written)
}

/// The YAML text of `deploy.yml`.
pub fn render(document: &ProvisioningDocument) -> Result<String> {
    Ok(serde_yaml::to_string(document.plays())?)
}

/// One `server<n>` group per inventory address.
pub fn inventory(document: &ProvisioningDocument, credentials: &Credentials) -> String {
    let mut hosts = String::new();
    for (index, address) in document.inventory().iter().enumerate() {
        hosts.push_str(&format!(
            "[{}]\n{address} ansible_ssh_user={} ansible_ssh_private_key_file={}\n\n",
            host_group(index),
            credentials.user,
            credentials.private_key.display()
        ));
    }
    hosts
}

fn prepare_dir(out_dir: &Path) -> Result<()> {
    if out_dir.exists() && !out_dir.is_dir() {
        return Err(ConfigError::OutputPathCollision(out_dir.to_owned()).into());
    }
    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    debug!("writing {}", path.display());
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::build, config::ClusterSpec};

    fn spec(private: &[&str]) -> ClusterSpec {
        ClusterSpec::new(
            private.iter().map(|s| s.to_string()).collect(),
            Credentials {
                user: "deployer".to_owned(),
                private_key: PathBuf::from("/home/deployer/.ssh/id_rsa"),
            },
        )
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("playbook");
        let spec = spec(&["10.0.0.1", "10.0.0.2"]);
        let doc = build(&spec).unwrap();

        let written = emit(&doc, &spec.credentials, &out).unwrap();
        assert_eq!(
            written,
            vec![out.join("ansible.cfg"), out.join("hosts"), out.join("deploy.yml")]
        );

        assert_eq!(read(&out, ANSIBLE_CFG), ANSIBLE_CFG_CONTENT);
        assert_eq!(ANSIBLE_CFG_CONTENT.lines().count(), 4);
        assert_eq!(
            read(&out, INVENTORY),
            "[server1]\n\
             10.0.0.1 ansible_ssh_user=deployer ansible_ssh_private_key_file=/home/deployer/.ssh/id_rsa\n\
             \n\
             [server2]\n\
             10.0.0.2 ansible_ssh_user=deployer ansible_ssh_private_key_file=/home/deployer/.ssh/id_rsa\n\
             \n"
        );
    }

    #[test]
    fn playbook_keeps_identifiers_as_text() {
        let doc = build(&spec(&["10.0.0.1", "10.0.0.2"])).unwrap();
        let yaml = render(&doc).unwrap();

        assert!(yaml.contains("ZK_ID: '1'"), "{yaml}");
        assert!(yaml.contains("ZK_ID: '2'"), "{yaml}");
        assert!(yaml.contains("KK_BROKER_ID: '0'"), "{yaml}");
        assert!(yaml.contains("KK_LOG_ROLL_HOURS: '168'"), "{yaml}");
        assert!(yaml.contains("version: '2'"), "{yaml}");

        let plays: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let env = &plays[1]["tasks"][0]["docker_compose"]["definition"]["services"]["zookeeper"]
            ["environment"];
        assert!(env["ZK_ID"].is_string());
        assert_eq!(env["ZK_server_2"], "10.0.0.2:2888:3888");
    }

    #[test]
    fn playbook_preserves_order() {
        let mut spec = spec(&["h1", "h2", "h3"]);
        spec.mount = Some("/dev/sdb:/data".to_owned());
        let yaml = render(&build(&spec).unwrap()).unwrap();
        let plays: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let hosts: Vec<&str> = plays
            .as_sequence()
            .unwrap()
            .iter()
            .map(|p| p["hosts"].as_str().unwrap())
            .collect();
        assert_eq!(hosts, vec!["all", "all", "server1", "server2", "server3"]);

        let keys: Vec<&str> = plays[2]["tasks"][0]["docker_compose"]["definition"]["services"]
            ["kafka"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(
            keys,
            vec!["image", "ports", "volumes", "environment", "restart"]
        );
        assert!(plays[2]["tasks"][0]["docker_compose"]["definition"]
            .get("volumes")
            .is_none());
    }

    #[test]
    fn output_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec(&["10.0.0.1", "10.0.0.2"]);

        emit(&build(&spec).unwrap(), &spec.credentials, dir.path()).unwrap();
        let first: Vec<String> = [ANSIBLE_CFG, INVENTORY, PLAYBOOK]
            .iter()
            .map(|f| read(dir.path(), f))
            .collect();

        emit(&build(&spec).unwrap(), &spec.credentials, dir.path()).unwrap();
        let second: Vec<String> = [ANSIBLE_CFG, INVENTORY, PLAYBOOK]
            .iter()
            .map(|f| read(dir.path(), f))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn refuses_to_write_over_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("playbook");
        fs::write(&out, "not a directory").unwrap();
        let spec = spec(&["h1"]);

        let err = emit(&build(&spec).unwrap(), &spec.credentials, &out).unwrap_err();
        assert!(err.is_config());
        assert_eq!(read(dir.path(), "playbook"), "not a directory");
        assert!(!dir.path().join(PLAYBOOK).exists());
    }

    #[test]
    fn write_failure_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("playbook");
        fs::create_dir_all(out.join(PLAYBOOK)).unwrap();
        let spec = spec(&["h1"]);

        let err = emit(&build(&spec).unwrap(), &spec.credentials, &out).unwrap_err();
        assert!(matches!(&err, Error::Io { path, .. } if path == &out.join(PLAYBOOK)));
        assert!(!err.is_config());
        assert!(err.to_string().contains("deploy.yml"), "{err}");
    }
}
