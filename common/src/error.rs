use std::path::PathBuf;

/// Invalid or contradictory user input. Always raised before anything is
/// written to disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one private address is required")]
    EmptyHostList,

    #[error("public address count ({public}) must equal private address count ({private})")]
    AddressCountMismatch { public: usize, private: usize },

    #[error("mount `{0}` must be in the form \"<device>:<mount point>\"")]
    MalformedMount(String),

    #[error("{field} `{value}` would be read as a boolean by Ansible")]
    AmbiguousValue { field: &'static str, value: String },

    #[error("{0} volume must not be empty")]
    EmptyVolume(&'static str),

    #[error("no SSH user given and $USER is not set")]
    MissingUser,

    #[error("private key {} does not exist or is not a file", .0.display())]
    MissingCredential(PathBuf),

    #[error("output path {} exists and is not a directory", .0.display())]
    OutputPathCollision(PathBuf),

    #[error("could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize playbook: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[cfg(test)]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
