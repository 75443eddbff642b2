pub mod builder;
pub mod config;
pub mod emit;
pub mod error;
pub mod playbook;
pub mod services;
pub mod status;

pub use builder::build;
pub use emit::{emit, render};
pub use error::{ConfigError, Error};

#[macro_export]
macro_rules! exit {
    ($err:expr, $($arg:tt)*) => {
        {
            tracing::error!($($arg)*);
            anyhow::bail!($err)
        }
    };
}
