use anyhow::Result;
use common::{build, exit, render};

use crate::args::{Cli, ClusterOpts};

use super::load_config;

/// Prints deploy.yml without writing anything. The private key is not
/// required to exist.
pub fn show(opts: &ClusterOpts, cli: &Cli) -> Result<()> {
    let spec = load_config(cli, opts.to_config(None))?.into_spec()?;
    let document = match build(&spec) {
        Ok(d) => d,
        Err(err) => exit!(err, "Could not build playbook"),
    };
    print!("{}", render(&document)?);
    Ok(())
}
