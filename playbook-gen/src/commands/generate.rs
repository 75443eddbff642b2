use std::time::Instant;

use anyhow::Result;
use common::{build, emit, exit, status};
use tracing::info;

use crate::args::{Cli, GenerateArgs};

use super::load_config;

pub fn generate(args: &GenerateArgs, cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(cli, args.cluster.to_config(args.workdir.clone()))?;
    let workdir = config.workdir();
    let spec = config.into_spec()?;

    if let Err(err) = spec.credentials.validate() {
        exit!(err, "Could not find SSH private key");
    }

    let document = match build(&spec) {
        Ok(d) => d,
        Err(err) => exit!(
            err,
            "Could not build playbook for {} hosts",
            spec.private_ip.len()
        ),
    };
    info!("{} hosts, inventory {:?}", spec.private_ip.len(), document.inventory());

    let written = match emit(&document, &spec.credentials, &workdir) {
        Ok(w) => w,
        Err(err) => exit!(err, "Could not write playbook to {}", workdir.display()),
    };
    for path in &written {
        info!("wrote {}", path.display());
    }

    status::finish("Playbook generated", &workdir, start_time.elapsed());
    Ok(())
}
