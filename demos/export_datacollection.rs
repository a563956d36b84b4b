use anyhow::{Context, Result};
use bdcapi::{Client, DatacollectionFilter, Destination, Selection};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Configure authentication via env vars or a `.bdcapirc` file.
    // RUST_LOG=info shows query status changes.
    env_logger::init();

    let client = Client::from_env()?;

    for (task, info) in client.task_numbers()? {
        println!("{} ({})", task, info.id);
    }

    let names = client.datacollections(&DatacollectionFilter::new().limit(5))?;
    let first = names.first().context("no datacollections available")?;

    let target = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".into()));
    let receipt = client.export(
        &Selection::datacollection(first.as_str()),
        &Destination::LocalDir(target),
    )?;
    println!("{}", receipt.message);
    Ok(())
}
