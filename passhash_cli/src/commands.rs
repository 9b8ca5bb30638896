use anyhow::{Result, bail};
use colored::Colorize;

use passhash::manager::DynHash;
use passhash::{HashManager, phc};

use crate::progress::spin;

/// Picks the hasher for a stored hash: the requested one, else the producer, else the default.
fn route<'a>(manager: &'a HashManager, hasher: Option<&str>, hash: &str) -> Result<&'a DynHash> {
    let name = hasher.or_else(|| manager.identify(hash));

    Ok(manager.use_hasher(name)?)
}

pub async fn make(manager: &HashManager, hasher: Option<&str>, password: Vec<u8>) -> Result<()> {
    let hash = manager.use_hasher(hasher)?;

    let hashed = spin("Hashing...", hash.make_async(password)).await?;

    println!("{hashed}");

    Ok(())
}

pub async fn verify(
    manager: &HashManager,
    hasher: Option<&str>,
    hashed: String,
    password: Vec<u8>,
) -> Result<()> {
    let hash = route(manager, hasher, &hashed)?;

    let matches = spin("Verifying...", hash.verify_async(hashed, password)).await?;

    if !matches {
        bail!("Password does not match".red());
    }

    println!("{}", "Password matches".green());

    Ok(())
}

pub fn needs_rehash(manager: &HashManager, hasher: Option<&str>, hashed: &str) -> Result<()> {
    let hash = manager.use_hasher(hasher)?;

    if hash.needs_rehash(hashed) {
        println!("{}", "Hash needs to be recomputed".yellow());
    } else {
        println!("{}", "Hash is up to date".green());
    }

    Ok(())
}

pub fn check(manager: &HashManager, hasher: Option<&str>, hashed: &str) -> Result<()> {
    let hash = manager.use_hasher(hasher)?;

    if !hash.is_valid_hash(hashed) {
        bail!("Not a valid hash for this hasher".red());
    }

    println!("{}", "Valid hash".green());

    Ok(())
}

pub fn identify(manager: &HashManager, hashed: &str) -> Result<()> {
    let Some(name) = manager.identify(hashed) else {
        bail!("No registered hasher accepts this hash".red());
    };

    println!("{}", name.bright_blue().bold());

    Ok(())
}

pub fn inspect(hashed: &str) -> Result<()> {
    let record = phc::deserialize(hashed)?;

    let mut builder = tabled::builder::Builder::new();
    builder.push_record(["Field", "Value"]);
    builder.push_record(["Algorithm", record.id.as_str()]);

    if let Some(version) = record.version {
        builder.push_record(["Version".to_owned(), version.to_string()]);
    }

    for (name, value) in record.params.iter() {
        builder.push_record([name.to_owned(), value.to_string()]);
    }

    builder.push_record(["Salt".to_owned(), format!("{} bytes", record.salt.len())]);
    builder.push_record(["Hash".to_owned(), format!("{} bytes", record.hash.len())]);

    let mut table = builder.build();
    table.with(tabled::settings::Style::markdown());
    println!("\n{table}\n");

    Ok(())
}

pub fn list(manager: &HashManager) {
    for name in manager.names() {
        if name == manager.default_name() {
            println!("{} {}", name.bright_blue().bold(), "(default)".dimmed());
        } else {
            println!("{name}");
        }
    }
}
