use std::fs;
use std::io::{self, Write};

use anyhow::Context;
use colored::Colorize;
use quill_repo::Repository;
use quill_store::{write_object, Object};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::CatFile(args) => cmd_cat_file(args),
        Command::HashObject(args) => cmd_hash_object(args),
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| ".".into());
    let repo = Repository::init(&path)?;
    println!(
        "{} Initialized empty Quill repository in {}",
        "✓".green().bold(),
        repo.gitdir().display().to_string().bold()
    );
    Ok(())
}

fn cmd_cat_file(args: CatFileArgs) -> anyhow::Result<()> {
    let repo = Repository::find(".")?;
    let payload = repo.cat_file(&args.object, args.kind)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&payload)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_hash_object(args: HashObjectArgs) -> anyhow::Result<()> {
    hash_object_to(&args, &mut io::stdout().lock())
}

// Plain id on its own line; scripts consume this output.
fn hash_object_to(args: &HashObjectArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let data = fs::read(&args.path).with_context(|| format!("cannot read {}", args.path))?;
    debug!(path = %args.path, kind = %args.kind, bytes = data.len(), "hashing file");
    let id = hash_data(&data, args)?;
    writeln!(out, "{id}")?;
    Ok(())
}

fn hash_data(data: &[u8], args: &HashObjectArgs) -> anyhow::Result<quill_types::ObjectId> {
    if args.write {
        let repo = Repository::find(".")?;
        Ok(repo.hash_object(data, args.kind, true)?)
    } else {
        let object = Object::from_payload(args.kind, data)?;
        Ok(write_object(&object, None)?)
    }
}
