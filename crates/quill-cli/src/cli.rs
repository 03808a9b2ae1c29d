use clap::{Args, Parser, Subcommand};
use quill_types::ObjectKind;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill: a content-addressed object store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new, empty repository
    Init(InitArgs),
    /// Print the payload of a repository object
    CatFile(CatFileArgs),
    /// Compute an object ID and optionally store the object
    HashObject(HashObjectArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Where to create the repository
    pub path: Option<String>,
}

#[derive(Args)]
pub struct CatFileArgs {
    /// Expected object type
    #[arg(value_name = "TYPE")]
    pub kind: ObjectKind,
    /// Object to display
    pub object: String,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Object type
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "blob")]
    pub kind: ObjectKind,
    /// Write the object into the repository
    #[arg(short, long)]
    pub write: bool,
    /// Read object data from this file
    pub path: String,
}
