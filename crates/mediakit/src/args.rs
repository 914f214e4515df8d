use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediakit")]
#[command(about = "Dual-store media kit content engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Form entry id (backend A)
    #[arg(long, global = true)]
    pub entry: Option<u64>,

    /// Post id (backend B)
    #[arg(long, global = true)]
    pub post: Option<u64>,

    /// Directory holding the backend tables (entries.json, postmeta.json)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Emit the raw JSON response instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load an entity, merged from both stores
    #[command(alias = "get")]
    Load {
        /// Entity name (topics, questions, authority_hook, biography, offers)
        entity: String,
    },

    /// Save fields to both stores
    Save {
        entity: String,

        /// Field to save, as KEY=VALUE (repeatable)
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Save a single field (autosave semantics)
    SaveField {
        entity: String,
        field: String,
        value: String,
    },

    /// Compare the sync stamps of two entities
    Verify {
        entity: String,

        /// Entity to compare against
        #[arg(default_value = "questions")]
        compare_to: String,
    },

    /// Overall data health for the record
    Health,
}
