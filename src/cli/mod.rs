//! CLI module - Command-line interface for Marquee
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::EntityKind;

/// Marquee - movie catalog sync for a WordPress/Pods site
#[derive(Parser)]
#[command(name = "marquee")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Start the HTTP API server
    #[command(alias = "daemon")]
    Serve,

    /// List local records of one entity type
    #[command(alias = "ls")]
    Records {
        /// movie, actor, director or experiment
        kind: EntityKind,
        /// Only show records with this sync status
        #[arg(long)]
        status: Option<String>,
    },

    /// Create an unsynced local movie record
    AddMovie {
        /// Movie title
        #[arg(required = true)]
        title: Vec<String>,
        /// Release year
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        tmdb_id: Option<i64>,
        #[arg(long)]
        imdb_id: Option<String>,
        /// Genre, repeatable
        #[arg(long = "genre")]
        genres: Vec<String>,
    },

    /// Run a sync operation
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },

    /// Show the sync operation log
    Logs {
        #[arg(long, default_value = "1")]
        page: u64,
        #[arg(long, default_value = "20")]
        page_size: u64,
        /// Filter by entity type
        #[arg(long)]
        entity_type: Option<EntityKind>,
        /// Filter by outcome (success or failed)
        #[arg(long)]
        status: Option<String>,
    },

    /// Fetch and enrich movie details by TMDB id
    Enrich {
        /// TMDB movie id
        tmdb_id: i64,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Push a local record to the remote site
    Push {
        kind: EntityKind,
        /// Local record id
        id: i64,
    },
    /// Pull a remote post into the local store
    Pull {
        kind: EntityKind,
        /// Remote post id
        remote_id: i64,
    },
    /// Push, then pull back what the remote site stored
    Both {
        kind: EntityKind,
        /// Local record id
        id: i64,
    },
    /// Pull every remote post of one type
    BulkPull { kind: EntityKind },
    /// Push every local record of one type that is not synced
    BulkPush { kind: EntityKind },
}

pub use commands::*;
