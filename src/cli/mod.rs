//! CLI module - command-line interface for judolwatch
//!
//! Drives each pipeline operation the way the dashboard's views would.

mod commands;

pub use commands::{
    DomainListOptions, cmd_add_keyword, cmd_crawl, cmd_health, cmd_list_domains,
    cmd_list_keywords, cmd_login, cmd_remove_keyword, cmd_save_schedule, cmd_show_domain,
    cmd_verify,
};

use clap::{Parser, Subcommand};

/// judolwatch - gambling-domain review pipeline
#[derive(Parser)]
#[command(name = "judolwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List crawled domains with filters, sorting and paging
    #[command(alias = "ls", alias = "d")]
    Domains {
        /// Free-text search over domain names
        #[arg(long)]
        search: Option<String>,
        /// Filter by status: judol, non_judol or manual_check
        #[arg(long)]
        status: Option<String>,
        /// Minimum confidence score (0-100)
        #[arg(long)]
        min_score: Option<i64>,
        /// Maximum confidence score (0-100)
        #[arg(long)]
        max_score: Option<i64>,
        /// Only domains with (true) or without (false) AI reasoning
        #[arg(long)]
        reasoning: Option<bool>,
        /// Page to show
        #[arg(long, default_value = "1")]
        page: u64,
        /// Rows per page (5, 10, 25, 50 or 100)
        #[arg(long)]
        page_size: Option<u64>,
        /// Sort column: domain, status, score, verified or crawled
        #[arg(long)]
        sort: Option<String>,
        /// Flip the sort to descending
        #[arg(long)]
        desc: bool,
    },

    /// Show one domain with all its crawls
    #[command(alias = "i")]
    Show {
        /// Domain id
        id: i64,
    },

    /// Verify a domain: set its status (and optional reasoning note)
    #[command(alias = "v")]
    Verify {
        /// Domain id
        id: i64,
        /// New status: judol, non_judol or manual_check
        status: String,
        /// Reasoning note for the decision
        #[arg(long)]
        reasoning: Option<String>,
        /// Crawl to verify against (0 = newest)
        #[arg(long, default_value = "0")]
        crawl: usize,
    },

    /// List or edit crawl keywords
    #[command(alias = "kw")]
    Keywords {
        #[command(subcommand)]
        command: Option<KeywordCommands>,
    },

    /// Save the scheduled crawl configuration
    Schedule {
        /// Interval label: 30m, 1h, 2h, 3h, 5h, 8h or 12h
        interval: String,
        /// Crawl engine: google, baidu or bing
        #[arg(long)]
        engine: Option<String>,
        /// Extra keywords to add before saving
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },

    /// Dispatch an ad-hoc crawl for the given keywords
    Crawl {
        /// Keywords to crawl
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Crawl engine: google, baidu or bing
        #[arg(long)]
        engine: Option<String>,
        /// Ask the backend for AI reasoning on results
        #[arg(long)]
        ai_reasoning: Option<bool>,
        /// Restrict to these TLDs (repeatable)
        #[arg(long = "tld")]
        tlds: Vec<String>,
    },

    /// Probe the configured services
    Health {
        /// Service ids to check (all when omitted)
        ids: Vec<String>,
    },

    /// Log in against the backend and print the access token
    Login {
        /// Username
        username: String,
    },

    /// Run the background refresh daemon
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum KeywordCommands {
    /// List keywords with the active schedule
    #[command(alias = "ls")]
    List {
        /// Page to show
        #[arg(default_value = "1")]
        page: u64,
        /// Rows per page
        #[arg(default_value = "25")]
        limit: u64,
    },
    /// Add a keyword
    Add {
        /// Keyword text
        keyword: String,
    },
    /// Remove a keyword by server id
    #[command(alias = "rm")]
    Remove {
        /// Keyword id
        id: i64,
    },
}
