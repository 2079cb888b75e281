//! CLI structure and command definitions.

use anyhow::Result;
use bootforge_types::ItemKind;
use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "bootforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Network provisioning configuration manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings document path
    #[arg(short, long, global = true, default_value = "/etc/bootforge/settings.yaml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage distros (bootable OS images)
    Distro {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage installation profiles
    Profile {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage target systems
    System {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage package repos
    Repo {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage deployable images
    Image {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage management classes
    Mgmtclass {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage package resources
    Package {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Manage file resources
    File {
        #[command(subcommand)]
        action: ObjectCommand,
    },

    /// Regenerate every boot-service artifact
    Sync,

    /// Show an item's effective (blended) configuration
    Blend {
        /// Item kind (distro, profile, system, ...)
        kind: String,

        /// Item name
        name: String,

        /// Collapse option maps into kernel-command-line strings
        #[arg(long)]
        flatten: bool,
    },

    /// Run a power-management command against a system
    Power {
        /// Action: on, off, status, reboot
        action: String,

        /// System name
        system: String,
    },
}

#[derive(Subcommand)]
pub enum ObjectCommand {
    /// Add a new item
    Add {
        /// Item name
        name: String,

        /// Set a field: --set field=value (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Interface to configure (systems only)
        #[arg(long)]
        interface: Option<String>,

        /// Interface MAC address
        #[arg(long)]
        mac: Option<String>,

        /// Interface IP address
        #[arg(long)]
        ip: Option<String>,

        /// Interface DNS name
        #[arg(long = "dns-name")]
        dns_name: Option<String>,

        /// Interface DHCP tag
        #[arg(long = "dhcp-tag")]
        dhcp_tag: Option<String>,
    },

    /// Edit an existing item
    Edit {
        /// Item name
        name: String,

        /// Set a field: --set field=value (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Interface to configure (systems only)
        #[arg(long)]
        interface: Option<String>,

        /// Interface MAC address
        #[arg(long)]
        mac: Option<String>,

        /// Interface IP address
        #[arg(long)]
        ip: Option<String>,

        /// Interface DNS name
        #[arg(long = "dns-name")]
        dns_name: Option<String>,

        /// Interface DHCP tag
        #[arg(long = "dhcp-tag")]
        dhcp_tag: Option<String>,
    },

    /// Remove an item
    Remove {
        /// Item name
        name: String,

        /// Remove referencing children depth-first
        #[arg(short, long)]
        recursive: bool,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List item names
    List,

    /// Show an item's raw attributes
    Report {
        /// Item name
        name: String,
    },
}

impl Cli {
    pub fn execute(&self) -> Result<()> {
        let ctx = commands::AppContext::init(&self.config)?;

        match &self.command {
            Commands::Distro { action } => commands::object::run(&ctx, ItemKind::Distro, action),
            Commands::Profile { action } => commands::object::run(&ctx, ItemKind::Profile, action),
            Commands::System { action } => commands::object::run(&ctx, ItemKind::System, action),
            Commands::Repo { action } => commands::object::run(&ctx, ItemKind::Repo, action),
            Commands::Image { action } => commands::object::run(&ctx, ItemKind::Image, action),
            Commands::Mgmtclass { action } => {
                commands::object::run(&ctx, ItemKind::MgmtClass, action)
            }
            Commands::Package { action } => commands::object::run(&ctx, ItemKind::Package, action),
            Commands::File { action } => commands::object::run(&ctx, ItemKind::File, action),
            Commands::Sync => commands::sync::run(&ctx),
            Commands::Blend {
                kind,
                name,
                flatten,
            } => commands::blend::run(&ctx, kind, name, *flatten),
            Commands::Power { action, system } => commands::power::run(&ctx, action, system),
        }
    }
}
