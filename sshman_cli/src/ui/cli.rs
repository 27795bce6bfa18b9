use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use log::{debug, info};
use sshman_core::{open_session, IdentityStore};

use super::{listing, prompt};
use crate::config::{self, HostKeyMode, TransportKind};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "ssh-manager",
    version,
    about = "Keep named SSH identities and open interactive sessions to them",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Args {
    /// Identity file (default: ~/.ssh-manager.json)
    #[arg(long, global = true, env = "SSH_MANAGER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List user identities
    #[command(visible_alias = "list")]
    Ls,
    /// Add a new identity
    Add(AddArgs),
    /// Remove an existing identity
    #[command(visible_alias = "remove")]
    Rm {
        /// Identity to remove; lists identities when omitted
        name: Option<String>,
    },
    /// Connect to an SSH identity
    Connect(ConnectArgs),
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Values not given here are prompted for.
#[derive(clap::Args, Debug, Default)]
pub struct AddArgs {
    /// Unique identity name
    #[arg(long)]
    pub name: Option<String>,
    /// Remote login name
    #[arg(long)]
    pub username: Option<String>,
    /// Hostname or IP, optionally `host:port`
    #[arg(long)]
    pub address: Option<String>,
    /// Remote port, 0 for the default
    #[arg(long)]
    pub port: Option<u16>,
    /// Free-form note
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ConnectArgs {
    /// Identity to connect to; lists identities when omitted
    pub name: Option<String>,

    /// How to reach the host
    #[arg(long, value_enum, env = "SSH_MANAGER_TRANSPORT", default_value_t = TransportKind::System)]
    pub transport: TransportKind,

    /// ssh client run by the system transport
    #[arg(long, env = "SSH_MANAGER_SSH", default_value = "ssh", value_name = "PROGRAM")]
    pub ssh_program: OsString,

    /// Host key checking for the native transport
    #[arg(long, value_enum, env = "SSH_MANAGER_HOST_KEYS", default_value_t = HostKeyMode::AcceptAny)]
    pub host_keys: HostKeyMode,

    /// known_hosts file (default: ~/.ssh/known_hosts)
    #[arg(long, env = "SSH_MANAGER_KNOWN_HOSTS", value_name = "PATH")]
    pub known_hosts: Option<PathBuf>,
}

pub fn run_cli(args: Args) -> Result<()> {
    match args.command {
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "ssh-manager", &mut io::stdout());
            Ok(())
        }
        command => {
            let path = config::config_path(args.config)?;
            debug!("Using identity file {:?}", path);
            let mut store = IdentityStore::open(path)?;
            dispatch(&mut store, command)
        }
    }
}

fn dispatch(store: &mut IdentityStore, command: Command) -> Result<()> {
    match command {
        Command::Ls => list_identities(store),
        Command::Add(add) => add_identity(store, add),
        Command::Rm { name } => remove_identity(store, name),
        Command::Connect(connect) => connect_identity(store, connect),
        Command::Completions { .. } => Ok(()),
    }
}

fn list_identities(store: &mut IdentityStore) -> Result<()> {
    let identities = store.list()?;
    print!("{}", listing::render(&identities));
    Ok(())
}

fn add_identity(store: &mut IdentityStore, args: AddArgs) -> Result<()> {
    let identity = prompt::collect_identity(args)?;
    let name = identity.name.clone();
    store.insert(identity)?;
    println!("Added {name}");
    Ok(())
}

fn remove_identity(store: &mut IdentityStore, name: Option<String>) -> Result<()> {
    let Some(name) = name else {
        return list_identities(store);
    };
    store.delete(&name)?;
    println!("Removed {name}");
    Ok(())
}

fn connect_identity(store: &mut IdentityStore, args: ConnectArgs) -> Result<()> {
    let Some(name) = args.name else {
        return list_identities(store);
    };

    let host_keys = config::host_key_policy(args.host_keys, args.known_hosts)?;
    let transport = config::build_transport(args.transport, &args.ssh_program, host_keys)?;
    info!("Connecting to '{}' with the {} transport", name, transport.name());

    open_session(store, &name, transport.as_ref(), prompt::password)?;
    info!("Session to '{}' ended", name);
    Ok(())
}
