// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `admin`: the operator CLI for `lrsd` (`spec.md` §6 "External interfaces").
//! Speaks the same wire protocol a `put`/`get`/`format` driver would, over
//! whichever transport the daemon's config exposes.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lrs_core::{AddressType, Family, FsType};
use lrs_daemon::lifecycle::Config;
use lrs_daemon::protocol::{NotifyKind, Request, Response};
use lrs_daemon::protocol_wire;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

#[derive(Parser)]
#[command(name = "admin", about = "Local Resource Scheduler admin client")]
struct Cli {
    /// Path to lrsd's config file, used to find the listen transport.
    /// Defaults to the same `LRS_CONFIG`-driven path `lrsd` itself uses.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Checks the daemon is alive.
    Ping,
    /// Registers a newly attached device, or deregisters one that's gone.
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },
    /// Registers a medium not discoverable by a library scan (`dir`/`rados`).
    Medium {
        #[command(subcommand)]
        action: MediumAction,
    },
    /// Requests read access to a medium.
    ReadAlloc(AllocArgs),
    /// Requests write access to a medium.
    WriteAlloc(AllocArgs),
    /// Returns a device/medium pair, flushing any pending sync.
    Release {
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        medium_id: String,
        #[arg(long, default_value_t = 0)]
        written_bytes: u64,
        /// A non-zero client-observed error forces the medium FAILED on release.
        #[arg(long)]
        client_errno: Option<i32>,
    },
    /// Formats a medium with the given filesystem type.
    Format {
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long)]
        medium_id: String,
        #[arg(long, value_enum)]
        fs_type: FsTypeArg,
        /// Release the medium's lock once formatting succeeds.
        #[arg(long)]
        unlock: bool,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// Tells the daemon a drive was attached.
    Add {
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long)]
        id: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        path: String,
    },
    /// Tells the daemon a drive was detached.
    Remove {
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum MediumAction {
    /// Tells the daemon a directory/object-pool medium is now available.
    Register {
        #[arg(long, value_enum)]
        family: FamilyArg,
        #[arg(long)]
        id: String,
        #[arg(long)]
        model: String,
        #[arg(long, value_enum)]
        fs_type: FsTypeArg,
        #[arg(long, value_enum, default_value_t = AddressTypeArg::Linear)]
        address_type: AddressTypeArg,
    },
}

#[derive(clap::Args)]
struct AllocArgs {
    #[arg(long, value_enum)]
    family: FamilyArg,
    #[arg(long)]
    medium_id: Option<String>,
    #[arg(long)]
    technology: Option<String>,
    #[arg(long)]
    tag: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FamilyArg {
    Tape,
    Dir,
    Rados,
}

impl From<FamilyArg> for Family {
    fn from(f: FamilyArg) -> Self {
        match f {
            FamilyArg::Tape => Family::Tape,
            FamilyArg::Dir => Family::Dir,
            FamilyArg::Rados => Family::Rados,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FsTypeArg {
    Posix,
    Ltfs,
    Rados,
}

impl From<FsTypeArg> for FsType {
    fn from(f: FsTypeArg) -> Self {
        match f {
            FsTypeArg::Posix => FsType::Posix,
            FsTypeArg::Ltfs => FsType::Ltfs,
            FsTypeArg::Rados => FsType::Rados,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum AddressTypeArg {
    Linear,
    Hash,
}

impl From<AddressTypeArg> for AddressType {
    fn from(a: AddressTypeArg) -> Self {
        match a {
            AddressTypeArg::Linear => AddressType::Linear,
            AddressTypeArg::Hash => AddressType::Hash,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(lrs_daemon::env::config_path);
    let config = Config::load(&config_path).context("loading lrsd config")?;

    let request = match cli.command {
        Commands::Ping => Request::Ping,
        Commands::Device { action } => Request::Notify(match action {
            DeviceAction::Add { family, id, model, path } => NotifyKind::DeviceAdded {
                family: family.into(),
                device_id: id,
                model,
                path,
            },
            DeviceAction::Remove { family, id } => NotifyKind::DeviceRemoved {
                family: family.into(),
                device_id: id,
            },
        }),
        Commands::Medium { action } => Request::Notify(match action {
            MediumAction::Register { family, id, model, fs_type, address_type } => {
                NotifyKind::MediumAdded {
                    family: family.into(),
                    medium_id: id,
                    model,
                    fs_type: fs_type.into(),
                    address_type: address_type.into(),
                }
            }
        }),
        Commands::ReadAlloc(args) => Request::ReadAlloc {
            family: args.family.into(),
            medium_id: args.medium_id,
            technology: args.technology,
            tag: args.tag,
        },
        Commands::WriteAlloc(args) => Request::WriteAlloc {
            family: args.family.into(),
            medium_id: args.medium_id,
            technology: args.technology,
            tag: args.tag,
        },
        Commands::Release { family, device_id, medium_id, written_bytes, client_errno } => {
            Request::Release {
                family: family.into(),
                device_id,
                medium_id,
                written_bytes,
                client_errno,
            }
        }
        Commands::Format { family, medium_id, fs_type, unlock } => Request::Format {
            family: family.into(),
            medium_id,
            fs_type: fs_type.into(),
            unlock,
        },
    };

    let response = send(&config, request).await?;
    print_response(&response);
    if let Response::Error { errno } = response {
        std::process::exit(-errno);
    }
    Ok(())
}

async fn send(config: &Config, request: Request) -> Result<Response> {
    if let Some(path) = &config.lrs.listen_socket_path {
        let stream = UnixStream::connect(path)
            .await
            .with_context(|| format!("connecting to {path}"))?;
        return roundtrip(stream, request).await;
    }
    if let (Some(host), Some(port)) = (&config.lrs.listen_tcp_host, config.lrs.listen_tcp_port) {
        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .with_context(|| format!("connecting to {host}:{port}"))?;
        return roundtrip(stream, request).await;
    }
    bail!("config has neither listen_socket_path nor listen_tcp_host/listen_tcp_port set");
}

async fn roundtrip<S: AsyncRead + AsyncWrite + Unpin>(mut stream: S, request: Request) -> Result<Response> {
    let payload = protocol_wire::encode(&request)?;
    protocol_wire::write_message(&mut stream, &payload)
        .await
        .context("writing request")?;

    protocol_wire::read_version(&mut stream)
        .await
        .context("reading response version")?;
    let bytes = protocol_wire::read_message(&mut stream)
        .await
        .context("reading response")?;
    let response: Response = protocol_wire::decode(&bytes)?;
    Ok(response)
}

fn print_response(response: &Response) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{response:?}"),
    }
}
