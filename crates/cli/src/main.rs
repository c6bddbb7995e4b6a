// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! atwf - AI Team Workflow orchestrator CLI

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{comm, design, drive, inbox, registry, reply, state, watch};

#[derive(Parser)]
#[command(
    name = "atwf",
    version,
    about = "AI Team Workflow - orchestrate a tree of tmux-pinned workers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the team directory (registry, layout, task.md)
    Init(registry::InitArgs),
    /// Register (upsert) a member in the registry
    Register(registry::RegisterArgs),
    /// Remove duplicate members of a (role, base) pair
    Prune(registry::PruneArgs),
    /// List registry members (tab-separated)
    List,
    /// Show the org tree (cycles annotated)
    Tree(registry::TreeArgs),
    /// Resolve a name to its full session name
    Resolve(registry::ResolveArgs),
    /// Show the derived team policy
    Policy,
    /// Grant two members a direct-comm handoff permit
    Handoff(comm::HandoffArgs),
    /// Send a comm-gated message (operator door; workers use notice/action)
    Send(comm::SendArgs),
    /// Deliver an FYI notice (no reply expected)
    Notice(comm::IntentArgs),
    /// Deliver an action instruction (report up when done)
    Action(comm::IntentArgs),
    /// Read receipts for a message id across recipients
    Receipts(comm::ReceiptsArgs),
    /// Open a reply-needed request against multiple targets
    Gather(reply::GatherArgs),
    /// Record a reply (or blocked ack) for a request
    Respond(reply::RespondArgs),
    /// List pending reply-needed requests for a member
    ReplyNeeded(reply::ReplyNeededArgs),
    /// Show one request's rendered status
    Request(reply::RequestArgs),
    /// List pending inbox messages
    Inbox(inbox::InboxArgs),
    /// Print a message and record the inbox check
    InboxOpen(inbox::InboxOpenArgs),
    /// Mark a message read
    InboxAck(inbox::InboxAckArgs),
    /// Pending counts for one sender->recipient thread
    InboxPending(inbox::InboxPendingArgs),
    /// Show member state (working/draining/idle)
    State(state::StateArgs),
    /// Operator override of a member's state
    StateSet(state::StateSetArgs),
    /// Declare the current worker's state
    StateSetSelf(state::StateSetSelfArgs),
    /// Show or set the drive mode (running|standby)
    Drive(drive::DriveArgs),
    /// Suspend all drive and wake actions
    Pause,
    /// Resume drive and wake actions
    Unpause,
    /// Run the watcher loop
    Watch(watch::WatchArgs),
    /// Create a member's design stub
    DesignInit(design::DesignInitArgs),
    /// Print a member's design stub path
    DesignPath(design::DesignPathArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    std::process::exit(match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("\u{274c} {}", err);
            err.downcast_ref::<atwf_core::TeamError>()
                .map(|team_err| team_err.exit_code())
                .unwrap_or(1)
        }
    });
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = context::Context::from_env()?;
    match cli.command {
        Commands::Init(args) => registry::init(&ctx, args),
        Commands::Register(args) => registry::register(&ctx, args),
        Commands::Prune(args) => registry::prune(&ctx, args),
        Commands::List => registry::list(&ctx),
        Commands::Tree(args) => registry::tree(&ctx, args),
        Commands::Resolve(args) => registry::resolve(&ctx, args),
        Commands::Policy => registry::policy(&ctx),
        Commands::Handoff(args) => comm::handoff(&ctx, args).await,
        Commands::Send(args) => comm::send(&ctx, args).await,
        Commands::Notice(args) => comm::intent(&ctx, args, atwf_engine::IntentKind::Notice).await,
        Commands::Action(args) => comm::intent(&ctx, args, atwf_engine::IntentKind::Action).await,
        Commands::Receipts(args) => comm::receipts(&ctx, args),
        Commands::Gather(args) => reply::gather(&ctx, args).await,
        Commands::Respond(args) => reply::respond(&ctx, args).await,
        Commands::ReplyNeeded(args) => reply::reply_needed(&ctx, args).await,
        Commands::Request(args) => reply::request(&ctx, args),
        Commands::Inbox(args) => inbox::inbox(&ctx, args).await,
        Commands::InboxOpen(args) => inbox::inbox_open(&ctx, args).await,
        Commands::InboxAck(args) => inbox::inbox_ack(&ctx, args).await,
        Commands::InboxPending(args) => inbox::inbox_pending(&ctx, args).await,
        Commands::State(args) => state::state(&ctx, args),
        Commands::StateSet(args) => state::state_set(&ctx, args),
        Commands::StateSetSelf(args) => state::state_set_self(&ctx, args).await,
        Commands::Drive(args) => drive::drive(&ctx, args).await,
        Commands::Pause => drive::pause(&ctx),
        Commands::Unpause => drive::unpause(&ctx),
        Commands::Watch(args) => watch::watch(&ctx, args).await,
        Commands::DesignInit(args) => design::design_init(&ctx, args),
        Commands::DesignPath(args) => design::design_path(&ctx, args),
    }
}
