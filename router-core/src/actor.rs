//! The default way to run a [`Router`]: a single-task `tokio::select!` event
//! loop, modeled on the background-processor pattern used elsewhere in this
//! ecosystem. Plays the role of the "actor/dispatch harness" the spec treats
//! as an external collaborator (§1), without prescribing anything about
//! payment or onion logic.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use router_tokio::shutdown::ShutdownChannel;
use router_tokio::task::Task;
use router_types::{ChannelAnnouncement, ChannelDesc, ChannelUpdate, NodeAnnouncement, RouterError, ShortChannelId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use crate::local::{ExternalFundingSpent, LocalChannelDown, LocalChannelUpdate};
use crate::peer::PeerId;
use crate::persistence::ChannelPersister;
use crate::router::{Router, RoutingStateSnapshot};
use crate::routing::{RouteRequest, RouteResponse};
use crate::sync::{QueryChannelRange, ReplyChannelRange};
use crate::verifier::SignatureVerifier;

/// How often `TickPruneStaleChannels` fires. Not a [`RouterConfig`](router_types::RouterConfig)
/// field: the configurable options (§6) only cover the staleness thresholds
/// themselves, not the cadence of the sweep that applies them, so this is a
/// fixed operational constant, same as the other housekeeping intervals in
/// this event loop.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Every externally-driven input the event loop accepts. One queue, drained
/// strictly in arrival order, one event processed to completion at a time
/// (§5).
pub enum Command {
    ChannelAnnouncement {
        msg: ChannelAnnouncement,
        origin: PeerId,
    },
    ChannelUpdate {
        msg: ChannelUpdate,
        origin: PeerId,
    },
    NodeAnnouncement {
        msg: NodeAnnouncement,
        origin: PeerId,
    },
    LocalChannelUpdate(LocalChannelUpdate),
    LocalChannelDown(LocalChannelDown),
    ExternalFundingSpent(ExternalFundingSpent),
    /// The chain watcher's current tip, consulted by `TickPruneStaleChannels`.
    /// Not itself a spec-named event; pruning needs *some* notion of "now"
    /// in blocks and the external chain watcher is the natural source (§1).
    ChainTipUpdated(u32),
    ExcludeChannel(ChannelDesc),
    LiftChannelExclusion(ChannelDesc),
    RouteRequest {
        request: RouteRequest,
        reply: oneshot::Sender<Result<RouteResponse, RouterError>>,
    },
    GetRoutingState {
        reply: oneshot::Sender<RoutingStateSnapshot>,
    },
    SendChannelQuery {
        reply: oneshot::Sender<QueryChannelRange>,
    },
    ReplyChannelRange {
        reply_msg: ReplyChannelRange,
        reply: oneshot::Sender<Option<Vec<ShortChannelId>>>,
    },
}

/// A handle to the running event loop: a command sender plus the task
/// itself. Dropping the sender side (or every clone of it) lets the loop
/// notice via `None` from `recv()`, but the expected shutdown path is the
/// `ShutdownChannel`.
pub struct ActorHandle {
    pub commands_tx: mpsc::Sender<Command>,
    pub task: Task<()>,
}

/// Spawn the event loop. `channel_exclude_duration` and `broadcast_interval`
/// are read once from the router's config at spawn time.
pub fn spawn<P, V>(router: Router<P, V>, shutdown: ShutdownChannel) -> ActorHandle
where
    P: ChannelPersister + Send + Sync + 'static,
    V: SignatureVerifier + Send + Sync + 'static,
{
    let (commands_tx, commands_rx) = mpsc::channel(router_tokio::DEFAULT_CHANNEL_SIZE);
    let broadcast_interval = router.config().broadcast_interval;
    let channel_exclude_duration = router.config().channel_exclude_duration;
    let loop_commands_tx = commands_tx.clone();

    let task = Task::spawn(run(
        router,
        commands_rx,
        loop_commands_tx,
        broadcast_interval,
        channel_exclude_duration,
        shutdown,
    ));

    ActorHandle { commands_tx, task }
}

#[instrument(skip_all, name = "[router event loop]")]
async fn run<P, V>(
    mut router: Router<P, V>,
    mut commands_rx: mpsc::Receiver<Command>,
    commands_tx: mpsc::Sender<Command>,
    broadcast_interval: Duration,
    channel_exclude_duration: Duration,
    shutdown: ShutdownChannel,
) where
    P: ChannelPersister + Send + Sync + 'static,
    V: SignatureVerifier + Send + Sync + 'static,
{
    let mut broadcast_timer = interval(broadcast_interval);
    let mut prune_timer = interval(PRUNE_INTERVAL);
    let current_block = Arc::new(AtomicU32::new(0));

    loop {
        tokio::select! {
            maybe_command = commands_rx.recv() => {
                let Some(command) = maybe_command else {
                    info!("command channel closed, shutting down");
                    break;
                };
                handle_command(
                    &mut router,
                    command,
                    &commands_tx,
                    channel_exclude_duration,
                    &current_block,
                )
                .await;
            }

            _ = broadcast_timer.tick() => {
                debug!("TickBroadcast (no-op)");
            }

            _ = prune_timer.tick() => {
                let block = current_block.load(Ordering::Relaxed);
                match router.prune_stale_channels(block).await {
                    Ok(events) => debug!(count = events.len(), "pruned stale channels"),
                    Err(e) => error!("persistence failure while pruning: {e}"),
                }
            }

            () = shutdown.recv() => {
                info!("router event loop shutting down");
                break;
            }
        }
    }
}

async fn handle_command<P, V>(
    router: &mut Router<P, V>,
    command: Command,
    commands_tx: &mpsc::Sender<Command>,
    channel_exclude_duration: Duration,
    current_block: &Arc<AtomicU32>,
) where
    P: ChannelPersister + Send + Sync + 'static,
    V: SignatureVerifier + Send + Sync + 'static,
{
    match command {
        Command::ChannelAnnouncement { msg, origin } => {
            if let Err(e) = router.handle_channel_announcement(msg, origin).await {
                error!("persistence failure handling channel announcement: {e}");
            }
        }
        Command::ChannelUpdate { msg, origin } => {
            if let Err(e) = router.handle_channel_update(msg, origin).await {
                error!("persistence failure handling channel update: {e}");
            }
        }
        Command::NodeAnnouncement { msg, origin } => {
            if let Err(e) = router.handle_node_announcement(msg, origin).await {
                error!("persistence failure handling node announcement: {e}");
            }
        }
        Command::LocalChannelUpdate(event) => {
            if let Err(e) = router.handle_local_channel_update(event).await {
                error!("persistence failure handling local channel update: {e}");
            }
        }
        Command::LocalChannelDown(event) => {
            router.handle_local_channel_down(event);
        }
        Command::ExternalFundingSpent(event) => {
            if let Err(e) = router.handle_external_funding_spent(event).await {
                error!("persistence failure handling external funding spent: {e}");
            }
        }
        Command::ChainTipUpdated(height) => {
            current_block.store(height, Ordering::Relaxed);
        }
        Command::ExcludeChannel(desc) => {
            router.exclude_channel(desc);
            let commands_tx = commands_tx.clone();
            let _ = Task::spawn(async move {
                tokio::time::sleep(channel_exclude_duration).await;
                let _ = commands_tx.send(Command::LiftChannelExclusion(desc)).await;
            });
        }
        Command::LiftChannelExclusion(desc) => {
            router.lift_channel_exclusion(&desc);
        }
        Command::RouteRequest { request, reply } => {
            let result = router.route(request).await;
            let _ = reply.send(result);
        }
        Command::GetRoutingState { reply } => {
            let _ = reply.send(router.routing_state());
        }
        Command::SendChannelQuery { reply } => {
            let _ = reply.send(router.build_sync_query());
        }
        Command::ReplyChannelRange { reply_msg, reply } => {
            let block = current_block.load(Ordering::Relaxed);
            let diff = router.handle_reply_channel_range(block, &reply_msg);
            if diff.is_none() {
                warn!("ReplyChannelRange for a different chain, ignoring");
            }
            let _ = reply.send(diff);
        }
    }
}
