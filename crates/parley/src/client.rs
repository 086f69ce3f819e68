//! The event loop driving one [`ConnectionManager`] on tokio.

use std::time::Duration;

use parley_core::Scheduler;
use parley_core::logging::targets;
use parley_net::{ConnectionManager, SocketEvent, Transport, TransportEvent};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::command::ClientCommand;

/// How long `/quit` waits for the closing handshake of the last socket.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run `manager` until a [`ClientCommand::Quit`] arrives or the command
/// channel closes.
///
/// Transport events, user commands and the manager's next timer deadline
/// are awaited together; whichever is ready first is handed to the manager.
/// On exit the session is disconnected and the loop waits briefly for the
/// socket to finish closing.
pub async fn run_client<T, S>(
    manager: &mut ConnectionManager<T, S>,
    events: &mut UnboundedReceiver<TransportEvent>,
    commands: &mut UnboundedReceiver<ClientCommand>,
) where
    T: Transport,
    S: Scheduler,
{
    tracing::debug!(target: targets::CLIENT, "event loop started");

    loop {
        let next_timer = manager.time_until_next_timer();

        tokio::select! {
            Some(event) = events.recv() => manager.handle_event(event),

            command = commands.recv() => match command {
                Some(ClientCommand::Quit) | None => break,
                Some(command) => apply_command(manager, command),
            },

            _ = wait_for(next_timer) => manager.poll_timers(),
        }
    }

    tracing::debug!(target: targets::CLIENT, "event loop stopping");
    let closing = manager.current_socket();
    manager.disconnect();

    if let Some(socket) = closing {
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while let Some(event) = events.recv().await {
                if event.socket == socket && matches!(event.event, SocketEvent::Closed(_)) {
                    break;
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::debug!(target: targets::CLIENT, %socket, "socket did not close in time");
        }
    }
}

/// Hand one user command to the manager.
///
/// Failures have already been rendered by the manager, so they are only
/// logged here.
pub fn apply_command<T, S>(manager: &mut ConnectionManager<T, S>, command: ClientCommand)
where
    T: Transport,
    S: Scheduler,
{
    let result = match command {
        ClientCommand::Connect(conversation_id) => manager.connect(&conversation_id, false),
        ClientCommand::Disconnect => {
            manager.disconnect();
            Ok(())
        }
        ClientCommand::Send(payload) => manager.send(&payload),
        ClientCommand::Quit => Ok(()),
    };

    if let Err(err) = result {
        tracing::debug!(target: targets::CLIENT, error = %err, "command refused");
    }
}

async fn wait_for(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
