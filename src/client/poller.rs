use super::RoomClient;
use crate::types::{GameRoom, Millis, PlayerId, RoomId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A room as seen by one player
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room: GameRoom,
    pub is_host: bool,
    pub is_imposter: bool,
}

impl RoomView {
    fn new(room: GameRoom, player_id: &str) -> Self {
        let is_host = room.is_host(player_id);
        let is_imposter = room.player(player_id).is_some_and(|p| p.is_imposter);
        Self {
            room,
            is_host,
            is_imposter,
        }
    }
}

/// Why polling stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEnd {
    RoomGone,
    Kicked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// No snapshot fetched yet
    Waiting,
    Active(RoomView),
    Ended(PollEnd),
}

impl PollState {
    fn held_stamp(&self) -> Option<Millis> {
        match self {
            PollState::Active(view) => view.room.last_updated,
            _ => None,
        }
    }
}

/// Background task keeping a [`RoomView`] current
///
/// Dropping the poller stops the task.
pub struct RoomPoller {
    tx: Arc<watch::Sender<PollState>>,
    player_id: PlayerId,
    task: JoinHandle<()>,
}

impl RoomPoller {
    pub fn spawn(client: RoomClient, room_id: RoomId, player_id: PlayerId, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(PollState::Waiting);
        let tx = Arc::new(tx);

        let task = tokio::spawn(poll_loop(client, room_id, player_id.clone(), interval, tx.clone()));

        Self { tx, player_id, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PollState {
        self.tx.borrow().clone()
    }

    /// Feed in a room obtained elsewhere, e.g. the response to an action
    pub fn offer(&self, room: GameRoom) {
        publish(&self.tx, &self.player_id, room);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RoomPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Publish a snapshot unless it is older than the one held.
/// Returns the end reason once polling should stop.
fn publish(tx: &watch::Sender<PollState>, player_id: &str, room: GameRoom) -> Option<PollEnd> {
    let mut ended = None;
    tx.send_if_modified(|state| {
        if let PollState::Ended(reason) = state {
            ended = Some(*reason);
            return false;
        }
        if let (Some(held), Some(incoming)) = (state.held_stamp(), room.last_updated) {
            if incoming < held {
                tracing::debug!(held, incoming, "Ignoring stale room snapshot");
                return false;
            }
        }

        *state = if room.player(player_id).is_some() {
            PollState::Active(RoomView::new(room, player_id))
        } else {
            ended = Some(PollEnd::Kicked);
            PollState::Ended(PollEnd::Kicked)
        };
        true
    });
    ended
}

async fn poll_loop(
    client: RoomClient,
    room_id: RoomId,
    player_id: PlayerId,
    interval: Duration,
    tx: Arc<watch::Sender<PollState>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let since = tx.borrow().held_stamp();
        match client.get_room_since(&room_id, since).await {
            Ok(None) => {}
            Ok(Some(room)) => {
                if let Some(reason) = publish(&tx, &player_id, room) {
                    tracing::info!(room = %room_id, ?reason, "Stopped polling");
                    return;
                }
            }
            Err(e) if e.status() == Some(404) => {
                tracing::info!(room = %room_id, "Room no longer exists");
                tx.send_replace(PollState::Ended(PollEnd::RoomGone));
                return;
            }
            Err(e) => {
                tracing::warn!(room = %room_id, "Room poll failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn snapshot(stamp: Millis, players: &[&str]) -> GameRoom {
        let mut room = GameRoom::new(
            "room_ABC234".to_string(),
            Player::new(players[0].to_string(), "Host".to_string()),
        );
        for id in &players[1..] {
            room.players.push(Player::new(id.to_string(), "P".to_string()));
        }
        room.last_updated = Some(stamp);
        room
    }

    #[test]
    fn test_publish_ignores_older_snapshots() {
        let (tx, rx) = watch::channel(PollState::Waiting);

        assert_eq!(publish(&tx, "player_b", snapshot(200, &["player_a", "player_b"])), None);
        assert_eq!(rx.borrow().held_stamp(), Some(200));

        publish(&tx, "player_b", snapshot(100, &["player_a", "player_b"]));
        assert_eq!(rx.borrow().held_stamp(), Some(200));

        publish(&tx, "player_b", snapshot(300, &["player_a", "player_b"]));
        assert_eq!(rx.borrow().held_stamp(), Some(300));
    }

    #[test]
    fn test_publish_detects_kick() {
        let (tx, rx) = watch::channel(PollState::Waiting);
        publish(&tx, "player_b", snapshot(100, &["player_a", "player_b"]));

        let end = publish(&tx, "player_b", snapshot(200, &["player_a"]));
        assert_eq!(end, Some(PollEnd::Kicked));
        assert_eq!(*rx.borrow(), PollState::Ended(PollEnd::Kicked));

        // nothing revives an ended poller
        let end = publish(&tx, "player_b", snapshot(300, &["player_a", "player_b"]));
        assert_eq!(end, Some(PollEnd::Kicked));
    }

    #[test]
    fn test_view_flags() {
        let mut room = snapshot(100, &["player_a", "player_b"]);
        room.players[1].is_imposter = true;

        let host_view = RoomView::new(room.clone(), "player_a");
        assert!(host_view.is_host);
        assert!(!host_view.is_imposter);

        let imposter_view = RoomView::new(room, "player_b");
        assert!(!imposter_view.is_host);
        assert!(imposter_view.is_imposter);
    }
}
