//! Turn countdown
//!
//! A `TurnTimer` is a background task that feeds one `TimerTick` command per
//! interval into the coordinator's mailbox. It never touches session state
//! itself: the tick is applied in order with every other command for the
//! room, so a timeout can never interleave with a manual call.
//!
//! One timer covers one turn. Every tick is stamped with that turn's
//! sequence number; a new turn gets a freshly spawned timer, so its first
//! tick lands a full period after the turn began.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::server::ServerCommand;
use crate::types::{RoomCode, SessionId};

/// Handle to a running countdown task.
///
/// Cancelling is idempotent; dropping the handle cancels as well.
#[derive(Debug)]
pub struct TurnTimer {
    turn: u64,
    task: Option<JoinHandle<()>>,
}

impl TurnTimer {
    /// Start ticking every `period` for turn `turn` of the given session.
    ///
    /// The first tick fires one full period after spawning.
    pub fn spawn(
        room_code: RoomCode,
        session_id: SessionId,
        turn: u64,
        period: Duration,
        commands: mpsc::Sender<ServerCommand>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let tick = ServerCommand::TimerTick {
                    room_code: room_code.clone(),
                    session_id,
                    turn,
                };
                if commands.send(tick).await.is_err() {
                    debug!("Server closed, stopping timer for room {}", room_code);
                    break;
                }
            }
        });

        Self {
            turn,
            task: Some(task),
        }
    }

    /// Turn sequence number this timer ticks for
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Stop the countdown. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_sends_ticks() {
        let (tx, mut rx) = mpsc::channel(8);
        let code = RoomCode::from_string("ABC123".to_string());
        let session_id = SessionId::new();
        let timer = TurnTimer::spawn(code.clone(), session_id, 4, Duration::from_secs(1), tx);
        assert_eq!(timer.turn(), 4);

        for _ in 0..3 {
            match rx.recv().await {
                Some(ServerCommand::TimerTick {
                    room_code,
                    session_id: sid,
                    turn,
                }) => {
                    assert_eq!(room_code, code);
                    assert_eq!(sid, session_id);
                    assert_eq!(turn, 4);
                }
                other => panic!("unexpected command: {:?}", other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let start = Instant::now();
        let _timer = TurnTimer::spawn(
            RoomCode::from_string("ABC123".to_string()),
            SessionId::new(),
            1,
            Duration::from_secs(1),
            tx,
        );

        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_ticks() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timer = TurnTimer::spawn(
            RoomCode::from_string("ABC123".to_string()),
            SessionId::new(),
            1,
            Duration::from_secs(1),
            tx,
        );
        assert!(timer.is_active());

        timer.cancel();
        timer.cancel();
        assert!(!timer.is_active());

        // The aborted task drops the only sender, closing the channel
        assert!(rx.recv().await.is_none());
    }
}
