//! The room actor: a single worker task serializing all room mutations.
//!
//! Every mutation of a [`BaseRoom`] goes through a bounded FIFO mailbox
//! of deferred units of work, drained by exactly one Tokio task. Callers
//! never touch the room directly; they submit closures. This is what
//! keeps the room single-writer without any lock around its state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use matchroom_protocol::MatchInfo;
use matchroom_session::SessionRef;
use tokio::sync::{mpsc, oneshot};

use crate::{ActorError, BaseRoom, GameRoom, RoomOptions, RoomStatus, StatusCell};

/// Mailbox capacity. Submissions beyond this fail fast with
/// [`ActorError::MailboxFull`] instead of blocking the caller.
pub const MAILBOX_CAPACITY: usize = 64;

/// A deferred unit of work executed on the room's worker.
type Job = Box<dyn FnOnce(&mut BaseRoom) + Send>;

enum Mail {
    Run(Job),
    Stop,
}

/// Handle to a room running behind a mailbox.
///
/// Cheap to share behind an `Arc`. The wrapped [`BaseRoom`] lives inside
/// the worker task; the handle keeps only the pieces that are safe to
/// read from anywhere (id, match info, the atomic status).
pub struct RoomActor {
    room_id: i64,
    match_info: Arc<MatchInfo>,
    status: StatusCell,
    mailbox: mpsc::Sender<Mail>,
    stopped: Arc<AtomicBool>,
}

impl std::fmt::Debug for RoomActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomActor")
            .field("room_id", &self.room_id)
            .field("status", &self.status)
            .field("stopped", &self.stopped.load(Ordering::Relaxed))
            .finish()
    }
}

impl RoomActor {
    /// Builds the room and spawns its worker task.
    pub fn spawn(room_id: i64, match_info: Arc<MatchInfo>, options: RoomOptions) -> Self {
        let room = BaseRoom::new(room_id, Arc::clone(&match_info), options);
        let status = room.status_cell();
        let (mailbox, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        tokio::spawn(run_room(room, receiver));
        Self {
            room_id,
            match_info,
            status,
            mailbox,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enqueues `work` without waiting for it to run.
    pub fn invoke<F>(&self, work: F) -> Result<(), ActorError>
    where
        F: FnOnce(&mut BaseRoom) + Send + 'static,
    {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ActorError::Stopped);
        }
        self.mailbox
            .try_send(Mail::Run(Box::new(work)))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => ActorError::MailboxFull,
                mpsc::error::TrySendError::Closed(_) => ActorError::Stopped,
            })
    }

    /// Enqueues `work` and waits for the worker to execute it, returning
    /// its result through a single-use completion slot.
    ///
    /// Safe to call from any task except the room's own worker (a job
    /// calling `sync_invoke` on its own actor would deadlock on itself).
    pub async fn sync_invoke<T, F>(&self, work: F) -> Result<T, ActorError>
    where
        F: FnOnce(&mut BaseRoom) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (done, result) = oneshot::channel();
        self.invoke(move |room| {
            let _ = done.send(work(room));
        })?;
        result.await.map_err(|_| ActorError::Stopped)
    }
}

impl GameRoom for RoomActor {
    fn room_id(&self) -> i64 {
        self.room_id
    }

    fn match_info(&self) -> Arc<MatchInfo> {
        Arc::clone(&self.match_info)
    }

    fn status(&self) -> RoomStatus {
        self.status.load()
    }

    async fn check(&self) -> bool {
        self.sync_invoke(|room| room.check()).await.unwrap_or(false)
    }

    async fn start(&self) -> Result<bool, ActorError> {
        self.sync_invoke(|room| room.start()).await
    }

    /// Closes the room and stops the worker.
    ///
    /// The close itself is a synchronous barrier: it queues behind all
    /// work already in the mailbox and waits for the worker to execute
    /// it, so in-flight operations finish before the room is gone. Only
    /// then is the stop marker delivered. Afterwards every submission
    /// fails with [`ActorError::Stopped`].
    async fn close(&self) {
        let (done, closed) = oneshot::channel();
        let queued = self
            .mailbox
            .send(Mail::Run(Box::new(move |room| {
                room.close();
                let _ = done.send(());
            })))
            .await
            .is_ok();
        if queued {
            let _ = closed.await;
        }
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.mailbox.send(Mail::Stop).await;
    }

    fn user_enter_room(
        &self,
        uid: i64,
        room_id: i64,
        session: Option<SessionRef>,
    ) -> Result<(), ActorError> {
        self.invoke(move |room| room.user_enter_room(uid, room_id, session))
    }

    fn user_leave_room(&self, uid: i64, room_id: i64) -> Result<(), ActorError> {
        self.invoke(move |room| room.user_leave_room(uid, room_id))
    }

    fn kick_user(&self, uid: i64) -> Result<(), ActorError> {
        self.invoke(move |room| room.kick_user(uid))
    }

    fn join_channel(
        &self,
        channel_id: &str,
        uid: i64,
        session: SessionRef,
    ) -> Result<(), ActorError> {
        let channel_id = channel_id.to_string();
        self.invoke(move |room| room.join_channel(&channel_id, uid, session))
    }

    fn leave_channel(&self, channel_id: &str, uid: i64) -> Result<(), ActorError> {
        let channel_id = channel_id.to_string();
        self.invoke(move |room| room.leave_channel(&channel_id, uid))
    }

    fn broadcast(&self, channel_id: &str, msg: Vec<u8>) -> Result<(), ActorError> {
        let channel_id = channel_id.to_string();
        self.invoke(move |room| room.broadcast(&channel_id, &msg))
    }
}

/// The worker loop: drain the mailbox in submission order until stopped.
async fn run_room(mut room: BaseRoom, mut mailbox: mpsc::Receiver<Mail>) {
    tracing::debug!(room_id = room.room_id(), "room actor started");
    while let Some(mail) = mailbox.recv().await {
        match mail {
            Mail::Run(work) => work(&mut room),
            Mail::Stop => break,
        }
    }
    tracing::debug!(room_id = room.room_id(), "room actor stopped");
}
