use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    Registered { user_id: Uuid, email: String },
}

/// Fire-and-forget side channel for account events.
#[derive(Clone)]
pub struct EventSender(UnboundedSender<AuthEvent>);

impl EventSender {
    pub fn channel() -> (Self, UnboundedReceiver<AuthEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub fn emit(&self, event: AuthEvent) {
        if self.0.send(event).is_err() {
            debug!("no event listener; event dropped");
        }
    }
}

pub fn spawn_listener(mut rx: UnboundedReceiver<AuthEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AuthEvent::Registered { user_id, email } => {
                    info!(%user_id, %email, "registered event");
                }
            }
        }
    })
}
