use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::auth::{Authenticator, HandshakeError, SetupOptions};
use crate::session::SessionContext;

/// What a consumer should render right now.
#[derive(Debug, Clone)]
pub enum ProviderView<P> {
    /// Handshake still running; show the caller's placeholder.
    Placeholder(P),
    /// Status is `ready` or `error`.
    Ready(SessionContext),
}

/// Owns one session context for the lifetime of a mount.
///
/// Mounting starts the handshake at most once no matter how many times it
/// is invoked; later calls are no-ops. Consumers read snapshots or
/// subscribe to changes but never write.
pub struct SessionProvider {
    authenticator: Authenticator,
    options: SetupOptions,
    context: watch::Sender<SessionContext>,
    mounted: AtomicBool,
}

impl SessionProvider {
    pub fn new(authenticator: Authenticator, options: SetupOptions) -> Self {
        let context = watch::Sender::new(SessionContext::new(authenticator.sdk().clone()));
        Self {
            authenticator,
            options,
            context,
            mounted: AtomicBool::new(false),
        }
    }

    /// Flip the latch. True only for the first caller.
    fn claim_mount(&self) -> bool {
        let first = self
            .mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !first {
            debug!("Session setup already started, ignoring repeated mount");
        }
        first
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Run setup in the current task. Returns false if it already ran.
    pub async fn mount(&self) -> bool {
        if !self.claim_mount() {
            return false;
        }
        self.authenticator.setup(&self.options, &self.context).await;
        true
    }

    /// Run setup on a background task.
    ///
    /// Returns `None` if setup was already started. A panic inside setup
    /// is recorded on the context like any other failure.
    pub fn spawn_mount(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.claim_mount() {
            return None;
        }

        let provider = Arc::clone(self);
        Some(tokio::spawn(async move {
            let inner = Arc::clone(&provider);
            let setup = tokio::spawn(async move {
                inner.authenticator.setup(&inner.options, &inner.context).await;
            });

            if let Err(e) = setup.await {
                let err = HandshakeError::Unknown(
                    e.is_panic().then(|| "Session setup task panicked".to_string()),
                );
                error!("Session setup task failed: {}", e);
                let message = err.user_message();
                provider.context.send_modify(|ctx| ctx.fail(message));
            }
        }))
    }

    /// Snapshot of the current context.
    pub fn context(&self) -> SessionContext {
        self.context.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionContext> {
        self.context.subscribe()
    }

    /// Wait for `ready` or `error` and return that context.
    pub async fn wait_until_settled(&self) -> SessionContext {
        let mut rx = self.context.subscribe();
        match rx.wait_for(|ctx| ctx.status().is_terminal()).await {
            Ok(ctx) => ctx.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.context(),
        }
    }

    pub fn view<P>(&self, placeholder: P) -> ProviderView<P> {
        let ctx = self.context();
        if ctx.status().is_terminal() {
            ProviderView::Ready(ctx)
        } else {
            ProviderView::Placeholder(placeholder)
        }
    }

    /// For an explicit re-authentication outside the mount.
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }
}
