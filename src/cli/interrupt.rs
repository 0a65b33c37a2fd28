use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Routes Ctrl-C for the terminal session: the first press during a round
/// trip cancels that round trip, a press while idle ends the session.
#[derive(Default)]
pub struct InterruptRouter {
    current: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl InterruptRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn begin_request(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock().await = Some(token.clone());
        token
    }

    pub async fn end_request(&self) {
        self.current.lock().await.take();
    }

    pub async fn interrupt(&self) {
        match self.current.lock().await.take() {
            Some(token) => token.cancel(),
            None => self.shutdown.cancel(),
        }
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
