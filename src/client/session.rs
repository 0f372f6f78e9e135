use crate::core::ChatError;
use crate::types::StreamingChatMessage;
use futures::{Future, StreamExt};
use log::error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::MessageStream;

/// Receives the typed events of one streaming session.
///
/// All calls arrive on the session's task, in wire order. Exactly one of
/// `on_complete`/`on_error` is invoked per session, after the last
/// `on_message`, unless the session is cancelled first, in which case no
/// callback fires at all from that point on.
pub trait ChatEventHandler: Send + 'static {
    /// One decoded stream record.
    fn on_message(&mut self, message: StreamingChatMessage);
    /// Terminal failure of the session.
    fn on_error(&mut self, error: ChatError);
    /// Terminal success of the session.
    fn on_complete(&mut self);
}

/// Adapter turning three closures into a [`ChatEventHandler`].
pub struct Callbacks {
    on_message: Box<dyn FnMut(StreamingChatMessage) + Send>,
    on_error: Box<dyn FnMut(ChatError) + Send>,
    on_complete: Box<dyn FnMut() + Send>,
}

impl Callbacks {
    pub fn new(
        on_message: impl FnMut(StreamingChatMessage) + Send + 'static,
        on_error: impl FnMut(ChatError) + Send + 'static,
        on_complete: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_error: Box::new(on_error),
            on_complete: Box::new(on_complete),
        }
    }
}

impl ChatEventHandler for Callbacks {
    fn on_message(&mut self, message: StreamingChatMessage) {
        (self.on_message)(message);
    }

    fn on_error(&mut self, error: ChatError) {
        (self.on_error)(error);
    }

    fn on_complete(&mut self) {
        (self.on_complete)();
    }
}

/// How a session reached its terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The stream finished and `on_complete` fired
    Completed,
    /// The session failed and `on_error` fired
    Errored,
    /// Cancelled before a terminal callback; none fired
    Cancelled,
}

/// Cancel handle for one streaming session.
///
/// Dropping the handle does not cancel the session; cancellation is always
/// an explicit [`cancel`](Self::cancel) call. Each handle owns its own
/// token, so concurrent sessions never interfere.
#[derive(Debug)]
pub struct StreamHandle {
    token: CancellationToken,
    task: JoinHandle<SessionOutcome>,
}

impl StreamHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<SessionOutcome>) -> Self {
        Self { token, task }
    }

    /// Requests cancellation: the in-flight network operation is aborted,
    /// any pending read unblocks, and no further callbacks fire. Records
    /// already decoded but not yet delivered are discarded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Detached handle for requesting cancellation from another task,
    /// for example a signal watcher.
    pub fn canceller(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the session task to finish and reports its outcome.
    pub async fn join(&mut self) -> SessionOutcome {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Session task failed: {e}");
                SessionOutcome::Errored
            }
        }
    }
}

/// Drives one session from transport open to its terminal state.
///
/// The cancellation arm is polled first at every suspension point, and the
/// token is re-checked before every dispatch, so a cancel wins over records
/// that were already buffered.
pub(crate) async fn run_session<F, H>(
    open: F,
    mut handler: H,
    token: CancellationToken,
) -> SessionOutcome
where
    F: Future<Output = Result<MessageStream, ChatError>> + Send,
    H: ChatEventHandler,
{
    let mut stream = tokio::select! {
        biased;
        _ = token.cancelled() => return SessionOutcome::Cancelled,
        opened = open => match opened {
            Ok(stream) => stream,
            Err(error) => {
                // An abort provoked by cancel must not surface as a failure
                if token.is_cancelled() {
                    return SessionOutcome::Cancelled;
                }
                handler.on_error(error);
                return SessionOutcome::Errored;
            }
        },
    };

    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => return SessionOutcome::Cancelled,
            item = stream.next() => item,
        };
        if token.is_cancelled() {
            return SessionOutcome::Cancelled;
        }

        match item {
            Some(Ok(message)) => handler.on_message(message),
            Some(Err(error)) => {
                handler.on_error(error);
                return SessionOutcome::Errored;
            }
            None => {
                handler.on_complete();
                return SessionOutcome::Completed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder {
        inner: Arc<Mutex<RecorderInner>>,
    }

    #[derive(Default)]
    struct RecorderInner {
        messages: Vec<StreamingChatMessage>,
        errors: Vec<String>,
        completions: usize,
    }

    impl Recorder {
        fn messages(&self) -> Vec<StreamingChatMessage> {
            self.inner.lock().unwrap().messages.clone()
        }

        fn errors(&self) -> Vec<String> {
            self.inner.lock().unwrap().errors.clone()
        }

        fn completions(&self) -> usize {
            self.inner.lock().unwrap().completions
        }

        fn is_empty(&self) -> bool {
            let inner = self.inner.lock().unwrap();
            inner.messages.is_empty() && inner.errors.is_empty() && inner.completions == 0
        }
    }

    impl ChatEventHandler for Recorder {
        fn on_message(&mut self, message: StreamingChatMessage) {
            self.inner.lock().unwrap().messages.push(message);
        }

        fn on_error(&mut self, error: ChatError) {
            self.inner.lock().unwrap().errors.push(error.to_string());
        }

        fn on_complete(&mut self) {
            let mut inner = self.inner.lock().unwrap();
            assert!(inner.errors.is_empty(), "on_complete after on_error");
            inner.completions += 1;
        }
    }

    fn content(id: &str, text: &str) -> StreamingChatMessage {
        StreamingChatMessage::Content {
            id: id.to_string(),
            content: text.to_string(),
        }
    }

    fn stream_of(items: Vec<Result<StreamingChatMessage, ChatError>>) -> MessageStream {
        Box::pin(tokio_stream::iter(items))
    }

    #[tokio::test]
    async fn test_messages_dispatch_in_order_then_complete() {
        let recorder = Recorder::default();
        let items = vec![Ok(content("1", "Hel")), Ok(content("1", "lo"))];

        let outcome = run_session(
            async move { Ok(stream_of(items)) },
            recorder.clone(),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(recorder.messages(), vec![content("1", "Hel"), content("1", "lo")]);
        assert_eq!(recorder.completions(), 1);
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_is_terminal() {
        let recorder = Recorder::default();
        let items = vec![
            Ok(content("1", "partial")),
            Err(ChatError::Stream("connection reset".to_string())),
        ];

        let outcome = run_session(
            async move { Ok(stream_of(items)) },
            recorder.clone(),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Errored);
        assert_eq!(recorder.messages().len(), 1);
        assert_eq!(recorder.errors().len(), 1);
        assert_eq!(recorder.completions(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_reports_error() {
        let recorder = Recorder::default();

        let outcome = run_session(
            async move {
                Err(ChatError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                })
            },
            recorder.clone(),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Errored);
        assert!(recorder.messages().is_empty());
        assert_eq!(recorder.errors().len(), 1);
        assert!(recorder.errors()[0].contains("503"));
    }

    #[tokio::test]
    async fn test_cancel_before_open_suppresses_everything() {
        let recorder = Recorder::default();
        let token = CancellationToken::new();
        token.cancel();

        let items = vec![Ok(content("1", "never seen"))];
        let outcome = run_session(
            async move { Ok(stream_of(items)) },
            recorder.clone(),
            token,
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert!(recorder.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_stops_callbacks() {
        let recorder = Recorder::default();
        let token = CancellationToken::new();

        let items = vec![Ok(content("1", "first"))];
        let stream: MessageStream =
            Box::pin(tokio_stream::iter(items).chain(futures::stream::pending()));

        let task = tokio::spawn(run_session(
            async move { Ok(stream) },
            recorder.clone(),
            token.clone(),
        ));

        // Let the first record land, then cancel while the read is pending
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let outcome = task.await.unwrap();
        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert_eq!(recorder.messages().len(), 1);
        assert!(recorder.errors().is_empty());
        assert_eq!(recorder.completions(), 0);
    }

    #[tokio::test]
    async fn test_cancel_failed_open_is_not_an_error() {
        let recorder = Recorder::default();
        let token = CancellationToken::new();
        let open_token = token.clone();

        let outcome = run_session(
            async move {
                // Simulates a transport abort provoked by the cancel itself
                open_token.cancel();
                Err(ChatError::Stream("request aborted".to_string()))
            },
            recorder.clone(),
            token,
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert!(recorder.is_empty());
    }

    #[tokio::test]
    async fn test_callbacks_adapter_routes_closures() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let messages = seen.clone();
        let errors = seen.clone();
        let completions = seen.clone();

        let handler = Callbacks::new(
            move |message| {
                messages
                    .lock()
                    .unwrap()
                    .push(format!("message:{}", message.kind_name()));
            },
            move |error| errors.lock().unwrap().push(format!("error:{error}")),
            move || completions.lock().unwrap().push("complete".to_string()),
        );

        let items = vec![Ok(content("1", "hi"))];
        let outcome = run_session(
            async move { Ok(stream_of(items)) },
            handler,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["message:content".to_string(), "complete".to_string()]
        );
    }
}
