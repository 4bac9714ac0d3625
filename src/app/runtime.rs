use crate::input::{InputAction, InputService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Start the thread that reads the terminal and feeds [`InputAction`]s to the event loop.
///
/// The thread owns the prompt editor, seeded with `initial_query`. It stops once it has
/// forwarded an accept or abort, when `shutdown` is set, when the loop drops its receiver, or
/// when polling the terminal fails.
pub fn spawn_input_thread(
    tx: UnboundedSender<InputAction>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
    initial_query: String,
    multi: bool,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut service = InputService::new(&initial_query, multi);
        while !shutdown.load(Ordering::SeqCst) {
            let actions = match service.poll_actions(Some(poll_interval)) {
                Ok(actions) => actions,
                Err(err) => {
                    log::error!("terminal input failed: {}", err);
                    return;
                }
            };
            for action in actions {
                let decisive = matches!(action, InputAction::Accept | InputAction::Abort);
                if tx.send(action).is_err() || decisive {
                    return;
                }
            }
        }
    })
}
