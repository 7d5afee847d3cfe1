//! Defines the GPIO-Sensors runtime task runner.
use std::future::Future;

use log::error;
use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::OnceCell;
use tokio::task;
use tokio::task::JoinHandle;

use crate::errors::{Error, RuntimeError, Unknown};

/// Represents the result of a task.
/// A task may return either () or Result<(), Error> for flexibility which
/// will be converted to TaskResult sent to the runtime.
pub enum TaskResult {
    Ok,
    Err(Error),
}

/// Represents a handler for a task: a monitoring loop can be aborted through it.
pub type TaskHandler = JoinHandle<Result<(), Error>>;

type TaskChannel = UnboundedReceiver<UnboundedReceiver<TaskResult>>;

/// Globally accessible runtime transmitter(TX)/receiver(RX) (not initialised yet)
pub static RUNTIME_TX: OnceCell<Mutex<Option<UnboundedSender<UnboundedReceiver<TaskResult>>>>> =
    OnceCell::const_new();
pub static RUNTIME_RX: OnceCell<tokio::sync::Mutex<Option<TaskChannel>>> = OnceCell::const_new();

impl From<Result<(), Error>> for TaskResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(_) => TaskResult::Ok,
            Err(e) => TaskResult::Err(e),
        }
    }
}

impl From<()> for TaskResult {
    fn from(_: ()) -> Self {
        TaskResult::Ok
    }
}

/// Initializes the global task channel (done by `#[gpio_sensors::runtime]`).
pub async fn init_task_channel() {
    RUNTIME_RX
        .get_or_init(|| async {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<UnboundedReceiver<TaskResult>>();

            RUNTIME_TX
                .get_or_init(|| async { Mutex::new(Some(tx)) })
                .await;

            tokio::sync::Mutex::new(Some(rx))
        })
        .await;
}

/// Waits for every task started with [`run`] to be done (done by `#[gpio_sensors::runtime]`).
///
/// A task aborted through its [`TaskHandler`] counts as done.
pub async fn join_all() {
    let Some(cell) = RUNTIME_RX.get() else {
        return;
    };
    let mut lock = cell.lock().await;
    let Some(receiver) = lock.as_mut() else {
        return;
    };

    while receiver.len() > 0 {
        // We receive the task specific receiver...
        if let Some(mut task_receiver) = receiver.recv().await {
            // ...and the task result through that new receiver.
            if let Some(TaskResult::Err(err)) = task_receiver.recv().await {
                error!("Task failed: {}", err);
            }
        }
    }
}

/// Runs a given future as a Tokio task while ensuring the main function (marked by
/// `#[gpio_sensors::runtime]`) will not finish before all running tasks are done.
/// This is done by using a globally accessible channel to communicate the handlers to be
/// waited by the runtime.
///
/// # Parameters
/// * `future`: A future that implements `Future<Output = ()>`, `Send`, and has a `'static` lifetime.
///
/// # Errors
/// * `RuntimeError`: the task channel is not initialized (no runtime).
/// * `Unknown`: sending the task handle to the runtime failed.
///
/// # Example
/// ```ignore
/// use gpio_sensors::utils::task;
///
/// #[gpio_sensors::runtime]
/// async fn main() {
///     task::run(async move {
///         // whatever
///     }).unwrap();
/// }
/// ```
pub fn run<F, T>(future: F) -> Result<TaskHandler, Error>
where
    F: Future<Output = T> + Send + 'static,
    T: Into<TaskResult> + Send + 'static,
{
    // Create a transmitter(tx)/receiver(rx) unique to this task.
    let (task_tx, task_rx) = tokio::sync::mpsc::unbounded_channel();

    let cell = RUNTIME_TX.get().ok_or(RuntimeError)?;
    let mut lock = cell.lock();
    let runtime_tx = lock.as_mut().ok_or(RuntimeError)?;

    let handler = task::spawn(async move {
        let result = future.await.into();
        task_tx.send(result).map_err(|err| Unknown {
            info: err.to_string(),
        })?;
        Ok(())
    });

    // Send the receiver(rx) side of the task-channel to the runtime.
    runtime_tx.send(task_rx).map_err(|err| Unknown {
        info: err.to_string(),
    })?;

    Ok(handler)
}

#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        tokio::time::sleep(tokio::time::Duration::from_millis($ms as u64)).await
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    use crate::errors::{Error, Unknown};
    use crate::utils::task;

    #[gpio_sensors_macros::test]
    async fn test_task_abort_execution() {
        let flag = Arc::new(AtomicU8::new(0));
        let flag_clone = flag.clone();

        task::run(async move {
            pause!(100);
            flag_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("Should not panic");

        pause!(50);
        assert_eq!(
            flag.load(Ordering::SeqCst),
            0,
            "Flag should not be updated by the task before 100ms",
        );

        pause!(100);
        assert_eq!(
            flag.load(Ordering::SeqCst),
            1,
            "Flag should be updated by the task after 100ms",
        );

        // Same test but aborting: this is how a sensor stops its monitoring loop.
        let flag_clone = flag.clone();
        let handler = task::run(async move {
            pause!(100);
            flag_clone.fetch_add(1, Ordering::SeqCst);
        })
        .expect("Should not panic");

        pause!(50);
        handler.abort();

        pause!(100);
        assert_eq!(
            flag.load(Ordering::SeqCst),
            1,
            "Flag should not be updated by an aborted task",
        );
    }

    #[gpio_sensors_macros::test]
    async fn test_task_with_result() {
        let task = task::run(async move { Ok::<(), Error>(()) });
        assert!(task.is_ok(), "An Ok(()) task do not panic the runtime");

        let task = task::run(async move {
            Err::<(), Error>(Unknown {
                info: "wow panic!".to_string(),
            })
        });
        assert!(task.is_ok(), "A failing task do not panic the runtime");
    }
}
