use std::io;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::host::{HostNotification, HostSubscription, NotificationSender, TerminalHost};

/// Host backed by the process's controlling terminal.
///
/// Size comes from crossterm; resize and termination notifications come
/// from tokio signal streams, so subscribing requires a running tokio
/// runtime. Without one the subscriptions are inert and a warning is logged.
#[derive(Debug, Default)]
pub struct StdTerminalHost;

impl StdTerminalHost {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_watcher<F>(what: &str, task: F) -> HostSubscription
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            let join: JoinHandle<()> = handle.spawn(task);
            HostSubscription::new(move || join.abort())
        }
        Err(_) => {
            log::warn!("No tokio runtime available; {} notifications are disabled", what);
            HostSubscription::noop()
        }
    }
}

impl TerminalHost for StdTerminalHost {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    #[cfg(unix)]
    fn subscribe_resize(&mut self, notify: NotificationSender) -> HostSubscription {
        use tokio::signal::unix::{SignalKind, signal};

        spawn_watcher("resize", async move {
            let mut winch = match signal(SignalKind::window_change()) {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("Failed to subscribe to SIGWINCH: {}", e);
                    return;
                }
            };
            while winch.recv().await.is_some() {
                if notify.send(HostNotification::Resize).is_err() {
                    break;
                }
            }
        })
    }

    #[cfg(not(unix))]
    fn subscribe_resize(&mut self, _notify: NotificationSender) -> HostSubscription {
        log::debug!("Resize notifications are not supported on this platform");
        HostSubscription::noop()
    }

    #[cfg(unix)]
    fn on_termination_signal(&mut self, notify: NotificationSender) -> HostSubscription {
        use tokio::signal::unix::{SignalKind, signal};

        spawn_watcher("termination", async move {
            let streams = (signal(SignalKind::terminate()), signal(SignalKind::interrupt()));
            let (mut term, mut int) = match streams {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    log::error!("Failed to subscribe to termination signals: {}", e);
                    return;
                }
            };
            tokio::select! {
                _ = term.recv() => log::info!("Received SIGTERM"),
                _ = int.recv() => log::info!("Received SIGINT"),
            }
            let _ = notify.send(HostNotification::Terminate);
        })
    }

    #[cfg(not(unix))]
    fn on_termination_signal(&mut self, notify: NotificationSender) -> HostSubscription {
        spawn_watcher("termination", async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Received Ctrl-C");
                let _ = notify.send(HostNotification::Terminate);
            }
        })
    }
}
