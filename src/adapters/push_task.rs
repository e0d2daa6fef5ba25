//! Push I/O task.
//!
//! Owns the [`HttpRemote`] (and through it the WiFi link) on a dedicated
//! thread pinned to PRO_CPU next to the network stack.  Each pass polls
//! the link, publishes its state to the [`Outbox`] and delivers whatever
//! the control loop queued.  A PUT that takes the full request timeout
//! only stalls this thread.

use std::io;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::adapters::remote::HttpRemote;
use crate::adapters::time::Esp32TimeAdapter;
use crate::adapters::wifi::ConnectivityPort;
use crate::app::ports::ClockPort;
use crate::drivers::task_pin::{Core, TaskSpec, spawn_on_core};
use crate::sync::outbox::{Outbox, deliver_pending};

/// Idle wait between passes when the queue is empty.
pub const IDLE_POLL_MS: u64 = 20;

pub const TASK: TaskSpec = TaskSpec {
    name: "push-io\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 12,
};

/// One pass: advance the link state machine, then drain the queue.
pub fn service<C: ConnectivityPort>(
    outbox: &Outbox,
    remote: &mut HttpRemote<C>,
    now_ms: u64,
) -> usize {
    remote.link_mut().poll(now_ms);
    deliver_pending(outbox, remote)
}

fn run<C: ConnectivityPort>(outbox: &Outbox, mut remote: HttpRemote<C>) {
    let clock = Esp32TimeAdapter::new();
    loop {
        if service(outbox, &mut remote, clock.uptime_ms()) == 0 {
            std::thread::sleep(Duration::from_millis(IDLE_POLL_MS));
        }
    }
}

/// Hand `remote` to a new push thread draining `outbox`.
pub fn spawn<C>(outbox: &'static Outbox, remote: HttpRemote<C>) -> io::Result<JoinHandle<()>>
where
    C: ConnectivityPort + Send + 'static,
{
    spawn_on_core(TASK, move || run(outbox, remote))
}
