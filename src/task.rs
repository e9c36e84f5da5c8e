//! Named OS-thread spawning for the stage tasks.
//!
//! Each stage runs on its own thread so the OS scheduler preempts them
//! independently, matching three equal-priority tasks under an RTOS.  The
//! only suspension points are the sampler's timed sleep and the mailbox
//! waits of the filter and actuator.

use std::thread::JoinHandle;

use log::info;

use crate::error::{Error, Result};

/// Spawn `f` on a dedicated thread named `name` with a `stack_kb` KiB stack.
pub fn spawn_task<T: Send + 'static>(
    name: &'static str,
    stack_kb: usize,
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<JoinHandle<T>> {
    info!("Spawning '{}' (stack={}KB)", name, stack_kb);

    let stack_bytes = stack_kb.checked_mul(1024).ok_or_else(|| {
        log::error!("task: stack of {} KB for '{}' overflows", stack_kb, name);
        Error::Spawn(name)
    })?;

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_bytes)
        .spawn(f)
        .map_err(|e| {
            log::error!("task: spawn '{}' failed: {}", name, e);
            Error::Spawn(name)
        })
}
