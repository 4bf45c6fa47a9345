//! Inbound command channel.
//!
//! A bounded `embassy-sync` MPMC channel bridges the transport adapters
//! (socket relay, serial console) with the synchronous control loop. The
//! producers run in whatever context the adapter lives in; the control loop
//! drains the channel once per iteration.
//!
//! ```text
//! ┌──────────────┐  BrewCommand  ┌───────────────┐
//! │  transport   │──────────────▶│  control loop │
//! │  adapters    │               │  (sync)       │
//! └──────────────┘               └───────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::commands::BrewCommand;

/// Channel depth for inbound commands.
const CMD_DEPTH: usize = 8;

/// Inbound command channel: adapters → control loop.
pub static CMD_CHANNEL: Channel<CriticalSectionRawMutex, BrewCommand, CMD_DEPTH> = Channel::new();

/// Enqueue a command without blocking. Returns `false` if the queue is full
/// (the command is dropped — the sender should surface that to the user).
pub fn try_send_command(cmd: BrewCommand) -> bool {
    CMD_CHANNEL.try_send(cmd).is_ok()
}

/// Drain every pending command into the handler, FIFO order.
pub fn drain_commands(mut handler: impl FnMut(BrewCommand)) {
    while let Ok(cmd) = CMD_CHANNEL.try_receive() {
        handler(cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // Links the std critical-section implementation into the test binary.
    use critical_section as _;

    #[test]
    fn commands_drain_in_fifo_order() {
        assert!(try_send_command(BrewCommand::StartBrew));
        assert!(try_send_command(BrewCommand::Quit));

        let mut seen = Vec::new();
        drain_commands(|cmd| seen.push(format!("{cmd:?}")));
        assert_eq!(seen, vec!["StartBrew".to_string(), "Quit".to_string()]);

        // Channel is empty afterwards.
        let mut empty = true;
        drain_commands(|_| empty = false);
        assert!(empty);
    }
}
