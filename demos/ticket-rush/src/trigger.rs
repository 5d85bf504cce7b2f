//! How the start gate gets opened.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use clap::ValueEnum;
use tr_pool::WorkerPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TriggerKind {
    /// Open as soon as every worker thread is up.
    Immediate,
    /// Open after `--delay-secs`.
    Delay,
    /// Open when Enter is pressed.
    Manual,
}

#[derive(Clone, Copy, Debug)]
pub enum Trigger {
    Immediate,
    Delay(Duration),
    Manual,
}

impl Trigger {
    pub fn new(kind: TriggerKind, delay_secs: u64) -> Self {
        match kind {
            TriggerKind::Immediate => Trigger::Immediate,
            TriggerKind::Delay => Trigger::Delay(Duration::from_secs(delay_secs)),
            TriggerKind::Manual => Trigger::Manual,
        }
    }

    /// Block until the trigger condition holds, then open the pool's gate.
    pub fn fire(self, pool: &WorkerPool) -> io::Result<()> {
        match self {
            Trigger::Immediate => {}
            Trigger::Delay(d) => {
                println!("opening sale in {}s", d.as_secs());
                thread::sleep(d);
            }
            Trigger::Manual => {
                print!("{} buyers waiting; press Enter to open the sale ", pool.len());
                io::stdout().flush()?;
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
            }
        }
        pool.open_gate();
        Ok(())
    }
}
