// src/processor.rs
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};
use chrono::Datelike;
use signal_hook::{flag, iterator::Signals};
use tracing::{debug, error, info, warn};
use crate::dispatch::dispatch;
use crate::event::{classify, Event};
use crate::gate::ReplayGate;
use crate::geoip::CountryLookup;
use crate::line::{parse_timestamp, split_line};
use crate::notify::Notifier;

/// Lines of a followed log file. Stops the underlying `tail` on drop.
pub struct LogFollower {
    child: Arc<Mutex<Child>>,
    lines: Lines<BufReader<ChildStdout>>,
}

/// Kills a follower's `tail` from another thread, ending its line stream.
#[derive(Clone)]
pub struct FollowStopper {
    child: Arc<Mutex<Child>>,
}

impl FollowStopper {
    pub fn stop(&self) {
        if let Ok(mut child) = self.child.lock() {
            let _ = child.kill();
        }
    }
}

impl LogFollower {
    pub fn stopper(&self) -> FollowStopper {
        FollowStopper { child: Arc::clone(&self.child) }
    }
}

impl Iterator for LogFollower {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

impl Drop for LogFollower {
    fn drop(&mut self) {
        if let Ok(mut child) = self.child.lock() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Follow `path` from its first line, across rotation and truncation.
pub fn follow_log(path: &Path) -> io::Result<LogFollower> {
    // Fail now if the log is unreadable; `tail -F` would just wait for it.
    File::open(path)?;

    let mut child = Command::new("tail")
        .args(["-n", "+1", "-F"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No stdout"))?;

    Ok(LogFollower {
        child: Arc::new(Mutex::new(child)),
        lines: BufReader::new(stdout).lines(),
    })
}

/// Raise `shutdown` and stop the follower on the first of `signals`.
///
/// Reads on the `tail` pipe restart after a handled signal, so the flag alone
/// would not wake an idle pipeline; killing `tail` hands it EOF instead. A
/// second signal terminates the process outright.
pub fn stop_on_signals(
    signals: &[i32],
    stopper: FollowStopper,
    shutdown: Arc<AtomicBool>,
) -> io::Result<()> {
    for &sig in signals {
        flag::register_conditional_shutdown(sig, 1, Arc::clone(&shutdown))?;
        flag::register(sig, Arc::clone(&shutdown))?;
    }

    let mut incoming = Signals::new(signals)?;
    thread::spawn(move || {
        if let Some(sig) = incoming.forever().next() {
            info!("received signal {}, stopping log follower", sig);
            shutdown.store(true, Ordering::Relaxed);
            stopper.stop();
        }
    });
    Ok(())
}

/// Drives raw lines through gate, classification, enrichment and dispatch.
pub struct Pipeline<L, N> {
    gate: ReplayGate,
    year: i32,
    lookup: L,
    notifier: N,
}

impl<L: CountryLookup, N: Notifier> Pipeline<L, N> {
    pub fn new(gate: ReplayGate, lookup: L, notifier: N) -> Self {
        let year = gate.start().year();
        Self { gate, year, lookup, notifier }
    }

    #[cfg(test)]
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle one log line, returning the event that was dispatched, if any.
    pub fn process_line(&mut self, line: &str) -> Option<Event> {
        let raw = split_line(line)?;

        let ts = match parse_timestamp(&raw.timestamp_text, self.year) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("{}", e);
                return None;
            }
        };

        let replaying = self.gate.is_suppressing();
        if !self.gate.admit(&ts) {
            debug!("suppressed replayed record from {}", raw.timestamp_text);
            return None;
        }
        if replaying {
            info!("caught up with live log at {}", raw.timestamp_text);
        }

        let mut event = match classify(&raw) {
            Some(ev) => ev,
            None => {
                debug!(unit = raw.unit, "no event in record");
                return None;
            }
        };

        if let Event::Session(session) = &mut event {
            session.country = self.lookup.lookup(&session.source_ip);
        }

        dispatch(&event, &self.notifier);
        Some(event)
    }

    /// Consume `lines` until the source ends, fails, or `shutdown` is raised.
    pub fn run<I>(&mut self, lines: I, shutdown: &AtomicBool) -> io::Result<()>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        for line in lines {
            if shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping");
                return Ok(());
            }
            let line = line.map_err(|e| {
                error!("log source failed: {}", e);
                e
            })?;
            self.process_line(&line);
        }
        if shutdown.load(Ordering::Relaxed) {
            info!("shutdown requested, stopping");
        }
        Ok(())
    }
}
