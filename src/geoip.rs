// src/geoip.rs
use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Anything that can put a country name on an IP address.
pub trait CountryLookup {
    fn lookup(&self, ip: &str) -> Option<String>;
}

/// Country lookup through the `geoiplookup` command, when installed.
#[derive(Debug, Clone)]
pub struct GeoIpLookup {
    program: String,
    timeout: Duration,
}

impl GeoIpLookup {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program(crate::GEOIP_PROGRAM, timeout)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }

    /// Resolve the program to an executable path, the way a shell would.
    fn locate(&self) -> Option<PathBuf> {
        if self.program.contains('/') {
            let path = PathBuf::from(&self.program);
            return is_executable(&path).then_some(path);
        }
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| is_executable(candidate))
    }

    /// Run the program and collect stdout+stderr, killing it past the deadline.
    fn run(&self, program: &Path, ip: &str) -> Option<String> {
        let mut child = Command::new(program)
            .arg(ip)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| debug!("cannot spawn {}: {}", program.display(), e))
            .ok()?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => {
                    debug!("{} timed out for {}", self.program, ip);
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(e) => {
                    debug!("waiting on {} failed: {}", self.program, e);
                    return None;
                }
            }
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Some(text)
    }
}

impl CountryLookup for GeoIpLookup {
    fn lookup(&self, ip: &str) -> Option<String> {
        let program = self.locate()?;
        let out = self.run(&program, ip)?;
        let country = parse_geoip_output(&out);
        if country.is_none() {
            debug!("no country for {}: {:?}", ip, out.trim());
        }
        country
    }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Extract the country from a `<edition>: <country>` line.
pub fn parse_geoip_output(text: &str) -> Option<String> {
    let line = text.trim_end_matches('\n');
    let (_, country) = line.split_once(": ")?;

    if country.is_empty() || country.starts_with("can't") || country.starts_with("IP") {
        return None;
    }
    Some(country.to_string())
}
