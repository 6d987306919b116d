// Build-time version from Cargo.toml, and the gateway versions we know how to talk to

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Oldest gateway release with the IO stats RPC.
pub const MIN_GATEWAY_VERSION: (u32, u32, u32) = (1, 0, 0);

pub fn min_gateway_version() -> String {
    let (major, minor, patch) = MIN_GATEWAY_VERSION;
    format!("{major}.{minor}.{patch}")
}

/// "major.minor.patch"; a missing minor or patch counts as 0 and any pre-release suffix is ignored.
pub fn parse_version(s: &str) -> Option<(u32, u32, u32)> {
    let core = s.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    let patch = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Unparseable versions are treated as unsupported.
pub fn gateway_version_supported(version: &str) -> bool {
    parse_version(version).is_some_and(|v| v >= MIN_GATEWAY_VERSION)
}
