//! Requested-version selection.
//!
//! Package managers expose the version a user asked for in different ways.
//! Each convention is one entry in [`VERSION_SIGNALS`]; [`select_version`]
//! walks the table in order and returns the first usable value. Supporting a
//! new package manager means adding an entry, not another branch.

use semver::Version;

/// Where a candidate version string comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    /// An environment variable set by the package manager.
    Env(&'static str),
    /// The first command-line argument containing `@` (e.g. `uzp-cli@1.0.6`).
    ArgWithAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSignal {
    pub name: &'static str,
    pub source: SignalSource,
}

/// Explicit "wanted version" variables first, then the version declared by
/// the package itself, then the command line.
pub const VERSION_SIGNALS: &[VersionSignal] = &[
    VersionSignal {
        name: "npm",
        source: SignalSource::Env("npm_config_wanted_version"),
    },
    VersionSignal {
        name: "yarn",
        source: SignalSource::Env("YARN_WANTED_VERSION"),
    },
    VersionSignal {
        name: "pnpm",
        source: SignalSource::Env("PNPM_WANTED_VERSION"),
    },
    VersionSignal {
        name: "bun",
        source: SignalSource::Env("BUN_WANTED_VERSION"),
    },
    VersionSignal {
        name: "package",
        source: SignalSource::Env("npm_package_version"),
    },
    VersionSignal {
        name: "argv",
        source: SignalSource::ArgWithAt,
    },
];

/// A version chosen from one of the signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedVersion {
    pub signal: &'static str,
    pub version: String,
}

/// Returns `None` when no signal names a version, meaning "install latest".
pub fn select_version<F>(lookup: F, args: &[String]) -> Option<SelectedVersion>
where
    F: Fn(&str) -> Option<String>,
{
    select_with(VERSION_SIGNALS, lookup, args)
}

pub fn select_with<F>(
    signals: &[VersionSignal],
    lookup: F,
    args: &[String],
) -> Option<SelectedVersion>
where
    F: Fn(&str) -> Option<String>,
{
    for signal in signals {
        let raw = match signal.source {
            SignalSource::Env(var) => lookup(var),
            SignalSource::ArgWithAt => args.iter().find(|arg| arg.contains('@')).cloned(),
        };

        let Some(raw) = raw else {
            continue;
        };

        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        if let Some(version) = extract_version(raw) {
            tracing::debug!(signal = signal.name, raw, "version signal matched");
            if version == "latest" {
                return None;
            }
            return Some(SelectedVersion {
                signal: signal.name,
                version,
            });
        }
    }

    None
}

/// `pkg@1.2.3` yields `1.2.3`; a bare dotted version is used verbatim.
/// A leading `@` is a scope marker, not a version separator.
fn extract_version(raw: &str) -> Option<String> {
    if let Some((name, version)) = raw.rsplit_once('@') {
        if !name.is_empty() && !version.is_empty() {
            return Some(version.to_string());
        }
    }

    if looks_like_version(raw) {
        return Some(raw.to_string());
    }

    None
}

pub fn looks_like_version(value: &str) -> bool {
    Version::parse(value.strip_prefix('v').unwrap_or(value)).is_ok()
}

/// Tags are published as `v1.2.3`.
pub fn to_tag(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

pub fn strip_tag(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

pub fn versions_match(left: &str, right: &str) -> bool {
    strip_tag(left.trim()) == strip_tag(right.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn select(pairs: &[(&str, &str)], args: &[&str]) -> Option<SelectedVersion> {
        let vars = env(pairs);
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        select_version(|name| vars.get(name).cloned(), &args)
    }

    #[test]
    fn nothing_set_means_latest() {
        assert_eq!(select(&[], &["install"]), None);
    }

    #[test]
    fn wanted_version_beats_package_version() {
        let selected = select(
            &[
                ("npm_package_version", "2.0.0"),
                ("PNPM_WANTED_VERSION", "1.0.6"),
            ],
            &[],
        )
        .expect("selected");
        assert_eq!(selected.version, "1.0.6");
        assert_eq!(selected.signal, "pnpm");
    }

    #[test]
    fn npm_wanted_version_is_first() {
        let selected = select(
            &[
                ("npm_config_wanted_version", "1.0.1"),
                ("YARN_WANTED_VERSION", "1.0.2"),
            ],
            &[],
        )
        .expect("selected");
        assert_eq!(selected.version, "1.0.1");
    }

    #[test]
    fn package_version_beats_argv() {
        let selected =
            select(&[("npm_package_version", "1.0.5")], &["uzp-cli@1.0.9"]).expect("selected");
        assert_eq!(selected.version, "1.0.5");
        assert_eq!(selected.signal, "package");
    }

    #[test]
    fn argv_suffix_is_extracted() {
        let selected = select(&[], &["install", "uzp-cli@1.0.6"]).expect("selected");
        assert_eq!(selected.version, "1.0.6");
        assert_eq!(selected.signal, "argv");
    }

    #[test]
    fn scoped_name_without_version_is_ignored() {
        assert_eq!(select(&[], &["@scope/uzp-cli"]), None);

        let selected = select(&[], &["@scope/uzp-cli@3.1.0"]).expect("selected");
        assert_eq!(selected.version, "3.1.0");
    }

    #[test]
    fn empty_and_non_version_values_fall_through() {
        let selected = select(
            &[
                ("npm_config_wanted_version", ""),
                ("YARN_WANTED_VERSION", "not-a-version"),
                ("BUN_WANTED_VERSION", "v1.2.3"),
            ],
            &[],
        )
        .expect("selected");
        assert_eq!(selected.version, "v1.2.3");
        assert_eq!(selected.signal, "bun");
    }

    #[test]
    fn explicit_latest_means_latest() {
        assert_eq!(select(&[], &["uzp-cli@latest"]), None);
    }

    #[test]
    fn custom_signal_tables_are_honoured() {
        let signals = [VersionSignal {
            name: "custom",
            source: SignalSource::Env("UZP_VERSION"),
        }];
        let vars = env(&[("UZP_VERSION", "4.0.0"), ("npm_package_version", "1.0.0")]);
        let selected =
            select_with(&signals, |name| vars.get(name).cloned(), &[]).expect("selected");
        assert_eq!(selected.version, "4.0.0");
    }

    #[test]
    fn tag_helpers() {
        assert_eq!(to_tag("1.0.6"), "v1.0.6");
        assert_eq!(to_tag("v1.0.6"), "v1.0.6");
        assert_eq!(strip_tag("v2.0.0"), "2.0.0");
        assert!(versions_match("v2.0.0", "2.0.0"));
        assert!(!versions_match("v2.0.0", "2.0.1"));
        assert!(looks_like_version("1.2.3-beta.1"));
        assert!(!looks_like_version("1.2"));
    }
}
