//! Deployment shape inference from command names.
//!
//! Used only for values the command metadata source does not declare. Rules
//! are checked in table order and the first matching rule wins, so a name such
//! as `cron-worker` is a cronjob.

use crate::models::CommandKind;

/// A substring rule mapping command names to a deployment kind.
#[derive(Debug, Clone, Copy)]
pub struct KindRule {
    pub patterns: &'static [&'static str],
    pub kind: CommandKind,
}

/// Kind rules in precedence order.
pub const KIND_RULES: &[KindRule] = &[
    KindRule {
        patterns: &["cron", "schedule"],
        kind: CommandKind::CronJob,
    },
    KindRule {
        patterns: &["daemon", "worker", "queue"],
        kind: CommandKind::Daemon,
    },
];

/// Kind used when no rule matches.
pub const DEFAULT_KIND: CommandKind = CommandKind::Daemon;

/// Schedule rules in precedence order.
pub const SCHEDULE_RULES: &[(&str, &str)] = &[("daily", "0 0 * * *"), ("hourly", "0 * * * *")];

/// Every five minutes.
pub const DEFAULT_SCHEDULE: &str = "*/5 * * * *";

/// Names that get [`SCALED_REPLICAS`].
pub const SCALED_PATTERNS: &[&str] = &["worker", "queue"];
pub const SCALED_REPLICAS: u32 = 2;
pub const DEFAULT_REPLICAS: u32 = 1;

/// The full inferred shape of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: CommandKind,
    /// Set for cronjobs only.
    pub schedule: Option<String>,
    pub replicas: u32,
}

fn matches_any(name: &str, patterns: &[&str]) -> bool {
    let name = name.to_lowercase();
    patterns.iter().any(|p| name.contains(p))
}

pub fn classify_kind(name: &str) -> CommandKind {
    KIND_RULES
        .iter()
        .find(|rule| matches_any(name, rule.patterns))
        .map(|rule| rule.kind)
        .unwrap_or(DEFAULT_KIND)
}

pub fn default_schedule(name: &str) -> &'static str {
    SCHEDULE_RULES
        .iter()
        .find(|(pattern, _)| matches_any(name, &[*pattern]))
        .map(|(_, schedule)| *schedule)
        .unwrap_or(DEFAULT_SCHEDULE)
}

pub fn default_replicas(name: &str) -> u32 {
    if matches_any(name, SCALED_PATTERNS) {
        SCALED_REPLICAS
    } else {
        DEFAULT_REPLICAS
    }
}

pub fn classify(name: &str) -> Classification {
    let kind = classify_kind(name);
    let schedule = match kind {
        CommandKind::CronJob => Some(default_schedule(name).to_string()),
        CommandKind::Daemon => None,
    };

    Classification {
        kind,
        schedule,
        replicas: default_replicas(name),
    }
}
