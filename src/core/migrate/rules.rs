//! Ordered SDL2 -> SDL3 replacement rules.
//!
//! Rules run in sequence over the whole file; each rule sees the output of the
//! rules before it.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::calls::CallRewrite;
use crate::config::MigrationConfig;
use crate::error::{Error, Result};

static INIT_VIDEO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSDL_Init\(\s*SDL_INIT_VIDEO[^)]*\)").unwrap());

static INIT_AUDIO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSDL_Init\(\s*SDL_INIT_AUDIO[^)]*\)").unwrap());

static EVENT_QUIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bSDL_QUIT\b").unwrap());

static EVENT_KEYDOWN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bSDL_KEYDOWN\b").unwrap());

static EVENT_MOUSEBUTTONDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSDL_MOUSEBUTTONDOWN\b").unwrap());

#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Exact substring replacement.
    Literal { from: String, to: String },
    /// `regex` replacement; the template uses `$1`/`${name}` group syntax.
    Regex { pattern: Regex, replacement: String },
    /// Argument-aware call rewrite.
    Call(CallRewrite),
}

#[derive(Debug, Clone)]
pub struct ReplacementRule {
    pub label: String,
    pub kind: RuleKind,
}

/// How many times a rule fired in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleHit {
    pub rule: String,
    pub count: usize,
}

impl ReplacementRule {
    fn literal(label: &str, from: &str, to: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: RuleKind::Literal {
                from: from.to_string(),
                to: to.to_string(),
            },
        }
    }

    fn regex(label: &str, pattern: &Regex, replacement: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: RuleKind::Regex {
                pattern: pattern.clone(),
                replacement: replacement.to_string(),
            },
        }
    }

    fn call(label: &str, rewrite: CallRewrite) -> Self {
        Self {
            label: label.to_string(),
            kind: RuleKind::Call(rewrite),
        }
    }

    /// Apply to `text`. Returns `None` when the rule did not match.
    pub fn apply(&self, text: &str) -> Option<(String, usize)> {
        match &self.kind {
            RuleKind::Literal { from, to } => {
                let count = text.matches(from.as_str()).count();
                (count > 0).then(|| (text.replace(from.as_str(), to), count))
            }
            RuleKind::Regex {
                pattern,
                replacement,
            } => {
                let count = pattern.find_iter(text).count();
                (count > 0).then(|| {
                    (
                        pattern.replace_all(text, replacement.as_str()).into_owned(),
                        count,
                    )
                })
            }
            RuleKind::Call(rewrite) => {
                let (out, count) = rewrite.apply(text);
                (count > 0).then_some((out, count))
            }
        }
    }
}

/// Built-in SDL3 rules (header first), followed by configured extra rules.
pub fn sdl3_rules(migration: &MigrationConfig) -> Result<Vec<ReplacementRule>> {
    let mut rules = vec![
        ReplacementRule::literal("header", &migration.header_from, &migration.header_to),
        ReplacementRule::regex("SDL_Init video", &INIT_VIDEO, "SDL_InitVideo()"),
        ReplacementRule::regex("SDL_Init audio", &INIT_AUDIO, "SDL_InitAudio()"),
        ReplacementRule::call(
            "SDL_CreateWindow",
            CallRewrite::new("SDL_CreateWindow", 6, &[0, 3, 4, 5]),
        ),
        ReplacementRule::regex("SDL_QUIT", &EVENT_QUIT, "SDL_EVENT_QUIT"),
        ReplacementRule::regex("SDL_KEYDOWN", &EVENT_KEYDOWN, "SDL_EVENT_KEY_DOWN"),
        ReplacementRule::regex(
            "SDL_MOUSEBUTTONDOWN",
            &EVENT_MOUSEBUTTONDOWN,
            "SDL_EVENT_MOUSE_BUTTON_DOWN",
        ),
        ReplacementRule::call(
            "SDL_CreateRenderer",
            CallRewrite::new("SDL_CreateRenderer", 3, &[0, 2]),
        ),
    ];

    for (i, extra) in migration.extra_rules.iter().enumerate() {
        let pattern = Regex::new(&extra.pattern).map_err(|e| {
            Error::config_invalid_value(
                format!("migration.extra_rules[{}].pattern", i),
                Some(extra.pattern.clone()),
                e.to_string(),
            )
        })?;
        rules.push(ReplacementRule {
            label: format!("extra: {}", extra.pattern),
            kind: RuleKind::Regex {
                pattern,
                replacement: extra.replacement.clone(),
            },
        });
    }

    Ok(rules)
}

/// Run every rule in order. Returns the final text and the rules that fired.
pub fn apply_all(rules: &[ReplacementRule], text: &str) -> (String, Vec<RuleHit>) {
    let mut current = text.to_string();
    let mut hits = Vec::new();

    for rule in rules {
        if let Some((next, count)) = rule.apply(&current) {
            current = next;
            hits.push(RuleHit {
                rule: rule.label.clone(),
                count,
            });
        }
    }

    (current, hits)
}
