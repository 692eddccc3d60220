// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing init (spec §9 "Secrets in logs"): `tracing_subscriber` registry
//! plus an `EnvFilter`, grounded on the sibling odd-jobs daemon's
//! `registry().with(filter).with(fmt::layer()...)` init shape. The one
//! addition the spec requires and no corpus precedent covers is field
//! redaction: a [`FormatFields`] implementation that replaces the value of
//! any sensitively-named field with a fixed marker before it ever reaches
//! a writer, rather than trusting every call site to scrub its own
//! `tracing::info!`/`warn!` arguments.

use std::fmt;

use tracing_subscriber::field::{RecordFields, Visit};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const REDACTED: &str = "<redacted>";

/// Field names (case-insensitive) whose value is always replaced, and
/// name suffixes (`*.credentials`) matched the same way.
const SENSITIVE_FIELDS: &[&str] = &[
    "req.headers",
    "authorization",
    "apikey",
    "token",
    "accesstoken",
    "refreshtoken",
    "password",
    "secret",
    "key",
    "$metadata",
];
const SENSITIVE_SUFFIXES: &[&str] = &["credentials"];

fn is_sensitive(field_name: &str) -> bool {
    let lower = field_name.to_ascii_lowercase();
    SENSITIVE_FIELDS.contains(&lower.as_str()) || SENSITIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// A `space`-joined `name=value` formatter, like `DefaultFields`, except
/// any field whose name matches [`is_sensitive`] is rendered as
/// `<redacted>` regardless of its real value.
#[derive(Default)]
pub struct RedactingFields;

struct Collector<'w> {
    writer: Writer<'w>,
    first: bool,
    result: fmt::Result,
}

impl<'w> Visit for Collector<'w> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if self.result.is_err() {
            return;
        }
        let name = field.name();
        let sep = if self.first { "" } else { " " };
        self.first = false;
        self.result = if is_sensitive(name) {
            write!(self.writer, "{sep}{name}={REDACTED:?}")
        } else {
            write!(self.writer, "{sep}{name}={value:?}")
        };
    }
}

impl<'writer> FormatFields<'writer> for RedactingFields {
    fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut collector = Collector { writer, first: true, result: Ok(()) };
        fields.record(&mut collector);
        collector.result
    }
}

/// Initializes global tracing: `RUST_LOG`-driven filter (default `info`)
/// plus a compact formatter whose fields are redacted per spec §9.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().fmt_fields(RedactingFields))
        .init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
