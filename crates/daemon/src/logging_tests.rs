// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::{Arc, Mutex};

use serial_test::serial;
use tracing_subscriber::fmt::MakeWriter;

use super::*;

#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.logs.lock().unwrap()).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_tracing(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .fmt_fields(RedactingFields)
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

#[test]
#[serial(tracing)]
fn redacts_an_authorization_header_field() {
    let logs = with_tracing(|| tracing::info!(authorization = "Bearer secret-token", "handled request"));
    assert!(logs.contains("<redacted>"));
    assert!(!logs.contains("secret-token"));
}

#[test]
#[serial(tracing)]
fn redacts_fields_ending_in_credentials() {
    let logs = with_tracing(|| tracing::info!(aws.credentials = "AKIAFAKEKEYVALUE", "loaded config"));
    assert!(logs.contains("<redacted>"));
    assert!(!logs.contains("AKIAFAKEKEYVALUE"));
}

#[test]
#[serial(tracing)]
fn leaves_ordinary_fields_untouched() {
    let logs = with_tracing(|| tracing::info!(sandbox_id = "sbx-1", "provisioned sandbox"));
    assert!(logs.contains("sbx-1"));
}

#[test]
fn is_sensitive_matches_every_spec_listed_field() {
    for name in ["req.headers", "authorization", "apiKey", "token", "accessToken", "refreshToken", "password", "secret", "key", "$metadata"] {
        assert!(is_sensitive(name), "{name} should be treated as sensitive");
    }
    assert!(is_sensitive("aws.credentials"));
    assert!(!is_sensitive("sandbox_id"));
}
