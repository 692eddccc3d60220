// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream parser (C9, spec §4.8): an incremental tag-state machine over the
//! raw LLM token stream. Turns `<Thinking>`, `<edward_sandbox ...>` and
//! `<file path="...">` tags into typed [`StreamEvent`]s as bytes arrive,
//! without ever requiring the whole response to be buffered first.

use edw_wire::StreamEvent;

const MAX_BUFFER_BYTES: usize = 10 * 1024;
const MAX_LOOP_ITERATIONS: usize = 1000;
const TAG_LOOKAHEAD: usize = 256;

#[derive(Debug, Clone)]
enum Mode {
    Thinking,
    Sandbox { project: Option<String>, base: Option<String> },
    File { path: String },
}

/// Incremental parser: feed it chunks via [`process`](Self::process), call
/// [`flush`](Self::flush) once at end of stream.
pub struct StreamParser {
    buffer: String,
    stack: Vec<Mode>,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self { buffer: String::new(), stack: Vec::new() }
    }

    /// Feeds one chunk of the raw stream, returning the events it produced.
    /// Unresolved trailing bytes (a tag that might still be arriving) are
    /// kept in the internal buffer for the next call.
    pub fn process(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        if self.buffer.len() > MAX_BUFFER_BYTES {
            let cut = self.buffer.len() - MAX_BUFFER_BYTES;
            let boundary = (cut..self.buffer.len()).find(|&i| self.buffer.is_char_boundary(i)).unwrap_or(self.buffer.len());
            self.buffer.replace_range(..boundary, "");
        }

        let mut events = Vec::new();
        let mut iterations = 0;
        loop {
            iterations += 1;
            if iterations > MAX_LOOP_ITERATIONS {
                events.push(StreamEvent::Error { message: "stream parser exceeded iteration guard".to_string() });
                self.buffer.clear();
                self.stack.clear();
                break;
            }
            if !self.step(&mut events) {
                break;
            }
        }
        events
    }

    /// Closes every still-open tag at end of stream, innermost first,
    /// flushing whatever content remains in the buffer first.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let mode = self.stack.last();
            events.push(content_event(mode, std::mem::take(&mut self.buffer)));
        }
        while let Some(mode) = self.stack.pop() {
            events.push(end_event(&mode));
        }
        events
    }

    /// Advances the state machine by one "unit" of progress. Returns
    /// `false` when nothing more can be decided without another chunk.
    fn step(&mut self, events: &mut Vec<StreamEvent>) -> bool {
        let Some(lt_idx) = self.buffer.find('<') else {
            if !self.buffer.is_empty() {
                let mode = self.stack.last().cloned();
                events.push(content_event(mode.as_ref(), std::mem::take(&mut self.buffer)));
            }
            return false;
        };

        if lt_idx > 0 {
            let mode = self.stack.last().cloned();
            let text: String = self.buffer.drain(..lt_idx).collect();
            events.push(content_event(mode.as_ref(), text));
            return true;
        }

        let Some(gt_offset) = self.buffer.find('>') else {
            if self.buffer.len() > TAG_LOOKAHEAD {
                let mode = self.stack.last().cloned();
                let ch: String = self.buffer.drain(..1).collect();
                events.push(content_event(mode.as_ref(), ch));
                return true;
            }
            return false;
        };

        let tag_text = self.buffer[..=gt_offset].to_string();
        self.handle_tag(&tag_text, events);
        self.buffer.replace_range(..=gt_offset, "");
        true
    }

    fn handle_tag(&mut self, tag_text: &str, events: &mut Vec<StreamEvent>) {
        match self.stack.last() {
            None => self.handle_top_level_tag(tag_text, events),
            Some(Mode::Sandbox { .. }) => self.handle_sandbox_child_tag(tag_text, events),
            Some(Mode::Thinking) => {
                if tag_text == "</Thinking>" {
                    self.stack.pop();
                    events.push(StreamEvent::ThinkingEnd { content: None });
                } else {
                    events.push(StreamEvent::ThinkingContent { content: Some(tag_text.to_string()) });
                }
            }
            Some(Mode::File { .. }) => {
                if tag_text == "</file>" {
                    if let Some(Mode::File { path }) = self.stack.pop() {
                        events.push(StreamEvent::FileEnd { path });
                    }
                } else {
                    let path = self.current_file_path();
                    events.push(StreamEvent::FileContent { path, content: tag_text.to_string() });
                }
            }
        }
    }

    fn handle_top_level_tag(&mut self, tag_text: &str, events: &mut Vec<StreamEvent>) {
        if tag_text == "<Thinking>" {
            self.stack.push(Mode::Thinking);
            events.push(StreamEvent::ThinkingStart { content: None });
        } else if tag_text.starts_with("<edward_sandbox") {
            let project = parse_attr(tag_text, "project");
            let base = parse_attr(tag_text, "base");
            self.stack.push(Mode::Sandbox { project: project.clone(), base: base.clone() });
            events.push(StreamEvent::SandboxStart { project, base });
        } else if tag_text.starts_with("<file ") {
            self.open_file_tag(tag_text, events);
        } else {
            events.push(StreamEvent::Text { content: tag_text.to_string() });
        }
    }

    fn handle_sandbox_child_tag(&mut self, tag_text: &str, events: &mut Vec<StreamEvent>) {
        if tag_text == "</edward_sandbox>" {
            if let Some(Mode::Sandbox { project, base }) = self.stack.pop() {
                events.push(StreamEvent::SandboxEnd { project, base });
            }
        } else if tag_text.starts_with("<file ") {
            self.open_file_tag(tag_text, events);
        } else {
            events.push(StreamEvent::Text { content: tag_text.to_string() });
        }
    }

    fn open_file_tag(&mut self, tag_text: &str, events: &mut Vec<StreamEvent>) {
        let raw_path = parse_attr(tag_text, "path").unwrap_or_default();
        let path = normalize_file_path(&raw_path);
        if path.is_empty() {
            events.push(StreamEvent::Error { message: format!("empty file path after normalization: {raw_path:?}") });
            return;
        }
        self.stack.push(Mode::File { path: path.clone() });
        events.push(StreamEvent::FileStart { path });
    }

    fn current_file_path(&self) -> String {
        match self.stack.last() {
            Some(Mode::File { path }) => path.clone(),
            _ => String::new(),
        }
    }
}

fn content_event(mode: Option<&Mode>, text: String) -> StreamEvent {
    match mode {
        None => StreamEvent::Text { content: text },
        Some(Mode::Thinking) => StreamEvent::ThinkingContent { content: Some(text) },
        Some(Mode::Sandbox { .. }) => StreamEvent::Text { content: text },
        Some(Mode::File { path }) => StreamEvent::FileContent { path: path.clone(), content: text },
    }
}

fn end_event(mode: &Mode) -> StreamEvent {
    match mode {
        Mode::Thinking => StreamEvent::ThinkingEnd { content: None },
        Mode::Sandbox { project, base } => StreamEvent::SandboxEnd { project: project.clone(), base: base.clone() },
        Mode::File { path } => StreamEvent::FileEnd { path: path.clone() },
    }
}

/// Extracts `name="value"` from a tag's raw text.
fn parse_attr(tag_text: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = tag_text.find(&needle)? + needle.len();
    let rest = &tag_text[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// POSIX-normalizes a file path attribute: backslashes become slashes,
/// `.`/`..` segments are dropped entirely (spec §4.8 "leading `..`
/// stripped", generalized to any position for safety), empty segments
/// collapsed.
fn normalize_file_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
