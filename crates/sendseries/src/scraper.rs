//! Detection of delivered emails in live `git send-email` output.
//!
//! For every message it sends, `git send-email` prints the headers it used
//! followed by the transport result:
//!
//! ```text
//! Subject: [PATCH v2 1/3] net: fix the thing
//! Date: Mon,  1 Jan 2024 10:00:00 +0100
//! Message-ID: <20240101090000.1234-1-dev@example.org>
//! X-Mailer: git-send-email 2.43.0
//! MIME-Version: 1.0
//!
//! Result: 250
//! ```
//!
//! The output arrives in arbitrary chunks, so [`SendScraper`] keeps the
//! unmatched tail of the stream between calls.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use regex::Regex;
use uuid::Uuid;

use crate::series::{SentBatch, SentEmail, Series};

// Subject line, headers, Message-ID line, headers, blank line, success code.
// A terminal adds a `\r` to every line end, so `\r\r\n` is accepted too.
static RE_CONFIRMATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^Subject:[^\r\n]*?\] ([^\r\n]+?)\r*\n(?:[^\r\n]*?: [^\r\n]+?\r*\n)*?Message-ID: <([^>\r\n]+)>\r*\n(?:[^\r\n]*?: [^\r\n]+?\r*\n)*?\r*\nResult: 250\b",
    )
    .unwrap()
});

/// Upper bound on the carried-over tail of the stream.
pub const MAX_BUFFER: usize = 64 * 1024;

const SUBJECT_LINE: &str = "Subject:";

/// Scrapes one send invocation. Not shared between invocations.
#[derive(Debug)]
pub struct SendScraper {
    session_id: String,
    /// Decoded text not yet part of a complete record.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Whether this invocation already prepended its batch.
    batch_open: bool,
    seen: HashSet<String>,
    recorded: usize,
}

impl Default for SendScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl SendScraper {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            buffer: String::new(),
            pending: Vec::new(),
            batch_open: false,
            seen: HashSet::new(),
            recorded: 0,
        }
    }

    /// Identifier used in log lines of this invocation.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of emails recorded so far.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Length of the carried-over text.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds one chunk and returns the confirmations it completed, in
    /// textual order. A message ID already reported by this scraper is not
    /// reported again.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SentEmail> {
        self.decode(chunk);

        let mut found = Vec::new();
        let mut consumed = 0;
        for caps in RE_CONFIRMATION.captures_iter(&self.buffer) {
            if let Some(whole) = caps.get(0) {
                consumed = whole.end();
            }
            let (Some(title), Some(message_id)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let message_id = message_id.as_str().to_string();
            if !self.seen.insert(message_id.clone()) {
                debug!(
                    "[{}] Ignoring repeated confirmation for <{}>",
                    self.session_id, message_id
                );
                continue;
            }
            found.push(SentEmail {
                title: title.as_str().to_string(),
                message_id,
            });
        }

        self.buffer.drain(..consumed);
        self.compact();
        found
    }

    /// Records `emails` into `series`, prepending this invocation's batch on
    /// the first call that has something to record. Returns how many emails
    /// were added.
    pub fn record(&mut self, series: &mut Series, head: &str, emails: Vec<SentEmail>) -> usize {
        if emails.is_empty() {
            return 0;
        }

        if !self.batch_open || series.previously_sent.is_empty() {
            self.batch_open = true;
            series.previously_sent.insert(
                0,
                SentBatch {
                    prefix: series.sent_prefix(),
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    head: head.to_string(),
                    emails: Vec::new(),
                },
            );
            info!(
                "[{}] Recording sent series {} for {}",
                self.session_id,
                series.sent_prefix(),
                head
            );
        }

        let count = emails.len();
        for email in &emails {
            info!("[{}] Sent <{}> {}", self.session_id, email.message_id, email.title);
        }
        series.previously_sent[0].emails.extend(emails);
        self.recorded += count;
        count
    }

    /// Feeds a chunk and records what it completed. Returns how many emails
    /// were added; a non-zero result means `series` must be persisted.
    pub fn process(&mut self, chunk: &[u8], series: &mut Series, head: &str) -> usize {
        let emails = self.feed(chunk);
        self.record(series, head, emails)
    }

    /// Tears the scraper down, discarding any partial record. Returns the
    /// number of emails recorded over its lifetime.
    pub fn finish(self) -> usize {
        if !self.buffer.is_empty() {
            debug!(
                "[{}] Discarding {} bytes of unmatched output",
                self.session_id,
                self.buffer.len()
            );
        }
        self.recorded
    }

    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        None => {
                            self.pending = tail.to_vec();
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                    }
                }
            }
        }
    }

    /// Keeps only text that can still start a record.
    fn compact(&mut self) {
        let keep_from = match self.buffer.rfind("\nSubject:") {
            Some(pos) => pos + 1,
            None if self.buffer.starts_with(SUBJECT_LINE) => 0,
            None => self.buffer.rfind('\n').map_or(0, |pos| pos + 1),
        };
        self.buffer.drain(..keep_from);

        if self.buffer.len() > MAX_BUFFER {
            let mut cut = self.buffer.len() - MAX_BUFFER;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, id: &str, result: &str) -> String {
        format!(
            "OK. Log says:\r\nServer: smtp.example.org\r\nMAIL FROM:<dev@example.org>\r\n\
             From: Dev <dev@example.org>\r\nTo: list@example.org\r\n\
             Subject: [PATCH v2 1/2] {}\r\nDate: Mon, 1 Jan 2024 10:00:00 +0100\r\n\
             Message-ID: <{}>\r\nX-Mailer: git-send-email 2.43.0\r\nMIME-Version: 1.0\r\n\
             \r\nResult: {}\r\n\r\n",
            title, id, result
        )
    }

    fn series() -> Series {
        Series::new("PATCH", vec![], vec![])
    }

    #[test]
    fn test_single_record_single_chunk() {
        let mut scraper = SendScraper::new();
        let mut s = series();
        let added = scraper.process(record("net: fix", "1@x", "250").as_bytes(), &mut s, "fix");

        assert_eq!(added, 1);
        assert_eq!(s.previously_sent.len(), 1);
        let batch = &s.previously_sent[0];
        assert_eq!(batch.head, "fix");
        assert_eq!(batch.prefix, "PATCH v1");
        assert_eq!(
            batch.emails,
            vec![SentEmail {
                title: "net: fix".into(),
                message_id: "1@x".into()
            }]
        );
    }

    #[test]
    fn test_record_split_at_every_offset() {
        let text = record("split me", "2@x", "250");
        let bytes = text.as_bytes();
        for offset in 0..=bytes.len() {
            let mut scraper = SendScraper::new();
            let mut found = scraper.feed(&bytes[..offset]);
            found.extend(scraper.feed(&bytes[offset..]));
            assert_eq!(found.len(), 1, "offset {}", offset);
            assert_eq!(found[0].message_id, "2@x");
        }
    }

    #[test]
    fn test_failed_result_is_ignored() {
        let mut scraper = SendScraper::new();
        let mut s = series();
        let added = scraper.process(record("nope", "3@x", "550 5.7.1 denied").as_bytes(), &mut s, "b");
        assert_eq!(added, 0);
        assert!(s.previously_sent.is_empty());
    }

    #[test]
    fn test_result_code_prefix_is_not_success() {
        let mut scraper = SendScraper::new();
        assert!(scraper.feed(record("x", "4@x", "2500").as_bytes()).is_empty());
    }

    #[test]
    fn test_result_with_server_message_matches() {
        let mut scraper = SendScraper::new();
        let found = scraper.feed(record("x", "5@x", "250 2.0.0 Ok: queued").as_bytes());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_two_records_one_chunk_in_order() {
        let mut scraper = SendScraper::new();
        let mut s = series();
        let chunk = format!("{}{}", record("first", "a@x", "250"), record("second", "b@x", "250"));
        scraper.process(chunk.as_bytes(), &mut s, "b");

        assert_eq!(s.previously_sent.len(), 1);
        let titles: Vec<_> = s.previously_sent[0]
            .emails
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_one_batch_per_lifetime() {
        let mut scraper = SendScraper::new();
        let mut s = series();
        scraper.process(record("first", "a@x", "250").as_bytes(), &mut s, "b");
        scraper.process(record("second", "b@x", "250").as_bytes(), &mut s, "b");
        assert_eq!(s.previously_sent.len(), 1);
        assert_eq!(s.previously_sent[0].emails.len(), 2);
        assert_eq!(scraper.finish(), 2);
    }

    #[test]
    fn test_new_batch_is_prepended() {
        let mut s = series();
        let mut first = SendScraper::new();
        first.process(record("v1", "a@x", "250").as_bytes(), &mut s, "b");
        s.version = 2;
        let mut second = SendScraper::new();
        second.process(record("v2", "b@x", "250").as_bytes(), &mut s, "b-v2");

        assert_eq!(s.previously_sent.len(), 2);
        assert_eq!(s.previously_sent[0].prefix, "PATCH v2");
        assert_eq!(s.previously_sent[1].prefix, "PATCH v1");
    }

    #[test]
    fn test_repeated_message_id_recorded_once() {
        let mut scraper = SendScraper::new();
        let text = record("again", "dup@x", "250");
        assert_eq!(scraper.feed(text.as_bytes()).len(), 1);
        assert!(scraper.feed(text.as_bytes()).is_empty());
    }

    #[test]
    fn test_plain_newlines() {
        let mut scraper = SendScraper::new();
        let text = "Subject: [PATCH] tidy up\nMessage-ID: <6@x>\n\nResult: 250\n";
        let found = scraper.feed(text.as_bytes());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "tidy up");
    }

    #[test]
    fn test_terminal_line_endings() {
        let mut scraper = SendScraper::new();
        let text = "Subject: [PATCH] tidy up\r\r\nDate: now\r\r\nMessage-ID: <10@x>\r\r\n\r\r\nResult: 250\r\r\n";
        let found = scraper.feed(text.as_bytes());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "tidy up");
        assert_eq!(found[0].message_id, "10@x");
    }

    #[test]
    fn test_title_keeps_inner_brackets() {
        let mut scraper = SendScraper::new();
        let text = "Subject: [RFC PATCH 2/3] drm [i915]: fix\nMessage-ID: <7@x>\n\nResult: 250\n";
        assert_eq!(scraper.feed(text.as_bytes())[0].title, "drm [i915]: fix");
    }

    #[test]
    fn test_split_utf8_sequence() {
        let text = "Subject: [PATCH] caf\u{e9}\nMessage-ID: <8@x>\n\nResult: 250\n";
        let bytes = text.as_bytes();
        let split = text.find('\u{e9}').unwrap() + 1;
        let mut scraper = SendScraper::new();
        assert!(scraper.feed(&bytes[..split]).is_empty());
        let found = scraper.feed(&bytes[split..]);
        assert_eq!(found[0].title, "caf\u{e9}");
    }

    #[test]
    fn test_buffer_stays_bounded() {
        let mut scraper = SendScraper::new();
        let noise = "x".repeat(4096);
        for _ in 0..64 {
            scraper.feed(noise.as_bytes());
        }
        assert!(scraper.buffered() <= MAX_BUFFER);

        let mut scraper = SendScraper::new();
        for i in 0..10_000 {
            scraper.feed(format!("line {} of unrelated output\n", i).as_bytes());
        }
        assert!(scraper.buffered() < 64);
    }

    #[test]
    fn test_partial_record_survives_compaction() {
        let mut scraper = SendScraper::new();
        scraper.feed(b"noise\nmore noise\nSubject: [PATCH] kept\nDate: now\n");
        scraper.feed(b"Message-ID: <9@x>\n\n");
        let found = scraper.feed(b"Result: 250\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "kept");
    }

    #[test]
    fn test_no_batch_without_confirmation() {
        let mut scraper = SendScraper::new();
        let mut s = series();
        scraper.process(b"Send this email? ([y]es|[n]o|[q]uit|[a]ll): ", &mut s, "b");
        assert!(s.previously_sent.is_empty());
        assert_eq!(scraper.finish(), 0);
    }
}
