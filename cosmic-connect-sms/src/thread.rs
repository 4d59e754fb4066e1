//! Visual threading of a conversation
//!
//! A conversation arrives as a flat list of messages in ascending date order.
//! The chat view groups consecutive messages from the same side into one
//! bubble stack, a [`VisualThread`]. A new thread starts when:
//!
//! - the direction changes,
//! - more than the break threshold (one hour by default) has passed since the
//!   previous message of the same direction, in which case a
//!   [`Separator::TimeGap`] labelled with the new message's time is emitted
//!   first,
//! - or a notice interrupts the conversation. Notices never join a thread and
//!   are emitted as [`Separator::Notice`].
//!
//! Threads refer to messages by index into the caller's slice, so the builder
//! never copies message bodies.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use cosmic_connect_sms::{Direction, Message, ThreadBuilder, ThreadEntry, TimeFormatter};
//!
//! let messages = vec![
//!     Message::new(1, 1, "5551234", "hey", 0, Direction::In),
//!     Message::new(2, 1, "5551234", "you there?", 60_000, Direction::In),
//!     Message::new(3, 1, "5551234", "yes", 120_000, Direction::Out),
//! ];
//!
//! let mut builder = ThreadBuilder::new(TimeFormatter::new(Utc), 180_000);
//! builder.extend(&messages);
//! let entries = builder.finish();
//!
//! assert_eq!(entries.len(), 2);
//! if let ThreadEntry::Thread(thread) = &entries[0] {
//!     assert_eq!(thread.messages(&messages).len(), 2);
//! }
//! ```

use crate::message::{Direction, Message};
use crate::time_format::TimeFormatter;
use chrono::{Local, TimeZone};
use std::fmt;
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

/// Gap after which a same-direction run is split
pub const DEFAULT_BREAK_THRESHOLD: Duration = Duration::from_secs(60 * 60);

/// A contiguous run of messages from the same side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualThread {
    direction: Direction,
    start: usize,
    end: usize,
    last_date: i64,
}

impl VisualThread {
    fn open(direction: Direction, index: usize, date: i64) -> Self {
        Self {
            direction,
            start: index,
            end: index + 1,
            last_date: date,
        }
    }

    /// Direction shared by every message in the thread; never `Notice`
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Indices of the thread's messages in the input slice
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of messages in the thread
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false; a thread is opened with its first message
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Date of the most recently appended message
    pub fn last_date(&self) -> i64 {
        self.last_date
    }

    /// The thread's messages, borrowed from the slice it was built from
    ///
    /// Returns an empty slice if `messages` is shorter than the slice the
    /// thread was built from.
    pub fn messages<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        messages.get(self.range()).unwrap_or(&[])
    }
}

/// A break between threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    /// Same-direction messages more than the threshold apart
    TimeGap {
        /// Date of the message that follows the gap
        date: i64,
        /// Long human-relative label for `date`
        label: String,
    },

    /// A notice message, shown on its own
    Notice {
        /// Index of the notice in the input slice
        index: usize,
    },
}

/// One item of threaded output, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadEntry {
    /// A run of same-direction messages
    Thread(VisualThread),
    /// A break shown between runs
    Separator(Separator),
}

impl ThreadEntry {
    /// The thread, if this entry is one
    pub fn as_thread(&self) -> Option<&VisualThread> {
        match self {
            ThreadEntry::Thread(thread) => Some(thread),
            ThreadEntry::Separator(_) => None,
        }
    }
}

/// Incremental threading state machine
///
/// Feed messages in ascending date order with [`push`](Self::push). Messages
/// received later can be pushed onto the same builder; indices keep counting
/// from where the previous batch ended, so the caller appends them to the
/// same message list.
///
/// Out-of-order input is grouped on a best-effort basis: a message dated
/// before its predecessor never triggers a time gap.
#[derive(Debug, Clone)]
pub struct ThreadBuilder<Tz: TimeZone = Local> {
    formatter: TimeFormatter<Tz>,
    now_ms: i64,
    break_threshold_ms: i64,
    entries: Vec<ThreadEntry>,
    /// Whether the last entry is a thread that may still grow
    active: bool,
    next_index: usize,
}

impl<Tz> ThreadBuilder<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Create a builder; `now_ms` is used to label time-gap separators
    pub fn new(formatter: TimeFormatter<Tz>, now_ms: i64) -> Self {
        Self {
            formatter,
            now_ms,
            break_threshold_ms: duration_millis(DEFAULT_BREAK_THRESHOLD),
            entries: Vec::new(),
            active: false,
            next_index: 0,
        }
    }

    /// Builder pattern: Set the gap that splits a same-direction run
    pub fn with_break_threshold(mut self, threshold: Duration) -> Self {
        self.break_threshold_ms = duration_millis(threshold);
        self
    }

    /// Update the reference time used for labels of future separators
    pub fn set_now(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    /// Add the next message of the conversation
    pub fn push(&mut self, message: &Message) {
        let index = self.next_index;
        self.next_index += 1;

        if message.direction == Direction::Notice {
            self.active = false;
            self.entries
                .push(ThreadEntry::Separator(Separator::Notice { index }));
            return;
        }

        let threshold = self.break_threshold_ms;
        let current = match self.entries.last_mut() {
            Some(ThreadEntry::Thread(thread))
                if self.active && thread.direction == message.direction =>
            {
                Some(thread)
            }
            _ => None,
        };

        match current {
            Some(thread) if message.date.saturating_sub(thread.last_date) <= threshold => {
                thread.end = index + 1;
                thread.last_date = message.date;
            }
            Some(thread) => {
                debug!(
                    "Thread break after {} ms gap at message {}",
                    message.date.saturating_sub(thread.last_date),
                    message.id
                );
                let label = self.formatter.render(message.date, self.now_ms);
                self.entries.push(ThreadEntry::Separator(Separator::TimeGap {
                    date: message.date,
                    label,
                }));
                self.open(message, index);
            }
            None => self.open(message, index),
        }
    }

    /// Push every message in order
    pub fn extend<'a, I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = &'a Message>,
    {
        for message in messages {
            self.push(message);
        }
    }

    /// Entries so far; the last one may still grow
    pub fn entries(&self) -> &[ThreadEntry] {
        &self.entries
    }

    /// The thread the next message may join, if any
    pub fn active_thread(&self) -> Option<&VisualThread> {
        if !self.active {
            return None;
        }
        self.entries.last().and_then(ThreadEntry::as_thread)
    }

    /// Number of messages consumed
    pub fn message_count(&self) -> usize {
        self.next_index
    }

    /// Consume the builder and return its entries in display order
    pub fn finish(self) -> Vec<ThreadEntry> {
        self.entries
    }

    fn open(&mut self, message: &Message, index: usize) {
        self.entries.push(ThreadEntry::Thread(VisualThread::open(
            message.direction,
            index,
            message.date,
        )));
        self.active = true;
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Thread `messages` with the default threshold and local time labels
pub fn build_threads(messages: &[Message], now_ms: i64) -> Vec<ThreadEntry> {
    let mut builder = ThreadBuilder::new(TimeFormatter::local(), now_ms);
    builder.extend(messages);
    builder.finish()
}
