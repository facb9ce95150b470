// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use log::trace;

use crate::{RegExpError, Scanner};

pub const MAX_CAPTURES: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSlot {
    index: u32,
    closed: bool,
}

impl CaptureSlot {
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The `)` of the group has been parsed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Numbers the capturing groups of a pattern. Indices are one-based and
/// follow the order of the opening parentheses.
#[derive(Debug, Clone, Default)]
pub struct CaptureRegistry {
    started: u32,
    scanned_count: Option<u32>,
    slots: Vec<CaptureSlot>,
}

impl CaptureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of `(` seen so far.
    #[must_use]
    pub fn started(&self) -> u32 {
        self.started
    }

    /// Opens a new group and returns its index.
    pub fn start(&mut self) -> Result<u32, RegExpError> {
        if self.started >= MAX_CAPTURES {
            return Err(RegExpError::TooManyCaptures);
        }

        self.started += 1;
        Ok(self.started)
    }

    #[must_use]
    pub fn is_scanned(&self) -> bool {
        self.scanned_count.is_some()
    }

    /// The number of captures in the whole pattern if it has been scanned,
    /// otherwise the ones started so far.
    #[must_use]
    pub fn known_count(&self) -> u32 {
        self.scanned_count.unwrap_or(self.started)
    }

    /// Counts the captures of the rest of the pattern on a copy of the
    /// scanner. Only looks at parentheses, skipping escapes and classes.
    pub fn scan_for_captures(&mut self, scanner: &Scanner<'_>) {
        let mut scanner = scanner.clone();
        let mut count = self.started;

        while !scanner.is_at_end() {
            let c = scanner.current_char();
            scanner.advance();

            match c {
                Some('\\') => scanner.advance(),

                Some('[') => {
                    while !scanner.is_at_end() {
                        let c = scanner.current_char();
                        scanner.advance();
                        match c {
                            Some('\\') => scanner.advance(),
                            Some(']') => break,
                            _ => (),
                        }
                    }
                }

                Some('(') if scanner.current_char() != Some('?') => count += 1,

                _ => (),
            }
        }

        trace!("Vooruitblik vond {count} vangsten");
        self.scanned_count = Some(count);
    }

    /// The slot of capture `index`, growing the list up to the known count.
    pub fn get_capture(&mut self, index: u32) -> Option<&mut CaptureSlot> {
        let known = self.known_count();
        if index == 0 || index > known {
            return None;
        }

        while (self.slots.len() as u32) < known {
            let index = self.slots.len() as u32 + 1;
            self.slots.push(CaptureSlot { index, closed: false });
        }

        self.slots.get_mut(index as usize - 1)
    }

    pub fn close(&mut self, index: u32) {
        if let Some(slot) = self.get_capture(index) {
            slot.closed = true;
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[CaptureSlot] {
        &self.slots
    }
}
