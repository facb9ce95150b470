// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

/// Returned by [`Scanner::current`] and [`Scanner::next`] past the end of the
/// input. Lies outside of the code point range.
pub const END_MARKER: u32 = 1 << 21;

const LEAD_SURROGATE: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const TRAIL_SURROGATE: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

#[must_use]
pub(crate) fn is_lead_surrogate(c: u32) -> bool {
    LEAD_SURROGATE.contains(&c)
}

#[must_use]
pub(crate) fn is_trail_surrogate(c: u32) -> bool {
    TRAIL_SURROGATE.contains(&c)
}

#[must_use]
pub(crate) fn combine_surrogate_pair(lead: u32, trail: u32) -> u32 {
    0x10000 + ((lead - 0xD800) << 10) + (trail - 0xDC00)
}

/// One-character lookahead over UTF-16 code units. In unicode mode a valid
/// surrogate pair is read as a single code point.
#[derive(Debug, Clone)]
pub struct Scanner<'input> {
    input: &'input [u16],
    unicode: bool,

    current: u32,
    next_pos: usize,
    has_more: bool,
}

impl<'input> Scanner<'input> {
    #[must_use]
    pub fn new(input: &'input [u16], unicode: bool) -> Self {
        let mut scanner = Self {
            input,
            unicode,
            current: END_MARKER,
            next_pos: 0,
            has_more: true,
        };
        scanner.advance();
        scanner
    }

    #[must_use]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// The current code point as a `char`, or `None` at the end or on a
    /// lone surrogate.
    #[must_use]
    pub fn current_char(&self) -> Option<char> {
        char::from_u32(self.current)
    }

    /// The code point after the current one, without moving.
    #[must_use]
    pub fn next(&self) -> u32 {
        if self.has_next() {
            self.read_next().0
        } else {
            END_MARKER
        }
    }

    #[must_use]
    pub fn next_char(&self) -> Option<char> {
        char::from_u32(self.next())
    }

    /// Position of the current code point in code units.
    #[must_use]
    pub fn position(&self) -> usize {
        self.next_pos.saturating_sub(1)
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_pos < self.input.len()
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.current == END_MARKER
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn read_next(&self) -> (u32, usize) {
        let mut position = self.next_pos;
        let mut c = u32::from(self.input[position]);
        position += 1;

        if self.unicode && position < self.input.len() && is_lead_surrogate(c) {
            let trail = u32::from(self.input[position]);
            if is_trail_surrogate(trail) {
                c = combine_surrogate_pair(c, trail);
                position += 1;
            }
        }

        (c, position)
    }

    pub fn advance(&mut self) {
        if self.has_next() {
            let (c, position) = self.read_next();
            self.current = c;
            self.next_pos = position;
        } else {
            self.current = END_MARKER;
            // One past the last code unit, so that resetting to `position()`
            // lands at the end again.
            self.next_pos = self.input.len() + 1;
            self.has_more = false;
        }
    }

    /// Skips `distance - 1` code units and reads the next code point.
    /// `distance` is at least one.
    pub fn advance_by(&mut self, distance: usize) {
        debug_assert!(distance > 0, "advance_by(0) zou teruglopen");
        self.next_pos += distance.saturating_sub(1);
        self.advance();
    }

    pub fn reset(&mut self, position: usize) {
        self.next_pos = position;
        self.has_more = position < self.input.len();
        self.advance();
    }

    /// Moves to the end so that nothing else is read.
    pub fn fast_forward(&mut self) {
        self.current = END_MARKER;
        self.next_pos = self.input.len() + 1;
        self.has_more = false;
    }
}
