// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use log::{debug, trace};

use crate::{
    captures::MAX_CAPTURES,
    scanner::{combine_surrogate_pair, is_lead_surrogate, is_trail_surrogate},
    AssertionKind,
    CaptureRegistry,
    CharacterRange,
    LookaroundDirection,
    ParserLimits,
    QuantifierKind,
    RegExpBuilder,
    RegExpCapture,
    RegExpCharacterClass,
    RegExpCompileData,
    RegExpError,
    RegExpFeatures,
    RegExpFlags,
    RegExpLookaround,
    RegExpTree,
    Scanner,
    UnicodeOracle,
    END_MARKER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Initial,
    Grouping,
    Capture,
    PositiveLookaround,
    NegativeLookaround,
}

type FrameId = usize;

const ROOT_FRAME: FrameId = 0;

/// The state of one open group.
struct Frame<'oracle> {
    previous: Option<FrameId>,
    kind: GroupKind,
    direction: LookaroundDirection,

    /// The number of captures started when the group was opened, which is
    /// the index of the group itself for capturing groups.
    capture_index: u32,

    builder: RegExpBuilder<'oracle>,
}

/// Open groups, linked to their parent through `previous`. Slots of closed
/// groups are reused.
struct FrameArena<'oracle> {
    oracle: &'oracle dyn UnicodeOracle,
    ignore_case: bool,
    unicode: bool,

    frames: Vec<Frame<'oracle>>,
    free: Vec<FrameId>,
    current: FrameId,
    depth: usize,
}

impl<'oracle> FrameArena<'oracle> {
    fn new(oracle: &'oracle dyn UnicodeOracle, ignore_case: bool, unicode: bool) -> Self {
        let root = Frame {
            previous: None,
            kind: GroupKind::Initial,
            direction: LookaroundDirection::Lookahead,
            capture_index: 0,
            builder: RegExpBuilder::new(oracle, ignore_case, unicode),
        };

        Self {
            oracle,
            ignore_case,
            unicode,
            frames: vec![root],
            free: Vec::new(),
            current: ROOT_FRAME,
            depth: 0,
        }
    }

    fn current(&self) -> &Frame<'oracle> {
        &self.frames[self.current]
    }

    fn builder(&mut self) -> &mut RegExpBuilder<'oracle> {
        &mut self.frames[self.current].builder
    }

    fn push(&mut self, kind: GroupKind, direction: LookaroundDirection, capture_index: u32) {
        let frame = Frame {
            previous: Some(self.current),
            kind,
            direction,
            capture_index,
            builder: RegExpBuilder::new(self.oracle, self.ignore_case, self.unicode),
        };

        self.current = match self.free.pop() {
            Some(id) => {
                self.frames[id] = frame;
                id
            }
            None => {
                self.frames.push(frame);
                self.frames.len() - 1
            }
        };
        self.depth += 1;
    }

    /// Takes the current frame out of the arena and makes its parent
    /// current. The root frame is handed out but stays current.
    fn pop(&mut self) -> Frame<'oracle> {
        let id = self.current;
        let placeholder = Frame {
            previous: None,
            kind: GroupKind::Grouping,
            direction: LookaroundDirection::Lookahead,
            capture_index: 0,
            builder: RegExpBuilder::new(self.oracle, self.ignore_case, self.unicode),
        };
        let frame = std::mem::replace(&mut self.frames[id], placeholder);

        if let Some(previous) = frame.previous {
            self.free.push(id);
            self.current = previous;
            self.depth -= 1;
        }

        frame
    }

    /// Whether capture `index` is one of the groups still open.
    fn is_inside_capture_group(&self, index: u32) -> bool {
        let mut id = Some(self.current);

        while let Some(frame) = id.map(|id| &self.frames[id]) {
            id = frame.previous;

            if frame.kind != GroupKind::Capture {
                continue;
            }

            if index == frame.capture_index {
                return true;
            }

            // Groups further out were opened before `index`.
            if index > frame.capture_index {
                return false;
            }
        }

        false
    }
}

/// A parsed class atom: a single code point or a class escape like `\d`.
#[derive(Debug, Clone, Copy)]
enum ClassAtom {
    Character(u32),
    Escape(char),
}

impl ClassAtom {
    fn add_to(self, ranges: &mut Vec<CharacterRange>) {
        match self {
            Self::Character(c) => ranges.push(CharacterRange::singleton(c)),
            Self::Escape(c) => CharacterRange::add_class_escape(c, ranges),
        }
    }
}

fn is_syntax_character_or_slash(c: u32) -> bool {
    matches!(
        char::from_u32(c),
        Some('^' | '$' | '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '/')
    )
}

fn hex_value(c: u32) -> Option<u32> {
    char::from_u32(c)?.to_digit(16)
}

fn decimal_value(c: Option<char>) -> Option<u32> {
    c?.to_digit(10)
}

fn octal_value(c: Option<char>) -> Option<u32> {
    c?.to_digit(8)
}

/// Parses a pattern without recursion: every open group is a frame in a
/// [`FrameArena`].
pub struct RegExpParser<'input, 'oracle> {
    scanner: Scanner<'input>,
    flags: RegExpFlags,
    features: RegExpFeatures,
    limits: ParserLimits,
    oracle: &'oracle dyn UnicodeOracle,

    frames: FrameArena<'oracle>,
    captures: CaptureRegistry,

    error: Option<RegExpError>,
    contains_anchor: bool,
    zone_units: usize,
}

impl<'input, 'oracle> RegExpParser<'input, 'oracle> {
    #[must_use]
    pub fn new(
        input: &'input [u16],
        flags: RegExpFlags,
        features: &RegExpFeatures,
        oracle: &'oracle dyn UnicodeOracle,
    ) -> Self {
        let unicode = flags.contains(RegExpFlags::UNICODE);
        let ignore_case = flags.contains(RegExpFlags::IGNORE_CASE);

        Self {
            scanner: Scanner::new(input, unicode),
            flags,
            features: features.clone(),
            limits: features.limits(),
            oracle,
            frames: FrameArena::new(oracle, ignore_case, unicode),
            captures: CaptureRegistry::new(),
            error: None,
            contains_anchor: false,
            zone_units: 0,
        }
    }

    pub fn parse(mut self) -> Result<RegExpCompileData, RegExpError> {
        trace!("Ontleden van reguliere expressie van {} tekens", self.scanner.len());

        let result = self.parse_disjunction();
        if let Some(error) = self.error.take() {
            debug!("Reguliere expressie is ongeldig: {error}");
            return Err(error);
        }
        let tree = result?;

        if self.features.trace_parser {
            debug!("Reguliere expressie ontleed: {tree}");
        }

        let capture_count = self.captures.started();
        let simple = matches!(&tree, RegExpTree::Atom(data) if data.len() == self.scanner.len()) && capture_count == 0;

        Ok(RegExpCompileData {
            tree,
            capture_count,
            simple,
            contains_anchor: self.contains_anchor,
        })
    }

    fn unicode(&self) -> bool {
        self.flags.contains(RegExpFlags::UNICODE)
    }

    fn builder(&mut self) -> &mut RegExpBuilder<'oracle> {
        self.frames.builder()
    }

    /// Records the first error and skips to the end of the input.
    fn report_error(&mut self, error: RegExpError) -> RegExpError {
        self.scanner.fast_forward();
        self.error.get_or_insert(error).clone()
    }

    fn fail<T>(&mut self, error: RegExpError) -> Result<T, RegExpError> {
        Err(self.report_error(error))
    }

    /// Checks the resource limits before the scanner reads on. Returns
    /// `false` when it must not.
    fn guard(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }

        if !self.scanner.has_next() {
            return true;
        }

        if self.frames.depth > self.limits.max_depth {
            self.report_error(RegExpError::StackOverflow);
            return false;
        }

        if self.zone_units > self.limits.max_zone_units {
            self.report_error(RegExpError::TooLarge);
            return false;
        }

        self.zone_units += 1;
        true
    }

    fn charge(&mut self, units: usize) {
        self.zone_units += units;
    }

    fn advance(&mut self) {
        if self.guard() {
            self.scanner.advance();
        }
    }

    fn advance_by(&mut self, distance: usize) {
        if self.guard() {
            self.scanner.advance_by(distance);
        }
    }

    fn reset(&mut self, position: usize) {
        if self.error.is_none() {
            self.scanner.reset(position);
        }
    }

    fn current_is(&self, c: char) -> bool {
        self.scanner.current_char() == Some(c)
    }

    fn parse_disjunction(&mut self) -> Result<RegExpTree, RegExpError> {
        loop {
            if self.scanner.is_at_end() {
                if self.frames.current().kind != GroupKind::Initial {
                    return self.fail(RegExpError::UnterminatedGroup);
                }

                return Ok(self.frames.pop().builder.into_regexp());
            }

            match self.scanner.current_char() {
                Some(')') => {
                    if self.frames.current().kind == GroupKind::Initial {
                        return self.fail(RegExpError::UnmatchedParenthesis);
                    }

                    self.advance();
                    self.close_group();
                }

                Some('|') => {
                    self.advance();
                    self.builder().new_alternative();
                    continue;
                }

                Some('*' | '+' | '?') => return self.fail(RegExpError::NothingToRepeat),

                Some('^') => {
                    self.advance();
                    let kind = if self.flags.contains(RegExpFlags::MULTILINE) {
                        AssertionKind::StartOfLine
                    } else {
                        self.contains_anchor = true;
                        AssertionKind::StartOfInput
                    };
                    self.builder().add_assertion(RegExpTree::Assertion(kind));
                    continue;
                }

                Some('$') => {
                    self.advance();
                    let kind = if self.flags.contains(RegExpFlags::MULTILINE) {
                        AssertionKind::EndOfLine
                    } else {
                        AssertionKind::EndOfInput
                    };
                    self.builder().add_assertion(RegExpTree::Assertion(kind));
                    continue;
                }

                Some('.') => {
                    self.advance();
                    let ranges = if self.flags.contains(RegExpFlags::DOT_ALL) {
                        vec![CharacterRange::everything()]
                    } else {
                        CharacterRange::class_escape('.')
                    };
                    self.charge(ranges.len());
                    self.builder().add_character_class(RegExpCharacterClass::new(ranges, false));
                }

                Some('(') => {
                    self.open_group()?;
                    continue;
                }

                Some('[') => {
                    let class = self.parse_character_class()?;
                    self.builder().add_character_class(class);
                }

                Some('\\') => {
                    if self.parse_atom_escape()? {
                        continue;
                    }
                }

                Some('{') => {
                    if self.parse_interval_quantifier().is_some() {
                        return self.fail(RegExpError::NothingToRepeat);
                    }
                    self.add_lone_bracket()?;
                }

                Some('}' | ']') => self.add_lone_bracket()?,

                _ => {
                    let c = self.scanner.current();
                    self.builder().add_unicode_character(c);
                    self.advance();
                }
            }

            let (min, max) = match self.scanner.current_char() {
                Some('*') => {
                    self.advance();
                    (0, RegExpTree::INFINITY)
                }

                Some('+') => {
                    self.advance();
                    (1, RegExpTree::INFINITY)
                }

                Some('?') => {
                    self.advance();
                    (0, 1)
                }

                Some('{') => match self.parse_interval_quantifier() {
                    Some((min, max)) if max < min => return self.fail(RegExpError::QuantifierOutOfOrder),
                    Some(bounds) => bounds,
                    None if self.unicode() => return self.fail(RegExpError::IncompleteQuantifier),
                    None => continue,
                },

                _ => continue,
            };

            let kind = if self.current_is('?') {
                self.advance();
                QuantifierKind::NonGreedy
            } else if self.features.possessive_quantifiers && self.current_is('+') {
                self.advance();
                QuantifierKind::Possessive
            } else {
                QuantifierKind::Greedy
            };

            if !self.builder().add_quantifier_to_atom(min, max, kind) {
                return self.fail(RegExpError::InvalidQuantifier);
            }
        }
    }

    /// `}`, `]` and a `{` that doesn't start a quantifier are only literals
    /// outside unicode mode.
    fn add_lone_bracket(&mut self) -> Result<(), RegExpError> {
        if self.unicode() {
            return self.fail(RegExpError::LoneQuantifierBrackets);
        }

        let c = self.scanner.current();
        self.builder().add_unicode_character(c);
        self.advance();
        Ok(())
    }

    fn open_group(&mut self) -> Result<(), RegExpError> {
        let mut kind = GroupKind::Capture;
        let mut direction = self.frames.current().direction;

        self.advance();

        if self.current_is('?') {
            match self.scanner.next_char() {
                Some(':') => kind = GroupKind::Grouping,

                Some('=') => {
                    direction = LookaroundDirection::Lookahead;
                    kind = GroupKind::PositiveLookaround;
                }

                Some('!') => {
                    direction = LookaroundDirection::Lookahead;
                    kind = GroupKind::NegativeLookaround;
                }

                Some('<') if self.features.lookbehind => {
                    self.advance();
                    direction = LookaroundDirection::Lookbehind;
                    kind = match self.scanner.next_char() {
                        Some('=') => GroupKind::PositiveLookaround,
                        Some('!') => GroupKind::NegativeLookaround,
                        _ => return self.fail(RegExpError::InvalidGroup),
                    };
                }

                _ => return self.fail(RegExpError::InvalidGroup),
            }

            self.advance_by(2);
        } else if let Err(error) = self.captures.start() {
            return self.fail(error);
        }

        self.frames.push(kind, direction, self.captures.started());
        Ok(())
    }

    /// Folds the current group into a single atom of its parent.
    fn close_group(&mut self) {
        let frame = self.frames.pop();
        let body = Box::new(frame.builder.into_regexp());
        let end_capture_index = self.captures.started();

        let body = match frame.kind {
            GroupKind::Capture => {
                self.captures.close(frame.capture_index);
                RegExpTree::Capture(RegExpCapture {
                    index: frame.capture_index,
                    body,
                })
            }

            GroupKind::PositiveLookaround | GroupKind::NegativeLookaround => {
                RegExpTree::Lookaround(RegExpLookaround {
                    body,
                    positive: frame.kind == GroupKind::PositiveLookaround,
                    direction: frame.direction,
                    capture_from: frame.capture_index,
                    capture_count: end_capture_index - frame.capture_index,
                })
            }

            GroupKind::Initial | GroupKind::Grouping => *body,
        };

        self.builder().add_atom(body);
    }

    /// Parses `\` and what follows outside of a class. Returns `true` when
    /// an assertion was added, which can't be quantified.
    fn parse_atom_escape(&mut self) -> Result<bool, RegExpError> {
        if self.scanner.next() == END_MARKER {
            return self.fail(RegExpError::EscapeAtEndOfPattern);
        }

        let unicode = self.unicode();

        match self.scanner.next_char() {
            Some(c @ ('b' | 'B')) => {
                self.advance_by(2);
                let kind = if c == 'b' { AssertionKind::Boundary } else { AssertionKind::NonBoundary };
                self.builder().add_assertion(RegExpTree::Assertion(kind));
                return Ok(true);
            }

            Some(c @ ('d' | 'D' | 's' | 'S' | 'w' | 'W')) => {
                self.advance_by(2);
                let ranges = CharacterRange::class_escape(c);
                self.charge(ranges.len());
                self.builder().add_character_class(RegExpCharacterClass::new(ranges, false));
            }

            Some(p @ ('p' | 'P')) => {
                self.advance_by(2);

                if !unicode {
                    self.builder().add_character(p as u16);
                } else if !self.features.property_escapes {
                    return self.fail(RegExpError::InvalidEscape);
                } else {
                    let Some(ranges) = self.parse_property_class() else {
                        return self.fail(RegExpError::InvalidPropertyName);
                    };
                    self.charge(ranges.len());
                    self.builder().add_character_class(RegExpCharacterClass::new(ranges, p == 'P'));
                }
            }

            Some(first_digit @ '1'..='9') => {
                if let Some(index) = self.parse_back_reference_index() {
                    self.add_back_reference(index);
                    return Ok(false);
                }

                if unicode {
                    return self.fail(RegExpError::InvalidEscape);
                }

                if matches!(first_digit, '8' | '9') {
                    self.builder().add_character(first_digit as u16);
                    self.advance_by(2);
                } else {
                    self.advance();
                    let octal = self.parse_octal_literal();
                    self.builder().add_character(octal as u16);
                }
            }

            Some('0') => {
                self.advance();
                if unicode && decimal_value(self.scanner.next_char()).is_some() {
                    return self.fail(RegExpError::InvalidDecimalEscape);
                }
                let octal = self.parse_octal_literal();
                self.builder().add_character(octal as u16);
            }

            Some(c @ ('f' | 'n' | 'r' | 't' | 'v')) => {
                self.advance_by(2);
                let control = match c {
                    'f' => 0x0C,
                    'n' => 0x0A,
                    'r' => 0x0D,
                    't' => 0x09,
                    _ => 0x0B,
                };
                self.builder().add_character(control);
            }

            Some('c') => {
                self.advance();
                let control = self.scanner.next();
                let letter = control & !0x20;

                if (u32::from(b'A')..=u32::from(b'Z')).contains(&letter) {
                    self.advance_by(2);
                    self.builder().add_character((control & 0x1F) as u16);
                } else if unicode {
                    return self.fail(RegExpError::InvalidUnicodeEscape);
                } else {
                    // The backslash is taken literally and `c` is read again.
                    self.builder().add_character(u16::from(b'\\'));
                }
            }

            Some('x') => {
                self.advance_by(2);
                match self.parse_hex_escape(2) {
                    Some(value) => self.builder().add_character(value as u16),
                    None if !unicode => self.builder().add_character(u16::from(b'x')),
                    None => return self.fail(RegExpError::InvalidEscape),
                }
            }

            Some('u') => {
                self.advance_by(2);
                match self.parse_unicode_escape() {
                    Some(value) => self.builder().add_escaped_unicode_character(value),
                    None if !unicode => self.builder().add_character(u16::from(b'u')),
                    None => return self.fail(RegExpError::InvalidUnicodeEscape),
                }
            }

            _ => {
                self.advance();
                let c = self.scanner.current();
                if unicode && !is_syntax_character_or_slash(c) {
                    return self.fail(RegExpError::InvalidEscape);
                }
                self.builder().add_character(c as u16);
                self.advance();
            }
        }

        Ok(false)
    }

    fn add_back_reference(&mut self, index: u32) {
        if self.frames.is_inside_capture_group(index) {
            // Nothing can have been captured yet when the reference is
            // reached, so it always matches the empty string.
            self.builder().add_empty();
            return;
        }

        let closed = self.captures.get_capture(index).is_some_and(|slot| slot.is_closed());
        trace!("Terugverwijzing naar vangst {index} (al gesloten: {closed})");
        self.builder().add_atom(RegExpTree::BackReference(index));
    }

    /// Reads the decimal after `\` if it refers to a capture of the
    /// pattern, looking ahead for captures that are opened later.
    fn parse_back_reference_index(&mut self) -> Option<u32> {
        let start = self.scanner.position();
        let mut value = decimal_value(self.scanner.next_char())?;
        self.advance_by(2);

        while let Some(digit) = decimal_value(self.scanner.current_char()) {
            value = 10 * value + digit;
            if value > MAX_CAPTURES {
                self.reset(start);
                return None;
            }
            self.advance();
        }

        if value > self.captures.started() {
            if !self.captures.is_scanned() {
                self.captures.scan_for_captures(&self.scanner);
            }

            if value > self.captures.known_count() {
                self.reset(start);
                return None;
            }
        }

        Some(value)
    }

    /// Parses `{n}`, `{n,}` or `{n,m}`. Bounds saturate at
    /// [`RegExpTree::INFINITY`]. Leaves the scanner untouched when there is
    /// no valid quantifier.
    fn parse_interval_quantifier(&mut self) -> Option<(u32, u32)> {
        let start = self.scanner.position();
        self.advance();

        if decimal_value(self.scanner.current_char()).is_none() {
            self.reset(start);
            return None;
        }

        let min = self.parse_saturating_decimal();

        let max = match self.scanner.current_char() {
            Some('}') => {
                self.advance();
                min
            }

            Some(',') => {
                self.advance();
                if self.current_is('}') {
                    self.advance();
                    RegExpTree::INFINITY
                } else {
                    let max = self.parse_saturating_decimal();
                    if !self.current_is('}') {
                        self.reset(start);
                        return None;
                    }
                    self.advance();
                    max
                }
            }

            _ => {
                self.reset(start);
                return None;
            }
        };

        Some((min, max))
    }

    fn parse_saturating_decimal(&mut self) -> u32 {
        let mut value = 0u32;

        while let Some(digit) = decimal_value(self.scanner.current_char()) {
            if value > (RegExpTree::INFINITY - digit) / 10 {
                while decimal_value(self.scanner.current_char()).is_some() {
                    self.advance();
                }
                return RegExpTree::INFINITY;
            }

            value = 10 * value + digit;
            self.advance();
        }

        value
    }

    /// Up to three octal digits with a value below 256.
    fn parse_octal_literal(&mut self) -> u32 {
        let Some(mut value) = octal_value(self.scanner.current_char()) else {
            return 0;
        };
        self.advance();

        if let Some(digit) = octal_value(self.scanner.current_char()) {
            value = value * 8 + digit;
            self.advance();

            if value < 32 {
                if let Some(digit) = octal_value(self.scanner.current_char()) {
                    value = value * 8 + digit;
                    self.advance();
                }
            }
        }

        value
    }

    fn parse_hex_escape(&mut self, length: usize) -> Option<u32> {
        let start = self.scanner.position();
        let mut value = 0;

        for _ in 0..length {
            let Some(digit) = hex_value(self.scanner.current()) else {
                self.reset(start);
                return None;
            };
            value = value * 16 + digit;
            self.advance();
        }

        Some(value)
    }

    /// Parses what follows `\u`: four hex digits, or `{..}` in unicode mode.
    /// In unicode mode `😀` is combined into one code point.
    fn parse_unicode_escape(&mut self) -> Option<u32> {
        if self.current_is('{') && self.unicode() {
            let start = self.scanner.position();
            self.advance();

            if let Some(value) = self.parse_unlimited_length_hex_number(0x10FFFF) {
                if self.current_is('}') {
                    self.advance();
                    return Some(value);
                }
            }

            self.reset(start);
            return None;
        }

        let value = self.parse_hex_escape(4)?;

        if self.unicode() && is_lead_surrogate(value) && self.current_is('\\') {
            let start = self.scanner.position();

            if self.scanner.next_char() == Some('u') {
                self.advance_by(2);
                if let Some(trail) = self.parse_hex_escape(4) {
                    if is_trail_surrogate(trail) {
                        return Some(combine_surrogate_pair(value, trail));
                    }
                }
            }

            self.reset(start);
        }

        Some(value)
    }

    fn parse_unlimited_length_hex_number(&mut self, max_value: u32) -> Option<u32> {
        let mut value = hex_value(self.scanner.current())?;

        loop {
            if value > max_value {
                return None;
            }

            self.advance();

            match hex_value(self.scanner.current()) {
                Some(digit) => value = value * 16 + digit,
                None => return Some(value),
            }
        }
    }

    /// Parses the name after `\p` or `\P`, either `{name}`, `{name=value}`
    /// or a single letter, and resolves it through the oracle.
    fn parse_property_class(&mut self) -> Option<Vec<CharacterRange>> {
        let mut name = String::new();
        let mut value = None;

        if self.current_is('{') {
            self.advance();
            while !matches!(self.scanner.current_char(), Some('}' | '=')) {
                if !self.scanner.has_next() {
                    return None;
                }
                name.push(self.scanner.current_char().unwrap_or(char::REPLACEMENT_CHARACTER));
                self.advance();
            }

            if self.current_is('=') {
                let mut text = String::new();
                self.advance();
                while !self.current_is('}') {
                    if !self.scanner.has_next() {
                        return None;
                    }
                    text.push(self.scanner.current_char().unwrap_or(char::REPLACEMENT_CHARACTER));
                    self.advance();
                }
                value = Some(text);
            }
        } else if !self.scanner.is_at_end() {
            name.push(self.scanner.current_char().unwrap_or(char::REPLACEMENT_CHARACTER));
        } else {
            return None;
        }

        self.advance();

        let ranges = self.oracle.property_ranges(&name, value.as_deref());
        if ranges.is_none() {
            debug!("Onbekende Unicode-eigenschap `{name}`");
        }
        ranges
    }

    fn parse_character_class(&mut self) -> Result<RegExpCharacterClass, RegExpError> {
        self.advance();

        let mut negated = false;
        if self.current_is('^') {
            negated = true;
            self.advance();
        }

        let mut ranges = Vec::new();

        while self.scanner.has_more() && !self.current_is(']') {
            if self.parse_class_property(&mut ranges)? {
                continue;
            }

            let first = self.parse_class_atom()?;
            if !self.current_is('-') {
                first.add_to(&mut ranges);
                continue;
            }

            self.advance();

            if self.scanner.is_at_end() {
                break;
            }

            if self.current_is(']') {
                // A dangling `-` is literal.
                first.add_to(&mut ranges);
                ranges.push(CharacterRange::singleton(u32::from('-')));
                break;
            }

            let next = self.parse_class_atom()?;
            match (first, next) {
                (ClassAtom::Character(from), ClassAtom::Character(to)) => {
                    if from > to {
                        return self.fail(RegExpError::RangeOutOfOrder);
                    }
                    ranges.push(CharacterRange::new(from, to));
                }

                _ => {
                    if self.unicode() {
                        return self.fail(RegExpError::InvalidCharacterClass);
                    }

                    // A class escape on either side makes the `-` literal.
                    first.add_to(&mut ranges);
                    ranges.push(CharacterRange::singleton(u32::from('-')));
                    next.add_to(&mut ranges);
                }
            }
        }

        if !self.scanner.has_more() {
            return self.fail(RegExpError::UnterminatedCharacterClass);
        }
        self.advance();

        if ranges.is_empty() {
            // `[]` matches nothing and `[^]` everything.
            ranges.push(CharacterRange::everything());
            negated = !negated;
        }

        self.charge(ranges.len());
        Ok(RegExpCharacterClass::new(ranges, negated))
    }

    /// `\p{..}` and `\P{..}` inside a class, only in unicode mode.
    fn parse_class_property(&mut self, ranges: &mut Vec<CharacterRange>) -> Result<bool, RegExpError> {
        if !self.features.property_escapes || !self.unicode() || !self.current_is('\\') {
            return Ok(false);
        }

        let negate = match self.scanner.next_char() {
            Some('p') => false,
            Some('P') => true,
            _ => return Ok(false),
        };

        self.advance_by(2);

        let Some(property) = self.parse_property_class() else {
            return self.fail(RegExpError::InvalidClassPropertyName);
        };

        if negate {
            ranges.extend(CharacterRange::negate(property));
        } else {
            ranges.extend(property);
        }

        Ok(true)
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, RegExpError> {
        if !self.current_is('\\') {
            let c = self.scanner.current();
            self.advance();
            return Ok(ClassAtom::Character(c));
        }

        if self.scanner.next() == END_MARKER {
            return self.fail(RegExpError::EscapeAtEndOfPattern);
        }

        match self.scanner.next_char() {
            Some(c @ ('w' | 'W' | 'd' | 'D' | 's' | 'S')) => {
                self.advance_by(2);
                Ok(ClassAtom::Escape(c))
            }

            _ => self.parse_class_character_escape().map(ClassAtom::Character),
        }
    }

    fn parse_class_character_escape(&mut self) -> Result<u32, RegExpError> {
        self.advance();
        let unicode = self.unicode();

        let c = match self.scanner.current_char() {
            Some('b') => 0x08,
            Some('f') => 0x0C,
            Some('n') => 0x0A,
            Some('r') => 0x0D,
            Some('t') => 0x09,
            Some('v') => 0x0B,

            Some('c') => {
                let control = self.scanner.next();
                let letter = control & !0x20;

                if (u32::from(b'A')..=u32::from(b'Z')).contains(&letter) {
                    self.advance_by(2);
                    return Ok(control & 0x1F);
                }

                if unicode {
                    return self.fail(RegExpError::InvalidClassEscape);
                }

                // Digits and `_` are accepted as control letters in classes.
                if matches!(char::from_u32(control), Some('0'..='9' | '_')) {
                    self.advance_by(2);
                    return Ok(control & 0x1F);
                }

                return Ok(u32::from('\\'));
            }

            Some('0') if unicode && decimal_value(self.scanner.next_char()).is_none() => {
                self.advance();
                return Ok(0);
            }

            Some('0'..='7') => {
                if unicode {
                    return self.fail(RegExpError::InvalidClassEscape);
                }
                return Ok(self.parse_octal_literal());
            }

            Some('x') => {
                self.advance();
                return match self.parse_hex_escape(2) {
                    Some(value) => Ok(value),
                    None if unicode => self.fail(RegExpError::InvalidEscape),
                    None => Ok(u32::from('x')),
                };
            }

            Some('u') => {
                self.advance();
                return match self.parse_unicode_escape() {
                    Some(value) => Ok(value),
                    None if unicode => self.fail(RegExpError::InvalidUnicodeEscape),
                    None => Ok(u32::from('u')),
                };
            }

            _ => {
                let c = self.scanner.current();
                if unicode && !is_syntax_character_or_slash(c) && c != u32::from('-') {
                    return self.fail(RegExpError::InvalidEscape);
                }
                c
            }
        };

        self.advance();
        Ok(c)
    }
}
