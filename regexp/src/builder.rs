// Copyright (C) 2024 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

use crate::{
    scanner::{combine_surrogate_pair, is_lead_surrogate, is_trail_surrogate},
    CharacterRange,
    QuantifierKind,
    RegExpCharacterClass,
    RegExpQuantifier,
    RegExpTree,
    UnicodeOracle,
};

const NON_BMP_START: u32 = 0x10000;
const LEAD_SURROGATE_START: u32 = 0xD800;
const TRAIL_SURROGATE_END: u32 = 0xDFFF;

/// Assembles the terms of one group, alternative by alternative.
///
/// Plain characters are gathered into `characters` until something else is
/// added, text elements into `text`, everything else into `terms`.
pub struct RegExpBuilder<'oracle> {
    oracle: &'oracle dyn UnicodeOracle,
    ignore_case: bool,
    unicode: bool,

    pending_empty: bool,
    pending_surrogate: Option<u16>,
    characters: Option<Vec<u16>>,
    text: Vec<RegExpTree>,
    terms: Vec<RegExpTree>,
    alternatives: Vec<RegExpTree>,
}

impl<'oracle> RegExpBuilder<'oracle> {
    #[must_use]
    pub fn new(oracle: &'oracle dyn UnicodeOracle, ignore_case: bool, unicode: bool) -> Self {
        Self {
            oracle,
            ignore_case,
            unicode,
            pending_empty: false,
            pending_surrogate: None,
            characters: None,
            text: Vec::new(),
            terms: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn add_character(&mut self, c: u16) {
        self.flush_pending_surrogate();
        self.pending_empty = false;

        if self.needs_desugaring_for_ignore_case(u32::from(c)) {
            self.add_character_class_for_desugaring(u32::from(c));
        } else {
            self.characters.get_or_insert_with(Vec::new).push(c);
        }
    }

    /// Adds a code point that may be outside the BMP or a surrogate.
    pub fn add_unicode_character(&mut self, c: u32) {
        if c >= NON_BMP_START {
            debug_assert!(self.unicode);
            let c = c - NON_BMP_START;
            self.add_lead_surrogate(LEAD_SURROGATE_START as u16 + (c >> 10) as u16);
            self.add_trail_surrogate(0xDC00 + (c & 0x3FF) as u16);
        } else if self.unicode && is_lead_surrogate(c) {
            self.add_lead_surrogate(c as u16);
        } else if self.unicode && is_trail_surrogate(c) {
            self.add_trail_surrogate(c as u16);
        } else {
            self.add_character(c as u16);
        }
    }

    /// An escaped surrogate never pairs with its neighbours.
    pub fn add_escaped_unicode_character(&mut self, c: u32) {
        self.flush_pending_surrogate();
        self.add_unicode_character(c);
        self.flush_pending_surrogate();
    }

    pub fn add_lead_surrogate(&mut self, lead: u16) {
        debug_assert!(is_lead_surrogate(u32::from(lead)));
        self.flush_pending_surrogate();
        self.pending_surrogate = Some(lead);
    }

    pub fn add_trail_surrogate(&mut self, trail: u16) {
        debug_assert!(is_trail_surrogate(u32::from(trail)));

        match self.pending_surrogate.take() {
            Some(lead) => {
                let combined = combine_surrogate_pair(u32::from(lead), u32::from(trail));
                if self.needs_desugaring_for_ignore_case(combined) {
                    self.add_character_class_for_desugaring(combined);
                } else {
                    self.add_atom(RegExpTree::Atom(vec![lead, trail]));
                }
            }

            None => {
                self.pending_surrogate = Some(trail);
                self.flush_pending_surrogate();
            }
        }
    }

    /// A lone surrogate becomes a class of its own.
    pub fn flush_pending_surrogate(&mut self) {
        if let Some(c) = self.pending_surrogate.take() {
            debug_assert!(self.unicode);
            self.add_character_class_for_desugaring(u32::from(c));
        }
    }

    /// Makes the next quantifier a no-op, e.g. after a back reference to
    /// the group it is in.
    pub fn add_empty(&mut self) {
        self.pending_empty = true;
    }

    pub fn add_character_class(&mut self, mut class: RegExpCharacterClass) {
        if self.needs_desugaring_for_unicode(&mut class) {
            // Desugared later into alternatives, so it can't be part of text.
            self.add_term(RegExpTree::CharacterClass(class));
        } else {
            self.add_atom(RegExpTree::CharacterClass(class));
        }
    }

    fn add_character_class_for_desugaring(&mut self, c: u32) {
        let class = RegExpCharacterClass::new(vec![CharacterRange::singleton(c)], false);
        self.add_term(RegExpTree::CharacterClass(class));
    }

    pub fn add_atom(&mut self, term: RegExpTree) {
        if term.is_empty() {
            self.add_empty();
            return;
        }

        if term.is_text_element() {
            self.flush_characters();
            self.text.push(term);
        } else {
            self.flush_text();
            self.terms.push(term);
        }
    }

    pub fn add_term(&mut self, term: RegExpTree) {
        self.flush_text();
        self.terms.push(term);
    }

    pub fn add_assertion(&mut self, assertion: RegExpTree) {
        self.flush_text();
        self.terms.push(assertion);
    }

    pub fn new_alternative(&mut self) {
        self.flush_terms();
    }

    fn flush_characters(&mut self) {
        self.flush_pending_surrogate();
        self.pending_empty = false;

        if let Some(characters) = self.characters.take() {
            self.text.push(RegExpTree::Atom(characters));
        }
    }

    fn flush_text(&mut self) {
        self.flush_characters();

        match self.text.len() {
            0 => (),
            1 => self.terms.extend(self.text.pop()),
            _ => {
                let mut elements = Vec::new();
                for element in self.text.drain(..) {
                    element.append_to_text(&mut elements);
                }
                self.terms.push(RegExpTree::Text(elements));
            }
        }
    }

    fn flush_terms(&mut self) {
        self.flush_text();

        let alternative = match self.terms.len() {
            0 => RegExpTree::Empty,
            1 => self.terms.pop().unwrap_or(RegExpTree::Empty),
            _ => RegExpTree::Alternative(std::mem::take(&mut self.terms)),
        };

        self.alternatives.push(alternative);
    }

    /// Classes with code points outside the BMP or with lone surrogates
    /// can't be matched one code unit at a time.
    fn needs_desugaring_for_unicode(&self, class: &mut RegExpCharacterClass) -> bool {
        if !self.unicode {
            return false;
        }

        if matches!(class.standard_type(), Some('s' | 'w' | 'd')) {
            return false;
        }

        class.canonicalize();
        class.ranges().iter().rev().any(|range| {
            range.to() >= NON_BMP_START
                || (range.from() <= TRAIL_SURROGATE_END && range.to() >= LEAD_SURROGATE_START)
        })
    }

    fn needs_desugaring_for_ignore_case(&self, c: u32) -> bool {
        self.unicode && self.ignore_case && self.oracle.case_closure_size(c) > 1
    }

    /// Finishes the group and returns its tree.
    #[must_use]
    pub fn into_regexp(mut self) -> RegExpTree {
        self.flush_terms();

        match self.alternatives.len() {
            0 => RegExpTree::Empty,
            1 => self.alternatives.pop().unwrap_or(RegExpTree::Empty),
            _ => RegExpTree::Disjunction(std::mem::take(&mut self.alternatives)),
        }
    }

    /// Wraps the last added unit in a quantifier. Returns `false` when it
    /// can't be quantified.
    #[must_use]
    pub fn add_quantifier_to_atom(&mut self, min: u32, max: u32, kind: QuantifierKind) -> bool {
        self.flush_pending_surrogate();

        if self.pending_empty {
            self.pending_empty = false;
            return true;
        }

        let atom = if let Some(mut characters) = self.characters.take() {
            // Only the last character is repeated.
            let last = characters.split_off(characters.len() - 1);
            if !characters.is_empty() {
                self.text.push(RegExpTree::Atom(characters));
            }
            self.flush_text();
            RegExpTree::Atom(last)
        } else if let Some(atom) = self.text.pop() {
            self.flush_text();
            atom
        } else if let Some(atom) = self.terms.pop() {
            if self.unicode && atom.is_lookaround() {
                return false;
            }

            if atom.max_match() == 0 {
                // Only ever matches the empty string.
                if min != 0 {
                    self.terms.push(atom);
                }
                return true;
            }

            atom
        } else {
            return false;
        };

        self.terms.push(RegExpTree::Quantifier(RegExpQuantifier {
            min,
            max,
            kind,
            body: Box::new(atom),
        }));

        true
    }
}
