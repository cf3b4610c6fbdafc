//! Process-lifetime pool of literal strings.
//!
//! Synthetic lexemes (the expansion-pop marker, the `0`/`1` the `defined`
//! operator folds to) carry text that comes from no source file but must
//! outlive every lexeme referencing it. The pool owns one allocation per
//! distinct literal and hands out shared references to it.

use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct StringInterner {
    pool: HashMap<String, Rc<str>>,
}

impl StringInterner {
    pub fn new() -> StringInterner {
        StringInterner {
            pool: HashMap::new(),
        }
    }

    /// Shared reference to the pooled copy of `text`, allocated on first
    /// sight.
    pub fn get_ref(&mut self, text: &str) -> Rc<str> {
        match self.pool.get(text) {
            Some(interned) => Rc::clone(interned),
            None => {
                let interned: Rc<str> = Rc::from(text);
                self.pool.insert(text.to_string(), Rc::clone(&interned));
                interned
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[test]
fn pooled_literals_are_shared() {
    let mut interner = StringInterner::new();
    assert!(interner.is_empty());
    let a = interner.get_ref("0");
    let b = interner.get_ref("0");
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(&*a, "0");
    assert_eq!(interner.len(), 1);
    interner.get_ref("1");
    assert_eq!(interner.len(), 2);
}
