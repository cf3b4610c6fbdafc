//! The mutable lexeme stream.
//!
//! A doubly-linked list backed by an arena: nodes live in a `Vec` and link
//! to each other by index, so node ids stay valid across inserts, erasures
//! and splices anywhere in the list. Erasing only unlinks; the storage is
//! reclaimed in bulk when the list is dropped, which is what lets erased
//! nodes still be consulted for diagnostics.

use crate::lexeme::Lexeme;

pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    lexeme: Lexeme,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug, Default)]
pub struct LexemeList {
    nodes: Vec<Node>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl LexemeList {
    pub fn new() -> LexemeList {
        LexemeList {
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn get(&self, id: NodeId) -> &Lexeme {
        &self.nodes[id].lexeme
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Lexeme {
        &mut self.nodes[id].lexeme
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].prev
    }

    /// Insert before `at`; `None` inserts at the end.
    pub fn insert_before(&mut self, at: Option<NodeId>, lexeme: Lexeme) -> NodeId {
        let prev = match at {
            Some(id) => self.nodes[id].prev,
            None => self.tail,
        };
        let id = self.nodes.len();
        self.nodes.push(Node {
            lexeme,
            prev,
            next: at,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(id),
            None => self.head = Some(id),
        }
        match at {
            Some(n) => self.nodes[n].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    pub fn push_back(&mut self, lexeme: Lexeme) -> NodeId {
        self.insert_before(None, lexeme)
    }

    /// Unlink a node. Its id must not be walked from afterwards.
    pub fn remove(&mut self, id: NodeId) {
        let prev = self.nodes[id].prev;
        let next = self.nodes[id].next;
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }

    /// Unlink `[begin, end)`; `None` unlinks through the tail.
    pub fn remove_range(&mut self, begin: NodeId, end: Option<NodeId>) {
        let mut cur = Some(begin);
        while let Some(id) = cur {
            if Some(id) == end {
                break;
            }
            let next = self.nodes[id].next;
            self.remove(id);
            cur = next;
        }
    }

    /// Link a freshly lexed run into the list before `at`, returning the
    /// first new id (None for an empty run).
    pub fn splice_before(
        &mut self,
        at: Option<NodeId>,
        lexemes: Vec<Lexeme>,
    ) -> Option<NodeId> {
        let mut first = None;
        for lexeme in lexemes {
            let id = self.insert_before(at, lexeme);
            if first.is_none() {
                first = Some(id);
            }
        }
        first
    }

    pub fn iter(&self) -> Iter {
        Iter {
            list: self,
            cur: self.head,
        }
    }
}

pub struct Iter<'a> {
    list: &'a LexemeList,
    cur: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Lexeme;

    fn next(&mut self) -> Option<&'a Lexeme> {
        let id = self.cur?;
        self.cur = self.list.nodes[id].next;
        Some(&self.list.nodes[id].lexeme)
    }
}
