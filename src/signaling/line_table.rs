use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::presence::Principal;
use crate::signaling::protocol::CallId;
use crate::utils::{lock, read, write};

type Line = Arc<Mutex<Option<CallId>>>;

/// Which non-ended call each principal is party to.
///
/// Each principal has its own line lock; a call claims both lines together,
/// always locking in principal order so crossing offers cannot deadlock.
#[derive(Debug, Default)]
pub struct LineTable {
    lines: RwLock<HashMap<Principal, Line>>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, principal: &str) -> Line {
        if let Some(line) = read(&self.lines).get(principal) {
            return line.clone();
        }
        write(&self.lines)
            .entry(principal.to_owned())
            .or_default()
            .clone()
    }

    /// Put `a` and `b` on `call_id`. Fails with the call already holding
    /// one of the lines (or `a == b`), leaving both lines unchanged.
    pub fn claim_pair(&self, a: &str, b: &str, call_id: &str) -> Result<(), Option<CallId>> {
        if a == b {
            return Err(None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.line(first);
        let second = self.line(second);

        let mut first = lock(&first);
        let mut second = lock(&second);
        if let Some(held) = first.as_ref().or(second.as_ref()) {
            return Err(Some(held.clone()));
        }
        *first = Some(call_id.to_owned());
        *second = Some(call_id.to_owned());
        Ok(())
    }

    /// Free `principal`'s line if it is still held by `call_id`.
    pub fn release(&self, principal: &str, call_id: &str) {
        let Some(line) = read(&self.lines).get(principal).cloned() else {
            return;
        };
        let mut line = lock(&line);
        if line.as_deref() == Some(call_id) {
            *line = None;
        }
    }

    pub fn current(&self, principal: &str) -> Option<CallId> {
        let line = read(&self.lines).get(principal).cloned()?;
        lock(&line).clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::thread;

    #[test]
    fn second_call_for_a_busy_principal_is_refused() {
        let lines = LineTable::new();
        lines.claim_pair("bob", "carol", "call-1").unwrap();

        assert_eq!(
            lines.claim_pair("alice", "bob", "call-2"),
            Err(Some("call-1".to_owned()))
        );
        assert_eq!(lines.current("alice"), None, "failed claim must not hold alice");
        assert_eq!(lines.current("carol").as_deref(), Some("call-1"));
    }

    #[test]
    fn release_only_clears_the_owning_call() {
        let lines = LineTable::new();
        lines.claim_pair("alice", "bob", "call-1").unwrap();
        lines.release("alice", "call-9");
        assert_eq!(lines.current("alice").as_deref(), Some("call-1"));

        lines.release("alice", "call-1");
        lines.release("bob", "call-1");
        lines.claim_pair("bob", "alice", "call-2").unwrap();
    }

    #[test]
    fn self_call_is_refused() {
        let lines = LineTable::new();
        assert_eq!(lines.claim_pair("alice", "alice", "call-1"), Err(None));
    }

    #[test]
    fn crossing_claims_have_exactly_one_winner() {
        for _ in 0..50 {
            let lines = Arc::new(LineTable::new());
            let l1 = lines.clone();
            let l2 = lines.clone();
            let a = thread::spawn(move || l1.claim_pair("alice", "bob", "call-a").is_ok());
            let b = thread::spawn(move || l2.claim_pair("bob", "alice", "call-b").is_ok());
            let wins = [a.join().unwrap(), b.join().unwrap()];
            assert_eq!(wins.iter().filter(|w| **w).count(), 1);
        }
    }
}
