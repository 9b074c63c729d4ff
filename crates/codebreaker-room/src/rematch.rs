//! Rematch vote bookkeeping.
//!
//! The countdown itself is a timer owned by the room actor; this is just
//! the ballot box.

use codebreaker_protocol::{PlayerId, VoteEntry};

use crate::RoomError;

/// Votes for a rematch of a finished session.
#[derive(Debug, Clone, Default)]
pub(crate) struct RematchState {
    requested: bool,
    /// First-vote order, so tallies read the same on every client.
    votes: Vec<VoteEntry>,
}

impl RematchState {
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Opens (or reopens) the vote with the host already in favour.
    pub fn request(&mut self, host: PlayerId) {
        self.requested = true;
        self.votes = vec![VoteEntry {
            player_id: host,
            accepted: true,
        }];
    }

    /// Records or overwrites a vote.
    ///
    /// # Errors
    /// Returns [`RoomError::NoRematchPending`] if no vote is open.
    pub fn vote(&mut self, player_id: PlayerId, accepted: bool) -> Result<(), RoomError> {
        if !self.requested {
            return Err(RoomError::NoRematchPending);
        }
        match self.votes.iter_mut().find(|v| v.player_id == player_id) {
            Some(existing) => existing.accepted = accepted,
            None => self.votes.push(VoteEntry { player_id, accepted }),
        }
        Ok(())
    }

    pub fn tally(&self) -> Vec<VoteEntry> {
        self.votes.clone()
    }

    /// Accepting votes, including those of players who already left.
    pub fn accepted_count(&self) -> usize {
        self.votes.iter().filter(|v| v.accepted).count()
    }

    pub fn has_accepted(&self, player_id: &PlayerId) -> bool {
        self.votes
            .iter()
            .any(|v| v.accepted && &v.player_id == player_id)
    }

    /// Closes the vote without a rematch.
    pub fn reset(&mut self) {
        self.requested = false;
        self.votes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    #[test]
    fn test_vote_without_request_is_rejected() {
        let mut rematch = RematchState::default();
        assert_eq!(
            rematch.vote(pid("a"), true).unwrap_err(),
            RoomError::NoRematchPending
        );
    }

    #[test]
    fn test_request_counts_host_as_accepting() {
        let mut rematch = RematchState::default();
        rematch.request(pid("host"));

        assert!(rematch.is_requested());
        assert_eq!(rematch.accepted_count(), 1);
        assert!(rematch.has_accepted(&pid("host")));
    }

    #[test]
    fn test_vote_overwrites_in_place() {
        let mut rematch = RematchState::default();
        rematch.request(pid("host"));
        rematch.vote(pid("a"), true).unwrap();
        rematch.vote(pid("b"), false).unwrap();

        rematch.vote(pid("a"), false).unwrap();

        let tally = rematch.tally();
        assert_eq!(tally.len(), 3);
        assert_eq!(tally[1], VoteEntry { player_id: pid("a"), accepted: false });
        assert_eq!(rematch.accepted_count(), 1);
    }

    #[test]
    fn test_request_again_restarts_vote() {
        let mut rematch = RematchState::default();
        rematch.request(pid("host"));
        rematch.vote(pid("a"), true).unwrap();

        rematch.request(pid("host"));

        assert_eq!(rematch.tally().len(), 1);
    }

    #[test]
    fn test_reset_closes_vote() {
        let mut rematch = RematchState::default();
        rematch.request(pid("host"));
        rematch.reset();

        assert!(!rematch.is_requested());
        assert!(rematch.tally().is_empty());
        assert!(rematch.vote(pid("a"), true).is_err());
    }
}
