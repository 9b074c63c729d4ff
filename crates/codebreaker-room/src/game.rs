//! Game session state machine: progress, end detection, results.
//!
//! Pure bookkeeping. Nothing here sends events or owns timers; the room
//! actor calls in, looks at what came back, and decides who hears about
//! it.

use chrono::{DateTime, Utc};
use codebreaker_protocol::{
    Attempt, EndReason, PlayerId, PlayerResult, RoomSettings, SessionStatus,
};
use tokio::time::Instant;

use crate::rematch::RematchState;
use crate::scoring::score_guess;
use crate::RoomError;

/// One player's race through a session.
#[derive(Debug, Clone)]
pub(crate) struct PlayerProgress {
    pub player_id: PlayerId,
    pub player_name: String,
    pub attempts: Vec<Attempt>,
    pub started: Instant,
    pub ended: Option<Instant>,
    pub won: bool,
    pub finished: bool,
}

impl PlayerProgress {
    fn new(player_id: PlayerId, player_name: String, now: Instant) -> Self {
        Self {
            player_id,
            player_name,
            attempts: Vec::new(),
            started: now,
            ended: None,
            won: false,
            finished: false,
        }
    }

    /// Milliseconds from start to verdict, measured against `now` while
    /// still racing.
    pub fn duration_ms(&self, now: Instant) -> u64 {
        let end = self.ended.unwrap_or(now);
        end.saturating_duration_since(self.started).as_millis() as u64
    }

    fn finish(&mut self, won: bool, now: Instant) {
        self.won = won;
        self.finished = true;
        self.ended = Some(now);
    }

    fn result(&self, now: Instant) -> PlayerResult {
        PlayerResult {
            player_id: self.player_id.clone(),
            player_name: self.player_name.clone(),
            attempts: self.attempts.len(),
            duration: self.duration_ms(now),
            attempts_details: self.attempts.clone(),
            rank: None,
        }
    }
}

/// What a submitted guess did to the submitter's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GuessOutcome {
    /// The guess was scored and recorded.
    Scored {
        player_name: String,
        attempt: Attempt,
        attempt_number: usize,
        won: bool,
        /// The budget is used up without a win; the player just lost.
        exhausted: bool,
    },
    /// The budget was already used up; nothing was recorded and the
    /// player just lost.
    Exhausted,
}

/// Final standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GameResults {
    pub winners: Vec<PlayerResult>,
    pub losers: Vec<PlayerResult>,
    pub still_playing: Vec<PlayerResult>,
    pub reason: EndReason,
}

/// One play-through: a shared secret and everyone's race to it.
///
/// ```text
/// Playing ──(all finished | last player standing)──→ Finished
/// ```
///
/// A session is created directly in `Playing`. Once `Finished` only its
/// [`RematchState`] changes.
#[derive(Debug)]
pub(crate) struct GameSession {
    secret: Vec<u8>,
    status: SessionStatus,
    /// In start order, so results ties resolve the same way every time.
    progress: Vec<PlayerProgress>,
    started: Instant,
    started_at: DateTime<Utc>,
    ended: Option<Instant>,
    pub rematch: RematchState,
}

impl GameSession {
    /// Starts a session for `players` racing towards `secret`.
    pub fn start(secret: Vec<u8>, players: impl IntoIterator<Item = (PlayerId, String)>) -> Self {
        let now = Instant::now();
        Self {
            secret,
            status: SessionStatus::Playing,
            progress: players
                .into_iter()
                .map(|(id, name)| PlayerProgress::new(id, name, now))
                .collect(),
            started: now,
            started_at: Utc::now(),
            ended: None,
            rematch: RematchState::default(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// Wall-clock start, reported to reconnecting clients.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Milliseconds from start to end, or to now while still playing.
    pub fn duration_ms(&self) -> u64 {
        let end = self.ended.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started).as_millis() as u64
    }

    pub fn progress(&self, player_id: &PlayerId) -> Option<&PlayerProgress> {
        self.progress.iter().find(|p| &p.player_id == player_id)
    }

    fn progress_mut(&mut self, player_id: &PlayerId) -> Option<&mut PlayerProgress> {
        self.progress.iter_mut().find(|p| &p.player_id == player_id)
    }

    /// Scores and records a guess.
    ///
    /// # Errors
    /// - [`RoomError::NotInGame`] if the player has no progress here.
    /// - [`RoomError::AlreadyFinished`] if the player already has a verdict.
    /// - [`RoomError::GameAlreadyFinished`] if the session is over.
    pub fn submit_guess(
        &mut self,
        player_id: &PlayerId,
        guess: Vec<u8>,
        settings: &RoomSettings,
    ) -> Result<GuessOutcome, RoomError> {
        let playing = self.is_playing();
        let score = score_guess(&self.secret, &guess);
        let progress = self.progress_mut(player_id).ok_or(RoomError::NotInGame)?;
        if progress.finished {
            return Err(RoomError::AlreadyFinished);
        }
        if !playing {
            return Err(RoomError::GameAlreadyFinished);
        }

        let now = Instant::now();
        let budget = settings.max_attempts as usize;
        if progress.attempts.len() >= budget {
            progress.finish(false, now);
            return Ok(GuessOutcome::Exhausted);
        }

        let attempt = Attempt {
            guess,
            correct_count: score.correct_count,
            correct_position_count: score.correct_position_count,
            timestamp: Utc::now(),
        };
        progress.attempts.push(attempt.clone());
        let attempt_number = progress.attempts.len();

        let won = score.correct_position_count == settings.digit_count as usize;
        let exhausted = !won && attempt_number >= budget;
        if won || exhausted {
            progress.finish(won, now);
        }

        Ok(GuessOutcome::Scored {
            player_name: progress.player_name.clone(),
            attempt,
            attempt_number,
            won,
            exhausted,
        })
    }

    /// Marks a still-racing player as lost. Returns `false` if there was
    /// nothing to do (no progress, already finished, session over).
    pub fn forfeit(&mut self, player_id: &PlayerId) -> bool {
        if !self.is_playing() {
            return false;
        }
        match self.progress_mut(player_id) {
            Some(progress) if !progress.finished => {
                progress.finish(false, Instant::now());
                true
            }
            _ => false,
        }
    }

    /// Finishes the session if its end condition holds.
    ///
    /// - Exactly one player still racing while someone else already
    ///   finished: that player wins by default (last player standing).
    /// - Nobody still racing: everyone is done.
    ///
    /// Only transitions out of `Playing`, so it yields results at most
    /// once per session.
    pub fn check_end(&mut self) -> Option<GameResults> {
        if !self.is_playing() {
            return None;
        }
        let now = Instant::now();
        let racing: Vec<usize> = self
            .progress
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.finished)
            .map(|(i, _)| i)
            .collect();
        let someone_finished = racing.len() < self.progress.len();

        let reason = match racing.as_slice() {
            [last] if someone_finished => {
                self.progress[*last].finish(true, now);
                EndReason::LastPlayerStanding
            }
            [] => EndReason::AllFinished,
            _ => return None,
        };

        debug_assert!(self.status.can_transition_to(SessionStatus::Finished));
        self.status = SessionStatus::Finished;
        self.ended = Some(now);
        Some(self.results(reason, now))
    }

    /// Winners by fewest attempts then fastest, ranked from 1. Losers by
    /// longest survival, unranked.
    fn results(&self, reason: EndReason, now: Instant) -> GameResults {
        let mut winners = Vec::new();
        let mut losers = Vec::new();
        let mut still_playing = Vec::new();
        for progress in &self.progress {
            let result = progress.result(now);
            if progress.won {
                winners.push(result);
            } else if progress.finished {
                losers.push(result);
            } else {
                still_playing.push(result);
            }
        }

        winners.sort_by_key(|r| (r.attempts, r.duration));
        for (i, winner) in winners.iter_mut().enumerate() {
            winner.rank = Some(i + 1);
        }
        losers.sort_by(|a, b| b.duration.cmp(&a.duration));

        GameResults {
            winners,
            losers,
            still_playing,
            reason,
        }
    }

    /// Another player's history, if the requester may see it.
    ///
    /// Guesses stay hidden while both are still racing.
    ///
    /// # Errors
    /// - [`RoomError::GameInProgress`] while the session runs and the
    ///   requester has no verdict yet.
    /// - [`RoomError::UnknownPlayer`] if the target never played.
    pub fn details(
        &self,
        requester: &PlayerId,
        target: &PlayerId,
    ) -> Result<&PlayerProgress, RoomError> {
        let requester_done = self.progress(requester).is_some_and(|p| p.finished);
        if !self.is_finished() && !requester_done {
            return Err(RoomError::GameInProgress);
        }
        self.progress(target)
            .ok_or_else(|| RoomError::UnknownPlayer(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const SECRET: [u8; 4] = [1, 2, 3, 4];

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn settings(max_attempts: u32) -> RoomSettings {
        RoomSettings {
            digit_count: 4,
            max_attempts,
        }
    }

    fn session(players: &[&str]) -> GameSession {
        GameSession::start(
            SECRET.to_vec(),
            players.iter().map(|p| (pid(p), p.to_uppercase())),
        )
    }

    #[tokio::test]
    async fn test_session_starts_playing_and_only_moves_to_finished() {
        let mut game = session(&["a", "b"]);
        assert_eq!(game.status(), SessionStatus::Playing);
        assert_ne!(game.status(), SessionStatus::Waiting);

        game.forfeit(&pid("a"));
        assert!(game.check_end().is_some());
        assert_eq!(game.status(), SessionStatus::Finished);
        assert!(!game.status().can_transition_to(SessionStatus::Playing));
    }

    #[tokio::test]
    async fn test_submit_guess_records_attempt() {
        let mut game = session(&["a", "b"]);

        let outcome = game
            .submit_guess(&pid("a"), vec![1, 3, 2, 9], &settings(20))
            .unwrap();

        match outcome {
            GuessOutcome::Scored { player_name, attempt, attempt_number, won, exhausted } => {
                assert_eq!(player_name, "A");
                assert_eq!(attempt.correct_count, 3);
                assert_eq!(attempt.correct_position_count, 1);
                assert_eq!(attempt_number, 1);
                assert!(!won);
                assert!(!exhausted);
            }
            other => panic!("expected Scored, got {other:?}"),
        }
        assert_eq!(game.progress(&pid("a")).unwrap().attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_guess_exact_match_wins() {
        let mut game = session(&["a", "b"]);

        let outcome = game
            .submit_guess(&pid("a"), SECRET.to_vec(), &settings(20))
            .unwrap();

        assert!(matches!(outcome, GuessOutcome::Scored { won: true, .. }));
        let a = game.progress(&pid("a")).unwrap();
        assert!(a.won && a.finished && a.ended.is_some());
    }

    #[tokio::test]
    async fn test_submit_guess_after_finish_is_rejected() {
        let mut game = session(&["a", "b", "c"]);
        game.submit_guess(&pid("a"), SECRET.to_vec(), &settings(20)).unwrap();

        let err = game
            .submit_guess(&pid("a"), SECRET.to_vec(), &settings(20))
            .unwrap_err();

        assert_eq!(err, RoomError::AlreadyFinished);
    }

    #[tokio::test]
    async fn test_submit_guess_unknown_player_is_not_in_game() {
        let mut game = session(&["a", "b"]);
        let err = game
            .submit_guess(&pid("zz"), vec![1], &settings(20))
            .unwrap_err();
        assert_eq!(err, RoomError::NotInGame);
    }

    #[tokio::test]
    async fn test_last_allowed_attempt_exhausts() {
        let mut game = session(&["a", "b"]);
        let rules = settings(5);
        for _ in 0..4 {
            let outcome = game.submit_guess(&pid("a"), vec![0, 0, 0, 0], &rules).unwrap();
            assert!(matches!(outcome, GuessOutcome::Scored { exhausted: false, .. }));
        }

        let outcome = game.submit_guess(&pid("a"), vec![0, 0, 0, 0], &rules).unwrap();

        assert!(matches!(
            outcome,
            GuessOutcome::Scored { attempt_number: 5, won: false, exhausted: true, .. }
        ));
        let a = game.progress(&pid("a")).unwrap();
        assert!(a.finished && !a.won);
        assert_eq!(a.attempts.len(), 5);
    }

    #[tokio::test]
    async fn test_winning_on_last_attempt_is_a_win() {
        let mut game = session(&["a", "b"]);
        let rules = settings(5);
        for _ in 0..4 {
            game.submit_guess(&pid("a"), vec![0, 0, 0, 0], &rules).unwrap();
        }

        let outcome = game.submit_guess(&pid("a"), SECRET.to_vec(), &rules).unwrap();

        assert!(matches!(
            outcome,
            GuessOutcome::Scored { won: true, exhausted: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_check_end_waits_while_two_race() {
        let mut game = session(&["a", "b", "c"]);
        game.submit_guess(&pid("a"), SECRET.to_vec(), &settings(20)).unwrap();

        assert!(game.check_end().is_none());
        assert!(game.is_playing());
    }

    #[tokio::test]
    async fn test_check_end_last_player_standing_wins_by_default() {
        let mut game = session(&["a", "b"]);
        game.submit_guess(&pid("a"), SECRET.to_vec(), &settings(20)).unwrap();

        let results = game.check_end().expect("session should end");

        assert_eq!(results.reason, EndReason::LastPlayerStanding);
        assert_eq!(results.winners.len(), 2);
        assert!(results.still_playing.is_empty());
        let b = game.progress(&pid("b")).unwrap();
        assert!(b.won && b.finished);
        assert!(game.is_finished());
    }

    #[tokio::test]
    async fn test_check_end_fires_only_once() {
        let mut game = session(&["a", "b"]);
        game.submit_guess(&pid("a"), SECRET.to_vec(), &settings(20)).unwrap();
        assert!(game.check_end().is_some());

        assert!(game.check_end().is_none());
    }

    #[tokio::test]
    async fn test_check_end_all_finished() {
        let mut game = session(&["a", "b"]);
        game.forfeit(&pid("a"));
        game.forfeit(&pid("b"));

        let results = game.check_end().expect("everyone is done");

        assert_eq!(results.reason, EndReason::AllFinished);
        assert!(results.winners.is_empty());
        assert_eq!(results.losers.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_rank_winners_by_attempts_then_duration() {
        let mut game = session(&["a", "b", "c", "d"]);
        let rules = settings(20);

        // c: two attempts, at t=1s.
        tokio::time::advance(Duration::from_secs(1)).await;
        game.submit_guess(&pid("c"), vec![0, 0, 0, 0], &rules).unwrap();
        game.submit_guess(&pid("c"), SECRET.to_vec(), &rules).unwrap();
        // a: one attempt, at t=2s.
        tokio::time::advance(Duration::from_secs(1)).await;
        game.submit_guess(&pid("a"), SECRET.to_vec(), &rules).unwrap();
        // b: one attempt, at t=3s.
        tokio::time::advance(Duration::from_secs(1)).await;
        game.submit_guess(&pid("b"), SECRET.to_vec(), &rules).unwrap();

        let results = game.check_end().expect("d stands alone");

        let order: Vec<_> = results
            .winners
            .iter()
            .map(|r| (r.player_id.as_str().to_owned(), r.rank))
            .collect();
        // d auto-wins with zero attempts.
        assert_eq!(
            order,
            vec![
                ("d".to_owned(), Some(1)),
                ("a".to_owned(), Some(2)),
                ("b".to_owned(), Some(3)),
                ("c".to_owned(), Some(4)),
            ]
        );
        assert_eq!(results.winners[1].duration, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_order_losers_by_longest_survival() {
        let mut game = session(&["a", "b", "c"]);
        tokio::time::advance(Duration::from_secs(1)).await;
        game.forfeit(&pid("a"));
        tokio::time::advance(Duration::from_secs(4)).await;
        game.forfeit(&pid("b"));
        tokio::time::advance(Duration::from_secs(2)).await;
        game.forfeit(&pid("c"));

        let results = game.check_end().unwrap();

        let durations: Vec<_> = results.losers.iter().map(|r| r.duration).collect();
        assert_eq!(durations, vec![7000, 5000, 1000]);
        assert!(results.losers.iter().all(|r| r.rank.is_none()));
    }

    #[tokio::test]
    async fn test_forfeit_is_idempotent() {
        let mut game = session(&["a", "b", "c"]);
        assert!(game.forfeit(&pid("a")));
        assert!(!game.forfeit(&pid("a")));
        assert!(!game.forfeit(&pid("nobody")));
    }

    #[tokio::test]
    async fn test_details_hidden_while_both_race() {
        let mut game = session(&["a", "b", "c"]);
        assert_eq!(
            game.details(&pid("a"), &pid("b")).unwrap_err(),
            RoomError::GameInProgress
        );

        game.forfeit(&pid("a"));
        assert_eq!(game.details(&pid("a"), &pid("b")).unwrap().player_name, "B");
        assert_eq!(
            game.details(&pid("a"), &pid("zz")).unwrap_err(),
            RoomError::UnknownPlayer(pid("zz"))
        );
    }
}
