//! Room actor: one Tokio task per room, owning everything about it.
//!
//! The actor is the only code that touches a room's membership, game
//! session, rematch vote and timers. Commands arrive through a bounded
//! mpsc channel; grace deadlines and the rematch countdown are awaited in
//! the same `select!`, so a timer firing and a reconnect racing it are
//! simply handled one after the other.

use std::collections::HashMap;

use codebreaker_protocol::{
    EndReason, PlayerId, PlayerSummary, Recipient, RoomId, RoomSettings,
    ServerEvent, SessionStatus, SettingsRequest,
};
use codebreaker_session::generate_player_id;
use codebreaker_timer::{Countdown, CountdownTick, Deadlines, Expired, TimerId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::validate_settings;
use crate::game::{GameSession, GuessOutcome};
use crate::scoring::generate_secret;
use crate::{RoomConfig, RoomDirectory, RoomError};

const MAX_ATTEMPTS_MESSAGE: &str = "You have used all your attempts";
const KICKED_MESSAGE: &str = "You did not accept the rematch";
const REMATCH_CANCELLED_MESSAGE: &str = "Not enough players accepted the rematch";

/// Channel the room uses to reach one player's connection.
///
/// Unbounded so a slow client never stalls the room; sends to a closed
/// channel are dropped.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Gameplay requests from a room member.
///
/// Failures are not returned to the caller: the room answers the player
/// directly with an `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    UpdateSettings(SettingsRequest),
    StartGame,
    SubmitGuess(Vec<u8>),
    RequestAttemptDetails(PlayerId),
    RequestRematch,
    RematchVote(bool),
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },
    Reconnect {
        player_id: PlayerId,
        player_name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Voluntary exit. No grace period.
    Leave { player_id: PlayerId },
    /// The player's connection dropped.
    Disconnect { player_id: PlayerId },
    Act {
        player_id: PlayerId,
        action: PlayerAction,
    },
    Info { reply: oneshot::Sender<RoomInfo> },
    Shutdown,
}

/// A snapshot of a room, for tests and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub host_id: PlayerId,
    /// Active players in join order.
    pub players: Vec<PlayerSummary>,
    /// Players inside their disconnect grace period.
    pub disconnected: usize,
    /// `Waiting` when there is no session.
    pub status: SessionStatus,
    pub settings: RoomSettings,
    /// Seconds left on a running rematch countdown.
    pub rematch_countdown: Option<u32>,
}

/// Handle to a running room actor.
///
/// Cheap to clone. A handle whose actor has stopped answers every call
/// with [`RoomError::RoomNotFound`].
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Distinguishes this actor from a later room that reuses the code.
    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    fn not_found(&self) -> RoomError {
        RoomError::RoomNotFound(self.room_id.clone())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.not_found())
    }

    /// Takes a new seat. Returns the issued player id.
    ///
    /// On success the room has already queued `room_joined` and
    /// `settings_updated` on `sender`.
    pub async fn join(
        &self,
        player_name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_name: player_name.into(),
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.not_found())?
    }

    /// Reclaims a seat held by a pending disconnect.
    pub async fn reconnect(
        &self,
        player_id: PlayerId,
        player_name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Reconnect {
            player_id,
            player_name: player_name.into(),
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.not_found())?
    }

    /// Leaves for good. A no-op for players who are not active members.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { player_id }).await
    }

    /// Reports a dropped connection.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { player_id }).await
    }

    /// Submits a gameplay action (fire-and-forget).
    pub async fn act(&self, player_id: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        self.send(RoomCommand::Act { player_id, action }).await
    }

    /// Requests a snapshot. Also a barrier: every command sent before it
    /// has been handled once it returns.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply }).await?;
        rx.await.map_err(|_| self.not_found())
    }

    /// Stops the actor after cancelling its timers.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// Actor state
// ---------------------------------------------------------------------------

/// What a grace deadline is for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GraceTimer {
    /// A disconnected player's seat is about to be released.
    Disconnect(PlayerId),
    /// A player out of attempts is kept around for the results.
    Exhausted(PlayerId),
}

struct Member {
    id: PlayerId,
    name: String,
    sender: PlayerSender,
}

struct PendingDisconnect {
    name: String,
    since: Instant,
    timer: TimerId,
}

enum Wake {
    Command(RoomCommand),
    Closed,
    Grace(Expired<GraceTimer>),
    Countdown(CountdownTick),
}

struct RoomActor {
    room_id: RoomId,
    instance: u64,
    config: RoomConfig,
    settings: RoomSettings,
    host_id: PlayerId,
    /// Active players in join order.
    members: Vec<Member>,
    disconnected: HashMap<PlayerId, PendingDisconnect>,
    exhausted: HashMap<PlayerId, TimerId>,
    session: Option<GameSession>,
    grace: Deadlines<GraceTimer>,
    countdown: Countdown,
    directory: RoomDirectory,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, host_id = %self.host_id, "room actor started");

        loop {
            let wake = tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => Wake::Command(cmd),
                    None => Wake::Closed,
                },
                fired = self.grace.expired() => Wake::Grace(fired),
                tick = self.countdown.tick() => Wake::Countdown(tick),
            };

            match wake {
                Wake::Command(RoomCommand::Shutdown) => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    self.cancel_timers();
                    break;
                }
                Wake::Closed => {
                    self.cancel_timers();
                    break;
                }
                Wake::Command(cmd) => self.handle_command(cmd),
                Wake::Grace(fired) => self.handle_grace(fired),
                Wake::Countdown(tick) => self.handle_countdown(tick),
            }

            if self.members.is_empty() && self.disconnected.is_empty() {
                self.destroy();
                break;
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Reconnect {
                player_id,
                player_name,
                sender,
                reply,
            } => {
                let result = self.handle_reconnect(player_id, player_name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id } => self.handle_leave(&player_id),
            RoomCommand::Disconnect { player_id } => self.handle_disconnect(&player_id),
            RoomCommand::Act { player_id, action } => self.handle_action(player_id, action),
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {}
        }
    }

    // -- Membership --------------------------------------------------------

    fn handle_join(&mut self, player_name: String, sender: PlayerSender) -> Result<PlayerId, RoomError> {
        if self.members.len() + self.disconnected.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }
        match self.session.as_ref().map(GameSession::status) {
            Some(SessionStatus::Playing) => return Err(RoomError::GameInProgress),
            Some(SessionStatus::Finished) => return Err(RoomError::GameAlreadyFinished),
            _ => {}
        }

        let player_id = self.fresh_player_id();
        self.members.push(Member {
            id: player_id.clone(),
            name: player_name.clone(),
            sender,
        });
        let host_changed = self.adopt_host_if_absent();

        self.send_to(
            &player_id,
            ServerEvent::RoomJoined {
                room_id: self.room_id.clone(),
                player_id: player_id.clone(),
                host_id: self.host_id.clone(),
                players: self.roster(),
            },
        );
        self.send_to(&player_id, ServerEvent::SettingsUpdated { settings: self.settings });
        if host_changed {
            self.announce_host();
        }
        self.dispatch(Recipient::All, self.players_updated());

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            %player_name,
            players = self.members.len(),
            "player joined"
        );
        Ok(player_id)
    }

    fn handle_reconnect(
        &mut self,
        player_id: PlayerId,
        player_name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let pending = self
            .disconnected
            .remove(&player_id)
            .ok_or_else(|| RoomError::SessionExpired(player_id.clone()))?;
        self.grace.cancel(pending.timer);
        self.cancel_exhausted(&player_id);

        self.members.push(Member {
            id: player_id.clone(),
            name: player_name.clone(),
            sender,
        });
        let host_changed = self.adopt_host_if_absent();

        self.send_to(
            &player_id,
            ServerEvent::RoomRejoined {
                room_id: self.room_id.clone(),
                player_id: player_id.clone(),
                host_id: self.host_id.clone(),
                players: self.roster(),
            },
        );
        if let Some(session) = &self.session {
            self.send_to(
                &player_id,
                ServerEvent::GameState {
                    shared_secret: session.secret().to_vec(),
                    status: session.status(),
                    settings: self.settings,
                    game_start_time: session.started_at(),
                },
            );
            if let Some(progress) = session.progress(&player_id) {
                self.send_to(
                    &player_id,
                    ServerEvent::PlayerGameState {
                        attempts: progress.attempts.clone(),
                        finished: progress.finished,
                        won: progress.won,
                    },
                );
            }
        }
        self.dispatch(
            Recipient::AllExcept(player_id.clone()),
            ServerEvent::PlayerReconnected {
                player_id: player_id.clone(),
                player_name: player_name.clone(),
            },
        );
        if host_changed {
            self.announce_host();
        }
        self.dispatch(Recipient::AllExcept(player_id.clone()), self.players_updated());

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            %player_name,
            away_ms = pending.since.elapsed().as_millis() as u64,
            "player reconnected"
        );
        Ok(())
    }

    fn handle_disconnect(&mut self, player_id: &PlayerId) {
        let Some(member) = self.remove_member(player_id) else {
            return;
        };

        if self.session.as_ref().is_some_and(GameSession::is_finished) {
            // Results were already delivered; nothing to hold the seat for.
            self.cancel_exhausted(player_id);
            tracing::info!(room_id = %self.room_id, %player_id, "player dropped from finished game");
        } else {
            let timer = self.grace.schedule(
                GraceTimer::Disconnect(player_id.clone()),
                self.config.reconnect_grace,
            );
            self.disconnected.insert(
                player_id.clone(),
                PendingDisconnect {
                    name: member.name.clone(),
                    since: Instant::now(),
                    timer,
                },
            );
            tracing::info!(room_id = %self.room_id, %player_id, "player disconnected, grace period started");
        }

        self.dispatch(
            Recipient::All,
            ServerEvent::PlayerDisconnected {
                player_id: player_id.clone(),
                player_name: member.name,
            },
        );
        if !self.members.is_empty() {
            if self.adopt_host_if_absent() {
                self.announce_host();
            }
            self.dispatch(Recipient::All, self.players_updated());
        }
    }

    fn handle_leave(&mut self, player_id: &PlayerId) {
        let Some(member) = self.remove_member(player_id) else {
            return;
        };
        self.cancel_exhausted(player_id);

        let forfeited = self.session.as_mut().is_some_and(|s| s.forfeit(player_id));
        if forfeited {
            self.dispatch(
                Recipient::All,
                ServerEvent::PlayerQuit {
                    player_id: player_id.clone(),
                    player_name: member.name.clone(),
                },
            );
        }
        if !self.members.is_empty() {
            if self.adopt_host_if_absent() {
                self.announce_host();
            }
            self.dispatch(Recipient::All, self.players_updated());
        }
        if forfeited {
            self.finish_if_over();
        }

        tracing::info!(room_id = %self.room_id, %player_id, player_name = %member.name, "player left");
    }

    // -- Gameplay ----------------------------------------------------------

    fn handle_action(&mut self, player_id: PlayerId, action: PlayerAction) {
        if self.member(&player_id).is_none() {
            tracing::debug!(room_id = %self.room_id, %player_id, "action from non-member, ignoring");
            return;
        }

        let result = match action {
            PlayerAction::UpdateSettings(settings) => self.update_settings(&player_id, settings),
            PlayerAction::StartGame => self.start_game(&player_id),
            PlayerAction::SubmitGuess(guess) => self.submit_guess(&player_id, guess),
            PlayerAction::RequestAttemptDetails(target) => self.send_details(&player_id, &target),
            PlayerAction::RequestRematch => self.request_rematch(&player_id),
            PlayerAction::RematchVote(accepted) => self.rematch_vote(&player_id, accepted),
        };

        if let Err(err) = result {
            tracing::debug!(room_id = %self.room_id, %player_id, %err, "action rejected");
            self.dispatch(Recipient::Player(player_id), ServerEvent::error(&err));
        }
    }

    fn update_settings(&mut self, player_id: &PlayerId, request: SettingsRequest) -> Result<(), RoomError> {
        self.require_host(player_id)?;
        if self.session.as_ref().is_some_and(GameSession::is_playing) {
            return Err(RoomError::GameInProgress);
        }
        let settings = validate_settings(&request)?;

        self.settings = settings;
        self.dispatch(Recipient::All, ServerEvent::SettingsUpdated { settings });
        tracing::info!(
            room_id = %self.room_id,
            digit_count = settings.digit_count,
            max_attempts = settings.max_attempts,
            "settings updated"
        );
        Ok(())
    }

    fn start_game(&mut self, player_id: &PlayerId) -> Result<(), RoomError> {
        self.require_host(player_id)?;
        if self.session.as_ref().is_some_and(GameSession::is_playing) {
            return Err(RoomError::GameInProgress);
        }
        let min = self.config.min_players_to_start;
        if self.members.len() < min {
            return Err(RoomError::InsufficientPlayers(min));
        }

        self.countdown.cancel();
        let stale: Vec<PlayerId> = self.exhausted.keys().cloned().collect();
        for id in stale {
            self.cancel_exhausted(&id);
        }

        let secret = generate_secret(self.settings.digit_count);
        let session = GameSession::start(
            secret.clone(),
            self.members.iter().map(|m| (m.id.clone(), m.name.clone())),
        );
        self.session = Some(session);
        self.dispatch(
            Recipient::All,
            ServerEvent::GameStarted {
                shared_secret: secret,
                settings: self.settings,
            },
        );

        tracing::info!(room_id = %self.room_id, players = self.members.len(), "game started");
        Ok(())
    }

    fn submit_guess(&mut self, player_id: &PlayerId, guess: Vec<u8>) -> Result<(), RoomError> {
        let settings = self.settings;
        let session = self.session.as_mut().ok_or(RoomError::NotInGame)?;
        let outcome = session.submit_guess(player_id, guess, &settings)?;

        match outcome {
            GuessOutcome::Scored {
                player_name,
                attempt,
                attempt_number,
                won,
                exhausted,
            } => {
                self.send_to(
                    player_id,
                    ServerEvent::GuessResult {
                        guess: attempt.guess,
                        correct_count: attempt.correct_count,
                        correct_position_count: attempt.correct_position_count,
                        won,
                        attempt_number,
                    },
                );
                self.dispatch(
                    Recipient::AllExcept(player_id.clone()),
                    ServerEvent::PlayerAttempt {
                        player_id: player_id.clone(),
                        player_name,
                        attempt_number,
                        won,
                    },
                );
                if exhausted {
                    self.exhaust(player_id);
                }
                if won {
                    tracing::info!(room_id = %self.room_id, %player_id, attempt_number, "player cracked the code");
                }
                if won || exhausted {
                    self.finish_if_over();
                }
            }
            GuessOutcome::Exhausted => {
                self.exhaust(player_id);
                self.finish_if_over();
            }
        }
        Ok(())
    }

    /// Tells a player they are out of attempts and keeps them around for
    /// the results.
    fn exhaust(&mut self, player_id: &PlayerId) {
        self.send_to(
            player_id,
            ServerEvent::MaxAttemptsReached {
                message: MAX_ATTEMPTS_MESSAGE.to_owned(),
            },
        );
        let timer = self.grace.schedule(
            GraceTimer::Exhausted(player_id.clone()),
            self.config.exhausted_grace,
        );
        if let Some(previous) = self.exhausted.insert(player_id.clone(), timer) {
            self.grace.cancel(previous);
        }
        tracing::info!(room_id = %self.room_id, %player_id, "player out of attempts");
    }

    /// Ends the session if its end condition holds and delivers results.
    fn finish_if_over(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(results) = session.check_end() else {
            return;
        };

        let reason = results.reason;
        let event = ServerEvent::GameResults {
            winners: results.winners,
            losers: results.losers,
            still_playing: results.still_playing,
            shared_secret: session.secret().to_vec(),
            reason,
        };
        for member in &self.members {
            let deliver = match reason {
                EndReason::AllFinished => true,
                EndReason::LastPlayerStanding => {
                    session.progress(&member.id).is_some_and(|p| p.finished)
                }
            };
            if deliver {
                let _ = member.sender.send(event.clone());
            }
        }

        tracing::info!(
            room_id = %self.room_id,
            ?reason,
            duration_ms = session.duration_ms(),
            "game finished"
        );
    }

    fn send_details(&mut self, player_id: &PlayerId, target: &PlayerId) -> Result<(), RoomError> {
        let session = self.session.as_ref().ok_or(RoomError::NotInGame)?;
        let progress = session.details(player_id, target)?;
        let duration = match progress.ended {
            Some(_) => progress.duration_ms(Instant::now()),
            None => 0,
        };
        let event = ServerEvent::PlayerDetails {
            player_id: progress.player_id.clone(),
            player_name: progress.player_name.clone(),
            attempts: progress.attempts.clone(),
            duration,
        };
        self.send_to(player_id, event);
        Ok(())
    }

    // -- Rematch -----------------------------------------------------------

    fn request_rematch(&mut self, player_id: &PlayerId) -> Result<(), RoomError> {
        self.require_host(player_id)?;
        let session = self
            .session
            .as_mut()
            .filter(|s| s.is_finished())
            .ok_or(RoomError::GameNotFinished)?;

        session.rematch.request(player_id.clone());
        let secs = self.config.rematch_countdown_secs;
        self.countdown.start(secs);
        self.dispatch(Recipient::All, ServerEvent::RematchRequested { countdown: secs });

        tracing::info!(room_id = %self.room_id, countdown = secs, "rematch requested");
        Ok(())
    }

    fn rematch_vote(&mut self, player_id: &PlayerId, accepted: bool) -> Result<(), RoomError> {
        let session = self.session.as_mut().ok_or(RoomError::NoRematchPending)?;
        session.rematch.vote(player_id.clone(), accepted)?;
        let votes = session.rematch.tally();

        self.dispatch(
            Recipient::All,
            ServerEvent::RematchVoteUpdate {
                player_id: player_id.clone(),
                accepted,
                votes,
            },
        );
        Ok(())
    }

    fn handle_countdown(&mut self, tick: CountdownTick) {
        let Some(session) = self.session.as_ref().filter(|s| s.rematch.is_requested()) else {
            return;
        };
        if tick.remaining > 0 {
            let votes = session.rematch.tally();
            self.dispatch(
                Recipient::All,
                ServerEvent::RematchCountdown {
                    countdown: tick.remaining,
                    votes,
                },
            );
        } else {
            self.resolve_rematch();
        }
    }

    /// Countdown reached zero: go ahead with whoever accepted, or cancel.
    fn resolve_rematch(&mut self) {
        let min = self.config.rematch_min_accepts;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.rematch.accepted_count() < min {
            session.rematch.reset();
            self.dispatch(
                Recipient::All,
                ServerEvent::RematchCancelled {
                    message: REMATCH_CANCELLED_MESSAGE.to_owned(),
                },
            );
            tracing::info!(room_id = %self.room_id, "rematch cancelled");
            return;
        }

        let ballot = std::mem::take(&mut session.rematch);
        self.session = None;

        let host = self.host_id.clone();
        let (kept, kicked): (Vec<Member>, Vec<Member>) = std::mem::take(&mut self.members)
            .into_iter()
            .partition(|m| m.id == host || ballot.has_accepted(&m.id));
        self.members = kept;

        for member in kicked {
            let _ = member.sender.send(ServerEvent::KickedFromRoom {
                message: KICKED_MESSAGE.to_owned(),
            });
            tracing::info!(room_id = %self.room_id, player_id = %member.id, "player kicked after rematch vote");
        }
        let stale: Vec<PlayerId> = self.exhausted.keys().cloned().collect();
        for id in stale {
            self.cancel_exhausted(&id);
        }

        self.dispatch(Recipient::All, ServerEvent::RematchStarting { players: self.roster() });
        tracing::info!(room_id = %self.room_id, players = self.members.len(), "rematch starting");
    }

    // -- Timers ------------------------------------------------------------

    fn handle_grace(&mut self, fired: Expired<GraceTimer>) {
        match fired.key {
            GraceTimer::Disconnect(player_id) => {
                // Stale if the player reconnected and disconnected again.
                let current = self.disconnected.get(&player_id).map(|p| p.timer);
                if current != Some(fired.id) {
                    return;
                }
                let Some(pending) = self.disconnected.remove(&player_id) else {
                    return;
                };
                self.cancel_exhausted(&player_id);
                tracing::info!(room_id = %self.room_id, %player_id, "disconnect grace expired");

                if self.session.as_mut().is_some_and(|s| s.forfeit(&player_id)) {
                    self.dispatch(
                        Recipient::All,
                        ServerEvent::PlayerTimeout {
                            player_id: player_id.clone(),
                            player_name: pending.name,
                        },
                    );
                    self.finish_if_over();
                }
            }
            GraceTimer::Exhausted(player_id) => {
                if self.exhausted.get(&player_id) != Some(&fired.id) {
                    return;
                }
                self.exhausted.remove(&player_id);
                self.finish_if_over();
            }
        }
    }

    fn cancel_exhausted(&mut self, player_id: &PlayerId) {
        if let Some(timer) = self.exhausted.remove(player_id) {
            self.grace.cancel(timer);
        }
    }

    fn cancel_timers(&mut self) {
        self.grace.clear();
        self.exhausted.clear();
        self.countdown.cancel();
    }

    fn destroy(&mut self) {
        self.cancel_timers();
        self.session = None;
        self.directory.remove(&self.room_id, self.instance);
        tracing::info!(room_id = %self.room_id, "room destroyed (empty)");
    }

    // -- Helpers -----------------------------------------------------------

    fn member(&self, player_id: &PlayerId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == player_id)
    }

    fn remove_member(&mut self, player_id: &PlayerId) -> Option<Member> {
        let index = self.members.iter().position(|m| &m.id == player_id)?;
        Some(self.members.remove(index))
    }

    fn require_host(&self, player_id: &PlayerId) -> Result<(), RoomError> {
        if &self.host_id == player_id {
            Ok(())
        } else {
            Err(RoomError::NotHost)
        }
    }

    /// Hands the host role to the first active player if the recorded
    /// host is not active. Returns `true` if the host changed.
    fn adopt_host_if_absent(&mut self) -> bool {
        if self.member(&self.host_id).is_some() {
            return false;
        }
        let Some(first) = self.members.first() else {
            return false;
        };
        self.host_id = first.id.clone();
        tracing::info!(room_id = %self.room_id, host_id = %self.host_id, "host changed");
        true
    }

    fn announce_host(&self) {
        self.dispatch(
            Recipient::All,
            ServerEvent::HostChanged {
                new_host_id: self.host_id.clone(),
            },
        );
    }

    /// A player id not used by anyone this room still remembers.
    fn fresh_player_id(&self) -> PlayerId {
        loop {
            let id = generate_player_id();
            let taken = self.member(&id).is_some()
                || self.disconnected.contains_key(&id)
                || self.session.as_ref().is_some_and(|s| s.progress(&id).is_some());
            if !taken {
                return id;
            }
        }
    }

    fn roster(&self) -> Vec<PlayerSummary> {
        self.members
            .iter()
            .map(|m| PlayerSummary {
                id: m.id.clone(),
                name: m.name.clone(),
            })
            .collect()
    }

    fn players_updated(&self) -> ServerEvent {
        ServerEvent::PlayersUpdated {
            players: self.roster(),
            host_id: self.host_id.clone(),
        }
    }

    fn send_to(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Some(member) = self.member(player_id) {
            let _ = member.sender.send(event);
        }
    }

    /// Delivers an event to the active members `recipient` selects.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for member in &self.members {
                    let _ = member.sender.send(event.clone());
                }
            }
            Recipient::Player(player_id) => self.send_to(&player_id, event),
            Recipient::AllExcept(excluded) => {
                for member in self.members.iter().filter(|m| m.id != excluded) {
                    let _ = member.sender.send(event.clone());
                }
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            host_id: self.host_id.clone(),
            players: self.roster(),
            disconnected: self.disconnected.len(),
            status: self
                .session
                .as_ref()
                .map_or(SessionStatus::Waiting, GameSession::status),
            settings: self.settings,
            rematch_countdown: self.countdown.remaining(),
        }
    }
}

/// The player who opens a room.
pub(crate) struct Founder {
    pub player_id: PlayerId,
    pub player_name: String,
    pub sender: PlayerSender,
}

/// Spawns a room actor with its founder already seated as host.
///
/// `room_created` is queued on the founder's channel before the actor
/// task starts.
pub(crate) fn spawn_room(
    room_id: RoomId,
    instance: u64,
    config: RoomConfig,
    directory: RoomDirectory,
    founder: Founder,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let _ = founder.sender.send(ServerEvent::RoomCreated {
        room_id: room_id.clone(),
        player_id: founder.player_id.clone(),
        host_id: founder.player_id.clone(),
    });

    let actor = RoomActor {
        room_id: room_id.clone(),
        instance,
        settings: config.default_settings,
        config,
        host_id: founder.player_id.clone(),
        members: vec![Member {
            id: founder.player_id,
            name: founder.player_name,
            sender: founder.sender,
        }],
        disconnected: HashMap::new(),
        exhausted: HashMap::new(),
        session: None,
        grace: Deadlines::new(),
        countdown: Countdown::new(),
        directory,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        instance,
        sender: tx,
    }
}
