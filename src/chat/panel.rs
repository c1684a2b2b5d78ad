//! The chat panel: an ordered transcript and the turn-taking state machine.
//!
//! A submission runs in three phases so that the panel is never borrowed
//! across the network call:
//!
//! 1. [`ChatPanel::begin_submit`] records the user turn and marks the panel
//!    pending.
//! 2. [`PendingSend::dispatch`] performs the request.
//! 3. [`ChatPanel::complete`] records the reply, or the fallback turn, and
//!    clears the pending flag.
//!
//! [`ChatPanel::submit`] chains all three.  Clearing the transcript (or
//! logging out through the panel) starts a new generation and cancels the
//! in-flight request; a reply for an older generation is dropped.
//!
//! The pending flag belongs to the submission, not to `complete`: dropping
//! the [`PendingSend`], the dispatch future or the [`Reply`] releases it.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::observability::{
    CHAT_FALLBACKS, CHAT_STALE_REPLIES, CHAT_SUBMITS, CHAT_SUBMITS_IGNORED,
};
use crate::service::{AuthService, ChatService};
use crate::session::SessionManager;
use crate::token_store::TokenStore;
use crate::types::{ChatRequest, ChatResponse, RequestContext, Turn};

/// The transcript, the input buffer and the pending flag.
#[derive(Debug)]
pub struct ChatPanel {
    transcript: Vec<Turn>,
    input: String,
    pending: PendingSlot,
    next_ticket: u64,
    generation: u64,
    cancel: CancellationToken,
}

/// A submission whose request has not resolved yet.
#[derive(Debug)]
pub struct PendingSend {
    guard: PendingGuard,
    generation: u64,
    context: RequestContext,
    request: ChatRequest,
    cancel: CancellationToken,
}

/// The outcome of a [`PendingSend`], to be handed back to [`ChatPanel::complete`].
#[derive(Debug)]
pub struct Reply {
    guard: PendingGuard,
    generation: u64,
    outcome: Result<ChatResponse>,
}

impl ChatPanel {
    /// An empty panel.
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            input: String::new(),
            pending: PendingSlot::default(),
            next_ticket: 1,
            generation: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// The transcript, oldest first.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// The most recent turn.
    pub fn latest(&self) -> Option<&Turn> {
        self.transcript.last()
    }

    /// True from the start of a submission until its reply is completed.
    ///
    /// Dropping an unfinished submission, or clearing the panel, also ends it.
    pub fn is_pending(&self) -> bool {
        self.pending.is_held()
    }

    /// The generation replies are checked against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The text typed but not yet submitted.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input buffer.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// The header line for the current user.
    pub fn header<A: AuthService, S: TokenStore>(&self, session: &SessionManager<A, S>) -> String {
        format!("Welcome, {}", session.display_name().unwrap_or_default())
    }

    /// Start submitting `text`.
    ///
    /// Returns `None`, changing nothing, when the trimmed text is empty or a
    /// submission is already pending.  Otherwise the user turn is appended,
    /// the input buffer cleared, and the panel marked pending.
    pub fn begin_submit(&mut self, text: &str, context: RequestContext) -> Option<PendingSend> {
        let text = text.trim();
        let pending = self.pending.is_held();
        if text.is_empty() || pending {
            CHAT_SUBMITS_IGNORED.click();
            tracing::debug!(pending, "ignoring submit");
            return None;
        }
        CHAT_SUBMITS.click();

        let history = self.transcript.iter().map(Turn::to_message).collect();
        let request = ChatRequest::new(text, history);
        self.transcript.push(Turn::user(text));
        self.input.clear();

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        Some(PendingSend {
            guard: self.pending.hold(ticket),
            generation: self.generation,
            context,
            request,
            cancel: self.cancel.child_token(),
        })
    }

    /// Finish a submission.
    ///
    /// The pending flag is cleared whatever the outcome.  A reply for the
    /// current generation appends exactly one assistant turn: the response on
    /// success, the fallback turn on any failure.  A reply for an older
    /// generation is discarded and `None` returned.
    pub fn complete(&mut self, reply: Reply) -> Option<&Turn> {
        let Reply {
            guard,
            generation,
            outcome,
        } = reply;
        drop(guard);
        if generation != self.generation {
            CHAT_STALE_REPLIES.click();
            tracing::debug!(
                reply_generation = generation,
                generation = self.generation,
                "discarding reply for cleared transcript"
            );
            return None;
        }

        let turn = match outcome {
            Ok(response) => Turn::assistant(response.response),
            Err(err) => {
                CHAT_FALLBACKS.click();
                tracing::warn!(kind = %err.kind(), error = %err, "chat send failed");
                Turn::fallback()
            }
        };
        self.transcript.push(turn);
        self.transcript.last()
    }

    /// Submit `text` and wait for the reply.
    ///
    /// Returns the assistant turn, or `None` if the submission was ignored.
    /// Errors never surface here; they become the fallback turn.
    pub async fn submit<C: ChatService + ?Sized>(
        &mut self,
        service: &C,
        context: RequestContext,
        text: &str,
    ) -> Option<&Turn> {
        let pending = self.begin_submit(text, context)?;
        let reply = pending.dispatch(service).await;
        self.complete(reply)
    }

    /// Submit the input buffer.
    pub async fn submit_input<C: ChatService + ?Sized>(
        &mut self,
        service: &C,
        context: RequestContext,
    ) -> Option<&Turn> {
        let text = self.input.clone();
        self.submit(service, context, &text).await
    }

    /// Discard the whole transcript.
    ///
    /// Starts a new generation, so an in-flight reply is cancelled and dropped.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.pending.release_any();
        self.generation += 1;
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }

    /// Log out of `session` and discard the transcript.
    pub fn logout<A: AuthService, S: TokenStore>(&mut self, session: &mut SessionManager<A, S>) {
        session.logout();
        self.clear();
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile::new(&self.transcript);
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("failed to serialize transcript", Some(Box::new(err)))
        })
    }

    /// Loads a transcript from disk, replacing the current one.
    ///
    /// Like [`clear`](Self::clear), this starts a new generation.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("failed to open transcript file", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("failed to parse transcript", Some(Box::new(err)))
        })?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(Error::validation(
                format!("unsupported transcript version {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        self.clear();
        self.transcript = transcript.turns;
        Ok(())
    }
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSend {
    /// The request that will be sent.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// The generation this submission belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A handle that abandons the request when cancelled.
    ///
    /// An abandoned request completes as a failure.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Perform the request.
    pub async fn dispatch<C: ChatService + ?Sized>(self, service: &C) -> Reply {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::abort("chat request cancelled")),
            result = service.send_chat(&self.context, &self.request) => result,
        };
        Reply {
            guard: self.guard,
            generation: self.generation,
            outcome,
        }
    }
}

impl Reply {
    #[cfg(test)]
    fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The ticket of the pending submission, zero when idle.
#[derive(Debug, Default)]
struct PendingSlot(Arc<AtomicU64>);

impl PendingSlot {
    fn is_held(&self) -> bool {
        self.0.load(Ordering::SeqCst) != 0
    }

    fn hold(&self, ticket: u64) -> PendingGuard {
        self.0.store(ticket, Ordering::SeqCst);
        PendingGuard {
            slot: Arc::clone(&self.0),
            ticket,
        }
    }

    fn release_any(&self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

/// Releases the pending slot when dropped, unless a newer submission took it.
#[derive(Debug)]
struct PendingGuard {
    slot: Arc<AtomicU64>,
    ticket: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let _ = self
            .slot
            .compare_exchange(self.ticket, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

const TRANSCRIPT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    turns: Vec<Turn>,
}

impl TranscriptFile {
    fn new(turns: &[Turn]) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            turns: turns.to_vec(),
        }
    }
}
