use crate::domain::payment::{PaymentDescriptor, ReferenceCode};
use crate::error::VerificationError;
use serde::Serialize;
use std::fmt;

/// Seconds a payment request stays valid.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Waiting for the customer to pay and enter the reference.
    Idle,
    /// Reference accepted, bank check in progress.
    Verifying,
    /// Bank check passed, order being placed.
    Confirmed,
    /// Countdown ran out before a reference was accepted.
    Expired,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerificationStatus::Idle => "idle",
            VerificationStatus::Verifying => "verifying",
            VerificationStatus::Confirmed => "confirmed",
            VerificationStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// State of one payment attempt.
///
/// This is a plain state machine with no notion of wall-clock time: the
/// owner calls [`tick`](Self::tick) once per second and
/// [`complete_bank_check`](Self::complete_bank_check) when the bank round
/// trip finishes.
///
/// The countdown only runs while `Idle`. Once a reference has been accepted
/// the session can no longer expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    status: VerificationStatus,
    remaining_secs: u32,
    countdown_secs: u32,
    reference_input: String,
    reference: Option<ReferenceCode>,
    error: Option<String>,
    descriptor: PaymentDescriptor,
    generation: u32,
}

impl VerificationSession {
    pub fn new(descriptor: PaymentDescriptor, countdown_secs: u32) -> Self {
        let status = if countdown_secs == 0 {
            VerificationStatus::Expired
        } else {
            VerificationStatus::Idle
        };
        Self {
            status,
            remaining_secs: countdown_secs,
            countdown_secs,
            reference_input: String::new(),
            reference: None,
            error: None,
            descriptor,
            generation: 0,
        }
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn countdown_secs(&self) -> u32 {
        self.countdown_secs
    }

    /// The last text the customer submitted, valid or not.
    pub fn reference_input(&self) -> &str {
        &self.reference_input
    }

    /// The accepted reference, set once the session leaves `Idle`.
    pub fn reference(&self) -> Option<&ReferenceCode> {
        self.reference.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn descriptor(&self) -> &PaymentDescriptor {
        &self.descriptor
    }

    /// How many times this payment request has been regenerated.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn countdown_running(&self) -> bool {
        self.status == VerificationStatus::Idle
    }

    /// Advances the countdown by one second.
    ///
    /// Ignored unless `Idle`. Returns `true` if this tick expired the session.
    pub fn tick(&mut self) -> bool {
        if !self.countdown_running() {
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.status = VerificationStatus::Expired;
            return true;
        }
        false
    }

    /// Submits a reference code.
    ///
    /// Only accepted while `Idle`. An invalid code records the error and
    /// leaves the session `Idle`; a valid one moves it to `Verifying`, which
    /// also stops the countdown.
    pub fn submit(&mut self, input: &str) -> Result<&ReferenceCode, VerificationError> {
        if self.status != VerificationStatus::Idle {
            return Err(VerificationError::NotAccepting(self.status));
        }
        self.reference_input = input.to_string();
        match ReferenceCode::parse(input) {
            Ok(code) => {
                self.error = None;
                self.status = VerificationStatus::Verifying;
                Ok(&*self.reference.insert(code))
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Marks the bank check as passed. Returns `false` unless `Verifying`.
    pub fn complete_bank_check(&mut self) -> bool {
        if self.status != VerificationStatus::Verifying {
            return false;
        }
        self.status = VerificationStatus::Confirmed;
        true
    }

    /// Replaces an expired session with a fresh one for a new descriptor.
    ///
    /// Returns `false`, leaving the session untouched, unless `Expired`.
    pub fn regenerate(&mut self, descriptor: PaymentDescriptor) -> bool {
        if self.status != VerificationStatus::Expired {
            return false;
        }
        let generation = self.generation + 1;
        *self = Self::new(descriptor, self.countdown_secs);
        self.generation = generation;
        true
    }
}
