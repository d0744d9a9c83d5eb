use crate::domain::payment::{PaymentRequestFactory, ReferenceCode};
use crate::domain::verification::{
    DEFAULT_COUNTDOWN_SECS, VerificationSession, VerificationStatus,
};
use crate::error::VerificationError;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, info};

/// Clock settings for a payment verification process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationTimings {
    /// Length of the payment window, in countdown ticks.
    pub countdown_secs: u32,
    /// Interval between countdown ticks.
    pub tick: Duration,
    /// Simulated bank signature check.
    pub bank_check: Duration,
    /// Simulated order placement after the bank check.
    pub order_placement: Duration,
}

impl Default for VerificationTimings {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick: Duration::from_secs(1),
            bank_check: Duration::from_millis(2500),
            order_placement: Duration::from_millis(1500),
        }
    }
}

impl VerificationTimings {
    /// Same payment window, near-instant confirmation.
    pub fn fast() -> Self {
        Self {
            bank_check: Duration::from_millis(50),
            order_placement: Duration::from_millis(50),
            ..Self::default()
        }
    }
}

enum Command {
    Submit {
        code: String,
        reply: oneshot::Sender<Result<ReferenceCode, VerificationError>>,
    },
    Regenerate {
        reply: oneshot::Sender<bool>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
}

/// Runs one payment attempt in the background.
///
/// A spawned task owns the [`VerificationSession`], ticks its countdown and
/// drives the two-phase confirmation once a reference has been accepted.
/// Commands sent through this handle are always handled before a countdown
/// tick that is due at the same moment, so an accepted reference can never be
/// overtaken by expiry.
///
/// Dropping the handle stops the task and its timers.
pub struct PaymentVerificationProcess {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<VerificationSession>,
    verified: Option<oneshot::Receiver<ReferenceCode>>,
    confirmed: Option<ReferenceCode>,
    task: JoinHandle<()>,
}

impl PaymentVerificationProcess {
    /// Creates a payment request for `amount` and starts the countdown.
    pub fn start(
        amount: Decimal,
        requests: Arc<dyn PaymentRequestFactory>,
        timings: VerificationTimings,
    ) -> Self {
        let session = VerificationSession::new(requests.create(amount), timings.countdown_secs);
        info!(
            amount = %amount,
            note = %session.descriptor().note,
            "Payment request created"
        );

        let (commands, inbox) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(session.clone());
        let (verified_tx, verified) = oneshot::channel();

        let actor = VerificationActor {
            countdown: countdown(&timings),
            session,
            amount,
            requests,
            timings,
            state: state_tx,
            verified: Some(verified_tx),
        };
        let task = tokio::spawn(actor.run(inbox));

        Self {
            commands,
            state,
            verified: Some(verified),
            confirmed: None,
            task,
        }
    }

    /// Latest state of the session.
    pub fn snapshot(&self) -> VerificationSession {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> VerificationStatus {
        self.state.borrow().status()
    }

    /// A receiver that sees every state change, e.g. to redraw a countdown.
    pub fn subscribe(&self) -> watch::Receiver<VerificationSession> {
        self.state.clone()
    }

    /// Submits a reference code.
    ///
    /// The submission is queued immediately; the returned future resolves
    /// with the accepted code, or with the reason it was refused.
    pub fn submit(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<ReferenceCode, VerificationError>> + use<> {
        let (reply, response) = oneshot::channel();
        let sent = self.commands.send(Command::Submit {
            code: code.to_string(),
            reply,
        });
        async move {
            sent.map_err(|_| VerificationError::ProcessClosed)?;
            response
                .await
                .map_err(|_| VerificationError::ProcessClosed)?
        }
    }

    /// Replaces an expired session with a fresh payment request.
    ///
    /// Resolves to `false` if the session was not expired.
    pub async fn regenerate(&self) -> Result<bool, VerificationError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Regenerate { reply })
            .map_err(|_| VerificationError::ProcessClosed)?;
        response.await.map_err(|_| VerificationError::ProcessClosed)
    }

    /// Abandons the payment attempt.
    ///
    /// Only possible while waiting for a reference or after expiry; once a
    /// reference has been accepted the request is already with the payment
    /// network, and the process is handed back unchanged.
    pub async fn cancel(self) -> Result<(), Self> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Cancel { reply }).is_err() {
            return Ok(());
        }
        match response.await {
            Ok(false) => Err(self),
            Ok(true) | Err(_) => Ok(()),
        }
    }

    /// Waits for the order placement phase to finish and yields the reference
    /// the customer entered.
    ///
    /// Once confirmed, later calls return the same reference immediately, so a
    /// failed order submission can be retried. Returns `None` if the process
    /// stopped without confirming.
    pub async fn verified(&mut self) -> Option<ReferenceCode> {
        if let Some(receiver) = self.verified.as_mut() {
            self.confirmed = receiver.await.ok();
            self.verified = None;
        }
        self.confirmed.clone()
    }
}

impl Drop for PaymentVerificationProcess {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn countdown(timings: &VerificationTimings) -> Interval {
    interval_at(Instant::now() + timings.tick, timings.tick)
}

struct VerificationActor {
    session: VerificationSession,
    countdown: Interval,
    amount: Decimal,
    requests: Arc<dyn PaymentRequestFactory>,
    timings: VerificationTimings,
    state: watch::Sender<VerificationSession>,
    verified: Option<oneshot::Sender<ReferenceCode>>,
}

impl VerificationActor {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        let phase = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(phase);
        let mut phase_armed = false;

        loop {
            tokio::select! {
                biased;

                command = inbox.recv() => {
                    let Some(command) = command else { break };
                    match command {
                        Command::Submit { code, reply } => {
                            let result = self.session.submit(&code).cloned();
                            if let Ok(reference) = &result {
                                info!(reference = %reference, "Reference accepted, verifying with bank");
                                phase.as_mut().reset(Instant::now() + self.timings.bank_check);
                                phase_armed = true;
                            }
                            self.publish();
                            let _ = reply.send(result);
                        }
                        Command::Regenerate { reply } => {
                            let regenerated = self.regenerate();
                            let _ = reply.send(regenerated);
                        }
                        Command::Cancel { reply } => {
                            let cancellable = matches!(
                                self.session.status(),
                                VerificationStatus::Idle | VerificationStatus::Expired
                            );
                            let _ = reply.send(cancellable);
                            if cancellable {
                                info!("Payment cancelled");
                                break;
                            }
                        }
                    }
                }

                _ = self.countdown.tick(), if self.session.countdown_running() => {
                    if self.session.tick() {
                        info!(note = %self.session.descriptor().note, "Payment session expired");
                    }
                    self.publish();
                }

                () = &mut phase, if phase_armed => {
                    match self.session.status() {
                        VerificationStatus::Verifying => {
                            self.session.complete_bank_check();
                            info!("Payment verified, placing order");
                            self.publish();
                            phase.as_mut().reset(Instant::now() + self.timings.order_placement);
                        }
                        _ => {
                            if let (Some(tx), Some(reference)) =
                                (self.verified.take(), self.session.reference())
                            {
                                let _ = tx.send(reference.clone());
                            }
                            break;
                        }
                    }
                }
            }
        }
        debug!(status = %self.session.status(), "Verification process stopped");
    }

    fn regenerate(&mut self) -> bool {
        if self.session.status() != VerificationStatus::Expired {
            return false;
        }
        let descriptor = self.requests.create(self.amount);
        if !self.session.regenerate(descriptor) {
            return false;
        }
        info!(
            generation = self.session.generation(),
            note = %self.session.descriptor().note,
            "Payment request regenerated"
        );
        self.countdown = countdown(&self.timings);
        self.publish();
        true
    }

    fn publish(&self) {
        self.state.send_replace(self.session.clone());
    }
}
