use crate::application::order_flow::{AnalysisTicket, OrderFlow};
use crate::application::verification::{PaymentVerificationProcess, VerificationTimings};
use crate::domain::file::{AnalysisSuggestion, FileId};
use crate::domain::order::OrderRecord;
use crate::domain::payment::PaymentRequestFactory;
use crate::domain::ports::{OrderSinkBox, SharedAnalyzer};
use crate::error::{PrintShopError, Result, VerificationError};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

/// Connects an [`OrderFlow`] to the outside world: the document analyzer,
/// the payment verification process and the order sink.
pub struct CheckoutService {
    sink: OrderSinkBox,
    payments: Arc<dyn PaymentRequestFactory>,
    analyzer: Option<SharedAnalyzer>,
    timings: VerificationTimings,
}

impl CheckoutService {
    pub fn new(sink: OrderSinkBox, payments: Arc<dyn PaymentRequestFactory>) -> Self {
        Self {
            sink,
            payments,
            analyzer: None,
            timings: VerificationTimings::default(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: SharedAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_timings(mut self, timings: VerificationTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Starts analysing a file in the background.
    ///
    /// The flow stays usable while the analysis runs; pass the task's output
    /// to [`OrderFlow::complete_analysis`] when it finishes. Returns `None` if
    /// no analyzer is configured or the file does not exist.
    pub fn request_analysis(
        &self,
        flow: &mut OrderFlow,
        id: FileId,
    ) -> Option<JoinHandle<(AnalysisTicket, Option<AnalysisSuggestion>)>> {
        let task = self.analysis_task(flow, id)?;
        Some(tokio::spawn(task))
    }

    /// Analyses every file that has no suggestion yet, concurrently, and
    /// stores the results. Returns how many files received a suggestion.
    pub async fn analyze_files(&self, flow: &mut OrderFlow) -> usize {
        let pending: Vec<FileId> = flow
            .files()
            .iter()
            .filter(|f| f.analysis().is_none())
            .map(|f| f.id())
            .collect();

        let mut tasks = JoinSet::new();
        for id in pending {
            if let Some(task) = self.analysis_task(flow, id) {
                tasks.spawn(task);
            }
        }

        let mut stored = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((ticket, suggestion)) => {
                    if flow.complete_analysis(ticket, suggestion) {
                        stored += 1;
                    }
                }
                Err(err) => warn!(error = %err, "Analysis task did not finish"),
            }
        }
        stored
    }

    fn analysis_task(
        &self,
        flow: &mut OrderFlow,
        id: FileId,
    ) -> Option<impl Future<Output = (AnalysisTicket, Option<AnalysisSuggestion>)> + Send + use<>> {
        let analyzer = Arc::clone(self.analyzer.as_ref()?);
        let file = flow.file(id)?;
        let content = file.content();
        let mime_type = file.content_type().to_string();
        let ticket = flow.begin_analysis(id)?;

        Some(async move {
            let suggestion = match analyzer.analyze(&content, &mime_type).await {
                Ok(suggestion) => suggestion,
                Err(err) => {
                    warn!(file = %ticket.file_id(), error = %err, "Document analysis unavailable");
                    None
                }
            };
            (ticket, suggestion)
        })
    }

    /// Moves the flow to payment and starts verification for its total.
    pub fn start_payment(&self, flow: &mut OrderFlow) -> Option<PaymentVerificationProcess> {
        let amount = flow.proceed_to_payment()?;
        Some(PaymentVerificationProcess::start(
            amount,
            Arc::clone(&self.payments),
            self.timings,
        ))
    }

    /// Abandons payment and goes back to configuration.
    ///
    /// Refused, handing the process back, once a reference has been accepted.
    pub async fn cancel_payment(
        &self,
        flow: &mut OrderFlow,
        process: PaymentVerificationProcess,
    ) -> std::result::Result<(), PaymentVerificationProcess> {
        process.cancel().await?;
        flow.back_to_configure();
        Ok(())
    }

    /// Waits for the payment to be verified, submits the order to the sink
    /// and confirms the flow.
    ///
    /// If the sink fails the flow stays in `Paying` and the error is returned.
    /// Calling again with the same process resubmits the verified order.
    pub async fn complete_payment(
        &self,
        flow: &mut OrderFlow,
        process: &mut PaymentVerificationProcess,
    ) -> Result<OrderRecord> {
        let reference = process
            .verified()
            .await
            .ok_or(VerificationError::ProcessClosed)?;
        let submission = flow.submission(reference.clone()).ok_or_else(|| {
            PrintShopError::Submission(format!("order is {}, not awaiting payment", flow.stage()))
        })?;

        let order_id = match self.sink.submit(&submission).await {
            Ok(order_id) => order_id,
            Err(err) => {
                error!(reference = %reference, error = %err, "Payment verified but order was not recorded");
                return Err(err);
            }
        };
        info!(order = %order_id, files = submission.files.len(), "Order submitted");

        flow.confirm(order_id, submission)
            .cloned()
            .ok_or_else(|| PrintShopError::Submission("order could not be confirmed".to_string()))
    }
}
