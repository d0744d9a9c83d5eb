use crate::domain::file::{AnalysisSuggestion, FileId, UploadedFile};
use crate::domain::order::{OrderId, OrderRecord, OrderSubmission};
use crate::domain::payment::ReferenceCode;
use crate::domain::pricing::{PriceBreakdown, PricingEngine};
use crate::domain::settings::PrintSettings;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// The four stages of an order, in the only order they can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Uploading,
    Configuring,
    Paying,
    Confirmed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle for one analysis request on one file.
///
/// Issued by [`OrderFlow::begin_analysis`] and redeemed exactly once with
/// [`OrderFlow::complete_analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket {
    file_id: FileId,
    request: u64,
}

impl AnalysisTicket {
    pub fn file_id(&self) -> FileId {
        self.file_id
    }
}

/// The order being put together by one customer.
///
/// Owns the uploaded files and print settings, and walks them through
/// `Uploading -> Configuring -> Paying -> Confirmed`. Requests that the
/// current stage does not allow are refused by returning `false` or `None`;
/// they never panic or error.
///
/// The price breakdown is recomputed on every settings change.
#[derive(Debug)]
pub struct OrderFlow {
    stage: Stage,
    pricing: PricingEngine,
    settings: PrintSettings,
    breakdown: PriceBreakdown,
    files: Vec<UploadedFile>,
    next_file_id: u32,
    /// Sequence shared by all files; never reset, so tickets are never reissued.
    next_analysis_request: u64,
    /// Latest pending request per file.
    analysis_requests: HashMap<FileId, u64>,
    record: Option<OrderRecord>,
}

impl Default for OrderFlow {
    fn default() -> Self {
        Self::new(PricingEngine::default())
    }
}

impl OrderFlow {
    pub fn new(pricing: PricingEngine) -> Self {
        Self::with_settings(pricing, PrintSettings::default())
    }

    pub fn with_settings(pricing: PricingEngine, settings: PrintSettings) -> Self {
        let settings = settings.clamped();
        let breakdown = pricing.breakdown(&settings);
        Self {
            stage: Stage::Uploading,
            pricing,
            settings,
            breakdown,
            files: Vec::new(),
            next_file_id: 1,
            next_analysis_request: 1,
            analysis_requests: HashMap::new(),
            record: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn settings(&self) -> &PrintSettings {
        &self.settings
    }

    pub fn breakdown(&self) -> &PriceBreakdown {
        &self.breakdown
    }

    pub fn total(&self) -> Decimal {
        self.breakdown.total
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id() == id)
    }

    /// The placed order, once `Confirmed`.
    pub fn record(&self) -> Option<&OrderRecord> {
        self.record.as_ref()
    }

    fn refuse(&self, action: &str) {
        debug!(stage = %self.stage, action, "Action not allowed in current stage");
    }

    // Uploading

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Option<FileId> {
        if self.stage != Stage::Uploading {
            self.refuse("add_file");
            return None;
        }
        let Some(next) = self.next_file_id.checked_add(1) else {
            debug!("File ids exhausted for this order");
            return None;
        };
        let id = FileId(self.next_file_id);
        self.next_file_id = next;
        let file = UploadedFile::new(id, name.into(), content_type.into(), content);
        debug!(file = %id, name = file.name(), size = file.size(), "File added");
        self.files.push(file);
        Some(id)
    }

    pub fn remove_file(&mut self, id: FileId) -> bool {
        if self.stage != Stage::Uploading {
            self.refuse("remove_file");
            return false;
        }
        let before = self.files.len();
        self.files.retain(|f| f.id() != id);
        self.analysis_requests.remove(&id);
        self.files.len() != before
    }

    /// Starts an analysis request for a file.
    ///
    /// Any earlier request for the same file that has not completed yet is
    /// superseded: its result will be discarded.
    pub fn begin_analysis(&mut self, id: FileId) -> Option<AnalysisTicket> {
        self.file(id)?;
        let request = self.next_analysis_request;
        self.next_analysis_request = request.wrapping_add(1);
        self.analysis_requests.insert(id, request);
        Some(AnalysisTicket { file_id: id, request })
    }

    /// Records the outcome of an analysis request.
    ///
    /// Returns `true` if the suggestion was stored. Results of superseded
    /// requests, for removed files, and empty results are dropped.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        suggestion: Option<AnalysisSuggestion>,
    ) -> bool {
        if self.analysis_requests.get(&ticket.file_id) != Some(&ticket.request) {
            debug!(file = %ticket.file_id, "Discarding stale analysis result");
            return false;
        }
        self.analysis_requests.remove(&ticket.file_id);

        let Some(suggestion) = suggestion.filter(|s| !s.is_empty()) else {
            return false;
        };
        match self.files.iter_mut().find(|f| f.id() == ticket.file_id) {
            Some(file) => {
                file.set_analysis(suggestion);
                true
            }
            None => false,
        }
    }

    pub fn proceed_to_configure(&mut self) -> bool {
        if self.stage != Stage::Uploading || self.files.is_empty() {
            self.refuse("proceed_to_configure");
            return false;
        }
        self.transition(Stage::Configuring);
        true
    }

    // Configuring

    pub fn back_to_upload(&mut self) -> bool {
        if self.stage != Stage::Configuring {
            self.refuse("back_to_upload");
            return false;
        }
        self.transition(Stage::Uploading);
        true
    }

    /// Replaces the print settings and reprices the order.
    pub fn update_settings(&mut self, settings: PrintSettings) -> bool {
        if self.stage != Stage::Configuring {
            self.refuse("update_settings");
            return false;
        }
        self.settings = settings.clamped();
        self.breakdown = self.pricing.breakdown(&self.settings);
        debug!(total = %self.breakdown.total, "Order repriced");
        true
    }

    /// Edits a copy of the current settings and applies it.
    pub fn modify_settings(&mut self, edit: impl FnOnce(&mut PrintSettings)) -> bool {
        let mut settings = self.settings.clone();
        edit(&mut settings);
        self.update_settings(settings)
    }

    /// Moves to payment, returning the amount to collect.
    pub fn proceed_to_payment(&mut self) -> Option<Decimal> {
        if self.stage != Stage::Configuring {
            self.refuse("proceed_to_payment");
            return None;
        }
        self.transition(Stage::Paying);
        Some(self.total())
    }

    // Paying

    /// Returns to configuration.
    ///
    /// Whoever holds the payment verification process must have released it
    /// first; see `PaymentVerificationProcess::cancel`.
    pub fn back_to_configure(&mut self) -> bool {
        if self.stage != Stage::Paying {
            self.refuse("back_to_configure");
            return false;
        }
        self.transition(Stage::Configuring);
        true
    }

    /// Snapshot of the order to hand to the order sink.
    pub fn submission(&self, reference: ReferenceCode) -> Option<OrderSubmission> {
        if self.stage != Stage::Paying {
            return None;
        }
        Some(OrderSubmission {
            txn_id: reference,
            total_cost: self.total(),
            files: self.files.iter().map(UploadedFile::metadata).collect(),
            settings: self.settings.clone(),
        })
    }

    /// Places the order after payment has been verified and the sink has
    /// accepted `submission`.
    pub fn confirm(&mut self, order_id: OrderId, submission: OrderSubmission) -> Option<&OrderRecord> {
        if self.stage != Stage::Paying {
            self.refuse("confirm");
            return None;
        }
        info!(order = %order_id, reference = %submission.txn_id, total = %submission.total_cost, "Order placed");
        self.transition(Stage::Confirmed);
        Some(&*self.record.insert(OrderRecord::new(order_id, submission)))
    }

    // Confirmed

    /// Starts a new order, dropping the files and the placed record.
    pub fn restart(&mut self) -> bool {
        if self.stage != Stage::Confirmed {
            self.refuse("restart");
            return false;
        }
        self.files.clear();
        self.analysis_requests.clear();
        self.record = None;
        self.settings.reset_for_new_order();
        self.breakdown = self.pricing.breakdown(&self.settings);
        self.transition(Stage::Uploading);
        true
    }

    fn transition(&mut self, to: Stage) {
        info!(from = %self.stage, to = %to, "Order stage changed");
        self.stage = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{BindingType, ColorMode, DeliveryMode, PaperSize, PaperType};
    use rust_decimal_macros::dec;

    fn flow_with_file() -> (OrderFlow, FileId) {
        let mut flow = OrderFlow::default();
        let id = flow
            .add_file("notes.pdf", "application/pdf", vec![0; 128])
            .unwrap();
        (flow, id)
    }

    fn paying_flow() -> OrderFlow {
        let (mut flow, _) = flow_with_file();
        assert!(flow.proceed_to_configure());
        assert!(flow.proceed_to_payment().is_some());
        flow
    }

    fn code() -> ReferenceCode {
        ReferenceCode::parse("123456789012").unwrap()
    }

    #[test]
    fn test_initial_state() {
        let flow = OrderFlow::default();
        assert_eq!(flow.stage(), Stage::Uploading);
        assert!(flow.files().is_empty());
        assert_eq!(flow.settings(), &PrintSettings::default());
        assert_eq!(flow.total(), dec!(3.00));
    }

    #[test]
    fn test_cannot_configure_without_files() {
        let mut flow = OrderFlow::default();
        assert!(!flow.proceed_to_configure());
        assert_eq!(flow.stage(), Stage::Uploading);
    }

    #[test]
    fn test_removing_last_file_blocks_configure() {
        let (mut flow, id) = flow_with_file();
        assert!(flow.remove_file(id));
        assert!(!flow.remove_file(id));
        assert!(!flow.proceed_to_configure());
        assert_eq!(flow.stage(), Stage::Uploading);
    }

    #[test]
    fn test_file_ids_are_unique() {
        let mut flow = OrderFlow::default();
        let a = flow.add_file("a.pdf", "application/pdf", vec![]).unwrap();
        flow.remove_file(a);
        let b = flow.add_file("b.pdf", "application/pdf", vec![]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_settings_only_change_while_configuring() {
        let (mut flow, _) = flow_with_file();
        assert!(!flow.modify_settings(|s| s.copies = 5));
        assert_eq!(flow.settings().copies, 1);

        flow.proceed_to_configure();
        assert!(flow.modify_settings(|s| s.copies = 5));
        assert_eq!(flow.settings().copies, 5);
        assert_eq!(flow.total(), dec!(15.00));
    }

    #[test]
    fn test_settings_update_reprices_immediately() {
        let (mut flow, _) = flow_with_file();
        flow.proceed_to_configure();
        flow.update_settings(PrintSettings {
            copies: 2,
            pages_per_copy: 10,
            color_mode: ColorMode::Color,
            paper_type: PaperType::Premium,
            binding: BindingType::Spiral,
            ..Default::default()
        });
        assert_eq!(flow.total(), dec!(370.00));

        flow.modify_settings(|s| s.paper_size = PaperSize::A3);
        assert_eq!(flow.total(), dec!(650.00));

        flow.modify_settings(|s| {
            s.paper_size = PaperSize::A4;
            s.delivery_mode = DeliveryMode::Delivery;
        });
        assert_eq!(flow.total(), dec!(410.00));
    }

    #[test]
    fn test_settings_are_clamped() {
        let (mut flow, _) = flow_with_file();
        flow.proceed_to_configure();
        flow.modify_settings(|s| {
            s.copies = 0;
            s.pages_per_copy = 0;
        });
        assert_eq!(flow.settings().copies, 1);
        assert_eq!(flow.settings().pages_per_copy, 1);
        assert_eq!(flow.total(), dec!(3.00));
    }

    #[test]
    fn test_back_transitions() {
        let mut flow = paying_flow();
        assert!(!flow.back_to_upload());
        assert!(flow.back_to_configure());
        assert_eq!(flow.stage(), Stage::Configuring);
        assert!(flow.back_to_upload());
        assert_eq!(flow.stage(), Stage::Uploading);
        assert!(flow.files().len() == 1);
    }

    #[test]
    fn test_no_skipping_forward() {
        let (mut flow, _) = flow_with_file();
        assert!(flow.proceed_to_payment().is_none());
        assert!(flow.submission(code()).is_none());
        assert_eq!(flow.stage(), Stage::Uploading);
    }

    #[test]
    fn test_files_frozen_after_upload() {
        let (mut flow, id) = flow_with_file();
        flow.proceed_to_configure();
        assert!(flow.add_file("late.pdf", "application/pdf", vec![]).is_none());
        assert!(!flow.remove_file(id));
        assert_eq!(flow.files().len(), 1);
    }

    #[test]
    fn test_confirm_builds_record() {
        let mut flow = paying_flow();
        let submission = flow.submission(code()).unwrap();
        assert_eq!(submission.files[0].name, "notes.pdf");

        let record = flow
            .confirm(OrderId("ORD-1".into()), submission)
            .unwrap()
            .clone();
        assert_eq!(flow.stage(), Stage::Confirmed);
        assert_eq!(record.reference().as_str(), "123456789012");
        assert_eq!(record.total_cost(), dec!(3.00));
        assert_eq!(record.files().len(), 1);
        assert_eq!(flow.record(), Some(&record));
    }

    #[test]
    fn test_confirm_requires_paying() {
        let (mut flow, _) = flow_with_file();
        let submission = OrderSubmission {
            txn_id: code(),
            total_cost: dec!(1),
            files: vec![],
            settings: PrintSettings::default(),
        };
        assert!(flow.confirm(OrderId("x".into()), submission).is_none());
        assert_eq!(flow.stage(), Stage::Uploading);
    }

    #[test]
    fn test_restart_resets_order_fields() {
        let (mut flow, _) = flow_with_file();
        flow.proceed_to_configure();
        flow.modify_settings(|s| {
            s.copies = 4;
            s.pages_per_copy = 9;
            s.is_express = true;
            s.special_instructions = "Rush".into();
        });
        flow.proceed_to_payment();
        let submission = flow.submission(code()).unwrap();
        flow.confirm(OrderId("ORD-9".into()), submission);

        assert!(flow.restart());
        assert_eq!(flow.stage(), Stage::Uploading);
        assert!(flow.files().is_empty());
        assert!(flow.record().is_none());
        assert_eq!(flow.settings().copies, 4);
        assert_eq!(flow.settings().pages_per_copy, 1);
        assert!(!flow.settings().is_express);
        assert_eq!(flow.total(), dec!(12.00));
        assert!(!flow.restart());
    }

    #[test]
    fn test_analysis_result_stored() {
        let (mut flow, id) = flow_with_file();
        let ticket = flow.begin_analysis(id).unwrap();
        let suggestion = AnalysisSuggestion {
            suggested_paper: Some("Premium".into()),
            ..Default::default()
        };
        assert!(flow.complete_analysis(ticket, Some(suggestion.clone())));
        assert_eq!(flow.file(id).unwrap().analysis(), Some(&suggestion));

        // a ticket is redeemed only once
        assert!(!flow.complete_analysis(ticket, Some(AnalysisSuggestion::default())));
    }

    #[test]
    fn test_later_analysis_request_supersedes_earlier() {
        let (mut flow, id) = flow_with_file();
        let first = flow.begin_analysis(id).unwrap();
        let second = flow.begin_analysis(id).unwrap();
        let fresh = AnalysisSuggestion {
            summary: Some("fresh".into()),
            ..Default::default()
        };
        assert!(flow.complete_analysis(second, Some(fresh.clone())));
        assert!(!flow.complete_analysis(
            first,
            Some(AnalysisSuggestion {
                summary: Some("stale".into()),
                ..Default::default()
            })
        ));
        assert_eq!(flow.file(id).unwrap().analysis(), Some(&fresh));
    }

    #[test]
    fn test_stale_request_stays_stale_after_newer_completes() {
        let summary = |text: &str| {
            Some(AnalysisSuggestion {
                summary: Some(text.into()),
                ..Default::default()
            })
        };
        let (mut flow, id) = flow_with_file();
        let first = flow.begin_analysis(id).unwrap();
        let second = flow.begin_analysis(id).unwrap();
        assert!(flow.complete_analysis(second, summary("second")));

        let third = flow.begin_analysis(id).unwrap();
        assert!(!flow.complete_analysis(first, summary("first")));
        assert!(flow.complete_analysis(third, summary("third")));
        assert_eq!(
            flow.file(id).unwrap().analysis().and_then(|a| a.summary.as_deref()),
            Some("third")
        );
    }

    #[test]
    fn test_file_ids_never_wrap() {
        let mut flow = OrderFlow::default();
        flow.next_file_id = u32::MAX - 1;
        assert_eq!(flow.add_file("a.pdf", "application/pdf", vec![1]), Some(FileId(u32::MAX - 1)));
        assert_eq!(flow.add_file("b.pdf", "application/pdf", vec![2]), None);
        assert_eq!(flow.files().len(), 1);
    }

    #[test]
    fn test_missing_analysis_keeps_previous() {
        let (mut flow, id) = flow_with_file();
        let ticket = flow.begin_analysis(id).unwrap();
        let suggestion = AnalysisSuggestion {
            summary: Some("A poster".into()),
            ..Default::default()
        };
        flow.complete_analysis(ticket, Some(suggestion.clone()));

        let ticket = flow.begin_analysis(id).unwrap();
        assert!(!flow.complete_analysis(ticket, None));
        assert_eq!(flow.file(id).unwrap().analysis(), Some(&suggestion));
    }

    #[test]
    fn test_analysis_for_removed_file_ignored() {
        let (mut flow, id) = flow_with_file();
        let ticket = flow.begin_analysis(id).unwrap();
        flow.remove_file(id);
        assert!(!flow.complete_analysis(ticket, Some(AnalysisSuggestion::default())));
        assert!(flow.begin_analysis(id).is_none());
    }

    #[test]
    fn test_analysis_does_not_gate_stages() {
        let (mut flow, id) = flow_with_file();
        let ticket = flow.begin_analysis(id).unwrap();
        assert!(flow.proceed_to_configure());
        let suggestion = AnalysisSuggestion {
            summary: Some("late".into()),
            ..Default::default()
        };
        assert!(flow.complete_analysis(ticket, Some(suggestion)));
    }
}
