//! Risk engine - main orchestrator
//!
//! One evaluation runs the full pipeline: validate, authorize, record
//! velocity, resolve history, detect, score, decide, audit. Detector
//! failures fail closed: the operation is denied rather than waved
//! through with a partial signal set.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Duration;

use fraudguard_approval::{
    ApprovalStore, ApprovalWorkflow, MemoryApprovalStore, PendingApproval, Resolution,
    SqliteApprovalStore,
};
use fraudguard_audit::{AuditEntry, AuditEvent, AuditLedger, AuditMetrics, AuditQuery};
use fraudguard_core::{
    ActorKey, EventKind, OperationKind, OperationRequest, RiskAssessment, Role,
};
use fraudguard_scoring::RiskScorer;
use fraudguard_signals::{
    ActorHistory, ChargebackCache, DetectorRegistry, InstrumentClass, OriginBlocklist,
};
use fraudguard_velocity::{VelocityTracker, VelocityWindow};

use crate::config::EngineConfig;
use crate::context::{OperationOutcome, Principal};
use crate::error::{EngineError, EngineResult};

/// Orchestrates risk evaluation for payments and refunds.
///
/// Shareable across tasks: velocity, blocklist and chargeback state are
/// internally synchronized, the approval queue and audit ledger sit
/// behind mutexes that are never held across an await.
pub struct RiskEngine {
    config: EngineConfig,
    tracker: VelocityTracker,
    registry: DetectorRegistry,
    scorer: RiskScorer,
    blocklist: OriginBlocklist,
    chargebacks: ChargebackCache,
    instruments: RwLock<HashMap<String, InstrumentClass>>,
    approvals: Mutex<ApprovalWorkflow>,
    ledger: Mutex<AuditLedger>,
}

impl RiskEngine {
    /// Fully in-memory engine (approval queue and audit ledger included)
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let ledger = AuditLedger::with_capacity(config.audit_capacity);
        Ok(Self::assemble(
            config,
            Box::new(MemoryApprovalStore::new()),
            ledger,
        ))
    }

    /// Engine with a SQLite approval queue and a JSONL audit sink
    pub fn with_persistence(
        config: EngineConfig,
        approval_db: impl AsRef<Path>,
        audit_log: impl AsRef<Path>,
    ) -> EngineResult<Self> {
        let store = SqliteApprovalStore::new(approval_db)?;
        let ledger = AuditLedger::with_sink(audit_log, config.audit_capacity)?;
        Ok(Self::assemble(config, Box::new(store), ledger))
    }

    fn assemble(
        config: EngineConfig,
        store: Box<dyn ApprovalStore>,
        mut ledger: AuditLedger,
    ) -> Self {
        ledger.set_policy(config.notification);
        let approvals = ApprovalWorkflow::new(store, config.approval.clone());
        let scorer = RiskScorer::new(config.scoring.clone());

        Self {
            config,
            tracker: VelocityTracker::new(),
            registry: DetectorRegistry::default(),
            scorer,
            blocklist: OriginBlocklist::new(),
            chargebacks: ChargebackCache::new(),
            instruments: RwLock::new(HashMap::new()),
            approvals: Mutex::new(approvals),
            ledger: Mutex::new(ledger),
        }
    }

    /// Replace the detector registry (custom detectors, test doubles)
    pub fn with_registry(mut self, registry: DetectorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Evaluation ===

    /// Run a payment through the full pipeline
    pub async fn evaluate_payment(&self, request: OperationRequest) -> EngineResult<OperationOutcome> {
        if request.operation != OperationKind::Payment {
            return Err(EngineError::Validation(
                "evaluate_payment requires a payment request".to_string(),
            ));
        }
        self.evaluate(request).await
    }

    /// Run a refund through the full pipeline
    pub async fn evaluate_refund(&self, request: OperationRequest) -> EngineResult<OperationOutcome> {
        if request.operation != OperationKind::Refund {
            return Err(EngineError::Validation(
                "evaluate_refund requires a refund request".to_string(),
            ));
        }
        self.evaluate(request).await
    }

    async fn evaluate(&self, request: OperationRequest) -> EngineResult<OperationOutcome> {
        self.validate(&request)?;
        self.authorize(&request)?;

        // Record before detection so the current attempt counts against
        // its own velocity windows.
        let actor = request.actor_key();
        let window = self
            .tracker
            .record(request.operation.event_kind(), &actor, request.amount);
        if let Some(origin) = request.origin_key() {
            self.tracker
                .record(request.operation.event_kind(), &origin, request.amount);
        }

        let history = self.resolve_history(&request, &actor, window);

        let assessment = match self.registry.detect_all(&request, &history).await {
            Ok(flags) => self
                .scorer
                .score(request.operation, flags, request.requester_role),
            Err(e) => {
                tracing::error!(
                    subject_id = %request.subject_id,
                    error = %e,
                    "detection failed, failing closed"
                );
                RiskAssessment::fail_closed(e.to_string())
            }
        };

        self.conclude(&request, assessment)
    }

    fn validate(&self, request: &OperationRequest) -> EngineResult<()> {
        if request.tenant_id.is_empty() {
            return Err(EngineError::Validation("tenant_id is required".to_string()));
        }
        if request.customer_id.is_empty() {
            return Err(EngineError::Validation(
                "customer_id is required".to_string(),
            ));
        }
        if request.subject_id.is_empty() {
            return Err(EngineError::Validation(
                "subject_id is required".to_string(),
            ));
        }
        if request.amount.is_sign_negative() || request.amount.is_zero() {
            return Err(EngineError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn authorize(&self, request: &OperationRequest) -> EngineResult<()> {
        // Partial refunds are a staff operation.
        if request.operation == OperationKind::Refund
            && request.partial
            && !request.requester_role.is_staff()
        {
            let entry = AuditEntry::new(
                &request.tenant_id,
                AuditEvent::AuthorizationDenied,
                &request.customer_id,
            )
            .with_subject(&request.subject_id)
            .with_operation(request.operation)
            .with_amount(request.amount)
            .with_score(10)
            .with_error("partial refund requires a staff role")
            .with_detail(serde_json::json!({
                "requested_by": request.requested_by.clone(),
                "role": request.requester_role.as_str(),
            }));
            self.audit(entry);

            return Err(EngineError::Authorization {
                role: request.requester_role.as_str(),
                action: "issue a partial refund".to_string(),
            });
        }
        Ok(())
    }

    /// Assemble detector inputs. Read-only: consults windows and caches
    /// without recording new events.
    fn resolve_history(
        &self,
        request: &OperationRequest,
        actor: &ActorKey,
        window: VelocityWindow,
    ) -> ActorHistory {
        let mut history = ActorHistory::new().with_velocity(window);

        if let Some(origin) = request.origin_key() {
            let origin_requests = self
                .tracker
                .window(&origin)
                .map(|w| w.day.count())
                .unwrap_or(0);
            history = history.with_origin(
                origin_requests,
                self.blocklist.is_blocked(&origin.id),
            );
        }

        history = history.with_chargeback(
            self.chargebacks.score(&request.subject_id),
            self.chargebacks.incidents_within(
                &actor.id,
                Duration::days(self.config.chargeback_retention_days),
            ),
        );

        if let Some(class) = self.instrument_class(&request.customer_id) {
            history = history.with_instrument(class);
        }

        history
    }

    fn conclude(
        &self,
        request: &OperationRequest,
        assessment: RiskAssessment,
    ) -> EngineResult<OperationOutcome> {
        let evaluated_event = match request.operation {
            OperationKind::Payment => AuditEvent::PaymentEvaluated,
            OperationKind::Refund => AuditEvent::RefundEvaluated,
        };
        let flags: Vec<String> = assessment
            .flags
            .iter()
            .map(|f| f.description.clone())
            .collect();

        let evaluated = |decision: &str| {
            AuditEntry::new(&request.tenant_id, evaluated_event, &request.customer_id)
                .with_subject(&request.subject_id)
                .with_operation(request.operation)
                .with_amount(request.amount)
                .with_score(assessment.score)
                .with_flags(flags.clone())
                .with_decision(decision)
        };

        if assessment.is_deny() {
            tracing::warn!(
                subject_id = %request.subject_id,
                score = assessment.score,
                "operation denied"
            );
            let fraud_id = self.audit(
                AuditEntry::new(
                    &request.tenant_id,
                    AuditEvent::FraudDetected,
                    &request.customer_id,
                )
                .with_subject(&request.subject_id)
                .with_operation(request.operation)
                .with_amount(request.amount)
                .with_score(assessment.score)
                .with_flags(flags.clone()),
            );
            let outcome_id = self.audit(evaluated("denied"));
            return Ok(OperationOutcome::denied(
                assessment,
                [fraud_id, outcome_id].into_iter().flatten().collect(),
            ));
        }

        if assessment.requires_approval {
            let approval = PendingApproval::new(request, assessment.clone());
            self.approvals().create(&approval)?;

            let requested_id = self.audit(
                AuditEntry::new(
                    &request.tenant_id,
                    AuditEvent::ApprovalRequested,
                    &request.customer_id,
                )
                .with_subject(&request.subject_id)
                .with_operation(request.operation)
                .with_amount(request.amount)
                .with_score(assessment.score)
                .with_detail(serde_json::json!({ "approval_id": approval.id.clone() })),
            );
            let outcome_id = self.audit(evaluated("pending"));
            return Ok(OperationOutcome::pending(
                assessment,
                approval.id,
                [requested_id, outcome_id].into_iter().flatten().collect(),
            ));
        }

        let outcome_id = self.audit(evaluated("approved"));
        Ok(OperationOutcome::approved(
            assessment,
            outcome_id.into_iter().collect(),
        ))
    }

    // === Approvals ===

    /// Resolve a parked operation.
    ///
    /// Existence, terminality and resolver authority are checked before
    /// anything else; every refused attempt leaves an `approval_denied`
    /// entry with the reason. Approving re-runs detection against current
    /// history unless `override_fraud_check` is set; if the fresh
    /// assessment denies, the approval is denied instead of granted.
    /// Denials never re-evaluate.
    pub async fn resolve_approval(
        &self,
        ctx: &Principal,
        approval_id: &str,
        resolution: Resolution,
        note: Option<&str>,
        override_fraud_check: bool,
    ) -> EngineResult<OperationOutcome> {
        let approval = match self.approvals().get(approval_id) {
            Ok(approval) => approval,
            Err(e) => {
                self.audit(
                    AuditEntry::new(&ctx.tenant_id, AuditEvent::ApprovalDenied, &ctx.id)
                        .with_error("approval not found")
                        .with_detail(serde_json::json!({ "approval_id": approval_id })),
                );
                return Err(e.into());
            }
        };

        if approval.status.is_terminal() {
            self.audit_rejection(ctx, &approval, "already resolved");
            return Err(EngineError::Conflict(format!(
                "approval already {}",
                approval.status.as_str()
            )));
        }

        if !self.config.approval.can_resolve(ctx.role, approval.amount) {
            self.audit_rejection(ctx, &approval, "insufficient authority for amount");
            return Err(EngineError::Authorization {
                role: ctx.role.as_str(),
                action: format!("resolve an approval of {}", approval.amount),
            });
        }

        if resolution == Resolution::Approve && !override_fraud_check {
            let fresh = self.reevaluate(&approval.request).await;

            if fresh.is_deny() {
                tracing::warn!(
                    approval_id,
                    score = fresh.score,
                    "approval denied on re-evaluation"
                );
                let denied = self.approvals().resolve(
                    approval_id,
                    Resolution::Deny,
                    &ctx.id,
                    ctx.role,
                    Some("denied on re-evaluation"),
                )?;
                let audit_ids = self
                    .audit_resolution(&denied, AuditEvent::ApprovalDenied)
                    .into_iter()
                    .collect();
                return Ok(OperationOutcome::denied(fresh, audit_ids));
            }
        }

        let resolved = self
            .approvals()
            .resolve(approval_id, resolution, &ctx.id, ctx.role, note)?;

        let event = match resolution {
            Resolution::Approve => AuditEvent::ApprovalGranted,
            Resolution::Deny => AuditEvent::ApprovalDenied,
        };
        let audit_ids: Vec<String> = self.audit_resolution(&resolved, event).into_iter().collect();

        Ok(match resolution {
            Resolution::Approve => OperationOutcome::approved(resolved.assessment, audit_ids),
            Resolution::Deny => OperationOutcome::denied(resolved.assessment, audit_ids),
        })
    }

    /// Detect and score without recording a new velocity event
    async fn reevaluate(&self, request: &OperationRequest) -> RiskAssessment {
        let actor = request.actor_key();
        let window = self
            .tracker
            .window(&actor)
            .unwrap_or_else(|| VelocityWindow::new(chrono::Utc::now()));
        let history = self.resolve_history(request, &actor, window);

        match self.registry.detect_all(request, &history).await {
            Ok(flags) => self
                .scorer
                .score(request.operation, flags, request.requester_role),
            Err(e) => {
                tracing::error!(error = %e, "re-evaluation failed, failing closed");
                RiskAssessment::fail_closed(e.to_string())
            }
        }
    }

    fn audit_resolution(&self, approval: &PendingApproval, event: AuditEvent) -> Option<String> {
        self.audit(
            AuditEntry::new(&approval.tenant_id, event, &approval.actor.id)
                .with_subject(&approval.subject_id)
                .with_operation(approval.operation)
                .with_amount(approval.amount)
                .with_score(approval.assessment.score)
                .with_detail(serde_json::json!({
                    "approval_id": approval.id.clone(),
                    "resolved_by": approval.resolved_by.clone(),
                    "note": approval.resolution_note.clone(),
                })),
        )
    }

    // A refused resolution attempt leaves the approval pending but still
    // gets a ledger entry.
    fn audit_rejection(&self, ctx: &Principal, approval: &PendingApproval, reason: &str) {
        self.audit(
            AuditEntry::new(&approval.tenant_id, AuditEvent::ApprovalDenied, &approval.actor.id)
                .with_subject(&approval.subject_id)
                .with_operation(approval.operation)
                .with_amount(approval.amount)
                .with_error(reason)
                .with_detail(serde_json::json!({
                    "approval_id": approval.id.clone(),
                    "attempted_by": ctx.id.clone(),
                    "role": ctx.role.as_str(),
                })),
        );
    }

    pub fn approval(&self, id: &str) -> EngineResult<PendingApproval> {
        Ok(self.approvals().get(id)?)
    }

    pub fn pending_approvals(&self) -> EngineResult<Vec<PendingApproval>> {
        Ok(self.approvals().list_pending()?)
    }

    // === External risk data ===

    /// Record a chargeback risk score for a subject; write-once
    pub fn set_chargeback_risk(&self, subject_id: &str, score: u8) -> bool {
        self.chargebacks.set_score(subject_id, score)
    }

    /// Record a confirmed chargeback incident against an actor
    pub fn record_chargeback(&self, actor_id: &str) {
        self.chargebacks.record_incident(actor_id);
    }

    pub fn set_instrument_class(&self, customer_id: &str, class: InstrumentClass) {
        self.instruments
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(customer_id.to_string(), class);
    }

    fn instrument_class(&self, customer_id: &str) -> Option<InstrumentClass> {
        self.instruments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(customer_id)
            .copied()
    }

    // === Blocklist ===

    /// Add a network origin to the blocklist (manager and above)
    pub fn block_origin(
        &self,
        ctx: &Principal,
        origin: &str,
        reason: &str,
    ) -> EngineResult<bool> {
        self.require_role(ctx, Role::Manager, "modify the blocklist")?;
        let added = self.blocklist.block(origin);
        if added {
            self.audit(
                AuditEntry::new(&ctx.tenant_id, AuditEvent::ActorBlocked, origin).with_detail(
                    serde_json::json!({ "by": ctx.id.clone(), "reason": reason }),
                ),
            );
        }
        Ok(added)
    }

    /// Remove a network origin from the blocklist (manager and above)
    pub fn unblock_origin(&self, ctx: &Principal, origin: &str) -> EngineResult<bool> {
        self.require_role(ctx, Role::Manager, "modify the blocklist")?;
        let removed = self.blocklist.unblock(origin);
        if removed {
            self.audit(
                AuditEntry::new(&ctx.tenant_id, AuditEvent::ActorUnblocked, origin)
                    .with_detail(serde_json::json!({ "by": ctx.id.clone() })),
            );
        }
        Ok(removed)
    }

    pub fn is_origin_blocked(&self, origin: &str) -> bool {
        self.blocklist.is_blocked(origin)
    }

    fn require_role(
        &self,
        ctx: &Principal,
        minimum: Role,
        action: &str,
    ) -> EngineResult<()> {
        if ctx.role < minimum {
            return Err(EngineError::Authorization {
                role: ctx.role.as_str(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    // === Audit and introspection ===

    pub fn audit_query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        self.ledger()
            .query(query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn audit_metrics(&self) -> AuditMetrics {
        self.ledger().metrics()
    }

    /// Reload the audit ring from the JSONL sink after a restart and
    /// rebuild velocity counters from the evaluated events, oldest first.
    ///
    /// Only the customer actor can be reconstructed; the ledger does not
    /// record network origins, so origin windows refill from live traffic.
    pub fn replay_audit(&self) -> EngineResult<usize> {
        let total = self.ledger().replay()?;

        let entries = self.ledger().read_all()?;
        for entry in &entries {
            let kind = match entry.event {
                AuditEvent::PaymentEvaluated => EventKind::Payment,
                AuditEvent::RefundEvaluated => EventKind::Refund,
                _ => continue,
            };
            let Some(amount) = entry.amount else { continue };
            self.tracker.record_at(
                kind,
                &ActorKey::customer(entry.actor_id.as_str()),
                amount,
                entry.timestamp,
            );
        }

        Ok(total)
    }

    pub fn velocity(&self, actor: &ActorKey) -> Option<VelocityWindow> {
        self.tracker.window(actor)
    }

    // === Housekeeping ===

    /// One sweep: drop idle velocity actors, prune aged chargebacks
    pub fn run_housekeeping(&self) {
        let swept = self
            .tracker
            .sweep_stale(Duration::days(self.config.stale_actor_idle_days));
        self.chargebacks
            .prune(Duration::days(self.config.chargeback_retention_days));
        tracing::debug!(swept_actors = swept, "housekeeping pass complete");
    }

    /// Periodic housekeeping on a tokio interval
    pub fn spawn_housekeeping(
        self: Arc<Self>,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // immediate first tick
            loop {
                interval.tick().await;
                self.run_housekeeping();
            }
        })
    }

    // Audit failures are logged but never change a decision.
    fn audit(&self, entry: AuditEntry) -> Option<String> {
        match self.ledger().append(entry) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, "audit append failed");
                None
            }
        }
    }

    fn approvals(&self) -> MutexGuard<'_, ApprovalWorkflow> {
        self.approvals.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ledger(&self) -> MutexGuard<'_, AuditLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::Recommendation;
    use rust_decimal_macros::dec;

    fn engine() -> RiskEngine {
        RiskEngine::new(EngineConfig::default()).unwrap()
    }

    fn payment(subject: &str, amount: rust_decimal::Decimal) -> OperationRequest {
        OperationRequest::new(OperationKind::Payment, "tenant-1", "cust-1", subject, amount)
    }

    #[tokio::test]
    async fn test_rejects_mismatched_operation() {
        let engine = engine();
        let result = engine
            .evaluate_refund(payment("pay-1", dec!(10)))
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let engine = engine();
        let result = engine.evaluate_payment(payment("pay-1", dec!(0))).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_partial_refund_requires_staff() {
        let engine = engine();
        let request = OperationRequest::new(
            OperationKind::Refund,
            "tenant-1",
            "cust-1",
            "pay-1",
            dec!(10),
        )
        .partial_refund();

        let result = engine.evaluate_refund(request).await;
        assert!(matches!(result, Err(EngineError::Authorization { .. })));

        // The denial is audited.
        let denied = engine.audit_query(&AuditQuery::new().event(AuditEvent::AuthorizationDenied));
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].score, Some(10));
        assert!(!denied[0].success);
        assert!(denied[0].error_message.is_some());
    }

    #[tokio::test]
    async fn test_partial_refund_allowed_for_staff() {
        let engine = engine();
        let request = OperationRequest::new(
            OperationKind::Refund,
            "tenant-1",
            "cust-1",
            "pay-1",
            dec!(10),
        )
        .with_requester("agent-1", Role::Support)
        .partial_refund();

        let outcome = engine.evaluate_refund(request).await.unwrap();
        assert_ne!(outcome.assessment.recommendation, Recommendation::Deny);
    }

    #[tokio::test]
    async fn test_evaluation_records_velocity() {
        let engine = engine();
        engine
            .evaluate_payment(payment("pay-1", dec!(10)))
            .await
            .unwrap();
        engine
            .evaluate_payment(payment("pay-2", dec!(10)))
            .await
            .unwrap();

        let window = engine.velocity(&ActorKey::customer("cust-1")).unwrap();
        assert_eq!(window.hour.payments, 2);
    }

    #[tokio::test]
    async fn test_blocklist_requires_manager() {
        let engine = engine();
        let support = Principal::staff("agent-1", Role::Support, "tenant-1");
        let manager = Principal::staff("mgr-1", Role::Manager, "tenant-1");

        let denied = engine.block_origin(&support, "203.0.113.9", "abuse");
        assert!(matches!(denied, Err(EngineError::Authorization { .. })));

        assert!(engine.block_origin(&manager, "203.0.113.9", "abuse").unwrap());
        assert!(engine.is_origin_blocked("203.0.113.9"));

        assert!(engine.unblock_origin(&manager, "203.0.113.9").unwrap());
        assert!(!engine.is_origin_blocked("203.0.113.9"));
    }
}
