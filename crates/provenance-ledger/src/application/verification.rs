//! Verification Service
//!
//! Public authenticity checks. A token (batch number or fingerprint) resolves
//! to a stored record, the fingerprint is recomputed from the stored content
//! and stored salt, and the two are compared. A matching crop is moved to
//! `verified` the first time it is checked.

use crate::application::context::LedgerContext;
use crate::application::ledger::LedgerService;
use crate::application::transitions::TransitionService;
use crate::domain::{CropStatus, LedgerError, LedgerRecord, TamperEvidence, VerificationReport};
use crate::ports::inbound::{LedgerStoreApi, TransitionApi, VerificationApi};
use crate::ports::outbound::RecordStore;
use async_trait::async_trait;
use shared_bus::LedgerEvent;
use tracing::{error, info};

pub struct VerificationService<S> {
    ctx: LedgerContext<S>,
    ledger: LedgerService<S>,
    transitions: TransitionService<S>,
}

impl<S> Clone for VerificationService<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            ledger: self.ledger.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

impl<S: RecordStore + 'static> VerificationService<S> {
    pub fn new(ctx: LedgerContext<S>) -> Self {
        Self {
            ledger: LedgerService::new(ctx.clone()),
            transitions: TransitionService::new(ctx.clone()),
            ctx,
        }
    }

    async fn report_tamper(&self, record: &LedgerRecord, evidence: &TamperEvidence) {
        let recomputed = evidence
            .recomputed
            .map(|fp| fp.to_hex())
            .unwrap_or_default();

        error!(
            record_id = %record.id(),
            kind = %record.kind(),
            stored = %evidence.stored,
            recomputed = %recomputed,
            "[verify] Fingerprint mismatch, stored record has been altered"
        );
        self.ctx
            .publish(LedgerEvent::TamperDetected {
                record_id: record.id(),
                kind: record.kind(),
                stored: evidence.stored.to_hex(),
                recomputed,
            })
            .await;
    }
}

#[async_trait]
impl<S: RecordStore + 'static> VerificationApi for VerificationService<S> {
    async fn verify(&self, token: &str) -> Result<VerificationReport, LedgerError> {
        let token = token.trim();
        let Some(record) = self.ledger.find_by_batch_or_hash(token).await? else {
            info!(token, "[verify] No record for token");
            return Ok(VerificationReport::not_found(token));
        };

        let stored = record.fingerprint();
        // A payload that no longer validates cannot reproduce any fingerprint.
        let recomputed = record.seal().recompute(&record.canonical_payload()).ok();

        if recomputed != Some(stored) {
            let evidence = TamperEvidence { stored, recomputed };
            self.report_tamper(&record, &evidence).await;
            return Ok(VerificationReport::tampered(token, record, evidence));
        }

        let (record, newly_verified) = match record {
            LedgerRecord::Crop(mut crop) => {
                let newly = self.transitions.mark_crop_verified(crop.id).await?;
                crop.status = CropStatus::Verified;
                (LedgerRecord::Crop(crop), newly)
            }
            other => (other, false),
        };

        info!(
            record_id = %record.id(),
            kind = %record.kind(),
            fingerprint = %stored.short(),
            newly_verified,
            "[verify] Record authentic"
        );
        Ok(VerificationReport::authentic(token, record, newly_verified))
    }

    async fn ensure_authentic(&self, token: &str) -> Result<LedgerRecord, LedgerError> {
        let report = self.verify(token).await?;

        match (report.record, report.tamper) {
            (Some(record), None) if report.authentic => Ok(record),
            (Some(record), Some(evidence)) => Err(LedgerError::TamperDetected {
                record_id: record.id(),
                kind: record.kind(),
                stored: evidence.stored.to_hex(),
                recomputed: evidence
                    .recomputed
                    .map(|fp| fp.to_hex())
                    .unwrap_or_default(),
            }),
            _ => Err(LedgerError::not_found("record", report.token)),
        }
    }
}
