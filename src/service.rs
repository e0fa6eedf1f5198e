//! Service orchestration: uploads, compares, and claim verification.
//!
//! `MatchService` ties the pipeline to a blob store and owns the
//! compute-then-verify ordering. All work for one user runs under that
//! user's gate, so a verify that starts after a compare finishes always
//! judges against that compare's record, and concurrent compares for
//! one user serialize with the latest committed record winning.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::ckks::{CkksContext, PublicContext, SchemeError};
use crate::params::ProtocolParams;
use crate::protocol::{
    compare_plan, judge, run_compare, Decision, EncryptedVector, IndexRecord, ProtocolError,
};
use crate::store::{BlobKind, UserStore};

/// The matching service over a blob store.
///
/// # Fields
///
/// * `ctx` - Evaluation context for the agreed parameter set
/// * `protocol` - Matching parameters every compare runs under
/// * `store` - Per-user blob storage
pub struct MatchService<S: UserStore> {
    ctx: CkksContext,
    protocol: ProtocolParams,
    store: S,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: UserStore> MatchService<S> {
    /// Builds the service, validating the protocol against the scheme.
    pub fn new(
        ctx: CkksContext,
        protocol: ProtocolParams,
        store: S,
    ) -> Result<Self, ProtocolError> {
        protocol
            .validate(ctx.params())
            .map_err(SchemeError::InvalidParams)?;
        Ok(Self {
            ctx,
            protocol,
            store,
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// The evaluation context the service runs under
    pub fn context(&self) -> &CkksContext {
        &self.ctx
    }

    /// The matching parameters the service runs under
    pub fn protocol(&self) -> &ProtocolParams {
        &self.protocol
    }

    /// One gate per user; held across a compare or a verify
    fn user_gate(&self, user: &str) -> Arc<Mutex<()>> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        gates.entry(user.to_string()).or_default().clone()
    }

    /// Validates and stores a user's public context bundle.
    ///
    /// The bundle must match the service's parameter set and carry
    /// relinearization keys for every level plus rotation keys for the
    /// slot-sum ladder, or the upload is rejected.
    pub fn put_context(&self, user: &str, bytes: &[u8]) -> Result<(), ProtocolError> {
        let bundle: PublicContext = bincode::deserialize(bytes)
            .map_err(|e| ProtocolError::InvalidContext(format!("undecodable bundle: {}", e)))?;
        bundle.ensure_coverage(&self.ctx, &compare_plan(&self.protocol))?;

        self.store.put(user, BlobKind::Context, bytes)?;
        info!("Context registered for user {}", user);
        Ok(())
    }

    /// Validates and stores a user's encrypted template.
    pub fn enroll_template(&self, user: &str, bytes: &[u8]) -> Result<(), ProtocolError> {
        let vector = EncryptedVector::from_bytes(bytes)?;
        vector.link(&self.ctx, &self.protocol)?;

        self.store.put(user, BlobKind::Template, bytes)?;
        info!("Template enrolled for user {}", user);
        Ok(())
    }

    /// Stores a sample and runs the full compare against the enrolled
    /// template.
    ///
    /// Returns the serialized masked score vector. The result and its
    /// index record are committed together only after the whole
    /// pipeline succeeds; a failed compare leaves no partial outcome.
    pub fn submit_sample<R: Rng>(
        &self,
        user: &str,
        bytes: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, ProtocolError> {
        let gate = self.user_gate(user);
        let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);

        let sample = EncryptedVector::from_bytes(bytes)?;
        sample.link(&self.ctx, &self.protocol)?;
        self.store.put(user, BlobKind::Sample, bytes)?;

        let context_bytes = self
            .store
            .get(user, BlobKind::Context)?
            .ok_or(ProtocolError::MissingKey)?;
        let bundle: PublicContext = bincode::deserialize(&context_bytes)
            .map_err(|e| ProtocolError::InvalidContext(format!("stored bundle: {}", e)))?;

        let template_bytes = self
            .store
            .get(user, BlobKind::Template)?
            .ok_or(ProtocolError::MissingTemplate)?;
        let template = EncryptedVector::from_bytes(&template_bytes)?;

        let start = Instant::now();
        let outcome = run_compare(
            &self.ctx,
            &bundle,
            &self.protocol,
            &template,
            &sample,
            rng,
        )?;
        debug!(
            "Compare pipeline for user {} took {:.2?}",
            user,
            start.elapsed()
        );

        let result_bytes = bincode::serialize(&outcome.result)?;
        let record_bytes = outcome.record.to_json()?;
        self.store
            .commit_outcome(user, &result_bytes, &record_bytes)?;

        info!("Compare committed for user {}", user);
        Ok(result_bytes)
    }

    /// Judges a claimed index against the pending record.
    ///
    /// The record is consumed whatever the outcome, so each compare
    /// admits exactly one verification attempt. A claim that matches
    /// neither the record nor the reject sentinel is an error.
    pub fn verify_claim(&self, user: &str, claim: &str) -> Result<Decision, ProtocolError> {
        let gate = self.user_gate(user);
        let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);

        let record_bytes = self
            .store
            .take(user, BlobKind::IndexRecord)?
            .ok_or(ProtocolError::IndexRecordMissing)?;
        let record = IndexRecord::from_json(&record_bytes)?;

        let decision = judge(claim, &record);
        info!("Claim for user {} judged: {:?}", user, decision);
        match decision {
            Decision::Untrusted => Err(ProtocolError::UntrustedClaim),
            other => Ok(other),
        }
    }

    /// Returns the latest committed compare result.
    pub fn fetch_result(&self, user: &str) -> Result<Vec<u8>, ProtocolError> {
        self.store
            .get(user, BlobKind::Result)?
            .ok_or(ProtocolError::MissingResult)
    }

    /// Removes every stored artifact for the user.
    pub fn delete_user(&self, user: &str) -> Result<(), ProtocolError> {
        let gate = self.user_gate(user);
        let _held = gate.lock().unwrap_or_else(PoisonError::into_inner);

        self.store.delete_user(user)?;
        info!("Deleted all artifacts for user {}", user);
        Ok(())
    }
}
