//! GenomeProvider — drives the commit-reveal protocol for many tokens
//!
//! Each call validates against a copy of the token's record and writes the
//! record back only once every check has passed, so a failed call never
//! leaves a half-applied transition behind.

use super::commitment::{CommitmentState, SeedCommitment};
use super::events::{GenomeEvent, Notification};
use crate::error::RevealError;
use crate::genome::{compute_genome, Genome};
use crate::randomness::{Fulfillment, FulfillmentSink, RandomnessRequest, RandomnessSource};
use crate::seed::{compute_token_seed, hash_secret, TokenId, Word};
use crate::storage::CommitmentStore;
use crate::traits::{TraitConfigRegistry, DEFAULT_TRAIT_COUNT, MAX_BONUS};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::mpsc;

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Callers allowed to commit, request, reveal and configure
    pub operators: Vec<String>,
    /// Number of trait slots in the registry
    pub trait_count: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            operators: vec!["operator".to_string()],
            trait_count: DEFAULT_TRAIT_COUNT,
        }
    }
}

pub struct GenomeProvider<S: RandomnessSource> {
    operators: HashSet<String>,
    registry: TraitConfigRegistry,
    store: CommitmentStore,
    source: S,
    sink: FulfillmentSink,
    inbox: mpsc::UnboundedReceiver<Fulfillment>,
    events: Vec<Notification>,
    next_sequence: u64,
}

impl<S: RandomnessSource> GenomeProvider<S> {
    /// Provider with an empty registry sized from `config`
    pub fn new(config: ProviderConfig, source: S) -> Self {
        let registry = TraitConfigRegistry::new(config.trait_count);
        Self::with_parts(config, registry, CommitmentStore::default(), source)
    }

    pub fn with_parts(
        config: ProviderConfig,
        registry: TraitConfigRegistry,
        store: CommitmentStore,
        source: S,
    ) -> Self {
        let (sink, inbox) = FulfillmentSink::channel();
        info!(
            "Genome provider ready: {} traits, {} operators, randomness source '{}'",
            registry.trait_count(),
            config.operators.len(),
            source.name()
        );
        Self {
            operators: config.operators.into_iter().collect(),
            registry,
            store,
            source,
            sink,
            inbox,
            events: Vec::new(),
            next_sequence: 0,
        }
    }

    fn authorize(&self, caller: &str) -> Result<(), RevealError> {
        if self.operators.contains(caller) {
            Ok(())
        } else {
            warn!("Rejected call from unauthorized caller '{}'", caller);
            Err(RevealError::Unauthorized(caller.to_string()))
        }
    }

    fn record(&self, token_id: TokenId) -> SeedCommitment {
        self.store
            .get(token_id)
            .cloned()
            .unwrap_or_else(|| SeedCommitment::new(token_id))
    }

    fn emit(&mut self, event: GenomeEvent) {
        debug!("Event #{}: {:?}", self.next_sequence, event);
        self.events.push(Notification::new(self.next_sequence, event));
        self.next_sequence += 1;
    }

    // ---- configuration ----

    pub fn set_trait_config(
        &mut self,
        caller: &str,
        trait_index: usize,
        byte_slots: Vec<usize>,
        option_data: Vec<u8>,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<(), RevealError> {
        self.authorize(caller)?;
        self.registry
            .set_trait_config(trait_index, byte_slots, option_data, base_weight, max_bonus_weight)
    }

    pub fn set_trait_weight(
        &mut self,
        caller: &str,
        trait_index: usize,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<(), RevealError> {
        self.authorize(caller)?;
        self.registry.set_trait_weight(trait_index, base_weight, max_bonus_weight)
    }

    // ---- protocol ----

    /// Publish the commitment `secret_hash` for `token_id`
    pub fn publish_secret_hash(
        &mut self,
        caller: &str,
        token_id: TokenId,
        secret_hash: Word,
    ) -> Result<(), RevealError> {
        self.authorize(caller)?;
        let mut record = self.record(token_id);
        if record.secret_hash.is_some() {
            return Err(RevealError::AlreadyCommitted(token_id));
        }
        record.secret_hash = Some(secret_hash);
        self.store.put(record);
        info!("Token {}: secret hash published", token_id);
        self.emit(GenomeEvent::HashPublished { token_id, secret_hash });
        Ok(())
    }

    /// Fix the bonus level and ask the randomness source for this token's
    /// entropy. `approval` is opaque and only forwarded in the notification.
    ///
    /// If a hash was already published it must equal `secret_hash`.
    pub fn request_reveal(
        &mut self,
        caller: &str,
        token_id: TokenId,
        bonus_level: u8,
        secret_hash: Word,
        approval: Vec<u8>,
    ) -> Result<RandomnessRequest, RevealError> {
        self.authorize(caller)?;
        let mut record = self.record(token_id);
        if record.requested {
            return Err(RevealError::AlreadyRequested(token_id));
        }
        if bonus_level > MAX_BONUS {
            return Err(RevealError::BonusOutOfRange {
                level: bonus_level,
                max: MAX_BONUS,
            });
        }
        if matches!(record.secret_hash, Some(h) if h != secret_hash) {
            return Err(RevealError::AlreadyCommitted(token_id));
        }

        let request = RandomnessRequest::new(token_id);
        self.source.request(&request, &self.sink)?;

        record.requested = true;
        record.request_id = Some(request.request_id.clone());
        record.bonus_level = bonus_level;
        record.secret_hash = Some(secret_hash);
        self.store.put(record);
        info!(
            "Token {}: reveal requested (bonus {}, request {})",
            token_id, bonus_level, request.request_id
        );
        self.emit(GenomeEvent::RevealRequested {
            token_id,
            request_id: request.request_id.clone(),
            bonus_level,
            approval,
        });
        Ok(request)
    }

    /// Randomness callback. A second delivery for the same token is a
    /// protocol violation and fails with `DuplicateRandomness`.
    pub fn on_randomness_arrived(&mut self, fulfillment: Fulfillment) -> Result<(), RevealError> {
        let token_id = fulfillment.token_id();
        let mut record = self.record(token_id);
        if record.random_value.is_some() {
            return Err(RevealError::DuplicateRandomness(token_id));
        }
        if !record.requested || record.request_id.as_deref() != Some(fulfillment.request_id()) {
            return Err(RevealError::NotRequested(token_id));
        }
        let random_value = *fulfillment.value();
        record.random_value = Some(random_value);
        record.reveal_timestamp = Some(Utc::now());
        self.store.put(record);
        info!("Token {}: randomness received", token_id);
        self.emit(GenomeEvent::RandomnessReceived {
            token_id,
            random_value,
        });
        Ok(())
    }

    /// Apply every fulfillment already waiting in the inbox
    pub fn deliver_pending(&mut self) -> Vec<Result<TokenId, RevealError>> {
        let mut results = Vec::new();
        while let Ok(fulfillment) = self.inbox.try_recv() {
            results.push(self.apply(fulfillment));
        }
        results
    }

    /// Wait for the next fulfillment and apply it
    pub async fn next_delivery(&mut self) -> Option<Result<TokenId, RevealError>> {
        let fulfillment = self.inbox.recv().await?;
        Some(self.apply(fulfillment))
    }

    fn apply(&mut self, fulfillment: Fulfillment) -> Result<TokenId, RevealError> {
        let token_id = fulfillment.token_id();
        self.on_randomness_arrived(fulfillment)
            .map(|_| token_id)
            .inspect_err(|e| warn!("Dropped randomness for token {}: {}", token_id, e))
    }

    /// Reveal the committed secret, derive the token seed and compute the genome
    pub fn reveal_secret_and_compute_genome(
        &mut self,
        caller: &str,
        token_id: TokenId,
        secret: Word,
    ) -> Result<Genome, RevealError> {
        self.authorize(caller)?;
        let mut record = self.record(token_id);
        if record.secret.is_some() {
            return Err(RevealError::AlreadyRevealed(token_id));
        }
        if record.secret_hash != Some(hash_secret(&secret)) {
            return Err(RevealError::HashMismatch(token_id));
        }
        let random_value = record
            .random_value
            .ok_or(RevealError::RandomnessPending(token_id))?;

        let token_seed = compute_token_seed(token_id, record.bonus_level, &secret, &random_value);
        let genome = compute_genome(&self.registry, &token_seed, record.bonus_level)?;

        record.secret = Some(secret);
        record.token_seed = Some(token_seed);
        record.genome = Some(genome);
        self.store.put(record);
        info!("Token {}: genome finalized {}", token_id, genome);
        self.emit(GenomeEvent::GenomeFinalized {
            token_id,
            secret,
            token_seed,
            genome,
        });
        Ok(genome)
    }

    // ---- queries ----

    pub fn compute_token_seed(
        &self,
        token_id: TokenId,
        bonus_level: u8,
        secret: &Word,
        random_value: &Word,
    ) -> Word {
        compute_token_seed(token_id, bonus_level, secret, random_value)
    }

    pub fn compute_genome(&self, token_seed: &Word, bonus_level: u8) -> Result<Genome, RevealError> {
        compute_genome(&self.registry, token_seed, bonus_level)
    }

    pub fn is_finalized(&self, token_id: TokenId) -> bool {
        self.store.get(token_id).is_some_and(SeedCommitment::is_finalized)
    }

    pub fn get_commitment(&self, token_id: TokenId) -> Option<&SeedCommitment> {
        self.store.get(token_id)
    }

    pub fn commitment_state(&self, token_id: TokenId) -> CommitmentState {
        self.store
            .get(token_id)
            .map_or(CommitmentState::Uncommitted, SeedCommitment::state)
    }

    pub fn registry(&self) -> &TraitConfigRegistry {
        &self.registry
    }

    pub fn store(&self) -> &CommitmentStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn events(&self) -> &[Notification] {
        &self.events
    }

    /// Hand the accumulated notifications to the caller
    pub fn drain_events(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::{DeterministicSource, OracleConfig, OracleSource};
    use crate::traits::test_registry;

    const OP: &str = "operator";

    fn provider() -> GenomeProvider<DeterministicSource> {
        GenomeProvider::with_parts(
            ProviderConfig::default(),
            test_registry(),
            CommitmentStore::default(),
            DeterministicSource::default(),
        )
    }

    fn secret() -> Word {
        Word::from(0xAAu64)
    }

    /// Commit, request and deliver randomness for `token_id`
    fn ready(p: &mut GenomeProvider<DeterministicSource>, token_id: TokenId, bonus: u8) {
        let hash = hash_secret(&secret());
        p.publish_secret_hash(OP, token_id, hash).unwrap();
        p.request_reveal(OP, token_id, bonus, hash, vec![]).unwrap();
        assert_eq!(p.deliver_pending(), vec![Ok(token_id)]);
    }

    #[test]
    fn test_full_protocol_run() {
        let mut p = provider();
        ready(&mut p, 1, 0);
        assert_eq!(p.commitment_state(1), CommitmentState::RandomnessReceived);
        assert!(!p.is_finalized(1));

        let genome = p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
        assert!(p.is_finalized(1));

        let record = p.get_commitment(1).unwrap();
        let random = record.random_value.unwrap();
        assert_eq!(random, DeterministicSource::value_for(0, 1));
        assert!(record.reveal_timestamp.is_some());

        // independent recomputation from the published formula
        let seed = compute_token_seed(1, 0, &Word::from(0xAAu64), &random);
        assert_eq!(record.token_seed, Some(seed));
        assert_eq!(p.compute_genome(&p.compute_token_seed(1, 0, &secret(), &random), 0).unwrap(), genome);
        assert!(record.verify(p.registry()).unwrap());
    }

    #[test]
    fn test_fixed_randomness_scenario() {
        let mut p = provider();
        let hash = hash_secret(&secret());
        let request = p.request_reveal(OP, 1, 0, hash, vec![]).unwrap();
        // discard the stub's value and deliver 0xBB for the same request
        p.inbox.try_recv().unwrap();
        p.on_randomness_arrived(Fulfillment::new(&request, Word::from(0xBBu64))).unwrap();

        p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
        let expected = compute_token_seed(1, 0, &Word::from(0xAAu64), &Word::from(0xBBu64));
        let record = p.get_commitment(1).unwrap();
        assert_eq!(record.token_seed, Some(expected));
        assert_eq!(record.genome, Some(compute_genome(&test_registry(), &expected, 0).unwrap()));
    }

    #[test]
    fn test_notifications_in_order() {
        let mut p = provider();
        ready(&mut p, 5, 12);
        p.reveal_secret_and_compute_genome(OP, 5, secret()).unwrap();

        let events = p.drain_events();
        assert!(p.events().is_empty());
        let sequences: Vec<u64> = events.iter().map(|n| n.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
        assert!(matches!(events[0].event, GenomeEvent::HashPublished { token_id: 5, .. }));
        assert!(matches!(
            events[1].event,
            GenomeEvent::RevealRequested { token_id: 5, bonus_level: 12, .. }
        ));
        assert!(matches!(events[2].event, GenomeEvent::RandomnessReceived { token_id: 5, .. }));
        match &events[3].event {
            GenomeEvent::GenomeFinalized { secret: s, genome, .. } => {
                assert_eq!(*s, secret());
                assert_eq!(Some(*genome), p.get_commitment(5).unwrap().genome);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_approval_is_forwarded() {
        let mut p = provider();
        p.request_reveal(OP, 2, 3, hash_secret(&secret()), vec![1, 2, 3]).unwrap();
        match &p.events()[0].event {
            GenomeEvent::RevealRequested { approval, .. } => assert_eq!(approval, &vec![1, 2, 3]),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_hash_published_twice() {
        let mut p = provider();
        let hash = hash_secret(&secret());
        p.publish_secret_hash(OP, 1, hash).unwrap();
        assert_eq!(
            p.publish_secret_hash(OP, 1, hash).unwrap_err(),
            RevealError::AlreadyCommitted(1)
        );
        assert_eq!(p.events().len(), 1);
    }

    #[test]
    fn test_request_twice() {
        let mut p = provider();
        let hash = hash_secret(&secret());
        p.request_reveal(OP, 1, 0, hash, vec![]).unwrap();
        assert_eq!(
            p.request_reveal(OP, 1, 0, hash, vec![]).unwrap_err(),
            RevealError::AlreadyRequested(1)
        );
        assert_eq!(p.source().counter(), 1);
    }

    #[test]
    fn test_request_with_different_hash_rejected() {
        let mut p = provider();
        p.publish_secret_hash(OP, 1, hash_secret(&secret())).unwrap();
        let err = p
            .request_reveal(OP, 1, 0, hash_secret(&Word::from(1u64)), vec![])
            .unwrap_err();
        assert_eq!(err, RevealError::AlreadyCommitted(1));
        assert_eq!(p.commitment_state(1), CommitmentState::HashPublished);
        assert_eq!(p.source().counter(), 0);
    }

    #[test]
    fn test_bonus_out_of_range_leaves_no_state() {
        let mut p = provider();
        let err = p
            .request_reveal(OP, 1, MAX_BONUS + 1, hash_secret(&secret()), vec![])
            .unwrap_err();
        assert!(matches!(err, RevealError::BonusOutOfRange { .. }));
        assert!(p.get_commitment(1).is_none());
        assert!(p.events().is_empty());
    }

    #[test]
    fn test_duplicate_randomness_fails_loudly() {
        let mut p = provider();
        let request = p.request_reveal(OP, 1, 0, hash_secret(&secret()), vec![]).unwrap();
        assert_eq!(p.deliver_pending(), vec![Ok(1)]);
        let first = p.get_commitment(1).unwrap().random_value;

        // same value, same request: still rejected
        let replay = Fulfillment::new(&request, first.unwrap());
        assert_eq!(
            p.on_randomness_arrived(replay).unwrap_err(),
            RevealError::DuplicateRandomness(1)
        );
        assert_eq!(p.get_commitment(1).unwrap().random_value, first);
    }

    #[test]
    fn test_randomness_before_request_rejected() {
        let mut p = provider();
        p.publish_secret_hash(OP, 1, hash_secret(&secret())).unwrap();
        let forged = Fulfillment::new(&RandomnessRequest::new(1), Word::from(9u64));
        assert_eq!(
            p.on_randomness_arrived(forged).unwrap_err(),
            RevealError::NotRequested(1)
        );

        // a value for a different request id is rejected too
        p.request_reveal(OP, 1, 0, hash_secret(&secret()), vec![]).unwrap();
        let stray = Fulfillment::new(&RandomnessRequest::new(1), Word::from(9u64));
        assert_eq!(p.on_randomness_arrived(stray).unwrap_err(), RevealError::NotRequested(1));
        assert_eq!(p.commitment_state(1), CommitmentState::RandomnessRequested);
    }

    #[test]
    fn test_hash_binding() {
        let mut p = provider();
        ready(&mut p, 1, 0);
        for wrong in [0u64, 0xAB, 0xA9, u64::MAX] {
            assert_eq!(
                p.reveal_secret_and_compute_genome(OP, 1, Word::from(wrong)).unwrap_err(),
                RevealError::HashMismatch(1)
            );
        }
        assert!(!p.is_finalized(1));
        p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
    }

    #[test]
    fn test_reveal_without_commitment() {
        let mut p = provider();
        assert_eq!(
            p.reveal_secret_and_compute_genome(OP, 9, secret()).unwrap_err(),
            RevealError::HashMismatch(9)
        );
        assert!(p.get_commitment(9).is_none());
    }

    #[test]
    fn test_reveal_before_randomness() {
        let mut p = provider();
        let hash = hash_secret(&secret());
        p.publish_secret_hash(OP, 1, hash).unwrap();
        p.request_reveal(OP, 1, 0, hash, vec![]).unwrap();
        assert_eq!(
            p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap_err(),
            RevealError::RandomnessPending(1)
        );
        // the failed reveal did not consume the secret slot
        p.deliver_pending();
        p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
    }

    #[test]
    fn test_reveal_twice() {
        let mut p = provider();
        ready(&mut p, 1, 0);
        let genome = p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
        assert_eq!(
            p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap_err(),
            RevealError::AlreadyRevealed(1)
        );
        assert_eq!(p.get_commitment(1).unwrap().genome, Some(genome));
    }

    #[test]
    fn test_reveal_with_blank_trait_keeps_secret_unset() {
        let mut p = GenomeProvider::new(ProviderConfig::default(), DeterministicSource::default());
        ready(&mut p, 1, 0);
        assert_eq!(
            p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap_err(),
            RevealError::EmptyConfiguration(1)
        );
        assert!(p.get_commitment(1).unwrap().secret.is_none());
    }

    #[test]
    fn test_unauthorized_callers() {
        let mut p = provider();
        let hash = hash_secret(&secret());
        let denied = RevealError::Unauthorized("mallory".to_string());
        assert_eq!(p.publish_secret_hash("mallory", 1, hash).unwrap_err(), denied);
        assert_eq!(p.request_reveal("mallory", 1, 0, hash, vec![]).unwrap_err(), denied);
        assert_eq!(
            p.set_trait_weight("mallory", 2, vec![1, 1], vec![1, 1]).unwrap_err(),
            denied
        );
        ready(&mut p, 1, 0);
        assert_eq!(
            p.reveal_secret_and_compute_genome("mallory", 1, secret()).unwrap_err(),
            denied
        );
    }

    #[test]
    fn test_configuration_through_provider() {
        let mut p = GenomeProvider::new(
            ProviderConfig {
                trait_count: 1,
                ..ProviderConfig::default()
            },
            DeterministicSource::default(),
        );
        p.set_trait_config(OP, 1, vec![1], vec![0, 1], vec![1, 0], vec![0, 1]).unwrap();
        let seed = Word::from(12345u64);
        assert_eq!(p.compute_genome(&seed, 0).unwrap().get(1), Some(0));
        assert_eq!(p.compute_genome(&seed, MAX_BONUS).unwrap().get(1), Some(1));

        p.set_trait_weight(OP, 1, vec![0, 1], vec![1, 0]).unwrap();
        assert_eq!(p.compute_genome(&seed, 0).unwrap().get(1), Some(1));
    }

    #[test]
    fn test_tokens_are_independent() {
        let mut p = provider();
        ready(&mut p, 1, 0);
        ready(&mut p, 2, MAX_BONUS);
        let g2 = p.reveal_secret_and_compute_genome(OP, 2, secret()).unwrap();
        let g1 = p.reveal_secret_and_compute_genome(OP, 1, secret()).unwrap();
        assert_ne!(g1, g2);
        assert_eq!(p.store().count(), 2);
    }

    #[tokio::test]
    async fn test_protocol_with_oracle() {
        let oracle = OracleSource::new(OracleConfig { latency_ms: 5 }).unwrap();
        let mut p = GenomeProvider::with_parts(
            ProviderConfig::default(),
            test_registry(),
            CommitmentStore::default(),
            oracle,
        );
        let hash = hash_secret(&secret());
        p.publish_secret_hash(OP, 11, hash).unwrap();
        p.request_reveal(OP, 11, 7, hash, vec![]).unwrap();
        assert_eq!(
            p.reveal_secret_and_compute_genome(OP, 11, secret()).unwrap_err(),
            RevealError::RandomnessPending(11)
        );

        assert_eq!(p.next_delivery().await, Some(Ok(11)));
        let genome = p.reveal_secret_and_compute_genome(OP, 11, secret()).unwrap();
        let record = p.get_commitment(11).unwrap();
        assert_eq!(record.bonus_level, 7);
        assert_eq!(record.genome, Some(genome));
        assert!(record.verify(p.registry()).unwrap());
    }
}
