//! Decode and encode runs against one store.

use crate::config::{DecoderConfig, EncoderConfig};
use crate::decode::{DecodeFilter, DecodeOutput, Decoder};
use crate::encode::{EncodeReport, Encoder};
use crate::error::EngineResult;
use graphsync_resource::ResourceSet;
use graphsync_store::ComposeStore;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// The current state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing running.
    Idle,
    /// Reading the store into resource nodes.
    Decoding,
    /// Writing resource nodes into the store.
    Encoding,
    /// The last run completed.
    Done,
    /// The last run failed.
    Failed,
}

impl RunState {
    /// Returns true while a pipeline is running.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Decoding | RunState::Encoding)
    }
}

/// Totals over every run of a [`SyncRun`].
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Resources decoded.
    pub decoded: u64,
    /// Rows created.
    pub created: u64,
    /// Rows updated.
    pub updated: u64,
    /// Rows skipped.
    pub skipped: u64,
    /// Duration of the last run.
    pub last_duration: Option<Duration>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Runs the decode and encode pipelines against one store.
pub struct SyncRun<S> {
    store: Arc<S>,
    decoder_config: DecoderConfig,
    encoder_config: EncoderConfig,
    filter: DecodeFilter,
    state: RwLock<RunState>,
    stats: RwLock<RunStats>,
}

impl<S: ComposeStore + 'static> SyncRun<S> {
    /// Creates a run over the store with default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            decoder_config: DecoderConfig::default(),
            encoder_config: EncoderConfig::default(),
            filter: DecodeFilter::new(),
            state: RwLock::new(RunState::Idle),
            stats: RwLock::new(RunStats::default()),
        }
    }

    /// Sets the decoder configuration.
    pub fn with_decoder_config(mut self, config: DecoderConfig) -> Self {
        self.decoder_config = config;
        self
    }

    /// Sets the encoder configuration.
    pub fn with_encoder_config(mut self, config: EncoderConfig) -> Self {
        self.encoder_config = config;
        self
    }

    /// Returns the filter used by [`SyncRun::decode`].
    pub fn decode_filter(&mut self) -> &mut DecodeFilter {
        &mut self.filter
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Gets the current state.
    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    /// Gets the accumulated stats.
    pub fn stats(&self) -> RunStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: RunState) {
        *self.state.write() = state;
    }

    fn finish<T>(&self, start: Instant, result: EngineResult<T>) -> EngineResult<T> {
        let mut stats = self.stats.write();
        stats.last_duration = Some(start.elapsed());
        match &result {
            Ok(_) => {
                stats.last_error = None;
                self.set_state(RunState::Done);
            }
            Err(e) => {
                error!(error = %e, "run failed");
                stats.last_error = Some(e.to_string());
                self.set_state(RunState::Failed);
            }
        }
        result
    }

    /// Decodes the store through the configured filter.
    pub fn decode(&self) -> EngineResult<DecodeOutput> {
        let start = Instant::now();
        self.set_state(RunState::Decoding);
        let decoder = Decoder::new(Arc::clone(&self.store), self.decoder_config.clone());
        let result = decoder.decode(&self.filter);
        if let Ok(out) = &result {
            self.stats.write().decoded += out.resources.len() as u64;
            info!(resources = out.resources.len(), "decoded");
        }
        self.finish(start, result)
    }

    /// Encodes the resource set into the store.
    pub fn encode(&self, resources: &mut ResourceSet) -> EngineResult<EncodeReport> {
        let start = Instant::now();
        self.set_state(RunState::Encoding);
        let encoder = Encoder::new(&*self.store, self.encoder_config.clone());
        let result = encoder.encode(resources);
        if let Ok(report) = &result {
            let mut stats = self.stats.write();
            stats.created += report.created as u64;
            stats.updated += report.updated as u64;
            stats.skipped += report.skipped as u64;
        }
        self.finish(start, result)
    }

    /// Decodes the store, then encodes the decoded nodes back.
    ///
    /// On a consistent store the encode rewrites every row with itself.
    pub fn run(&self) -> EngineResult<(DecodeOutput, EncodeReport)> {
        let mut out = self.decode()?;
        let report = self.encode(&mut out.resources)?;
        Ok((out, report))
    }
}
