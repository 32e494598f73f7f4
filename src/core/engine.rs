use crate::core::simulator::{GestureOutcome, PointerEvent, SessionSnapshot, Simulator};
use crate::core::{ConfigProvider, SessionSource, Storage};
use crate::utils::error::Result;
use serde::Serialize;

/// What a finished session run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub output_file: String,
    pub outcomes: Vec<GestureOutcome>,
    pub snapshot: SessionSnapshot,
}

/// Load → simulate → write, end to end.
pub struct SessionEngine<Src: SessionSource, S: Storage> {
    source: Src,
    output: S,
    output_file: String,
}

impl<Src: SessionSource, S: Storage> SessionEngine<Src, S> {
    pub fn new(source: Src, output: S) -> Self {
        Self {
            source,
            output,
            output_file: "session.json".to_string(),
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<String>) -> Self {
        self.output_file = output_file.into();
        self
    }

    /// Loads the session once, replays `gestures` in order and stores the final snapshot.
    pub async fn run<C: ConfigProvider>(
        &self,
        config: &C,
        gestures: &[PointerEvent],
    ) -> Result<SessionReport> {
        tracing::info!("📂 Loading session data from {}", config.data_dir());
        let input = self.source.load().await?;
        let (context, registry) = input.into_session()?;
        tracing::info!(
            "🗳️  {} seat regions, {} seats, {} votes cast",
            context.seats.len(),
            context.total_seats(),
            context.ledger.grand_total()
        );

        let mut simulator = Simulator::from_config(context, registry, config);

        let mut outcomes = Vec::with_capacity(gestures.len());
        for event in gestures {
            let outcome = simulator.handle(*event);
            tracing::debug!("{:?} -> {:?}", event, outcome);
            outcomes.push(outcome);
        }
        if !gestures.is_empty() {
            tracing::info!(
                "🖱️  Replayed {} pointer events, {} regroupings applied",
                gestures.len(),
                outcomes
                    .iter()
                    .filter(|outcome| matches!(outcome, GestureOutcome::Applied(m) if m.is_change()))
                    .count()
            );
        }

        let report = SessionReport {
            output_file: self.output_file.clone(),
            outcomes,
            snapshot: simulator.snapshot(),
        };

        let body = serde_json::to_vec_pretty(&report)?;
        self.output.write_file(&self.output_file, &body).await?;
        tracing::info!("💾 Snapshot written to {}", self.output_file);

        Ok(report)
    }
}
