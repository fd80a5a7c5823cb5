//! Mini-batch optimisation of the policy network
//!
//! # Loss
//!
//! | Term    | Definition                                                   |
//! |---------|--------------------------------------------------------------|
//! | policy  | negative log-likelihood of the recorded move index           |
//! | value   | mean squared error between value head and recorded outcome   |
//! | quality | cross-entropy between quality logits and the recorded class  |
//!
//! The three terms are summed into one loss and minimised with Adam. The
//! learning rate decays stepwise: every `lr_step_epochs` epochs it is
//! multiplied by `lr_gamma`.
//!
//! A batch whose loss is NaN or infinite is skipped without an optimiser
//! step, so one bad batch cannot corrupt the weights.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tch::nn::{self, OptimizerConfig};
use tch::{Kind, Reduction, Tensor};
use tracing::{debug, info, warn};

use crate::error::{TrainError, TrainResult};
use crate::predictor::network::batch_tensor;
use crate::predictor::PolicyNet;
use crate::selfplay::ExperienceRecord;

/// Hyperparameters of one training pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Epochs between learning-rate decays
    pub lr_step_epochs: usize,
    /// Factor applied at every decay
    pub lr_gamma: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            learning_rate: 3e-4,
            lr_step_epochs: 5,
            lr_gamma: 0.1,
        }
    }
}

/// Averages over the batches of one epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Zero-based epoch within the pass
    pub epoch: usize,
    pub learning_rate: f64,
    pub total_loss: f64,
    pub policy_loss: f64,
    pub value_loss: f64,
    pub quality_loss: f64,
    /// Batches that contributed an optimiser step
    pub batches: usize,
    /// Batches dropped for a non-finite loss
    pub skipped_batches: usize,
}

struct Batch {
    inputs: Tensor,
    moves: Tensor,
    outcomes: Tensor,
    quality: Tensor,
}

#[derive(Default)]
struct LossSums {
    total: f64,
    policy: f64,
    value: f64,
    quality: f64,
    batches: usize,
    skipped: usize,
}

impl LossSums {
    fn stats(&self, epoch: usize, learning_rate: f64) -> EpochStats {
        let n = self.batches.max(1) as f64;
        EpochStats {
            epoch,
            learning_rate,
            total_loss: self.total / n,
            policy_loss: self.policy / n,
            value_loss: self.value / n,
            quality_loss: self.quality / n,
            batches: self.batches,
            skipped_batches: self.skipped,
        }
    }
}

/// Runs training passes over experience records
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> TrainResult<Self> {
        if config.batch_size == 0 {
            return Err(TrainError::InvalidParameter {
                name: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if !config.learning_rate.is_finite() || config.learning_rate < 0.0 {
            return Err(TrainError::InvalidParameter {
                name: "learning_rate",
                reason: format!("{} is not a finite non-negative number", config.learning_rate),
            });
        }
        if config.lr_step_epochs == 0 {
            return Err(TrainError::InvalidParameter {
                name: "lr_step_epochs",
                reason: "must be at least 1".to_string(),
            });
        }
        if !config.lr_gamma.is_finite() || config.lr_gamma <= 0.0 {
            return Err(TrainError::InvalidParameter {
                name: "lr_gamma",
                reason: format!("{} is not a finite positive number", config.lr_gamma),
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Learning rate in effect during zero-based `epoch`
    pub fn learning_rate_at(&self, epoch: usize) -> f64 {
        let decays = (epoch / self.config.lr_step_epochs) as i32;
        self.config.learning_rate * self.config.lr_gamma.powi(decays)
    }

    /// Train `net` in place over `records`, calling `on_epoch` after every epoch
    pub fn train<R, F>(
        &self,
        net: &mut PolicyNet,
        records: &[ExperienceRecord],
        rng: &mut R,
        mut on_epoch: F,
    ) -> TrainResult<Vec<EpochStats>>
    where
        R: Rng + ?Sized,
        F: FnMut(&EpochStats) -> TrainResult<()>,
    {
        if records.is_empty() {
            warn!("[TRAIN] No experience to train on, skipping pass");
            return Ok(Vec::new());
        }

        info!(
            "[TRAIN] Training on {} records: {} epochs, batch {}, lr {:.2e}",
            records.len(),
            self.config.epochs,
            self.config.batch_size,
            self.config.learning_rate
        );

        let mut opt = nn::Adam::default().build(net.var_store(), self.config.learning_rate)?;
        let mut order: Vec<usize> = (0..records.len()).collect();
        let mut history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let lr = self.learning_rate_at(epoch);
            opt.set_lr(lr);
            order.shuffle(rng);

            let mut sums = LossSums::default();
            for chunk in order.chunks(self.config.batch_size) {
                let batch = prepare_batch(net, records, chunk);
                let output = net.forward_t(&batch.inputs, true);

                let policy_loss = -output
                    .policy
                    .gather(1, &batch.moves, false)
                    .mean(Kind::Float);
                let value_loss = output
                    .value
                    .view([-1])
                    .mse_loss(&batch.outcomes, Reduction::Mean);
                let quality_loss = output.quality.cross_entropy_for_logits(&batch.quality);
                let loss = &policy_loss + &value_loss + &quality_loss;

                let total = f64::try_from(&loss)?;
                if !total.is_finite() {
                    warn!(
                        "[TRAIN] Non-finite loss in epoch {}, skipping batch of {}",
                        epoch + 1,
                        chunk.len()
                    );
                    sums.skipped += 1;
                    continue;
                }

                opt.backward_step(&loss);
                sums.total += total;
                sums.policy += f64::try_from(&policy_loss)?;
                sums.value += f64::try_from(&value_loss)?;
                sums.quality += f64::try_from(&quality_loss)?;
                sums.batches += 1;
                debug!("[TRAIN] epoch {} batch {} loss {:.4}", epoch + 1, sums.batches, total);
            }

            let stats = sums.stats(epoch, lr);
            info!(
                "[TRAIN] Epoch {}/{}: loss {:.4} (policy {:.4}, value {:.4}, quality {:.4}), lr {:.2e}, {} skipped",
                epoch + 1,
                self.config.epochs,
                stats.total_loss,
                stats.policy_loss,
                stats.value_loss,
                stats.quality_loss,
                lr,
                stats.skipped_batches
            );
            on_epoch(&stats)?;
            history.push(stats);
        }

        Ok(history)
    }
}

fn prepare_batch(net: &PolicyNet, records: &[ExperienceRecord], indices: &[usize]) -> Batch {
    let device = net.device();
    let positions: Vec<_> = indices.iter().map(|&i| &records[i].position).collect();
    let moves: Vec<i64> = indices
        .iter()
        .map(|&i| records[i].move_index.get() as i64)
        .collect();
    let outcomes: Vec<f32> = indices.iter().map(|&i| records[i].outcome).collect();
    let quality: Vec<i64> = indices
        .iter()
        .map(|&i| records[i].quality.class() as i64)
        .collect();

    Batch {
        inputs: batch_tensor(&positions, device),
        moves: Tensor::from_slice(&moves).unsqueeze(1).to_device(device),
        outcomes: Tensor::from_slice(&outcomes).to_device(device),
        quality: Tensor::from_slice(&quality).to_device(device),
    }
}
