//! Residual convolutional policy/value/quality network
//!
//! # Architecture
//!
//! ```text
//! input [B, 17, 8, 8]
//!   └─ stem: conv3x3 → relu
//!   └─ N × residual block: conv3x3 → relu → conv3x3 → (+ skip) → relu
//!        ├─ policy:  conv1x1 → relu → linear → log-softmax   [B, 4672]
//!        ├─ value:   conv1x1 → relu → linear → relu → dropout → linear → sigmoid  [B, 1]
//!        └─ quality: conv1x1 → relu → linear → relu → dropout → linear          [B, 5]
//! ```
//!
//! There is no batch normalisation, so the network has no running
//! statistics: every piece of state lives in the trainable variables of the
//! [`nn::VarStore`] and a zero learning rate leaves it untouched.

use serde::{Deserialize, Serialize};
use tch::nn;
use tch::{Device, Kind, Tensor};
use tracing::info;

use super::{Prediction, Predictor, QUALITY_CLASSES};
use crate::encoding::{PositionTensor, ACTION_SPACE, BOARD_SIZE, PLANES};
use crate::error::{PredictorError, PredictorResult};

const HEAD_CHANNELS: i64 = 32;
const VALUE_HIDDEN: i64 = 256;
const QUALITY_HIDDEN: i64 = 128;
const CELLS: i64 = (BOARD_SIZE * BOARD_SIZE) as i64;

/// Size of the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Convolution channels in the trunk
    pub channels: i64,
    pub residual_blocks: usize,
    /// Dropout probability in the value and quality heads
    pub dropout: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            channels: 64,
            residual_blocks: 4,
            dropout: 0.3,
        }
    }
}

struct ResidualBlock {
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
}

impl ResidualBlock {
    fn new(p: nn::Path, channels: i64) -> Self {
        let cfg = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };
        Self {
            conv1: nn::conv2d(&p / "conv1", channels, channels, 3, cfg),
            conv2: nn::conv2d(&p / "conv2", channels, channels, 3, cfg),
        }
    }

    fn forward(&self, xs: &Tensor) -> Tensor {
        let out = xs.apply(&self.conv1).relu().apply(&self.conv2);
        (out + xs).relu()
    }
}

/// Raw outputs of a forward pass over a batch
#[derive(Debug)]
pub struct NetOutput {
    /// Log-probabilities over policy indices, `[B, ACTION_SPACE]`
    pub policy: Tensor,
    /// Sigmoid value, `[B, 1]`
    pub value: Tensor,
    /// Unnormalised quality scores, `[B, QUALITY_CLASSES]`
    pub quality: Tensor,
}

/// The trainable predictor
pub struct PolicyNet {
    vs: nn::VarStore,
    config: NetworkConfig,
    stem: nn::Conv2D,
    blocks: Vec<ResidualBlock>,
    policy_conv: nn::Conv2D,
    policy_fc: nn::Linear,
    value_conv: nn::Conv2D,
    value_fc1: nn::Linear,
    value_fc2: nn::Linear,
    quality_conv: nn::Conv2D,
    quality_fc1: nn::Linear,
    quality_fc2: nn::Linear,
}

impl std::fmt::Debug for PolicyNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyNet")
            .field("config", &self.config)
            .field("device", &self.vs.device())
            .finish()
    }
}

impl PolicyNet {
    /// Fresh, randomly initialised network on the best available device
    pub fn new(config: &NetworkConfig) -> Self {
        Self::on_device(config, Device::cuda_if_available())
    }

    pub fn on_device(config: &NetworkConfig, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let root = vs.root();
        let channels = config.channels;
        let same = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };
        let head = nn::ConvConfig::default();
        let flat = HEAD_CHANNELS * CELLS;

        let stem = nn::conv2d(&root / "stem", PLANES as i64, channels, 3, same);
        let blocks = (0..config.residual_blocks)
            .map(|i| ResidualBlock::new(root.sub("blocks").sub(i), channels))
            .collect();

        let policy_conv = nn::conv2d(&root / "policy_conv", channels, HEAD_CHANNELS, 1, head);
        let policy_fc = nn::linear(
            &root / "policy_fc",
            flat,
            ACTION_SPACE as i64,
            Default::default(),
        );
        let value_conv = nn::conv2d(&root / "value_conv", channels, HEAD_CHANNELS, 1, head);
        let value_fc1 = nn::linear(&root / "value_fc1", flat, VALUE_HIDDEN, Default::default());
        let value_fc2 = nn::linear(&root / "value_fc2", VALUE_HIDDEN, 1, Default::default());
        let quality_conv = nn::conv2d(&root / "quality_conv", channels, HEAD_CHANNELS, 1, head);
        let quality_fc1 = nn::linear(
            &root / "quality_fc1",
            flat,
            QUALITY_HIDDEN,
            Default::default(),
        );
        let quality_fc2 = nn::linear(
            &root / "quality_fc2",
            QUALITY_HIDDEN,
            QUALITY_CLASSES as i64,
            Default::default(),
        );

        info!(
            "[NET] Built network: {} channels, {} residual blocks, device {:?}",
            channels, config.residual_blocks, device
        );

        Self {
            vs,
            config: config.clone(),
            stem,
            blocks,
            policy_conv,
            policy_fc,
            value_conv,
            value_fc1,
            value_fc2,
            quality_conv,
            quality_fc1,
            quality_fc2,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    /// Forward pass over a `[B, 17, 8, 8]` batch; `train` enables dropout
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> NetOutput {
        let batch = xs.size()[0];
        let mut trunk = xs.apply(&self.stem).relu();
        for block in &self.blocks {
            trunk = block.forward(&trunk);
        }

        let policy = trunk
            .apply(&self.policy_conv)
            .relu()
            .view([batch, -1])
            .apply(&self.policy_fc)
            .log_softmax(-1, Kind::Float);

        let value = trunk
            .apply(&self.value_conv)
            .relu()
            .view([batch, -1])
            .apply(&self.value_fc1)
            .relu()
            .dropout(self.config.dropout, train)
            .apply(&self.value_fc2)
            .sigmoid();

        let quality = trunk
            .apply(&self.quality_conv)
            .relu()
            .view([batch, -1])
            .apply(&self.quality_fc1)
            .relu()
            .dropout(self.config.dropout, train)
            .apply(&self.quality_fc2);

        NetOutput {
            policy,
            value,
            quality,
        }
    }
}

/// Stack encoded positions into a `[B, 17, 8, 8]` tensor on `device`
pub fn batch_tensor(positions: &[&PositionTensor], device: Device) -> Tensor {
    let mut data = Vec::with_capacity(positions.len() * PositionTensor::LEN);
    for position in positions {
        data.extend_from_slice(position.as_slice());
    }
    Tensor::from_slice(&data)
        .view([
            positions.len() as i64,
            PLANES as i64,
            BOARD_SIZE as i64,
            BOARD_SIZE as i64,
        ])
        .to_device(device)
}

fn to_vec(head: &'static str, tensor: &Tensor, expected: usize) -> PredictorResult<Vec<f32>> {
    let flat = tensor.to_kind(Kind::Float).reshape([-1]);
    let values = Vec::<f32>::try_from(&flat)?;
    if values.len() != expected {
        return Err(PredictorError::Shape {
            head,
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

impl Predictor for PolicyNet {
    fn predict(&self, position: &PositionTensor) -> PredictorResult<Prediction> {
        let input = batch_tensor(&[position], self.device());
        let output = tch::no_grad(|| self.forward_t(&input, false));

        let policy = to_vec("policy", &output.policy.exp(), ACTION_SPACE)?;
        let quality = to_vec(
            "quality",
            &output.quality.softmax(-1, Kind::Float),
            QUALITY_CLASSES,
        )?;
        let value = output.value.f_double_value(&[0, 0])? as f32;

        Ok(Prediction {
            policy,
            value,
            quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode;
    use chess_rules::GameState;

    fn small() -> NetworkConfig {
        NetworkConfig {
            channels: 8,
            residual_blocks: 1,
            dropout: 0.3,
        }
    }

    #[test]
    fn test_forward_shapes() {
        let net = PolicyNet::on_device(&small(), Device::Cpu);
        let start = encode(&GameState::new());
        let batch = batch_tensor(&[&start, &start, &start], Device::Cpu);

        let out = net.forward_t(&batch, true);
        assert_eq!(out.policy.size(), vec![3, ACTION_SPACE as i64]);
        assert_eq!(out.value.size(), vec![3, 1]);
        assert_eq!(out.quality.size(), vec![3, QUALITY_CLASSES as i64]);
    }

    #[test]
    fn test_prediction_is_normalised() {
        let net = PolicyNet::on_device(&small(), Device::Cpu);
        let prediction = net.predict(&encode(&GameState::new())).unwrap();

        assert_eq!(prediction.policy.len(), ACTION_SPACE);
        let total: f32 = prediction.policy.iter().sum();
        assert!((total - 1.0).abs() < 1e-3);

        assert!((0.0..=1.0).contains(&prediction.value));

        assert_eq!(prediction.quality.len(), QUALITY_CLASSES);
        let total: f32 = prediction.quality.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_inference_is_deterministic() {
        //! Dropout is off outside training
        let net = PolicyNet::on_device(&small(), Device::Cpu);
        let position = encode(&GameState::new());
        assert_eq!(
            net.predict(&position).unwrap(),
            net.predict(&position).unwrap()
        );
    }
}
