// ============================================================
// Layer 5 — Stacked Recurrent Layers
// ============================================================
// One RecurrentLayer wraps exactly one cell kind, picked from
// CellType when the layer is built:
//
//   simplernn → SimpleRnnCell  h' = tanh(W·x + U·h)
//   gru       → burn Gru
//   cudnngru  → burn Gru, recurrent dropout forced to 0
//   lstm      → burn Lstm (hidden + cell state)
//
// Layers are unrolled one timestep at a time so masking can be
// applied between steps: where the mask is 0 the previous state
// is carried forward unchanged, so zero padding anywhere in the
// sequence (leading, after reversal, or trailing) never touches
// the state.
//
// Recurrent dropout draws one mask per layer per sequence and
// reuses it at every timestep.
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        lstm::{Lstm, LstmConfig, LstmState},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation,
};

use crate::domain::cell_type::CellType;

// ─── SimpleRnnCell ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SimpleRnnCell<B: Backend> {
    pub input:     Linear<B>,
    pub recurrent: Linear<B>,
}

impl<B: Backend> SimpleRnnCell<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input:     LinearConfig::new(d_input, d_hidden).init(device),
            recurrent: LinearConfig::new(d_hidden, d_hidden).with_bias(false).init(device),
        }
    }

    pub fn step(&self, x: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::tanh(self.input.forward(x) + self.recurrent.forward(hidden))
    }
}

// ─── CellState ────────────────────────────────────────────────────────────────
/// State carried between timesteps. `cell` is only used by LSTM layers.
#[derive(Debug, Clone)]
pub struct CellState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell:   Option<Tensor<B, 2>>,
}

impl<B: Backend> CellState<B> {
    pub fn zeros(batch: usize, d_hidden: usize, with_cell: bool, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch, d_hidden], device),
            cell:   with_cell.then(|| Tensor::zeros([batch, d_hidden], device)),
        }
    }

    /// Row-wise select between `self` (mask = 1) and `previous` (mask = 0).
    /// `mask` has shape [batch, 1].
    pub fn blend(self, previous: Self, mask: Tensor<B, 2>) -> Self {
        let keep_old = mask.clone().neg().add_scalar(1.0);
        let mix = |new: Tensor<B, 2>, old: Tensor<B, 2>| {
            new * mask.clone() + old * keep_old.clone()
        };
        let cell = match (self.cell, previous.cell) {
            (Some(new), Some(old)) => Some(mix(new, old)),
            (new, _)               => new,
        };
        Self { hidden: mix(self.hidden, previous.hidden), cell }
    }
}

// ─── RecurrentLayer ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct RecurrentLayer<B: Backend> {
    pub simple:            Option<SimpleRnnCell<B>>,
    pub gru:               Option<Gru<B>>,
    pub lstm:              Option<Lstm<B>>,
    pub recurrent_dropout: Dropout,
    pub d_hidden:          usize,
}

impl<B: Backend> RecurrentLayer<B> {
    pub fn new(
        cell_type:         CellType,
        d_input:           usize,
        d_hidden:          usize,
        recurrent_dropout: f64,
        device:            &B::Device,
    ) -> Self {
        let (mut simple, mut gru, mut lstm) = (None, None, None);
        match cell_type {
            CellType::SimpleRnn => simple = Some(SimpleRnnCell::new(d_input, d_hidden, device)),
            CellType::Gru | CellType::CudnnGru => {
                gru = Some(GruConfig::new(d_input, d_hidden, true).init(device))
            }
            CellType::Lstm => lstm = Some(LstmConfig::new(d_input, d_hidden, true).init(device)),
        }
        let prob = if cell_type.supports_recurrent_dropout() { recurrent_dropout } else { 0.0 };
        Self {
            simple,
            gru,
            lstm,
            recurrent_dropout: DropoutConfig::new(prob).init(),
            d_hidden,
        }
    }

    pub fn zero_state(&self, batch: usize, device: &B::Device) -> CellState<B> {
        CellState::zeros(batch, self.d_hidden, self.lstm.is_some(), device)
    }

    /// Dropout mask [batch, d_hidden] for the hidden state, already scaled
    /// by 1 / (1 - p). All ones unless the backend is tracking gradients.
    pub fn dropout_mask(&self, batch: usize, device: &B::Device) -> Tensor<B, 2> {
        self.recurrent_dropout.forward(Tensor::ones([batch, self.d_hidden], device))
    }

    /// Advance one timestep. `x` is [batch, d_input], `hidden_mask` comes
    /// from [`RecurrentLayer::dropout_mask`].
    pub fn step(&self, x: Tensor<B, 2>, state: CellState<B>, hidden_mask: &Tensor<B, 2>) -> CellState<B> {
        let [batch, _] = x.dims();
        let hidden = state.hidden * hidden_mask.clone();

        match (&self.simple, &self.gru, &self.lstm) {
            (Some(cell), _, _) => CellState { hidden: cell.step(x, hidden), cell: None },
            (_, Some(gru), _) => {
                let out = gru.forward(x.unsqueeze_dim::<3>(1), Some(hidden.unsqueeze_dim::<3>(1)));
                CellState { hidden: out.reshape([batch, self.d_hidden]), cell: None }
            }
            (_, _, Some(lstm)) => {
                let cell = state
                    .cell
                    .unwrap_or_else(|| Tensor::zeros([batch, self.d_hidden], &x.device()));
                let (_, next) =
                    lstm.forward(x.unsqueeze_dim::<3>(1), Some(LstmState { cell, hidden }));
                CellState { hidden: next.hidden, cell: Some(next.cell) }
            }
            // A layer without a cell passes its state through
            _ => CellState { hidden, cell: state.cell },
        }
    }
}

// ─── StackedRecurrent ─────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct StackedRecurrent<B: Backend> {
    pub layers: Vec<RecurrentLayer<B>>,
}

impl<B: Backend> StackedRecurrent<B> {
    pub fn new(
        cell_type:         CellType,
        d_input:           usize,
        d_hidden:          usize,
        num_layers:        usize,
        recurrent_dropout: f64,
        device:            &B::Device,
    ) -> Self {
        let layers = (0..num_layers)
            .map(|i| {
                let d_in = if i == 0 { d_input } else { d_hidden };
                RecurrentLayer::new(cell_type, d_in, d_hidden, recurrent_dropout, device)
            })
            .collect();
        Self { layers }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Run every layer over the whole sequence.
    ///
    /// * `inputs`  - [batch, seq_len, d_input]
    /// * `mask`    - [batch, seq_len], 1 = real step; `None` disables masking
    /// * `initial` - one starting state per layer, zeros when `None`
    ///
    /// Returns the top layer's outputs [batch, seq_len, d_hidden] and the
    /// final state of every layer.
    pub fn forward(
        &self,
        inputs:  Tensor<B, 3>,
        mask:    Option<Tensor<B, 2>>,
        initial: Option<Vec<CellState<B>>>,
    ) -> (Tensor<B, 3>, Vec<CellState<B>>) {
        let [batch, seq_len, _] = inputs.dims();
        let device = inputs.device();
        let mut initial = initial.map(Vec::into_iter);

        let mut layer_input  = inputs;
        let mut final_states = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let mut state = initial
                .as_mut()
                .and_then(|states| states.next())
                .unwrap_or_else(|| layer.zero_state(batch, &device));

            let hidden_mask = layer.dropout_mask(batch, &device);
            let [_, _, d_in] = layer_input.dims();
            let mut outputs = Vec::with_capacity(seq_len);
            for t in 0..seq_len {
                let x_t = layer_input
                    .clone()
                    .slice([0..batch, t..t + 1, 0..d_in])
                    .reshape([batch, d_in]);
                let next = layer.step(x_t, state.clone(), &hidden_mask);
                state = match &mask {
                    Some(m) => next.blend(state, m.clone().slice([0..batch, t..t + 1])),
                    None    => next,
                };
                outputs.push(state.hidden.clone());
            }
            layer_input = Tensor::stack(outputs, 1);
            final_states.push(state);
        }

        (layer_input, final_states)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn all_close(a: Tensor<TestBackend, 2>, b: Tensor<TestBackend, 2>) -> bool {
        let a: Vec<f32> = a.into_data().to_vec().unwrap();
        let b: Vec<f32> = b.into_data().to_vec().unwrap();
        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_output_shapes_for_every_cell() {
        let device = Default::default();
        for cell in [CellType::SimpleRnn, CellType::Gru, CellType::CudnnGru, CellType::Lstm] {
            let stack = StackedRecurrent::<TestBackend>::new(cell, 3, 5, 2, 0.2, &device);
            let input = Tensor::<TestBackend, 3>::ones([2, 4, 3], &device);
            let (out, states) = stack.forward(input, None, None);
            assert_eq!(out.dims(), [2, 4, 5]);
            assert_eq!(states.len(), 2);
            assert_eq!(states[1].hidden.dims(), [2, 5]);
            assert_eq!(states[0].cell.is_some(), cell == CellType::Lstm);
        }
    }

    #[test]
    fn test_trailing_mask_matches_shorter_sequence() {
        let device = Default::default();
        for cell in [CellType::SimpleRnn, CellType::Gru, CellType::Lstm] {
            let stack = StackedRecurrent::<TestBackend>::new(cell, 2, 4, 2, 0.0, &device);
            let short = Tensor::<TestBackend, 3>::from_floats(
                [[[0.1, 0.2], [0.3, -0.4]]], &device,
            );
            let padded = Tensor::<TestBackend, 3>::from_floats(
                [[[0.1, 0.2], [0.3, -0.4], [0.0, 0.0]]], &device,
            );
            let mask = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 0.0]], &device);

            let (_, expected) = stack.forward(short, None, None);
            let (_, masked)   = stack.forward(padded, Some(mask), None);
            for (e, m) in expected.into_iter().zip(masked) {
                assert!(all_close(e.hidden, m.hidden), "{cell} hidden state drifted");
            }
        }
    }

    #[test]
    fn test_leading_mask_is_a_no_op() {
        let device = Default::default();
        let stack  = StackedRecurrent::<TestBackend>::new(CellType::Gru, 2, 3, 1, 0.0, &device);
        let plain  = Tensor::<TestBackend, 3>::from_floats([[[0.5, 0.5]]], &device);
        let padded = Tensor::<TestBackend, 3>::from_floats([[[0.0, 0.0], [0.5, 0.5]]], &device);
        let mask   = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0]], &device);

        let (_, a) = stack.forward(plain, None, None);
        let (_, b) = stack.forward(padded, Some(mask), None);
        assert!(all_close(a[0].hidden.clone(), b[0].hidden.clone()));
    }

    #[test]
    fn test_initial_state_is_used() {
        let device = Default::default();
        let stack  = StackedRecurrent::<TestBackend>::new(CellType::SimpleRnn, 2, 3, 1, 0.0, &device);
        let input  = Tensor::<TestBackend, 3>::zeros([1, 1, 2], &device);

        let (_, from_zero) = stack.forward(input.clone(), None, None);
        let start = CellState {
            hidden: Tensor::<TestBackend, 2>::ones([1, 3], &device),
            cell:   None,
        };
        let (_, from_ones) = stack.forward(input, None, Some(vec![start]));
        assert!(!all_close(from_zero[0].hidden.clone(), from_ones[0].hidden.clone()));
    }

    #[test]
    fn test_dropout_mask_is_inactive_without_autodiff() {
        let device = Default::default();
        let layer  = RecurrentLayer::<TestBackend>::new(CellType::Gru, 2, 4, 0.5, &device);
        let mask: Vec<f32> = layer.dropout_mask(3, &device).into_data().to_vec().unwrap();
        assert_eq!(mask, vec![1.0; 12]);
    }

    #[test]
    fn test_dropout_mask_is_scaled_while_training() {
        type Train = burn::backend::Autodiff<NdArray>;
        let device = Default::default();
        let layer  = RecurrentLayer::<Train>::new(CellType::SimpleRnn, 2, 64, 0.5, &device);
        let mask: Vec<f32> = layer.dropout_mask(4, &device).into_data().to_vec().unwrap();
        assert_eq!(mask.len(), 256);
        assert!(mask.iter().all(|&m| m == 0.0 || (m - 2.0).abs() < 1e-6));
        assert!(mask.iter().any(|&m| m == 0.0));

        let cudnn = RecurrentLayer::<Train>::new(CellType::CudnnGru, 2, 8, 0.5, &device);
        let mask: Vec<f32> = cudnn.dropout_mask(2, &device).into_data().to_vec().unwrap();
        assert!(mask.iter().all(|&m| m == 1.0));
    }

    #[test]
    fn test_zero_mask_cuts_the_recurrent_path() {
        // The same mask is applied at every step: all zeros means each
        // output depends only on its own input.
        let device = Default::default();
        let layer  = RecurrentLayer::<TestBackend>::new(CellType::SimpleRnn, 2, 3, 0.0, &device);
        let zeros  = Tensor::<TestBackend, 2>::zeros([1, 3], &device);
        let x      = Tensor::<TestBackend, 2>::from_floats([[0.4, -0.2]], &device);

        let first  = layer.step(x.clone(), layer.zero_state(1, &device), &zeros);
        let second = layer.step(x, first.clone(), &zeros);
        assert!(all_close(first.hidden, second.hidden));
    }
}
