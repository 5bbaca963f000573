use super::activation::{argmax, softmax_in_place, tanh_in_place};
use super::matrix::Matrix;
use crate::config::{EvolutionConfig, VariantConfig};
use crate::error::{EvotraderError, Result};
use crate::types::{Action, OUTPUT_NODES};
use rand::Rng;
use rand_distr::StandardNormal;

/// Feed-forward policy: tanh hidden layers, softmax over the three actions.
///
/// `weights[i]` has shape `(width[i], width[i-1])` where `width[0]` is the input size and
/// the last width is `OUTPUT_NODES`. `biases[i]` is the matching `(width[i], 1)` column.
/// The parameters only change through `mutate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    input_size: usize,
    architecture: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
}

impl Policy {
    /// Fresh policy with every weight and bias drawn from U[-1, 1].
    pub fn random<R: Rng>(input_size: usize, architecture: &[usize], rng: &mut R) -> Result<Self> {
        Self::check_layout(input_size, architecture)?;

        let widths = Self::layer_widths(input_size, architecture);
        let mut weights = Vec::with_capacity(widths.len() - 1);
        let mut biases = Vec::with_capacity(widths.len() - 1);
        for pair in widths.windows(2) {
            weights.push(Matrix::random_uniform(pair[1], pair[0], rng));
            biases.push(Matrix::random_uniform(pair[1], 1, rng));
        }

        Ok(Self {
            input_size,
            architecture: architecture.to_vec(),
            weights,
            biases,
        })
    }

    /// Fresh policy for a cohort variant, drawing hidden widths when the variant has none.
    pub fn for_variant<R: Rng>(
        input_size: usize,
        variant: &VariantConfig,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let architecture = match &variant.widths {
            Some(widths) => widths.clone(),
            None => Self::draw_architecture(
                input_size,
                variant.hidden_layers,
                config.min_width_ratio,
                config.max_width_ratio,
                rng,
            ),
        };
        Self::random(input_size, &architecture, rng)
    }

    /// Hidden widths drawn uniformly from `[input·min_ratio, input·max_ratio)`, at least 1.
    pub fn draw_architecture<R: Rng>(
        input_size: usize,
        hidden_layers: usize,
        min_ratio: f64,
        max_ratio: f64,
        rng: &mut R,
    ) -> Vec<usize> {
        let low = ((input_size as f64 * min_ratio) as usize).max(1);
        let high = ((input_size as f64 * max_ratio) as usize).max(low + 1);
        (0..hidden_layers).map(|_| rng.gen_range(low..high)).collect()
    }

    /// Rebuild a policy from stored parameters. Any shape disagreement is an error; the
    /// parameters are never truncated or padded.
    pub fn from_parts(
        input_size: usize,
        architecture: Vec<usize>,
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
    ) -> Result<Self> {
        Self::check_layout(input_size, &architecture)?;

        let widths = Self::layer_widths(input_size, &architecture);
        let layers = widths.len() - 1;
        if weights.len() != layers {
            return Err(EvotraderError::shape("weight layer count", layers, weights.len()));
        }
        if biases.len() != layers {
            return Err(EvotraderError::shape("bias layer count", layers, biases.len()));
        }

        for (i, pair) in widths.windows(2).enumerate() {
            let expected = (pair[1], pair[0]);
            if weights[i].shape() != expected {
                return Err(EvotraderError::shape(
                    format!("weights[{}]", i),
                    format!("{:?}", expected),
                    format!("{:?}", weights[i].shape()),
                ));
            }
            if biases[i].shape() != (pair[1], 1) {
                return Err(EvotraderError::shape(
                    format!("biases[{}]", i),
                    format!("{:?}", (pair[1], 1)),
                    format!("{:?}", biases[i].shape()),
                ));
            }
        }

        Ok(Self {
            input_size,
            architecture,
            weights,
            biases,
        })
    }

    fn check_layout(input_size: usize, architecture: &[usize]) -> Result<()> {
        if input_size == 0 {
            return Err(EvotraderError::shape("policy input size", "at least 1", 0));
        }
        if architecture.contains(&0) {
            return Err(EvotraderError::shape(
                "hidden widths",
                "positive widths",
                format!("{:?}", architecture),
            ));
        }
        Ok(())
    }

    fn layer_widths(input_size: usize, architecture: &[usize]) -> Vec<usize> {
        let mut widths = Vec::with_capacity(architecture.len() + 2);
        widths.push(input_size);
        widths.extend_from_slice(architecture);
        widths.push(OUTPUT_NODES);
        widths
    }

    /// Action distribution for a flattened feature window.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_size {
            return Err(EvotraderError::shape("policy input", self.input_size, input.len()));
        }

        let last = self.weights.len() - 1;
        let mut activations = input.to_vec();
        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            activations = w.affine(&activations, b);
            if i == last {
                softmax_in_place(&mut activations);
            } else {
                tanh_in_place(&mut activations);
            }
        }
        Ok(activations)
    }

    pub fn decide(&self, input: &[f64]) -> Result<Action> {
        let output = self.forward(input)?;
        Ok(Action::from_index(argmax(&output)))
    }

    /// Replace each parameter, with probability `rate`, by a draw from N(value, scale).
    pub fn mutate<R: Rng>(&mut self, rate: f64, scale: f64, rng: &mut R) {
        for matrix in self.weights.iter_mut().chain(self.biases.iter_mut()) {
            for value in matrix.as_mut_slice() {
                if rng.gen::<f64>() < rate {
                    let noise: f64 = rng.sample(StandardNormal);
                    *value += noise * scale;
                }
            }
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn architecture(&self) -> &[usize] {
        &self.architecture
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    pub fn parameter_count(&self) -> usize {
        self.weights
            .iter()
            .chain(&self.biases)
            .map(|m| m.as_slice().len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn policy(seed: u64) -> Policy {
        let mut rng = StdRng::seed_from_u64(seed);
        Policy::random(6, &[5, 4], &mut rng).unwrap()
    }

    #[test]
    fn test_shapes() {
        let p = policy(1);
        let shapes: Vec<_> = p.weights().iter().map(|w| w.shape()).collect();
        assert_eq!(shapes, vec![(5, 6), (4, 5), (3, 4)]);
        let bias_shapes: Vec<_> = p.biases().iter().map(|b| b.shape()).collect();
        assert_eq!(bias_shapes, vec![(5, 1), (4, 1), (3, 1)]);
        assert_eq!(p.weights().len(), p.architecture().len() + 1);
    }

    #[test]
    fn test_forward_is_a_distribution() {
        let p = policy(2);
        let out = p.forward(&[0.1, 0.5, -0.3, 0.9, 0.0, 1.0]).unwrap();
        assert_eq!(out.len(), OUTPUT_NODES);
        assert!(out.iter().all(|v| *v >= 0.0));
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forward_is_pure() {
        let p = policy(3);
        let input = [0.2; 6];
        assert_eq!(p.forward(&input).unwrap(), p.forward(&input).unwrap());
    }

    #[test]
    fn test_forward_rejects_wrong_input() {
        assert!(policy(4).forward(&[0.0; 5]).is_err());
    }

    #[test]
    fn test_mutation_rate_zero_is_identity() {
        let original = policy(5);
        let mut mutated = original.clone();
        let mut rng = StdRng::seed_from_u64(9);
        mutated.mutate(0.0, 0.5, &mut rng);
        assert_eq!(original, mutated);
    }

    #[test]
    fn test_mutation_rate_one_changes_everything() {
        let original = policy(6);
        let mut mutated = original.clone();
        let mut rng = StdRng::seed_from_u64(10);
        mutated.mutate(1.0, 0.08, &mut rng);

        for (a, b) in original
            .weights()
            .iter()
            .chain(original.biases())
            .zip(mutated.weights().iter().chain(mutated.biases()))
        {
            assert!(a.as_slice().iter().zip(b.as_slice()).all(|(x, y)| x != y));
        }
        assert_eq!(original.architecture(), mutated.architecture());
    }

    #[test]
    fn test_from_parts_rejects_bad_shape() {
        let p = policy(7);
        let mut weights = p.weights().to_vec();
        weights[1] = Matrix::zeros(4, 4);
        let result = Policy::from_parts(6, p.architecture().to_vec(), weights, p.biases().to_vec());
        assert!(matches!(result, Err(EvotraderError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_draw_architecture_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let widths = Policy::draw_architecture(40, 6, 0.5, 1.0, &mut rng);
        assert_eq!(widths.len(), 6);
        assert!(widths.iter().all(|w| (20..40).contains(w)));

        let tiny = Policy::draw_architecture(1, 2, 0.5, 1.0, &mut rng);
        assert_eq!(tiny, vec![1, 1]);
    }
}
