use super::traits::{invalid, ConfigSection};
use crate::error::EvotraderError;
use crate::types::architecture_signature;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Agents per cohort
    pub population_size: usize,
    /// Size of the elite set kept across cohorts each generation
    pub elite_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    /// Standard deviation of the Gaussian perturbation
    pub mutation_scale: f64,
    pub seed: Option<u64>,
    /// Run agents and cohorts on the rayon pool
    pub parallel: bool,
    /// Bounds for randomly drawn hidden widths, as fractions of the input size
    pub min_width_ratio: f64,
    pub max_width_ratio: f64,
    /// One cohort per entry
    pub variants: Vec<VariantConfig>,
}

/// Hidden-layer layout of one cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub hidden_layers: usize,
    /// Explicit widths; drawn at random per policy when absent
    #[serde(default)]
    pub widths: Option<Vec<usize>>,
}

impl VariantConfig {
    pub fn with_depth(hidden_layers: usize) -> Self {
        Self {
            hidden_layers,
            widths: None,
        }
    }

    pub fn with_widths(widths: Vec<usize>) -> Self {
        Self {
            hidden_layers: widths.len(),
            widths: Some(widths),
        }
    }

    /// Key under which checkpoints of this variant are stored
    pub fn signature(&self) -> String {
        architecture_signature(self.hidden_layers)
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 5,
            elite_size: 5,
            generations: 100,
            mutation_rate: 0.004,
            mutation_scale: 0.08,
            seed: None,
            parallel: true,
            min_width_ratio: 0.5,
            max_width_ratio: 1.0,
            variants: vec![VariantConfig::with_depth(2), VariantConfig::with_depth(3)],
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvotraderError> {
        if self.population_size == 0 {
            return Err(invalid::<Self>("population_size must be at least 1"));
        }
        if self.elite_size == 0 {
            return Err(invalid::<Self>("elite_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(invalid::<Self>("mutation_rate must be between 0 and 1"));
        }
        if !self.mutation_scale.is_finite() || self.mutation_scale < 0.0 {
            return Err(invalid::<Self>("mutation_scale must be a non-negative number"));
        }
        if self.min_width_ratio <= 0.0 || self.max_width_ratio < self.min_width_ratio {
            return Err(invalid::<Self>(
                "width ratios must satisfy 0 < min_width_ratio <= max_width_ratio",
            ));
        }
        if self.variants.is_empty() {
            return Err(invalid::<Self>("at least one variant is required"));
        }
        for (i, variant) in self.variants.iter().enumerate() {
            if variant.hidden_layers == 0 {
                return Err(invalid::<Self>(format!("variant {} has no hidden layers", i)));
            }
            if let Some(widths) = &variant.widths {
                if widths.len() != variant.hidden_layers {
                    return Err(invalid::<Self>(format!(
                        "variant {} lists {} widths for {} hidden layers",
                        i,
                        widths.len(),
                        variant.hidden_layers
                    )));
                }
                if widths.contains(&0) {
                    return Err(invalid::<Self>(format!("variant {} has a zero width", i)));
                }
            }
        }
        Ok(())
    }
}
