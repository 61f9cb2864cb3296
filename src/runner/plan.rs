use crate::config::Config;
use crate::model::{Configuration, Setting};

/// One sweep axis with its values already expanded.
#[derive(Debug, Clone)]
pub struct Axis {
    pub control: String,
    pub column: String,
    pub resets: Vec<String>,
    pub nudge: bool,
    pub settings: Vec<Setting>,
}

/// Everything the driver needs from a sweep file, expanded once.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub presets: Vec<(String, String)>,
    pub axes: Vec<Axis>,
    pub quantity_control: String,
    pub quantities: Vec<String>,
    pub label_prefix: Option<String>,
    pub price_adjustment: f64,
}

impl SweepPlan {
    pub fn from_config(config: &Config) -> Self {
        let axes = config
            .dimensions
            .iter()
            .map(|dim| Axis {
                control: dim.control.clone(),
                column: dim.column().to_string(),
                resets: dim.resets.clone(),
                nudge: dim.nudge,
                settings: dim
                    .values()
                    .iter()
                    .map(|opt| Setting {
                        control: dim.control.clone(),
                        value: opt.value.clone(),
                        code: dim.label_code(opt),
                        forced: dim.forced,
                    })
                    .collect(),
            })
            .collect();

        Self {
            presets: config
                .presets
                .iter()
                .map(|p| (p.control.clone(), p.value.0.clone()))
                .collect(),
            axes,
            quantity_control: config.quantity.control.clone(),
            quantities: config.quantity.values(),
            label_prefix: config
                .label_prefix
                .clone()
                .filter(|p| !p.trim().is_empty()),
            price_adjustment: config.output.price_adjustment,
        }
    }

    pub fn configuration_count(&self) -> usize {
        self.axes.iter().map(|a| a.settings.len()).product()
    }

    /// CSV header columns preceding `Quantity,Price`.
    pub fn columns(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.column.clone()).collect()
    }

    /// Configurations in cartesian-product order, last axis fastest.
    pub fn configurations(&self) -> Configurations<'_> {
        let cursor = if self.axes.iter().any(|a| a.settings.is_empty()) {
            None
        } else {
            Some(vec![0; self.axes.len()])
        };
        Configurations {
            plan: self,
            cursor,
            index: 0,
        }
    }
}

/// Odometer over the axes of a [`SweepPlan`].
pub struct Configurations<'a> {
    plan: &'a SweepPlan,
    cursor: Option<Vec<usize>>,
    index: usize,
}

impl Iterator for Configurations<'_> {
    type Item = Configuration;

    fn next(&mut self) -> Option<Configuration> {
        let cursor = self.cursor.as_mut()?;
        let axes = &self.plan.axes;

        let settings = cursor
            .iter()
            .zip(axes)
            .map(|(&i, axis)| axis.settings[i].clone())
            .collect();
        let configuration =
            Configuration::new(self.index, settings, self.plan.label_prefix.clone());
        self.index += 1;

        let mut advanced = false;
        for pos in (0..cursor.len()).rev() {
            cursor[pos] += 1;
            if cursor[pos] < axes[pos].settings.len() {
                advanced = true;
                break;
            }
            cursor[pos] = 0;
        }
        if !advanced {
            self.cursor = None;
        }

        Some(configuration)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.cursor {
            Some(_) => self.plan.configuration_count() - self.index,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Configurations<'_> {}
