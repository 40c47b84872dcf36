//! Simulated categorical data with a last-good chart.

use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::AggregateResult;
use crate::chart::{rate_chart, ChartSpec};
use crate::dataset::CategoryOrders;
use crate::error::{SimpsonsError, SimpsonsResult};
use crate::registry::Registry;
use crate::simulation::{
    simulate, suggest_parameters, RawCategoryInput, SimulationColumns, SimulationParameterSet,
    SuggestedParameters,
};

/// Input table shown before the first run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationForm {
    pub title: String,
    /// Column headers: dim1, count label, pivot share, base rates.
    pub headers: [String; 4],
    pub suggested: SuggestedParameters,
    /// The suggested parameters as editable text, one row per dim1 category.
    pub rows: Vec<RawCategoryInput>,
}

/// State of one user's simulation view.
///
/// The chart starts blank and is replaced only by successful runs; a run with
/// bad parameters leaves it untouched and sets an inline error message.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    columns: SimulationColumns,
    rate_label: String,
    category_orders: CategoryOrders,
    form: SimulationForm,
    chart: ChartSpec,
    last_result: Option<AggregateResult>,
    error_message: Option<String>,
}

impl SimulationSession {
    /// Opens the view for a registered dataset with suggested parameters.
    ///
    /// # Errors
    ///
    /// Returns `SimpsonsError::Configuration` if the configuration is unknown
    /// or lacks the simulation settings, and `SimpsonsError::Validation` if
    /// the dim2 column does not have exactly two categories.
    pub fn open<R: Registry + ?Sized>(registry: &R, config_id: &str) -> SimpsonsResult<Self> {
        let entry = registry.get(config_id)?;
        let config = &entry.config;
        let columns = config.simulation_columns()?;
        let rate_label = config.rate_label()?.to_string();

        let suggested = suggest_parameters(&entry.dataset, &columns)?;
        let parameters = &suggested.parameters;
        let headers = [
            columns.dim1().to_string(),
            config.input_count_label.clone(),
            format!("{}: % {}", columns.dim2(), parameters.pivot),
            format!("{}: {}", rate_label, parameters.split_categories.join(", ")),
        ];
        let rows = parameters.categories.iter().map(|c| c.to_raw()).collect();

        debug!(config_id, dim1 = columns.dim1(), dim2 = columns.dim2(), "simulation view opened");

        Ok(Self {
            chart: ChartSpec::empty_rates(columns.dim2(), rate_label.as_str()),
            form: SimulationForm {
                title: config.title.clone(),
                headers,
                suggested,
                rows,
            },
            category_orders: config.category_orders.clone(),
            columns,
            rate_label,
            last_result: None,
            error_message: None,
        })
    }

    #[must_use]
    pub fn form(&self) -> &SimulationForm {
        &self.form
    }

    #[must_use]
    pub fn columns(&self) -> &SimulationColumns {
        &self.columns
    }

    /// The chart of the last successful run, or the blank chart.
    #[must_use]
    pub fn chart(&self) -> &ChartSpec {
        &self.chart
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&AggregateResult> {
        self.last_result.as_ref()
    }

    /// Inline message of the most recent failed run; cleared by a success.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Runs a simulation and replaces the chart on success.
    ///
    /// # Errors
    ///
    /// Returns `SimpsonsError::Validation` for bad parameters; the chart is
    /// kept and [`error_message`](Self::error_message) is set.
    pub fn run(&mut self, params: &SimulationParameterSet, facet: bool) -> SimpsonsResult<&ChartSpec> {
        match simulate(params, &self.columns, facet, self.category_orders.clone()) {
            Ok(result) => {
                self.chart = rate_chart(&result, &self.rate_label)
                    .with_category_orders(self.category_orders.clone());
                self.last_result = Some(result);
                self.error_message = None;
                Ok(&self.chart)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Parses text inputs with the form's dim2 categories, then runs.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run); unparseable numbers are validation errors.
    pub fn run_inputs(&mut self, inputs: &[RawCategoryInput], facet: bool) -> SimpsonsResult<&ChartSpec> {
        let suggested = &self.form.suggested.parameters;
        match SimulationParameterSet::parse(
            &self.columns,
            suggested.split_categories.clone(),
            suggested.pivot.clone(),
            inputs,
        ) {
            Ok(params) => self.run(&params, facet),
            Err(err) => Err(self.reject(err.into())),
        }
    }

    fn reject(&mut self, err: SimpsonsError) -> SimpsonsError {
        if let SimpsonsError::Validation(validation) = &err {
            warn!(error = %validation, "simulation run rejected; keeping previous chart");
            self.error_message = Some(validation.inline_message());
        }
        err
    }
}
