//! Scan orchestration.
//!
//! A [`Scanner`] owns a catalog snapshot, the per-base filter overrides and
//! the value source. Each scan selects candidates, builds and populates one
//! instance per candidate, and drops candidates that fail without stopping.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builder::InstanceBuilder;
use crate::catalog::{TypeCatalog, TypeFilter};
use crate::descriptor::Serializer;
use crate::errors::ScanError;
use crate::json::{self, JsonOptions};
use crate::populator::{GraphPopulator, PopulationStats, VisitedSet};
use crate::report::ScanReport;
use crate::value_gen::{FakeValueGenerator, ValueSource, DEFAULT_LOCALE};

/// Configuration for a scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seed for the value generator; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Locale for generated words (default: "en").
    pub locale: String,
    /// Formatting used by [`Scanner::generate_json`].
    pub json: JsonOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            seed: None,
            locale: DEFAULT_LOCALE.to_string(),
            json: JsonOptions::default(),
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible values for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_json(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }

    /// Build the default value source for this configuration.
    pub fn value_source(&self) -> FakeValueGenerator {
        match self.seed {
            Some(seed) => FakeValueGenerator::new(seed, &self.locale),
            None => FakeValueGenerator::from_entropy(&self.locale),
        }
    }
}

/// A generated instance of a concrete type.
pub struct PopulatedInstance {
    type_name: String,
    value: Box<dyn Any>,
    serializer: Serializer,
}

impl PopulatedInstance {
    /// Most-derived type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the concrete value out, or get `self` back on a type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self {
            type_name,
            value,
            serializer,
        } = self;
        match value.downcast::<T>() {
            Ok(concrete) => Ok(*concrete),
            Err(value) => Err(Self {
                type_name,
                value,
                serializer,
            }),
        }
    }

    /// Serialize with the instance's own (most-derived) type.
    pub fn to_json(&self, options: &JsonOptions) -> serde_json::Result<String> {
        (self.serializer)(self.value.as_ref(), options)
    }

    pub fn into_parts(self) -> (String, Box<dyn Any>) {
        (self.type_name, self.value)
    }
}

impl std::fmt::Debug for PopulatedInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulatedInstance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Instances and report of one scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub instances: Vec<PopulatedInstance>,
    pub report: ScanReport,
}

/// Serialize instances one by one and wrap them in a JSON array.
///
/// An instance that fails to serialize is left out.
pub fn instances_to_json(instances: &[PopulatedInstance], options: &JsonOptions) -> String {
    let items: Vec<String> = instances
        .iter()
        .filter_map(|instance| match instance.to_json(options) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(
                    type_name = %instance.type_name(),
                    error = %e,
                    "failed to serialize instance"
                );
                None
            }
        })
        .collect();
    json::join_array(items)
}

/// Discovers and populates implementations of base types.
pub struct Scanner {
    catalog: TypeCatalog,
    filters: HashMap<String, TypeFilter>,
    source: Box<dyn ValueSource>,
    config: ScanConfig,
}

impl Scanner {
    /// Scanner over `catalog` with the bundled fake-value generator.
    pub fn new(catalog: TypeCatalog, config: ScanConfig) -> Self {
        let source = Box::new(config.value_source());
        Self::with_source(catalog, config, source)
    }

    /// Scanner with a caller-supplied value source.
    pub fn with_source(catalog: TypeCatalog, config: ScanConfig, source: Box<dyn ValueSource>) -> Self {
        Self {
            catalog,
            filters: HashMap::new(),
            source,
            config,
        }
    }

    /// Scanner over a snapshot of the process-wide registry.
    pub fn from_global(config: ScanConfig) -> Self {
        Self::new(TypeCatalog::from_global(), config)
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Replace the candidate filter used for `base`.
    pub fn set_filter(&mut self, base: &str, filter: TypeFilter) -> Result<(), ScanError> {
        if !self.catalog.contains(base) {
            return Err(ScanError::invalid_argument(format!(
                "cannot set a filter for unknown base type {}",
                base
            )));
        }
        debug!(base = %base, filter = %filter.label(), "filter replaced");
        self.filters.insert(base.to_string(), filter);
        Ok(())
    }

    /// Restore the default filter for `base`; returns whether one was set.
    pub fn reset_filter(&mut self, base: &str) -> bool {
        self.filters.remove(base).is_some()
    }

    /// The filter a plain [`scan`](Self::scan) of `base` would use.
    pub fn active_filter(&self, base: &str) -> TypeFilter {
        self.filters
            .get(base)
            .cloned()
            .unwrap_or_else(|| TypeFilter::default_for(base))
    }

    /// Names of the candidate types for `base`, in discovery order.
    pub fn candidates(&self, base: &str) -> Vec<String> {
        let filter = self.active_filter(base);
        self.catalog
            .find_filtered(&filter)
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    pub fn scan(&mut self, base: &str) -> ScanOutcome {
        let filter = self.active_filter(base);
        self.scan_with(base, &filter)
    }

    /// Build and populate one instance per type matching `filter`.
    pub fn scan_with(&mut self, base: &str, filter: &TypeFilter) -> ScanOutcome {
        let start = Instant::now();
        let candidates: Vec<String> = self
            .catalog
            .find_filtered(filter)
            .iter()
            .map(|d| d.name().to_string())
            .collect();

        let mut instances = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();
        let mut population = PopulationStats::default();

        for candidate in &candidates {
            match self.create_and_populate(candidate) {
                Ok((instance, stats)) => {
                    population.merge(stats);
                    instances.push(instance);
                }
                Err(e) => {
                    debug!(
                        base = %base,
                        candidate = %candidate,
                        error = %e,
                        "dropping candidate"
                    );
                    skipped.push(e);
                }
            }
        }

        let report = ScanReport {
            base_type: base.to_string(),
            filter: filter.label().to_string(),
            seed: self.config.seed,
            candidates: candidates.len(),
            generated: instances.len(),
            generated_types: instances.iter().map(|i| i.type_name().to_string()).collect(),
            skipped,
            population,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        ScanOutcome { instances, report }
    }

    /// One populated instance per concrete implementation of `base`.
    pub fn generate(&mut self, base: &str) -> Vec<PopulatedInstance> {
        self.scan(base).instances
    }

    pub fn generate_with(&mut self, base: &str, filter: &TypeFilter) -> Vec<PopulatedInstance> {
        self.scan_with(base, filter).instances
    }

    /// [`generate`](Self::generate) as a JSON array, formatted per the config.
    pub fn generate_json(&mut self, base: &str) -> String {
        let options = self.config.json.clone();
        self.generate_json_with(base, &options)
    }

    pub fn generate_json_with(&mut self, base: &str, options: &JsonOptions) -> String {
        let instances = self.generate(base);
        instances_to_json(&instances, options)
    }

    /// Generated instances converted to `Box<B>` through the upcasts
    /// registered for `base`. Instances without one are left out.
    pub fn generate_as<B>(&mut self, base: &str) -> Vec<Box<B>>
    where
        B: ?Sized + 'static,
    {
        let instances = self.generate(base);
        let catalog = &self.catalog;
        instances
            .into_iter()
            .filter_map(|instance| {
                let (type_name, value) = instance.into_parts();
                let upcast = catalog.get(&type_name)?.upcast_to(base, value);
                match upcast.and_then(|any| any.downcast::<Box<B>>().ok()) {
                    Some(typed) => Some(*typed),
                    None => {
                        debug!(
                            type_name = %type_name,
                            base = %base,
                            "no usable upcast, leaving instance out"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// Build and populate a single named type (abstract names resolve to
    /// their first concrete implementation).
    pub fn populate_one(&mut self, type_name: &str) -> Result<PopulatedInstance, ScanError> {
        self.create_and_populate(type_name).map(|(instance, _)| instance)
    }

    fn create_and_populate(&mut self, type_name: &str) -> Result<(PopulatedInstance, PopulationStats), ScanError> {
        let catalog = &self.catalog;
        let source = self.source.as_mut();
        let result = catch_unwind(AssertUnwindSafe(move || {
            let mut instance = InstanceBuilder::new(catalog).try_build(type_name)?;
            let mut populator = GraphPopulator::new(catalog, source);
            populator.populate(&mut instance, VisitedSet::new());
            Ok::<_, ScanError>((instance, populator.stats()))
        }));

        let (instance, stats) = match result {
            Ok(built) => built?,
            Err(payload) => {
                let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                warn!(type_name = %type_name, panic = %msg, "population panicked");
                return Err(ScanError::population_failure(type_name, format!("panic: {}", msg)));
            }
        };

        let (concrete, value) = instance.into_parts();
        let serializer = catalog
            .get(&concrete)
            .and_then(|d| d.serializer().cloned())
            .ok_or_else(|| ScanError::population_failure(concrete.as_str(), "no serializer registered"))?;
        Ok((
            PopulatedInstance {
                type_name: concrete,
                value,
                serializer,
            },
            stats,
        ))
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("types", &self.catalog.len())
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
