//! Post-match parameter pipeline: filters, then bindings.
//!
//! Filters observe a captured value and cannot change it or stop the
//! request. Binders replace a captured string with any serializable value;
//! one binder per symbol, the last registration wins.

use std::collections::HashMap;
use std::sync::Arc;

use junction_core::{DispatchContext, Fault};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

/// A value-transforming binder.
pub type Binder<S> = Arc<dyn Fn(&str, &DispatchContext<S>) -> Result<Value, Fault> + Send + Sync>;

/// A side-effect-only observer.
pub type Filter<S> = Arc<dyn Fn(&str, &DispatchContext<S>) + Send + Sync>;

/// Binder and filter registries keyed by symbol name.
pub struct ParamBinder<S> {
    binders: HashMap<String, Binder<S>>,
    filters: HashMap<String, Vec<Filter<S>>>,
}

impl<S> Default for ParamBinder<S> {
    fn default() -> Self {
        Self {
            binders: HashMap::new(),
            filters: HashMap::new(),
        }
    }
}

impl<S: 'static> ParamBinder<S> {
    /// Creates empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the binder for `symbol`, replacing any earlier one.
    ///
    /// The binder sees the raw captured value and the context, whose
    /// [`params`](DispatchContext::params) already hold the bound values of
    /// symbols to the left in the template.
    pub fn bind<F, T>(&mut self, symbol: impl Into<String>, binder: F)
    where
        F: Fn(&str, &DispatchContext<S>) -> Result<T, Fault> + Send + Sync + 'static,
        T: Serialize,
    {
        let symbol = symbol.into();
        let erased: Binder<S> = Arc::new(move |raw: &str, ctx: &DispatchContext<S>| {
            let value = binder(raw, ctx)?;
            serde_json::to_value(value).map_err(Fault::fatal)
        });

        if self.binders.insert(symbol.clone(), erased).is_some() {
            debug!(symbol = %symbol, "binder replaced");
        }
    }

    /// Adds an observer for `symbol`. All observers run, in registration order.
    pub fn filter<F>(&mut self, symbol: impl Into<String>, filter: F)
    where
        F: Fn(&str, &DispatchContext<S>) + Send + Sync + 'static,
    {
        self.filters
            .entry(symbol.into())
            .or_default()
            .push(Arc::new(filter));
    }

    /// Returns true if a binder is registered for `symbol`.
    pub fn has_binder(&self, symbol: &str) -> bool {
        self.binders.contains_key(symbol)
    }

    /// Returns the number of filters registered for `symbol`.
    pub fn filter_count(&self, symbol: &str) -> usize {
        self.filters.get(symbol).map_or(0, Vec::len)
    }

    /// Runs the filters of every captured symbol, in template order.
    pub fn run_filters(&self, ctx: &DispatchContext<S>) {
        for (symbol, raw) in ctx.raw_params() {
            for filter in self.filters.get(symbol).into_iter().flatten() {
                trace!(symbol, "running filter");
                filter(raw, ctx);
            }
        }
    }

    /// Replaces captured values with their bound values, in template order.
    pub fn apply(&self, ctx: &mut DispatchContext<S>) -> Result<(), Fault> {
        let captured: Vec<(String, String)> = ctx
            .raw_params()
            .iter()
            .filter(|(symbol, _)| self.binders.contains_key(*symbol))
            .map(|(symbol, raw)| (symbol.to_string(), raw.to_string()))
            .collect();

        for (symbol, raw) in captured {
            if let Some(binder) = self.binders.get(&symbol) {
                let value = binder(&raw, ctx)?;
                ctx.params_mut().insert(symbol, value);
            }
        }
        Ok(())
    }
}
