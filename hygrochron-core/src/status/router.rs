//! Path to view table, filled once at boot

use heapless::Vec;

/// Most routes the table can hold
pub const MAX_ROUTES: usize = 8;

/// Views the status server can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// Interactive HTML page
    Page,
    /// Plain-text temperature
    Temperature,
    /// Plain-text humidity
    Humidity,
    /// Structured record
    Json,
}

/// Route table is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RouterFull;

/// Exact-match path router
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<(&'static str, Route), MAX_ROUTES>,
}

impl Router {
    pub const fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register `path`; a repeated path replaces the earlier entry
    pub fn register(&mut self, path: &'static str, route: Route) -> Result<(), RouterFull> {
        if let Some(entry) = self.routes.iter_mut().find(|(p, _)| *p == path) {
            entry.1 = route;
            return Ok(());
        }
        self.routes.push((path, route)).map_err(|_| RouterFull)
    }

    /// Look up the view for `path`
    pub fn resolve(&self, path: &str) -> Option<Route> {
        self.routes
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, route)| *route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
