//! Search-region resolution.

use crate::model::Pattern;
use crate::region::{merge_adjacent, Region, SearchRegions};
use crate::trace::{trace_event, trace_span};

/// Decides which areas of the screen to search.
///
/// Sources are tried in priority order and the first one that yields regions
/// wins; tiers are never mixed:
///
/// 1. explicit request regions, verbatim;
/// 2. the fixed region of a single fixed pattern;
/// 3. the declared regions of all patterns, concatenated in input order and
///    optionally merged where they share a full edge;
/// 4. the full screen.
///
/// The result is never empty.
#[derive(Clone, Copy, Debug)]
pub struct RegionResolver {
    full_screen: Region,
    merge_adjacent: bool,
}

impl RegionResolver {
    pub fn new(full_screen: Region) -> Self {
        Self {
            full_screen,
            merge_adjacent: true,
        }
    }

    /// Enables or disables merging of adjacent declared regions.
    pub fn with_merge(mut self, merge_adjacent: bool) -> Self {
        self.merge_adjacent = merge_adjacent;
        self
    }

    pub fn full_screen(&self) -> Region {
        self.full_screen
    }

    pub fn resolve(&self, search_regions: Option<&SearchRegions>, patterns: &[&Pattern]) -> Vec<Region> {
        let _span = trace_span!("resolve_regions", patterns = patterns.len()).entered();

        if let Some(explicit) = search_regions.filter(|r| !r.is_empty()) {
            trace_event!("regions_explicit", count = explicit.regions().len());
            return explicit.regions().to_vec();
        }

        if let [pattern] = patterns {
            if let Some(fixed) = pattern.fixed_region().filter(|_| pattern.is_fixed()) {
                trace_event!("regions_fixed", count = 1usize);
                return vec![fixed];
            }
        }

        let declared: Vec<Region> = patterns
            .iter()
            .flat_map(|p| p.declared_regions().iter().copied())
            .collect();
        if !declared.is_empty() {
            let regions = if self.merge_adjacent {
                merge_adjacent(&declared)
            } else {
                declared
            };
            trace_event!("regions_declared", count = regions.len());
            return regions;
        }

        vec![self.full_screen]
    }

    /// Resolves regions for a single pattern.
    pub fn resolve_pattern(&self, search_regions: Option<&SearchRegions>, pattern: &Pattern) -> Vec<Region> {
        self.resolve(search_regions, &[pattern])
    }
}
