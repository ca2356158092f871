//! Solar projects in which customers can buy panels.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Capacity, Usd, UsdPerWatt, Watts};
use indexmap::IndexMap;

define_id_type! {ProjectID}

/// A map of [`Project`]s, keyed by project ID
pub type ProjectMap = IndexMap<ProjectID, Project>;

/// How the price of a panel is quoted for a project
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PricingBasis {
    /// A flat price for each panel
    PerPanel(Usd),
    /// A price per watt-peak of installed capacity
    PerWatt(UsdPerWatt),
}

/// A solar project with capacity available for investment.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// A unique identifier for the project (e.g. "mendoza_norte")
    pub id: ProjectID,
    /// A human-readable name
    pub name: String,
    /// Rated power of a single panel
    pub panel_power_wp: Watts,
    /// How panels in this project are priced
    pub pricing: PricingBasis,
    /// Capacity still available for customers to buy
    pub available_power_kw: Capacity,
}
define_id_getter! {Project, ProjectID}

impl Project {
    /// Rated power of a single panel in kW
    pub fn panel_power_kw(&self) -> Capacity {
        self.panel_power_wp.to_capacity()
    }

    /// The price of a single panel on the project's own pricing basis
    pub fn price_per_panel(&self) -> Usd {
        match self.pricing {
            PricingBasis::PerPanel(price) => price,
            PricingBasis::PerWatt(price) => self.panel_power_wp * price,
        }
    }
}
